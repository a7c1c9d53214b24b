//! Client core for the Showcase site: everything the pages do between a user
//! action and the backing store.

pub mod error;
pub mod filter;
pub mod guard;
pub mod http;
pub mod mutator;
pub mod pages;
pub mod session;
pub mod store;
pub mod tally;

#[cfg(test)]
pub(crate) mod memory;

pub use error::ClientError;
pub use http::HttpStore;
pub use mutator::{CommentThread, FireAndForget, OptimisticThenRefetch, VoteStrategy};
pub use session::SessionContext;
pub use store::BackingStore;
