//! Page-level state: what each screen loads, holds, and does on user
//! actions. Rendering is left to whatever front end drives these.

pub mod explore;
pub mod home;
pub mod profile;
pub mod project;
pub mod submit;

pub use explore::ExploreState;
pub use home::HomeFeed;
pub use profile::{ProfileForm, ProfilePage};
pub use project::ProjectPage;
pub use submit::SubmitForm;
