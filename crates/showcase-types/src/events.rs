use serde::{Deserialize, Serialize};

use crate::models::Session;

/// Session changes published by a backing store to its subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AuthEvent {
    /// A session was established (password, signup, magic link or reset)
    SignedIn { session: Session },

    /// The session was dropped
    SignedOut,
}

impl AuthEvent {
    /// The session in effect after this event.
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn { session } => Some(session),
            Self::SignedOut => None,
        }
    }
}
