//! The backing store the client talks to: typed select/insert/update over
//! the four tables plus the auth primitives.

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use tracing::warn;
use uuid::Uuid;

use showcase_types::api::{NewProject, ProfilePatch, ProjectQuery};
use showcase_types::events::AuthEvent;
use showcase_types::models::{
    Comment, CommentVote, Profile, Project, Session, User, VoteDirection,
};

use crate::error::ClientError;

pub type StoreResult<T> = Result<T, ClientError>;

#[async_trait]
pub trait BackingStore: Send + Sync {
    // -- Projects --

    /// Newest first.
    async fn list_projects(&self, query: ProjectQuery) -> StoreResult<Vec<Project>>;
    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>>;
    /// The creator is whoever holds the current session, if anyone.
    async fn insert_project(&self, project: NewProject) -> StoreResult<Project>;
    /// Add `delta` to the project's counter; returns the stored value.
    async fn apply_project_vote(&self, id: Uuid, delta: i64) -> StoreResult<i64>;

    // -- Comments --

    /// Newest first.
    async fn list_comments_for_project(&self, project_id: Uuid) -> StoreResult<Vec<Comment>>;
    async fn list_comments_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Comment>>;
    async fn insert_comment(&self, project_id: Uuid, content: String) -> StoreResult<Comment>;

    // -- Comment votes --

    async fn list_comment_votes(&self, comment_ids: &[Uuid]) -> StoreResult<Vec<CommentVote>>;
    /// Inserted for the current session's user.
    async fn insert_comment_vote(
        &self,
        comment_id: Uuid,
        direction: VoteDirection,
    ) -> StoreResult<CommentVote>;
    async fn update_comment_vote(
        &self,
        vote_id: Uuid,
        direction: VoteDirection,
    ) -> StoreResult<CommentVote>;

    // -- Profiles --

    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>>;
    async fn insert_profile(&self, full_name: String) -> StoreResult<Profile>;
    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> StoreResult<Profile>;

    // -- Auth --

    /// Asks the service who the current token belongs to.
    async fn current_user(&self) -> StoreResult<Option<User>>;
    /// The locally held session, without a round trip.
    async fn current_session(&self) -> Option<Session>;
    fn on_auth_state_change(&self) -> AuthSubscription;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> StoreResult<Session>;
    async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> StoreResult<Session>;
    async fn sign_out(&self) -> StoreResult<()>;
    async fn send_password_reset(&self, email: &str) -> StoreResult<()>;
    async fn sign_in_with_magic_link(&self, email: &str) -> StoreResult<()>;
    async fn verify_magic_link(&self, token: &str) -> StoreResult<Session>;
}

/// Receiving end of a store's auth notifications. Dropping it, or calling
/// `unsubscribe`, ends the subscription.
pub struct AuthSubscription {
    rx: broadcast::Receiver<AuthEvent>,
}

impl AuthSubscription {
    pub fn new(rx: broadcast::Receiver<AuthEvent>) -> Self {
        Self { rx }
    }

    /// Next event, or `None` once the store is gone.
    pub async fn next(&mut self) -> Option<AuthEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Auth subscriber lagged, {} events skipped", n);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}

/// Session slot shared by store implementations: holds the current session
/// and publishes every change.
pub struct SessionCell {
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for SessionCell {
    fn default() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            session: RwLock::new(None),
            events,
        }
    }
}

impl SessionCell {
    pub async fn get(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.session.read().await.as_ref().map(|s| s.access_token.clone())
    }

    pub async fn user_id(&self) -> Option<Uuid> {
        self.session.read().await.as_ref().map(|s| s.user.id)
    }

    pub async fn set(&self, session: Option<Session>) {
        *self.session.write().await = session.clone();
        let event = match session {
            Some(session) => AuthEvent::SignedIn { session },
            None => AuthEvent::SignedOut,
        };
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription::new(self.events.subscribe())
    }
}
