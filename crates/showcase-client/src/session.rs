//! Process-wide session context. Owns the single subscription to the
//! store's auth notifications and fans the resulting state out over a
//! `watch` channel.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use showcase_types::events::AuthEvent;
use showcase_types::models::{Session, User};
use showcase_types::validate;

use crate::error::ClientError;
use crate::store::BackingStore;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub session: Option<Session>,
    /// True until the initial session lookup finishes, and while an auth
    /// request is in flight
    pub loading: bool,
    /// Message from the last failed auth action
    pub error: Option<String>,
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }
}

pub struct SessionContext {
    store: Arc<dyn BackingStore>,
    state: Arc<watch::Sender<SessionState>>,
    listener: JoinHandle<()>,
}

impl SessionContext {
    /// Subscribe to the store, then read whatever session it already holds.
    pub async fn init(store: Arc<dyn BackingStore>) -> Self {
        let (tx, _) = watch::channel(SessionState {
            loading: true,
            ..Default::default()
        });
        let state = Arc::new(tx);

        // Subscribe before the lookup so no change can slip between them
        let mut events = store.on_auth_state_change();
        let listener = {
            let store = store.clone();
            let state = state.clone();
            tokio::spawn(async move {
                while let Some(event) = events.next().await {
                    handle_event(store.as_ref(), &state, event).await;
                }
                debug!("Auth event stream closed");
            })
        };

        let session = store.current_session().await;
        if let Some(session) = &session {
            ensure_profile(store.as_ref(), &session.user).await;
        }
        state.send_modify(|s| {
            s.session = session;
            s.loading = false;
        });

        Self {
            store,
            state,
            listener,
        }
    }

    /// Stop listening for auth changes. Receivers keep the last state.
    pub fn shutdown(self) {
        self.listener.abort();
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        self.check(validate::login(email, password))?;
        self.begin();
        let result = self.store.sign_in_with_password(email, password).await;
        self.finish_with_session(result).await
    }

    /// `accepted_terms` is `None` when the form does not ask for it.
    pub async fn signup(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        accepted_terms: Option<bool>,
    ) -> Result<Session, ClientError> {
        self.check(validate::signup(full_name, email, password, accepted_terms))?;
        self.begin();
        let result = self.store.sign_up(email, password, full_name.trim()).await;
        self.finish_with_session(result).await
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.begin();
        let result = self.store.sign_out().await;
        self.state.send_modify(|s| {
            s.session = None;
            s.loading = false;
            s.error = result.as_ref().err().map(ToString::to_string);
        });
        result
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<(), ClientError> {
        self.check(validate::recovery_email(email))?;
        self.begin();
        let result = self.store.send_password_reset(email).await;
        self.finish(result)
    }

    pub async fn send_magic_link(&self, email: &str) -> Result<(), ClientError> {
        if !validate::is_valid_email(email) {
            return self.check(Err("Please enter a valid email address.".to_string()));
        }
        self.begin();
        let result = self.store.sign_in_with_magic_link(email).await;
        self.finish(result)
    }

    pub async fn verify_magic_link(&self, token: &str) -> Result<Session, ClientError> {
        self.begin();
        let result = self.store.verify_magic_link(token.trim()).await;
        self.finish_with_session(result).await
    }

    fn check(&self, rule: Result<(), String>) -> Result<(), ClientError> {
        rule.map_err(|message| {
            self.state.send_modify(|s| s.error = Some(message.clone()));
            ClientError::Validation(message)
        })
    }

    fn begin(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    fn finish(&self, result: Result<(), ClientError>) -> Result<(), ClientError> {
        self.state.send_modify(|s| {
            s.loading = false;
            s.error = result.as_ref().err().map(ToString::to_string);
        });
        result
    }

    async fn finish_with_session(
        &self,
        result: Result<Session, ClientError>,
    ) -> Result<Session, ClientError> {
        match result {
            Ok(session) => {
                ensure_profile(self.store.as_ref(), &session.user).await;
                info!("Signed in as {}", session.user.email);
                self.state.send_modify(|s| {
                    s.session = Some(session.clone());
                    s.loading = false;
                    s.error = None;
                });
                Ok(session)
            }
            Err(e) => {
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(e.to_string());
                });
                Err(e)
            }
        }
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

async fn handle_event(
    store: &dyn BackingStore,
    state: &watch::Sender<SessionState>,
    event: AuthEvent,
) {
    let session = event.session().cloned();
    if let Some(session) = &session {
        let known = state.borrow().user().map(|u| u.id) == Some(session.user.id);
        if !known {
            ensure_profile(store, &session.user).await;
        }
    }
    state.send_modify(|s| s.session = session);
}

/// Create the user's profile row if it does not exist yet. Failures are
/// logged; signing in still succeeds.
async fn ensure_profile(store: &dyn BackingStore, user: &User) {
    match store.get_profile(user.id).await {
        Ok(Some(_)) => {}
        Ok(None) => match store.insert_profile(user.full_name.clone()).await {
            Ok(_) => debug!("Created profile for {}", user.id),
            // Another path got there first
            Err(ClientError::Api { status: 409, .. }) => {}
            Err(e) => warn!("Could not create profile for {}: {}", user.id, e),
        },
        Err(e) => warn!("Could not look up profile for {}: {}", user.id, e),
    }
}
