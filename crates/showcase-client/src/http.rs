use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use uuid::Uuid;

use showcase_types::api::{
    EmailRequest, ErrorBody, LoginRequest, NewComment, NewCommentVote, NewProfile, NewProject,
    ProfilePatch, ProjectQuery, ProjectVoteRequest, ProjectVoteResponse, SignupRequest,
    UpdateCommentVote, VerifyTokenRequest,
};
use showcase_types::models::{
    Comment, CommentVote, Profile, Project, Session, User, VoteDirection,
};

use crate::error::ClientError;
use crate::store::{AuthSubscription, BackingStore, SessionCell, StoreResult};

const DEFAULT_API_URL: &str = "http://localhost:3000";

/// `BackingStore` over the showcase HTTP API. Holds the session token and
/// attaches it to every request.
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
    session: SessionCell,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            session: SessionCell::default(),
        }
    }

    /// Base URL from `SHOWCASE_API_URL`, defaulting to a local server.
    pub fn from_env() -> Self {
        let url = std::env::var("SHOWCASE_API_URL").unwrap_or_else(|_| {
            info!("SHOWCASE_API_URL not set, using default: {DEFAULT_API_URL}");
            DEFAULT_API_URL.to_string()
        });
        Self::new(url)
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}{}", self.base_url, path));
        match self.session.token().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> StoreResult<T> {
        let response = self.check(builder.send().await?).await?;
        Ok(response.json().await?)
    }

    /// Like `send`, but a 404 is `None`.
    async fn send_optional<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> StoreResult<Option<T>> {
        match self.send(builder).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn send_empty(&self, builder: RequestBuilder) -> StoreResult<()> {
        self.check(builder.send().await?).await?;
        Ok(())
    }

    /// Turn a non-2xx response into `ClientError::Api` carrying the
    /// service's own message. A 401 means the held token is no longer
    /// accepted, so the session is dropped and subscribers see `SignedOut`.
    async fn check(&self, response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED && self.session.token().await.is_some() {
            warn!("Session rejected by the service, signing out locally");
            self.session.set(None).await;
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn establish(&self, session: Session) -> Session {
        debug!("Session established for {}", session.user.id);
        self.session.set(Some(session.clone())).await;
        session
    }
}

#[async_trait]
impl BackingStore for HttpStore {
    async fn list_projects(&self, query: ProjectQuery) -> StoreResult<Vec<Project>> {
        self.send(self.request(Method::GET, "/projects").await.query(&query)).await
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        self.send_optional(self.request(Method::GET, &format!("/projects/{id}")).await).await
    }

    async fn insert_project(&self, project: NewProject) -> StoreResult<Project> {
        self.send(self.request(Method::POST, "/projects").await.json(&project)).await
    }

    async fn apply_project_vote(&self, id: Uuid, delta: i64) -> StoreResult<i64> {
        let builder = self
            .request(Method::POST, &format!("/projects/{id}/vote"))
            .await
            .json(&ProjectVoteRequest { delta });
        let response: ProjectVoteResponse = self.send(builder).await?;
        Ok(response.vote_count)
    }

    async fn list_comments_for_project(&self, project_id: Uuid) -> StoreResult<Vec<Comment>> {
        self.send(
            self.request(Method::GET, &format!("/projects/{project_id}/comments"))
                .await,
        )
        .await
    }

    async fn list_comments_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Comment>> {
        let builder = self
            .request(Method::GET, "/comments")
            .await
            .query(&[("user_id", user_id.to_string())]);
        self.send(builder).await
    }

    async fn insert_comment(&self, project_id: Uuid, content: String) -> StoreResult<Comment> {
        let builder = self
            .request(Method::POST, &format!("/projects/{project_id}/comments"))
            .await
            .json(&NewComment { content });
        self.send(builder).await
    }

    async fn list_comment_votes(&self, comment_ids: &[Uuid]) -> StoreResult<Vec<CommentVote>> {
        if comment_ids.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<String> = comment_ids.iter().map(Uuid::to_string).collect();
        let builder = self
            .request(Method::GET, "/comment-votes")
            .await
            .query(&[("comment_ids", ids.join(","))]);
        self.send(builder).await
    }

    async fn insert_comment_vote(
        &self,
        comment_id: Uuid,
        direction: VoteDirection,
    ) -> StoreResult<CommentVote> {
        let builder = self
            .request(Method::POST, "/comment-votes")
            .await
            .json(&NewCommentVote {
                comment_id,
                vote_type: direction,
            });
        self.send(builder).await
    }

    async fn update_comment_vote(
        &self,
        vote_id: Uuid,
        direction: VoteDirection,
    ) -> StoreResult<CommentVote> {
        let builder = self
            .request(Method::PATCH, &format!("/comment-votes/{vote_id}"))
            .await
            .json(&UpdateCommentVote {
                vote_type: direction,
            });
        self.send(builder).await
    }

    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        self.send_optional(self.request(Method::GET, &format!("/profiles/{id}")).await).await
    }

    async fn insert_profile(&self, full_name: String) -> StoreResult<Profile> {
        let builder = self
            .request(Method::POST, "/profiles")
            .await
            .json(&NewProfile { full_name });
        self.send(builder).await
    }

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> StoreResult<Profile> {
        let builder = self
            .request(Method::PATCH, &format!("/profiles/{id}"))
            .await
            .json(&patch);
        self.send(builder).await
    }

    async fn current_user(&self) -> StoreResult<Option<User>> {
        if self.session.token().await.is_none() {
            return Ok(None);
        }
        match self.send::<User>(self.request(Method::GET, "/auth/user").await).await {
            Ok(user) => Ok(Some(user)),
            Err(ClientError::Api { status, .. }) if status == StatusCode::UNAUTHORIZED.as_u16() => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn current_session(&self) -> Option<Session> {
        self.session.get().await
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        self.session.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> StoreResult<Session> {
        let builder = self.request(Method::POST, "/auth/login").await.json(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        });
        let session = self.send(builder).await?;
        Ok(self.establish(session).await)
    }

    async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> StoreResult<Session> {
        let builder = self.request(Method::POST, "/auth/signup").await.json(&SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
        });
        let session = self.send(builder).await?;
        Ok(self.establish(session).await)
    }

    async fn sign_out(&self) -> StoreResult<()> {
        // The local session is dropped even if the service cannot be reached
        let result = if self.session.token().await.is_some() {
            self.send_empty(self.request(Method::POST, "/auth/logout").await).await
        } else {
            Ok(())
        };
        self.session.set(None).await;
        result
    }

    async fn send_password_reset(&self, email: &str) -> StoreResult<()> {
        let builder = self
            .request(Method::POST, "/auth/recover")
            .await
            .json(&EmailRequest {
                email: email.to_string(),
            });
        self.send_empty(builder).await
    }

    async fn sign_in_with_magic_link(&self, email: &str) -> StoreResult<()> {
        let builder = self
            .request(Method::POST, "/auth/otp")
            .await
            .json(&EmailRequest {
                email: email.to_string(),
            });
        self.send_empty(builder).await
    }

    async fn verify_magic_link(&self, token: &str) -> StoreResult<Session> {
        let builder = self
            .request(Method::POST, "/auth/verify")
            .await
            .json(&VerifyTokenRequest {
                token: token.to_string(),
            });
        let session = self.send(builder).await?;
        Ok(self.establish(session).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutator::{CommentThread, OptimisticThenRefetch, VoteStrategy};
    use showcase_types::events::AuthEvent;

    /// Run the real service on an ephemeral port over a fresh in-memory
    /// database and point a store at it.
    async fn serve() -> HttpStore {
        let db = showcase_db::Database::open_in_memory().unwrap();
        let state = showcase_api::auth::AppStateInner::new(
            db,
            "test-secret".into(),
            chrono::Duration::minutes(15),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, showcase_api::router(state)).await.unwrap();
        });
        HttpStore::new(format!("http://{addr}"))
    }

    fn new_project(title: &str, tags: &str) -> NewProject {
        NewProject {
            title: title.to_string(),
            description: "d".to_string(),
            tags: tags.to_string(),
        }
    }

    #[tokio::test]
    async fn comment_vote_flow_against_the_service() {
        let store = serve().await;
        let session = store
            .sign_up("ada@example.com", "hunter22", "Ada")
            .await
            .unwrap();
        let uid = session.user.id;

        let project = store.insert_project(new_project("Rover", " ai, web ")).await.unwrap();
        assert_eq!(project.creator_id, Some(uid));
        assert_eq!(project.tags, "ai,web");
        let comment = store
            .insert_comment(project.id, "love it".to_string())
            .await
            .unwrap();

        let mut thread = CommentThread::load(&store, project.id).await.unwrap();
        let strategy = OptimisticThenRefetch {
            actor: uid,
            comment_id: comment.id,
        };
        strategy
            .vote(&store, &mut thread, VoteDirection::Up)
            .await
            .unwrap();
        assert_eq!(thread.score(comment.id), 1);
        strategy
            .vote(&store, &mut thread, VoteDirection::Down)
            .await
            .unwrap();
        assert_eq!(thread.votes.len(), 1);
        assert_eq!(thread.score(comment.id), -1);

        let rows = store.list_comment_votes(&[comment.id]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].vote_type, VoteDirection::Down);

        let err = store
            .insert_comment_vote(comment.id, VoteDirection::Up)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 409, .. }));

        let by_user = store.list_comments_by_user(uid).await.unwrap();
        assert_eq!(by_user.len(), 1);
        assert_eq!(store.apply_project_vote(project.id, 1).await.unwrap(), 1);
        assert!(store.get_project(Uuid::new_v4()).await.unwrap().is_none());

        store.sign_out().await.unwrap();
        let anonymous = store.insert_project(new_project("Garden", "")).await.unwrap();
        assert_eq!(anonymous.creator_id, None);

        let all = store.list_projects(ProjectQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        let mine = store
            .list_projects(ProjectQuery {
                creator_id: Some(uid),
                limit: None,
            })
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, project.id);
        let newest = store
            .list_projects(ProjectQuery {
                creator_id: None,
                limit: Some(1),
            })
            .await
            .unwrap();
        assert_eq!(newest[0].id, anonymous.id);
    }

    #[tokio::test]
    async fn rejected_token_drops_the_session() {
        let store = serve().await;
        let session = store
            .sign_up("ada@example.com", "hunter22", "Ada")
            .await
            .unwrap();
        store.insert_project(new_project("Rover", "")).await.unwrap();

        let mut sub = store.on_auth_state_change();
        store
            .session
            .set(Some(Session {
                access_token: "stale.or.expired".to_string(),
                user: session.user.clone(),
            }))
            .await;
        assert!(matches!(sub.next().await, Some(AuthEvent::SignedIn { .. })));

        // Public reads do not care about the stale token
        let projects = store.list_projects(ProjectQuery::default()).await.unwrap();
        assert_eq!(projects.len(), 1);
        assert!(store.current_session().await.is_some());

        assert!(store.current_user().await.unwrap().is_none());
        assert!(store.current_session().await.is_none());
        assert_eq!(sub.next().await, Some(AuthEvent::SignedOut));
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let store = HttpStore::new("http://example.test:3000/");
        assert_eq!(store.base_url, "http://example.test:3000");
    }

    #[tokio::test]
    async fn no_session_means_no_user_and_no_request() {
        // Unroutable base URL: any request would fail with a network error
        let store = HttpStore::new("http://127.0.0.1:9");
        assert!(store.current_user().await.unwrap().is_none());
        assert!(store.current_session().await.is_none());
        assert!(store.list_comment_votes(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sign_out_without_session_publishes_signed_out() {
        let store = HttpStore::new("http://127.0.0.1:9");
        let mut sub = store.on_auth_state_change();
        store.sign_out().await.unwrap();
        assert_eq!(
            sub.next().await,
            Some(showcase_types::events::AuthEvent::SignedOut)
        );
    }
}
