use tracing::{debug, warn};
use uuid::Uuid;

use showcase_types::models::{Project, VoteDirection};

use crate::error::ClientError;
use crate::mutator::{CommentThread, FireAndForget, OptimisticThenRefetch, VoteStrategy};
use crate::store::BackingStore;

/// Detail page for one project: the project, its comment thread, and the
/// comment box.
#[derive(Debug, Clone)]
pub struct ProjectPage {
    pub project: Project,
    pub thread: CommentThread,
    /// Signed-in viewer; comment voting is disabled without one
    pub viewer: Option<Uuid>,
    pub comment_text: String,
    pub error: Option<String>,
    last_project_vote: Option<VoteDirection>,
}

impl ProjectPage {
    /// `Ok(None)` when the project does not exist. Failed comment or vote
    /// reads leave the thread empty.
    pub async fn load(
        store: &dyn BackingStore,
        project_id: Uuid,
    ) -> Result<Option<Self>, ClientError> {
        let viewer = store.current_session().await.map(|s| s.user.id);
        let Some(project) = store.get_project(project_id).await? else {
            return Ok(None);
        };

        let mut thread = CommentThread::new(project_id);
        if let Err(e) = thread.refresh(store).await {
            warn!("Failed to load comments for {}: {}", project_id, e);
        }

        Ok(Some(Self {
            project,
            thread,
            viewer,
            comment_text: String::new(),
            error: None,
            last_project_vote: None,
        }))
    }

    /// Tags as displayed, trimmed.
    pub fn tags(&self) -> Vec<&str> {
        self.project.tag_list()
    }

    pub fn comment_score(&self, comment_id: Uuid) -> i64 {
        self.thread.score(comment_id)
    }

    pub fn can_vote_on_comments(&self) -> bool {
        self.viewer.is_some()
    }

    /// Whether the project vote button for `direction` is enabled. Only the
    /// direction pressed last is disabled, and only for this page instance.
    pub fn can_vote_project(&self, direction: VoteDirection) -> bool {
        self.last_project_vote != Some(direction)
    }

    pub fn can_submit_comment(&self) -> bool {
        !self.comment_text.trim().is_empty()
    }

    /// Post `comment_text`. Blank text is ignored. On success the box is
    /// cleared and the thread reloaded; on failure the text is kept and the
    /// service's message shown.
    pub async fn submit_comment(&mut self, store: &dyn BackingStore) -> Result<(), ClientError> {
        self.error = None;
        let content = self.comment_text.trim().to_string();
        if content.is_empty() {
            return Ok(());
        }

        if let Err(e) = store.insert_comment(self.project.id, content).await {
            self.error = Some(e.to_string());
            return Err(e);
        }

        self.comment_text.clear();
        if let Err(e) = self.thread.refresh(store).await {
            warn!("Failed to reload comments for {}: {}", self.project.id, e);
        }
        Ok(())
    }

    /// No-op without a signed-in viewer.
    pub async fn vote_comment(
        &mut self,
        store: &dyn BackingStore,
        comment_id: Uuid,
        direction: VoteDirection,
    ) -> Result<(), ClientError> {
        let Some(actor) = self.viewer else {
            debug!("Ignoring comment vote without a signed-in viewer");
            return Ok(());
        };
        let strategy = OptimisticThenRefetch { actor, comment_id };
        strategy.vote(store, &mut self.thread, direction).await
    }

    /// Pressing the direction voted last is ignored until the other
    /// direction is pressed.
    pub async fn vote_project(
        &mut self,
        store: &dyn BackingStore,
        direction: VoteDirection,
    ) -> Result<(), ClientError> {
        if !self.can_vote_project(direction) {
            debug!("Ignoring repeated {} vote on project {}", direction, self.project.id);
            return Ok(());
        }
        self.error = None;
        self.last_project_vote = Some(direction);
        let result = FireAndForget.vote(store, &mut self.project, direction).await;
        if let Err(e) = &result {
            self.error = Some(e.to_string());
        }
        result
    }
}
