//! Optimistic vote mutations. Projects and comments deliberately use
//! different strategies: a project's counter is bumped locally and left
//! alone, while a comment thread is always reloaded after a vote.

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use showcase_types::models::{Comment, CommentVote, Project, VoteDirection};

use crate::error::ClientError;
use crate::guard::{self, VotePlan};
use crate::store::BackingStore;
use crate::tally;

#[async_trait]
pub trait VoteStrategy<T: Send + ?Sized>: Send + Sync {
    /// Apply a vote to `target` locally and persist it through `store`.
    /// Any write error is returned after local state has been settled.
    async fn vote(
        &self,
        store: &dyn BackingStore,
        target: &mut T,
        direction: VoteDirection,
    ) -> Result<(), ClientError>;
}

/// Project path: the delta lands on the local counter before the write and
/// is never rolled back.
#[derive(Debug, Clone, Copy, Default)]
pub struct FireAndForget;

#[async_trait]
impl VoteStrategy<Project> for FireAndForget {
    async fn vote(
        &self,
        store: &dyn BackingStore,
        target: &mut Project,
        direction: VoteDirection,
    ) -> Result<(), ClientError> {
        let delta = direction.delta();
        target.vote_count += delta;

        match store.apply_project_vote(target.id, delta).await {
            Ok(stored) => {
                debug!(
                    "Project {} voted {}, stored count {}",
                    target.id, direction, stored
                );
                Ok(())
            }
            Err(e) => {
                warn!("Project vote on {} failed: {}", target.id, e);
                Err(e)
            }
        }
    }
}

/// Comments of one project together with every vote row on them. Scores
/// are derived from `votes`, never stored.
#[derive(Debug, Clone, Default)]
pub struct CommentThread {
    pub project_id: Uuid,
    /// Newest first
    pub comments: Vec<Comment>,
    pub votes: Vec<CommentVote>,
}

impl CommentThread {
    pub fn new(project_id: Uuid) -> Self {
        Self {
            project_id,
            ..Default::default()
        }
    }

    pub async fn load(store: &dyn BackingStore, project_id: Uuid) -> Result<Self, ClientError> {
        let mut thread = Self::new(project_id);
        thread.refresh(store).await?;
        Ok(thread)
    }

    /// Reload comments and their votes, replacing local state wholesale.
    /// On error the previous state is kept.
    pub async fn refresh(&mut self, store: &dyn BackingStore) -> Result<(), ClientError> {
        let comments = store.list_comments_for_project(self.project_id).await?;
        let ids: Vec<Uuid> = comments.iter().map(|c| c.id).collect();
        let votes = store.list_comment_votes(&ids).await?;

        self.comments = comments;
        self.votes = votes;
        Ok(())
    }

    pub fn score(&self, comment_id: Uuid) -> i64 {
        tally::tally(&self.votes, comment_id)
    }

    pub fn my_vote(&self, comment_id: Uuid, user_id: Uuid) -> Option<VoteDirection> {
        tally::my_vote(&self.votes, comment_id, user_id)
    }
}

/// Comment path: plan through the single-vote guard, apply locally, write,
/// then reload the whole thread whether or not the write went through.
#[derive(Debug, Clone, Copy)]
pub struct OptimisticThenRefetch {
    pub actor: Uuid,
    pub comment_id: Uuid,
}

#[async_trait]
impl VoteStrategy<CommentThread> for OptimisticThenRefetch {
    async fn vote(
        &self,
        store: &dyn BackingStore,
        target: &mut CommentThread,
        direction: VoteDirection,
    ) -> Result<(), ClientError> {
        let plan = guard::plan(&target.votes, self.actor, self.comment_id, direction);
        if plan == VotePlan::Noop {
            return Ok(());
        }

        guard::apply_locally(&mut target.votes, self.actor, &plan);
        let write = guard::execute(store, &plan).await;
        if let Err(e) = &write {
            warn!("Comment vote on {} failed: {}", self.comment_id, e);
        }

        if let Err(e) = target.refresh(store).await {
            warn!("Reloading comments for {} failed: {}", target.project_id, e);
            write?;
            return Err(e);
        }

        write.map(|_| ())
    }
}
