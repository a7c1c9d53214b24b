//! Single-vote guard: at most one vote row per (comment, voter). A second
//! vote in the same direction is a no-op; a vote in the other direction
//! flips the existing row in place.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use showcase_types::models::{CommentVote, VoteDirection};

use crate::error::ClientError;
use crate::store::BackingStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotePlan {
    /// No row yet for this voter
    Insert {
        comment_id: Uuid,
        direction: VoteDirection,
    },
    /// A row exists with the other direction; keep its id and created_at
    Update {
        vote_id: Uuid,
        direction: VoteDirection,
    },
    /// A row exists with this direction already
    Noop,
}

/// Decide what a vote by `actor` on `comment_id` must do, given every vote
/// row the client can see.
pub fn plan(
    votes: &[CommentVote],
    actor: Uuid,
    comment_id: Uuid,
    direction: VoteDirection,
) -> VotePlan {
    match votes
        .iter()
        .find(|v| v.comment_id == comment_id && v.user_id == actor)
    {
        None => VotePlan::Insert {
            comment_id,
            direction,
        },
        Some(existing) if existing.vote_type == direction => VotePlan::Noop,
        Some(existing) => VotePlan::Update {
            vote_id: existing.id,
            direction,
        },
    }
}

/// Apply a plan to a local row set ahead of the store confirming it.
/// Inserted rows get a provisional id that the next refetch replaces.
pub fn apply_locally(votes: &mut Vec<CommentVote>, actor: Uuid, plan: &VotePlan) {
    match *plan {
        VotePlan::Insert {
            comment_id,
            direction,
        } => votes.push(CommentVote {
            id: Uuid::new_v4(),
            comment_id,
            user_id: actor,
            vote_type: direction,
            created_at: Utc::now(),
        }),
        VotePlan::Update { vote_id, direction } => {
            if let Some(row) = votes.iter_mut().find(|v| v.id == vote_id) {
                row.vote_type = direction;
            }
        }
        VotePlan::Noop => {}
    }
}

/// Issue the write a plan calls for. Write failures are returned, never
/// swallowed. `Noop` succeeds without touching the store.
pub async fn execute(
    store: &dyn BackingStore,
    plan: &VotePlan,
) -> Result<Option<CommentVote>, ClientError> {
    match *plan {
        VotePlan::Insert {
            comment_id,
            direction,
        } => {
            debug!("Inserting {} vote on comment {}", direction, comment_id);
            Ok(Some(store.insert_comment_vote(comment_id, direction).await?))
        }
        VotePlan::Update { vote_id, direction } => {
            debug!("Flipping vote {} to {}", vote_id, direction);
            Ok(Some(store.update_comment_vote(vote_id, direction).await?))
        }
        VotePlan::Noop => Ok(None),
    }
}

/// Plan and execute in one step; returns the plan that was carried out.
pub async fn cast_comment_vote(
    store: &dyn BackingStore,
    votes: &[CommentVote],
    actor: Uuid,
    comment_id: Uuid,
    direction: VoteDirection,
) -> Result<VotePlan, ClientError> {
    let plan = plan(votes, actor, comment_id, direction);
    execute(store, &plan).await?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use VoteDirection::{Down, Up};

    fn rows_for(store: &MemoryStore, comment_id: Uuid, actor: Uuid) -> Vec<CommentVote> {
        store
            .all_votes()
            .into_iter()
            .filter(|v| v.comment_id == comment_id && v.user_id == actor)
            .collect()
    }

    #[test]
    fn plan_covers_all_three_cases() {
        let actor = Uuid::new_v4();
        let comment = Uuid::new_v4();
        assert_eq!(
            plan(&[], actor, comment, Up),
            VotePlan::Insert {
                comment_id: comment,
                direction: Up
            }
        );

        let existing = CommentVote {
            id: Uuid::new_v4(),
            comment_id: comment,
            user_id: actor,
            vote_type: Up,
            created_at: Utc::now(),
        };
        let rows = vec![existing.clone()];
        assert_eq!(plan(&rows, actor, comment, Up), VotePlan::Noop);
        assert_eq!(
            plan(&rows, actor, comment, Down),
            VotePlan::Update {
                vote_id: existing.id,
                direction: Down
            }
        );
        // Someone else's row does not count
        assert!(matches!(
            plan(&rows, Uuid::new_v4(), comment, Up),
            VotePlan::Insert { .. }
        ));
    }

    #[test]
    fn local_update_preserves_identity() {
        let actor = Uuid::new_v4();
        let comment = Uuid::new_v4();
        let mut rows = vec![];
        let first = plan(&rows, actor, comment, Up);
        apply_locally(&mut rows, actor, &first);
        let original = rows[0].clone();

        let flip = plan(&rows, actor, comment, Down);
        apply_locally(&mut rows, actor, &flip);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, original.id);
        assert_eq!(rows[0].created_at, original.created_at);
        assert_eq!(rows[0].vote_type, Down);
    }

    #[tokio::test]
    async fn same_direction_twice_leaves_one_row() {
        let store = MemoryStore::new();
        let project = store.seed_project("p", "", 0);
        let comment = store.seed_comment(project.id, "c");
        let actor = store.sign_in_as("ada@example.com").await;

        for _ in 0..2 {
            let votes = store.all_votes();
            cast_comment_vote(&store, &votes, actor, comment.id, Up)
                .await
                .unwrap();
        }

        let rows = rows_for(&store, comment.id, actor);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].vote_type, Up);
    }

    #[tokio::test]
    async fn direction_change_updates_the_same_row() {
        let store = MemoryStore::new();
        let project = store.seed_project("p", "", 0);
        let comment = store.seed_comment(project.id, "c");
        let actor = store.sign_in_as("ada@example.com").await;

        cast_comment_vote(&store, &store.all_votes(), actor, comment.id, Up)
            .await
            .unwrap();
        let before = rows_for(&store, comment.id, actor)[0].clone();

        let plan = cast_comment_vote(&store, &store.all_votes(), actor, comment.id, Down)
            .await
            .unwrap();
        assert!(matches!(plan, VotePlan::Update { .. }));

        let after = rows_for(&store, comment.id, actor);
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id, before.id);
        assert_eq!(after[0].created_at, before.created_at);
        assert_eq!(after[0].vote_type, Down);
    }

    #[tokio::test]
    async fn write_failures_propagate() {
        let store = MemoryStore::new();
        let project = store.seed_project("p", "", 0);
        let comment = store.seed_comment(project.id, "c");
        let actor = store.sign_in_as("ada@example.com").await;
        store.fail_writes(true);

        let err = cast_comment_vote(&store, &[], actor, comment.id, Up)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 500, .. }));
        assert!(store.all_votes().is_empty());
    }

    #[tokio::test]
    async fn redundant_call_is_a_successful_noop_even_when_writes_fail() {
        let store = MemoryStore::new();
        let project = store.seed_project("p", "", 0);
        let comment = store.seed_comment(project.id, "c");
        let actor = store.sign_in_as("ada@example.com").await;
        store.seed_vote(comment.id, actor, Down);
        store.fail_writes(true);

        let plan = cast_comment_vote(&store, &store.all_votes(), actor, comment.id, Down)
            .await
            .unwrap();
        assert_eq!(plan, VotePlan::Noop);
    }
}
