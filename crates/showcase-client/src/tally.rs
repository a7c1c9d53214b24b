//! Comment scores are never stored; they are derived from the raw vote rows
//! on every render.

use uuid::Uuid;

use showcase_types::models::{CommentVote, VoteDirection};

/// Net score of one comment: up-votes minus down-votes among its rows.
pub fn tally(votes: &[CommentVote], comment_id: Uuid) -> i64 {
    votes
        .iter()
        .filter(|v| v.comment_id == comment_id)
        .map(|v| v.vote_type.delta())
        .sum()
}

/// The direction `user_id` currently holds on `comment_id`, if any.
pub fn my_vote(votes: &[CommentVote], comment_id: Uuid, user_id: Uuid) -> Option<VoteDirection> {
    votes
        .iter()
        .find(|v| v.comment_id == comment_id && v.user_id == user_id)
        .map(|v| v.vote_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use VoteDirection::{Down, Up};

    fn vote(comment_id: Uuid, user_id: Uuid, vote_type: VoteDirection) -> CommentVote {
        CommentVote {
            id: Uuid::new_v4(),
            comment_id,
            user_id,
            vote_type,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_rows_tally_zero() {
        assert_eq!(tally(&[], Uuid::new_v4()), 0);
    }

    #[test]
    fn counts_only_the_requested_comment() {
        let c1 = Uuid::new_v4();
        let c2 = Uuid::new_v4();
        let votes = vec![
            vote(c1, Uuid::new_v4(), Up),
            vote(c1, Uuid::new_v4(), Up),
            vote(c1, Uuid::new_v4(), Down),
            vote(c2, Uuid::new_v4(), Down),
            vote(c2, Uuid::new_v4(), Down),
        ];
        assert_eq!(tally(&votes, c1), 1);
        assert_eq!(tally(&votes, c2), -2);
        assert_eq!(tally(&votes, Uuid::new_v4()), 0);
    }

    #[test]
    fn order_does_not_matter() {
        let c = Uuid::new_v4();
        let mut votes: Vec<CommentVote> = (0..7)
            .map(|i| vote(c, Uuid::new_v4(), if i % 3 == 0 { Down } else { Up }))
            .collect();
        let forward = tally(&votes, c);
        votes.reverse();
        assert_eq!(tally(&votes, c), forward);
        votes.rotate_left(3);
        assert_eq!(tally(&votes, c), forward);
        // Pure: same input, same output
        assert_eq!(tally(&votes, c), tally(&votes, c));
    }

    #[test]
    fn my_vote_finds_the_callers_row() {
        let c = Uuid::new_v4();
        let me = Uuid::new_v4();
        let votes = vec![vote(c, Uuid::new_v4(), Up), vote(c, me, Down)];
        assert_eq!(my_vote(&votes, c, me), Some(Down));
        assert_eq!(my_vote(&votes, Uuid::new_v4(), me), None);
    }
}
