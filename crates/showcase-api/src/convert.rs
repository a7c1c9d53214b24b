//! Row -> API model conversion. Corrupt stored values are logged and
//! replaced with defaults rather than failing the whole listing.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use showcase_db::models::{CommentRow, CommentVoteRow, ProfileRow, ProjectRow, UserRow};
use showcase_types::models::{Comment, CommentVote, Profile, Project, User, VoteDirection};

fn uuid_field(table: &str, field: &str, value: &str) -> Uuid {
    value.parse().unwrap_or_else(|e| {
        warn!("Corrupt {}.{} '{}': {}", table, field, value, e);
        Uuid::default()
    })
}

fn opt_uuid_field(table: &str, field: &str, value: Option<&str>) -> Option<Uuid> {
    value.map(|v| uuid_field(table, field, v))
}

pub fn timestamp(value: &str) -> DateTime<Utc> {
    value
        .parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') has no timezone: "YYYY-MM-DD HH:MM:SS"
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", value, e);
            DateTime::default()
        })
}

pub fn user(row: UserRow) -> User {
    User {
        id: uuid_field("users", "id", &row.id),
        email: row.email,
        full_name: row.full_name,
        created_at: timestamp(&row.created_at),
    }
}

pub fn profile(row: ProfileRow) -> Profile {
    Profile {
        id: uuid_field("profiles", "id", &row.id),
        full_name: row.full_name,
        bio: row.bio,
        website: row.website,
        github: row.github,
        twitter: row.twitter,
        created_at: timestamp(&row.created_at),
    }
}

pub fn project(row: ProjectRow) -> Project {
    Project {
        id: uuid_field("projects", "id", &row.id),
        creator_id: opt_uuid_field("projects", "creator_id", row.creator_id.as_deref()),
        created_at: timestamp(&row.created_at),
        title: row.title,
        description: row.description,
        tags: row.tags,
        vote_count: row.vote_count,
    }
}

pub fn comment(row: CommentRow) -> Comment {
    Comment {
        id: uuid_field("comments", "id", &row.id),
        project_id: uuid_field("comments", "project_id", &row.project_id),
        user_id: opt_uuid_field("comments", "user_id", row.user_id.as_deref()),
        created_at: timestamp(&row.created_at),
        content: row.content,
    }
}

/// Votes with an unreadable direction are dropped so they never count
/// toward a tally.
pub fn comment_vote(row: CommentVoteRow) -> Option<CommentVote> {
    let vote_type = match row.vote_type.parse::<VoteDirection>() {
        Ok(v) => v,
        Err(e) => {
            warn!("Skipping comment vote '{}': {}", row.id, e);
            return None;
        }
    };

    Some(CommentVote {
        id: uuid_field("comment_votes", "id", &row.id),
        comment_id: uuid_field("comment_votes", "comment_id", &row.comment_id),
        user_id: uuid_field("comment_votes", "user_id", &row.user_id),
        vote_type,
        created_at: timestamp(&row.created_at),
    })
}
