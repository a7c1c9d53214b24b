use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Polarity of a vote on a project or a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Score contribution of a single vote in this direction.
    pub fn delta(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(format!("unknown vote direction: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

/// An authenticated session: the bearer token plus the user it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: User,
}

/// A submitted project. `vote_count` is a plain counter adjusted by deltas;
/// no per-voter rows exist for projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub tags: String,
    pub creator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub vote_count: i64,
}

impl Project {
    pub fn tag_list(&self) -> Vec<&str> {
        split_tags(&self.tags)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One voter's vote on one comment. At most one row exists per
/// (comment_id, user_id); a change of mind flips `vote_type` in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentVote {
    pub id: Uuid,
    pub comment_id: Uuid,
    pub user_id: Uuid,
    pub vote_type: VoteDirection,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub github: Option<String>,
    pub twitter: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// First letter of each word of the display name, or "U" when unnamed.
    pub fn initials(&self) -> String {
        let initials: String = self
            .full_name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .collect();
        if initials.is_empty() {
            "U".to_string()
        } else {
            initials
        }
    }
}

/// Split a comma-separated tag string into trimmed, non-empty tags.
pub fn split_tags(tags: &str) -> Vec<&str> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Canonical storage form of a user-entered tag string: `" ai, ,web "` -> `"ai,web"`.
pub fn normalize_tags(tags: &str) -> String {
    split_tags(tags).join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_tags_trims_and_drops_empty() {
        assert_eq!(split_tags("ai, web , design"), vec!["ai", "web", "design"]);
        assert_eq!(split_tags(" , ,"), Vec::<&str>::new());
        assert_eq!(split_tags(""), Vec::<&str>::new());
    }

    #[test]
    fn normalize_tags_joins_without_spaces() {
        assert_eq!(normalize_tags(" ai, ,web "), "ai,web");
    }

    #[test]
    fn direction_parses_and_prints() {
        assert_eq!("up".parse::<VoteDirection>(), Ok(VoteDirection::Up));
        assert_eq!("down".parse::<VoteDirection>(), Ok(VoteDirection::Down));
        assert!("sideways".parse::<VoteDirection>().is_err());
        assert_eq!(VoteDirection::Down.to_string(), "down");
        assert_eq!(VoteDirection::Up.delta() + VoteDirection::Down.delta(), 0);
    }

    #[test]
    fn initials_fall_back_to_u() {
        let mut profile = Profile {
            id: Uuid::new_v4(),
            full_name: "Ada  Lovelace".into(),
            bio: None,
            website: None,
            github: None,
            twitter: None,
            created_at: Utc::now(),
        };
        assert_eq!(profile.initials(), "AL");
        profile.full_name = "   ".into();
        assert_eq!(profile.initials(), "U");
    }
}
