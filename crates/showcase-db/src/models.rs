/// Database row types. These map directly to SQLite rows and are kept
/// apart from the showcase-types API models so the DB layer stays independent.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ProfileRow {
    pub id: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub github: Option<String>,
    pub twitter: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ProjectRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: String,
    pub creator_id: Option<String>,
    pub created_at: String,
    pub vote_count: i64,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: String,
    pub project_id: String,
    pub user_id: Option<String>,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct CommentVoteRow {
    pub id: String,
    pub comment_id: String,
    pub user_id: String,
    pub vote_type: String,
    pub created_at: String,
}

/// Editable profile columns, written all at once.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate<'a> {
    pub full_name: &'a str,
    pub bio: Option<&'a str>,
    pub website: Option<&'a str>,
    pub github: Option<&'a str>,
    pub twitter: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    Recovery,
    MagicLink,
}

impl TokenPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recovery => "recovery",
            Self::MagicLink => "magic_link",
        }
    }
}
