use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Session, VoteDirection};

// -- JWT Claims --

/// JWT claims shared by the API middleware and token issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of the password-recovery and magic-link requests.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyTokenRequest {
    pub token: String,
}

pub type SessionResponse = Session;

// -- Projects --

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectVoteRequest {
    pub delta: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectVoteResponse {
    pub vote_count: i64,
}

// -- Comments --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewComment {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentQuery {
    pub user_id: Uuid,
}

// -- Comment votes --

/// `comment_ids` is a comma-separated list of comment UUIDs.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommentVoteQuery {
    #[serde(default)]
    pub comment_ids: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCommentVote {
    pub comment_id: Uuid,
    pub vote_type: VoteDirection,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCommentVote {
    pub vote_type: VoteDirection,
}

// -- Profiles --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewProfile {
    #[serde(default)]
    pub full_name: String,
}

/// Full replacement of the editable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilePatch {
    pub full_name: String,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub github: Option<String>,
    pub twitter: Option<String>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
