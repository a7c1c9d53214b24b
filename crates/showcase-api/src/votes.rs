use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;
use uuid::Uuid;

use showcase_types::api::{Claims, CommentVoteQuery, NewCommentVote, UpdateCommentVote};
use showcase_types::models::CommentVote;

use crate::auth::{AppState, db_call};
use crate::convert;
use crate::error::ApiError;

fn parse_comment_ids(raw: &str) -> Result<Vec<String>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Uuid>()
                .map(|id| id.to_string())
                .map_err(|_| ApiError::BadRequest(format!("Invalid comment id: {s}")))
        })
        .collect()
}

/// All vote rows for the given comments, unaggregated. Clients derive
/// scores themselves.
pub async fn list_votes(
    State(state): State<AppState>,
    Query(query): Query<CommentVoteQuery>,
) -> Result<Json<Vec<CommentVote>>, ApiError> {
    let ids = parse_comment_ids(&query.comment_ids)?;
    let rows = db_call(&state, move |db| Ok(db.votes_for_comments(&ids)?)).await?;

    Ok(Json(rows.into_iter().filter_map(convert::comment_vote).collect()))
}

pub async fn create_vote(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<NewCommentVote>,
) -> Result<impl IntoResponse, ApiError> {
    let id = Uuid::new_v4().to_string();
    let voter = claims.sub.to_string();
    let comment_id = req.comment_id.to_string();

    let row = db_call(&state, move |db| {
        if db.get_comment(&comment_id)?.is_none() {
            return Err(ApiError::NotFound("Comment not found".into()));
        }
        db.insert_comment_vote(&id, &comment_id, &voter, req.vote_type.as_str())
            .map_err(|e| {
                if showcase_db::is_constraint_violation(&e) {
                    ApiError::Conflict("You have already voted on this comment".into())
                } else {
                    e.into()
                }
            })
    })
    .await?;

    debug!("Vote {} on comment {} by {}", row.vote_type, row.comment_id, row.user_id);
    let vote = convert::comment_vote(row)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("stored vote is unreadable")))?;
    Ok((StatusCode::CREATED, Json(vote)))
}

/// Flip an existing vote. Only the voter who owns the row may change it.
pub async fn update_vote(
    State(state): State<AppState>,
    Path(vote_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateCommentVote>,
) -> Result<Json<CommentVote>, ApiError> {
    let voter = claims.sub.to_string();
    let row = db_call(&state, move |db| {
        Ok(db.update_comment_vote(&vote_id.to_string(), &voter, req.vote_type.as_str())?)
    })
    .await?
    .ok_or_else(|| ApiError::NotFound("Vote not found".into()))?;

    let vote = convert::comment_vote(row)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("stored vote is unreadable")))?;
    Ok(Json(vote))
}
