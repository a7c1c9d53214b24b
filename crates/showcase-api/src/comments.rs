use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use showcase_types::api::{CommentQuery, NewComment};
use showcase_types::models::Comment;

use crate::auth::{AppState, db_call};
use crate::convert;
use crate::error::ApiError;
use crate::middleware::Viewer;

/// Newest first.
pub async fn list_for_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let rows = db_call(&state, move |db| {
        Ok(db.comments_for_project(&project_id.to_string())?)
    })
    .await?;

    Ok(Json(rows.into_iter().map(convert::comment).collect()))
}

pub async fn list_by_user(
    State(state): State<AppState>,
    Query(query): Query<CommentQuery>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let rows = db_call(&state, move |db| {
        Ok(db.comments_by_user(&query.user_id.to_string())?)
    })
    .await?;

    Ok(Json(rows.into_iter().map(convert::comment).collect()))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<NewComment>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::BadRequest("Comment cannot be empty.".into()));
    }

    let id = Uuid::new_v4().to_string();
    let author = viewer.user_id().map(|u| u.to_string());
    let row = db_call(&state, move |db| {
        let pid = project_id.to_string();
        if db.get_project(&pid)?.is_none() {
            return Err(ApiError::NotFound("Project not found".into()));
        }
        Ok(db.insert_comment(&id, &pid, author.as_deref(), &content)?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(convert::comment(row))))
}
