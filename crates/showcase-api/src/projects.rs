use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;
use uuid::Uuid;

use showcase_types::api::{NewProject, ProjectQuery, ProjectVoteRequest, ProjectVoteResponse};
use showcase_types::models::{Project, normalize_tags};
use showcase_types::validate;

use crate::auth::{AppState, db_call};
use crate::convert;
use crate::error::ApiError;
use crate::middleware::Viewer;

pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let creator = query.creator_id.map(|id| id.to_string());
    let rows = db_call(&state, move |db| {
        Ok(db.list_projects(creator.as_deref(), query.limit)?)
    })
    .await?;

    Ok(Json(rows.into_iter().map(convert::project).collect()))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Project>, ApiError> {
    let row = db_call(&state, move |db| Ok(db.get_project(&project_id.to_string())?))
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".into()))?;

    Ok(Json(convert::project(row)))
}

/// Anonymous submissions are stored with no creator.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<NewProject>,
) -> Result<impl IntoResponse, ApiError> {
    validate::project(&req.title, &req.description).map_err(ApiError::BadRequest)?;

    let id = Uuid::new_v4().to_string();
    let creator = viewer.user_id().map(|u| u.to_string());
    let title = req.title.trim().to_string();
    let description = req.description.trim().to_string();
    let tags = normalize_tags(&req.tags);

    let row = db_call(&state, move |db| {
        Ok(db.insert_project(&id, &title, &description, &tags, creator.as_deref())?)
    })
    .await?;

    debug!("Project {} submitted by {:?}", row.id, row.creator_id);
    Ok((StatusCode::CREATED, Json(convert::project(row))))
}

/// Adds a single +1/-1 to the counter. There is no per-voter record for
/// projects, so repeated votes all count.
pub async fn vote_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<ProjectVoteRequest>,
) -> Result<Json<ProjectVoteResponse>, ApiError> {
    if req.delta != 1 && req.delta != -1 {
        return Err(ApiError::BadRequest("Vote delta must be 1 or -1".into()));
    }

    let delta = req.delta;
    let vote_count = db_call(&state, move |db| {
        Ok(db.apply_project_vote(&project_id.to_string(), delta)?)
    })
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".into()))?;

    debug!("Project {} {:+} by {:?} -> {}", project_id, delta, viewer.user_id(), vote_count);
    Ok(Json(ProjectVoteResponse { vote_count }))
}
