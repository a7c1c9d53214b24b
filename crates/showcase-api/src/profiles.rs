use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use showcase_db::models::ProfileUpdate;
use showcase_types::api::{Claims, NewProfile, ProfilePatch};
use showcase_types::models::Profile;

use crate::auth::{AppState, db_call};
use crate::convert;
use crate::error::ApiError;

pub async fn get_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError> {
    let row = db_call(&state, move |db| Ok(db.get_profile(&profile_id.to_string())?))
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;

    Ok(Json(convert::profile(row)))
}

/// Create the caller's own profile. Clients call this lazily on the first
/// authenticated session.
pub async fn create_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<NewProfile>,
) -> Result<impl IntoResponse, ApiError> {
    let id = claims.sub.to_string();
    let full_name = req.full_name.trim().to_string();
    let row = db_call(&state, move |db| {
        db.insert_profile(&id, &full_name).map_err(|e| {
            if showcase_db::is_constraint_violation(&e) {
                ApiError::Conflict("Profile already exists".into())
            } else {
                e.into()
            }
        })
    })
    .await?;

    info!("Profile created for {}", row.id);
    Ok((StatusCode::CREATED, Json(convert::profile(row))))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn update_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<Profile>, ApiError> {
    if profile_id != claims.sub {
        return Err(ApiError::Forbidden("You can only edit your own profile".into()));
    }
    let full_name = patch.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(ApiError::BadRequest("Name is required.".into()));
    }

    let bio = non_blank(patch.bio);
    let website = non_blank(patch.website);
    let github = non_blank(patch.github);
    let twitter = non_blank(patch.twitter);

    let row = db_call(&state, move |db| {
        let update = ProfileUpdate {
            full_name: &full_name,
            bio: bio.as_deref(),
            website: website.as_deref(),
            github: github.as_deref(),
            twitter: twitter.as_deref(),
        };
        Ok(db.update_profile(&profile_id.to_string(), &update)?)
    })
    .await?
    .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;

    Ok(Json(convert::profile(row)))
}
