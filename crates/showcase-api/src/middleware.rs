use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use showcase_types::api::Claims;

use crate::auth::{AppState, decode_token};
use crate::error::ApiError;

/// The caller on routes where signing in is optional (anonymous project
/// submission, anonymous comments).
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<Claims>);

impl Viewer {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|c| c.sub)
    }
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn verify(state: &AppState, token: &str) -> Result<Claims, ApiError> {
    decode_token(&state.jwt_secret, token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired session".into()))
}

/// Extract and validate the JWT from the Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&req)
        .ok_or_else(|| ApiError::Unauthorized("Sign in required".into()))?;
    let claims = verify(&state, &token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Like `require_auth`, but a missing header yields an anonymous `Viewer`.
/// A header that is present but invalid is still rejected.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let viewer = match bearer_token(&req) {
        Some(token) => Viewer(Some(verify(&state, &token)?)),
        None => Viewer(None),
    };

    req.extensions_mut().insert(viewer);
    Ok(next.run(req).await)
}
