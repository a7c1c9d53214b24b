pub mod auth;
pub mod comments;
pub mod convert;
pub mod error;
pub mod middleware;
pub mod profiles;
pub mod projects;
pub mod votes;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post},
};

use crate::auth::AppState;
use crate::middleware::{optional_auth, require_auth};

/// All backing-store routes. CORS and tracing layers are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/recover", post(auth::recover))
        .route("/auth/reset", post(auth::reset_password))
        .route("/auth/otp", post(auth::magic_link))
        .route("/auth/verify", post(auth::verify_magic_link))
        .route("/projects", get(projects::list_projects))
        .route("/projects/{project_id}", get(projects::get_project))
        .route("/projects/{project_id}/comments", get(comments::list_for_project))
        .route("/comments", get(comments::list_by_user))
        .route("/comment-votes", get(votes::list_votes))
        .route("/profiles/{profile_id}", get(profiles::get_profile));

    let viewer_routes = Router::new()
        .route("/projects", post(projects::create_project))
        .route("/projects/{project_id}/vote", post(projects::vote_project))
        .route("/projects/{project_id}/comments", post(comments::create_comment))
        .layer(axum_middleware::from_fn_with_state(state.clone(), optional_auth));

    let protected_routes = Router::new()
        .route("/auth/user", get(auth::current_user))
        .route("/auth/logout", post(auth::logout))
        .route("/comment-votes", post(votes::create_vote))
        .route("/comment-votes/{vote_id}", patch(votes::update_vote))
        .route("/profiles", post(profiles::create_profile))
        .route("/profiles/{profile_id}", patch(profiles::update_profile))
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(viewer_routes)
        .merge(protected_routes)
        .with_state(state)
}
