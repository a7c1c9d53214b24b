use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use showcase_db::Database;
use showcase_db::models::{TokenPurpose, UserRow};
use showcase_types::api::{
    Claims, EmailRequest, LoginRequest, ResetPasswordRequest, SessionResponse, SignupRequest,
    VerifyTokenRequest,
};
use showcase_types::models::Session;
use showcase_types::validate;

use crate::convert;
use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Lifetime of password-recovery and magic-link tokens.
    pub token_ttl: chrono::Duration,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: String, token_ttl: chrono::Duration) -> AppState {
        Arc::new(Self { db, jwt_secret, token_ttl })
    }
}

/// Run blocking DB work off the async runtime.
pub(crate) async fn db_call<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate::signup(&req.full_name, &req.email, &req.password, None)
        .map_err(ApiError::BadRequest)?;

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    let user_id = Uuid::new_v4().to_string();
    let email = req.email.trim().to_lowercase();
    let full_name = req.full_name.trim().to_string();

    let row = db_call(&state, move |db| {
        if db.get_user_by_email(&email)?.is_some() {
            return Err(ApiError::Conflict("User already registered".into()));
        }
        db.create_user(&user_id, &email, &password_hash, &full_name)
            .map_err(|e| {
                if showcase_db::is_constraint_violation(&e) {
                    ApiError::Conflict("User already registered".into())
                } else {
                    e.into()
                }
            })
    })
    .await?;

    info!("New account {} registered", row.id);
    let session = issue_session(&state, row)?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    validate::login(&req.email, &req.password).map_err(ApiError::BadRequest)?;

    let email = req.email.trim().to_lowercase();
    let user = db_call(&state, move |db| Ok(db.get_user_by_email(&email)?))
        .await?
        .ok_or_else(invalid_credentials)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("stored hash for {} is unreadable: {}", user.id, e))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| invalid_credentials())?;

    Ok(Json(issue_session(&state, user)?))
}

/// Sessions are stateless JWTs; signing out only drops the client's copy.
pub async fn logout(Extension(claims): Extension<Claims>) -> StatusCode {
    debug!("User {} signed out", claims.sub);
    StatusCode::NO_CONTENT
}

pub async fn current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let user = db_call(&state, move |db| Ok(db.get_user_by_id(&uid)?))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(convert::user(user)))
}

/// Always answers 202 so the endpoint cannot be used to probe for accounts.
pub async fn recover(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> Result<StatusCode, ApiError> {
    validate::recovery_email(&req.email).map_err(ApiError::BadRequest)?;
    send_one_time_token(&state, &req.email, TokenPurpose::Recovery).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    validate::password(&req.password).map_err(ApiError::BadRequest)?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    let token_hash = hash_token(&req.token);
    let user = db_call(&state, move |db| {
        let user_id = db
            .consume_auth_token(&token_hash, TokenPurpose::Recovery)?
            .ok_or_else(invalid_token)?;
        db.update_password(&user_id, &password_hash)?;
        db.get_user_by_id(&user_id)?.ok_or_else(invalid_token)
    })
    .await?;

    info!("Password reset for {}", user.id);
    Ok(Json(issue_session(&state, user)?))
}

/// Magic links are only issued to existing accounts.
pub async fn magic_link(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> Result<StatusCode, ApiError> {
    if !validate::is_valid_email(&req.email) {
        return Err(ApiError::BadRequest("Please enter a valid email address.".into()));
    }
    send_one_time_token(&state, &req.email, TokenPurpose::MagicLink).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn verify_magic_link(
    State(state): State<AppState>,
    Json(req): Json<VerifyTokenRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let token_hash = hash_token(&req.token);
    let user = db_call(&state, move |db| {
        let user_id = db
            .consume_auth_token(&token_hash, TokenPurpose::MagicLink)?
            .ok_or_else(invalid_token)?;
        db.get_user_by_id(&user_id)?.ok_or_else(invalid_token)
    })
    .await?;

    Ok(Json(issue_session(&state, user)?))
}

/// Look up the account and, if it exists, store a fresh token for it.
/// Outgoing mail is not wired up; the token is written to the debug log.
async fn send_one_time_token(
    state: &AppState,
    email: &str,
    purpose: TokenPurpose,
) -> Result<(), ApiError> {
    let email = email.trim().to_lowercase();
    let ttl = state.token_ttl;
    let lookup = email.clone();
    let issued = db_call(state, move |db| {
        match db.get_user_by_email(&lookup)? {
            Some(user) => Ok(Some(issue_one_time_token(db, &user.id, purpose, ttl)?)),
            None => Ok(None),
        }
    })
    .await?;

    match issued {
        Some(token) => debug!("{} token for {}: {}", purpose.as_str(), email, token),
        None => debug!("{} requested for unknown address {}", purpose.as_str(), email),
    }
    Ok(())
}

pub(crate) fn issue_one_time_token(
    db: &Database,
    user_id: &str,
    purpose: TokenPurpose,
    ttl: chrono::Duration,
) -> anyhow::Result<String> {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    let token = URL_SAFE_NO_PAD.encode(bytes);

    let expires_at = (chrono::Utc::now() + ttl).to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
    db.insert_auth_token(&hash_token(&token), user_id, purpose, &expires_at)?;
    Ok(token)
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn issue_session(state: &AppState, row: UserRow) -> Result<Session, ApiError> {
    let user = convert::user(row);
    let access_token = create_token(&state.jwt_secret, user.id, &user.email)?;
    Ok(Session { access_token, user })
}

fn invalid_credentials() -> ApiError {
    ApiError::BadRequest("Invalid login credentials".into())
}

fn invalid_token() -> ApiError {
    ApiError::Unauthorized("Token has expired or is invalid".into())
}

pub fn create_token(secret: &str, user_id: Uuid, email: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(secret: &str, token: &str) -> anyhow::Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
