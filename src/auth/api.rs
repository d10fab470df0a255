//! Authentication API Endpoints
//! Mission: Provide register, login and identity endpoints

use crate::{
    api::AppState,
    auth::{
        models::{Claims, CredentialsRequest, LoginResponse, MeResponse, User},
        user_store::CreateUser,
    },
    error::{ApiError, MISSING_CREDENTIALS},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::{error, info, warn};

/// Register endpoint - POST /register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(payload) = payload.map_err(|_| ApiError::BadRequest(MISSING_CREDENTIALS))?;
    let (username, password) = payload
        .fields()
        .ok_or(ApiError::BadRequest(MISSING_CREDENTIALS))?;

    let outcome = state
        .user_store
        .create_user(username, password)
        .map_err(|e| {
            error!("Failed to create user {}: {:#}", username, e);
            ApiError::InternalError
        })?;

    match outcome {
        CreateUser::Created(user) => Ok((StatusCode::CREATED, Json(user))),
        CreateUser::AlreadyExists => {
            warn!("Registration refused, username taken: {}", username);
            Err(ApiError::UserAlreadyExists)
        }
    }
}

/// Login endpoint - POST /login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload.map_err(|_| ApiError::BadRequest(MISSING_CREDENTIALS))?;
    let (username, password) = payload
        .fields()
        .ok_or(ApiError::BadRequest(MISSING_CREDENTIALS))?;

    info!("🔐 Login attempt: {}", username);

    let user = state
        .user_store
        .authenticate(username, password)
        .map_err(|e| {
            error!("Credential lookup failed for {}: {:#}", username, e);
            ApiError::InternalError
        })?
        .ok_or_else(|| {
            warn!("❌ Failed login attempt: {}", username);
            ApiError::Unauthorized("Bad credentials")
        })?;

    let (token, expires_in) = state.jwt_handler.generate_token(&user).map_err(|e| {
        error!("Token generation failed: {:#}", e);
        ApiError::InternalError
    })?;

    info!("✅ Login successful: {}", user.username);

    Ok(Json(LoginResponse { token, expires_in }))
}

/// Get current identity - GET /me
/// Reads the claims verified by the auth middleware (no database lookup)
pub async fn get_current_user(Extension(claims): Extension<Claims>) -> Json<MeResponse> {
    Json(MeResponse { content: claims })
}
