//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation

use crate::auth::jwt::JwtHandler;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use serde_json::json;
use std::sync::{Arc, OnceLock};
use tracing::warn;

static BEARER_RE: OnceLock<Regex> = OnceLock::new();

fn bearer_re() -> &'static Regex {
    BEARER_RE.get_or_init(|| Regex::new(r"(?i)bearer\s+(\S+)").expect("static regex"))
}

/// Pull the token out of an `Authorization` header value.
///
/// Matches `bearer <token>` case-insensitively.
pub fn extract_bearer_token(header_value: &str) -> Option<&str> {
    bearer_re()
        .captures(header_value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Auth middleware that validates JWT tokens
///
/// On success the verified [`Claims`](crate::auth::models::Claims) are
/// inserted into the request extensions for the handlers downstream.
pub async fn auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or(AuthError::MissingToken)?;

    let claims = jwt_handler.validate_token(token).map_err(|e| {
        warn!("Rejected bearer token on {}: {:#}", req.uri().path(), e);
        AuthError::InvalidToken
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Auth error types
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
}

impl AuthError {
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "Error. Need a token",
            AuthError::InvalidToken => "Error. Bad token",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": self.message() })),
        )
            .into_response()
    }
}
