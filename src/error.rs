//! API error taxonomy rendered as `{"message": ...}` JSON bodies

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

pub const MISSING_DATA: &str = "Error. Please enter the correct requested data";
pub const MISSING_CREDENTIALS: &str = "Error. Please enter the correct username and password";
pub const NO_ACTIVE_CART: &str = "You have no active cart. Add dish to create one";
pub const DISH_NOT_FOUND: &str = "Dish not found";

/// Handler errors
#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str),
    Unauthorized(&'static str),
    UserAlreadyExists,
    NotFound(&'static str),
    InternalError,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::UserAlreadyExists => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ApiError::BadRequest(msg) | ApiError::Unauthorized(msg) | ApiError::NotFound(msg) => {
                *msg
            }
            ApiError::UserAlreadyExists => "User already exists",
            ApiError::InternalError => "Internal server error",
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        ApiError::BadRequest(MISSING_DATA)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_responses() {
        let bad = ApiError::BadRequest(MISSING_DATA).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let unauthorized = ApiError::Unauthorized("Bad credentials").into_response();
        assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

        let exists = ApiError::UserAlreadyExists.into_response();
        assert_eq!(exists.status(), StatusCode::FORBIDDEN);

        let not_found = ApiError::NotFound(NO_ACTIVE_CART).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let internal = ApiError::InternalError.into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::NotFound(DISH_NOT_FOUND).message(), "Dish not found");
        assert_eq!(ApiError::UserAlreadyExists.message(), "User already exists");
    }
}
