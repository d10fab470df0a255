//! Catalog endpoints

use crate::{
    api::AppState,
    error::{ApiError, DISH_NOT_FOUND, MISSING_DATA},
    models::{Dish, NewDish},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::{error, warn};
use uuid::Uuid;

/// GET /dishes
pub async fn list_dishes(State(state): State<AppState>) -> Result<Json<Vec<Dish>>, ApiError> {
    let dishes = state.dish_store.list().map_err(|e| {
        error!("Failed to list dishes: {:#}", e);
        ApiError::InternalError
    })?;

    Ok(Json(dishes))
}

/// POST /dishes
pub async fn create_dish(
    State(state): State<AppState>,
    payload: Result<Json<NewDish>, JsonRejection>,
) -> Result<(StatusCode, Json<Dish>), ApiError> {
    let Json(payload) = payload?;
    let dish = payload.validate().ok_or(ApiError::BadRequest(MISSING_DATA))?;

    let dish = state.dish_store.create(dish).map_err(|e| {
        error!("Failed to create dish: {:#}", e);
        ApiError::InternalError
    })?;

    Ok((StatusCode::CREATED, Json(dish)))
}

/// GET /dishes/:id
pub async fn get_dish(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Dish>, ApiError> {
    resolve_dish(&state, &id).map(Json)
}

/// Look up a dish by its path id.
///
/// Malformed ids and store failures are both reported as not found.
pub(crate) fn resolve_dish(state: &AppState, id: &str) -> Result<Dish, ApiError> {
    let not_found = ApiError::NotFound(DISH_NOT_FOUND);

    let Ok(id) = Uuid::parse_str(id) else {
        return Err(not_found);
    };

    match state.dish_store.get(id) {
        Ok(Some(dish)) => Ok(dish),
        Ok(None) => Err(not_found),
        Err(e) => {
            warn!("Dish lookup for {} failed: {:#}", id, e);
            Err(not_found)
        }
    }
}
