//! Cart endpoints and order finalization

use crate::{
    api::AppState,
    auth::Claims,
    cart::registry::RemoveError,
    catalog::api::resolve_dish,
    error::{ApiError, MISSING_DATA, NO_ACTIVE_CART},
    models::{Cart, Order},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

pub const ORDER_SENT: &str = "Your order has been sent, you'll soon be alert about delivery time";
pub const CART_CLEARED: &str = "Your cart has been cleared. Add dish to create one";

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub cart: Cart,
}

#[derive(Debug, Serialize)]
pub struct CartUpdateResponse {
    pub message: String,
    pub cart: Cart,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct FinalizeRequest {
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FinalizeResponse {
    pub cart: Order,
    pub message: &'static str,
}

fn user_id(claims: &Claims) -> Result<Uuid, ApiError> {
    claims
        .user_id()
        .ok_or(ApiError::Unauthorized("Error. Bad token"))
}

/// GET /cart
pub async fn get_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .get(user_id(&claims)?)
        .ok_or(ApiError::NotFound(NO_ACTIVE_CART))?;

    Ok(Json(CartResponse { cart }))
}

/// POST /cart/:id
pub async fn add_to_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(dish_id): Path<String>,
) -> Result<Json<CartUpdateResponse>, ApiError> {
    let user = user_id(&claims)?;
    let dish = resolve_dish(&state, &dish_id)?;
    let message = format!("Add dish with name {} to the current cart", dish.name);

    let cart = state.carts.add_dish(user, dish);
    debug!(
        "Cart of {} now holds {} dishes ({:.2})",
        claims.username,
        cart.dishes.len(),
        cart.price
    );

    Ok(Json(CartUpdateResponse { message, cart }))
}

/// PUT /cart/:id
pub async fn remove_from_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(dish_id): Path<String>,
) -> Result<Json<CartUpdateResponse>, ApiError> {
    let user = user_id(&claims)?;
    if state.carts.get(user).is_none() {
        return Err(ApiError::NotFound(NO_ACTIVE_CART));
    }

    let dish = resolve_dish(&state, &dish_id)?;
    let cart = state
        .carts
        .remove_dish(user, dish.id)
        .map_err(|e| match e {
            RemoveError::NoActiveCart => ApiError::NotFound(NO_ACTIVE_CART),
            RemoveError::NotInCart => ApiError::NotFound("Dish is not in the current cart"),
        })?;

    debug!(
        "Removed {} from cart of {} ({:.2} left)",
        dish.name, claims.username, cart.price
    );

    Ok(Json(CartUpdateResponse {
        message: format!("Delete dish with name {} from the current cart", dish.name),
        cart,
    }))
}

/// DELETE /cart
pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.carts.clear(user_id(&claims)?) {
        return Err(ApiError::NotFound(NO_ACTIVE_CART));
    }

    debug!("Cleared cart of {}", claims.username);
    Ok(Json(MessageResponse {
        message: CART_CLEARED,
    }))
}

/// POST /cart/finalize
pub async fn finalize_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<FinalizeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<FinalizeResponse>), ApiError> {
    let Json(payload) = payload?;
    let address = payload
        .address
        .filter(|a| !a.trim().is_empty())
        .ok_or(ApiError::BadRequest(MISSING_DATA))?;

    let user = user_id(&claims)?;
    let cart = state
        .carts
        .take(user)
        .ok_or(ApiError::NotFound(NO_ACTIVE_CART))?;

    let order = Order::from_cart(cart.clone(), address);
    if let Err(e) = state.order_store.insert(&order) {
        error!("Failed to persist order for {}: {:#}", claims.username, e);
        state.carts.restore(cart);
        return Err(ApiError::InternalError);
    }

    info!(
        "🧾 Order {} finalized by {} ({:.2})",
        order.id, claims.username, order.price
    );

    Ok((
        StatusCode::CREATED,
        Json(FinalizeResponse {
            cart: order,
            message: ORDER_SENT,
        }),
    ))
}

/// GET /orders
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state
        .order_store
        .list_for_user(user_id(&claims)?)
        .map_err(|e| {
            error!("Failed to list orders for {}: {:#}", claims.username, e);
            ApiError::InternalError
        })?;

    Ok(Json(orders))
}
