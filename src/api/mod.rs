//! HTTP router and shared application state

use crate::{
    auth::{api as auth_api, auth_middleware, JwtHandler, UserStore},
    cart::{api as cart_api, CartRegistry, OrderStore},
    catalog::{api as catalog_api, DishStore},
    error::ApiError,
    middleware::request_logging,
    models::Config,
};
use anyhow::Result;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub user_store: Arc<UserStore>,
    pub dish_store: Arc<DishStore>,
    pub order_store: Arc<OrderStore>,
    pub carts: Arc<CartRegistry>,
    pub jwt_handler: Arc<JwtHandler>,
}

impl AppState {
    pub fn new(
        user_store: UserStore,
        dish_store: DishStore,
        order_store: OrderStore,
        jwt_handler: JwtHandler,
    ) -> Self {
        Self {
            user_store: Arc::new(user_store),
            dish_store: Arc::new(dish_store),
            order_store: Arc::new(order_store),
            carts: Arc::new(CartRegistry::new()),
            jwt_handler: Arc::new(jwt_handler),
        }
    }

    /// Open every store on the configured database file
    pub fn from_config(config: &Config) -> Result<Self> {
        let jwt_handler = JwtHandler::with_ttl(config.jwt_secret.clone(), config.token_ttl()?);
        let path = config.database_path.as_str();
        Ok(Self::new(
            UserStore::new(path)?.with_bcrypt_cost(config.bcrypt_cost),
            DishStore::new(path)?,
            OrderStore::new(path)?,
            jwt_handler,
        ))
    }
}

/// Build the full route table
///
/// Every method router falls back to `not_found`, so a known path hit with
/// an unrouted method answers 404 JSON like any unknown path.
pub fn router(state: AppState) -> Router {
    // Public routes
    let auth_router = Router::new()
        .route("/register", post(auth_api::register).fallback(not_found))
        .route("/login", post(auth_api::login).fallback(not_found))
        .with_state(state.clone());

    // Protected API routes
    let protected_routes = Router::new()
        .route("/me", get(auth_api::get_current_user).fallback(not_found))
        .route(
            "/dishes",
            get(catalog_api::list_dishes)
                .post(catalog_api::create_dish)
                .fallback(not_found),
        )
        .route("/dishes/:id", get(catalog_api::get_dish).fallback(not_found))
        .route(
            "/cart",
            get(cart_api::get_cart)
                .delete(cart_api::clear_cart)
                .fallback(not_found),
        )
        .route(
            "/cart/finalize",
            post(cart_api::finalize_cart).fallback(not_found),
        )
        .route(
            "/cart/:id",
            post(cart_api::add_to_cart)
                .put(cart_api::remove_from_cart)
                .fallback(not_found),
        )
        .route("/orders", get(cart_api::list_orders).fallback(not_found))
        .route_layer(middleware::from_fn_with_state(
            state.jwt_handler.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(auth_router)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not Found")
}
