//! Rocket Crous Backend Library
//!
//! Food-ordering API: bearer-token auth, a dish catalog, and per-user
//! carts finalized into stored orders. Exposes every module so the
//! binary and the integration tests share one router.

pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod middleware;
pub mod models;

pub use api::{router, AppState};
pub use models::Config;
