//! Per-user carts and the orders they finalize into

pub mod api;
pub mod order_store;
pub mod registry;

pub use order_store::OrderStore;
pub use registry::CartRegistry;
