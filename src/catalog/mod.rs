//! Dish catalog: storage and endpoints

pub mod api;
pub mod dish_store;

pub use dish_store::DishStore;
