use std::fmt::Display;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::auth::jwt::DEFAULT_EXPIRATION_HOURS;

const DEV_JWT_SECRET: &str = "dev-secret-change-in-production-minimum-32-characters";

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_path: "rocket_crous.db".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_hours: DEFAULT_EXPIRATION_HOURS,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let defaults = Self::default();

        let database_path = std::env::var("DATABASE_PATH")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .unwrap_or(defaults.database_path);

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("⚠️  JWT_SECRET not set, using development secret");
            defaults.jwt_secret
        });

        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port),
            database_path,
            jwt_secret,
            token_ttl_hours: checked_ttl_hours(
                parse_var("TOKEN_TTL_HOURS", defaults.token_ttl_hours),
                defaults.token_ttl_hours,
            ),
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Token lifetime as a duration, rejecting non-positive or overflowing values
    pub fn token_ttl(&self) -> Result<Duration> {
        Duration::try_hours(self.token_ttl_hours)
            .filter(|ttl| *ttl > Duration::zero())
            .with_context(|| format!("Token TTL of {} hours is out of range", self.token_ttl_hours))
    }
}

fn checked_ttl_hours(hours: i64, default: i64) -> i64 {
    if (1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
        hours
    } else {
        warn!("Invalid TOKEN_TTL_HOURS value {hours}, expected 1..={MAX_TOKEN_TTL_HOURS}, using default: {default}");
        default
    }
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?} ({e}), using default: {default}");
            default
        }),
        Err(_) => default,
    }
}

/// Catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub allergens: String,
    pub price: f64,
}

/// Body of `POST /dishes`
#[derive(Debug, Default, Deserialize)]
pub struct NewDish {
    pub name: Option<String>,
    pub description: Option<String>,
    pub allergens: Option<String>,
    pub price: Option<f64>,
}

/// A `NewDish` with every field present
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDish {
    pub name: String,
    pub description: String,
    pub allergens: String,
    pub price: f64,
}

impl NewDish {
    pub fn validate(self) -> Option<ValidDish> {
        fn present(field: Option<String>) -> Option<String> {
            field.filter(|s| !s.trim().is_empty())
        }

        Some(ValidDish {
            name: present(self.name)?,
            description: present(self.description)?,
            allergens: present(self.allergens)?,
            price: self.price.filter(|p| p.is_finite() && *p > 0.0)?,
        })
    }
}

/// In-progress order held by the cart registry
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub user_id: Uuid,
    pub dishes: Vec<Dish>,
    pub price: f64,
    pub delivery_address: Option<String>,
}

impl Cart {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            dishes: Vec::new(),
            price: 0.0,
            delivery_address: None,
        }
    }

    pub fn add(&mut self, dish: Dish) {
        self.dishes.push(dish);
        self.reprice();
    }

    /// Remove the first line holding `dish_id`. Returns false if none did.
    pub fn remove_first(&mut self, dish_id: Uuid) -> bool {
        match self.dishes.iter().position(|d| d.id == dish_id) {
            Some(index) => {
                self.dishes.remove(index);
                self.reprice();
                true
            }
            None => false,
        }
    }

    /// Put `earlier` lines ahead of the current ones
    pub fn prepend(&mut self, mut earlier: Vec<Dish>) {
        earlier.append(&mut self.dishes);
        self.dishes = earlier;
        self.reprice();
    }

    fn reprice(&mut self) {
        self.price = self.dishes.iter().map(|d| d.price).sum();
    }
}

/// Finalized cart as persisted in the `orders` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub dishes: Vec<Dish>,
    pub price: f64,
    pub delivery_address: String,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn from_cart(cart: Cart, delivery_address: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: cart.user_id,
            dishes: cart.dishes,
            price: cart.price,
            delivery_address,
            created_at: Utc::now(),
        }
    }
}
