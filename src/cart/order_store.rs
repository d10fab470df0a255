//! Finalized order storage (SQLite)

use crate::models::{Dish, Order};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS orders (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    dishes_json TEXT NOT NULL,
    price REAL NOT NULL,
    delivery_address TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id, created_at DESC);
"#;

pub struct OrderStore {
    conn: Mutex<Connection>,
}

impl OrderStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open order database at {}", db_path))?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize orders schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn insert(&self, order: &Order) -> Result<()> {
        let dishes_json =
            serde_json::to_string(&order.dishes).context("Failed to encode order dishes")?;

        self.conn
            .lock()
            .execute(
                "INSERT INTO orders (id, user_id, dishes_json, price, delivery_address, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    order.id.to_string(),
                    order.user_id.to_string(),
                    dishes_json,
                    order.price,
                    order.delivery_address,
                    order.created_at.to_rfc3339(),
                ],
            )
            .context("Failed to insert order")?;

        info!(
            "📦 Order {} stored for user {}: {} dishes, {:.2}",
            order.id,
            order.user_id,
            order.dishes.len(),
            order.price
        );
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Result<Option<Order>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, user_id, dishes_json, price, delivery_address, created_at
             FROM orders WHERE id = ?1",
        )?;

        let row = stmt
            .query_row(params![id.to_string()], read_row)
            .optional()?;

        row.map(into_order).transpose()
    }

    /// A user's orders, newest first
    pub fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, user_id, dishes_json, price, delivery_address, created_at
             FROM orders WHERE user_id = ?1 ORDER BY created_at DESC",
        )?;

        let rows = stmt
            .query_map(params![user_id.to_string()], read_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(into_order).collect()
    }
}

type OrderRow = (String, String, String, f64, String, String);

fn read_row(row: &Row<'_>) -> rusqlite::Result<OrderRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn into_order(
    (id, user_id, dishes_json, price, delivery_address, created_at): OrderRow,
) -> Result<Order> {
    let dishes: Vec<Dish> =
        serde_json::from_str(&dishes_json).context("Corrupt order dishes")?;

    Ok(Order {
        id: Uuid::parse_str(&id).context("Corrupt order id")?,
        user_id: Uuid::parse_str(&user_id).context("Corrupt order user id")?,
        dishes,
        price,
        delivery_address,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .context("Corrupt order timestamp")?
            .with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cart;

    fn sample_cart(user_id: Uuid) -> Cart {
        let mut cart = Cart::new(user_id);
        cart.add(Dish {
            id: Uuid::new_v4(),
            name: "Croque".to_string(),
            description: "Ham and cheese".to_string(),
            allergens: "gluten, milk".to_string(),
            price: 4.5,
        });
        cart
    }

    #[test]
    fn test_insert_and_get() {
        let store = OrderStore::in_memory().unwrap();
        let user = Uuid::new_v4();
        let order = Order::from_cart(sample_cart(user), "221B Baker St".to_string());

        store.insert(&order).unwrap();

        let fetched = store.get(order.id).unwrap().unwrap();
        assert_eq!(fetched.delivery_address, "221B Baker St");
        assert_eq!(fetched.user_id, user);
        assert_eq!(fetched.dishes, order.dishes);
        assert_eq!(fetched.price, 4.5);
        assert!(store.get(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_list_for_user() {
        let store = OrderStore::in_memory().unwrap();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        for _ in 0..2 {
            store
                .insert(&Order::from_cart(sample_cart(alice), "1 Rue A".to_string()))
                .unwrap();
        }
        store
            .insert(&Order::from_cart(sample_cart(bob), "2 Rue B".to_string()))
            .unwrap();

        assert_eq!(store.list_for_user(alice).unwrap().len(), 2);
        assert_eq!(store.list_for_user(bob).unwrap().len(), 1);
        assert!(store.list_for_user(Uuid::new_v4()).unwrap().is_empty());
    }
}
