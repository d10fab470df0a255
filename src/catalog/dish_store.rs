//! Dish catalog storage (SQLite)

use crate::models::{Dish, ValidDish};
use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS dishes (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    allergens TEXT NOT NULL,
    price REAL NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_dishes_created_at ON dishes(created_at);
"#;

pub struct DishStore {
    conn: Mutex<Connection>,
}

impl DishStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open dish database at {}", db_path))?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize dishes schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// All dishes in insertion order
    pub fn list(&self) -> Result<Vec<Dish>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, description, allergens, price
             FROM dishes ORDER BY created_at, rowid",
        )?;

        let rows = stmt
            .query_map([], read_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(into_dish).collect()
    }

    pub fn create(&self, dish: ValidDish) -> Result<Dish> {
        let dish = Dish {
            id: Uuid::new_v4(),
            name: dish.name,
            description: dish.description,
            allergens: dish.allergens,
            price: dish.price,
        };

        self.conn
            .lock()
            .execute(
                "INSERT INTO dishes (id, name, description, allergens, price, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    dish.id.to_string(),
                    dish.name,
                    dish.description,
                    dish.allergens,
                    dish.price,
                    Utc::now().to_rfc3339(),
                ],
            )
            .context("Failed to insert dish")?;

        info!("🍽️  Added dish {} ({}) at {:.2}", dish.name, dish.id, dish.price);
        Ok(dish)
    }

    pub fn get(&self, id: Uuid) -> Result<Option<Dish>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, description, allergens, price FROM dishes WHERE id = ?1",
        )?;

        let row = stmt
            .query_row(params![id.to_string()], read_row)
            .optional()?;

        if row.is_none() {
            debug!("Dish {} not found", id);
        }

        row.map(into_dish).transpose()
    }
}

type DishRow = (String, String, String, String, f64);

fn read_row(row: &Row<'_>) -> rusqlite::Result<DishRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn into_dish((id, name, description, allergens, price): DishRow) -> Result<Dish> {
    Ok(Dish {
        id: Uuid::parse_str(&id).context("Corrupt dish id")?,
        name,
        description,
        allergens,
        price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(name: &str, price: f64) -> ValidDish {
        ValidDish {
            name: name.to_string(),
            description: "desc".to_string(),
            allergens: "gluten".to_string(),
            price,
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = DishStore::in_memory().unwrap();
        let dish = store.create(valid("Quiche", 4.2)).unwrap();

        let fetched = store.get(dish.id).unwrap().unwrap();
        assert_eq!(fetched, dish);
        assert!(store.get(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let store = DishStore::in_memory().unwrap();
        assert!(store.list().unwrap().is_empty());

        let a = store.create(valid("A", 1.0)).unwrap();
        let b = store.create(valid("B", 2.0)).unwrap();
        let c = store.create(valid("C", 3.0)).unwrap();

        let ids: Vec<_> = store.list().unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![a.id, b.id, c.id]);
    }
}
