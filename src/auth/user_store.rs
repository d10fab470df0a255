//! User Storage
//! Mission: Securely store and manage user accounts with SQLite

use crate::auth::models::User;
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

/// Outcome of [`UserStore::create_user`]
#[derive(Debug)]
pub enum CreateUser {
    Created(User),
    AlreadyExists,
}

/// User storage with SQLite backend
pub struct UserStore {
    conn: Mutex<Connection>,
    bcrypt_cost: u32,
}

impl UserStore {
    /// Create a new user store and initialize database
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open user database at {}", db_path))?;
        Self::from_connection(conn)
    }

    /// Store backed by a private in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize users schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
            bcrypt_cost: DEFAULT_COST,
        })
    }

    /// Override the bcrypt work factor used for new hashes
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Get user by username
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare_cached(
            "SELECT id, username, password_hash, created_at
             FROM users WHERE username = ?1",
        )?;

        let row = stmt
            .query_row(params![username], read_row)
            .optional()?;

        row.map(into_user).transpose()
    }

    /// Look up a user and check the password against the stored hash.
    ///
    /// Returns `None` for an unknown username or a wrong password.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.get_user_by_username(username)? else {
            return Ok(None);
        };

        let valid = verify(password, &user.password_hash).context("Failed to verify password")?;
        Ok(valid.then_some(user))
    }

    /// Create a new user
    pub fn create_user(&self, username: &str, password: &str) -> Result<CreateUser> {
        if self.get_user_by_username(username)?.is_some() {
            return Ok(CreateUser::AlreadyExists);
        }

        let password_hash =
            hash(password, self.bcrypt_cost).context("Failed to hash password")?;

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
            created_at: Utc::now().to_rfc3339(),
        };

        let inserted = self.conn.lock().execute(
            "INSERT INTO users (id, username, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user.id.to_string(),
                user.username,
                user.password_hash,
                user.created_at,
            ],
        );

        match inserted {
            Ok(_) => {}
            // Lost a race with a concurrent registration of the same name
            Err(e) if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) => {
                return Ok(CreateUser::AlreadyExists);
            }
            Err(e) => return Err(e).context("Failed to insert user"),
        }

        info!("✅ Created user: {}", user.username);

        Ok(CreateUser::Created(user))
    }
}

type UserRow = (String, String, String, String);

fn read_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_user((id, username, password_hash, created_at): UserRow) -> Result<User> {
    Ok(User {
        id: Uuid::parse_str(&id).context("Corrupt user id")?,
        username,
        password_hash,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (UserStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = UserStore::new(db_path).unwrap().with_bcrypt_cost(4);
        (store, temp_file)
    }

    fn created(outcome: CreateUser) -> User {
        match outcome {
            CreateUser::Created(user) => user,
            CreateUser::AlreadyExists => panic!("user should have been created"),
        }
    }

    #[test]
    fn test_create_and_retrieve_user() {
        let (store, _temp) = create_test_store();

        let user = created(store.create_user("alice", "password123").unwrap());
        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "password123");

        let retrieved = store.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(retrieved.id, user.id);
        assert_eq!(retrieved.password_hash, user.password_hash);
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let (store, _temp) = create_test_store();

        created(store.create_user("alice", "one").unwrap());
        assert!(matches!(
            store.create_user("alice", "two").unwrap(),
            CreateUser::AlreadyExists
        ));
    }

    #[test]
    fn test_authenticate() {
        let (store, _temp) = create_test_store();
        created(store.create_user("bob", "hunter2").unwrap());

        assert!(store.authenticate("bob", "hunter2").unwrap().is_some());
        assert!(store.authenticate("bob", "wrong").unwrap().is_none());
        assert!(store.authenticate("nobody", "hunter2").unwrap().is_none());
    }

    #[test]
    fn test_users_survive_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();

        {
            let store = UserStore::new(db_path).unwrap().with_bcrypt_cost(4);
            created(store.create_user("carol", "pw").unwrap());
        }

        let reopened = UserStore::new(db_path).unwrap();
        assert!(reopened.authenticate("carol", "pw").unwrap().is_some());
    }
}
