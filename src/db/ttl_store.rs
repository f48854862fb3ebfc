//! Expiring key-value stores used for scan codes.
//!
//! Reads of an expired entry behave exactly like reads of a key that was
//! never written; expired entries are dropped lazily on access.

use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

pub trait TtlStore {
    fn set(&self, key: &str, value: &str, ttl_secs: i64, now: i64) -> AppResult<()>;
    fn get(&self, key: &str, now: i64) -> AppResult<Option<String>>;
}

/// Process-local store. Lifetime is whatever the host gives it.
#[derive(Default)]
pub struct MemoryTtlStore {
    entries: Mutex<HashMap<String, (String, i64)>>,
}

impl MemoryTtlStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TtlStore for MemoryTtlStore {
    fn set(&self, key: &str, value: &str, ttl_secs: i64, now: i64) -> AppResult<()> {
        let mut map = self
            .entries
            .lock()
            .map_err(|_| AppError::Other("ttl store lock poisoned".into()))?;
        map.insert(key.to_string(), (value.to_string(), now + ttl_secs));
        Ok(())
    }

    fn get(&self, key: &str, now: i64) -> AppResult<Option<String>> {
        let mut map = self
            .entries
            .lock()
            .map_err(|_| AppError::Other("ttl store lock poisoned".into()))?;

        match map.get(key) {
            Some((value, expires_at)) if now < *expires_at => Ok(Some(value.clone())),
            Some(_) => {
                map.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

/// SQLite-backed store, so codes survive between short-lived CLI processes.
/// Owns its connection and its table.
pub struct SqliteTtlStore {
    conn: Connection,
}

impl SqliteTtlStore {
    pub fn open(path: &str) -> AppResult<Self> {
        Self::from_connection(Connection::open(Path::new(path))?)
    }

    pub fn from_connection(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS ttl_store (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn })
    }
}

impl TtlStore for SqliteTtlStore {
    fn set(&self, key: &str, value: &str, ttl_secs: i64, now: i64) -> AppResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO ttl_store (key, value, expires_at) VALUES (?1, ?2, ?3)",
            params![key, value, now + ttl_secs],
        )?;
        Ok(())
    }

    fn get(&self, key: &str, now: i64) -> AppResult<Option<String>> {
        self.conn
            .execute("DELETE FROM ttl_store WHERE expires_at <= ?1", [now])?;

        let value = self
            .conn
            .query_row(
                "SELECT value FROM ttl_store WHERE key = ?1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }
}
