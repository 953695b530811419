//! `SQLite` implementation of [`DocumentStore`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info};

use super::{merge_top_level, migrations, strip_absent, DocumentStore, Record};
use crate::error::{Error, Result};

/// Document store backed by a single `SQLite` database.
///
/// Each document is one row of the `documents` table, its body stored as JSON
/// text. Writes publish the new collection snapshot to every subscriber.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
    /// Snapshot publishers, keyed by collection.
    channels: Mutex<HashMap<String, watch::Sender<Vec<Record>>>>,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self::from_connection(path, conn))
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        migrations::initialize_schema(&conn)?;
        Ok(Self::from_connection(PathBuf::from(":memory:"), conn))
    }

    fn from_connection(path: PathBuf, conn: Connection) -> Self {
        Self {
            path,
            conn: Mutex::new(conn),
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("database connection lock poisoned"))
    }

    fn channels(&self) -> Result<MutexGuard<'_, HashMap<String, watch::Sender<Vec<Record>>>>> {
        self.channels
            .lock()
            .map_err(|_| Error::internal("subscription lock poisoned"))
    }

    fn snapshot(conn: &Connection, collection: &str) -> Result<Vec<Record>> {
        let mut stmt =
            conn.prepare("SELECT body FROM documents WHERE collection = ?1 ORDER BY rowid")?;
        let bodies = stmt
            .query_map([collection], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(Error::from))
            .collect()
    }

    fn load(conn: &Connection, collection: &str, id: &str) -> Result<Option<Record>> {
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|body| serde_json::from_str(&body).map_err(Error::from))
            .transpose()
    }

    /// Push the current snapshot to subscribers of `collection`, if any.
    fn publish(&self, conn: &Connection, collection: &str) -> Result<()> {
        let channels = self.channels()?;
        if let Some(sender) = channels.get(collection) {
            let snapshot = Self::snapshot(conn, collection)?;
            debug!(
                "Publishing {} records of {} to {} subscribers",
                snapshot.len(),
                collection,
                sender.receiver_count()
            );
            sender.send_replace(snapshot);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn subscribe(&self, collection: &str) -> Result<watch::Receiver<Vec<Record>>> {
        let conn = self.conn()?;
        let mut channels = self.channels()?;
        if let Some(sender) = channels.get(collection) {
            return Ok(sender.subscribe());
        }
        let (sender, receiver) = watch::channel(Self::snapshot(&conn, collection)?);
        channels.insert(collection.to_string(), sender);
        Ok(receiver)
    }

    async fn fetch_all(&self, collection: &str) -> Result<Vec<Record>> {
        let conn = self.conn()?;
        Self::snapshot(&conn, collection)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>> {
        let conn = self.conn()?;
        Self::load(&conn, collection, id)
    }

    async fn upsert(&self, collection: &str, id: &str, record: Record) -> Result<()> {
        let Value::Object(update) = strip_absent(record) else {
            return Err(Error::internal(format!(
                "record {collection}/{id} is not an object"
            )));
        };

        let conn = self.conn()?;
        let merged = match Self::load(&conn, collection, id)? {
            Some(Value::Object(mut existing)) => {
                merge_top_level(&mut existing, update);
                existing
            }
            _ => update,
        };
        let body = serde_json::to_string(&Value::Object(merged))?;

        conn.execute(
            r"
            INSERT INTO documents (collection, id, body, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (collection, id) DO UPDATE
            SET body = excluded.body, updated_at = excluded.updated_at
            ",
            params![collection, id, body, Utc::now().to_rfc3339()],
        )?;
        debug!("Upserted {}/{}", collection, id);

        self.publish(&conn, collection)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        if removed > 0 {
            debug!("Deleted {}/{}", collection, id);
            self.publish(&conn, collection)?;
        }
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_and_get() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert("devices", "d1", json!({"id": "d1", "name": "Meter"}))
            .await
            .unwrap();

        let record = store.get("devices", "d1").await.unwrap().unwrap();
        assert_eq!(record["name"], "Meter");
        assert!(store.get("devices", "missing").await.unwrap().is_none());
        assert!(store.get("users", "d1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_strips_nulls_and_merges() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert("devices", "d1", json!({"name": "Meter", "model": "87V"}))
            .await
            .unwrap();
        store
            .upsert("devices", "d1", json!({"name": "Scope", "photo": null}))
            .await
            .unwrap();

        let record = store.get("devices", "d1").await.unwrap().unwrap();
        assert_eq!(record, json!({"name": "Scope", "model": "87V"}));
    }

    #[tokio::test]
    async fn test_upsert_rejects_non_object() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.upsert("devices", "d1", json!([1, 2])).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_all_keeps_insertion_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        for id in ["b", "a", "c"] {
            store
                .upsert("devices", id, json!({ "id": id }))
                .await
                .unwrap();
        }
        // Updating an existing record does not move it.
        store
            .upsert("devices", "b", json!({"name": "x"}))
            .await
            .unwrap();

        let ids: Vec<String> = store
            .fetch_all("devices")
            .await
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert("devices", "d1", json!({"id": "d1"}))
            .await
            .unwrap();
        assert!(store.delete("devices", "d1").await.unwrap());
        assert!(!store.delete("devices", "d1").await.unwrap());
        assert!(store.fetch_all("devices").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_receives_snapshots() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert("devices", "d1", json!({"id": "d1"}))
            .await
            .unwrap();

        let mut rx = store.subscribe("devices").await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);

        store
            .upsert("devices", "d2", json!({"id": "d2"}))
            .await
            .unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 2);

        store.delete("devices", "d1").await.unwrap();
        rx.changed().await.unwrap();
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot, vec![json!({"id": "d2"})]);
    }

    #[tokio::test]
    async fn test_writes_to_other_collections_do_not_notify() {
        let store = SqliteStore::open_in_memory().unwrap();
        let rx = store.subscribe("devices").await.unwrap();
        store
            .upsert("users", "u1", json!({"username": "admin"}))
            .await
            .unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_open_on_disk_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("caltrack.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            assert_eq!(store.path(), path.as_path());
            store
                .upsert("devices", "d1", json!({"id": "d1", "name": "Meter"}))
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let records = store.fetch_all("devices").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "Meter");
    }
}
