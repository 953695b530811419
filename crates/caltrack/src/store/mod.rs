//! Document store for caltrack.
//!
//! Records are JSON objects grouped into named collections. Subscribers hold a
//! `watch` receiver that always carries the latest full snapshot of one
//! collection, so views can recompute whenever it changes.

pub mod migrations;
pub mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::error::Result;

/// A stored document.
pub type Record = Value;

/// Collection holding devices.
pub const DEVICES: &str = "devices";

/// Collection holding user profiles.
pub const USERS: &str = "users";

/// Collection holding failed-login counters, keyed by email.
pub const LOGIN_ATTEMPTS: &str = "login_attempts";

/// A collection-oriented document store.
///
/// Writes are last-write-wins; the store makes no attempt to serialize
/// concurrent sessions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Subscribe to a collection.
    ///
    /// The receiver starts with the current snapshot and is updated after
    /// every write to the collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial snapshot cannot be read.
    async fn subscribe(&self, collection: &str) -> Result<watch::Receiver<Vec<Record>>>;

    /// Every record in a collection, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Record>>;

    /// A single record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>>;

    /// Insert or merge a record.
    ///
    /// Absent (`null`) fields are dropped before persisting. Top-level fields
    /// of `record` replace those of an existing document; fields it does not
    /// mention are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if `record` is not an object or the write fails.
    async fn upsert(&self, collection: &str, id: &str, record: Record) -> Result<()>;

    /// Delete a record. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;
}

/// Remove every `null` object field, recursing into nested objects and arrays.
#[must_use]
pub fn strip_absent(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_absent(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_absent).collect()),
        other => other,
    }
}

/// Merge `update` into `base`, replacing top-level fields.
pub(crate) fn merge_top_level(base: &mut Map<String, Value>, update: Map<String, Value>) {
    for (key, value) in update {
        base.insert(key, value);
    }
}
