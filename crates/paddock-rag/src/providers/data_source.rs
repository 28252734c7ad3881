//! Live snapshot source backed by a key/value store

use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::StoreConfig;
use crate::error::{Error, Result};

/// Returned when the snapshot key holds no value
pub const NO_DATA_PLACEHOLDER: &str = "No current data available.";

/// Trait for reading raw values from a key/value store
///
/// Implementations:
/// - `RedisStore`: shared Redis instance fed by the upstream data pipeline
/// - `MemoryStore`: in-process map for local runs and tests
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a key; `Ok(None)` when the key is absent
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Check if the store is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get store name for logging
    fn name(&self) -> &str;
}

/// Redis-backed store with a lazily established multiplexed connection
pub struct RedisStore {
    client: redis::Client,
    connection: Mutex<Option<MultiplexedConnection>>,
    connect_timeout: Duration,
}

impl RedisStore {
    /// Create a store from config; does not connect until first use
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| Error::Config(format!("Invalid store.url '{}': {}", config.url, e)))?;

        Ok(Self {
            client,
            connection: Mutex::new(None),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        })
    }

    /// Get the cached connection or open a new one
    async fn connection(&self) -> Result<MultiplexedConnection> {
        let mut guard = self.connection.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let conn = tokio::time::timeout(
            self.connect_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| {
            Error::StoreUnavailable(format!(
                "Timed out connecting to Redis after {}s",
                self.connect_timeout.as_secs()
            ))
        })??;

        tracing::info!("Connected to Redis");
        *guard = Some(conn.clone());
        Ok(conn)
    }

    /// Forget the cached connection so the next call reconnects
    async fn reset(&self) {
        *self.connection.lock().await = None;
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        match conn.get::<_, Option<Vec<u8>>>(key).await {
            Ok(value) => Ok(value),
            Err(e) => {
                if e.is_io_error() || e.is_connection_dropped() {
                    self.reset().await;
                }
                Err(e.into())
            }
        }
    }

    async fn health_check(&self) -> Result<bool> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(_) => return Ok(false),
        };
        let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        Ok(pong.is_ok())
    }

    fn name(&self) -> &str {
        "redis"
    }
}

/// In-memory store
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key
    pub fn set(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Remove a key
    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Reads the current snapshot of domain data
#[derive(Clone)]
pub struct DataSource {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl DataSource {
    /// Create a data source reading `key` from `store`
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Key the snapshot is read from
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Fetch the current snapshot, or the placeholder when the key is absent or empty
    pub async fn fetch_current_data(&self) -> Result<String> {
        match self.store.get(&self.key).await? {
            Some(bytes) if !bytes.is_empty() => match String::from_utf8(bytes) {
                Ok(text) => Ok(text),
                Err(e) => {
                    tracing::warn!(
                        "Snapshot at '{}' is not valid UTF-8, decoding lossily",
                        self.key
                    );
                    Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
                }
            },
            _ => {
                tracing::debug!("No value at '{}' in {}", self.key, self.store.name());
                Ok(NO_DATA_PLACEHOLDER.to_string())
            }
        }
    }
}
