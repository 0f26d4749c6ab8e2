use crate::domain_port::*;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Keys live under `prefix:`; with a TTL set, a stored token vanishes on its
/// own once the server-side refresh window has passed.
pub struct RedisKeyValueStorage {
    conn: ConnectionManager,
    prefix: String,
    ttl_secs: Option<u64>,
}

impl RedisKeyValueStorage {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>, ttl_secs: Option<u64>) -> Self {
        RedisKeyValueStorage {
            conn,
            prefix: prefix.into(),
            ttl_secs,
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

#[async_trait::async_trait]
impl KeyValueStorage for RedisKeyValueStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| StorageError::Store(e.to_string()))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let _: () = match self.ttl_secs {
            Some(ttl_secs) => conn.set_ex(&key, value, ttl_secs).await,
            None => conn.set(&key, value).await,
        }
        .map_err(|e| StorageError::Store(e.to_string()))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(&key)
            .await
            .map_err(|e| StorageError::Store(e.to_string()))?;
        Ok(())
    }
}
