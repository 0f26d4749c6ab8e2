use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum TokenLoadError {
    #[error("stored token is not a valid record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("stored token has an empty field")]
    Incomplete,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Owns the persisted [`TokenRecord`] under a single storage key.
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub async fn load(&self) -> Result<Option<TokenRecord>, TokenLoadError> {
        let Some(raw) = self.storage.get(&self.key).await? else {
            return Ok(None);
        };
        let record: TokenRecord = serde_json::from_str(&raw)?;
        if !record.is_valid() {
            return Err(TokenLoadError::Incomplete);
        }
        Ok(Some(record))
    }

    /// Like [`load`](Self::load), but an unreadable record is cleared and
    /// reported as absent.
    pub async fn get(&self) -> Option<TokenRecord> {
        match self.load().await {
            Ok(record) => record,
            Err(TokenLoadError::Storage(e)) => {
                warn!(key = %self.key, error = %e, "reading token record failed");
                None
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "discarding unreadable token record");
                if let Err(e) = self.clear().await {
                    warn!(key = %self.key, error = %e, "clearing token record failed");
                }
                None
            }
        }
    }

    pub async fn access_token(&self) -> Option<AccessToken> {
        self.get().await.map(|record| record.access_token)
    }

    /// Both fields must be non-empty; an incomplete record is refused.
    pub async fn set(&self, record: &TokenRecord) -> Result<(), StorageError> {
        if !record.is_valid() {
            return Err(StorageError::InvalidValue(self.key.clone()));
        }
        let raw = serde_json::to_string(record).map_err(|e| StorageError::Store(e.to_string()))?;
        self.storage.set(&self.key, &raw).await?;
        debug!(key = %self.key, user_id = %record.user_id, "token record stored");
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.key).await?;
        debug!(key = %self.key, "token record cleared");
        Ok(())
    }

    pub async fn is_valid(&self) -> bool {
        self.get().await.is_some_and(|record| record.is_valid())
    }
}
