use crate::domain_model::{AccessToken, TokenGrant};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("refresh request failed: {0}")]
    Transport(String),
    #[error("refresh rejected with status {status}")]
    Rejected { status: u16 },
    #[error("refresh response carried no access token")]
    MissingToken,
    #[error("refresh abandoned before it settled")]
    Abandoned,
}

/// Performs the refresh network call itself.
#[async_trait::async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self) -> Result<TokenGrant, RefreshError>;
}

/// Shares one in-flight refresh between every caller that needs a new token.
#[async_trait::async_trait]
pub trait RefreshCoordinator: Send + Sync {
    /// Starts a refresh, or waits on the one already running.
    async fn begin_or_join(&self) -> Result<AccessToken, RefreshError>;
}
