use crate::domain_model::{ApiRequest, ApiResponse};

/// What the caller of the pipeline observes when a request does not succeed.
/// The user has already been notified by the time one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),
    #[error("session expired")]
    SessionExpired,
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("server error (status {status})")]
    Server { status: u16 },
}

#[async_trait::async_trait]
pub trait ApiClient: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError>;
}
