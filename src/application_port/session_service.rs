use crate::application_port::ClientError;
use crate::domain_model::TokenRecord;
use crate::domain_port::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("login response carried no usable token")]
    MissingToken,
    #[error("token record is incomplete")]
    InvalidRecord,
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticated { user_id: String },
}

#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    async fn login(&self, input: LoginInput) -> Result<TokenRecord, SessionError>;
    /// Stores the token pair handed over by an OAuth redirect.
    async fn complete_oauth(&self, record: TokenRecord) -> Result<(), SessionError>;
    async fn logout(&self) -> Result<(), SessionError>;
    async fn status(&self) -> SessionStatus;
}
