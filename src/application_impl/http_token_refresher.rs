use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

/// Calls the refresh endpoint. No Authorization header is attached; the
/// server identifies the session from ambient credentials (the refresh
/// cookie kept by the transport).
pub struct HttpTokenRefresher {
    transport: Arc<dyn HttpTransport>,
    refresh_path: String,
}

impl HttpTokenRefresher {
    pub fn new(transport: Arc<dyn HttpTransport>, refresh_path: impl Into<String>) -> Self {
        Self {
            transport,
            refresh_path: refresh_path.into(),
        }
    }
}

#[async_trait::async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self) -> Result<TokenGrant, RefreshError> {
        let request = ApiRequest::new(Method::Post, self.refresh_path.as_str());
        let response = self
            .transport
            .execute(&request)
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        if !response.is_success() {
            return Err(RefreshError::Rejected {
                status: response.status,
            });
        }
        TokenGrant::from_body(&response.body).ok_or(RefreshError::MissingToken)
    }
}
