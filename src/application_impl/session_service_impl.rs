use crate::application_impl::TokenStore;
use crate::application_port::*;
use crate::domain_model::*;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SessionPaths {
    pub login: String,
    pub logout: String,
}

pub struct RealSessionService {
    api: Arc<dyn ApiClient>,
    token_store: Arc<TokenStore>,
    paths: SessionPaths,
}

impl RealSessionService {
    pub fn new(api: Arc<dyn ApiClient>, token_store: Arc<TokenStore>, paths: SessionPaths) -> Self {
        Self {
            api,
            token_store,
            paths,
        }
    }
}

#[async_trait::async_trait]
impl SessionService for RealSessionService {
    async fn login(&self, input: LoginInput) -> Result<TokenRecord, SessionError> {
        let request = ApiRequest::post(
            self.paths.login.as_str(),
            json!({ "email": input.email, "password": input.password }),
        );
        let response = self.api.send(request).await?;

        let grant = TokenGrant::from_body(&response.body).ok_or(SessionError::MissingToken)?;
        let user_id = grant.user_id.ok_or(SessionError::MissingToken)?;
        let record = TokenRecord {
            access_token: grant.access_token,
            user_id,
        };
        self.token_store.set(&record).await?;

        info!(user_id = %record.user_id, "logged in");
        Ok(record)
    }

    async fn complete_oauth(&self, record: TokenRecord) -> Result<(), SessionError> {
        if !record.is_valid() {
            return Err(SessionError::InvalidRecord);
        }
        self.token_store.set(&record).await?;
        info!(user_id = %record.user_id, "oauth session stored");
        Ok(())
    }

    async fn logout(&self) -> Result<(), SessionError> {
        if self.token_store.is_valid().await {
            let request = ApiRequest::new(Method::Post, self.paths.logout.as_str());
            if let Err(e) = self.api.send(request).await {
                warn!(error = %e, "server logout failed, clearing local session anyway");
            }
        }
        self.token_store.clear().await?;
        info!("logged out");
        Ok(())
    }

    async fn status(&self) -> SessionStatus {
        match self.token_store.get().await {
            Some(record) => SessionStatus::Authenticated {
                user_id: record.user_id,
            },
            None => SessionStatus::Anonymous,
        }
    }
}
