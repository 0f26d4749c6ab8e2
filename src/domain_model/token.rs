use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(pub String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

/// The persisted credential pair. Created on login or OAuth callback,
/// overwritten on refresh, removed on logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub access_token: AccessToken,
    pub user_id: String,
}

impl TokenRecord {
    pub fn new(access_token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            access_token: AccessToken(access_token.into()),
            user_id: user_id.into(),
        }
    }

    /// Presence check only. Expiry is discovered when the server answers 401.
    pub fn is_valid(&self) -> bool {
        !self.access_token.0.is_empty() && !self.user_id.is_empty()
    }
}

/// Token material returned by the login and refresh endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: AccessToken,
    pub user_id: Option<String>,
}

impl TokenGrant {
    /// Reads `accessToken` / `userId` from the body, or from its `data` envelope.
    pub fn from_body(body: &Value) -> Option<Self> {
        let scope = body
            .get("data")
            .filter(|data| data.is_object())
            .unwrap_or(body);

        let access_token = scope
            .get("accessToken")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())?;
        let user_id = scope
            .get("userId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_owned);

        Some(Self {
            access_token: AccessToken(access_token.to_owned()),
            user_id,
        })
    }
}
