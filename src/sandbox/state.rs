use super::error::SandboxError;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use nanoid::nanoid;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    Rotate,
    Fail(u16),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub access_token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    #[serde(skip)]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, skip_deserializing)]
    pub owner: String,
}

struct Controls {
    refresh_mode: RefreshMode,
    refresh_latency: Duration,
    authorizations: Vec<Option<String>>,
}

/// In-memory auth backend behind the sandbox routes.
pub struct SandboxState {
    access_tokens: DashMap<String, String>,
    refresh_tokens: DashMap<String, String>,
    trips: DashMap<String, Vec<Trip>>,
    refresh_calls: AtomicUsize,
    controls: Mutex<Controls>,
}

const ACCESS_TTL_MINUTES: i64 = 15;

fn user_id_for(email: &str) -> String {
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, email.as_bytes()).to_string()
}

impl SandboxState {
    pub fn new() -> Self {
        Self {
            access_tokens: DashMap::new(),
            refresh_tokens: DashMap::new(),
            trips: DashMap::new(),
            refresh_calls: AtomicUsize::new(0),
            controls: Mutex::new(Controls {
                refresh_mode: RefreshMode::Rotate,
                refresh_latency: Duration::ZERO,
                authorizations: Vec::new(),
            }),
        }
    }

    fn controls(&self) -> std::sync::MutexGuard<'_, Controls> {
        self.controls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn issue(&self, user_id: &str, refresh_token: String) -> Grant {
        let access_token = nanoid!(24);
        self.access_tokens
            .insert(access_token.clone(), user_id.to_owned());
        Grant {
            access_token,
            user_id: user_id.to_owned(),
            expires_at: Utc::now() + ChronoDuration::minutes(ACCESS_TTL_MINUTES),
            refresh_token,
        }
    }

    pub fn login(&self, email: &str, password: &str) -> Result<Grant, SandboxError> {
        let mut problems = Vec::new();
        if !email.contains('@') {
            problems.push("email must be an email".to_string());
        }
        if password.is_empty() {
            problems.push("password should not be empty".to_string());
        }
        if !problems.is_empty() {
            return Err(SandboxError::Validation(problems));
        }
        if email.contains("unverified") {
            return Err(SandboxError::Unauthorized("Email not verified".into()));
        }

        let user_id = user_id_for(email);
        let refresh_token = nanoid!(32);
        self.refresh_tokens
            .insert(refresh_token.clone(), user_id.clone());
        Ok(self.issue(&user_id, refresh_token))
    }

    pub async fn refresh(&self, cookie: Option<String>) -> Result<Grant, SandboxError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let (mode, latency) = {
            let controls = self.controls();
            (controls.refresh_mode, controls.refresh_latency)
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if let RefreshMode::Fail(status) = mode {
            return Err(SandboxError::Status(status));
        }

        let refresh_token = cookie
            .ok_or_else(|| SandboxError::Unauthorized("Refresh token missing".into()))?;
        let user_id = self
            .refresh_tokens
            .get(&refresh_token)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SandboxError::Unauthorized("Refresh token invalid".into()))?;
        Ok(self.issue(&user_id, refresh_token))
    }

    /// Resolves the bearer token to a user id, recording the header as seen.
    pub fn authorize(&self, header: Option<String>) -> Result<String, SandboxError> {
        self.controls().authorizations.push(header.clone());
        header
            .as_deref()
            .and_then(|value| value.strip_prefix("Bearer "))
            .and_then(|token| self.access_tokens.get(token).map(|e| e.value().clone()))
            .ok_or_else(|| SandboxError::Unauthorized("Unauthorized".into()))
    }

    pub fn logout(&self, user_id: &str, refresh_cookie: Option<String>) {
        self.access_tokens.retain(|_, owner| owner.as_str() != user_id);
        if let Some(token) = refresh_cookie {
            self.refresh_tokens.remove(&token);
        }
    }

    pub fn trips(&self, user_id: &str) -> Vec<Trip> {
        self.trips
            .get(user_id)
            .map(|trips| trips.value().clone())
            .unwrap_or_default()
    }

    pub fn add_trip(&self, user_id: &str, mut trip: Trip) -> Result<Trip, SandboxError> {
        if trip.title.trim().is_empty() {
            return Err(SandboxError::Validation(vec![
                "title should not be empty".into(),
            ]));
        }
        trip.id = nanoid!(12);
        trip.owner = user_id.to_owned();
        self.trips
            .entry(user_id.to_owned())
            .or_default()
            .push(trip.clone());
        Ok(trip)
    }

    /// Forgets every issued access token, as if they all expired at once.
    pub fn expire_access_tokens(&self) {
        self.access_tokens.clear();
    }

    pub fn set_refresh_mode(&self, mode: RefreshMode) {
        self.controls().refresh_mode = mode;
    }

    pub fn set_refresh_latency(&self, latency: Duration) {
        self.controls().refresh_latency = latency;
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Authorization headers seen by protected routes, in arrival order.
    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.controls().authorizations.clone()
    }
}

impl Default for SandboxState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_validates_before_checking_verification() {
        let state = SandboxState::new();
        assert!(matches!(
            state.login("unverified", ""),
            Err(SandboxError::Validation(problems)) if problems.len() == 2
        ));
        assert!(matches!(
            state.login("unverified@example.com", "pw"),
            Err(SandboxError::Unauthorized(_))
        ));
    }

    #[test]
    fn same_email_maps_to_same_user() {
        let state = SandboxState::new();
        let a = state.login("ada@example.com", "pw").unwrap();
        let b = state.login("ada@example.com", "pw").unwrap();
        assert_eq!(a.user_id, b.user_id);
        assert_ne!(a.access_token, b.access_token);
    }

    #[tokio::test]
    async fn refresh_rotates_until_told_to_fail() {
        let state = SandboxState::new();
        let grant = state.login("ada@example.com", "pw").unwrap();

        state.expire_access_tokens();
        assert!(state.authorize(Some(format!("Bearer {}", grant.access_token))).is_err());

        let renewed = state.refresh(Some(grant.refresh_token.clone())).await.unwrap();
        assert_eq!(
            state.authorize(Some(format!("Bearer {}", renewed.access_token))).unwrap(),
            grant.user_id
        );

        state.set_refresh_mode(RefreshMode::Fail(500));
        assert!(matches!(
            state.refresh(Some(grant.refresh_token)).await,
            Err(SandboxError::Status(500))
        ));
        assert!(matches!(
            state.refresh(None).await,
            Err(SandboxError::Status(500))
        ));
        assert_eq!(state.refresh_calls(), 3);
    }

    #[test]
    fn logout_revokes_user_tokens() {
        let state = SandboxState::new();
        let grant = state.login("ada@example.com", "pw").unwrap();
        state.logout(&grant.user_id, Some(grant.refresh_token));
        assert!(state.authorize(Some(format!("Bearer {}", grant.access_token))).is_err());
        assert_eq!(state.authorizations().len(), 1);
    }
}
