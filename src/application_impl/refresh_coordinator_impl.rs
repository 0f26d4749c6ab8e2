use crate::application_impl::TokenStore;
use crate::application_port::*;
use crate::domain_model::*;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

type Outcome = Result<AccessToken, RefreshError>;

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    subscribers: Vec<oneshot::Sender<Outcome>>,
}

enum Role {
    Leader,
    Follower(oneshot::Receiver<Outcome>),
}

/// Idle/Refreshing state machine. The first caller performs the refresh;
/// callers arriving while it runs are queued and receive its outcome in
/// arrival order. The state lock is never held across an await.
pub struct SingleFlightRefreshCoordinator {
    refresher: Arc<dyn TokenRefresher>,
    token_store: Arc<TokenStore>,
    state: Mutex<RefreshState>,
}

impl SingleFlightRefreshCoordinator {
    pub fn new(refresher: Arc<dyn TokenRefresher>, token_store: Arc<TokenStore>) -> Self {
        Self {
            refresher,
            token_store,
            state: Mutex::new(RefreshState::default()),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock_state().refreshing
    }

    pub fn waiting(&self) -> usize {
        self.lock_state().subscribers.len()
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn enter(&self) -> Role {
        let mut state = self.lock_state();
        if state.refreshing {
            let (tx, rx) = oneshot::channel();
            state.subscribers.push(tx);
            Role::Follower(rx)
        } else {
            state.refreshing = true;
            Role::Leader
        }
    }

    /// Back to Idle and fan the outcome out. Taking the list and clearing the
    /// flag happen under one lock, so no subscriber can slip in between.
    fn settle(&self, outcome: &Outcome) {
        let subscribers = {
            let mut state = self.lock_state();
            state.refreshing = false;
            std::mem::take(&mut state.subscribers)
        };
        debug!(waiting = subscribers.len(), ok = outcome.is_ok(), "refresh settled");
        for subscriber in subscribers {
            let _ = subscriber.send(outcome.clone());
        }
    }

    async fn refresh_and_store(&self) -> Outcome {
        let grant = self.refresher.refresh().await?;

        let user_id = match grant.user_id {
            Some(user_id) => Some(user_id),
            None => self.token_store.get().await.map(|record| record.user_id),
        };
        match user_id {
            Some(user_id) => {
                let record = TokenRecord {
                    access_token: grant.access_token.clone(),
                    user_id,
                };
                if let Err(e) = self.token_store.set(&record).await {
                    warn!(error = %e, "storing refreshed token failed");
                }
            }
            None => warn!("refreshed token has no known user, not persisting it"),
        }

        Ok(grant.access_token)
    }
}

/// Fails the queue if the leader is dropped before the refresh settles.
struct SettleOnDrop<'a> {
    coordinator: &'a SingleFlightRefreshCoordinator,
    armed: bool,
}

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("token refresh dropped before completion");
            self.coordinator.settle(&Err(RefreshError::Abandoned));
        }
    }
}

#[async_trait::async_trait]
impl RefreshCoordinator for SingleFlightRefreshCoordinator {
    async fn begin_or_join(&self) -> Result<AccessToken, RefreshError> {
        match self.enter() {
            Role::Follower(rx) => {
                debug!("joining in-flight token refresh");
                rx.await.unwrap_or(Err(RefreshError::Abandoned))
            }
            Role::Leader => {
                info!("refreshing access token");
                let mut guard = SettleOnDrop {
                    coordinator: self,
                    armed: true,
                };
                let outcome = self.refresh_and_store().await;
                guard.armed = false;

                match &outcome {
                    Ok(_) => info!("access token refreshed"),
                    Err(e) => warn!(error = %e, "access token refresh failed"),
                }
                self.settle(&outcome);
                outcome
            }
        }
    }
}
