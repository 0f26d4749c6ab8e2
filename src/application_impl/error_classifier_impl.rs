use crate::application_impl::TokenStore;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub const NETWORK_MESSAGE: &str = "Unable to reach the server. Please check your connection.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";
pub const SERVER_ERROR_MESSAGE: &str = "A system error occurred. Please try again later.";
pub const DEFAULT_MESSAGE: &str = "Something went wrong. Please try again.";

fn status_message(status: u16) -> Option<&'static str> {
    let message = match status {
        400 => "The request was invalid.",
        403 => "You do not have permission to do that.",
        404 => "The requested resource was not found.",
        405 => "That action is not allowed.",
        408 => "The request timed out. Please try again.",
        409 => "That conflicts with existing data.",
        413 => "The upload is too large.",
        422 => "Some of the submitted data is invalid.",
        429 => "Too many requests. Please slow down.",
        _ => return None,
    };
    Some(message)
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub login_route: String,
    pub redirect_delay: Duration,
    /// 401 messages that are a user action to take, not a dead session.
    /// Matched as case-insensitive substrings.
    pub expected_auth_messages: Vec<String>,
}

pub struct RealErrorClassifier {
    config: ClassifierConfig,
    token_store: Arc<TokenStore>,
    sink: Arc<dyn NotificationSink>,
    navigator: Arc<dyn Navigator>,
    redirect_pending: Arc<AtomicBool>,
    redirect_task: Mutex<Option<JoinHandle<()>>>,
}

impl RealErrorClassifier {
    pub fn new(
        config: ClassifierConfig,
        token_store: Arc<TokenStore>,
        sink: Arc<dyn NotificationSink>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            config,
            token_store,
            sink,
            navigator,
            redirect_pending: Arc::new(AtomicBool::new(false)),
            redirect_task: Mutex::new(None),
        }
    }

    /// The decision alone, without side effects.
    pub fn classify(&self, failure: &RequestFailure) -> Verdict {
        match failure {
            RequestFailure::Transport(e) => Verdict {
                notice: Notice::error(NETWORK_MESSAGE),
                recovery: Recovery::None,
                error: ClientError::Network(e.to_string()),
            },
            RequestFailure::RefreshFailed(_) => self.session_expired(),
            RequestFailure::Status { status: 401, payload } => match payload
                .message
                .as_deref()
                .filter(|message| self.is_expected_auth_message(message))
            {
                Some(message) => Verdict {
                    notice: Notice::error(message),
                    recovery: Recovery::None,
                    error: ClientError::Unauthorized(message.to_owned()),
                },
                None => self.session_expired(),
            },
            RequestFailure::Status { status, .. } if *status >= 500 => Verdict {
                notice: Notice::error(SERVER_ERROR_MESSAGE),
                recovery: Recovery::None,
                error: ClientError::Server { status: *status },
            },
            RequestFailure::Status { status, payload } => {
                let message = payload
                    .message
                    .clone()
                    .or_else(|| (!payload.errors.is_empty()).then(|| payload.errors.join(", ")))
                    .or_else(|| status_message(*status).map(str::to_owned))
                    .unwrap_or_else(|| DEFAULT_MESSAGE.to_owned());
                Verdict {
                    notice: Notice::error(message.as_str()),
                    recovery: Recovery::None,
                    error: ClientError::Rejected {
                        status: *status,
                        message,
                    },
                }
            }
        }
    }

    fn session_expired(&self) -> Verdict {
        Verdict {
            notice: Notice::error(SESSION_EXPIRED_MESSAGE),
            recovery: Recovery::SessionTeardown {
                route: self.config.login_route.clone(),
                delay: self.config.redirect_delay,
            },
            error: ClientError::SessionExpired,
        }
    }

    fn is_expected_auth_message(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.config
            .expected_auth_messages
            .iter()
            .any(|expected| message.contains(&expected.to_lowercase()))
    }

    /// At most one redirect is pending at a time, however many requests fail.
    fn schedule_redirect(&self, route: String, delay: Duration) {
        if self.redirect_pending.swap(true, Ordering::SeqCst) {
            return;
        }
        let navigator = self.navigator.clone();
        let pending = self.redirect_pending.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            info!(route = %route, "redirecting after session teardown");
            navigator.replace(&route);
            pending.store(false, Ordering::SeqCst);
        });
        *self.redirect_task.lock().unwrap_or_else(|e| e.into_inner()) = Some(task);
    }
}

#[async_trait::async_trait]
impl ErrorClassifier for RealErrorClassifier {
    async fn handle(&self, failure: RequestFailure) -> ClientError {
        match &failure {
            RequestFailure::Status { status, payload } if *status >= 500 => {
                warn!(status, detail = ?payload.message, "server error")
            }
            RequestFailure::RefreshFailed(e) => warn!(error = %e, "session lost"),
            RequestFailure::Transport(e) => warn!(error = %e, "request did not reach the server"),
            _ => {}
        }

        let verdict = self.classify(&failure);
        if let Recovery::SessionTeardown { route, delay } = verdict.recovery {
            if let Err(e) = self.token_store.clear().await {
                warn!(error = %e, "clearing session failed");
            }
            self.schedule_redirect(route, delay);
        }
        self.sink.show(&verdict.notice);
        verdict.error
    }

    async fn finish_pending(&self) {
        let task = self
            .redirect_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "redirect task failed");
            }
        }
    }
}
