use crate::application_port::{ClientError, RefreshError};
use crate::domain_model::{FailurePayload, Notice};
use crate::domain_port::TransportError;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestFailure {
    /// No response was received.
    Transport(TransportError),
    /// The server answered with a non-2xx status.
    Status { status: u16, payload: FailurePayload },
    /// A 401 could not be recovered because the token refresh failed.
    RefreshFailed(RefreshError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    None,
    /// Clear the stored session and move to `route` after `delay`.
    SessionTeardown { route: String, delay: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub notice: Notice,
    pub recovery: Recovery,
    pub error: ClientError,
}

#[async_trait::async_trait]
pub trait ErrorClassifier: Send + Sync {
    /// Notifies the user, performs the recovery side effects and returns the
    /// error to hand back to the caller.
    async fn handle(&self, failure: RequestFailure) -> ClientError;

    /// Waits for side effects scheduled by `handle`, such as a delayed
    /// redirect, to run.
    async fn finish_pending(&self) {}
}
