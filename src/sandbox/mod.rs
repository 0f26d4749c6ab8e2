//! A local stand-in for the travel API, with the same auth contract:
//! short-lived bearer tokens, an HttpOnly refresh cookie and
//! `{statusCode, message, error}` failure bodies.

mod error;
mod handler;
mod router;
mod state;

pub use error::{ErrorBody, SandboxError, recover_error};
pub use router::routes;
pub use state::{Grant, RefreshMode, SandboxState, Trip};

use crate::logger::*;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use warp::Filter;

pub struct Sandbox {
    addr: SocketAddr,
    state: Arc<SandboxState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Sandbox {
    /// Binds an ephemeral port on localhost and serves until shut down.
    pub async fn start(state: Arc<SandboxState>) -> anyhow::Result<Self> {
        Self::bind(state, ([127, 0, 0, 1], 0).into()).await
    }

    pub async fn bind(state: Arc<SandboxState>, addr: SocketAddr) -> anyhow::Result<Self> {
        let cancel = CancellationToken::new();
        let api = routes(state.clone()).recover(recover_error);

        let (addr, server) = warp::serve(api).try_bind_with_graceful_shutdown(addr, {
            let cancel = cancel.clone();
            async move { cancel.cancelled().await }
        })?;
        let task = tokio::spawn(server);
        info!(%addr, "sandbox api listening");

        Ok(Self {
            addr,
            state,
            cancel,
            task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base url to point a client at, including the `/api` prefix.
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn state(&self) -> &Arc<SandboxState> {
        &self.state
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "sandbox server task failed");
        }
        info!("sandbox api stopped");
    }
}
