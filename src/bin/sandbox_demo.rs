//! Runs the sandbox API and walks a client through an expired session.

use futures_util::future::join_all;
use std::sync::Arc;
use waypoint::application_port::*;
use waypoint::client::{Client, Frontend};
use waypoint::domain_model::*;
use waypoint::infra_http::ReqwestTransport;
use waypoint::infra_local::MemoryStorage;
use waypoint::logger::*;
use waypoint::sandbox::{RefreshMode, Sandbox, SandboxState};
use waypoint::settings::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    logger.reload_from_config(&LogConfig {
        filter: "info,waypoint=debug".to_string(),
    })?;

    let sandbox = Sandbox::start(Arc::new(SandboxState::new())).await?;

    let mut settings = parse_settings(Some("settings/dev.toml"))?;
    settings.api.base_url = sandbox.base_url();
    let transport = Arc::new(ReqwestTransport::try_new(
        &settings.api.base_url,
        std::time::Duration::from_secs(settings.api.timeout_secs),
    )?);
    let client = Client::assemble(
        &settings,
        Arc::new(MemoryStorage::new()),
        transport,
        Frontend::tracing(),
    );

    let record = client
        .session
        .login(LoginInput {
            email: "ada@example.com".into(),
            password: "correct horse".into(),
        })
        .await?;
    info!(user_id = %record.user_id, "logged in");

    client
        .api
        .send(ApiRequest::post("/trips", serde_json::json!({ "title": "Lisbon" })))
        .await?;

    sandbox.state().expire_access_tokens();
    let responses = join_all((0..3).map(|_| client.api.send(ApiRequest::get("/trips")))).await;
    info!(
        ok = responses.iter().filter(|r| r.is_ok()).count(),
        refresh_calls = sandbox.state().refresh_calls(),
        "requests replayed after one refresh"
    );

    sandbox.state().expire_access_tokens();
    sandbox.state().set_refresh_mode(RefreshMode::Fail(500));
    if let Err(e) = client.api.send(ApiRequest::get("/trips")).await {
        info!(error = %e, "session torn down");
    }
    client.settle().await;

    info!(status = ?client.session.status().await, "final session state");
    sandbox.shutdown().await;
    Ok(())
}
