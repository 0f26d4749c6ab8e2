//! Shows the settings filter taking over from the bootstrap filter, and
//! `RUST_LOG` pinning the filter for the whole run.
//!
//! $ cargo run --bin logger_demo
//! $ RUST_LOG=trace cargo run --bin logger_demo

use waypoint::domain_model::Notice;
use waypoint::domain_port::NotificationSink;
use waypoint::infra_local::TracingNotificationSink;
use waypoint::logger::*;
use waypoint::settings::*;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    let rust_log = std::env::var("RUST_LOG").ok();
    warn!(?rust_log, "bootstrap logger ready");
    debug!("bootstrap debug log");

    let project_settings = parse_settings(None)?;
    logger.reload_from_config(&LogConfig {
        filter: project_settings.log.filter.clone(),
    })?;
    match rust_log {
        Some(filter) => warn!(%filter, "RUST_LOG set, settings filter ignored"),
        None => warn!(filter = %project_settings.log.filter, "settings filter applied"),
    }
    debug!("application debug log");

    // notices end up under the `waypoint` target
    let sink = TracingNotificationSink::new();
    sink.show(&Notice::success("Trip created"));
    sink.show(&Notice::error("Your session has expired. Please log in again."));

    Ok(())
}
