use crate::domain_model::*;
use crate::domain_port::*;
use tracing::{info, warn};

/// Writes notices to the log; the sink used by the command line client.
#[derive(Debug, Default)]
pub struct TracingNotificationSink;

impl TracingNotificationSink {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSink for TracingNotificationSink {
    fn show(&self, notice: &Notice) {
        match notice.severity {
            Severity::Success => info!(message = %notice.message, "notice"),
            Severity::Error => warn!(message = %notice.message, "notice"),
        }
    }
}

#[derive(Debug, Default)]
pub struct TracingNavigator;

impl TracingNavigator {
    pub fn new() -> Self {
        Self
    }
}

impl Navigator for TracingNavigator {
    fn replace(&self, route: &str) {
        info!(route, "navigation requested");
    }
}
