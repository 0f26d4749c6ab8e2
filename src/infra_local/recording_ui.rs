use crate::domain_model::Notice;
use crate::domain_port::*;
use std::sync::Mutex;

/// Keeps every notice it is shown, for shells that render them later.
#[derive(Debug, Default)]
pub struct RecordingNotificationSink {
    shown: Mutex<Vec<Notice>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<Notice> {
        self.shown.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count_of(&self, message: &str) -> usize {
        self.shown()
            .iter()
            .filter(|notice| notice.message == message)
            .count()
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn show(&self, notice: &Notice) {
        self.shown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notice.clone());
    }
}

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn replace(&self, route: &str) {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(route.to_owned());
    }
}
