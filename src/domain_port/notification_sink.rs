use crate::domain_model::Notice;

pub trait NotificationSink: Send + Sync {
    fn show(&self, notice: &Notice);
}
