mod api_client;
mod error_classifier;
mod refresh_coordinator;
mod session_service;

pub use api_client::*;
pub use error_classifier::*;
pub use refresh_coordinator::*;
pub use session_service::*;
