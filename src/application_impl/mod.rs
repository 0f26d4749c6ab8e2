mod api_client_impl;
mod error_classifier_impl;
mod http_token_refresher;
mod notice_debounce;
mod refresh_coordinator_impl;
mod session_service_impl;
mod token_store;

pub use api_client_impl::*;
pub use error_classifier_impl::*;
pub use http_token_refresher::*;
pub use notice_debounce::*;
pub use refresh_coordinator_impl::*;
pub use session_service_impl::*;
pub use token_store::*;
