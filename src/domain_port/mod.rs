// storage

mod key_value_storage;

pub use key_value_storage::*;

// transport

mod http_transport;

pub use http_transport::*;

// ui collaborators

mod clock;
mod navigator;
mod notification_sink;

pub use clock::*;
pub use navigator::*;
pub use notification_sink::*;
