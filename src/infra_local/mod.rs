mod clock;
mod file_storage;
mod http_transport_fake;
mod memory_storage;
mod recording_ui;
mod tracing_ui;

pub use clock::*;
pub use file_storage::*;
pub use http_transport_fake::*;
pub use memory_storage::*;
pub use recording_ui::*;
pub use tracing_ui::*;
