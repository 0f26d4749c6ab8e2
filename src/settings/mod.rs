//! Command line and TOML configuration.
//! See `bin/settings_demo.rs` for a binary that loads the bundled files.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
