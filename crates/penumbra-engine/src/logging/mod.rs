//! Logging utilities.
//!
//! Logger initialization for hosts plus the engine's diagnostic macro. Only
//! the `log` facade is used inside the engine; `env_logger` is installed by
//! `init_logging` when the host wants it.

#[path = "diagnostic.rs"]
mod diagnostic_macro;
mod init;

pub(crate) use diagnostic_macro::diagnostic;
pub use init::{init_logging, LoggingConfig};
