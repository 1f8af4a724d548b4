//! Drover core — a console-command framework over a typed service
//! registry.
//!
//! Applications register [`Command`] implementations against a
//! [`Console`], which dispatches the process argument vector to the
//! matching command, injects the global `--env` option into every
//! definition, and centralizes failure logging. Commands receive a
//! [`Context`] with input accessors, verbosity-gated styled output,
//! table rendering, nested invocation, and service resolution.

pub mod command;
pub mod commands;
pub mod config;
pub mod console;
pub mod definition;
pub mod error;
pub mod input;
pub mod output;
pub mod prelude;
pub mod service;

pub use command::{Command, Context};
pub use commands::{ConfigCommand, ListCommand, MakeCommandCommand};
pub use config::ConfigStore;
pub use console::{Console, FailureRecord, DEFAULT_ENVIRONMENT};
pub use definition::{ArgumentSpec, CommandDefinition, OptionSpec, ValueMode};
pub use error::ConsoleError;
pub use input::{OptionValue, ParsedInput};
pub use output::{render_table, Output, SharedBuffer, Style, TableStyle, Verbosity};
pub use service::ServiceRegistry;

/// Initialise the global `tracing` subscriber with an env-filter
/// (`RUST_LOG`), defaulting to `info`. Safe to call more than once; later
/// calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
