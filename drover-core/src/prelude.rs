//! Convenience re-exports for application code.

pub use crate::command::{Command, Context};
pub use crate::console::Console;
pub use crate::definition::{ArgumentSpec, CommandDefinition, OptionSpec, ValueMode};
pub use crate::error::ConsoleError;
pub use crate::output::{Output, Style, TableStyle, Verbosity};
pub use crate::service::ServiceRegistry;
