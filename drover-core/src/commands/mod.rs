//! Commands compiled into the framework itself.

mod config;
mod list;
mod make_command;

pub use config::ConfigCommand;
pub use list::ListCommand;
pub use make_command::MakeCommandCommand;
