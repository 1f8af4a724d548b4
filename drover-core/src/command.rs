use std::sync::Arc;

use crate::console::Console;
use crate::definition::CommandDefinition;
use crate::error::ConsoleError;
use crate::input::{OptionValue, ParsedInput};
use crate::output::{Output, Style, TableStyle, Verbosity};
use crate::service::ServiceRegistry;

/// One named, self-contained unit of console work.
///
/// `definition` declares the command's shape; it must be pure and stable
/// across calls. `handle` is the unit of work, returning the exit status
/// (0 for success by convention).
pub trait Command {
    fn definition(&self) -> CommandDefinition;

    fn handle(&self, ctx: &mut Context<'_>) -> Result<i32, ConsoleError>;
}

/// Everything a running command may touch: its parsed input, the output
/// sink, the active environment, the shared service registry, and the
/// owning console (for nested invocation).
///
/// The environment resolved from the `--env` option is threaded through
/// here rather than read back out of ambient process state.
pub struct Context<'a> {
    console: &'a Console,
    command: String,
    input: ParsedInput,
    output: &'a mut Output,
    environment: String,
    default_verbosity: Verbosity,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        console: &'a Console,
        command: String,
        input: ParsedInput,
        output: &'a mut Output,
        environment: String,
    ) -> Self {
        Context {
            console,
            command,
            input,
            output,
            environment,
            default_verbosity: Verbosity::Normal,
        }
    }

    /// The name this command was invoked under.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The active environment, resolved from `--env` before `handle` ran.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn input(&self) -> &ParsedInput {
        &self.input
    }

    // ── Input accessors ─────────────────────────────────────────────────

    pub fn has_argument(&self, name: &str) -> bool {
        self.input.has_argument(name)
    }

    pub fn argument(&self, name: &str) -> Result<&str, ConsoleError> {
        self.input.argument(name)
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.input.has_option(name)
    }

    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.input.option(name)
    }

    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.input.option_str(name)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.input.flag(name)
    }

    // ── Output helpers ──────────────────────────────────────────────────

    /// Write one line. Without an explicit level the command's default
    /// verbosity (`Normal`) gates the write.
    pub fn line(&mut self, text: &str, style: Option<Style>, verbosity: Option<Verbosity>) {
        let level = verbosity.unwrap_or(self.default_verbosity);
        self.output.line(text, style, level);
    }

    pub fn info(&mut self, text: &str) {
        self.line(text, Some(Style::Info), None);
    }

    pub fn comment(&mut self, text: &str) {
        self.line(text, Some(Style::Comment), None);
    }

    pub fn error(&mut self, text: &str) {
        self.line(text, Some(Style::Error), None);
    }

    pub fn question(&mut self, text: &str) {
        self.line(text, Some(Style::Question), None);
    }

    pub fn table(&mut self, headers: &[&str], rows: &[Vec<String>], style: TableStyle) {
        self.output.table(headers, rows, style);
    }

    pub fn output(&mut self) -> &mut Output {
        self.output
    }

    /// Resolve a symbolic or numeric verbosity token, falling back to the
    /// command's default for unrecognized names.
    pub fn verbosity_from(&self, token: &str) -> Verbosity {
        Verbosity::parse_or(token, self.default_verbosity)
    }

    pub fn set_default_verbosity(&mut self, verbosity: Verbosity) {
        self.default_verbosity = verbosity;
    }

    // ── Nested invocation ───────────────────────────────────────────────

    /// Invoke another registered command, forwarding this command's
    /// output sink, and return its exit code.
    ///
    /// # Errors
    ///
    /// `UnknownCommand` if `name` is not registered; `Usage` if `args`
    /// do not satisfy the callee's definition.
    pub fn call(&mut self, name: &str, args: &[(&str, &str)]) -> Result<i32, ConsoleError> {
        self.console.call(name, args, self.output)
    }

    /// Invoke another registered command, discarding its output.
    pub fn call_silent(&mut self, name: &str, args: &[(&str, &str)]) -> Result<i32, ConsoleError> {
        self.console.call(name, args, &mut Output::null())
    }

    // ── Services and per-command state ──────────────────────────────────

    pub fn services(&self) -> &ServiceRegistry {
        self.console.services()
    }

    /// Resolve a shared service by name.
    pub fn service<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, ConsoleError> {
        self.console.services().get::<T>(name)
    }

    /// Read a key from this command's persistent state bag.
    pub fn state_get(&self, key: &str) -> Option<String> {
        self.console.state_get(&self.command, key)
    }

    /// Store a key in this command's persistent state bag. The bag lives
    /// for the process lifetime, surviving repeated invocations of the
    /// same command.
    pub fn state_put(&self, key: &str, value: impl Into<String>) {
        self.console.state_put(&self.command, key, value.into());
    }

    /// Registered commands as `(name, description)` pairs, in
    /// registration order.
    pub fn commands(&self) -> Vec<(String, String)> {
        self.console.command_list()
    }

    /// Application name and version of the owning console.
    pub fn application(&self) -> (&str, &str) {
        (self.console.name(), self.console.version())
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("command", &self.command)
            .field("environment", &self.environment)
            .finish()
    }
}
