use std::cell::RefCell;
use std::collections::HashMap;

use crate::command::{Command, Context};
use crate::commands::{ConfigCommand, ListCommand, MakeCommandCommand};
use crate::definition::{CommandDefinition, OptionSpec};
use crate::error::ConsoleError;
use crate::input::ParsedInput;
use crate::output::Output;
use crate::service::ServiceRegistry;

/// The environment used when `--env` is absent.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Name of the command run when the argument vector names none.
const DEFAULT_COMMAND: &str = "list";

struct RegisteredCommand {
    name: String,
    /// Effective definition: the command's own declaration plus the
    /// injected global `--env` option.
    definition: CommandDefinition,
    command: Box<dyn Command>,
}

/// Structured record of a dispatch failure, logged once at the console
/// boundary before the error propagates.
#[derive(Debug)]
pub struct FailureRecord {
    pub message: String,
    /// The error and its source chain, outermost first.
    pub trace: Vec<String>,
    /// Set when a configured failure formatter itself failed.
    pub handler: Option<String>,
}

type FailureFormatter = Box<dyn Fn(&ConsoleError) -> Result<Vec<String>, ConsoleError>>;

/// Owns the full set of commands, resolves the one matching the current
/// argument vector, executes it, and centralizes failure logging.
///
/// Commands are registered explicitly — built-ins at construction, the
/// application's own via [`register`](Console::register) /
/// [`register_all`](Console::register_all) from its bootstrap.
pub struct Console {
    name: String,
    version: String,
    commands: Vec<RegisteredCommand>,
    index: HashMap<String, usize>,
    services: ServiceRegistry,
    state: RefCell<HashMap<String, HashMap<String, String>>>,
    failure_formatter: Option<FailureFormatter>,
}

impl Console {
    /// Create a console with the built-in `list`, `config`, and
    /// `make:command` commands registered.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let mut console = Console {
            name: name.into(),
            version: version.into(),
            commands: Vec::new(),
            index: HashMap::new(),
            services: ServiceRegistry::new(),
            state: RefCell::new(HashMap::new()),
            failure_formatter: None,
        };
        console.register_builtins();
        console
    }

    fn register_builtins(&mut self) {
        let builtins: [Box<dyn Command>; 3] = [
            Box::new(ListCommand),
            Box::new(ConfigCommand::new()),
            Box::new(MakeCommandCommand),
        ];
        for command in builtins {
            if let Err(err) = self.register(command) {
                // Built-in names are distinct by construction.
                unreachable!("built-in registration failed: {err}");
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Register one command. Its effective definition gains the global
    /// `--env`/`-e` option if the command did not declare one itself.
    ///
    /// # Errors
    ///
    /// `DuplicateCommandName` when a command with the same name is
    /// already registered — a fatal configuration error at startup.
    pub fn register(&mut self, command: Box<dyn Command>) -> Result<(), ConsoleError> {
        let mut definition = command.definition();
        if definition.name.is_empty() {
            return Err(ConsoleError::InvalidDefinition(
                "command name must not be empty".to_string(),
            ));
        }
        if self.index.contains_key(&definition.name) {
            return Err(ConsoleError::DuplicateCommandName(definition.name));
        }
        if !definition.has_option("env") {
            definition = definition.option(environment_option());
        }
        let name = definition.name.clone();
        self.index.insert(name.clone(), self.commands.len());
        self.commands.push(RegisteredCommand {
            name,
            definition,
            command,
        });
        Ok(())
    }

    /// Register a batch of commands assembled by the application
    /// bootstrap, in order. Name collisions are rejected.
    pub fn register_all(
        &mut self,
        commands: impl IntoIterator<Item = Box<dyn Command>>,
    ) -> Result<(), ConsoleError> {
        for command in commands {
            self.register(command)?;
        }
        Ok(())
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn services_mut(&mut self) -> &mut ServiceRegistry {
        &mut self.services
    }

    /// Install a hook that turns a failure into the logged trace lines,
    /// replacing the default source-chain walk. If the hook itself
    /// fails, both traces land in the record.
    pub fn set_failure_formatter(
        &mut self,
        formatter: impl Fn(&ConsoleError) -> Result<Vec<String>, ConsoleError> + 'static,
    ) {
        self.failure_formatter = Some(Box::new(formatter));
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered commands as `(name, description)` pairs, in
    /// registration order.
    pub fn command_list(&self) -> Vec<(String, String)> {
        self.commands
            .iter()
            .map(|c| (c.name.clone(), c.definition.description.clone()))
            .collect()
    }

    /// The effective definition of a registered command.
    pub fn definition(&self, name: &str) -> Result<&CommandDefinition, ConsoleError> {
        self.find(name).map(|c| &c.definition)
    }

    /// Resolve and execute the command named by `argv`, returning its
    /// exit code. Failures are logged once under the `console` target and
    /// then propagated; nothing is suppressed here.
    pub fn run<I, S>(&self, argv: I, output: &mut Output) -> Result<i32, ConsoleError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        match self.do_run(&argv, output) {
            Ok(code) => Ok(code),
            Err(err) => {
                self.report_failure(&err);
                Err(err)
            }
        }
    }

    /// [`run`](Console::run), mapped to a process exit code: the
    /// command's own status on success, 2 for usage errors, 1 otherwise.
    pub fn run_to_exit_code<I, S>(&self, argv: I, output: &mut Output) -> i32
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.run(argv, output) {
            Ok(code) => code,
            Err(err) => err.exit_code(),
        }
    }

    fn do_run(&self, argv: &[String], output: &mut Output) -> Result<i32, ConsoleError> {
        let (name, rest) = match argv.split_first() {
            Some((name, rest)) if !name.starts_with('-') => (name.as_str(), rest),
            // Only global options given: run the default command on the
            // full token list.
            Some(_) => (DEFAULT_COMMAND, argv),
            None => (DEFAULT_COMMAND, &[] as &[String]),
        };
        tracing::debug!(target: "console", command = %name, "dispatching");

        let registered = self.find(name)?;
        let matches = registered
            .definition
            .to_clap()
            .try_get_matches_from(rest)
            .map_err(|err| ConsoleError::Usage(err.to_string()))?;
        let input = ParsedInput::from_matches(&registered.definition, &matches);
        self.execute(registered, input, output)
    }

    /// Invoke a registered command with a synthetic input, on behalf of
    /// `Context::call` / `Context::call_silent`. Nested invocations are
    /// strictly stack-like: the callee runs to completion on the caller's
    /// thread before control returns.
    pub(crate) fn call(
        &self,
        name: &str,
        args: &[(&str, &str)],
        output: &mut Output,
    ) -> Result<i32, ConsoleError> {
        let registered = self.find(name)?;
        let input = ParsedInput::bind(&registered.definition, args)?;
        self.execute(registered, input, output)
    }

    fn execute(
        &self,
        registered: &RegisteredCommand,
        input: ParsedInput,
        output: &mut Output,
    ) -> Result<i32, ConsoleError> {
        let environment = input
            .option_str("env")
            .unwrap_or(DEFAULT_ENVIRONMENT)
            .to_string();
        // Environment-sensitive code must observe the selection before
        // the command body runs.
        std::env::set_var("APP_ENV", &environment);

        let mut ctx = Context::new(
            self,
            registered.name.clone(),
            input,
            output,
            environment,
        );
        registered.command.handle(&mut ctx)
    }

    fn find(&self, name: &str) -> Result<&RegisteredCommand, ConsoleError> {
        self.index
            .get(name)
            .map(|&i| &self.commands[i])
            .ok_or_else(|| ConsoleError::UnknownCommand(name.to_string()))
    }

    fn report_failure(&self, err: &ConsoleError) {
        let record = self.failure_record(err);
        tracing::error!(
            target: "console",
            message = %record.message,
            trace = ?record.trace,
            handler = ?record.handler,
            "command failed"
        );
    }

    fn failure_record(&self, err: &ConsoleError) -> FailureRecord {
        let message = err.to_string();
        match &self.failure_formatter {
            Some(formatter) => match formatter(err) {
                Ok(trace) => FailureRecord {
                    message,
                    trace,
                    handler: None,
                },
                Err(handler_err) => FailureRecord {
                    message,
                    trace: error_chain(err),
                    handler: Some(handler_err.to_string()),
                },
            },
            None => FailureRecord {
                message,
                trace: error_chain(err),
                handler: None,
            },
        }
    }

    pub(crate) fn state_get(&self, command: &str, key: &str) -> Option<String> {
        self.state
            .borrow()
            .get(command)
            .and_then(|bag| bag.get(key).cloned())
    }

    pub(crate) fn state_put(&self, command: &str, key: &str, value: String) {
        self.state
            .borrow_mut()
            .entry(command.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("commands", &self.index.len())
            .finish()
    }
}

/// The global environment option injected into every command definition.
fn environment_option() -> OptionSpec {
    OptionSpec::optional_valued("env", DEFAULT_ENVIRONMENT)
        .short('e')
        .description("The environment the command should run under.")
}

fn error_chain(err: &ConsoleError) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut source = std::error::Error::source(err);
    while let Some(err) = source {
        chain.push(err.to_string());
        source = err.source();
    }
    chain
}
