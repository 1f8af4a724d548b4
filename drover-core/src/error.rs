use std::io;
use std::path::PathBuf;

/// Error type for console operations.
pub enum ConsoleError {
    /// The raw input did not match the command's declared signature.
    /// Carries the rendered usage message for the user.
    Usage(String),
    /// The requested (or `call`-ed) command is not registered.
    UnknownCommand(String),
    /// Two commands were registered under the same name.
    DuplicateCommandName(String),
    /// A command definition or signature string is malformed.
    InvalidDefinition(String),
    /// A command asked the service registry for a name it does not hold,
    /// or the stored service has a different type.
    UnknownService(String),
    /// A command read an argument its definition never declared.
    UnknownArgument(String),
    /// A scaffolding target already exists; nothing was written.
    FileExists(PathBuf),
    /// An I/O error occurred while a command was running.
    Io(io::Error),
    /// Any other error raised inside `handle()`.
    Failure(Box<dyn std::error::Error + Send + Sync>),
}

impl ConsoleError {
    /// Wrap an arbitrary message as a command failure.
    pub fn failure(message: impl Into<String>) -> Self {
        ConsoleError::Failure(message.into().into())
    }

    /// Conventional process exit code for this error: 2 for usage
    /// mismatches, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConsoleError::Usage(_) => 2,
            _ => 1,
        }
    }
}

impl std::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsoleError::Usage(msg) => write!(f, "{msg}"),
            ConsoleError::UnknownCommand(name) => write!(f, "Unknown command: {name}"),
            ConsoleError::DuplicateCommandName(name) => {
                write!(f, "Command '{name}' is already registered")
            }
            ConsoleError::InvalidDefinition(msg) => write!(f, "Invalid definition: {msg}"),
            ConsoleError::UnknownService(name) => write!(f, "Unknown service: {name}"),
            ConsoleError::UnknownArgument(name) => write!(f, "Unknown argument: {name}"),
            ConsoleError::FileExists(path) => {
                write!(f, "File {} already exists", path.display())
            }
            ConsoleError::Io(err) => write!(f, "I/O error: {err}"),
            ConsoleError::Failure(err) => write!(f, "{err}"),
        }
    }
}

impl std::fmt::Debug for ConsoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl std::error::Error for ConsoleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConsoleError::Io(err) => Some(err),
            ConsoleError::Failure(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for ConsoleError {
    fn from(err: io::Error) -> Self {
        ConsoleError::Io(err)
    }
}
