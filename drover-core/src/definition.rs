use crate::error::ConsoleError;

/// How an option consumes a value on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueMode {
    /// Bare flag, bound as boolean presence.
    None,
    /// Value accepted but not required (`--opt=value`); the declared
    /// default applies when the value is omitted.
    Optional,
    /// Value required whenever the option appears.
    Required,
}

/// One positional argument of a command. Declaration order is binding
/// order.
#[derive(Debug, Clone)]
pub struct ArgumentSpec {
    pub name: String,
    pub required: bool,
    pub default: Option<String>,
}

impl ArgumentSpec {
    pub fn required(name: impl Into<String>) -> Self {
        ArgumentSpec {
            name: name.into(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        ArgumentSpec {
            name: name.into(),
            required: false,
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<String>) -> Self {
        ArgumentSpec {
            name: name.into(),
            required: false,
            default: Some(default.into()),
        }
    }
}

/// One named option of a command.
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub name: String,
    pub short: Option<char>,
    pub mode: ValueMode,
    pub description: String,
    pub default: Option<String>,
}

impl OptionSpec {
    /// A bare boolean flag.
    pub fn flag(name: impl Into<String>) -> Self {
        OptionSpec {
            name: name.into(),
            short: None,
            mode: ValueMode::None,
            description: String::new(),
            default: None,
        }
    }

    /// An option that requires a value whenever it appears.
    pub fn valued(name: impl Into<String>) -> Self {
        OptionSpec {
            name: name.into(),
            short: None,
            mode: ValueMode::Required,
            description: String::new(),
            default: None,
        }
    }

    /// An option whose value may be omitted, falling back to the default.
    pub fn optional_valued(name: impl Into<String>, default: impl Into<String>) -> Self {
        OptionSpec {
            name: name.into(),
            short: None,
            mode: ValueMode::Optional,
            description: String::new(),
            default: Some(default.into()),
        }
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// The declared shape of a command: its name, description, positional
/// arguments, and options. Raw input is parsed against this definition.
#[derive(Debug, Clone)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    pub arguments: Vec<ArgumentSpec>,
    pub options: Vec<OptionSpec>,
}

impl CommandDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        CommandDefinition {
            name: name.into(),
            description: String::new(),
            arguments: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn argument(mut self, argument: ArgumentSpec) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.iter().any(|o| o.name == name)
    }

    pub fn has_argument(&self, name: &str) -> bool {
        self.arguments.iter().any(|a| a.name == name)
    }

    /// Parse a fluent signature string into a definition.
    ///
    /// Grammar: the leading token is the command name; each `{...}` token
    /// declares one argument or option:
    ///
    /// - `{file}` — required argument
    /// - `{file?}` — optional argument
    /// - `{file=out.txt}` — optional argument with default
    /// - `{--force}` — boolean flag
    /// - `{--limit=}` — option requiring a value
    /// - `{--limit=10}` — option with optional value, default `10`
    /// - `{--f|force}` — flag with short alias
    pub fn from_signature(
        signature: &str,
        description: impl Into<String>,
    ) -> Result<Self, ConsoleError> {
        let name = signature
            .split('{')
            .next()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                ConsoleError::InvalidDefinition(format!("signature '{signature}' has no name"))
            })?;

        let mut definition = CommandDefinition::new(name).description(description);

        let mut rest = &signature[name.len()..];
        while let Some(open) = rest.find('{') {
            let close = rest[open..].find('}').ok_or_else(|| {
                ConsoleError::InvalidDefinition(format!(
                    "unterminated '{{' in signature '{signature}'"
                ))
            })?;
            let token = rest[open + 1..open + close].trim();
            rest = &rest[open + close + 1..];
            if token.is_empty() {
                return Err(ConsoleError::InvalidDefinition(format!(
                    "empty token in signature '{signature}'"
                )));
            }
            if let Some(option) = token.strip_prefix("--") {
                definition.options.push(parse_option_token(option)?);
            } else {
                definition.arguments.push(parse_argument_token(token));
            }
        }

        Ok(definition)
    }

    /// Lower this definition to a `clap::Command` for parsing raw tokens.
    ///
    /// The command name has already been consumed by the console at this
    /// point, so the parser takes the remaining tokens without a binary
    /// name. Help and version flags are not injected; only declared
    /// options exist on the surface.
    pub(crate) fn to_clap(&self) -> clap::Command {
        let mut cmd = clap::Command::new(self.name.clone())
            .about(self.description.clone())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true);

        for (index, argument) in self.arguments.iter().enumerate() {
            let mut arg = clap::Arg::new(argument.name.clone()).index(index + 1);
            if argument.required {
                arg = arg.required(true);
            }
            if let Some(default) = &argument.default {
                arg = arg.default_value(default.clone());
            }
            cmd = cmd.arg(arg);
        }

        for option in &self.options {
            let mut arg = clap::Arg::new(option.name.clone())
                .long(option.name.clone())
                .help(option.description.clone());
            if let Some(short) = option.short {
                arg = arg.short(short);
            }
            match option.mode {
                ValueMode::None => {
                    arg = arg.action(clap::ArgAction::SetTrue);
                }
                ValueMode::Optional => {
                    // Value must be attached (`--env=staging`); a detached
                    // token would be ambiguous against positionals.
                    arg = arg
                        .action(clap::ArgAction::Set)
                        .num_args(0..=1)
                        .require_equals(true);
                    if let Some(default) = &option.default {
                        arg = arg
                            .default_value(default.clone())
                            .default_missing_value(default.clone());
                    }
                }
                ValueMode::Required => {
                    arg = arg.action(clap::ArgAction::Set).num_args(1);
                    if let Some(default) = &option.default {
                        arg = arg.default_value(default.clone());
                    }
                }
            }
            cmd = cmd.arg(arg);
        }

        cmd
    }
}

fn parse_argument_token(token: &str) -> ArgumentSpec {
    if let Some((name, default)) = token.split_once('=') {
        ArgumentSpec::with_default(name.trim(), default.trim())
    } else if let Some(name) = token.strip_suffix('?') {
        ArgumentSpec::optional(name.trim())
    } else {
        ArgumentSpec::required(token)
    }
}

fn parse_option_token(token: &str) -> Result<OptionSpec, ConsoleError> {
    let (token, short) = match token.split_once('|') {
        Some((short, rest)) => {
            let mut chars = short.trim().chars();
            let c = chars.next().ok_or_else(|| {
                ConsoleError::InvalidDefinition(format!("empty short alias in '--{token}'"))
            })?;
            if chars.next().is_some() {
                return Err(ConsoleError::InvalidDefinition(format!(
                    "short alias must be one character in '--{token}'"
                )));
            }
            (rest, Some(c))
        }
        None => (token, None),
    };

    let mut option = match token.split_once('=') {
        Some((name, "")) => OptionSpec::valued(name.trim()),
        Some((name, default)) => OptionSpec::optional_valued(name.trim(), default.trim()),
        None => OptionSpec::flag(token.trim()),
    };
    option.short = short;
    Ok(option)
}
