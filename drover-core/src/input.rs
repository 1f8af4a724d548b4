use std::collections::BTreeMap;

use crate::definition::{CommandDefinition, ValueMode};
use crate::error::ConsoleError;

/// The bound value of one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Presence of a `ValueMode::None` flag.
    Flag(bool),
    Value(String),
}

/// Immutable result of matching raw tokens against a [`CommandDefinition`]:
/// argument name to bound value, option name to bound value or presence.
#[derive(Debug, Clone, Default)]
pub struct ParsedInput {
    arguments: BTreeMap<String, String>,
    options: BTreeMap<String, OptionValue>,
}

impl ParsedInput {
    /// Extract bound values out of a clap match result.
    pub(crate) fn from_matches(
        definition: &CommandDefinition,
        matches: &clap::ArgMatches,
    ) -> Self {
        let mut input = ParsedInput::default();
        for argument in &definition.arguments {
            if let Some(value) = matches.get_one::<String>(&argument.name) {
                input
                    .arguments
                    .insert(argument.name.clone(), value.clone());
            }
        }
        for option in &definition.options {
            let value = match option.mode {
                ValueMode::None => OptionValue::Flag(matches.get_flag(&option.name)),
                ValueMode::Optional | ValueMode::Required => {
                    match matches.get_one::<String>(&option.name) {
                        Some(value) => OptionValue::Value(value.clone()),
                        None => continue,
                    }
                }
            };
            input.options.insert(option.name.clone(), value);
        }
        input
    }

    /// Bind explicit name/value pairs against a definition, the way a
    /// nested `call` constructs its input: defaults are seeded first, then
    /// pairs overlay them. Names matching a declared argument bind
    /// positionally-by-name; names matching an option bind as its value
    /// (flags treat any pair value as presence).
    pub(crate) fn bind(
        definition: &CommandDefinition,
        pairs: &[(&str, &str)],
    ) -> Result<Self, ConsoleError> {
        let mut input = ParsedInput::default();

        for argument in &definition.arguments {
            if let Some(default) = &argument.default {
                input
                    .arguments
                    .insert(argument.name.clone(), default.clone());
            }
        }
        for option in &definition.options {
            match option.mode {
                ValueMode::None => {
                    input
                        .options
                        .insert(option.name.clone(), OptionValue::Flag(false));
                }
                ValueMode::Optional | ValueMode::Required => {
                    if let Some(default) = &option.default {
                        input
                            .options
                            .insert(option.name.clone(), OptionValue::Value(default.clone()));
                    }
                }
            }
        }

        for (name, value) in pairs {
            if definition.has_argument(name) {
                input.arguments.insert((*name).to_string(), (*value).to_string());
            } else if let Some(option) = definition.options.iter().find(|o| o.name == *name) {
                let bound = match option.mode {
                    ValueMode::None => OptionValue::Flag(true),
                    _ => OptionValue::Value((*value).to_string()),
                };
                input.options.insert((*name).to_string(), bound);
            } else {
                return Err(ConsoleError::Usage(format!(
                    "'{}' accepts no argument or option named '{name}'",
                    definition.name
                )));
            }
        }

        for argument in &definition.arguments {
            if argument.required && !input.arguments.contains_key(&argument.name) {
                return Err(ConsoleError::Usage(format!(
                    "'{}' requires the '{}' argument",
                    definition.name, argument.name
                )));
            }
        }

        Ok(input)
    }

    pub fn has_argument(&self, name: &str) -> bool {
        self.arguments.contains_key(name)
    }

    /// The bound value of an argument.
    ///
    /// # Errors
    ///
    /// Returns `ConsoleError::UnknownArgument` if no value is bound under
    /// `name`.
    pub fn argument(&self, name: &str) -> Result<&str, ConsoleError> {
        self.arguments
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ConsoleError::UnknownArgument(name.to_string()))
    }

    pub fn arguments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.arguments.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    /// The string value of a valued option, if bound.
    pub fn option_str(&self, name: &str) -> Option<&str> {
        match self.options.get(name) {
            Some(OptionValue::Value(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Whether a `ValueMode::None` option was present.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.options.get(name), Some(OptionValue::Flag(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ArgumentSpec, OptionSpec};

    fn definition() -> CommandDefinition {
        CommandDefinition::new("greet")
            .argument(ArgumentSpec::required("who"))
            .argument(ArgumentSpec::with_default("tone", "polite"))
            .option(OptionSpec::flag("loud"))
            .option(OptionSpec::optional_valued("lang", "en"))
    }

    #[test]
    fn bind_overlays_pairs_on_defaults() {
        let input = ParsedInput::bind(&definition(), &[("who", "world")]).unwrap();
        assert_eq!(input.argument("who").unwrap(), "world");
        assert_eq!(input.argument("tone").unwrap(), "polite");
        assert_eq!(input.option_str("lang"), Some("en"));
        assert!(!input.flag("loud"));
    }

    #[test]
    fn bind_sets_flags_and_option_values() {
        let input =
            ParsedInput::bind(&definition(), &[("who", "world"), ("loud", ""), ("lang", "fr")])
                .unwrap();
        assert!(input.flag("loud"));
        assert_eq!(input.option_str("lang"), Some("fr"));
    }

    #[test]
    fn bind_missing_required_argument_is_usage_error() {
        let err = ParsedInput::bind(&definition(), &[]).unwrap_err();
        assert!(matches!(err, ConsoleError::Usage(_)));
    }

    #[test]
    fn bind_undeclared_name_is_usage_error() {
        let err = ParsedInput::bind(&definition(), &[("who", "x"), ("bogus", "y")]).unwrap_err();
        assert!(matches!(err, ConsoleError::Usage(_)));
    }

    #[test]
    fn unknown_argument_access_fails() {
        let input = ParsedInput::bind(&definition(), &[("who", "x")]).unwrap();
        let err = input.argument("nope").unwrap_err();
        assert!(matches!(err, ConsoleError::UnknownArgument(_)));
    }

    #[test]
    fn from_matches_binds_arguments_and_options() {
        let def = definition();
        let matches = def
            .to_clap()
            .try_get_matches_from(["world", "--loud", "--lang=fr"])
            .unwrap();
        let input = ParsedInput::from_matches(&def, &matches);
        assert_eq!(input.argument("who").unwrap(), "world");
        assert_eq!(input.argument("tone").unwrap(), "polite");
        assert!(input.flag("loud"));
        assert_eq!(input.option_str("lang"), Some("fr"));
    }

    #[test]
    fn from_matches_usage_error_on_missing_required() {
        let def = definition();
        assert!(def.to_clap().try_get_matches_from(Vec::<String>::new()).is_err());
    }
}
