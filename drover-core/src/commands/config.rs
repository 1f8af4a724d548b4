use std::path::{Path, PathBuf};

use crate::command::{Command, Context};
use crate::config::ConfigStore;
use crate::definition::{CommandDefinition, OptionSpec};
use crate::error::ConsoleError;
use crate::output::TableStyle;

/// Dumps the merged configuration for the active environment as a
/// `Key`/`Value` table. The environment comes from the context, not from
/// this command's own flag handling.
pub struct ConfigCommand {
    default_root: PathBuf,
}

impl ConfigCommand {
    pub fn new() -> Self {
        ConfigCommand {
            default_root: PathBuf::from("config"),
        }
    }

    /// Use a different fragment root when `--path` is not given.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        ConfigCommand {
            default_root: root.into(),
        }
    }
}

impl Default for ConfigCommand {
    fn default() -> Self {
        ConfigCommand::new()
    }
}

impl Command for ConfigCommand {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("config")
            .description("Dump the merged configuration for the active environment")
            .option(
                OptionSpec::valued("path")
                    .description("Configuration root to walk for *.config fragments"),
            )
    }

    fn handle(&self, ctx: &mut Context<'_>) -> Result<i32, ConsoleError> {
        let root = ctx
            .option_str("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| self.default_root.clone());
        let store = ConfigStore::load(Path::new(&root), ctx.environment())?;

        let rows: Vec<Vec<String>> = store
            .iter()
            .map(|(key, value)| vec![key.to_string(), value.to_string()])
            .collect();
        ctx.table(&["Key", "Value"], &rows, TableStyle::Default);
        Ok(0)
    }
}
