use std::fs;
use std::path::{Path, PathBuf};

use crate::command::{Command, Context};
use crate::definition::{ArgumentSpec, CommandDefinition, OptionSpec};
use crate::error::ConsoleError;

const TEMPLATE: &str = r#"use drover::prelude::*;

/// @ClassName@
///
/// Command description.
pub struct @ClassName@;

impl Command for @ClassName@ {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("@CommandName@").description("Description of this command")
    }

    fn handle(&self, ctx: &mut Context<'_>) -> Result<i32, ConsoleError> {
        ctx.line("Hello World from @CommandName@", None, None);
        Ok(0)
    }
}
"#;

/// Scaffolds a new command source file from the embedded template.
/// Refuses to overwrite an existing target.
pub struct MakeCommandCommand;

impl Command for MakeCommandCommand {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("make:command")
            .description("Create a new command source file")
            .argument(ArgumentSpec::required("name"))
            .option(
                OptionSpec::optional_valued("dir", "src/commands")
                    .description("Directory the command file is written to"),
            )
    }

    fn handle(&self, ctx: &mut Context<'_>) -> Result<i32, ConsoleError> {
        let command_name = ctx.argument("name")?.to_string();
        let class_name = class_name_for(&command_name);
        let dir = PathBuf::from(ctx.option_str("dir").unwrap_or("src/commands"));
        let path = dir.join(format!("{}.rs", to_snake_case(&class_name)));

        if path.exists() {
            return Err(ConsoleError::FileExists(path));
        }
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let contents = TEMPLATE
            .replace("@CommandName@", &command_name)
            .replace("@ClassName@", &class_name);
        fs::write(&path, contents)?;
        append_module_line(&dir, &to_snake_case(&class_name))?;

        ctx.info(&format!("Created {}", path.display()));
        Ok(0)
    }
}

/// Derive the type name for a command name: camel-case on `:`, `-`, and
/// `_` boundaries, then append `Command`. `order:list` becomes
/// `OrderListCommand`.
fn class_name_for(command_name: &str) -> String {
    let mut class = String::new();
    for segment in command_name.split([':', '-', '_']) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            class.extend(first.to_uppercase());
            class.push_str(chars.as_str());
        }
    }
    class.push_str("Command");
    class
}

fn to_snake_case(name: &str) -> String {
    let mut result = String::new();
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Append a `pub mod` line for the new file when the target directory
/// already tracks its modules in a `mod.rs`.
fn append_module_line(dir: &Path, module: &str) -> Result<(), ConsoleError> {
    let mod_path = dir.join("mod.rs");
    if !mod_path.exists() {
        return Ok(());
    }
    let existing = fs::read_to_string(&mod_path)?;
    let line = format!("pub mod {module};\n");
    if !existing.contains(&line) {
        fs::write(&mod_path, format!("{existing}{line}"))?;
    }
    Ok(())
}
