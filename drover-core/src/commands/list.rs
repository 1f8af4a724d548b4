use crate::command::{Command, Context};
use crate::definition::CommandDefinition;
use crate::error::ConsoleError;
use crate::output::TableStyle;

/// Default command: renders every registered command with its
/// description.
pub struct ListCommand;

impl Command for ListCommand {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("list").description("List available commands")
    }

    fn handle(&self, ctx: &mut Context<'_>) -> Result<i32, ConsoleError> {
        let (name, version) = ctx.application();
        let banner = format!("{name} {version}");
        ctx.line(&banner, None, None);

        let rows: Vec<Vec<String>> = ctx
            .commands()
            .into_iter()
            .map(|(name, description)| vec![name, description])
            .collect();
        ctx.table(&["Command", "Description"], &rows, TableStyle::Default);
        Ok(0)
    }
}
