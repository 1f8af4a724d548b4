use drover_core::prelude::*;
use drover_core::{SharedBuffer, DEFAULT_ENVIRONMENT};
use serial_test::serial;

fn capture() -> (Output, SharedBuffer) {
    let buffer = SharedBuffer::new();
    let output = Output::with_writer(Verbosity::Normal, Box::new(buffer.clone()));
    (output, buffer)
}

fn console() -> Console {
    Console::new("testapp", "0.0.0")
}

// ── Stub commands ───────────────────────────────────────────────────

struct GreetCommand;

impl Command for GreetCommand {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::from_signature("greet {who} {--loud}", "Say hello")
            .expect("valid signature")
    }

    fn handle(&self, ctx: &mut Context<'_>) -> Result<i32, ConsoleError> {
        let mut greeting = format!("Hello {}", ctx.argument("who")?);
        if ctx.flag("loud") {
            greeting = greeting.to_uppercase();
        }
        ctx.line(&greeting, None, None);
        Ok(0)
    }
}

struct SevenCommand;

impl Command for SevenCommand {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("seven").description("Exit with status seven")
    }

    fn handle(&self, ctx: &mut Context<'_>) -> Result<i32, ConsoleError> {
        ctx.line("seven ran", None, None);
        Ok(7)
    }
}

struct EnvProbeCommand;

impl Command for EnvProbeCommand {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("probe").description("Report the active environment")
    }

    fn handle(&self, ctx: &mut Context<'_>) -> Result<i32, ConsoleError> {
        let line = format!(
            "ctx={} process={}",
            ctx.environment(),
            std::env::var("APP_ENV").unwrap_or_default()
        );
        ctx.line(&line, None, None);
        Ok(0)
    }
}

struct BoomCommand;

impl Command for BoomCommand {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("boom").description("Always fails")
    }

    fn handle(&self, _ctx: &mut Context<'_>) -> Result<i32, ConsoleError> {
        Err(ConsoleError::failure("boom"))
    }
}

/// Calls another command by name taken from its own argument.
struct CallerCommand {
    silent: bool,
}

impl Command for CallerCommand {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::from_signature("caller {target}", "Invoke another command")
            .expect("valid signature")
    }

    fn handle(&self, ctx: &mut Context<'_>) -> Result<i32, ConsoleError> {
        let target = ctx.argument("target")?.to_string();
        let args = [("who", "world")];
        let args: &[(&str, &str)] = if target == "greet" { &args } else { &[] };
        if self.silent {
            ctx.call_silent(&target, args)
        } else {
            ctx.call(&target, args)
        }
    }
}

struct CountCommand;

impl Command for CountCommand {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("count").description("Count invocations")
    }

    fn handle(&self, ctx: &mut Context<'_>) -> Result<i32, ConsoleError> {
        let runs: u32 = ctx
            .state_get("runs")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
            + 1;
        ctx.state_put("runs", runs.to_string());
        ctx.line(&format!("runs={runs}"), None, None);
        Ok(0)
    }
}

struct ClockService {
    now: &'static str,
}

struct TellTimeCommand;

impl Command for TellTimeCommand {
    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new("time").description("Print the clock service's time")
    }

    fn handle(&self, ctx: &mut Context<'_>) -> Result<i32, ConsoleError> {
        let clock = ctx.service::<ClockService>("clock")?;
        ctx.line(clock.now, None, None);
        Ok(0)
    }
}

// ── Registration ────────────────────────────────────────────────────

#[test]
fn duplicate_command_name_is_rejected() {
    let mut console = console();
    console.register(Box::new(GreetCommand)).unwrap();
    let err = console.register(Box::new(GreetCommand)).unwrap_err();
    assert!(matches!(err, ConsoleError::DuplicateCommandName(name) if name == "greet"));
}

#[test]
fn register_all_rejects_collisions_with_builtins() {
    struct ShadowList;
    impl Command for ShadowList {
        fn definition(&self) -> CommandDefinition {
            CommandDefinition::new("list")
        }
        fn handle(&self, _ctx: &mut Context<'_>) -> Result<i32, ConsoleError> {
            Ok(0)
        }
    }
    let mut console = console();
    let err = console
        .register_all(vec![Box::new(ShadowList) as Box<dyn Command>])
        .unwrap_err();
    assert!(matches!(err, ConsoleError::DuplicateCommandName(_)));
}

#[test]
fn every_definition_gains_the_env_option() {
    let mut console = console();
    console.register(Box::new(GreetCommand)).unwrap();
    for name in ["greet", "list", "config", "make:command"] {
        let definition = console.definition(name).unwrap();
        let env = definition
            .options
            .iter()
            .find(|o| o.name == "env")
            .unwrap_or_else(|| panic!("{name} is missing the env option"));
        assert_eq!(env.short, Some('e'));
        assert_eq!(env.mode, ValueMode::Optional);
        assert_eq!(env.default.as_deref(), Some(DEFAULT_ENVIRONMENT));
    }
}

#[test]
fn empty_command_name_is_rejected() {
    struct Nameless;
    impl Command for Nameless {
        fn definition(&self) -> CommandDefinition {
            CommandDefinition::new("")
        }
        fn handle(&self, _ctx: &mut Context<'_>) -> Result<i32, ConsoleError> {
            Ok(0)
        }
    }
    let mut console = console();
    let err = console.register(Box::new(Nameless)).unwrap_err();
    assert!(matches!(err, ConsoleError::InvalidDefinition(_)));
}

// ── Dispatch ────────────────────────────────────────────────────────

#[test]
#[serial]
fn dispatch_binds_arguments_and_flags() {
    let mut console = console();
    console.register(Box::new(GreetCommand)).unwrap();
    let (mut output, buffer) = capture();
    let code = console
        .run(["greet", "world", "--loud"], &mut output)
        .unwrap();
    assert_eq!(code, 0);
    assert_eq!(buffer.contents(), "HELLO WORLD\n");
}

#[test]
#[serial]
fn missing_required_argument_is_usage_error_with_exit_code_2() {
    let mut console = console();
    console.register(Box::new(GreetCommand)).unwrap();
    let (mut output, _buffer) = capture();
    let err = console.run(["greet"], &mut output).unwrap_err();
    assert!(matches!(err, ConsoleError::Usage(_)));
    assert_eq!(err.exit_code(), 2);

    let (mut output, _buffer) = capture();
    assert_eq!(console.run_to_exit_code(["greet"], &mut output), 2);
}

#[test]
#[serial]
fn unknown_command_fails_with_exit_code_1() {
    let console = console();
    let (mut output, _buffer) = capture();
    let err = console.run(["nope"], &mut output).unwrap_err();
    assert!(matches!(err, ConsoleError::UnknownCommand(name) if name == "nope"));

    let (mut output, _buffer) = capture();
    assert_eq!(console.run_to_exit_code(["nope"], &mut output), 1);
}

#[test]
#[serial]
fn command_exit_status_propagates() {
    let mut console = console();
    console.register(Box::new(SevenCommand)).unwrap();
    let (mut output, _buffer) = capture();
    assert_eq!(console.run(["seven"], &mut output).unwrap(), 7);
}

#[test]
#[serial]
fn handle_failure_propagates_uncaught() {
    let mut console = console();
    console.register(Box::new(BoomCommand)).unwrap();
    let (mut output, _buffer) = capture();
    let err = console.run(["boom"], &mut output).unwrap_err();
    assert!(matches!(err, ConsoleError::Failure(_)));
    assert_eq!(err.exit_code(), 1);
}

#[test]
#[serial]
fn dispatch_failure_is_logged_under_the_console_target() {
    let mut console = console();
    console.register(Box::new(BoomCommand)).unwrap();
    console.set_failure_formatter(|_| Err(ConsoleError::failure("formatter broke")));

    let log = SharedBuffer::new();
    let sink = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || sink.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        let (mut output, _buffer) = capture();
        let _ = console.run(["boom"], &mut output);
    });

    let logged = log.contents();
    assert!(logged.contains("console"), "missing log target: {logged}");
    assert!(logged.contains("command failed"));
    assert!(logged.contains("boom"));
    assert!(logged.contains("formatter broke"));
}

#[test]
#[serial]
fn option_only_argv_runs_the_default_command() {
    let mut console = console();
    console.register(Box::new(GreetCommand)).unwrap();
    let (mut output, buffer) = capture();
    let code = console.run(["--env=staging"], &mut output).unwrap();
    assert_eq!(code, 0);
    let listing = buffer.contents();
    assert!(listing.contains("testapp 0.0.0"));
    assert!(listing.contains("greet"));
}

#[test]
#[serial]
fn empty_argv_falls_back_to_list() {
    let mut console = console();
    console.register(Box::new(GreetCommand)).unwrap();
    let (mut output, buffer) = capture();
    let code = console.run(Vec::<String>::new(), &mut output).unwrap();
    assert_eq!(code, 0);
    let listing = buffer.contents();
    assert!(listing.contains("testapp 0.0.0"));
    for name in ["list", "config", "make:command", "greet"] {
        assert!(listing.contains(name), "listing should mention {name}");
    }
}

// ── Environment selection ───────────────────────────────────────────

#[test]
#[serial]
fn env_option_is_observable_inside_handle() {
    let mut console = console();
    console.register(Box::new(EnvProbeCommand)).unwrap();
    let (mut output, buffer) = capture();
    console.run(["probe", "--env=staging"], &mut output).unwrap();
    assert_eq!(buffer.contents(), "ctx=staging process=staging\n");
}

#[test]
#[serial]
fn env_defaults_to_development() {
    let mut console = console();
    console.register(Box::new(EnvProbeCommand)).unwrap();
    let (mut output, buffer) = capture();
    console.run(["probe"], &mut output).unwrap();
    assert_eq!(buffer.contents(), "ctx=development process=development\n");
}

#[test]
#[serial]
fn short_env_flag_without_value_uses_default() {
    let mut console = console();
    console.register(Box::new(EnvProbeCommand)).unwrap();
    let (mut output, buffer) = capture();
    console.run(["probe", "--env"], &mut output).unwrap();
    assert_eq!(buffer.contents(), "ctx=development process=development\n");
}

// ── Nested invocation ───────────────────────────────────────────────

#[test]
#[serial]
fn call_forwards_output_and_exit_code() {
    let mut console = console();
    console.register(Box::new(GreetCommand)).unwrap();
    console.register(Box::new(SevenCommand)).unwrap();
    console
        .register(Box::new(CallerCommand { silent: false }))
        .unwrap();

    let (mut output, buffer) = capture();
    let code = console.run(["caller", "greet"], &mut output).unwrap();
    assert_eq!(code, 0);
    assert_eq!(buffer.contents(), "Hello world\n");

    let (mut output, buffer) = capture();
    let code = console.run(["caller", "seven"], &mut output).unwrap();
    assert_eq!(code, 7);
    assert!(buffer.contents().contains("seven ran"));
}

#[test]
#[serial]
fn call_silent_discards_callee_output() {
    let mut console = console();
    console.register(Box::new(GreetCommand)).unwrap();
    console
        .register(Box::new(CallerCommand { silent: true }))
        .unwrap();

    let (mut output, buffer) = capture();
    let code = console.run(["caller", "greet"], &mut output).unwrap();
    assert_eq!(code, 0);
    assert_eq!(buffer.contents(), "");
}

#[test]
#[serial]
fn call_unknown_command_fails() {
    let mut console = console();
    console
        .register(Box::new(CallerCommand { silent: false }))
        .unwrap();

    let (mut output, _buffer) = capture();
    let err = console.run(["caller", "missing"], &mut output).unwrap_err();
    assert!(matches!(err, ConsoleError::UnknownCommand(name) if name == "missing"));
}

// ── Services and state ──────────────────────────────────────────────

#[test]
#[serial]
fn commands_resolve_registered_services() {
    let mut console = console();
    console
        .services_mut()
        .register("clock", || ClockService { now: "noon" });
    console.register(Box::new(TellTimeCommand)).unwrap();

    let (mut output, buffer) = capture();
    console.run(["time"], &mut output).unwrap();
    assert_eq!(buffer.contents(), "noon\n");
}

#[test]
#[serial]
fn unresolved_service_fails_loudly() {
    let mut console = console();
    console.register(Box::new(TellTimeCommand)).unwrap();

    let (mut output, _buffer) = capture();
    let err = console.run(["time"], &mut output).unwrap_err();
    assert!(matches!(err, ConsoleError::UnknownService(_)));
}

#[test]
#[serial]
fn state_bag_survives_repeated_invocations() {
    let mut console = console();
    console.register(Box::new(CountCommand)).unwrap();

    let (mut output, buffer) = capture();
    console.run(["count"], &mut output).unwrap();
    console.run(["count"], &mut output).unwrap();
    assert_eq!(buffer.contents(), "runs=1\nruns=2\n");
}
