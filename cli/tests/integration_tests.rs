use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use cli_john::{Cli, CliError, HostProcess, ParsedOption, tokenize};
use cli_john_core::{Context, Object, ProtectionLevel, TypeSpec, Value, Warner};

/// Host whose argv is `prog script <tokens...>`.
struct FixedArgv(Vec<String>);

impl FixedArgv {
    fn new(tokens: &[&str]) -> Self {
        Self(
            ["prog", "script"]
                .iter()
                .chain(tokens)
                .map(|t| t.to_string())
                .collect(),
        )
    }
}

impl HostProcess for FixedArgv {
    fn pid(&self) -> u32 {
        4242
    }

    fn cwd(&self) -> io::Result<PathBuf> {
        Ok(PathBuf::from("/work"))
    }

    fn exit(&self, _code: i32) {}

    fn argv(&self) -> Vec<String> {
        self.0.clone()
    }
}

fn quiet_context() -> Arc<Context> {
    Arc::new(Context::with_warner(Warner::with_sink(io::sink())))
}

fn cli_for(tokens: &[&str]) -> Cli {
    Cli::with_context(FixedArgv::new(tokens), quiet_context())
}

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[test]
fn build_with_two_options_reaches_both_subscriber_levels() {
    let mut cli = cli_for(&["build", "--force", "now", "--verbose"]);
    let registry_seen = log();
    let command_seen: Arc<Mutex<Vec<ParsedOption>>> = Arc::new(Mutex::new(Vec::new()));

    let r = Arc::clone(&registry_seen);
    cli.on("command", move |event| {
        r.lock()
            .unwrap()
            .push(format!("{}|{}", event.command_name, event.command_args.join(" ")));
    })
    .unwrap();

    let build = cli.command("build");
    build.option("--force");
    build.option("--verbose");
    let c = Arc::clone(&command_seen);
    build
        .on("command", move |event| {
            assert!(event.command_args.is_empty());
            c.lock().unwrap().extend(event.options.iter().cloned());
        })
        .unwrap();

    cli.run().unwrap();

    assert_eq!(*registry_seen.lock().unwrap(), ["build|"]);
    assert_eq!(
        *command_seen.lock().unwrap(),
        [
            ParsedOption {
                name: "--force".into(),
                arguments: vec!["now".into()],
            },
            ParsedOption {
                name: "--verbose".into(),
                arguments: vec![],
            },
        ]
    );
}

#[test]
fn deploy_collects_positional_and_multi_value_option() {
    let mut cli = cli_for(&["deploy", "staging", "--region", "us", "east"]);
    cli.command("deploy").option("--region");

    let parsed = cli.run().unwrap();
    assert_eq!(parsed.command_name, "deploy");
    assert_eq!(parsed.command_args, ["staging"]);
    assert_eq!(parsed.options.len(), 1);
    assert_eq!(parsed.options[0].name, "--region");
    assert_eq!(parsed.options[0].arguments, ["us", "east"]);
}

#[test]
fn empty_input_and_unknown_command_call_nothing() {
    for tokens in [&[][..], &["publish", "--now"][..]] {
        let mut cli = cli_for(tokens);
        let seen = log();
        let s = Arc::clone(&seen);
        cli.on("command", move |_| s.lock().unwrap().push("cli".into()))
            .unwrap();
        let s = Arc::clone(&seen);
        cli.command("build")
            .on("command", move |_| s.lock().unwrap().push("build".into()))
            .unwrap();

        let parsed = cli.run().unwrap();
        assert!(!parsed.matched);
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(cli.context().warner().count(), 0);
    }
}

#[test]
fn subscribers_run_in_registration_order() {
    let mut cli = cli_for(&["test"]);
    let order = log();

    for i in 0..3 {
        let o = Arc::clone(&order);
        cli.on("command", move |_| o.lock().unwrap().push(format!("cli{i}")))
            .unwrap();
    }
    let cmd = cli.command("test");
    for i in 0..2 {
        let o = Arc::clone(&order);
        cmd.on("COMMAND", move |_| o.lock().unwrap().push(format!("cmd{i}")))
            .unwrap();
    }

    cli.run().unwrap();
    assert_eq!(*order.lock().unwrap(), ["cli0", "cli1", "cli2", "cmd0", "cmd1"]);
}

#[test]
fn option_subscribers_are_stored_but_not_dispatched() {
    let mut cli = cli_for(&["build", "--force"]);
    let seen = log();
    let s = Arc::clone(&seen);
    cli.command("build")
        .option("--force")
        .on("option", move |_| s.lock().unwrap().push("force".into()))
        .unwrap();

    cli.run().unwrap();
    assert!(seen.lock().unwrap().is_empty());

    let meta = cli.metadata();
    assert_eq!(meta.commands[0].options[0].on_option_functions.len(), 1);
}

#[test]
fn options_need_not_be_registered_to_be_parsed() {
    let mut cli = cli_for(&["build", "--undeclared", "x"]);
    cli.command("build");
    let parsed = cli.run().unwrap();
    assert!(parsed.has_option("--undeclared"));
}

// ---------------------------------------------------------------------------
// Registration rules
// ---------------------------------------------------------------------------

#[test]
fn duplicate_option_names_leave_the_latest() {
    let mut cli = cli_for(&[]);
    let cmd = cli.command("serve");
    cmd.option("--port");
    cmd.option("--host");
    cmd.option("--port").on("option", |_| {}).unwrap();

    let meta = cli.metadata();
    let options = &meta.commands[0].options;
    let ports: Vec<_> = options.iter().filter(|o| o.name == "--port").collect();
    assert_eq!(ports.len(), 1);
    assert_eq!(ports[0].on_option_functions.len(), 1);
    assert_eq!(options[0].name, "--port");
}

#[test]
fn unknown_event_warns_and_registers_nothing() {
    let mut cli = cli_for(&["build"]);
    cli.command("build");
    let seen = log();
    let s = Arc::clone(&seen);

    assert!(!cli.on("start", move |_| s.lock().unwrap().push("start".into())).unwrap());
    assert_eq!(cli.context().warner().count(), 1);

    cli.run().unwrap();
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn non_string_event_is_an_error() {
    let mut cli = cli_for(&[]);
    let err = cli.on(Value::from(1), |_| {}).unwrap_err();
    assert!(matches!(err, CliError::InvalidArgument { actual: "number", .. }));
    assert_eq!(err.to_string(), "CLI.on: expected string, got number");
}

#[test]
fn whitespace_in_command_name_is_stripped() {
    let mut cli = cli_for(&["runall", "x"]);
    let seen = log();
    let s = Arc::clone(&seen);
    cli.command("run all")
        .on("command", move |e| s.lock().unwrap().extend(e.command_args.iter().cloned()))
        .unwrap();

    assert_eq!(cli.commands(), ["runall"]);
    cli.run().unwrap();
    assert_eq!(*seen.lock().unwrap(), ["x"]);
}

// ---------------------------------------------------------------------------
// Host handle and shared matcher
// ---------------------------------------------------------------------------

fn host_object() -> Object {
    Object::new()
        .with_field("pid", 10)
        .with_field("cwd", Value::function("cwd", |_| Value::from("/srv")))
        .with_field("exit", Value::function("exit", |_| Value::Undefined))
        .with_field("argv", vec!["node", "main.js", "status", "--json"])
}

#[test]
fn registry_from_value_host_runs_its_argv() {
    let mut cli = Cli::from_value(&Value::from(host_object()), quiet_context()).unwrap();
    cli.command("status");

    let parsed = cli.run().unwrap();
    assert!(parsed.matched);
    assert!(parsed.has_option("--json"));
    assert_eq!(cli.host().pid(), 10);
}

#[test]
fn registry_from_malformed_host_fails() {
    let no_exit = Object::new()
        .with_field("pid", 10)
        .with_field("cwd", Value::function("cwd", |_| Value::from("/srv")))
        .with_field("argv", vec!["a", "b"]);
    assert!(matches!(
        Cli::from_value(&Value::from(no_exit), quiet_context()),
        Err(CliError::InvalidHost(_))
    ));

    let string_pid = host_object().with_field("pid", "10");
    assert!(Cli::from_value(&Value::from(string_pid), quiet_context()).is_err());
}

#[test]
fn registry_and_handlers_share_one_context() {
    let ctx = quiet_context();
    let cli = Cli::with_context(FixedArgv::new(&[]), Arc::clone(&ctx));

    cli.context()
        .checker()
        .add_custom_handler("flag", |v| v.as_str().is_some_and(|s| s.starts_with("--")))
        .unwrap();
    assert!(ctx.checker().matches(&Value::from("--x"), &TypeSpec::from("flag")));

    ctx.checker().set_protection_level(ProtectionLevel::Hardened);
    assert!(
        cli.context()
            .checker()
            .add_custom_handler("flag", |_| true)
            .is_err()
    );
    assert!(!ctx.checker().matches(&Value::from("x"), &TypeSpec::from("flag")));
}

// ---------------------------------------------------------------------------
// Tokenizer properties
// ---------------------------------------------------------------------------

#[test]
fn tokenize_round_trips_structured_input() {
    let cases: Vec<(&str, Vec<&str>, Vec<(&str, Vec<&str>)>)> = vec![
        ("build", vec![], vec![]),
        ("build", vec!["a", "-b"], vec![("--c", vec![])]),
        (
            "deploy",
            vec!["staging"],
            vec![("--region", vec!["us", "east"]), ("--dry-run", vec![])],
        ),
        ("build", vec![], vec![("--x", vec!["1"]), ("--x", vec!["2", "3"])]),
    ];

    for (command, args, options) in cases {
        let mut tokens = vec![command];
        tokens.extend(&args);
        for (name, values) in &options {
            tokens.push(*name);
            tokens.extend(values);
        }

        let parsed = tokenize(&tokens, |c| c == command);
        assert_eq!(parsed.command_name, command);
        assert_eq!(parsed.command_args, args);
        let got: Vec<(&str, Vec<&str>)> = parsed
            .options
            .iter()
            .map(|o| (o.name.as_str(), o.arguments.iter().map(String::as_str).collect()))
            .collect();
        assert_eq!(got, options);
        assert_eq!(tokenize(&parsed.to_tokens(), |c| c == command), parsed);
    }
}

// ---------------------------------------------------------------------------
// Binary
// ---------------------------------------------------------------------------

fn write_config(dir: &tempfile::TempDir, yaml: &str) -> PathBuf {
    let path = dir.path().join("cli-john.yml");
    fs::write(&path, yaml).expect("failed to write config");
    path
}

#[test]
fn binary_prints_parse_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        &dir,
        "warn_level: silent\ncommands:\n  - name: deploy\n    options: [--region]\n",
    );

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_cli-john"))
        .args(["deploy", "staging", "--region", "us", "east"])
        .env("CLI_JOHN_CONFIG", &config)
        .output()
        .expect("failed to run cli-john");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["command_name"], "deploy");
    assert_eq!(json["command_args"], serde_json::json!(["staging"]));
    assert_eq!(
        json["options"],
        serde_json::json!([{ "name": "--region", "arguments": ["us", "east"] }])
    );
    assert_eq!(json["matched"], true);
}

#[test]
fn binary_exits_with_usage_on_unknown_command() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "commands:\n  - name: deploy\n");

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_cli-john"))
        .arg("publish")
        .env("CLI_JOHN_CONFIG", &config)
        .output()
        .expect("failed to run cli-john");

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("deploy"));
}

#[test]
fn binary_strict_mode_reports_unknown_command() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "strict: true\ncommands:\n  - name: deploy\n");

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_cli-john"))
        .arg("publish")
        .env("CLI_JOHN_CONFIG", &config)
        .output()
        .expect("failed to run cli-john");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown command: publish"));
}
