//! `cli-john`: declares commands from a YAML file and prints each parse as
//! JSON.
//!
//! The config path comes from `CLI_JOHN_CONFIG` (default `cli-john.yml`);
//! a missing file means no commands. Log verbosity follows `RUST_LOG`.

use std::process::ExitCode;

use cli_john::{Cli, CliConfig, CliError, ProcessHost};
use cli_john_core::Warner;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "CLI_JOHN_CONFIG";
const DEFAULT_CONFIG: &str = "cli-john.yml";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, CliError> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let config = CliConfig::load_or_default(&path)?;
    let mut cli = config.build_cli(ProcessHost, Warner::new());

    cli.on("command", |event| {
        info!(
            command = event.command_name,
            args = event.command_args.len(),
            "command matched"
        );
    })?;

    let parsed = cli.run()?;
    if !parsed.matched {
        print_usage(&cli);
        return Ok(ExitCode::from(2));
    }

    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(ExitCode::SUCCESS)
}

fn print_usage(cli: &Cli) {
    let commands = cli.commands();
    if commands.is_empty() {
        eprintln!("no commands declared; set {CONFIG_ENV} to a config file");
        return;
    }
    eprintln!("usage: <command> [args...] [--option [values...]]...");
    eprintln!("commands:");
    for name in commands {
        let options = cli
            .find_command(name)
            .map(|c| {
                c.options()
                    .iter()
                    .map(|o| o.name())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        eprintln!("  {name} {options}");
    }
}
