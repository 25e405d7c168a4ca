//! The top-level command registry.
//!
//! [`Cli`] owns the command set, the registry-level subscribers and a handle
//! to the host process. [`Cli::run`] tokenizes the host argument vector
//! (minus program and script path), then calls every registry-level
//! subscriber followed by the matched command's subscribers, and finally
//! flushes collected warnings.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use cli_john::{Cli, HostProcess};
//!
//! struct Args(Vec<&'static str>);
//!
//! impl HostProcess for Args {
//!     fn pid(&self) -> u32 { 1 }
//!     fn cwd(&self) -> std::io::Result<std::path::PathBuf> { Ok("/".into()) }
//!     fn exit(&self, _code: i32) {}
//!     fn argv(&self) -> Vec<String> { self.0.iter().map(|s| s.to_string()).collect() }
//! }
//!
//! let mut cli = Cli::new(Args(vec!["prog", "app", "deploy", "staging", "--region", "eu"]));
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! cli.command("deploy")
//!     .on("command", move |event| {
//!         sink.lock().unwrap().push(event.options[0].arguments.clone());
//!     })
//!     .unwrap();
//!
//! let parsed = cli.run().unwrap();
//! assert_eq!(parsed.command_args, ["staging"]);
//! assert_eq!(*seen.lock().unwrap(), [vec!["eu".to_string()]]);
//! ```

use std::sync::Arc;

use cli_john_core::{Context, Value};
use serde::Serialize;
use tracing::debug;

use crate::command::{COMMAND_EVENT, Command, CommandMetadata};
use crate::error::{CliError, Result};
use crate::events::{
    CommandEvent, RunCallback, RunEvent, Subscribers, accept_event, normalize_name,
};
use crate::host::{HostProcess, ValueHost};
use crate::tokenizer::{ParseResult, tokenize};

/// Leading argv entries (program path, script path) excluded from parsing.
pub const ARGV_SKIP: usize = 2;

/// Command registry and dispatcher.
pub struct Cli {
    ctx: Arc<Context>,
    host: Box<dyn HostProcess>,
    commands: Vec<Command>,
    subscribers: Subscribers<RunCallback>,
    strict: bool,
}

/// Detached copy of the registry's state.
#[derive(Debug, Clone, Serialize)]
pub struct CliMetadata {
    /// Metadata of each command, in registration order.
    pub commands: Vec<CommandMetadata>,
    /// Snapshot of the registry-level subscribers.
    pub on_run_functions: Subscribers<RunCallback>,
}

impl std::fmt::Debug for Cli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cli")
            .field("pid", &self.host.pid())
            .field("commands", &self.commands)
            .field("subscribers", &self.subscribers)
            .field("strict", &self.strict)
            .finish()
    }
}

impl Cli {
    /// Creates a registry with its own context (warnings go to stderr).
    pub fn new(host: impl HostProcess + 'static) -> Self {
        Self::with_context(host, Context::shared())
    }

    /// Creates a registry sharing `ctx`.
    pub fn with_context(host: impl HostProcess + 'static, ctx: Arc<Context>) -> Self {
        debug!(pid = host.pid(), "registry created");
        Self {
            ctx,
            host: Box::new(host),
            commands: Vec::new(),
            subscribers: Subscribers::default(),
            strict: false,
        }
    }

    /// Creates a registry from an untyped host handle.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::InvalidHost`] if the handle fails the structural
    /// check (see [`ValueHost::from_value`]).
    pub fn from_value(handle: &Value, ctx: Arc<Context>) -> Result<Self> {
        let host = ValueHost::from_value(&ctx, handle)?;
        Ok(Self::with_context(host, ctx))
    }

    /// The shared matcher and warner.
    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// The host process handle.
    pub fn host(&self) -> &dyn HostProcess {
        self.host.as_ref()
    }

    /// In strict mode [`run`](Self::run) reports empty input and unknown
    /// commands as errors instead of doing nothing.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Returns `true` in strict mode.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Registers a command and returns it.
    ///
    /// Names are validated like [`Command::option`] names. Registering an
    /// existing name replaces that command in place with a fresh one.
    pub fn command(&mut self, name: impl Into<Value>) -> &mut Command {
        let name = normalize_name(&self.ctx, name.into(), "CLI.command");
        let command = Command::with_normalized_name(name, Arc::clone(&self.ctx));

        let index = match self.commands.iter().position(|c| c.name() == command.name()) {
            Some(index) => {
                debug!(command = command.name(), "command replaced");
                self.commands[index] = command;
                index
            }
            None => {
                debug!(command = command.name(), "command added");
                self.commands.push(command);
                self.commands.len() - 1
            }
        };
        &mut self.commands[index]
    }

    /// Looks up a command by exact name.
    pub fn find_command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name() == name)
    }

    /// Looks up a command by exact name for further registration.
    pub fn find_command_mut(&mut self, name: &str) -> Option<&mut Command> {
        self.commands.iter_mut().find(|c| c.name() == name)
    }

    /// Registered command names, in registration order.
    pub fn commands(&self) -> Vec<&str> {
        self.commands.iter().map(Command::name).collect()
    }

    /// Subscribes to every successful parse.
    ///
    /// Same event rules as [`Command::on`].
    pub fn on<F>(&mut self, event: impl Into<Value>, callback: F) -> Result<bool>
    where
        F: Fn(&RunEvent<'_>) + Send + Sync + 'static,
    {
        if !accept_event(&self.ctx, &event.into(), COMMAND_EVENT, "CLI.on")? {
            return Ok(false);
        }
        self.subscribers.push(Arc::new(callback));
        debug!(count = self.subscribers.len(), "registry subscriber added");
        Ok(true)
    }

    /// Tokenizes `tokens` against the registered commands without
    /// dispatching.
    pub fn parse<S: AsRef<str>>(&self, tokens: &[S]) -> ParseResult {
        tokenize(tokens, |name| self.find_command(name).is_some())
    }

    /// Parses the host argument vector and dispatches.
    ///
    /// Returns the parse result; an unmatched result means nothing was
    /// called and no warnings were flushed. A matched run always flushes,
    /// so under the default `summary` warn level it prints a count line to
    /// the warner's sink even when nothing was warned.
    ///
    /// # Errors
    ///
    /// Only in strict mode: [`CliError::EmptyInput`] or
    /// [`CliError::UnknownCommand`].
    pub fn run(&self) -> Result<ParseResult> {
        let argv = self.host.argv();
        let tokens = argv.get(ARGV_SKIP..).unwrap_or_default();
        self.run_with(tokens)
    }

    /// Like [`run`](Self::run), but parses `tokens` (already stripped of
    /// program and script path) instead of the host argument vector.
    pub fn run_with<S: AsRef<str>>(&self, tokens: &[S]) -> Result<ParseResult> {
        let parsed = self.parse(tokens);
        let command = match self.find_command(&parsed.command_name) {
            Some(command) if parsed.matched => command,
            _ => return self.unmatched(tokens),
        };

        // Snapshot both lists before calling anything.
        let run_subscribers = self.subscribers.clone();
        let command_subscribers = command.metadata().on_cmd_functions;
        debug!(
            command = %parsed.command_name,
            registry = run_subscribers.len(),
            command_level = command_subscribers.len(),
            "dispatching"
        );

        let run_event = RunEvent {
            command_args: &parsed.command_args,
            command_name: &parsed.command_name,
        };
        for callback in run_subscribers.iter() {
            callback(&run_event);
        }

        let command_event = CommandEvent {
            command_args: &parsed.command_args,
            options: &parsed.options,
        };
        for callback in command_subscribers.iter() {
            callback(&command_event);
        }

        self.ctx.warner().flush();
        Ok(parsed)
    }

    fn unmatched<S: AsRef<str>>(&self, tokens: &[S]) -> Result<ParseResult> {
        if self.strict {
            return Err(match tokens.first() {
                Some(first) => CliError::UnknownCommand(first.as_ref().to_string()),
                None => CliError::EmptyInput,
            });
        }
        debug!("no command matched");
        Ok(ParseResult::unmatched())
    }

    /// Returns a detached copy of the commands and registry-level
    /// subscribers.
    pub fn metadata(&self) -> CliMetadata {
        CliMetadata {
            commands: self.commands.iter().map(Command::metadata).collect(),
            on_run_functions: self.subscribers.clone(),
        }
    }
}
