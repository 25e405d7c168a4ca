//! Commands: named nodes owned by the [`Cli`](crate::Cli) registry.
//!
//! A command keeps an ordered list of [`CommandOption`]s, unique by name,
//! and the subscribers called when the command matches.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use cli_john::Command;
//! use cli_john_core::{Context, Warner};
//!
//! let ctx = Arc::new(Context::with_warner(Warner::with_sink(std::io::sink())));
//! let mut build = Command::new("build", ctx);
//! build.option("--force");
//! build.option("--verbose");
//! build.option("--force");
//!
//! let names: Vec<String> = build.metadata().options.into_iter().map(|o| o.name).collect();
//! assert_eq!(names, ["--force", "--verbose"]);
//! ```

use std::sync::Arc;

use cli_john_core::{Context, Value};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::events::{
    CommandCallback, CommandEvent, Subscribers, accept_event, normalize_name,
};
use crate::option::{CommandOption, OptionMetadata};

/// Event literal accepted by [`Command::on`] and [`Cli::on`](crate::Cli::on).
pub const COMMAND_EVENT: &str = "command";

/// A registered command.
#[derive(Debug)]
pub struct Command {
    name: String,
    options: Vec<CommandOption>,
    subscribers: Subscribers<CommandCallback>,
    ctx: Arc<Context>,
}

/// Detached copy of a command's state.
#[derive(Debug, Clone, Serialize)]
pub struct CommandMetadata {
    /// Command name.
    pub name: String,
    /// Metadata of each option, in registration order.
    pub options: Vec<OptionMetadata>,
    /// Snapshot of the command's subscribers.
    pub on_cmd_functions: Subscribers<CommandCallback>,
}

impl Command {
    /// Creates a command. The name is validated and stripped of whitespace
    /// like [`Command::option`] names.
    pub fn new(name: impl Into<Value>, ctx: Arc<Context>) -> Self {
        let name = normalize_name(&ctx, name.into(), "CLI.command");
        Self::with_normalized_name(name, ctx)
    }

    pub(crate) fn with_normalized_name(name: String, ctx: Arc<Context>) -> Self {
        Self {
            name,
            options: Vec::new(),
            subscribers: Subscribers::default(),
            ctx,
        }
    }

    /// The command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers an option and returns it.
    ///
    /// Non-string names are replaced by their stable string encoding and
    /// whitespace is stripped, both with a warning. Registering an existing
    /// name replaces that option in place with a fresh one; anything attached
    /// to the old option is dropped.
    pub fn option(&mut self, name: impl Into<Value>) -> &mut CommandOption {
        let name = normalize_name(&self.ctx, name.into(), "CLI.Command.option");
        let option = CommandOption::new(name, Arc::clone(&self.ctx));

        let index = match self.options.iter().position(|o| o.name() == option.name()) {
            Some(index) => {
                debug!(command = %self.name, option = option.name(), "option replaced");
                self.options[index] = option;
                index
            }
            None => {
                debug!(command = %self.name, option = option.name(), "option added");
                self.options.push(option);
                self.options.len() - 1
            }
        };
        &mut self.options[index]
    }

    /// Looks up an option by exact name.
    pub fn find_option(&self, name: &str) -> Option<&CommandOption> {
        self.options.iter().find(|o| o.name() == name)
    }

    /// Options in registration order.
    pub fn options(&self) -> &[CommandOption] {
        &self.options
    }

    /// Subscribes to the `"command"` event (case-insensitive).
    ///
    /// Returns `Ok(true)` when registered. Any other event literal is
    /// warned about and ignored (`Ok(false)`); a non-string event is
    /// [`CliError::InvalidArgument`](crate::CliError::InvalidArgument).
    pub fn on<F>(&mut self, event: impl Into<Value>, callback: F) -> Result<bool>
    where
        F: Fn(&CommandEvent<'_>) + Send + Sync + 'static,
    {
        if !accept_event(&self.ctx, &event.into(), COMMAND_EVENT, "CLI.Command.on")? {
            return Ok(false);
        }
        self.subscribers.push(Arc::new(callback));
        debug!(command = %self.name, "command subscriber added");
        Ok(true)
    }

    /// Returns a detached copy of the command's name, options and
    /// subscribers.
    pub fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: self.name.clone(),
            options: self.options.iter().map(CommandOption::metadata).collect(),
            on_cmd_functions: self.subscribers.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cli_john_core::Warner;

    use super::*;
    use crate::CliError;

    fn ctx() -> Arc<Context> {
        Arc::new(Context::with_warner(Warner::with_sink(std::io::sink())))
    }

    #[test]
    fn test_reregistering_option_replaces_in_place() {
        let mut cmd = Command::new("deploy", ctx());
        cmd.option("--region");
        cmd.option("--dry-run");
        cmd.option("--region")
            .on("option", |_| {})
            .unwrap();
        cmd.option("--region");

        let meta = cmd.metadata();
        let names: Vec<&str> = meta.options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["--region", "--dry-run"]);
        // The replacement is a fresh option without the old subscriber.
        assert!(meta.options[0].on_option_functions.is_empty());
    }

    #[test]
    fn test_option_name_with_spaces_is_stripped() {
        let ctx = ctx();
        let mut cmd = Command::new("build", Arc::clone(&ctx));
        assert_eq!(cmd.option("--dry run").name(), "--dryrun");
        assert!(cmd.find_option("--dryrun").is_some());
        assert_eq!(ctx.warner().count(), 1);
    }

    #[test]
    fn test_command_name_is_normalized() {
        let ctx = ctx();
        let cmd = Command::new(Value::from(3), Arc::clone(&ctx));
        assert_eq!(cmd.name(), "3");
        assert_eq!(ctx.warner().count(), 1);
    }

    #[test]
    fn test_on_registers_only_command_event() {
        let ctx = ctx();
        let mut cmd = Command::new("build", Arc::clone(&ctx));
        assert!(cmd.on("Command", |_| {}).unwrap());
        assert!(!cmd.on("run", |_| {}).unwrap());
        assert_eq!(cmd.metadata().on_cmd_functions.len(), 1);
        assert_eq!(ctx.warner().count(), 1);
    }

    #[test]
    fn test_on_rejects_non_string_event() {
        let mut cmd = Command::new("build", ctx());
        let result = cmd.on(Value::Null, |_| {});
        assert!(matches!(result, Err(CliError::InvalidArgument { .. })));
        assert!(cmd.metadata().on_cmd_functions.is_empty());
    }

    #[test]
    fn test_shadowed_string_handler_keeps_name_encoding() {
        let ctx = ctx();
        ctx.checker().add_custom_handler("string", |_| true).unwrap();
        let mut cmd = Command::new("build", Arc::clone(&ctx));

        assert_eq!(cmd.option(Value::from(5)).name(), "5");
        assert!(matches!(
            cmd.on(Value::from(1), |_| {}),
            Err(CliError::InvalidArgument { .. })
        ));
        assert!(cmd.metadata().on_cmd_functions.is_empty());
    }

    #[test]
    fn test_metadata_is_detached() {
        let mut cmd = Command::new("build", ctx());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        cmd.on("command", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        let before = cmd.metadata();
        cmd.on("command", |_| {}).unwrap();
        cmd.option("--late");

        assert_eq!(before.on_cmd_functions.len(), 1);
        assert!(before.options.is_empty());

        let event = CommandEvent {
            command_args: &[],
            options: &[],
        };
        for callback in before.on_cmd_functions.iter() {
            callback(&event);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_metadata_serializes_subscriber_counts() {
        let mut cmd = Command::new("build", ctx());
        cmd.option("--force");
        cmd.on("command", |_| {}).unwrap();

        let json = serde_json::to_value(cmd.metadata()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "build",
                "options": [{ "name": "--force", "on_option_functions": 0 }],
                "on_cmd_functions": 1
            })
        );
    }
}
