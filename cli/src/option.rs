//! Options: named leaves attached to a [`Command`](crate::Command).

use std::sync::Arc;

use cli_john_core::{Context, Value};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::events::{OptionCallback, OptionEvent, Subscribers, accept_event};

/// Event literal accepted by [`CommandOption::on`].
pub const OPTION_EVENT: &str = "option";

/// A named option owned by a command.
///
/// Option-level subscribers are stored and reported in
/// [`OptionMetadata`], but [`Cli::run`](crate::Cli::run) does not dispatch
/// to them.
#[derive(Debug)]
pub struct CommandOption {
    name: String,
    subscribers: Subscribers<OptionCallback>,
    ctx: Arc<Context>,
}

/// Detached copy of an option's state.
#[derive(Debug, Clone, Serialize)]
pub struct OptionMetadata {
    /// Option name, prefix included.
    pub name: String,
    /// Snapshot of the option's subscribers.
    pub on_option_functions: Subscribers<OptionCallback>,
}

impl CommandOption {
    pub(crate) fn new(name: String, ctx: Arc<Context>) -> Self {
        Self {
            name,
            subscribers: Subscribers::default(),
            ctx,
        }
    }

    /// The option name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subscribes to the `"option"` event.
    ///
    /// See [`Command::on`](crate::Command::on) for the validation rules.
    pub fn on<F>(&mut self, event: impl Into<Value>, callback: F) -> Result<bool>
    where
        F: Fn(&OptionEvent<'_>) + Send + Sync + 'static,
    {
        if !accept_event(&self.ctx, &event.into(), OPTION_EVENT, "CLI.Command.Option.on")? {
            return Ok(false);
        }
        self.subscribers.push(Arc::new(callback));
        debug!(option = %self.name, "option subscriber added");
        Ok(true)
    }

    /// Returns a detached copy of the option's name and subscribers.
    pub fn metadata(&self) -> OptionMetadata {
        OptionMetadata {
            name: self.name.clone(),
            on_option_functions: self.subscribers.clone(),
        }
    }
}
