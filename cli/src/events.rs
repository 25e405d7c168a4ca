//! Subscriber lists, event payloads, and the argument checks shared by
//! `CLI.command`, `CLI.Command.option` and every `on` method.

use std::fmt;
use std::sync::Arc;

use cli_john_core::{Context, TypeSpec, Value, Warning};
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::{CliError, Result};
use crate::tokenizer::ParsedOption;

/// Payload for registry-level subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunEvent<'a> {
    /// Positional tokens before the first option.
    pub command_args: &'a [String],
    /// Name of the matched command.
    pub command_name: &'a str,
}

/// Payload for command-level subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEvent<'a> {
    /// Positional tokens before the first option.
    pub command_args: &'a [String],
    /// Options in input order.
    pub options: &'a [ParsedOption],
}

/// Payload for option-level subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionEvent<'a> {
    /// Full option token.
    pub option_name: &'a str,
    /// Tokens captured by the option.
    pub arguments: &'a [String],
}

/// Registry-level callback.
pub type RunCallback = dyn Fn(&RunEvent<'_>) + Send + Sync;
/// Command-level callback.
pub type CommandCallback = dyn Fn(&CommandEvent<'_>) + Send + Sync;
/// Option-level callback.
pub type OptionCallback = dyn Fn(&OptionEvent<'_>) + Send + Sync;

/// Ordered list of callbacks.
///
/// Cloning copies the list, not the callbacks, so a clone is a snapshot:
/// later registrations on the original do not show up in it.
pub struct Subscribers<F: ?Sized> {
    callbacks: Vec<Arc<F>>,
}

impl<F: ?Sized> Subscribers<F> {
    pub(crate) fn push(&mut self, callback: Arc<F>) {
        self.callbacks.push(callback);
    }

    /// Number of callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Returns `true` if no callback is registered.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Callbacks in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<F>> {
        self.callbacks.iter()
    }
}

impl<F: ?Sized> Default for Subscribers<F> {
    fn default() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }
}

impl<F: ?Sized> Clone for Subscribers<F> {
    fn clone(&self) -> Self {
        Self {
            callbacks: self.callbacks.clone(),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Subscribers<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subscribers({})", self.callbacks.len())
    }
}

/// Serialized as the callback count.
impl<F: ?Sized> Serialize for Subscribers<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.callbacks.len() as u64)
    }
}

/// Validates a command or option name.
///
/// Non-string names fall back to their stable string encoding and
/// whitespace is stripped; both produce a warning. An empty result is kept
/// but also warned about.
pub(crate) fn normalize_name(ctx: &Context, name: Value, source: &'static str) -> String {
    // A custom "string" handler can shadow the category, so the value is
    // read directly once the matcher has passed it.
    let checked = ctx.checker().check(std::slice::from_ref(&name), &[TypeSpec::from("string")]);
    let raw = if let (true, Some(s)) = (checked, name.as_str()) {
        s.to_string()
    } else {
        let fallback = name.to_stable_string();
        ctx.warn(
            Warning::new(format!(
                "expected a string name, got {}; using {fallback:?}",
                name.category()
            ))
            .with_source(source),
        );
        fallback
    };

    let stripped: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if stripped != raw {
        ctx.warn(
            Warning::new(format!("name {raw:?} contains whitespace; using {stripped:?}"))
                .with_source(source)
                .with_hint("names must not contain spaces"),
        );
    }
    if stripped.is_empty() {
        ctx.warn(Warning::new("name is empty").with_source(source));
    }
    stripped
}

/// Checks an `on(event, ..)` call.
///
/// A non-string event is a wiring mistake and fails. A string other than
/// `expected` (compared case-insensitively) is warned about and yields
/// `Ok(false)`, meaning the callback must not be registered.
pub(crate) fn accept_event(
    ctx: &Context,
    event: &Value,
    expected: &str,
    source: &'static str,
) -> Result<bool> {
    let checked = ctx.checker().check(std::slice::from_ref(event), &[TypeSpec::from("string")]);
    let Some(name) = event.as_str().filter(|_| checked) else {
        return Err(CliError::InvalidArgument {
            source_name: source,
            expected: "string",
            actual: event.category(),
        });
    };

    if name.eq_ignore_ascii_case(expected) {
        return Ok(true);
    }

    debug!(event = name, source, "rejected unknown event");
    ctx.warn(
        Warning::new(format!("unknown event {name:?}; callback not registered"))
            .with_source(source)
            .with_hint(format!("the only supported event is {expected:?}")),
    );
    Ok(false)
}
