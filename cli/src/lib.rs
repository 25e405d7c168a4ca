//! Command/option registry, argument tokenizer and subscriber dispatch.
//!
//! This crate is shared infrastructure for small command-line tools:
//!
//! - [`Cli`]: the registry. Owns [`Command`]s, registry-level subscribers
//!   and a [`HostProcess`] handle; [`Cli::run`] parses the host argument
//!   vector and dispatches.
//! - [`Command`]: a named node with ordered [`CommandOption`]s and its own
//!   subscribers.
//! - [`tokenize`]: the pure tokenizer producing a [`ParseResult`].
//! - [`CliConfig`]: YAML configuration for declaring commands and tuning
//!   the matcher and warner.
//!
//! Argument validation throughout goes through the structural matcher in
//! [`cli_john_core`], shared via its [`Context`](cli_john_core::Context).
//!
//! There are no built-in flags and the registry never exits the process;
//! exit codes belong to the embedding program.
//!
//! # Example
//!
//! ```
//! use cli_john::tokenize;
//!
//! let parsed = tokenize(&["build", "--force", "now", "--verbose"], |c| c == "build");
//! assert!(parsed.command_args.is_empty());
//! assert_eq!(parsed.options.len(), 2);
//! assert_eq!(parsed.options[0].arguments, ["now"]);
//! assert!(parsed.options[1].arguments.is_empty());
//! ```

mod command;
mod config;
mod error;
mod events;
mod host;
mod option;
mod registry;
mod tokenizer;

pub use command::{COMMAND_EVENT, Command, CommandMetadata};
pub use config::{CliConfig, CommandConfig};
pub use error::{CliError, Result};
pub use events::{
    CommandCallback, CommandEvent, OptionCallback, OptionEvent, RunCallback, RunEvent, Subscribers,
};
pub use host::{HostProcess, ProcessHost, ValueHost};
pub use option::{CommandOption, OPTION_EVENT, OptionMetadata};
pub use registry::{ARGV_SKIP, Cli, CliMetadata};
pub use tokenizer::{OPTION_PREFIX, ParseResult, ParsedOption, tokenize};
