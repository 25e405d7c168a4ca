//! Error types for registry construction, subscription and dispatch.
//!
//! Input-shape problems that can be recovered from (odd names, unknown event
//! literals) go through the [`Warner`](cli_john_core::Warner) instead. The
//! variants here are wiring mistakes, strict-mode parse failures, and
//! configuration I/O.

use cli_john_core::MatchError;
use thiserror::Error;

/// Errors returned by the registry and its configuration layer.
#[derive(Debug, Error)]
pub enum CliError {
    /// The host handle failed the structural check.
    #[error("invalid host process handle: {0}")]
    InvalidHost(String),

    /// An argument did not have the required type.
    #[error("{source_name}: expected {expected}, got {actual}")]
    InvalidArgument {
        /// Entry point that rejected the argument (e.g. `CLI.on`).
        source_name: &'static str,
        /// Expected type spec.
        expected: &'static str,
        /// Category of the value actually passed.
        actual: &'static str,
    },

    /// Strict mode: the first token is not a registered command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Strict mode: there were no tokens to parse.
    #[error("no command given")]
    EmptyInput,

    /// Matcher failure escalated by the protection level.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results with [`CliError`].
pub type Result<T> = std::result::Result<T, CliError>;
