//! Error types for the matcher and warning collector.

use thiserror::Error;

/// Errors raised by [`TypeChecker`](crate::TypeChecker) and level parsing.
///
/// Recoverable input problems are normally routed through the
/// [`Warner`](crate::Warner); these variants surface only when the
/// protection level escalates them or when a frozen handler table is mutated
/// under `hardened`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// The custom-handler table was frozen by an elevated protection level.
    #[error("custom handler table is frozen; cannot register '{0}'")]
    HandlerTableFrozen(String),
    /// A handler name was not a string.
    #[error("custom handler name must be a string, got {0}")]
    InvalidHandlerName(String),
    /// A handler predicate was not callable.
    #[error("custom handler predicate must be a function, got {0}")]
    InvalidPredicate(String),
    /// Values or specs passed to a check were not arrays.
    #[error("invalid check arguments: {0}")]
    InvalidArguments(String),
    /// A type spec element was neither a string, a class nor a list.
    #[error("invalid type spec: {0}")]
    InvalidTypeSpec(String),
    /// Unrecognized protection level name.
    #[error("unknown protection level: {0}")]
    UnknownProtectionLevel(String),
    /// Unrecognized warning level name.
    #[error("unknown warn level: {0}")]
    UnknownWarnLevel(String),
}

/// Convenience alias for results with [`MatchError`].
pub type Result<T> = std::result::Result<T, MatchError>;
