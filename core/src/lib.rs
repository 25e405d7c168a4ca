//! Structural type matching and warning collection for `cli-john`.
//!
//! This crate holds the pieces the command registry builds on:
//!
//! - [`Value`]: the untyped value model embedders hand to the matcher.
//! - [`TypeSpec`]: a declarative value shape: category tags, class
//!   references, named custom predicates, and unions of those.
//! - [`TypeChecker`]: the matcher, gated by a [`ProtectionLevel`].
//! - [`Warner`]: deferred, level-filtered warning output.
//! - [`Context`]: one checker and one warner, shared by everything created
//!   from the same entry point.
//!
//! # Example
//!
//! ```
//! use cli_john_core::*;
//!
//! let ctx = Context::with_warner(Warner::with_sink(std::io::sink()));
//! let checker = ctx.checker();
//!
//! checker
//!     .add_custom_handler("port", |v| matches!(v, Value::Number(n) if *n > 0.0))
//!     .unwrap();
//! assert!(checker.check(&[Value::from(8080)], &[TypeSpec::from("port")]));
//!
//! checker.set_protection_level(ProtectionLevel::Hardened);
//! assert!(checker.add_custom_handler("late", |_| true).is_err());
//! ```

mod error;
mod types;
mod validate;
mod warner;

use std::sync::Arc;

pub use error::{MatchError, Result};
pub use types::{Callable, Class, ClassRef, Object, TypeSpec, Value};
pub use validate::{
    ARRAY_HANDLER, Predicate, ProtectionLevel, STRING_ARRAY_HANDLER, TypeChecker, format_message,
};
pub use warner::{DEFAULT_MAX_WARNINGS, WarnLevel, Warner, Warning};

/// Shared matcher and warner for one program entry point.
///
/// Constructed once and handed to dependents by `Arc` instead of living in a
/// module-level default.
#[derive(Debug)]
pub struct Context {
    checker: TypeChecker,
    warner: Arc<Warner>,
}

impl Default for Context {
    fn default() -> Self {
        Self::with_warner(Warner::new())
    }
}

impl Context {
    /// Creates a shareable context printing warnings to stderr.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a context around an existing warner.
    pub fn with_warner(warner: Warner) -> Self {
        let warner = Arc::new(warner);
        Self {
            checker: TypeChecker::new(Arc::clone(&warner)),
            warner,
        }
    }

    /// The structural type matcher.
    pub fn checker(&self) -> &TypeChecker {
        &self.checker
    }

    /// The warning collector.
    pub fn warner(&self) -> &Warner {
        &self.warner
    }

    /// Shorthand for `self.warner().warn(..)`.
    pub fn warn(&self, warning: Warning) {
        self.warner.warn(warning);
    }
}
