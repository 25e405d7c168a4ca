//! Structural type matching with protection-level gating.
//!
//! [`TypeChecker::check`] validates a list of values against a parallel list
//! of [`TypeSpec`]s. Specs are evaluated positionally; within a position the
//! branches of a union are tried in declaration order and the first match
//! wins.
//!
//! # Examples
//!
//! ```
//! use cli_john_core::{Class, TypeChecker, TypeSpec, Value};
//!
//! let checker = TypeChecker::default();
//! let widget = Class::new("Widget");
//!
//! assert!(checker.check(
//!     &[Value::from("build"), Value::instance(&widget)],
//!     &[TypeSpec::from("string"), TypeSpec::from(&widget)],
//! ));
//! assert!(checker.check(&[Value::from(3)], &[TypeSpec::from("string|number")]));
//! assert!(checker.check(&[Value::from(vec!["a", "b"])], &[TypeSpec::from("string[]")]));
//! assert!(!checker.check(&[], &[TypeSpec::from("string")]));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MatchError, Result};
use crate::types::{TypeSpec, Value};
use crate::warner::{Warner, Warning};

/// Name of the seeded array handler.
pub const ARRAY_HANDLER: &str = "Array";
/// Name of the seeded homogeneous string array handler.
pub const STRING_ARRAY_HANDLER: &str = "string[]";

const SOURCE: &str = "JSTC";
const NOT_FROZEN: u8 = u8::MAX;

/// Escalating strictness for malformed input and handler-table mutation.
///
/// | level      | malformed helper args | handler registration |
/// |------------|-----------------------|----------------------|
/// | `none`     | silently coerced      | allowed              |
/// | `boundary` | coerced with warning  | allowed              |
/// | `sandbox`  | warned and refused    | warned and refused   |
/// | `hardened` | error                 | error                |
///
/// Entering `sandbox` or `hardened` freezes the handler table for good.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ProtectionLevel {
    /// Silent coercion.
    None = 0,
    /// Coercion with a warning (the default).
    #[default]
    Boundary = 1,
    /// Warn and refuse.
    Sandbox = 2,
    /// Raise.
    Hardened = 3,
}

impl ProtectionLevel {
    /// Lowercase name of the level.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Boundary => "boundary",
            Self::Sandbox => "sandbox",
            Self::Hardened => "hardened",
        }
    }

    /// Returns `true` for levels that freeze the handler table.
    pub fn freezes_handlers(self) -> bool {
        self >= Self::Sandbox
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::None,
            1 => Self::Boundary,
            2 => Self::Sandbox,
            _ => Self::Hardened,
        }
    }
}

impl fmt::Display for ProtectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtectionLevel {
    type Err = MatchError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "boundary" => Ok(Self::Boundary),
            "sandbox" => Ok(Self::Sandbox),
            "hardened" => Ok(Self::Hardened),
            other => Err(MatchError::UnknownProtectionLevel(other.to_string())),
        }
    }
}

/// One-argument predicate stored in the custom-handler table.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Structural type matcher.
///
/// Shared state (level, freeze marker, handler table) sits behind atomics and
/// a lock so a checker can be shared across threads; the freeze marker is
/// published while the handler table's write lock is held.
pub struct TypeChecker {
    level: AtomicU8,
    frozen_at: AtomicU8,
    handlers: RwLock<HashMap<String, Predicate>>,
    warner: Arc<Warner>,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new(Arc::new(Warner::new()))
    }
}

impl fmt::Debug for TypeChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeChecker")
            .field("level", &self.get_protection_level())
            .field("frozen", &self.is_frozen())
            .field("handlers", &self.custom_handlers())
            .finish()
    }
}

impl TypeChecker {
    /// Creates a checker reporting through `warner`, seeded with the
    /// [`ARRAY_HANDLER`] and [`STRING_ARRAY_HANDLER`] predicates.
    pub fn new(warner: Arc<Warner>) -> Self {
        let mut handlers: HashMap<String, Predicate> = HashMap::new();
        handlers.insert(
            ARRAY_HANDLER.to_string(),
            Arc::new(|v: &Value| matches!(v, Value::Array(_))),
        );
        handlers.insert(
            STRING_ARRAY_HANDLER.to_string(),
            Arc::new(|v: &Value| {
                v.as_array()
                    .is_some_and(|items| items.iter().all(|i| matches!(i, Value::String(_))))
            }),
        );

        Self {
            level: AtomicU8::new(ProtectionLevel::default() as u8),
            frozen_at: AtomicU8::new(NOT_FROZEN),
            handlers: RwLock::new(handlers),
            warner,
        }
    }

    /// Returns the warner this checker reports through.
    pub fn warner(&self) -> &Arc<Warner> {
        &self.warner
    }

    /// Changes the protection level.
    ///
    /// Entering `sandbox` or `hardened` freezes the handler table; lowering
    /// the level afterwards does not unfreeze it.
    pub fn set_protection_level(&self, level: ProtectionLevel) {
        if level.freezes_handlers() {
            let _guard = self.handlers.write();
            let previous = self.frozen_at.load(Ordering::Acquire);
            if previous == NOT_FROZEN || previous < level as u8 {
                self.frozen_at.store(level as u8, Ordering::Release);
                debug!(%level, "custom handler table frozen");
            }
        }
        self.level.store(level as u8, Ordering::Release);
    }

    /// Returns the current protection level.
    pub fn get_protection_level(&self) -> ProtectionLevel {
        ProtectionLevel::from_u8(self.level.load(Ordering::Acquire))
    }

    /// Returns `true` once the handler table has been frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen_level().is_some()
    }

    fn frozen_level(&self) -> Option<ProtectionLevel> {
        match self.frozen_at.load(Ordering::Acquire) {
            NOT_FROZEN => None,
            raw => Some(ProtectionLevel::from_u8(raw)),
        }
    }

    /// Names of registered custom handlers, sorted.
    pub fn custom_handlers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns `true` if a handler is registered under `name`.
    pub fn has_custom_handler(&self, name: &str) -> bool {
        self.handlers.read().contains_key(name)
    }

    /// Registers (or replaces) a custom handler.
    ///
    /// Returns `Ok(true)` when registered. On a frozen table the call is
    /// refused with a warning (`Ok(false)`), or with
    /// [`MatchError::HandlerTableFrozen`] once `hardened` has been entered.
    pub fn add_custom_handler<F>(&self, name: impl Into<String>, predicate: F) -> Result<bool>
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.insert_handler(name.into(), Arc::new(predicate))
    }

    fn insert_handler(&self, name: String, predicate: Predicate) -> Result<bool> {
        let mut handlers = self.handlers.write();
        match self.frozen_level() {
            Some(ProtectionLevel::Hardened) => Err(MatchError::HandlerTableFrozen(name)),
            Some(_) => {
                self.warner.warn(
                    Warning::new(format!(
                        "custom handler '{name}' was not registered: handler table is frozen"
                    ))
                    .with_source(SOURCE)
                    .with_hint("register custom handlers before raising the protection level"),
                );
                Ok(false)
            }
            None => {
                debug!(handler = %name, "custom handler registered");
                handlers.insert(name, predicate);
                Ok(true)
            }
        }
    }

    /// Registers a handler from untyped values.
    ///
    /// A non-string name or non-function predicate is coerced (stringified
    /// name, always-false predicate) under `none` and `boundary` (the latter
    /// with a warning), refused with a warning under `sandbox`, and an error
    /// under `hardened`.
    pub fn register_value(&self, name: &Value, predicate: &Value) -> Result<bool> {
        let name = match name {
            Value::String(s) => s.clone(),
            other => {
                let coerced = other.to_stable_string();
                let proceed = self.malformed(
                    format!("custom handler name must be a string, got {}", other.category()),
                    MatchError::InvalidHandlerName(other.category().to_string()),
                )?;
                if !proceed {
                    return Ok(false);
                }
                coerced
            }
        };

        let predicate: Predicate = match predicate {
            Value::Function(f) => {
                let f = f.clone();
                Arc::new(move |v: &Value| f.call(std::slice::from_ref(v)).is_truthy())
            }
            other => {
                let proceed = self.malformed(
                    format!(
                        "custom handler '{name}' predicate must be a function, got {}",
                        other.category()
                    ),
                    MatchError::InvalidPredicate(other.category().to_string()),
                )?;
                if !proceed {
                    return Ok(false);
                }
                Arc::new(|_: &Value| false)
            }
        };

        self.insert_handler(name, predicate)
    }

    /// Applies the level policy to a malformed helper argument.
    ///
    /// `Ok(true)` means coerce and continue, `Ok(false)` means refuse.
    fn malformed(&self, message: String, error: MatchError) -> Result<bool> {
        match self.get_protection_level() {
            ProtectionLevel::None => Ok(true),
            ProtectionLevel::Boundary => {
                self.warner.warn(Warning::new(message).with_source(SOURCE));
                Ok(true)
            }
            ProtectionLevel::Sandbox => {
                self.warner.warn(Warning::new(message).with_source(SOURCE));
                Ok(false)
            }
            ProtectionLevel::Hardened => Err(error),
        }
    }

    /// Returns `true` if every value satisfies the spec at the same position.
    ///
    /// Fewer values than specs is a failure; extra values are ignored.
    pub fn check(&self, values: &[Value], specs: &[TypeSpec]) -> bool {
        if values.len() < specs.len() {
            return false;
        }
        values
            .iter()
            .zip(specs)
            .all(|(value, spec)| self.matches(value, spec))
    }

    /// Returns `true` if `value` satisfies `spec`.
    pub fn matches(&self, value: &Value, spec: &TypeSpec) -> bool {
        spec.branches().iter().any(|branch| match branch {
            TypeSpec::Tag(union) => union
                .split('|')
                .filter(|t| !t.is_empty())
                .any(|tag| self.matches_tag(value, tag)),
            TypeSpec::Class(class) => value.is_instance_of(class),
            TypeSpec::AnyOf(_) => self.matches(value, branch),
        })
    }

    fn matches_tag(&self, value: &Value, tag: &str) -> bool {
        // Clone out of the lock so predicates may call back into the checker.
        let handler = self.handlers.read().get(tag).cloned();
        match handler {
            Some(predicate) => predicate(value),
            None => value.category() == tag,
        }
    }

    /// Untyped counterpart of [`check`](Self::check).
    ///
    /// `values` and `specs` must both be arrays and every spec element must
    /// convert via [`TypeSpec::from_value`]; otherwise the level policy
    /// applies and a non-erroring result is `false`.
    pub fn check_values(&self, values: &Value, specs: &Value) -> Result<bool> {
        let (Some(values), Some(specs)) = (values.as_array(), specs.as_array()) else {
            self.malformed(
                format!(
                    "check expects (array, array), got ({}, {})",
                    values.category(),
                    specs.category()
                ),
                MatchError::InvalidArguments("values and specs must be arrays".to_string()),
            )?;
            return Ok(false);
        };

        let mut typed = Vec::with_capacity(specs.len());
        for (index, raw) in specs.iter().enumerate() {
            match TypeSpec::from_value(raw) {
                Some(spec) => typed.push(spec),
                None => {
                    self.malformed(
                        format!("type spec at position {index} is a {}", raw.category()),
                        MatchError::InvalidTypeSpec(raw.to_stable_string()),
                    )?;
                    return Ok(false);
                }
            }
        }

        Ok(self.check(values, &typed))
    }
}

/// Formats a diagnostic line in the matcher's house style.
///
/// ```
/// use cli_john_core::format_message;
///
/// assert_eq!(
///     format_message(None, "bad input", "pass a string", ""),
///     "[JSTC] cli-john/jstc: bad input\nHint: pass a string"
/// );
/// ```
pub fn format_message(scope: Option<&str>, message: &str, hint: &str, other: &str) -> String {
    let mut out = format!("[{}] cli-john/jstc: {message}", scope.unwrap_or(SOURCE));
    if !hint.is_empty() {
        out.push_str("\nHint: ");
        out.push_str(hint);
    }
    if !other.is_empty() {
        out.push('\n');
        out.push_str(other);
    }
    out
}
