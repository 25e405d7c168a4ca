//! Deferred warning collection.
//!
//! Recoverable validation failures are reported as [`Warning`]s. They are
//! stored until [`Warner::flush`] prints them (or a one-line summary) to the
//! configured sink. Warnings flagged `instantly_warn` are printed as soon as
//! they arrive.
//!
//! # Example
//!
//! ```
//! use cli_john_core::{WarnLevel, Warner, Warning};
//!
//! let warner = Warner::with_sink(std::io::sink()).level(WarnLevel::Full);
//! warner.warn(Warning::new("option name contained spaces").with_hint("use --dry-run"));
//! assert_eq!(warner.count(), 1);
//! assert_eq!(warner.flush(), 1);
//! assert_eq!(warner.count(), 0);
//! ```

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MatchError;

/// Default cap on stored warnings.
pub const DEFAULT_MAX_WARNINGS: usize = 20;

/// How much [`Warner::flush`] prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WarnLevel {
    /// Print nothing, not even instant warnings.
    Silent,
    /// Print a single count line on flush.
    #[default]
    Summary,
    /// Print every deferred warning on flush.
    Full,
}

impl FromStr for WarnLevel {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "silent" => Ok(Self::Silent),
            "summary" => Ok(Self::Summary),
            "full" => Ok(Self::Full),
            other => Err(MatchError::UnknownWarnLevel(other.to_string())),
        }
    }
}

/// A single recoverable problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Warning {
    /// What went wrong.
    pub message: String,
    /// Suggested fix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Component that raised the warning (e.g. `"CLI.command"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Print immediately instead of waiting for a flush.
    #[serde(default)]
    pub instantly_warn: bool,
}

impl Warning {
    /// Creates a deferred warning with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Adds a hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Adds a source tag.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Marks the warning for immediate printing.
    pub fn instant(mut self) -> Self {
        self.instantly_warn = true;
        self
    }
}

struct State {
    level: WarnLevel,
    max_warnings: usize,
    package_name: Option<String>,
    warnings: Vec<Warning>,
}

/// Collects warnings and prints them to a sink.
pub struct Warner {
    state: Mutex<State>,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Default for Warner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Warner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Warner")
            .field("level", &state.level)
            .field("max_warnings", &state.max_warnings)
            .field("package_name", &state.package_name)
            .field("stored", &state.warnings.len())
            .finish()
    }
}

impl Warner {
    /// Creates a warner printing to stderr.
    pub fn new() -> Self {
        Self::with_sink(std::io::stderr())
    }

    /// Creates a warner printing to `sink`.
    pub fn with_sink(sink: impl Write + Send + 'static) -> Self {
        Self {
            state: Mutex::new(State {
                level: WarnLevel::default(),
                max_warnings: DEFAULT_MAX_WARNINGS,
                package_name: None,
                warnings: Vec::new(),
            }),
            sink: Mutex::new(Box::new(sink)),
        }
    }

    /// Sets the initial level.
    pub fn level(self, level: WarnLevel) -> Self {
        self.state.lock().level = level;
        self
    }

    /// Sets the storage cap.
    pub fn max_warnings(self, max: usize) -> Self {
        self.state.lock().max_warnings = max;
        self
    }

    /// Sets the package name prefixed to every printed line.
    pub fn package_name(self, name: impl Into<String>) -> Self {
        self.state.lock().package_name = Some(name.into());
        self
    }

    /// Changes the level.
    pub fn set_level(&self, level: WarnLevel) {
        self.state.lock().level = level;
    }

    /// Returns the current level.
    pub fn get_level(&self) -> WarnLevel {
        self.state.lock().level
    }

    /// Records a warning, printing it right away if it is instant.
    pub fn warn(&self, warning: Warning) {
        debug!(
            source = warning.source.as_deref().unwrap_or(""),
            message = %warning.message,
            "warning recorded"
        );

        let line = {
            let mut state = self.state.lock();
            let line = (warning.instantly_warn && state.level != WarnLevel::Silent)
                .then(|| compose(state.package_name.as_deref(), &warning));
            if state.warnings.len() < state.max_warnings {
                state.warnings.push(warning);
            }
            line
        };

        if let Some(line) = line {
            self.emit(&line);
        }
    }

    /// Prints deferred warnings according to the level, clears storage and
    /// returns how many warnings were stored.
    ///
    /// At the `summary` level a count line is printed on every call, even
    /// when it reads `[SUMMARY] 0 warnings collected`. Use `silent` to
    /// suppress it.
    pub fn flush(&self) -> usize {
        let (level, lines, count) = {
            let mut state = self.state.lock();
            let warnings = std::mem::take(&mut state.warnings);
            let lines = warnings
                .iter()
                .filter(|w| !w.instantly_warn)
                .map(|w| compose(state.package_name.as_deref(), w))
                .collect::<Vec<_>>();
            (state.level, lines, warnings.len())
        };

        match level {
            WarnLevel::Full => {
                for line in &lines {
                    self.emit(line);
                }
            }
            WarnLevel::Summary => {
                self.emit(&format!("[SUMMARY] {count} warnings collected"));
            }
            WarnLevel::Silent => {}
        }

        debug!(count, ?level, "warnings flushed");
        count
    }

    /// Drops all stored warnings without printing.
    pub fn clear(&self) {
        self.state.lock().warnings.clear();
    }

    /// Number of stored warnings.
    pub fn count(&self) -> usize {
        self.state.lock().warnings.len()
    }

    /// Snapshot of stored warnings.
    pub fn warnings(&self) -> Vec<Warning> {
        self.state.lock().warnings.clone()
    }

    /// Formats a warning the way it would be printed.
    pub fn format_warning(&self, warning: &Warning) -> String {
        compose(self.state.lock().package_name.as_deref(), warning)
    }

    fn emit(&self, line: &str) {
        let mut sink = self.sink.lock();
        // Sink failures are not reportable anywhere more useful.
        let _ = writeln!(sink, "{line}");
    }
}

fn compose(package_name: Option<&str>, warning: &Warning) -> String {
    let mut out = String::new();
    if let Some(source) = warning.source.as_deref().filter(|s| !s.is_empty()) {
        out.push_str(&format!("[{source}] "));
    }
    if let Some(package) = package_name.filter(|p| !p.is_empty()) {
        out.push_str(&format!("{package}: "));
    }
    out.push_str(&warning.message);
    if let Some(hint) = warning.hint.as_deref().filter(|h| !h.is_empty()) {
        out.push_str(&format!("\nHint: {hint}"));
    }
    out
}
