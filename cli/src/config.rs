//! YAML configuration for building a registry.
//!
//! # Example YAML
//!
//! ```yaml
//! protection_level: boundary
//! warn_level: full
//! max_warnings: 20
//! package_name: deployctl
//! strict: false
//! commands:
//!   - name: deploy
//!     options: [--region, --dry-run]
//!   - name: status
//! ```
//!
//! Every field is optional.

use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

use cli_john_core::{Context, DEFAULT_MAX_WARNINGS, ProtectionLevel, WarnLevel, Warner};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::host::HostProcess;
use crate::registry::Cli;

/// A command declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Command name.
    pub name: String,
    /// Option names, prefix included.
    #[serde(default)]
    pub options: Vec<String>,
}

/// Registry configuration.
///
/// # Examples
///
/// ```
/// # use cli_john::CliConfig;
/// let config: CliConfig = serde_yaml::from_str("commands: [{ name: build }]").unwrap();
/// assert_eq!(config.commands[0].name, "build");
/// assert_eq!(config.max_warnings, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Matcher protection level, applied after the commands are declared.
    pub protection_level: ProtectionLevel,
    /// Warner output level.
    pub warn_level: WarnLevel,
    /// Warner storage cap.
    pub max_warnings: usize,
    /// Package name prefixed to warnings.
    pub package_name: Option<String>,
    /// Report unknown commands and empty input as errors.
    pub strict: bool,
    /// Commands to declare.
    pub commands: Vec<CommandConfig>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            protection_level: ProtectionLevel::default(),
            warn_level: WarnLevel::default(),
            max_warnings: DEFAULT_MAX_WARNINGS,
            package_name: None,
            strict: false,
            commands: Vec::new(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::CliError::Io) if the file cannot be read, or
    /// [`Yaml`](crate::CliError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::CliError::Io) if the file cannot be written, or
    /// [`Yaml`](crate::CliError::Yaml) if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Builds a context whose warner follows this configuration.
    pub fn build_context(&self, warner: Warner) -> Arc<Context> {
        let mut warner = warner
            .level(self.warn_level)
            .max_warnings(self.max_warnings);
        if let Some(name) = &self.package_name {
            warner = warner.package_name(name.clone());
        }
        Arc::new(Context::with_warner(warner))
    }

    /// Builds a registry with the configured commands and options.
    ///
    /// The protection level is applied last, so a `sandbox` or `hardened`
    /// setting freezes the matcher only once the registry is assembled.
    pub fn build_cli(&self, host: impl HostProcess + 'static, warner: Warner) -> Cli {
        let mut cli = Cli::with_context(host, self.build_context(warner));
        cli.set_strict(self.strict);
        for declared in &self.commands {
            let command = cli.command(declared.name.as_str());
            for option in &declared.options {
                command.option(option.as_str());
            }
        }
        cli.context()
            .checker()
            .set_protection_level(self.protection_level);
        debug!(
            commands = self.commands.len(),
            level = %self.protection_level,
            "registry built from config"
        );
        cli
    }
}
