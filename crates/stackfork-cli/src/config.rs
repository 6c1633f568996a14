//! Command line configuration
//!
//! Loaded from an optional TOML file. Every field has a default, so an empty
//! file (or no file at all) is a valid configuration. Command line flags are
//! applied on top by the binary.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use stackfork_rename::{DeployableOptions, RenameOptions, DEFAULT_SUFFIX_VARIABLE};

/// Errors loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for [`CliConfig`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Unknown output format name
    #[error("unknown output format '{0}' (expected yaml or json)")]
    UnknownFormat(String),
}

/// Log line format on stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Output text format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// YAML
    #[default]
    Yaml,
    /// Pretty-printed JSON
    Json,
}

impl OutputFormat {
    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::UnknownFormat(s.to_string())),
        }
    }
}

/// Configuration file contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Networks never renamed
    pub preserved_networks: Vec<String>,
    /// Env variable that receives the suffix in `randomize`
    pub suffix_variable: String,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
    /// Default output format for `rename`
    pub format: OutputFormat,
    /// Log line format
    pub log_format: LogFormat,
    /// Rename named volumes in `randomize`, so instances do not share data
    pub isolate_volumes: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            preserved_networks: Vec::new(),
            suffix_variable: DEFAULT_SUFFIX_VARIABLE.to_string(),
            log_filter: "info".to_string(),
            format: OutputFormat::Yaml,
            log_format: LogFormat::Text,
            isolate_volumes: true,
        }
    }
}

impl CliConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid TOML or a field has the wrong type
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Load `path` if given, defaults otherwise
    ///
    /// # Errors
    /// Returns error if a given file cannot be read or parsed
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Renaming options, with `extra_networks` preserved on top of the
    /// configured ones
    #[must_use]
    pub fn rename_options(&self, extra_networks: &[&str]) -> RenameOptions {
        self.preserved_networks
            .iter()
            .map(String::as_str)
            .chain(extra_networks.iter().copied())
            .fold(RenameOptions::new(), |options, name| options.preserve_network(name))
    }

    /// Options for `randomize`
    #[must_use]
    pub fn deployable_options(&self, extra_networks: &[&str]) -> DeployableOptions {
        DeployableOptions {
            rename: self.rename_options(extra_networks),
            suffix_variable: self.suffix_variable.clone(),
            isolate_volumes: self.isolate_volumes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(CliConfig::from_toml("").unwrap(), CliConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = CliConfig::from_toml(
            r#"
preserved_networks = ["dokploy-network"]
format = "json"
"#,
        )
        .unwrap();

        assert_eq!(config.preserved_networks, vec!["dokploy-network"]);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.suffix_variable, "COMPOSE_PREFIX");
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.isolate_volumes);
    }

    #[test]
    fn json_logs_and_shared_volumes() {
        let config = CliConfig::from_toml("log_format = \"json\"\nisolate_volumes = false\n").unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(!config.deployable_options(&[]).isolate_volumes);
        assert!(CliConfig::from_toml("log_format = \"xml\"").is_err());
    }

    #[test]
    fn bad_format_rejected() {
        assert!(matches!(
            CliConfig::from_toml("format = \"xml\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            "xml".parse::<OutputFormat>(),
            Err(ConfigError::UnknownFormat(_))
        ));
        assert_eq!("YML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
    }

    #[test]
    fn flag_networks_extend_configured_ones() {
        let config = CliConfig {
            preserved_networks: vec!["ingress".to_string()],
            ..CliConfig::default()
        };
        let options = config.rename_options(&["shared"]);
        assert!(options.preserved_networks.contains("ingress"));
        assert!(options.preserved_networks.contains("shared"));
        assert_eq!(options.preserved_networks.len(), 2);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = CliConfig::load(Path::new("/nonexistent/stackfork.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/stackfork.toml"));
    }
}
