//! Configuration loading for bash-block
//!
//! Rules come from a TOML file, named presets and `--cmd` specs on the
//! command line. Missing files fall back to defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::engine::DEFAULT_MAX_DEPTH;
use crate::rules::{presets, Rule};

/// Problems with user-supplied configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("unknown preset `{name}` (available: {available})")]
    UnknownPreset { name: String, available: String },

    #[error("invalid rule spec `{0}`: expected a command followed by optional patterns")]
    InvalidRuleSpec(String),
}

/// General configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Maximum nesting depth for command strings inside command strings
    pub max_depth: usize,

    /// Enable audit logging
    pub audit_log: bool,

    /// Path to audit log file
    pub audit_path: Option<String>,

    /// Built-in rule sets to enable (`git`, `aws`, `kubectl`)
    pub presets: Vec<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            audit_log: true,
            audit_path: Some("~/.claude/bash-block/audit.jsonl".to_string()),
            presets: Vec::new(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub rules: Vec<Rule>,
}

impl Config {
    /// Load configuration from the standard locations or use defaults
    pub fn load() -> Self {
        let config_paths = [
            dirs::home_dir().map(|p| p.join(".claude/bash-block/config.toml")),
            Some(PathBuf::from("/etc/bash-block/config.toml")),
        ];

        for path in config_paths.into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            match Self::load_from(&path) {
                Ok(config) => return config,
                Err(e) => warn!("{}", e),
            }
        }

        Config::default()
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Add a rule from a `--cmd` spec such as `"git push pull"`
    pub fn add_rule_spec(&mut self, spec: &str) -> Result<(), ConfigError> {
        let rule = Rule::parse_spec(spec)
            .ok_or_else(|| ConfigError::InvalidRuleSpec(spec.to_string()))?;
        self.rules.push(rule);
        Ok(())
    }

    /// Enable a built-in preset by name
    pub fn add_preset(&mut self, name: &str) -> Result<(), ConfigError> {
        let preset = find_preset(name)?;
        if !self
            .general
            .presets
            .iter()
            .any(|p| p.eq_ignore_ascii_case(preset.name))
        {
            self.general.presets.push(preset.name.to_string());
        }
        Ok(())
    }

    /// All rules in effect: enabled presets first, then explicit rules
    pub fn resolved_rules(&self) -> Result<Vec<Rule>, ConfigError> {
        let mut rules = Vec::with_capacity(self.general.presets.len() + self.rules.len());
        for name in &self.general.presets {
            rules.push(find_preset(name)?.rule());
        }
        rules.extend(self.rules.iter().cloned());
        Ok(rules)
    }

    /// Expand ~ in path strings
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get the audit log path (expanded)
    pub fn audit_path(&self) -> Option<PathBuf> {
        self.general.audit_path.as_ref().map(|p| Self::expand_path(p))
    }
}

fn find_preset(name: &str) -> Result<&'static presets::Preset, ConfigError> {
    presets::find(name).ok_or_else(|| ConfigError::UnknownPreset {
        name: name.to_string(),
        available: presets::names().join(", "),
    })
}

/// Example configuration, printed by `--help`
pub const DEFAULT_CONFIG_TOML: &str = r#"
[general]
max_depth = 10
audit_log = true
audit_path = "~/.claude/bash-block/audit.jsonl"
presets = ["git"]

[[rules]]
command = "kubectl"
patterns = ["delete", "drain"]
allow = ["delete pod"]

[[rules]]
command = "terraform"
patterns = ["destroy", "apply -auto-approve"]
"#;
