//! Tool configuration (creature.toml)
//!
//! Every field has a default, so an empty or partial file is valid.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "creature.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Build output settings
    #[serde(default)]
    pub build: BuildConfig,
    /// Log filter settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Mesh output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Wavefront OBJ, one group per body part
    #[default]
    Obj,
    /// Full skinned mesh as JSON
    Json,
}

impl OutputFormat {
    /// Extension appended to the blueprint's file stem
    pub fn extension(self) -> &'static str {
        match self {
            Self::Obj => "obj",
            Self::Json => "mesh.json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Output format when `--format` is not given (default: obj)
    #[serde(default)]
    pub format: OutputFormat,
    /// Ring side count for parts that do not set `sides`
    #[serde(default)]
    pub sides: Option<u32>,
    /// Write vertex normals (default: true)
    #[serde(default = "default_true")]
    pub export_normals: bool,
    /// Write texture coordinates (default: true)
    #[serde(default = "default_true")]
    pub export_uvs: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LogConfig {
    /// Extra `EnvFilter` directives, comma separated (e.g. "creature_anatomy=debug")
    #[serde(default)]
    pub filter: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            sides: None,
            export_normals: default_true(),
            export_uvs: default_true(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Load an explicit config, else `creature.toml` if present, else defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            Self::load(&fallback)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialize_empty() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.build.format, OutputFormat::Obj);
        assert!(config.build.export_normals);
        assert!(config.build.export_uvs);
        assert!(config.log.filter.is_none());
    }

    #[test]
    fn test_config_deserialize_partial_build() {
        let toml_str = r#"
[build]
format = "json"
sides = 10
export_uvs = false
"#;
        let config = Config::from_toml(toml_str).unwrap();
        assert_eq!(config.build.format, OutputFormat::Json);
        assert_eq!(config.build.sides, Some(10));
        assert!(config.build.export_normals); // default
        assert!(!config.build.export_uvs);
    }

    #[test]
    fn test_config_log_filter() {
        let config = Config::from_toml("[log]\nfilter = \"creature_anatomy=debug\"\n").unwrap();
        assert_eq!(config.log.filter.as_deref(), Some("creature_anatomy=debug"));
    }

    #[test]
    fn test_config_rejects_unknown_format() {
        assert!(Config::from_toml("[build]\nformat = \"fbx\"\n").is_err());
    }

    #[test]
    fn test_config_serialize_roundtrip() {
        let config = Config {
            build: BuildConfig {
                format: OutputFormat::Json,
                sides: Some(8),
                export_normals: false,
                export_uvs: true,
            },
            log: LogConfig {
                filter: Some("warn".into()),
            },
        };
        let toml_str = toml::to_string(&config).unwrap();
        assert_eq!(Config::from_toml(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(&dir.path().join("nope.toml")).is_err());
    }
}
