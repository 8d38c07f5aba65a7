//! Configuration file support.
//!
//! Settings are read from `doctime.toml` (or `doctime.json`), found either
//! through an explicit path or by searching the input document's directory
//! and then the working directory. Relative paths inside the file resolve
//! against the file's own directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::services::date_detection::{HeaderMode, MalformedHeaderPolicy};
use crate::services::resources::FileLocator;

/// Base name of discoverable config files.
pub const CONFIG_BASENAME: &str = "doctime";

/// Extensions tried during discovery, in order.
const CONFIG_EXTENSIONS: [&str; 2] = ["toml", "json"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to parse JSON config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// `[event_filter]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventFilterConfig {
    /// Location of the line-delimited exclusion term list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_list: Option<String>,
}

/// `[doc_time]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocTimeConfig {
    pub header_mode: HeaderMode,
    pub on_malformed_header: MalformedHeaderPolicy,
}

/// `[timex]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimexConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub event_filter: EventFilterConfig,
    pub doc_time: DocTimeConfig,
    pub timex: TimexConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

/// Options for locating the config file.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides discovery).
    pub config_path: Option<PathBuf>,
    /// Directories searched for `doctime.{toml,json}`, in order.
    pub search_dirs: Vec<PathBuf>,
}

impl Config {
    /// Load from the explicit path, or the first discovered file, or fall
    /// back to defaults when there is none.
    pub fn load(options: &LoadOptions) -> Result<Self, ConfigError> {
        let path = options.config_path.clone().or_else(|| {
            options
                .search_dirs
                .iter()
                .find_map(|dir| find_config(dir))
        });

        match path {
            Some(path) => Self::load_from_path(&path),
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file. The format follows the
    /// extension; anything other than `.json` is parsed as TOML.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        let mut config: Config = match ext {
            "json" => serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?,
            _ => toml::from_str(&contents).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?,
        };

        debug!("Loaded config from {}", path.display());
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory of the loaded config file, if any.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - `~` is expanded
    /// - Absolute paths are returned as-is
    /// - Relative paths join the config directory, or stay relative to the
    ///   working directory when there is no config file
    pub fn resolve_path(&self, path_str: &str) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        match self.base_dir() {
            Some(base) if !path.is_absolute() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Resource locator rooted at the config directory.
    pub fn locator(&self) -> FileLocator {
        match self.base_dir() {
            Some(base) => FileLocator::new().with_root(base),
            None => FileLocator::new(),
        }
    }

    /// Configured timex output directory, resolved.
    pub fn output_dir(&self) -> Option<PathBuf> {
        self.timex.output_dir.as_deref().map(|d| self.resolve_path(d))
    }
}

/// Look for a config file in `dir`.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", CONFIG_BASENAME, ext)))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doctime.toml");
        fs::write(
            &path,
            r#"
[event_filter]
filter_list = "lists/terms.txt"

[doc_time]
header_mode = "strict"
on_malformed_header = "fallback"

[timex]
output_dir = "out"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.event_filter.filter_list.as_deref(), Some("lists/terms.txt"));
        assert_eq!(config.doc_time.header_mode, HeaderMode::Strict);
        assert_eq!(config.doc_time.on_malformed_header, MalformedHeaderPolicy::Fallback);
        assert_eq!(config.output_dir(), Some(dir.path().join("out")));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.doc_time.header_mode, HeaderMode::Compat);
        assert_eq!(config.doc_time.on_malformed_header, MalformedHeaderPolicy::Fail);
        assert!(config.event_filter.filter_list.is_none());
    }

    #[test]
    fn test_json_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doctime.json");
        fs::write(&path, r#"{"event_filter": {"filter_list": "/abs/terms.txt"}}"#).unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.resolve_path("/abs/terms.txt"), PathBuf::from("/abs/terms.txt"));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doctime.toml");
        fs::write(&path, "[doc_time]\nheader_mode = \"sloppy\"\n").unwrap();
        assert!(matches!(
            Config::load_from_path(&path),
            Err(ConfigError::Toml { .. })
        ));
    }

    #[test]
    fn test_discovery_prefers_first_search_dir() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join("doctime.toml"), "").unwrap();

        let options = LoadOptions {
            config_path: None,
            search_dirs: vec![first.path().to_path_buf(), second.path().to_path_buf()],
        };
        let config = Config::load(&options).unwrap();
        assert_eq!(config.source_path, Some(second.path().join("doctime.toml")));

        fs::write(first.path().join("doctime.json"), "{}").unwrap();
        let config = Config::load(&options).unwrap();
        assert_eq!(config.source_path, Some(first.path().join("doctime.json")));
    }

    #[test]
    fn test_no_config_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&LoadOptions {
            config_path: None,
            search_dirs: vec![dir.path().to_path_buf()],
        })
        .unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.resolve_path("terms.txt"), PathBuf::from("terms.txt"));
    }
}
