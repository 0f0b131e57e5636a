use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{SearchError, SearchResult};

/// Default upper bound for a single content scan (64 MiB).
pub const DEFAULT_MAX_SCAN_SIZE: u64 = 64 * 1024 * 1024;

/// How a name or content pattern is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Shell-style wildcards (`*`, `?`, `[...]`)
    #[default]
    Glob,
    /// Regular expression, searched anywhere in the subject
    Regex,
}

/// Settings for one search job.
///
/// A job copies the settings it is given, so a caller can keep editing its own
/// value while a search is running.
///
/// # Configuration Locations
///
/// Settings can be loaded from, in order of precedence:
/// 1. Custom config file specified via `--config` flag
/// 2. Local `.treescout.yaml` in the current directory
/// 3. Global `$HOME/.config/treescout/config.yaml`
///
/// # Configuration Format
///
/// ```yaml
/// # Pattern matched against entry names
/// name_pattern: "*.rs"
/// name_mode: glob
///
/// # Pattern matched against file contents
/// content_pattern: "fn main"
/// content_mode: regex
///
/// # Only entries of this MIME type
/// mime_type: "text/x-rust"
///
/// # Inclusive size bounds in bytes
/// min_size: 1
/// max_size: 1048576
///
/// case_sensitive: false
/// recursive: true
/// show_hidden: false
///
/// # Files above this size are never content-scanned (null for no limit)
/// max_scan_size: 67108864
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Pattern tested against each entry's display name
    pub name_pattern: Option<String>,

    pub name_mode: MatchMode,

    /// Pattern tested against the full content of regular files
    pub content_pattern: Option<String>,

    pub content_mode: MatchMode,

    /// Required MIME type, e.g. `text/plain`
    pub mime_type: Option<String>,

    /// Minimum size in bytes (inclusive); `None` disables the check
    pub min_size: Option<u64>,

    /// Maximum size in bytes (inclusive); `None` disables the check
    pub max_size: Option<u64>,

    /// Applies to both name and content patterns
    pub case_sensitive: bool,

    /// Descend into subdirectories
    pub recursive: bool,

    /// Include hidden entries (and walk hidden directories)
    pub show_hidden: bool,

    /// Largest file the content scanner will read; `None` means no limit
    pub max_scan_size: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            name_pattern: None,
            name_mode: MatchMode::Glob,
            content_pattern: None,
            content_mode: MatchMode::Glob,
            mime_type: None,
            min_size: None,
            max_size: None,
            case_sensitive: false,
            recursive: true,
            show_hidden: false,
            max_scan_size: Some(DEFAULT_MAX_SCAN_SIZE),
            log_level: default_log_level(),
        }
    }
}

impl SearchSettings {
    /// Loads settings from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads settings, layering an explicit file over the default locations.
    ///
    /// The default locations are optional; an explicit path must exist.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let defaults = [
            dirs::config_dir().map(|p| p.join("treescout/config.yaml")),
            Some(PathBuf::from(".treescout.yaml")),
        ];

        for path in defaults.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: SearchSettings) -> Self {
        let defaults = SearchSettings::default();

        if cli.name_pattern.is_some() {
            self.name_pattern = cli.name_pattern;
        }
        if cli.name_mode != defaults.name_mode {
            self.name_mode = cli.name_mode;
        }
        if cli.content_pattern.is_some() {
            self.content_pattern = cli.content_pattern;
        }
        if cli.content_mode != defaults.content_mode {
            self.content_mode = cli.content_mode;
        }
        if cli.mime_type.is_some() {
            self.mime_type = cli.mime_type;
        }
        if cli.min_size.is_some() {
            self.min_size = cli.min_size;
        }
        if cli.max_size.is_some() {
            self.max_size = cli.max_size;
        }
        if cli.case_sensitive {
            self.case_sensitive = true;
        }
        if !cli.recursive {
            self.recursive = false;
        }
        if cli.show_hidden {
            self.show_hidden = true;
        }
        if cli.max_scan_size != defaults.max_scan_size {
            self.max_scan_size = cli.max_scan_size;
        }
        if cli.log_level != defaults.log_level {
            self.log_level = cli.log_level;
        }
        self
    }

    /// Renders the settings in the config file format
    pub fn to_yaml(&self) -> SearchResult<String> {
        serde_yaml::to_string(self).map_err(|e| SearchError::config_error(e.to_string()))
    }

    /// Rejects combinations that can never match anything
    pub fn validate(&self) -> SearchResult<()> {
        if let (Some(min), Some(max)) = (self.min_size, self.max_size) {
            if min > max {
                return Err(SearchError::config_error(format!(
                    "min_size ({}) is greater than max_size ({})",
                    min, max
                )));
            }
        }
        Ok(())
    }
}
