//! Configuration settings
//!
//! Loaded from a `dashport.toml` file. Every table and field has a default,
//! so a partial file (or none at all) is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use dashport_ir::QualityLevel;
use dashport_pdf::PdfSettings;
use dashport_pptx::SlideSettings;
use dashport_raster::RasterSettings;
use dashport_xlsx::SpreadsheetSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conventional configuration file name
pub const CONFIG_FILE_NAME: &str = "dashport.toml";

/// Errors raised while loading settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Session orchestration
    pub manager: ManagerSettings,
    /// Capture tree to IR translation
    pub translation: TranslationSettings,
    pub pdf: PdfSettings,
    pub slides: SlideSettings,
    pub spreadsheet: SpreadsheetSettings,
    pub image: RasterSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(toml_str)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read and parse a settings file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.manager.max_concurrent_exports == 0 {
            return Err(ConfigError::Invalid(
                "manager.max_concurrent_exports must be at least 1".to_string(),
            ));
        }
        if self.spreadsheet.min_column_width > self.spreadsheet.max_column_width {
            return Err(ConfigError::Invalid(format!(
                "spreadsheet.min_column_width ({}) exceeds max_column_width ({})",
                self.spreadsheet.min_column_width, self.spreadsheet.max_column_width
            )));
        }
        if !(self.image.scale > 0.0) {
            return Err(ConfigError::Invalid("image.scale must be positive".to_string()));
        }
        Ok(())
    }
}

/// Session orchestration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSettings {
    /// Sessions executing phases at the same time
    pub max_concurrent_exports: usize,
    /// Requests allowed to wait for a slot; more fail with 5003
    pub max_queue_length: usize,
    /// Extra attempts for a recoverable compilation failure
    pub retry_attempts: u32,
    /// How long finished sessions stay queryable
    pub session_retention_secs: u64,
    pub capture_timeout_secs: u64,
    /// Minimum spacing between intermediate progress writes
    pub progress_update_interval_ms: u64,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            max_concurrent_exports: 3,
            max_queue_length: 64,
            retry_attempts: 3,
            session_retention_secs: 300,
            capture_timeout_secs: 30,
            progress_update_interval_ms: 100,
        }
    }
}

impl ManagerSettings {
    pub fn session_retention(&self) -> Duration {
        Duration::from_secs(self.session_retention_secs)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout_secs)
    }

    pub fn progress_update_interval(&self) -> Duration {
        Duration::from_millis(self.progress_update_interval_ms)
    }
}

/// How sections are distributed over pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PageLayoutStrategy {
    /// Every section on one page
    Single,
    /// One page per group of sections
    Multi,
    /// Pages of at most six sections
    #[default]
    Auto,
}

/// Grouping key used by the `multi` page layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SectionGrouping {
    /// By content type: metrics, charts, tables
    #[default]
    Type,
    /// By placement: header, content, sidebar
    Position,
    /// By the `preferredLayout` export hint on each node
    Custom,
}

/// Translation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    pub page_layout: PageLayoutStrategy,
    pub section_grouping: SectionGrouping,
    /// Quality used when a request does not name one
    pub quality: QualityLevel,
    pub preserve_interactivity: bool,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            page_layout: PageLayoutStrategy::Auto,
            section_grouping: SectionGrouping::Type,
            quality: QualityLevel::High,
            preserve_interactivity: false,
        }
    }
}
