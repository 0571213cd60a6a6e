//! Export formats, quality levels and per-document export configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Output formats known to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Powerpoint,
    Excel,
    Image,
    Html,
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 6] = [
        Self::Pdf,
        Self::Powerpoint,
        Self::Excel,
        Self::Image,
        Self::Html,
        Self::Json,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Powerpoint => "powerpoint",
            Self::Excel => "excel",
            Self::Image => "image",
            Self::Html => "html",
            Self::Json => "json",
        }
    }

    /// Registered MIME type of the produced file
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Powerpoint => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Self::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Image => "image/png",
            Self::Html => "text/html",
            Self::Json => "application/json",
        }
    }

    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Powerpoint => "pptx",
            Self::Excel => "xlsx",
            Self::Image => "png",
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown format name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown export format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "powerpoint" | "pptx" | "slides" => Ok(Self::Powerpoint),
            "excel" | "xlsx" | "spreadsheet" => Ok(Self::Excel),
            "image" | "png" => Ok(Self::Image),
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Output quality level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Low,
    Medium,
    #[default]
    High,
    Maximum,
}

impl QualityLevel {
    /// The fixed quality table shared by every compiler
    pub fn settings(&self) -> QualitySettings {
        let (resolution, compression, antialiasing) = match self {
            Self::Low => (72, 80, false),
            Self::Medium => (150, 90, true),
            Self::High => (300, 95, true),
            Self::Maximum => (600, 100, true),
        };
        QualitySettings {
            resolution,
            compression,
            antialiasing,
        }
    }
}

impl FromStr for QualityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "maximum" | "max" => Ok(Self::Maximum),
            other => Err(format!("unknown quality level: {}", other)),
        }
    }
}

/// Resolution (DPI), compression (percent) and antialiasing flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualitySettings {
    pub resolution: u32,
    pub compression: u8,
    pub antialiasing: bool,
}

impl Default for QualitySettings {
    fn default() -> Self {
        QualityLevel::default().settings()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractivityLevel {
    Full,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractivityConfig {
    pub level: InteractivityLevel,
    pub preserve_links: bool,
    pub preserve_tooltips: bool,
    pub preserve_animations: bool,
}

impl InteractivityConfig {
    pub fn preserving(preserve: bool) -> Self {
        Self {
            level: if preserve {
                InteractivityLevel::Full
            } else {
                InteractivityLevel::None
            },
            preserve_links: preserve,
            preserve_tooltips: preserve,
            preserve_animations: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityConfig {
    pub include_alt_text: bool,
    pub include_aria_labels: bool,
    pub include_keyboard_nav: bool,
    pub contrast_level: String,
}

impl Default for AccessibilityConfig {
    fn default() -> Self {
        Self {
            include_alt_text: true,
            include_aria_labels: true,
            include_keyboard_nav: false,
            contrast_level: "AA".to_string(),
        }
    }
}

/// Diagonal text stamped across document pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watermark {
    pub text: String,
    #[serde(default = "default_watermark_opacity")]
    pub opacity: f64,
}

impl Watermark {
    /// Watermark at the default opacity
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            opacity: default_watermark_opacity(),
        }
    }
}

fn default_watermark_opacity() -> f64 {
    0.15
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
    pub target_formats: Vec<ExportFormat>,
    pub quality: QualityLevel,
    pub quality_settings: QualitySettings,
    pub interactivity_level: InteractivityConfig,
    pub accessibility: AccessibilityConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<Watermark>,
}
