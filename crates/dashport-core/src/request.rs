//! Export requests as submitted by the host application

use chrono::{DateTime, Utc};
use dashport_ir::{ExportFormat, QualityLevel, Watermark};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::capture::CaptureTarget;

/// Part of the dashboard to export
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExportScope {
    /// The whole captured tree
    #[default]
    Full,
    /// Only the subtrees rooted at these node ids
    #[serde(rename_all = "camelCase")]
    Selection { selection_ids: Vec<String> },
    /// Only these translated pages
    #[serde(rename_all = "camelCase")]
    Page { page_ids: Vec<String> },
}

/// Options of one export request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    pub scope: ExportScope,
    /// Requested format names, in delivery order.
    ///
    /// Names that do not parse are skipped with a warning, the same way as
    /// formats without a registered compiler.
    pub formats: Vec<String>,
    /// Overrides the configured quality
    pub quality: Option<QualityLevel>,
    pub include_interactions: bool,
    pub include_animations: bool,
    pub preserve_links: bool,
    pub watermark: Option<Watermark>,
}

impl ExportOptions {
    /// Parsed formats without duplicates, plus a warning per name that failed
    pub fn parsed_formats(&self) -> (Vec<ExportFormat>, Vec<String>) {
        let mut formats = Vec::new();
        let mut warnings = Vec::new();
        for name in &self.formats {
            match name.parse::<ExportFormat>() {
                Ok(format) if !formats.contains(&format) => formats.push(format),
                Ok(_) => {}
                Err(e) => {
                    warn!(format = %name, "skipping unknown export format");
                    warnings.push(format!("Skipped {}", e));
                }
            }
        }
        (formats, warnings)
    }
}

/// A request to export one dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub dashboard_id: String,
    pub user_id: String,
    /// What the capture engine should capture
    pub target: CaptureTarget,
    pub options: ExportOptions,
    pub timestamp: DateTime<Utc>,
}

impl ExportRequest {
    /// A full-dashboard request for the given format names
    pub fn new<I, S>(formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dashboard_id: String::new(),
            user_id: String::new(),
            target: CaptureTarget::default(),
            options: ExportOptions {
                formats: formats.into_iter().map(Into::into).collect(),
                ..Default::default()
            },
            timestamp: Utc::now(),
        }
    }

    /// Start the export at the given node (builder style)
    pub fn with_root(mut self, root_id: impl Into<String>) -> Self {
        self.target.root_id = Some(root_id.into());
        self
    }

    /// Override the quality level (builder style)
    pub fn with_quality(mut self, quality: QualityLevel) -> Self {
        self.options.quality = Some(quality);
        self
    }

    /// Restrict the export (builder style)
    pub fn with_scope(mut self, scope: ExportScope) -> Self {
        self.options.scope = scope;
        self
    }

    pub fn with_watermark(mut self, watermark: Watermark) -> Self {
        self.options.watermark = Some(watermark);
        self
    }
}
