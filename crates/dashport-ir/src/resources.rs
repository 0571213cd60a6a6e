//! Shared resource registries
//!
//! Styles, data snapshots, media and templates are keyed by a stable id.
//! Sections reference media by id; a missing entry is resolved by each
//! compiler's fallback policy, never by an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capture::SNAPSHOT_URL;
use crate::document::Size;

/// Default brand palette
pub const DEFAULT_PRIMARY: &str = "#9e1f63";
pub const DEFAULT_SECONDARY: &str = "#424046";
pub const DEFAULT_ACCENT: &str = "#005b8c";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Resources {
    pub styles: StyleDefinitions,
    pub data: BTreeMap<String, DataResource>,
    pub media: BTreeMap<String, MediaResource>,
    pub templates: BTreeMap<String, Template>,
}

impl Resources {
    /// The whole-dashboard raster, if one was captured
    pub fn visual_snapshot(&self) -> Option<(&str, &MediaResource)> {
        self.media
            .iter()
            .find(|(_, m)| m.kind == MediaKind::Snapshot || m.url == SNAPSHOT_URL)
            .filter(|(_, m)| m.data.is_some())
            .map(|(id, m)| (id.as_str(), m))
    }

    pub fn media(&self, id: &str) -> Option<&MediaResource> {
        self.media.get(id)
    }
}

/// Global colors, fonts, spacing and breakpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDefinitions {
    pub colors: BTreeMap<String, String>,
    pub fonts: BTreeMap<String, String>,
    pub spacing: BTreeMap<String, String>,
    pub breakpoints: BTreeMap<String, u32>,
}

impl Default for StyleDefinitions {
    fn default() -> Self {
        let colors = [
            ("primary", DEFAULT_PRIMARY),
            ("secondary", DEFAULT_SECONDARY),
            ("accent", DEFAULT_ACCENT),
        ];
        let fonts = [("primary", "Verdana"), ("secondary", "Tahoma")];
        let spacing = [
            ("small", "8px"),
            ("medium", "16px"),
            ("large", "24px"),
            ("xlarge", "32px"),
        ];
        let breakpoints = [
            ("mobile", 640),
            ("tablet", 768),
            ("desktop", 1024),
            ("wide", 1280),
        ];
        Self {
            colors: to_map(colors),
            fonts: to_map(fonts),
            spacing: to_map(spacing),
            breakpoints: breakpoints
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

fn to_map<const N: usize>(entries: [(&str, &str); N]) -> BTreeMap<String, String> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl StyleDefinitions {
    pub fn color(&self, name: &str) -> Option<&str> {
        self.colors.get(name).map(String::as_str)
    }

    pub fn primary(&self) -> &str {
        self.color("primary").unwrap_or(DEFAULT_PRIMARY)
    }

    pub fn secondary(&self) -> &str {
        self.color("secondary").unwrap_or(DEFAULT_SECONDARY)
    }

    pub fn accent(&self) -> &str {
        self.color("accent").unwrap_or(DEFAULT_ACCENT)
    }

    pub fn font(&self) -> &str {
        self.fonts.get("primary").map(String::as_str).unwrap_or("Verdana")
    }

    /// Apply theme overrides on top of the current values
    pub fn merge_theme(
        &mut self,
        colors: &BTreeMap<String, String>,
        fonts: &BTreeMap<String, String>,
    ) {
        self.colors.extend(colors.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.fonts.extend(fonts.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataResource {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Icon,
    /// Raster of the whole dashboard
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaResource {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    /// Base64 payload or data URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Size>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: Value,
    pub variables: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palette() {
        let styles = StyleDefinitions::default();
        assert_eq!(styles.primary(), "#9e1f63");
        assert_eq!(styles.secondary(), "#424046");
        assert_eq!(styles.accent(), "#005b8c");
        assert_eq!(styles.font(), "Verdana");
        assert_eq!(styles.spacing["xlarge"], "32px");
        assert_eq!(styles.breakpoints["wide"], 1280);
    }

    #[test]
    fn test_theme_override() {
        let mut styles = StyleDefinitions::default();
        let colors = BTreeMap::from([("primary".to_string(), "#112233".to_string())]);
        styles.merge_theme(&colors, &BTreeMap::new());
        assert_eq!(styles.primary(), "#112233");
        assert_eq!(styles.secondary(), "#424046");
    }

    #[test]
    fn test_visual_snapshot_requires_data() {
        let mut resources = Resources::default();
        resources.media.insert(
            "snap".to_string(),
            MediaResource {
                kind: MediaKind::Image,
                url: SNAPSHOT_URL.to_string(),
                data: None,
                mime_type: None,
                dimensions: None,
            },
        );
        assert!(resources.visual_snapshot().is_none());

        if let Some(m) = resources.media.get_mut("snap") {
            m.data = Some("iVBORw0KGgo=".to_string());
        }
        let (id, _) = resources.visual_snapshot().unwrap();
        assert_eq!(id, "snap");
    }
}
