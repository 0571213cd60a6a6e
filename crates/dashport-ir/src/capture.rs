//! Capture tree definitions
//!
//! A capture tree is the structural snapshot of a rendered dashboard handed
//! to the pipeline by a capture engine: nodes with layout, style, data and
//! content properties, plus the asset and state registries they reference.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{CellValue, Size};

/// Version tag written by capture engines
pub const CAPTURE_VERSION: &str = "1.0.0";

/// Asset URL marking the whole-dashboard raster
pub const SNAPSHOT_URL: &str = "dashboard_snapshot";

/// A complete capture of a rendered dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureTree {
    /// Capture format version
    #[serde(default = "default_version")]
    pub version: String,
    /// When, where and for whom the capture was taken
    #[serde(default)]
    pub metadata: CaptureMetadata,
    /// Node tree and registries
    pub structure: CaptureStructure,
    /// Application state at capture time
    #[serde(default)]
    pub state: CaptureState,
}

fn default_version() -> String {
    CAPTURE_VERSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureMetadata {
    pub capture_timestamp: String,
    pub dashboard_id: String,
    pub dashboard_version: String,
    pub user_context: UserContext,
    pub environment_context: EnvironmentContext,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserContext {
    pub user_id: String,
    pub permissions: Vec<String>,
    pub preferences: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentContext {
    pub viewport: Size,
    pub device_pixel_ratio: f64,
    pub color_scheme: String,
    pub locale: String,
}

impl Default for EnvironmentContext {
    fn default() -> Self {
        Self {
            viewport: Size::new(1280.0, 800.0),
            device_pixel_ratio: 1.0,
            color_scheme: "light".to_string(),
            locale: "en-US".to_string(),
        }
    }
}

/// Node tree plus the registries nodes point into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureStructure {
    pub root: CaptureNode,
    #[serde(default)]
    pub assets: AssetRegistry,
    #[serde(default)]
    pub data_bindings: BTreeMap<String, DataBinding>,
    #[serde(default)]
    pub interactions: BTreeMap<String, Interaction>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureState {
    pub filters: Vec<FilterState>,
    pub selections: Vec<SelectionState>,
    pub view_configuration: Option<ViewConfig>,
    pub theme_configuration: Option<ThemeConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub filter_id: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub applied_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub element_id: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewConfig {
    pub zoom: f64,
    pub layout: String,
}

/// Theme override applied on top of the default palette
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeConfig {
    pub name: String,
    pub colors: BTreeMap<String, String>,
    pub fonts: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataBinding {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub transform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub trigger: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub parameters: Option<Value>,
}

/// Structural role of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Container,
    Widget,
    Element,
}

/// Dashboard content a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeSubtype {
    Chart,
    Table,
    Metric,
    Text,
    Image,
    Filter,
}

impl NodeSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chart => "chart",
            Self::Table => "table",
            Self::Metric => "metric",
            Self::Text => "text",
            Self::Image => "image",
            Self::Filter => "filter",
        }
    }
}

/// A node of the capture tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureNode {
    /// Stable node identifier (assets refer back to it)
    pub id: String,
    /// Structural role
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Content type, when the node renders dashboard content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<NodeSubtype>,
    #[serde(default)]
    pub properties: NodeProperties,
    /// Children in document order
    #[serde(default)]
    pub children: Vec<CaptureNode>,
    #[serde(default)]
    pub metadata: NodeMetadata,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeProperties {
    pub layout: LayoutProperties,
    pub style: StyleProperties,
    pub data: Option<DataProperties>,
    pub content: Option<ContentProperties>,
}

/// A CSS length as captured: either a bare number or a string like `"12px"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Length {
    Number(f64),
    Text(String),
}

impl Length {
    /// Numeric value, if the length is a plain number or a numeric string
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Leading numeric part, ignoring a unit suffix (`"14px"` -> 14)
    pub fn leading_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => leading_number(s),
        }
    }
}

/// Parse the leading decimal number of a string, the way `parseFloat` reads it
pub fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    s[..end].trim_end_matches('.').parse().ok()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutProperties {
    pub display: Option<String>,
    pub position: Option<String>,
    pub top: Option<Length>,
    pub left: Option<Length>,
    pub width: Option<Length>,
    pub height: Option<Length>,
    pub margin: Option<String>,
    pub padding: Option<String>,
}

impl LayoutProperties {
    /// Fixed-position node pinned at `top: 0`
    pub fn is_fixed_top(&self) -> bool {
        self.is_fixed() && self.top.as_ref().and_then(Length::as_f64) == Some(0.0)
    }

    /// Fixed-position node pinned at `left: 0`
    pub fn is_fixed_left(&self) -> bool {
        self.is_fixed() && self.left.as_ref().and_then(Length::as_f64) == Some(0.0)
    }

    fn is_fixed(&self) -> bool {
        self.position.as_deref() == Some("fixed")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleProperties {
    pub background_color: Option<String>,
    pub color: Option<String>,
    pub font_size: Option<String>,
    pub font_family: Option<String>,
    pub font_weight: Option<String>,
    pub font_style: Option<String>,
    pub text_align: Option<String>,
    pub border: Option<String>,
    pub border_radius: Option<String>,
    pub box_shadow: Option<String>,
    pub opacity: Option<f64>,
    pub z_index: Option<Length>,
}

/// Data carried by charts, tables and metric cards
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataProperties {
    pub chart_type: Option<String>,
    pub chart_data: Option<CapturedChartData>,
    pub chart_options: Option<Value>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    pub label: Option<String>,
    pub value: Option<CellValue>,
    pub change: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapturedChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<CapturedDataset>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapturedDataset {
    pub label: String,
    pub data: Vec<Option<f64>>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentProperties {
    pub text: Option<String>,
    pub html: Option<String>,
}

/// Back-references and export hints attached to a node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeMetadata {
    /// Name of the UI component that rendered the node
    #[serde(alias = "reactComponent")]
    pub component: Option<String>,
    pub data_binding_id: Option<String>,
    pub interaction_ids: Vec<String>,
    pub export_hints: Option<ExportHints>,
    /// Element tag name (`div`, `button`, `canvas`...)
    pub tag: Option<String>,
    /// Element class list
    pub classes: Vec<String>,
    /// Remaining element attributes
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportHints {
    pub preferred_layout: Option<String>,
    pub preserve_aspect_ratio: Option<bool>,
    pub min_size: Option<Size>,
    pub max_size: Option<Size>,
    pub no_export: bool,
}

/// Assets referenced from nodes, keyed by asset id
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetRegistry {
    pub images: BTreeMap<String, ImageAsset>,
    pub fonts: BTreeMap<String, FontAsset>,
    pub icons: BTreeMap<String, IconAsset>,
    pub data: BTreeMap<String, DataAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAsset {
    pub original_url: String,
    #[serde(default)]
    pub base64_data: Option<String>,
    #[serde(default = "default_image_mime")]
    pub mime_type: String,
    #[serde(default)]
    pub dimensions: Option<Size>,
    #[serde(default)]
    pub usage: Vec<AssetUsage>,
}

fn default_image_mime() -> String {
    "image/png".to_string()
}

impl ImageAsset {
    /// Whether this asset is the raster of the whole dashboard
    pub fn is_snapshot(&self) -> bool {
        self.original_url == SNAPSHOT_URL
    }

    /// Whether the asset is used by the node with the given id
    pub fn used_by(&self, node_id: &str) -> bool {
        self.usage.iter().any(|u| u.node_id == node_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetUsage {
    pub node_id: String,
    #[serde(default)]
    pub property: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontAsset {
    pub family: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub fallbacks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconAsset {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: String,
    #[serde(default)]
    pub size: Option<Size>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataAsset {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub schema: Option<Value>,
}

impl CaptureTree {
    /// Wrap a root node with empty registries and state
    pub fn new(root: CaptureNode) -> Self {
        Self {
            version: default_version(),
            metadata: CaptureMetadata::default(),
            structure: CaptureStructure {
                root,
                assets: AssetRegistry::default(),
                data_bindings: BTreeMap::new(),
                interactions: BTreeMap::new(),
            },
            state: CaptureState::default(),
        }
    }

    /// The root node
    pub fn root(&self) -> &CaptureNode {
        &self.structure.root
    }

    /// First image asset whose usage points at `node_id`, in asset-id order
    pub fn image_for_node(&self, node_id: &str) -> Option<(&str, &ImageAsset)> {
        self.structure
            .assets
            .images
            .iter()
            .find(|(_, asset)| asset.used_by(node_id))
            .map(|(id, asset)| (id.as_str(), asset))
    }

    /// The whole-dashboard raster asset, if the capture engine produced one
    pub fn snapshot(&self) -> Option<&ImageAsset> {
        self.structure.assets.images.values().find(|a| a.is_snapshot())
    }

    /// Total number of nodes in the tree
    pub fn node_count(&self) -> usize {
        self.root().iter().count()
    }
}

impl CaptureNode {
    /// Create a bare node
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            subtype: None,
            properties: NodeProperties::default(),
            children: Vec::new(),
            metadata: NodeMetadata::default(),
        }
    }

    /// Create a structural container
    pub fn container(id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Container)
    }

    /// Create a widget of the given subtype
    pub fn widget(id: impl Into<String>, subtype: NodeSubtype) -> Self {
        let mut node = Self::new(id, NodeKind::Widget);
        node.subtype = Some(subtype);
        node
    }

    /// Append a child (builder style)
    pub fn with_child(mut self, child: CaptureNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children (builder style)
    pub fn with_children(mut self, children: impl IntoIterator<Item = CaptureNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Set the text content (builder style)
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.properties
            .content
            .get_or_insert_with(ContentProperties::default)
            .text = Some(text.into());
        self
    }

    /// Set the data properties (builder style)
    pub fn with_data(mut self, data: DataProperties) -> Self {
        self.properties.data = Some(data);
        self
    }

    /// Whether the node becomes an exportable section
    pub fn is_exportable(&self) -> bool {
        self.kind == NodeKind::Widget || self.subtype.is_some()
    }

    /// Text content, if any
    pub fn text(&self) -> Option<&str> {
        self.properties.content.as_ref()?.text.as_deref()
    }

    /// Whether the node carries the given class
    pub fn has_class(&self, class: &str) -> bool {
        self.metadata.classes.iter().any(|c| c == class)
    }

    /// Tag name, lower-cased comparison
    pub fn has_tag(&self, tag: &str) -> bool {
        self.metadata
            .tag
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Attribute value
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.metadata.attributes.get(name).map(String::as_str)
    }

    /// Pre-order, depth-first iterator over this node and its descendants
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter { stack: vec![self] }
    }

    /// First node (pre-order) matching the predicate
    pub fn find(&self, predicate: impl Fn(&CaptureNode) -> bool) -> Option<&CaptureNode> {
        self.iter().find(|n| predicate(n))
    }

    /// First node (pre-order) with the given id
    pub fn find_by_id(&self, id: &str) -> Option<&CaptureNode> {
        self.find(|n| n.id == id)
    }

    /// Whether any node of the subtree has the given subtype
    pub fn contains_subtype(&self, subtype: NodeSubtype) -> bool {
        self.iter().any(|n| n.subtype == Some(subtype))
    }
}

/// Pre-order iterator over a capture subtree
pub struct NodeIter<'a> {
    stack: Vec<&'a CaptureNode>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a CaptureNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
