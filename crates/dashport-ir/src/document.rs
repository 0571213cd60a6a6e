//! Intermediate representation of an exported dashboard
//!
//! The IR is format-agnostic: an ordered list of pages, each holding an
//! ordered list of sections, each with exactly one primary content variant.
//! Every compiler consumes this model and nothing else.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ExportConfig;
use crate::resources::Resources;

/// IR format version
pub const IR_VERSION: &str = "2.0.0";

/// Width/height pair in the unit of the surrounding context
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    /// Same margin on all four sides
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

/// A table cell or metric value as captured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl CellValue {
    /// Numeric value, for number cells only
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{}", n),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Text(s) => f.write_str(s),
            Self::Null => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// A translated dashboard, ready for compilation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrDocument {
    pub version: String,
    /// Title, author, timestamps, tags
    pub document: DocumentInfo,
    /// Pages in output order
    pub pages: Vec<Page>,
    /// Shared style, data, media and template registries
    pub resources: Resources,
    /// Target formats, quality, interactivity and accessibility
    pub export_config: ExportConfig,
}

impl IrDocument {
    /// An empty document with default resources and configuration
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            version: IR_VERSION.to_string(),
            document: DocumentInfo {
                title: title.into(),
                ..Default::default()
            },
            pages: Vec::new(),
            resources: Resources::default(),
            export_config: ExportConfig::default(),
        }
    }

    pub fn title(&self) -> &str {
        &self.document.title
    }

    /// All sections across all pages, in page order
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.pages.iter().flat_map(|p| p.sections.iter())
    }

    pub fn section_count(&self) -> usize {
        self.pages.iter().map(|p| p.sections.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub title: String,
    pub description: String,
    pub author: Author,
    pub created: String,
    pub modified: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// One page of output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: PageKind,
    pub layout: PageLayout,
    pub sections: Vec<Section>,
    pub metadata: PageMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Dashboard,
    Report,
    Slide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    Fixed,
    Flow,
    Grid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    #[serde(rename = "type")]
    pub kind: LayoutKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Size>,
    pub margins: Margins,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<f64>,
}

impl PageLayout {
    /// Flowing layout with uniform margins
    pub fn flow(margin: f64) -> Self {
        Self {
            kind: LayoutKind::Flow,
            dimensions: None,
            margins: Margins::uniform(margin),
            columns: None,
            gap: None,
        }
    }

    /// Grid layout with a fixed column count
    pub fn grid(columns: u32, gap: f64, margin: f64) -> Self {
        Self {
            kind: LayoutKind::Grid,
            dimensions: None,
            margins: Margins::uniform(margin),
            columns: Some(columns),
            gap: Some(gap),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    pub tags: Vec<String>,
    pub notes: String,
    pub export_priority: u32,
}

/// One exportable unit of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub content: SectionContent,
    pub layout: SectionLayout,
    pub styling: SectionStyling,
    pub behavior: SectionBehavior,
}

impl Section {
    /// Section with default layout, styling and behavior
    pub fn new(id: impl Into<String>, primary: Content) -> Self {
        Self {
            id: id.into(),
            kind: SectionKind::Content,
            content: SectionContent {
                primary,
                supporting: Vec::new(),
                annotations: Vec::new(),
            },
            layout: SectionLayout::default(),
            styling: SectionStyling::default(),
            behavior: SectionBehavior::default(),
        }
    }

    pub fn primary(&self) -> &Content {
        &self.content.primary
    }

    pub fn content_type(&self) -> ContentType {
        self.content.primary.content_type()
    }

    /// Human-readable name for the section, used for sheet and slide titles
    pub fn display_title(&self) -> String {
        match &self.content.primary {
            Content::Metric(m) => m.label.clone(),
            Content::Chart(c) => c.title().to_string(),
            Content::Text(t) if !t.text.trim().is_empty() => {
                t.text.lines().next().unwrap_or_default().trim().to_string()
            }
            Content::Image(i) if !i.alt.is_empty() => i.alt.clone(),
            other => format!("{} {}", other.content_type().label(), self.id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Header,
    Content,
    Footer,
    Sidebar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionContent {
    pub primary: Content,
    #[serde(default)]
    pub supporting: Vec<Content>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionLayout {
    pub position: Position,
    pub size: Size,
    pub z_index: i32,
    pub alignment: Alignment,
    pub padding: String,
}

impl Default for SectionLayout {
    fn default() -> Self {
        Self {
            position: Position::default(),
            size: Size::new(100.0, 100.0),
            z_index: 0,
            alignment: Alignment::default(),
            padding: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Alignment {
    pub horizontal: HAlign,
    pub vertical: VAlign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl HAlign {
    /// Parse a CSS `text-align` value
    pub fn from_css(value: &str) -> Self {
        match value.trim() {
            "center" => Self::Center,
            "right" | "end" => Self::Right,
            "justify" => Self::Justify,
            _ => Self::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionStyling {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    pub border: Border,
    pub shadow: Shadow,
    pub opacity: f64,
}

impl Default for SectionStyling {
    fn default() -> Self {
        Self {
            background: None,
            border: Border::default(),
            shadow: Shadow::default(),
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub width: String,
    pub style: String,
    pub color: String,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            width: "1px".to_string(),
            style: "solid".to_string(),
            color: "#e0e0e0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub x: f64,
    pub y: f64,
    pub blur: f64,
    pub color: String,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 2.0,
            blur: 4.0,
            color: "rgba(0,0,0,0.1)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionBehavior {
    pub visibility: Visibility,
    pub interactions: Vec<InteractionConfig>,
    pub animations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visibility {
    pub show_on_print: bool,
    pub show_on_screen: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            show_on_print: true,
            show_on_screen: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// Discriminant of [`Content`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Chart,
    Table,
    Metric,
    Text,
    Image,
    Composite,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chart => "chart",
            Self::Table => "table",
            Self::Metric => "metric",
            Self::Text => "text",
            Self::Image => "image",
            Self::Composite => "composite",
        }
    }

    /// Capitalized name (`Metric`)
    pub fn label(&self) -> &'static str {
        match self {
            Self::Chart => "Chart",
            Self::Table => "Table",
            Self::Metric => "Metric",
            Self::Text => "Text",
            Self::Image => "Image",
            Self::Composite => "Composite",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The primary payload of a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Chart(ChartContent),
    Table(TableContent),
    Metric(MetricContent),
    Text(TextContent),
    Image(ImageContent),
    Composite(CompositeContent),
}

impl Content {
    pub fn content_type(&self) -> ContentType {
        match self {
            Self::Chart(_) => ContentType::Chart,
            Self::Table(_) => ContentType::Table,
            Self::Metric(_) => ContentType::Metric,
            Self::Text(_) => ContentType::Text,
            Self::Image(_) => ContentType::Image,
            Self::Composite(_) => ContentType::Composite,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartContent {
    /// Chart type as captured (`bar`, `line`, `pie`...), `unknown` if absent
    pub chart_type: String,
    pub data: ChartData,
    pub config: ChartConfig,
    pub fallback: ChartFallback,
}

impl ChartContent {
    /// Chart title: the first dataset label, else the description
    pub fn title(&self) -> &str {
        self.data
            .datasets
            .first()
            .map(|d| d.label.as_str())
            .filter(|l| !l.is_empty())
            .unwrap_or(self.fallback.description.as_str())
    }

    /// Whether the chart carries plottable data
    pub fn has_data(&self) -> bool {
        !self.data.labels.is_empty() && !self.data.datasets.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub options: Value,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            kind: "bar".to_string(),
            options: Value::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartFallback {
    /// Raster fallback as base64 or data URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableContent {
    pub headers: Vec<TableHeader>,
    pub rows: Vec<TableRow>,
    pub config: TableConfig,
    pub styling: TableStyling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableHeader {
    pub key: String,
    pub label: String,
    pub sortable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub id: String,
    pub cells: Vec<CellValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    pub page_size: u32,
    pub current_page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableStyling {
    pub striped: bool,
    pub bordered: bool,
    pub hover: bool,
    pub compact: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricContent {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<MetricChange>,
    pub styling: MetricStyling,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricChange {
    pub value: f64,
    pub direction: Direction,
    pub percentage: bool,
}

impl MetricChange {
    /// Arrow plus magnitude, e.g. `↑ 12%`
    pub fn indicator(&self) -> String {
        let arrow = match self.direction {
            Direction::Up => "↑",
            Direction::Down => "↓",
            Direction::Neutral => "→",
        };
        let pct = if self.percentage { "%" } else { "" };
        format!("{} {}{}", arrow, CellValue::Number(self.value.abs()), pct)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricStyling {
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
    pub formatting: TextFormatting,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFormatting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub alignment: HAlign,
}

impl TextFormatting {
    /// Font size in points, if the captured size parses
    pub fn font_size_pt(&self) -> Option<f64> {
        self.font_size
            .as_deref()
            .and_then(crate::capture::leading_number)
            .filter(|s| *s > 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Base64 payload, data URL or plain URL
    pub src: String,
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Size>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompositeContent {
    pub items: Vec<Content>,
}
