//! Capture tree to IR translation
//!
//! Sections are produced by a depth-first walk: every widget or typed node
//! becomes one section, containers are walked through without producing
//! anything, and widgets are not descended into. The page layout strategy
//! then decides how those sections are distributed over pages.

use std::collections::{BTreeMap, HashSet};

use dashport_ir::capture::{Length, CAPTURE_VERSION};
use dashport_ir::document::{
    Author, ChartConfig, ChartData, ChartFallback, Dataset, Direction, DocumentInfo, HAlign,
    ImageContent, InteractionConfig, MetricChange, MetricStyling, PageKind, PageLayout,
    PageMetadata, Position, SectionBehavior, SectionContent, SectionKind, SectionLayout,
    SectionStyling, Size, TableConfig, TableHeader, TableRow, TableStyling, TextFormatting,
};
use dashport_ir::config::{AccessibilityConfig, InteractivityConfig};
use dashport_ir::resources::{DataResource, Template};
use dashport_ir::{
    CaptureNode, CaptureTree, ChartContent, Content, ContentType, ExportConfig, ExportFormat,
    IrDocument, MediaKind, MediaResource, MetricContent, NodeKind, NodeSubtype, Page,
    QualityLevel, Resources, Section, StyleDefinitions, TableContent, TextContent, Watermark,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{PageLayoutStrategy, SectionGrouping, TranslationSettings};
use crate::error::{ErrorCode, ExportError};
use crate::request::{ExportOptions, ExportScope};

/// Most sections placed on one page by the `auto` layout
pub const MAX_SECTIONS_PER_PAGE: usize = 6;

/// Rows per page recorded on translated tables
pub const TABLE_PAGE_SIZE: u32 = 50;

const PAGE_MARGIN: f64 = 20.0;

/// Errors raised when a capture cannot be translated
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    #[error("Invalid capture tree: {0}")]
    SchemaInvalid(String),

    #[error("Corrupted capture data: {0}")]
    DataCorrupted(String),

    #[error("Unsupported capture version {found} (expected {expected})")]
    VersionMismatch { found: String, expected: String },
}

impl TranslationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SchemaInvalid(_) => ErrorCode::TranslationSchemaInvalid,
            Self::DataCorrupted(_) => ErrorCode::TranslationDataCorrupted,
            Self::VersionMismatch { .. } => ErrorCode::TranslationVersionMismatch,
        }
    }
}

impl From<TranslationError> for ExportError {
    fn from(err: TranslationError) -> Self {
        ExportError::new(err.code(), err.to_string())
    }
}

/// Options of one translation
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOptions {
    pub target_formats: Vec<ExportFormat>,
    pub page_layout: PageLayoutStrategy,
    pub section_grouping: SectionGrouping,
    pub quality: QualityLevel,
    pub preserve_interactivity: bool,
    pub preserve_links: bool,
    pub preserve_animations: bool,
    pub watermark: Option<Watermark>,
    pub scope: ExportScope,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self::from(&TranslationSettings::default())
    }
}

impl From<&TranslationSettings> for TranslationOptions {
    fn from(settings: &TranslationSettings) -> Self {
        Self {
            target_formats: vec![ExportFormat::Pdf],
            page_layout: settings.page_layout,
            section_grouping: settings.section_grouping,
            quality: settings.quality,
            preserve_interactivity: settings.preserve_interactivity,
            preserve_links: settings.preserve_interactivity,
            preserve_animations: false,
            watermark: None,
            scope: ExportScope::Full,
        }
    }
}

impl TranslationOptions {
    /// Configured defaults overridden by one request
    pub fn for_request(
        settings: &TranslationSettings,
        options: &ExportOptions,
        formats: Vec<ExportFormat>,
    ) -> Self {
        let preserve = settings.preserve_interactivity || options.include_interactions;
        Self {
            target_formats: formats,
            quality: options.quality.unwrap_or(settings.quality),
            preserve_interactivity: preserve,
            preserve_links: preserve || options.preserve_links,
            preserve_animations: options.include_animations,
            watermark: options.watermark.clone(),
            scope: options.scope.clone(),
            ..Self::from(settings)
        }
    }

    /// Set the page layout (builder style)
    pub fn with_page_layout(mut self, page_layout: PageLayoutStrategy) -> Self {
        self.page_layout = page_layout;
        self
    }

    /// Set the grouping used by the multi-page layout (builder style)
    pub fn with_grouping(mut self, grouping: SectionGrouping) -> Self {
        self.section_grouping = grouping;
        self
    }
}

/// Translates capture trees into IR documents
#[derive(Debug, Clone, Default)]
pub struct Translator {
    options: TranslationOptions,
}

impl Translator {
    pub fn new(options: TranslationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TranslationOptions {
        &self.options
    }

    /// Translate a capture tree.
    ///
    /// The result depends only on the tree and the options: page and
    /// section ids are numbered from zero on every call.
    pub fn translate(&self, capture: &CaptureTree) -> Result<IrDocument, TranslationError> {
        validate(capture)?;

        let mut pass = Pass {
            options: &self.options,
            capture,
            next_page: 0,
            next_section: 0,
        };
        let roots = pass.scope_roots();
        let mut pages = match self.options.page_layout {
            PageLayoutStrategy::Single => vec![pass.single_page(&roots)],
            PageLayoutStrategy::Multi => pass.grouped_pages(&roots),
            PageLayoutStrategy::Auto => pass.automatic_pages(&roots),
        };

        if let ExportScope::Page { page_ids } = &self.options.scope {
            pages.retain(|page| page_ids.contains(&page.id));
            for (i, page) in pages.iter_mut().enumerate() {
                page.metadata.page_number = Some(i as u32 + 1);
            }
        }

        let mut ir = IrDocument::new(document_title(capture));
        ir.document = pass.document_info(ir.document.title);
        ir.pages = pages;
        ir.resources = extract_resources(capture);
        ir.export_config = self.export_config();

        info!(
            pages = ir.pages.len(),
            sections = ir.section_count(),
            media = ir.resources.media.len(),
            data = ir.resources.data.len(),
            "capture translated"
        );
        Ok(ir)
    }

    fn export_config(&self) -> ExportConfig {
        let mut interactivity = InteractivityConfig::preserving(self.options.preserve_interactivity);
        interactivity.preserve_links = self.options.preserve_links;
        interactivity.preserve_animations = self.options.preserve_animations;
        ExportConfig {
            target_formats: self.options.target_formats.clone(),
            quality: self.options.quality,
            quality_settings: self.options.quality.settings(),
            interactivity_level: interactivity,
            accessibility: AccessibilityConfig::default(),
            watermark: self.options.watermark.clone(),
        }
    }
}

/// Reject captures the translator cannot make sense of
fn validate(capture: &CaptureTree) -> Result<(), TranslationError> {
    let major = |v: &str| v.split('.').next().map(str::to_string).unwrap_or_default();
    if major(&capture.version) != major(CAPTURE_VERSION) {
        return Err(TranslationError::VersionMismatch {
            found: capture.version.clone(),
            expected: CAPTURE_VERSION.to_string(),
        });
    }

    let mut seen = HashSet::new();
    for node in capture.root().iter() {
        if node.id.trim().is_empty() {
            return Err(TranslationError::SchemaInvalid(
                "node without an id".to_string(),
            ));
        }
        if !seen.insert(node.id.as_str()) {
            return Err(TranslationError::SchemaInvalid(format!(
                "duplicate node id {}",
                node.id
            )));
        }
        if let Some(data) = &node.properties.data {
            let width = data.headers.len();
            if let Some(row) = data.rows.iter().find(|r| width > 0 && r.len() > width) {
                return Err(TranslationError::DataCorrupted(format!(
                    "table {} has a row of {} cells under {} headers",
                    node.id,
                    row.len(),
                    width
                )));
            }
        }
    }
    Ok(())
}

/// First heading-sized text node, else a generic title
fn document_title(capture: &CaptureTree) -> String {
    capture
        .root()
        .find(|n| {
            n.subtype == Some(NodeSubtype::Text)
                && n.properties
                    .style
                    .font_size
                    .as_deref()
                    .is_some_and(|s| s.contains('2') || s.contains('3'))
        })
        .and_then(CaptureNode::text)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Dashboard Export")
        .to_string()
}

/// State of one translation call
struct Pass<'a> {
    options: &'a TranslationOptions,
    capture: &'a CaptureTree,
    next_page: usize,
    next_section: usize,
}

/// Fixed attributes of a page produced by a grouping
struct PagePlan {
    title: String,
    kind: PageKind,
    layout: PageLayout,
    tags: Vec<String>,
    priority: u32,
}

impl<'a> Pass<'a> {
    fn page_id(&mut self) -> String {
        let id = format!("page_{}", self.next_page);
        self.next_page += 1;
        id
    }

    fn section_id(&mut self) -> String {
        let id = format!("section_{}", self.next_section);
        self.next_section += 1;
        id
    }

    /// Nodes the walk starts from
    fn scope_roots(&self) -> Vec<&'a CaptureNode> {
        let root = self.capture.root();
        match &self.options.scope {
            ExportScope::Selection { selection_ids } => selection_ids
                .iter()
                .filter_map(|id| {
                    let node = root.find_by_id(id);
                    if node.is_none() {
                        warn!(node = %id, "selected node not in capture");
                    }
                    node
                })
                .collect(),
            _ => root.children.iter().collect(),
        }
    }

    fn document_info(&self, title: String) -> DocumentInfo {
        let metadata = &self.capture.metadata;
        let root = self.capture.root();
        let mut tags = vec!["dashboard".to_string(), "export".to_string()];
        for (subtype, tag) in [
            (NodeSubtype::Chart, "charts"),
            (NodeSubtype::Table, "tables"),
            (NodeSubtype::Metric, "metrics"),
        ] {
            if root.contains_subtype(subtype) {
                tags.push(tag.to_string());
            }
        }
        DocumentInfo {
            title,
            description: String::new(),
            author: Author {
                id: metadata.user_context.user_id.clone(),
                name: "Dashboard User".to_string(),
                email: None,
            },
            created: metadata.capture_timestamp.clone(),
            modified: metadata.capture_timestamp.clone(),
            tags,
        }
    }

    fn page(&mut self, plan: PagePlan, sections: Vec<Section>, number: usize) -> Page {
        Page {
            id: self.page_id(),
            title: plan.title,
            kind: plan.kind,
            layout: plan.layout,
            sections,
            metadata: PageMetadata {
                page_number: Some(number as u32),
                tags: plan.tags,
                notes: String::new(),
                export_priority: plan.priority,
            },
        }
    }

    fn single_page(&mut self, roots: &[&'a CaptureNode]) -> Page {
        let sections = self.sections(roots);
        let plan = PagePlan {
            title: "Dashboard Overview".to_string(),
            kind: PageKind::Dashboard,
            layout: PageLayout::flow(PAGE_MARGIN),
            tags: tags(&["overview", "complete"]),
            priority: 1,
        };
        self.page(plan, sections, 1)
    }

    fn grouped_pages(&mut self, roots: &[&'a CaptureNode]) -> Vec<Page> {
        match self.options.section_grouping {
            SectionGrouping::Type => self.pages_by_type(roots),
            SectionGrouping::Position => self.pages_by_position(roots),
            SectionGrouping::Custom => self.pages_by_hint(roots),
        }
    }

    /// Metrics, then charts, then tables; text and images close the document
    fn pages_by_type(&mut self, roots: &[&'a CaptureNode]) -> Vec<Page> {
        let mut groups: BTreeMap<u8, Vec<&'a CaptureNode>> = BTreeMap::new();
        classify(roots, &mut groups);

        let mut pages = Vec::new();
        for (rank, nodes) in groups {
            let sections: Vec<Section> = nodes.iter().filter_map(|n| self.section(n)).collect();
            if sections.is_empty() {
                continue;
            }
            let plan = match rank {
                0 => PagePlan {
                    title: "Key Metrics".to_string(),
                    kind: PageKind::Dashboard,
                    layout: PageLayout::grid(3, 20.0, PAGE_MARGIN),
                    tags: tags(&["metrics", "kpi"]),
                    priority: 1,
                },
                1 => PagePlan {
                    title: "Analytics & Visualizations".to_string(),
                    kind: PageKind::Dashboard,
                    layout: PageLayout::grid(2, 20.0, PAGE_MARGIN),
                    tags: tags(&["charts", "analytics"]),
                    priority: 2,
                },
                2 => PagePlan {
                    title: "Detailed Data".to_string(),
                    kind: PageKind::Report,
                    layout: PageLayout::flow(PAGE_MARGIN),
                    tags: tags(&["tables", "data"]),
                    priority: 3,
                },
                _ => PagePlan {
                    title: "Additional Content".to_string(),
                    kind: PageKind::Report,
                    layout: PageLayout::flow(PAGE_MARGIN),
                    tags: tags(&["text", "media"]),
                    priority: 4,
                },
            };
            let number = pages.len() + 1;
            pages.push(self.page(plan, sections, number));
        }
        pages
    }

    fn pages_by_position(&mut self, roots: &[&'a CaptureNode]) -> Vec<Page> {
        let order = [
            (SectionKind::Header, "Header", "header"),
            (SectionKind::Content, "Main Content", "content"),
            (SectionKind::Sidebar, "Sidebar", "sidebar"),
        ];
        let sections = self.sections(roots);
        let mut pages = Vec::new();
        for (kind, title, tag) in order {
            let group: Vec<Section> = sections.iter().filter(|s| s.kind == kind).cloned().collect();
            if group.is_empty() {
                continue;
            }
            let plan = PagePlan {
                title: title.to_string(),
                kind: PageKind::Dashboard,
                layout: optimal_layout(&group),
                tags: tags(&[tag]),
                priority: pages.len() as u32 + 1,
            };
            let number = pages.len() + 1;
            pages.push(self.page(plan, group, number));
        }
        pages
    }

    /// One page per `preferredLayout` hint, in first-seen order
    fn pages_by_hint(&mut self, roots: &[&'a CaptureNode]) -> Vec<Page> {
        let mut groups: Vec<(Option<&'a str>, Vec<Section>)> = Vec::new();
        for node in exportable_nodes(roots) {
            let Some(section) = self.section(node) else {
                continue;
            };
            let hint = node
                .metadata
                .export_hints
                .as_ref()
                .and_then(|h| h.preferred_layout.as_deref());
            match groups.iter_mut().find(|(key, _)| *key == hint) {
                Some((_, sections)) => sections.push(section),
                None => groups.push((hint, vec![section])),
            }
        }
        // untagged sections close the document
        groups.sort_by_key(|(hint, _)| hint.is_none());

        let mut pages = Vec::new();
        for (hint, sections) in groups {
            let title = hint.unwrap_or("Other Content").to_string();
            let plan = PagePlan {
                tags: vec![title.clone()],
                title,
                kind: PageKind::Dashboard,
                layout: optimal_layout(&sections),
                priority: pages.len() as u32 + 1,
            };
            let number = pages.len() + 1;
            pages.push(self.page(plan, sections, number));
        }
        pages
    }

    fn automatic_pages(&mut self, roots: &[&'a CaptureNode]) -> Vec<Page> {
        let sections = self.sections(roots);
        let mut pages = Vec::new();
        for (index, chunk) in sections.chunks(MAX_SECTIONS_PER_PAGE).enumerate() {
            let types = content_types(chunk);
            let title = match types.as_slice() {
                [only] => format!("{}s", only.label()),
                _ => format!("Dashboard Page {}", index + 1),
            };
            let plan = PagePlan {
                title,
                kind: PageKind::Dashboard,
                layout: optimal_layout(chunk),
                tags: types.iter().map(|t| t.as_str().to_string()).collect(),
                priority: index as u32 + 1,
            };
            pages.push(self.page(plan, chunk.to_vec(), index + 1));
        }
        pages
    }

    fn sections(&mut self, roots: &[&'a CaptureNode]) -> Vec<Section> {
        exportable_nodes(roots)
            .into_iter()
            .filter_map(|node| self.section(node))
            .collect()
    }

    fn section(&mut self, node: &CaptureNode) -> Option<Section> {
        let primary = self.content(node)?;
        Some(Section {
            id: self.section_id(),
            kind: section_kind(node),
            content: SectionContent {
                primary,
                supporting: Vec::new(),
                annotations: Vec::new(),
            },
            layout: section_layout(node),
            styling: section_styling(node),
            behavior: self.behavior(node),
        })
    }

    fn content(&self, node: &CaptureNode) -> Option<Content> {
        match node.subtype {
            Some(NodeSubtype::Chart) => Some(Content::Chart(self.chart(node))),
            Some(NodeSubtype::Table) => Some(Content::Table(table(node))),
            Some(NodeSubtype::Metric) => Some(Content::Metric(metric(node))),
            Some(NodeSubtype::Text) => Some(Content::Text(text(node))),
            Some(NodeSubtype::Image) => self.image(node).map(Content::Image),
            Some(NodeSubtype::Filter) => None,
            None => node
                .text()
                .filter(|t| !t.trim().is_empty())
                .map(|_| Content::Text(text(node))),
        }
    }

    fn chart(&self, node: &CaptureNode) -> ChartContent {
        let data = node.properties.data.as_ref();
        let chart_type = data.and_then(|d| d.chart_type.clone());
        let chart_data = data
            .and_then(|d| d.chart_data.as_ref())
            .map(|cd| ChartData {
                labels: cd.labels.clone(),
                datasets: cd
                    .datasets
                    .iter()
                    .map(|ds| Dataset {
                        label: ds.label.clone(),
                        data: ds.data.clone(),
                        color: ds.color.clone(),
                    })
                    .collect(),
            })
            .unwrap_or_default();
        let fallback_image = self
            .capture
            .image_for_node(&node.id)
            .and_then(|(_, asset)| asset.base64_data.clone());

        ChartContent {
            chart_type: chart_type.clone().unwrap_or_else(|| "unknown".to_string()),
            data: chart_data,
            config: ChartConfig {
                kind: chart_type.clone().unwrap_or_else(|| "bar".to_string()),
                options: data
                    .and_then(|d| d.chart_options.clone())
                    .unwrap_or(Value::Null),
            },
            fallback: ChartFallback {
                image: fallback_image,
                description: format!(
                    "{} visualization",
                    chart_type.as_deref().unwrap_or("Chart")
                ),
            },
        }
    }

    /// Image content from the asset used by the node; none without an asset
    fn image(&self, node: &CaptureNode) -> Option<ImageContent> {
        let (_, asset) = self.capture.image_for_node(&node.id)?;
        Some(ImageContent {
            src: asset
                .base64_data
                .clone()
                .unwrap_or_else(|| asset.original_url.clone()),
            alt: node.text().unwrap_or_default().to_string(),
            dimensions: asset.dimensions,
        })
    }

    fn behavior(&self, node: &CaptureNode) -> SectionBehavior {
        let interactions = if self.options.preserve_interactivity {
            node.metadata
                .interaction_ids
                .iter()
                .map(|id| match self.capture.structure.interactions.get(id) {
                    Some(interaction) => InteractionConfig {
                        kind: interaction.kind.clone(),
                        action: interaction.action.clone(),
                        parameters: interaction.parameters.clone(),
                    },
                    None => InteractionConfig {
                        kind: "click".to_string(),
                        action: String::new(),
                        parameters: None,
                    },
                })
                .collect()
        } else {
            Vec::new()
        };
        SectionBehavior {
            interactions,
            ..Default::default()
        }
    }
}

/// Pre-order walk collecting exportable nodes; widgets are not descended into
fn exportable_nodes<'a>(nodes: &[&'a CaptureNode]) -> Vec<&'a CaptureNode> {
    let mut out = Vec::new();
    for &node in nodes {
        collect_exportable(node, &mut out);
    }
    out
}

fn collect_exportable<'a>(node: &'a CaptureNode, out: &mut Vec<&'a CaptureNode>) {
    if node.is_exportable() {
        out.push(node);
    }
    if node.kind != NodeKind::Widget {
        for child in &node.children {
            collect_exportable(child, out);
        }
    }
}

/// Sort nodes into ranked groups: 0 metrics, 1 charts, 2 tables, 3 text and
/// images. Untyped nodes are recursed into for classification only.
fn classify<'a>(nodes: &[&'a CaptureNode], groups: &mut BTreeMap<u8, Vec<&'a CaptureNode>>) {
    for &node in nodes {
        let rank = match node.subtype {
            Some(NodeSubtype::Metric) => Some(0),
            Some(NodeSubtype::Chart) => Some(1),
            Some(NodeSubtype::Table) => Some(2),
            Some(NodeSubtype::Text) | Some(NodeSubtype::Image) => Some(3),
            Some(NodeSubtype::Filter) => None,
            None if node.kind == NodeKind::Widget => Some(3),
            None => None,
        };
        if let Some(rank) = rank {
            groups.entry(rank).or_default().push(node);
        }
        if node.subtype.is_none() && node.kind != NodeKind::Widget {
            let children: Vec<&CaptureNode> = node.children.iter().collect();
            classify(&children, groups);
        }
    }
}

/// Content types present, in first-seen order
fn content_types(sections: &[Section]) -> Vec<ContentType> {
    let mut types = Vec::new();
    for section in sections {
        let t = section.content_type();
        if !types.contains(&t) {
            types.push(t);
        }
    }
    types
}

/// Grid of 3 for metric-only pages, grid of 2 for chart-only pages, else flow
fn optimal_layout(sections: &[Section]) -> PageLayout {
    let all = |t: ContentType| !sections.is_empty() && sections.iter().all(|s| s.content_type() == t);
    if all(ContentType::Metric) {
        PageLayout::grid(3, 16.0, PAGE_MARGIN)
    } else if all(ContentType::Chart) {
        PageLayout::grid(2, 20.0, PAGE_MARGIN)
    } else {
        PageLayout::flow(PAGE_MARGIN)
    }
}

fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn section_kind(node: &CaptureNode) -> SectionKind {
    let layout = &node.properties.layout;
    if layout.is_fixed_top() {
        SectionKind::Header
    } else if layout.is_fixed_left() {
        SectionKind::Sidebar
    } else {
        SectionKind::Content
    }
}

fn section_layout(node: &CaptureNode) -> SectionLayout {
    let layout = &node.properties.layout;
    let number = |len: &Option<Length>| len.as_ref().and_then(Length::as_f64).filter(|v| *v != 0.0);
    SectionLayout {
        position: Position {
            x: number(&layout.left).unwrap_or(0.0),
            y: number(&layout.top).unwrap_or(0.0),
        },
        size: Size::new(
            number(&layout.width).unwrap_or(100.0),
            number(&layout.height).unwrap_or(100.0),
        ),
        z_index: node
            .properties
            .style
            .z_index
            .as_ref()
            .and_then(Length::as_f64)
            .map(|z| z as i32)
            .unwrap_or(0),
        alignment: Default::default(),
        padding: layout.padding.clone().unwrap_or_else(|| "0".to_string()),
    }
}

fn section_styling(node: &CaptureNode) -> SectionStyling {
    let style = &node.properties.style;
    SectionStyling {
        background: style.background_color.clone(),
        opacity: style.opacity.unwrap_or(1.0),
        ..Default::default()
    }
}

fn table(node: &CaptureNode) -> TableContent {
    let (headers, rows) = node
        .properties
        .data
        .as_ref()
        .map(|d| (d.headers.as_slice(), d.rows.as_slice()))
        .unwrap_or_default();
    TableContent {
        headers: headers
            .iter()
            .enumerate()
            .map(|(i, label)| TableHeader {
                key: format!("col_{}", i),
                label: label.clone(),
                sortable: true,
            })
            .collect(),
        rows: rows
            .iter()
            .enumerate()
            .map(|(i, cells)| TableRow {
                id: format!("row_{}", i),
                cells: cells.clone(),
            })
            .collect(),
        config: TableConfig {
            page_size: TABLE_PAGE_SIZE,
            current_page: 1,
        },
        styling: TableStyling {
            striped: true,
            bordered: true,
            hover: true,
            compact: false,
        },
    }
}

fn metric(node: &CaptureNode) -> MetricContent {
    let data = node.properties.data.as_ref();
    let value = data
        .and_then(|d| d.value.as_ref())
        .map(ToString::to_string)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "0".to_string());
    MetricContent {
        label: data
            .and_then(|d| d.label.clone())
            .unwrap_or_else(|| "Metric".to_string()),
        unit: metric_unit(&value).map(str::to_string),
        value,
        change: data
            .and_then(|d| d.change.as_deref())
            .and_then(parse_change),
        styling: MetricStyling {
            size: "medium".to_string(),
            color: node.properties.style.color.clone(),
        },
    }
}

/// Currency or percent symbol carried by a metric value
pub fn metric_unit(value: &str) -> Option<&'static str> {
    ["%", "$", "€"].into_iter().find(|unit| value.contains(unit))
}

/// Parse a change string such as `+12.5%` or `-3`.
///
/// An explicit sign decides the direction; unsigned values go by their sign
/// and zero is neutral.
pub fn parse_change(change: &str) -> Option<MetricChange> {
    let trimmed = change.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = dashport_ir::capture::leading_number(trimmed).unwrap_or(0.0);
    let direction = if trimmed.starts_with('+') {
        Direction::Up
    } else if trimmed.starts_with('-') {
        Direction::Down
    } else if value > 0.0 {
        Direction::Up
    } else if value < 0.0 {
        Direction::Down
    } else {
        Direction::Neutral
    };
    Some(MetricChange {
        value,
        direction,
        percentage: trimmed.contains('%'),
    })
}

fn text(node: &CaptureNode) -> TextContent {
    let style = &node.properties.style;
    let bold = style.font_weight.as_deref().is_some_and(|w| {
        w.eq_ignore_ascii_case("bold") || w.parse::<u32>().is_ok_and(|n| n >= 600)
    });
    TextContent {
        text: node.text().unwrap_or_default().to_string(),
        formatting: TextFormatting {
            font_size: style.font_size.clone(),
            font_family: style.font_family.clone(),
            color: style.color.clone(),
            bold,
            italic: style.font_style.as_deref() == Some("italic"),
            alignment: style
                .text_align
                .as_deref()
                .map(HAlign::from_css)
                .unwrap_or_default(),
        },
    }
}

/// Styles, data snapshots, media and templates
pub fn extract_resources(capture: &CaptureTree) -> Resources {
    let mut styles = StyleDefinitions::default();
    if let Some(theme) = &capture.state.theme_configuration {
        styles.merge_theme(&theme.colors, &theme.fonts);
    }

    let assets = &capture.structure.assets;
    let mut data: BTreeMap<String, DataResource> = assets
        .data
        .iter()
        .map(|(id, asset)| {
            let resource = DataResource {
                kind: asset.kind.clone(),
                data: asset.content.clone(),
                metadata: json!({ "schema": asset.schema }),
            };
            (id.clone(), resource)
        })
        .collect();
    if !capture.state.filters.is_empty() {
        data.insert(
            "filters".to_string(),
            DataResource {
                kind: "filters".to_string(),
                data: serde_json::to_value(&capture.state.filters).unwrap_or_default(),
                metadata: json!({ "appliedAt": capture.metadata.capture_timestamp }),
            },
        );
    }

    let mut media: BTreeMap<String, MediaResource> = assets
        .images
        .iter()
        .map(|(id, asset)| {
            let resource = MediaResource {
                kind: if asset.is_snapshot() {
                    MediaKind::Snapshot
                } else {
                    MediaKind::Image
                },
                url: asset.original_url.clone(),
                data: asset.base64_data.clone(),
                mime_type: Some(asset.mime_type.clone()),
                dimensions: asset.dimensions,
            };
            (id.clone(), resource)
        })
        .collect();
    for (id, icon) in &assets.icons {
        media.insert(
            id.clone(),
            MediaResource {
                kind: MediaKind::Icon,
                url: String::new(),
                data: Some(icon.data.clone()),
                mime_type: None,
                dimensions: icon.size,
            },
        );
    }

    debug!(
        data = data.len(),
        media = media.len(),
        themed = capture.state.theme_configuration.is_some(),
        "resources extracted"
    );
    Resources {
        styles,
        data,
        media,
        templates: builtin_templates(),
    }
}

fn builtin_templates() -> BTreeMap<String, Template> {
    BTreeMap::from([
        (
            "default-chart".to_string(),
            Template {
                name: "Default Chart Template".to_string(),
                kind: "chart".to_string(),
                content: json!({
                    "layout": "standard",
                    "colors": ["#9e1f63", "#424046", "#005b8c"],
                }),
                variables: tags(&["title", "data"]),
            },
        ),
        (
            "default-metric".to_string(),
            Template {
                name: "Default Metric Template".to_string(),
                kind: "metric".to_string(),
                content: json!({ "layout": "card", "showChange": true }),
                variables: tags(&["label", "value", "change"]),
            },
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashport_ir::capture::{
        AssetUsage, CapturedChartData, CapturedDataset, DataProperties, ExportHints, FilterState,
        ImageAsset, Interaction, ThemeConfig,
    };
    use dashport_ir::CellValue;

    fn metric_node(id: &str, value: &str) -> CaptureNode {
        CaptureNode::widget(id, NodeSubtype::Metric).with_data(DataProperties {
            label: Some(format!("KPI {}", id)),
            value: Some(CellValue::from(value)),
            ..Default::default()
        })
    }

    fn chart_node(id: &str) -> CaptureNode {
        CaptureNode::widget(id, NodeSubtype::Chart).with_data(DataProperties {
            chart_type: Some("line".to_string()),
            chart_data: Some(CapturedChartData {
                labels: vec!["Jan".to_string(), "Feb".to_string()],
                datasets: vec![CapturedDataset {
                    label: "Orders".to_string(),
                    data: vec![Some(3.0), Some(4.0)],
                    color: None,
                }],
            }),
            ..Default::default()
        })
    }

    fn table_node(id: &str) -> CaptureNode {
        CaptureNode::widget(id, NodeSubtype::Table).with_data(DataProperties {
            headers: vec!["Region".to_string(), "Sales".to_string()],
            rows: vec![vec![CellValue::from("North"), CellValue::Number(10.0)]],
            ..Default::default()
        })
    }

    fn dashboard() -> CaptureTree {
        let mut heading = CaptureNode::widget("title", NodeSubtype::Text).with_text("Sales Board");
        heading.properties.style.font_size = Some("24px".to_string());
        CaptureTree::new(
            CaptureNode::container("root")
                .with_child(heading)
                .with_child(
                    CaptureNode::container("kpis")
                        .with_child(metric_node("m1", "$1,200"))
                        .with_child(metric_node("m2", "42%")),
                )
                .with_child(chart_node("c1"))
                .with_child(table_node("t1")),
        )
    }

    fn translate(tree: &CaptureTree, layout: PageLayoutStrategy) -> IrDocument {
        let options = TranslationOptions::default().with_page_layout(layout);
        Translator::new(options).translate(tree).unwrap()
    }

    #[test]
    fn test_single_page_in_document_order() {
        let ir = translate(&dashboard(), PageLayoutStrategy::Single);
        assert_eq!(ir.pages.len(), 1);
        let page = &ir.pages[0];
        assert_eq!(page.title, "Dashboard Overview");
        assert_eq!(page.metadata.tags, vec!["overview", "complete"]);
        let types: Vec<ContentType> = page.sections.iter().map(Section::content_type).collect();
        assert_eq!(
            types,
            vec![
                ContentType::Text,
                ContentType::Metric,
                ContentType::Metric,
                ContentType::Chart,
                ContentType::Table
            ]
        );
        let ids: Vec<&str> = page.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids[0], "section_0");
        assert_eq!(ids[4], "section_4");
    }

    #[test]
    fn test_document_info() {
        let mut tree = dashboard();
        tree.metadata.capture_timestamp = "2024-05-01T10:00:00Z".to_string();
        tree.metadata.user_context.user_id = "u-7".to_string();
        let ir = translate(&tree, PageLayoutStrategy::Auto);
        assert_eq!(ir.title(), "Sales Board");
        assert_eq!(ir.document.author.id, "u-7");
        assert_eq!(ir.document.author.name, "Dashboard User");
        assert_eq!(ir.document.created, "2024-05-01T10:00:00Z");
        assert_eq!(
            ir.document.tags,
            vec!["dashboard", "export", "charts", "tables", "metrics"]
        );

        let untitled = CaptureTree::new(CaptureNode::container("root"));
        assert_eq!(translate(&untitled, PageLayoutStrategy::Auto).title(), "Dashboard Export");
    }

    #[test]
    fn test_multi_pages_by_type() {
        let ir = translate(&dashboard(), PageLayoutStrategy::Multi);
        let titles: Vec<&str> = ir.pages.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Key Metrics",
                "Analytics & Visualizations",
                "Detailed Data",
                "Additional Content"
            ]
        );
        assert_eq!(ir.pages[0].layout.columns, Some(3));
        assert_eq!(ir.pages[1].layout.columns, Some(2));
        assert_eq!(ir.pages[2].kind, PageKind::Report);
        assert_eq!(ir.pages[2].metadata.export_priority, 3);
        assert_eq!(ir.pages[0].sections.len(), 2);
    }

    #[test]
    fn test_multi_pages_by_position() {
        let mut header = metric_node("h", "1");
        header.properties.layout.position = Some("fixed".to_string());
        header.properties.layout.top = Some(Length::Number(0.0));
        let mut side = metric_node("s", "2");
        side.properties.layout.position = Some("fixed".to_string());
        side.properties.layout.left = Some(Length::Number(0.0));
        side.properties.layout.top = Some(Length::Number(64.0));
        let tree = CaptureTree::new(
            CaptureNode::container("root").with_children([side, chart_node("c"), header]),
        );
        let options = TranslationOptions::default()
            .with_page_layout(PageLayoutStrategy::Multi)
            .with_grouping(SectionGrouping::Position);
        let ir = Translator::new(options).translate(&tree).unwrap();
        let titles: Vec<&str> = ir.pages.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Header", "Main Content", "Sidebar"]);
        assert_eq!(ir.pages[0].sections[0].kind, SectionKind::Header);
    }

    #[test]
    fn test_multi_pages_by_hint() {
        let hinted = |mut node: CaptureNode, hint: &str| {
            node.metadata.export_hints = Some(ExportHints {
                preferred_layout: Some(hint.to_string()),
                ..Default::default()
            });
            node
        };
        let tree = CaptureTree::new(CaptureNode::container("root").with_children([
            metric_node("loose", "1"),
            hinted(chart_node("c1"), "Trends"),
            hinted(metric_node("m1", "2"), "Summary"),
            hinted(chart_node("c2"), "Trends"),
        ]));
        let options = TranslationOptions::default()
            .with_page_layout(PageLayoutStrategy::Multi)
            .with_grouping(SectionGrouping::Custom);
        let ir = Translator::new(options).translate(&tree).unwrap();
        let titles: Vec<&str> = ir.pages.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Trends", "Summary", "Other Content"]);
        assert_eq!(ir.pages[0].sections.len(), 2);
        assert_eq!(ir.pages[0].layout.columns, Some(2));
    }

    #[test]
    fn test_auto_titles_and_layouts() {
        let metrics: Vec<CaptureNode> = (0..7).map(|i| metric_node(&format!("m{}", i), "1")).collect();
        let tree = CaptureTree::new(
            CaptureNode::container("root")
                .with_children(metrics)
                .with_child(chart_node("c1")),
        );
        let ir = translate(&tree, PageLayoutStrategy::Auto);
        assert_eq!(ir.pages.len(), 2);
        assert_eq!(ir.pages[0].title, "Metrics");
        assert_eq!(ir.pages[0].layout.columns, Some(3));
        assert_eq!(ir.pages[0].layout.gap, Some(16.0));
        assert_eq!(ir.pages[1].title, "Dashboard Page 2");
        assert_eq!(ir.pages[1].metadata.tags, vec!["metric", "chart"]);
        assert_eq!(ir.pages[1].layout.columns, None);
        assert_eq!(ir.pages[1].metadata.export_priority, 2);
    }

    #[test]
    fn test_containers_and_widgets() {
        // a widget's children are part of the widget, not sections of their own
        let card = CaptureNode::widget("card", NodeSubtype::Metric)
            .with_child(CaptureNode::widget("inner", NodeSubtype::Text).with_text("x"));
        let untyped_text = CaptureNode::container("note").with_text("Footnote");
        let untyped_widget = CaptureNode::new("w", NodeKind::Widget).with_text("Inferred");
        let filter = CaptureNode::widget("f", NodeSubtype::Filter).with_text("Region");
        let tree = CaptureTree::new(
            CaptureNode::container("root").with_children([card, untyped_text, untyped_widget, filter]),
        );
        let ir = translate(&tree, PageLayoutStrategy::Single);
        let types: Vec<ContentType> = ir.sections().map(Section::content_type).collect();
        assert_eq!(types, vec![ContentType::Metric, ContentType::Text]);
    }

    #[test]
    fn test_metric_mapping() {
        let mut node = metric_node("m", "€1,500");
        if let Some(data) = node.properties.data.as_mut() {
            data.change = Some("+12.5%".to_string());
        }
        node.properties.style.color = Some("#123456".to_string());
        let m = metric(&node);
        assert_eq!(m.label, "KPI m");
        assert_eq!(m.unit.as_deref(), Some("€"));
        let change = m.change.unwrap();
        assert_eq!(change.value, 12.5);
        assert_eq!(change.direction, Direction::Up);
        assert!(change.percentage);
        assert_eq!(m.styling.color.as_deref(), Some("#123456"));

        let bare = metric(&CaptureNode::widget("b", NodeSubtype::Metric));
        assert_eq!((bare.label.as_str(), bare.value.as_str()), ("Metric", "0"));
        assert!(bare.unit.is_none());
    }

    #[test]
    fn test_parse_change() {
        let down = parse_change("-3 pts").unwrap();
        assert_eq!((down.value, down.direction, down.percentage), (-3.0, Direction::Down, false));
        assert_eq!(parse_change("0%").unwrap().direction, Direction::Neutral);
        assert_eq!(parse_change("4").unwrap().direction, Direction::Up);
        assert_eq!(parse_change("n/a").unwrap().value, 0.0);
        assert!(parse_change("  ").is_none());
    }

    #[test]
    fn test_chart_fallback_from_asset_usage() {
        let mut tree = dashboard();
        tree.structure.assets.images.insert(
            "img-c1".to_string(),
            ImageAsset {
                original_url: "blob:chart".to_string(),
                base64_data: Some("iVBORw0KGgo=".to_string()),
                mime_type: "image/png".to_string(),
                dimensions: None,
                usage: vec![AssetUsage {
                    node_id: "c1".to_string(),
                    property: "canvas".to_string(),
                }],
            },
        );
        let ir = translate(&tree, PageLayoutStrategy::Single);
        let chart = ir
            .sections()
            .find_map(|s| match s.primary() {
                Content::Chart(c) => Some(c),
                _ => None,
            })
            .unwrap();
        assert_eq!(chart.chart_type, "line");
        assert_eq!(chart.config.kind, "line");
        assert_eq!(chart.fallback.image.as_deref(), Some("iVBORw0KGgo="));
        assert_eq!(chart.fallback.description, "line visualization");
        assert!(chart.has_data());

        let bare = CaptureTree::new(
            CaptureNode::container("r").with_child(CaptureNode::widget("c", NodeSubtype::Chart)),
        );
        let ir = translate(&bare, PageLayoutStrategy::Single);
        match ir.pages[0].sections[0].primary() {
            Content::Chart(c) => {
                assert_eq!(c.chart_type, "unknown");
                assert_eq!(c.config.kind, "bar");
                assert_eq!(c.fallback.description, "Chart visualization");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_image_without_asset_is_skipped() {
        let tree = CaptureTree::new(
            CaptureNode::container("r").with_child(CaptureNode::widget("logo", NodeSubtype::Image)),
        );
        assert_eq!(translate(&tree, PageLayoutStrategy::Single).section_count(), 0);
    }

    #[test]
    fn test_table_mapping() {
        let t = table(&table_node("t"));
        assert_eq!(t.headers[1].key, "col_1");
        assert!(t.headers.iter().all(|h| h.sortable));
        assert_eq!(t.rows[0].id, "row_0");
        assert_eq!(t.config.page_size, 50);
        assert!(t.styling.striped && t.styling.bordered);
    }

    #[test]
    fn test_section_geometry_and_styling() {
        let mut node = metric_node("m", "1");
        node.properties.layout.left = Some(Length::Number(40.0));
        node.properties.layout.width = Some(Length::Text("320".to_string()));
        node.properties.layout.height = Some(Length::Text("12rem".to_string()));
        node.properties.style.z_index = Some(Length::Text("5".to_string()));
        node.properties.style.background_color = Some("#fafafa".to_string());
        let layout = section_layout(&node);
        assert_eq!((layout.position.x, layout.position.y), (40.0, 0.0));
        assert_eq!((layout.size.width, layout.size.height), (320.0, 100.0));
        assert_eq!(layout.z_index, 5);
        let styling = section_styling(&node);
        assert_eq!(styling.background.as_deref(), Some("#fafafa"));
        assert_eq!(styling.border.color, "#e0e0e0");
        assert_eq!(styling.opacity, 1.0);
    }

    #[test]
    fn test_interactions_only_when_preserved() {
        let mut node = chart_node("c1");
        node.metadata.interaction_ids = vec!["drill".to_string(), "missing".to_string()];
        let mut tree = CaptureTree::new(CaptureNode::container("r").with_child(node));
        tree.structure.interactions.insert(
            "drill".to_string(),
            Interaction {
                kind: "hover".to_string(),
                trigger: "mouseover".to_string(),
                action: "tooltip".to_string(),
                parameters: None,
            },
        );

        let plain = translate(&tree, PageLayoutStrategy::Single);
        assert!(plain.pages[0].sections[0].behavior.interactions.is_empty());

        let options = TranslationOptions {
            preserve_interactivity: true,
            ..TranslationOptions::default().with_page_layout(PageLayoutStrategy::Single)
        };
        let ir = Translator::new(options).translate(&tree).unwrap();
        let interactions = &ir.pages[0].sections[0].behavior.interactions;
        assert_eq!(interactions.len(), 2);
        assert_eq!(interactions[0].kind, "hover");
        assert_eq!(interactions[1].kind, "click");
        assert_eq!(interactions[1].action, "");
        assert_eq!(
            ir.export_config.interactivity_level.level,
            dashport_ir::config::InteractivityLevel::Full
        );
    }

    #[test]
    fn test_resources() {
        let mut tree = dashboard();
        tree.state.theme_configuration = Some(ThemeConfig {
            name: "dark".to_string(),
            colors: BTreeMap::from([("primary".to_string(), "#000000".to_string())]),
            fonts: BTreeMap::new(),
        });
        tree.state.filters.push(FilterState {
            filter_id: "region".to_string(),
            value: json!("North"),
            applied_at: String::new(),
        });
        tree.structure.assets.images.insert(
            "snap".to_string(),
            ImageAsset {
                original_url: "dashboard_snapshot".to_string(),
                base64_data: Some("AAAA".to_string()),
                mime_type: "image/png".to_string(),
                dimensions: None,
                usage: vec![],
            },
        );

        let resources = extract_resources(&tree);
        assert_eq!(resources.styles.primary(), "#000000");
        assert_eq!(resources.styles.secondary(), "#424046");
        assert_eq!(resources.data["filters"].data[0]["filterId"], "region");
        assert_eq!(resources.media["snap"].kind, MediaKind::Snapshot);
        assert!(resources.visual_snapshot().is_some());
        assert!(resources.templates.contains_key("default-chart"));
        assert!(resources.templates.contains_key("default-metric"));

        let empty = extract_resources(&CaptureTree::new(CaptureNode::container("r")));
        assert!(empty.data.is_empty());
        assert!(empty.media.is_empty());
    }

    #[test]
    fn test_export_config_follows_quality() {
        let options = TranslationOptions {
            quality: QualityLevel::Low,
            ..Default::default()
        };
        let ir = Translator::new(options).translate(&dashboard()).unwrap();
        assert_eq!(ir.export_config.quality, QualityLevel::Low);
        assert_eq!(ir.export_config.quality_settings.resolution, 72);
        assert!(!ir.export_config.quality_settings.antialiasing);
        assert!(ir.export_config.accessibility.include_alt_text);
    }

    #[test]
    fn test_scopes() {
        let options = TranslationOptions {
            scope: ExportScope::Selection {
                selection_ids: vec!["kpis".to_string(), "ghost".to_string()],
            },
            ..TranslationOptions::default().with_page_layout(PageLayoutStrategy::Single)
        };
        let ir = Translator::new(options).translate(&dashboard()).unwrap();
        assert_eq!(ir.section_count(), 2);

        let options = TranslationOptions {
            scope: ExportScope::Page {
                page_ids: vec!["page_1".to_string()],
            },
            ..TranslationOptions::default().with_page_layout(PageLayoutStrategy::Multi)
        };
        let ir = Translator::new(options).translate(&dashboard()).unwrap();
        assert_eq!(ir.pages.len(), 1);
        assert_eq!(ir.pages[0].title, "Analytics & Visualizations");
        assert_eq!(ir.pages[0].metadata.page_number, Some(1));
    }

    #[test]
    fn test_validation_errors() {
        let mut tree = dashboard();
        tree.version = "2.1.0".to_string();
        let err = Translator::default().translate(&tree).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TranslationVersionMismatch);

        let dup = CaptureTree::new(
            CaptureNode::container("root")
                .with_child(metric_node("m", "1"))
                .with_child(metric_node("m", "2")),
        );
        let err: ExportError = Translator::default().translate(&dup).unwrap_err().into();
        assert_eq!(err.code.as_u16(), 2001);
        assert!(!err.recoverable);

        let mut wide = table_node("t");
        if let Some(data) = wide.properties.data.as_mut() {
            data.rows.push(vec![CellValue::Null; 3]);
        }
        let err = Translator::default()
            .translate(&CaptureTree::new(CaptureNode::container("r").with_child(wide)))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::TranslationDataCorrupted);
    }

    #[test]
    fn test_deterministic() {
        let tree = dashboard();
        let translator = Translator::default();
        assert_eq!(translator.translate(&tree).unwrap(), translator.translate(&tree).unwrap());
    }
}
