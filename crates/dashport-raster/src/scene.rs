//! What the image shows, before layout.
//!
//! A scene is either a captured whole-dashboard raster, reproduced as is, or
//! a board of blocks collected from a filtered capture subtree or from the
//! IR pages.

use dashport_ir::capture::{CaptureNode, DataProperties};
use dashport_ir::document::{ChartContent, Content, ImageContent};
use dashport_ir::media::{decode_image, DecodedImage};
use dashport_ir::{CaptureTree, IrDocument, NodeSubtype};

/// Rows shown per table before the remainder is summarised
pub const MAX_TABLE_ROWS: usize = 12;

#[derive(Debug, Clone)]
pub enum Scene {
    /// The whole-dashboard raster, drawn full-bleed
    Snapshot(DecodedImage),
    Board(Board),
}

/// Blocks under a title header, in reading order
#[derive(Debug, Clone, Default)]
pub struct Board {
    pub title: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub id: String,
    pub body: Body,
    /// Effective opacity, 0 to 1
    pub opacity: f64,
}

#[derive(Debug, Clone)]
pub enum Body {
    Metric {
        label: String,
        value: String,
        change: Option<String>,
    },
    Chart(ChartGlyph),
    Table {
        caption: Option<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        total_rows: usize,
    },
    Text {
        text: String,
        bold: bool,
    },
    Image {
        image: Option<DecodedImage>,
        alt: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphKind {
    Bar,
    Line,
    Pie,
    Doughnut,
}

impl GlyphKind {
    pub fn from_chart_type(chart_type: &str) -> Self {
        match chart_type.trim().to_ascii_lowercase().as_str() {
            "line" | "area" | "scatter" => Self::Line,
            "pie" | "polararea" => Self::Pie,
            "doughnut" => Self::Doughnut,
            _ => Self::Bar,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub values: Vec<Option<f64>>,
    pub color: Option<String>,
}

/// A chart reduced to what can be drawn as simple shapes
#[derive(Debug, Clone)]
pub struct ChartGlyph {
    pub kind: GlyphKind,
    pub chart_type: String,
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    pub fallback: Option<DecodedImage>,
    pub description: String,
}

impl ChartGlyph {
    pub fn has_data(&self) -> bool {
        self.series
            .iter()
            .any(|s| s.values.iter().any(|v| v.is_some_and(f64::is_finite)))
    }
}

impl Block {
    fn new(id: impl Into<String>, body: Body, opacity: f64) -> Self {
        Self {
            id: id.into(),
            body,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }
}

/// Collect blocks from an already filtered capture subtree
pub fn board_from_capture(capture: &CaptureTree, root: &CaptureNode, title: &str) -> Board {
    let mut board = Board {
        title: title.to_string(),
        blocks: Vec::new(),
    };
    visit(capture, root, 1.0, &mut board.blocks);
    board
}

fn visit(capture: &CaptureTree, node: &CaptureNode, inherited: f64, out: &mut Vec<Block>) {
    let opacity = inherited * node.properties.style.opacity.unwrap_or(1.0).clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return;
    }

    if let Some(subtype) = node.subtype {
        if let Some(body) = captured_body(capture, node, subtype) {
            out.push(Block::new(node.id.as_str(), body, opacity));
        }
        return;
    }

    if let Some(text) = node.text().map(str::trim).filter(|t| !t.is_empty()) {
        out.push(Block::new(
            node.id.as_str(),
            Body::Text {
                text: text.to_string(),
                bold: is_bold(node.properties.style.font_weight.as_deref()),
            },
            opacity,
        ));
    }
    for child in &node.children {
        visit(capture, child, opacity, out);
    }
}

fn is_bold(weight: Option<&str>) -> bool {
    match weight.map(str::trim) {
        Some("bold") | Some("bolder") => true,
        Some(w) => w.parse::<u32>().is_ok_and(|w| w >= 600),
        None => false,
    }
}

fn captured_body(capture: &CaptureTree, node: &CaptureNode, subtype: NodeSubtype) -> Option<Body> {
    let empty = DataProperties::default();
    let data = node.properties.data.as_ref().unwrap_or(&empty);
    let asset_image = || {
        capture
            .image_for_node(&node.id)
            .and_then(|(_, asset)| asset.base64_data.as_deref())
            .and_then(decode_image)
    };

    match subtype {
        NodeSubtype::Metric => Some(Body::Metric {
            label: data
                .label
                .clone()
                .or_else(|| node.text().map(str::to_string))
                .unwrap_or_default(),
            value: data.value.as_ref().map(ToString::to_string).unwrap_or_default(),
            change: data.change.clone().filter(|c| !c.trim().is_empty()),
        }),
        NodeSubtype::Chart => {
            let chart_type = data.chart_type.clone().unwrap_or_else(|| "unknown".to_string());
            let chart_data = data.chart_data.clone().unwrap_or_default();
            let series: Vec<Series> = chart_data
                .datasets
                .into_iter()
                .map(|d| Series {
                    label: d.label,
                    values: d.data,
                    color: d.color,
                })
                .collect();
            let title = data
                .label
                .clone()
                .or_else(|| series.first().map(|s| s.label.clone()))
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "Chart".to_string());
            Some(Body::Chart(ChartGlyph {
                kind: GlyphKind::from_chart_type(&chart_type),
                chart_type,
                title,
                labels: chart_data.labels,
                series,
                fallback: asset_image(),
                description: node.attribute("aria-label").unwrap_or_default().to_string(),
            }))
        }
        NodeSubtype::Table => {
            let caption = node
                .attribute("aria-label")
                .or_else(|| node.attribute("caption"))
                .map(str::to_string)
                .or_else(|| data.label.clone());
            let rows: Vec<Vec<String>> = data
                .rows
                .iter()
                .map(|r| r.iter().map(ToString::to_string).collect())
                .collect();
            Some(table_body(caption, data.headers.clone(), rows))
        }
        NodeSubtype::Text => {
            let text = node
                .text()
                .map(str::to_string)
                .unwrap_or_else(|| descendant_text(node));
            (!text.trim().is_empty()).then(|| Body::Text {
                text: text.trim().to_string(),
                bold: is_bold(node.properties.style.font_weight.as_deref()),
            })
        }
        NodeSubtype::Image => Some(Body::Image {
            image: asset_image(),
            alt: node
                .attribute("alt")
                .or_else(|| node.text())
                .unwrap_or("Image")
                .to_string(),
        }),
        NodeSubtype::Filter => None,
    }
}

fn descendant_text(node: &CaptureNode) -> String {
    node.iter()
        .skip(1)
        .filter_map(|n| n.text().map(str::trim))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn table_body(caption: Option<String>, headers: Vec<String>, mut rows: Vec<Vec<String>>) -> Body {
    let total_rows = rows.len();
    rows.truncate(MAX_TABLE_ROWS);
    Body::Table {
        caption: caption.filter(|c| !c.trim().is_empty()),
        headers,
        rows,
        total_rows,
    }
}

/// Collect blocks from the IR, page by page.
///
/// Multi-page documents get a bold heading per page.
pub fn board_from_ir(ir: &IrDocument) -> Board {
    let mut board = Board {
        title: ir.title().to_string(),
        blocks: Vec::new(),
    };
    let headings = ir.pages.len() > 1;
    for page in &ir.pages {
        if headings && !page.title.trim().is_empty() {
            board.blocks.push(Block::new(
                page.id.as_str(),
                Body::Text {
                    text: page.title.clone(),
                    bold: true,
                },
                1.0,
            ));
        }
        for section in &page.sections {
            let opacity = section.styling.opacity;
            push_content(&mut board.blocks, &section.id, section.primary(), opacity);
        }
    }
    board
}

fn push_content(out: &mut Vec<Block>, id: &str, content: &Content, opacity: f64) {
    let body = match content {
        Content::Composite(composite) => {
            for (i, item) in composite.items.iter().enumerate() {
                push_content(out, &format!("{}-{}", id, i), item, opacity);
            }
            return;
        }
        Content::Metric(metric) => Body::Metric {
            label: metric.label.clone(),
            value: match &metric.unit {
                Some(unit) if !unit.is_empty() => format!("{} {}", metric.value.trim(), unit),
                _ => metric.value.clone(),
            },
            change: metric.change.as_ref().map(|c| c.indicator()),
        },
        Content::Chart(chart) => Body::Chart(ir_chart(chart)),
        Content::Table(table) => table_body(
            None,
            table.headers.iter().map(|h| h.label.clone()).collect(),
            table
                .rows
                .iter()
                .map(|r| r.cells.iter().map(ToString::to_string).collect())
                .collect(),
        ),
        Content::Text(text) => Body::Text {
            text: text.text.clone(),
            bold: text.formatting.bold,
        },
        Content::Image(image) => ir_image(image),
    };
    out.push(Block::new(id, body, opacity));
}

fn ir_chart(chart: &ChartContent) -> ChartGlyph {
    let title = chart.title().trim();
    ChartGlyph {
        kind: GlyphKind::from_chart_type(&chart.chart_type),
        chart_type: chart.chart_type.clone(),
        title: if title.is_empty() { "Chart" } else { title }.to_string(),
        labels: chart.data.labels.clone(),
        series: chart
            .data
            .datasets
            .iter()
            .map(|d| Series {
                label: d.label.clone(),
                values: d.data.clone(),
                color: d.color.clone(),
            })
            .collect(),
        fallback: chart.fallback.image.as_deref().and_then(decode_image),
        description: chart.fallback.description.clone(),
    }
}

fn ir_image(image: &ImageContent) -> Body {
    Body::Image {
        image: decode_image(&image.src),
        alt: if image.alt.is_empty() {
            "Image".to_string()
        } else {
            image.alt.clone()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashport_ir::capture::{CapturedChartData, CapturedDataset};
    use dashport_ir::document::{
        CompositeContent, Page, PageKind, PageLayout, PageMetadata, Section, TextContent,
    };
    use dashport_ir::CellValue;

    fn text(t: &str) -> Content {
        Content::Text(TextContent {
            text: t.to_string(),
            formatting: Default::default(),
        })
    }

    #[test]
    fn test_glyph_kind() {
        assert_eq!(GlyphKind::from_chart_type("Line"), GlyphKind::Line);
        assert_eq!(GlyphKind::from_chart_type("doughnut"), GlyphKind::Doughnut);
        assert_eq!(GlyphKind::from_chart_type("pie"), GlyphKind::Pie);
        assert_eq!(GlyphKind::from_chart_type("radar"), GlyphKind::Bar);
    }

    #[test]
    fn test_capture_blocks_in_order() {
        let chart = CaptureNode::widget("c1", NodeSubtype::Chart).with_data(DataProperties {
            chart_type: Some("line".to_string()),
            chart_data: Some(CapturedChartData {
                labels: vec!["Jan".to_string(), "Feb".to_string()],
                datasets: vec![CapturedDataset {
                    label: "Visits".to_string(),
                    data: vec![Some(1.0), Some(4.0)],
                    color: None,
                }],
            }),
            ..Default::default()
        });
        let metric = CaptureNode::widget("m1", NodeSubtype::Metric).with_data(DataProperties {
            label: Some("Revenue".to_string()),
            value: Some(CellValue::from("$1.2M")),
            ..Default::default()
        });
        let mut heading = CaptureNode::container("h").with_text("Overview");
        heading.properties.style.font_weight = Some("700".to_string());
        let filter = CaptureNode::widget("f", NodeSubtype::Filter).with_text("Region");

        let root = CaptureNode::container("root").with_children([heading, metric, filter, chart]);
        let tree = CaptureTree::new(root);
        let board = board_from_capture(&tree, tree.root(), "Board");

        let ids: Vec<&str> = board.blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["h", "m1", "c1"]);
        assert!(matches!(&board.blocks[0].body, Body::Text { bold: true, .. }));
        match &board.blocks[1].body {
            Body::Metric { label, value, .. } => {
                assert_eq!(label, "Revenue");
                assert_eq!(value, "$1.2M");
            }
            other => panic!("unexpected {:?}", other),
        }
        match &board.blocks[2].body {
            Body::Chart(glyph) => {
                assert_eq!(glyph.kind, GlyphKind::Line);
                assert_eq!(glyph.title, "Visits");
                assert!(glyph.has_data());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_opacity_inherits_and_invisible_skipped() {
        let mut faded = CaptureNode::container("faded");
        faded.properties.style.opacity = Some(0.5);
        let faded = faded.with_child(CaptureNode::container("t").with_text("Half"));
        let mut gone = CaptureNode::container("gone").with_text("Invisible");
        gone.properties.style.opacity = Some(0.0);

        let tree = CaptureTree::new(CaptureNode::container("root").with_children([faded, gone]));
        let board = board_from_capture(&tree, tree.root(), "B");
        assert_eq!(board.blocks.len(), 1);
        assert_eq!(board.blocks[0].opacity, 0.5);
    }

    #[test]
    fn test_table_rows_capped() {
        let table = CaptureNode::widget("t", NodeSubtype::Table).with_data(DataProperties {
            headers: vec!["N".to_string()],
            rows: (0..30).map(|i| vec![CellValue::Number(i as f64)]).collect(),
            ..Default::default()
        });
        let tree = CaptureTree::new(table);
        let board = board_from_capture(&tree, tree.root(), "B");
        match &board.blocks[0].body {
            Body::Table {
                rows, total_rows, ..
            } => {
                assert_eq!(rows.len(), MAX_TABLE_ROWS);
                assert_eq!(*total_rows, 30);
                assert_eq!(rows[3][0], "3");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_ir_pages_and_composites() {
        let page = |id: &str, sections: Vec<Section>| Page {
            id: id.to_string(),
            title: format!("Page {}", id),
            kind: PageKind::Dashboard,
            layout: PageLayout::flow(20.0),
            sections,
            metadata: PageMetadata::default(),
        };
        let mut ir = IrDocument::new("Doc");
        ir.pages = vec![
            page("a", vec![Section::new("s1", text("alpha"))]),
            page(
                "b",
                vec![Section::new(
                    "s2",
                    Content::Composite(CompositeContent {
                        items: vec![text("beta"), text("gamma")],
                    }),
                )],
            ),
        ];
        let board = board_from_ir(&ir);
        let ids: Vec<&str> = board.blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "s1", "b", "s2-0", "s2-1"]);
        assert_eq!(board.title, "Doc");
    }
}
