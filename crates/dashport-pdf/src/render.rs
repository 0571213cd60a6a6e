//! Section rendering and pagination
//!
//! Walks the IR page by page. Before each section the cursor is checked
//! against a fixed per-type height estimate and a new page is started when
//! the estimate does not fit above the footer.

use dashport_ir::document::{
    ChartContent, Content, Direction, HAlign, ImageContent, IrDocument, MetricContent, Section,
    TableContent, TextContent,
};
use dashport_ir::media::{decode_image, DecodedImage};
use dashport_ir::resources::{MediaResource, StyleDefinitions};
use dashport_ir::Watermark;

use crate::layout::{
    fit_line, wrap_text, Canvas, DrawOp, Geometry, ImageOp, Layout, LineOp, PdfSettings, RectOp,
    Rgb, TextOp, PX_TO_MM,
};

/// Space between consecutive sections
pub const SECTION_SPACING: f64 = 10.0;

const CHART_HEIGHT: f64 = 80.0;
const TABLE_HEADER_HEIGHT: f64 = 10.0;
const TABLE_ROW_HEIGHT: f64 = 8.0;
const TABLE_FONT_SIZE: f64 = 9.0;
const TABLE_NOTE_HEIGHT: f64 = 7.0;
const CELL_PADDING: f64 = 3.0;
const METRIC_WIDTH: f64 = 60.0;
const METRIC_HEIGHT: f64 = 30.0;
const IMAGE_MAX_HEIGHT: f64 = 100.0;
const DEFAULT_TEXT_SIZE: f64 = 11.0;

const UP_COLOR: Rgb = Rgb(22, 163, 74);
const DOWN_COLOR: Rgb = Rgb(220, 38, 38);

/// Height reserved for a section before it is drawn
pub fn estimate_height(content: &Content) -> f64 {
    match content {
        Content::Chart(_) => 90.0,
        Content::Table(_) => 100.0,
        Content::Metric(_) => 40.0,
        Content::Text(_) => 30.0,
        Content::Image(_) => 110.0,
        Content::Composite(_) => 50.0,
    }
}

/// Document colours
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub primary: Rgb,
    pub secondary: Rgb,
    pub accent: Rgb,
    pub text: Rgb,
}

impl Theme {
    pub fn from_styles(styles: &StyleDefinitions) -> Self {
        let pick = |hex: &str, fallback: Rgb| Rgb::from_hex(hex).unwrap_or(fallback);
        Self {
            primary: pick(styles.primary(), Rgb(0x9e, 0x1f, 0x63)),
            secondary: pick(styles.secondary(), Rgb(0x42, 0x40, 0x46)),
            accent: pick(styles.accent(), Rgb(0x00, 0x5b, 0x8c)),
            text: styles
                .color("text")
                .and_then(Rgb::from_hex)
                .unwrap_or(Rgb::BLACK),
        }
    }
}

/// Lay out the whole document
pub fn layout_document(ir: &IrDocument, settings: &PdfSettings) -> Layout {
    let geometry = Geometry::from_settings(settings);
    let theme = Theme::from_styles(&ir.resources.styles);
    let mut canvas = Canvas::new(geometry);
    let snapshot = ir
        .resources
        .visual_snapshot()
        .map(|(_, media)| media);

    if ir.pages.is_empty() {
        canvas.begin_page();
        let title = if ir.title().is_empty() {
            "Dashboard Export"
        } else {
            ir.title()
        };
        place_page_title(&mut canvas, &theme, title);
    }

    for page in &ir.pages {
        canvas.begin_page();

        if let Some(media) = snapshot {
            place_snapshot(&mut canvas, media);
            continue;
        }

        if !page.title.is_empty() {
            place_page_title(&mut canvas, &theme, &page.title);
        }
        for section in &page.sections {
            place_section(&mut canvas, &theme, ir, section);
        }
    }

    let mut layout = canvas.finish();
    add_page_furniture(&mut layout, settings, &theme, ir.export_config.watermark.as_ref());
    layout
}

fn place_page_title(canvas: &mut Canvas, theme: &Theme, title: &str) {
    let g = *canvas.geometry();
    let lines = wrap_text(title, g.content_width(), 24.0, true);
    for (i, line) in lines.iter().enumerate() {
        canvas.push(DrawOp::Text(TextOp {
            x: g.margins.left,
            y: canvas.y() + i as f64 * 8.0,
            width: g.content_width(),
            text: line.clone(),
            size: 24.0,
            bold: true,
            italic: false,
            color: theme.primary,
            align: HAlign::Left,
        }));
    }
    canvas.advance(15.0 + (lines.len().saturating_sub(1)) as f64 * 8.0);
}

fn place_section(canvas: &mut Canvas, theme: &Theme, ir: &IrDocument, section: &Section) {
    let content = section.primary();
    canvas.ensure_space(estimate_height(content));
    place_content(canvas, theme, ir, content);
    canvas.advance(SECTION_SPACING);
}

fn place_content(canvas: &mut Canvas, theme: &Theme, ir: &IrDocument, content: &Content) {
    match content {
        Content::Chart(chart) => place_chart(canvas, chart),
        Content::Table(table) => place_table(canvas, theme, table),
        Content::Metric(metric) => place_metric(canvas, theme, metric),
        Content::Text(text) => place_text(canvas, theme, text),
        Content::Image(image) => place_image(canvas, ir, image),
        Content::Composite(composite) => {
            for (i, item) in composite.items.iter().enumerate() {
                if i > 0 {
                    canvas.ensure_space(estimate_height(item));
                }
                place_content(canvas, theme, ir, item);
            }
        }
    }
}

fn place_chart(canvas: &mut Canvas, chart: &ChartContent) {
    let g = *canvas.geometry();
    let width = g.content_width();
    let y = canvas.y();

    match chart.fallback.image.as_deref().and_then(decode_image) {
        Some(image) => {
            let ext = image.extension();
            let name = canvas.embed(image.bytes, ext);
            canvas.push(DrawOp::Image(ImageOp {
                x: g.margins.left,
                y,
                width,
                height: CHART_HEIGHT,
                name,
            }));
        }
        None => {
            canvas.push(DrawOp::Rect(RectOp {
                x: g.margins.left,
                y,
                width,
                height: CHART_HEIGHT,
                fill: None,
                stroke: Some(Rgb::gray(200)),
                radius: 0.0,
            }));
            canvas.push(centered_text(
                &g,
                y + CHART_HEIGHT / 2.0 - 5.0,
                format!("{} Chart", chart.chart_type.to_uppercase()),
                14.0,
                Rgb::gray(150),
            ));
            if !chart.fallback.description.is_empty() {
                canvas.push(centered_text(
                    &g,
                    y + CHART_HEIGHT / 2.0 + 5.0,
                    chart.fallback.description.clone(),
                    10.0,
                    Rgb::gray(150),
                ));
            }
        }
    }

    canvas.advance(CHART_HEIGHT);
}

fn centered_text(g: &Geometry, y: f64, text: String, size: f64, color: Rgb) -> DrawOp {
    DrawOp::Text(TextOp {
        x: g.margins.left,
        y,
        width: g.content_width(),
        text,
        size,
        bold: false,
        italic: false,
        color,
        align: HAlign::Center,
    })
}

/// How many rows fit below the header, reserving room for the note when
/// the table has to be cut
pub fn visible_rows(total: usize, available: f64) -> usize {
    let fit = |space: f64| (space.max(0.0) / TABLE_ROW_HEIGHT).floor() as usize;
    if fit(available) >= total {
        total
    } else {
        fit(available - TABLE_NOTE_HEIGHT).min(total)
    }
}

fn place_table(canvas: &mut Canvas, theme: &Theme, table: &TableContent) {
    let g = *canvas.geometry();
    let start_y = canvas.y();
    let width = g.content_width();

    let columns = table
        .headers
        .len()
        .max(table.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0))
        .max(1);
    let col_width = width / columns as f64;

    canvas.push(DrawOp::Rect(RectOp {
        x: g.margins.left,
        y: start_y,
        width,
        height: TABLE_HEADER_HEIGHT,
        fill: Some(theme.primary),
        stroke: None,
        radius: 0.0,
    }));
    for (i, header) in table.headers.iter().enumerate() {
        canvas.push(DrawOp::Text(TextOp {
            x: g.margins.left + i as f64 * col_width + CELL_PADDING,
            y: start_y + 3.0,
            width: col_width - CELL_PADDING * 2.0,
            text: fit_line(&header.label, col_width - CELL_PADDING * 2.0, TABLE_FONT_SIZE),
            size: TABLE_FONT_SIZE,
            bold: true,
            italic: false,
            color: Rgb::WHITE,
            align: HAlign::Left,
        }));
    }
    canvas.advance(TABLE_HEADER_HEIGHT);

    let shown = visible_rows(table.rows.len(), canvas.remaining());
    for (i, row) in table.rows.iter().take(shown).enumerate() {
        let y = canvas.y();
        if i % 2 == 1 {
            canvas.push(DrawOp::Rect(RectOp {
                x: g.margins.left,
                y,
                width,
                height: TABLE_ROW_HEIGHT,
                fill: Some(Rgb::gray(245)),
                stroke: None,
                radius: 0.0,
            }));
        }
        for (c, cell) in row.cells.iter().take(columns).enumerate() {
            let text = cell.to_string();
            if text.is_empty() {
                continue;
            }
            canvas.push(DrawOp::Text(TextOp {
                x: g.margins.left + c as f64 * col_width + CELL_PADDING,
                y: y + 2.0,
                width: col_width - CELL_PADDING * 2.0,
                text: fit_line(&text, col_width - CELL_PADDING * 2.0, TABLE_FONT_SIZE),
                size: TABLE_FONT_SIZE,
                bold: false,
                italic: false,
                color: theme.text,
                align: HAlign::Left,
            }));
        }
        canvas.advance(TABLE_ROW_HEIGHT);
    }

    let end_y = canvas.y();
    canvas.push(DrawOp::Rect(RectOp {
        x: g.margins.left,
        y: start_y,
        width,
        height: end_y - start_y,
        fill: None,
        stroke: Some(Rgb::gray(200)),
        radius: 0.0,
    }));
    for c in 1..columns {
        let x = g.margins.left + c as f64 * col_width;
        canvas.push(DrawOp::Line(LineOp {
            x1: x,
            y1: start_y,
            x2: x,
            y2: end_y,
            color: Rgb::gray(200),
            thickness: 0.5,
        }));
    }

    if table.rows.len() > shown {
        canvas.advance(2.0);
        canvas.push(DrawOp::Text(TextOp {
            x: g.margins.left,
            y: canvas.y(),
            width,
            text: format!("Showing {} of {} rows", shown, table.rows.len()),
            size: 8.0,
            bold: false,
            italic: true,
            color: Rgb::gray(100),
            align: HAlign::Left,
        }));
        canvas.advance(5.0);
    }
}

fn place_metric(canvas: &mut Canvas, theme: &Theme, metric: &MetricContent) {
    let g = *canvas.geometry();
    let x = g.margins.left;
    let y = canvas.y();

    canvas.push(DrawOp::Rect(RectOp {
        x,
        y,
        width: METRIC_WIDTH,
        height: METRIC_HEIGHT,
        fill: Some(Rgb::gray(248)),
        stroke: Some(Rgb::gray(224)),
        radius: 3.0,
    }));
    canvas.push(DrawOp::Text(TextOp {
        x: x + 5.0,
        y: y + 4.0,
        width: METRIC_WIDTH - 10.0,
        text: fit_line(&metric.label, METRIC_WIDTH - 10.0, 10.0),
        size: 10.0,
        bold: false,
        italic: false,
        color: Rgb::gray(100),
        align: HAlign::Left,
    }));
    canvas.push(DrawOp::Text(TextOp {
        x,
        y: y + 12.0,
        width: METRIC_WIDTH,
        text: fit_line(&metric.value, METRIC_WIDTH - 4.0, 18.0),
        size: 18.0,
        bold: true,
        italic: false,
        color: metric
            .styling
            .color
            .as_deref()
            .and_then(Rgb::from_hex)
            .unwrap_or(theme.primary),
        align: HAlign::Center,
    }));
    if let Some(change) = &metric.change {
        let color = match change.direction {
            Direction::Up => UP_COLOR,
            Direction::Down => DOWN_COLOR,
            Direction::Neutral => Rgb::gray(100),
        };
        canvas.push(DrawOp::Text(TextOp {
            x: x + 5.0,
            y: y + METRIC_HEIGHT - 8.0,
            width: METRIC_WIDTH - 10.0,
            text: change.indicator(),
            size: 9.0,
            bold: false,
            italic: false,
            color,
            align: HAlign::Right,
        }));
    }

    canvas.advance(METRIC_HEIGHT);
}

fn place_text(canvas: &mut Canvas, theme: &Theme, text: &TextContent) {
    let g = *canvas.geometry();
    let fmt = &text.formatting;
    let size = fmt.font_size_pt().unwrap_or(DEFAULT_TEXT_SIZE);
    let line_height = size * 0.5;
    let color = fmt
        .color
        .as_deref()
        .and_then(Rgb::from_hex)
        .unwrap_or(theme.text);

    for line in wrap_text(&text.text, g.content_width(), size, fmt.bold) {
        canvas.ensure_space(line_height);
        canvas.push(DrawOp::Text(TextOp {
            x: g.margins.left,
            y: canvas.y(),
            width: g.content_width(),
            text: line,
            size,
            bold: fmt.bold,
            italic: fmt.italic,
            color,
            align: fmt.alignment,
        }));
        canvas.advance(line_height);
    }
    canvas.advance(5.0);
}

/// Resolve an image source to bytes: inline payload first, then a media
/// entry whose URL matches
fn resolve_image(ir: &IrDocument, src: &str) -> Option<DecodedImage> {
    decode_image(src).or_else(|| {
        ir.resources
            .media
            .values()
            .find(|m| m.url == src)
            .and_then(|m| m.data.as_deref())
            .and_then(decode_image)
    })
}

/// Scale `(width, height)` down to fit the box, keeping the aspect ratio
pub fn fit_within(width: f64, height: f64, max_width: f64, max_height: f64) -> (f64, f64) {
    let (mut w, mut h) = (width, height);
    if w > max_width {
        h *= max_width / w;
        w = max_width;
    }
    if h > max_height {
        w *= max_height / h;
        h = max_height;
    }
    (w, h)
}

fn place_image(canvas: &mut Canvas, ir: &IrDocument, image: &ImageContent) {
    let g = *canvas.geometry();
    let x = g.margins.left;
    let y = canvas.y();

    let Some(decoded) = resolve_image(ir, &image.src) else {
        tracing::debug!(src_len = image.src.len(), "image did not decode, drawing placeholder");
        canvas.push(DrawOp::Rect(RectOp {
            x,
            y,
            width: 100.0,
            height: 60.0,
            fill: Some(Rgb::gray(240)),
            stroke: None,
            radius: 0.0,
        }));
        canvas.push(DrawOp::Text(TextOp {
            x,
            y: y + 27.0,
            width: 100.0,
            text: "Image".to_string(),
            size: 10.0,
            bold: false,
            italic: false,
            color: Rgb::gray(150),
            align: HAlign::Center,
        }));
        canvas.advance(60.0);
        return;
    };

    let natural = image
        .dimensions
        .map(|d| (d.width, d.height))
        .or_else(|| decoded.dimensions.map(|(w, h)| (w as f64, h as f64)))
        .filter(|(w, h)| *w > 0.0 && *h > 0.0)
        .map(|(w, h)| (w * PX_TO_MM, h * PX_TO_MM))
        .unwrap_or((g.content_width(), IMAGE_MAX_HEIGHT));
    let (width, height) = fit_within(natural.0, natural.1, g.content_width(), IMAGE_MAX_HEIGHT);

    let ext = decoded.extension();
    let name = canvas.embed(decoded.bytes, ext);
    canvas.push(DrawOp::Image(ImageOp {
        x,
        y,
        width,
        height,
        name,
    }));
    canvas.advance(height);
}

/// Replace the page body with the whole-dashboard raster, scaled down to
/// the printable area and centred horizontally
fn place_snapshot(canvas: &mut Canvas, media: &MediaResource) {
    let g = *canvas.geometry();
    canvas.mark_snapshot();
    let max_width = g.content_width();
    let max_height = g.height - g.margins.top - g.margins.bottom;

    let Some(decoded) = media.data.as_deref().and_then(decode_image) else {
        tracing::warn!("dashboard snapshot did not decode, writing title instead");
        canvas.push(DrawOp::Text(TextOp {
            x: g.margins.left,
            y: g.height / 2.0,
            width: max_width,
            text: "Dashboard Export".to_string(),
            size: 14.0,
            bold: false,
            italic: false,
            color: Rgb::BLACK,
            align: HAlign::Center,
        }));
        return;
    };

    let (w, h) = decoded
        .dimensions
        .map(|(w, h)| (w as f64 * PX_TO_MM, h as f64 * PX_TO_MM))
        .or_else(|| {
            media
                .dimensions
                .map(|d| (d.width * PX_TO_MM, d.height * PX_TO_MM))
        })
        .filter(|(w, h)| *w > 0.0 && *h > 0.0)
        .unwrap_or((max_width, max_height));
    let scale = (max_width / w).min(max_height / h).min(1.0);
    let (width, height) = (w * scale, h * scale);

    let ext = decoded.extension();
    let name = canvas.embed(decoded.bytes, ext);
    canvas.push(DrawOp::Image(ImageOp {
        x: g.margins.left + (max_width - width) / 2.0,
        y: g.margins.top,
        width,
        height,
        name,
    }));
}

/// Header rule, footer rule with page numbers, and the watermark
fn add_page_furniture(
    layout: &mut Layout,
    settings: &PdfSettings,
    theme: &Theme,
    watermark: Option<&Watermark>,
) {
    let g = layout.geometry;
    let total = layout.pages.len();

    for (i, page) in layout.pages.iter_mut().enumerate() {
        if let Some(mark) = watermark {
            page.ops.push(DrawOp::Watermark {
                text: mark.text.clone(),
                opacity: mark.opacity,
            });
        }

        if settings.header && !page.snapshot {
            let y = g.margins.top - 5.0 + g.header_height;
            page.ops.push(DrawOp::Line(LineOp {
                x1: g.margins.left,
                y1: y,
                x2: g.width - g.margins.right,
                y2: y,
                color: theme.primary,
                thickness: 1.4,
            }));
        }

        if settings.footer {
            let y = g.height - g.margins.bottom;
            page.ops.push(DrawOp::Line(LineOp {
                x1: g.margins.left,
                y1: y,
                x2: g.width - g.margins.right,
                y2: y,
                color: theme.secondary,
                thickness: 0.7,
            }));
            page.ops.push(DrawOp::Text(TextOp {
                x: g.margins.left,
                y: y + 2.0,
                width: g.content_width(),
                text: format!("Page {} of {}", i + 1, total),
                size: 9.0,
                bold: false,
                italic: false,
                color: theme.secondary,
                align: HAlign::Center,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashport_ir::document::{
        CellValue, ChartConfig, ChartData, ChartFallback, MetricChange, MetricStyling, Page,
        PageKind, PageLayout, PageMetadata, TableConfig, TableHeader, TableRow, TableStyling,
        TextFormatting,
    };

    fn page(sections: Vec<Section>) -> Page {
        Page {
            id: "p1".to_string(),
            title: "Overview".to_string(),
            kind: PageKind::Dashboard,
            layout: PageLayout::flow(20.0),
            sections,
            metadata: PageMetadata::default(),
        }
    }

    fn table(rows: usize) -> Content {
        Content::Table(TableContent {
            headers: vec![
                TableHeader {
                    key: "col_0".to_string(),
                    label: "Region".to_string(),
                    sortable: true,
                },
                TableHeader {
                    key: "col_1".to_string(),
                    label: "Sales".to_string(),
                    sortable: true,
                },
            ],
            rows: (0..rows)
                .map(|i| TableRow {
                    id: format!("row_{}", i),
                    cells: vec![CellValue::from(format!("R{}", i)), CellValue::Number(i as f64)],
                })
                .collect(),
            config: TableConfig {
                page_size: 50,
                current_page: 1,
            },
            styling: TableStyling {
                striped: true,
                bordered: true,
                hover: true,
                compact: false,
            },
        })
    }

    fn metric(label: &str) -> Content {
        Content::Metric(MetricContent {
            label: label.to_string(),
            value: "42".to_string(),
            unit: None,
            change: Some(MetricChange {
                value: 5.0,
                direction: Direction::Up,
                percentage: true,
            }),
            styling: MetricStyling::default(),
        })
    }

    #[test]
    fn test_estimates() {
        assert_eq!(estimate_height(&table(1)), 100.0);
        assert_eq!(estimate_height(&metric("m")), 40.0);
    }

    #[test]
    fn test_empty_document_gets_title_page() {
        let ir = IrDocument::new("Quarterly");
        let layout = layout_document(&ir, &PdfSettings::default());
        assert_eq!(layout.page_count(), 1);
        assert!(layout.contains_text("Quarterly"));
        assert!(layout.contains_text("Page 1 of 1"));
    }

    #[test]
    fn test_long_table_is_truncated_with_note() {
        let mut ir = IrDocument::new("Tables");
        ir.pages.push(page(vec![Section::new("t", table(200))]));
        let layout = layout_document(&ir, &PdfSettings::default());

        let note = layout
            .pages
            .iter()
            .flat_map(|p| p.texts())
            .find(|t| t.starts_with("Showing "))
            .expect("truncation note")
            .to_string();
        let numbers: Vec<usize> = note
            .split_whitespace()
            .filter_map(|w| w.parse().ok())
            .collect();
        assert_eq!(numbers.len(), 2);
        assert!(numbers[0] < numbers[1]);
        assert_eq!(numbers[1], 200);
    }

    #[test]
    fn test_short_table_has_no_note() {
        let mut ir = IrDocument::new("Tables");
        ir.pages.push(page(vec![Section::new("t", table(3))]));
        let layout = layout_document(&ir, &PdfSettings::default());
        assert!(!layout.contains_text("Showing"));
        assert!(layout.contains_text("R2"));
    }

    #[test]
    fn test_sections_paginate() {
        let mut ir = IrDocument::new("Metrics");
        let sections = (0..12).map(|i| Section::new(format!("m{}", i), metric("KPI"))).collect();
        ir.pages.push(page(sections));
        let layout = layout_document(&ir, &PdfSettings::default());
        // 12 metrics at 40mm each cannot fit in 227mm of content height
        assert!(layout.page_count() >= 2);
        assert!(layout.contains_text(&format!("Page 1 of {}", layout.page_count())));
        assert!(layout.contains_text("↑ 5%"));
    }

    #[test]
    fn test_chart_placeholder_without_fallback() {
        let mut ir = IrDocument::new("Charts");
        let chart = Content::Chart(ChartContent {
            chart_type: "line".to_string(),
            data: ChartData::default(),
            config: ChartConfig {
                kind: "line".to_string(),
                options: serde_json::Value::Null,
            },
            fallback: ChartFallback {
                image: None,
                description: "line visualization".to_string(),
            },
        });
        ir.pages.push(page(vec![Section::new("c", chart)]));
        let layout = layout_document(&ir, &PdfSettings::default());
        assert!(layout.contains_text("LINE Chart"));
        assert!(layout.contains_text("line visualization"));
        assert!(layout.images.is_empty());
    }

    #[test]
    fn test_image_placeholder_on_bad_source() {
        let mut ir = IrDocument::new("Images");
        let image = Content::Image(ImageContent {
            src: "https://example.com/x.png".to_string(),
            alt: String::new(),
            dimensions: None,
        });
        ir.pages.push(page(vec![Section::new("i", image)]));
        let layout = layout_document(&ir, &PdfSettings::default());
        assert!(layout.contains_text("Image"));
    }

    #[test]
    fn test_text_alignment_and_color() {
        let mut ir = IrDocument::new("Text");
        let text = Content::Text(TextContent {
            text: "Centered note".to_string(),
            formatting: TextFormatting {
                color: Some("#112233".to_string()),
                alignment: HAlign::Center,
                ..Default::default()
            },
        });
        ir.pages.push(page(vec![Section::new("x", text)]));
        let layout = layout_document(&ir, &PdfSettings::default());
        let op = layout.pages[0]
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text(t) if t.text == "Centered note" => Some(t.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(op.align, HAlign::Center);
        assert_eq!(op.color, Rgb(0x11, 0x22, 0x33));
    }

    #[test]
    fn test_fit_within_keeps_ratio() {
        let (w, h) = fit_within(400.0, 200.0, 170.0, 100.0);
        assert_eq!(w, 170.0);
        assert!((h - 85.0).abs() < 1e-9);
        let (w, h) = fit_within(100.0, 400.0, 170.0, 100.0);
        assert_eq!(h, 100.0);
        assert!((w - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_visible_rows() {
        assert_eq!(visible_rows(5, 100.0), 5);
        assert_eq!(visible_rows(50, 100.0), 11);
        assert_eq!(visible_rows(50, 0.0), 0);
    }
}
