//! IR to slide conversion
//!
//! Every compile builds a fresh [`Deck`]; nothing carries over between calls.

use chrono::Local;
use dashport_ir::document::{
    ChartContent, Content, Direction, HAlign, ImageContent, IrDocument, MetricContent, Page,
    Section, TableContent, TextContent,
};
use dashport_ir::media::{decode_image, DecodedImage};
use tracing::debug;

use crate::chart::NativeChart;
use crate::compiler::SlideSettings;
use crate::layout::{group_sections, SlideLayout, TABLE_AREA};
use crate::slide::{
    Anchor, ChartFrame, Deck, Frame, Picture, RectShape, Shape, Slide, TableCell, TableShape,
    TextBox, TextStyle,
};
use crate::theme::{hex_color, Theme};

/// Rows shown before a table is truncated
pub const MAX_TABLE_ROWS: usize = 20;

const TABLE_FONT_SIZE: f64 = 10.0;
const TABLE_MAX_ROW_HEIGHT: f64 = 0.37;
const TABLE_NOTE_HEIGHT: f64 = 0.3;
const MUTED: &str = "666666";
const UP_COLOR: &str = "16A34A";
const DOWN_COLOR: &str = "DC2626";

/// Build the deck for a document
pub fn build_deck(ir: &IrDocument, settings: &SlideSettings) -> Deck {
    let theme = Theme::from_styles(&ir.resources.styles);
    let mut builder = DeckBuilder {
        ir,
        settings,
        palette: theme.chart_colors(),
        theme,
        deck: Deck::new(ir.title()),
        snapshot: None,
    };
    builder.deck.subject = ir.document.description.clone();
    builder.deck.author = ir.document.author.name.clone();
    builder.deck.company = settings.company_name.clone();
    builder.deck.created = Some(ir.document.created.clone()).filter(|c| !c.is_empty());

    for page in &ir.pages {
        builder.add_page(page);
    }
    builder.add_end_slide();

    debug!(
        slides = builder.deck.slide_count(),
        charts = builder.deck.charts.len(),
        media = builder.deck.media.len(),
        "deck built"
    );
    builder.deck
}

struct DeckBuilder<'a> {
    ir: &'a IrDocument,
    settings: &'a SlideSettings,
    theme: Theme,
    palette: Vec<String>,
    deck: Deck,
    /// Media index of the embedded dashboard snapshot, once embedded
    snapshot: Option<(usize, Option<f64>)>,
}

impl DeckBuilder<'_> {
    fn add_page(&mut self, page: &Page) {
        if let Some((media, ratio)) = self.snapshot_media() {
            let mut slide = Slide::content_slide(title_of(page));
            let area = Frame::new(0.5, 1.0, 9.0, self.settings.slide_height() - 1.3);
            slide.push(Shape::Picture(Picture {
                frame: area.contain(ratio),
                media,
                description: "Dashboard snapshot".to_string(),
            }));
            self.deck.slides.push(slide);
            return;
        }

        for group in group_sections(&page.sections) {
            let layout = SlideLayout::select(&group);
            let mut slide = Slide::content_slide(title_of(page));
            debug!(page = %page.id, layout = layout.name(), sections = group.len(), "slide");

            for (section, frame) in group.iter().zip(layout.frames(group.len())) {
                self.place_section(&mut slide, section, layout, frame);
            }

            if self.settings.include_notes && !page.metadata.notes.trim().is_empty() {
                slide = slide.with_notes(page.metadata.notes.clone());
            }
            self.deck.slides.push(slide);
        }
    }

    /// Embed the whole-dashboard raster once and reuse it on every page
    fn snapshot_media(&mut self) -> Option<(usize, Option<f64>)> {
        if self.snapshot.is_none() {
            let (_, media) = self.ir.resources.visual_snapshot()?;
            let decoded = media.data.as_deref().and_then(decode_image)?;
            let ratio = decoded.aspect_ratio().or_else(|| {
                media
                    .dimensions
                    .filter(|d| d.height > 0.0)
                    .map(|d| d.width / d.height)
            });
            self.snapshot = Some((self.deck.add_media(decoded), ratio));
        }
        self.snapshot
    }

    fn place_section(&mut self, slide: &mut Slide, section: &Section, layout: SlideLayout, frame: Frame) {
        self.place_content(slide, section.primary(), layout, frame);
    }

    fn place_content(&mut self, slide: &mut Slide, content: &Content, layout: SlideLayout, frame: Frame) {
        match content {
            Content::Chart(chart) => {
                let frame = match layout {
                    SlideLayout::Flow => Frame::new(frame.x, frame.y, 4.0, frame.h),
                    _ => frame,
                };
                self.place_chart(slide, chart, frame);
            }
            Content::Table(table) => {
                let frame = match layout {
                    SlideLayout::Table => frame,
                    _ => Frame::new(frame.x, frame.y, TABLE_AREA.w, frame.h),
                };
                self.place_table(slide, table, frame);
            }
            Content::Metric(metric) => {
                let frame = match layout {
                    SlideLayout::MetricsGrid => frame,
                    _ => Frame::new(frame.x, frame.y, 3.0, 1.5),
                };
                self.place_metric(slide, metric, frame);
            }
            Content::Text(text) => {
                self.place_text(slide, text, Frame::new(frame.x, frame.y, frame.w, 0.5));
            }
            Content::Image(image) => {
                self.place_image(slide, image, Frame::new(frame.x, frame.y, 4.0, frame.h));
            }
            Content::Composite(composite) => {
                // items share the slot; only the first one is drawn
                if let Some(first) = composite.items.first() {
                    self.place_content(slide, first, layout, frame);
                }
            }
        }
    }

    /// Native chart, else the fallback raster, else a labelled placeholder
    fn place_chart(&mut self, slide: &mut Slide, chart: &ChartContent, frame: Frame) {
        if let Some(native) = NativeChart::from_content(chart, &self.palette) {
            let index = self.deck.add_chart(native);
            slide.push(Shape::Chart(ChartFrame {
                frame,
                chart: index,
            }));
            return;
        }

        if let Some(decoded) = chart.fallback.image.as_deref().and_then(|src| self.resolve_image(src)) {
            let ratio = decoded.aspect_ratio();
            let media = self.deck.add_media(decoded);
            slide.push(Shape::Picture(Picture {
                frame: frame.contain(ratio),
                media,
                description: chart.fallback.description.clone(),
            }));
            return;
        }

        slide.push(Shape::Rect(RectShape {
            frame,
            fill: "F5F5F5".to_string(),
            line: Some("CCCCCC".to_string()),
            rounded: false,
        }));
        slide.push(Shape::Text(TextBox {
            frame: Frame::new(frame.x, frame.y + frame.h / 2.0 - 0.25, frame.w, 0.5),
            text: format!("Chart: {}", chart.chart_type),
            style: TextStyle::sized(14.0, MUTED)
                .aligned(HAlign::Center)
                .anchored(Anchor::Middle),
        }));
    }

    fn place_table(&mut self, slide: &mut Slide, table: &TableContent, frame: Frame) {
        // headerless tables are sized by their widest row
        let columns = if table.headers.is_empty() {
            table.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
        } else {
            table.headers.len()
        };
        if columns == 0 {
            slide.push(Shape::Text(TextBox {
                frame: Frame::new(frame.x, frame.y, frame.w, 0.5),
                text: "No data".to_string(),
                style: TextStyle::sized(12.0, MUTED).italic(),
            }));
            return;
        }

        let truncated = table.rows.len() > MAX_TABLE_ROWS;
        let shown = table.rows.len().min(MAX_TABLE_ROWS);
        let header_rows = usize::from(!table.headers.is_empty());
        let available = if truncated {
            frame.h - TABLE_NOTE_HEIGHT
        } else {
            frame.h
        };
        let row_height = (available / (shown + header_rows) as f64).min(TABLE_MAX_ROW_HEIGHT);

        let mut rows = Vec::with_capacity(shown + header_rows);
        if header_rows > 0 {
            rows.push(
                table
                    .headers
                    .iter()
                    .map(|h| TableCell {
                        text: h.label.clone(),
                        bold: true,
                        color: "FFFFFF".to_string(),
                        fill: self.theme.primary.clone(),
                        align: HAlign::Center,
                    })
                    .collect(),
            );
        }
        for (i, row) in table.rows.iter().take(shown).enumerate() {
            let fill = if i % 2 == 0 { "FFFFFF" } else { "F5F5F5" };
            rows.push(
                (0..columns)
                    .map(|c| TableCell {
                        text: row.cells.get(c).map(ToString::to_string).unwrap_or_default(),
                        bold: false,
                        color: "000000".to_string(),
                        fill: fill.to_string(),
                        align: HAlign::Left,
                    })
                    .collect(),
            );
        }

        let height = row_height * rows.len() as f64;
        slide.push(Shape::Table(TableShape {
            frame: Frame::new(frame.x, frame.y, frame.w, height),
            column_widths: vec![frame.w / columns as f64; columns],
            row_height,
            font_size: TABLE_FONT_SIZE,
            rows,
        }));

        if truncated {
            slide.push(Shape::Text(TextBox {
                frame: Frame::new(frame.x, frame.y + height + 0.05, frame.w, TABLE_NOTE_HEIGHT - 0.05),
                text: format!(
                    "Note: Showing first {} of {} rows",
                    MAX_TABLE_ROWS,
                    table.rows.len()
                ),
                style: TextStyle::sized(8.0, MUTED).italic(),
            }));
        }
    }

    fn place_metric(&mut self, slide: &mut Slide, metric: &MetricContent, frame: Frame) {
        slide.push(Shape::Rect(RectShape {
            frame,
            fill: "F8F8F8".to_string(),
            line: Some("E0E0E0".to_string()),
            rounded: true,
        }));
        slide.push(Shape::Text(TextBox {
            frame: Frame::new(frame.x + 0.1, frame.y + 0.1, frame.w - 0.2, 0.4),
            text: metric.label.clone(),
            style: TextStyle::sized(12.0, MUTED),
        }));

        let value_color = metric
            .styling
            .color
            .as_deref()
            .and_then(hex_color)
            .unwrap_or_else(|| self.theme.primary.clone());
        slide.push(Shape::Text(TextBox {
            frame: Frame::new(frame.x + 0.1, frame.y + 0.5, frame.w - 0.2, 0.6),
            text: metric.value.clone(),
            style: TextStyle::sized(24.0, value_color)
                .bold()
                .aligned(HAlign::Center)
                .anchored(Anchor::Middle),
        }));

        if let Some(change) = &metric.change {
            let color = match change.direction {
                Direction::Up => UP_COLOR,
                Direction::Down => DOWN_COLOR,
                Direction::Neutral => MUTED,
            };
            slide.push(Shape::Text(TextBox {
                frame: Frame::new(frame.x + 0.1, frame.y + frame.h - 0.4, frame.w - 0.2, 0.3),
                text: change.indicator(),
                style: TextStyle::sized(10.0, color).aligned(HAlign::Right),
            }));
        }
    }

    fn place_text(&mut self, slide: &mut Slide, text: &TextContent, frame: Frame) {
        let f = &text.formatting;
        let style = TextStyle {
            size: f.font_size_pt().unwrap_or(12.0),
            bold: f.bold,
            italic: f.italic,
            color: f
                .color
                .as_deref()
                .and_then(hex_color)
                .unwrap_or_else(|| "000000".to_string()),
            font: f.font_family.clone(),
            align: f.alignment,
            anchor: Anchor::Top,
        };
        slide.push(Shape::Text(TextBox {
            frame,
            text: text.text.clone(),
            style,
        }));
    }

    fn place_image(&mut self, slide: &mut Slide, image: &ImageContent, frame: Frame) {
        match self.resolve_image(&image.src) {
            Some(decoded) => {
                let ratio = decoded.aspect_ratio().or_else(|| {
                    image
                        .dimensions
                        .filter(|d| d.height > 0.0)
                        .map(|d| d.width / d.height)
                });
                let media = self.deck.add_media(decoded);
                slide.push(Shape::Picture(Picture {
                    frame: frame.contain(ratio),
                    media,
                    description: image.alt.clone(),
                }));
            }
            None => {
                debug!(src_len = image.src.len(), "image did not decode, drawing placeholder");
                slide.push(Shape::Rect(RectShape {
                    frame,
                    fill: "F5F5F5".to_string(),
                    line: Some("CCCCCC".to_string()),
                    rounded: false,
                }));
                let label = if image.alt.is_empty() { "Image" } else { image.alt.as_str() };
                slide.push(Shape::Text(TextBox {
                    frame: Frame::new(frame.x, frame.y + frame.h / 2.0 - 0.25, frame.w, 0.5),
                    text: label.to_string(),
                    style: TextStyle::sized(12.0, MUTED)
                        .aligned(HAlign::Center)
                        .anchored(Anchor::Middle),
                }));
            }
        }
    }

    /// Inline payload first, then a media entry with a matching URL
    fn resolve_image(&self, src: &str) -> Option<DecodedImage> {
        decode_image(src).or_else(|| {
            self.ir
                .resources
                .media
                .values()
                .find(|m| m.url == src)
                .and_then(|m| m.data.as_deref())
                .and_then(decode_image)
        })
    }

    fn add_end_slide(&mut self) {
        let subtitle = format!(
            "Generated from {}\n{}",
            self.ir.title(),
            Local::now().format("%Y-%m-%d")
        );
        self.deck
            .slides
            .push(Slide::title_slide("Thank You", Some(subtitle)));
    }
}

fn title_of(page: &Page) -> Option<String> {
    Some(page.title.clone()).filter(|t| !t.is_empty())
}
