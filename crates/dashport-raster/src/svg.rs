//! Scene to SVG markup.
//!
//! Boards are laid out as a single flowing column: metric cards three to a
//! row, every other block full width. All coordinates are logical pixels;
//! the rasteriser applies the scale factor.

use dashport_ir::media::{to_data_url, DecodedImage};
use dashport_ir::{StyleDefinitions, Watermark};
use quick_xml::escape::escape;

use crate::scene::{Block, Board, Body, ChartGlyph, GlyphKind, Scene};

const MARGIN: f64 = 24.0;
const GAP: f64 = 16.0;
const HEADER_HEIGHT: f64 = 64.0;
const METRICS_PER_ROW: usize = 3;
const METRIC_HEIGHT: f64 = 96.0;
const CHART_HEIGHT: f64 = 280.0;
const CARD_TITLE: f64 = 32.0;
const ROW_HEIGHT: f64 = 26.0;
const LINE_HEIGHT: f64 = 22.0;
const IMAGE_MAX_HEIGHT: f64 = 360.0;
const PLACEHOLDER_HEIGHT: f64 = 160.0;
const MAX_TEXT_LINES: usize = 12;
const SNAPSHOT_DEFAULT: (f64, f64) = (1280.0, 800.0);

const BORDER: &str = "#E2E1E6";
const BODY_TEXT: &str = "#2D2D2D";
const MUTED_TEXT: &str = "#666666";
const STRIPE: &str = "#F7F6F9";
const PALETTE_EXTRA: [&str; 3] = ["#E05E3D", "#6B7280", "#10B981"];

/// Size, colour, weight and anchor of a text run
#[derive(Debug, Clone, Copy)]
struct Font {
    size: f64,
    fill: &'static str,
    bold: bool,
    anchor: &'static str,
}

impl Font {
    const fn new(size: f64, fill: &'static str, bold: bool) -> Self {
        Self {
            size,
            fill,
            bold,
            anchor: "start",
        }
    }

    const fn centered(self) -> Self {
        Self {
            anchor: "middle",
            ..self
        }
    }
}

const BOARD_TITLE: Font = Font::new(24.0, "#FFFFFF", true);
const CARD_HEADING: Font = Font::new(15.0, BODY_TEXT, true);
const METRIC_LABEL: Font = Font::new(13.0, MUTED_TEXT, false);
const METRIC_VALUE: Font = Font::new(26.0, BODY_TEXT, true);
const TABLE_HEAD: Font = Font::new(12.0, "#FFFFFF", true);
const TABLE_CELL: Font = Font::new(12.0, BODY_TEXT, false);
const NOTE: Font = Font::new(11.0, MUTED_TEXT, false);
const PLACEHOLDER: Font = Font::new(14.0, MUTED_TEXT, false).centered();

/// Colours and font of the rendered board
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub font: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_styles(&StyleDefinitions::default())
    }
}

impl Palette {
    pub fn from_styles(styles: &StyleDefinitions) -> Self {
        Self {
            primary: css_hex(styles.primary()).unwrap_or_else(|| "#9E1F63".to_string()),
            secondary: css_hex(styles.secondary()).unwrap_or_else(|| "#424046".to_string()),
            accent: css_hex(styles.accent()).unwrap_or_else(|| "#005B8C".to_string()),
            font: styles.font().to_string(),
        }
    }

    fn series_color(&self, index: usize, declared: Option<&str>) -> String {
        if let Some(color) = declared.and_then(css_hex) {
            return color;
        }
        let base = [
            self.primary.as_str(),
            self.secondary.as_str(),
            self.accent.as_str(),
        ];
        let all: Vec<&str> = base.into_iter().chain(PALETTE_EXTRA).collect();
        all[index % all.len()].to_string()
    }
}

/// `#rgb` / `#rrggbb` normalised to upper-case `#RRGGBB`
pub fn css_hex(css: &str) -> Option<String> {
    let hex = css.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let six = match hex.len() {
        6 => hex.to_string(),
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        _ => return None,
    };
    Some(format!("#{}", six.to_ascii_uppercase()))
}

/// A block with its computed frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Board layout: one frame per block plus the canvas size
#[derive(Debug, Clone, PartialEq)]
pub struct BoardLayout {
    pub width: f64,
    pub height: f64,
    pub frames: Vec<Frame>,
}

/// Place the blocks of a board on a canvas `width` wide
pub fn layout_board(board: &Board, width: f64) -> BoardLayout {
    let inner = width - 2.0 * MARGIN;
    let metric_width = (inner - GAP * (METRICS_PER_ROW - 1) as f64) / METRICS_PER_ROW as f64;

    let mut frames = Vec::with_capacity(board.blocks.len());
    let mut y = HEADER_HEIGHT + MARGIN;
    let mut column = 0;

    for block in &board.blocks {
        if let Body::Metric { .. } = block.body {
            if column == METRICS_PER_ROW {
                y += METRIC_HEIGHT + GAP;
                column = 0;
            }
            frames.push(Frame {
                x: MARGIN + column as f64 * (metric_width + GAP),
                y,
                width: metric_width,
                height: METRIC_HEIGHT,
            });
            column += 1;
            continue;
        }
        if column > 0 {
            y += METRIC_HEIGHT + GAP;
            column = 0;
        }
        let height = block_height(block, inner);
        frames.push(Frame {
            x: MARGIN,
            y,
            width: inner,
            height,
        });
        y += height + GAP;
    }
    if column > 0 {
        y += METRIC_HEIGHT + GAP;
    }

    BoardLayout {
        width,
        height: (y - GAP + MARGIN).max(HEADER_HEIGHT + 2.0 * MARGIN),
        frames,
    }
}

fn block_height(block: &Block, width: f64) -> f64 {
    match &block.body {
        Body::Metric { .. } => METRIC_HEIGHT,
        Body::Chart(_) => CHART_HEIGHT,
        Body::Table {
            caption,
            rows,
            total_rows,
            ..
        } => {
            let mut lines = 1 + rows.len();
            if *total_rows > rows.len() {
                lines += 1;
            }
            let caption = if caption.is_some() { CARD_TITLE } else { 8.0 };
            caption + lines as f64 * ROW_HEIGHT + 8.0
        }
        Body::Text { text, bold } => {
            let size = if *bold { 18.0 } else { 14.0 };
            wrap(text, chars_per_line(width - 24.0, size)).len() as f64 * LINE_HEIGHT + 16.0
        }
        Body::Image { image, .. } => image_height(image.as_ref(), width),
    }
}

fn image_height(image: Option<&DecodedImage>, width: f64) -> f64 {
    match image {
        Some(img) => match img.aspect_ratio() {
            Some(ratio) if ratio > 0.0 => (width / ratio).min(IMAGE_MAX_HEIGHT),
            _ => IMAGE_MAX_HEIGHT * 2.0 / 3.0,
        },
        None => PLACEHOLDER_HEIGHT,
    }
}

fn chars_per_line(width: f64, font_size: f64) -> usize {
    ((width / (font_size * 0.55)).floor() as usize).max(8)
}

/// Greedy word wrap, capped at a fixed number of lines
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let len = line.chars().count();
            if len > 0 && len + 1 + word.chars().count() > max_chars {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    if lines.len() > MAX_TEXT_LINES {
        lines.truncate(MAX_TEXT_LINES);
        if let Some(last) = lines.last_mut() {
            last.push('…');
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Writes SVG documents for scenes
pub struct SvgWriter<'a> {
    palette: &'a Palette,
    watermark: Option<&'a Watermark>,
    width: f64,
    max_height: f64,
    out: String,
}

impl<'a> SvgWriter<'a> {
    pub fn new(palette: &'a Palette, width: f64, max_height: f64) -> Self {
        Self {
            palette,
            watermark: None,
            width,
            max_height,
            out: String::new(),
        }
    }

    pub fn with_watermark(mut self, watermark: Option<&'a Watermark>) -> Self {
        self.watermark = watermark;
        self
    }

    /// Render the scene; returns the markup and the canvas size
    pub fn write(mut self, scene: &Scene) -> (String, f64, f64) {
        let (width, height) = match scene {
            Scene::Snapshot(image) => {
                let (w, h) = image
                    .dimensions
                    .map(|(w, h)| (w as f64, h as f64))
                    .unwrap_or(SNAPSHOT_DEFAULT);
                let h = h.min(self.max_height);
                self.open(w, h);
                let frame = Frame {
                    x: 0.0,
                    y: 0.0,
                    width: w,
                    height: h,
                };
                self.image(image, frame, "xMidYMin meet");
                (w, h)
            }
            Scene::Board(board) => {
                let layout = layout_board(board, self.width);
                let height = layout.height.min(self.max_height);
                self.open(layout.width, height);
                self.header(&board.title, layout.width);
                for (block, frame) in board.blocks.iter().zip(&layout.frames) {
                    if frame.y >= height {
                        break;
                    }
                    self.block(block, *frame);
                }
                (layout.width, height)
            }
        };
        if let Some(mark) = self.watermark {
            self.watermark_text(mark, width, height);
        }
        self.out.push_str("</svg>\n");
        (self.out, width, height)
    }

    fn open(&mut self, width: f64, height: f64) {
        self.out.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}" font-family="{font}, Tahoma, sans-serif">
"#,
            w = width,
            h = height,
            font = escape(self.palette.font.as_str())
        ));
    }

    fn header(&mut self, title: &str, width: f64) {
        let primary = self.palette.primary.clone();
        self.rect(0.0, 0.0, width, HEADER_HEIGHT, 0.0, &primary, None);
        self.text(MARGIN, 40.0, BOARD_TITLE, title);
    }

    fn block(&mut self, block: &Block, frame: Frame) {
        let grouped = block.opacity < 1.0;
        if grouped {
            self.out
                .push_str(&format!("<g opacity=\"{:.2}\">\n", block.opacity));
        }
        match &block.body {
            Body::Metric {
                label,
                value,
                change,
            } => self.metric(frame, label, value, change.as_deref()),
            Body::Chart(glyph) => self.chart(frame, glyph),
            Body::Table {
                caption,
                headers,
                rows,
                total_rows,
            } => self.table(frame, caption.as_deref(), headers, rows, *total_rows),
            Body::Text { text, bold } => self.paragraph(frame, text, *bold),
            Body::Image { image, alt } => match image {
                Some(image) => self.image(image, frame, "xMidYMid meet"),
                None => self.placeholder(frame, alt),
            },
        }
        if grouped {
            self.out.push_str("</g>\n");
        }
    }

    fn card(&mut self, frame: Frame) {
        self.rect(frame.x, frame.y, frame.width, frame.height, 8.0, "#FFFFFF", Some(BORDER));
    }

    fn metric(&mut self, frame: Frame, label: &str, value: &str, change: Option<&str>) {
        self.card(frame);
        let primary = self.palette.primary.clone();
        self.rect(frame.x, frame.y, frame.width, 4.0, 0.0, &primary, None);
        let max = chars_per_line(frame.width - 32.0, 13.0);
        self.text(frame.x + 16.0, frame.y + 28.0, METRIC_LABEL, &truncate(label, max));
        let max = chars_per_line(frame.width - 32.0, 26.0);
        self.text(frame.x + 16.0, frame.y + 62.0, METRIC_VALUE, &truncate(value, max));
        if let Some(change) = change {
            let color = if change.contains('↓') || change.trim_start().starts_with('-') {
                "#D14343"
            } else {
                "#1E8E3E"
            };
            self.text(frame.x + 16.0, frame.y + 84.0, Font::new(12.0, color, false), change);
        }
    }

    fn chart(&mut self, frame: Frame, glyph: &ChartGlyph) {
        self.card(frame);
        let max = chars_per_line(frame.width - 32.0, 15.0);
        let title = truncate(&glyph.title, max);
        self.text(frame.x + 16.0, frame.y + 24.0, CARD_HEADING, &title);

        let plot = Frame {
            x: frame.x + 24.0,
            y: frame.y + CARD_TITLE + 8.0,
            width: frame.width - 48.0,
            height: frame.height - CARD_TITLE - 40.0,
        };
        if glyph.has_data() {
            match glyph.kind {
                GlyphKind::Bar => self.bars(plot, glyph),
                GlyphKind::Line => self.lines(plot, glyph),
                GlyphKind::Pie => self.pie(plot, glyph, false),
                GlyphKind::Doughnut => self.pie(plot, glyph, true),
            }
        } else if let Some(image) = &glyph.fallback {
            let area = Frame {
                height: plot.height + 24.0,
                ..plot
            };
            self.image(image, area, "xMidYMid meet");
        } else {
            let label = format!("{} chart", glyph.chart_type);
            let cx = frame.x + frame.width / 2.0;
            let cy = frame.y + frame.height / 2.0;
            self.text(cx, cy, PLACEHOLDER, &label);
            if !glyph.description.is_empty() {
                let max = chars_per_line(frame.width - 48.0, 12.0);
                let description = truncate(&glyph.description, max);
                self.text(cx, cy + 22.0, NOTE.centered(), &description);
            }
        }
    }

    fn bars(&mut self, plot: Frame, glyph: &ChartGlyph) {
        let count = glyph.series.iter().map(|s| s.values.len()).max().unwrap_or(0).max(1);
        let peak = peak(glyph);
        let base = plot.y + plot.height;
        let group = plot.width / count as f64;
        let bar = group * 0.8 / glyph.series.len().max(1) as f64;

        self.line(plot.x, base, plot.x + plot.width, base, BORDER);
        for (s, series) in glyph.series.iter().enumerate() {
            let color = self.palette.series_color(s, series.color.as_deref());
            for (i, value) in series.values.iter().enumerate() {
                let v = value.filter(|v| v.is_finite()).unwrap_or(0.0).max(0.0);
                let h = v / peak * plot.height;
                let x = plot.x + i as f64 * group + group * 0.1 + s as f64 * bar;
                self.rect(x, base - h, bar, h, 0.0, &color, None);
            }
        }
        self.axis_labels(plot, glyph, count, group / 2.0, group);
    }

    fn lines(&mut self, plot: Frame, glyph: &ChartGlyph) {
        let count = glyph.series.iter().map(|s| s.values.len()).max().unwrap_or(0).max(1);
        let peak = peak(glyph);
        let base = plot.y + plot.height;
        let step = if count > 1 {
            plot.width / (count - 1) as f64
        } else {
            0.0
        };

        self.line(plot.x, base, plot.x + plot.width, base, BORDER);
        for (s, series) in glyph.series.iter().enumerate() {
            let color = self.palette.series_color(s, series.color.as_deref());
            let points: Vec<String> = series
                .values
                .iter()
                .enumerate()
                .filter_map(|(i, v)| {
                    let v = v.filter(|v| v.is_finite())?.max(0.0);
                    Some(format!(
                        "{:.1},{:.1}",
                        plot.x + i as f64 * step,
                        base - v / peak * plot.height
                    ))
                })
                .collect();
            self.out.push_str(&format!(
                "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"3\" stroke-linejoin=\"round\"/>\n",
                points.join(" "),
                color
            ));
        }
        self.axis_labels(plot, glyph, count, 0.0, step);
    }

    fn axis_labels(
        &mut self,
        plot: Frame,
        glyph: &ChartGlyph,
        count: usize,
        offset: f64,
        step: f64,
    ) {
        if count > 12 {
            return;
        }
        let max = chars_per_line(step.max(24.0), 11.0);
        for (i, label) in glyph.labels.iter().take(count).enumerate() {
            let x = plot.x + offset + i as f64 * step;
            let label = truncate(label, max);
            self.text(x, plot.y + plot.height + 18.0, NOTE.centered(), &label);
        }
    }

    fn pie(&mut self, plot: Frame, glyph: &ChartGlyph, hole: bool) {
        let Some(series) = glyph.series.first() else {
            return;
        };
        let values: Vec<f64> = series
            .values
            .iter()
            .map(|v| v.filter(|v| v.is_finite()).unwrap_or(0.0).max(0.0))
            .collect();
        let total: f64 = values.iter().sum();
        if total <= 0.0 {
            return;
        }
        let radius = (plot.height.min(plot.width) / 2.0).max(1.0);
        let (cx, cy) = (plot.x + plot.width / 2.0, plot.y + plot.height / 2.0 + 12.0);

        let mut angle = -std::f64::consts::FRAC_PI_2;
        for (i, value) in values.iter().enumerate().filter(|(_, v)| **v > 0.0) {
            let color = self.palette.series_color(i, None);
            let sweep = value / total * std::f64::consts::TAU;
            if sweep >= std::f64::consts::TAU - 1e-9 {
                self.out.push_str(&format!(
                    "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{:.1}\" fill=\"{}\"/>\n",
                    cx, cy, radius, color
                ));
            } else {
                let (x1, y1) = (cx + radius * angle.cos(), cy + radius * angle.sin());
                let end = angle + sweep;
                let (x2, y2) = (cx + radius * end.cos(), cy + radius * end.sin());
                let large = if sweep > std::f64::consts::PI { 1 } else { 0 };
                self.out.push_str(&format!(
                    "<path d=\"M{:.1},{:.1} L{:.1},{:.1} A{:.1},{:.1} 0 {} 1 {:.1},{:.1} Z\" fill=\"{}\" stroke=\"#FFFFFF\" stroke-width=\"1\"/>\n",
                    cx, cy, x1, y1, radius, radius, large, x2, y2, color
                ));
            }
            angle += sweep;
        }
        if hole {
            self.out.push_str(&format!(
                "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{:.1}\" fill=\"#FFFFFF\"/>\n",
                cx,
                cy,
                radius * 0.55
            ));
        }
    }

    fn table(
        &mut self,
        frame: Frame,
        caption: Option<&str>,
        headers: &[String],
        rows: &[Vec<String>],
        total_rows: usize,
    ) {
        self.card(frame);
        let mut y = frame.y + 8.0;
        if let Some(caption) = caption {
            self.text(frame.x + 16.0, frame.y + 24.0, CARD_HEADING, caption);
            y = frame.y + CARD_TITLE;
        }

        let columns = headers
            .len()
            .max(rows.iter().map(Vec::len).max().unwrap_or(0))
            .max(1);
        let inner = frame.width - 16.0;
        let cell = inner / columns as f64;
        let max = chars_per_line(cell - 12.0, 12.0);
        let left = frame.x + 8.0;

        let primary = self.palette.primary.clone();
        self.rect(left, y, inner, ROW_HEIGHT, 0.0, &primary, None);
        for (c, header) in headers.iter().enumerate() {
            let x = left + c as f64 * cell + 6.0;
            self.text(x, y + 17.0, TABLE_HEAD, &truncate(header, max));
        }
        y += ROW_HEIGHT;

        for (r, row) in rows.iter().enumerate() {
            if r % 2 == 1 {
                self.rect(left, y, inner, ROW_HEIGHT, 0.0, STRIPE, None);
            }
            for (c, value) in row.iter().enumerate().take(columns) {
                let x = left + c as f64 * cell + 6.0;
                self.text(x, y + 17.0, TABLE_CELL, &truncate(value, max));
            }
            y += ROW_HEIGHT;
        }
        if total_rows > rows.len() {
            let note = format!("Showing {} of {} rows", rows.len(), total_rows);
            self.text(left + 6.0, y + 17.0, NOTE, &note);
        }
    }

    fn paragraph(&mut self, frame: Frame, text: &str, bold: bool) {
        let font = Font::new(if bold { 18.0 } else { 14.0 }, BODY_TEXT, bold);
        let mut y = frame.y + 8.0 + LINE_HEIGHT * 0.75;
        for line in wrap(text, chars_per_line(frame.width - 24.0, font.size)) {
            self.text(frame.x, y, font, &line);
            y += LINE_HEIGHT;
        }
    }

    fn placeholder(&mut self, frame: Frame, alt: &str) {
        self.out.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" rx=\"8\" fill=\"{}\" stroke=\"{}\" stroke-dasharray=\"6 4\"/>\n",
            frame.x, frame.y, frame.width, frame.height, STRIPE, BORDER
        ));
        let cx = frame.x + frame.width / 2.0;
        self.text(cx, frame.y + frame.height / 2.0 + 5.0, PLACEHOLDER, alt);
    }

    fn image(&mut self, image: &DecodedImage, frame: Frame, aspect: &str) {
        self.out.push_str(&format!(
            "<image x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" preserveAspectRatio=\"{}\" href=\"{}\"/>\n",
            frame.x,
            frame.y,
            frame.width,
            frame.height,
            aspect,
            to_data_url(&image.mime_type, &image.bytes)
        ));
    }

    fn watermark_text(&mut self, mark: &Watermark, width: f64, height: f64) {
        let (cx, cy) = (width / 2.0, height / 2.0);
        self.out.push_str(&format!(
            "<text x=\"{cx:.1}\" y=\"{cy:.1}\" font-size=\"{size:.0}\" font-weight=\"bold\" text-anchor=\"middle\" fill=\"#000000\" fill-opacity=\"{op:.2}\" transform=\"rotate(-30 {cx:.1} {cy:.1})\">{text}</text>\n",
            cx = cx,
            cy = cy,
            size = (width / 12.0).max(24.0),
            op = mark.opacity.clamp(0.0, 1.0),
            text = escape(mark.text.as_str())
        ));
    }

    #[allow(clippy::too_many_arguments)]
    fn rect(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        radius: f64,
        fill: &str,
        stroke: Option<&str>,
    ) {
        let stroke = stroke
            .map(|s| format!(" stroke=\"{}\" stroke-width=\"1\"", s))
            .unwrap_or_default();
        self.out.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" rx=\"{:.1}\" fill=\"{}\"{}/>\n",
            x, y, w, h, radius, fill, stroke
        ));
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str) {
        self.out.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1\"/>\n",
            x1, y1, x2, y2, stroke
        ));
    }

    fn text(&mut self, x: f64, y: f64, font: Font, content: &str) {
        let weight = if font.bold {
            " font-weight=\"bold\""
        } else {
            ""
        };
        self.out.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"{:.0}\" fill=\"{}\" text-anchor=\"{}\"{}>{}</text>\n",
            x,
            y,
            font.size,
            font.fill,
            font.anchor,
            weight,
            escape(content)
        ));
    }
}

/// Largest plotted value, never zero
fn peak(glyph: &ChartGlyph) -> f64 {
    let max = glyph
        .series
        .iter()
        .flat_map(|s| s.values.iter().flatten())
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    if max > 0.0 {
        max
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Series;

    fn metric(id: &str) -> Block {
        Block {
            id: id.to_string(),
            body: Body::Metric {
                label: "Revenue".to_string(),
                value: "1,200".to_string(),
                change: Some("↓ 2%".to_string()),
            },
            opacity: 1.0,
        }
    }

    fn text(id: &str, t: &str) -> Block {
        Block {
            id: id.to_string(),
            body: Body::Text {
                text: t.to_string(),
                bold: false,
            },
            opacity: 1.0,
        }
    }

    fn bar_chart() -> ChartGlyph {
        ChartGlyph {
            kind: GlyphKind::Bar,
            chart_type: "bar".to_string(),
            title: "Units".to_string(),
            labels: vec!["Q1".to_string(), "Q2".to_string()],
            series: vec![Series {
                label: "Units".to_string(),
                values: vec![Some(5.0), Some(10.0)],
                color: Some("#123".to_string()),
            }],
            fallback: None,
            description: String::new(),
        }
    }

    #[test]
    fn test_css_hex() {
        assert_eq!(css_hex("#9e1f63").as_deref(), Some("#9E1F63"));
        assert_eq!(css_hex("#abc").as_deref(), Some("#AABBCC"));
        assert_eq!(css_hex("rgb(1,2,3)"), None);
        assert_eq!(css_hex("#12"), None);
    }

    #[test]
    fn test_metrics_share_rows() {
        let board = Board {
            title: "B".to_string(),
            blocks: vec![
                metric("a"),
                metric("b"),
                metric("c"),
                metric("d"),
                text("t", "after"),
            ],
        };
        let layout = layout_board(&board, 1280.0);
        let f = &layout.frames;
        assert_eq!(f[0].y, f[1].y);
        assert_eq!(f[1].y, f[2].y);
        assert!(f[1].x > f[0].x);
        assert!(f[3].y > f[0].y);
        assert_eq!(f[3].x, MARGIN);
        assert_eq!(f[4].y, f[3].y + METRIC_HEIGHT + GAP);
        assert_eq!(f[4].width, 1280.0 - 2.0 * MARGIN);
        assert_eq!(layout.height, f[4].y + f[4].height + MARGIN);
    }

    #[test]
    fn test_wrap() {
        let lines = wrap("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
        assert_eq!(wrap("", 10), vec![String::new()]);
        let long = "word ".repeat(200);
        let lines = wrap(&long, 10);
        assert_eq!(lines.len(), MAX_TEXT_LINES);
        assert!(lines[MAX_TEXT_LINES - 1].ends_with('…'));
    }

    #[test]
    fn test_board_markup() {
        let palette = Palette::default();
        let board = Board {
            title: "Sales & Ops".to_string(),
            blocks: vec![
                metric("m"),
                Block {
                    id: "c".to_string(),
                    body: Body::Chart(bar_chart()),
                    opacity: 0.4,
                },
            ],
        };
        let (svg, width, height) =
            SvgWriter::new(&palette, 1280.0, 4000.0).write(&Scene::Board(board));
        assert_eq!(width, 1280.0);
        assert!(height > HEADER_HEIGHT);
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.contains("Sales &amp; Ops"));
        assert!(svg.contains("fill=\"#9E1F63\""));
        assert!(svg.contains("fill=\"#112233\""));
        assert!(svg.contains("<g opacity=\"0.40\">"));
        assert!(svg.contains("#D14343"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_chart_placeholder_and_watermark() {
        let palette = Palette::default();
        let mut glyph = bar_chart();
        glyph.series.clear();
        glyph.description = "Revenue by quarter".to_string();
        let board = Board {
            title: "B".to_string(),
            blocks: vec![Block {
                id: "c".to_string(),
                body: Body::Chart(glyph),
                opacity: 1.0,
            }],
        };
        let mark = Watermark {
            text: "DRAFT".to_string(),
            opacity: 0.15,
        };
        let (svg, _, _) = SvgWriter::new(&palette, 800.0, 4000.0)
            .with_watermark(Some(&mark))
            .write(&Scene::Board(board));
        assert!(svg.contains(">bar chart</text>"));
        assert!(svg.contains(">Revenue by quarter</text>"));
        assert!(svg.contains(">DRAFT</text>"));
        assert!(svg.contains("fill-opacity=\"0.15\""));
    }

    #[test]
    fn test_height_is_capped() {
        let palette = Palette::default();
        let blocks = (0..200).map(|i| text(&i.to_string(), "line")).collect();
        let board = Board {
            title: "Long".to_string(),
            blocks,
        };
        let (_, _, height) = SvgWriter::new(&palette, 800.0, 1000.0).write(&Scene::Board(board));
        assert_eq!(height, 1000.0);
    }
}
