//! Page geometry, draw operations and the pagination cursor
//!
//! Layout is computed up front into plain draw operations (millimetres,
//! origin at the top-left of the page). The [`Canvas`] carries the vertical
//! cursor; a fresh one is created for every compile call.

use serde::{Deserialize, Serialize};

use dashport_ir::document::{HAlign, Margins};

/// Millimetres per CSS pixel (96 dpi)
pub const PX_TO_MM: f64 = 25.4 / 96.0;

/// Millimetres per typographic point
pub const PT_TO_MM: f64 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Paper {
    #[default]
    A4,
    Letter,
    A3,
}

impl Paper {
    /// Portrait width and height in millimetres
    pub fn size_mm(&self) -> (f64, f64) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::Letter => (215.9, 279.4),
            Self::A3 => (297.0, 420.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// PDF output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfSettings {
    pub paper: Paper,
    pub orientation: Orientation,
    /// Page margins in millimetres
    pub margins: Margins,
    /// Draw the header rule
    pub header: bool,
    pub header_height: f64,
    /// Draw the footer rule and page numbers
    pub footer: bool,
    pub footer_height: f64,
    /// Extra font files handed to the typesetter
    pub font_paths: Vec<String>,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            paper: Paper::A4,
            orientation: Orientation::Portrait,
            margins: Margins::uniform(20.0),
            header: true,
            header_height: 15.0,
            footer: true,
            footer_height: 15.0,
            font_paths: Vec::new(),
        }
    }
}

/// Resolved page dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
    pub header_height: f64,
    pub footer_height: f64,
}

impl Geometry {
    pub fn from_settings(settings: &PdfSettings) -> Self {
        let (w, h) = settings.paper.size_mm();
        let (width, height) = match settings.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        };
        Self {
            width,
            height,
            margins: settings.margins,
            header_height: if settings.header {
                settings.header_height
            } else {
                0.0
            },
            footer_height: if settings.footer {
                settings.footer_height
            } else {
                0.0
            },
        }
    }

    pub fn content_width(&self) -> f64 {
        self.width - self.margins.left - self.margins.right
    }

    /// First usable y position on a page
    pub fn content_top(&self) -> f64 {
        self.margins.top + self.header_height
    }

    /// Last usable y position on a page
    pub fn content_bottom(&self) -> f64 {
        self.height - self.margins.bottom - self.footer_height
    }
}

/// An sRGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    pub const fn gray(level: u8) -> Self {
        Rgb(level, level, level)
    }

    /// Parse `#rrggbb` or `#rgb`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let mut it = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                Some(Rgb(it.next()??, it.next()??, it.next()??))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextOp {
    pub x: f64,
    /// Top of the line box
    pub y: f64,
    /// Width of the box the text is aligned in
    pub width: f64,
    pub text: String,
    /// Font size in points
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub color: Rgb,
    pub align: HAlign,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RectOp {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: Option<Rgb>,
    pub stroke: Option<Rgb>,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineOp {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub color: Rgb,
    /// Stroke width in points
    pub thickness: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageOp {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Name under which the bytes are registered with the typesetter
    pub name: String,
}

/// A single drawing instruction
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text(TextOp),
    Rect(RectOp),
    Line(LineOp),
    Image(ImageOp),
    /// Diagonal text across the page centre
    Watermark { text: String, opacity: f64 },
}

/// Draw operations of one physical page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageOps {
    pub ops: Vec<DrawOp>,
    /// Page is a whole-dashboard raster rather than section content
    pub snapshot: bool,
}

impl PageOps {
    /// All text drawn on the page
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
    }
}

/// Image bytes referenced by [`ImageOp`]s
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The finished layout of a document
#[derive(Debug, Clone)]
pub struct Layout {
    pub geometry: Geometry,
    pub pages: Vec<PageOps>,
    pub images: Vec<EmbeddedImage>,
}

impl Layout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Whether any page draws text containing `needle`
    pub fn contains_text(&self, needle: &str) -> bool {
        self.pages
            .iter()
            .flat_map(PageOps::texts)
            .any(|t| t.contains(needle))
    }
}

/// Pagination cursor plus the pages laid out so far
pub struct Canvas {
    geometry: Geometry,
    pages: Vec<PageOps>,
    images: Vec<EmbeddedImage>,
    y: f64,
}

impl Canvas {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            pages: Vec::new(),
            images: Vec::new(),
            y: geometry.content_top(),
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Start a new physical page and reset the cursor
    pub fn begin_page(&mut self) {
        self.pages.push(PageOps::default());
        self.y = self.geometry.content_top();
    }

    /// Mark the current page as a snapshot page
    pub fn mark_snapshot(&mut self) {
        if let Some(page) = self.pages.last_mut() {
            page.snapshot = true;
        }
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn advance(&mut self, dy: f64) {
        self.y += dy;
    }

    /// Vertical space left above the footer
    pub fn remaining(&self) -> f64 {
        self.geometry.content_bottom() - self.y
    }

    /// Break to a new page if `needed` does not fit. Returns whether it broke.
    pub fn ensure_space(&mut self, needed: f64) -> bool {
        if self.pages.is_empty() || self.y + needed > self.geometry.content_bottom() {
            self.begin_page();
            true
        } else {
            false
        }
    }

    pub fn push(&mut self, op: DrawOp) {
        if self.pages.is_empty() {
            self.begin_page();
        }
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    /// Register image bytes and return the name to reference them by
    pub fn embed(&mut self, bytes: Vec<u8>, extension: &str) -> String {
        let name = format!("img{}.{}", self.images.len(), extension);
        self.images.push(EmbeddedImage {
            name: name.clone(),
            bytes,
        });
        name
    }

    pub fn finish(self) -> Layout {
        Layout {
            geometry: self.geometry,
            pages: self.pages,
            images: self.images,
        }
    }
}

/// Average advance width of a glyph, in millimetres
fn glyph_width(size_pt: f64, bold: bool) -> f64 {
    let factor = if bold { 0.55 } else { 0.5 };
    size_pt * PT_TO_MM * factor
}

/// Word-wrap text into lines no wider than `max_width` millimetres
pub fn wrap_text(text: &str, max_width: f64, size_pt: f64, bold: bool) -> Vec<String> {
    let per_line = ((max_width / glyph_width(size_pt, bold)).floor() as usize).max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > per_line {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                lines.push(word.drain(..per_line).collect());
            }
            let word: String = word.into_iter().collect();
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > per_line && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Shorten text to fit `max_width` millimetres on one line
pub fn fit_line(text: &str, max_width: f64, size_pt: f64) -> String {
    let per_line = ((max_width / glyph_width(size_pt, false)).floor() as usize).max(1);
    let first = text.lines().next().unwrap_or_default();
    if first.chars().count() <= per_line {
        return first.to_string();
    }
    let mut out: String = first.chars().take(per_line.saturating_sub(1)).collect();
    out.push('…');
    out
}
