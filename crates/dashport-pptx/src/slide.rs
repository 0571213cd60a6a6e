//! Slide data structures.
//!
//! Positions and sizes are in inches from the top-left corner of the slide;
//! the writer converts them to EMU.

use dashport_ir::document::HAlign;
use dashport_ir::media::DecodedImage;

use crate::chart::NativeChart;

/// The two masters every deck carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Master {
    /// Primary background, centred title and subtitle
    Title,
    /// White background with a primary title band
    Content,
}

impl Master {
    /// 1-based index of the slide layout implementing this master
    pub fn layout_index(self) -> usize {
        match self {
            Self::Title => 1,
            Self::Content => 2,
        }
    }
}

/// A rectangle on the slide, in inches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Frame {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Largest frame with the given aspect ratio centred inside this one
    pub fn contain(&self, aspect_ratio: Option<f64>) -> Frame {
        let Some(ratio) = aspect_ratio.filter(|r| *r > 0.0) else {
            return *self;
        };
        let (mut w, mut h) = (self.w, self.w / ratio);
        if h > self.h {
            h = self.h;
            w = h * ratio;
        }
        Frame::new(self.x + (self.w - w) / 2.0, self.y + (self.h - h) / 2.0, w, h)
    }
}

/// Vertical anchoring of text inside its box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Character and paragraph formatting for a text box
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Font size in points
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    /// RGB hex without `#`
    pub color: String,
    pub font: Option<String>,
    pub align: HAlign,
    pub anchor: Anchor,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 12.0,
            bold: false,
            italic: false,
            color: "000000".to_string(),
            font: None,
            align: HAlign::Left,
            anchor: Anchor::Top,
        }
    }
}

impl TextStyle {
    pub fn sized(size: f64, color: impl Into<String>) -> Self {
        Self {
            size,
            color: color.into(),
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn aligned(mut self, align: HAlign) -> Self {
        self.align = align;
        self
    }

    pub fn anchored(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub frame: Frame,
    /// Text; line breaks start new paragraphs
    pub text: String,
    pub style: TextStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RectShape {
    pub frame: Frame,
    pub fill: String,
    pub line: Option<String>,
    pub rounded: bool,
}

/// A picture referencing a deck media item
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    pub frame: Frame,
    pub media: usize,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub text: String,
    pub bold: bool,
    pub color: String,
    pub fill: String,
    pub align: HAlign,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableShape {
    /// Top-left corner and total width; the height follows from the rows
    pub frame: Frame,
    pub column_widths: Vec<f64>,
    pub row_height: f64,
    pub font_size: f64,
    pub rows: Vec<Vec<TableCell>>,
}

/// A native chart referencing a deck chart part
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFrame {
    pub frame: Frame,
    pub chart: usize,
}

/// Content that can appear on a slide
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Text(TextBox),
    Rect(RectShape),
    Picture(Picture),
    Table(TableShape),
    Chart(ChartFrame),
}

/// A package part a slide must be related to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartRef {
    Media(usize),
    Chart(usize),
}

impl Shape {
    pub fn part_ref(&self) -> Option<PartRef> {
        match self {
            Shape::Picture(p) => Some(PartRef::Media(p.media)),
            Shape::Chart(c) => Some(PartRef::Chart(c.chart)),
            _ => None,
        }
    }
}

/// A single slide
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub master: Master,
    /// Goes into the master's title placeholder
    pub title: Option<String>,
    /// Only rendered on title-master slides
    pub subtitle: Option<String>,
    pub shapes: Vec<Shape>,
    /// Speaker notes
    pub notes: Option<String>,
}

impl Slide {
    /// Create a slide on the title master
    pub fn title_slide(title: impl Into<String>, subtitle: Option<String>) -> Self {
        Self {
            master: Master::Title,
            title: Some(title.into()),
            subtitle,
            shapes: Vec::new(),
            notes: None,
        }
    }

    /// Create a slide on the content master
    pub fn content_slide(title: Option<String>) -> Self {
        Self {
            master: Master::Content,
            title,
            subtitle: None,
            shapes: Vec::new(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Parts in relationship order; the k-th entry is `rId{k + 2}`
    /// (`rId1` is always the layout).
    pub fn part_refs(&self) -> Vec<PartRef> {
        self.shapes.iter().filter_map(Shape::part_ref).collect()
    }

    /// All visible text on the slide, in shape order
    pub fn texts(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.title.iter().map(String::as_str).collect();
        out.extend(self.subtitle.as_deref());
        for shape in &self.shapes {
            match shape {
                Shape::Text(t) => out.push(&t.text),
                Shape::Table(t) => out.extend(t.rows.iter().flatten().map(|c| c.text.as_str())),
                _ => {}
            }
        }
        out
    }
}

/// An embedded media file
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    /// Name under `ppt/media/`, e.g. `image1.png`
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A complete presentation ready to be packaged
#[derive(Debug, Clone, Default)]
pub struct Deck {
    pub title: String,
    pub subject: String,
    pub author: String,
    pub company: String,
    pub created: Option<String>,
    pub slides: Vec<Slide>,
    pub media: Vec<MediaItem>,
    pub charts: Vec<NativeChart>,
}

impl Deck {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Embed an image and return its media index
    pub fn add_media(&mut self, image: DecodedImage) -> usize {
        let index = self.media.len();
        self.media.push(MediaItem {
            name: format!("image{}.{}", index + 1, image.extension()),
            content_type: image.mime_type,
            data: image.bytes,
        });
        index
    }

    /// Register a chart part and return its index
    pub fn add_chart(&mut self, chart: NativeChart) -> usize {
        self.charts.push(chart);
        self.charts.len() - 1
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }
}
