//! # dashport-pptx
//!
//! PowerPoint (PPTX) decks from the dashboard IR.
//!
//! Each IR page becomes one or more slides on the content master, and every
//! deck closes with a "Thank You" slide on the title master:
//!
//! - **Snapshot decks**: when the IR carries a visual snapshot, each page is a
//!   single slide showing the snapshot image
//! - **Section packing**: tables get a slide of their own, charts share a
//!   slide two at a time, metrics six at a time in a grid
//! - **Native charts**: bar, column, line, pie and doughnut charts are written
//!   as DrawingML chart parts, falling back to their image or a placeholder
//! - **Speaker notes**: page notes become notes slides
//!
//! ## Example
//!
//! ```rust,ignore
//! use dashport_ir::{Compiler, IrDocument};
//! use dashport_pptx::PptxCompiler;
//!
//! let ir = IrDocument::new("Quarterly Review");
//! let doc = PptxCompiler::default().compile(&ir)?;
//! std::fs::write(doc.filename(), doc.data())?;
//! ```

pub mod builder;
pub mod chart;
mod compiler;
pub mod error;
pub mod layout;
pub mod slide;
pub mod theme;
pub mod writer;

// Re-exports
pub use builder::build_deck;
pub use chart::{ChartKind, NativeChart};
pub use compiler::{PptxCompiler, SlideSettings};
pub use error::{PptxError, Result};
pub use layout::SlideLayout;
pub use slide::{Deck, Master, Shape, Slide};
pub use theme::Theme;
pub use writer::PptxWriter;

/// PPTX-related constants
pub mod constants {
    /// 4:3 slide width in EMU (10")
    pub const DEFAULT_SLIDE_WIDTH_EMU: i64 = 9_144_000;

    /// 4:3 slide height in EMU (7.5")
    pub const DEFAULT_SLIDE_HEIGHT_EMU: i64 = 6_858_000;

    /// 16:9 slide width in EMU (10")
    pub const WIDESCREEN_SLIDE_WIDTH_EMU: i64 = 9_144_000;

    /// 16:9 slide height in EMU (5.625")
    pub const WIDESCREEN_SLIDE_HEIGHT_EMU: i64 = 5_143_500;

    /// EMU per inch
    pub const EMU_PER_INCH: i64 = 914_400;

    /// EMU per point
    pub const EMU_PER_POINT: i64 = 12_700;

    /// PresentationML namespace
    pub const NS_PRESENTATION: &str =
        "http://schemas.openxmlformats.org/presentationml/2006/main";

    /// DrawingML namespace
    pub const NS_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

    /// DrawingML chart namespace
    pub const NS_CHART: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";

    /// Graphic data URI of DrawingML tables
    pub const NS_TABLE: &str = "http://schemas.openxmlformats.org/drawingml/2006/table";

    /// Relationships namespace
    pub const NS_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    /// Package relationships namespace
    pub const NS_PACKAGE_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships";

    /// Content Types namespace
    pub const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

    /// Slide relationship type
    pub const REL_TYPE_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";

    /// Slide layout relationship type
    pub const REL_TYPE_SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";

    /// Slide master relationship type
    pub const REL_TYPE_SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";

    /// Notes slide relationship type
    pub const REL_TYPE_NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";

    /// Theme relationship type
    pub const REL_TYPE_THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

    /// Image relationship type
    pub const REL_TYPE_IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

    /// Chart relationship type
    pub const REL_TYPE_CHART: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
}
