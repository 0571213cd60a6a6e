//! # dashport-raster
//!
//! PNG images of a dashboard.
//!
//! The image is drawn from the richest source at hand:
//!
//! - a **capture tree**: the subtree chosen by the caller (or found through
//!   the `data-dashboard` / `dashboard-container` / `main` fallback chain) is
//!   stripped of buttons and `no-export` nodes and drawn as cards
//! - a **whole-dashboard snapshot** in the IR resources, reproduced as is
//! - the **IR pages**, drawn as the same cards
//!
//! Scenes are written as SVG and rasterised with resvg onto a white
//! tiny-skia pixmap at twice the logical size.
//!
//! ## Example
//!
//! ```rust,ignore
//! use dashport_ir::{Compiler, IrDocument};
//! use dashport_raster::RasterCompiler;
//!
//! let ir = IrDocument::new("Quarterly Review");
//! let doc = RasterCompiler::default().compile(&ir)?;
//! std::fs::write(doc.filename(), doc.data())?;
//! ```

mod compiler;
pub mod error;
pub mod filter;
pub mod render;
pub mod scene;
pub mod svg;

pub use compiler::{RasterCompiler, RasterSettings};
pub use error::{RasterError, Result};
pub use filter::{prune, select_root};
pub use render::RenderedImage;
pub use scene::{Block, Board, Body, Scene};
pub use svg::{Palette, SvgWriter};
