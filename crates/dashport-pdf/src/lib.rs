//! dashport-pdf - PDF compilation via Typst
//!
//! # Architecture
//!
//! The PDF pipeline runs in three stages:
//!
//! 1. **Render** - paginates the IR into per-page draw operations, using a
//!    cursor that breaks to a new page when a section's height estimate
//!    does not fit
//! 2. **Transpiler** - turns the draw operations into absolutely placed
//!    Typst markup
//! 3. **Compiler** - typesets the markup to PDF bytes
//!
//! # Example
//!
//! ```ignore
//! use dashport_ir::{Compiler, IrDocument};
//! use dashport_pdf::PdfCompiler;
//!
//! let ir = IrDocument::new("Sales");
//! let doc = PdfCompiler::default().compile(&ir)?;
//! assert_eq!(doc.mime_type(), "application/pdf");
//! ```

mod compiler;
mod error;
pub mod layout;
pub mod render;
mod transpiler;

pub use compiler::{typeset, PdfCompiler};
pub use error::{PdfError, Result};
pub use layout::{Layout, Orientation, Paper, PdfSettings};
pub use render::layout_document;
pub use transpiler::Transpiler;
