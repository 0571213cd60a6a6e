//! dashport-ir - capture tree and intermediate representation
//!
//! This crate holds the data model shared by every stage of the export
//! pipeline:
//!
//! - [`capture`]: the capture tree produced from a rendered dashboard
//! - [`document`]: the paginated, format-agnostic IR
//! - [`resources`]: style, data, media and template registries
//! - [`config`]: export formats and the quality table
//! - [`compiler`]: the `Compiler` capability every output format implements
//! - [`output`]: the immutable compiled [`Document`]

pub mod capture;
pub mod compiler;
pub mod config;
pub mod document;
pub mod media;
pub mod output;
pub mod resources;

pub use capture::{CaptureNode, CaptureTree, NodeKind, NodeSubtype};
pub use compiler::{CompileContext, CompileError, CompileResult, Compiler};
pub use config::{ExportConfig, ExportFormat, QualityLevel, QualitySettings, Watermark};
pub use document::{
    CellValue, ChartContent, Content, ContentType, IrDocument, MetricContent, Page, Section,
    TableContent, TextContent,
};
pub use output::{sanitize_filename, Document};
pub use resources::{MediaKind, MediaResource, Resources, StyleDefinitions};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
