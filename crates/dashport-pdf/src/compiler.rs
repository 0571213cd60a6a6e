//! IR to PDF compiler
//!
//! Lays the IR out into pages, transpiles the layout to Typst markup and
//! typesets it to PDF bytes with typst-as-lib.

use dashport_ir::{CompileResult, Compiler, Document, ExportFormat, IrDocument};
use tracing::debug;
use typst_as_lib::TypstEngine;

use crate::error::{PdfError, Result};
use crate::layout::{EmbeddedImage, PdfSettings};
use crate::render::layout_document;
use crate::transpiler::Transpiler;

/// Compiler producing PDF documents
#[derive(Debug, Clone, Default)]
pub struct PdfCompiler {
    settings: PdfSettings,
}

impl PdfCompiler {
    pub fn new(settings: PdfSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PdfSettings {
        &self.settings
    }

    /// Compile the IR to PDF bytes
    pub fn render(&self, ir: &IrDocument) -> Result<Vec<u8>> {
        let layout = layout_document(ir, &self.settings);
        debug!(
            pages = layout.page_count(),
            images = layout.images.len(),
            "pdf layout computed"
        );
        let markup = Transpiler::transpile(&layout, &ir.document);
        typeset(&markup, &layout.images, &self.settings.font_paths)
    }
}

impl Compiler for PdfCompiler {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn compile(&self, ir: &IrDocument) -> CompileResult<Document> {
        let bytes = self.render(ir)?;
        Ok(Document::new(ExportFormat::Pdf, ir.title(), bytes))
    }
}

/// Typeset Typst markup to PDF bytes
///
/// # Arguments
/// * `markup` - Typst markup string
/// * `images` - Files the markup references by name
/// * `font_paths` - Paths to font files to include
pub fn typeset(markup: &str, images: &[EmbeddedImage], font_paths: &[String]) -> Result<Vec<u8>> {
    let files: Vec<(&str, Vec<u8>)> = images
        .iter()
        .map(|image| (image.name.as_str(), image.bytes.clone()))
        .collect();

    let mut builder = TypstEngine::builder()
        .main_file(markup.to_string())
        .with_static_file_resolver(files);

    for font_path in font_paths {
        let font_bytes = std::fs::read(font_path)
            .map_err(|e| PdfError::Font(format!("Failed to read font {}: {}", font_path, e)))?;
        builder = builder.fonts([font_bytes]);
    }

    let engine = builder.build();

    // compiled.output is the Result, compiled.warnings holds diagnostics
    let compiled = engine.compile();
    let document = compiled
        .output
        .map_err(|e| PdfError::Compilation(format!("{:?}", e)))?;

    let options = typst_pdf::PdfOptions::default();
    let pdf_bytes = typst_pdf::pdf(&document, &options)
        .map_err(|e| PdfError::Compilation(format!("PDF generation failed: {:?}", e)))?;

    Ok(pdf_bytes.into())
}
