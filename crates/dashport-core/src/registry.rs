//! Compiler lookup by export format

use std::collections::BTreeMap;
use std::sync::Arc;

use dashport_ir::{Compiler, ExportFormat};
use dashport_pdf::PdfCompiler;
use dashport_pptx::PptxCompiler;
use dashport_raster::RasterCompiler;
use dashport_xlsx::XlsxCompiler;

use crate::config::Settings;

/// Compilers available to the export manager
#[derive(Clone, Default)]
pub struct CompilerRegistry {
    compilers: BTreeMap<ExportFormat, Arc<dyn Compiler>>,
}

impl CompilerRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// PDF, PowerPoint, Excel and image compilers built from `settings`
    pub fn with_defaults(settings: &Settings) -> Self {
        let mut registry = Self::new();
        registry.register(PdfCompiler::new(settings.pdf.clone()));
        registry.register(PptxCompiler::new(settings.slides.clone()));
        registry.register(XlsxCompiler::new(settings.spreadsheet.clone()));
        registry.register(RasterCompiler::new(settings.image.clone()));
        registry
    }

    /// Register a compiler under the format it reports, replacing any previous one
    pub fn register(&mut self, compiler: impl Compiler + 'static) -> &mut Self {
        self.register_arc(Arc::new(compiler))
    }

    pub fn register_arc(&mut self, compiler: Arc<dyn Compiler>) -> &mut Self {
        self.compilers.insert(compiler.format(), compiler);
        self
    }

    pub fn get(&self, format: ExportFormat) -> Option<Arc<dyn Compiler>> {
        self.compilers.get(&format).cloned()
    }

    pub fn formats(&self) -> Vec<ExportFormat> {
        self.compilers.keys().copied().collect()
    }
}

impl std::fmt::Debug for CompilerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilerRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}
