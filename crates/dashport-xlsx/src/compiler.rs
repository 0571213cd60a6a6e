//! IR to XLSX compiler

use dashport_ir::{
    CaptureTree, CompileContext, CompileResult, Compiler, Document, ExportFormat, IrDocument,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::degraded::{extract_workbook, DEGRADED_SHEET_NAME};
use crate::error::Result;
use crate::sheet::{Style, Worksheet};
use crate::styles::Stylesheet;
use crate::workbook::{build_workbook, Workbook};
use crate::writer::XlsxWriter;

/// Workbook options, read from the `[spreadsheet]` table of the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadsheetSettings {
    /// Narrowest column, in characters
    pub min_column_width: f64,
    /// Widest column, in characters
    pub max_column_width: f64,
}

impl Default for SpreadsheetSettings {
    fn default() -> Self {
        Self {
            min_column_width: 10.0,
            max_column_width: 50.0,
        }
    }
}

/// Compiler producing Excel workbooks
#[derive(Debug, Clone, Default)]
pub struct XlsxCompiler {
    settings: SpreadsheetSettings,
}

impl XlsxCompiler {
    pub fn new(settings: SpreadsheetSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SpreadsheetSettings {
        &self.settings
    }

    /// Compile the IR to XLSX bytes, one sheet per section
    pub fn render(&self, ir: &IrDocument) -> Result<Vec<u8>> {
        let mut workbook = build_workbook(ir);
        if workbook.sheets.is_empty() {
            workbook.sheets.push(empty_sheet(ir.title()));
        }
        self.write(&workbook, Stylesheet::from_styles(&ir.resources.styles))
    }

    /// Compile straight from a capture tree, without a translated IR
    pub fn render_degraded(&self, capture: &CaptureTree, title: &str) -> Result<Vec<u8>> {
        info!(title, "spreadsheet export without IR, extracting from capture");
        let workbook = extract_workbook(capture, title);
        self.write(&workbook, Stylesheet::default())
    }

    fn write(&self, workbook: &Workbook, styles: Stylesheet) -> Result<Vec<u8>> {
        let bytes = XlsxWriter::new(workbook, &self.settings)
            .with_styles(styles)
            .generate()?;
        debug!(sheets = workbook.sheets.len(), bytes = bytes.len(), "xlsx written");
        Ok(bytes)
    }
}

fn empty_sheet(title: &str) -> Worksheet {
    let mut sheet = Worksheet::new(DEGRADED_SHEET_NAME);
    sheet.push_line(title, Style::Title);
    sheet.push_blank();
    sheet.push_line("No dashboard data found to export", Style::Section);
    sheet
}

impl Compiler for XlsxCompiler {
    fn format(&self) -> ExportFormat {
        ExportFormat::Excel
    }

    fn compile(&self, ir: &IrDocument) -> CompileResult<Document> {
        let bytes = self.render(ir)?;
        Ok(Document::new(ExportFormat::Excel, ir.title(), bytes))
    }

    /// An IR without sections falls back to extracting from the capture
    fn compile_with(&self, ir: &IrDocument, ctx: &CompileContext<'_>) -> CompileResult<Document> {
        match ctx.capture {
            Some(capture) if ir.section_count() == 0 => {
                let bytes = self.render_degraded(capture, ir.title())?;
                Ok(Document::new(ExportFormat::Excel, ir.title(), bytes))
            }
            _ => self.compile(ir),
        }
    }
}
