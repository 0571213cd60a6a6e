//! IR to PPTX compiler

use dashport_ir::{CompileResult, Compiler, Document, ExportFormat, IrDocument};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::build_deck;
use crate::constants::{
    DEFAULT_SLIDE_HEIGHT_EMU, DEFAULT_SLIDE_WIDTH_EMU, EMU_PER_INCH, WIDESCREEN_SLIDE_HEIGHT_EMU,
    WIDESCREEN_SLIDE_WIDTH_EMU,
};
use crate::error::Result;
use crate::theme::Theme;
use crate::writer::PptxWriter;

/// Deck options, read from the `[slides]` table of the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideSettings {
    /// 16:9 when true, 4:3 otherwise
    pub widescreen: bool,
    /// Turn page notes into speaker notes
    pub include_notes: bool,
    pub company_name: String,
}

impl Default for SlideSettings {
    fn default() -> Self {
        Self {
            widescreen: true,
            include_notes: true,
            company_name: "Proceed".to_string(),
        }
    }
}

impl SlideSettings {
    /// Slide size in EMU
    pub fn slide_size(&self) -> (i64, i64) {
        if self.widescreen {
            (WIDESCREEN_SLIDE_WIDTH_EMU, WIDESCREEN_SLIDE_HEIGHT_EMU)
        } else {
            (DEFAULT_SLIDE_WIDTH_EMU, DEFAULT_SLIDE_HEIGHT_EMU)
        }
    }

    /// Slide height in inches
    pub fn slide_height(&self) -> f64 {
        self.slide_size().1 as f64 / EMU_PER_INCH as f64
    }
}

/// Compiler producing PowerPoint decks
#[derive(Debug, Clone, Default)]
pub struct PptxCompiler {
    settings: SlideSettings,
}

impl PptxCompiler {
    pub fn new(settings: SlideSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SlideSettings {
        &self.settings
    }

    /// Compile the IR to PPTX bytes
    pub fn render(&self, ir: &IrDocument) -> Result<Vec<u8>> {
        let deck = build_deck(ir, &self.settings);
        let bytes = PptxWriter::new(&deck, &self.settings)
            .with_theme(Theme::from_styles(&ir.resources.styles))
            .generate()?;
        debug!(slides = deck.slide_count(), bytes = bytes.len(), "pptx written");
        Ok(bytes)
    }
}

impl Compiler for PptxCompiler {
    fn format(&self) -> ExportFormat {
        ExportFormat::Powerpoint
    }

    fn compile(&self, ir: &IrDocument) -> CompileResult<Document> {
        let bytes = self.render(ir)?;
        Ok(Document::new(ExportFormat::Powerpoint, ir.title(), bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_size() {
        let settings = SlideSettings::default();
        assert_eq!(settings.slide_size(), (9_144_000, 5_143_500));
        assert!((settings.slide_height() - 5.625).abs() < 1e-9);

        let classic = SlideSettings {
            widescreen: false,
            ..Default::default()
        };
        assert!((classic.slide_height() - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_compile_empty_document() {
        let ir = IrDocument::new("Q3 Review!");
        let doc = PptxCompiler::default().compile(&ir).unwrap();
        assert_eq!(doc.format(), ExportFormat::Powerpoint);
        assert_eq!(doc.filename(), "Q3_Review_.pptx");
        assert_eq!(
            doc.mime_type(),
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        );
        assert!(doc.data().starts_with(b"PK"));
    }

    #[test]
    fn test_settings_from_partial_json() {
        let settings: SlideSettings =
            serde_json::from_str(r#"{"include_notes": false}"#).unwrap();
        assert!(settings.widescreen);
        assert!(!settings.include_notes);
    }
}
