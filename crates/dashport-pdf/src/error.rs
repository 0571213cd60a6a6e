//! Error types for PDF generation

use dashport_ir::CompileError;
use thiserror::Error;

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Errors that can occur during PDF generation
#[derive(Error, Debug)]
pub enum PdfError {
    /// Typst compilation error
    #[error("Typst compilation failed: {0}")]
    Compilation(String),

    /// Font loading error
    #[error("Font error: {0}")]
    Font(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PdfError> for CompileError {
    fn from(err: PdfError) -> Self {
        match err {
            PdfError::Font(reason) => CompileError::resource_not_found(reason),
            other => CompileError::format(other.to_string()),
        }
    }
}
