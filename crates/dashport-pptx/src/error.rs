//! Error types for PPTX generation.

use dashport_ir::CompileError;
use thiserror::Error;

/// Result type for PPTX operations
pub type Result<T> = std::result::Result<T, PptxError>;

/// Errors that can occur during PPTX generation
#[derive(Error, Debug)]
pub enum PptxError {
    /// A slide references a part the deck does not hold
    #[error("Missing part {kind} #{index}")]
    MissingPart { kind: &'static str, index: usize },

    /// ZIP archive error
    #[error("Archive error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PptxError {
    /// Create a missing part error
    pub fn missing_part(kind: &'static str, index: usize) -> Self {
        Self::MissingPart { kind, index }
    }

    /// Get the error code for diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingPart { .. } => "PPTX001",
            Self::ZipError(_) => "PPTX002",
            Self::IoError(_) => "PPTX003",
        }
    }
}

impl From<PptxError> for CompileError {
    fn from(err: PptxError) -> Self {
        match err {
            PptxError::MissingPart { kind, index } => {
                CompileError::resource_not_found(format!("{}{}", kind, index))
            }
            other => CompileError::format(format!("[{}] {}", other.code(), other)),
        }
    }
}
