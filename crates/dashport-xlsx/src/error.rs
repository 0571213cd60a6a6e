//! Error types for XLSX generation.

use dashport_ir::CompileError;
use thiserror::Error;

/// Result type for XLSX operations
pub type Result<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur during XLSX generation
#[derive(Error, Debug)]
pub enum XlsxError {
    /// Column width bounds that cannot be satisfied
    #[error("Invalid column widths: min {min} > max {max}")]
    InvalidWidths { min: f64, max: f64 },

    /// ZIP archive error
    #[error("Archive error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl XlsxError {
    /// Get the error code for diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidWidths { .. } => "XLSX001",
            Self::ZipError(_) => "XLSX002",
            Self::IoError(_) => "XLSX003",
        }
    }
}

impl From<XlsxError> for CompileError {
    fn from(err: XlsxError) -> Self {
        match err {
            XlsxError::InvalidWidths { .. } => CompileError::unsupported(err.to_string()),
            other => CompileError::format(format!("[{}] {}", other.code(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_compile_error() {
        let err: CompileError = XlsxError::InvalidWidths { min: 60.0, max: 50.0 }.into();
        assert_eq!(err.code(), 3001);

        let err: CompileError = XlsxError::from(std::io::Error::other("disk")).into();
        assert_eq!(err.code(), 3003);
        assert!(err.to_string().contains("XLSX003"));
    }
}
