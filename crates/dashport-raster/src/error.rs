//! Error types for PNG rendering

use dashport_ir::CompileError;
use thiserror::Error;

/// Result type for raster operations
pub type Result<T> = std::result::Result<T, RasterError>;

/// Errors that can occur while rasterising a dashboard
#[derive(Error, Debug)]
pub enum RasterError {
    /// The generated scene did not parse as SVG
    #[error("SVG parsing failed: {0}")]
    Svg(String),

    /// The target pixmap could not be allocated
    #[error("Failed to create pixmap ({width}x{height})")]
    Pixmap { width: u32, height: u32 },

    /// PNG encoding error
    #[error("PNG encoding failed: {0}")]
    Encode(String),

    /// Font loading error
    #[error("Font error: {0}")]
    Font(String),
}

impl RasterError {
    /// Get the error code for diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Self::Svg(_) => "RAST001",
            Self::Pixmap { .. } => "RAST002",
            Self::Encode(_) => "RAST003",
            Self::Font(_) => "RAST004",
        }
    }
}

impl From<RasterError> for CompileError {
    fn from(err: RasterError) -> Self {
        match err {
            RasterError::Font(reason) => CompileError::resource_not_found(reason),
            RasterError::Pixmap { .. } => CompileError::unsupported(err.to_string()),
            other => CompileError::format(format!("[{}] {}", other.code(), other)),
        }
    }
}
