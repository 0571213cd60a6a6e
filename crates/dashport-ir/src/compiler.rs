//! The compiler capability shared by every output format

use thiserror::Error;

use crate::capture::CaptureTree;
use crate::config::ExportFormat;
use crate::document::IrDocument;
use crate::output::Document;

/// Result type for compiler operations
pub type CompileResult<T> = std::result::Result<T, CompileError>;

/// Errors a compiler can report
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The document asks for something this format cannot express
    #[error("Unsupported feature: {feature}")]
    UnsupportedFeature { feature: String },

    /// A referenced resource is missing and has no fallback
    #[error("Resource not found: {id}")]
    ResourceNotFound { id: String },

    /// The output container could not be assembled
    #[error("Format error: {reason}")]
    Format { reason: String },
}

impl CompileError {
    /// Create an unsupported feature error
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            feature: feature.into(),
        }
    }

    /// Create a resource not found error
    pub fn resource_not_found(id: impl Into<String>) -> Self {
        Self::ResourceNotFound { id: id.into() }
    }

    /// Create a format error
    pub fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }

    /// Stable numeric code (3001-3003)
    pub fn code(&self) -> u16 {
        match self {
            Self::UnsupportedFeature { .. } => 3001,
            Self::ResourceNotFound { .. } => 3002,
            Self::Format { .. } => 3003,
        }
    }
}

/// Inputs available to a compiler besides the IR itself
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileContext<'a> {
    /// The capture the IR was translated from
    pub capture: Option<&'a CaptureTree>,
    /// Root node the caller asked to export
    pub root_id: Option<&'a str>,
}

/// A compiler for exactly one output format.
///
/// Implementations keep no state between calls, so one instance can serve
/// any number of concurrent sessions.
pub trait Compiler: Send + Sync {
    /// The format this compiler produces
    fn format(&self) -> ExportFormat;

    /// Compile the IR into a finished document
    fn compile(&self, ir: &IrDocument) -> CompileResult<Document>;

    /// Compile with access to the originating capture.
    ///
    /// Formats that only need the IR keep the default.
    fn compile_with(&self, ir: &IrDocument, ctx: &CompileContext<'_>) -> CompileResult<Document> {
        let _ = ctx;
        self.compile(ir)
    }
}
