//! Typed export errors.
//!
//! Every failure recorded on a session carries one of the stable numeric
//! codes below, the phase it happened in and whether retrying can help.

use std::collections::BTreeMap;
use std::fmt;

use dashport_ir::CompileError;
use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Stable error codes, grouped by phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    CaptureTimeout = 1001,
    CaptureMemoryExceeded = 1002,
    CaptureElementNotFound = 1003,
    CaptureStateMismatch = 1004,

    TranslationSchemaInvalid = 2001,
    TranslationDataCorrupted = 2002,
    TranslationVersionMismatch = 2003,

    CompilationUnsupportedFeature = 3001,
    CompilationResourceNotFound = 3002,
    CompilationFormatError = 3003,

    DeliveryStorageFull = 4001,
    DeliveryUnavailable = 4002,
    DeliveryPermissionDenied = 4003,

    SystemOutOfMemory = 5001,
    SystemWorkerCrashed = 5002,
    SystemQueueFull = 5003,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Phase the code belongs to, from its thousands digit
    pub fn phase(self) -> Phase {
        match self.as_u16() / 1000 {
            1 => Phase::Capture,
            2 => Phase::Translation,
            3 => Phase::Compilation,
            4 => Phase::Delivery,
            _ => Phase::System,
        }
    }

    /// Compilation failures may succeed on another attempt; nothing else is retried
    pub fn is_recoverable(self) -> bool {
        self.phase() == Phase::Compilation
    }

    /// Map a compiler's 3xxx code
    pub fn from_compile(err: &CompileError) -> Self {
        match err {
            CompileError::UnsupportedFeature { .. } => Self::CompilationUnsupportedFeature,
            CompileError::ResourceNotFound { .. } => Self::CompilationResourceNotFound,
            CompileError::Format { .. } => Self::CompilationFormatError,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.as_u16())
    }
}

/// Pipeline phase an error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Capture,
    Translation,
    Compilation,
    Delivery,
    System,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Capture => "capture",
            Self::Translation => "translation",
            Self::Compilation => "compilation",
            Self::Delivery => "delivery",
            Self::System => "system",
        };
        f.write_str(name)
    }
}

/// A failure recorded against an export session
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("[{code}] {phase}: {message}")]
pub struct ExportError {
    pub code: ErrorCode,
    pub phase: Phase,
    pub message: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, Value>,
}

impl ExportError {
    /// Create an error; phase and recoverability follow from the code
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            phase: code.phase(),
            message: message.into(),
            recoverable: code.is_recoverable(),
            context: BTreeMap::new(),
        }
    }

    /// Attach a context entry (builder style)
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn queue_full(limit: usize) -> Self {
        Self::new(
            ErrorCode::SystemQueueFull,
            format!("Export queue is full ({} waiting)", limit),
        )
        .with_context("limit", limit)
    }

    pub fn worker_crashed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SystemWorkerCrashed, message)
    }

    /// Results are missing because the session is unknown, expired or unfinished
    pub fn results_unavailable(session_id: &str) -> Self {
        Self::new(
            ErrorCode::DeliveryUnavailable,
            format!("No results available for session {}", session_id),
        )
        .with_context("sessionId", session_id)
    }

    /// Classify a delivery I/O failure
    pub fn delivery_io(err: &std::io::Error, path: &std::path::Path) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::ReadOnlyFilesystem => {
                ErrorCode::DeliveryPermissionDenied
            }
            std::io::ErrorKind::StorageFull => ErrorCode::DeliveryStorageFull,
            _ => ErrorCode::DeliveryUnavailable,
        };
        Self::new(code, format!("Failed to write {}: {}", path.display(), err))
            .with_context("path", path.display().to_string())
    }
}

impl From<CompileError> for ExportError {
    fn from(err: CompileError) -> Self {
        Self::new(ErrorCode::from_compile(&err), err.to_string())
    }
}
