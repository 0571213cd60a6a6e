//! Capture engine contract
//!
//! The pipeline does not inspect live dashboards itself. A [`CaptureEngine`]
//! turns a [`CaptureTarget`] into a [`CaptureTree`]; the engines here serve
//! trees that were captured elsewhere (in memory or as JSON files).

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use dashport_ir::CaptureTree;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::error::{ErrorCode, ExportError};

/// What to capture
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureTarget {
    /// Node the export starts from; the whole tree when absent
    pub root_id: Option<String>,
    /// Dashboard the caller believes it is exporting
    pub dashboard_id: Option<String>,
    /// Application state at the time of the request
    pub application_state: Value,
}

/// Errors a capture engine can report
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Capture did not finish within {secs}s")]
    Timeout { secs: u64 },

    #[error("Capture of {bytes} bytes exceeds the {limit} byte limit")]
    MemoryExceeded { bytes: u64, limit: u64 },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Captured state does not match the request: {0}")]
    StateMismatch(String),
}

impl CaptureError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::CaptureTimeout,
            Self::MemoryExceeded { .. } => ErrorCode::CaptureMemoryExceeded,
            Self::ElementNotFound(_) => ErrorCode::CaptureElementNotFound,
            Self::StateMismatch(_) => ErrorCode::CaptureStateMismatch,
        }
    }
}

impl From<CaptureError> for ExportError {
    fn from(err: CaptureError) -> Self {
        ExportError::new(err.code(), err.to_string())
    }
}

/// Produces capture trees of rendered dashboards
#[async_trait]
pub trait CaptureEngine: Send + Sync {
    /// Capture the dashboard described by `target`
    async fn capture(&self, target: &CaptureTarget) -> Result<CaptureTree, CaptureError>;
}

/// Check a capture against the target it was taken for
pub fn verify_capture(tree: &CaptureTree, target: &CaptureTarget) -> Result<(), CaptureError> {
    if let Some(root_id) = &target.root_id {
        if tree.root().find_by_id(root_id).is_none() {
            return Err(CaptureError::ElementNotFound(root_id.clone()));
        }
    }
    let captured = tree.metadata.dashboard_id.as_str();
    match target.dashboard_id.as_deref() {
        Some(expected) if !captured.is_empty() && captured != expected => {
            Err(CaptureError::StateMismatch(format!(
                "expected dashboard {}, captured {}",
                expected, captured
            )))
        }
        _ => Ok(()),
    }
}

/// Serves a tree captured ahead of time
#[derive(Debug, Clone)]
pub struct StaticCapture {
    tree: Arc<CaptureTree>,
}

impl StaticCapture {
    pub fn new(tree: CaptureTree) -> Self {
        Self {
            tree: Arc::new(tree),
        }
    }
}

#[async_trait]
impl CaptureEngine for StaticCapture {
    async fn capture(&self, target: &CaptureTarget) -> Result<CaptureTree, CaptureError> {
        verify_capture(&self.tree, target)?;
        Ok(self.tree.as_ref().clone())
    }
}

/// Reads a capture tree from a JSON file on every capture
#[derive(Debug, Clone)]
pub struct JsonFileCapture {
    path: PathBuf,
    max_bytes: u64,
}

impl JsonFileCapture {
    /// Largest capture file accepted by default (64 MiB)
    pub const DEFAULT_MAX_BYTES: u64 = 64 * 1024 * 1024;

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_bytes: Self::DEFAULT_MAX_BYTES,
        }
    }

    /// Set the size limit (builder style)
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

#[async_trait]
impl CaptureEngine for JsonFileCapture {
    async fn capture(&self, target: &CaptureTarget) -> Result<CaptureTree, CaptureError> {
        let missing = |e: std::io::Error| {
            CaptureError::ElementNotFound(format!("{}: {}", self.path.display(), e))
        };
        let bytes = tokio::fs::metadata(&self.path).await.map_err(missing)?.len();
        if bytes > self.max_bytes {
            return Err(CaptureError::MemoryExceeded {
                bytes,
                limit: self.max_bytes,
            });
        }

        let text = tokio::fs::read(&self.path).await.map_err(missing)?;
        let tree: CaptureTree = serde_json::from_slice(&text).map_err(|e| {
            CaptureError::StateMismatch(format!(
                "{} is not a capture tree: {}",
                self.path.display(),
                e
            ))
        })?;
        debug!(path = %self.path.display(), nodes = tree.node_count(), "capture loaded");
        verify_capture(&tree, target)?;
        Ok(tree)
    }
}
