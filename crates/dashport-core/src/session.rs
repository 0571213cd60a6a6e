//! Export sessions and their observable state

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashport_ir::{CaptureTree, Document, IrDocument};
use serde::Serialize;

use crate::error::ExportError;
use crate::request::ExportRequest;

/// Lifecycle of a session.
///
/// Statuses only move forward: `Initiated` through `Delivering`, then one of
/// the three terminal statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStatus {
    Initiated,
    Capturing,
    Translating,
    Compiling,
    Delivering,
    Completed,
    Failed,
    Cancelled,
}

impl ExportStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether moving to `next` keeps the lifecycle monotonic
    pub fn can_transition_to(self, next: ExportStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Failed | Self::Cancelled => true,
            // Completed is only reachable from Delivering
            Self::Completed => self == Self::Delivering,
            _ => next > self,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initiated => "initiated",
            Self::Capturing => "capturing",
            Self::Translating => "translating",
            Self::Compiling => "compiling",
            Self::Delivering => "delivering",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of a session within its current phase
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProgress {
    pub phase: ExportStatus,
    /// 0 to 100, within the current phase
    pub percentage: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining: Option<Duration>,
}

impl ExportProgress {
    pub fn new(phase: ExportStatus, percentage: u8, message: impl Into<String>) -> Self {
        Self {
            phase,
            percentage: percentage.min(100),
            message: message.into(),
            estimated_time_remaining: None,
        }
    }
}

/// Linear extrapolation of the time left in a phase
pub fn estimate_remaining(elapsed: Duration, percentage: u8) -> Duration {
    if percentage == 0 {
        return Duration::ZERO;
    }
    let total = elapsed.mul_f64(100.0 / f64::from(percentage.min(100)));
    total.saturating_sub(elapsed)
}

/// Timings and counters of a finished pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub total_time_ms: u64,
    pub capture_time_ms: u64,
    pub translation_time_ms: u64,
    pub compilation_time_ms: u64,
    /// Nodes in the capture tree
    pub elements_processed: usize,
    pub warnings: Vec<String>,
}

/// Compiled documents of a completed session
#[derive(Debug, Clone, Default)]
pub struct ExportResults {
    /// One document per compiled format, in request order
    pub documents: Vec<Document>,
    pub metadata: ExportMetadata,
}

impl ExportResults {
    pub fn document(&self, format: dashport_ir::ExportFormat) -> Option<&Document> {
        self.documents.iter().find(|d| d.format() == format)
    }
}

/// Intermediate values a session has produced so far
#[derive(Debug, Clone, Default)]
pub enum Artifacts {
    #[default]
    None,
    Captured {
        capture: Arc<CaptureTree>,
    },
    Translated {
        capture: Arc<CaptureTree>,
        ir: Arc<IrDocument>,
    },
}

impl Artifacts {
    pub fn capture(&self) -> Option<&CaptureTree> {
        match self {
            Self::None => None,
            Self::Captured { capture } | Self::Translated { capture, .. } => Some(capture),
        }
    }

    pub fn ir(&self) -> Option<&IrDocument> {
        match self {
            Self::Translated { ir, .. } => Some(ir),
            _ => None,
        }
    }
}

/// One export request as tracked by the manager
#[derive(Debug, Clone)]
pub struct ExportSession {
    pub id: String,
    pub status: ExportStatus,
    pub request: ExportRequest,
    pub progress: ExportProgress,
    /// Present once the session completed
    pub results: Option<ExportResults>,
    pub errors: Vec<ExportError>,
    pub created_at: DateTime<Utc>,
    /// Whether the session had to wait for a slot
    pub queued: bool,
    pub artifacts: Artifacts,
}

impl ExportSession {
    pub fn new(id: impl Into<String>, request: ExportRequest) -> Self {
        Self {
            id: id.into(),
            status: ExportStatus::Initiated,
            request,
            progress: ExportProgress::new(ExportStatus::Initiated, 0, "Export initiated"),
            results: None,
            errors: Vec::new(),
            created_at: Utc::now(),
            queued: false,
            artifacts: Artifacts::None,
        }
    }

    /// Move to `status`; returns false and changes nothing if that would go backwards
    pub fn transition(&mut self, status: ExportStatus) -> bool {
        if !self.status.can_transition_to(status) {
            return false;
        }
        self.status = status;
        true
    }

    /// Record an error and fail the session
    pub fn fail(&mut self, error: ExportError) {
        if self.transition(ExportStatus::Failed) {
            self.progress = ExportProgress::new(ExportStatus::Failed, 100, error.message.clone());
        }
        self.errors.push(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_status_is_monotonic() {
        use ExportStatus::*;
        assert!(Initiated.can_transition_to(Capturing));
        assert!(Capturing.can_transition_to(Compiling));
        assert!(!Compiling.can_transition_to(Capturing));
        assert!(!Compiling.can_transition_to(Completed));
        assert!(Delivering.can_transition_to(Completed));
        assert!(Initiated.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Cancelled.can_transition_to(Capturing));
        assert!(Failed.is_terminal() && !Delivering.is_terminal());
    }

    #[test]
    fn test_session_fail_keeps_terminal_status() {
        let mut session = ExportSession::new("s1", ExportRequest::new(["pdf"]));
        assert_eq!(session.progress.message, "Export initiated");
        assert!(session.transition(ExportStatus::Capturing));
        assert!(session.transition(ExportStatus::Cancelled));

        session.fail(ExportError::new(ErrorCode::CaptureTimeout, "late"));
        assert_eq!(session.status, ExportStatus::Cancelled);
        assert_eq!(session.errors.len(), 1);
    }

    #[test]
    fn test_estimate_remaining() {
        assert_eq!(estimate_remaining(Duration::from_secs(3), 0), Duration::ZERO);
        assert_eq!(
            estimate_remaining(Duration::from_secs(2), 50),
            Duration::from_secs(2)
        );
        assert_eq!(estimate_remaining(Duration::from_secs(2), 100), Duration::ZERO);
    }

    #[test]
    fn test_progress_serializes_camel_case() {
        let mut progress = ExportProgress::new(ExportStatus::Compiling, 140, "Compiling pdf document...");
        assert_eq!(progress.percentage, 100);
        progress.estimated_time_remaining = Some(Duration::from_millis(1500));
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["phase"], "compiling");
        assert!(json.get("estimatedTimeRemaining").is_some());
    }
}
