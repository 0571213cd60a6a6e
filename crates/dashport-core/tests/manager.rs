//! Session manager behavior against fake capture engines and compilers

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashport_core::capture::CaptureError;
use dashport_core::{
    CaptureEngine, CaptureTarget, CompilerRegistry, ErrorCode, ExportManager, ExportRequest,
    ExportScope, ExportStatus, PageLayoutStrategy, Settings, StaticCapture,
};
use dashport_ir::capture::DataProperties;
use dashport_ir::{
    CaptureNode, CaptureTree, CellValue, CompileError, CompileResult, Compiler, Document,
    ExportFormat, IrDocument, NodeSubtype, QualityLevel,
};
use tokio::sync::Semaphore;

fn metrics_dashboard() -> CaptureTree {
    let metric = |id: &str, label: &str, value: &str| {
        CaptureNode::widget(id, NodeSubtype::Metric).with_data(DataProperties {
            label: Some(label.to_string()),
            value: Some(CellValue::from(value)),
            change: Some("+4%".to_string()),
            ..Default::default()
        })
    };
    CaptureTree::new(CaptureNode::container("root").with_children([
        metric("revenue", "Revenue", "$12,400"),
        metric("orders", "Orders", "310"),
        metric("churn", "Churn", "2.1%"),
    ]))
}

fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.manager.progress_update_interval_ms = 0;
    settings
}

/// Serializes the IR; fast enough to keep the session tests about sessions
struct JsonCompiler;

impl Compiler for JsonCompiler {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn compile(&self, ir: &IrDocument) -> CompileResult<Document> {
        let bytes = serde_json::to_vec(ir).map_err(|e| CompileError::format(e.to_string()))?;
        Ok(Document::new(ExportFormat::Json, ir.title(), bytes))
    }
}

/// Fails with a format error a fixed number of times, then succeeds
struct FlakyCompiler {
    failures: u32,
    calls: Arc<AtomicU32>,
}

impl Compiler for FlakyCompiler {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn compile(&self, ir: &IrDocument) -> CompileResult<Document> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(CompileError::format(format!("transient failure {}", call)));
        }
        JsonCompiler.compile(ir)
    }
}

struct PanickingCompiler;

impl Compiler for PanickingCompiler {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn compile(&self, _ir: &IrDocument) -> CompileResult<Document> {
        panic!("renderer blew up")
    }
}

/// Blocks every capture until the gate opens, recording peak concurrency
struct GatedCapture {
    tree: CaptureTree,
    gate: Semaphore,
    running: AtomicUsize,
    peak: AtomicUsize,
    entered: AtomicUsize,
}

impl GatedCapture {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            tree: metrics_dashboard(),
            gate: Semaphore::new(0),
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            entered: AtomicUsize::new(0),
        })
    }

    async fn wait_entered(&self, n: usize) {
        for _ in 0..500 {
            if self.entered.load(Ordering::SeqCst) >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("only {} captures started", self.entered.load(Ordering::SeqCst));
    }

    fn open(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl CaptureEngine for GatedCapture {
    async fn capture(&self, _target: &CaptureTarget) -> Result<CaptureTree, CaptureError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.entered.fetch_add(1, Ordering::SeqCst);
        let permit = self.gate.acquire().await;
        self.running.fetch_sub(1, Ordering::SeqCst);
        permit.map_err(|_| CaptureError::StateMismatch("gate closed".to_string()))?;
        Ok(self.tree.clone())
    }
}

struct SlowCapture;

#[async_trait]
impl CaptureEngine for SlowCapture {
    async fn capture(&self, _target: &CaptureTarget) -> Result<CaptureTree, CaptureError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(metrics_dashboard())
    }
}

/// Captures after a fixed delay
struct DelayedCapture(Duration);

#[async_trait]
impl CaptureEngine for DelayedCapture {
    async fn capture(&self, _target: &CaptureTarget) -> Result<CaptureTree, CaptureError> {
        tokio::time::sleep(self.0).await;
        Ok(metrics_dashboard())
    }
}

/// Spreadsheet stand-in that holds its blocking thread for a while
struct SlowSheetCompiler(Duration);

impl Compiler for SlowSheetCompiler {
    fn format(&self) -> ExportFormat {
        ExportFormat::Excel
    }

    fn compile(&self, ir: &IrDocument) -> CompileResult<Document> {
        std::thread::sleep(self.0);
        Ok(Document::new(ExportFormat::Excel, ir.title(), b"PK".to_vec()))
    }
}

fn json_registry() -> CompilerRegistry {
    let mut registry = CompilerRegistry::new();
    registry.register(JsonCompiler);
    registry
}

fn static_manager(settings: Settings, registry: CompilerRegistry) -> ExportManager {
    ExportManager::new(
        settings,
        Arc::new(StaticCapture::new(metrics_dashboard())),
        registry,
    )
    .unwrap()
}

#[tokio::test]
async fn test_metrics_dashboard_to_pdf() {
    let mut settings = settings();
    settings.translation.page_layout = PageLayoutStrategy::Single;
    let manager =
        ExportManager::with_default_compilers(settings, StaticCapture::new(metrics_dashboard()))
            .unwrap();

    let request = ExportRequest::new(["pdf"]).with_quality(QualityLevel::High);
    let id = manager.export(request).await.unwrap();
    assert!(id.starts_with("export_1_"));

    let session = manager.wait(&id).await.unwrap();
    assert_eq!(session.status, ExportStatus::Completed, "{:?}", session.errors);
    assert_eq!(session.progress.percentage, 100);
    assert_eq!(session.progress.message, "Export ready for download");

    let ir = session.artifacts.ir().unwrap();
    assert_eq!(ir.pages.len(), 1);
    assert_eq!(ir.section_count(), 3);

    let results = session.results.unwrap();
    assert_eq!(results.documents.len(), 1);
    let pdf = &results.documents[0];
    assert_eq!(pdf.format(), ExportFormat::Pdf);
    assert_eq!(pdf.filename(), "Dashboard_Export.pdf");
    assert!(pdf.data().starts_with(b"%PDF"));
    assert_eq!(results.metadata.elements_processed, 4);
}

#[tokio::test]
async fn test_progress_estimate_counts_from_session_start() {
    let capture_delay = Duration::from_millis(600);
    let mut registry = json_registry();
    registry.register(SlowSheetCompiler(Duration::from_millis(1500)));
    let manager =
        ExportManager::new(settings(), Arc::new(DelayedCapture(capture_delay)), registry).unwrap();

    let submitted = Instant::now();
    let id = manager
        .export(ExportRequest::new(["json", "excel"]))
        .await
        .unwrap();

    let mut mid_compile = None;
    for _ in 0..300 {
        let progress = manager.get_progress(&id).await.unwrap();
        if progress.message == "Compiling excel document..." {
            mid_compile = Some(progress);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let progress = mid_compile.expect("excel compilation never reported");
    let waited = submitted.elapsed();

    assert_eq!(progress.phase, ExportStatus::Compiling);
    assert_eq!(progress.percentage, 50);
    // at 50% the remaining time equals the time spent since export() accepted the request
    let eta = progress.estimated_time_remaining.unwrap();
    assert!(eta >= capture_delay, "estimate {:?} ignores the capture phase", eta);
    assert!(eta <= waited, "estimate {:?} exceeds elapsed {:?}", eta, waited);

    let session = manager.wait(&id).await.unwrap();
    assert_eq!(session.status, ExportStatus::Completed, "{:?}", session.errors);
}

#[test]
fn test_invalid_settings_are_rejected() {
    let mut settings = settings();
    settings.manager.max_concurrent_exports = 0;
    let err = ExportManager::new(
        settings,
        Arc::new(StaticCapture::new(metrics_dashboard())),
        json_registry(),
    )
    .err()
    .unwrap();
    assert!(err.to_string().contains("max_concurrent_exports"));
}

#[tokio::test]
async fn test_unsupported_formats_are_skipped() {
    let manager = static_manager(settings(), json_registry());
    let id = manager
        .export(ExportRequest::new(["json", "unsupported-format", "html"]))
        .await
        .unwrap();

    let session = manager.wait(&id).await.unwrap();
    assert_eq!(session.status, ExportStatus::Completed);
    let results = session.results.unwrap();
    assert_eq!(results.documents.len(), 1);
    assert_eq!(results.documents[0].format(), ExportFormat::Json);
    let warnings = &results.metadata.warnings;
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].contains("unsupported-format"));
    assert!(warnings[1].contains("html"));
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let mut settings = settings();
    settings.manager.max_concurrent_exports = 2;
    let engine = GatedCapture::new();
    let manager = ExportManager::new(settings, engine.clone(), json_registry()).unwrap();

    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(manager.export(ExportRequest::new(["json"])).await.unwrap());
    }
    engine.wait_entered(2).await;
    assert_eq!(manager.active_exports().await, 2);
    assert_eq!(manager.queued_exports().await, 3);

    let queued = manager.get_session(&ids[4]).await.unwrap();
    assert!(queued.queued);
    assert_eq!(queued.status, ExportStatus::Initiated);

    engine.open();
    for id in &ids {
        let session = manager.wait(id).await.unwrap();
        assert_eq!(session.status, ExportStatus::Completed);
    }
    assert_eq!(engine.peak.load(Ordering::SeqCst), 2);
    assert_eq!(manager.active_exports().await, 0);
}

#[tokio::test]
async fn test_full_queue_rejects_without_session() {
    let mut settings = settings();
    settings.manager.max_concurrent_exports = 1;
    settings.manager.max_queue_length = 1;
    let engine = GatedCapture::new();
    let manager = ExportManager::new(settings, engine.clone(), json_registry()).unwrap();

    let running = manager.export(ExportRequest::new(["json"])).await.unwrap();
    let waiting = manager.export(ExportRequest::new(["json"])).await.unwrap();
    let err = manager
        .export(ExportRequest::new(["json"]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::SystemQueueFull);
    assert_eq!(err.code.as_u16(), 5003);
    assert_eq!(manager.queued_exports().await, 1);

    engine.open();
    assert_eq!(manager.wait(&running).await.unwrap().status, ExportStatus::Completed);
    assert_eq!(manager.wait(&waiting).await.unwrap().status, ExportStatus::Completed);
}

#[tokio::test]
async fn test_capture_timeout() {
    let mut settings = settings();
    settings.manager.capture_timeout_secs = 1;
    let manager = ExportManager::new(settings, Arc::new(SlowCapture), json_registry()).unwrap();

    let id = manager.export(ExportRequest::new(["json"])).await.unwrap();
    let session = manager.wait(&id).await.unwrap();
    assert_eq!(session.status, ExportStatus::Failed);
    assert_eq!(session.errors.len(), 1);
    assert_eq!(session.errors[0].code, ErrorCode::CaptureTimeout);
    assert!(!session.errors[0].recoverable);
    assert!(session.results.is_none());
}

#[tokio::test]
async fn test_missing_selection_fails_capture() {
    let manager = static_manager(settings(), json_registry());
    let request = ExportRequest::new(["json"]).with_scope(ExportScope::Selection {
        selection_ids: vec!["revenue".to_string(), "ghost".to_string()],
    });
    let id = manager.export(request).await.unwrap();
    let session = manager.wait(&id).await.unwrap();
    assert_eq!(session.status, ExportStatus::Failed);
    assert_eq!(session.errors[0].code.as_u16(), 1003);
}

#[tokio::test]
async fn test_cancel_running_and_queued() {
    let mut settings = settings();
    settings.manager.max_concurrent_exports = 1;
    let engine = GatedCapture::new();
    let manager = ExportManager::new(settings, engine.clone(), json_registry()).unwrap();

    let running = manager.export(ExportRequest::new(["json"])).await.unwrap();
    let queued = manager.export(ExportRequest::new(["json"])).await.unwrap();
    engine.wait_entered(1).await;

    assert!(manager.cancel_export(&queued).await);
    assert_eq!(manager.queued_exports().await, 0);
    assert!(manager.cancel_export(&running).await);
    assert!(!manager.cancel_export(&running).await);
    assert!(!manager.cancel_export("export_0_missing").await);

    let session = manager.wait(&running).await.unwrap();
    assert_eq!(session.status, ExportStatus::Cancelled);
    assert!(session.results.is_none());
    assert_eq!(
        manager.get_session(&queued).await.unwrap().status,
        ExportStatus::Cancelled
    );

    // the slot is released once the pipeline notices the cancellation
    for _ in 0..100 {
        if manager.active_exports().await == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(manager.active_exports().await, 0);
    assert_eq!(engine.entered.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_recoverable_compilation_is_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut registry = CompilerRegistry::new();
    registry.register(FlakyCompiler {
        failures: 2,
        calls: calls.clone(),
    });
    let manager = static_manager(settings(), registry);

    let id = manager.export(ExportRequest::new(["json"])).await.unwrap();
    let session = manager.wait(&id).await.unwrap();
    assert_eq!(session.status, ExportStatus::Completed);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let warnings = &session.results.unwrap().metadata.warnings;
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].contains("attempt 1"));
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut registry = CompilerRegistry::new();
    registry.register(FlakyCompiler {
        failures: u32::MAX,
        calls: calls.clone(),
    });
    let mut settings = settings();
    settings.manager.retry_attempts = 1;
    let manager = static_manager(settings, registry);

    let id = manager.export(ExportRequest::new(["json"])).await.unwrap();
    let session = manager.wait(&id).await.unwrap();
    assert_eq!(session.status, ExportStatus::Failed);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let error = &session.errors[0];
    assert_eq!(error.code, ErrorCode::CompilationFormatError);
    assert!(error.recoverable);
    assert_eq!(error.context["attempt"], 2);
}

#[tokio::test]
async fn test_compiler_panic_is_reported() {
    let mut registry = CompilerRegistry::new();
    registry.register(PanickingCompiler);
    let manager = static_manager(settings(), registry);

    let id = manager.export(ExportRequest::new(["json"])).await.unwrap();
    let session = manager.wait(&id).await.unwrap();
    assert_eq!(session.status, ExportStatus::Failed);
    assert_eq!(session.errors[0].code, ErrorCode::SystemWorkerCrashed);
    assert_eq!(session.errors[0].context["format"], "json");
}

#[tokio::test]
async fn test_download_and_save() {
    let manager = static_manager(settings(), json_registry());

    let err = manager.download_results("unknown", None).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::DeliveryUnavailable);

    let id = manager.export(ExportRequest::new(["json"])).await.unwrap();
    manager.wait(&id).await.unwrap();

    let docs = manager
        .download_results(&id, Some(ExportFormat::Json))
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    let err = manager
        .download_results(&id, Some(ExportFormat::Pdf))
        .await
        .unwrap_err();
    assert_eq!(err.code.as_u16(), 4002);

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("exports");
    let written = manager.save_results(&id, &out, None).await.unwrap();
    assert_eq!(written, vec![out.join("Dashboard_Export.json")]);
    let bytes = std::fs::read(&written[0]).unwrap();
    assert_eq!(bytes, docs[0].data());
}

#[tokio::test]
async fn test_cleanup_removes_expired_sessions() {
    let mut settings = settings();
    settings.manager.session_retention_secs = 0;
    let manager = static_manager(settings, json_registry());

    let id = manager.export(ExportRequest::new(["json"])).await.unwrap();
    // expired as soon as it finishes, so the wait itself yields nothing
    assert!(manager.wait(&id).await.is_none());
    assert!(manager.get_progress(&id).await.is_none());
    assert_eq!(manager.cleanup().await, 1);
    assert_eq!(manager.cleanup().await, 0);
}

#[tokio::test]
async fn test_shutdown_cancels_and_refuses() {
    let engine = GatedCapture::new();
    let manager = ExportManager::new(settings(), engine.clone(), json_registry()).unwrap();
    let id = manager.export(ExportRequest::new(["json"])).await.unwrap();
    engine.wait_entered(1).await;

    manager.shutdown().await;
    assert_eq!(
        manager.wait(&id).await.unwrap().status,
        ExportStatus::Cancelled
    );
    let err = manager
        .export(ExportRequest::new(["json"]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::SystemQueueFull);
}
