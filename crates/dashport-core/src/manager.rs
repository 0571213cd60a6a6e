//! Export session orchestration
//!
//! The [`ExportManager`] accepts export requests, runs each one through
//! capture, translation, compilation and delivery on the tokio runtime, and
//! keeps the resulting sessions queryable until they expire.
//!
//! At most `max_concurrent_exports` sessions execute at once. Each running
//! session owns a slot; when it finishes, the same worker task picks up the
//! oldest queued session that has not been cancelled.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashport_ir::{CaptureTree, CompileContext, Compiler, Document, ExportFormat, IrDocument};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::capture::{CaptureEngine, CaptureError};
use crate::config::{ConfigError, Settings};
use crate::error::{ErrorCode, ExportError, Result};
use crate::registry::CompilerRegistry;
use crate::request::{ExportRequest, ExportScope};
use crate::session::{
    estimate_remaining, Artifacts, ExportMetadata, ExportProgress, ExportResults, ExportSession,
    ExportStatus,
};
use crate::translator::{TranslationOptions, Translator};

/// Tracing target for session orchestration.
const TRACING_TARGET: &str = "dashport::manager";

/// Runs export sessions and answers queries about them
#[derive(Clone)]
pub struct ExportManager {
    inner: Arc<Inner>,
}

struct Inner {
    settings: Settings,
    engine: Arc<dyn CaptureEngine>,
    registry: CompilerRegistry,
    state: Mutex<State>,
    counter: AtomicU64,
    shutdown: CancellationToken,
}

#[derive(Default)]
struct State {
    sessions: HashMap<String, Entry>,
    queue: VecDeque<String>,
    active: usize,
}

struct Entry {
    session: ExportSession,
    cancel: CancellationToken,
    /// When `export` accepted the request
    started: Instant,
    finished_at: Option<Instant>,
    last_progress: Option<Instant>,
    status_tx: watch::Sender<ExportStatus>,
}

impl Entry {
    /// Move the session forward and notify waiters
    fn set_status(&mut self, status: ExportStatus) -> bool {
        if !self.session.transition(status) {
            return false;
        }
        if status.is_terminal() {
            self.finished_at = Some(Instant::now());
        }
        self.status_tx.send_replace(status);
        true
    }

    /// Record an error; the session fails unless it already finished
    fn fail(&mut self, error: ExportError) {
        let live = !self.session.status.is_terminal();
        self.session.fail(error);
        if live {
            self.finished_at = Some(Instant::now());
            self.status_tx.send_replace(ExportStatus::Failed);
        }
    }

    fn is_expired(&self, retention: Duration) -> bool {
        self.finished_at.is_some_and(|t| t.elapsed() >= retention)
    }
}

/// Why a pipeline run stopped early
enum Stop {
    Cancelled,
    Failed(ExportError),
}

impl From<ExportError> for Stop {
    fn from(err: ExportError) -> Self {
        Self::Failed(err)
    }
}

impl From<CaptureError> for Stop {
    fn from(err: CaptureError) -> Self {
        Self::Failed(err.into())
    }
}

impl ExportManager {
    /// Fails when `settings` does not pass [`Settings::validate`]
    pub fn new(
        settings: Settings,
        engine: Arc<dyn CaptureEngine>,
        registry: CompilerRegistry,
    ) -> std::result::Result<Self, ConfigError> {
        settings.validate()?;
        tracing::debug!(
            target: TRACING_TARGET,
            formats = ?registry.formats(),
            max_concurrent = settings.manager.max_concurrent_exports,
            "export manager created"
        );
        Ok(Self {
            inner: Arc::new(Inner {
                settings,
                engine,
                registry,
                state: Mutex::new(State::default()),
                counter: AtomicU64::new(0),
                shutdown: CancellationToken::new(),
            }),
        })
    }

    /// A manager with the built-in compilers, configured from `settings`
    pub fn with_default_compilers(
        settings: Settings,
        engine: impl CaptureEngine + 'static,
    ) -> std::result::Result<Self, ConfigError> {
        let registry = CompilerRegistry::with_defaults(&settings);
        Self::new(settings, Arc::new(engine), registry)
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Submit a request and return its session id.
    ///
    /// The session starts right away when a slot is free and is queued
    /// otherwise. Fails with 5003 when the queue is full or the manager has
    /// been shut down; no session is created in that case.
    pub async fn export(&self, request: ExportRequest) -> Result<String> {
        let limits = &self.inner.settings.manager;
        if self.inner.shutdown.is_cancelled() {
            return Err(ExportError::new(
                ErrorCode::SystemQueueFull,
                "Export manager is shutting down",
            ));
        }

        let n = self.inner.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("export_{}_{}", n, Uuid::new_v4().simple());

        let mut state = self.inner.state.lock().await;
        let start_now = state.active < limits.max_concurrent_exports;
        if !start_now && state.queue.len() >= limits.max_queue_length {
            tracing::warn!(
                target: TRACING_TARGET,
                waiting = state.queue.len(),
                "export rejected, queue full"
            );
            return Err(ExportError::queue_full(limits.max_queue_length));
        }

        let mut session = ExportSession::new(id.clone(), request);
        session.queued = !start_now;
        let (status_tx, _) = watch::channel(ExportStatus::Initiated);
        let entry = Entry {
            session,
            cancel: self.inner.shutdown.child_token(),
            started: Instant::now(),
            finished_at: None,
            last_progress: None,
            status_tx,
        };
        state.sessions.insert(id.clone(), entry);

        if start_now {
            state.active += 1;
            drop(state);
            tracing::info!(target: TRACING_TARGET, session_id = %id, "export started");
            spawn_worker(Arc::clone(&self.inner), id.clone());
        } else {
            state.queue.push_back(id.clone());
            tracing::info!(
                target: TRACING_TARGET,
                session_id = %id,
                position = state.queue.len(),
                "export queued"
            );
        }
        Ok(id)
    }

    /// Snapshot of a session; `None` when unknown or expired
    pub async fn get_session(&self, id: &str) -> Option<ExportSession> {
        let retention = self.inner.settings.manager.session_retention();
        let state = self.inner.state.lock().await;
        state
            .sessions
            .get(id)
            .filter(|e| !e.is_expired(retention))
            .map(|e| e.session.clone())
    }

    pub async fn get_progress(&self, id: &str) -> Option<ExportProgress> {
        self.get_session(id).await.map(|s| s.progress)
    }

    /// Cancel a session.
    ///
    /// Returns false when the session is unknown or already finished. A
    /// queued session never starts; a running one stops at its next
    /// checkpoint and its results are discarded.
    pub async fn cancel_export(&self, id: &str) -> bool {
        let mut state = self.inner.state.lock().await;
        let Some(entry) = state.sessions.get_mut(id) else {
            return false;
        };
        if !entry.set_status(ExportStatus::Cancelled) {
            return false;
        }
        entry.session.progress = ExportProgress::new(ExportStatus::Cancelled, 100, "Export cancelled");
        entry.cancel.cancel();
        state.queue.retain(|queued| queued != id);
        tracing::info!(target: TRACING_TARGET, session_id = %id, "export cancelled");
        true
    }

    /// Wait until a session is completed, failed or cancelled
    pub async fn wait(&self, id: &str) -> Option<ExportSession> {
        let mut rx = {
            let state = self.inner.state.lock().await;
            state.sessions.get(id)?.status_tx.subscribe()
        };
        rx.wait_for(|status| status.is_terminal()).await.ok()?;
        self.get_session(id).await
    }

    /// Documents of a completed session, optionally only one format
    pub async fn download_results(
        &self,
        id: &str,
        format: Option<ExportFormat>,
    ) -> Result<Vec<Document>> {
        let session = self
            .get_session(id)
            .await
            .ok_or_else(|| ExportError::results_unavailable(id))?;
        let results = match (session.status, session.results) {
            (ExportStatus::Completed, Some(results)) => results,
            (status, _) => {
                return Err(ExportError::results_unavailable(id)
                    .with_context("status", status.as_str()))
            }
        };

        match format {
            None => Ok(results.documents),
            Some(format) => {
                let docs: Vec<Document> = results
                    .documents
                    .into_iter()
                    .filter(|d| d.format() == format)
                    .collect();
                if docs.is_empty() {
                    return Err(ExportError::results_unavailable(id)
                        .with_context("format", format.as_str()));
                }
                Ok(docs)
            }
        }
    }

    /// Write the documents of a completed session into `dir`
    pub async fn save_results(
        &self,
        id: &str,
        dir: &Path,
        format: Option<ExportFormat>,
    ) -> Result<Vec<PathBuf>> {
        let documents = self.download_results(id, format).await?;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ExportError::delivery_io(&e, dir))?;

        let mut written = Vec::with_capacity(documents.len());
        for document in documents {
            let path = dir.join(document.filename());
            tokio::fs::write(&path, document.data())
                .await
                .map_err(|e| ExportError::delivery_io(&e, &path))?;
            tracing::info!(
                target: TRACING_TARGET,
                session_id = %id,
                path = %path.display(),
                bytes = document.size(),
                "document saved"
            );
            written.push(path);
        }
        Ok(written)
    }

    /// Drop finished sessions past their retention; returns how many were removed
    pub async fn cleanup(&self) -> usize {
        let retention = self.inner.settings.manager.session_retention();
        let mut state = self.inner.state.lock().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, e| !e.is_expired(retention));
        let removed = before - state.sessions.len();
        if removed > 0 {
            tracing::debug!(target: TRACING_TARGET, removed, "expired sessions removed");
        }
        removed
    }

    /// Run [`cleanup`](Self::cleanup) periodically until shutdown
    pub fn spawn_janitor(&self) -> JoinHandle<()> {
        let manager = self.clone();
        let period = (self.inner.settings.manager.session_retention() / 2).max(Duration::from_secs(1));
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    () = manager.inner.shutdown.cancelled() => break,
                    () = tokio::time::sleep(period) => {
                        manager.cleanup().await;
                    }
                }
            }
        })
    }

    /// Sessions currently holding a slot
    pub async fn active_exports(&self) -> usize {
        self.inner.state.lock().await.active
    }

    pub async fn queued_exports(&self) -> usize {
        self.inner.state.lock().await.queue.len()
    }

    /// Cancel every unfinished session and refuse new requests
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let mut state = self.inner.state.lock().await;
        state.queue.clear();
        let mut cancelled = 0;
        for entry in state.sessions.values_mut() {
            if entry.set_status(ExportStatus::Cancelled) {
                entry.session.progress =
                    ExportProgress::new(ExportStatus::Cancelled, 100, "Export cancelled");
                cancelled += 1;
            }
        }
        tracing::info!(target: TRACING_TARGET, cancelled, "export manager shut down");
    }
}

/// Hold one slot: run the session, then keep draining the queue
fn spawn_worker(inner: Arc<Inner>, first: String) {
    tokio::spawn(async move {
        let mut next = Some(first);
        while let Some(id) = next {
            let run = tokio::spawn(run_session(Arc::clone(&inner), id.clone()));
            if let Err(err) = run.await {
                let error = ExportError::worker_crashed(format!("Export worker stopped: {}", err));
                inner.fail(&id, error).await;
            }
            next = inner.release(&id).await;
        }
    });
}

async fn run_session(inner: Arc<Inner>, id: String) {
    let Some((request, cancel)) = inner.begin(&id).await else {
        return;
    };
    match run_pipeline(&inner, &id, &request, &cancel).await {
        Ok(results) => inner.complete(&id, results).await,
        Err(Stop::Cancelled) => {
            tracing::debug!(target: TRACING_TARGET, session_id = %id, "pipeline stopped after cancellation");
        }
        Err(Stop::Failed(error)) => inner.fail(&id, error).await,
    }
}

async fn run_pipeline(
    inner: &Inner,
    id: &str,
    request: &ExportRequest,
    cancel: &CancellationToken,
) -> std::result::Result<ExportResults, Stop> {
    let limits = &inner.settings.manager;
    let started = Instant::now();
    let (formats, mut warnings) = request.options.parsed_formats();

    // Capture
    inner
        .advance(id, ExportStatus::Capturing, "Capturing dashboard structure...")
        .await?;
    let phase = Instant::now();
    let timeout = limits.capture_timeout();
    let capture = tokio::select! {
        biased;

        () = cancel.cancelled() => return Err(Stop::Cancelled),
        result = tokio::time::timeout(timeout, inner.engine.capture(&request.target)) => match result {
            Ok(captured) => captured?,
            Err(_) => return Err(CaptureError::Timeout { secs: timeout.as_secs() }.into()),
        },
    };
    if let ExportScope::Selection { selection_ids } = &request.options.scope {
        if let Some(missing) = selection_ids
            .iter()
            .find(|sel| capture.root().find_by_id(sel).is_none())
        {
            return Err(CaptureError::ElementNotFound(missing.clone()).into());
        }
    }
    let capture_time = phase.elapsed();
    let elements_processed = capture.node_count();
    let capture = Arc::new(capture);
    inner
        .store(id, Artifacts::Captured {
            capture: Arc::clone(&capture),
        })
        .await;
    inner
        .progress(id, ExportStatus::Capturing, 100, "Dashboard captured successfully")
        .await;

    // Translation
    inner
        .advance(id, ExportStatus::Translating, "Translating to export format...")
        .await?;
    let phase = Instant::now();
    let options = TranslationOptions::for_request(
        &inner.settings.translation,
        &request.options,
        formats.clone(),
    );
    let ir = Translator::new(options)
        .translate(&capture)
        .map_err(ExportError::from)?;
    let translation_time = phase.elapsed();
    let ir = Arc::new(ir);
    inner
        .store(id, Artifacts::Translated {
            capture: Arc::clone(&capture),
            ir: Arc::clone(&ir),
        })
        .await;
    inner
        .progress(id, ExportStatus::Translating, 100, "Translation completed")
        .await;

    // Compilation
    inner
        .advance(id, ExportStatus::Compiling, "Compiling export documents...")
        .await?;
    let phase = Instant::now();
    let mut documents = Vec::with_capacity(formats.len());
    for (i, format) in formats.iter().copied().enumerate() {
        if cancel.is_cancelled() {
            return Err(Stop::Cancelled);
        }
        let percentage = (i * 100 / formats.len()) as u8;
        inner
            .progress(
                id,
                ExportStatus::Compiling,
                percentage,
                format!("Compiling {} document...", format),
            )
            .await;

        let Some(compiler) = inner.registry.get(format) else {
            tracing::warn!(
                target: TRACING_TARGET,
                session_id = %id,
                format = %format,
                "no compiler registered, skipping format"
            );
            warnings.push(format!("Skipped {}: no compiler registered", format));
            continue;
        };
        let job = CompileJob {
            compiler,
            ir: Arc::clone(&ir),
            capture: Arc::clone(&capture),
            root_id: request.target.root_id.clone(),
        };
        let document = job
            .run(id, limits.retry_attempts, cancel, &mut warnings)
            .await?;
        tracing::info!(
            target: TRACING_TARGET,
            session_id = %id,
            format = %format,
            bytes = document.size(),
            "document compiled"
        );
        documents.push(document);
    }
    let compilation_time = phase.elapsed();
    inner
        .progress(id, ExportStatus::Compiling, 100, "Compilation completed")
        .await;

    // Delivery
    inner
        .advance(id, ExportStatus::Delivering, "Preparing documents for delivery...")
        .await?;

    Ok(ExportResults {
        documents,
        metadata: ExportMetadata {
            total_time_ms: millis(started.elapsed()),
            capture_time_ms: millis(capture_time),
            translation_time_ms: millis(translation_time),
            compilation_time_ms: millis(compilation_time),
            elements_processed,
            warnings,
        },
    })
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// One format compiled on the blocking pool
struct CompileJob {
    compiler: Arc<dyn Compiler>,
    ir: Arc<IrDocument>,
    capture: Arc<CaptureTree>,
    root_id: Option<String>,
}

impl CompileJob {
    /// Compile, retrying recoverable failures up to `retries` more times
    async fn run(
        &self,
        id: &str,
        retries: u32,
        cancel: &CancellationToken,
        warnings: &mut Vec<String>,
    ) -> std::result::Result<Document, Stop> {
        let format = self.compiler.format();
        let mut attempt: u32 = 1;
        loop {
            let task = {
                let compiler = Arc::clone(&self.compiler);
                let ir = Arc::clone(&self.ir);
                let capture = Arc::clone(&self.capture);
                let root_id = self.root_id.clone();
                tokio::task::spawn_blocking(move || {
                    let ctx = CompileContext {
                        capture: Some(&*capture),
                        root_id: root_id.as_deref(),
                    };
                    compiler.compile_with(&ir, &ctx)
                })
            };
            let joined = tokio::select! {
                biased;

                () = cancel.cancelled() => return Err(Stop::Cancelled),
                joined = task => joined,
            };

            let err = match joined {
                Ok(Ok(document)) => return Ok(document),
                Ok(Err(err)) => ExportError::from(err)
                    .with_context("format", format.as_str())
                    .with_context("attempt", attempt),
                Err(join) => {
                    return Err(ExportError::worker_crashed(format!(
                        "{} compiler crashed: {}",
                        format, join
                    ))
                    .with_context("format", format.as_str())
                    .into())
                }
            };
            if !err.recoverable || attempt > retries {
                return Err(err.into());
            }
            tracing::warn!(
                target: TRACING_TARGET,
                session_id = %id,
                format = %format,
                attempt,
                error = %err,
                "compilation failed, retrying"
            );
            warnings.push(format!(
                "{} compilation attempt {} failed: {}",
                format, attempt, err.message
            ));
            attempt += 1;
        }
    }
}

impl Inner {
    /// Request and token of a session about to run, unless it already finished
    async fn begin(&self, id: &str) -> Option<(ExportRequest, CancellationToken)> {
        let state = self.state.lock().await;
        let entry = state.sessions.get(id)?;
        if entry.session.status.is_terminal() {
            return None;
        }
        Some((entry.session.request.clone(), entry.cancel.clone()))
    }

    /// Enter a phase; stops the pipeline when the session was cancelled meanwhile
    async fn advance(
        &self,
        id: &str,
        status: ExportStatus,
        message: &str,
    ) -> std::result::Result<(), Stop> {
        let mut state = self.state.lock().await;
        let entry = state.sessions.get_mut(id).ok_or(Stop::Cancelled)?;
        if !entry.set_status(status) {
            return Err(Stop::Cancelled);
        }
        entry.session.progress = ExportProgress::new(status, 0, message);
        entry.last_progress = Some(Instant::now());
        tracing::info!(target: TRACING_TARGET, session_id = %id, status = %status, "{}", message);
        Ok(())
    }

    /// Report progress within the current phase.
    ///
    /// Intermediate values closer together than the configured interval are
    /// dropped; 0 and 100 are always written.
    async fn progress(&self, id: &str, phase: ExportStatus, percentage: u8, message: impl Into<String>) {
        let interval = self.settings.manager.progress_update_interval();
        let mut state = self.state.lock().await;
        let Some(entry) = state.sessions.get_mut(id) else {
            return;
        };
        if entry.session.status != phase {
            return;
        }
        let boundary = percentage == 0 || percentage >= 100;
        if !boundary && entry.last_progress.is_some_and(|t| t.elapsed() < interval) {
            return;
        }
        let mut progress = ExportProgress::new(phase, percentage, message);
        progress.estimated_time_remaining =
            Some(estimate_remaining(entry.started.elapsed(), progress.percentage));
        tracing::debug!(
            target: TRACING_TARGET,
            session_id = %id,
            phase = %phase,
            percentage = progress.percentage,
            "{}",
            progress.message
        );
        entry.session.progress = progress;
        entry.last_progress = Some(Instant::now());
    }

    async fn store(&self, id: &str, artifacts: Artifacts) {
        let mut state = self.state.lock().await;
        if let Some(entry) = state.sessions.get_mut(id) {
            entry.session.artifacts = artifacts;
        }
    }

    async fn complete(&self, id: &str, results: ExportResults) {
        let mut state = self.state.lock().await;
        let Some(entry) = state.sessions.get_mut(id) else {
            return;
        };
        if !entry.set_status(ExportStatus::Completed) {
            return;
        }
        tracing::info!(
            target: TRACING_TARGET,
            session_id = %id,
            documents = results.documents.len(),
            warnings = results.metadata.warnings.len(),
            total_ms = results.metadata.total_time_ms,
            "export completed"
        );
        entry.session.progress =
            ExportProgress::new(ExportStatus::Completed, 100, "Export ready for download");
        entry.session.results = Some(results);
    }

    async fn fail(&self, id: &str, error: ExportError) {
        let mut state = self.state.lock().await;
        let Some(entry) = state.sessions.get_mut(id) else {
            return;
        };
        tracing::error!(
            target: TRACING_TARGET,
            session_id = %id,
            code = error.code.as_u16(),
            error = %error,
            "export failed"
        );
        entry.fail(error);
    }

    /// Free the slot held for `id`, or hand it to the next queued session
    async fn release(&self, id: &str) -> Option<String> {
        let mut state = self.state.lock().await;
        if let Some(entry) = state.sessions.get_mut(id) {
            // a session that stopped without reaching a terminal status was cancelled
            if entry.set_status(ExportStatus::Cancelled) {
                entry.session.progress =
                    ExportProgress::new(ExportStatus::Cancelled, 100, "Export cancelled");
            }
        }
        while let Some(next) = state.queue.pop_front() {
            let Some(entry) = state.sessions.get_mut(&next) else {
                continue;
            };
            if !entry.session.status.is_terminal() {
                entry.session.queued = false;
                tracing::info!(target: TRACING_TARGET, session_id = %next, "export dequeued");
                return Some(next);
            }
        }
        state.active = state.active.saturating_sub(1);
        None
    }
}
