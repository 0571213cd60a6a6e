//! # dashport-core
//!
//! The export pipeline: a capture tree of a rendered dashboard goes in,
//! compiled PDF, PowerPoint, Excel and PNG documents come out.
//!
//! - **Capture**: a [`CaptureEngine`] produces the [`CaptureTree`](dashport_ir::CaptureTree)
//! - **Translation**: the [`Translator`] paginates it into the IR
//! - **Compilation**: one registered compiler per requested format
//! - **Sessions**: the [`ExportManager`] runs requests concurrently, with a
//!   bounded queue, retries, cancellation and progress reporting
//!
//! ## Example
//!
//! ```rust,ignore
//! use dashport_core::{ExportManager, ExportRequest, JsonFileCapture, Settings};
//!
//! let manager = ExportManager::with_default_compilers(
//!     Settings::default(),
//!     JsonFileCapture::new("capture.json"),
//! )?;
//! let id = manager.export(ExportRequest::new(["pdf", "xlsx"])).await?;
//! manager.wait(&id).await;
//! manager.save_results(&id, "out".as_ref(), None).await?;
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod manager;
pub mod registry;
pub mod request;
pub mod session;
pub mod translator;

pub use capture::{CaptureEngine, CaptureError, CaptureTarget, JsonFileCapture, StaticCapture};
pub use config::{ConfigError, PageLayoutStrategy, SectionGrouping, Settings};
pub use error::{ErrorCode, ExportError, Phase, Result};
pub use manager::ExportManager;
pub use registry::CompilerRegistry;
pub use request::{ExportOptions, ExportRequest, ExportScope};
pub use session::{ExportMetadata, ExportProgress, ExportResults, ExportSession, ExportStatus};
pub use translator::{TranslationError, TranslationOptions, Translator};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
