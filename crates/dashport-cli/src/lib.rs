//! dashport CLI - Command-line interface library
//!
//! This library provides the CLI functionality for dashport:
//! - Export: run a captured dashboard through the export pipeline
//! - Inspect: show how a capture is paginated, without compiling
//! - Config: print or write the default configuration
//!
//! # Library Usage
//!
//! ```ignore
//! use dashport_cli::{export_command, ExportArgs};
//!
//! let mut args = ExportArgs::new("capture.json", "out");
//! args.formats = vec!["pdf".into(), "excel".into()];
//! let summary = export_command(&args).await?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Export to PDF and Excel
//! dashport export capture.json --format pdf --format excel --out reports/
//!
//! # Show the pages a capture translates to
//! dashport inspect capture.json --layout multi
//!
//! # Start a configuration file
//! dashport config --output dashport.toml
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{config_command, export_command, inspect_command, load_settings, read_capture};
pub use app::{
    init_tracing, run_cli, ExportArgs, ExportSummary, GroupingArg, LayoutArg, OutputFormat,
    QualityArg,
};
