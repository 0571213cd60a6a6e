//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use dashport_core::config::CONFIG_FILE_NAME;
use dashport_core::{
    ExportManager, ExportRequest, ExportStatus, JsonFileCapture, PageLayoutStrategy,
    SectionGrouping, Settings, TranslationOptions, Translator,
};
use dashport_ir::{CaptureTree, IrDocument, QualityLevel, Watermark};

/// Output format for the inspect command
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable page summary
    #[default]
    Text,
    /// The full IR document as JSON
    Json,
}

/// Page layout strategy
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LayoutArg {
    Single,
    Multi,
    Auto,
}

impl From<LayoutArg> for PageLayoutStrategy {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Single => Self::Single,
            LayoutArg::Multi => Self::Multi,
            LayoutArg::Auto => Self::Auto,
        }
    }
}

/// Section grouping of the multi-page layout
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GroupingArg {
    Type,
    Position,
    Custom,
}

impl From<GroupingArg> for SectionGrouping {
    fn from(arg: GroupingArg) -> Self {
        match arg {
            GroupingArg::Type => Self::Type,
            GroupingArg::Position => Self::Position,
            GroupingArg::Custom => Self::Custom,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum QualityArg {
    Low,
    Medium,
    High,
    Maximum,
}

impl From<QualityArg> for QualityLevel {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Low => Self::Low,
            QualityArg::Medium => Self::Medium,
            QualityArg::High => Self::High,
            QualityArg::Maximum => Self::Maximum,
        }
    }
}

#[derive(Parser)]
#[command(name = "dashport")]
#[command(author, version, about = "Export captured dashboards to PDF, PowerPoint, Excel and PNG", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a captured dashboard to one or more formats
    Export(ExportArgs),

    /// Translate a captured dashboard and show the resulting pages
    Inspect {
        /// Capture tree JSON file
        capture: PathBuf,

        /// Page layout strategy (overrides the configuration)
        #[arg(short, long, value_enum)]
        layout: Option<LayoutArg>,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the default configuration, or write it to a file
    Config {
        /// File to write instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Arguments of the export command
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Capture tree JSON file
    pub capture: PathBuf,

    /// Output formats (pdf, powerpoint, excel, image); repeatable
    #[arg(short, long = "format", default_value = "pdf")]
    pub formats: Vec<String>,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    pub out: PathBuf,

    /// Quality level (overrides the configuration)
    #[arg(short, long, value_enum)]
    pub quality: Option<QualityArg>,

    /// Page layout strategy (overrides the configuration)
    #[arg(short, long, value_enum)]
    pub layout: Option<LayoutArg>,

    /// Section grouping for the multi layout
    #[arg(short, long, value_enum)]
    pub grouping: Option<GroupingArg>,

    /// Node the export starts from
    #[arg(short, long)]
    pub root: Option<String>,

    /// Watermark text drawn on PDF pages
    #[arg(long)]
    pub watermark: Option<String>,

    /// Keep interactions in the exported documents
    #[arg(long)]
    pub interactive: bool,

    /// Configuration file path (defaults to ./dashport.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl ExportArgs {
    /// Arguments with the command-line defaults
    pub fn new(capture: impl Into<PathBuf>, out: impl Into<PathBuf>) -> Self {
        Self {
            capture: capture.into(),
            formats: vec!["pdf".to_string()],
            out: out.into(),
            quality: None,
            layout: None,
            grouping: None,
            root: None,
            watermark: None,
            interactive: false,
            config: None,
        }
    }
}

/// Outcome of a successful export
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub session_id: String,
    pub files: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Export(args) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start the async runtime")?;
            let summary = runtime.block_on(export_command(&args))?;
            for warning in &summary.warnings {
                println!("warning: {}", warning);
            }
            for file in &summary.files {
                println!("Wrote {}", file.display());
            }
        }
        Commands::Inspect {
            capture,
            layout,
            format,
            config,
        } => {
            let output = inspect_command(&capture, layout, format, config.as_deref())?;
            println!("{}", output);
        }
        Commands::Config { output } => {
            let toml = config_command(output.as_deref())?;
            if output.is_none() {
                print!("{}", toml);
            }
        }
    }

    Ok(())
}

/// Install the stderr subscriber; RUST_LOG wins over `--verbose`
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // a second initialization (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Settings from an explicit file, else `./dashport.toml`, else defaults
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    if let Some(path) = path {
        return Settings::load(path)
            .with_context(|| format!("Failed to load configuration: {}", path.display()));
    }
    let local = Path::new(CONFIG_FILE_NAME);
    if local.exists() {
        tracing::debug!(path = %local.display(), "using local configuration");
        return Settings::load(local)
            .with_context(|| format!("Failed to load configuration: {}", local.display()));
    }
    Ok(Settings::default())
}

/// Execute the export command
pub async fn export_command(args: &ExportArgs) -> Result<ExportSummary> {
    if !args.capture.exists() {
        bail!("Capture file not found: {}", args.capture.display());
    }

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(layout) = args.layout {
        settings.translation.page_layout = layout.into();
    }
    if let Some(grouping) = args.grouping {
        settings.translation.section_grouping = grouping.into();
    }

    let manager = ExportManager::with_default_compilers(settings, JsonFileCapture::new(&args.capture))
        .context("Invalid configuration")?;

    let mut request = ExportRequest::new(args.formats.iter().cloned());
    request.options.include_interactions = args.interactive;
    if let Some(quality) = args.quality {
        request = request.with_quality(quality.into());
    }
    if let Some(root) = &args.root {
        request = request.with_root(root.clone());
    }
    if let Some(text) = &args.watermark {
        request = request.with_watermark(Watermark::new(text.clone()));
    }

    tracing::info!(capture = %args.capture.display(), formats = ?args.formats, "exporting");
    let session_id = manager
        .export(request)
        .await
        .context("Failed to start the export")?;
    let session = manager
        .wait(&session_id)
        .await
        .with_context(|| format!("Export session {} disappeared", session_id))?;

    match session.status {
        ExportStatus::Completed => {}
        ExportStatus::Failed => {
            let reason = session
                .errors
                .first()
                .map(ToString::to_string)
                .unwrap_or_else(|| "unknown error".to_string());
            bail!("Export failed: {}", reason);
        }
        other => bail!("Export ended as {}", other),
    }

    let warnings = session
        .results
        .as_ref()
        .map(|r| r.metadata.warnings.clone())
        .unwrap_or_default();
    let files = manager
        .save_results(&session_id, &args.out, None)
        .await
        .with_context(|| format!("Failed to write results to {}", args.out.display()))?;

    Ok(ExportSummary {
        session_id,
        files,
        warnings,
    })
}

/// Read a capture tree from a JSON file
pub fn read_capture(path: &Path) -> Result<CaptureTree> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read capture file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid capture tree: {}", path.display()))
}

/// Execute the inspect command
pub fn inspect_command(
    input: &Path,
    layout: Option<LayoutArg>,
    format: OutputFormat,
    config: Option<&Path>,
) -> Result<String> {
    let settings = load_settings(config)?;
    let capture = read_capture(input)?;

    let mut options = TranslationOptions::from(&settings.translation);
    if let Some(layout) = layout {
        options = options.with_page_layout(layout.into());
    }
    let ir = Translator::new(options)
        .translate(&capture)
        .with_context(|| format!("Failed to translate {}", input.display()))?;

    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&ir).context("Failed to serialize the IR document")
        }
        OutputFormat::Text => Ok(page_summary(&ir)),
    }
}

fn page_summary(ir: &IrDocument) -> String {
    let mut out = format!(
        "{} ({} pages, {} sections)\n",
        ir.title(),
        ir.pages.len(),
        ir.section_count()
    );
    for page in &ir.pages {
        out.push_str(&format!("\n{} [{}]\n", page.title, page.id));
        for section in &page.sections {
            out.push_str(&format!(
                "  - {} {}: {}\n",
                section.id,
                section.content_type(),
                section.display_title()
            ));
        }
    }
    out
}

/// Execute the config command
pub fn config_command(output: Option<&Path>) -> Result<String> {
    let toml = toml::to_string_pretty(&Settings::default())
        .context("Failed to serialize the default configuration")?;
    if let Some(path) = output {
        if path.exists() {
            bail!("Refusing to overwrite {}", path.display());
        }
        fs::write(path, &toml).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }
    Ok(toml)
}
