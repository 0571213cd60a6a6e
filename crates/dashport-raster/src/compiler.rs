//! IR (and capture) to PNG compiler

use dashport_ir::media::decode_image;
use dashport_ir::{CompileContext, CompileResult, Compiler, Document, ExportFormat, IrDocument};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::filter::{prune, select_root};
use crate::render::{font_database, parse_color, svg_to_png, RasterOptions, RenderedImage};
use crate::scene::{board_from_capture, board_from_ir, Board, Scene};
use crate::svg::{Palette, SvgWriter};

/// Image options, read from the `[image]` table of the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterSettings {
    /// Device pixels per logical pixel
    pub scale: f32,
    /// CSS colour painted under the scene
    pub background: String,
    /// Board width in logical pixels when the capture carries no viewport
    pub width: f64,
    /// Tallest board rendered, in logical pixels; the rest is cut
    pub max_height: f64,
    /// Extra font files
    pub font_paths: Vec<String>,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            scale: 2.0,
            background: "#ffffff".to_string(),
            width: 1280.0,
            max_height: 8192.0,
            font_paths: Vec::new(),
        }
    }
}

/// Compiler producing a PNG of the dashboard
#[derive(Debug, Clone, Default)]
pub struct RasterCompiler {
    settings: RasterSettings,
}

impl RasterCompiler {
    pub fn new(settings: RasterSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RasterSettings {
        &self.settings
    }

    /// Choose what to draw.
    ///
    /// A capture wins over the IR: its selected subtree is filtered and
    /// drawn. Without one, a whole-dashboard snapshot is reproduced, and
    /// failing that the IR pages are drawn.
    pub fn scene(&self, ir: &IrDocument, ctx: &CompileContext<'_>) -> Scene {
        if let Some(capture) = ctx.capture {
            let root = select_root(capture, ctx.root_id);
            let board = match prune(root) {
                Some(node) => board_from_capture(capture, &node, ir.title()),
                None => Board {
                    title: ir.title().to_string(),
                    blocks: Vec::new(),
                },
            };
            debug!(root = %root.id, blocks = board.blocks.len(), "image scene from capture");
            return Scene::Board(board);
        }

        let snapshot = ir
            .resources
            .visual_snapshot()
            .and_then(|(_, media)| media.data.as_deref())
            .and_then(decode_image);
        match snapshot {
            Some(image) => {
                debug!(bytes = image.bytes.len(), "image scene from snapshot");
                Scene::Snapshot(image)
            }
            None => Scene::Board(board_from_ir(ir)),
        }
    }

    /// Compile to PNG bytes plus pixel size
    pub fn render(&self, ir: &IrDocument, ctx: &CompileContext<'_>) -> Result<RenderedImage> {
        let scene = self.scene(ir, ctx);
        let width = ctx
            .capture
            .map(|c| c.metadata.environment_context.viewport.width)
            .filter(|w| w.is_finite() && *w >= 320.0)
            .unwrap_or(self.settings.width);

        let palette = Palette::from_styles(&ir.resources.styles);
        let (svg, _, _) = SvgWriter::new(&palette, width, self.settings.max_height)
            .with_watermark(ir.export_config.watermark.as_ref())
            .write(&scene);

        let options = RasterOptions {
            scale: self.settings.scale,
            background: parse_color(&self.settings.background)
                .unwrap_or(tiny_skia::Color::WHITE),
            antialiasing: ir.export_config.quality_settings.antialiasing,
        };
        let image = svg_to_png(&svg, font_database(&self.settings.font_paths)?, options)?;
        info!(
            width = image.width,
            height = image.height,
            bytes = image.png.len(),
            "image rendered"
        );
        Ok(image)
    }
}

impl Compiler for RasterCompiler {
    fn format(&self) -> ExportFormat {
        ExportFormat::Image
    }

    fn compile(&self, ir: &IrDocument) -> CompileResult<Document> {
        self.compile_with(ir, &CompileContext::default())
    }

    fn compile_with(&self, ir: &IrDocument, ctx: &CompileContext<'_>) -> CompileResult<Document> {
        let image = self.render(ir, ctx)?;
        Ok(Document::new(ExportFormat::Image, ir.title(), image.png))
    }
}
