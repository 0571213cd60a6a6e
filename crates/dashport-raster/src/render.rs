//! SVG to PNG through usvg, resvg and tiny-skia

use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::error::{RasterError, Result};

/// A rendered PNG and its pixel size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Options for a single rasterisation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Device pixels per logical pixel
    pub scale: f32,
    pub background: tiny_skia::Color,
    pub antialiasing: bool,
}

static SYSTEM_FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();

/// System fonts, loaded once per process
fn system_fonts() -> Arc<usvg::fontdb::Database> {
    SYSTEM_FONTS
        .get_or_init(|| {
            let mut fontdb = usvg::fontdb::Database::new();
            fontdb.load_system_fonts();
            if fontdb.is_empty() {
                warn!("No system fonts found, text rendering may be limited");
            }
            Arc::new(fontdb)
        })
        .clone()
}

/// System fonts plus the given font files
pub fn font_database(font_paths: &[String]) -> Result<Arc<usvg::fontdb::Database>> {
    let mut fontdb = system_fonts();
    if font_paths.is_empty() {
        return Ok(fontdb);
    }
    let db = Arc::make_mut(&mut fontdb);
    for path in font_paths {
        db.load_font_file(path)
            .map_err(|e| RasterError::Font(format!("Failed to read font {}: {}", path, e)))?;
    }
    Ok(fontdb)
}

/// Rasterise SVG markup to PNG bytes
pub fn svg_to_png(
    svg: &str,
    fontdb: Arc<usvg::fontdb::Database>,
    options: RasterOptions,
) -> Result<RenderedImage> {
    let tree = {
        let mut opts = usvg::Options::default();
        opts.fontdb = fontdb;
        opts.shape_rendering = if options.antialiasing {
            usvg::ShapeRendering::GeometricPrecision
        } else {
            usvg::ShapeRendering::CrispEdges
        };
        opts.text_rendering = if options.antialiasing {
            usvg::TextRendering::OptimizeLegibility
        } else {
            usvg::TextRendering::OptimizeSpeed
        };
        usvg::Tree::from_str(svg, &opts).map_err(|e| RasterError::Svg(e.to_string()))?
    };

    let size = tree.size();
    let width = (size.width() * options.scale).ceil() as u32;
    let height = (size.height() * options.scale).ceil() as u32;
    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(RasterError::Pixmap { width, height })?;
    pixmap.fill(options.background);

    let transform = tiny_skia::Transform::from_scale(options.scale, options.scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let png = pixmap
        .encode_png()
        .map_err(|e| RasterError::Encode(e.to_string()))?;
    debug!(width, height, bytes = png.len(), "png encoded");
    Ok(RenderedImage { png, width, height })
}

/// Parse a CSS colour string to a tiny-skia colour
pub fn parse_color(color: &str) -> Option<tiny_skia::Color> {
    let color = color.trim().to_ascii_lowercase();
    match color.as_str() {
        "white" => return Some(tiny_skia::Color::WHITE),
        "black" => return Some(tiny_skia::Color::BLACK),
        "transparent" => return Some(tiny_skia::Color::TRANSPARENT),
        _ => {}
    }

    let hex = color.strip_prefix('#')?;
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => {
            let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
            parse_color(&format!("#{}", expanded))
        }
        6 => Some(tiny_skia::Color::from_rgba8(
            channel(0)?,
            channel(2)?,
            channel(4)?,
            255,
        )),
        8 => Some(tiny_skia::Color::from_rgba8(
            channel(0)?,
            channel(2)?,
            channel(4)?,
            channel(6)?,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="5" viewBox="0 0 10 5"><rect x="0" y="0" width="5" height="5" fill="#FF0000"/></svg>"##;

    fn options(scale: f32) -> RasterOptions {
        RasterOptions {
            scale,
            background: tiny_skia::Color::WHITE,
            antialiasing: true,
        }
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("white"), Some(tiny_skia::Color::WHITE));
        assert_eq!(
            parse_color("#f00"),
            Some(tiny_skia::Color::from_rgba8(255, 0, 0, 255))
        );
        assert_eq!(
            parse_color("#00ff0080"),
            Some(tiny_skia::Color::from_rgba8(0, 255, 0, 128))
        );
        assert_eq!(parse_color("rgb(1, 2, 3)"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
    }

    #[test]
    fn test_scaled_output_with_background() {
        let fontdb = Arc::new(usvg::fontdb::Database::new());
        let image = svg_to_png(SQUARE, fontdb, options(2.0)).unwrap();
        assert_eq!((image.width, image.height), (20, 10));
        assert!(image.png.starts_with(b"\x89PNG"));

        let pixmap = tiny_skia::Pixmap::decode_png(&image.png).unwrap();
        let red = pixmap.pixel(2, 2).unwrap();
        assert_eq!((red.red(), red.green(), red.blue()), (255, 0, 0));
        let white = pixmap.pixel(18, 8).unwrap();
        assert_eq!((white.red(), white.green(), white.blue()), (255, 255, 255));
    }

    #[test]
    fn test_invalid_svg() {
        let fontdb = Arc::new(usvg::fontdb::Database::new());
        let err = svg_to_png("<svg", fontdb, options(1.0)).unwrap_err();
        assert_eq!(err.code(), "RAST001");
    }

    #[test]
    fn test_missing_font_file() {
        let err = font_database(&["/nonexistent/brand.ttf".to_string()]).unwrap_err();
        assert_eq!(err.code(), "RAST004");
    }
}
