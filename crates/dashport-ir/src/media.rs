//! Embedded media decoding
//!
//! Media reaches the IR as base64 payloads or `data:` URLs. Compilers decode
//! them here; anything that does not decode is handed to the compiler's
//! placeholder path.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// A decoded raster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// MIME type, from the data URL or sniffed from the payload
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// Pixel dimensions, when the payload is a PNG that decodes
    pub dimensions: Option<(u32, u32)>,
}

impl DecodedImage {
    /// File extension for the payload
    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }

    /// Width over height, if known
    pub fn aspect_ratio(&self) -> Option<f64> {
        let (w, h) = self.dimensions?;
        (h > 0).then(|| w as f64 / h as f64)
    }
}

/// Decode a base64 payload or `data:` URL.
///
/// Remote URLs are not fetched and yield `None`.
pub fn decode_image(src: &str) -> Option<DecodedImage> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }

    let (declared_mime, payload) = match src.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',')?;
            let mime = header.strip_suffix(";base64")?;
            (Some(mime.to_string()), payload)
        }
        None if src.contains("://") => return None,
        None => (None, src),
    };

    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(cleaned).ok()?;
    let mime_type = declared_mime
        .filter(|m| !m.is_empty())
        .or_else(|| sniff_mime(&bytes).map(str::to_string))?;
    let dimensions = if mime_type == "image/png" {
        png_dimensions(&bytes)
    } else {
        None
    };

    Some(DecodedImage {
        mime_type,
        bytes,
        dimensions,
    })
}

/// Guess the MIME type from magic bytes
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else {
        None
    }
}

/// Pixel dimensions of a PNG
pub fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let pixmap = tiny_skia::Pixmap::decode_png(bytes).ok()?;
    Some((pixmap.width(), pixmap.height()))
}

/// Encode bytes as a `data:` URL
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// File extension for a MIME type
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" | "image/jpg" => "jpeg",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        _ => "png",
    }
}

/// MIME type for a file extension
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
