//! Layout to Typst markup transpiler
//!
//! Every draw operation becomes an absolutely placed element on a page with
//! zero margins, so Typst only typesets what the layout already decided.

use dashport_ir::document::{DocumentInfo, HAlign};

use crate::layout::{DrawOp, Layout, LineOp, RectOp, Rgb, TextOp};

/// Transpiler for converting a computed layout to Typst markup
pub struct Transpiler;

impl Transpiler {
    /// Transpile a layout to Typst markup
    pub fn transpile(layout: &Layout, info: &DocumentInfo) -> String {
        let g = &layout.geometry;
        let mut output = String::new();

        output.push_str(&Self::document_metadata(info));
        output.push_str(&format!(
            "#set page(width: {}, height: {}, margin: 0mm)\n",
            mm(g.width),
            mm(g.height)
        ));
        output.push_str("#set text(font: (\"Verdana\", \"DejaVu Sans\", \"Liberation Sans\"), size: 11pt)\n\n");

        for (i, page) in layout.pages.iter().enumerate() {
            if i > 0 {
                output.push_str("#pagebreak()\n");
            }
            for op in &page.ops {
                output.push_str(&Self::transpile_op(op));
                output.push('\n');
            }
            if page.ops.is_empty() {
                // an empty page still needs content to be emitted
                output.push_str("#box()\n");
            }
        }

        output
    }

    fn document_metadata(info: &DocumentInfo) -> String {
        let mut fields = Vec::new();
        if !info.title.is_empty() {
            fields.push(format!("title: \"{}\"", escape_string(&info.title)));
        }
        if !info.author.name.is_empty() {
            fields.push(format!("author: \"{}\"", escape_string(&info.author.name)));
        }
        if !info.tags.is_empty() {
            let keywords: Vec<String> = info
                .tags
                .iter()
                .map(|t| format!("\"{}\"", escape_string(t)))
                .collect();
            // trailing comma keeps a single keyword an array
            fields.push(format!("keywords: ({},)", keywords.join(", ")));
        }
        if fields.is_empty() {
            return String::new();
        }
        format!("#set document({})\n", fields.join(", "))
    }

    /// Transpile a single draw operation
    fn transpile_op(op: &DrawOp) -> String {
        match op {
            DrawOp::Text(text) => Self::transpile_text(text),
            DrawOp::Rect(rect) => Self::transpile_rect(rect),
            DrawOp::Line(line) => Self::transpile_line(line),
            DrawOp::Image(image) => format!(
                "#place(top + left, dx: {}, dy: {}, image(\"{}\", width: {}, height: {}, fit: \"contain\"))",
                mm(image.x),
                mm(image.y),
                escape_string(&image.name),
                mm(image.width),
                mm(image.height)
            ),
            DrawOp::Watermark { text, opacity } => {
                let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
                format!(
                    "#place(center + horizon, rotate(-45deg, text(size: 60pt, fill: rgb(200, 200, 200, {}), \"{}\")))",
                    alpha,
                    escape_string(text)
                )
            }
        }
    }

    fn transpile_text(op: &TextOp) -> String {
        let mut attrs = vec![format!("size: {}pt", num(op.size))];
        if op.bold {
            attrs.push("weight: \"bold\"".to_string());
        }
        if op.italic {
            attrs.push("style: \"italic\"".to_string());
        }
        attrs.push(format!("fill: {}", color(op.color)));

        let text = format!("text({}, \"{}\")", attrs.join(", "), escape_string(&op.text));
        let align = match op.align {
            HAlign::Left | HAlign::Justify => "left",
            HAlign::Center => "center",
            HAlign::Right => "right",
        };
        format!(
            "#place(top + left, dx: {}, dy: {}, box(width: {}, align({}, {})))",
            mm(op.x),
            mm(op.y),
            mm(op.width.max(1.0)),
            align,
            text
        )
    }

    fn transpile_rect(op: &RectOp) -> String {
        let mut attrs = vec![
            format!("width: {}", mm(op.width.max(0.0))),
            format!("height: {}", mm(op.height.max(0.0))),
        ];
        match op.fill {
            Some(fill) => attrs.push(format!("fill: {}", color(fill))),
            None => attrs.push("fill: none".to_string()),
        }
        match op.stroke {
            Some(stroke) => attrs.push(format!("stroke: 0.5pt + {}", color(stroke))),
            None => attrs.push("stroke: none".to_string()),
        }
        if op.radius > 0.0 {
            attrs.push(format!("radius: {}", mm(op.radius)));
        }
        format!(
            "#place(top + left, dx: {}, dy: {}, rect({}))",
            mm(op.x),
            mm(op.y),
            attrs.join(", ")
        )
    }

    fn transpile_line(op: &LineOp) -> String {
        format!(
            "#place(top + left, line(start: ({}, {}), end: ({}, {}), stroke: {}pt + {}))",
            mm(op.x1),
            mm(op.y1),
            mm(op.x2),
            mm(op.y2),
            num(op.thickness),
            color(op.color)
        )
    }
}

fn num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{}", rounded)
}

fn mm(value: f64) -> String {
    format!("{}mm", num(value))
}

fn color(rgb: Rgb) -> String {
    format!("rgb(\"{}\")", rgb.to_hex())
}

/// Escape a string for use inside a Typst string literal
fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Geometry, PageOps, PdfSettings};

    fn layout(ops: Vec<DrawOp>) -> Layout {
        Layout {
            geometry: Geometry::from_settings(&PdfSettings::default()),
            pages: vec![PageOps {
                ops,
                snapshot: false,
            }],
            images: Vec::new(),
        }
    }

    #[test]
    fn test_page_setup() {
        let typst = Transpiler::transpile(&layout(vec![]), &DocumentInfo::default());
        assert!(typst.contains("#set page(width: 210mm, height: 297mm, margin: 0mm)"));
        assert!(typst.contains("#box()"));
        assert!(!typst.contains("#set document"));
    }

    #[test]
    fn test_text_op() {
        let op = DrawOp::Text(TextOp {
            x: 20.0,
            y: 35.5,
            width: 170.0,
            text: "Revenue \"Q3\"".to_string(),
            size: 18.0,
            bold: true,
            italic: false,
            color: Rgb(0x9e, 0x1f, 0x63),
            align: HAlign::Center,
        });
        let typst = Transpiler::transpile(&layout(vec![op]), &DocumentInfo::default());
        assert!(typst.contains("dx: 20mm, dy: 35.5mm"));
        assert!(typst.contains("weight: \"bold\""));
        assert!(typst.contains("fill: rgb(\"#9e1f63\")"));
        assert!(typst.contains("align(center,"));
        assert!(typst.contains("Revenue \\\"Q3\\\""));
    }

    #[test]
    fn test_rect_and_line() {
        let rect = DrawOp::Rect(RectOp {
            x: 0.0,
            y: 0.0,
            width: 60.0,
            height: 30.0,
            fill: Some(Rgb::gray(248)),
            stroke: Some(Rgb::gray(224)),
            radius: 3.0,
        });
        let line = DrawOp::Line(LineOp {
            x1: 20.0,
            y1: 262.0,
            x2: 190.0,
            y2: 262.0,
            color: Rgb::BLACK,
            thickness: 0.7,
        });
        let typst = Transpiler::transpile(&layout(vec![rect, line]), &DocumentInfo::default());
        assert!(typst.contains("rect(width: 60mm, height: 30mm, fill: rgb(\"#f8f8f8\"), stroke: 0.5pt + rgb(\"#e0e0e0\"), radius: 3mm)"));
        assert!(typst.contains("line(start: (20mm, 262mm), end: (190mm, 262mm), stroke: 0.7pt + rgb(\"#000000\"))"));
    }

    #[test]
    fn test_document_metadata() {
        let info = DocumentInfo {
            title: "Sales".to_string(),
            tags: vec!["dashboard".to_string()],
            ..Default::default()
        };
        let typst = Transpiler::transpile(&layout(vec![]), &info);
        assert!(typst.contains("#set document(title: \"Sales\", keywords: (\"dashboard\",))"));
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("a\\b"), "a\\\\b");
        assert_eq!(escape_string("line\nbreak"), "line\\nbreak");
        assert_eq!(escape_string("#hash"), "#hash");
    }
}
