//! Decode rendered PNGs and inspect pixels

use dashport_ir::capture::DataProperties;
use dashport_ir::document::{
    ChartConfig, ChartData, ChartFallback, Dataset, MetricContent, Page, PageKind, PageLayout,
    PageMetadata, Section,
};
use dashport_ir::media::to_data_url;
use dashport_ir::{
    CaptureNode, CaptureTree, CellValue, ChartContent, CompileContext, Compiler, Content,
    ExportFormat, IrDocument, MediaKind, MediaResource, NodeSubtype,
};
use dashport_raster::{RasterCompiler, RasterSettings};
use tiny_skia::Pixmap;

fn rgb(pixmap: &Pixmap, x: u32, y: u32) -> (u8, u8, u8) {
    let p = pixmap.pixel(x, y).expect("pixel in range");
    (p.red(), p.green(), p.blue())
}

fn sample_document() -> IrDocument {
    let metric = Content::Metric(MetricContent {
        label: "Revenue".to_string(),
        value: "12,500".to_string(),
        unit: None,
        change: None,
        styling: Default::default(),
    });
    let chart = Content::Chart(ChartContent {
        chart_type: "bar".to_string(),
        data: ChartData {
            labels: vec!["Q1".to_string(), "Q2".to_string()],
            datasets: vec![Dataset {
                label: "Units".to_string(),
                data: vec![Some(5.0), Some(7.0)],
                color: None,
            }],
        },
        config: ChartConfig::default(),
        fallback: ChartFallback::default(),
    });

    let mut ir = IrDocument::new("Q3 Review");
    ir.pages = vec![Page {
        id: "main".to_string(),
        title: "Main".to_string(),
        kind: PageKind::Dashboard,
        layout: PageLayout::flow(20.0),
        sections: vec![Section::new("m1", metric), Section::new("c1", chart)],
        metadata: PageMetadata::default(),
    }];
    ir
}

#[test]
fn test_ir_board_rendered_at_double_scale() {
    let doc = RasterCompiler::default().compile(&sample_document()).unwrap();
    assert_eq!(doc.format(), ExportFormat::Image);
    assert_eq!(doc.filename(), "Q3_Review.png");
    assert_eq!(doc.mime_type(), "image/png");

    let pixmap = Pixmap::decode_png(doc.data()).unwrap();
    assert_eq!(pixmap.width(), 2560);
    // header band in the brand colour, white page margin below it
    assert_eq!(rgb(&pixmap, 4, 4), (0x9E, 0x1F, 0x63));
    assert_eq!(rgb(&pixmap, 10, 200), (255, 255, 255));
}

#[test]
fn test_capture_viewport_sets_width() {
    let metric = CaptureNode::widget("m1", NodeSubtype::Metric).with_data(DataProperties {
        label: Some("Orders".to_string()),
        value: Some(CellValue::Number(42.0)),
        ..Default::default()
    });
    let mut button = CaptureNode::container("export");
    button.metadata.tag = Some("button".to_string());
    let mut board = CaptureNode::container("board").with_children([metric, button]);
    board
        .metadata
        .attributes
        .insert("data-dashboard".to_string(), "true".to_string());

    let mut capture = CaptureTree::new(CaptureNode::container("root").with_child(board));
    capture.metadata.environment_context.viewport.width = 800.0;
    let ctx = CompileContext {
        capture: Some(&capture),
        root_id: None,
    };
    let doc = RasterCompiler::default()
        .compile_with(&sample_document(), &ctx)
        .unwrap();
    let pixmap = Pixmap::decode_png(doc.data()).unwrap();
    assert_eq!(pixmap.width(), 1600);
}

#[test]
fn test_snapshot_reproduced() {
    let mut source = Pixmap::new(8, 4).unwrap();
    source.fill(tiny_skia::Color::from_rgba8(0, 0, 0, 255));
    let png = source.encode_png().unwrap();

    let mut ir = IrDocument::new("Snapshot");
    ir.resources.media.insert(
        "snap".to_string(),
        MediaResource {
            kind: MediaKind::Snapshot,
            url: "dashboard_snapshot".to_string(),
            data: Some(to_data_url("image/png", &png)),
            mime_type: Some("image/png".to_string()),
            dimensions: None,
        },
    );
    let doc = RasterCompiler::default().compile(&ir).unwrap();
    let pixmap = Pixmap::decode_png(doc.data()).unwrap();
    assert_eq!((pixmap.width(), pixmap.height()), (16, 8));
    assert_eq!(rgb(&pixmap, 8, 4), (0, 0, 0));
}

#[test]
fn test_custom_scale_and_background() {
    let settings = RasterSettings {
        scale: 1.0,
        background: "#000000".to_string(),
        ..Default::default()
    };
    let doc = RasterCompiler::new(settings)
        .compile(&IrDocument::new("Empty"))
        .unwrap();
    let pixmap = Pixmap::decode_png(doc.data()).unwrap();
    assert_eq!(pixmap.width(), 1280);
    // below the header the empty board shows the background
    assert_eq!(rgb(&pixmap, 10, pixmap.height() - 2), (0, 0, 0));
}

#[test]
fn test_missing_font_file_is_resource_error() {
    let settings = RasterSettings {
        font_paths: vec!["/nonexistent/brand.ttf".to_string()],
        ..Default::default()
    };
    let err = RasterCompiler::new(settings)
        .compile(&IrDocument::new("x"))
        .unwrap_err();
    assert_eq!(err.code(), 3002);
}
