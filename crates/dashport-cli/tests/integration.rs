//! Integration tests for the dashport CLI
//!
//! These tests run captured dashboards through the real compilers and read
//! the written packages back.

use std::fs;
use std::path::{Path, PathBuf};

use dashport_cli::{
    config_command, export_command, inspect_command, load_settings, ExportArgs, LayoutArg,
    OutputFormat,
};
use dashport_ir::capture::{CapturedChartData, CapturedDataset, DataProperties};
use dashport_ir::{CaptureNode, CaptureTree, CellValue, NodeSubtype};
use tempfile::TempDir;
use zip::ZipArchive;

fn sample_capture() -> CaptureTree {
    let mut title = CaptureNode::widget("title", NodeSubtype::Text).with_text("Regional Sales");
    title.properties.style.font_size = Some("32px".to_string());

    let metric = CaptureNode::widget("revenue", NodeSubtype::Metric).with_data(DataProperties {
        label: Some("Revenue".to_string()),
        value: Some(CellValue::from("$48,200")),
        change: Some("+6.4%".to_string()),
        ..Default::default()
    });
    let chart = CaptureNode::widget("trend", NodeSubtype::Chart).with_data(DataProperties {
        chart_type: Some("bar".to_string()),
        chart_data: Some(CapturedChartData {
            labels: vec!["Q1".to_string(), "Q2".to_string()],
            datasets: vec![CapturedDataset {
                label: "Sales".to_string(),
                data: vec![Some(120.0), Some(180.0)],
                color: None,
            }],
        }),
        ..Default::default()
    });
    let table = CaptureNode::widget("regions", NodeSubtype::Table).with_data(DataProperties {
        headers: vec!["Region".to_string(), "Sales".to_string()],
        rows: vec![
            vec![CellValue::from("North"), CellValue::Number(120.0)],
            vec![CellValue::from("South"), CellValue::Number(95.5)],
        ],
        ..Default::default()
    });

    CaptureTree::new(
        CaptureNode::container("root").with_children([title, metric, chart, table]),
    )
}

fn write_capture(dir: &Path, tree: &CaptureTree) -> PathBuf {
    let path = dir.join("capture.json");
    fs::write(&path, serde_json::to_vec_pretty(tree).unwrap()).unwrap();
    path
}

fn part_names(path: &Path) -> Vec<String> {
    let file = fs::File::open(path).unwrap();
    let archive = ZipArchive::new(file).unwrap();
    archive.file_names().map(str::to_string).collect()
}

#[tokio::test]
async fn test_export_writes_office_packages() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let capture = write_capture(temp_dir.path(), &sample_capture());
    let out = temp_dir.path().join("out");

    let mut args = ExportArgs::new(&capture, &out);
    args.formats = vec!["excel".to_string(), "powerpoint".to_string()];
    let summary = export_command(&args).await.unwrap();

    assert!(summary.session_id.starts_with("export_"));
    assert!(summary.warnings.is_empty());
    assert_eq!(
        summary.files,
        vec![
            out.join("Regional_Sales.xlsx"),
            out.join("Regional_Sales.pptx")
        ]
    );

    let xlsx = part_names(&summary.files[0]);
    assert!(xlsx.iter().any(|p| p == "xl/workbook.xml"));
    assert!(xlsx.iter().any(|p| p == "xl/worksheets/sheet1.xml"));

    let pptx = part_names(&summary.files[1]);
    assert!(pptx.iter().any(|p| p == "ppt/presentation.xml"));
    assert!(pptx.iter().any(|p| p.starts_with("ppt/slides/slide")));
}

#[tokio::test]
async fn test_export_skips_unknown_formats() {
    let temp_dir = TempDir::new().unwrap();
    let capture = write_capture(temp_dir.path(), &sample_capture());

    let mut args = ExportArgs::new(&capture, temp_dir.path().join("out"));
    args.formats = vec!["excel".to_string(), "svg".to_string()];
    let summary = export_command(&args).await.unwrap();

    assert_eq!(summary.files.len(), 1);
    assert_eq!(summary.warnings.len(), 1);
    assert!(summary.warnings[0].contains("svg"));
}

#[tokio::test]
async fn test_export_reports_failures() {
    let temp_dir = TempDir::new().unwrap();

    let missing = ExportArgs::new(temp_dir.path().join("absent.json"), temp_dir.path());
    let err = export_command(&missing).await.unwrap_err();
    assert!(err.to_string().contains("Capture file not found"));

    let mut future = sample_capture();
    future.version = "9.0.0".to_string();
    let capture = write_capture(temp_dir.path(), &future);
    let err = export_command(&ExportArgs::new(&capture, temp_dir.path().join("out")))
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Export failed"), "{}", message);
    assert!(message.contains("2003"), "{}", message);
    assert!(!temp_dir.path().join("out").exists());
}

#[test]
fn test_inspect_text_and_json() {
    let temp_dir = TempDir::new().unwrap();
    let capture = write_capture(temp_dir.path(), &sample_capture());

    let text = inspect_command(&capture, Some(LayoutArg::Multi), OutputFormat::Text, None).unwrap();
    assert!(text.starts_with("Regional Sales (4 pages, 4 sections)"));
    assert!(text.contains("Key Metrics [page_0]"));
    assert!(text.contains("metric: Revenue"));
    assert!(text.contains("Detailed Data"));

    let json = inspect_command(&capture, Some(LayoutArg::Single), OutputFormat::Json, None).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["pages"].as_array().unwrap().len(), 1);
    assert_eq!(value["document"]["title"], "Regional Sales");
}

#[test]
fn test_config_file_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("dashport.toml");

    let written = config_command(Some(&path)).unwrap();
    assert!(written.contains("[manager]"));
    assert!(config_command(Some(&path)).is_err());

    let settings = load_settings(Some(&path)).unwrap();
    assert_eq!(settings, dashport_core::Settings::default());

    fs::write(&path, "[translation]\npage_layout = \"single\"\n").unwrap();
    let capture = write_capture(temp_dir.path(), &sample_capture());
    let text = inspect_command(&capture, None, OutputFormat::Text, Some(&path)).unwrap();
    assert!(text.contains("Dashboard Overview"));

    fs::write(&path, "[manager]\nmax_concurrent_exports = 0\n").unwrap();
    let err = load_settings(Some(&path)).unwrap_err();
    assert!(format!("{:#}", err).contains("max_concurrent_exports"));
}
