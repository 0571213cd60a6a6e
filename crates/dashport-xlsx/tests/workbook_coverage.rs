//! Read generated workbooks back with calamine

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use dashport_ir::capture::DataProperties;
use dashport_ir::document::{
    CellValue, ChartConfig, ChartContent, ChartData, ChartFallback, Content, Dataset,
    MetricContent, Page, PageKind, PageLayout, PageMetadata, Section, TableConfig, TableContent,
    TableHeader, TableRow, TableStyling, TextContent,
};
use dashport_ir::{CaptureNode, CaptureTree, CompileContext, Compiler, IrDocument, NodeSubtype};
use dashport_xlsx::{SpreadsheetSettings, XlsxCompiler};

fn open(bytes: &[u8]) -> Xlsx<Cursor<Vec<u8>>> {
    open_workbook_from_rs(Cursor::new(bytes.to_vec())).expect("readable workbook")
}

fn range(bytes: &[u8], sheet: &str) -> Range<Data> {
    open(bytes).worksheet_range(sheet).expect("sheet exists")
}

fn text_at(range: &Range<Data>, row: u32, col: u32) -> String {
    match range.get_value((row, col)) {
        Some(Data::String(s)) => s.clone(),
        Some(Data::Float(f)) => f.to_string(),
        Some(Data::Int(i)) => i.to_string(),
        _ => String::new(),
    }
}

fn section(id: &str, content: Content) -> Section {
    Section::new(id, content)
}

fn sales_table() -> Content {
    let header = |key: &str, label: &str| TableHeader {
        key: key.to_string(),
        label: label.to_string(),
        sortable: true,
    };
    Content::Table(TableContent {
        headers: vec![header("col_0", "Region"), header("col_1", "Revenue")],
        rows: (0..25)
            .map(|i| TableRow {
                id: format!("row_{}", i),
                cells: vec![
                    CellValue::from(format!("Region {}", i).as_str()),
                    CellValue::Number(100.0 * i as f64),
                ],
            })
            .collect(),
        config: TableConfig {
            page_size: 50,
            current_page: 1,
        },
        styling: TableStyling {
            striped: true,
            bordered: true,
            hover: false,
            compact: false,
        },
    })
}

fn sample_document() -> IrDocument {
    let mut ir = IrDocument::new("Revenue Board");
    ir.pages = vec![Page {
        id: "main".to_string(),
        title: "Main".to_string(),
        kind: PageKind::Dashboard,
        layout: PageLayout::flow(20.0),
        sections: vec![
            section(
                "m1",
                Content::Metric(MetricContent {
                    label: "Total Revenue".to_string(),
                    value: "12,500".to_string(),
                    unit: None,
                    change: None,
                    styling: Default::default(),
                }),
            ),
            section("t1", sales_table()),
            section(
                "c1",
                Content::Chart(ChartContent {
                    chart_type: "bar".to_string(),
                    data: ChartData {
                        labels: vec!["Q1".to_string(), "Q2".to_string()],
                        datasets: vec![Dataset {
                            label: "Units: sold / month".to_string(),
                            data: vec![Some(5.0), Some(7.0)],
                            color: None,
                        }],
                    },
                    config: ChartConfig::default(),
                    fallback: ChartFallback::default(),
                }),
            ),
            section(
                "x1",
                Content::Text(TextContent {
                    text: "All figures in SAR".to_string(),
                    formatting: Default::default(),
                }),
            ),
        ],
        metadata: PageMetadata::default(),
    }];
    ir
}

#[test]
fn test_sheet_names_and_order() {
    let doc = XlsxCompiler::default().compile(&sample_document()).unwrap();
    let names = open(doc.data()).sheet_names();
    assert_eq!(
        names,
        vec!["Total Revenue", "Table 2", "Units_ sold _ month", "Text 4"]
    );
}

#[test]
fn test_cells_read_back() {
    let doc = XlsxCompiler::default().compile(&sample_document()).unwrap();
    let bytes = doc.data();

    let metric = range(bytes, "Total Revenue");
    assert_eq!(text_at(&metric, 0, 0), "Total Revenue");
    assert_eq!(metric.get_value((2, 1)), Some(&Data::Float(12500.0)));

    // the whole table is kept, unlike the slide deck
    let table = range(bytes, "Table 2");
    assert_eq!(text_at(&table, 2, 0), "Region");
    assert_eq!(text_at(&table, 2, 1), "Revenue");
    assert_eq!(text_at(&table, 27, 0), "Region 24");
    assert_eq!(table.get_value((27, 1)), Some(&Data::Float(2400.0)));

    let chart = range(bytes, "Units_ sold _ month");
    assert_eq!(text_at(&chart, 2, 0), "Chart: bar");
    assert_eq!(text_at(&chart, 3, 0), "Series");
    assert_eq!(text_at(&chart, 5, 1), "Q2");
    assert_eq!(chart.get_value((5, 2)), Some(&Data::Float(7.0)));

    let text = range(bytes, "Text 4");
    assert_eq!(text_at(&text, 2, 0), "All figures in SAR");
}

#[test]
fn test_degraded_mode_from_capture() {
    let metric = CaptureNode::widget("m1", NodeSubtype::Metric).with_data(DataProperties {
        label: Some("Revenue".to_string()),
        value: Some(CellValue::from("SAR 1.2M")),
        change: Some("↑ 8%".to_string()),
        ..Default::default()
    });
    let capture = CaptureTree::new(CaptureNode::container("root").with_child(metric));
    let ir = IrDocument::new("Executive Overview");

    let ctx = CompileContext {
        capture: Some(&capture),
        root_id: None,
    };
    let doc = XlsxCompiler::default().compile_with(&ir, &ctx).unwrap();
    let bytes = doc.data();
    assert_eq!(open(bytes).sheet_names(), vec!["Dashboard Data"]);

    let sheet = range(bytes, "Dashboard Data");
    assert_eq!(text_at(&sheet, 0, 0), "Executive Overview Export");
    assert_eq!(text_at(&sheet, 3, 0), "Key Metrics");
    assert_eq!(text_at(&sheet, 4, 2), "Additional Info");
    assert_eq!(text_at(&sheet, 5, 0), "Revenue");
    assert_eq!(text_at(&sheet, 5, 1), "SAR 1.2M");
    assert_eq!(text_at(&sheet, 5, 2), "↑ 8%");
}

#[test]
fn test_ir_with_sections_ignores_capture() {
    let capture = CaptureTree::new(CaptureNode::container("root"));
    let ctx = CompileContext {
        capture: Some(&capture),
        root_id: None,
    };
    let doc = XlsxCompiler::default()
        .compile_with(&sample_document(), &ctx)
        .unwrap();
    assert_eq!(open(doc.data()).sheet_names().len(), 4);
}

#[test]
fn test_empty_document_has_notice_sheet() {
    let doc = XlsxCompiler::new(SpreadsheetSettings::default())
        .compile(&IrDocument::new("Nothing"))
        .unwrap();
    let sheet = range(doc.data(), "Dashboard Data");
    assert_eq!(text_at(&sheet, 2, 0), "No dashboard data found to export");
}
