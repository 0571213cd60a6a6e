//! IR sections to worksheets.
//!
//! Every section of every page becomes one worksheet: a title row naming the
//! section, a spacer, then the content rows.

use dashport_ir::document::{
    CellValue, ChartContent, Content, ImageContent, MetricContent, Section, TableContent,
};
use dashport_ir::IrDocument;
use tracing::debug;

use crate::sheet::{Cell, SheetNames, Style, Value, Worksheet};

/// A workbook ready to be packaged
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub title: String,
    pub author: String,
    pub created: Option<String>,
    pub sheets: Vec<Worksheet>,
}

impl Workbook {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&Worksheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// Build one worksheet per IR section, in document order
pub fn build_workbook(ir: &IrDocument) -> Workbook {
    let mut workbook = Workbook::new(ir.title());
    workbook.author = ir.document.author.name.clone();
    workbook.created = Some(ir.document.created.clone()).filter(|c| !c.is_empty());

    let mut names = SheetNames::new();
    for (index, section) in ir.sections().enumerate() {
        let title = section_title(section, index);
        let mut sheet = Worksheet::new(names.assign(&title));
        sheet.push_line(title, Style::Title);
        sheet.push_blank();
        write_content(&mut sheet, section.primary());
        debug!(sheet = %sheet.name, rows = sheet.rows.len(), "worksheet");
        workbook.sheets.push(sheet);
    }
    workbook
}

/// Human title of a section, derived from its content
pub fn section_title(section: &Section, index: usize) -> String {
    let n = index + 1;
    match section.primary() {
        Content::Metric(m) if !m.label.trim().is_empty() => m.label.trim().to_string(),
        Content::Chart(c) if !c.title().trim().is_empty() => c.title().trim().to_string(),
        Content::Image(i) if !i.alt.trim().is_empty() => i.alt.trim().to_string(),
        other => format!("{} {}", other.content_type().label(), n),
    }
}

fn write_content(sheet: &mut Worksheet, content: &Content) {
    match content {
        Content::Metric(metric) => write_metric(sheet, metric),
        Content::Table(table) => write_table(sheet, table),
        Content::Chart(chart) => write_chart(sheet, chart),
        Content::Text(text) => sheet.push_row(vec![Cell::text(text.text.as_str())]),
        Content::Image(image) => write_image(sheet, image),
        Content::Composite(composite) => {
            for item in &composite.items {
                write_content(sheet, item);
            }
        }
    }
}

fn write_metric(sheet: &mut Worksheet, metric: &MetricContent) {
    let mut value = Cell::guess(&metric.value);
    if matches!(value.value, Value::Number(_)) && metric.unit.is_some() {
        value = Cell::text(format!(
            "{} {}",
            metric.value.trim(),
            metric.unit.as_deref().unwrap_or_default()
        ));
    }
    let change = metric
        .change
        .as_ref()
        .map(|c| c.indicator())
        .unwrap_or_default();
    sheet.push_row(vec![Cell::text(metric.label.as_str()), value, Cell::text(change)]);
}

fn write_table(sheet: &mut Worksheet, table: &TableContent) {
    if !table.headers.is_empty() {
        let labels: Vec<&str> = table.headers.iter().map(|h| h.label.as_str()).collect();
        sheet.push_header(&labels);
    }
    for row in &table.rows {
        sheet.push_row(row.cells.iter().map(table_cell).collect());
    }
    sheet.push_blank();
}

fn table_cell(value: &CellValue) -> Cell {
    match value {
        CellValue::Number(n) => Cell::number(*n),
        CellValue::Null => Cell::empty(),
        other => Cell::text(other.to_string()),
    }
}

/// Charts are flattened to `Series | Label | Value` rows
fn write_chart(sheet: &mut Worksheet, chart: &ChartContent) {
    sheet.push_line(format!("Chart: {}", chart.chart_type), Style::Section);
    if chart.data.datasets.is_empty() {
        if !chart.fallback.description.is_empty() {
            sheet.push_row(vec![Cell::text(chart.fallback.description.as_str())]);
        }
        sheet.push_blank();
        return;
    }

    sheet.push_header(&["Series", "Label", "Value"]);
    for (i, dataset) in chart.data.datasets.iter().enumerate() {
        let series = if dataset.label.is_empty() {
            format!("Series {}", i + 1)
        } else {
            dataset.label.clone()
        };
        for (j, value) in dataset.data.iter().enumerate() {
            let label = chart
                .data
                .labels
                .get(j)
                .cloned()
                .unwrap_or_else(|| (j + 1).to_string());
            sheet.push_row(vec![
                Cell::text(series.as_str()),
                Cell::text(label),
                value.map(Cell::number).unwrap_or_else(Cell::empty),
            ]);
        }
    }
    sheet.push_blank();
}

fn write_image(sheet: &mut Worksheet, image: &ImageContent) {
    let mut row = vec![Cell::text(if image.alt.is_empty() {
        "Image"
    } else {
        image.alt.as_str()
    })];
    if image.src.starts_with("http://") || image.src.starts_with("https://") {
        row.push(Cell::text(image.src.as_str()));
    }
    sheet.push_row(row);
}
