//! Best-effort extraction straight from a capture tree.
//!
//! Used when no structured IR is available. The whole capture is flattened
//! into a single "Dashboard Data" sheet: key metrics first, then one block
//! per table, then free text.

use std::collections::HashSet;

use chrono::Local;
use dashport_ir::capture::CaptureNode;
use dashport_ir::{CaptureTree, CellValue, NodeSubtype};
use tracing::debug;

use crate::sheet::{Cell, Style, Worksheet};
use crate::workbook::Workbook;

/// Name of the single sheet written in degraded mode
pub const DEGRADED_SHEET_NAME: &str = "Dashboard Data";

/// Text lines shorter or longer than this are treated as noise
const TEXT_LEN_RANGE: std::ops::RangeInclusive<usize> = 3..=200;

#[derive(Debug, Clone, PartialEq)]
struct KeyMetric {
    label: String,
    value: String,
    info: String,
}

#[derive(Debug, Clone, PartialEq)]
struct CapturedTable {
    caption: String,
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Default)]
struct Extraction {
    metrics: Vec<KeyMetric>,
    tables: Vec<CapturedTable>,
    lines: Vec<String>,
    seen: HashSet<String>,
}

impl Extraction {
    fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.tables.is_empty() && self.lines.is_empty()
    }

    fn visit(&mut self, node: &CaptureNode) {
        if node
            .metadata
            .export_hints
            .as_ref()
            .is_some_and(|h| h.no_export)
        {
            return;
        }

        if let Some(metric) = key_metric(node) {
            self.metrics.push(metric);
            return;
        }
        if let Some(table) = captured_table(node, self.tables.len()) {
            self.tables.push(table);
            return;
        }
        if node.subtype == Some(NodeSubtype::Chart) {
            return;
        }

        if let Some(text) = node.text().map(str::trim) {
            if TEXT_LEN_RANGE.contains(&text.chars().count()) && self.seen.insert(text.to_string())
            {
                self.lines.push(text.to_string());
            }
        }
        for child in &node.children {
            self.visit(child);
        }
    }
}

/// A label/value pair: a metric widget, or any node whose data carries both
fn key_metric(node: &CaptureNode) -> Option<KeyMetric> {
    let data = node.properties.data.as_ref()?;
    let is_metric = node.subtype == Some(NodeSubtype::Metric);
    if !is_metric && (data.label.is_none() || data.value.is_none()) {
        return None;
    }
    let label = data
        .label
        .clone()
        .filter(|l| !l.trim().is_empty())
        .or_else(|| node.text().map(str::to_string))?;
    let value = data.value.as_ref().map(CellValue::to_string)?;
    Some(KeyMetric {
        label: label.trim().to_string(),
        value,
        info: data.change.clone().unwrap_or_default(),
    })
}

fn captured_table(node: &CaptureNode, index: usize) -> Option<CapturedTable> {
    if node.subtype != Some(NodeSubtype::Table) && !node.has_tag("table") {
        return None;
    }
    let data = node.properties.data.as_ref()?;
    if data.headers.is_empty() && data.rows.is_empty() {
        return None;
    }
    let caption = node
        .attribute("aria-label")
        .or_else(|| node.attribute("caption"))
        .map(str::to_string)
        .or_else(|| data.label.clone())
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| format!("Table {}", index + 1));
    Some(CapturedTable {
        caption,
        headers: data.headers.clone(),
        rows: data.rows.clone(),
    })
}

/// Flatten a capture tree into a one-sheet workbook
pub fn extract_workbook(capture: &CaptureTree, title: &str) -> Workbook {
    let mut extraction = Extraction::default();
    extraction.visit(capture.root());
    debug!(
        metrics = extraction.metrics.len(),
        tables = extraction.tables.len(),
        lines = extraction.lines.len(),
        "degraded extraction"
    );

    let mut sheet = Worksheet::new(DEGRADED_SHEET_NAME);
    sheet.push_line(format!("{} Export", title), Style::Title);
    sheet.push_line(
        format!("Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S")),
        Style::Note,
    );
    sheet.push_blank();

    if extraction.is_empty() {
        sheet.push_line("No dashboard data found to export", Style::Section);
        sheet.push_row(vec![Cell::text(
            "Please ensure the dashboard is loaded and try again",
        )]);
    }

    if !extraction.metrics.is_empty() {
        sheet.push_line("Key Metrics", Style::Section);
        sheet.push_header(&["Metric", "Value", "Additional Info"]);
        for metric in &extraction.metrics {
            sheet.push_row(vec![
                Cell::text(metric.label.as_str()),
                Cell::guess(&metric.value),
                Cell::text(metric.info.as_str()),
            ]);
        }
        sheet.push_blank();
    }

    for table in &extraction.tables {
        sheet.push_line(table.caption.as_str(), Style::Section);
        if !table.headers.is_empty() {
            sheet.push_header(&table.headers);
        }
        for row in &table.rows {
            sheet.push_row(
                row.iter()
                    .map(|v| match v {
                        CellValue::Number(n) => Cell::number(*n),
                        CellValue::Null => Cell::empty(),
                        other => Cell::text(other.to_string()),
                    })
                    .collect(),
            );
        }
        sheet.push_blank();
    }

    if !extraction.lines.is_empty() {
        sheet.push_line("Dashboard Content", Style::Section);
        for line in &extraction.lines {
            sheet.push_row(vec![Cell::text(line.as_str())]);
        }
    }

    let mut workbook = Workbook::new(title);
    workbook.created =
        Some(capture.metadata.capture_timestamp.clone()).filter(|c| !c.is_empty());
    workbook.sheets.push(sheet);
    workbook
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Value;
    use dashport_ir::capture::{DataProperties, ExportHints};

    fn metric_node(id: &str, label: &str, value: &str, change: Option<&str>) -> CaptureNode {
        CaptureNode::widget(id, NodeSubtype::Metric).with_data(DataProperties {
            label: Some(label.to_string()),
            value: Some(CellValue::from(value)),
            change: change.map(str::to_string),
            ..Default::default()
        })
    }

    fn table_node(id: &str) -> CaptureNode {
        let mut node = CaptureNode::widget(id, NodeSubtype::Table).with_data(DataProperties {
            headers: vec!["Customer".to_string(), "Revenue".to_string()],
            rows: vec![
                vec![CellValue::from("Acme"), CellValue::Number(1500.0)],
                vec![CellValue::from("Globex"), CellValue::Null],
            ],
            ..Default::default()
        });
        node.metadata
            .attributes
            .insert("aria-label".to_string(), "Top customers".to_string());
        node
    }

    fn texts(sheet: &Worksheet) -> Vec<String> {
        sheet
            .rows
            .iter()
            .filter_map(|r| r.first())
            .filter_map(|c| match &c.value {
                Value::Text(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_metrics_tables_and_text() {
        let root = CaptureNode::container("root").with_children([
            CaptureNode::container("heading").with_text("Revenue overview"),
            metric_node("m1", "Revenue", "1,500", Some("↑ 5%")),
            metric_node("m2", "Orders", "42", None),
            table_node("t1"),
            CaptureNode::container("dup").with_text("Revenue overview"),
            CaptureNode::container("short").with_text("ok"),
        ]);
        let wb = extract_workbook(&CaptureTree::new(root), "Sales");
        assert_eq!(wb.sheets.len(), 1);
        let sheet = &wb.sheets[0];
        assert_eq!(sheet.name, DEGRADED_SHEET_NAME);

        let lines = texts(sheet);
        assert_eq!(lines[0], "Sales Export");
        assert!(lines[1].starts_with("Generated: "));
        assert!(lines.contains(&"Key Metrics".to_string()));
        assert!(lines.contains(&"Top customers".to_string()));
        assert!(lines.contains(&"Dashboard Content".to_string()));
        assert_eq!(lines.iter().filter(|l| *l == "Revenue overview").count(), 1);
        assert!(!lines.contains(&"ok".to_string()));

        let metric_row = sheet
            .rows
            .iter()
            .find(|r| r.first().map(|c| &c.value) == Some(&Value::Text("Revenue".to_string())))
            .unwrap();
        assert_eq!(metric_row[1].value, Value::Number(1500.0));
        assert_eq!(metric_row[2].value, Value::Text("↑ 5%".to_string()));

        let header = sheet
            .rows
            .iter()
            .find(|r| r.first().map(|c| &c.value) == Some(&Value::Text("Customer".to_string())))
            .unwrap();
        assert_eq!(header[0].style, Style::Header);
    }

    #[test]
    fn test_no_export_nodes_are_skipped() {
        let mut hidden = metric_node("m1", "Secret", "1", None);
        hidden.metadata.export_hints = Some(ExportHints {
            no_export: true,
            ..Default::default()
        });
        let root = CaptureNode::container("root").with_child(hidden);
        let wb = extract_workbook(&CaptureTree::new(root), "Hidden");
        let lines = texts(&wb.sheets[0]);
        assert!(!lines.contains(&"Secret".to_string()));
        assert!(lines.contains(&"No dashboard data found to export".to_string()));
    }

    #[test]
    fn test_unnamed_table_caption() {
        let mut node = table_node("t1");
        node.metadata.attributes.clear();
        let root = CaptureNode::container("root").with_child(node);
        let wb = extract_workbook(&CaptureTree::new(root), "T");
        assert!(texts(&wb.sheets[0]).contains(&"Table 1".to_string()));
    }
}
