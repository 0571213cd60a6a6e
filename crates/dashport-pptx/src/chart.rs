//! Native chart parts.
//!
//! Charts are written as DrawingML chart parts with literal category and
//! value caches, so no embedded workbook is needed to open the deck.

use dashport_ir::document::ChartContent;
use quick_xml::escape::escape;

use crate::constants::{NS_CHART, NS_DRAWING, NS_RELATIONSHIPS};
use crate::theme::hex_color;

const CATEGORY_AXIS_ID: u32 = 50_010_001;
const VALUE_AXIS_ID: u32 = 50_010_002;

/// Chart types with a native rendition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Horizontal bars
    Bar,
    /// Vertical bars
    Column,
    Line,
    Pie,
    Doughnut,
}

impl ChartKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "bar" => Some(Self::Bar),
            "column" => Some(Self::Column),
            "line" => Some(Self::Line),
            "pie" => Some(Self::Pie),
            "doughnut" => Some(Self::Doughnut),
            _ => None,
        }
    }

    fn has_axes(self) -> bool {
        matches!(self, Self::Bar | Self::Column | Self::Line)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
    /// RGB hex without `#`
    pub color: String,
}

/// A chart ready to be serialised as `ppt/charts/chartN.xml`
#[derive(Debug, Clone, PartialEq)]
pub struct NativeChart {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    /// Per-point colours for pie and doughnut charts
    pub point_colors: Vec<String>,
}

impl NativeChart {
    /// Build a native chart when the type is supported and there are both
    /// labels and datasets. Pie and doughnut charts plot the first dataset.
    pub fn from_content(chart: &ChartContent, palette: &[String]) -> Option<Self> {
        let kind = ChartKind::from_name(&chart.chart_type)?;
        if chart.data.labels.is_empty() || chart.data.datasets.is_empty() {
            return None;
        }

        let pick = |i: usize| -> String {
            if palette.is_empty() {
                "000000".to_string()
            } else {
                palette[i % palette.len()].clone()
            }
        };

        let datasets = match kind {
            ChartKind::Pie | ChartKind::Doughnut => &chart.data.datasets[..1],
            _ => &chart.data.datasets[..],
        };
        let series = datasets
            .iter()
            .enumerate()
            .map(|(i, dataset)| {
                let name = if !dataset.label.is_empty() {
                    dataset.label.clone()
                } else if datasets.len() == 1 && !kind.has_axes() {
                    "Values".to_string()
                } else {
                    format!("Series {}", i + 1)
                };
                Series {
                    name,
                    values: dataset.data.clone(),
                    color: dataset
                        .color
                        .as_deref()
                        .and_then(hex_color)
                        .unwrap_or_else(|| pick(i)),
                }
            })
            .collect();

        let point_colors = if kind.has_axes() {
            Vec::new()
        } else {
            (0..chart.data.labels.len()).map(pick).collect()
        };

        Some(Self {
            kind,
            labels: chart.data.labels.clone(),
            series,
            point_colors,
        })
    }

    /// Serialise the chart part
    pub fn to_xml(&self) -> String {
        let series: String = self
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| self.series_xml(i, s))
            .collect();

        let axis_ids = format!(
            "<c:axId val=\"{}\"/><c:axId val=\"{}\"/>",
            CATEGORY_AXIS_ID, VALUE_AXIS_ID
        );

        let plot = match self.kind {
            ChartKind::Bar | ChartKind::Column => format!(
                "<c:barChart><c:barDir val=\"{}\"/><c:grouping val=\"clustered\"/><c:varyColors val=\"0\"/>{}<c:gapWidth val=\"150\"/>{}</c:barChart>",
                if self.kind == ChartKind::Column { "col" } else { "bar" },
                series,
                axis_ids
            ),
            ChartKind::Line => format!(
                "<c:lineChart><c:grouping val=\"standard\"/><c:varyColors val=\"0\"/>{}<c:marker val=\"1\"/>{}</c:lineChart>",
                series, axis_ids
            ),
            ChartKind::Pie => format!(
                "<c:pieChart><c:varyColors val=\"1\"/>{}<c:firstSliceAng val=\"0\"/></c:pieChart>",
                series
            ),
            ChartKind::Doughnut => format!(
                "<c:doughnutChart><c:varyColors val=\"1\"/>{}<c:firstSliceAng val=\"0\"/><c:holeSize val=\"50\"/></c:doughnutChart>",
                series
            ),
        };

        let axes = if self.kind.has_axes() {
            self.axes_xml()
        } else {
            String::new()
        };

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<c:chartSpace xmlns:c="{}" xmlns:a="{}" xmlns:r="{}">
  <c:roundedCorners val="0"/>
  <c:chart>
    <c:autoTitleDeleted val="1"/>
    <c:plotArea>
      <c:layout/>
      {}{}
    </c:plotArea>
    <c:legend><c:legendPos val="b"/><c:overlay val="0"/></c:legend>
    <c:plotVisOnly val="1"/>
    <c:dispBlanksAs val="gap"/>
  </c:chart>
</c:chartSpace>"#,
            NS_CHART, NS_DRAWING, NS_RELATIONSHIPS, plot, axes
        )
    }

    fn series_xml(&self, index: usize, series: &Series) -> String {
        let mut xml = format!(
            "<c:ser><c:idx val=\"{i}\"/><c:order val=\"{i}\"/><c:tx><c:v>{}</c:v></c:tx>",
            escape(series.name.as_str()),
            i = index
        );

        match self.kind {
            ChartKind::Bar | ChartKind::Column => {
                xml.push_str(&format!(
                    "<c:spPr><a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill></c:spPr><c:invertIfNegative val=\"0\"/>",
                    series.color
                ));
            }
            ChartKind::Line => {
                xml.push_str(&format!(
                    "<c:spPr><a:ln w=\"28575\" cap=\"rnd\"><a:solidFill><a:srgbClr val=\"{c}\"/></a:solidFill></a:ln></c:spPr><c:marker><c:symbol val=\"circle\"/><c:size val=\"3\"/><c:spPr><a:solidFill><a:srgbClr val=\"{c}\"/></a:solidFill></c:spPr></c:marker>",
                    c = series.color
                ));
            }
            ChartKind::Pie | ChartKind::Doughnut => {
                for (i, color) in self.point_colors.iter().enumerate() {
                    xml.push_str(&format!(
                        "<c:dPt><c:idx val=\"{}\"/><c:bubble3D val=\"0\"/><c:spPr><a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill></c:spPr></c:dPt>",
                        i, color
                    ));
                }
            }
        }

        xml.push_str(&self.categories_xml());
        xml.push_str(&self.values_xml(&series.values));
        if self.kind == ChartKind::Line {
            xml.push_str("<c:smooth val=\"0\"/>");
        }
        xml.push_str("</c:ser>");
        xml
    }

    fn categories_xml(&self) -> String {
        let points: String = self
            .labels
            .iter()
            .enumerate()
            .map(|(i, label)| format!("<c:pt idx=\"{}\"><c:v>{}</c:v></c:pt>", i, escape(label.as_str())))
            .collect();
        format!(
            "<c:cat><c:strLit><c:ptCount val=\"{}\"/>{}</c:strLit></c:cat>",
            self.labels.len(),
            points
        )
    }

    /// Values beyond the last label are dropped; gaps are left out
    fn values_xml(&self, values: &[Option<f64>]) -> String {
        let points: String = values
            .iter()
            .take(self.labels.len())
            .enumerate()
            .filter_map(|(i, v)| {
                v.filter(|v| v.is_finite())
                    .map(|v| format!("<c:pt idx=\"{}\"><c:v>{}</c:v></c:pt>", i, v))
            })
            .collect();
        format!(
            "<c:val><c:numLit><c:formatCode>General</c:formatCode><c:ptCount val=\"{}\"/>{}</c:numLit></c:val>",
            self.labels.len(),
            points
        )
    }

    fn axes_xml(&self) -> String {
        // horizontal bars put categories on the left
        let (cat_pos, val_pos) = if self.kind == ChartKind::Bar {
            ("l", "b")
        } else {
            ("b", "l")
        };
        format!(
            "<c:catAx><c:axId val=\"{cat}\"/><c:scaling><c:orientation val=\"minMax\"/></c:scaling><c:delete val=\"0\"/><c:axPos val=\"{cp}\"/><c:numFmt formatCode=\"General\" sourceLinked=\"0\"/><c:tickLblPos val=\"nextTo\"/><c:crossAx val=\"{val}\"/><c:crosses val=\"autoZero\"/><c:auto val=\"1\"/><c:lblAlgn val=\"ctr\"/><c:lblOffset val=\"100\"/></c:catAx>\
<c:valAx><c:axId val=\"{val}\"/><c:scaling><c:orientation val=\"minMax\"/></c:scaling><c:delete val=\"0\"/><c:axPos val=\"{vp}\"/><c:majorGridlines/><c:numFmt formatCode=\"General\" sourceLinked=\"0\"/><c:tickLblPos val=\"nextTo\"/><c:crossAx val=\"{cat}\"/><c:crosses val=\"autoZero\"/><c:crossBetween val=\"between\"/></c:valAx>",
            cat = CATEGORY_AXIS_ID,
            val = VALUE_AXIS_ID,
            cp = cat_pos,
            vp = val_pos
        )
    }
}
