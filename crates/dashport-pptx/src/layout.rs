//! Slide packing and layout selection.
//!
//! Sections are packed into slides in document order: a table always gets a
//! slide of its own, charts share a slide up to two at a time, metrics up to
//! six, and anything else joins whatever group is open. A mixed group is
//! laid out as a flow and closes once it holds as many sections as the flow
//! slots that fit on a 16:9 slide.

use dashport_ir::document::{ContentType, Section};

use crate::slide::Frame;

/// Maximum charts sharing a slide
pub const MAX_CHARTS_PER_SLIDE: usize = 2;

/// Maximum metrics sharing a slide
pub const MAX_METRICS_PER_SLIDE: usize = 6;

/// Top of the content area, below the title band
pub const CONTENT_TOP: f64 = 1.5;

/// Vertical step between sections in the default flow layout
pub const FLOW_STEP: f64 = 2.0;

/// Flow slots that fit below the title band of a 5.625in slide
pub const MAX_FLOW_SECTIONS: usize = 2;

/// Grid parameters for the metrics layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    pub cols: usize,
    pub rows: usize,
    pub start_x: f64,
    pub start_y: f64,
    pub cell_width: f64,
    pub cell_height: f64,
    pub spacing: f64,
}

impl GridConfig {
    /// Frame of the cell at `index`, filling rows left to right
    pub fn cell(&self, index: usize) -> Frame {
        let col = index % self.cols;
        let row = index / self.cols;
        Frame::new(
            self.start_x + col as f64 * (self.cell_width + self.spacing),
            self.start_y + row as f64 * (self.cell_height + self.spacing),
            self.cell_width,
            self.cell_height,
        )
    }
}

pub const METRICS_GRID: GridConfig = GridConfig {
    cols: 3,
    rows: 2,
    start_x: 0.5,
    start_y: CONTENT_TOP,
    cell_width: 3.0,
    cell_height: 1.8,
    spacing: 0.25,
};

pub const SINGLE_CHART_AREA: Frame = Frame::new(0.5, CONTENT_TOP, 9.0, 4.0);

pub const TWO_CHART_AREAS: [Frame; 2] = [
    Frame::new(0.5, CONTENT_TOP, 4.25, 3.5),
    Frame::new(5.25, CONTENT_TOP, 4.25, 3.5),
];

pub const TABLE_AREA: Frame = Frame::new(0.5, CONTENT_TOP, 9.0, 4.0);

/// Layout applied to one slide's group of sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideLayout {
    Table,
    MetricsGrid,
    SingleChart,
    TwoCharts,
    /// Sections stacked from the top of the content area
    Flow,
}

impl SlideLayout {
    /// Choose the layout for a group from its composition
    pub fn select(group: &[&Section]) -> Self {
        let Some(first) = group.first() else {
            return Self::Flow;
        };
        let kind = first.content_type();
        let homogeneous = group.iter().all(|s| s.content_type() == kind);

        match (homogeneous, kind, group.len()) {
            (true, ContentType::Table, _) => Self::Table,
            (true, ContentType::Metric, _) => Self::MetricsGrid,
            (true, ContentType::Chart, 1) => Self::SingleChart,
            (true, ContentType::Chart, 2) => Self::TwoCharts,
            _ => Self::Flow,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::MetricsGrid => "metrics-grid",
            Self::SingleChart => "single-chart",
            Self::TwoCharts => "two-charts",
            Self::Flow => "flow",
        }
    }

    /// Frames for the first `count` sections of a group
    pub fn frames(&self, count: usize) -> Vec<Frame> {
        match self {
            Self::Table => vec![TABLE_AREA; count.min(1)],
            Self::MetricsGrid => (0..count).map(|i| METRICS_GRID.cell(i)).collect(),
            Self::SingleChart => vec![SINGLE_CHART_AREA; count.min(1)],
            Self::TwoCharts => TWO_CHART_AREAS.iter().copied().take(count).collect(),
            Self::Flow => (0..count).map(flow_slot).collect(),
        }
    }
}

/// Slot for the `index`-th section in the flow layout
pub fn flow_slot(index: usize) -> Frame {
    Frame::new(0.5, CONTENT_TOP + index as f64 * FLOW_STEP, 9.0, FLOW_STEP - 0.2)
}

fn count_of(group: &[&Section], kind: ContentType) -> usize {
    group.iter().filter(|s| s.content_type() == kind).count()
}

/// Pack a page's sections into slide groups
pub fn group_sections(sections: &[Section]) -> Vec<Vec<&Section>> {
    let mut groups: Vec<Vec<&Section>> = Vec::new();
    let mut current: Vec<&Section> = Vec::new();

    for section in sections {
        match section.content_type() {
            ContentType::Table => {
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
                groups.push(vec![section]);
            }
            ContentType::Chart if count_of(&current, ContentType::Chart) >= MAX_CHARTS_PER_SLIDE => {
                groups.push(std::mem::replace(&mut current, vec![section]));
            }
            ContentType::Metric
                if count_of(&current, ContentType::Metric) >= MAX_METRICS_PER_SLIDE =>
            {
                groups.push(std::mem::replace(&mut current, vec![section]));
            }
            _ => {
                current.push(section);
                if current.len() > MAX_FLOW_SECTIONS
                    && SlideLayout::select(&current) == SlideLayout::Flow
                {
                    current.pop();
                    groups.push(std::mem::replace(&mut current, vec![section]));
                }
            }
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashport_ir::document::{
        ChartConfig, ChartContent, ChartData, ChartFallback, Content, MetricContent, TableConfig,
        TableContent, TableStyling, TextContent,
    };

    fn section(kind: ContentType, id: usize) -> Section {
        let content = match kind {
            ContentType::Chart => Content::Chart(ChartContent {
                chart_type: "bar".to_string(),
                data: ChartData::default(),
                config: ChartConfig::default(),
                fallback: ChartFallback::default(),
            }),
            ContentType::Table => Content::Table(TableContent {
                headers: Vec::new(),
                rows: Vec::new(),
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
            }),
            ContentType::Metric => Content::Metric(MetricContent {
                label: "m".to_string(),
                value: "1".to_string(),
                unit: None,
                change: None,
                styling: Default::default(),
            }),
            _ => Content::Text(TextContent {
                text: "t".to_string(),
                formatting: Default::default(),
            }),
        };
        Section::new(format!("s{}", id), content)
    }

    fn sections(kinds: &[ContentType]) -> Vec<Section> {
        kinds
            .iter()
            .enumerate()
            .map(|(i, k)| section(*k, i))
            .collect()
    }

    fn shape(groups: &[Vec<&Section>]) -> Vec<usize> {
        groups.iter().map(Vec::len).collect()
    }

    #[test]
    fn test_tables_get_their_own_slide() {
        use ContentType::*;
        let input = sections(&[Text, Table, Table, Metric]);
        let groups = group_sections(&input);
        assert_eq!(shape(&groups), vec![1, 1, 1, 1]);
        assert_eq!(groups[1][0].id, "s1");
        assert_eq!(groups[2][0].id, "s2");
    }

    #[test]
    fn test_charts_pack_in_pairs() {
        use ContentType::*;
        let input = sections(&[Chart, Chart, Chart, Chart, Chart]);
        let groups = group_sections(&input);
        assert_eq!(shape(&groups), vec![2, 2, 1]);
    }

    #[test]
    fn test_metrics_pack_in_sixes() {
        let input = sections(&[ContentType::Metric; 14]);
        let groups = group_sections(&input);
        assert_eq!(shape(&groups), vec![6, 6, 2]);
        assert!(groups
            .iter()
            .all(|g| SlideLayout::select(g) == SlideLayout::MetricsGrid));
    }

    #[test]
    fn test_other_content_joins_open_group() {
        use ContentType::*;
        let input = sections(&[Metric, Text, Chart, Chart, Chart]);
        let groups = group_sections(&input);
        assert_eq!(shape(&groups), vec![2, 2, 1]);
        assert_eq!(SlideLayout::select(&groups[0]), SlideLayout::Flow);
        assert_eq!(SlideLayout::select(&groups[1]), SlideLayout::TwoCharts);
        assert_eq!(SlideLayout::select(&groups[2]), SlideLayout::SingleChart);
    }

    #[test]
    fn test_mixed_groups_fit_the_slide() {
        use ContentType::*;
        let input = sections(&[Text, Metric, Text, Chart, Text, Text, Metric]);
        let groups = group_sections(&input);
        assert_eq!(shape(&groups), vec![2, 2, 2, 1]);
        for group in &groups {
            for frame in SlideLayout::select(group).frames(group.len()) {
                assert!(frame.y + frame.h <= 5.625, "{:?} runs off the slide", frame);
            }
        }

        // a full metrics grid is not split by the flow limit
        let mut kinds = vec![Metric; 5];
        kinds.push(Text);
        let input = sections(&kinds);
        assert_eq!(shape(&group_sections(&input)), vec![5, 1]);
    }

    #[test]
    fn test_layout_selection() {
        use ContentType::*;
        let input = sections(&[Chart, Chart]);
        let refs: Vec<&Section> = input.iter().collect();
        assert_eq!(SlideLayout::select(&refs), SlideLayout::TwoCharts);
        assert_eq!(SlideLayout::select(&refs[..1]), SlideLayout::SingleChart);
        assert_eq!(SlideLayout::select(&[]), SlideLayout::Flow);
        assert_eq!(SlideLayout::TwoCharts.name(), "two-charts");
    }

    #[test]
    fn test_grid_cells() {
        let frames = SlideLayout::MetricsGrid.frames(6);
        assert_eq!(frames[0], Frame::new(0.5, 1.5, 3.0, 1.8));
        assert_eq!(frames[2], Frame::new(7.0, 1.5, 3.0, 1.8));
        assert_eq!(frames[3].x, 0.5);
        assert!((frames[3].y - 3.55).abs() < 1e-9);
    }

    #[test]
    fn test_flow_slots_step_down() {
        let frames = SlideLayout::Flow.frames(MAX_FLOW_SECTIONS);
        assert_eq!(frames[0].y, 1.5);
        assert_eq!(frames[1].y, 3.5);
        assert_eq!(SlideLayout::Table.frames(1), vec![TABLE_AREA]);
    }
}
