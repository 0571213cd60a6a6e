//! Worksheet model: styled cells in rows, sheet naming and column sizing.

use std::collections::HashSet;

/// Maximum worksheet name length
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Characters a worksheet name cannot contain
const FORBIDDEN_NAME_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Cell formatting, one entry per `cellXfs` record in the stylesheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    #[default]
    Body,
    /// Sheet title: large, bold, primary colour
    Title,
    /// Table header: bold white on primary
    Header,
    /// Block caption inside a sheet
    Section,
    /// Small italic annotation
    Note,
}

impl Style {
    /// Index into `cellXfs`
    pub fn xf_index(self) -> u32 {
        match self {
            Self::Body => 0,
            Self::Title => 1,
            Self::Header => 2,
            Self::Section => 3,
            Self::Note => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: Value,
    pub style: Style,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            value: Value::Text(text.into()),
            style: Style::Body,
        }
    }

    /// A numeric cell; non-finite numbers are written as text
    pub fn number(n: f64) -> Self {
        let value = if n.is_finite() {
            Value::Number(n)
        } else {
            Value::Text(n.to_string())
        };
        Self {
            value,
            style: Style::Body,
        }
    }

    pub fn empty() -> Self {
        Self {
            value: Value::Empty,
            style: Style::Body,
        }
    }

    /// Number when the text is a plain decimal (thousands separators
    /// allowed), text otherwise
    pub fn guess(text: &str) -> Self {
        let trimmed = text.trim();
        let plain = trimmed.replace(',', "");
        match plain.parse::<f64>() {
            Ok(n) if !trimmed.is_empty() && n.is_finite() => Self::number(n),
            _ => Self::text(text),
        }
    }

    pub fn styled(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Displayed width in characters, used for column sizing
    pub fn display_len(&self) -> usize {
        match &self.value {
            Value::Empty => 0,
            Value::Text(s) => s.chars().count(),
            Value::Number(n) => n.to_string().len(),
        }
    }
}

/// A single worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    pub name: String,
    /// Rows in order; an empty row is a spacer
    pub rows: Vec<Vec<Cell>>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn push_blank(&mut self) {
        self.rows.push(Vec::new());
    }

    /// A one-cell row in the given style
    pub fn push_line(&mut self, text: impl Into<String>, style: Style) {
        self.rows.push(vec![Cell::text(text).styled(style)]);
    }

    /// A row of header cells
    pub fn push_header<S: AsRef<str>>(&mut self, labels: &[S]) {
        self.rows.push(
            labels
                .iter()
                .map(|l| Cell::text(l.as_ref()).styled(Style::Header))
                .collect(),
        );
    }

    /// Number of columns in use
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Number of rows holding at least one cell
    pub fn filled_rows(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_empty()).count()
    }

    /// Column widths in characters from the longest content of each column,
    /// padded and clamped to `[min, max]`
    pub fn column_widths(&self, min: f64, max: f64) -> Vec<f64> {
        let mut widths = vec![min; self.width()];
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.display_len();
                if len == 0 {
                    continue;
                }
                let estimate = (len as f64 * 1.2 + 2.0).min(max).ceil();
                widths[i] = widths[i].max(estimate);
            }
        }
        widths.into_iter().map(|w| w.clamp(min, max)).collect()
    }
}

/// Hands out valid, unique worksheet names
#[derive(Debug, Default)]
pub struct SheetNames {
    used: HashSet<String>,
}

impl SheetNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitise `raw` and make it unique within the workbook
    pub fn assign(&mut self, raw: &str) -> String {
        let base = sanitize_sheet_name(raw);
        let mut candidate = base.clone();
        let mut n = 2;
        // Excel compares sheet names case-insensitively
        while self.used.contains(&candidate.to_lowercase()) {
            let suffix = format!(" ({})", n);
            let keep = MAX_SHEET_NAME_LEN - suffix.chars().count();
            candidate = format!("{}{}", truncate_chars(&base, keep).trim_end(), suffix);
            n += 1;
        }
        self.used.insert(candidate.to_lowercase());
        candidate
    }
}

/// Replace forbidden characters, strip edge apostrophes and truncate to the
/// 31-character limit
pub fn sanitize_sheet_name(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| {
            if FORBIDDEN_NAME_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = replaced.trim().trim_matches('\'');
    let name = truncate_chars(trimmed, MAX_SHEET_NAME_LEN).trim_end().to_string();
    if name.is_empty() {
        "Sheet".to_string()
    } else {
        name
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Spreadsheet column letters for a 0-based index (`0 -> A`, `26 -> AA`)
pub fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// A1-style reference for 0-based row and column
pub fn cell_ref(row: usize, col: usize) -> String {
    format!("{}{}", column_name(col), row + 1)
}
