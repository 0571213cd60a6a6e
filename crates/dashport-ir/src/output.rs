//! Compiled output documents

use std::fmt;

use crate::config::ExportFormat;

/// A compiled document. Immutable once produced.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    format: ExportFormat,
    data: Vec<u8>,
    filename: String,
    size: usize,
    mime_type: &'static str,
}

impl Document {
    /// Wrap a compiled payload; the filename is derived from `title`
    pub fn new(format: ExportFormat, title: &str, data: Vec<u8>) -> Self {
        let filename = format!("{}.{}", sanitize_filename(title), format.extension());
        Self {
            format,
            size: data.len(),
            data,
            filename,
            mime_type: format.mime_type(),
        }
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("format", &self.format)
            .field("filename", &self.filename)
            .field("size", &self.size)
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Replace every character outside `[A-Za-z0-9]` with `_`.
///
/// An empty title becomes `export`.
pub fn sanitize_filename(title: &str) -> String {
    if title.is_empty() {
        return "export".to_string();
    }
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Sales Q3/2024"), "Sales_Q3_2024");
        assert_eq!(sanitize_filename("Dashboard Export"), "Dashboard_Export");
        assert_eq!(sanitize_filename("Ümsatz"), "_msatz");
        assert_eq!(sanitize_filename(""), "export");
    }

    #[test]
    fn test_document_fields() {
        let doc = Document::new(ExportFormat::Excel, "KPI Report", vec![1, 2, 3]);
        assert_eq!(doc.filename(), "KPI_Report.xlsx");
        assert_eq!(doc.size(), 3);
        assert_eq!(doc.format(), ExportFormat::Excel);
        assert!(doc.mime_type().contains("spreadsheetml"));
        assert!(format!("{:?}", doc).contains("KPI_Report.xlsx"));
    }
}
