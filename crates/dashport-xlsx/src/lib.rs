//! # dashport-xlsx
//!
//! Excel (XLSX) workbooks from the dashboard IR.
//!
//! - **One sheet per section**: each sheet opens with a title row, then the
//!   section's content: metric rows, table headers and rows, flattened chart
//!   series, or raw text
//! - **Degraded mode**: without an IR, key metrics, tables and text are
//!   extracted straight from the capture tree into a single sheet
//! - **Sizing**: column widths follow the longest content, clamped to the
//!   configured range
//!
//! ## Example
//!
//! ```rust,ignore
//! use dashport_ir::{Compiler, IrDocument};
//! use dashport_xlsx::XlsxCompiler;
//!
//! let ir = IrDocument::new("Quarterly Review");
//! let doc = XlsxCompiler::default().compile(&ir)?;
//! std::fs::write(doc.filename(), doc.data())?;
//! ```

mod compiler;
pub mod degraded;
pub mod error;
pub mod sheet;
pub mod styles;
pub mod workbook;
pub mod writer;

pub use compiler::{SpreadsheetSettings, XlsxCompiler};
pub use degraded::extract_workbook;
pub use error::{Result, XlsxError};
pub use sheet::{Cell, Style, Value, Worksheet};
pub use workbook::{build_workbook, Workbook};
pub use writer::XlsxWriter;

/// SpreadsheetML constants
pub mod constants {
    /// SpreadsheetML main namespace
    pub const NS_SPREADSHEET: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

    /// Relationships namespace
    pub const NS_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    /// Package relationships namespace
    pub const NS_PACKAGE_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships";

    /// Content Types namespace
    pub const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

    /// Main document relationship type
    pub const REL_TYPE_OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

    /// Worksheet relationship type
    pub const REL_TYPE_WORKSHEET: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

    /// Styles relationship type
    pub const REL_TYPE_STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
}
