//! XLSX package generation.

use std::io::{Cursor, Seek, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::compiler::SpreadsheetSettings;
use crate::constants::*;
use crate::error::{Result, XlsxError};
use crate::sheet::{cell_ref, column_name, Cell, Value, Worksheet};
use crate::styles::Stylesheet;
use crate::workbook::Workbook;

/// XLSX document writer
pub struct XlsxWriter<'a> {
    workbook: &'a Workbook,
    settings: &'a SpreadsheetSettings,
    styles: Stylesheet,
}

impl<'a> XlsxWriter<'a> {
    pub fn new(workbook: &'a Workbook, settings: &'a SpreadsheetSettings) -> Self {
        Self {
            workbook,
            settings,
            styles: Stylesheet::default(),
        }
    }

    pub fn with_styles(mut self, styles: Stylesheet) -> Self {
        self.styles = styles;
        self
    }

    /// Generate the XLSX as bytes
    pub fn generate(&self) -> Result<Vec<u8>> {
        let (min, max) = (
            self.settings.min_column_width,
            self.settings.max_column_width,
        );
        if !(min > 0.0 && min <= max) {
            return Err(XlsxError::InvalidWidths { min, max });
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        self.write_content_types(&mut zip, options)?;
        self.write_root_rels(&mut zip, options)?;
        self.write_doc_props(&mut zip, options)?;
        self.write_workbook_xml(&mut zip, options)?;
        self.write_workbook_rels(&mut zip, options)?;

        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(self.styles.to_xml().as_bytes())?;

        for (i, sheet) in self.workbook.sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
            zip.write_all(self.sheet_xml(sheet).as_bytes())?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    /// Write [Content_Types].xml
    fn write_content_types<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
    ) -> Result<()> {
        zip.start_file("[Content_Types].xml", options)?;

        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="{}">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
  <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
  <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
"#,
            NS_CONTENT_TYPES
        );
        for i in 1..=self.workbook.sheets.len() {
            content.push_str(&format!(
                "  <Override PartName=\"/xl/worksheets/sheet{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\n",
                i
            ));
        }
        content.push_str("</Types>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Write _rels/.rels
    fn write_root_rels<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
    ) -> Result<()> {
        zip.start_file("_rels/.rels", options)?;

        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}">
  <Relationship Id="rId1" Type="{}" Target="xl/workbook.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#,
            NS_PACKAGE_RELATIONSHIPS, REL_TYPE_OFFICE_DOCUMENT
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Write docProps/app.xml and docProps/core.xml
    fn write_doc_props<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
    ) -> Result<()> {
        let titles: String = self
            .workbook
            .sheets
            .iter()
            .map(|s| format!("<vt:lpstr>{}</vt:lpstr>", escape(s.name.as_str())))
            .collect();
        let count = self.workbook.sheets.len();

        zip.start_file("docProps/app.xml", options)?;
        let app = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
  <Application>dashport</Application>
  <DocSecurity>0</DocSecurity>
  <ScaleCrop>false</ScaleCrop>
  <HeadingPairs><vt:vector size="2" baseType="variant"><vt:variant><vt:lpstr>Worksheets</vt:lpstr></vt:variant><vt:variant><vt:i4>{count}</vt:i4></vt:variant></vt:vector></HeadingPairs>
  <TitlesOfParts><vt:vector size="{count}" baseType="lpstr">{titles}</vt:vector></TitlesOfParts>
  <LinksUpToDate>false</LinksUpToDate>
  <SharedDoc>false</SharedDoc>
  <AppVersion>1.0</AppVersion>
</Properties>"#,
            count = count,
            titles = titles
        );
        zip.write_all(app.as_bytes())?;

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let created = self
            .workbook
            .created
            .as_deref()
            .and_then(|c| DateTime::parse_from_rfc3339(c).ok())
            .map(|c| c.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| now.clone());
        let author = if self.workbook.author.is_empty() {
            "dashport"
        } else {
            self.workbook.author.as_str()
        };

        zip.start_file("docProps/core.xml", options)?;
        let core = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <dc:title>{}</dc:title>
  <dc:creator>{}</dc:creator>
  <cp:lastModifiedBy>{}</cp:lastModifiedBy>
  <dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>
  <dcterms:modified xsi:type="dcterms:W3CDTF">{}</dcterms:modified>
</cp:coreProperties>"#,
            escape(self.workbook.title.as_str()),
            escape(author),
            escape(author),
            created,
            now
        );
        zip.write_all(core.as_bytes())?;
        Ok(())
    }

    /// Write xl/workbook.xml
    fn write_workbook_xml<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
    ) -> Result<()> {
        zip.start_file("xl/workbook.xml", options)?;

        let sheets: String = self
            .workbook
            .sheets
            .iter()
            .enumerate()
            .map(|(i, s)| {
                format!(
                    "    <sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"/>\n",
                    escape(s.name.as_str()),
                    i + 1,
                    i + 1
                )
            })
            .collect();

        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="{}">
  <bookViews>
    <workbookView xWindow="0" yWindow="0" windowWidth="28800" windowHeight="12300"/>
  </bookViews>
  <sheets>
{}  </sheets>
</workbook>"#,
            NS_SPREADSHEET, NS_RELATIONSHIPS, sheets
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Write xl/_rels/workbook.xml.rels; sheets first, styles last
    fn write_workbook_rels<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
    ) -> Result<()> {
        zip.start_file("xl/_rels/workbook.xml.rels", options)?;

        let mut rels = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Relationships xmlns=\"{}\">\n",
            NS_PACKAGE_RELATIONSHIPS
        );
        let count = self.workbook.sheets.len();
        for i in 1..=count {
            rels.push_str(&format!(
                "  <Relationship Id=\"rId{}\" Type=\"{}\" Target=\"worksheets/sheet{}.xml\"/>\n",
                i, REL_TYPE_WORKSHEET, i
            ));
        }
        rels.push_str(&format!(
            "  <Relationship Id=\"rId{}\" Type=\"{}\" Target=\"styles.xml\"/>\n",
            count + 1,
            REL_TYPE_STYLES
        ));
        rels.push_str("</Relationships>");

        zip.write_all(rels.as_bytes())?;
        Ok(())
    }

    /// Generate worksheet XML
    fn sheet_xml(&self, sheet: &Worksheet) -> String {
        let width = sheet.width();
        let dimension = if width == 0 || sheet.rows.is_empty() {
            "A1".to_string()
        } else {
            format!("A1:{}", cell_ref(sheet.rows.len() - 1, width - 1))
        };

        let cols: String = sheet
            .column_widths(self.settings.min_column_width, self.settings.max_column_width)
            .iter()
            .enumerate()
            .map(|(i, w)| {
                format!(
                    "<col min=\"{}\" max=\"{}\" width=\"{}\" customWidth=\"1\"/>",
                    i + 1,
                    i + 1,
                    w
                )
            })
            .collect();
        let cols = if cols.is_empty() {
            String::new()
        } else {
            format!("  <cols>{}</cols>\n", cols)
        };

        let mut data = String::new();
        for (r, row) in sheet.rows.iter().enumerate() {
            if row.is_empty() {
                continue;
            }
            data.push_str(&format!("    <row r=\"{}\">", r + 1));
            for (c, cell) in row.iter().enumerate() {
                data.push_str(&cell_xml(&cell_ref(r, c), cell));
            }
            data.push_str("</row>\n");
        }

        // The title row spans the used columns (at least three)
        let merge = match sheet.rows.first() {
            Some(first) if first.len() == 1 && width > 1 => format!(
                "  <mergeCells count=\"1\"><mergeCell ref=\"A1:{}1\"/></mergeCells>\n",
                column_name((width - 1).max(2))
            ),
            _ => String::new(),
        };

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{}" xmlns:r="{}">
  <dimension ref="{}"/>
  <sheetViews><sheetView workbookViewId="0"/></sheetViews>
  <sheetFormatPr defaultRowHeight="15"/>
{}  <sheetData>
{}  </sheetData>
{}</worksheet>"#,
            NS_SPREADSHEET, NS_RELATIONSHIPS, dimension, cols, data, merge
        )
    }
}

/// One `<c>` element; empty cells keep only their style
fn cell_xml(reference: &str, cell: &Cell) -> String {
    let style = match cell.style.xf_index() {
        0 => String::new(),
        s => format!(" s=\"{}\"", s),
    };
    match &cell.value {
        Value::Empty => format!("<c r=\"{}\"{}/>", reference, style),
        Value::Number(n) => format!("<c r=\"{}\"{}><v>{}</v></c>", reference, style, n),
        Value::Text(text) => format!(
            "<c r=\"{}\"{} t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
            reference,
            style,
            escape(text.as_str())
        ),
    }
}
