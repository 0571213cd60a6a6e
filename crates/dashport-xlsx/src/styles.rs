//! SpreadsheetML stylesheet (`xl/styles.xml`)

use dashport_ir::StyleDefinitions;

use crate::constants::NS_SPREADSHEET;

const DEFAULT_PRIMARY: &str = "9E1F63";
const BODY_COLOR: &str = "2D2D2D";
const SECTION_FILL: &str = "E2E1E6";

/// Fonts and colours of the generated workbook
#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    /// RGB hex without `#`
    pub primary: String,
    pub font: String,
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY.to_string(),
            font: "Verdana".to_string(),
        }
    }
}

impl Stylesheet {
    pub fn from_styles(styles: &StyleDefinitions) -> Self {
        Self {
            primary: rgb_hex(styles.primary()).unwrap_or_else(|| DEFAULT_PRIMARY.to_string()),
            font: styles.font().to_string(),
        }
    }

    /// Render `xl/styles.xml`; `cellXfs` order matches [`crate::sheet::Style`]
    pub fn to_xml(&self) -> String {
        let font = quick_xml::escape::escape(self.font.as_str());
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="{ns}">
  <fonts count="5">
    <font><sz val="11"/><color rgb="FF{body}"/><name val="{font}"/><family val="2"/></font>
    <font><b/><sz val="16"/><color rgb="FF{primary}"/><name val="{font}"/><family val="2"/></font>
    <font><b/><sz val="11"/><color rgb="FFFFFFFF"/><name val="{font}"/><family val="2"/></font>
    <font><b/><sz val="12"/><color rgb="FF{primary}"/><name val="{font}"/><family val="2"/></font>
    <font><i/><sz val="9"/><color rgb="FF666666"/><name val="{font}"/><family val="2"/></font>
  </fonts>
  <fills count="4">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FF{primary}"/><bgColor indexed="64"/></patternFill></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FF{section}"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border><left style="thin"><color rgb="FF{primary}"/></left><right style="thin"><color rgb="FF{primary}"/></right><top style="thin"><color rgb="FF{primary}"/></top><bottom style="thin"><color rgb="FF{primary}"/></bottom><diagonal/></border>
  </borders>
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>
  <cellXfs count="5">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>
    <xf numFmtId="0" fontId="2" fillId="2" borderId="1" xfId="0" applyFont="1" applyFill="1" applyBorder="1" applyAlignment="1"><alignment horizontal="center" vertical="center"/></xf>
    <xf numFmtId="0" fontId="3" fillId="3" borderId="0" xfId="0" applyFont="1" applyFill="1"/>
    <xf numFmtId="0" fontId="4" fillId="0" borderId="0" xfId="0" applyFont="1"/>
  </cellXfs>
  <cellStyles count="1">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles>
</styleSheet>"#,
            ns = NS_SPREADSHEET,
            body = BODY_COLOR,
            primary = self.primary,
            section = SECTION_FILL,
            font = font
        )
    }
}

/// `#rgb` or `#rrggbb` to upper-case `RRGGBB`
fn rgb_hex(css: &str) -> Option<String> {
    let hex = css.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => Some(hex.to_ascii_uppercase()),
        3 => Some(
            hex.chars()
                .flat_map(|c| [c, c])
                .collect::<String>()
                .to_ascii_uppercase(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_hex() {
        assert_eq!(rgb_hex("#9e1f63").as_deref(), Some("9E1F63"));
        assert_eq!(rgb_hex("#abc").as_deref(), Some("AABBCC"));
        assert_eq!(rgb_hex("red"), None);
        assert_eq!(rgb_hex("#12345"), None);
    }

    #[test]
    fn test_stylesheet_uses_primary() {
        let mut styles = StyleDefinitions::default();
        styles
            .colors
            .insert("primary".to_string(), "#005b8c".to_string());
        let sheet = Stylesheet::from_styles(&styles);
        assert_eq!(sheet.primary, "005B8C");

        let xml = sheet.to_xml();
        assert!(xml.contains("<fgColor rgb=\"FF005B8C\"/>"));
        assert!(xml.contains("<cellXfs count=\"5\">"));
    }
}
