//! PPTX package generation.
//!
//! Serialises a [`Deck`] into an OOXML package: content types, document
//! properties, presentation, theme, one master with the title and content
//! layouts, slides, notes, chart parts and media.

use std::borrow::Cow;
use std::io::{Cursor, Seek, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use dashport_ir::document::HAlign;
use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::compiler::SlideSettings;
use crate::constants::*;
use crate::error::{PptxError, Result};
use crate::slide::{
    Anchor, ChartFrame, Deck, Frame, Master, PartRef, Picture, RectShape, Shape, Slide, TableShape,
    TextBox, TextStyle,
};
use crate::theme::Theme;

/// PPTX document writer
pub struct PptxWriter<'a> {
    deck: &'a Deck,
    settings: &'a SlideSettings,
    theme: Theme,
    /// Slide size in EMU
    size: (i64, i64),
}

impl<'a> PptxWriter<'a> {
    pub fn new(deck: &'a Deck, settings: &'a SlideSettings) -> Self {
        Self {
            deck,
            settings,
            theme: Theme::default(),
            size: settings.slide_size(),
        }
    }

    /// Use a theme other than the default palette
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Generate the PPTX as bytes
    pub fn generate(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        self.write_content_types(&mut zip, options)?;
        self.write_root_rels(&mut zip, options)?;
        self.write_app_xml(&mut zip, options)?;
        self.write_core_xml(&mut zip, options)?;
        self.write_presentation_xml(&mut zip, options)?;
        self.write_presentation_rels(&mut zip, options)?;
        self.write_static_parts(&mut zip, options)?;
        self.write_theme(&mut zip, options)?;
        self.write_slide_master(&mut zip, options)?;
        self.write_slide_layouts(&mut zip, options)?;

        for (i, slide) in self.deck.slides.iter().enumerate() {
            self.write_slide(&mut zip, options, i + 1, slide)?;
            if slide.notes.is_some() {
                self.write_notes_slide(&mut zip, options, i + 1, slide)?;
            }
        }

        for (i, chart) in self.deck.charts.iter().enumerate() {
            zip.start_file(format!("ppt/charts/chart{}.xml", i + 1), options)?;
            zip.write_all(chart.to_xml().as_bytes())?;
        }

        for media in &self.deck.media {
            zip.start_file(format!("ppt/media/{}", media.name), options)?;
            zip.write_all(&media.data)?;
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
  <Default Extension="png" ContentType="image/png"/>
  <Default Extension="jpeg" ContentType="image/jpeg"/>
  <Default Extension="jpg" ContentType="image/jpeg"/>
  <Default Extension="gif" ContentType="image/gif"/>
  <Default Extension="svg" ContentType="image/svg+xml"/>
  <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
  <Override PartName="/ppt/presProps.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presProps+xml"/>
  <Override PartName="/ppt/tableStyles.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml"/>
  <Override PartName="/ppt/viewProps.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml"/>
  <Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>
  <Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>
  <Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>
  <Override PartName="/ppt/slideLayouts/slideLayout2.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
  <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
"#,
            NS_CONTENT_TYPES
        );

        for (i, slide) in self.deck.slides.iter().enumerate() {
            content.push_str(&format!(
                "  <Override PartName=\"/ppt/slides/slide{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>\n",
                i + 1
            ));
            if slide.notes.is_some() {
                content.push_str(&format!(
                    "  <Override PartName=\"/ppt/notesSlides/notesSlide{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml\"/>\n",
                    i + 1
                ));
            }
        }

        for i in 1..=self.deck.charts.len() {
            content.push_str(&format!(
                "  <Override PartName=\"/ppt/charts/chart{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.drawingml.chart+xml\"/>\n",
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

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Write docProps/app.xml
    fn write_app_xml<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
    ) -> Result<()> {
        zip.start_file("docProps/app.xml", options)?;

        let notes = self.deck.slides.iter().filter(|s| s.notes.is_some()).count();
        let format = if self.settings.widescreen {
            "On-screen Show (16:9)"
        } else {
            "On-screen Show (4:3)"
        };

        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
  <TotalTime>0</TotalTime>
  <Application>dashport</Application>
  <PresentationFormat>{}</PresentationFormat>
  <Slides>{}</Slides>
  <Notes>{}</Notes>
  <HiddenSlides>0</HiddenSlides>
  <ScaleCrop>false</ScaleCrop>
  <Company>{}</Company>
  <LinksUpToDate>false</LinksUpToDate>
  <SharedDoc>false</SharedDoc>
  <HyperlinksChanged>false</HyperlinksChanged>
  <AppVersion>1.0</AppVersion>
</Properties>"#,
            format,
            self.deck.slides.len(),
            notes,
            escape(self.deck.company.as_str())
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Write docProps/core.xml
    fn write_core_xml<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
    ) -> Result<()> {
        zip.start_file("docProps/core.xml", options)?;

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let created = self
            .deck
            .created
            .as_deref()
            .and_then(|c| DateTime::parse_from_rfc3339(c).ok())
            .map(|c| c.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| now.clone());
        let author = if self.deck.author.is_empty() {
            "dashport"
        } else {
            self.deck.author.as_str()
        };

        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <dc:title>{}</dc:title>
  <dc:subject>{}</dc:subject>
  <dc:creator>{}</dc:creator>
  <cp:lastModifiedBy>{}</cp:lastModifiedBy>
  <cp:revision>1</cp:revision>
  <dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>
  <dcterms:modified xsi:type="dcterms:W3CDTF">{}</dcterms:modified>
</cp:coreProperties>"#,
            escape(self.deck.title.as_str()),
            escape(self.deck.subject.as_str()),
            escape(author),
            escape(author),
            created,
            now
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Write ppt/presentation.xml
    fn write_presentation_xml<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
    ) -> Result<()> {
        zip.start_file("ppt/presentation.xml", options)?;

        let mut slide_refs = String::new();
        for i in 1..=self.deck.slides.len() {
            slide_refs.push_str(&format!(
                "    <p:sldId id=\"{}\" r:id=\"rId{}\"/>\n",
                255 + i,
                i + 3 // rId1=slideMaster, rId2=presProps, rId3=theme, rId4+=slides
            ));
        }

        let (cx, cy) = self.size;
        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" saveSubsetFonts="1">
  <p:sldMasterIdLst>
    <p:sldMasterId id="2147483648" r:id="rId1"/>
  </p:sldMasterIdLst>
  <p:sldIdLst>
{}  </p:sldIdLst>
  <p:sldSz cx="{}" cy="{}"/>
  <p:notesSz cx="{}" cy="{}"/>
</p:presentation>"#,
            NS_DRAWING, NS_RELATIONSHIPS, NS_PRESENTATION, slide_refs, cx, cy, cy, cx
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Write ppt/_rels/presentation.xml.rels
    fn write_presentation_rels<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
    ) -> Result<()> {
        zip.start_file("ppt/_rels/presentation.xml.rels", options)?;

        let mut rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="{}" Target="slideMasters/slideMaster1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps" Target="presProps.xml"/>
  <Relationship Id="rId3" Type="{}" Target="theme/theme1.xml"/>
"#,
            REL_TYPE_SLIDE_MASTER, REL_TYPE_THEME
        );

        for i in 1..=self.deck.slides.len() {
            rels.push_str(&format!(
                "  <Relationship Id=\"rId{}\" Type=\"{}\" Target=\"slides/slide{}.xml\"/>\n",
                i + 3,
                REL_TYPE_SLIDE,
                i
            ));
        }

        rels.push_str("</Relationships>");
        zip.write_all(rels.as_bytes())?;
        Ok(())
    }

    /// Write presProps, tableStyles and viewProps
    fn write_static_parts<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
    ) -> Result<()> {
        zip.start_file("ppt/presProps.xml", options)?;
        zip.write_all(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentationPr xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"/>"#,
                NS_DRAWING, NS_RELATIONSHIPS, NS_PRESENTATION
            )
            .as_bytes(),
        )?;

        zip.start_file("ppt/tableStyles.xml", options)?;
        zip.write_all(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:tblStyleLst xmlns:a="{}" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#,
                NS_DRAWING
            )
            .as_bytes(),
        )?;

        zip.start_file("ppt/viewProps.xml", options)?;
        zip.write_all(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:viewPr xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">
  <p:normalViewPr>
    <p:restoredLeft sz="15620"/>
    <p:restoredTop sz="94660"/>
  </p:normalViewPr>
</p:viewPr>"#,
                NS_DRAWING, NS_RELATIONSHIPS, NS_PRESENTATION
            )
            .as_bytes(),
        )?;
        Ok(())
    }

    /// Write ppt/theme/theme1.xml
    fn write_theme<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
    ) -> Result<()> {
        zip.start_file("ppt/theme/theme1.xml", options)?;

        let t = &self.theme;
        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="{ns}" name="dashport">
  <a:themeElements>
    <a:clrScheme name="dashport">
      <a:dk1><a:srgbClr val="000000"/></a:dk1>
      <a:lt1><a:srgbClr val="FFFFFF"/></a:lt1>
      <a:dk2><a:srgbClr val="{secondary}"/></a:dk2>
      <a:lt2><a:srgbClr val="F5F5F5"/></a:lt2>
      <a:accent1><a:srgbClr val="{primary}"/></a:accent1>
      <a:accent2><a:srgbClr val="{secondary}"/></a:accent2>
      <a:accent3><a:srgbClr val="{accent}"/></a:accent3>
      <a:accent4><a:srgbClr val="E05E3D"/></a:accent4>
      <a:accent5><a:srgbClr val="6B7280"/></a:accent5>
      <a:accent6><a:srgbClr val="10B981"/></a:accent6>
      <a:hlink><a:srgbClr val="{accent}"/></a:hlink>
      <a:folHlink><a:srgbClr val="{secondary}"/></a:folHlink>
    </a:clrScheme>
    <a:fontScheme name="dashport">
      <a:majorFont>
        <a:latin typeface="{font}"/>
        <a:ea typeface=""/>
        <a:cs typeface=""/>
      </a:majorFont>
      <a:minorFont>
        <a:latin typeface="{font}"/>
        <a:ea typeface=""/>
        <a:cs typeface=""/>
      </a:minorFont>
    </a:fontScheme>
    <a:fmtScheme name="dashport">
      <a:fillStyleLst>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
      </a:fillStyleLst>
      <a:lnStyleLst>
        <a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
        <a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
        <a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
      </a:lnStyleLst>
      <a:effectStyleLst>
        <a:effectStyle><a:effectLst/></a:effectStyle>
        <a:effectStyle><a:effectLst/></a:effectStyle>
        <a:effectStyle><a:effectLst/></a:effectStyle>
      </a:effectStyleLst>
      <a:bgFillStyleLst>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
      </a:bgFillStyleLst>
    </a:fmtScheme>
  </a:themeElements>
</a:theme>"#,
            ns = NS_DRAWING,
            primary = t.primary,
            secondary = t.secondary,
            accent = t.accent,
            font = escape(t.font.as_str())
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Write ppt/slideMasters/slideMaster1.xml
    fn write_slide_master<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
    ) -> Result<()> {
        zip.start_file("ppt/slideMasters/slideMaster1.xml", options)?;

        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">
  <p:cSld>
    <p:bg>
      <p:bgRef idx="1001">
        <a:schemeClr val="bg1"/>
      </p:bgRef>
    </p:bg>
    <p:spTree>
      <p:nvGrpSpPr>
        <p:cNvPr id="1" name=""/>
        <p:cNvGrpSpPr/>
        <p:nvPr/>
      </p:nvGrpSpPr>
      <p:grpSpPr/>
    </p:spTree>
  </p:cSld>
  <p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>
  <p:sldLayoutIdLst>
    <p:sldLayoutId id="2147483649" r:id="rId1"/>
    <p:sldLayoutId id="2147483650" r:id="rId2"/>
  </p:sldLayoutIdLst>
</p:sldMaster>"#,
            NS_DRAWING, NS_RELATIONSHIPS, NS_PRESENTATION
        );

        zip.write_all(content.as_bytes())?;

        zip.start_file("ppt/slideMasters/_rels/slideMaster1.xml.rels", options)?;
        let rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}">
  <Relationship Id="rId1" Type="{}" Target="../slideLayouts/slideLayout1.xml"/>
  <Relationship Id="rId2" Type="{}" Target="../slideLayouts/slideLayout2.xml"/>
  <Relationship Id="rId3" Type="{}" Target="../theme/theme1.xml"/>
</Relationships>"#,
            NS_PACKAGE_RELATIONSHIPS, REL_TYPE_SLIDE_LAYOUT, REL_TYPE_SLIDE_LAYOUT, REL_TYPE_THEME
        );
        zip.write_all(rels.as_bytes())?;
        Ok(())
    }

    /// Write the title layout (primary background, centred white text) and
    /// the content layout (white background, primary title band)
    fn write_slide_layouts<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
    ) -> Result<()> {
        let (w, h) = self.size;
        let pct = |total: i64, p: i64| total * p / 100;
        let primary = &self.theme.primary;

        zip.start_file("ppt/slideLayouts/slideLayout1.xml", options)?;
        let title_layout = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" type="title" preserve="1">
  <p:cSld name="Title Slide">
    <p:bg><p:bgPr><a:solidFill><a:srgbClr val="{primary}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>
    <p:spTree>
      <p:nvGrpSpPr>
        <p:cNvPr id="1" name=""/>
        <p:cNvGrpSpPr/>
        <p:nvPr/>
      </p:nvGrpSpPr>
      <p:grpSpPr/>
{}{}    </p:spTree>
  </p:cSld>
  <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sldLayout>"#,
            NS_DRAWING,
            NS_RELATIONSHIPS,
            NS_PRESENTATION,
            layout_placeholder(2, "Title 1", "ctrTitle", None, (pct(w, 10), pct(h, 35), pct(w, 80), pct(h, 20)), 44, true, "ctr"),
            layout_placeholder(3, "Subtitle 2", "subTitle", Some(1), (pct(w, 10), pct(h, 60), pct(w, 80), pct(h, 10)), 24, false, "ctr"),
            primary = primary
        );
        zip.write_all(title_layout.as_bytes())?;

        let layout_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}">
  <Relationship Id="rId1" Type="{}" Target="../slideMasters/slideMaster1.xml"/>
</Relationships>"#,
            NS_PACKAGE_RELATIONSHIPS, REL_TYPE_SLIDE_MASTER
        );
        zip.start_file("ppt/slideLayouts/_rels/slideLayout1.xml.rels", options)?;
        zip.write_all(layout_rels.as_bytes())?;

        zip.start_file("ppt/slideLayouts/slideLayout2.xml", options)?;
        let content_layout = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" type="titleOnly" preserve="1">
  <p:cSld name="Content Slide">
    <p:bg><p:bgPr><a:solidFill><a:srgbClr val="FFFFFF"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>
    <p:spTree>
      <p:nvGrpSpPr>
        <p:cNvPr id="1" name=""/>
        <p:cNvGrpSpPr/>
        <p:nvPr/>
      </p:nvGrpSpPr>
      <p:grpSpPr/>
      <p:sp>
        <p:nvSpPr>
          <p:cNvPr id="4" name="Title Band"/>
          <p:cNvSpPr/>
          <p:nvPr userDrawn="1"/>
        </p:nvSpPr>
        <p:spPr>
          <a:xfrm><a:off x="0" y="0"/><a:ext cx="{}" cy="{}"/></a:xfrm>
          <a:prstGeom prst="rect"><a:avLst/></a:prstGeom>
          <a:solidFill><a:srgbClr val="{primary}"/></a:solidFill>
          <a:ln><a:noFill/></a:ln>
        </p:spPr>
      </p:sp>
{}    </p:spTree>
  </p:cSld>
  <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sldLayout>"#,
            NS_DRAWING,
            NS_RELATIONSHIPS,
            NS_PRESENTATION,
            w,
            pct(h, 12),
            layout_placeholder(2, "Title 1", "title", None, (pct(w, 5), pct(h, 4), pct(w, 90), pct(h, 8)), 32, true, "l"),
            primary = primary
        );
        zip.write_all(content_layout.as_bytes())?;

        zip.start_file("ppt/slideLayouts/_rels/slideLayout2.xml.rels", options)?;
        zip.write_all(layout_rels.as_bytes())?;
        Ok(())
    }

    /// Write a single slide and its relationships
    fn write_slide<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
        slide_num: usize,
        slide: &Slide,
    ) -> Result<()> {
        let parts = slide.part_refs();
        let xml = self.generate_slide_xml(slide)?;
        zip.start_file(format!("ppt/slides/slide{}.xml", slide_num), options)?;
        zip.write_all(xml.as_bytes())?;

        zip.start_file(
            format!("ppt/slides/_rels/slide{}.xml.rels", slide_num),
            options,
        )?;

        let mut rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}">
  <Relationship Id="rId1" Type="{}" Target="../slideLayouts/slideLayout{}.xml"/>
"#,
            NS_PACKAGE_RELATIONSHIPS,
            REL_TYPE_SLIDE_LAYOUT,
            slide.master.layout_index()
        );

        for (k, part) in parts.iter().enumerate() {
            let (kind, target) = match *part {
                PartRef::Media(i) => {
                    let media = self
                        .deck
                        .media
                        .get(i)
                        .ok_or_else(|| PptxError::missing_part("media", i))?;
                    (REL_TYPE_IMAGE, format!("../media/{}", media.name))
                }
                PartRef::Chart(i) => {
                    if i >= self.deck.charts.len() {
                        return Err(PptxError::missing_part("chart", i));
                    }
                    (REL_TYPE_CHART, format!("../charts/chart{}.xml", i + 1))
                }
            };
            rels.push_str(&format!(
                "  <Relationship Id=\"rId{}\" Type=\"{}\" Target=\"{}\"/>\n",
                k + 2,
                kind,
                target
            ));
        }

        if slide.notes.is_some() {
            rels.push_str(&format!(
                "  <Relationship Id=\"rId{}\" Type=\"{}\" Target=\"../notesSlides/notesSlide{}.xml\"/>\n",
                parts.len() + 2,
                REL_TYPE_NOTES_SLIDE,
                slide_num
            ));
        }

        rels.push_str("</Relationships>");
        zip.write_all(rels.as_bytes())?;
        Ok(())
    }

    /// Generate slide XML content
    fn generate_slide_xml(&self, slide: &Slide) -> Result<String> {
        let mut shapes = String::new();
        let mut shape_id = 2u32;

        if let Some(title) = &slide.title {
            let ph = match slide.master {
                Master::Title => "ctrTitle",
                Master::Content => "title",
            };
            shapes.push_str(&placeholder_shape(shape_id, ph, None, title));
            shape_id += 1;
        }
        if let (Master::Title, Some(subtitle)) = (slide.master, &slide.subtitle) {
            shapes.push_str(&placeholder_shape(shape_id, "subTitle", Some(1), subtitle));
            shape_id += 1;
        }

        let mut rel = 2usize;
        for shape in &slide.shapes {
            let xml = match shape {
                Shape::Text(text) => text_shape(shape_id, text),
                Shape::Rect(rect) => rect_shape(shape_id, rect),
                Shape::Table(table) => table_shape(shape_id, table),
                Shape::Picture(picture) => {
                    let xml = picture_shape(shape_id, picture, rel);
                    rel += 1;
                    xml
                }
                Shape::Chart(chart) => {
                    let xml = chart_shape(shape_id, chart, rel);
                    rel += 1;
                    xml
                }
            };
            shapes.push_str(&xml);
            shape_id += 1;
        }

        Ok(format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">
  <p:cSld>
    <p:spTree>
      <p:nvGrpSpPr>
        <p:cNvPr id="1" name=""/>
        <p:cNvGrpSpPr/>
        <p:nvPr/>
      </p:nvGrpSpPr>
      <p:grpSpPr/>
{}    </p:spTree>
  </p:cSld>
  <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sld>"#,
            NS_DRAWING, NS_RELATIONSHIPS, NS_PRESENTATION, shapes
        ))
    }

    /// Write speaker notes slide
    fn write_notes_slide<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        options: SimpleFileOptions,
        slide_num: usize,
        slide: &Slide,
    ) -> Result<()> {
        let Some(notes) = slide.notes.as_deref() else {
            return Ok(());
        };

        zip.start_file(
            format!("ppt/notesSlides/notesSlide{}.xml", slide_num),
            options,
        )?;

        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notes xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">
  <p:cSld>
    <p:spTree>
      <p:nvGrpSpPr>
        <p:cNvPr id="1" name=""/>
        <p:cNvGrpSpPr/>
        <p:nvPr/>
      </p:nvGrpSpPr>
      <p:grpSpPr/>
      <p:sp>
        <p:nvSpPr>
          <p:cNvPr id="2" name="Slide Image Placeholder 1"/>
          <p:cNvSpPr><a:spLocks noGrp="1" noRot="1" noChangeAspect="1"/></p:cNvSpPr>
          <p:nvPr><p:ph type="sldImg"/></p:nvPr>
        </p:nvSpPr>
        <p:spPr/>
      </p:sp>
      <p:sp>
        <p:nvSpPr>
          <p:cNvPr id="3" name="Notes Placeholder 2"/>
          <p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>
          <p:nvPr><p:ph type="body" idx="1"/></p:nvPr>
        </p:nvSpPr>
        <p:spPr/>
        <p:txBody>
          <a:bodyPr/>
          <a:lstStyle/>
{}        </p:txBody>
      </p:sp>
    </p:spTree>
  </p:cSld>
</p:notes>"#,
            NS_DRAWING,
            NS_RELATIONSHIPS,
            NS_PRESENTATION,
            paragraphs(notes, "lang=\"en-US\"", "")
        );
        zip.write_all(content.as_bytes())?;

        zip.start_file(
            format!("ppt/notesSlides/_rels/notesSlide{}.xml.rels", slide_num),
            options,
        )?;
        let rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}">
  <Relationship Id="rId1" Type="{}" Target="../slides/slide{}.xml"/>
</Relationships>"#,
            NS_PACKAGE_RELATIONSHIPS, REL_TYPE_SLIDE, slide_num
        );
        zip.write_all(rels.as_bytes())?;
        Ok(())
    }
}

/// Inches to EMU
pub fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH as f64).round() as i64
}

fn xfrm(frame: &Frame) -> String {
    format!(
        "<a:xfrm><a:off x=\"{}\" y=\"{}\"/><a:ext cx=\"{}\" cy=\"{}\"/></a:xfrm>",
        emu(frame.x),
        emu(frame.y),
        emu(frame.w.max(0.0)),
        emu(frame.h.max(0.0))
    )
}

fn esc(text: &str) -> Cow<'_, str> {
    escape(text)
}

fn align_attr(align: HAlign) -> &'static str {
    match align {
        HAlign::Left => "l",
        HAlign::Center => "ctr",
        HAlign::Right => "r",
        HAlign::Justify => "just",
    }
}

fn anchor_attr(anchor: Anchor) -> &'static str {
    match anchor {
        Anchor::Top => "t",
        Anchor::Middle => "ctr",
        Anchor::Bottom => "b",
    }
}

/// One `<a:p>` per line of `text`
fn paragraphs(text: &str, run_attrs: &str, run_props: &str) -> String {
    text.split('\n')
        .map(|line| {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                format!("          <a:p><a:endParaRPr {}/></a:p>\n", run_attrs)
            } else {
                format!(
                    "          <a:p><a:r><a:rPr {}>{}</a:rPr><a:t>{}</a:t></a:r></a:p>\n",
                    run_attrs,
                    run_props,
                    esc(line)
                )
            }
        })
        .collect()
}

fn run_attrs(style: &TextStyle) -> String {
    let mut attrs = format!("lang=\"en-US\" sz=\"{}\"", (style.size * 100.0).round() as i64);
    if style.bold {
        attrs.push_str(" b=\"1\"");
    }
    if style.italic {
        attrs.push_str(" i=\"1\"");
    }
    attrs.push_str(" dirty=\"0\"");
    attrs
}

fn run_props(style: &TextStyle) -> String {
    let mut props = format!(
        "<a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill>",
        style.color
    );
    if let Some(font) = &style.font {
        props.push_str(&format!("<a:latin typeface=\"{}\"/>", esc(font)));
    }
    props
}

/// Placeholder on a layout, with its position and default run formatting
#[allow(clippy::too_many_arguments)]
fn layout_placeholder(
    id: u32,
    name: &str,
    ph_type: &str,
    idx: Option<u32>,
    (x, y, cx, cy): (i64, i64, i64, i64),
    size: u32,
    bold: bool,
    align: &str,
) -> String {
    let idx = idx.map(|i| format!(" idx=\"{}\"", i)).unwrap_or_default();
    format!(
        r#"      <p:sp>
        <p:nvSpPr>
          <p:cNvPr id="{}" name="{}"/>
          <p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>
          <p:nvPr><p:ph type="{}"{}/></p:nvPr>
        </p:nvSpPr>
        <p:spPr>
          <a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>
        </p:spPr>
        <p:txBody>
          <a:bodyPr anchor="ctr"/>
          <a:lstStyle>
            <a:lvl1pPr algn="{}"><a:defRPr sz="{}" b="{}"><a:solidFill><a:srgbClr val="FFFFFF"/></a:solidFill></a:defRPr></a:lvl1pPr>
          </a:lstStyle>
          <a:p><a:endParaRPr lang="en-US"/></a:p>
        </p:txBody>
      </p:sp>
"#,
        id,
        name,
        ph_type,
        idx,
        x,
        y,
        cx,
        cy,
        align,
        size * 100,
        if bold { 1 } else { 0 }
    )
}

/// Text in one of the layout's placeholders
fn placeholder_shape(id: u32, ph_type: &str, idx: Option<u32>, text: &str) -> String {
    let idx = idx.map(|i| format!(" idx=\"{}\"", i)).unwrap_or_default();
    format!(
        r#"      <p:sp>
        <p:nvSpPr>
          <p:cNvPr id="{}" name="Placeholder {}"/>
          <p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>
          <p:nvPr><p:ph type="{}"{}/></p:nvPr>
        </p:nvSpPr>
        <p:spPr/>
        <p:txBody>
          <a:bodyPr/>
          <a:lstStyle/>
{}        </p:txBody>
      </p:sp>
"#,
        id,
        id,
        ph_type,
        idx,
        paragraphs(text, "lang=\"en-US\" dirty=\"0\"", "")
    )
}

fn text_shape(id: u32, text: &TextBox) -> String {
    let style = &text.style;
    let runs = paragraphs(&text.text, &run_attrs(style), &run_props(style))
        .replace("<a:p>", &format!("<a:p><a:pPr algn=\"{}\"/>", align_attr(style.align)));
    format!(
        r#"      <p:sp>
        <p:nvSpPr>
          <p:cNvPr id="{}" name="TextBox {}"/>
          <p:cNvSpPr txBox="1"/>
          <p:nvPr/>
        </p:nvSpPr>
        <p:spPr>
          {}
          <a:prstGeom prst="rect"><a:avLst/></a:prstGeom>
          <a:noFill/>
        </p:spPr>
        <p:txBody>
          <a:bodyPr wrap="square" lIns="45720" tIns="22860" rIns="45720" bIns="22860" anchor="{}"><a:normAutofit/></a:bodyPr>
          <a:lstStyle/>
{}        </p:txBody>
      </p:sp>
"#,
        id,
        id,
        xfrm(&text.frame),
        anchor_attr(style.anchor),
        runs
    )
}

fn rect_shape(id: u32, rect: &RectShape) -> String {
    let geometry = if rect.rounded {
        r#"<a:prstGeom prst="roundRect"><a:avLst><a:gd name="adj" fmla="val 6000"/></a:avLst></a:prstGeom>"#
    } else {
        r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#
    };
    let line = match &rect.line {
        Some(color) => format!(
            "<a:ln w=\"12700\"><a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill></a:ln>",
            color
        ),
        None => "<a:ln><a:noFill/></a:ln>".to_string(),
    };
    format!(
        r#"      <p:sp>
        <p:nvSpPr>
          <p:cNvPr id="{}" name="Shape {}"/>
          <p:cNvSpPr/>
          <p:nvPr/>
        </p:nvSpPr>
        <p:spPr>
          {}
          {}
          <a:solidFill><a:srgbClr val="{}"/></a:solidFill>
          {}
        </p:spPr>
      </p:sp>
"#,
        id,
        id,
        xfrm(&rect.frame),
        geometry,
        rect.fill,
        line
    )
}

fn picture_shape(id: u32, picture: &Picture, rel: usize) -> String {
    format!(
        r#"      <p:pic>
        <p:nvPicPr>
          <p:cNvPr id="{}" name="Picture {}" descr="{}"/>
          <p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr>
          <p:nvPr/>
        </p:nvPicPr>
        <p:blipFill>
          <a:blip r:embed="rId{}"/>
          <a:stretch><a:fillRect/></a:stretch>
        </p:blipFill>
        <p:spPr>
          {}
          <a:prstGeom prst="rect"><a:avLst/></a:prstGeom>
        </p:spPr>
      </p:pic>
"#,
        id,
        id,
        esc(&picture.description),
        rel,
        xfrm(&picture.frame)
    )
}

fn chart_shape(id: u32, chart: &ChartFrame, rel: usize) -> String {
    let f = &chart.frame;
    format!(
        r#"      <p:graphicFrame>
        <p:nvGraphicFramePr>
          <p:cNvPr id="{}" name="Chart {}"/>
          <p:cNvGraphicFramePr/>
          <p:nvPr/>
        </p:nvGraphicFramePr>
        <p:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></p:xfrm>
        <a:graphic>
          <a:graphicData uri="{}">
            <c:chart xmlns:c="{}" r:id="rId{}"/>
          </a:graphicData>
        </a:graphic>
      </p:graphicFrame>
"#,
        id,
        id,
        emu(f.x),
        emu(f.y),
        emu(f.w),
        emu(f.h),
        NS_CHART,
        NS_CHART,
        rel
    )
}

fn table_shape(id: u32, table: &TableShape) -> String {
    let border = |side: &str| {
        format!(
            "<a:{side} w=\"6350\"><a:solidFill><a:srgbClr val=\"CCCCCC\"/></a:solidFill></a:{side}>",
            side = side
        )
    };
    let borders = format!(
        "{}{}{}{}",
        border("lnL"),
        border("lnR"),
        border("lnT"),
        border("lnB")
    );

    let grid: String = table
        .column_widths
        .iter()
        .map(|w| format!("<a:gridCol w=\"{}\"/>", emu(*w)))
        .collect();

    let row_height = emu(table.row_height);
    let mut rows = String::new();
    for row in &table.rows {
        rows.push_str(&format!("            <a:tr h=\"{}\">", row_height));
        for cell in row {
            let style = TextStyle {
                size: table.font_size,
                bold: cell.bold,
                color: cell.color.clone(),
                ..Default::default()
            };
            let text = if cell.text.is_empty() {
                format!("<a:p><a:endParaRPr {}/></a:p>", run_attrs(&style))
            } else {
                format!(
                    "<a:p><a:pPr algn=\"{}\"/><a:r><a:rPr {}>{}</a:rPr><a:t>{}</a:t></a:r></a:p>",
                    align_attr(cell.align),
                    run_attrs(&style),
                    run_props(&style),
                    esc(&cell.text)
                )
            };
            rows.push_str(&format!(
                "<a:tc><a:txBody><a:bodyPr/><a:lstStyle/>{}</a:txBody><a:tcPr anchor=\"ctr\">{}<a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill></a:tcPr></a:tc>",
                text, borders, cell.fill
            ));
        }
        rows.push_str("</a:tr>\n");
    }

    let f = &table.frame;
    format!(
        r#"      <p:graphicFrame>
        <p:nvGraphicFramePr>
          <p:cNvPr id="{}" name="Table {}"/>
          <p:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></p:cNvGraphicFramePr>
          <p:nvPr/>
        </p:nvGraphicFramePr>
        <p:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></p:xfrm>
        <a:graphic>
          <a:graphicData uri="{}">
            <a:tbl>
            <a:tblPr firstRow="1" bandRow="1"/>
            <a:tblGrid>{}</a:tblGrid>
{}            </a:tbl>
          </a:graphicData>
        </a:graphic>
      </p:graphicFrame>
"#,
        id,
        id,
        emu(f.x),
        emu(f.y),
        emu(f.w),
        row_height * table.rows.len() as i64,
        NS_TABLE,
        grid,
        rows
    )
}
