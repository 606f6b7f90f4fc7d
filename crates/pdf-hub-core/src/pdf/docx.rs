//! Minimal WordprocessingML (DOCX) package writer.

use std::fmt::Write as _;
use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ConversionError;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const CONTENT_TYPES: &str = concat!(
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#,
    r#"</Types>"#
);

const PACKAGE_RELS: &str = concat!(
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
    r#"</Relationships>"#
);

/// One inch margins, in twentieths of a point
const MARGIN_TWIPS: u32 = 1440;

/// Default page: A4
const DEFAULT_PAGE_PT: (f32, f32) = (595.0, 842.0);

/// Builds a DOCX package paragraph by paragraph.
#[derive(Debug, Clone, Default)]
pub struct DocxBuilder {
    body: String,
    title: Option<String>,
    author: Option<String>,
    page_size_pt: Option<(f32, f32)>,
    paragraphs: usize,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }

    /// Section page size in points; ignored when not positive.
    pub fn set_page_size(&mut self, width_pt: f32, height_pt: f32) {
        if width_pt > 0.0 && height_pt > 0.0 {
            self.page_size_pt = Some((width_pt, height_pt));
        }
    }

    pub const fn paragraph_count(&self) -> usize {
        self.paragraphs
    }

    /// Append one paragraph with a single run at `font_size_pt`.
    pub fn add_paragraph(&mut self, text: &str, font_size_pt: f32) {
        let text = xml_safe(text);
        let _ = write!(
            self.body,
            r#"<w:p><w:r><w:rPr><w:sz w:val="{size}"/><w:szCs w:val="{size}"/></w:rPr><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#,
            size = half_points(font_size_pt),
            text = escape(text.as_str()),
        );
        self.paragraphs += 1;
    }

    pub fn add_page_break(&mut self) {
        self.body
            .push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#);
    }

    /// Serialize the package.
    pub fn finish(self) -> Result<Vec<u8>, ConversionError> {
        let write_err = |e: &dyn std::fmt::Display| ConversionError::Write(e.to_string());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts = [
            ("[Content_Types].xml", xml_part(CONTENT_TYPES)),
            ("_rels/.rels", xml_part(PACKAGE_RELS)),
            ("word/document.xml", self.document_xml()),
            ("docProps/core.xml", self.core_xml()),
        ];

        for (name, content) in parts {
            zip.start_file(name, options).map_err(|e| write_err(&e))?;
            zip.write_all(content.as_bytes()).map_err(|e| write_err(&e))?;
        }

        let cursor = zip.finish().map_err(|e| write_err(&e))?;
        Ok(cursor.into_inner())
    }

    fn document_xml(&self) -> String {
        let (width, height) = self.page_size_pt.unwrap_or(DEFAULT_PAGE_PT);
        let orient = if width > height { r#" w:orient="landscape""# } else { "" };

        format!(
            concat!(
                "{decl}",
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
                "<w:body>{body}",
                r#"<w:sectPr><w:pgSz w:w="{w}" w:h="{h}"{orient}/>"#,
                r#"<w:pgMar w:top="{m}" w:right="{m}" w:bottom="{m}" w:left="{m}" w:header="708" w:footer="708" w:gutter="0"/>"#,
                "</w:sectPr></w:body></w:document>"
            ),
            decl = XML_DECLARATION,
            body = self.body,
            w = twips(width),
            h = twips(height),
            orient = orient,
            m = MARGIN_TWIPS,
        )
    }

    fn core_xml(&self) -> String {
        let mut properties = String::new();
        if let Some(title) = &self.title {
            let _ = write!(properties, "<dc:title>{}</dc:title>", escape(xml_safe(title).as_str()));
        }
        if let Some(author) = &self.author {
            let _ = write!(properties, "<dc:creator>{}</dc:creator>", escape(xml_safe(author).as_str()));
        }

        format!(
            concat!(
                "{decl}",
                r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">"#,
                "{properties}</cp:coreProperties>"
            ),
            decl = XML_DECLARATION,
            properties = properties,
        )
    }
}

fn xml_part(body: &str) -> String {
    format!("{XML_DECLARATION}{body}")
}

/// Drop characters XML 1.0 cannot carry (control codes, U+FFFE/U+FFFF).
fn xml_safe(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
        })
        .collect()
}

/// Run size in half-points, as `w:sz` expects.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn half_points(font_size_pt: f32) -> u32 {
    (font_size_pt * 2.0).round().clamp(2.0, 3276.0) as u32
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn twips(points: f32) -> u32 {
    (points * 20.0).round().clamp(0.0, 31_680.0 * 20.0) as u32
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::io::Read;

    use quick_xml::Reader;
    use quick_xml::events::Event;
    use zip::ZipArchive;

    use super::*;

    pub(crate) fn read_part(docx: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut content = String::new();
        part.read_to_string(&mut content).unwrap();
        content
    }

    /// Text of every `w:t` element, one entry per paragraph run.
    pub(crate) fn run_texts(document_xml: &str) -> Vec<String> {
        let mut reader = Reader::from_str(document_xml);
        let mut texts = Vec::new();
        let mut in_text = false;
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
                Event::End(e) if e.name().as_ref() == b"w:t" => in_text = false,
                Event::Text(e) if in_text => texts.push(e.unescape().unwrap().into_owned()),
                Event::Eof => break,
                _ => {}
            }
        }
        texts
    }

    #[test]
    fn test_package_parts() {
        let mut builder = DocxBuilder::new().with_title(Some("Report".to_string()));
        builder.add_paragraph("Hello", 12.0);
        let docx = builder.finish().unwrap();

        let archive = ZipArchive::new(Cursor::new(docx.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "docProps/core.xml",
        ] {
            assert!(names.contains(&part), "missing {part}");
        }
        assert!(read_part(&docx, "docProps/core.xml").contains("<dc:title>Report</dc:title>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut builder = DocxBuilder::new();
        builder.add_paragraph("Tom & Jerry <3 \"quotes\"", 11.0);
        let docx = builder.finish().unwrap();
        let xml = read_part(&docx, "word/document.xml");

        assert!(xml.contains("Tom &amp; Jerry &lt;3"));
        assert_eq!(run_texts(&xml), vec!["Tom & Jerry <3 \"quotes\""]);
    }

    #[test]
    fn test_control_characters_dropped() {
        assert_eq!(xml_safe("a\u{0}b\u{1b}c\td"), "abc\td");
    }

    #[test]
    fn test_run_size_and_page_break() {
        let mut builder = DocxBuilder::new();
        builder.add_paragraph("One", 12.0);
        builder.add_page_break();
        builder.add_paragraph("Two", 10.5);
        assert_eq!(builder.paragraph_count(), 2);

        let xml = read_part(&builder.finish().unwrap(), "word/document.xml");
        assert!(xml.contains(r#"<w:sz w:val="24"/>"#));
        assert!(xml.contains(r#"<w:sz w:val="21"/>"#));
        assert_eq!(xml.matches(r#"w:type="page""#).count(), 1);
        assert_eq!(run_texts(&xml), vec!["One", "Two"]);
    }

    #[test]
    fn test_section_page_size() {
        let mut builder = DocxBuilder::new();
        builder.set_page_size(612.0, 792.0);
        let xml = read_part(&builder.finish().unwrap(), "word/document.xml");
        assert!(xml.contains(r#"<w:pgSz w:w="12240" w:h="15840"/>"#));

        let mut landscape = DocxBuilder::new();
        landscape.set_page_size(842.0, 595.0);
        let xml = read_part(&landscape.finish().unwrap(), "word/document.xml");
        assert!(xml.contains(r#"w:orient="landscape""#));
    }

    #[test]
    fn test_default_page_size_is_a4() {
        let xml = read_part(&DocxBuilder::new().finish().unwrap(), "word/document.xml");
        assert!(xml.contains(r#"<w:pgSz w:w="11900" w:h="16840"/>"#));
    }
}
