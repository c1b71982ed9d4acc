//! Word (DOCX) export.
//!
//! Writes a minimal OOXML package: content types, package relationships, the
//! document part and a style part defining the two heading levels.

use super::{format_timestamp, DOCUMENT_TITLE};
use crate::chat::AnswerRecord;
use crate::error::FreeChatError;
use chrono::{Datelike, Timelike};
use quick_xml::escape::escape;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:pPr><w:spacing w:after="120"/></w:pPr>
    <w:rPr><w:sz w:val="22"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="32"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading2">
    <w:name w:val="heading 2"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:pPr><w:keepNext/><w:spacing w:before="200" w:after="80"/><w:outlineLvl w:val="1"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="26"/></w:rPr>
  </w:style>
</w:styles>"#;

/// Render an answer as a DOCX package.
pub fn render_docx(record: &AnswerRecord) -> Result<Vec<u8>, FreeChatError> {
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip_timestamp(record));

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", PACKAGE_RELS.to_string()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
        ("word/document.xml", generate_document_xml(record)),
        ("word/styles.xml", STYLES.to_string()),
    ];

    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(std::io::Cursor::new(&mut buffer));

        for (name, content) in &parts {
            zip.start_file(*name, options)
                .map_err(|e| FreeChatError::ExportError(format!("failed to create {}: {}", name, e)))?;
            zip.write_all(content.as_bytes())
                .map_err(|e| FreeChatError::ExportError(format!("failed to write {}: {}", name, e)))?;
        }

        zip.finish()
            .map_err(|e| FreeChatError::ExportError(format!("failed to finalize DOCX: {}", e)))?;
    }

    Ok(buffer)
}

/// Entry timestamps come from the record so the archive is reproducible.
fn zip_timestamp(record: &AnswerRecord) -> zip::DateTime {
    let ts = record.created_at.naive_local();
    u16::try_from(ts.year())
        .ok()
        .and_then(|year| {
            zip::DateTime::from_date_and_time(
                year,
                ts.month() as u8,
                ts.day() as u8,
                ts.hour() as u8,
                ts.minute() as u8,
                ts.second() as u8,
            )
            .ok()
        })
        .unwrap_or_default()
}

fn generate_document_xml(record: &AnswerRecord) -> String {
    let mut paragraphs = String::new();

    paragraphs.push_str(&heading(DOCUMENT_TITLE, 1));

    // Bold model run followed by the plain date run
    paragraphs.push_str(&format!(
        r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r><w:r><w:t>{}</w:t></w:r></w:p>"#,
        xml_text(&format!("Model: {} ({}) – ", record.model_name, record.model_id)),
        xml_text(&format_timestamp(&record.created_at)),
    ));

    if let Some(prompt) = record.prompt_text() {
        paragraphs.push_str(&heading("Prompt", 2));
        for line in prompt.lines() {
            paragraphs.push_str(&paragraph(line));
        }
    }

    paragraphs.push_str(&heading("Response", 2));
    for line in record.answer.lines() {
        paragraphs.push_str(&paragraph(line));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    {}
  </w:body>
</w:document>"#,
        paragraphs
    )
}

fn heading(text: &str, level: u8) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="Heading{}"/></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>"#,
        level,
        xml_text(text)
    )
}

fn paragraph(line: &str) -> String {
    if line.is_empty() {
        return "<w:p/>".to_string();
    }
    format!(
        r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        xml_text(line)
    )
}

/// Escape text for XML, dropping control characters XML 1.0 cannot carry.
fn xml_text(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();
    escape(cleaned.as_str()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::sample_record;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn read_part(bytes: Vec<u8>, name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    #[test]
    fn creates_valid_zip() {
        let result = render_docx(&sample_record()).unwrap();

        // DOCX is a ZIP file - check magic number
        assert!(result.len() > 4);
        assert_eq!(&result[0..4], b"PK\x03\x04");
    }

    #[test]
    fn contains_required_parts() {
        let result = render_docx(&sample_record()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(result)).unwrap();

        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/_rels/document.xml.rels",
            "word/document.xml",
            "word/styles.xml",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing {}", name);
        }
    }

    #[test]
    fn document_has_sections_in_order() {
        let document = read_part(render_docx(&sample_record()).unwrap(), "word/document.xml");

        let title = document.find("AI Response").unwrap();
        let model = document.find("Model: Venice: Uncensored (free) (venice/uncensored:free)").unwrap();
        let date = document.find("2026-10-19 14:05:09").unwrap();
        let prompt = document.find(">Prompt<").unwrap();
        let response = document.find(">Response<").unwrap();
        let answer = document.find("Borrowing lends them.").unwrap();

        assert!(title < model && model < date && date < prompt && prompt < response && response < answer);
        assert!(document.contains(r#"<w:pStyle w:val="Heading1"/>"#));
        assert!(document.contains(r#"<w:pStyle w:val="Heading2"/>"#));
    }

    #[test]
    fn answer_lines_become_paragraphs() {
        let document = read_part(render_docx(&sample_record()).unwrap(), "word/document.xml");

        assert!(document.contains(
            r#"<w:p><w:r><w:t xml:space="preserve">Ownership moves values.</w:t></w:r></w:p><w:p/>"#
        ));
        assert!(document.contains("References never outlive data."));
    }

    #[test]
    fn escapes_markup_in_prompt() {
        let document = read_part(render_docx(&sample_record()).unwrap(), "word/document.xml");

        assert!(document.contains("Explain &lt;ownership&gt; &amp; borrowing"));
        assert!(!document.contains("<ownership>"));
    }

    #[test]
    fn omits_prompt_heading_without_prompt() {
        let mut record = sample_record();
        record.prompt = None;

        let document = read_part(render_docx(&record).unwrap(), "word/document.xml");

        assert!(!document.contains(">Prompt<"));
    }

    #[test]
    fn strips_control_characters() {
        assert_eq!(xml_text("bell\u{7} & tab\t"), "bell &amp; tab\t");
    }
}
