//! PDF export.
//!
//! A4 pages with builtin Helvetica fonts. Each page starts with the centered
//! title header; the answer is laid out paragraph by paragraph, paragraphs
//! being separated by blank lines.

use super::{format_timestamp, DOCUMENT_TITLE};
use crate::chat::AnswerRecord;
use crate::error::FreeChatError;
use chrono::Utc;
use printpdf::lopdf::{self, Object};
use printpdf::*;
use sha2::{Digest, Sha256};

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN_LEFT: Mm = Mm(15.0);
const BOTTOM_MARGIN: Mm = Mm(15.0);
const HEADER_Y: Mm = Mm(282.0);
// Fixed title, so its centered position is fixed too
const HEADER_X: Mm = Mm(92.0);
const CONTENT_TOP: Mm = Mm(270.0);
const LINE_HEIGHT: Mm = Mm(6.0);
const LAYER_NAME: &str = "Layer 1";

/// The only text encoding printpdf uses for builtin fonts.
const WIN_ANSI: &str = "WinAnsiEncoding";

/// Characters per line for 10 pt body text across the printable width.
const BODY_WRAP_CHARS: usize = 95;

/// Render an answer as a PDF document.
pub fn render_pdf(record: &AnswerRecord) -> Result<Vec<u8>, FreeChatError> {
    let mut writer = PdfWriter::new()?;

    writer.paragraph(&format!(
        "Model: {} ({})    Date: {}",
        record.model_name,
        record.model_id,
        format_timestamp(&record.created_at)
    ));
    writer.gap(Mm(3.0));

    if let Some(prompt) = record.prompt_text() {
        writer.section_heading("Prompt");
        for line in prompt.lines() {
            writer.paragraph(line);
        }
        writer.gap(Mm(2.0));
    }

    writer.section_heading("Response");
    for para in record.answer.split("\n\n") {
        for line in para.trim().lines() {
            writer.paragraph(line);
        }
        writer.gap(Mm(1.0));
    }

    if writer.replaced > 0 {
        tracing::warn!(
            replaced = writer.replaced,
            model = %record.model_id,
            "characters outside WinAnsi written as '?' in PDF"
        );
    }

    let bytes = writer.finish()?;
    stamp_document(bytes, record)
}

/// Keeps the current page and vertical position while laying out text.
struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: Mm,
    replaced: usize,
}

impl PdfWriter {
    fn new() -> Result<Self, FreeChatError> {
        let (doc, page, layer) = PdfDocument::new(DOCUMENT_TITLE, PAGE_WIDTH, PAGE_HEIGHT, LAYER_NAME);
        // No XMP packet or ICC profile, both would embed run-dependent data
        let doc = doc.with_conformance(PdfConformance::Custom(CustomPdfConformance {
            requires_icc_profile: false,
            requires_xmp_metadata: false,
            ..Default::default()
        }));

        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| FreeChatError::ExportError(format!("failed to add font: {}", e)))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| FreeChatError::ExportError(format!("failed to add font: {}", e)))?;

        let layer = doc.get_page(page).get_layer(layer);
        let writer = Self {
            doc,
            layer,
            regular,
            bold,
            y: CONTENT_TOP,
            replaced: 0,
        };
        writer.header();
        Ok(writer)
    }

    /// Title drawn at the top of every page.
    fn header(&self) {
        self.layer
            .use_text(DOCUMENT_TITLE, 12.0, HEADER_X, HEADER_Y, &self.bold);
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, LAYER_NAME);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = CONTENT_TOP;
        self.header();
    }

    fn ensure_space(&mut self, height: Mm) {
        if self.y < BOTTOM_MARGIN + height {
            self.new_page();
        }
    }

    fn gap(&mut self, height: Mm) {
        self.y -= height;
    }

    fn section_heading(&mut self, text: &str) {
        // Keep the heading with at least one line of its body
        self.ensure_space(LINE_HEIGHT + LINE_HEIGHT);
        self.layer
            .use_text(text, 11.0, MARGIN_LEFT, self.y, &self.bold);
        self.y -= LINE_HEIGHT;
    }

    fn paragraph(&mut self, text: &str) {
        let (text, replaced) = to_win_ansi(text);
        self.replaced += replaced;
        for line in wrap_text(&text, BODY_WRAP_CHARS) {
            self.ensure_space(LINE_HEIGHT);
            self.layer
                .use_text(line, 10.0, MARGIN_LEFT, self.y, &self.regular);
            self.y -= LINE_HEIGHT;
        }
    }

    fn finish(self) -> Result<Vec<u8>, FreeChatError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| FreeChatError::ExportError(format!("failed to save PDF: {}", e)))
    }
}

/// Replace the per-save identifiers and dates with values derived from the
/// record, so that the same record always yields the same bytes.
fn stamp_document(bytes: Vec<u8>, record: &AnswerRecord) -> Result<Vec<u8>, FreeChatError> {
    let mut doc = lopdf::Document::load_mem(&bytes)
        .map_err(|e| FreeChatError::ExportError(format!("failed to reload PDF: {}", e)))?;

    let id = document_id(record);
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::string_literal(id.clone()),
            Object::string_literal(id),
        ]),
    );

    let date = record
        .created_at
        .with_timezone(&Utc)
        .format("D:%Y%m%d%H%M%SZ")
        .to_string();
    let info_id = doc.trailer.get(b"Info").and_then(|info| info.as_reference()).ok();
    if let Some(info_id) = info_id {
        if let Ok(info) = doc.get_object_mut(info_id).and_then(|obj| obj.as_dict_mut()) {
            info.set("CreationDate", Object::string_literal(date.clone()));
            info.set("ModDate", Object::string_literal(date));
        }
    }

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| FreeChatError::ExportError(format!("failed to save PDF: {}", e)))?;
    Ok(output)
}

/// 32 hex characters identifying the record's content: the first half of a
/// SHA-256 over the length-prefixed fields and the timestamp.
fn document_id(record: &AnswerRecord) -> String {
    fn update_part(hasher: &mut Sha256, part: &str) {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }

    let mut hasher = Sha256::new();
    update_part(&mut hasher, &record.model_id);
    update_part(&mut hasher, &record.model_name);
    match &record.prompt {
        Some(prompt) => {
            hasher.update([1u8]);
            update_part(&mut hasher, prompt);
        }
        None => hasher.update([0u8]),
    }
    update_part(&mut hasher, &record.answer);
    hasher.update(record.created_at.timestamp().to_le_bytes());

    hasher.finalize()[..16]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Replace characters the builtin fonts cannot encode with `?`.
/// Returns the text and the number of replaced characters.
fn to_win_ansi(text: &str) -> (String, usize) {
    let mut replaced = 0;
    let converted = text
        .chars()
        .map(|c| match c {
            '\t' => ' ',
            c if is_win_ansi(c) => c,
            _ => {
                replaced += 1;
                '?'
            }
        })
        .collect();
    (converted, replaced)
}

fn is_win_ansi(c: char) -> bool {
    let mut buf = [0u8; 4];
    !lopdf::Document::encode_text(Some(WIN_ANSI), c.encode_utf8(&mut buf)).is_empty()
}

/// Word wrapping for PDF text. A line that fits is kept as written;
/// otherwise words are rejoined with single spaces and words longer than a
/// line are split.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let text = text.trim_end();
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_chars {
            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        if current_line.is_empty() {
            current_line = word.iter().collect();
            current_len = word.len();
        } else if current_len + 1 + word.len() <= max_chars {
            current_line.push(' ');
            current_line.extend(word.iter());
            current_len += 1 + word.len();
        } else {
            lines.push(std::mem::replace(&mut current_line, word.iter().collect()));
            current_len = word.len();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}
