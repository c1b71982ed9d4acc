//! Export answers to Markdown, DOCX and PDF.
//!
//! Every renderer is a pure function of the [`AnswerRecord`]: the date printed
//! in the document is the record's timestamp, so rendering the same record
//! twice gives the same bytes.

mod docx;
mod pdf;
mod store;

pub use docx::render_docx;
pub use pdf::render_pdf;
pub use store::{base_name, sanitize_file_stem, ExportStore, SavedExport};

use crate::chat::AnswerRecord;
use crate::error::FreeChatError;
use chrono::{DateTime, Local};

/// Title used by every export format.
pub const DOCUMENT_TITLE: &str = "AI Response";

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Docx,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [Self::Markdown, Self::Docx, Self::Pdf];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" | "word" => Some(Self::Docx),
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Self::Markdown => "text/markdown",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Markdown => "md",
        }
    }

    /// File name offered for a manual export.
    pub fn default_file_name(&self) -> String {
        format!("ai_response.{}", self.extension())
    }
}

/// Render an answer in the given format.
pub fn render(record: &AnswerRecord, format: ExportFormat) -> Result<Vec<u8>, FreeChatError> {
    match format {
        ExportFormat::Markdown => Ok(render_markdown(record)),
        ExportFormat::Docx => docx::render_docx(record),
        ExportFormat::Pdf => pdf::render_pdf(record),
    }
}

/// Markdown: title, bold model and date lines, optional prompt, answer verbatim.
pub fn render_markdown(record: &AnswerRecord) -> Vec<u8> {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", DOCUMENT_TITLE));
    output.push_str(&format!(
        "**Model:** `{}` (`{}`)  \n",
        record.model_name, record.model_id
    ));
    output.push_str(&format!("**Date:** {}\n\n---\n\n", format_timestamp(&record.created_at)));

    if let Some(prompt) = record.prompt_text() {
        output.push_str("## Prompt\n\n");
        output.push_str(prompt);
        output.push_str("\n\n");
    }

    output.push_str("## Response\n\n");
    output.push_str(&record.answer);
    output.push('\n');

    output.into_bytes()
}

/// Date as printed in every export, e.g. `2026-10-19 14:05:09`.
pub(crate) fn format_timestamp(ts: &DateTime<Local>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    pub(super) fn sample_record() -> AnswerRecord {
        AnswerRecord {
            model_id: "venice/uncensored:free".to_string(),
            model_name: "Venice: Uncensored (free)".to_string(),
            prompt: Some("Explain <ownership> & borrowing".to_string()),
            answer: "Ownership moves values.\n\nBorrowing lends them.\nReferences never outlive data."
                .to_string(),
            created_at: Local.with_ymd_and_hms(2026, 10, 19, 14, 5, 9).unwrap(),
        }
    }

    // =========================================================================
    // Format Detection Tests
    // =========================================================================

    #[test]
    fn detect_format_from_extension() {
        assert_eq!(ExportFormat::from_extension("pdf"), Some(ExportFormat::Pdf));
        assert_eq!(ExportFormat::from_extension(".DOCX"), Some(ExportFormat::Docx));
        assert_eq!(ExportFormat::from_extension("md"), Some(ExportFormat::Markdown));
        assert_eq!(ExportFormat::from_extension("exe"), None);
    }

    #[test]
    fn format_content_types() {
        assert_eq!(ExportFormat::Pdf.content_type(), "application/pdf");
        assert_eq!(
            ExportFormat::Docx.content_type(),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(ExportFormat::Markdown.content_type(), "text/markdown");
        assert_eq!(ExportFormat::Docx.default_file_name(), "ai_response.docx");
    }

    // =========================================================================
    // Markdown Export Tests
    // =========================================================================

    #[test]
    fn markdown_follows_template() {
        let content = String::from_utf8(render_markdown(&sample_record())).unwrap();

        assert_eq!(
            content,
            "# AI Response\n\n\
             **Model:** `Venice: Uncensored (free)` (`venice/uncensored:free`)  \n\
             **Date:** 2026-10-19 14:05:09\n\n---\n\n\
             ## Prompt\n\nExplain <ownership> & borrowing\n\n\
             ## Response\n\nOwnership moves values.\n\nBorrowing lends them.\nReferences never outlive data.\n"
        );
    }

    #[test]
    fn markdown_omits_missing_prompt() {
        let mut record = sample_record();
        record.prompt = None;

        let content = String::from_utf8(render_markdown(&record)).unwrap();

        assert!(!content.contains("## Prompt"));
        assert!(content.contains("## Response"));
    }

    // =========================================================================
    // Determinism
    // =========================================================================

    #[test]
    fn every_format_is_deterministic() {
        let record = sample_record();

        for format in ExportFormat::ALL {
            let first = render(&record, format).unwrap();
            let second = render(&record, format).unwrap();
            assert!(first == second, "{:?} output differs between runs", format);
        }
    }

    #[test]
    fn equal_records_render_identically() {
        let a = sample_record();
        let b = sample_record();

        for format in ExportFormat::ALL {
            assert!(render(&a, format).unwrap() == render(&b, format).unwrap());
        }
    }

    #[test]
    fn different_answers_render_differently() {
        let a = sample_record();
        let mut b = sample_record();
        b.answer.push_str(" Always.");

        for format in ExportFormat::ALL {
            assert!(render(&a, format).unwrap() != render(&b, format).unwrap());
        }
    }
}
