//! Terminal formatting with configurable verbosity levels.
//!
//! - Minimal: bare values, one line per model
//! - Compact: numbered labels with the short description
//! - Verbose: every catalog field

use crate::catalog::ModelInfo;
use crate::chat::AnswerRecord;
use crate::config::LogVerbosity;
use crate::export::SavedExport;
use std::time::Duration;

/// Format duration in human-readable form.
pub fn format_duration(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{}ms", ms)
    }
}

fn format_context_length(tokens: Option<u64>) -> String {
    match tokens {
        Some(t) if t >= 1000 => format!("{}k ctx", t / 1000),
        Some(t) => format!("{} ctx", t),
        None => "? ctx".to_string(),
    }
}

/// Format a model list for the terminal.
pub fn format_model_list(models: &[ModelInfo], verbosity: LogVerbosity) -> String {
    models
        .iter()
        .enumerate()
        .map(|(i, m)| format_model(i + 1, m, verbosity))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_model(index: usize, model: &ModelInfo, verbosity: LogVerbosity) -> String {
    match verbosity {
        LogVerbosity::Minimal => model.id.clone(),
        LogVerbosity::Compact => format!(
            "{:>3}. {}\n     {} · {}\n     {}",
            index,
            model.label(),
            model.id,
            format_context_length(model.context_length),
            model.short_description()
        ),
        LogVerbosity::Verbose => format!(
            "{:>3}. {}\n     id:          {}\n     type:        {}\n     context:     {}\n     pricing:     prompt {} / completion {}\n     description: {}",
            index,
            model.name,
            model.id,
            model.classification,
            format_context_length(model.context_length),
            model.prompt_price,
            model.completion_price,
            model.description.as_deref().unwrap_or("-")
        ),
    }
}

/// Details for the selected model, shown under the selection.
pub fn format_selection(model: &ModelInfo) -> String {
    format!(
        "Model:       {}\nType:        {}\nDescription: {}",
        model.name,
        model.classification,
        model.short_description()
    )
}

/// Format an answer for the terminal.
pub fn format_answer(record: &AnswerRecord, elapsed: Duration, verbosity: LogVerbosity) -> String {
    match verbosity {
        LogVerbosity::Minimal => record.answer.clone(),
        LogVerbosity::Compact => format!(
            "← {} ({})\n\n{}",
            record.model_name,
            format_duration(elapsed),
            record.answer
        ),
        LogVerbosity::Verbose => format!(
            "────────────────────────────────────────\n\
             Model:    {} ({})\n\
             Time:     {}\n\
             Date:     {}\n\
             ────────────────────────────────────────\n\
             {}\n\
             ────────────────────────────────────────",
            record.model_name,
            record.model_id,
            format_duration(elapsed),
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.answer
        ),
    }
}

/// Confirmation printed after the automatic save.
pub fn format_saved(saved: &SavedExport, folder: &std::path::Path) -> String {
    format!(
        "Saved to {}/ as `{}` (md, docx, pdf)",
        folder.display(),
        saved.base_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{classify, Classification};
    use chrono::{Local, TimeZone};

    fn sample_model() -> ModelInfo {
        ModelInfo {
            id: "cognitivecomputations/dolphin3.0-mistral-24b:free".to_string(),
            name: "Dolphin3.0 Mistral 24B (free)".to_string(),
            prompt_price: 0.0,
            completion_price: 0.0,
            context_length: Some(32768),
            description: Some("Dolphin 3.0 is the next generation of the Dolphin series".to_string()),
            classification: classify("cognitivecomputations/dolphin3.0-mistral-24b:free", "Dolphin3.0"),
        }
    }

    fn sample_answer() -> AnswerRecord {
        AnswerRecord {
            model_id: "m/x:free".to_string(),
            model_name: "Model X".to_string(),
            prompt: Some("hi".to_string()),
            answer: "Hello!".to_string(),
            created_at: Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn format_duration_ms() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
    }

    #[test]
    fn format_duration_seconds() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
    }

    #[test]
    fn minimal_list_is_ids_only() {
        let output = format_model_list(&[sample_model()], LogVerbosity::Minimal);
        assert_eq!(output, "cognitivecomputations/dolphin3.0-mistral-24b:free");
    }

    #[test]
    fn compact_list_shows_label_and_context() {
        let model = sample_model();
        assert_eq!(model.classification, Classification::TextUncensored);

        let output = format_model_list(&[model], LogVerbosity::Compact);

        assert!(output.starts_with("  1. Dolphin3.0 Mistral 24B (free) – Text (uncensored)"));
        assert!(output.contains("32k ctx"));
        assert!(output.contains("next generation"));
    }

    #[test]
    fn verbose_list_shows_pricing() {
        let output = format_model_list(&[sample_model()], LogVerbosity::Verbose);
        assert!(output.contains("pricing:     prompt 0 / completion 0"));
    }

    #[test]
    fn selection_shows_type_and_description() {
        let output = format_selection(&sample_model());
        assert!(output.contains("Type:        Text (uncensored)"));
        assert!(output.contains("Description: Dolphin 3.0"));
    }

    #[test]
    fn minimal_answer_is_bare_text() {
        let output = format_answer(&sample_answer(), Duration::from_millis(10), LogVerbosity::Minimal);
        assert_eq!(output, "Hello!");
    }

    #[test]
    fn compact_answer_has_model_and_timing() {
        let output = format_answer(&sample_answer(), Duration::from_millis(2300), LogVerbosity::Compact);
        assert_eq!(output, "← Model X (2.3s)\n\nHello!");
    }
}
