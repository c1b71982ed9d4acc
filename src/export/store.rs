//! Export folder bookkeeping.
//!
//! Every answer is saved three times (Markdown, DOCX, PDF) under the export
//! folder, named `{YYYYmmdd_HHMMSS}_{model name}`.

use super::{render, ExportFormat};
use crate::chat::AnswerRecord;
use crate::error::FreeChatError;
use std::path::{Path, PathBuf};

/// Files written for one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedExport {
    pub base_name: String,
    pub paths: Vec<PathBuf>,
}

/// Writes exports under a fixed folder.
#[derive(Debug, Clone)]
pub struct ExportStore {
    folder: PathBuf,
}

impl ExportStore {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Save the answer in every format. The folder is created on demand.
    pub fn save_all(&self, record: &AnswerRecord) -> Result<SavedExport, FreeChatError> {
        std::fs::create_dir_all(&self.folder)?;

        let base = base_name(record);
        let mut paths = Vec::with_capacity(ExportFormat::ALL.len());
        for format in ExportFormat::ALL {
            let path = self.folder.join(format!("{}.{}", base, format.extension()));
            std::fs::write(&path, render(record, format)?)?;
            paths.push(path);
        }

        tracing::info!(folder = %self.folder.display(), base_name = %base, "answer saved");
        Ok(SavedExport {
            base_name: base,
            paths,
        })
    }

    /// Save a single format. Without a path, the format's default file name
    /// inside the export folder is used.
    pub fn save_one(
        &self,
        record: &AnswerRecord,
        format: ExportFormat,
        path: Option<&Path>,
    ) -> Result<PathBuf, FreeChatError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                std::fs::create_dir_all(&self.folder)?;
                self.folder.join(format.default_file_name())
            }
        };

        std::fs::write(&path, render(record, format)?)?;
        tracing::info!(path = %path.display(), format = format.extension(), "answer exported");
        Ok(path)
    }
}

/// `{YYYYmmdd_HHMMSS}_{model name}` for an answer.
pub fn base_name(record: &AnswerRecord) -> String {
    format!(
        "{}_{}",
        record.created_at.format("%Y%m%d_%H%M%S"),
        sanitize_file_stem(&record.model_name)
    )
}

/// Make a model name safe as a file name: spaces and path or shell
/// metacharacters become `_`.
pub fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let stem = stem.trim_matches('.');
    if stem.is_empty() {
        "model".to_string()
    } else {
        stem.to_string()
    }
}
