//! Interactive terminal session.
//!
//! Loads the free model list, keeps a selected model and the last answer,
//! and reads commands line by line. Plain text is sent as a prompt; lines
//! starting with `/` are commands. Every failure is printed and the session
//! goes on.

use crate::catalog::{find_model, ModelCatalog, ModelInfo};
use crate::chat::{AnswerRecord, ChatClient};
use crate::config::{Config, LogVerbosity};
use crate::display;
use crate::error::FreeChatError;
use crate::export::{ExportFormat, ExportStore};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};

pub const HELP: &str = "\
Type a prompt and press Enter to send it to the selected model.

Commands:
  /models [uncensored]        list free models
  /use <number|id|name>       select a model
  /info                       show the selected model
  /refresh                    reload the model list from OpenRouter
  /save                       save the last answer as md, docx and pdf
  /export <md|docx|pdf> [path]  export the last answer
  /help                       show this help
  /quit                       leave";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Prompt(String),
    Models { uncensored_only: bool },
    Use(String),
    Info,
    Refresh,
    Save,
    Export { format: ExportFormat, path: Option<PathBuf> },
    Help,
    Quit,
    Empty,
}

impl SessionCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Empty);
        }
        let Some(command) = line.strip_prefix('/') else {
            return Ok(Self::Prompt(line.to_string()));
        };

        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };

        match name.to_lowercase().as_str() {
            "models" | "list" => match rest {
                "" => Ok(Self::Models { uncensored_only: false }),
                "uncensored" => Ok(Self::Models { uncensored_only: true }),
                other => Err(format!("Unknown filter '{}', try /models uncensored", other)),
            },
            "use" | "model" => {
                if rest.is_empty() {
                    Err("Usage: /use <number|id|name>".to_string())
                } else {
                    Ok(Self::Use(rest.to_string()))
                }
            }
            "info" => Ok(Self::Info),
            "refresh" => Ok(Self::Refresh),
            "save" => Ok(Self::Save),
            "export" => {
                let (fmt, path) = match rest.split_once(char::is_whitespace) {
                    Some((fmt, path)) => (fmt, Some(PathBuf::from(path.trim()))),
                    None => (rest, None),
                };
                let format = ExportFormat::from_extension(fmt)
                    .ok_or_else(|| "Usage: /export <md|docx|pdf> [path]".to_string())?;
                Ok(Self::Export { format, path })
            }
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(format!("Unknown command '/{}', type /help", other)),
        }
    }
}

/// Whether the session keeps reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// State of one interactive session.
pub struct Session {
    catalog: ModelCatalog,
    chat: ChatClient,
    store: ExportStore,
    auto_save: bool,
    verbosity: LogVerbosity,
    models: Arc<Vec<ModelInfo>>,
    selected: Option<ModelInfo>,
    last_answer: Option<AnswerRecord>,
}

impl Session {
    pub fn new(config: &Config, catalog: ModelCatalog, chat: ChatClient) -> Self {
        Self {
            catalog,
            chat,
            store: ExportStore::new(config.export.folder.clone()),
            auto_save: config.export.auto_save,
            verbosity: config.app.log_verbosity,
            models: Arc::new(Vec::new()),
            selected: None,
            last_answer: None,
        }
    }

    pub fn selected(&self) -> Option<&ModelInfo> {
        self.selected.as_ref()
    }

    pub fn last_answer(&self) -> Option<&AnswerRecord> {
        self.last_answer.as_ref()
    }

    /// Load (or reload) the model list and keep the selection when possible.
    pub async fn load_models<W: Write>(&mut self, force_refresh: bool, out: &mut W) -> Result<(), FreeChatError> {
        let load = self.catalog.load(force_refresh).await;
        if let Some(err) = &load.error {
            writeln!(out, "Failed to load models from OpenRouter: {}", err)?;
        }
        self.models = load.models;

        let keep = self
            .selected
            .as_ref()
            .and_then(|s| self.models.iter().find(|m| m.id == s.id).cloned());
        self.selected = keep.or_else(|| self.models.first().cloned());

        match &self.selected {
            Some(model) => writeln!(
                out,
                "{} free models available. Selected: {}",
                self.models.len(),
                model.label()
            )?,
            None => writeln!(out, "{}", FreeChatError::NoModelsAvailable)?,
        }

        if !self.chat.has_api_key() {
            writeln!(out, "Add your OpenRouter API key (OPENROUTER_API_KEY) to send prompts.")?;
        }
        Ok(())
    }

    /// Execute one command.
    pub async fn handle<W: Write>(&mut self, command: SessionCommand, out: &mut W) -> Result<Flow, FreeChatError> {
        match command {
            SessionCommand::Empty => {}
            SessionCommand::Help => writeln!(out, "{}", HELP)?,
            SessionCommand::Quit => return Ok(Flow::Quit),
            SessionCommand::Models { uncensored_only } => {
                let shown: Vec<ModelInfo> = self
                    .models
                    .iter()
                    .filter(|m| !uncensored_only || m.is_uncensored())
                    .cloned()
                    .collect();
                if shown.is_empty() {
                    return Err(FreeChatError::NoModelsAvailable);
                }
                writeln!(out, "{}", display::format_model_list(&shown, self.verbosity))?;
            }
            SessionCommand::Use(selector) => {
                let model = find_model(&self.models, &selector)?.clone();
                writeln!(out, "{}", display::format_selection(&model))?;
                self.selected = Some(model);
            }
            SessionCommand::Info => {
                let model = self.selected.as_ref().ok_or(FreeChatError::NoModelsAvailable)?;
                writeln!(out, "{}", display::format_selection(model))?;
            }
            SessionCommand::Refresh => self.load_models(true, out).await?,
            SessionCommand::Prompt(prompt) => self.send(&prompt, out).await?,
            SessionCommand::Save => {
                let record = self.require_answer()?;
                let saved = self.store.save_all(record)?;
                writeln!(out, "{}", display::format_saved(&saved, self.store.folder()))?;
            }
            SessionCommand::Export { format, path } => {
                let record = self.require_answer()?;
                let written = self.store.save_one(record, format, path.as_deref())?;
                writeln!(out, "Exported {} ({})", written.display(), format.content_type())?;
            }
        }
        Ok(Flow::Continue)
    }

    async fn send<W: Write>(&mut self, prompt: &str, out: &mut W) -> Result<(), FreeChatError> {
        let model = self.selected.as_ref().ok_or(FreeChatError::NoModelsAvailable)?;

        let started = Instant::now();
        let record = self.chat.complete(&model.id, &model.name, prompt).await?;
        writeln!(out, "{}", display::format_answer(&record, started.elapsed(), self.verbosity))?;

        if self.auto_save {
            // A failed save must not lose the answer
            match self.store.save_all(&record) {
                Ok(saved) => writeln!(out, "{}", display::format_saved(&saved, self.store.folder()))?,
                Err(e) => writeln!(out, "{}", e)?,
            }
        }

        self.last_answer = Some(record);
        Ok(())
    }

    fn require_answer(&self) -> Result<&AnswerRecord, FreeChatError> {
        self.last_answer
            .as_ref()
            .ok_or(FreeChatError::NoAnswer)
    }

    /// Read stdin until EOF or `/quit`.
    pub async fn run(&mut self) -> Result<(), FreeChatError> {
        let mut stdout = std::io::stdout();
        self.load_models(false, &mut stdout).await?;
        writeln!(stdout, "Type /help for commands.")?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            write!(stdout, "> ")?;
            stdout.flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let command = match SessionCommand::parse(&line) {
                Ok(command) => command,
                Err(msg) => {
                    eprintln!("{}", msg);
                    continue;
                }
            };

            match self.handle(command, &mut stdout).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => {
                    tracing::debug!(kind = e.kind(), "command failed");
                    eprintln!("{}", e);
                }
            }
        }
        Ok(())
    }
}
