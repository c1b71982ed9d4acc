//! Unified error handling for freechat.
//!
//! Every failure is caught where it happens and shown to the user; nothing
//! is retried. The `Display` output is the user-facing message.

use std::fmt;

/// Unified error type for freechat operations.
#[derive(Debug, Clone, PartialEq)]
pub enum FreeChatError {
    /// The catalog contained no free models.
    NoModelsAvailable,
    /// No free model matched the given selector.
    ModelNotFound(String),
    /// No OpenRouter API key was supplied.
    ApiKeyMissing,
    /// The prompt was empty after trimming.
    EmptyPrompt,
    /// Export requested before any answer was received.
    NoAnswer,
    /// The request never produced a response (network, timeout, TLS).
    UpstreamError(String),
    /// The API answered with a non-success status.
    UpstreamStatus { status: u16, message: String },
    /// Failed to parse an upstream response.
    ParseError(String),
    /// Rendering an export failed.
    ExportError(String),
    /// Reading or writing a local file failed.
    Io(String),
}

impl fmt::Display for FreeChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoModelsAvailable => write!(f, "No free models found"),
            Self::ModelNotFound(selector) => write!(f, "No free model matches '{}'", selector),
            Self::ApiKeyMissing => write!(
                f,
                "No OpenRouter API key configured (set OPENROUTER_API_KEY or api.api_key)"
            ),
            Self::EmptyPrompt => write!(f, "Enter a prompt and try again"),
            Self::NoAnswer => write!(f, "No answer to export yet"),
            Self::UpstreamError(msg) => write!(f, "API error: {}", msg),
            Self::UpstreamStatus { status, message } => {
                if message.is_empty() {
                    write!(f, "API error: status {}", status)
                } else {
                    write!(f, "API error: status {}: {}", status, message)
                }
            }
            Self::ParseError(msg) => write!(f, "Parse error: {}", msg),
            Self::ExportError(msg) => write!(f, "Export error: {}", msg),
            Self::Io(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for FreeChatError {}

impl FreeChatError {
    /// Short machine-readable kind, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoModelsAvailable => "no_models",
            Self::ModelNotFound(_) => "model_not_found",
            Self::ApiKeyMissing => "configuration_error",
            Self::EmptyPrompt => "invalid_request",
            Self::NoAnswer => "invalid_request",
            Self::UpstreamError(_) => "upstream_error",
            Self::UpstreamStatus { .. } => "upstream_error",
            Self::ParseError(_) => "upstream_error",
            Self::ExportError(_) => "export_error",
            Self::Io(_) => "io_error",
        }
    }
}

impl From<std::io::Error> for FreeChatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
