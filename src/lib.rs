//! freechat - Chat with free OpenRouter models from the terminal.
//!
//! Features:
//! - Free model discovery from the OpenRouter catalog, memoized for an hour
//! - Keyword-based "uncensored" classification
//! - Single-prompt chat completions with a bearer token
//! - Markdown, DOCX and PDF export of every answer

pub mod catalog;
pub mod chat;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod http;
pub mod session;
