//! freechat CLI - Chat with free OpenRouter models from the terminal.

use clap::{Parser, Subcommand};
use freechat::catalog::{find_model, ModelCatalog};
use freechat::chat::ChatClient;
use freechat::config::{Config, LogVerbosity};
use freechat::display;
use freechat::export::ExportStore;
use freechat::session::Session;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "freechat")]
#[command(about = "Chat with free OpenRouter models and export the answers")]
#[command(version)]
struct Cli {
    /// Output and log verbosity
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<LogLevel>,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the free models
    Models {
        /// Only models classified as uncensored
        #[arg(long)]
        uncensored: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        /// Skip the cached catalog
        #[arg(long)]
        refresh: bool,
    },

    /// Send one prompt to a free model
    Ask {
        /// Model number, id or name (see `freechat models`)
        #[arg(short, long)]
        model: String,

        /// OpenRouter API key (defaults to OPENROUTER_API_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// Do not write the md/docx/pdf exports
        #[arg(long)]
        no_save: bool,

        /// Print the answer record as JSON
        #[arg(long)]
        json: bool,

        /// Prompt to send
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// Interactive session (default)
    Session {
        /// OpenRouter API key (defaults to OPENROUTER_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Show current configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum LogLevel {
    Minimal,
    Compact,
    Verbose,
}

impl From<LogLevel> for LogVerbosity {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Minimal => LogVerbosity::Minimal,
            LogLevel::Compact => LogVerbosity::Compact,
            LogLevel::Verbose => LogVerbosity::Verbose,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path.clone())?,
        None => Config::load()?,
    };
    let mut config = config.with_env_overrides();
    if let Some(level) = cli.log_level {
        config.app.log_verbosity = level.into();
    }

    init_tracing(config.app.log_verbosity);

    match cli.command {
        Some(Commands::Models { uncensored, json, refresh }) => {
            list_models(&config, uncensored, json, refresh).await?;
        }
        Some(Commands::Ask { model, api_key, no_save, json, prompt }) => {
            ask(&config, &model, api_key, !no_save, json, &prompt.join(" ")).await?;
        }
        Some(Commands::Session { api_key }) => {
            run_session(&config, api_key).await?;
        }
        Some(Commands::Config { path }) => {
            show_config(&config, cli.config, path)?;
        }
        None => {
            run_session(&config, None).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbosity: LogVerbosity) {
    let level = match verbosity {
        LogVerbosity::Minimal => tracing::Level::WARN,
        LogVerbosity::Compact => tracing::Level::INFO,
        LogVerbosity::Verbose => tracing::Level::DEBUG,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

async fn list_models(config: &Config, uncensored: bool, json: bool, refresh: bool) -> anyhow::Result<()> {
    let catalog = ModelCatalog::from_config(config)?;
    let load = catalog.load(refresh).await;
    if let Some(err) = &load.error {
        eprintln!("Failed to load models from OpenRouter: {}", err);
    }

    let models: Vec<_> = load
        .models
        .iter()
        .filter(|m| !uncensored || m.is_uncensored())
        .cloned()
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&models)?);
    } else if models.is_empty() {
        println!("No free models found.");
    } else {
        println!("{}", display::format_model_list(&models, config.app.log_verbosity));
    }
    Ok(())
}

async fn ask(
    config: &Config,
    selector: &str,
    api_key: Option<String>,
    save: bool,
    json: bool,
    prompt: &str,
) -> anyhow::Result<()> {
    let catalog = ModelCatalog::from_config(config)?;
    let models = catalog.get_free_models(false).await?;
    let model = find_model(&models, selector)?;

    let mut chat = ChatClient::new(&config.api)?;
    if api_key.is_some() {
        chat = chat.with_api_key(api_key);
    }

    let started = Instant::now();
    let record = chat.complete(&model.id, &model.name, prompt).await?;
    let elapsed = started.elapsed();
    tracing::info!(model = %model.id, elapsed_ms = elapsed.as_millis() as u64, "answer received");

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("{}", display::format_answer(&record, elapsed, config.app.log_verbosity));
    }

    if save && config.export.auto_save {
        let store = ExportStore::new(config.export.folder.clone());
        match store.save_all(&record) {
            Ok(saved) => eprintln!("{}", display::format_saved(&saved, store.folder())),
            Err(e) => eprintln!("{}", e),
        }
    }
    Ok(())
}

async fn run_session(config: &Config, api_key: Option<String>) -> anyhow::Result<()> {
    let catalog = ModelCatalog::from_config(config)?;
    let mut chat = ChatClient::new(&config.api)?;
    if api_key.is_some() {
        chat = chat.with_api_key(api_key);
    }

    let mut session = Session::new(config, catalog, chat);
    session.run().await?;
    println!("\nBye.");
    Ok(())
}

fn show_config(config: &Config, path_override: Option<PathBuf>, show_path: bool) -> anyhow::Result<()> {
    if show_path {
        let path = path_override.unwrap_or_else(Config::default_path);
        println!("{}", path.display());
        return Ok(());
    }

    println!("{}", config.to_display_toml()?);
    Ok(())
}
