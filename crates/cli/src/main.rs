//! CLI entrypoint and subcommand orchestration.

mod config;
mod repl;
#[cfg(test)]
mod test_support;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use session::{
    CatalogSource, HttpCatalogSource, HttpInferenceProvider, InferenceProvider, OpenAiProvider,
    SendOutcome, SkipReason, StaticCatalogSource,
};

use crate::config::{Config, ProviderKind};

#[cfg(not(test))]
use session::{ChannelObserver, ChatSession, ModelCatalog, NoopObserver};
#[cfg(not(test))]
use std::process::ExitCode;
#[cfg(not(test))]
use tracing::{error, info, warn};
#[cfg(not(test))]
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Top-level command-line arguments.
#[derive(Parser)]
#[command(name = "nexus")]
#[command(about = "Terminal chat client for hosted language models", version)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Enable debug logging to ~/.nexus/logs/debug.log
    #[arg(long, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default when no subcommand is given)
    Chat,

    /// Print the model directory and exit
    Models,

    /// Send a single prompt and exit
    Run {
        /// Prompt to send
        #[arg(short = 'e', long)]
        exec: String,

        /// Model id to use instead of the default selection
        #[arg(short, long)]
        model: Option<String>,
    },
}

impl Commands {
    #[cfg_attr(test, allow(dead_code))]
    fn label(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Models => "models",
            Self::Run { .. } => "run",
        }
    }
}

#[cfg(not(test))]
#[tokio::main]
/// Program entrypoint.
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Chat);

    // Console logs go to stderr so they never interleave with transcript output.
    // With --debug, debug-level logs also go to ~/.nexus/logs/debug.log.YYYY-MM-DD.
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    // WorkerGuard is dropped when main() returns, flushing buffered file writes.
    // Commands report failure through the returned ExitCode, never process::exit.
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>;

    if cli.debug {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let log_dir = std::path::PathBuf::from(home).join(".nexus").join("logs");
        std::fs::create_dir_all(&log_dir).ok();
        let appender = tracing_appender::rolling::daily(&log_dir, "debug.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        _file_guard = Some(guard);

        let console = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(console_filter);
        let file = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .with_filter(EnvFilter::new("debug,hyper_util=info,reqwest=info"));
        tracing_subscriber::registry()
            .with(console)
            .with(file)
            .init();

        info!(
            version = env!("CARGO_PKG_VERSION"),
            command = command.label(),
            log_level = %cli.log_level,
            "========== nexus session start =========="
        );
    } else {
        _file_guard = None;
        fmt()
            .with_env_filter(console_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!("Failed to load config ({e}), using defaults");
        Config::fallback()
    });

    match command {
        Commands::Chat => cmd_chat(config).await,
        Commands::Models => cmd_models(config).await,
        Commands::Run { exec, model } => cmd_run(config, exec, model).await,
    }
}

/// Builds the model directory source: HTTP when a URL is configured,
/// otherwise the built-in list.
fn build_catalog_source(config: &Config) -> anyhow::Result<Arc<dyn CatalogSource>> {
    match config.catalog.effective_url() {
        Some(url) => {
            let timeout = Duration::from_secs(config.catalog.timeout_secs);
            Ok(Arc::new(HttpCatalogSource::with_timeout(url, timeout)?))
        }
        None => Ok(Arc::new(StaticCatalogSource::builtin())),
    }
}

/// Builds the inference backend selected by `provider.kind`.
fn build_provider(config: &Config) -> anyhow::Result<Arc<dyn InferenceProvider>> {
    let api_key = config.resolve_api_key();
    match config.provider.kind {
        ProviderKind::Http => {
            let timeout = Duration::from_secs(config.provider.timeout_secs);
            let provider = HttpInferenceProvider::with_timeout(&config.provider.url, timeout)?
                .with_api_key(api_key);
            Ok(Arc::new(provider))
        }
        ProviderKind::OpenAi => {
            if api_key.is_empty() {
                anyhow::bail!(
                    "No API key configured for the openai provider. \
                     Set NEXUS_API_KEY or OPENAI_API_KEY, or provider.api_key in config.toml."
                );
            }
            let provider = match config.provider.base_url.as_deref() {
                Some(base_url) => OpenAiProvider::with_base_url(api_key, base_url),
                None => OpenAiProvider::new(api_key),
            };
            Ok(Arc::new(provider))
        }
    }
}

fn format_run_header(model: &str, prompt: &str) -> String {
    format!("[{model}] {prompt}")
}

/// Splits a one-shot send into stdout text (`Ok`) or stderr text (`Err`).
fn run_report(outcome: &SendOutcome) -> Result<String, String> {
    match outcome {
        SendOutcome::Replied(turn) => Ok(turn.content.clone()),
        SendOutcome::Failed(turn) => Err(turn.content.clone()),
        SendOutcome::Skipped(SkipReason::EmptyPrompt) => Err("Nothing to send.".to_string()),
        SendOutcome::Skipped(SkipReason::NoActiveModel) => Err(
            "No active model. Pass --model <id> or set catalog.preferred_model.".to_string(),
        ),
        SendOutcome::Busy => Err("A request is still pending.".to_string()),
    }
}

#[cfg(not(test))]
fn fail(message: &str) -> anyhow::Result<ExitCode> {
    eprintln!("{message}");
    Ok(ExitCode::FAILURE)
}

#[cfg(not(test))]
/// Starts the interactive chat loop.
async fn cmd_chat(config: Config) -> anyhow::Result<ExitCode> {
    let (observer, events) = ChannelObserver::channel();
    let session = Arc::new(ChatSession::new(
        build_catalog_source(&config)?,
        build_provider(&config)?,
        Arc::new(observer),
        config.session_options(),
    ));
    repl::run(session, events).await?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(not(test))]
/// Prints the model directory, marking the model a new session would start with.
async fn cmd_models(config: Config) -> anyhow::Result<ExitCode> {
    let source = build_catalog_source(&config)?;
    let catalog = match ModelCatalog::load(source.as_ref()).await {
        Ok(catalog) => catalog,
        Err(err) => return fail(&repl::catalog_error_notice(&err)),
    };
    let preferred = config.catalog.preferred_model.trim();
    let default = catalog
        .get(preferred)
        .or_else(|| config.catalog.auto_select_first.then(|| catalog.first()).flatten());
    println!("{}", repl::format_model_list(catalog.list(), default));
    Ok(ExitCode::SUCCESS)
}

#[cfg(not(test))]
/// Sends one prompt. Exits non-zero when no reply arrives.
async fn cmd_run(
    config: Config,
    exec: String,
    model: Option<String>,
) -> anyhow::Result<ExitCode> {
    let session = ChatSession::new(
        build_catalog_source(&config)?,
        build_provider(&config)?,
        Arc::new(NoopObserver),
        config.session_options(),
    );
    if let Err(err) = session.load_catalog().await {
        return fail(&repl::catalog_error_notice(&err));
    }
    if let Some(id) = model.as_deref()
        && session.select_model_by_id(id).is_none()
    {
        return fail(&format!("Unknown model: {id}"));
    }

    let model_id = session
        .current_model()
        .map(|m| m.id)
        .unwrap_or_default();
    println!("{}", format_run_header(&model_id, &exec));

    let outcome = session.send(&exec).await;
    if matches!(outcome, SendOutcome::Failed(_)) {
        error!(session = %session.id(), model = %model_id, "Request failed");
    }
    match run_report(&outcome) {
        Ok(text) => {
            println!("{text}");
            Ok(ExitCode::SUCCESS)
        }
        Err(text) => fail(&text),
    }
}
