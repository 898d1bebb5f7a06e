// Concierge personal assistant
// Main entry point for the Concierge binary

use clap::Parser;
use concierge_engine::cli::{Cli, Command, ConfigAction};
use concierge_engine::config::Config;
use concierge_engine::handlers::{
    handle_chat, handle_config_show, handle_prefs, handle_run, OutputFormat,
};
use concierge_engine::telemetry::{init_telemetry_with_format, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // The subscriber can only be installed once, so wait for the config.
    // RUST_LOG still wins over both the flag and the config.
    let level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    let log_format = if cli.json {
        LogFormat::Json
    } else {
        LogFormat::for_build()
    };
    init_telemetry_with_format(level, log_format);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Concierge v{} ({} - {})", version, commit, timestamp);

    match cli.command {
        Command::Run { text } => {
            tracing::info!("Processing command");
            handle_run(text, &config, format).await
        }

        Command::Chat => {
            tracing::info!("Starting interactive session");
            handle_chat(&config, format).await
        }

        Command::Prefs { action } => {
            tracing::info!("Preference management: {:?}", action);
            handle_prefs(action, &config, format).await
        }

        Command::Config { action } => match action {
            ConfigAction::Show => handle_config_show(&config, format),
        },
    }
}
