//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - run: Process a single command and print the reply
//! - chat: Interactive session over stdin
//! - prefs: Show or change the stored preferences
//! - config show: Print the effective configuration

use anyhow::{Context, Result};
use sdk::collaborators::PreferencePersistence;
use sdk::errors::{ConciergeErrorExt, EngineError};
use sdk::types::Integration;
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::agent::{AgentCore, AgentHandle, Collaborators, CommandOutcome, PreferenceStore, UserPreference};
use crate::cli::PrefsAction;
use crate::config::Config;
use crate::intent::IntentType;
use crate::db::Database;
use crate::integrations::LocalIntegrations;
use crate::llm::ollama::OllamaGenerator;
use crate::message_bus::{EventType, MessageBus};
use crate::nlp::RuleBasedLanguageProvider;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Everything a command needs: the open database and the agent
struct Session {
    database: Database,
    agent: AgentCore,
}

/// What the chat loop does after a session command
#[derive(Debug, PartialEq, Eq)]
enum SessionControl {
    Continue,
    Quit,
}

fn default_preferences(config: &Config) -> UserPreference {
    UserPreference::new(
        config.agent.default_language.clone(),
        config.agent.default_style.clone(),
        config.integrations.enabled.iter().cloned(),
    )
}

async fn open_preferences(config: &Config) -> Result<(Database, PreferenceStore)> {
    let database = Database::new(&config.database_path())
        .await
        .context("Failed to open database")?;

    let persistence: Arc<dyn PreferencePersistence> =
        Arc::new(database.preferences(config.agent.storage_key.clone()));
    let store = PreferenceStore::load(persistence, default_preferences(config)).await;

    Ok((database, store))
}

/// Wire the agent to the local services and stored preferences
async fn build_session(config: &Config) -> Result<Session> {
    let (database, preferences) = open_preferences(config).await?;

    let generator = OllamaGenerator::from_config(&config.generator)
        .context("Failed to create reply generator")?;
    let language = RuleBasedLanguageProvider::new().context("Failed to create language provider")?;

    let collaborators = Collaborators {
        language: Arc::new(language),
        generator: Arc::new(generator),
        integrations: Arc::new(LocalIntegrations::new(&config.integrations)),
    };

    let bus = Arc::new(MessageBus::new());
    spawn_event_logger(&bus).await;

    let agent = AgentCore::new(config, collaborators, preferences)
        .context("Failed to create agent")?
        .with_bus(bus);

    Ok(Session { database, agent })
}

/// Mirror every pipeline event into the debug log
async fn spawn_event_logger(bus: &MessageBus) {
    let mut rx = bus.subscribe(EventType::All).await;
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            debug!("Pipeline event: {:?}", event);
        }
    });
}

fn print_outcome(outcome: &CommandOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", outcome.reply);
            if let Some(fault) = outcome.fault.as_ref().filter(|f| **f != outcome.reply) {
                println!("{}", fault);
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "status": if outcome.success { "completed" } else { "failed" },
                "reply": outcome.reply,
                "intent": outcome.intent,
                "workflow_id": outcome.result.as_ref().map(|r| r.workflow_id.clone()),
                "metadata": outcome.result.as_ref().map(|r| r.metadata.clone()),
                "error": outcome.fault,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Process a single command
pub async fn handle_run(text: String, config: &Config, format: OutputFormat) -> Result<()> {
    let Session {
        database,
        mut agent,
    } = build_session(config).await?;

    let outcome = agent.process_command(&text).await;
    print_outcome(&outcome, format)?;

    database.close().await?;
    Ok(())
}

/// Interactive session
///
/// Lines are queued on an [`AgentHandle`] so each command finishes before
/// the next starts. Lines starting with `/` are session commands.
pub async fn handle_chat(config: &Config, format: OutputFormat) -> Result<()> {
    let Session { database, agent } = build_session(config).await?;

    let (handle, task) = AgentHandle::spawn(agent, config.agent.queue_capacity);

    if matches!(format, OutputFormat::Text) {
        println!("Concierge is ready. Type /help for commands, /quit to leave.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        if matches!(format, OutputFormat::Text) {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if run_session_command(&handle, command, format).await? == SessionControl::Quit {
                break;
            }
            continue;
        }

        let outcome = handle.process_command(line).await?;
        print_outcome(&outcome, format)?;
    }

    // Dropping the last handle stops the agent task
    drop(handle);
    task.await.context("Agent task panicked")?;

    database.close().await?;
    info!("Chat session ended");
    Ok(())
}

/// Run one `/` command against the agent.
///
/// A failed preference save is reported and the session goes on; only a
/// stopped agent ends it.
async fn run_session_command(
    handle: &AgentHandle,
    command: &str,
    format: OutputFormat,
) -> Result<SessionControl> {
    let mut parts = command.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    match name {
        "quit" | "exit" => return Ok(SessionControl::Quit),
        "help" => print_chat_help(),
        "history" => {
            let turns = match arg.parse::<usize>() {
                Ok(count) => handle.recent_history(count).await?,
                Err(_) => handle.history().await?,
            };
            for turn in turns {
                let speaker = if turn.is_user { "you" } else { "concierge" };
                match &turn.metadata {
                    Some(meta) => println!("[{}] {} ({})", speaker, turn.content, meta),
                    None => println!("[{}] {}", speaker, turn.content),
                }
            }
        }
        "clear" => {
            handle.clear_history().await?;
            println!("History cleared.");
        }
        "status" => println!("Status: {}", handle.status().await?),
        "stats" => {
            let stats = handle.intent_stats().await?;
            match format {
                OutputFormat::Text => {
                    println!("Commands classified: {}", stats.total);
                    for intent_type in IntentType::ALL {
                        println!("  {:<22} {}", intent_type.as_str(), stats.count(intent_type));
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
            }
        }
        "prefs" => {
            let prefs = handle.preferences().await?;
            print_preferences(&prefs, format)?;
        }
        "style" if !arg.is_empty() => {
            if report_failure(handle.set_communication_style(arg).await)? {
                println!("Communication style set to {}.", arg);
            }
        }
        "language" if !arg.is_empty() => {
            if report_failure(handle.set_language(arg).await)? {
                println!("Language set to {}.", arg);
            }
        }
        "enable" | "disable" if !arg.is_empty() => match parse_integration(arg) {
            Ok(integration) => {
                let enabled = name == "enable";
                if report_failure(handle.set_integration_enabled(integration, enabled).await)? {
                    println!("{} {}d.", integration.display_name(), name);
                }
            }
            Err(e) => println!("{}", e),
        },
        _ => println!("Unknown command: /{}. Type /help for commands.", command),
    }

    Ok(SessionControl::Continue)
}

/// Print a recoverable failure and return `false`; a stopped agent is fatal
fn report_failure(result: Result<(), EngineError>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.is_recoverable() => {
            println!("Error: {}. {}", e, e.user_hint());
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_chat_help() {
    println!("Session commands:");
    println!("  /history [n]         Show the conversation so far, or its last n turns");
    println!("  /clear               Forget the conversation");
    println!("  /status              Show the agent status");
    println!("  /stats               Show how many commands of each intent were seen");
    println!("  /prefs               Show preferences and learning counters");
    println!("  /style <style>       Set the communication style");
    println!("  /language <code>     Set the preferred language");
    println!("  /enable <name>       Enable an integration");
    println!("  /disable <name>      Disable an integration");
    println!("  /quit                Leave");
}

fn parse_integration(name: &str) -> Result<Integration> {
    name.parse::<Integration>().map_err(|e| anyhow::anyhow!(e))
}

fn print_preferences(prefs: &UserPreference, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Language:      {}", prefs.language);
            println!("Style:         {}", prefs.communication_style);
            println!("Integrations:");
            for integration in Integration::ALL {
                println!(
                    "  {:<10} {}",
                    integration.as_str(),
                    if prefs.is_enabled(integration) {
                        "enabled"
                    } else {
                        "disabled"
                    }
                );
            }
            if !prefs.learning_counters.is_empty() {
                let mut counters: Vec<_> = prefs.learning_counters.iter().collect();
                counters.sort();
                println!("Learned patterns:");
                for (pattern, count) in counters {
                    println!("  {:<20} {}", pattern, count);
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(prefs)?);
        }
    }
    Ok(())
}

/// Show or change stored preferences
///
/// Changes are written straight to the preference store; they take effect
/// the next time an agent is started.
pub async fn handle_prefs(action: PrefsAction, config: &Config, format: OutputFormat) -> Result<()> {
    let (database, mut store) = open_preferences(config).await?;

    match action {
        PrefsAction::Show => {
            print_preferences(store.current(), format)?;
            database.close().await?;
            return Ok(());
        }
        PrefsAction::Style { style } => {
            store.set_communication_style(style.clone());
            println!("Communication style set to {}.", style);
        }
        PrefsAction::Language { code } => {
            store.set_language(code.clone());
            println!("Language set to {}.", code);
        }
        PrefsAction::Enable { name } => {
            let integration = parse_integration(&name)?;
            if !store.set_integration_enabled(integration, true) {
                println!("{} is already enabled.", integration.display_name());
            } else {
                println!("{} enabled.", integration.display_name());
            }
        }
        PrefsAction::Disable { name } => {
            let integration = parse_integration(&name)?;
            if !store.set_integration_enabled(integration, false) {
                println!("{} is already disabled.", integration.display_name());
            } else {
                println!("{} disabled.", integration.display_name());
            }
        }
    }

    store.save().await.context("Failed to save preferences")?;
    database.close().await?;
    Ok(())
}

/// Print the effective configuration
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let text = toml::to_string_pretty(config).context("Failed to serialize config")?;
            println!("{}", text);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
    }
    Ok(())
}
