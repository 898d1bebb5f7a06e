//! CLI interface for Concierge
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Concierge personal assistant
///
/// Classifies a command, runs the matching workflow against calendar,
/// reminders, contacts, weather and news, and replies in your preferred
/// style.
#[derive(Parser, Debug)]
#[command(name = "concierge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process a single command and print the reply
    Run {
        /// The command text
        text: String,
    },

    /// Start an interactive session
    Chat,

    /// Inspect or change stored preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Preference actions
#[derive(Subcommand, Debug)]
pub enum PrefsAction {
    /// Show the stored preferences
    Show,

    /// Set the communication style (e.g. formal, conversational)
    Style {
        style: String,
    },

    /// Set the preferred language code (e.g. en, fr)
    Language {
        code: String,
    },

    /// Enable an integration (calendar, reminders, contacts, weather, news)
    Enable {
        name: String,
    },

    /// Disable an integration
    Disable {
        name: String,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
}
