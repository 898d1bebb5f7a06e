//! Error types and handling
//!
//! This module provides the error types shared by the engine and every
//! collaborator implementation. All errors implement the `ConciergeErrorExt`
//! trait which provides user-friendly hints and indicates whether errors are
//! recoverable.
//!
//! # Error Categories
//!
//! - **Integration**: calendar, reminder, contact, weather and news services
//! - **Provider**: language and generative-reply providers
//! - **Persistence**: preference record storage
//! - **Engine**: configuration and startup faults
//!
//! # Examples
//!
//! ```
//! use sdk::errors::{ConciergeErrorExt, IntegrationError};
//!
//! let error = IntegrationError::NotEnabled("Calendar".to_string());
//! assert_eq!(error.to_string(), "Calendar integration is not enabled");
//! assert!(error.is_recoverable());
//! ```

use thiserror::Error;

/// Trait for Concierge error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information.
pub trait ConciergeErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and never echoes the raw
    /// payload carried by the error.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around by the user (for
    /// example by enabling an integration). Non-recoverable errors require
    /// fixing the installation.
    fn is_recoverable(&self) -> bool;
}

/// Errors raised by an external integration (calendar, reminders, ...)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrationError {
    #[error("{0} integration is not enabled")]
    NotEnabled(String),

    #[error("Permission denied for {0} integration")]
    PermissionDenied(String),

    #[error("{0}")]
    Failed(String),
}

impl ConciergeErrorExt for IntegrationError {
    fn user_hint(&self) -> &str {
        match self {
            Self::NotEnabled(_) => "Enable the integration with 'concierge prefs enable <name>'",
            Self::PermissionDenied(_) => "Grant access to the service and try again",
            Self::Failed(_) => "The external service failed. Try again later",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }
}

/// Errors raised by the language or generative-reply providers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider timed out")]
    Timeout,

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ConciergeErrorExt for ProviderError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Unavailable(_) => "Reply provider unavailable. Check that it is running",
            Self::Network(_) => "Network error. Check your connection",
            Self::Timeout => "The provider took too long to respond. Try again",
            Self::InvalidResponse(_) => "The provider returned something unexpected",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidResponse(_))
    }
}

/// Errors raised by preference persistence
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("Storage error: {0}")]
    Database(String),

    #[error("Failed to encode preference record: {0}")]
    Encode(String),
}

impl ConciergeErrorExt for PersistenceError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Database(_) => "Preference storage failed. Check the data directory",
            Self::Encode(_) => "Preferences could not be saved",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// Main engine error type
///
/// Covers faults outside a single workflow: configuration, storage bootstrap,
/// provider wiring and the command queue.
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    // Provider wiring errors
    #[error("Provider error: {0}")]
    Provider(String),

    // Agent queue errors
    #[error("Agent command queue is closed")]
    QueueClosed,

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConciergeErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Database(_) => "Database operation failed. Check the data directory",
            Self::Provider(_) => "Provider setup failed. Check the [generator] section",
            Self::QueueClosed => "The agent has stopped. Restart Concierge",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::QueueClosed)
    }
}

impl From<PersistenceError> for EngineError {
    fn from(err: PersistenceError) -> Self {
        EngineError::Database(err.to_string())
    }
}
