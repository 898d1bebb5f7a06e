//! Concierge Engine Library
//!
//! This library provides the command pipeline of the Concierge assistant.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Database persistence module
pub mod db;

/// Message bus for pipeline notifications
pub mod message_bus;

/// Intent classification module
pub mod intent;

/// Workflow planning and execution module
pub mod workflow;

/// Reply composition module
pub mod response;

/// Agent orchestrator module
pub mod agent;

/// Generative reply providers
pub mod llm;

/// Rule-based language analysis
pub mod nlp;

/// Local integration services
pub mod integrations;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
