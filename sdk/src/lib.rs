//! Concierge SDK
//!
//! Shared library providing collaborator traits, boundary types, and error
//! types for Concierge components. The engine consumes these contracts;
//! service adapters implement them.

/// Collaborator traits
pub mod collaborators;

/// Error types and handling
pub mod errors;

/// Boundary types
pub mod types;

// Re-export commonly used types
pub use collaborators::{
    GenerativeProvider, IntegrationProvider, LanguageProvider, PreferencePersistence,
};
pub use errors::{ConciergeErrorExt, EngineError, IntegrationError, PersistenceError, ProviderError};
pub use types::{
    CalendarEvent, Contact, ConversationTurn, EntityKind, Headline, Integration, NamedEntity,
    PersonalizationContext, PreferenceRecord, Reminder, Sentiment, WeatherReport,
};
