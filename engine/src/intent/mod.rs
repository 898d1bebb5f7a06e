//! Intent Recognition
//!
//! Turns free text into an [`Intent`]: one of five intent types, a small
//! record of extracted entities, a confidence score and an optional learning
//! pattern tag. Classification is total; unrecognized input falls back to
//! [`IntentType::General`].

pub mod classifier;
pub mod types;

pub use classifier::IntentClassifier;
pub use types::{Entities, Intent, IntentStats, IntentType};
