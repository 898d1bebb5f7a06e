//! Response Composer
//!
//! Joins step fragments into one reply, phrased by intent type and
//! communication style.

use serde::{Deserialize, Serialize};

use crate::intent::IntentType;

/// Phrasing register used when composing replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationStyle {
    Formal,
    Conversational,
}

impl CommunicationStyle {
    /// Read a free-form style preference.
    ///
    /// Any value containing "formal" (case-insensitive) is formal, which
    /// includes "informal". Everything else is conversational.
    pub fn from_style(style: &str) -> Self {
        if style.to_lowercase().contains("formal") {
            Self::Formal
        } else {
            Self::Conversational
        }
    }
}

/// Formats workflow fragments into a reply string
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseComposer;

impl ResponseComposer {
    pub fn new() -> Self {
        Self
    }

    /// Compose a reply. Pure.
    pub fn compose(
        &self,
        fragments: &[String],
        intent_type: IntentType,
        style: CommunicationStyle,
    ) -> String {
        match intent_type {
            IntentType::Scheduling => {
                let body = fragments.join(". ");
                match style {
                    CommunicationStyle::Formal => {
                        format!("I have completed the scheduling request. {}.", body)
                    }
                    CommunicationStyle::Conversational => format!("Done! {}", body),
                }
            }
            IntentType::TaskManagement => format!("✓ {}", fragments.join("\n✓ ")),
            IntentType::Communication => fragments.join("\n"),
            IntentType::InformationRetrieval => fragments.join("\n\n"),
            IntentType::General => fragments.join(" "),
        }
    }
}
