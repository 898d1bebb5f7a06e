//! Intent Classifier
//!
//! Classification runs in a fixed order:
//!
//! 1. Ask the language provider for the language (informational only)
//! 2. Extract entities: last person/location/organization wins, at most one
//!    date/time
//! 3. Pick the intent: a prefix rule carrying an intent override first, then
//!    the keyword rules in table order, then `General`
//! 4. Score confidence: 0.5 base, +0.3 for 3..=20 words, +0.2 when not
//!    `General`, capped at 1.0
//! 5. Tag the learning pattern from the first matching prefix rule
//!
//! The keyword table comes from [`ClassifierConfig`] and is compiled once at
//! construction.

use regex::Regex;
use sdk::collaborators::LanguageProvider;
use sdk::errors::EngineError;
use sdk::types::EntityKind;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::types::{Entities, Intent, IntentType};
use crate::config::{ClassifierConfig, PatternRule};

// Scores are kept in hundredths so the common values are exact
const BASE_CONFIDENCE: u32 = 50;
const LENGTH_BONUS: u32 = 30;
const SPECIFIC_INTENT_BONUS: u32 = 20;
const MAX_CONFIDENCE: u32 = 100;
const MIN_SCORED_WORDS: usize = 3;
const MAX_SCORED_WORDS: usize = 20;

const ARTICLES: [&str; 4] = ["a", "an", "the", "my"];

/// A keyword rule with its matcher compiled
#[derive(Debug)]
struct CompiledRule {
    intent: IntentType,
    matcher: Option<Regex>,
    match_datetime: bool,
}

impl CompiledRule {
    fn matches(&self, lowered: &str, has_datetime: bool) -> bool {
        (self.match_datetime && has_datetime)
            || self
                .matcher
                .as_ref()
                .map(|re| re.is_match(lowered))
                .unwrap_or(false)
    }
}

/// Rule-table intent classifier
pub struct IntentClassifier {
    language: Arc<dyn LanguageProvider>,
    rules: Vec<CompiledRule>,
    patterns: Vec<PatternRule>,
    /// Lead phrases split into words, longest first
    lead_phrases: Vec<Vec<String>>,
    temporal_markers: HashSet<String>,
}

impl IntentClassifier {
    /// Build a classifier from a keyword table.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` when the table is invalid.
    pub fn new(
        config: &ClassifierConfig,
        language: Arc<dyn LanguageProvider>,
    ) -> Result<Self, EngineError> {
        let mut config = config.clone();
        config.validate_and_normalize()?;

        let rules = config
            .rules
            .iter()
            .map(|rule| {
                let matcher = if rule.keywords.is_empty() {
                    None
                } else {
                    let alternatives = rule
                        .keywords
                        .iter()
                        .map(|k| regex::escape(k))
                        .collect::<Vec<_>>()
                        .join("|");
                    let re = Regex::new(&format!(r"\b(?:{})\b", alternatives)).map_err(|e| {
                        EngineError::Config(format!(
                            "Invalid keywords for '{}': {}",
                            rule.intent, e
                        ))
                    })?;
                    Some(re)
                };
                Ok(CompiledRule {
                    intent: rule.intent,
                    matcher,
                    match_datetime: rule.match_datetime,
                })
            })
            .collect::<Result<Vec<_>, EngineError>>()?;

        let mut lead_phrases: Vec<Vec<String>> = config
            .lead_phrases
            .iter()
            .map(|p| p.split_whitespace().map(str::to_string).collect())
            .collect();
        lead_phrases.sort_by(|a: &Vec<String>, b: &Vec<String>| b.len().cmp(&a.len()));

        Ok(Self {
            language,
            rules,
            patterns: config.patterns,
            lead_phrases,
            temporal_markers: config.temporal_markers.into_iter().collect(),
        })
    }

    /// Classify a command. Never fails.
    pub async fn classify(&self, text: &str) -> Intent {
        let trimmed = text.trim();
        let lowered = trimmed.to_lowercase();

        // Step 1: language (informational)
        let language = match self.language.detect_language(trimmed).await {
            Ok(code) => Some(code),
            Err(e) => {
                warn!("Language detection failed: {}", e);
                None
            }
        };

        // Step 2: entities
        let mut entities = Entities::default();
        match self.language.extract_named_entities(trimmed).await {
            Ok(tagged) => {
                for entity in tagged {
                    let slot = match entity.kind {
                        EntityKind::Person => &mut entities.person,
                        EntityKind::Location => &mut entities.location,
                        EntityKind::Organization => &mut entities.organization,
                    };
                    *slot = Some(entity.text);
                }
            }
            Err(e) => warn!("Entity extraction failed: {}", e),
        }
        match self.language.detect_date_time(trimmed).await {
            Ok(datetime) => entities.datetime = datetime,
            Err(e) => warn!("Date detection failed: {}", e),
        }

        // Step 3: intent type
        let pattern = self.pattern_for(&lowered);
        let intent_type = pattern
            .and_then(|p| p.intent)
            .unwrap_or_else(|| self.match_rules(&lowered, entities.datetime.is_some()));

        match intent_type {
            IntentType::Scheduling | IntentType::TaskManagement => {
                entities.title = self.extract_title(trimmed);
            }
            IntentType::InformationRetrieval if !trimmed.is_empty() => {
                entities.query = Some(trimmed.to_string());
            }
            IntentType::General if !trimmed.is_empty() => {
                entities.prompt = Some(trimmed.to_string());
            }
            _ => {}
        }

        // Step 4: confidence
        let confidence = Self::confidence(trimmed.split_whitespace().count(), intent_type);

        debug!(
            "Classified as {} (confidence {:.2}, pattern {:?})",
            intent_type,
            confidence,
            pattern.map(|p| p.tag.as_str())
        );

        Intent {
            intent_type,
            entities,
            confidence,
            pattern: pattern.map(|p| p.tag.clone()),
            language,
        }
    }

    /// First keyword rule that matches, else `General`
    fn match_rules(&self, lowered: &str, has_datetime: bool) -> IntentType {
        self.rules
            .iter()
            .find(|rule| rule.matches(lowered, has_datetime))
            .map(|rule| rule.intent)
            .unwrap_or(IntentType::General)
    }

    /// First prefix rule that matches the lower-cased, trimmed text
    fn pattern_for(&self, lowered: &str) -> Option<&PatternRule> {
        self.patterns
            .iter()
            .find(|p| lowered.starts_with(p.prefix.as_str()))
    }

    /// Confidence score for a command of `word_count` words
    pub fn confidence(word_count: usize, intent_type: IntentType) -> f64 {
        let mut score = BASE_CONFIDENCE;
        if (MIN_SCORED_WORDS..=MAX_SCORED_WORDS).contains(&word_count) {
            score += LENGTH_BONUS;
        }
        if intent_type != IntentType::General {
            score += SPECIFIC_INTENT_BONUS;
        }
        f64::from(score.min(MAX_CONFIDENCE)) / 100.0
    }

    /// Pull a short title out of a scheduling or task command.
    ///
    /// Drops one lead phrase and one article from the front and cuts at the
    /// first temporal marker.
    fn extract_title(&self, text: &str) -> Option<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let normalized: Vec<String> = words.iter().map(|w| normalize_word(w)).collect();

        let mut start = self
            .lead_phrases
            .iter()
            .find(|phrase| {
                !phrase.is_empty()
                    && phrase.len() <= normalized.len()
                    && normalized[..phrase.len()] == phrase[..]
            })
            .map(|phrase| phrase.len())
            .unwrap_or(0);

        if normalized
            .get(start)
            .is_some_and(|w| ARTICLES.contains(&w.as_str()))
        {
            start += 1;
        }

        let end = normalized
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, w)| self.temporal_markers.contains(*w))
            .map(|(i, _)| i)
            .unwrap_or(words.len());

        if start >= end {
            return None;
        }

        let title = words[start..end].join(" ");
        let title = title.trim_matches(|c: char| !c.is_alphanumeric());
        (!title.is_empty()).then(|| title.to_string())
    }
}

/// Lower-case a word and strip surrounding punctuation
fn normalize_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}
