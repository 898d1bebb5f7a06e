//! Rule-based language provider
//!
//! A dependency-free [`LanguageProvider`] for running Concierge without an
//! external NLP service. Everything is regex and word-list heuristics:
//!
//! - language: stop-word voting over English, Spanish, French and German
//! - people: a capitalized name after a contact verb ("call John")
//! - locations: a capitalized name after "in" or "near"
//! - organizations: capitalized words ending in a company suffix
//! - date/time: today/tomorrow/tonight or a weekday, plus "at 2 PM"-style
//!   times, noon and midnight
//! - sentiment: positive minus negative word counts

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone, Weekday};
use regex::Regex;
use sdk::collaborators::LanguageProvider;
use sdk::errors::{EngineError, ProviderError};
use sdk::types::{EntityKind, NamedEntity, Sentiment};

const DEFAULT_LANGUAGE: &str = "en";

/// Hour used when a day is named without a time
const DEFAULT_HOUR: u32 = 9;
const TONIGHT_HOUR: u32 = 20;

const STOP_WORDS: [(&str, &[&str]); 4] = [
    ("en", &["the", "and", "is", "to", "what", "me", "my", "a", "of", "with"]),
    ("es", &["el", "la", "los", "que", "y", "es", "por", "para", "una", "con"]),
    ("fr", &["le", "la", "les", "et", "est", "pour", "une", "avec", "que", "du"]),
    ("de", &["der", "die", "das", "und", "ist", "mit", "ein", "eine", "nicht", "zu"]),
];

const POSITIVE_WORDS: [&str; 12] = [
    "good", "great", "thanks", "thank", "love", "awesome", "excellent", "happy", "nice",
    "wonderful", "perfect", "glad",
];

const NEGATIVE_WORDS: [&str; 12] = [
    "bad", "terrible", "hate", "awful", "angry", "sad", "annoyed", "wrong", "broken", "horrible",
    "upset", "worst",
];

/// Capitalized words that are never names
const NOT_NAMES: [&str; 12] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday", "Today",
    "Tomorrow", "Tonight", "Me", "I",
];

/// Heuristic language provider
pub struct RuleBasedLanguageProvider {
    person: Regex,
    location: Regex,
    organization: Regex,
    day: Regex,
    clock: Regex,
}

impl RuleBasedLanguageProvider {
    /// Compile the provider's patterns
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Provider` if a pattern fails to compile.
    pub fn new() -> Result<Self, EngineError> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| EngineError::Provider(format!("Invalid NLP pattern: {}", e)))
        };

        Ok(Self {
            person: compile(
                r"\b(?i:call|text|email|message|contact|with|meet|ask|tell)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)",
            )?,
            location: compile(r"\b(?i:in|near)\s+([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)*)")?,
            organization: compile(
                r"\b((?:[A-Z][\w&]*\s+)+(?:Inc|Corp|Corporation|LLC|Ltd|Company))\b",
            )?,
            day: compile(
                r"\b(today|tomorrow|tonight|monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
            )?,
            clock: compile(
                r"\b(?:at\s+(\d{1,2})(?::(\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)?|(\d{1,2})(?::(\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)|(noon|midnight))",
            )?,
        })
    }

    /// Tag people, locations and organizations in order of appearance
    pub fn entities(&self, text: &str) -> Vec<NamedEntity> {
        let mut found: Vec<(usize, NamedEntity)> = Vec::new();

        for (re, kind) in [
            (&self.person, EntityKind::Person),
            (&self.location, EntityKind::Location),
            (&self.organization, EntityKind::Organization),
        ] {
            for caps in re.captures_iter(text) {
                let Some(m) = caps.get(1) else { continue };
                let name = trim_trailing_non_names(m.as_str());
                if !name.is_empty() {
                    found.push((m.start(), NamedEntity::new(kind, name)));
                }
            }
        }

        found.sort_by_key(|(start, _)| *start);
        found.into_iter().map(|(_, entity)| entity).collect()
    }

    /// Find the first date/time expression relative to `now`
    pub fn date_time_at(&self, text: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
        let lowered = text.to_lowercase();
        let today = now.date_naive();

        let day = self.day.captures(&lowered).and_then(|caps| caps.get(1)).map(|m| m.as_str());
        let time = self.clock.captures(&lowered).and_then(|caps| parse_clock(&caps));

        let (date, default_hour) = match day {
            Some("today") => (today, DEFAULT_HOUR),
            Some("tonight") => (today, TONIGHT_HOUR),
            Some("tomorrow") => (today + Duration::days(1), DEFAULT_HOUR),
            Some(name) => (next_weekday(today, parse_weekday(name)?), DEFAULT_HOUR),
            None if time.is_some() => (today, DEFAULT_HOUR),
            None => return None,
        };

        let time = time.or_else(|| NaiveTime::from_hms_opt(default_hour, 0, 0))?;
        Local.from_local_datetime(&date.and_time(time)).earliest()
    }

    /// Best-voted language code, English on a tie or no votes
    pub fn language_of(&self, text: &str) -> &'static str {
        let words = words(text);
        let mut best = (DEFAULT_LANGUAGE, 0usize);

        for (code, stop_words) in STOP_WORDS {
            let votes = words.iter().filter(|w| stop_words.contains(&w.as_str())).count();
            if votes > best.1 {
                best = (code, votes);
            }
        }
        best.0
    }

    pub fn sentiment_of(&self, text: &str) -> Sentiment {
        let words = words(text);
        let positive = words.iter().filter(|w| POSITIVE_WORDS.contains(&w.as_str())).count();
        let negative = words.iter().filter(|w| NEGATIVE_WORDS.contains(&w.as_str())).count();

        match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        }
    }
}

#[async_trait]
impl LanguageProvider for RuleBasedLanguageProvider {
    async fn detect_language(&self, text: &str) -> Result<String, ProviderError> {
        Ok(self.language_of(text).to_string())
    }

    async fn extract_named_entities(&self, text: &str) -> Result<Vec<NamedEntity>, ProviderError> {
        Ok(self.entities(text))
    }

    async fn detect_date_time(
        &self,
        text: &str,
    ) -> Result<Option<DateTime<Local>>, ProviderError> {
        Ok(self.date_time_at(text, Local::now()))
    }

    async fn analyze_sentiment(&self, text: &str) -> Result<Sentiment, ProviderError> {
        Ok(self.sentiment_of(text))
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Drop capitalized words like "Friday" from the end of a matched name
fn trim_trailing_non_names(name: &str) -> String {
    let mut parts: Vec<&str> = name.split_whitespace().collect();
    while parts.last().is_some_and(|w| NOT_NAMES.contains(w)) {
        parts.pop();
    }
    // a name made only of non-names is no name
    if parts.first().is_some_and(|w| NOT_NAMES.contains(w)) {
        return String::new();
    }
    parts.join(" ")
}

fn parse_clock(caps: &regex::Captures<'_>) -> Option<NaiveTime> {
    if let Some(word) = caps.get(7) {
        let hour = if word.as_str() == "noon" { 12 } else { 0 };
        return NaiveTime::from_hms_opt(hour, 0, 0);
    }

    let (hour, minute, meridiem) = if caps.get(1).is_some() {
        (caps.get(1), caps.get(2), caps.get(3))
    } else {
        (caps.get(4), caps.get(5), caps.get(6))
    };

    let mut hour: u32 = hour?.as_str().parse().ok()?;
    let minute: u32 = match minute {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };

    match meridiem.map(|m| m.as_str().starts_with('p')) {
        Some(true) if hour < 12 => hour += 12,
        Some(false) if hour == 12 => hour = 0,
        _ => {}
    }

    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    name.parse().ok()
}

/// The next date falling on `weekday`, strictly after `from`
fn next_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (7 + weekday.num_days_from_monday() - from.weekday().num_days_from_monday()) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    from + Duration::days(i64::from(ahead))
}
