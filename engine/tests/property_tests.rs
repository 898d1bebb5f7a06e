use chrono::{Local, TimeZone};
use proptest::prelude::*;
use std::sync::Arc;

use concierge_engine::config::Config;
use concierge_engine::intent::{Entities, Intent, IntentClassifier, IntentType};
use concierge_engine::workflow::{Step, WorkflowPlanner};

mod common;
use common::ScriptedLanguage;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn classifier(language: ScriptedLanguage) -> IntentClassifier {
    IntentClassifier::new(&Config::default_config().classifier, Arc::new(language)).unwrap()
}

fn intent_type() -> impl Strategy<Value = IntentType> {
    prop::sample::select(IntentType::ALL.to_vec())
}

// Classification is total and confidence stays in [0, 1]
proptest! {
    #[test]
    fn test_classify_is_total(text in "\\PC{0,80}") {
        let rt = runtime();
        let intent = rt.block_on(classifier(ScriptedLanguage::default()).classify(&text));

        prop_assert!(IntentType::ALL.contains(&intent.intent_type));
        prop_assert!((0.0..=1.0).contains(&intent.confidence));
    }
}

// Any detected date/time selects Scheduling unless a pattern overrides it
proptest! {
    #[test]
    fn test_datetime_selects_scheduling(text in "[a-z ]{0,40}") {
        prop_assume!(!text.trim_start().starts_with("remind me"));
        let when = Local.with_ymd_and_hms(2030, 5, 16, 14, 0, 0).unwrap();
        let rt = runtime();
        let intent = rt.block_on(classifier(ScriptedLanguage::with_datetime(when)).classify(&text));

        prop_assert_eq!(intent.intent_type, IntentType::Scheduling);
        prop_assert_eq!(intent.entities.datetime, Some(when));
    }
}

// Keyword-free text is General with confidence exactly 0.5
proptest! {
    #[test]
    fn test_keyword_free_text_is_general(word in "[b-z]{12,16}") {
        let rt = runtime();
        let intent = rt.block_on(classifier(ScriptedLanguage::default()).classify(&word));

        prop_assert_eq!(intent.intent_type, IntentType::General);
        prop_assert_eq!(intent.confidence, 0.5);
    }
}

#[test]
fn test_empty_text_is_general() {
    let rt = runtime();
    let intent = rt.block_on(classifier(ScriptedLanguage::default()).classify(""));
    assert_eq!(intent.intent_type, IntentType::General);
    assert_eq!(intent.confidence, 0.5);
    assert_eq!(intent.entities, Entities::default());
}

// Planning is pure and Scheduling plans two steps with a datetime, one without
proptest! {
    #[test]
    fn test_planning_is_pure(
        intent_type in intent_type(),
        title in proptest::option::of("[a-z ]{1,20}"),
        person in proptest::option::of("[A-Z][a-z]{1,8}"),
        query in proptest::option::of("[a-z ]{1,20}"),
        has_datetime in any::<bool>(),
        duration in 1i64..240,
    ) {
        let intent = Intent {
            intent_type,
            entities: Entities {
                title,
                person,
                query,
                datetime: has_datetime.then(|| Local.with_ymd_and_hms(2030, 1, 2, 9, 0, 0).unwrap()),
                ..Default::default()
            },
            confidence: 0.8,
            pattern: None,
            language: None,
        };
        let planner = WorkflowPlanner::new(duration);

        let first = planner.plan(&intent);
        prop_assert_eq!(&first, &planner.plan(&intent));

        if intent_type == IntentType::Scheduling {
            prop_assert_eq!(first.len(), if has_datetime { 2 } else { 1 });
            prop_assert_eq!(first.last(), Some(&Step::ListUpcomingEvents));
        }
    }
}

// Configuration survives a TOML round trip
proptest! {
    #[test]
    fn test_config_round_trip(
        log_level in "error|warn|info|debug|trace",
        style in "formal|conversational",
        upcoming_days in 1u32..60,
        event_duration_mins in 1i64..480,
        translate in any::<bool>(),
    ) {
        let mut config = Config::default_config();
        config.core.log_level = log_level.clone();
        config.core.data_dir = std::env::temp_dir().join("concierge-proptest");
        config.agent.default_style = style.clone();
        config.agent.upcoming_days = upcoming_days;
        config.agent.event_duration_mins = event_duration_mins;
        config.agent.translate_replies = translate;

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::from_toml_str(&text).unwrap();

        prop_assert_eq!(parsed.core.log_level, log_level);
        prop_assert_eq!(parsed.agent.default_style, style);
        prop_assert_eq!(parsed.agent.upcoming_days, upcoming_days);
        prop_assert_eq!(parsed.agent.event_duration_mins, event_duration_mins);
        prop_assert_eq!(parsed.agent.translate_replies, translate);
        prop_assert_eq!(parsed.classifier, config.classifier);
    }
}
