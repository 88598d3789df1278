use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use vidlens_core::{
    AnalysisRecord, FieldTranslator, KeyMoment, TranslationError, Translator,
};

/// Prefixes the target code and records every call.
#[derive(Default)]
struct EchoTranslator {
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, String)>>,
    fail_on: HashSet<String>,
}

impl EchoTranslator {
    fn failing_on(texts: &[&str]) -> Self {
        Self {
            fail_on: texts.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for EchoTranslator {
    async fn translate(&self, text: &str, target_code: &str) -> Result<String, TranslationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((text.to_string(), target_code.to_string()));
        if self.fail_on.contains(text) {
            return Err(TranslationError::Status {
                status: 456,
                body: "Quota exceeded".into(),
            });
        }
        Ok(format!("[{target_code}] {text}"))
    }
}

/// Answers later calls first so completion order differs from submission order.
struct ReversedLatencyTranslator {
    remaining: AtomicUsize,
}

#[async_trait]
impl Translator for ReversedLatencyTranslator {
    async fn translate(&self, text: &str, _target_code: &str) -> Result<String, TranslationError> {
        let rank = self.remaining.fetch_sub(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5 * rank as u64)).await;
        Ok(text.to_uppercase())
    }
}

fn dog_record() -> AnalysisRecord {
    AnalysisRecord {
        summary: Some("A dog plays fetch.".into()),
        mood: Some("cheerful".into()),
        emotions: Some(vec!["joy".into(), "excitement".into()]),
        title_suggestions: Some(vec!["Fetch!".into()]),
        key_moments: Some(vec![
            KeyMoment::new("0:05", "dog runs"),
            KeyMoment::new("0:12", "dog barks"),
        ]),
        ..AnalysisRecord::default()
    }
}

#[tokio::test]
async fn source_language_is_identity_without_calls() {
    let translator = Arc::new(EchoTranslator::default());
    let fields = FieldTranslator::new(translator.clone(), 4);
    let record = dog_record();

    let translated = fields.translate(&record, "en").await.unwrap();
    assert_eq!(translated, record);
    assert_eq!(translator.calls(), 0);
}

#[tokio::test]
async fn key_moments_keep_timestamps_and_order() {
    let translator = Arc::new(EchoTranslator::default());
    let fields = FieldTranslator::new(translator.clone(), 4);
    let record = AnalysisRecord {
        key_moments: Some(vec![
            KeyMoment::new("0:05", "dog runs"),
            KeyMoment::new("0:12", "dog barks"),
        ]),
        ..AnalysisRecord::default()
    };

    let translated = fields.translate(&record, "es").await.unwrap();
    assert_eq!(
        translated.key_moments,
        Some(vec![
            KeyMoment::new("0:05", "[es] dog runs"),
            KeyMoment::new("0:12", "[es] dog barks"),
        ])
    );
    assert_eq!(translator.calls(), 2);
}

#[tokio::test]
async fn every_present_field_is_translated_and_absent_ones_stay_absent() {
    let translator = Arc::new(EchoTranslator::default());
    let fields = FieldTranslator::new(translator.clone(), 2);
    let record = dog_record();

    let translated = fields.translate(&record, "de").await.unwrap();
    assert_eq!(translated.summary.as_deref(), Some("[de] A dog plays fetch."));
    assert_eq!(translated.mood.as_deref(), Some("[de] cheerful"));
    assert_eq!(
        translated.emotions,
        Some(vec!["[de] joy".into(), "[de] excitement".into()])
    );
    assert_eq!(translated.title_suggestions, Some(vec!["[de] Fetch!".into()]));
    assert_eq!(translated.setting, None);
    assert_eq!(translated.people, None);
    assert_eq!(translated.viral_suggestions, None);
    // summary, mood, two emotions, one title, two key moments
    assert_eq!(translator.calls(), 7);
}

#[tokio::test]
async fn error_and_raw_text_are_never_sent() {
    let translator = Arc::new(EchoTranslator::default());
    let fields = FieldTranslator::new(translator.clone(), 1);
    let record = AnalysisRecord {
        summary: Some("partial".into()),
        people: Some(String::new()),
        error: Some("failed to parse response".into()),
        raw_text: Some("{oops".into()),
        ..AnalysisRecord::default()
    };

    let translated = fields.translate(&record, "fr").await.unwrap();
    assert_eq!(translated.error, record.error);
    assert_eq!(translated.raw_text, record.raw_text);
    assert_eq!(translated.people.as_deref(), Some(""));
    let seen = translator.seen.lock().unwrap().clone();
    assert_eq!(seen, vec![("partial".to_string(), "fr".to_string())]);
}

#[tokio::test]
async fn one_failed_field_fails_strict_translation() {
    let translator = Arc::new(EchoTranslator::failing_on(&["dog barks"]));
    let fields = FieldTranslator::new(translator, 4);

    match fields.translate(&dog_record(), "ja").await {
        Err(TranslationError::Incomplete { failures }) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].field, "keyMoments[1].description");
            assert!(failures[0].reason.contains("456"));
        }
        other => panic!("expected incomplete translation, got {other:?}"),
    }
}

#[tokio::test]
async fn partial_translation_tags_failed_fields() {
    let translator = Arc::new(EchoTranslator::failing_on(&["cheerful", "joy"]));
    let fields = FieldTranslator::new(translator, 4);

    let outcome = fields.translate_partial(&dog_record(), "it").await;
    assert!(!outcome.is_complete());
    let failed: Vec<_> = outcome.failures.iter().map(|f| f.field.as_str()).collect();
    assert_eq!(failed, vec!["mood", "emotions[0]"]);
    assert_eq!(outcome.record.mood.as_deref(), Some("cheerful"));
    assert_eq!(
        outcome.record.emotions,
        Some(vec!["joy".into(), "[it] excitement".into()])
    );
    assert_eq!(
        outcome.record.summary.as_deref(),
        Some("[it] A dog plays fetch.")
    );
}

#[tokio::test]
async fn concurrent_completion_preserves_positions() {
    let moments: Vec<KeyMoment> = (0..6)
        .map(|i| KeyMoment::new(format!("0:{i:02}"), format!("moment {i}")))
        .collect();
    let record = AnalysisRecord {
        key_moments: Some(moments.clone()),
        ..AnalysisRecord::default()
    };
    let translator = Arc::new(ReversedLatencyTranslator {
        remaining: AtomicUsize::new(moments.len()),
    });
    let fields = FieldTranslator::new(translator, 6);

    let translated = fields.translate(&record, "ru").await.unwrap();
    let expected: Vec<KeyMoment> = moments
        .iter()
        .map(|m| KeyMoment::new(m.timestamp.clone(), m.description.to_uppercase()))
        .collect();
    assert_eq!(translated.key_moments, Some(expected));
}

#[tokio::test]
async fn translated_records_round_trip_through_json() {
    let fields = FieldTranslator::new(Arc::new(EchoTranslator::default()), 3);
    let translated = fields.translate(&dog_record(), "pt").await.unwrap();
    let decoded: AnalysisRecord =
        serde_json::from_str(&serde_json::to_string(&translated).unwrap()).unwrap();
    assert_eq!(decoded, translated);
}

#[tokio::test]
async fn strict_translation_stops_after_first_failure() {
    let translator = Arc::new(EchoTranslator::failing_on(&["A dog plays fetch."]));
    let fields = FieldTranslator::new(translator.clone(), 1);

    match fields.translate(&dog_record(), "de").await {
        Err(TranslationError::Incomplete { failures }) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].field, "summary");
        }
        other => panic!("expected incomplete translation, got {other:?}"),
    }
    assert_eq!(translator.calls(), 1);

    let partial = FieldTranslator::new(translator.clone(), 1)
        .translate_partial(&dog_record(), "de")
        .await;
    assert_eq!(partial.failures.len(), 1);
    // 7 fields in dog_record, plus the one strict call above.
    assert_eq!(translator.calls(), 8);
}

#[tokio::test]
async fn multi_line_tweet_suggestion_is_one_provider_call() {
    let record = vidlens_core::parse_analysis(
        "{\"tweetSuggestion\": \"Best fetch ever!\\n\\n#dogs #fetch\"}",
    );
    assert_eq!(
        record.viral_suggestions.as_ref().map(Vec::len),
        Some(1)
    );

    let translator = Arc::new(EchoTranslator::default());
    let fields = FieldTranslator::new(translator.clone(), 4);
    let translated = fields.translate(&record, "es").await.unwrap();
    assert_eq!(translator.calls(), 1);
    assert_eq!(
        translated.viral_suggestions,
        Some(vec!["[es] Best fetch ever!\n\n#dogs #fetch".to_string()])
    );
}

#[tokio::test]
async fn partial_outcome_converts_to_strict_result() {
    let translator = Arc::new(EchoTranslator::failing_on(&["cheerful", "dog runs"]));
    let fields = FieldTranslator::new(translator, 4);

    let outcome = fields.translate_partial(&dog_record(), "ar").await;
    match outcome.into_complete() {
        Err(TranslationError::Incomplete { failures }) => {
            let failed: Vec<_> = failures.iter().map(|f| f.field.as_str()).collect();
            assert_eq!(failed, vec!["mood", "keyMoments[0].description"]);
        }
        other => panic!("expected incomplete translation, got {other:?}"),
    }

    let clean = FieldTranslator::new(Arc::new(EchoTranslator::default()), 4)
        .translate_partial(&dog_record(), "ar")
        .await;
    assert!(clean.is_complete());
    assert_eq!(
        clean.into_complete().unwrap().mood.as_deref(),
        Some("[ar] cheerful")
    );
}
