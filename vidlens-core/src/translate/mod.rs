mod deepl;
mod error;

use std::fmt;
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, warn};

use crate::language::is_source_code;
use crate::record::AnalysisRecord;

pub use deepl::{DeeplTranslator, Translator};
pub use error::{FieldFailure, TranslationError};

/// Location of one translatable string inside an [`AnalysisRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Summary,
    Setting,
    Mood,
    Emotion(usize),
    People,
    Topic,
    ViralSuggestion(usize),
    TitleSuggestion(usize),
    KeyMomentDescription(usize),
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextField::Summary => f.write_str("summary"),
            TextField::Setting => f.write_str("setting"),
            TextField::Mood => f.write_str("mood"),
            TextField::Emotion(i) => write!(f, "emotions[{i}]"),
            TextField::People => f.write_str("people"),
            TextField::Topic => f.write_str("topic"),
            TextField::ViralSuggestion(i) => write!(f, "viralSuggestions[{i}]"),
            TextField::TitleSuggestion(i) => write!(f, "titleSuggestions[{i}]"),
            TextField::KeyMomentDescription(i) => write!(f, "keyMoments[{i}].description"),
        }
    }
}

impl TextField {
    fn assign(self, record: &mut AnalysisRecord, text: String) {
        let slot = match self {
            TextField::Summary => record.summary.as_mut(),
            TextField::Setting => record.setting.as_mut(),
            TextField::Mood => record.mood.as_mut(),
            TextField::People => record.people.as_mut(),
            TextField::Topic => record.topic.as_mut(),
            TextField::Emotion(i) => record.emotions.as_mut().and_then(|items| items.get_mut(i)),
            TextField::ViralSuggestion(i) => record
                .viral_suggestions
                .as_mut()
                .and_then(|items| items.get_mut(i)),
            TextField::TitleSuggestion(i) => record
                .title_suggestions
                .as_mut()
                .and_then(|items| items.get_mut(i)),
            TextField::KeyMomentDescription(i) => record
                .key_moments
                .as_mut()
                .and_then(|moments| moments.get_mut(i))
                .map(|moment| &mut moment.description),
        };
        if let Some(slot) = slot {
            *slot = text;
        }
    }
}

/// Every non-empty natural-language string of `record`, in field order.
/// `error`, `rawText` and key moment timestamps are never included.
pub fn translatable_fields(record: &AnalysisRecord) -> Vec<(TextField, String)> {
    let mut fields = Vec::new();
    let mut push = |field: TextField, text: &String| {
        if !text.trim().is_empty() {
            fields.push((field, text.clone()));
        }
    };

    if let Some(text) = &record.summary {
        push(TextField::Summary, text);
    }
    if let Some(text) = &record.setting {
        push(TextField::Setting, text);
    }
    if let Some(text) = &record.mood {
        push(TextField::Mood, text);
    }
    for (i, text) in record.emotions.iter().flatten().enumerate() {
        push(TextField::Emotion(i), text);
    }
    if let Some(text) = &record.people {
        push(TextField::People, text);
    }
    if let Some(text) = &record.topic {
        push(TextField::Topic, text);
    }
    for (i, text) in record.viral_suggestions.iter().flatten().enumerate() {
        push(TextField::ViralSuggestion(i), text);
    }
    for (i, text) in record.title_suggestions.iter().flatten().enumerate() {
        push(TextField::TitleSuggestion(i), text);
    }
    for (i, moment) in record.key_moments.iter().flatten().enumerate() {
        push(TextField::KeyMomentDescription(i), &moment.description);
    }
    fields
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationOutcome {
    /// Translated where possible; failed fields keep their original text.
    pub record: AnalysisRecord,
    pub failures: Vec<FieldFailure>,
}

impl TranslationOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// All-or-nothing view: any failed field fails the whole pass.
    pub fn into_complete(self) -> Result<AnalysisRecord, TranslationError> {
        if self.failures.is_empty() {
            Ok(self.record)
        } else {
            Err(TranslationError::Incomplete {
                failures: self.failures,
            })
        }
    }
}

pub struct FieldTranslator {
    translator: Arc<dyn Translator>,
    max_concurrency: usize,
}

impl FieldTranslator {
    pub fn new(translator: Arc<dyn Translator>, max_concurrency: usize) -> Self {
        Self {
            translator,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Strict pass: returns a fully translated record or an error, never a mix.
    /// Stops issuing provider calls at the first failed field.
    pub async fn translate(
        &self,
        record: &AnalysisRecord,
        target_code: &str,
    ) -> Result<AnalysisRecord, TranslationError> {
        let mut translated = record.clone();
        if is_source_code(target_code) {
            return Ok(translated);
        }

        let fields = translatable_fields(record);
        debug!(target: "translate", target_code, fields = fields.len(), "translating record");
        // Dropping the stream on the first error cancels in-flight calls and starts no new ones.
        let results: Vec<(TextField, String)> = stream::iter(fields)
            .map(|(field, text)| self.translate_field(field, text, target_code))
            .buffered(self.max_concurrency)
            .try_collect()
            .await
            .map_err(|failure| TranslationError::Incomplete {
                failures: vec![failure],
            })?;

        for (field, text) in results {
            field.assign(&mut translated, text);
        }
        Ok(translated)
    }

    /// Translates every field it can and reports the rest.
    pub async fn translate_partial(
        &self,
        record: &AnalysisRecord,
        target_code: &str,
    ) -> TranslationOutcome {
        let mut translated = record.clone();
        if is_source_code(target_code) {
            return TranslationOutcome {
                record: translated,
                failures: Vec::new(),
            };
        }

        let fields = translatable_fields(record);
        debug!(target: "translate", target_code, fields = fields.len(), "translating record");
        // `buffered` yields results in submission order.
        let results: Vec<_> = stream::iter(fields)
            .map(|(field, text)| self.translate_field(field, text, target_code))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok((field, text)) => field.assign(&mut translated, text),
                Err(failure) => failures.push(failure),
            }
        }

        TranslationOutcome {
            record: translated,
            failures,
        }
    }

    async fn translate_field(
        &self,
        field: TextField,
        text: String,
        target_code: &str,
    ) -> Result<(TextField, String), FieldFailure> {
        match self.translator.translate(&text, target_code).await {
            Ok(translated) => Ok((field, translated)),
            Err(err) => {
                warn!(target: "translate", %field, target_code, error = %err, "field translation failed");
                Err(FieldFailure {
                    field: field.to_string(),
                    reason: err.to_string(),
                })
            }
        }
    }
}
