use std::sync::Mutex;

use tracing::debug;

use crate::language::Language;
use crate::record::AnalysisRecord;
use crate::translate::TranslationError;

/// Issued for every analyze or translate request. A response is applied only
/// when its ticket is still the latest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
struct SessionState {
    latest: u64,
    url: Option<String>,
    original: Option<AnalysisRecord>,
    displayed: Option<AnalysisRecord>,
    language: Option<Language>,
    translation_error: Option<String>,
}

/// Caller-side view of one analysis: the untranslated original, the record
/// currently displayed, and the selected language.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    state: Mutex<SessionState>,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut SessionState) -> T) -> T {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    fn issue(state: &mut SessionState) -> RequestTicket {
        state.latest += 1;
        RequestTicket {
            generation: state.latest,
        }
    }

    /// Starts analysis of a new URL. Results of every earlier request become stale.
    pub fn begin_analysis(&self, url: impl Into<String>) -> RequestTicket {
        self.with_state(|state| {
            state.url = Some(url.into());
            Self::issue(state)
        })
    }

    /// Applies an analysis result; the language resets to the source language.
    pub fn complete_analysis(&self, ticket: RequestTicket, record: AnalysisRecord) -> bool {
        self.with_state(|state| {
            if ticket.generation != state.latest {
                debug!(target: "session", generation = ticket.generation, latest = state.latest, "discarding stale analysis");
                return false;
            }
            state.original = Some(record.clone());
            state.displayed = Some(record);
            state.language = Some(Language::source());
            state.translation_error = None;
            true
        })
    }

    /// Starts a translation into `language`. Returns the original record to
    /// translate from, or `None` when there is nothing to translate yet.
    /// Selecting the source language is applied immediately and issues no request.
    pub fn begin_translation(
        &self,
        language: Language,
    ) -> Option<(RequestTicket, AnalysisRecord)> {
        self.with_state(|state| {
            let original = state.original.clone()?;
            let ticket = Self::issue(state);
            state.translation_error = None;
            if language.is_source() {
                state.displayed = Some(original);
                state.language = Some(language);
                return None;
            }
            state.language = Some(language);
            Some((ticket, original))
        })
    }

    /// Applies a translation result. On failure the original stays displayed
    /// and the error is surfaced separately.
    pub fn complete_translation(
        &self,
        ticket: RequestTicket,
        result: Result<AnalysisRecord, TranslationError>,
    ) -> bool {
        self.with_state(|state| {
            if ticket.generation != state.latest {
                debug!(target: "session", generation = ticket.generation, latest = state.latest, "discarding stale translation");
                return false;
            }
            match result {
                Ok(record) => {
                    state.displayed = Some(record);
                    state.translation_error = None;
                }
                Err(err) => {
                    state.displayed = state.original.clone();
                    state.translation_error = Some(format!("Translation error: {err}"));
                }
            }
            true
        })
    }

    pub fn url(&self) -> Option<String> {
        self.with_state(|state| state.url.clone())
    }

    pub fn original(&self) -> Option<AnalysisRecord> {
        self.with_state(|state| state.original.clone())
    }

    pub fn displayed(&self) -> Option<AnalysisRecord> {
        self.with_state(|state| state.displayed.clone())
    }

    pub fn language(&self) -> Option<Language> {
        self.with_state(|state| state.language.clone())
    }

    pub fn translation_error(&self) -> Option<String> {
        self.with_state(|state| state.translation_error.clone())
    }
}
