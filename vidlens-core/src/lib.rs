pub mod analyzer;
pub mod config;
pub mod encode;
pub mod error;
pub mod fetch;
pub mod language;
pub mod model;
pub mod parse;
pub mod record;
pub mod session;
pub mod translate;

pub use analyzer::{AnalyzeError, VideoAnalyzer};
pub use config::{
    load_vidlens_config, Credentials, FetchSection, ModelSection, ServerSection,
    TranslationSection, VidlensConfig,
};
pub use encode::{encode_payload, EncodedPayload, EncodingError, VIDEO_MIME_TYPE};
pub use error::{ConfigError, ConfigurationError, Result};
pub use fetch::{FetchError, HttpVideoFetcher, VideoFetcher};
pub use language::{is_source_code, Language, SOURCE_LANGUAGE_CODE};
pub use model::{
    AnalysisModel, GeminiModel, ModelRequestError, ANALYSIS_PROMPT, ANALYSIS_PROMPT_VERSION,
};
pub use parse::{parse_analysis, try_parse_analysis, ParseError};
pub use record::{AnalysisRecord, KeyMoment};
pub use session::{AnalysisSession, RequestTicket};
pub use translate::{
    translatable_fields, DeeplTranslator, FieldFailure, FieldTranslator, TextField,
    TranslationError, TranslationOutcome, Translator,
};
