use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::encode::{encode_payload, EncodingError};
use crate::fetch::{FetchError, VideoFetcher};
use crate::model::{AnalysisModel, ModelRequestError, ANALYSIS_PROMPT, ANALYSIS_PROMPT_VERSION};
use crate::parse::parse_analysis;
use crate::record::AnalysisRecord;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("encoding failed: {0}")]
    Encoding(#[from] EncodingError),
    #[error("model request failed: {0}")]
    Model(#[from] ModelRequestError),
}

/// Fetch, encode, ask the model, parse. Parse failures come back as diagnostic
/// records rather than errors.
pub struct VideoAnalyzer {
    fetcher: Arc<dyn VideoFetcher>,
    model: Arc<dyn AnalysisModel>,
}

impl VideoAnalyzer {
    pub fn new(fetcher: Arc<dyn VideoFetcher>, model: Arc<dyn AnalysisModel>) -> Self {
        Self { fetcher, model }
    }

    pub async fn analyze(&self, url: &str) -> Result<AnalysisRecord, AnalyzeError> {
        let bytes = self.fetcher.fetch(url).await?;
        let payload = encode_payload(&bytes)?;
        info!(
            target: "analyzer",
            url,
            bytes = bytes.len(),
            prompt_version = ANALYSIS_PROMPT_VERSION,
            "requesting analysis"
        );
        drop(bytes);

        let raw = self.model.generate(&payload, ANALYSIS_PROMPT).await?;
        let record = parse_analysis(&raw);
        if record.is_diagnostic() {
            warn!(target: "analyzer", url, "analysis degraded to diagnostic record");
        }
        Ok(record)
    }
}
