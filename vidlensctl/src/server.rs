use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;
use vidlens_core::{
    is_source_code, AnalysisRecord, ConfigurationError, FieldFailure, FieldTranslator, Language,
    VideoAnalyzer,
};

/// Request bodies carry a URL or one analysis record; 2 MB is plenty.
const MAX_REQUEST_BODY: usize = 2 * 1024 * 1024;

pub struct AppState {
    pub analyzer: std::result::Result<VideoAnalyzer, ConfigurationError>,
    pub translator: std::result::Result<FieldTranslator, ConfigurationError>,
    pub allow_partial: bool,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub analysis: Option<AnalysisRecord>,
    pub target_language: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedAnalysis {
    #[serde(flatten)]
    pub analysis: AnalysisRecord,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub translation_failures: Vec<FieldFailure>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze).fallback(method_not_allowed))
        .route("/api/translate", post(translate).fallback(method_not_allowed))
        .route("/api/languages", get(languages))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY))
        .with_state(state)
}

pub async fn serve(bind_addr: &str, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %listener.local_addr()?, "vidlens api listening");
    axum::serve(listener, build_router(state)).await
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

fn missing_credential(err: &ConfigurationError) -> Response {
    error!(error = %err, "provider credential missing");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &format!("{} API key is not configured", err.provider),
    )
}

async fn analyze(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("analyze", %request_id);
    async move {
        let url = serde_json::from_slice::<AnalyzeRequest>(&body)
            .ok()
            .and_then(|request| request.url)
            .filter(|url| !url.trim().is_empty());
        let Some(url) = url else {
            return error_response(StatusCode::BAD_REQUEST, "Missing required parameter: url");
        };
        let analyzer = match &state.analyzer {
            Ok(analyzer) => analyzer,
            Err(err) => return missing_credential(err),
        };

        info!(%url, "received video url");
        match analyzer.analyze(&url).await {
            Ok(record) => (StatusCode::OK, Json(record)).into_response(),
            Err(err) => {
                error!(%url, error = %err, "error generating analysis");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to analyze video.")
            }
        }
    }
    .instrument(span)
    .await
}

async fn translate(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("translate", %request_id);
    async move {
        let request = serde_json::from_slice::<TranslateRequest>(&body).ok();
        let (analysis, target) = match request {
            Some(TranslateRequest {
                analysis: Some(analysis),
                target_language: Some(target),
            }) if !target.trim().is_empty() => (analysis, target),
            _ => return error_response(StatusCode::BAD_REQUEST, "Missing required parameters"),
        };

        if is_source_code(&target) {
            return (StatusCode::OK, Json(analysis)).into_response();
        }
        let translator = match &state.translator {
            Ok(translator) => translator,
            Err(err) => return missing_credential(err),
        };

        if state.allow_partial {
            let outcome = translator.translate_partial(&analysis, &target).await;
            if !outcome.is_complete() {
                warn!(target_language = %target, failed = outcome.failures.len(), "returning partial translation");
            }
            let body = TranslatedAnalysis {
                analysis: outcome.record,
                translation_failures: outcome.failures,
            };
            return (StatusCode::OK, Json(body)).into_response();
        }

        match translator.translate(&analysis, &target).await {
            Ok(translated) => (StatusCode::OK, Json(translated)).into_response(),
            Err(err) => {
                error!(target_language = %target, error = %err, "translation error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Failed to translate content",
                        "originalAnalysis": analysis,
                    })),
                )
                    .into_response()
            }
        }
    }
    .instrument(span)
    .await
}

async fn languages() -> Json<Vec<Language>> {
    Json(Language::catalog())
}
