mod render;
pub mod server;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;
use vidlens_core::{
    load_vidlens_config, AnalysisRecord, AnalysisSession, AnalyzeError, ConfigurationError,
    Credentials, DeeplTranslator, FieldTranslator, GeminiModel, HttpVideoFetcher, Language,
    TranslationError, VideoAnalyzer, VidlensConfig,
};

use render::DisplayFallback;
use server::AppState;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] vidlens_core::ConfigError),
    #[error("{0}")]
    Credentials(#[from] ConfigurationError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("analysis failed: {0}")]
    Analyze(#[from] AnalyzeError),
    #[error("translation failed: {0}")]
    Translation(#[from] TranslationError),
    #[error("unknown language code {0:?}; run `vidlensctl languages` for the supported list")]
    UnknownLanguage(String),
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Video analysis and translation service", long_about = None)]
pub struct Cli {
    /// Path to vidlens.toml
    #[arg(long, default_value = "configs/vidlens.toml")]
    pub config: PathBuf,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs the HTTP API
    Serve(ServeArgs),
    /// Analyzes one video and prints the result
    Analyze(AnalyzeArgs),
    /// Translates a saved analysis JSON file
    Translate(TranslateArgs),
    /// Lists selectable languages
    Languages,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Overrides server.bind_addr
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Absolute URL of the video
    pub url: String,
    /// Language code to display the analysis in
    #[arg(long)]
    pub lang: Option<String>,
}

#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Analysis JSON, as printed by `analyze --format json`
    #[arg(long)]
    pub input: PathBuf,
    /// Target language code
    #[arg(long)]
    pub lang: String,
}

pub async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Languages => render(&Language::catalog(), cli.format),
        Commands::Serve(args) => {
            let context = AppContext::new(&cli)?;
            let bind_addr = args
                .bind
                .clone()
                .unwrap_or_else(|| context.config.server.bind_addr.clone());
            server::serve(&bind_addr, Arc::new(context.app_state())).await?;
            Ok(())
        }
        Commands::Analyze(args) => {
            let context = AppContext::new(&cli)?;
            let record = context.analyze(args).await?;
            render(&record, cli.format)
        }
        Commands::Translate(args) => {
            let context = AppContext::new(&cli)?;
            let record = context.translate_file(args).await?;
            render(&record, cli.format)
        }
    }
}

fn render<T>(value: &T, format: OutputFormat) -> Result<()>
where
    T: Serialize + DisplayFallback,
{
    match format {
        OutputFormat::Text => {
            println!("{}", value.display());
            Ok(())
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{}", json);
            Ok(())
        }
    }
}

fn resolve_language(code: &str) -> Result<Language> {
    Language::find(code).ok_or_else(|| AppError::UnknownLanguage(code.to_string()))
}

#[derive(Debug)]
struct AppContext {
    config: VidlensConfig,
    credentials: Credentials,
}

impl AppContext {
    fn new(cli: &Cli) -> Result<Self> {
        let config = load_vidlens_config(&cli.config)?;
        let credentials = Credentials::from_env(&config);
        Ok(Self {
            config,
            credentials,
        })
    }

    fn analyzer(&self) -> std::result::Result<VideoAnalyzer, ConfigurationError> {
        let api_key = self.credentials.require_model_key()?;
        Ok(VideoAnalyzer::new(
            Arc::new(HttpVideoFetcher::new(&self.config.fetch)),
            Arc::new(GeminiModel::new(&self.config.model, api_key)),
        ))
    }

    fn field_translator(&self) -> std::result::Result<FieldTranslator, ConfigurationError> {
        let api_key = self.credentials.require_translation_key()?;
        Ok(FieldTranslator::new(
            Arc::new(DeeplTranslator::new(&self.config.translation, api_key)),
            self.config.translation.max_concurrency,
        ))
    }

    fn app_state(&self) -> AppState {
        let analyzer = self.analyzer();
        let translator = self.field_translator();
        for err in [analyzer.as_ref().err(), translator.as_ref().err()]
            .into_iter()
            .flatten()
        {
            warn!(error = %err, "endpoint disabled until credential is configured");
        }
        AppState {
            analyzer,
            translator,
            allow_partial: self.config.translation.allow_partial,
        }
    }

    async fn analyze(&self, args: &AnalyzeArgs) -> Result<AnalysisRecord> {
        let language = args.lang.as_deref().map(resolve_language).transpose()?;
        let analyzer = self.analyzer()?;
        let translator = match &language {
            Some(language) if !language.is_source() => Some(self.field_translator()?),
            _ => None,
        };
        let session = AnalysisSession::new();

        let ticket = session.begin_analysis(args.url.clone());
        let record = analyzer.analyze(&args.url).await?;
        session.complete_analysis(ticket, record.clone());

        if let (Some(language), Some(translator)) = (language, translator) {
            if let Some((ticket, original)) = session.begin_translation(language.clone()) {
                let result = translator.translate(&original, &language.code).await;
                session.complete_translation(ticket, result);
            }
        }
        if let Some(err) = session.translation_error() {
            warn!("{err}; showing the untranslated analysis");
        }
        Ok(session.displayed().unwrap_or(record))
    }

    async fn translate_file(&self, args: &TranslateArgs) -> Result<AnalysisRecord> {
        let language = resolve_language(&args.lang)?;
        let content = tokio::fs::read_to_string(&args.input).await?;
        let record: AnalysisRecord = serde_json::from_str(&content)?;
        if language.is_source() {
            return Ok(record);
        }

        let translator = self.field_translator()?;
        if self.config.translation.allow_partial {
            let outcome = translator.translate_partial(&record, &language.code).await;
            for failure in &outcome.failures {
                warn!(%failure, "field left untranslated");
            }
            return Ok(outcome.record);
        }
        Ok(translator.translate(&record, &language.code).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn prepare_test_context(allow_partial: bool) -> (TempDir, AppContext) {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("vidlens.toml");
        let mut content = fs::read_to_string("../configs/vidlens.toml").unwrap();
        content = content.replace(
            "allow_partial = false",
            &format!("allow_partial = {allow_partial}"),
        );
        fs::write(&config_path, content).unwrap();

        let cli = Cli {
            config: config_path,
            format: OutputFormat::Json,
            command: Commands::Languages,
        };
        let mut context = AppContext::new(&cli).unwrap();
        context.credentials = Credentials::default();
        (temp, context)
    }

    #[test]
    fn missing_credentials_disable_endpoints() {
        let (_temp, context) = prepare_test_context(false);
        let state = context.app_state();
        assert_eq!(state.analyzer.err().unwrap().provider, "Gemini");
        assert_eq!(state.translator.err().unwrap().provider, "DeepL");
        assert!(!state.allow_partial);
    }

    #[test]
    fn partial_mode_follows_config() {
        let (_temp, context) = prepare_test_context(true);
        assert!(context.app_state().allow_partial);
    }

    #[test]
    fn unknown_language_is_rejected() {
        assert!(matches!(
            resolve_language("xx"),
            Err(AppError::UnknownLanguage(code)) if code == "xx"
        ));
        assert_eq!(resolve_language("zh").unwrap().display_name, "Chinese");
    }

    #[tokio::test]
    async fn source_language_translation_needs_no_credential() {
        let (temp, context) = prepare_test_context(false);
        let input = temp.path().join("analysis.json");
        fs::write(&input, r#"{"summary": "A dog plays.", "emotions": "joy\nfear"}"#).unwrap();

        let record = context
            .translate_file(&TranslateArgs {
                input: input.clone(),
                lang: "en".into(),
            })
            .await
            .unwrap();
        assert_eq!(record.emotions, Some(vec!["joy".into(), "fear".into()]));

        let err = context
            .translate_file(&TranslateArgs {
                input,
                lang: "es".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Credentials(_)));
    }
}
