//! Thin Gemini client: OCR and free-form answers through the generative API,
//! sentence embeddings through a locally loaded model.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::info;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod settings;

use application::services::{EmbeddingEngine, GenerativeModel, ServiceConfig};
use application::{EmbeddingBackendListResponse, EmbeddingBackendOption};
use domain::Credentials;
#[cfg(feature = "fastembed-engine")]
use infrastructure::FastEmbedEngine;
use infrastructure::{GeminiHttpClient, SimpleEmbedEngine};
use settings::{available_backends, AppConfig, ConfigManager, EmbeddingBackend};

pub use application::ServiceClient;
pub use domain::{ClientError, ConnectionStatus, EmbeddingInput, Embeddings, Generated};

/// Environment variable controlling the log filter.
pub const LOG_ENV: &str = "GEMINI_OCR_LOG";

/// Environment variable overriding the configuration directory.
pub const DATA_DIR_ENV: &str = "GEMINI_OCR_DATA_DIR";

/// Everything a front-end needs after bootstrap.
pub struct AppHandles {
    pub client: Arc<ServiceClient>,
    pub data_dir: std::path::PathBuf,
}

/// Install the global tracing subscriber once, writing to stderr.
pub fn init_tracing() {
    init_tracing_with_writer(std::io::stderr);
}

fn init_tracing_with_writer<W>(make_writer: fn() -> W)
where
    W: std::io::Write + Send + Sync + 'static,
{
    static INIT: std::sync::OnceLock<()> = std::sync::OnceLock::new();

    let _ = INIT.get_or_init(|| {
        let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| "info".into());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(make_writer)
            .compact()
            .try_init();
    });
}

/// Load configuration and credentials from the environment and build the client.
pub fn build_environment() -> Result<AppHandles> {
    let data_dir = resolve_data_dir()?;
    let config = ConfigManager::load(&data_dir).context("failed to load config file")?;
    info!(path = %config.path().display(), "configuration loaded");
    let credentials = Credentials::from_env()?;

    let client = build_client(&config.current().with_env_overrides(), credentials)
        .context("failed to initialise service client")?;

    Ok(AppHandles {
        client: Arc::new(client),
        data_dir,
    })
}

/// Build a client from explicit settings and credentials.
pub fn build_client(config: &AppConfig, credentials: Credentials) -> Result<ServiceClient> {
    let generator: Arc<dyn GenerativeModel> = Arc::new(GeminiHttpClient::new(
        credentials,
        config.api_base.clone(),
        Duration::from_secs(config.timeout_secs.max(1)),
    ));
    let embedder = init_embedder(&config.embedding)
        .context("failed to initialise embedding backend")?;

    Ok(ServiceClient::new(
        generator,
        embedder,
        ServiceConfig::new(config.model.clone(), config.verify_model.clone()),
    ))
}

fn init_embedder(backend: &EmbeddingBackend) -> Result<Arc<dyn EmbeddingEngine>> {
    match backend {
        EmbeddingBackend::Simple { model, dimensions } => {
            let engine = SimpleEmbedEngine::try_new(model.clone(), *dimensions)?;
            Ok(Arc::new(engine))
        }
        #[cfg(feature = "fastembed-engine")]
        EmbeddingBackend::FastEmbed { model } => {
            let engine = FastEmbedEngine::try_new(model)?;
            Ok(Arc::new(engine))
        }
    }
}

/// Describe the compiled-in embedding backends, marking the active one.
pub fn build_backend_response(
    active: &EmbeddingBackend,
    loaded_dimensions: Option<usize>,
) -> EmbeddingBackendListResponse {
    let mut options: Vec<EmbeddingBackendOption> = available_backends()
        .into_iter()
        .map(|backend| EmbeddingBackendOption {
            id: backend.id().to_string(),
            label: backend.label().to_string(),
            description: backend.description().to_string(),
            model: backend.model_name().to_string(),
            dimensions: backend.expected_dimensions(),
            feature_gated: backend.is_feature_gated(),
        })
        .collect();

    if let Some(option) = options.iter_mut().find(|opt| opt.id == active.id()) {
        option.model = active.model_name().to_string();
        option.dimensions = loaded_dimensions.or_else(|| active.expected_dimensions());
    }

    EmbeddingBackendListResponse {
        active: active.id().to_string(),
        options,
    }
}

/// Directory searched for `config.json`; `GEMINI_OCR_DATA_DIR` wins over the
/// OS default. The directory is not created.
pub fn resolve_data_dir() -> Result<std::path::PathBuf> {
    match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Ok(std::path::PathBuf::from(dir)),
        _ => Ok(directories::ProjectDirs::from("dev", "gemini-ocr", "GeminiOcr")
            .ok_or_else(|| anyhow!("unable to determine OS data dir"))?
            .data_dir()
            .to_path_buf()),
    }
}
