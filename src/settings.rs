use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::application::services::{DEFAULT_MODEL, DEFAULT_VERIFY_MODEL};
use crate::infrastructure::http_client::{DEFAULT_API_BASE, DEFAULT_TIMEOUT_SECS};

/// Name of the optional configuration file within the data directory.
const CONFIG_FILENAME: &str = "config.json";

pub const MODEL_ENV: &str = "GEMINI_MODEL";
pub const VERIFY_MODEL_ENV: &str = "GEMINI_VERIFY_MODEL";
pub const API_BASE_ENV: &str = "GEMINI_API_BASE";

/// Declarative list of embedding backends compiled into the binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "backend", rename_all = "kebab-case")]
pub enum EmbeddingBackend {
    /// Lightweight deterministic hash embedder (always available).
    Simple {
        #[serde(default = "default_simple_model")]
        model: String,
        #[serde(default = "default_simple_dim")]
        dimensions: usize,
    },
    /// Pretrained sentence embeddings powered by FastEmbed (feature gated).
    #[cfg(feature = "fastembed-engine")]
    FastEmbed {
        #[serde(default = "default_fastembed_model")]
        model: String,
    },
}

impl EmbeddingBackend {
    pub fn id(&self) -> &'static str {
        match self {
            EmbeddingBackend::Simple { .. } => "simple",
            #[cfg(feature = "fastembed-engine")]
            EmbeddingBackend::FastEmbed { .. } => "fastembed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EmbeddingBackend::Simple { .. } => "Deterministic Hash (offline)",
            #[cfg(feature = "fastembed-engine")]
            EmbeddingBackend::FastEmbed { .. } => "FastEmbed (sentence-transformers)",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EmbeddingBackend::Simple { .. } => {
                "Small, deterministic vectors suitable for offline use and tests."
            }
            #[cfg(feature = "fastembed-engine")]
            EmbeddingBackend::FastEmbed { .. } => {
                "Pretrained sentence embeddings via fastembed/ONNX runtime."
            }
        }
    }

    pub fn is_feature_gated(&self) -> bool {
        #[cfg(feature = "fastembed-engine")]
        {
            return matches!(self, EmbeddingBackend::FastEmbed { .. });
        }

        #[cfg(not(feature = "fastembed-engine"))]
        {
            false
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            EmbeddingBackend::Simple { model, .. } => model,
            #[cfg(feature = "fastembed-engine")]
            EmbeddingBackend::FastEmbed { model } => model,
        }
    }

    pub fn expected_dimensions(&self) -> Option<usize> {
        match self {
            EmbeddingBackend::Simple { dimensions, .. } => Some(*dimensions),
            #[cfg(feature = "fastembed-engine")]
            EmbeddingBackend::FastEmbed { .. } => None,
        }
    }

    pub fn with_default_model(id: &str) -> Option<Self> {
        match id {
            "simple" => Some(EmbeddingBackend::Simple {
                model: default_simple_model(),
                dimensions: default_simple_dim(),
            }),
            #[cfg(feature = "fastembed-engine")]
            "fastembed" => Some(EmbeddingBackend::FastEmbed {
                model: default_fastembed_model(),
            }),
            _ => None,
        }
    }
}

impl Default for EmbeddingBackend {
    fn default() -> Self {
        #[cfg(feature = "fastembed-engine")]
        {
            EmbeddingBackend::FastEmbed {
                model: default_fastembed_model(),
            }
        }
        #[cfg(not(feature = "fastembed-engine"))]
        {
            EmbeddingBackend::Simple {
                model: default_simple_model(),
                dimensions: default_simple_dim(),
            }
        }
    }
}

/// Settings read from `config.json`; nothing is ever written back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Model used by `verify_connection`.
    #[serde(default = "default_verify_model")]
    pub verify_model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub embedding: EmbeddingBackend,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            verify_model: default_verify_model(),
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            embedding: EmbeddingBackend::default(),
        }
    }
}

impl AppConfig {
    /// Apply `GEMINI_MODEL`, `GEMINI_VERIFY_MODEL` and `GEMINI_API_BASE` on top
    /// of the file values. Blank variables are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        if let Some(model) = read(MODEL_ENV) {
            self.model = model;
        }
        if let Some(model) = read(VERIFY_MODEL_ENV) {
            self.verify_model = model;
        }
        if let Some(base) = read(API_BASE_ENV) {
            self.api_base = base;
        }
        self
    }
}

/// Read-only view of the configuration file.
pub struct ConfigManager {
    path: PathBuf,
    config: AppConfig,
}

impl ConfigManager {
    /// Create a manager rooted at `data_dir`. The JSON file will be located at
    /// `<data_dir>/config.json`. A missing or malformed file falls back to defaults.
    pub fn load(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = data_dir.as_ref().join(CONFIG_FILENAME);
        let config = if path.exists() {
            let bytes = fs::read(&path)?;
            serde_json::from_slice::<AppConfig>(&bytes).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "ignoring malformed config file");
                AppConfig::default()
            })
        } else {
            AppConfig::default()
        };

        Ok(Self { path, config })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the loaded configuration.
    pub fn current(&self) -> AppConfig {
        self.config.clone()
    }
}

pub fn available_backends() -> Vec<EmbeddingBackend> {
    #[cfg(feature = "fastembed-engine")]
    {
        vec![
            EmbeddingBackend::FastEmbed {
                model: default_fastembed_model(),
            },
            EmbeddingBackend::Simple {
                model: default_simple_model(),
                dimensions: default_simple_dim(),
            },
        ]
    }
    #[cfg(not(feature = "fastembed-engine"))]
    {
        vec![EmbeddingBackend::default()]
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_verify_model() -> String {
    DEFAULT_VERIFY_MODEL.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_simple_dim() -> usize {
    256
}

fn default_simple_model() -> String {
    crate::infrastructure::embeddings::SIMPLE_MODEL.to_string()
}

#[cfg(feature = "fastembed-engine")]
fn default_fastembed_model() -> String {
    crate::infrastructure::embeddings::DEFAULT_FASTEMBED_MODEL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_DEFAULT: &str = "gemini-ocr/simple-hash";

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::load(dir.path()).unwrap();
        let config = manager.current();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.verify_model, "gemini-flash");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{ "model": "gemini-2.5-pro", "embedding": { "backend": "simple", "dimensions": 64 } }"#,
        )
        .unwrap();

        let config = ConfigManager::load(dir.path()).unwrap().current();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.embedding.expected_dimensions(), Some(64));
        assert_eq!(config.embedding.model_name(), SIMPLE_DEFAULT);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), b"{ not json").unwrap();
        let config = ConfigManager::load(dir.path()).unwrap().current();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn loading_never_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nested");
        let manager = ConfigManager::load(&missing).unwrap();

        assert_eq!(manager.path(), missing.join(CONFIG_FILENAME));
        assert_eq!(manager.current(), AppConfig::default());
        assert!(!missing.exists());
    }

    #[test]
    fn unknown_backend_id_is_rejected() {
        assert!(EmbeddingBackend::with_default_model("word2vec").is_none());
    }

    #[test]
    fn env_overrides_take_precedence() {
        temp_env::with_vars(
            [
                (MODEL_ENV, Some("gemini-2.5-pro")),
                (VERIFY_MODEL_ENV, Some("gemini-2.0-flash")),
                (API_BASE_ENV, Some("  ")),
            ],
            || {
                let config = AppConfig::default().with_env_overrides();
                assert_eq!(config.model, "gemini-2.5-pro");
                assert_eq!(config.verify_model, "gemini-2.0-flash");
                assert_eq!(config.api_base, DEFAULT_API_BASE);
            },
        );
    }
}
