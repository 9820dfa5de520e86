use std::str::FromStr;

use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};
use parking_lot::Mutex;
use tracing::info;

use crate::{application::services::EmbeddingEngine, domain::ClientError};

/// Pretrained sentence-transformer loaded when no other model is configured.
///
/// The id is fastembed's model code for `all-mpnet-base-v2` (768 dimensions).
pub const DEFAULT_FASTEMBED_MODEL: &str = "Xenova/all-mpnet-base-v2";

/// Embedding engine backed by `fastembed`'s `TextEmbedding`.
///
/// The engine keeps a single `TextEmbedding` instance behind a `Mutex`, which
/// allows us to reuse the loaded model without cloning heavyweight resources.
pub struct FastEmbedEngine {
    model_label: String,
    dimensions: usize,
    inner: Mutex<TextEmbedding>,
}

impl FastEmbedEngine {
    /// Load the given model by its fastembed model code (for example
    /// `Xenova/all-mpnet-base-v2`).
    /// The first call may download the weights.
    pub fn try_new(model_name: impl AsRef<str>) -> Result<Self, ClientError> {
        let label = model_name.as_ref().trim();
        if label.is_empty() {
            return Err(ClientError::configuration(
                "fastembed model name cannot be empty",
            ));
        }

        let embedding_model = EmbeddingModel::from_str(label).map_err(|err| {
            ClientError::configuration(format!("failed to parse fastembed model `{label}`: {err}"))
        })?;

        let model_info = TextEmbedding::get_model_info(&embedding_model).map_err(|err| {
            ClientError::embedding(format!(
                "unable to read metadata for fastembed model `{label}`: {err}"
            ))
        })?;
        let dimensions = model_info.dim;

        info!(model = label, dimensions, "loading embedding model");
        let init_options = TextInitOptions::new(embedding_model.clone());
        let text_embedding = TextEmbedding::try_new(init_options).map_err(|err| {
            ClientError::embedding(format!(
                "failed to initialise fastembed model `{label}`: {err}"
            ))
        })?;

        Ok(Self {
            model_label: label.to_string(),
            dimensions,
            inner: Mutex::new(text_embedding),
        })
    }
}

impl EmbeddingEngine for FastEmbedEngine {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ClientError> {
        let mut embedder = self.inner.lock();
        let embeddings = embedder
            .embed(texts.to_vec(), None)
            .map_err(|err| ClientError::embedding(format!("fastembed inference failed: {err}")))?;

        if let Some(vector) = embeddings.iter().find(|v| v.len() != self.dimensions) {
            return Err(ClientError::embedding(format!(
                "unexpected embedding dimension (expected {}, got {})",
                self.dimensions,
                vector.len()
            )));
        }

        Ok(embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model_label
    }

    fn dims(&self) -> Option<usize> {
        Some(self.dimensions)
    }
}
