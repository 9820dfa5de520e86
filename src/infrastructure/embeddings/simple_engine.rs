use ahash::AHasher;
use std::hash::{Hash, Hasher};

use crate::{application::services::EmbeddingEngine, domain::ClientError};

/// Default label of the hash embedder.
pub const SIMPLE_MODEL: &str = "gemini-ocr/simple-hash";

/// A lightweight, deterministic embedding engine that hashes tokens into a fixed-size vector.
/// This is not meant for production-grade semantic search, but it keeps the client functional
/// without downloading external models or shipping native dependencies.
pub struct SimpleEmbedEngine {
    model_name: String,
    dimensions: usize,
}

impl SimpleEmbedEngine {
    pub fn try_new(model_name: impl Into<String>, dimensions: usize) -> Result<Self, ClientError> {
        if dimensions == 0 {
            return Err(ClientError::configuration(
                "embedding dimensions must be greater than zero",
            ));
        }
        let dims = dimensions.clamp(8, 4096);
        Ok(Self {
            model_name: model_name.into(),
            dimensions: dims,
        })
    }

    fn tokenize<'a>(&self, text: &'a str) -> impl Iterator<Item = &'a str> {
        text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .filter(move |token| !token.is_empty())
    }

    fn hash_token(&self, token: &str) -> usize {
        let mut hasher = AHasher::default();
        token.to_lowercase().hash(&mut hasher);
        hasher.finish() as usize
    }

    fn embed_internal(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in self.tokenize(text) {
            let idx = self.hash_token(token) % self.dimensions;
            vector[idx] += 1.0;
        }

        // L2 normalize to keep scores in [-1, 1]
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        vector
    }
}

impl Default for SimpleEmbedEngine {
    fn default() -> Self {
        Self {
            model_name: SIMPLE_MODEL.to_string(),
            dimensions: 256,
        }
    }
}

impl EmbeddingEngine for SimpleEmbedEngine {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ClientError> {
        Ok(texts.iter().map(|text| self.embed_internal(text)).collect())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dims(&self) -> Option<usize> {
        Some(self.dimensions)
    }
}
