use std::fmt;

use serde::{Serialize, Serializer};

use super::ClientError;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// API key used to authenticate against the generative API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ClientError> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(ClientError::configuration("API key cannot be empty"));
        }
        Ok(Self { api_key })
    }

    /// Read the key from `GEMINI_API_KEY`. Missing or blank values fail fast.
    pub fn from_env() -> Result<Self, ClientError> {
        let value = std::env::var(API_KEY_ENV).map_err(|_| {
            ClientError::configuration(format!("{API_KEY_ENV} environment variable is not set"))
        })?;
        Self::new(value)
            .map_err(|_| ClientError::configuration(format!("{API_KEY_ENV} is empty")))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// A decoded, upload-ready image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// One ordered piece of a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    Image(ImagePayload),
}

impl ContentPart {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

/// Result of a generation call that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Generated {
    /// Text produced by the model (possibly empty).
    Text(String),
    /// The call hit the free quota; carries the user-facing sentence.
    QuotaLimited(String),
}

impl Generated {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) | Self::QuotaLimited(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) | Self::QuotaLimited(text) => text,
        }
    }

    pub fn is_quota_limited(&self) -> bool {
        matches!(self, Self::QuotaLimited(_))
    }
}

impl fmt::Display for Generated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text handed to the embedding engine: one string or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingInput {
    Single(String),
    Batch(Vec<String>),
}

impl From<&str> for EmbeddingInput {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for EmbeddingInput {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for EmbeddingInput {
    fn from(value: Vec<String>) -> Self {
        Self::Batch(value)
    }
}

impl From<Vec<&str>> for EmbeddingInput {
    fn from(value: Vec<&str>) -> Self {
        Self::Batch(value.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for EmbeddingInput {
    fn from(value: &[&str]) -> Self {
        Self::Batch(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Vectors returned by `get_embeddings`, shaped like the input.
///
/// A failed computation is reported as an empty batch, which serialises to `[]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Embeddings {
    Single(Vec<f32>),
    Batch(Vec<Vec<f32>>),
}

impl Embeddings {
    pub fn empty() -> Self {
        Self::Batch(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(vector) => vector.is_empty(),
            Self::Batch(vectors) => vectors.is_empty(),
        }
    }

    pub fn into_vectors(self) -> Vec<Vec<f32>> {
        match self {
            Self::Single(vector) if vector.is_empty() => Vec::new(),
            Self::Single(vector) => vec![vector],
            Self::Batch(vectors) => vectors,
        }
    }
}

/// Outcome of a connectivity check.
///
/// Serialises to `true`, `false`, or the quota sentence, matching the
/// boolean-or-string contract callers rely on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Failed,
    QuotaLimited(String),
}

impl Serialize for ConnectionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Connected => serializer.serialize_bool(true),
            Self::Failed => serializer.serialize_bool(false),
            Self::QuotaLimited(message) => serializer.serialize_str(message),
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => f.write_str("true"),
            Self::Failed => f.write_str("false"),
            Self::QuotaLimited(message) => f.write_str(message),
        }
    }
}
