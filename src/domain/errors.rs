use thiserror::Error;

/// Errors surfaced by the client and its adapters.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Required configuration (credentials, settings) is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The image handed to OCR could not be read or decoded.
    #[error("image load error: {0}")]
    ImageLoad(String),

    /// The remote generative API rejected the call or could not be reached.
    ///
    /// The message is kept verbatim so callers see what the service reported.
    #[error("{message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },

    /// The embedding engine failed to produce vectors.
    #[error("embedding failure: {0}")]
    Embedding(String),

    /// Any other unexpected failure.
    #[error("unexpected error: {0}")]
    Other(String),
}

impl ClientError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageLoad(msg.into())
    }

    pub fn remote(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: msg.into(),
        }
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// HTTP status reported by the remote API, if the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => *status,
            _ => None,
        }
    }
}
