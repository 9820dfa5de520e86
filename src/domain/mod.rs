//! Domain layer: error taxonomy, value types and quota classification.

pub mod errors;
pub mod models;
pub mod quota;

pub use errors::ClientError;
pub use models::{
    ConnectionStatus, ContentPart, Credentials, EmbeddingInput, Embeddings, Generated,
    ImagePayload, API_KEY_ENV,
};
pub use quota::{classify, is_quota_message, QUOTA_LIMIT_MESSAGE};
