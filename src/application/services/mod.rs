//! Service layer orchestrating the remote model and the embedding engine.

mod service_client;

pub use service_client::{
    EmbeddingEngine, GenerativeModel, ServiceClient, ServiceConfig, DEFAULT_MODEL,
    DEFAULT_VERIFY_MODEL,
};
