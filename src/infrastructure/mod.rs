//! Infrastructure layer wiring concrete adapters (HTTP, embeddings, images).

pub mod embeddings;
pub mod http_client;
pub mod imaging;

#[cfg(feature = "fastembed-engine")]
pub use embeddings::FastEmbedEngine;
pub use embeddings::SimpleEmbedEngine;
pub use http_client::GeminiHttpClient;
pub use imaging::load_image;
