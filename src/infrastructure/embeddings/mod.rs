pub mod simple_engine;

#[cfg(feature = "fastembed-engine")]
pub mod fastembed_engine;

#[cfg(feature = "fastembed-engine")]
pub use fastembed_engine::{FastEmbedEngine, DEFAULT_FASTEMBED_MODEL};
pub use simple_engine::{SimpleEmbedEngine, SIMPLE_MODEL};
