//! Application layer wiring DTOs and the service client.

pub mod dtos;
pub mod services;

pub use dtos::{
    ConnectionReport, EmbeddingBackendListResponse, EmbeddingBackendOption, GenerationResponse,
};
pub use services::ServiceClient;
