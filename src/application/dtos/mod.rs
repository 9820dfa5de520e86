use serde::{Deserialize, Serialize};

use crate::domain::{ConnectionStatus, Generated};

/// JSON projection of an `answer` or `extract_text` outcome.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResponse {
    pub model: String,
    pub language: String,
    pub text: String,
    pub quota_limited: bool,
}

impl GenerationResponse {
    pub fn new(model: impl Into<String>, language: impl Into<String>, outcome: Generated) -> Self {
        Self {
            model: model.into(),
            language: language.into(),
            quota_limited: outcome.is_quota_limited(),
            text: outcome.into_text(),
        }
    }
}

/// Connectivity report; `status` keeps the `true` / `false` / message shape.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
    pub model: String,
    pub status: ConnectionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingBackendOption {
    pub id: String,
    pub label: String,
    pub description: String,
    pub model: String,
    pub dimensions: Option<usize>,
    pub feature_gated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingBackendListResponse {
    pub active: String,
    pub options: Vec<EmbeddingBackendOption>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_outcomes_are_flagged() {
        let response = GenerationResponse::new(
            "gemini-2.5-flash",
            "English",
            Generated::QuotaLimited("limit".into()),
        );
        assert!(response.quota_limited);
        assert_eq!(response.text, "limit");
    }

    #[test]
    fn connection_report_serialises_status_inline() {
        let report = ConnectionReport {
            model: "gemini-flash".into(),
            status: ConnectionStatus::Failed,
        };
        assert_eq!(
            serde_json::to_value(report).unwrap(),
            serde_json::json!({ "model": "gemini-flash", "status": false })
        );
    }
}
