//! HTTP client for the Gemini generative language REST API.
//!
//! Calls are blocking and go through a single shared `ureq` agent. Error
//! bodies are folded into [`ClientError::Remote`] with the status code kept in
//! the message, since quota detection works on that text.

mod gemini_client;

pub use gemini_client::GeminiHttpClient;

use serde::Deserialize;

use crate::domain::ClientError;

/// Public endpoint of the generative language API.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Default overall timeout for a single request, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Error envelope returned by Google APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Convert `ureq` failures into client errors.
pub fn handle_http_error(error: ureq::Error) -> ClientError {
    match error {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            ClientError::remote(Some(code), describe_status(code, &body))
        }
        ureq::Error::Transport(transport) => {
            ClientError::remote(None, format!("transport error: {transport}"))
        }
    }
}

fn describe_status(code: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error }) if error.status.is_empty() => {
            format!("{code}: {}", error.message)
        }
        Ok(ErrorEnvelope { error }) => format!("{code} {}: {}", error.status, error.message),
        Err(_) if body.trim().is_empty() => format!("HTTP {code}"),
        Err(_) => format!("HTTP {code}: {}", body.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_envelope_is_flattened() {
        let body = r#"{"error":{"code":429,"message":"You exceeded your current quota","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            describe_status(429, body),
            "429 RESOURCE_EXHAUSTED: You exceeded your current quota"
        );
    }

    #[test]
    fn envelope_without_status_keeps_the_code() {
        let body = r#"{"error":{"code":400,"message":"bad request"}}"#;
        assert_eq!(describe_status(400, body), "400: bad request");
    }

    #[test]
    fn non_json_bodies_are_kept_verbatim() {
        assert_eq!(describe_status(502, "Bad Gateway\n"), "HTTP 502: Bad Gateway");
        assert_eq!(describe_status(503, ""), "HTTP 503");
    }
}
