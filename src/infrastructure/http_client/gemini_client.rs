//! `generateContent` adapter implementing [`GenerativeModel`].

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::services::GenerativeModel;
use crate::domain::{ClientError, ContentPart, Credentials};

use super::handle_http_error;

/// Blocking client bound to one API key and endpoint.
pub struct GeminiHttpClient {
    base_url: String,
    credentials: Credentials,
    agent: ureq::Agent,
}

impl GeminiHttpClient {
    pub fn new(credentials: Credentials, base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            agent,
        }
    }

    fn generate_url(&self, model: &str) -> String {
        let model = model.trim().trim_start_matches("models/");
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text { text: &'a str },
    Inline { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

impl<'a> From<&'a ContentPart> for RequestPart<'a> {
    fn from(part: &'a ContentPart) -> Self {
        match part {
            ContentPart::Text(text) => RequestPart::Text { text },
            ContentPart::Image(image) => RequestPart::Inline {
                inline_data: InlineData {
                    mime_type: &image.mime_type,
                    data: STANDARD.encode(&image.bytes),
                },
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if it has any.
    fn into_text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let texts: Vec<String> = parts.into_iter().filter_map(|part| part.text).collect();
        (!texts.is_empty()).then(|| texts.concat())
    }
}

impl GenerativeModel for GeminiHttpClient {
    fn generate(&self, model: &str, parts: &[ContentPart]) -> Result<Option<String>, ClientError> {
        let url = self.generate_url(model);
        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: parts.iter().map(RequestPart::from).collect(),
            }],
        };

        debug!(%url, parts = parts.len(), "calling generateContent");
        let response = self
            .agent
            .post(&url)
            .set("x-goog-api-key", self.credentials.api_key())
            .send_json(&request)
            .map_err(handle_http_error)?;

        let payload: GenerateResponse = response.into_json().map_err(|err| {
            ClientError::remote(None, format!("failed to parse generateContent response: {err}"))
        })?;

        Ok(payload.into_text())
    }
}
