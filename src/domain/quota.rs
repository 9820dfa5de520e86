//! Detection of quota and rate-limit failures reported by the remote API.
//!
//! The service does not expose a structured error code for these, so the
//! decision is made on the error text. The marker list must stay exactly as is.

use super::{ClientError, Generated};

/// Sentence returned to callers in place of an answer when the quota is hit.
pub const QUOTA_LIMIT_MESSAGE: &str = "Gemini hits free limit, can't provide answers right now.";

const QUOTA_MARKERS: [&str; 7] = [
    "quota exceeded",
    "rate limit",
    "requests per day",
    "free limit",
    "429",
    "quota_exceeded",
    "resource_exhausted",
];

/// Case-insensitive check of an error message against the quota markers.
pub fn is_quota_message(message: &str) -> bool {
    let lowered = message.to_lowercase();
    QUOTA_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Turns a quota failure into [`Generated::QuotaLimited`]; any other error is
/// handed back untouched.
pub fn classify(err: ClientError) -> Result<Generated, ClientError> {
    if is_quota_message(&err.to_string()) {
        Ok(Generated::QuotaLimited(QUOTA_LIMIT_MESSAGE.to_string()))
    } else {
        Err(err)
    }
}
