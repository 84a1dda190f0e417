// Detection errors — the typed failures a remote stage can produce.
//
// These never reach the presentation layer. The orchestrators catch them and
// convert them into a DetectionResult (rule-based fallback or an explicit
// `error` field). Application plumbing (CLI, settings store) uses anyhow.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectionError {
    /// Missing or invalid credential/endpoint. Fatal to that provider only.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport failure or non-success HTTP status.
    #[error("remote error: {0}")]
    Remote(String),

    /// The remote answered, but not in a shape we understand.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for DetectionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DetectionError::Parse(err.to_string())
        } else {
            DetectionError::Remote(err.to_string())
        }
    }
}

/// Build a Remote error from a non-success HTTP response.
pub(crate) async fn status_error(service: &str, response: reqwest::Response) -> DetectionError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    DetectionError::Remote(format!("{service} returned {status}: {body}"))
}
