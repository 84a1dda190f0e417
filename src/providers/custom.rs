// User-supplied HTTP endpoint analyzer.
//
// Posts `{text, movies, sensitivity}` to `providerSpecific.endpoint` and
// passes the JSON reply through. Field names are accepted in either the
// camelCase or snake_case spelling. A reply without a confidence counts as
// zero confidence, so a configured fallback will merge in the rules.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::config::ProviderConfig;
use super::traits::{AnalysisRequest, SpoilerAnalyzer};
use crate::detection::result::{DetectionMethod, DetectionResult};
use crate::error::{status_error, DetectionError};
use crate::settings::models::Sensitivity;

pub struct CustomAnalyzer {
    client: Client,
}

impl CustomAnalyzer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SpoilerAnalyzer for CustomAnalyzer {
    async fn analyze(
        &self,
        request: &AnalysisRequest<'_>,
        config: &ProviderConfig,
    ) -> Result<DetectionResult, DetectionError> {
        let endpoint = config
            .specific_str("endpoint")
            .ok_or_else(|| DetectionError::Config("Custom AI endpoint not configured".into()))?;

        let mut builder = self.client.post(endpoint).json(&CustomRequest {
            text: request.text,
            movies: request.titles,
            sensitivity: request.sensitivity,
        });
        if let Some(key) = config.api_key() {
            builder = builder.bearer_auth(key);
        }
        if let Some(Value::Object(headers)) = config.provider_specific.get("headers") {
            for (name, value) in headers {
                match value.as_str() {
                    Some(v) => builder = builder.header(name.as_str(), v),
                    None => warn!(header = %name, "Ignoring non-string custom header"),
                }
            }
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(status_error("Custom API", response).await);
        }

        let reply: CustomReply = response.json().await?;
        let result = reply.into_result();
        debug!(
            endpoint = endpoint,
            is_spoiler = result.is_spoiler,
            confidence = result.confidence,
            "Custom endpoint verdict"
        );
        Ok(result)
    }
}

#[derive(Serialize)]
struct CustomRequest<'a> {
    text: &'a str,
    movies: &'a [String],
    sensitivity: Sensitivity,
}

#[derive(Deserialize)]
struct CustomReply {
    #[serde(rename = "isSpoiler", alias = "is_spoiler")]
    is_spoiler: bool,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default, alias = "matchedTitles", alias = "related_movies")]
    movies: Vec<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

impl CustomReply {
    fn into_result(self) -> DetectionResult {
        let mut result = DetectionResult::new(
            self.is_spoiler,
            self.confidence.unwrap_or(0.0),
            DetectionMethod::ai("custom"),
        )
        .with_titles(self.movies);
        result.reasoning = self.reasoning;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_reply() {
        let reply: CustomReply = serde_json::from_str(
            r#"{"isSpoiler": true, "confidence": 0.8, "movies": ["Origin"], "reasoning": "ending"}"#,
        )
        .unwrap();
        let result = reply.into_result();
        assert!(result.is_spoiler);
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.matched_titles, vec!["Origin".to_string()]);
        assert_eq!(result.method, DetectionMethod::ai("custom"));
    }

    #[test]
    fn snake_case_reply_without_confidence() {
        let reply: CustomReply =
            serde_json::from_str(r#"{"is_spoiler": false, "related_movies": []}"#).unwrap();
        let result = reply.into_result();
        assert!(!result.is_spoiler);
        assert_eq!(result.confidence, 0.0);
        assert!(result.reasoning.is_none());
    }

    #[test]
    fn reply_without_verdict_is_rejected() {
        assert!(serde_json::from_str::<CustomReply>(r#"{"confidence": 0.9}"#).is_err());
    }

    #[test]
    fn request_carries_sensitivity() {
        let titles = vec!["Origin".to_string()];
        let body = serde_json::to_value(CustomRequest {
            text: "x",
            movies: &titles,
            sensitivity: Sensitivity::High,
        })
        .unwrap();
        assert_eq!(body["sensitivity"], "high");
        assert_eq!(body["movies"][0], "Origin");
    }
}
