// HTTP client for the spoiler service.
//
// The service exposes four endpoints:
//   POST /match_movies    per-title similarity scores (the gate)
//   POST /predict_openai  LLM confirmation against candidate titles
//   POST /predict         single-shot confirmation, no title list
//   GET  /movies          the title catalog
//
// Movie ids are numeric on most deployments. We keep them as opaque strings
// internally and send anything that looks like an integer as a JSON number.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::confirmation::{parse_confirmation, Confirmation, SpoilerConfirmer};
use super::similarity::{align_scores, SimilarityScore, SimilarityScorer};
use crate::error::{status_error, DetectionError};
use crate::output::truncate_chars;
use crate::settings::models::MonitoredTitle;

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5000";

/// Client for the similarity / confirmation service.
pub struct SpoilerServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl SpoilerServiceClient {
    /// Create a client that shares an existing connection pool.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Single-shot confirmation via `POST /predict`, independent of titles.
    pub async fn predict(&self, text: &str) -> Result<bool, DetectionError> {
        let url = format!("{}/predict", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&PredictRequest { text })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error("Spoiler service /predict", response).await);
        }

        let body: PredictResponse = response.json().await?;
        interpret_predict(body)
    }

    /// Fetch the title catalog via `GET /movies`.
    pub async fn fetch_catalog(&self) -> Result<Vec<MonitoredTitle>, DetectionError> {
        let url = format!("{}/movies", self.base_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(status_error("Spoiler service /movies", response).await);
        }

        let records: Vec<CatalogRecord> = response.json().await?;
        debug!(count = records.len(), "Fetched title catalog");
        Ok(catalog_titles(records))
    }
}

#[async_trait]
impl SimilarityScorer for SpoilerServiceClient {
    async fn score(
        &self,
        text: &str,
        title_ids: &[String],
    ) -> Result<Vec<SimilarityScore>, DetectionError> {
        let url = format!("{}/match_movies", self.base_url);
        let request = MatchRequest {
            text,
            movie_ids: title_ids.iter().map(String::as_str).map(id_to_json).collect(),
        };

        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(status_error("Spoiler service /match_movies", response).await);
        }

        let matches: Vec<MovieMatch> = response.json().await?;
        let raw: Vec<(String, f64)> = matches
            .into_iter()
            .filter_map(|m| json_to_id(&m.movie_id).map(|id| (id, m.similarity)))
            .collect();
        let scores = align_scores(title_ids, &raw);

        debug!(
            titles = title_ids.len(),
            returned = raw.len(),
            text_preview = %truncate_chars(text, 50),
            "Scored similarity"
        );

        Ok(scores)
    }
}

#[async_trait]
impl SpoilerConfirmer for SpoilerServiceClient {
    async fn confirm(
        &self,
        text: &str,
        title_names: &[String],
    ) -> Result<Confirmation, DetectionError> {
        let url = format!("{}/predict_openai", self.base_url);
        let request = ConfirmRequest {
            text,
            movies: title_names,
        };

        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(status_error("Spoiler service /predict_openai", response).await);
        }

        let body = response.text().await?;
        let confirmation = parse_confirmation(&body)?;

        debug!(
            is_spoiler = confirmation.is_spoiler,
            matched_title = ?confirmation.matched_title,
            "Confirmation reply"
        );

        Ok(confirmation)
    }
}

/// Send numeric-looking ids as JSON numbers, everything else as strings.
fn id_to_json(id: &str) -> Value {
    match id.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::from(id),
    }
}

/// Normalize a numeric or string id from the service.
fn json_to_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// `{result}` may be a bool or a boolean-prefixed string; `{error}` wins.
fn interpret_predict(body: PredictResponse) -> Result<bool, DetectionError> {
    if let Some(error) = body.error {
        return Err(DetectionError::Remote(format!(
            "Spoiler service /predict reported: {error}"
        )));
    }
    match body.result {
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::String(s)) => parse_confirmation(&s).map(|c| c.is_spoiler),
        Some(other) => Err(DetectionError::Parse(format!(
            "unexpected /predict result: {other}"
        ))),
        None => Err(DetectionError::Parse(
            "/predict reply had neither result nor error".to_string(),
        )),
    }
}

/// Convert catalog records into monitored titles. Records without a
/// `movie_id` take their position in the list as id.
fn catalog_titles(records: Vec<CatalogRecord>) -> Vec<MonitoredTitle> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| MonitoredTitle {
            id: record
                .movie_id
                .as_ref()
                .and_then(json_to_id)
                .unwrap_or_else(|| index.to_string()),
            title: record.title,
            description: record.description.filter(|d| !d.trim().is_empty()),
        })
        .collect()
}

// --- Spoiler service request/response types ---

#[derive(Serialize)]
struct MatchRequest<'a> {
    text: &'a str,
    movie_ids: Vec<Value>,
}

#[derive(Deserialize)]
struct MovieMatch {
    movie_id: Value,
    similarity: f64,
}

#[derive(Serialize)]
struct ConfirmRequest<'a> {
    text: &'a str,
    movies: &'a [String],
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct PredictResponse {
    result: Option<Value>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct CatalogRecord {
    #[serde(default)]
    movie_id: Option<Value>,
    title: String,
    #[serde(default)]
    description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_are_sent_as_numbers() {
        assert_eq!(id_to_json("42"), Value::from(42));
        assert_eq!(id_to_json("tt0111161"), Value::from("tt0111161"));
    }

    #[test]
    fn match_response_accepts_mixed_ids() {
        let json = r#"[{"movie_id": 1, "similarity": 0.6}, {"movie_id": "b", "similarity": 0.1}]"#;
        let matches: Vec<MovieMatch> = serde_json::from_str(json).unwrap();
        let ids: Vec<Option<String>> = matches.iter().map(|m| json_to_id(&m.movie_id)).collect();
        assert_eq!(ids, vec![Some("1".to_string()), Some("b".to_string())]);
    }

    #[test]
    fn predict_result_variants() {
        let parse = |json: &str| interpret_predict(serde_json::from_str(json).unwrap());
        assert!(parse(r#"{"result": true}"#).unwrap());
        assert!(!parse(r#"{"result": "False"}"#).unwrap());
        assert!(matches!(
            parse(r#"{"error": "model offline"}"#),
            Err(DetectionError::Remote(_))
        ));
        assert!(matches!(parse(r#"{}"#), Err(DetectionError::Parse(_))));
        assert!(matches!(parse(r#"{"result": 3}"#), Err(DetectionError::Parse(_))));
    }

    #[test]
    fn catalog_uses_index_when_id_missing() {
        let json = r#"[
            {"title": "Origin", "description": "A heist in dreams"},
            {"movie_id": 17, "title": "Dune", "description": ""}
        ]"#;
        let records: Vec<CatalogRecord> = serde_json::from_str(json).unwrap();
        let titles = catalog_titles(records);
        assert_eq!(titles[0].id, "0");
        assert_eq!(titles[0].description.as_deref(), Some("A heist in dreams"));
        assert_eq!(titles[1].id, "17");
        assert!(titles[1].description.is_none());
    }

    #[test]
    fn match_request_body_shape() {
        let body = serde_json::to_value(MatchRequest {
            text: "the hero dies",
            movie_ids: ["7", "tt42"].into_iter().map(id_to_json).collect(),
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"text": "the hero dies", "movie_ids": [7, "tt42"]})
        );
    }

    #[test]
    fn confirm_request_body_shape() {
        let titles = vec!["Origin".to_string(), "Dune".to_string()];
        let body = serde_json::to_value(ConfirmRequest {
            text: "the hero dies",
            movies: &titles,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"text": "the hero dies", "movies": ["Origin", "Dune"]})
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = SpoilerServiceClient::with_client(reqwest::Client::new(), "http://x:5000/");
        assert_eq!(client.base_url(), "http://x:5000");
    }
}
