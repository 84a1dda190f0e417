// Hugging Face Inference API analyzer — hosted text classification.
//
// Classification models answer with label/score pairs, either flat
// (`[{label, score}]`) or nested one level per input (`[[{label, score}]]`).
// The label that means "spoiler" depends on the model, so it is
// configurable via `providerSpecific.spoiler_label` (default "SPOILER").
// Models do not name titles, so matched titles come from a lexical scan.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::ProviderConfig;
use super::traits::{AnalysisRequest, SpoilerAnalyzer};
use crate::detection::result::{DetectionMethod, DetectionResult};
use crate::error::{status_error, DetectionError};

pub const HUGGINGFACE_API_BASE: &str = "https://api-inference.huggingface.co/models/";
pub const DEFAULT_HF_MODEL: &str = "cardiffnlp/twitter-roberta-base-sentiment-latest";
const DEFAULT_SPOILER_LABEL: &str = "SPOILER";
const SPOILER_SCORE_CUTOFF: f64 = 0.5;

/// Hugging Face classification-model analyzer.
pub struct HuggingFaceAnalyzer {
    client: Client,
}

impl HuggingFaceAnalyzer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SpoilerAnalyzer for HuggingFaceAnalyzer {
    async fn analyze(
        &self,
        request: &AnalysisRequest<'_>,
        config: &ProviderConfig,
    ) -> Result<DetectionResult, DetectionError> {
        let api_key = config
            .api_key()
            .ok_or_else(|| DetectionError::Config("HuggingFace API key not configured".into()))?;

        let base = config.specific_str("api_base").unwrap_or(HUGGINGFACE_API_BASE);
        let url = format!("{}{}", base, model_name(config));

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&InferenceRequest {
                inputs: request.text,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error("HuggingFace API", response).await);
        }

        let reply: InferenceResponse = response.json().await?;
        let label = config
            .specific_str("spoiler_label")
            .unwrap_or(DEFAULT_SPOILER_LABEL);
        let titles = crate::detection::rules::mentioned_titles_by_name(request.text, request.titles);

        let result = classify(reply, label, titles)?;
        debug!(
            model = model_name(config),
            is_spoiler = result.is_spoiler,
            confidence = result.confidence,
            "HuggingFace verdict"
        );
        Ok(result)
    }
}

/// The model to call: `providerSpecific.model`, then the configured model,
/// then the default classification model. OpenAI chat model names are
/// never valid here.
fn model_name(config: &ProviderConfig) -> &str {
    if let Some(model) = config.specific_str("model") {
        return model;
    }
    let model = config.model.trim();
    if model.is_empty() || model.starts_with("gpt-") {
        DEFAULT_HF_MODEL
    } else {
        model
    }
}

/// Turn label scores into a verdict for the given spoiler label.
fn classify(
    reply: InferenceResponse,
    spoiler_label: &str,
    titles: Vec<String>,
) -> Result<DetectionResult, DetectionError> {
    let scores = match reply {
        InferenceResponse::Nested(mut outer) => {
            if outer.is_empty() {
                Vec::new()
            } else {
                outer.swap_remove(0)
            }
        }
        InferenceResponse::Flat(scores) => scores,
    };

    let score = scores
        .iter()
        .find(|s| s.label.eq_ignore_ascii_case(spoiler_label))
        .map(|s| s.score)
        .ok_or_else(|| {
            DetectionError::Parse(format!(
                "classification reply has no '{spoiler_label}' label"
            ))
        })?;

    let is_spoiler = score >= SPOILER_SCORE_CUTOFF;
    Ok(
        DetectionResult::new(is_spoiler, score, DetectionMethod::ai("huggingface"))
            .with_titles(titles)
            .with_reasoning(format!("{spoiler_label} score {score:.2}")),
    )
}

// --- Inference API request/response types ---

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

#[derive(Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}
