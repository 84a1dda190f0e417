// OpenAI chat-completions analyzer.
//
// The model is instructed to answer with JSON only, using exactly the keys
// `is_spoiler`, `confidence`, `related_movies` and `reasoning`. Anything
// else is a parse failure so the orchestrator can fall back.
//
// API docs: https://platform.openai.com/docs/api-reference/chat

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::ProviderConfig;
use super::traits::{AnalysisRequest, SpoilerAnalyzer};
use crate::detection::result::{DetectionMethod, DetectionResult};
use crate::error::{status_error, DetectionError};
use crate::output::truncate_chars;

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_PROMPT: &str =
    "You are a spoiler detection system. Analyze text for spoilers and respond with JSON only.";

/// OpenAI-backed spoiler analyzer.
pub struct OpenAiAnalyzer {
    client: Client,
}

impl OpenAiAnalyzer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SpoilerAnalyzer for OpenAiAnalyzer {
    async fn analyze(
        &self,
        request: &AnalysisRequest<'_>,
        config: &ProviderConfig,
    ) -> Result<DetectionResult, DetectionError> {
        let api_key = config
            .api_key()
            .ok_or_else(|| DetectionError::Config("OpenAI API key not configured".into()))?;
        let url = config.specific_str("api_url").unwrap_or(OPENAI_API_URL);

        let body = ChatRequest {
            model: &config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_prompt(request.text, request.titles),
                },
            ],
            max_tokens: 150,
            temperature: 0.1,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error("OpenAI API", response).await);
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DetectionError::Parse("OpenAI reply had no message content".into()))?;

        let result = parse_verdict(&content)?;

        debug!(
            is_spoiler = result.is_spoiler,
            confidence = result.confidence,
            text_preview = %truncate_chars(request.text, 50),
            "OpenAI verdict"
        );

        Ok(result)
    }
}

/// Build the user prompt listing the candidate titles.
pub fn build_prompt(text: &str, titles: &[String]) -> String {
    format!(
        "Analyze this text for spoilers related to these movies/shows: {}\n\n\
         Text to analyze: \"{}\"\n\n\
         Respond with JSON in this exact format:\n\
         {{\n    \
             \"is_spoiler\": boolean,\n    \
             \"confidence\": number (0.0-1.0),\n    \
             \"related_movies\": array of mentioned movies,\n    \
             \"reasoning\": string explaining the decision\n\
         }}\n\n\
         Consider spoilers to be: plot reveals, character deaths, endings, \
         major plot twists, episode-specific details.",
        titles.join(", "),
        text
    )
}

/// Parse the model's JSON verdict into a DetectionResult.
pub fn parse_verdict(content: &str) -> Result<DetectionResult, DetectionError> {
    let json = strip_code_fence(content);
    let verdict: ModelVerdict = serde_json::from_str(json).map_err(|e| {
        DetectionError::Parse(format!(
            "Failed to parse AI response ({e}): {}",
            truncate_chars(json, 80)
        ))
    })?;

    Ok(
        DetectionResult::new(verdict.is_spoiler, verdict.confidence, DetectionMethod::ai("openai"))
            .with_titles(verdict.related_movies)
            .with_reasoning(verdict.reasoning),
    )
}

/// Models sometimes wrap JSON in a markdown fence despite instructions.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line
    let inner = inner.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
    inner.trim_end().trim_end_matches("```").trim()
}

// --- OpenAI request/response types ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelVerdict {
    is_spoiler: bool,
    confidence: f64,
    related_movies: Vec<String>,
    reasoning: String,
}
