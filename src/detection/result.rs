// DetectionResult — the single unit of output for one text.
//
// Every detector and every orchestration path produces one of these, and
// nothing else crosses into the presentation layer. Confidence is clamped
// to [0, 1] at construction.

use serde::{Deserialize, Serialize};

/// How a verdict was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DetectionMethod {
    /// Local keyword/pattern heuristics only.
    Rules,
    /// A remote analyzer, tagged with its provider name (`ai-openai`, ...).
    Ai(String),
    /// A remote verdict merged with the rule-based verdict.
    Hybrid,
}

impl DetectionMethod {
    pub fn ai(provider: &str) -> Self {
        DetectionMethod::Ai(provider.to_string())
    }
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionMethod::Rules => write!(f, "rules"),
            DetectionMethod::Ai(provider) => write!(f, "ai-{provider}"),
            DetectionMethod::Hybrid => write!(f, "hybrid"),
        }
    }
}

impl From<DetectionMethod> for String {
    fn from(method: DetectionMethod) -> Self {
        method.to_string()
    }
}

impl TryFrom<String> for DetectionMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "rules" => Ok(DetectionMethod::Rules),
            "hybrid" => Ok(DetectionMethod::Hybrid),
            other => match other.strip_prefix("ai-") {
                Some(provider) if !provider.is_empty() => Ok(DetectionMethod::ai(provider)),
                _ => Err(format!("unknown detection method: {other}")),
            },
        }
    }
}

/// The verdict for a single piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub is_spoiler: bool,
    /// Always within [0, 1].
    pub confidence: f64,
    /// Titles (names or ids) the verdict relates to.
    pub matched_titles: Vec<String>,
    pub method: DetectionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetectionResult {
    pub fn new(is_spoiler: bool, confidence: f64, method: DetectionMethod) -> Self {
        Self {
            is_spoiler,
            confidence: clamp_confidence(confidence),
            matched_titles: Vec::new(),
            method,
            reasoning: None,
            error: None,
        }
    }

    /// A "not a spoiler" verdict with zero confidence.
    pub fn negative(method: DetectionMethod) -> Self {
        Self::new(false, 0.0, method)
    }

    /// The fail-open result: not a spoiler, zero confidence, error recorded.
    pub fn failed(method: DetectionMethod, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::negative(method)
        }
    }

    pub fn with_titles(mut self, titles: Vec<String>) -> Self {
        self.matched_titles = titles;
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }
}

/// Clamp a confidence into [0, 1]. NaN counts as no confidence.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_display() {
        assert_eq!(DetectionMethod::Rules.to_string(), "rules");
        assert_eq!(DetectionMethod::ai("openai").to_string(), "ai-openai");
        assert_eq!(DetectionMethod::Hybrid.to_string(), "hybrid");
    }

    #[test]
    fn method_parses_back() {
        assert_eq!(
            DetectionMethod::try_from("ai-huggingface".to_string()),
            Ok(DetectionMethod::ai("huggingface"))
        );
        assert!(DetectionMethod::try_from("ai-".to_string()).is_err());
        assert!(DetectionMethod::try_from("magic".to_string()).is_err());
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(DetectionResult::new(true, 1.7, DetectionMethod::Rules).confidence, 1.0);
        assert_eq!(DetectionResult::new(true, -0.2, DetectionMethod::Rules).confidence, 0.0);
        assert_eq!(
            DetectionResult::new(true, f64::NAN, DetectionMethod::Rules).confidence,
            0.0
        );
    }

    #[test]
    fn serializes_camel_case_with_method_string() {
        let result = DetectionResult::new(true, 0.9, DetectionMethod::ai("openai"))
            .with_titles(vec!["Origin".into()]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isSpoiler"], true);
        assert_eq!(json["method"], "ai-openai");
        assert_eq!(json["matchedTitles"][0], "Origin");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failed_result_is_fail_open() {
        let result = DetectionResult::failed(DetectionMethod::ai("custom"), "boom");
        assert!(!result.is_spoiler);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.error.as_deref(), Some("boom"));
    }
}
