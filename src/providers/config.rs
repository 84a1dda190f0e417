// ProviderConfig — which remote analyzer to use and how to trust it.
//
// Loaded once at startup (persisted `aiConfig` block, overridden by env),
// replaced wholesale on update. Detection only ever reads a borrowed copy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    pub enabled: bool,
    /// `openai`, `huggingface`, `custom`, or `none`.
    #[serde(alias = "provider")]
    pub provider_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    /// Provider verdicts below this confidence are merged with the rules.
    #[serde(alias = "confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(alias = "fallback_to_rules")]
    pub fallback_to_rules: bool,
    /// Opaque per-provider options (custom endpoint, headers, labels).
    pub provider_specific: Map<String, Value>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider_name: "none".to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            fallback_to_rules: true,
            provider_specific: Map::new(),
        }
    }
}

impl ProviderConfig {
    /// Whether a remote provider should be consulted at all.
    pub fn is_active(&self) -> bool {
        let name = self.provider_name.trim();
        self.enabled && !name.is_empty() && !name.eq_ignore_ascii_case("none")
    }

    /// The API key, treating an empty string as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// A string-valued provider-specific option.
    pub fn specific_str(&self, key: &str) -> Option<&str> {
        self.provider_specific
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// The API key with everything but a short prefix masked, for display.
    pub fn redacted_key(&self) -> String {
        match self.api_key() {
            Some(key) => {
                let prefix: String = key.chars().take(4).collect();
                format!("{prefix}****")
            }
            None => "(not set)".to_string(),
        }
    }
}
