use std::env;

use anyhow::{Context, Result};
use tracing::warn;

use crate::detection::Strategy;
use crate::providers::config::ProviderConfig;
use crate::providers::registry::ProviderKind;
use crate::providers::validation::validate_api_key;
use crate::remote::client::DEFAULT_SERVICE_URL;

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file is
/// loaded automatically at startup via dotenvy. Provider settings here
/// override the `aiConfig` block persisted in the settings database.
pub struct Config {
    pub db_path: String,
    /// Base URL of the similarity / confirmation service.
    pub service_url: String,
    /// Which orchestration strategy `check` uses by default.
    pub strategy: Strategy,
    pub provider_name: Option<String>,
    pub ai_enabled: Option<bool>,
    pub model: Option<String>,
    pub confidence_threshold: Option<f64>,
    pub fallback_to_rules: Option<bool>,
    pub openai_api_key: Option<String>,
    pub huggingface_api_key: Option<String>,
    pub custom_endpoint: Option<String>,
    pub custom_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let strategy = match env_string("SPOILERGUARD_STRATEGY") {
            Some(s) => Strategy::parse(&s).with_context(|| {
                format!("SPOILERGUARD_STRATEGY must be 'hybrid' or 'gated', got '{s}'")
            })?,
            None => Strategy::default(),
        };

        Ok(Self {
            db_path: env_string("SPOILERGUARD_DB_PATH")
                .unwrap_or_else(|| "./spoilerguard.db".to_string()),
            service_url: env_string("SPOILERGUARD_SERVICE_URL")
                .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string()),
            strategy,
            provider_name: env_string("SPOILERGUARD_PROVIDER"),
            ai_enabled: env_parse("SPOILERGUARD_AI_ENABLED")?,
            model: env_string("SPOILERGUARD_MODEL"),
            confidence_threshold: env_parse("SPOILERGUARD_CONFIDENCE_THRESHOLD")?,
            fallback_to_rules: env_parse("SPOILERGUARD_FALLBACK_TO_RULES")?,
            openai_api_key: env_string("OPENAI_API_KEY"),
            huggingface_api_key: env_string("HUGGINGFACE_API_KEY"),
            custom_endpoint: env_string("SPOILERGUARD_CUSTOM_ENDPOINT"),
            custom_api_key: env_string("SPOILERGUARD_CUSTOM_API_KEY"),
        })
    }

    /// Apply env overrides on top of the stored provider configuration.
    ///
    /// Naming a provider in the environment enables it unless
    /// SPOILERGUARD_AI_ENABLED says otherwise. The API key comes from the
    /// variable for whichever provider ends up selected.
    pub fn provider_config(&self, stored: ProviderConfig) -> ProviderConfig {
        let mut config = stored;

        if let Some(name) = &self.provider_name {
            config.provider_name = name.trim().to_ascii_lowercase();
            config.enabled = !config.provider_name.eq_ignore_ascii_case("none");
        }
        if let Some(enabled) = self.ai_enabled {
            config.enabled = enabled;
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(threshold) = self.confidence_threshold {
            config.confidence_threshold = threshold;
        }
        if let Some(fallback) = self.fallback_to_rules {
            config.fallback_to_rules = fallback;
        }
        if let Some(endpoint) = &self.custom_endpoint {
            config
                .provider_specific
                .insert("endpoint".to_string(), endpoint.clone().into());
        }

        let env_key = match ProviderKind::from_name(&config.provider_name) {
            Some(ProviderKind::OpenAi) => self.openai_api_key.as_ref(),
            Some(ProviderKind::HuggingFace) => self.huggingface_api_key.as_ref(),
            Some(ProviderKind::Custom) => self.custom_api_key.as_ref(),
            None => None,
        };
        if let Some(key) = env_key {
            config.api_key = Some(key.clone());
        }

        config
    }

    /// Check that an active provider has what it needs before it is used.
    /// Inactive configurations always pass; detection uses the rules.
    pub fn require_provider(config: &ProviderConfig) -> Result<()> {
        if !config.is_active() {
            return Ok(());
        }

        let Some(kind) = ProviderKind::from_name(&config.provider_name) else {
            anyhow::bail!(
                "Unknown AI provider '{}'. Use openai, huggingface, custom, or none.",
                config.provider_name
            );
        };

        if !(0.0..=1.0).contains(&config.confidence_threshold) {
            anyhow::bail!(
                "Confidence threshold must be between 0 and 1, got {}",
                config.confidence_threshold
            );
        }

        match kind {
            ProviderKind::Custom => {
                if config.specific_str("endpoint").is_none() {
                    anyhow::bail!(
                        "Custom provider selected but no endpoint configured.\n\
                         Set SPOILERGUARD_CUSTOM_ENDPOINT in your .env file."
                    );
                }
                Ok(())
            }
            ProviderKind::OpenAi | ProviderKind::HuggingFace => {
                let key = config.api_key().unwrap_or_default();
                if !validate_api_key(kind.as_str(), key) {
                    let var = match kind {
                        ProviderKind::OpenAi => "OPENAI_API_KEY",
                        _ => "HUGGINGFACE_API_KEY",
                    };
                    anyhow::bail!(
                        "{var} is missing or malformed for the {kind} provider.\n\
                         Add it to your .env file or run `spoilerguard validate-key {kind} <key>`."
                    );
                }
                Ok(())
            }
        }
    }

    /// Log why an active provider can't be used, without failing. Detection
    /// still runs: the orchestrator falls back to the rules (or fails open)
    /// on its own. Returns whether the provider looks usable.
    pub fn warn_if_unusable(config: &ProviderConfig) -> bool {
        match Self::require_provider(config) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    provider = %config.provider_name,
                    error = %e,
                    "AI provider not usable, falling back per fallbackToRules"
                );
                false
            }
        }
    }
}

/// A non-empty environment variable.
fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// A typed environment variable; unparseable values are an error.
fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid value for {name} ('{raw}'): {e}")),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_config() -> Config {
        Config {
            db_path: "./spoilerguard.db".into(),
            service_url: DEFAULT_SERVICE_URL.into(),
            strategy: Strategy::Hybrid,
            provider_name: None,
            ai_enabled: None,
            model: None,
            confidence_threshold: None,
            fallback_to_rules: None,
            openai_api_key: None,
            huggingface_api_key: None,
            custom_endpoint: None,
            custom_api_key: None,
        }
    }

    #[test]
    fn no_overrides_keeps_stored_block() {
        let stored = ProviderConfig {
            enabled: true,
            provider_name: "custom".into(),
            confidence_threshold: 0.4,
            ..Default::default()
        };
        assert_eq!(empty_config().provider_config(stored.clone()), stored);
    }

    #[test]
    fn naming_a_provider_enables_it_and_picks_its_key() {
        let config = Config {
            provider_name: Some("OpenAI".into()),
            openai_api_key: Some("sk-abcdefghijklmnopqrstu".into()),
            huggingface_api_key: Some("hf_abcdefghij".into()),
            ..empty_config()
        };
        let provider = config.provider_config(ProviderConfig::default());
        assert!(provider.is_active());
        assert_eq!(provider.provider_name, "openai");
        assert_eq!(provider.api_key(), Some("sk-abcdefghijklmnopqrstu"));
        assert!(Config::require_provider(&provider).is_ok());
    }

    #[test]
    fn explicit_disable_wins() {
        let config = Config {
            provider_name: Some("openai".into()),
            ai_enabled: Some(false),
            ..empty_config()
        };
        assert!(!config.provider_config(ProviderConfig::default()).is_active());
    }

    #[test]
    fn require_provider_rejects_bad_setups() {
        let bad_key = ProviderConfig {
            enabled: true,
            provider_name: "openai".into(),
            api_key: Some("sk-short".into()),
            ..Default::default()
        };
        assert!(Config::require_provider(&bad_key).is_err());

        let no_endpoint = ProviderConfig {
            enabled: true,
            provider_name: "custom".into(),
            ..Default::default()
        };
        assert!(Config::require_provider(&no_endpoint).is_err());

        let unknown = ProviderConfig {
            enabled: true,
            provider_name: "gemini".into(),
            ..Default::default()
        };
        assert!(Config::require_provider(&unknown).is_err());

        assert!(Config::require_provider(&ProviderConfig::default()).is_ok());
    }

    #[test]
    fn unusable_provider_is_reported_not_fatal() {
        let unknown = ProviderConfig {
            enabled: true,
            provider_name: "gemini".into(),
            ..Default::default()
        };
        assert!(!Config::warn_if_unusable(&unknown));

        let missing_key = ProviderConfig {
            enabled: true,
            provider_name: "openai".into(),
            ..Default::default()
        };
        assert!(!Config::warn_if_unusable(&missing_key));

        assert!(Config::warn_if_unusable(&ProviderConfig::default()));
    }

    #[test]
    fn fallback_follows_stored_block_unless_env_overrides() {
        let stored = ProviderConfig::default();
        assert!(empty_config().provider_config(stored.clone()).fallback_to_rules);

        let config = Config {
            fallback_to_rules: Some(false),
            ..empty_config()
        };
        assert!(!config.provider_config(stored).fallback_to_rules);

        let opted_out = ProviderConfig {
            fallback_to_rules: false,
            ..Default::default()
        };
        assert!(!empty_config().provider_config(opted_out).fallback_to_rules);
    }

    #[test]
    fn custom_endpoint_goes_into_provider_specific() {
        let config = Config {
            provider_name: Some("custom".into()),
            custom_endpoint: Some("http://localhost:9000/analyze".into()),
            ..empty_config()
        };
        let provider = config.provider_config(ProviderConfig::default());
        assert_eq!(
            provider.specific_str("endpoint"),
            Some("http://localhost:9000/analyze")
        );
        assert!(Config::require_provider(&provider).is_ok());
    }
}
