// Hybrid-merge orchestration — the canonical decision procedure.
//
// 1. AI disabled, or no provider configured: rule-based result, verbatim.
// 2. Provider succeeds with confidence at or above the threshold (or
//    fallback disabled): provider result, unmodified.
// 3. Provider succeeds below the threshold with fallback enabled: merge
//    with the rules (OR of verdicts, max of confidences, method=hybrid).
// 4. Provider fails: rule-based result if fallback is enabled, otherwise a
//    fail-open "not a spoiler" carrying the error.
//
// No path returns an error. Remote failures are not retried.

use tracing::{debug, warn};

use super::result::{DetectionMethod, DetectionResult};
use super::rules::RuleBasedDetector;
use crate::output::truncate_chars;
use crate::providers::config::ProviderConfig;
use crate::providers::registry::ProviderRegistry;
use crate::providers::traits::AnalysisRequest;
use crate::settings::models::Settings;

pub const DISABLED_REASON: &str = "spoiler detection disabled";

/// Sequences the rule-based detector and a remote provider into one verdict.
pub struct DetectionOrchestrator {
    registry: ProviderRegistry,
    rules: RuleBasedDetector,
}

impl DetectionOrchestrator {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            rules: RuleBasedDetector,
        }
    }

    /// Produce a verdict for `text` under the given snapshots.
    pub async fn evaluate(
        &self,
        text: &str,
        settings: &Settings,
        config: &ProviderConfig,
    ) -> DetectionResult {
        if !settings.enabled {
            return DetectionResult::negative(DetectionMethod::Rules).with_reasoning(DISABLED_REASON);
        }

        let rule_result =
            || self.rules.detect(text, &settings.monitored_titles, settings.sensitivity);

        if !config.is_active() {
            return rule_result();
        }

        let Some((kind, analyzer)) = self.registry.lookup(&config.provider_name) else {
            warn!(
                provider = %config.provider_name,
                "AI provider not found, falling back to rules"
            );
            return rule_result();
        };

        let titles = settings.title_names();
        let request = AnalysisRequest {
            text,
            titles: &titles,
            sensitivity: settings.sensitivity,
        };

        match analyzer.analyze(&request, config).await {
            Ok(result) if result.confidence < config.confidence_threshold && config.fallback_to_rules => {
                debug!(
                    provider = %kind,
                    confidence = result.confidence,
                    threshold = config.confidence_threshold,
                    "Provider confidence below threshold, merging with rules"
                );
                hybrid_merge(result, rule_result())
            }
            Ok(result) => result,
            Err(e) => {
                warn!(
                    provider = %kind,
                    error = %e,
                    text_preview = %truncate_chars(text, 50),
                    "AI spoiler detection failed"
                );
                if config.fallback_to_rules {
                    rule_result()
                } else {
                    DetectionResult::failed(DetectionMethod::ai(kind.as_str()), e.to_string())
                }
            }
        }
    }
}

/// Merge a low-confidence provider verdict with the rule-based verdict.
///
/// The merged verdict is the OR of both, the merged confidence is exactly
/// the max of both. Titles are unioned (provider first) and both
/// reasonings are kept.
pub fn hybrid_merge(provider: DetectionResult, rules: DetectionResult) -> DetectionResult {
    let mut titles = provider.matched_titles;
    for title in rules.matched_titles {
        if !titles.contains(&title) {
            titles.push(title);
        }
    }

    let reasoning = match (provider.reasoning, rules.reasoning) {
        (Some(p), Some(r)) => Some(format!("provider: {p}; rules: {r}")),
        (Some(p), None) => Some(format!("provider: {p}")),
        (None, Some(r)) => Some(format!("rules: {r}")),
        (None, None) => None,
    };

    DetectionResult {
        is_spoiler: provider.is_spoiler || rules.is_spoiler,
        confidence: provider.confidence.max(rules.confidence),
        matched_titles: titles,
        method: DetectionMethod::Hybrid,
        reasoning,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_or_and_max() {
        let provider = DetectionResult::new(false, 0.4, DetectionMethod::ai("openai"))
            .with_titles(vec!["Origin".into()])
            .with_reasoning("vague");
        let rules = DetectionResult::new(true, 0.7, DetectionMethod::Rules)
            .with_titles(vec!["Origin".into(), "Dune".into()]);

        let merged = hybrid_merge(provider, rules);
        assert!(merged.is_spoiler);
        assert_eq!(merged.confidence, 0.7);
        assert_eq!(merged.method, DetectionMethod::Hybrid);
        assert_eq!(merged.matched_titles, vec!["Origin".to_string(), "Dune".to_string()]);
        assert_eq!(merged.reasoning.as_deref(), Some("provider: vague"));
    }

    #[test]
    fn merge_of_two_negatives_stays_negative() {
        let merged = hybrid_merge(
            DetectionResult::new(false, 0.2, DetectionMethod::ai("custom")),
            DetectionResult::negative(DetectionMethod::Rules),
        );
        assert!(!merged.is_spoiler);
        assert_eq!(merged.confidence, 0.2);
        assert!(merged.reasoning.is_none());
    }
}
