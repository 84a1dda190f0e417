// Gated-confirmation pipeline — the cost-controlled two-stage strategy.
//
// Stage 1 asks the similarity service how related the text is to each
// monitored title. If no title reaches the sensitivity's gate threshold the
// text is "not a spoiler" and stage 2 is never called. Otherwise the
// confirmation service alone decides the verdict for the candidate titles.
//
// Failures in either stage fall back to the rules when configured, and
// otherwise fail open ("not a spoiler" with the error recorded).

use std::sync::Arc;

use tracing::{debug, warn};

use super::orchestrator::DISABLED_REASON;
use super::result::{DetectionMethod, DetectionResult};
use super::rules::RuleBasedDetector;
use crate::error::DetectionError;
use crate::remote::confirmation::SpoilerConfirmer;
use crate::remote::similarity::{
    gate_passes, max_similarity, GateThresholds, SimilarityScore, SimilarityScorer,
};
use crate::settings::models::Settings;

pub const GATED_METHOD: &str = "gated";

pub struct GatedPipeline {
    similarity: Arc<dyn SimilarityScorer>,
    confirmer: Arc<dyn SpoilerConfirmer>,
    thresholds: GateThresholds,
    fallback_to_rules: bool,
}

impl GatedPipeline {
    pub fn new(similarity: Arc<dyn SimilarityScorer>, confirmer: Arc<dyn SpoilerConfirmer>) -> Self {
        Self {
            similarity,
            confirmer,
            thresholds: GateThresholds::default(),
            fallback_to_rules: false,
        }
    }

    pub fn with_thresholds(mut self, thresholds: GateThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_fallback_to_rules(mut self, fallback: bool) -> Self {
        self.fallback_to_rules = fallback;
        self
    }

    pub fn thresholds(&self) -> &GateThresholds {
        &self.thresholds
    }

    pub async fn evaluate(&self, text: &str, settings: &Settings) -> DetectionResult {
        let method = DetectionMethod::ai(GATED_METHOD);

        if !settings.enabled {
            return DetectionResult::negative(DetectionMethod::Rules).with_reasoning(DISABLED_REASON);
        }
        if settings.monitored_titles.is_empty() {
            return DetectionResult::negative(method).with_reasoning("no monitored titles");
        }

        match self.run_stages(text, settings).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Gated spoiler detection failed");
                if self.fallback_to_rules {
                    RuleBasedDetector.detect(text, &settings.monitored_titles, settings.sensitivity)
                } else {
                    DetectionResult::failed(method, e.to_string())
                }
            }
        }
    }

    async fn run_stages(
        &self,
        text: &str,
        settings: &Settings,
    ) -> Result<DetectionResult, DetectionError> {
        let method = DetectionMethod::ai(GATED_METHOD);
        let threshold = self.thresholds.threshold_for(settings.sensitivity);

        let scores = self.similarity.score(text, &settings.title_ids()).await?;
        let top = max_similarity(&scores);

        if !gate_passes(&scores, threshold) {
            debug!(
                max_similarity = top,
                threshold = threshold,
                "Similarity gate rejected text"
            );
            return Ok(DetectionResult::negative(method).with_reasoning(format!(
                "similarity {top:.2} below gate {threshold:.2}"
            )));
        }

        let candidates = candidate_titles(settings, &scores, threshold);
        let confirmation = self.confirmer.confirm(text, &candidates).await?;

        debug!(
            max_similarity = top,
            candidates = candidates.len(),
            is_spoiler = confirmation.is_spoiler,
            "Confirmation stage complete"
        );

        let confidence = if confirmation.is_spoiler { top } else { 0.0 };
        let titles = match confirmation.matched_title {
            Some(title) => vec![title],
            None => candidates,
        };
        let verdict = if confirmation.is_spoiler {
            "confirmed spoiler"
        } else {
            "confirmation denied"
        };

        Ok(DetectionResult::new(confirmation.is_spoiler, confidence, method)
            .with_reasoning(format!(
                "similarity {top:.2} passed gate {threshold:.2}; {verdict}"
            ))
            .with_titles(titles))
    }
}

/// Names of the titles whose similarity cleared the gate, in watch-list order.
fn candidate_titles(settings: &Settings, scores: &[SimilarityScore], threshold: f64) -> Vec<String> {
    settings
        .monitored_titles
        .iter()
        .filter(|t| {
            scores
                .iter()
                .any(|s| s.title_id == t.id && s.similarity >= threshold)
        })
        .map(|t| t.title.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::models::MonitoredTitle;

    #[test]
    fn candidates_are_titles_over_threshold() {
        let mut settings = Settings::default();
        for (id, title) in [("1", "Origin"), ("2", "Dune"), ("3", "Heat")] {
            settings.add_title(MonitoredTitle {
                id: id.into(),
                title: title.into(),
                description: None,
            });
        }
        let scores = vec![
            SimilarityScore { title_id: "1".into(), similarity: 0.6 },
            SimilarityScore { title_id: "2".into(), similarity: 0.1 },
            SimilarityScore { title_id: "3".into(), similarity: 0.35 },
        ];
        assert_eq!(
            candidate_titles(&settings, &scores, 0.35),
            vec!["Origin".to_string(), "Heat".to_string()]
        );
    }
}
