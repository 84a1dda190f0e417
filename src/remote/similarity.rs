// Similarity scoring — the cheap remote gate.
//
// A remote service scores how topically related a text is to each monitored
// title. If no title clears the sensitivity's gate threshold, the text is
// considered unrelated and the expensive confirmation stage is skipped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DetectionError;
use crate::settings::models::Sensitivity;

/// Relatedness between a text and one monitored title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScore {
    pub title_id: String,
    /// Within [0, 1].
    pub similarity: f64,
}

/// Trait for per-title similarity scoring. Implementations are remote.
#[async_trait]
pub trait SimilarityScorer: Send + Sync {
    /// Score `text` against each title id, one score per id, in the same
    /// order as `title_ids`.
    async fn score(
        &self,
        text: &str,
        title_ids: &[String],
    ) -> Result<Vec<SimilarityScore>, DetectionError>;
}

/// Gate thresholds per sensitivity tier.
///
/// Lower sensitivity means a higher bar to escalate, so fewer confirmation
/// calls are made.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateThresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            low: 0.5,
            medium: 0.35,
            high: 0.2,
        }
    }
}

impl GateThresholds {
    pub fn threshold_for(&self, sensitivity: Sensitivity) -> f64 {
        match sensitivity {
            Sensitivity::Low => self.low,
            Sensitivity::Medium => self.medium,
            Sensitivity::High => self.high,
        }
    }
}

/// The gate passes iff any title's similarity reaches the threshold.
pub fn gate_passes(scores: &[SimilarityScore], threshold: f64) -> bool {
    scores.iter().any(|s| s.similarity >= threshold)
}

/// Highest similarity across all titles (0.0 when there are none).
pub fn max_similarity(scores: &[SimilarityScore]) -> f64 {
    scores.iter().map(|s| s.similarity).fold(0.0, f64::max)
}

/// Line up raw service scores with the requested ids.
///
/// The service may omit titles it found no match for; those get 0.0.
/// Scores outside [0, 1] are clamped, ids the caller never asked about
/// are dropped.
pub fn align_scores(requested: &[String], raw: &[(String, f64)]) -> Vec<SimilarityScore> {
    requested
        .iter()
        .map(|id| {
            let similarity = raw
                .iter()
                .find(|(raw_id, _)| raw_id == id)
                .map(|(_, s)| *s)
                .unwrap_or(0.0);
            SimilarityScore {
                title_id: id.clone(),
                similarity: crate::detection::result::clamp_confidence(similarity),
            }
        })
        .collect()
}
