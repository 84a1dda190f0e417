// Spoiler analyzer trait — the capability every remote backend shares.
//
// Each backend turns (text, candidate titles) into a DetectionResult, or
// fails with a Config error (missing credential/endpoint) or a Remote/Parse
// error. The orchestrator decides what a failure means for the user.

use async_trait::async_trait;

use super::config::ProviderConfig;
use crate::detection::result::DetectionResult;
use crate::error::DetectionError;
use crate::settings::models::Sensitivity;

/// One text to analyze, with the titles it might spoil.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    pub text: &'a str,
    pub titles: &'a [String],
    pub sensitivity: Sensitivity,
}

#[async_trait]
pub trait SpoilerAnalyzer: Send + Sync {
    /// Analyze a text. `config` is the caller's snapshot and is never mutated.
    async fn analyze(
        &self,
        request: &AnalysisRequest<'_>,
        config: &ProviderConfig,
    ) -> Result<DetectionResult, DetectionError>;
}
