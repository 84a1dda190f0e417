// Spoiler detection — the decision engine.
//
// RuleBasedDetector is the local heuristic. DetectionOrchestrator (hybrid
// merge) and GatedPipeline (similarity gate + confirmation) are the two
// ways of composing it with remote stages. Hybrid merge is the default.

pub mod batch;
pub mod gated;
pub mod orchestrator;
pub mod result;
pub mod rules;

/// Which orchestration strategy to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Provider verdict, merged with rules when unsure.
    #[default]
    Hybrid,
    /// Similarity gate, then remote confirmation.
    Gated,
}

impl Strategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hybrid" => Some(Strategy::Hybrid),
            "gated" => Some(Strategy::Gated),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Hybrid => "hybrid",
            Strategy::Gated => "gated",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
