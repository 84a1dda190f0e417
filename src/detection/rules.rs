// Rule-based spoiler detection — local keyword and pattern heuristics.
//
// This is the cheap stage: no I/O, no failure modes. It always runs when
// AI analysis is disabled, and it is the fallback when a remote stage fails.
//
// A text is only considered at all if it mentions a monitored title
// (case-insensitive substring). Given a title mention, it is flagged if it
// contains a sensitivity keyword or matches one of the spoiler patterns.
// Confidence is a weighted sum of the signals:
//
//   +0.3 title mentioned, +0.4 keyword hit, +0.3 pattern hit,
//   +0.2 if the word "spoiler" appears; clamped to 1.0

use std::sync::LazyLock;

use regex_lite::Regex;

use super::result::{DetectionMethod, DetectionResult};
use crate::settings::models::{MonitoredTitle, Sensitivity};

const TITLE_WEIGHT: f64 = 0.3;
const KEYWORD_WEIGHT: f64 = 0.4;
const PATTERN_WEIGHT: f64 = 0.3;
const EXPLICIT_SPOILER_BONUS: f64 = 0.2;

const LOW_KEYWORDS: &[&str] = &["dies", "killed", "ending", "major spoiler"];

const MEDIUM_KEYWORDS: &[&str] = &[
    "dies", "death", "killed", "ending", "finale", "twist", "reveals", "plot", "spoiler",
];

const HIGH_KEYWORDS: &[&str] = &[
    "dies",
    "death",
    "killed",
    "ending",
    "finale",
    "twist",
    "happens",
    "reveals",
    "turns out",
    "discovers",
    "finds out",
    "episode",
    "season",
    "chapter",
    "part",
    "scene",
];

const SPOILER_PATTERNS: &[&str] = &[
    r"(?i)spoiler",
    r"(?i)dies?",
    r"(?i)killed?",
    r"(?i)ending",
    r"(?i)plot twist",
    r"(?i)finale",
    r"(?i)season \d+ episode \d+",
    r"(?i)s\d+e\d+",
    r"(?i)don't read if",
    r"(?i)warning:",
];

static COMPILED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    SPOILER_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("spoiler patterns are valid regexes"))
        .collect()
});

/// The keyword set for a sensitivity tier. Higher tiers are broader.
pub fn keywords_for(sensitivity: Sensitivity) -> &'static [&'static str] {
    match sensitivity {
        Sensitivity::Low => LOW_KEYWORDS,
        Sensitivity::Medium => MEDIUM_KEYWORDS,
        Sensitivity::High => HIGH_KEYWORDS,
    }
}

/// Titles whose name appears in the text (case-insensitive). Blank titles
/// never match.
pub fn mentioned_titles(text: &str, titles: &[MonitoredTitle]) -> Vec<String> {
    mentioned(text, titles.iter().map(|t| t.title.as_str()))
}

/// Same as `mentioned_titles`, over bare title names.
pub fn mentioned_titles_by_name(text: &str, names: &[String]) -> Vec<String> {
    mentioned(text, names.iter().map(String::as_str))
}

fn mentioned<'a>(text: &str, names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let lower = text.to_lowercase();
    names
        .filter(|name| {
            let name = name.trim();
            !name.is_empty() && lower.contains(&name.to_lowercase())
        })
        .map(str::to_string)
        .collect()
}

/// Pure, synchronous spoiler heuristic.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedDetector;

impl RuleBasedDetector {
    pub fn detect(
        &self,
        text: &str,
        titles: &[MonitoredTitle],
        sensitivity: Sensitivity,
    ) -> DetectionResult {
        let mentioned = mentioned_titles(text, titles);
        if mentioned.is_empty() {
            return DetectionResult::negative(DetectionMethod::Rules);
        }

        let lower = text.to_lowercase();
        let keyword_hits: Vec<&str> = keywords_for(sensitivity)
            .iter()
            .copied()
            .filter(|kw| lower.contains(kw))
            .collect();
        let pattern_hits: Vec<&str> = SPOILER_PATTERNS
            .iter()
            .zip(COMPILED_PATTERNS.iter())
            .filter(|(_, re)| re.is_match(text))
            .map(|(src, _)| src.trim_start_matches("(?i)"))
            .collect();
        let explicit = lower.contains("spoiler");

        let mut confidence = TITLE_WEIGHT;
        if !keyword_hits.is_empty() {
            confidence += KEYWORD_WEIGHT;
        }
        if !pattern_hits.is_empty() {
            confidence += PATTERN_WEIGHT;
        }
        if explicit {
            confidence += EXPLICIT_SPOILER_BONUS;
        }

        // A title mention alone is necessary but not sufficient
        let is_spoiler = !keyword_hits.is_empty() || !pattern_hits.is_empty();

        let mut reasons = vec![format!("mentions {}", mentioned.join(", "))];
        if !keyword_hits.is_empty() {
            reasons.push(format!("keywords: {}", keyword_hits.join(", ")));
        }
        if !pattern_hits.is_empty() {
            reasons.push(format!("patterns: {}", pattern_hits.join(", ")));
        }

        DetectionResult::new(is_spoiler, confidence.min(1.0), DetectionMethod::Rules)
            .with_titles(mentioned)
            .with_reasoning(reasons.join("; "))
    }
}
