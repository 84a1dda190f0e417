// Gated-confirmation pipeline with fake similarity and confirmation stages.
//
// The counters on the fakes check that the expensive stage stays cheap: the
// confirmation stage only runs when some title clears the gate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use spoilerguard::detection::gated::GatedPipeline;
use spoilerguard::detection::result::DetectionMethod;
use spoilerguard::error::DetectionError;
use spoilerguard::remote::confirmation::{parse_confirmation, Confirmation, SpoilerConfirmer};
use spoilerguard::remote::similarity::{GateThresholds, SimilarityScore, SimilarityScorer};
use spoilerguard::settings::models::{MonitoredTitle, Sensitivity, Settings};

struct FakeScorer {
    scores: Option<Vec<(&'static str, f64)>>,
    calls: AtomicUsize,
}

impl FakeScorer {
    fn returning(scores: Vec<(&'static str, f64)>) -> Arc<Self> {
        Arc::new(Self {
            scores: Some(scores),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            scores: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SimilarityScorer for FakeScorer {
    async fn score(
        &self,
        _text: &str,
        _title_ids: &[String],
    ) -> Result<Vec<SimilarityScore>, DetectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.scores {
            Some(scores) => Ok(scores
                .iter()
                .map(|(id, similarity)| SimilarityScore {
                    title_id: id.to_string(),
                    similarity: *similarity,
                })
                .collect()),
            None => Err(DetectionError::Remote("connection refused".into())),
        }
    }
}

/// Replies with a raw service body, parsed the same way the real client does.
struct FakeConfirmer {
    body: &'static str,
    calls: AtomicUsize,
    last_titles: std::sync::Mutex<Vec<String>>,
}

impl FakeConfirmer {
    fn replying(body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            body,
            calls: AtomicUsize::new(0),
            last_titles: std::sync::Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SpoilerConfirmer for FakeConfirmer {
    async fn confirm(
        &self,
        _text: &str,
        title_names: &[String],
    ) -> Result<Confirmation, DetectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_titles.lock().unwrap() = title_names.to_vec();
        parse_confirmation(self.body)
    }
}

fn watching(titles: &[(&str, &str)], sensitivity: Sensitivity) -> Settings {
    let mut settings = Settings {
        sensitivity,
        ..Settings::default()
    };
    for (id, title) in titles {
        settings.add_title(MonitoredTitle {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
        });
    }
    settings
}

const TEXT: &str = "can't believe what happened at the end";

#[tokio::test]
async fn gate_below_threshold_skips_confirmation() {
    let scorer = FakeScorer::returning(vec![("1", 0.2)]);
    let confirmer = FakeConfirmer::replying("True {/ Origin");
    let pipeline = GatedPipeline::new(scorer.clone(), confirmer.clone());
    let settings = watching(&[("1", "Origin")], Sensitivity::Medium);

    assert_eq!(pipeline.thresholds().threshold_for(Sensitivity::Medium), 0.35);
    let result = pipeline.evaluate(TEXT, &settings).await;

    assert!(!result.is_spoiler);
    assert_eq!(result.confidence, 0.0);
    assert_eq!(scorer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(confirmer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn gate_pass_then_confirmation_decides() {
    let scorer = FakeScorer::returning(vec![("1", 0.6)]);
    let confirmer = FakeConfirmer::replying("True {/ Origin");
    let pipeline = GatedPipeline::new(scorer, confirmer.clone());
    let settings = watching(&[("1", "Origin")], Sensitivity::Medium);

    let result = pipeline.evaluate(TEXT, &settings).await;

    assert!(result.is_spoiler);
    assert_eq!(result.matched_titles, vec!["Origin".to_string()]);
    assert_eq!(result.confidence, 0.6);
    assert_eq!(result.method, DetectionMethod::ai("gated"));
    assert_eq!(confirmer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn denied_confirmation_is_negative() {
    let scorer = FakeScorer::returning(vec![("1", 0.9)]);
    let confirmer = FakeConfirmer::replying("False");
    let pipeline = GatedPipeline::new(scorer, confirmer);
    let settings = watching(&[("1", "Origin")], Sensitivity::High);

    let result = pipeline.evaluate(TEXT, &settings).await;
    assert!(!result.is_spoiler);
    assert_eq!(result.confidence, 0.0);
}

#[tokio::test]
async fn only_titles_over_the_gate_are_sent_for_confirmation() {
    let scorer = FakeScorer::returning(vec![("1", 0.7), ("2", 0.1), ("3", 0.5)]);
    let confirmer = FakeConfirmer::replying("false");
    let pipeline = GatedPipeline::new(scorer, confirmer.clone());
    let settings = watching(
        &[("1", "Origin"), ("2", "Dune"), ("3", "Severance")],
        Sensitivity::Medium,
    );

    pipeline.evaluate(TEXT, &settings).await;
    assert_eq!(
        *confirmer.last_titles.lock().unwrap(),
        vec!["Origin".to_string(), "Severance".to_string()]
    );
}

#[tokio::test]
async fn custom_thresholds_change_the_gate() {
    let scorer = FakeScorer::returning(vec![("1", 0.4)]);
    let confirmer = FakeConfirmer::replying("true");
    let pipeline = GatedPipeline::new(scorer, confirmer.clone()).with_thresholds(GateThresholds {
        low: 0.9,
        medium: 0.8,
        high: 0.7,
    });
    let settings = watching(&[("1", "Origin")], Sensitivity::Medium);

    let result = pipeline.evaluate(TEXT, &settings).await;
    assert!(!result.is_spoiler);
    assert_eq!(confirmer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_confirmation_is_an_error_not_a_silent_no() {
    let scorer = FakeScorer::returning(vec![("1", 0.6)]);
    let confirmer = FakeConfirmer::replying("I'm not sure");
    let pipeline = GatedPipeline::new(scorer, confirmer);
    let settings = watching(&[("1", "Origin")], Sensitivity::Medium);

    let result = pipeline.evaluate(TEXT, &settings).await;
    assert!(!result.is_spoiler);
    assert_eq!(result.confidence, 0.0);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn similarity_failure_is_fail_open() {
    let confirmer = FakeConfirmer::replying("True");
    let pipeline = GatedPipeline::new(FakeScorer::failing(), confirmer.clone());
    let settings = watching(&[("1", "Origin")], Sensitivity::Medium);

    let result = pipeline.evaluate(TEXT, &settings).await;
    assert!(!result.is_spoiler);
    assert!(result.error.as_deref().unwrap_or_default().contains("connection refused"));
    assert_eq!(confirmer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn similarity_failure_can_fall_back_to_rules() {
    let pipeline = GatedPipeline::new(FakeScorer::failing(), FakeConfirmer::replying("True"))
        .with_fallback_to_rules(true);
    let settings = watching(&[("origin", "Origin")], Sensitivity::Medium);

    let result = pipeline
        .evaluate("Origin: the hero dies in the finale", &settings)
        .await;
    assert!(result.is_spoiler);
    assert_eq!(result.method, DetectionMethod::Rules);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn empty_watch_list_calls_nothing() {
    let scorer = FakeScorer::returning(vec![]);
    let confirmer = FakeConfirmer::replying("True");
    let pipeline = GatedPipeline::new(scorer.clone(), confirmer.clone());

    let result = pipeline.evaluate(TEXT, &Settings::default()).await;
    assert!(!result.is_spoiler);
    assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(confirmer.calls.load(Ordering::SeqCst), 0);
}
