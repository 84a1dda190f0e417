// Batch evaluation — many independent texts, bounded concurrency.
//
// Each text is its own evaluation with no ordering guarantee while in
// flight. Results are put back into input order before returning.

use std::future::Future;

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;

use super::result::DetectionResult;

/// Evaluate every text with `eval`, running up to `concurrency` at once.
///
/// Returns one result per input, in input order. `progress` (if any) is
/// advanced once per completed text.
pub async fn evaluate_all<'a, F, Fut>(
    texts: &'a [String],
    concurrency: usize,
    progress: Option<&ProgressBar>,
    eval: F,
) -> Vec<DetectionResult>
where
    F: Fn(&'a str) -> Fut,
    Fut: Future<Output = DetectionResult>,
{
    let mut indexed: Vec<(usize, DetectionResult)> = stream::iter(texts.iter().enumerate())
        .map(|(i, text)| {
            let fut = eval(text.as_str());
            async move { (i, fut.await) }
        })
        .buffer_unordered(concurrency.max(1))
        .inspect(|_| {
            if let Some(pb) = progress {
                pb.inc(1);
            }
        })
        .collect()
        .await;

    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, result)| result).collect()
}
