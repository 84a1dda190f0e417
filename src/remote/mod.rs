// Remote spoiler service — similarity gate and LLM confirmation.
//
// SimilarityScorer and SpoilerConfirmer are the seams the gated pipeline
// depends on. SpoilerServiceClient implements both over HTTP; tests swap in
// in-process fakes.

pub mod client;
pub mod confirmation;
pub mod similarity;
