// Remote AI providers — trait-based abstraction over interchangeable backends.
//
// Every backend implements SpoilerAnalyzer. The registry maps the configured
// provider name onto one of a closed set of kinds, so swapping backends is a
// config change, not a code change.

pub mod config;
pub mod custom;
pub mod huggingface;
pub mod openai;
pub mod registry;
pub mod traits;
pub mod validation;
