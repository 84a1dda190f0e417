// SpoilerGuard: spoiler detection for text about the titles you watch
//
// This is the library root. Each module corresponds to a major subsystem
// of the detection pipeline.

pub mod config;
pub mod detection;
pub mod error;
pub mod output;
pub mod providers;
pub mod remote;
pub mod settings;
pub mod status;

/// User-Agent sent with every outbound HTTP request.
pub const USER_AGENT: &str = "spoilerguard/0.1 (spoiler-detection)";
