// Provider registry — the closed set of remote analyzers.
//
// Providers are identified by a ProviderKind, parsed once from the
// configured name. The registration table is built at startup; tests (or an
// embedding application) may replace an entry with their own analyzer.
// Unknown names resolve to no provider, and the orchestrator falls back to
// the rule-based detector.

use std::collections::HashMap;

use reqwest::Client;

use super::custom::CustomAnalyzer;
use super::huggingface::HuggingFaceAnalyzer;
use super::openai::OpenAiAnalyzer;
use super::traits::SpoilerAnalyzer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    HuggingFace,
    Custom,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::OpenAi,
        ProviderKind::HuggingFace,
        ProviderKind::Custom,
    ];

    /// Parse a configured provider name. `none` and unknown names are `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(ProviderKind::OpenAi),
            "huggingface" => Some(ProviderKind::HuggingFace),
            "custom" => Some(ProviderKind::Custom),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::Custom => "custom",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Registration table from provider kind to analyzer.
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Box<dyn SpoilerAnalyzer>>,
}

impl ProviderRegistry {
    /// An empty registry. Every lookup falls through to rules.
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// The built-in analyzers, sharing one HTTP connection pool.
    pub fn standard(client: Client) -> Self {
        let mut registry = Self::empty();
        registry.register(ProviderKind::OpenAi, OpenAiAnalyzer::new(client.clone()));
        registry.register(
            ProviderKind::HuggingFace,
            HuggingFaceAnalyzer::new(client.clone()),
        );
        registry.register(ProviderKind::Custom, CustomAnalyzer::new(client));
        registry
    }

    /// Register (or replace) the analyzer for a kind.
    pub fn register(&mut self, kind: ProviderKind, analyzer: impl SpoilerAnalyzer + 'static) {
        self.providers.insert(kind, Box::new(analyzer));
    }

    /// Resolve a configured provider name.
    pub fn lookup(&self, name: &str) -> Option<(ProviderKind, &dyn SpoilerAnalyzer)> {
        let kind = ProviderKind::from_name(name)?;
        self.providers.get(&kind).map(|a| (kind, a.as_ref()))
    }

    pub fn contains(&self, kind: ProviderKind) -> bool {
        self.providers.contains_key(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!(ProviderKind::from_name("OpenAI"), Some(ProviderKind::OpenAi));
        assert_eq!(
            ProviderKind::from_name(" huggingface "),
            Some(ProviderKind::HuggingFace)
        );
        assert_eq!(ProviderKind::from_name("none"), None);
        assert_eq!(ProviderKind::from_name("gemini"), None);
    }

    #[test]
    fn names_round_trip() {
        for kind in ProviderKind::ALL {
            assert_eq!(ProviderKind::from_name(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn standard_registry_has_every_kind() {
        let registry = ProviderRegistry::standard(Client::new());
        for kind in ProviderKind::ALL {
            assert!(registry.contains(kind), "missing {kind}");
        }
        assert!(registry.lookup("custom").is_some());
        assert!(registry.lookup("unknown").is_none());
    }

    #[test]
    fn empty_registry_resolves_nothing() {
        assert!(ProviderRegistry::empty().lookup("openai").is_none());
    }
}
