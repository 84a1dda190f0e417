// Settings models — the user's watch list and detection preferences.
//
// A Settings value is an immutable snapshot as far as detection is
// concerned: the orchestrators borrow it for one evaluation and never
// write back. Edits happen in the CLI and go through the SettingsStore.

use serde::{Deserialize, Serialize};

/// A title (movie or show) the user wants protected from spoilers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredTitle {
    /// Opaque identifier. Catalog imports use the service's movie id;
    /// hand-added titles use the title text itself.
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MonitoredTitle {
    /// A hand-added title whose id is its own name.
    pub fn named(title: &str) -> Self {
        let title = title.trim().to_string();
        Self {
            id: title.clone(),
            title,
            description: None,
        }
    }
}

/// A title as it appears in stored or inbound settings: a bare name (older
/// payloads) or a full record.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TitleEntry {
    Name(String),
    Full(MonitoredTitle),
}

impl From<TitleEntry> for MonitoredTitle {
    fn from(entry: TitleEntry) -> Self {
        match entry {
            TitleEntry::Name(name) => MonitoredTitle::named(&name),
            TitleEntry::Full(title) => title,
        }
    }
}

/// Build a deduplicated title list, dropping blanks.
pub fn titles_from_entries(entries: Vec<TitleEntry>) -> Vec<MonitoredTitle> {
    let mut settings = Settings::default();
    for entry in entries {
        settings.add_title(entry.into());
    }
    settings.monitored_titles
}

/// How aggressively text is flagged.
///
/// Higher sensitivity widens the keyword set and lowers the similarity gate,
/// trading precision for recall.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    #[default]
    Medium,
    High,
}

impl Sensitivity {
    /// Parse a sensitivity level. Unknown values are rejected rather than
    /// silently mapped, since they come from user input.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Sensitivity::Low),
            "medium" => Some(Sensitivity::Medium),
            "high" => Some(Sensitivity::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sensitivity::Low => "low",
            Sensitivity::Medium => "medium",
            Sensitivity::High => "high",
        }
    }
}

impl std::fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of trying to add a title to the watch list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Duplicate,
    Empty,
}

/// The user's detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Ordered, unique by id.
    pub monitored_titles: Vec<MonitoredTitle>,
    pub enabled: bool,
    pub sensitivity: Sensitivity,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            monitored_titles: Vec::new(),
            enabled: true,
            sensitivity: Sensitivity::Medium,
        }
    }
}

impl Settings {
    /// Add a title, keeping the list unique by id and by title text.
    pub fn add_title(&mut self, title: MonitoredTitle) -> AddOutcome {
        if title.title.trim().is_empty() {
            return AddOutcome::Empty;
        }
        let exists = self
            .monitored_titles
            .iter()
            .any(|t| t.id == title.id || t.title == title.title);
        if exists {
            return AddOutcome::Duplicate;
        }
        self.monitored_titles.push(title);
        AddOutcome::Added
    }

    /// Remove a title by id or title text. Returns true if anything was removed.
    pub fn remove_title(&mut self, key: &str) -> bool {
        let before = self.monitored_titles.len();
        self.monitored_titles
            .retain(|t| t.id != key && t.title != key);
        self.monitored_titles.len() != before
    }

    /// Display names, in watch-list order. These go into provider prompts.
    pub fn title_names(&self) -> Vec<String> {
        self.monitored_titles.iter().map(|t| t.title.clone()).collect()
    }

    /// Identifiers, in watch-list order. These go to the similarity service.
    pub fn title_ids(&self) -> Vec<String> {
        self.monitored_titles.iter().map(|t| t.id.clone()).collect()
    }
}
