// SettingsHandle — the single owned holder of the live settings snapshot.
//
// Evaluations take an Arc snapshot at the start and keep it until they
// finish. An update swaps in a whole new snapshot (replace, not merge), so
// in-flight evaluations never observe a half-applied change and the next
// evaluation sees the new settings.

use std::sync::{Arc, RwLock};

use serde::Deserialize;

use super::models::{titles_from_entries, Sensitivity, Settings, TitleEntry};
use crate::providers::config::ProviderConfig;

/// Inbound control messages from the settings UI.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ControlMessage {
    UpdateSettings { settings: SettingsPayload },
}

/// A full settings object as sent by the settings UI.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPayload {
    #[serde(default)]
    pub movies: Vec<TitleEntry>,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    #[serde(default)]
    pub sensitivity: Sensitivity,
}

fn default_enabled() -> bool {
    true
}

impl From<SettingsPayload> for Settings {
    fn from(payload: SettingsPayload) -> Self {
        Settings {
            monitored_titles: titles_from_entries(payload.movies),
            enabled: payload.is_enabled,
            sensitivity: payload.sensitivity,
        }
    }
}

pub struct SettingsHandle {
    settings: RwLock<Arc<Settings>>,
    provider: RwLock<Arc<ProviderConfig>>,
}

impl SettingsHandle {
    pub fn new(settings: Settings, provider: ProviderConfig) -> Self {
        Self {
            settings: RwLock::new(Arc::new(settings)),
            provider: RwLock::new(Arc::new(provider)),
        }
    }

    /// The current settings snapshot.
    pub fn snapshot(&self) -> Arc<Settings> {
        // A poisoned lock still holds a complete Arc; keep serving it
        let guard = self.settings.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// The current provider configuration snapshot.
    pub fn provider_snapshot(&self) -> Arc<ProviderConfig> {
        let guard = self.provider.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Replace the settings wholesale.
    pub fn update_settings(&self, settings: Settings) {
        let mut guard = self.settings.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(settings);
    }

    /// Replace the provider configuration wholesale.
    pub fn update_provider(&self, provider: ProviderConfig) {
        let mut guard = self.provider.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(provider);
    }

    /// Apply an inbound control message.
    pub fn apply(&self, message: ControlMessage) {
        match message {
            ControlMessage::UpdateSettings { settings } => self.update_settings(settings.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::models::MonitoredTitle;

    #[test]
    fn update_replaces_rather_than_merges() {
        let mut initial = Settings::default();
        initial.add_title(MonitoredTitle::named("Origin"));
        let handle = SettingsHandle::new(initial, ProviderConfig::default());

        let before = handle.snapshot();
        let mut next = Settings::default();
        next.add_title(MonitoredTitle::named("Dune"));
        next.sensitivity = Sensitivity::High;
        handle.update_settings(next);

        // The old snapshot is untouched
        assert_eq!(before.title_names(), vec!["Origin".to_string()]);
        let after = handle.snapshot();
        assert_eq!(after.title_names(), vec!["Dune".to_string()]);
        assert_eq!(after.sensitivity, Sensitivity::High);
    }

    #[test]
    fn update_settings_message_is_applied() {
        let handle = SettingsHandle::new(Settings::default(), ProviderConfig::default());
        let message: ControlMessage = serde_json::from_str(
            r#"{
                "action": "updateSettings",
                "settings": {"movies": ["Origin", "Dune"], "isEnabled": false, "sensitivity": "low"}
            }"#,
        )
        .unwrap();
        handle.apply(message);

        let settings = handle.snapshot();
        assert_eq!(settings.monitored_titles.len(), 2);
        assert!(!settings.enabled);
        assert_eq!(settings.sensitivity, Sensitivity::Low);
    }

    #[test]
    fn unknown_action_is_rejected() {
        let parsed = serde_json::from_str::<ControlMessage>(r#"{"action": "reboot"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn provider_update_is_visible() {
        let handle = SettingsHandle::new(Settings::default(), ProviderConfig::default());
        handle.update_provider(ProviderConfig {
            enabled: true,
            provider_name: "custom".into(),
            ..Default::default()
        });
        assert!(handle.provider_snapshot().is_active());
    }
}
