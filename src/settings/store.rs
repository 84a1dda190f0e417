// Settings store trait — backend-agnostic persistence for user settings.
//
// Only the CLI writes. Detection receives loaded snapshots and never
// touches the store.

use anyhow::Result;
use async_trait::async_trait;

use super::models::Settings;
use crate::providers::config::ProviderConfig;

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Count the number of user-created tables in the store.
    async fn table_count(&self) -> Result<i64>;

    /// Load the watch list, enabled flag and sensitivity. Missing keys
    /// take their defaults.
    async fn load_settings(&self) -> Result<Settings>;

    /// Persist all three settings keys.
    async fn save_settings(&self, settings: &Settings) -> Result<()>;

    /// Load the AI provider configuration block (default when absent).
    async fn load_ai_config(&self) -> Result<ProviderConfig>;

    /// Persist the AI provider configuration block.
    async fn save_ai_config(&self, config: &ProviderConfig) -> Result<()>;

    /// When anything was last written, if ever.
    async fn last_updated(&self) -> Result<Option<String>>;
}
