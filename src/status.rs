// System status display: database, watch list, provider setup, last update.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::output::terminal::display_settings;
use crate::providers::config::ProviderConfig;
use crate::settings::store::SettingsStore;

/// Display system status to the terminal.
pub async fn show(store: &Arc<dyn SettingsStore>, config: &Config) -> Result<()> {
    if !Path::new(&config.db_path).exists() {
        println!("Database: not initialized");
        println!("\nRun `spoilerguard init` to set up the database.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&config.db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", config.db_path, file_size);

    match store.last_updated().await? {
        Some(at) => println!("Last updated: {at}"),
        None => println!("Last updated: never"),
    }

    println!();
    let settings = store.load_settings().await?;
    display_settings(&settings);

    println!();
    let provider = config.provider_config(store.load_ai_config().await?);
    display_provider(&provider);
    if let Err(e) = Config::require_provider(&provider) {
        println!("  Problem:    {e}");
    }

    println!();
    println!("Strategy: {}", config.strategy);
    println!("Service:  {}", config.service_url);

    Ok(())
}

fn display_provider(provider: &ProviderConfig) {
    if !provider.is_active() {
        println!("AI provider: none (rule-based detection only)");
        return;
    }
    println!("AI provider: {}", provider.provider_name);
    println!("  Model:      {}", provider.model);
    println!("  API key:    {}", provider.redacted_key());
    println!("  Threshold:  {:.2}", provider.confidence_threshold);
    println!(
        "  Fallback:   {}",
        if provider.fallback_to_rules {
            "rules"
        } else {
            "off"
        }
    );
    if let Some(endpoint) = provider.specific_str("endpoint") {
        println!("  Endpoint:   {endpoint}");
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
