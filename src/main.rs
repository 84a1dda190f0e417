use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing::{info, warn};

use spoilerguard::config::Config;
use spoilerguard::detection::batch::evaluate_all;
use spoilerguard::detection::gated::GatedPipeline;
use spoilerguard::detection::orchestrator::{DetectionOrchestrator, DISABLED_REASON};
use spoilerguard::detection::result::{DetectionMethod, DetectionResult};
use spoilerguard::detection::Strategy;
use spoilerguard::output::terminal;
use spoilerguard::providers::config::ProviderConfig;
use spoilerguard::providers::registry::{ProviderKind, ProviderRegistry};
use spoilerguard::providers::validation::validate_api_key;
use spoilerguard::remote::client::SpoilerServiceClient;
use spoilerguard::settings::handle::{ControlMessage, SettingsHandle};
use spoilerguard::settings::models::{AddOutcome, MonitoredTitle, Sensitivity, Settings};
use spoilerguard::settings::store::SettingsStore;

/// SpoilerGuard: spoiler detection for the titles you care about.
///
/// Flags text that likely reveals plot details of a monitored movie or
/// show, using local rules, an optional AI provider, or a remote
/// similarity + confirmation service.
#[derive(Parser)]
#[command(name = "spoilerguard", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the settings database
    Init,

    /// Add a title to the watch list
    Add {
        /// The title as it appears in text (e.g. "Origin")
        title: String,

        /// Optional plot description, shown in `list`
        #[arg(long)]
        description: Option<String>,

        /// Catalog id for the similarity service (defaults to the title)
        #[arg(long)]
        id: Option<String>,
    },

    /// Remove a title from the watch list (by title or id)
    Remove { title: String },

    /// Show the watch list and preferences
    List,

    /// Set detection sensitivity (low, medium, high)
    Sensitivity { level: String },

    /// Turn spoiler detection on
    Enable,

    /// Turn spoiler detection off
    Disable,

    /// Add every title from the spoiler service's catalog
    ImportCatalog,

    /// Check a single piece of text
    Check {
        text: String,

        /// Orchestration strategy: hybrid or gated (default from config)
        #[arg(long)]
        strategy: Option<String>,

        /// Use the service's single-shot /predict endpoint only
        #[arg(long)]
        quick: bool,
    },

    /// Check every non-empty line of a file
    CheckFile {
        path: String,

        /// Number of lines to evaluate in parallel (default: 4)
        #[arg(long, default_value = "4")]
        concurrency: usize,

        /// Orchestration strategy: hybrid or gated (default from config)
        #[arg(long)]
        strategy: Option<String>,
    },

    /// Configure the AI provider (openai, huggingface, custom, none)
    Provider {
        name: String,

        #[arg(long)]
        model: Option<String>,

        /// Provider verdicts below this confidence are merged with the rules
        #[arg(long)]
        threshold: Option<f64>,

        /// Report provider failures instead of falling back to the rules
        #[arg(long)]
        no_fallback: bool,

        /// Endpoint URL for the custom provider
        #[arg(long)]
        endpoint: Option<String>,

        /// API key (prefer OPENAI_API_KEY / HUGGINGFACE_API_KEY in .env)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Apply an updateSettings message as sent by the settings UI
    ApplySettings {
        /// e.g. '{"action":"updateSettings","settings":{"movies":["Origin"]}}'
        json: String,
    },

    /// Check whether an API key is well-formed for a provider
    ValidateKey { provider: String, key: String },

    /// Show system status (watch list, provider, database)
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("spoilerguard=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing SpoilerGuard database...");
            let config = Config::load()?;
            let store = spoilerguard::settings::initialize(&config.db_path)?;
            let table_count = store.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nSpoilerGuard is ready. Next step: add a title to protect");
            println!("  spoilerguard add \"<title>\"");
        }

        Commands::Add {
            title,
            description,
            id,
        } => {
            let config = Config::load()?;
            let store = spoilerguard::settings::open(&config.db_path)?;
            let mut settings = store.load_settings().await?;

            let title = title.trim().to_string();
            let entry = MonitoredTitle {
                id: id.unwrap_or_else(|| title.clone()),
                title,
                description,
            };
            let name = entry.title.clone();
            match settings.add_title(entry) {
                AddOutcome::Added => {
                    store.save_settings(&settings).await?;
                    println!("Added \"{name}\" to the watch list");
                }
                AddOutcome::Duplicate => println!("Movie already in list: \"{name}\""),
                AddOutcome::Empty => anyhow::bail!("Title must not be empty"),
            }
        }

        Commands::Remove { title } => {
            let config = Config::load()?;
            let store = spoilerguard::settings::open(&config.db_path)?;
            let mut settings = store.load_settings().await?;

            if settings.remove_title(&title) {
                store.save_settings(&settings).await?;
                println!("Removed \"{title}\" from the watch list");
            } else {
                println!("\"{title}\" is not on the watch list");
            }
        }

        Commands::List => {
            let config = Config::load()?;
            let store = spoilerguard::settings::open(&config.db_path)?;
            terminal::display_settings(&store.load_settings().await?);
        }

        Commands::Sensitivity { level } => {
            let sensitivity = Sensitivity::parse(&level).with_context(|| {
                format!("Unknown sensitivity '{level}'. Use low, medium, or high.")
            })?;
            let config = Config::load()?;
            let store = spoilerguard::settings::open(&config.db_path)?;
            let mut settings = store.load_settings().await?;
            settings.sensitivity = sensitivity;
            store.save_settings(&settings).await?;
            println!("Sensitivity set to {sensitivity}");
        }

        Commands::Enable => set_enabled(true).await?,

        Commands::Disable => set_enabled(false).await?,

        Commands::ImportCatalog => {
            let config = Config::load()?;
            let store = spoilerguard::settings::open(&config.db_path)?;
            let service = SpoilerServiceClient::with_client(http_client()?, &config.service_url);

            println!("Fetching catalog from {}...", service.base_url());
            let catalog = service.fetch_catalog().await?;

            let mut settings = store.load_settings().await?;
            let mut added = 0usize;
            for title in catalog.iter().cloned() {
                if settings.add_title(title) == AddOutcome::Added {
                    added += 1;
                }
            }
            store.save_settings(&settings).await?;
            println!(
                "Imported {added} new titles ({} in catalog, {} already listed)",
                catalog.len(),
                catalog.len() - added
            );
        }

        Commands::Check {
            text,
            strategy,
            quick,
        } => {
            let config = Config::load()?;
            let store = spoilerguard::settings::open(&config.db_path)?;
            let settings = store.load_settings().await?;
            let provider = config.provider_config(store.load_ai_config().await?);
            let client = http_client()?;

            let result = if quick {
                let service = SpoilerServiceClient::with_client(client, &config.service_url);
                quick_check(&service, &text, &settings).await
            } else {
                let strategy = resolve_strategy(strategy.as_deref(), &config)?;
                if strategy == Strategy::Hybrid {
                    Config::warn_if_unusable(&provider);
                }
                let engines = Engines::new(client, &config, provider.fallback_to_rules);
                engines
                    .evaluate(strategy, &text, &settings, &provider)
                    .await
            };

            terminal::display_result(&text, &result);
        }

        Commands::CheckFile {
            path,
            concurrency,
            strategy,
        } => {
            let config = Config::load()?;
            let strategy = resolve_strategy(strategy.as_deref(), &config)?;
            let store = spoilerguard::settings::open(&config.db_path)?;

            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {path}"))?;
            let texts: Vec<String> = contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect();
            if texts.is_empty() {
                println!("No text to check in {path}");
                return Ok(());
            }

            let provider = config.provider_config(store.load_ai_config().await?);
            if strategy == Strategy::Hybrid {
                Config::warn_if_unusable(&provider);
            }
            let engines = Engines::new(http_client()?, &config, provider.fallback_to_rules);
            let handle = SettingsHandle::new(store.load_settings().await?, provider);

            println!(
                "Checking {} lines ({} strategy, {} at a time)...",
                texts.len(),
                strategy,
                concurrency
            );
            let pb = ProgressBar::new(texts.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  Checking [{bar:30}] {pos}/{len} ({eta})")
                    .unwrap(),
            );

            let engines = &engines;
            let handle = &handle;
            let results = evaluate_all(&texts, concurrency, Some(&pb), |text| {
                // Each evaluation keeps the snapshot it started with
                let settings = handle.snapshot();
                let provider = handle.provider_snapshot();
                async move {
                    engines
                        .evaluate(strategy, text, &settings, &provider)
                        .await
                }
            })
            .await;
            pb.finish_and_clear();

            terminal::display_batch_summary(&texts, &results);
        }

        Commands::Provider {
            name,
            model,
            threshold,
            no_fallback,
            endpoint,
            api_key,
        } => {
            let config = Config::load()?;
            let store = spoilerguard::settings::open(&config.db_path)?;
            let mut ai = store.load_ai_config().await?;

            let name = name.trim().to_ascii_lowercase();
            if name == "none" {
                ai.enabled = false;
                ai.provider_name = name;
                store.save_ai_config(&ai).await?;
                println!("AI analysis disabled; rule-based detection only");
                return Ok(());
            }

            let kind = ProviderKind::from_name(&name).with_context(|| {
                format!("Unknown provider '{name}'. Use openai, huggingface, custom, or none.")
            })?;
            if let Some(key) = &api_key {
                if !validate_api_key(kind.as_str(), key) {
                    anyhow::bail!("That doesn't look like a valid {kind} API key");
                }
            }

            ai.enabled = true;
            ai.provider_name = kind.as_str().to_string();
            if let Some(model) = model {
                ai.model = model;
            }
            if let Some(threshold) = threshold {
                ai.confidence_threshold = threshold;
            }
            ai.fallback_to_rules = !no_fallback;
            if let Some(endpoint) = endpoint {
                ai.provider_specific
                    .insert("endpoint".to_string(), endpoint.into());
            }
            if api_key.is_some() {
                ai.api_key = api_key;
            }

            if let Err(e) = Config::require_provider(&config.provider_config(ai.clone())) {
                warn!(error = %e, "Provider saved but not usable yet");
            }
            store.save_ai_config(&ai).await?;
            println!("AI provider set to {kind} (key {})", ai.redacted_key());
        }

        Commands::ApplySettings { json } => {
            let message: ControlMessage =
                serde_json::from_str(&json).context("Invalid settings message")?;
            let config = Config::load()?;
            let store = spoilerguard::settings::open(&config.db_path)?;
            let handle = SettingsHandle::new(
                store.load_settings().await?,
                store.load_ai_config().await?,
            );

            handle.apply(message);
            let settings = handle.snapshot();
            store.save_settings(&settings).await?;
            terminal::display_settings(&settings);
        }

        Commands::ValidateKey { provider, key } => {
            if validate_api_key(&provider, &key) {
                println!("{}", format!("Key looks valid for {provider}").green());
            } else {
                println!("{}", format!("Key is not valid for {provider}").red());
            }
        }

        Commands::Status => {
            let config = Config::load()?;
            match spoilerguard::settings::open(&config.db_path) {
                Ok(store) => spoilerguard::status::show(&store, &config).await?,
                Err(_) => {
                    println!("Database: not initialized");
                    println!("\nRun `spoilerguard init` to set up the database.");
                }
            }
        }
    }

    Ok(())
}

/// Persist the enabled flag, leaving the rest of the settings alone.
async fn set_enabled(enabled: bool) -> Result<()> {
    let config = Config::load()?;
    let store = spoilerguard::settings::open(&config.db_path)?;
    let mut settings = store.load_settings().await?;
    settings.enabled = enabled;
    store.save_settings(&settings).await?;
    println!(
        "Spoiler detection {}",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// The two orchestration strategies, sharing one connection pool.
struct Engines {
    hybrid: DetectionOrchestrator,
    gated: GatedPipeline,
}

impl Engines {
    /// `fallback_to_rules` is the merged provider setting, so one flag
    /// governs fallback for both strategies.
    fn new(client: reqwest::Client, config: &Config, fallback_to_rules: bool) -> Self {
        let service = Arc::new(SpoilerServiceClient::with_client(
            client.clone(),
            &config.service_url,
        ));
        Self {
            hybrid: DetectionOrchestrator::new(ProviderRegistry::standard(client)),
            gated: GatedPipeline::new(service.clone(), service)
                .with_fallback_to_rules(fallback_to_rules),
        }
    }

    async fn evaluate(
        &self,
        strategy: Strategy,
        text: &str,
        settings: &Settings,
        provider: &ProviderConfig,
    ) -> DetectionResult {
        match strategy {
            Strategy::Hybrid => self.hybrid.evaluate(text, settings, provider).await,
            Strategy::Gated => self.gated.evaluate(text, settings).await,
        }
    }
}

/// Single-shot check against `/predict`, ignoring the watch list.
async fn quick_check(
    service: &SpoilerServiceClient,
    text: &str,
    settings: &Settings,
) -> DetectionResult {
    let method = DetectionMethod::ai("predict");
    if !settings.enabled {
        return DetectionResult::negative(DetectionMethod::Rules).with_reasoning(DISABLED_REASON);
    }
    match service.predict(text).await {
        Ok(true) => DetectionResult::new(true, 1.0, method),
        Ok(false) => DetectionResult::negative(method),
        Err(e) => {
            warn!(error = %e, "Quick check failed");
            DetectionResult::failed(method, e.to_string())
        }
    }
}

fn resolve_strategy(flag: Option<&str>, config: &Config) -> Result<Strategy> {
    match flag {
        Some(s) => Strategy::parse(s)
            .with_context(|| format!("Unknown strategy '{s}'. Use hybrid or gated.")),
        None => Ok(config.strategy),
    }
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(spoilerguard::USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}
