//! Catalog builder for TrialMatch
//!
//! Fetches trials from the registry and embeds their eligibility criteria.
//!
//! Run: cargo run --bin trialmatch-ingest -- [fetch|embed|all]

use std::collections::HashSet;
use std::time::Duration;
use tracing::{error, info};
use trialmatch::config::Settings;
use trialmatch::models::Trial;
use trialmatch::services::{
    load_raw_trials, save_raw_trials, CatalogError, EmbeddingClient, FetchOptions,
    RegistryClient, RegistryError, TrialCatalog,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Fetch,
    Embed,
    All,
}

impl Stage {
    fn parse(arg: Option<&str>) -> Option<Self> {
        match arg {
            None | Some("all") => Some(Stage::All),
            Some("fetch") => Some(Stage::Fetch),
            Some("embed") => Some(Stage::Embed),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum IngestError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Embedding client error: {0}")]
    Embedding(#[from] trialmatch::services::EmbeddingError),
}

async fn fetch(settings: &Settings) -> Result<Vec<Trial>, IngestError> {
    let registry = RegistryClient::new(settings.registry.base_url.clone())?;
    let options = FetchOptions {
        page_size: settings.registry.page_size,
        max_trials: settings.registry.max_trials,
        request_delay: Duration::from_millis(settings.registry.request_delay_ms),
        excluded_statuses: settings
            .registry
            .excluded_statuses
            .iter()
            .map(|s| s.to_uppercase())
            .collect::<HashSet<_>>(),
    };

    // Trials found under several terms are kept once per term, as the registry returns them
    let mut all_trials = Vec::new();
    for term in &settings.registry.search_terms {
        info!("Searching for trials matching '{}'", term);
        let trials = registry.fetch_trials(term, &options).await?;
        info!("Collected {} trials for '{}'", trials.len(), term);
        all_trials.extend(trials);
    }

    save_raw_trials(&settings.catalog.raw_path, &all_trials)?;
    info!("Saved {} trials to {}", all_trials.len(), settings.catalog.raw_path);

    Ok(all_trials)
}

async fn embed(settings: &Settings, trials: Vec<Trial>) -> Result<(), IngestError> {
    let embedder = EmbeddingClient::new(
        settings.embedding.endpoint.clone(),
        settings.embedding.model.clone(),
        settings.embedding.timeout_secs,
    )?;

    let catalog = TrialCatalog::vectorize(trials, &embedder).await?;
    catalog.save(&settings.catalog.path)?;
    info!("Embedded {} trials, catalog saved to {}", catalog.len(), settings.catalog.path);

    Ok(())
}

async fn run(settings: &Settings, stage: Stage) -> Result<(), IngestError> {
    match stage {
        Stage::Fetch => {
            fetch(settings).await?;
        }
        Stage::Embed => {
            let trials = load_raw_trials(&settings.catalog.raw_path)?;
            embed(settings, trials).await?;
        }
        Stage::All => {
            let trials = fetch(settings).await?;
            embed(settings, trials).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let settings = Settings::load();
    settings
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default()
        .init();

    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let arg = std::env::args().nth(1);
    let Some(stage) = Stage::parse(arg.as_deref()) else {
        error!("Unknown stage {:?}; expected fetch, embed or all", arg);
        std::process::exit(2);
    };

    if let Err(e) = run(&settings, stage).await {
        error!("Ingestion failed: {}", e);
        std::process::exit(1);
    }
}
