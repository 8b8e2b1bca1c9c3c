use anyhow::{Context, Result};
use clap::Parser;
use insura::clients::create_backend;
use insura::config::Config;
use insura::embeddings::create_embedder;
use insura::index::KnowledgeIndex;
use insura::models::Profile;
use insura::pipeline::{Pipeline, StrategizeMode};
use insura::store::{MemoryProfileStore, ProfileStore, demo_profile};
use std::sync::Arc;
use tracing::info;

/// Generate an insurance strategy recommendation for a profile.
#[derive(Parser)]
#[command(name = "insura", version)]
struct Args {
    /// Path to a profile JSON file; the built-in demo profile when omitted
    #[arg(long)]
    profile: Option<std::path::PathBuf>,

    /// Strategize via the generation backend instead of the rule engine
    #[arg(long)]
    generative: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    insura::load_env();
    let args = Args::parse();

    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(config.runtime.log_level.clone())
        .init();

    let embedder = create_embedder(&config)?;
    let index = Arc::new(
        KnowledgeIndex::open(
            &config.retrieval.knowledge_dir,
            &config.retrieval.index_path,
            embedder,
        )
        .await?,
    );
    let backend = create_backend(&config)?;
    info!(
        "Pipeline ready (index docs={}, backend={})",
        index.len(),
        backend.name()
    );

    let mode = if args.generative {
        StrategizeMode::Generative
    } else {
        StrategizeMode::Heuristic
    };
    let pipeline = Pipeline::new(index, backend, config.retrieval.clone()).with_mode(mode);

    let profile = load_profile(&args).await?;
    let outcome = pipeline.run(&profile).await?;

    println!("{}", serde_json::to_string_pretty(&outcome.artifact)?);
    Ok(())
}

async fn load_profile(args: &Args) -> Result<Profile> {
    match &args.profile {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read profile {path:?}"))?;
            let profile: Profile = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse profile {path:?}"))?;
            profile.validate()?;
            Ok(profile)
        }
        None => {
            // Route the demo through the store so the ingestion boundary is
            // exercised the same way a real lookup would be.
            let mut store = MemoryProfileStore::new();
            store.insert("demo", demo_profile())?;
            Ok(store.fetch("demo").await?)
        }
    }
}
