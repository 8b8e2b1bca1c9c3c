//! Offline knowledge index builder. Rebuilds happen here, before query
//! traffic starts; the serving process only ever loads the persisted index.

use anyhow::Result;
use clap::Parser;
use insura::config::Config;
use insura::embeddings::create_embedder;
use insura::index::KnowledgeIndex;
use tracing::info;

#[derive(Parser)]
#[command(name = "kb_index", version)]
struct Args {
    /// Rebuild from the corpus even if a persisted index exists
    #[arg(long)]
    rebuild: bool,
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
    let index = if args.rebuild {
        let mut index = KnowledgeIndex::create(config.retrieval.index_path.clone(), embedder);
        index.build(&config.retrieval.knowledge_dir).await?;
        index
    } else {
        KnowledgeIndex::open(
            &config.retrieval.knowledge_dir,
            &config.retrieval.index_path,
            embedder,
        )
        .await?
    };

    info!(
        "Index ready: {} documents at {}",
        index.len(),
        config.retrieval.index_path
    );
    Ok(())
}
