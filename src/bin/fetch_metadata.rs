use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use wikigraph::flatfile::load_entities;
use wikigraph::{Config, EntityId, MetadataFetcher, MetadataKind, MetadataStore, SparqlClient, WikidataClient};

#[derive(Parser, Debug)]
#[command(name = "fetch-metadata")]
#[command(about = "Fetch redirections, labels and descriptions for Wikidata entities (resumes from existing files)")]
struct Args {
    /// Entity list, one id per line
    #[arg(short, long)]
    entities: PathBuf,

    /// Directory for redirections.txt, labels.txt and descriptions.txt
    /// (defaults to the entity list's directory)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Entities per SPARQL request (overrides metadata.batch_size)
    #[arg(short, long)]
    batch_size: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load_or_default()?;

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", &config.wikigraph.log_level)
    ).init();

    match &config.source {
        Some(path) => log::info!("Configuration loaded from {}", path.display()),
        None => log::info!("No config file found, using defaults"),
    }

    let entities = load_entities(&args.entities)
        .with_context(|| format!("Failed to load entities from {}", args.entities.display()))?;
    let entities: Vec<EntityId> = entities.into_iter().collect();
    log::info!("Loaded {} entities from {}", entities.len(), args.entities.display());

    let out_dir = args.out_dir.clone().unwrap_or_else(|| {
        args.entities
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let client = WikidataClient::new(SparqlClient::new(&config.sparql)?);
    let fetcher = MetadataFetcher::new(client)
        .with_batch_size(args.batch_size.unwrap_or(config.metadata.batch_size))
        .with_checkpoint_every(config.metadata.checkpoint_every)
        .with_retry_policy(config.retry_policy());

    let start = Instant::now();

    for kind in [MetadataKind::Redirection, MetadataKind::Label, MetadataKind::Description] {
        let path = out_dir.join(kind.file_name());
        let mut store = MetadataStore::load_or_empty(&path)
            .with_context(|| format!("Failed to read existing {}", path.display()))?;
        if !store.is_empty() {
            log::info!("Resuming {} from {} ({} entries)", kind, path.display(), store.len());
        }

        let fetched = fetcher.fetch(kind, &entities, &mut store, Some(&path)).await?;

        let missing = entities
            .iter()
            .filter(|e| store.value(e.as_str()).is_none())
            .count();
        store.dump(&path)?;

        log::info!(
            "{}: fetched {}, {} without a value, written to {}",
            kind,
            fetched,
            missing,
            path.display()
        );
    }

    log::info!("=== Metadata Complete ===");
    log::info!("Time: {:?}", start.elapsed());

    Ok(())
}
