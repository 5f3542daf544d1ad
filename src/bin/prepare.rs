use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use wikigraph::flatfile::load_entities;
use wikigraph::prepare::{dump_prepared, prepared_path};
use wikigraph::{prepare_captions, Config, EntityId, MetadataKind, MetadataStore};

#[derive(Parser, Debug)]
#[command(name = "prepare")]
#[command(about = "Package entities with their captions (description, else label) as JSON")]
struct Args {
    /// Entity list, one id per line
    #[arg(short, long)]
    entities: PathBuf,

    /// Descriptions value file (defaults to descriptions.txt next to the entity list)
    #[arg(short, long)]
    descriptions: Option<PathBuf>,

    /// Labels value file (defaults to labels.txt next to the entity list)
    #[arg(short, long)]
    labels: Option<PathBuf>,

    /// Output JSON file (defaults to <entities>_prepared)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
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

    let dir = args
        .entities
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let descriptions_path = args
        .descriptions
        .clone()
        .unwrap_or_else(|| dir.join(MetadataKind::Description.file_name()));
    let labels_path = args
        .labels
        .clone()
        .unwrap_or_else(|| dir.join(MetadataKind::Label.file_name()));

    let entity_ids: Vec<EntityId> = load_entities(&args.entities)
        .with_context(|| format!("Failed to load entities from {}", args.entities.display()))?
        .into_iter()
        .collect();
    let descriptions = MetadataStore::load(&descriptions_path)
        .with_context(|| format!("Failed to load {}", descriptions_path.display()))?;
    let labels = MetadataStore::load(&labels_path)
        .with_context(|| format!("Failed to load {}", labels_path.display()))?;

    let prepared = prepare_captions(&entity_ids, &labels, &descriptions);
    let uncaptioned = prepared.values().filter(|p| p.caption.is_none()).count();

    let out = args.out.clone().unwrap_or_else(|| prepared_path(&args.entities));
    dump_prepared(&out, &prepared)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    log::info!("=== Prepare Complete ===");
    log::info!("Entities: {}", prepared.len());
    log::info!("Without caption: {}", uncaptioned);
    log::info!("Output: {}", out.display());

    Ok(())
}
