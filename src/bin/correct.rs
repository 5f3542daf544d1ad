use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use wikigraph::correct::{
    correct_entities, correct_samples, dump_samples, load_samples, Overrides, Redirections,
};
use wikigraph::flatfile::{dump_entities, load_entities};
use wikigraph::{Config, EntityId, MetadataKind, MetadataStore};

const SPLITS: [&str; 3] = ["train", "dev", "test"];

#[derive(Parser, Debug)]
#[command(name = "correct")]
#[command(about = "Move entities, labels, descriptions and dataset splits onto canonical Wikidata ids")]
struct Args {
    /// Directory holding entity_ids.txt, labels.txt, descriptions.txt and the dataset splits
    #[arg(short, long)]
    dir: PathBuf,

    /// Output directory for the corrected files
    #[arg(short, long)]
    out_dir: PathBuf,

    /// Redirections value file (defaults to <dir>/redirections.txt)
    #[arg(short, long)]
    redirections: Option<PathBuf>,

    /// Manually curated entity fixes (defaults to <dir>/missing_entities.json)
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Seed for picking replacement wrong ids
    #[arg(long)]
    seed: Option<u64>,
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

    let entities_path = args.dir.join("entity_ids.txt");
    let entity_ids: Vec<EntityId> = load_entities(&entities_path)
        .with_context(|| format!("Failed to load {}", entities_path.display()))?
        .into_iter()
        .collect();

    let mut labels = MetadataStore::load(&args.dir.join(MetadataKind::Label.file_name()))
        .context("Failed to load labels")?;
    let mut descriptions = MetadataStore::load(&args.dir.join(MetadataKind::Description.file_name()))
        .context("Failed to load descriptions")?;

    let redirections_path = args
        .redirections
        .clone()
        .unwrap_or_else(|| args.dir.join(MetadataKind::Redirection.file_name()));
    let mut redirections = Redirections::from_store(
        &MetadataStore::load(&redirections_path)
            .with_context(|| format!("Failed to load {}", redirections_path.display()))?,
    );
    log::info!(
        "Loaded {} entities, {} labels, {} descriptions, {} redirections",
        entity_ids.len(),
        labels.len(),
        descriptions.len(),
        redirections.len()
    );

    let overrides_path = args
        .overrides
        .clone()
        .unwrap_or_else(|| args.dir.join("missing_entities.json"));
    if overrides_path.exists() {
        let overrides = Overrides::load(&overrides_path)
            .with_context(|| format!("Failed to load {}", overrides_path.display()))?;
        log::info!("Applying {} manual overrides", overrides.0.len());
        overrides.apply(&mut labels, &mut descriptions, &mut redirections);
    } else {
        log::warn!(
            "File {} not found, proceeding without manual overrides",
            overrides_path.display()
        );
    }

    let corrected = correct_entities(&entity_ids, labels, descriptions, &redirections);

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    dump_entities(&args.out_dir.join("entity_ids.txt"), &corrected.entity_ids)?;
    corrected.labels.dump(&args.out_dir.join(MetadataKind::Label.file_name()))?;
    corrected.descriptions.dump(&args.out_dir.join(MetadataKind::Description.file_name()))?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let valid = corrected.valid_ids();

    for split in SPLITS {
        let name = format!("wikidata-disambig-{}.json", split);
        let path = args.dir.join(&name);
        if !path.exists() {
            log::warn!("Split {} not found, skipping", path.display());
            continue;
        }

        let samples = load_samples(&path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        let before = samples.len();
        let samples = correct_samples(samples, &redirections, &valid, &mut rng)?;
        dump_samples(&args.out_dir.join(&name), &samples)?;

        log::info!("{}: kept {} of {} samples", split, samples.len(), before);
    }

    log::info!("=== Correction Complete ===");
    log::info!("Entities kept: {}", corrected.entity_ids.len());
    log::info!("Entities removed (no label): {}", corrected.removed.len());
    log::info!("Output: {}", args.out_dir.display());

    Ok(())
}
