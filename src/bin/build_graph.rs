use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use wikigraph::flatfile::{dump_triplets, load_entities, load_triplets};
use wikigraph::{build_from_cache, Config, Graph, GraphBuilder, SparqlClient, WikidataClient};

#[derive(Parser, Debug)]
#[command(name = "build-graph")]
#[command(about = "Build the relation graph between a set of Wikidata entities")]
struct Args {
    /// Entity list, one id per line
    #[arg(short, long)]
    entities: PathBuf,

    /// Output triplet file
    #[arg(short, long)]
    out: PathBuf,

    /// Previously fetched triplet file; replayed instead of querying Wikidata
    #[arg(short, long)]
    cache: Option<PathBuf>,

    /// Query Wikidata even with --cache, and merge both graphs
    #[arg(short, long, requires = "cache")]
    merge: bool,

    /// Pairs per SPARQL request (overrides graph.batch_size)
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

    log::info!("Starting graph construction");

    let entities = load_entities(&args.entities)
        .with_context(|| format!("Failed to load entities from {}", args.entities.display()))?;
    log::info!("Loaded {} entities from {}", entities.len(), args.entities.display());

    let cached = match &args.cache {
        Some(path) => {
            let triplets = load_triplets(path)
                .with_context(|| format!("Failed to load cached graph from {}", path.display()))?;
            log::info!("Loaded {} cached triplets from {}", triplets.len(), path.display());
            Some(build_from_cache(&entities, &triplets))
        }
        None => None,
    };

    let start = Instant::now();

    let graph: Graph = match cached {
        Some(cached) if !args.merge => {
            log::info!("Replaying cached graph: {} triplets within the entity set", cached.len());
            cached.into_iter().collect()
        }
        cached => {
            let batch_size = args.batch_size.unwrap_or(config.graph.batch_size);
            let client = WikidataClient::new(SparqlClient::new(&config.sparql)?);
            let builder = GraphBuilder::new(client)
                .with_batch_size(batch_size)
                .with_retry_policy(config.retry_policy());

            let fresh = builder.build_by_query(&entities).await?;

            let mut graph: Graph = cached.unwrap_or_default().into_iter().collect();
            let from_cache = graph.len();
            let added = graph.merge(fresh);
            if from_cache > 0 {
                log::info!(
                    "Merged graphs: {} cached, {} new, {} total",
                    from_cache,
                    added,
                    graph.len()
                );
            }
            graph
        }
    };

    let written = dump_triplets(&args.out, &graph)
        .with_context(|| format!("Failed to write graph to {}", args.out.display()))?;

    log::info!("=== Graph Complete ===");
    log::info!("Entities: {}", entities.len());
    log::info!("Entities with at least one edge: {}", graph.entities().len());
    log::info!("Triplets written: {} -> {}", written, args.out.display());
    log::info!("Time: {:?}", start.elapsed());

    Ok(())
}
