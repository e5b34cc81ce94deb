mod config;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rethread_fetch::{FetchCoordinator, FetchError};
use rethread_persist::{InMemoryStore, ItemStore};
use rethread_source::PullPushClient;
use rethread_tree::{build, render_thread, ThreadMetadata};
use rethread_types::CacheMode;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "rethread")]
#[command(about = "Incremental Reddit author and thread cache with reply trees", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Cache mode: default, no_cache, cache_only, full_save (or 0-3)
    #[arg(short, long, global = true)]
    mode: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch everything an author posted and replied
    User { author: String },

    /// Fetch a thread and rebuild its reply tree
    Thread {
        thread_id: String,

        /// Print the thread as a numbered text document
        #[arg(long)]
        render: bool,
    },

    /// Mark a thread's cache incomplete so the next fetch starts over
    Invalidate { thread_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::load()
        .map_err(|e| anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    // Rejected before any I/O
    let mode: CacheMode = cli
        .mode
        .as_deref()
        .unwrap_or(&config.fetch.mode)
        .parse()
        .map_err(FetchError::from)?;

    let store = open_store(&config).await?;
    let source = Arc::new(PullPushClient::new((&config.source).into())?);
    let coordinator = FetchCoordinator::new(store, source).with_config((&config.fetch).into());

    match cli.command {
        Commands::User { author } => {
            let fetch = coordinator.fetch_author(&author, mode).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&fetch.items)?);
            } else {
                println!(
                    "{}: {} posts, {} replies ({} fetched, mode {})",
                    author,
                    fetch.items.posts.len(),
                    fetch.items.replies.len(),
                    fetch.fetched,
                    mode
                );
            }
        }
        Commands::Thread { thread_id, render } => {
            let fetch = coordinator.fetch_thread(&thread_id, mode).await?;
            let forest = build(&thread_id, &fetch.post, &fetch.replies)?;

            if render {
                println!("{}", render_thread(&fetch.post, &forest));
            } else if cli.json {
                println!("{}", serde_json::to_string_pretty(&forest)?);
            } else {
                let metadata = ThreadMetadata::from_thread(&fetch.post, &forest);
                let complete = fetch.cursor.as_ref().is_some_and(|c| c.history_complete);
                println!(
                    "{} \"{}\": {} replies, {} roots, {} orphans, complete: {} ({} fetched, {:?})",
                    metadata.id,
                    metadata.title,
                    metadata.num_replies,
                    forest.roots.len(),
                    metadata.num_orphans,
                    complete,
                    fetch.fetched,
                    fetch.plan.strategy
                );
            }
        }
        Commands::Invalidate { thread_id } => match coordinator.invalidate_thread(&thread_id).await? {
            Some(_) => println!("{}: marked incomplete", thread_id),
            None => println!("{}: never fetched, nothing to invalidate", thread_id),
        },
    }

    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn ItemStore>> {
    match config.store.backend.as_str() {
        "mongodb" => open_mongo(config).await,
        "memory" => {
            tracing::warn!("Using the in-memory store: cached items and cursors end with this process");
            Ok(Arc::new(InMemoryStore::new()))
        }
        other => Err(anyhow!("Unknown store backend: {}", other)),
    }
}

#[cfg(feature = "mongodb")]
async fn open_mongo(config: &Config) -> anyhow::Result<Arc<dyn ItemStore>> {
    let uri = config
        .mongodb_uri
        .as_deref()
        .ok_or_else(|| anyhow!("MONGODB_URI environment variable is required for the mongodb backend"))?;

    tracing::info!("Connecting to MongoDB");
    let store = rethread_persist::MongoItemStore::connect(uri, &config.store.database).await?;
    tracing::info!("MongoDB connected");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "mongodb"))]
async fn open_mongo(_config: &Config) -> anyhow::Result<Arc<dyn ItemStore>> {
    Err(anyhow!("The mongodb backend requires building with the `mongodb` feature"))
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so stdout stays clean for results
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
