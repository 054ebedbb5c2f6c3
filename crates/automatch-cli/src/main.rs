//! AutoMatch CLI - resolve missing model references from the command line.
//!
//! Every command prints JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use automatch_core::{
    extract_search_terms, AutoMatcher, EngineConfig, IndexConfig, MatchRequest, RefreshPolicy,
    SemanticFingerprint,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "automatch")]
#[command(about = "Find local replacements or download candidates for missing models")]
struct Args {
    /// Engine configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Index snapshot location (overrides the configuration)
    #[arg(long)]
    index: Option<PathBuf>,

    /// Models root laid out as <root>/<model_type>/...
    #[arg(short, long, default_value = "models")]
    models_root: PathBuf,

    /// Refresh policy: rebuild-per-call or explicit-refresh
    #[arg(long)]
    refresh: Option<RefreshPolicy>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile the index with the models root
    Scan,
    /// Resolve model references to local files
    Match {
        /// JSON file with a list of requests ("-" for stdin)
        #[arg(long, conflicts_with = "values")]
        requests: Option<PathBuf>,

        /// Reconcile before matching
        #[arg(long)]
        rescan: bool,

        /// Filenames to resolve
        values: Vec<String>,
    },
    /// Look up a remote download candidate
    Search {
        filename: String,

        /// Bypass the result cache
        #[arg(long)]
        ignore_cache: bool,
    },
    /// Show how filenames are classified
    Classify { filenames: Vec<String> },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Classification {
    filename: String,
    #[serde(flatten)]
    fingerprint: SemanticFingerprint,
    search_terms: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact();
    if std::env::var_os("RUST_LOG").is_some() {
        subscriber.with_env_filter(EnvFilter::from_default_env()).init();
    } else {
        subscriber.with_max_level(log_level).init();
    }

    let config = load_config(&args)?;

    match args.command {
        Command::Classify { filenames } => {
            let classified: Vec<Classification> = filenames
                .into_iter()
                .map(|filename| Classification {
                    fingerprint: SemanticFingerprint::of(&filename),
                    search_terms: extract_search_terms(&filename),
                    filename,
                })
                .collect();
            print_json(&classified)
        }
        Command::Scan => {
            let mut matcher = build_matcher(config, &args.models_root)?;
            let report = matcher.reconcile()?;
            print_json(&report)
        }
        Command::Match {
            requests,
            rescan,
            values,
        } => {
            let requests = match requests {
                Some(path) => read_requests(&path)?,
                None => values
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| MatchRequest::new(i, value))
                    .collect(),
            };

            let mut matcher = build_matcher(config, &args.models_root)?;
            if rescan || matcher.index().is_empty() {
                matcher.reconcile()?;
            }
            let results = matcher.match_batch(&requests)?;
            print_json(&results)
        }
        Command::Search {
            filename,
            ignore_cache,
        } => {
            let matcher = build_matcher(config, &args.models_root)?;
            let candidate = matcher
                .search_service()
                .search(&filename, ignore_cache)
                .await?;
            print_json(&candidate)
        }
    }
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if let Some(index) = &args.index {
        config.index_path = index.clone();
    } else if config.index_path.is_relative() {
        if let Some(data_dir) = dirs::data_local_dir() {
            config.index_path = data_dir.join("automatch").join(IndexConfig::INDEX_FILENAME);
        }
    }

    if let Some(policy) = args.refresh {
        config.refresh_policy = policy;
    }

    Ok(config)
}

fn build_matcher(config: EngineConfig, models_root: &Path) -> Result<AutoMatcher> {
    info!("Models root: {}", models_root.display());
    info!("Index: {}", config.index_path.display());
    let matcher = AutoMatcher::builder(config)
        .models_root(models_root)
        .build()?;
    Ok(matcher)
}

fn read_requests(path: &Path) -> Result<Vec<MatchRequest>> {
    let contents = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&contents).context("Requests must be a JSON list of match requests")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
