use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use genremap_client::{MusicBrainzExtractor, ReqwestFetcher};
use genremap_core::config::{self, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, ScrapeConfig};
use genremap_core::document;
use genremap_core::{ScrapeService, TracingPipelineReporter};

#[derive(Parser)]
#[command(
    name = "genremap",
    version,
    about = "Scrape MusicBrainz genre relationships into a closed genre graph"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch relationships for every genre in a stub document
    Scrape(ScrapeArgs),

    /// Drop relation edges that point at genres missing from a relation document
    Filter {
        /// Relation document produced by `scrape`
        input: PathBuf,

        /// Where to write the filtered document
        #[arg(short, long, default_value = "filtered_genres.json")]
        output: PathBuf,
    },

    /// Print the genre ids of a stub document, one per line
    Ids {
        /// Stub document with a top-level "genres" array
        input: PathBuf,

        /// Only genres whose name contains this text (case-insensitive)
        #[arg(short, long)]
        name_contains: Option<String>,

        /// Write ids to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ScrapeArgs {
    /// Stub document with a top-level "genres" array
    input: PathBuf,

    /// Where to write the relation document
    #[arg(short, long, default_value = "output.json")]
    output: PathBuf,

    /// Seconds between requests
    #[arg(short, long, env = "GENREMAP_DELAY", default_value_t = 0.5)]
    delay: f64,

    /// Maximum random extra delay per request, in seconds
    #[arg(long, env = "GENREMAP_JITTER", default_value_t = 0.0)]
    jitter: f64,

    /// Request timeout in seconds
    #[arg(short, long, env = "GENREMAP_TIMEOUT", default_value_t = 30.0)]
    timeout: f64,

    /// Genres fetched and parsed at once
    #[arg(short, long, env = "GENREMAP_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Genre page URL prefix; the genre id is appended
    #[arg(long, env = "GENREMAP_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// User-Agent sent with every request
    #[arg(long, env = "GENREMAP_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Keep edges to genres outside the stub set
    #[arg(long, default_value_t = false)]
    no_filter: bool,
}

impl ScrapeArgs {
    fn config(&self) -> Result<ScrapeConfig> {
        let config = ScrapeConfig::default()
            .with_base_url(&self.base_url)
            .with_user_agent(&self.user_agent)
            .with_delay(config::seconds(self.delay, "delay")?)
            .with_jitter(config::seconds(self.jitter, "jitter")?)
            .with_timeout(config::seconds(self.timeout, "timeout")?)
            .with_concurrency(self.concurrency);
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Diagnostics go to stderr; documents go to files or stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("genremap=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape(args) => cmd_scrape(&args).await?,
        Commands::Filter { input, output } => cmd_filter(&input, &output)?,
        Commands::Ids {
            input,
            name_contains,
            output,
        } => cmd_ids(&input, name_contains.as_deref(), output.as_deref())?,
    }

    Ok(())
}

async fn cmd_scrape(args: &ScrapeArgs) -> Result<()> {
    let config = args.config()?;

    // Unreadable input aborts before any request is made
    let stubs = document::load_stubs(&args.input)
        .with_context(|| format!("Failed to load genres from {}", args.input.display()))?;

    let fetcher = ReqwestFetcher::from_config(&config).context("Failed to create HTTP client")?;
    let extractor = MusicBrainzExtractor::new()?;
    let service = ScrapeService::new(fetcher, extractor, config);

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let reporter = TracingPipelineReporter;
    let graph = if args.no_filter {
        service.scrape_all(&stubs, &cancel, &reporter).await?
    } else {
        service.run(&stubs, &cancel, &reporter).await?
    };

    document::write_records(&args.output, &graph)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    tracing::info!(
        genres = graph.len(),
        output = %args.output.display(),
        "Done"
    );

    Ok(())
}

fn cmd_filter(input: &Path, output: &Path) -> Result<()> {
    let graph = document::load_records(input)
        .with_context(|| format!("Failed to load relation document {}", input.display()))?;

    let (graph, removed) = graph.remove_dangling_edges();
    document::write_records(output, &graph)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(
        genres = graph.len(),
        removed_edges = removed,
        output = %output.display(),
        "Filtered relation document"
    );

    Ok(())
}

fn cmd_ids(input: &Path, name_contains: Option<&str>, output: Option<&Path>) -> Result<()> {
    let stubs = document::load_stubs(input)
        .with_context(|| format!("Failed to load genres from {}", input.display()))?;

    let ids = document::select_ids(&stubs, name_contains);
    let mut text = String::new();
    for id in &ids {
        text.push_str(&id.to_string());
        text.push('\n');
    }

    match output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(count = ids.len(), output = %path.display(), "Wrote genre ids");
        }
        None => print!("{text}"),
    }

    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("Interrupt received, stopping");
        cancel.cancel();
    }
}
