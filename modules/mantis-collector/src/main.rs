use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, info_span, Instrument};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use mantis_collector::fetcher::HttpFetcher;
use mantis_collector::parser::RegexParser;
use mantis_collector::pipeline::metrics::success_rate;
use mantis_collector::pipeline::{build_work_items, run_batches, Orchestrator, PipelineConfig};
use mantis_common::{AppConfig, CollectorConfigs};
use mantis_graph::GraphClient;

/// Collect parsed web data into the graph, one batch at a time.
#[derive(Parser, Debug)]
#[command(name = "mantis-collector", version)]
struct Args {
    /// Name of the parsing config to run.
    #[arg(long)]
    name: String,

    /// Cypher query producing the driving parameter rows (`RETURN ... AS params`).
    #[arg(long, default_value = "")]
    query: String,

    /// Batch size, and workers per stage.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    size: u32,

    /// Seconds to wait between batches.
    #[arg(long, default_value_t = 90)]
    delay: u64,

    /// Collector config file. Defaults to $BASE_PATH/config/collector/collector.json.
    #[arg(long, env = "MANTIS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::from_env()?;
    init_logging(&config)?;

    let run_id = uuid::Uuid::new_v4();
    let span = info_span!("collection", %run_id, name = args.name.as_str());
    let result = run(args, config).instrument(span).await;
    if let Err(e) = &result {
        error!(error = %e, "Collection aborted");
    }
    result
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("opening log file {}", config.log_file.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("mantis=info".parse()?))
        .with(fmt::layer())
        .with(fmt::layer().json().with_ansi(false).with_writer(Mutex::new(file)))
        .init();
    Ok(())
}

async fn run(args: Args, config: AppConfig) -> Result<()> {
    info!(status = "start", name = args.name.as_str(), query = args.query.as_str(), "COLLECTION");
    config.log_redacted();

    let config_path = args.config.clone().unwrap_or_else(|| config.collector_config.clone());
    let collector = CollectorConfigs::load(&config_path)?.select(&args.name)?;
    let parser = RegexParser::compile(&collector.parser)?;

    let client = GraphClient::from_config(&config)
        .await
        .context("connecting to Neo4j")?;

    let rows = client.reader().query_params(&args.query).await?;
    let items = build_work_items(rows, &collector);
    info!(items = items.len(), sources = collector.sources.len(), "Work items built");

    let pipeline = PipelineConfig {
        size: args.size as usize,
        delay: Duration::from_secs(args.delay),
    };
    let orchestrator = Orchestrator::new(
        Arc::new(HttpFetcher::new()?),
        Arc::new(parser),
        Arc::new(client),
        pipeline.size,
    );
    let summary = run_batches(&orchestrator, items, pipeline, &orchestrator.cancellation_token()).await?;

    info!(
        batches = summary.batches,
        http_success = success_rate(summary.fetch_pass, summary.total).as_str(),
        db_success = success_rate(summary.persist_pass, summary.total).as_str(),
        total = summary.total,
        "RUN STATS"
    );
    info!(status = "end", name = args.name.as_str(), query = args.query.as_str(), "COLLECTION");
    Ok(())
}
