mod config;
mod detail;
mod input;
mod outcome;
mod pipeline;
mod search;
mod transport;

pub const USER_AGENT: &str = concat!("patent-harvest/", env!("CARGO_PKG_VERSION"));

use std::num::NonZeroUsize;

use clap::Parser;
use config::{CliArgs, Config};
use detail::DetailExtractor;
use pipeline::CollectionPipeline;
use pipeline::aggregate::{ConcurrentAggregator, RowSink};
use search::SearchClient;
use tracing::info;
use transport::RetryingTransport;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("patent_harvest=info".parse()?),
        )
        .init();

    let parallelism = std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN);
    let config = Config::from_args(CliArgs::parse(), parallelism)?;

    let mut tasks = input::read_tasks(&config.input)
        .inspect_err(|e| tracing::error!("failed to load {}: {e}", config.input.display()))?;
    if let Some(limit) = config.limit {
        tasks.truncate(limit);
    }

    info!(
        companies = tasks.len(),
        width = config.width,
        output = %config.output.display(),
        "starting patent harvest"
    );

    let transport = RetryingTransport::new(transport::http_client()?, config.retry);
    let pipeline = CollectionPipeline::new(
        SearchClient::new(transport.clone(), config.endpoints.clone()),
        DetailExtractor::new(transport),
    );
    let mut sink = RowSink::create(&config.output)?;

    let summary = ConcurrentAggregator::new(config.width)
        .with_progress()?
        .run(&pipeline, tasks, &mut sink)
        .await?;

    info!(
        companies = summary.companies,
        empty = summary.empty_companies,
        rows = summary.rows,
        "harvest finished"
    );
    Ok(())
}
