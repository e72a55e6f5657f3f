use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::transport::RetryPolicy;

pub const GOOGLE_QUERY_URL: &str = "https://patents.google.com/xhr/query";
pub const GOOGLE_PATENT_PAGE_URL: &str = "https://patents.google.com/patent/";
pub const GOOGLE_PATENT_PDF_URL: &str = "https://patentimages.storage.googleapis.com/";

pub const RESULTS_PER_PAGE: u32 = 20;
const DEFAULT_WIDTH_MULTIPLIER: usize = 15;

/// Where search queries, patent pages and PDFs live.
///
/// The page and PDF values are prefixes; identifiers are appended verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub query_url: String,
    pub patent_page_url: String,
    pub pdf_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            query_url: GOOGLE_QUERY_URL.to_string(),
            patent_page_url: GOOGLE_PATENT_PAGE_URL.to_string(),
            pdf_url: GOOGLE_PATENT_PDF_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Endpoints rooted at a single base URL, laid out like the public service.
    #[cfg(test)]
    pub fn rooted_at(base: &str) -> Self {
        Self {
            query_url: format!("{base}/xhr/query"),
            patent_page_url: format!("{base}/patent/"),
            pdf_url: format!("{base}/pdf/"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("--width-multiplier {multiplier} is too large for {cpus} CPUs")]
    WidthOverflow { multiplier: usize, cpus: usize },
}

/// Collect patent metadata for every company in a deal table.
#[derive(Parser, Debug)]
#[command(name = "patent-harvest", version)]
pub struct CliArgs {
    /// CSV with `comnam_tar`, `deal_number` and `anndate` columns.
    /// Spreadsheet exports (.xls/.xlsx) must be saved as CSV first
    #[arg(long, env = "PATENT_HARVEST_INPUT")]
    pub input: PathBuf,

    /// Destination CSV, overwritten if it exists
    #[arg(long, env = "PATENT_HARVEST_OUTPUT", default_value = "patent_output.csv")]
    pub output: PathBuf,

    /// Concurrent companies per available CPU
    #[arg(long, default_value_t = DEFAULT_WIDTH_MULTIPLIER)]
    pub width_multiplier: usize,

    /// Exact number of concurrent companies (overrides --width-multiplier)
    #[arg(long)]
    pub width: Option<usize>,

    /// Attempts per request on connection/TLS failures
    #[arg(long, default_value_t = RetryPolicy::default().max_attempts)]
    pub max_attempts: u32,

    /// Seconds to wait between attempts
    #[arg(long, default_value_t = 5)]
    pub retry_delay_secs: u64,

    /// Only process the first N companies
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub width: usize,
    pub retry: RetryPolicy,
    pub limit: Option<usize>,
    pub endpoints: Endpoints,
}

impl Config {
    pub fn from_args(args: CliArgs, parallelism: NonZeroUsize) -> Result<Self, ConfigError> {
        let width = match args.width {
            Some(width) => width,
            None => parallelism
                .get()
                .checked_mul(args.width_multiplier)
                .ok_or(ConfigError::WidthOverflow {
                    multiplier: args.width_multiplier,
                    cpus: parallelism.get(),
                })?,
        };
        if width == 0 {
            return Err(ConfigError::Zero("concurrency width"));
        }
        if args.max_attempts == 0 {
            return Err(ConfigError::Zero("--max-attempts"));
        }
        Ok(Self {
            input: args.input,
            output: args.output,
            width,
            retry: RetryPolicy {
                max_attempts: args.max_attempts,
                delay: Duration::from_secs(args.retry_delay_secs),
            },
            limit: args.limit,
            endpoints: Endpoints::default(),
        })
    }
}
