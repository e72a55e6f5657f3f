//! Patent detail pages: download and field extraction.

pub mod extractor;

pub use extractor::{Extract, RegexExtractor};

use tracing::warn;

use crate::outcome::Outcome;
use crate::transport::{FetchError, RetryingTransport};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatentDetail {
    pub citation_count: u64,
    pub inventors: Vec<String>,
}

/// Source of per-patent details.
/// Implemented by `DetailExtractor` for production; mock implementations used in tests.
pub trait PatentDetails {
    async fn fetch_and_extract(&self, url: &str) -> Outcome<PatentDetail>;
}

#[derive(Clone)]
pub struct DetailExtractor<X = RegexExtractor> {
    transport: RetryingTransport,
    extract: X,
}

impl DetailExtractor {
    pub fn new(transport: RetryingTransport) -> Self {
        Self::with_extractor(transport, RegexExtractor)
    }
}

impl<X: Extract> DetailExtractor<X> {
    pub fn with_extractor(transport: RetryingTransport, extract: X) -> Self {
        Self { transport, extract }
    }

    /// Page HTML, or an empty document when it could not be retrieved.
    pub async fn get_html(&self, url: &str) -> Outcome<String> {
        let result = self.transport.get_text(url).await;
        if let Err(e) = &result {
            warn!(url = %url, error = %e, "patent page unavailable");
        }
        Outcome::from_result(result, String::new)
    }
}

impl<X: Extract + Clone + Send + 'static> DetailExtractor<X> {
    /// Scans `html` on the blocking pool. Pages run to several megabytes and
    /// every company in flight shares the caller's task.
    async fn extract_blocking(&self, html: String) -> Result<PatentDetail, FetchError> {
        let extract = self.extract.clone();
        tokio::task::spawn_blocking(move || detail_from(&extract, &html))
            .await
            .map_err(|e| FetchError::Malformed(format!("extraction aborted: {e}")))
    }
}

fn detail_from(extract: &impl Extract, html: &str) -> PatentDetail {
    PatentDetail {
        citation_count: extract.extract_citation_total(html),
        inventors: extract.extract_inventors(html),
    }
}

impl<X: Extract + Clone + Send + 'static> PatentDetails for DetailExtractor<X> {
    async fn fetch_and_extract(&self, url: &str) -> Outcome<PatentDetail> {
        match self.get_html(url).await {
            Outcome::Ok(html) => {
                let result = self.extract_blocking(html).await;
                if let Err(e) = &result {
                    warn!(url = %url, error = %e, "patent page extraction failed");
                }
                Outcome::from_result(result, PatentDetail::default)
            }
            Outcome::Degraded { value, cause } => Outcome::Degraded {
                value: detail_from(&self.extract, &value),
                cause,
            },
        }
    }
}
