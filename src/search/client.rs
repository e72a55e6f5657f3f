use tracing::{debug, warn};

use super::encode::build_query_url;
use super::types::{QueryResponse, RawPatent, SearchHit, SearchPage};
use super::{PatentSearch, SearchQuery};
use crate::config::{Endpoints, RESULTS_PER_PAGE};
use crate::outcome::Outcome;
use crate::transport::{FetchError, RetryingTransport};

/// Client for the patent full-text search endpoint.
#[derive(Clone)]
pub struct SearchClient {
    transport: RetryingTransport,
    endpoints: Endpoints,
}

impl SearchClient {
    pub fn new(transport: RetryingTransport, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    pub fn query_url(&self, query: &SearchQuery) -> String {
        build_query_url(&self.endpoints.query_url, &query_params(query))
    }

    async fn fetch_page(&self, url: &str, page: u32) -> Result<SearchPage, FetchError> {
        let body = self.transport.get_text(url).await?;
        let response: QueryResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))?;

        let results = response.results;
        let hits = results
            .cluster
            .into_iter()
            .next()
            .map(|cluster| cluster.result)
            .unwrap_or_default()
            .into_iter()
            .map(|raw| to_hit(raw.patent, &self.endpoints))
            .collect::<Vec<_>>();

        debug!(
            page,
            total_pages = results.total_num_pages,
            hits = hits.len(),
            "search page parsed"
        );
        Ok(SearchPage {
            total_num_pages: results.total_num_pages,
            current_page: results.num_page,
            hits,
        })
    }
}

impl PatentSearch for SearchClient {
    async fn query(&self, query: &SearchQuery) -> Outcome<SearchPage> {
        let url = self.query_url(query);
        let result = self.fetch_page(&url, query.page).await;
        if let Err(e) = &result {
            warn!(company = %query.company, url = %url, error = %e, "search page failed");
        }
        Outcome::from_result(result, || SearchPage::empty(query.page))
    }
}

/// Parameter order: assignee, page size, page, after, before.
fn query_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("url", format!("assignee={}", query.company)),
        ("num", RESULTS_PER_PAGE.to_string()),
    ];
    if query.page > 0 {
        params.push(("page", query.page.to_string()));
    }
    if let Some(after) = &query.after {
        params.push(("after", format!("publication:{}", after.replace('-', ""))));
    }
    if let Some(before) = &query.before {
        params.push(("before", format!("publication:{}", before.replace('-', ""))));
    }
    params
}

fn to_hit(raw: RawPatent, endpoints: &Endpoints) -> SearchHit {
    let publication_number = raw.publication_number.unwrap_or_default();
    let pdf = raw.pdf.unwrap_or_default();
    SearchHit {
        title: raw.title.unwrap_or_default(),
        publication_date: raw.publication_date.unwrap_or_default(),
        pdf_url: prefixed(&endpoints.pdf_url, &pdf),
        page_url: prefixed(&endpoints.patent_page_url, &publication_number),
        publication_number,
    }
}

fn prefixed(prefix: &str, value: &str) -> String {
    if value.trim().is_empty() {
        String::new()
    } else {
        format!("{prefix}{value}")
    }
}
