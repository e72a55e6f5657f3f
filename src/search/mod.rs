//! Paginated patent search: query construction, page fetching, hit normalization.

mod client;
mod encode;
pub mod types;

pub use client::SearchClient;
pub use types::{SearchHit, SearchPage};

use tracing::debug;

use crate::outcome::Outcome;
use crate::transport::FetchError;

/// One page request for a single assignee.
///
/// `after`/`before` are `YYYY-MM-DD` dates; dashes are stripped when the query is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub company: String,
    pub after: Option<String>,
    pub before: Option<String>,
    pub page: u32,
}

/// Source of search result pages.
/// Implemented by `SearchClient` for production; mock implementations used in tests.
pub trait PatentSearch {
    async fn query(&self, query: &SearchQuery) -> Outcome<SearchPage>;
}

/// Everything one pagination loop produced.
#[derive(Debug, Default)]
pub struct Harvest {
    pub hits: Vec<SearchHit>,
    pub pages_fetched: u32,
    pub failures: Vec<FetchError>,
}

/// Walks result pages from 0 until the last reported page.
///
/// Only pages that resolve update the page count, so when page 0 fails the
/// loop stops after that single request.
pub async fn paginate(
    search: &impl PatentSearch,
    company: &str,
    after: Option<&str>,
    before: Option<&str>,
) -> Harvest {
    let mut harvest = Harvest::default();
    let mut total_pages = 1;
    let mut page = 0;

    while page < total_pages {
        let query = SearchQuery {
            company: company.to_string(),
            after: after.map(str::to_string),
            before: before.map(str::to_string),
            page,
        };
        match search.query(&query).await {
            Outcome::Ok(result) => {
                debug!(company, page = result.current_page, hits = result.hits.len(), "search page");
                total_pages = result.total_num_pages;
                harvest.hits.extend(result.hits);
            }
            Outcome::Degraded { cause, .. } => harvest.failures.push(cause),
        }
        harvest.pages_fetched += 1;
        page += 1;
    }

    debug!(
        company,
        pages = harvest.pages_fetched,
        hits = harvest.hits.len(),
        "search exhausted"
    );
    harvest
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedSearch {
        pages: Mutex<VecDeque<Outcome<SearchPage>>>,
        queries: Mutex<Vec<SearchQuery>>,
    }

    impl ScriptedSearch {
        fn new(pages: Vec<Outcome<SearchPage>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn pages_requested(&self) -> Vec<u32> {
            self.queries.lock().unwrap().iter().map(|q| q.page).collect()
        }
    }

    impl PatentSearch for ScriptedSearch {
        async fn query(&self, query: &SearchQuery) -> Outcome<SearchPage> {
            self.queries.lock().unwrap().push(query.clone());
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Outcome::Ok(SearchPage::empty(query.page)))
        }
    }

    fn hit(number: &str) -> SearchHit {
        SearchHit {
            title: format!("Title {number}"),
            publication_date: "2020-01-01".into(),
            publication_number: number.into(),
            pdf_url: String::new(),
            page_url: format!("https://patents.google.com/patent/{number}"),
        }
    }

    fn page(total: u32, current: u32, numbers: &[&str]) -> Outcome<SearchPage> {
        Outcome::Ok(SearchPage {
            total_num_pages: total,
            current_page: current,
            hits: numbers.iter().map(|n| hit(n)).collect(),
        })
    }

    #[tokio::test]
    async fn single_reported_page_is_fetched_once() {
        let search = ScriptedSearch::new(vec![page(1, 0, &["US1"]), page(1, 1, &["US2"])]);
        let harvest = paginate(&search, "Acme", None, None).await;

        assert_eq!(search.pages_requested(), vec![0]);
        assert_eq!(harvest.pages_fetched, 1);
        assert_eq!(harvest.hits.len(), 1);
    }

    #[tokio::test]
    async fn hits_accumulate_in_page_order() {
        let search = ScriptedSearch::new(vec![
            page(3, 0, &["US1", "US2"]),
            page(3, 1, &["US3"]),
            page(3, 2, &["US4", "US5"]),
        ]);
        let harvest = paginate(&search, "Acme", Some("2018-01-01"), Some("2021-01-01")).await;

        assert_eq!(search.pages_requested(), vec![0, 1, 2]);
        let numbers: Vec<_> = harvest
            .hits
            .iter()
            .map(|h| h.publication_number.as_str())
            .collect();
        assert_eq!(numbers, ["US1", "US2", "US3", "US4", "US5"]);
        assert!(harvest.failures.is_empty());
    }

    #[tokio::test]
    async fn failed_first_page_stops_pagination() {
        let search = ScriptedSearch::new(vec![Outcome::Degraded {
            value: SearchPage::empty(0),
            cause: FetchError::Exhausted {
                attempts: 12,
                last_error: "handshake".into(),
            },
        }]);
        let harvest = paginate(&search, "Acme", None, None).await;

        assert_eq!(search.pages_requested(), vec![0]);
        assert!(harvest.hits.is_empty());
        assert_eq!(harvest.failures.len(), 1);
    }

    #[tokio::test]
    async fn failed_middle_page_is_skipped() {
        let search = ScriptedSearch::new(vec![
            page(3, 0, &["US1"]),
            Outcome::Degraded {
                value: SearchPage::empty(1),
                cause: FetchError::Malformed("eof".into()),
            },
            page(3, 2, &["US3"]),
        ]);
        let harvest = paginate(&search, "Acme", None, None).await;

        assert_eq!(search.pages_requested(), vec![0, 1, 2]);
        assert_eq!(harvest.hits.len(), 2);
        assert_eq!(harvest.failures, vec![FetchError::Malformed("eof".into())]);
    }

    #[tokio::test]
    async fn queries_carry_window_and_company() {
        let search = ScriptedSearch::new(vec![page(1, 0, &[])]);
        paginate(&search, "Acme Inc", Some("2018-01-01"), None).await;

        let queries = search.queries.lock().unwrap();
        assert_eq!(queries[0].company, "Acme Inc");
        assert_eq!(queries[0].after.as_deref(), Some("2018-01-01"));
        assert_eq!(queries[0].before, None);
    }
}
