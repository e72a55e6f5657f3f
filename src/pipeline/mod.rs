//! Per-company collection: search every page, then enrich each hit from its patent page.

pub mod aggregate;

use chrono::NaiveDate;
use tracing::debug;

use crate::detail::{PatentDetail, PatentDetails};
use crate::search::{PatentSearch, SearchHit, paginate};

/// One company/deal to collect patents for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyTask {
    pub company_name: String,
    pub window_start: Option<NaiveDate>,
    pub window_end: Option<NaiveDate>,
    pub deal_id: String,
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatentRecord {
    pub deal_id: String,
    pub window_end: Option<String>,
    pub company_name: String,
    pub patent_title: String,
    pub publication_date: String,
    pub publication_number: String,
    pub citation_count: u64,
    pub inventors: Vec<String>,
    pub page_url: String,
    pub pdf_url: String,
}

impl PatentRecord {
    /// Column name/value pairs in output order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("deal number", self.deal_id.clone()),
            ("anndate", self.window_end.clone().unwrap_or_default()),
            ("company name", self.company_name.clone()),
            ("patent title", self.patent_title.clone()),
            ("publication date", self.publication_date.clone()),
            ("publication number", self.publication_number.clone()),
            ("citation count", self.citation_count.to_string()),
            ("inventors", self.inventors.join(", ")),
            ("url", self.page_url.clone()),
            ("pdf", self.pdf_url.clone()),
        ]
    }
}

pub struct CollectionPipeline<S, D> {
    search: S,
    details: D,
}

impl<S: PatentSearch, D: PatentDetails> CollectionPipeline<S, D> {
    pub fn new(search: S, details: D) -> Self {
        Self { search, details }
    }

    /// Collects every patent for `task`, one record per search hit, in hit order.
    ///
    /// Search and page failures are logged by the stages and never abort the
    /// task; at worst the result is empty.
    pub async fn collect(&self, task: &CompanyTask) -> Vec<PatentRecord> {
        let company = title_case(&task.company_name);
        let after = task.window_start.map(format_date);
        let before = task.window_end.map(format_date);

        let harvest = paginate(&self.search, &company, after.as_deref(), before.as_deref()).await;

        let mut records = Vec::with_capacity(harvest.hits.len());
        let mut detail_failures = 0;
        for hit in harvest.hits {
            let outcome = self.details.fetch_and_extract(&hit.page_url).await;
            if outcome.cause().is_some() {
                detail_failures += 1;
            }
            records.push(to_record(task, &company, before.as_deref(), hit, outcome.into_value()));
        }

        debug!(
            company = %company,
            records = records.len(),
            search_failures = harvest.failures.len(),
            detail_failures,
            "company collected"
        );
        records
    }
}

fn to_record(
    task: &CompanyTask,
    company: &str,
    window_end: Option<&str>,
    hit: SearchHit,
    detail: PatentDetail,
) -> PatentRecord {
    PatentRecord {
        deal_id: task.deal_id.clone(),
        window_end: window_end.map(str::to_string),
        company_name: company.to_string(),
        patent_title: hit.title.trim().to_string(),
        publication_date: hit.publication_date,
        publication_number: hit.publication_number,
        citation_count: detail.citation_count,
        inventors: detail.inventors,
        page_url: hit.page_url,
        pdf_url: hit.pdf_url,
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Uppercases the first letter of every run of letters and lowercases the
/// rest, then trims. `"acme inc"` becomes `"Acme Inc"`, `"3m co"` becomes `"3M Co"`.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out.trim().to_string()
}
