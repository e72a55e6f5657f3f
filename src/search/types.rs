use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub results: QueryResults,
}

#[derive(Debug, Deserialize)]
pub struct QueryResults {
    #[serde(default = "one_page")]
    pub total_num_pages: u32,
    #[serde(default)]
    pub num_page: u32,
    #[serde(default)]
    pub cluster: Vec<Cluster>,
}

fn one_page() -> u32 {
    1
}

#[derive(Debug, Default, Deserialize)]
pub struct Cluster {
    #[serde(default)]
    pub result: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
pub struct RawHit {
    #[serde(default)]
    pub patent: RawPatent,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawPatent {
    pub title: Option<String>,
    pub publication_date: Option<String>,
    pub publication_number: Option<String>,
    pub pdf: Option<String>,
}

/// One candidate patent from a search page.
///
/// `pdf_url` and `page_url` are empty when the source field was blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub publication_date: String,
    pub publication_number: String,
    pub pdf_url: String,
    pub page_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    pub total_num_pages: u32,
    pub current_page: u32,
    pub hits: Vec<SearchHit>,
}

impl SearchPage {
    pub fn empty(current_page: u32) -> Self {
        Self {
            total_num_pages: 1,
            current_page,
            hits: Vec::new(),
        }
    }
}
