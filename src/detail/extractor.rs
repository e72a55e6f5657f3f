use std::sync::LazyLock;

use regex::Regex;

pub const CITATION_LABELS: [&str; 5] = [
    "Patent Citations",
    "Non-Patent Citations",
    "Cited By",
    "Families Citing this family",
    "Family Cites Families",
];

static CITATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    CITATION_LABELS
        .iter()
        .map(|label| {
            Regex::new(&format!(r"{}\s+\((\d+)\)", regex::escape(label)))
                .expect("citation pattern is valid")
        })
        .collect()
});

static INVENTOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta[^>]+content="([^"]+)"[^>]+scheme="inventor">"#)
        .expect("inventor pattern is valid")
});

/// Pulls the fields we need out of a patent page without a full HTML parse.
pub trait Extract {
    /// Inventor names in document order, as written.
    fn extract_inventors(&self, html: &str) -> Vec<String>;

    /// Sum of the first count found for each citation category, saturating at `u64::MAX`.
    fn extract_citation_total(&self, html: &str) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegexExtractor;

impl Extract for RegexExtractor {
    fn extract_inventors(&self, html: &str) -> Vec<String> {
        INVENTOR_PATTERN
            .captures_iter(html)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    fn extract_citation_total(&self, html: &str) -> u64 {
        CITATION_PATTERNS
            .iter()
            .filter_map(|pattern| pattern.captures(html))
            .filter_map(|caps| caps[1].parse::<u64>().ok())
            .fold(0, u64::saturating_add)
    }
}
