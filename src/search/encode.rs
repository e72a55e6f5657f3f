use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;

/// Everything except unreserved characters and `/` is encoded.
const QUERY_VALUE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// The endpoint takes a single `url` parameter holding the whole inner query,
/// so pairs are joined with an encoded `&`.
const PARAM_SEPARATOR: &str = "%26";

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Encodes one parameter value.
///
/// `&` and `'` are pre-escaped and whitespace runs become `+` before the
/// general percent-encoding pass, so both survive the server's two decodes.
pub(super) fn encode_value(value: &str) -> String {
    let escaped = value.replace('&', "%26").replace('\'', "%27");
    let collapsed = WHITESPACE_RUN.replace_all(&escaped, "+");
    utf8_percent_encode(&collapsed, QUERY_VALUE_SET).to_string()
}

pub(super) fn build_query_url(base: &str, params: &[(&str, String)]) -> String {
    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={}", encode_value(value)))
        .collect::<Vec<_>>()
        .join(PARAM_SEPARATOR);
    format!("{base}?{query}")
}
