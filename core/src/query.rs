//! Query-string building for the callback transport.
//!
//! Serialization follows the bracket convention most web backends parse:
//! `user[uid]=a&filters[0][name]=brand`. Keys and values are percent-encoded,
//! keeping only RFC 3986 unreserved characters literal.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

/// Query strings longer than this many bytes are sent as POST instead.
pub const MAX_QUERY_BYTES: usize = 4096;

pub(crate) const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Byte length of `s` in UTF-8, which is what travels on the wire.
pub fn count_bytes_in_string(s: &str) -> usize {
    s.len()
}

/// Serialize a JSON object into a query string.
///
/// Non-object roots produce an empty string.
pub fn stringify(value: &Value) -> String {
    let mut pairs = Vec::new();
    if let Value::Object(map) = value {
        for (key, value) in map {
            push_pairs(&mut pairs, key.clone(), value);
        }
    }
    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", encode(&key), encode(&value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Append `query` to `url`, using `&` when the URL already has a query.
pub fn join_params(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

fn push_pairs(pairs: &mut Vec<(String, String)>, prefix: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                push_pairs(pairs, format!("{prefix}[{key}]"), child);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                push_pairs(pairs, format!("{prefix}[{index}]"), child);
            }
        }
        Value::Null => pairs.push((prefix, String::new())),
        Value::String(s) => pairs.push((prefix, s.clone())),
        Value::Bool(b) => pairs.push((prefix, b.to_string())),
        Value::Number(n) => pairs.push((prefix, n.to_string())),
    }
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}
