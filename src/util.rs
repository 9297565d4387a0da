//! Utility functions

use percent_encoding::{AsciiSet, CONTROLS};

// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

/// Extract header value as string
pub fn header_str(headers: &http::HeaderMap, name: &str) -> Option<String> {
    headers.get(name)?.to_str().ok().map(|s| s.to_string())
}

/// Generate a new request ID
pub fn generate_request_id() -> String {
    format!("sdk-{}", uuid::Uuid::new_v4())
}

/// Strip leading and trailing slashes from a Vault path
pub fn trim_path(s: &str) -> &str {
    s.trim_matches('/')
}

/// URL encode a single path segment
pub fn encode_segment(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s, SEGMENT).to_string()
}

/// URL encode a slash-delimited Vault path, keeping the slashes
pub fn encode_path(s: &str) -> String {
    trim_path(s)
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}
