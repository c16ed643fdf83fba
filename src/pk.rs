//! Primary-key token codec.
//!
//! Row identifiers travel as a flat list alternating key and value tokens
//! (`id/2` in URLs, `["id", 2]` in bulk-action form fields).

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

/// Everything but unreserved characters is escaped inside one path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Insertion-ordered key/value pairs decoded from a token list.
#[derive(Clone, Debug, PartialEq)]
pub struct PkMap<T> {
    entries: Vec<(T, T)>,
}

impl<T: PartialEq> PkMap<T> {
    fn new() -> Self {
        PkMap { entries: Vec::new() }
    }

    /// Later duplicate keys overwrite the earlier value in place.
    fn insert(&mut self, key: T, value: T) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &T) -> Option<&T> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, &T)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

/// Pair `tokens[2i]` with `tokens[2i + 1]`. An odd number of tokens is malformed and yields `None`.
pub fn pk_list_to_dict<T: PartialEq>(tokens: impl IntoIterator<Item = T>) -> Option<PkMap<T>> {
    let mut map = PkMap::new();
    let mut iter = tokens.into_iter();
    while let Some(key) = iter.next() {
        let value = iter.next()?;
        map.insert(key, value);
    }
    Some(map)
}

pub fn encode_segment(token: &str) -> String {
    utf8_percent_encode(token, SEGMENT).to_string()
}

/// Split a still-encoded URL tail such as `slug/a%2Fb/` into decoded tokens.
/// Splitting happens before decoding so an escaped `/` stays inside its token.
/// `None` when a segment does not decode to UTF-8.
pub fn path_tokens(raw_tail: &str) -> Option<Vec<String>> {
    raw_tail
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| percent_decode_str(s).decode_utf8().ok().map(|t| t.into_owned()))
        .collect()
}

/// Decode one `selected_item` field: a JSON array of key/value tokens.
pub fn selected_item_tokens(raw: &str) -> Option<PkMap<Value>> {
    match serde_json::from_str::<Value>(raw).ok()? {
        Value::Array(items) => pk_list_to_dict(items),
        _ => None,
    }
}

/// Display form of a token list: strings single-quoted, other values as JSON.
pub fn token_repr(tokens: &[Value]) -> String {
    let parts: Vec<String> = tokens
        .iter()
        .map(|t| match t {
            Value::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            other => other.to_string(),
        })
        .collect();
    format!("[{}]", parts.join(", "))
}
