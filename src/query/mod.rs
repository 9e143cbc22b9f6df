//! Key/value view over the fragment's query-string suffix.
//!
//! Parsing is lenient: whatever pairs decode are kept and the rest is
//! dropped, so a malformed suffix degrades to a partial (possibly empty)
//! view instead of an error. `get` returns the first value for a key and
//! `set` replaces the first occurrence while discarding later duplicates,
//! matching `URLSearchParams` semantics.

use url::form_urlencoded;

/// Ordered pairs parsed from a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a query string, with or without its leading `?`.
    pub fn parse(query: &str) -> Self {
        let raw = query.strip_prefix('?').unwrap_or(query);
        let pairs = form_urlencoded::parse(raw.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        Self { pairs }
    }

    /// First value recorded for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets `key` to `value`, replacing the first occurrence in place and
    /// dropping any later duplicates. Appends when the key is absent.
    pub fn set(&mut self, key: &str, value: &str) {
        let mut replaced = false;
        self.pairs.retain_mut(|(k, v)| {
            if k != key {
                return true;
            }
            if replaced {
                return false;
            }
            *v = value.to_string();
            replaced = true;
            true
        });
        if !replaced {
            self.pairs.push((key.to_string(), value.to_string()));
        }
    }

    /// Removes every occurrence of `key`.
    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Percent-encoded serialization without the leading `?`.
    pub fn serialize(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// `?key=value` suffix ready to append to a fragment, or an empty string
    /// when no pairs remain.
    pub fn to_suffix(&self) -> String {
        let serialized = self.serialize();
        if serialized.is_empty() {
            serialized
        } else {
            format!("?{serialized}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_leading_question_mark() {
        let params = QueryParams::parse("?a=1&b=2");
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get("b"), Some("2"));
        assert_eq!(params, QueryParams::parse("a=1&b=2"));
    }

    #[test]
    fn parse_of_empty_input_is_an_empty_view() {
        assert!(QueryParams::parse("").is_empty());
        assert!(QueryParams::parse("?").is_empty());
    }

    #[test]
    fn malformed_input_degrades_to_the_decodable_pairs() {
        let params = QueryParams::parse("a=1&&=&b");
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get("b"), Some(""));
    }

    #[test]
    fn get_returns_the_first_value() {
        let params = QueryParams::parse("a=1&a=2");
        assert_eq!(params.get("a"), Some("1"));
    }

    #[test]
    fn set_replaces_first_and_drops_duplicates() {
        let mut params = QueryParams::parse("a=1&b=2&a=3");
        params.set("a", "9");
        assert_eq!(params.serialize(), "a=9&b=2");
    }

    #[test]
    fn set_appends_missing_keys() {
        let mut params = QueryParams::parse("a=1");
        params.set("b", "2");
        assert_eq!(params.serialize(), "a=1&b=2");
    }

    #[test]
    fn remove_deletes_all_occurrences() {
        let mut params = QueryParams::parse("a=1&b=2&a=3");
        params.remove("a");
        assert_eq!(params.serialize(), "b=2");
        params.remove("b");
        assert!(params.is_empty());
        assert_eq!(params.to_suffix(), "");
    }

    #[test]
    fn serialization_percent_encodes() {
        let mut params = QueryParams::new();
        params.set("q", "a b/c");
        assert_eq!(params.to_suffix(), "?q=a+b%2Fc");
        assert_eq!(QueryParams::parse(&params.to_suffix()).get("q"), Some("a b/c"));
    }
}
