//! Canonical request parameters.
//!
//! [`ParameterSet`] is an ordered key/value container. Iteration is always in
//! ascending key order, which fixes both the form-encoded wire body and the
//! signature input regardless of the order parameters were inserted in.

use std::collections::BTreeMap;

/// Ordered set of string parameters for a single request.
///
/// # Examples
///
/// ```rust
/// use lastfm_scrobble::ParameterSet;
///
/// let mut params = ParameterSet::new();
/// params.set("track", "Idioteque");
/// params.set("artist", "Radiohead");
///
/// assert_eq!(params.to_wire_form(), "artist=Radiohead&track=Idioteque");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    entries: BTreeMap<String, String>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value for the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encode as an `application/x-www-form-urlencoded` body.
    ///
    /// Every key and value is percent-encoded and pairs are joined with `&`
    /// in ascending key order. An empty set encodes to an empty string.
    pub fn to_wire_form(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Serialize as tab-delimited text: every key and every value is followed by a tab.
    ///
    /// Keys and values must not contain tabs for [`deserialize`](Self::deserialize)
    /// to reproduce the same set.
    pub fn serialize(&self) -> String {
        let mut line = String::new();
        for (key, value) in &self.entries {
            line.push_str(key);
            line.push('\t');
            line.push_str(value);
            line.push('\t');
        }
        line
    }

    /// Rebuild a set from the output of [`serialize`](Self::serialize).
    ///
    /// Tokens are paired in order. A trailing unpaired token (the empty token
    /// after the final tab, or a truncated record) is ignored.
    pub fn deserialize(text: &str) -> Self {
        let tokens: Vec<&str> = text.split('\t').collect();
        tokens
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = ParameterSet::new();
        params.extend(iter);
        params
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for ParameterSet {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
