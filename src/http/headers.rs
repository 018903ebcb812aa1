use std::collections::hash_map;
use std::collections::HashMap;

/// Case-insensitive multi-valued header map.
///
/// Names are lowercased and trimmed on every operation; the order of values
/// stored under one name is preserved. For single-valued semantic headers
/// such as `Content-Length` the last stored value wins.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    map: HashMap<String, Vec<String>>,
}

fn canonical(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all values stored under `name` with a single value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into().trim().to_string();
        self.map.insert(canonical(name), vec![value]);
    }

    /// Appends one value under `name`, preserving earlier values.
    pub fn add(&mut self, name: &str, value: impl Into<String>) {
        self.map
            .entry(canonical(name))
            .or_default()
            .push(value.into());
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.map.get(&canonical(name)).map(|v| v.as_slice())
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.first()).map(|s| s.as_str())
    }

    /// The last value under `name`; what single-valued headers resolve to.
    pub fn last(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.last()).map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&canonical(name))
    }

    /// Membership test, case-sensitive on the value.
    pub fn has_value(&self, name: &str, value: &str) -> bool {
        self.get(name)
            .map(|values| values.iter().any(|v| v == value))
            .unwrap_or(false)
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.map.remove(&canonical(name))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Vec<String>> {
        self.map.iter()
    }

    /// Serializes every header as `name: v1, v2\r\n`, one line per name.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        for (name, values) in &self.map {
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(values.join(", ").as_bytes());
            buf.extend_from_slice(b"\r\n");
        }
    }
}
