// SPDX-License-Identifier: MIT

//! Variable collections used as expression evaluation context

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ci::error::{PipekitError, Result};

/// A single `KEY=VALUE` variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub key: String,
    pub value: String,
}

/// Ordered variable collection
///
/// Later entries override earlier ones with the same key, so layers can be
/// appended from least to most specific.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    items: Vec<Variable>,
}

impl Variables {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append a variable, overriding any earlier value for the same key
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.items.push(Variable {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Builder-style `append`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(key, value);
        self
    }

    /// Append every variable of another collection
    pub fn concat(&mut self, other: &Variables) {
        self.items.extend(other.items.iter().cloned());
    }

    /// Append every entry of a map, in key order so the result is stable
    pub fn extend_from_map(&mut self, map: &HashMap<String, String>) {
        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort();
        for key in keys {
            self.append(key.clone(), map[key].clone());
        }
    }

    /// Parse a `KEY=VALUE` pair
    pub fn parse_pair(pair: &str) -> Result<Variable> {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| PipekitError::config(format!("expected KEY=VALUE, got `{}`", pair)))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(PipekitError::config(format!(
                "variable name missing in `{}`",
                pair
            )));
        }
        Ok(Variable {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    /// Build a collection from `KEY=VALUE` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vars = Self::new();
        for pair in pairs {
            let var = Self::parse_pair(pair.as_ref())?;
            vars.items.push(var);
        }
        Ok(vars)
    }

    /// Get the effective value of a variable
    pub fn get(&self, key: &str) -> Option<&str> {
        self.items
            .iter()
            .rev()
            .find(|v| v.key == key)
            .map(|v| v.value.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.to_hash().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All appended entries, overridden ones included
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.items.iter()
    }

    /// Flatten into the effective `name -> value` mapping
    pub fn to_hash(&self) -> HashMap<String, String> {
        self.items
            .iter()
            .map(|v| (v.key.clone(), v.value.clone()))
            .collect()
    }
}

impl From<HashMap<String, String>> for Variables {
    fn from(map: HashMap<String, String>) -> Self {
        let mut vars = Self::new();
        vars.extend_from_map(&map);
        vars
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variables {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut vars = Self::new();
        for (k, v) in iter {
            vars.append(k, v);
        }
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_collection() {
        let vars = Variables::new();
        assert!(vars.get("ANYTHING").is_none());
        assert!(vars.is_empty());
    }

    #[test]
    fn test_later_values_override() {
        let vars = Variables::new()
            .with("STAGE", "global")
            .with("STAGE", "job");

        assert_eq!(vars.get("STAGE"), Some("job"));
        assert_eq!(vars.len(), 1);
        assert_eq!(vars.iter().count(), 2);
    }

    #[test]
    fn test_concat_layers() {
        let mut base = Variables::new().with("A", "1").with("B", "1");
        let job = Variables::new().with("B", "2");
        base.concat(&job);

        assert_eq!(base.get("A"), Some("1"));
        assert_eq!(base.get("B"), Some("2"));
    }

    #[test]
    fn test_from_pairs() {
        let vars = Variables::from_pairs(["A=1", "URL=https://x?a=b", "EMPTY="]).unwrap();
        assert_eq!(vars.get("A"), Some("1"));
        assert_eq!(vars.get("URL"), Some("https://x?a=b"));
        assert_eq!(vars.get("EMPTY"), Some(""));
    }

    #[test]
    fn test_from_pairs_rejects_malformed() {
        assert!(Variables::from_pairs(["NOVALUE"]).is_err());
        assert!(Variables::from_pairs(["=value"]).is_err());
    }

    #[test]
    fn test_to_hash() {
        let vars: Variables = vec![("A", "1"), ("A", "2"), ("B", "3")].into_iter().collect();
        let hash = vars.to_hash();
        assert_eq!(hash["A"], "2");
        assert_eq!(hash["B"], "3");
    }
}
