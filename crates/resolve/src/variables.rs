use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::{substitute, SymbolResolver};

/// Substitutes `${key}` tokens from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct VariableResolver {
    name: String,
    vars: BTreeMap<String, String>,
}

impl VariableResolver {
    /// Create an empty table with a diagnostic name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: BTreeMap::new(),
        }
    }

    /// Add (or replace) one variable.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add (or replace) one variable in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Look up a variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Number of variables in the table.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for VariableResolver
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut resolver = VariableResolver::new("variables");
        for (k, v) in iter {
            resolver.insert(k, v);
        }
        resolver
    }
}

impl SymbolResolver for VariableResolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        substitute(raw, |token| self.vars.get(token).cloned())
    }
}
