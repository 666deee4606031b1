use std::collections::HashMap;

use tracing::debug;

use crate::models::TargetField;

/// Case-insensitive header name to column lookup, built from the header row.
/// Only seeds suggestions; materialization is purely positional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    headers: Vec<String>,
    by_name: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn from_row(row: &[String]) -> Self {
        let mut by_name = HashMap::new();
        for (i, h) in row.iter().enumerate() {
            // first occurrence wins for duplicate headers
            by_name.entry(h.trim().to_lowercase()).or_insert(i);
        }
        Self {
            headers: row.to_vec(),
            by_name,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(&name.trim().to_lowercase()).copied()
    }

    /// `(value, label)` choices for a column selector: a blank entry first,
    /// then every header paired with itself.
    pub fn choices(&self) -> Vec<(String, String)> {
        std::iter::once((String::new(), String::new()))
            .chain(self.headers.iter().map(|h| (h.clone(), h.clone())))
            .collect()
    }

    /// Proposed default column for each field: the header whose name matches
    /// the field name, or `None`.
    pub fn suggest(&self, fields: &[TargetField]) -> Vec<(&'static str, Option<usize>)> {
        let defaults: Vec<_> = fields
            .iter()
            .filter(|f| !f.primary_key)
            .map(|f| (f.name, self.position(f.name)))
            .collect();
        debug!(
            matched = defaults.iter().filter(|(_, d)| d.is_some()).count(),
            fields = defaults.len(),
            "header defaults proposed"
        );
        defaults
    }
}
