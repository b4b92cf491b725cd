//! Data types for parsed fit statistics

use std::collections::HashMap;

use serde::Serialize;

use crate::Result;

/// Posterior summary for a single fitted parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterStats {
    /// Declared parameter number (as printed in the table, usually 1-based)
    pub index: usize,

    /// Parameter label
    pub name: String,

    /// Posterior mean
    pub mean: f64,

    /// Posterior median
    pub median: f64,

    /// Best sample seen by the sampler
    pub best: f64,

    /// 68% credible interval `(low, high)`
    pub p68: (f64, f64),

    /// 95% credible interval `(low, high)`
    pub p95: (f64, f64),
}

/// Name-keyed parameter table that remembers insertion order.
///
/// Inserting an existing name replaces the stored record but keeps the
/// position where the name was first seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParameterTable {
    entries: Vec<ParameterStats>,
    #[serde(skip)]
    by_name: HashMap<String, usize>,
}

impl ParameterTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the record it replaced (if any).
    pub fn insert(&mut self, stats: ParameterStats) -> Option<ParameterStats> {
        match self.by_name.get(&stats.name) {
            Some(&idx) => Some(std::mem::replace(&mut self.entries[idx], stats)),
            None => {
                self.by_name.insert(stats.name.clone(), self.entries.len());
                self.entries.push(stats);
                None
            }
        }
    }

    /// Look up a parameter by name
    pub fn get(&self, name: &str) -> Option<&ParameterStats> {
        self.by_name.get(name).map(|&idx| &self.entries[idx])
    }

    /// Returns true if a parameter with this name is present
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of distinct parameters
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table holds no parameters
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parameter names in display order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|p| p.name.as_str())
    }

    /// Records in display order
    pub fn iter(&self) -> std::slice::Iter<'_, ParameterStats> {
        self.entries.iter()
    }

    /// Records in display order, as a slice
    pub fn as_slice(&self) -> &[ParameterStats] {
        &self.entries
    }
}

impl FromIterator<ParameterStats> for ParameterTable {
    fn from_iter<I: IntoIterator<Item = ParameterStats>>(iter: I) -> Self {
        let mut table = Self::new();
        for stats in iter {
            table.insert(stats);
        }
        table
    }
}

impl<'a> IntoIterator for &'a ParameterTable {
    type Item = &'a ParameterStats;
    type IntoIter = std::slice::Iter<'a, ParameterStats>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Statistics recovered from a fit's result log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitStatisticsReport {
    /// Overall chi-square of the fit
    pub overall_chisq: f64,

    /// Chi-square per model, in file order
    pub model_chisq: Vec<f64>,

    /// Per-parameter statistics keyed by name
    pub parameters: ParameterTable,
}

impl FitStatisticsReport {
    /// Look up a parameter by name
    pub fn parameter(&self, name: &str) -> Option<&ParameterStats> {
        self.parameters.get(name)
    }

    /// Number of models with a chi-square entry
    pub fn n_models(&self) -> usize {
        self.model_chisq.len()
    }

    /// Serialize the report as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
