use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Table of metric values: row label -> metric name -> value
///
/// Rows and columns keep insertion order. Missing cells are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricFrame {
    rows: IndexMap<String, IndexMap<String, f64>>,
}

impl MetricFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, row: impl Into<String>, column: impl Into<String>, value: f64) {
        self.rows.entry(row.into()).or_default().insert(column.into(), value);
    }

    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.get(column)).copied()
    }

    pub fn row(&self, row: &str) -> Option<&IndexMap<String, f64>> {
        self.rows.get(row)
    }

    pub fn row_labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.keys().map(String::as_str)
    }

    /// Union of the columns of every row
    pub fn columns(&self) -> Vec<&str> {
        self.rows
            .values()
            .flat_map(|r| r.keys().map(String::as_str))
            .collect::<IndexSet<&str>>()
            .into_iter()
            .collect()
    }

    /// Values of one column, in row order
    pub fn column(&self, column: &str) -> Vec<(&str, f64)> {
        self.rows
            .iter()
            .filter_map(|(label, r)| r.get(column).map(|v| (label.as_str(), *v)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_cbor(&self) -> crate::error::Result<Vec<u8>> {
        Ok(serde_cbor::to_vec(self)?)
    }
}
