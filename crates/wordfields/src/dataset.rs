//! # Dataset Columns
//!
//! Fields read their training data from a dataset column named after the field.

use crate::{
    errors::{FieldError, FieldResult},
    types::{WFHashMap, hash_map_new},
};

/// A source of named columns of raw per-example values.
///
/// `S` is the per-example value type: token lists for
/// [`crate::fields::Field`], span triples for [`crate::fields::ChartField`].
pub trait Dataset<S> {
    /// Get the column called `name`, if any.
    fn column(
        &self,
        name: &str,
    ) -> Option<&[S]>;

    /// Get the column called `name`, or fail with [`FieldError::MissingColumn`].
    fn require_column(
        &self,
        name: &str,
    ) -> FieldResult<&[S]> {
        self.column(name).ok_or_else(|| FieldError::MissingColumn {
            name: name.to_string(),
        })
    }
}

/// In-memory [`Dataset`] holding one `Vec<S>` per column.
#[derive(Debug, Clone)]
pub struct ColumnDataset<S> {
    columns: WFHashMap<String, Vec<S>>,
}

impl<S> Default for ColumnDataset<S> {
    fn default() -> Self {
        Self {
            columns: hash_map_new(),
        }
    }
}

impl<S> ColumnDataset<S> {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a column.
    pub fn with_column<N: Into<String>>(
        mut self,
        name: N,
        values: Vec<S>,
    ) -> Self {
        self.columns.insert(name.into(), values);
        self
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the dataset has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<S> Dataset<S> for ColumnDataset<S> {
    fn column(
        &self,
        name: &str,
    ) -> Option<&[S]> {
        self.columns.get(name).map(Vec::as_slice)
    }
}
