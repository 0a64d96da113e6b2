//! # Raw Field

use std::{fmt, sync::Arc};

/// A datatype with no tensor conversion: only an optional preprocessing function.
///
/// Useful for carrying raw values (e.g. the original words) through a batch.
pub struct RawField<S> {
    name: String,
    func: Option<Arc<dyn Fn(S) -> S + Send + Sync>>,
}

impl<S> Clone for RawField<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            func: self.func.clone(),
        }
    }
}

impl<S> fmt::Debug for RawField<S> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("RawField")
            .field("name", &self.name)
            .field("func", &self.func.is_some())
            .finish()
    }
}

impl<S> fmt::Display for RawField<S> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "({}): RawField()", self.name)
    }
}

impl<S> RawField<S> {
    /// Create a raw field with no preprocessing.
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            func: None,
        }
    }

    /// Sets the preprocessing function.
    pub fn with_func<F>(
        self,
        func: F,
    ) -> Self
    where
        F: Fn(S) -> S + Send + Sync + 'static,
    {
        Self {
            func: Some(Arc::new(func)),
            ..self
        }
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the preprocessing function, if any.
    pub fn preprocess(
        &self,
        value: S,
    ) -> S {
        match &self.func {
            Some(func) => func(value),
            None => value,
        }
    }

    /// Preprocess every example.
    pub fn transform(
        &self,
        sequences: Vec<S>,
    ) -> Vec<S> {
        sequences.into_iter().map(|s| self.preprocess(s)).collect()
    }

    /// Raw values are batched as-is.
    pub fn compose(
        &self,
        sequences: Vec<S>,
    ) -> Vec<S> {
        sequences
    }
}
