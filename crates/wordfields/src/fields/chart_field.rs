//! # Chart Field
//!
//! Constituency trees arrive as binarized spans in pre-order:
//!
//! ```text
//!   [(0, 5, "S"), (0, 4, "S|<>"), (0, 1, "NP"), (1, 4, "VP"), ...]
//! ```
//!
//! and leave as square label charts with `-1` wherever no constituent starts
//! and ends.

use std::{fmt, sync::Arc};

use candle_core::{Device, Tensor};
use ndarray::Array2;

use crate::{
    batching::{pad_matrices, to_device},
    dataset::Dataset,
    errors::{FieldError, FieldResult},
    fields::Field,
    types::IndexType,
    vocab::TokenCounter,
};

/// The chart value of cells with no constituent.
pub const NO_SPAN: IndexType = -1;

/// A custom function applied to each example's spans.
pub type SpanFn = Arc<dyn Fn(Vec<SpanLabel>) -> Vec<SpanLabel> + Send + Sync>;

/// A labeled constituent over the fenceposts ``start..end``.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpanLabel {
    /// The left fencepost.
    pub start: usize,
    /// The right fencepost.
    pub end: usize,
    /// The constituent label.
    pub label: String,
}

impl SpanLabel {
    /// Create a new span label.
    pub fn new<S: Into<String>>(
        start: usize,
        end: usize,
        label: S,
    ) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }
}

impl<S: Into<String>> From<(usize, usize, S)> for SpanLabel {
    fn from((start, end, label): (usize, usize, S)) -> Self {
        Self::new(start, end, label)
    }
}

/// A field over span-labeled trees.
///
/// The vocab holds span labels only; bos/eos tokens play no role.
#[derive(Clone)]
pub struct ChartField {
    field: Field,
    span_fn: Option<SpanFn>,
}

impl fmt::Debug for ChartField {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ChartField")
            .field("field", &self.field)
            .field("span_fn", &self.span_fn.is_some())
            .finish()
    }
}

impl fmt::Display for ChartField {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        self.field.fmt_as(f, "ChartField")
    }
}

impl From<Field> for ChartField {
    fn from(field: Field) -> Self {
        Self::new(field)
    }
}

impl ChartField {
    /// Wrap a field whose vocab will hold span labels.
    pub fn new(field: Field) -> Self {
        Self {
            field,
            span_fn: None,
        }
    }

    /// Sets a custom function applied to each example's spans.
    pub fn with_span_fn<F>(
        self,
        span_fn: F,
    ) -> Self
    where
        F: Fn(Vec<SpanLabel>) -> Vec<SpanLabel> + Send + Sync + 'static,
    {
        Self {
            span_fn: Some(Arc::new(span_fn)),
            ..self
        }
    }

    /// The underlying field.
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// The field name.
    pub fn name(&self) -> &str {
        self.field.name()
    }

    /// Index of the padding token.
    pub fn pad_index(&self) -> IndexType {
        self.field.pad_index()
    }

    /// Apply the custom span function, if any.
    pub fn preprocess(
        &self,
        spans: &[SpanLabel],
    ) -> Vec<SpanLabel> {
        match &self.span_fn {
            Some(span_fn) => span_fn(spans.to_vec()),
            None => spans.to_vec(),
        }
    }

    /// Build the label vocab from the dataset column named after this field.
    ///
    /// Does nothing if the vocab already exists.
    pub fn build<D>(
        &mut self,
        dataset: &D,
        min_freq: usize,
    ) -> FieldResult<()>
    where
        D: Dataset<Vec<SpanLabel>> + ?Sized,
    {
        if self.field.is_built() {
            log::debug!("{}: vocab already built; skipping", self.name());
            return Ok(());
        }
        let mut counter = TokenCounter::new();
        for spans in dataset.require_column(self.field.name())? {
            counter.update(self.preprocess(spans).iter().map(|s| &s.label));
        }
        self.field.build_from_counter(&counter, min_freq);
        Ok(())
    }

    /// Turn examples into `n × n` label charts, `n = max end + 1`.
    ///
    /// Cells without a span hold [`NO_SPAN`]. When two spans share a cell the
    /// later one wins; well-formed pre-order trees never do this.
    pub fn transform(
        &self,
        sequences: &[Vec<SpanLabel>],
    ) -> FieldResult<Vec<Array2<IndexType>>> {
        sequences
            .iter()
            .map(|spans| {
                let spans = self.preprocess(spans);
                let n = spans
                    .iter()
                    .map(|s| s.start.max(s.end))
                    .max()
                    .ok_or(FieldError::EmptyChart)?
                    + 1;

                let mut chart = Array2::from_elem((n, n), NO_SPAN);
                for span in &spans {
                    chart[[span.start, span.end]] = self.field.numericalize_token(&span.label)?;
                }
                Ok(chart)
            })
            .collect()
    }

    /// Pad a batch of charts into a `(batch, n, n)` tensor.
    pub fn compose(
        &self,
        charts: &[Array2<IndexType>],
        device: &Device,
    ) -> FieldResult<Tensor> {
        let batch = pad_matrices(charts, self.pad_index())?;
        to_device(&batch, device)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::{dataset::ColumnDataset, fields::FieldOptions};

    fn spans(raw: &[(usize, usize, &str)]) -> Vec<SpanLabel> {
        raw.iter().map(|&t| t.into()).collect()
    }

    fn tree() -> Vec<SpanLabel> {
        spans(&[
            (0, 5, "S"),
            (0, 4, "S|<>"),
            (0, 1, "NP"),
            (1, 4, "VP"),
            (1, 2, "VP|<>"),
            (2, 4, "S+VP"),
            (2, 3, "VP|<>"),
            (3, 4, "NP"),
            (4, 5, "S|<>"),
        ])
    }

    fn built() -> ChartField {
        let mut field: ChartField = FieldOptions::default().init("charts").into();
        let dataset = ColumnDataset::new().with_column("charts", vec![tree(), spans(&[(0, 1, "NP")])]);
        field.build(&dataset, 1).unwrap();
        field
    }

    #[test]
    fn test_build() {
        let field = built();
        assert_eq!(
            field.field().vocab().unwrap().tokens(),
            &["NP", "S|<>", "VP|<>", "S", "VP", "S+VP"]
        );
    }

    #[test]
    fn test_transform() {
        let field = built();
        let chart = &field.transform(&[tree()]).unwrap()[0];

        assert_eq!(
            chart,
            &array![
                [-1, 0, -1, -1, 1, 3],
                [-1, -1, 2, -1, 4, -1],
                [-1, -1, -1, 2, 5, -1],
                [-1, -1, -1, -1, 0, -1],
                [-1, -1, -1, -1, -1, 1],
                [-1, -1, -1, -1, -1, -1],
            ]
        );
    }

    #[test]
    fn test_top_label_and_fill() {
        let field = built();
        let chart = &field.transform(&[tree()]).unwrap()[0];
        let n = chart.nrows();

        assert_eq!(chart.dim(), (6, 6));
        assert_eq!(chart[[0, n - 1]], field.field().vocab().unwrap().index("S"));
        let labeled = chart.iter().filter(|&&v| v != NO_SPAN).count();
        assert_eq!(labeled, tree().len());
    }

    #[test]
    fn test_last_write_wins() {
        let field = built();
        let chart = &field
            .transform(&[spans(&[(0, 2, "S"), (0, 2, "NP")])])
            .unwrap()[0];
        assert_eq!(chart[[0, 2]], 0);
    }

    #[test]
    fn test_empty_example() {
        let field = built();
        let err = field.transform(&[vec![]]).unwrap_err();
        assert!(matches!(err, FieldError::EmptyChart));
    }

    #[test]
    fn test_span_fn() {
        let field = built().with_span_fn(|spans: Vec<SpanLabel>| {
            spans.into_iter().filter(|s| s.end - s.start > 1).collect()
        });
        let chart = &field.transform(&[tree()]).unwrap()[0];
        assert_eq!(chart[[0, 1]], NO_SPAN);
        assert_eq!(chart[[0, 5]], 3);
    }

    #[test]
    fn test_compose() {
        let field = built();
        let charts = field
            .transform(&[tree(), spans(&[(0, 1, "NP")])])
            .unwrap();
        let batch = field.compose(&charts, &Device::Cpu).unwrap();

        assert_eq!(batch.dims(), &[2, 6, 6]);
        let values: Vec<Vec<Vec<IndexType>>> = batch.to_vec3().unwrap();
        assert_eq!(values[1][0][..3], [-1, 0, 0]);
        assert_eq!(values[1][1][..3], [-1, -1, 0]);
        assert_eq!(values[1][5][5], 0);
    }

    #[test]
    fn test_display() {
        let field: ChartField = FieldOptions::default().with_unk("<unk>").init("charts").into();
        assert_eq!(field.to_string(), "(charts): ChartField(unk=<unk>)");
    }
}
