//! # Subword Field
//!
//! Numericalizes every token of a sequence into a fixed-width row of pieces;
//! this is the input shape of character-level and subword encoders.

use std::fmt;

use candle_core::{Device, Tensor};
use ndarray::Array2;

use crate::{
    batching::{pad_matrices, to_device},
    dataset::Dataset,
    embedding::Embedding,
    errors::FieldResult,
    fields::{Field, FieldOptions},
    types::IndexType,
    vocab::TokenCounter,
};

/// Options for [`SubwordField`].
#[derive(Debug, Clone, Default)]
pub struct SubwordFieldOptions {
    /// The options of the underlying [`Field`].
    pub field: FieldOptions,

    /// The maximum number of pieces kept per token.
    ///
    /// `0` derives the width from the first batch transformed.
    pub fix_len: usize,
}

impl SubwordFieldOptions {
    /// Create options from field options and a piece width.
    pub fn new(
        field: FieldOptions,
        fix_len: usize,
    ) -> Self {
        Self { field, fix_len }
    }

    /// Sets the piece width.
    pub fn with_fix_len(
        self,
        fix_len: usize,
    ) -> Self {
        Self { fix_len, ..self }
    }

    /// Initializes a [`SubwordField`] from these options.
    pub fn init<N: Into<String>>(
        self,
        name: N,
    ) -> SubwordField {
        SubwordField::new(Field::new(name, self.field), self.fix_len)
    }
}

/// A field that tokenizes and numericalizes each token rather than the sequence.
///
/// Every example becomes a `(tokens × pieces)` matrix; tokens with more pieces
/// than the width are truncated, shorter ones are padded with `pad_index`.
#[derive(Debug, Clone)]
pub struct SubwordField {
    field: Field,
    fix_len: usize,
    derived_fix_len: Option<usize>,
}

impl fmt::Display for SubwordField {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        self.field.fmt_as(f, "SubwordField")
    }
}

impl SubwordField {
    /// Wrap a field; `fix_len` of `0` means "derive from data".
    pub fn new(
        field: Field,
        fix_len: usize,
    ) -> Self {
        Self {
            field,
            fix_len,
            derived_fix_len: None,
        }
    }

    /// The underlying token-level field.
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Mutable access to the underlying field.
    pub fn field_mut(&mut self) -> &mut Field {
        &mut self.field
    }

    /// The field name.
    pub fn name(&self) -> &str {
        self.field.name()
    }

    /// Index of the padding token.
    pub fn pad_index(&self) -> IndexType {
        self.field.pad_index()
    }

    /// The user-supplied piece width; `0` if unset.
    pub fn configured_fix_len(&self) -> usize {
        self.fix_len
    }

    /// The width derived from data, when none was configured.
    pub fn derived_fix_len(&self) -> Option<usize> {
        self.derived_fix_len
    }

    /// The effective piece width; `0` if neither configured nor derived yet.
    pub fn fix_len(&self) -> usize {
        if self.fix_len > 0 {
            self.fix_len
        } else {
            self.derived_fix_len.unwrap_or(0)
        }
    }

    /// Forget the derived width; the next transform derives it again.
    pub fn reset_fix_len(&mut self) {
        self.derived_fix_len = None;
    }

    /// Preprocess a single token into pieces.
    pub fn preprocess_token(
        &self,
        token: &str,
    ) -> FieldResult<Vec<String>> {
        self.field.preprocessor().pieces(token)
    }

    /// Build the piece vocab from the dataset column named after this field.
    ///
    /// Does nothing if the vocab already exists. Embedding vectors are copied
    /// as-is, without normalization.
    pub fn build<D>(
        &mut self,
        dataset: &D,
        min_freq: usize,
        embed: Option<&Embedding>,
    ) -> FieldResult<()>
    where
        D: Dataset<Vec<String>> + ?Sized,
    {
        if self.field.is_built() {
            log::debug!("{}: vocab already built; skipping", self.name());
            return Ok(());
        }
        let mut counter = TokenCounter::new();
        for seq in dataset.require_column(self.field.name())? {
            for token in seq {
                counter.update(self.preprocess_token(token)?);
            }
        }
        self.field.build_from_counter(&counter, min_freq);

        if let Some(embed) = embed {
            self.field.attach_embedding(embed, false)?;
        }
        Ok(())
    }

    /// Turn examples into `(tokens × pieces)` index matrices.
    ///
    /// Derives and caches the piece width on first use if none was configured.
    /// The bos/eos markers become single-piece rows at the sequence ends.
    pub fn transform<T, S>(
        &mut self,
        sequences: &[T],
    ) -> FieldResult<Vec<Array2<IndexType>>>
    where
        T: AsRef<[S]>,
        S: AsRef<str>,
    {
        let pieces: Vec<Vec<Vec<String>>> = sequences
            .iter()
            .map(|seq| {
                seq.as_ref()
                    .iter()
                    .map(|token| self.preprocess_token(token.as_ref()))
                    .collect::<FieldResult<Vec<_>>>()
            })
            .collect::<FieldResult<_>>()?;

        if self.fix_len() == 0 {
            let derived = pieces
                .iter()
                .flat_map(|seq| seq.iter().map(Vec::len))
                .max()
                .unwrap_or(0);
            log::debug!("{}: derived fix_len={derived}", self.name());
            self.derived_fix_len = Some(derived);
        }
        let fix_len = self.fix_len();

        let field = &self.field;
        pieces
            .iter()
            .map(|seq| {
                let mut rows: Vec<Vec<IndexType>> = Vec::with_capacity(seq.len() + 2);
                if field.bos().is_some() {
                    rows.push(vec![field.bos_index()]);
                }
                for token in seq {
                    rows.push(field.numericalize(token)?);
                }
                if field.eos().is_some() {
                    rows.push(vec![field.eos_index()]);
                }
                let cap = rows.iter().map(Vec::len).max().unwrap_or(0).min(fix_len);
                Ok(pad_rows(&rows, cap, field.pad_index()))
            })
            .collect()
    }

    /// Pad a batch of matrices into a `(batch, max_tokens, max_pieces)` tensor.
    pub fn compose(
        &self,
        matrices: &[Array2<IndexType>],
        device: &Device,
    ) -> FieldResult<Tensor> {
        let batch = pad_matrices(matrices, self.pad_index())?;
        to_device(&batch, device)
    }
}

/// Truncate or pad each row to `width`.
fn pad_rows(
    rows: &[Vec<IndexType>],
    width: usize,
    pad_index: IndexType,
) -> Array2<IndexType> {
    let mut out = Array2::from_elem((rows.len(), width), pad_index);
    for (mut dst, row) in out.rows_mut().into_iter().zip(rows) {
        for (d, &s) in dst.iter_mut().zip(row) {
            *d = s;
        }
    }
    out
}
