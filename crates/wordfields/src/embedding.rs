//! # Pretrained Embeddings
//!
//! The word-vector source a [`crate::fields::Field`] may be extended with.

use ndarray::Array2;

use crate::errors::{FieldError, FieldResult};

/// A pretrained embedding table: one vector per token.
#[derive(Debug, Clone)]
pub struct Embedding {
    tokens: Vec<String>,
    vectors: Array2<f32>,
    unk_index: Option<usize>,
}

impl Embedding {
    /// Create an embedding from tokens and their `tokens.len() × dim` vectors.
    ///
    /// ## Arguments
    /// * `tokens` - the embedding vocabulary.
    /// * `vectors` - row `i` is the vector of `tokens[i]`.
    pub fn new<S: Into<String>>(
        tokens: Vec<S>,
        vectors: Array2<f32>,
    ) -> FieldResult<Self> {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if tokens.len() != vectors.nrows() {
            return Err(FieldError::EmbeddingShape {
                tokens: tokens.len(),
                rows: vectors.nrows(),
                dim: vectors.ncols(),
            });
        }
        Ok(Self {
            tokens,
            vectors,
            unk_index: None,
        })
    }

    /// Create an embedding from per-token rows.
    ///
    /// Every row must have the same length.
    pub fn from_rows<S: Into<String>>(
        tokens: Vec<S>,
        rows: Vec<Vec<f32>>,
    ) -> FieldResult<Self> {
        let dim = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != dim) {
            return Err(FieldError::EmbeddingShape {
                tokens: tokens.len(),
                rows: rows.len(),
                dim,
            });
        }
        let n = rows.len();
        let vectors = Array2::from_shape_vec((n, dim), rows.into_iter().flatten().collect())?;
        Self::new(tokens, vectors)
    }

    /// Mark the token at `unk_index` as this embedding's own unknown token.
    ///
    /// Fields replace it with their own unk string when extending their vocab.
    pub fn with_unk_index(
        self,
        unk_index: usize,
    ) -> FieldResult<Self> {
        if unk_index >= self.tokens.len() {
            return Err(FieldError::EmbeddingShape {
                tokens: self.tokens.len(),
                rows: unk_index + 1,
                dim: self.dim(),
            });
        }
        Ok(Self {
            unk_index: Some(unk_index),
            ..self
        })
    }

    /// Mark the token equal to `unk` as the unknown token, if present.
    pub fn with_unk_token(
        self,
        unk: &str,
    ) -> Self {
        let unk_index = self.tokens.iter().position(|t| t == unk);
        Self { unk_index, ..self }
    }

    /// The embedding vocabulary.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The `tokens × dim` vector table.
    pub fn vectors(&self) -> &Array2<f32> {
        &self.vectors
    }

    /// The vector dimension.
    pub fn dim(&self) -> usize {
        self.vectors.ncols()
    }

    /// Whether the embedding has its own unknown token.
    pub fn has_unk(&self) -> bool {
        self.unk_index.is_some()
    }

    /// The position of the embedding's unknown token.
    pub fn unk_index(&self) -> Option<usize> {
        self.unk_index
    }

    /// Get the number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if the embedding is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn test_from_rows() {
        let embed = Embedding::from_rows(vec!["a", "b"], vec![vec![1.0, 2.0], vec![3.0, 4.0]])
            .unwrap();
        assert_eq!(embed.dim(), 2);
        assert_eq!(embed.len(), 2);
        assert_eq!(embed.vectors(), &array![[1.0, 2.0], [3.0, 4.0]]);
        assert!(!embed.has_unk());
    }

    #[test]
    fn test_shape_mismatch() {
        let err = Embedding::new(vec!["a"], Array2::zeros((2, 3))).unwrap_err();
        assert!(matches!(
            err,
            FieldError::EmbeddingShape {
                tokens: 1,
                rows: 2,
                dim: 3
            }
        ));

        let ragged = Embedding::from_rows(vec!["a", "b"], vec![vec![1.0], vec![1.0, 2.0]]);
        assert!(ragged.is_err());
    }

    #[test]
    fn test_unk() {
        let embed = Embedding::new(vec!["a", "UNK"], Array2::zeros((2, 1)))
            .unwrap()
            .with_unk_token("UNK");
        assert_eq!(embed.unk_index(), Some(1));

        let embed = embed.with_unk_index(0).unwrap();
        assert_eq!(embed.unk_index(), Some(0));
        assert!(embed.with_unk_index(5).is_err());
    }
}
