//! # Error Types

/// Errors from wordfields operations.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// The dataset has no column named after the field.
    #[error("dataset has no column named {name:?}")]
    MissingColumn {
        /// The field name that was looked up.
        name: String,
    },

    /// A vocab-dependent operation was called before the vocab was built.
    #[error("field {name:?} has no vocab; call build() first")]
    VocabNotBuilt {
        /// The field name.
        name: String,
    },

    /// A field with `use_vocab = false` received a non-integer token.
    #[error("token {token:?} is not an integer index")]
    NotNumeric {
        /// The offending token.
        token: String,
    },

    /// Batching was asked to compose zero examples.
    #[error("cannot compose an empty batch")]
    EmptyBatch,

    /// A chart example has no span triples.
    #[error("cannot build a chart from an example with no spans")]
    EmptyChart,

    /// The embedding vectors do not match its token list or dimension.
    #[error("embedding has {tokens} tokens but {rows} vectors of dim {dim}")]
    EmbeddingShape {
        /// Number of embedding tokens.
        tokens: usize,
        /// Number of vector rows.
        rows: usize,
        /// Declared vector dimension.
        dim: usize,
    },

    /// Preprocessing changed the number of embedding tokens.
    #[error("preprocessing mapped {expected} embedding tokens to {actual}")]
    EmbeddingMisaligned {
        /// Token count before preprocessing.
        expected: usize,
        /// Token count after preprocessing.
        actual: usize,
    },

    /// Vocabulary data is inconsistent.
    #[error("{0}")]
    VocabConflict(String),

    /// Error from the tokenizer backend.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Tensor construction or device transfer failed.
    #[error(transparent)]
    Tensor(#[from] candle_core::Error),

    /// Host-side array construction failed.
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

/// Result type for wordfields operations.
pub type FieldResult<T> = core::result::Result<T, FieldError>;
