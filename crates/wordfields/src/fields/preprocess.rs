//! # Preprocessing Pipeline

use std::{fmt, sync::Arc};

use crate::errors::FieldResult;

/// A custom function applied to a whole token sequence before tokenization.
pub type SequenceFn = Arc<dyn Fn(Vec<String>) -> Vec<String> + Send + Sync>;

/// A tokenizer applied to each element of a sequence.
pub type TokenizeFn = Arc<dyn Fn(&str) -> FieldResult<Vec<String>> + Send + Sync>;

/// The fixed ``fn → tokenize → lowercase`` pipeline of a field.
#[derive(Clone, Default)]
pub struct Preprocessor {
    func: Option<SequenceFn>,
    tokenize: Option<TokenizeFn>,
    lower: bool,
}

impl fmt::Debug for Preprocessor {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Preprocessor")
            .field("func", &self.func.is_some())
            .field("tokenize", &self.tokenize.is_some())
            .field("lower", &self.lower)
            .finish()
    }
}

impl Preprocessor {
    /// Create a pipeline from its three optional stages.
    pub fn new(
        func: Option<SequenceFn>,
        tokenize: Option<TokenizeFn>,
        lower: bool,
    ) -> Self {
        Self {
            func,
            tokenize,
            lower,
        }
    }

    /// Whether the pipeline lowercases.
    pub fn lower(&self) -> bool {
        self.lower
    }

    /// Whether a tokenizer is configured.
    pub fn has_tokenizer(&self) -> bool {
        self.tokenize.is_some()
    }

    /// Preprocess a token sequence.
    ///
    /// The custom function runs on the whole sequence; the tokenizer runs on
    /// each resulting element, and its outputs are concatenated.
    pub fn apply<S: AsRef<str>>(
        &self,
        sequence: &[S],
    ) -> FieldResult<Vec<String>> {
        let mut sequence: Vec<String> = sequence.iter().map(|s| s.as_ref().to_string()).collect();
        if let Some(func) = &self.func {
            sequence = func(sequence);
        }
        if let Some(tokenize) = &self.tokenize {
            let mut pieces = Vec::with_capacity(sequence.len());
            for element in &sequence {
                pieces.extend(tokenize(element)?);
            }
            sequence = pieces;
        }
        Ok(self.lowercase(sequence))
    }

    /// Preprocess a single token into pieces.
    ///
    /// Without a tokenizer, the pieces are the token's characters.
    pub fn pieces(
        &self,
        token: &str,
    ) -> FieldResult<Vec<String>> {
        let mut sequence = vec![token.to_string()];
        if let Some(func) = &self.func {
            sequence = func(sequence);
        }
        let mut pieces = Vec::with_capacity(token.len());
        for element in &sequence {
            match &self.tokenize {
                Some(tokenize) => pieces.extend(tokenize(element)?),
                None => pieces.extend(element.chars().map(String::from)),
            }
        }
        Ok(self.lowercase(pieces))
    }

    fn lowercase(
        &self,
        sequence: Vec<String>,
    ) -> Vec<String> {
        if self.lower {
            sequence.into_iter().map(|t| t.to_lowercase()).collect()
        } else {
            sequence
        }
    }
}
