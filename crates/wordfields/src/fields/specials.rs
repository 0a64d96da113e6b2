//! # Special Tokens

use std::fmt;

use crate::{types::IndexType, vocab::Vocab};

/// The optional pad/unk/bos/eos token strings of a field.
///
/// Empty strings are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialTokens {
    /// The padding token.
    pub pad: Option<String>,
    /// The out-of-vocabulary token.
    pub unk: Option<String>,
    /// The token prepended to every example.
    pub bos: Option<String>,
    /// The token appended to every example.
    pub eos: Option<String>,
}

fn non_empty(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

impl SpecialTokens {
    /// Normalize unset and empty tokens to `None`.
    pub fn normalized(self) -> Self {
        Self {
            pad: non_empty(self.pad),
            unk: non_empty(self.unk),
            bos: non_empty(self.bos),
            eos: non_empty(self.eos),
        }
    }

    /// The configured tokens, in ``pad, unk, bos, eos`` order.
    ///
    /// A token configured for two roles appears once, at its first role.
    pub fn specials(&self) -> Vec<String> {
        let mut specials: Vec<String> = Vec::with_capacity(4);
        for token in [&self.pad, &self.unk, &self.bos, &self.eos]
            .into_iter()
            .flatten()
        {
            if !specials.contains(token) {
                specials.push(token.clone());
            }
        }
        specials
    }
}

impl fmt::Display for SpecialTokens {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let params = [
            ("pad", &self.pad),
            ("unk", &self.unk),
            ("bos", &self.bos),
            ("eos", &self.eos),
        ];
        let mut first = true;
        for (key, value) in params {
            if let Some(value) = value {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// The resolved indices of the special tokens.
///
/// An unset special resolves to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecialIndices {
    /// Index of the padding token.
    pub pad: IndexType,
    /// Index of the out-of-vocabulary token.
    pub unk: IndexType,
    /// Index of the begin-of-sequence token.
    pub bos: IndexType,
    /// Index of the end-of-sequence token.
    pub eos: IndexType,
}

impl SpecialIndices {
    /// Resolve indices through `vocab` if present, else by position in `specials`.
    pub fn resolve(
        tokens: &SpecialTokens,
        specials: &[String],
        vocab: Option<&Vocab>,
    ) -> Self {
        let lookup = |token: &Option<String>| -> IndexType {
            let Some(token) = token else {
                return 0;
            };
            match vocab {
                Some(vocab) => vocab.index(token),
                None => specials
                    .iter()
                    .position(|s| s == token)
                    .map_or(0, crate::types::to_index),
            }
        };
        Self {
            pad: lookup(&tokens.pad),
            unk: lookup(&tokens.unk),
            bos: lookup(&tokens.bos),
            eos: lookup(&tokens.eos),
        }
    }
}
