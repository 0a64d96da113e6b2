//! # Pretrained Tokenizer Trait

use crate::errors::FieldResult;

/// The special token strings a pretrained tokenizer declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PretrainedSpecials {
    /// The padding token.
    pub pad: Option<String>,
    /// The out-of-vocabulary token.
    pub unk: Option<String>,
    /// The begin-of-sequence token.
    pub bos: Option<String>,
    /// The end-of-sequence token.
    pub eos: Option<String>,
    /// The classifier token (BERT's ``[CLS]``).
    pub cls: Option<String>,
    /// The separator token (BERT's ``[SEP]``).
    pub sep: Option<String>,
    /// The mask token.
    pub mask: Option<String>,
}

impl PretrainedSpecials {
    /// Fill a missing bos with cls, and a missing eos with sep.
    pub fn normalized(self) -> Self {
        Self {
            bos: self.bos.or_else(|| self.cls.clone()),
            eos: self.eos.or_else(|| self.sep.clone()),
            ..self
        }
    }
}

/// A capability-typed pretrained tokenizer collaborator.
pub trait PretrainedTokenizer: Send + Sync {
    /// Split text into vocabulary pieces.
    fn tokenize(
        &self,
        text: &str,
    ) -> FieldResult<Vec<String>>;

    /// Get the number of ids in the vocabulary.
    fn vocab_size(&self) -> usize;

    /// Reverse lookup of an id.
    fn id_to_token(
        &self,
        id: usize,
    ) -> Option<String>;

    /// Lookup of a token.
    fn token_to_id(
        &self,
        token: &str,
    ) -> Option<usize>;

    /// The declared special tokens.
    fn specials(&self) -> &PretrainedSpecials;

    /// The id of the unknown token, if declared and present.
    fn unk_token_id(&self) -> Option<usize> {
        self.specials()
            .unk
            .as_deref()
            .and_then(|t| self.token_to_id(t))
    }

    /// The id of the mask token, if declared and present.
    fn mask_token_id(&self) -> Option<usize> {
        self.specials()
            .mask
            .as_deref()
            .and_then(|t| self.token_to_id(t))
    }

    /// All ``(token, id)`` pairs, in id order.
    fn vocab_pairs(&self) -> Vec<(String, usize)> {
        (0..self.vocab_size())
            .filter_map(|id| self.id_to_token(id).map(|t| (t, id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized() {
        let specials = PretrainedSpecials {
            cls: Some("[CLS]".to_string()),
            sep: Some("[SEP]".to_string()),
            eos: Some("</s>".to_string()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(specials.bos.as_deref(), Some("[CLS]"));
        assert_eq!(specials.eos.as_deref(), Some("</s>"));
    }
}
