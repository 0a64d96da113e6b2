//! # Pretrained Transformer Field

use std::{fmt, sync::Arc};

use candle_core::{Device, Tensor};
use ndarray::Array2;

use crate::{
    errors::{FieldError, FieldResult},
    fields::{FieldOptions, SpecialTokens, SubwordField, SubwordFieldOptions, TokenizeFn},
    pretrained::PretrainedTokenizer,
    types::{IndexType, to_index},
    vocab::Vocab,
};

/// Options for [`BertField`].
#[derive(Debug, Clone, Default)]
pub struct BertFieldOptions {
    /// The maximum number of pieces kept per token; `0` derives it from data.
    pub fix_len: usize,

    /// Whether to lowercase tokens before tokenization.
    pub lower: bool,

    /// Whether to append the tokenizer's eos (or sep) token.
    pub append_eos: bool,
}

impl BertFieldOptions {
    /// Sets the piece width.
    pub fn with_fix_len(
        self,
        fix_len: usize,
    ) -> Self {
        Self { fix_len, ..self }
    }

    /// Sets lowercasing.
    pub fn with_lower(
        self,
        lower: bool,
    ) -> Self {
        Self { lower, ..self }
    }

    /// Sets eos appending.
    pub fn with_append_eos(
        self,
        append_eos: bool,
    ) -> Self {
        Self { append_eos, ..self }
    }
}

/// A [`SubwordField`] whose vocab and tokenizer come from a pretrained model.
///
/// The vocab is fixed by the tokenizer, so [`BertField::build`] does nothing.
#[derive(Clone)]
pub struct BertField {
    subword: SubwordField,
    tokenizer: Arc<dyn PretrainedTokenizer>,
}

impl fmt::Debug for BertField {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("BertField")
            .field("subword", &self.subword)
            .field("specials", self.tokenizer.specials())
            .finish()
    }
}

impl fmt::Display for BertField {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        self.subword.field().fmt_as(f, "BertField")
    }
}

impl BertField {
    /// Create a field over a pretrained tokenizer.
    ///
    /// ## Arguments
    /// * `name` - the field name.
    /// * `tokenizer` - supplies the vocab, the specials, and tokenization.
    /// * `options` - piece width and casing.
    pub fn new<N: Into<String>>(
        name: N,
        tokenizer: Arc<dyn PretrainedTokenizer>,
        options: BertFieldOptions,
    ) -> FieldResult<Self> {
        let declared = tokenizer.specials().clone();
        let specials = SpecialTokens {
            pad: declared.pad,
            unk: declared.unk,
            bos: declared.bos.or(declared.cls),
            eos: if options.append_eos {
                declared.eos.or(declared.sep)
            } else {
                None
            },
        };

        let unk_index = tokenizer.unk_token_id().unwrap_or(0);
        let vocab = Vocab::from_pretrained(tokenizer.vocab_pairs(), unk_index)?;
        if vocab.len() != tokenizer.vocab_size() {
            return Err(FieldError::VocabConflict(format!(
                "tokenizer reports {} ids but {} were resolved",
                tokenizer.vocab_size(),
                vocab.len()
            )));
        }

        let backend = tokenizer.clone();
        let tokenize: TokenizeFn = Arc::new(move |text: &str| backend.tokenize(text));

        let field_options = FieldOptions::default()
            .with_specials(specials)
            .with_lower(options.lower)
            .with_tokenize(tokenize)
            .with_mask_token_id(tokenizer.mask_token_id().map_or(0, to_index));
        let mut subword = SubwordFieldOptions::new(field_options, options.fix_len).init(name);
        subword.field_mut().set_vocab(vocab);

        Ok(Self { subword, tokenizer })
    }

    /// Load a pretrained tokenizer by local path or hub model name.
    ///
    /// Missing bos/eos tokens are filled with the cls/sep tokens.
    #[cfg(feature = "pretrained")]
    pub fn tokenizer(
        name_or_path: &str,
        auth_token: Option<&str>,
    ) -> FieldResult<crate::pretrained::HfTokenizer> {
        crate::pretrained::HfTokenizer::load(name_or_path, auth_token)
    }

    /// The underlying subword field.
    pub fn subword(&self) -> &SubwordField {
        &self.subword
    }

    /// The pretrained tokenizer.
    pub fn pretrained(&self) -> &Arc<dyn PretrainedTokenizer> {
        &self.tokenizer
    }

    /// The field name.
    pub fn name(&self) -> &str {
        self.subword.name()
    }

    /// The pretrained vocab.
    pub fn vocab(&self) -> FieldResult<&Vocab> {
        self.subword.field().require_vocab()
    }

    /// Index of the padding token.
    pub fn pad_index(&self) -> IndexType {
        self.subword.pad_index()
    }

    /// The mask token id.
    pub fn mask_token_id(&self) -> IndexType {
        self.subword.field().mask_token_id()
    }

    /// The vocab is pretrained; nothing to build.
    pub fn build<D: ?Sized>(
        &mut self,
        _dataset: &D,
    ) -> FieldResult<()> {
        log::debug!("{}: pretrained vocab; build skipped", self.name());
        Ok(())
    }

    /// Turn examples into `(tokens × pieces)` index matrices.
    ///
    /// See [`SubwordField::transform`].
    pub fn transform<T, S>(
        &mut self,
        sequences: &[T],
    ) -> FieldResult<Vec<Array2<IndexType>>>
    where
        T: AsRef<[S]>,
        S: AsRef<str>,
    {
        self.subword.transform(sequences)
    }

    /// Pad a batch of matrices into a `(batch, max_tokens, max_pieces)` tensor.
    pub fn compose(
        &self,
        matrices: &[Array2<IndexType>],
        device: &Device,
    ) -> FieldResult<Tensor> {
        self.subword.compose(matrices, device)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::{dataset::ColumnDataset, pretrained::PretrainedSpecials, types::WFHashMap};

    /// Greedy longest-match `WordPiece` over a fixed table.
    struct TableTokenizer {
        itos: Vec<String>,
        stoi: WFHashMap<String, usize>,
        specials: PretrainedSpecials,
    }

    impl TableTokenizer {
        fn new(tokens: &[&str]) -> Self {
            let itos: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
            let stoi = itos.iter().cloned().zip(0..).collect();
            let specials = PretrainedSpecials {
                pad: Some("[PAD]".to_string()),
                unk: Some("[UNK]".to_string()),
                cls: Some("[CLS]".to_string()),
                sep: Some("[SEP]".to_string()),
                mask: Some("[MASK]".to_string()),
                ..Default::default()
            };
            Self {
                itos,
                stoi,
                specials,
            }
        }
    }

    impl PretrainedTokenizer for TableTokenizer {
        fn tokenize(
            &self,
            text: &str,
        ) -> FieldResult<Vec<String>> {
            let mut pieces = Vec::new();
            let mut rest = text;
            while !rest.is_empty() {
                let prefix = if pieces.is_empty() { "" } else { "##" };
                let found = (1..=rest.len()).rev().find_map(|end| {
                    let piece = format!("{prefix}{}", rest.get(..end)?);
                    self.stoi.contains_key(&piece).then_some((piece, end))
                });
                match found {
                    Some((piece, end)) => {
                        pieces.push(piece);
                        rest = &rest[end..];
                    }
                    None => return Ok(vec!["[UNK]".to_string()]),
                }
            }
            Ok(pieces)
        }

        fn vocab_size(&self) -> usize {
            self.itos.len()
        }

        fn id_to_token(
            &self,
            id: usize,
        ) -> Option<String> {
            self.itos.get(id).cloned()
        }

        fn token_to_id(
            &self,
            token: &str,
        ) -> Option<usize> {
            self.stoi.get(token).copied()
        }

        fn specials(&self) -> &PretrainedSpecials {
            &self.specials
        }
    }

    fn table() -> Arc<dyn PretrainedTokenizer> {
        Arc::new(TableTokenizer::new(&[
            "[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]", "this", "field", "token", "##ization",
        ]))
    }

    #[test]
    fn test_specials_from_tokenizer() {
        let field = BertField::new("bert", table(), BertFieldOptions::default()).unwrap();
        let inner = field.subword().field();

        assert_eq!(inner.pad(), Some("[PAD]"));
        assert_eq!(inner.unk(), Some("[UNK]"));
        assert_eq!(inner.bos(), Some("[CLS]"));
        assert_eq!(inner.eos(), None);
        assert_eq!(inner.pad_index(), 0);
        assert_eq!(inner.unk_index(), 1);
        assert_eq!(inner.bos_index(), 2);
        assert_eq!(field.mask_token_id(), 4);
        assert_eq!(field.vocab().unwrap().len(), 9);
    }

    #[test]
    fn test_build_is_noop() {
        let mut field = BertField::new("bert", table(), BertFieldOptions::default()).unwrap();
        let before = field.vocab().unwrap().clone();
        let dataset = ColumnDataset::new().with_column("bert", vec![vec!["novel".to_string()]]);

        field.build(&dataset).unwrap();
        assert_eq!(field.vocab().unwrap(), &before);
    }

    #[test]
    fn test_transform() {
        let mut field = BertField::new(
            "bert",
            table(),
            BertFieldOptions::default()
                .with_fix_len(20)
                .with_lower(true)
                .with_append_eos(true),
        )
        .unwrap();

        let out = field
            .transform(&[vec!["this", "field", "tokenization", "???"]])
            .unwrap();
        assert_eq!(
            out[0],
            array![[2, 0], [5, 0], [6, 0], [7, 8], [1, 0], [3, 0]]
        );
        assert_eq!(field.subword().derived_fix_len(), None);
    }

    #[test]
    fn test_compose() {
        let mut field = BertField::new("bert", table(), BertFieldOptions::default()).unwrap();
        let out = field
            .transform(&[vec!["tokenization"], vec!["this", "field"]])
            .unwrap();
        let batch = field.compose(&out, &Device::Cpu).unwrap();
        assert_eq!(batch.dims(), &[2, 3, 2]);
    }

    #[test]
    fn test_display() {
        let field = BertField::new("bert", table(), BertFieldOptions::default()).unwrap();
        assert_eq!(
            field.to_string(),
            "(bert): BertField(pad=[PAD], unk=[UNK], bos=[CLS])"
        );
    }

    #[cfg(feature = "pretrained")]
    #[test]
    fn test_hf_tokenizer() {
        let tokenizer = crate::pretrained::hf_tokenizer::tests::wordpiece();
        let mut field = BertField::new("bert", Arc::new(tokenizer), BertFieldOptions::default()).unwrap();

        let out = field
            .transform(&[vec!["field", "token-level", "tokenization"]])
            .unwrap();
        assert_eq!(
            out[0],
            array![[2, 0, 0], [9, 0, 0], [5, 6, 7], [5, 8, 0]]
        );
    }
}
