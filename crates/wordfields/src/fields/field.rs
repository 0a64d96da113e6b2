//! # Token Sequence Field

use std::fmt;

use candle_core::{Device, Tensor};
use ndarray::Array2;

use crate::{
    batching::{pad_sequences, to_device},
    dataset::Dataset,
    embedding::Embedding,
    errors::{FieldError, FieldResult},
    fields::{
        SequenceFn,
        TokenizeFn,
        preprocess::Preprocessor,
        specials::{SpecialIndices, SpecialTokens},
    },
    types::IndexType,
    vocab::{TokenCounter, Vocab},
};

/// Options for [`Field`].
#[derive(Clone)]
pub struct FieldOptions {
    /// The pad/unk/bos/eos tokens.
    pub specials: SpecialTokens,

    /// Whether to lowercase tokens.
    pub lower: bool,

    /// Whether to map tokens through a [`Vocab`].
    ///
    /// When `false`, tokens must already be integer indices.
    pub use_vocab: bool,

    /// Custom function applied to each raw sequence.
    pub func: Option<SequenceFn>,

    /// Tokenizer applied to each element of a sequence.
    pub tokenize: Option<TokenizeFn>,

    /// The index used when masking tokens for the model.
    pub mask_token_id: IndexType,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            specials: SpecialTokens::default(),
            lower: false,
            use_vocab: true,
            func: None,
            tokenize: None,
            mask_token_id: 0,
        }
    }
}

impl fmt::Debug for FieldOptions {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("specials", &self.specials)
            .field("lower", &self.lower)
            .field("use_vocab", &self.use_vocab)
            .field("func", &self.func.is_some())
            .field("tokenize", &self.tokenize.is_some())
            .field("mask_token_id", &self.mask_token_id)
            .finish()
    }
}

impl FieldOptions {
    /// Sets the padding token.
    pub fn with_pad<S: Into<String>>(
        mut self,
        pad: S,
    ) -> Self {
        self.specials.pad = Some(pad.into());
        self
    }

    /// Sets the out-of-vocabulary token.
    pub fn with_unk<S: Into<String>>(
        mut self,
        unk: S,
    ) -> Self {
        self.specials.unk = Some(unk.into());
        self
    }

    /// Sets the token prepended to every example.
    pub fn with_bos<S: Into<String>>(
        mut self,
        bos: S,
    ) -> Self {
        self.specials.bos = Some(bos.into());
        self
    }

    /// Sets the token appended to every example.
    pub fn with_eos<S: Into<String>>(
        mut self,
        eos: S,
    ) -> Self {
        self.specials.eos = Some(eos.into());
        self
    }

    /// Sets all special tokens at once.
    pub fn with_specials(
        self,
        specials: SpecialTokens,
    ) -> Self {
        Self { specials, ..self }
    }

    /// Sets lowercasing.
    pub fn with_lower(
        self,
        lower: bool,
    ) -> Self {
        Self { lower, ..self }
    }

    /// Sets vocab usage.
    pub fn with_use_vocab(
        self,
        use_vocab: bool,
    ) -> Self {
        Self { use_vocab, ..self }
    }

    /// Sets the custom sequence function.
    pub fn with_func<F>(
        self,
        func: F,
    ) -> Self
    where
        F: Fn(Vec<String>) -> Vec<String> + Send + Sync + 'static,
    {
        Self {
            func: Some(std::sync::Arc::new(func)),
            ..self
        }
    }

    /// Sets the tokenizer.
    pub fn with_tokenize(
        self,
        tokenize: TokenizeFn,
    ) -> Self {
        Self {
            tokenize: Some(tokenize),
            ..self
        }
    }

    /// Sets the mask token id.
    pub fn with_mask_token_id(
        self,
        mask_token_id: IndexType,
    ) -> Self {
        Self {
            mask_token_id,
            ..self
        }
    }

    /// Initializes a [`Field`] from these options.
    ///
    /// ## Arguments
    /// * `name` - the field name; also the dataset column it is built from.
    pub fn init<N: Into<String>>(
        self,
        name: N,
    ) -> Field {
        Field::new(name, self)
    }
}

/// A token sequence datatype, with instructions for converting it to tensors.
///
/// The field holds the [`Vocab`] that numericalizes its tokens. The vocab is
/// either absent (before [`Field::build`]) or fixed; building twice is a no-op.
#[derive(Clone)]
pub struct Field {
    name: String,
    tokens: SpecialTokens,
    specials: Vec<String>,
    indices: SpecialIndices,
    use_vocab: bool,
    mask_token_id: IndexType,
    preprocessor: Preprocessor,
    vocab: Option<Vocab>,
    embed: Option<Array2<f32>>,
}

impl fmt::Debug for Field {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("tokens", &self.tokens)
            .field("indices", &self.indices)
            .field("use_vocab", &self.use_vocab)
            .field("preprocessor", &self.preprocessor)
            .field("vocab_len", &self.vocab.as_ref().map(Vocab::len))
            .finish()
    }
}

impl fmt::Display for Field {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        self.fmt_as(f, "Field")
    }
}

impl Field {
    /// Create a new field.
    pub fn new<N: Into<String>>(
        name: N,
        options: FieldOptions,
    ) -> Self {
        let tokens = options.specials.normalized();
        let specials = tokens.specials();
        let indices = SpecialIndices::resolve(&tokens, &specials, None);
        Self {
            name: name.into(),
            tokens,
            specials,
            indices,
            use_vocab: options.use_vocab,
            mask_token_id: options.mask_token_id,
            preprocessor: Preprocessor::new(options.func, options.tokenize, options.lower),
            vocab: None,
            embed: None,
        }
    }

    /// Write the ``(name): Class(params)`` representation.
    pub(crate) fn fmt_as(
        &self,
        f: &mut fmt::Formatter<'_>,
        class: &str,
    ) -> fmt::Result {
        write!(f, "({}): {class}({}", self.name, self.tokens)?;
        let mut sep = if self.specials.is_empty() { "" } else { ", " };
        if self.preprocessor.lower() {
            write!(f, "{sep}lower=true")?;
            sep = ", ";
        }
        if !self.use_vocab {
            write!(f, "{sep}use_vocab=false")?;
        }
        write!(f, ")")
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The special token strings.
    pub fn special_tokens(&self) -> &SpecialTokens {
        &self.tokens
    }

    /// The configured special tokens, in ``pad, unk, bos, eos`` order.
    pub fn specials(&self) -> &[String] {
        &self.specials
    }

    /// The padding token.
    pub fn pad(&self) -> Option<&str> {
        self.tokens.pad.as_deref()
    }

    /// The out-of-vocabulary token.
    pub fn unk(&self) -> Option<&str> {
        self.tokens.unk.as_deref()
    }

    /// The begin-of-sequence token.
    pub fn bos(&self) -> Option<&str> {
        self.tokens.bos.as_deref()
    }

    /// The end-of-sequence token.
    pub fn eos(&self) -> Option<&str> {
        self.tokens.eos.as_deref()
    }

    /// Index of the padding token; 0 if unset.
    pub fn pad_index(&self) -> IndexType {
        self.indices.pad
    }

    /// Index of the out-of-vocabulary token; 0 if unset.
    pub fn unk_index(&self) -> IndexType {
        self.indices.unk
    }

    /// Index of the begin-of-sequence token; 0 if unset.
    pub fn bos_index(&self) -> IndexType {
        self.indices.bos
    }

    /// Index of the end-of-sequence token; 0 if unset.
    pub fn eos_index(&self) -> IndexType {
        self.indices.eos
    }

    /// All resolved special indices.
    pub fn special_indices(&self) -> SpecialIndices {
        self.indices
    }

    /// The padding-mask token id.
    pub fn mask_token_id(&self) -> IndexType {
        self.mask_token_id
    }

    /// Whether tokens are lowercased.
    pub fn lower(&self) -> bool {
        self.preprocessor.lower()
    }

    /// Whether tokens are mapped through the vocab.
    pub fn use_vocab(&self) -> bool {
        self.use_vocab
    }

    /// The preprocessing pipeline.
    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    /// The vocab, once built.
    pub fn vocab(&self) -> Option<&Vocab> {
        self.vocab.as_ref()
    }

    /// Whether the vocab has been built or attached.
    pub fn is_built(&self) -> bool {
        self.vocab.is_some()
    }

    /// The pretrained embedding matrix aligned with the vocab, if any.
    pub fn embed(&self) -> Option<&Array2<f32>> {
        self.embed.as_ref()
    }

    /// Attach a vocab directly, replacing any existing one.
    ///
    /// The special indices are re-resolved through the new vocab. An attached
    /// embedding matrix is dropped, since its rows follow the old vocab.
    pub fn set_vocab(
        &mut self,
        vocab: Vocab,
    ) {
        if let Some(old) = &self.vocab {
            log::info!(
                "{}: replacing vocab of {} tokens with {} tokens",
                self.name,
                old.len(),
                vocab.len()
            );
        }
        if self.embed.take().is_some() {
            log::warn!("{}: embedding matrix dropped with the old vocab", self.name);
        }
        self.indices = SpecialIndices::resolve(&self.tokens, &self.specials, Some(&vocab));
        self.vocab = Some(vocab);
    }

    /// Get the vocab or fail with [`FieldError::VocabNotBuilt`].
    pub fn require_vocab(&self) -> FieldResult<&Vocab> {
        self.vocab.as_ref().ok_or_else(|| FieldError::VocabNotBuilt {
            name: self.name.clone(),
        })
    }

    /// Preprocess one example: custom fn, then tokenize, then lowercase.
    pub fn preprocess<S: AsRef<str>>(
        &self,
        sequence: &[S],
    ) -> FieldResult<Vec<String>> {
        self.preprocessor.apply(sequence)
    }

    /// Build the vocab from the dataset column named after this field.
    ///
    /// Does nothing if the vocab already exists.
    ///
    /// ## Arguments
    /// * `dataset` - the training data.
    /// * `min_freq` - the minimum count for a token to enter the vocab.
    /// * `embed` - pretrained vectors whose tokens are added to the vocab.
    pub fn build<D>(
        &mut self,
        dataset: &D,
        min_freq: usize,
        embed: Option<&Embedding>,
    ) -> FieldResult<()>
    where
        D: Dataset<Vec<String>> + ?Sized,
    {
        if self.is_built() {
            log::debug!("{}: vocab already built; skipping", self.name);
            return Ok(());
        }
        let mut counter = TokenCounter::new();
        for seq in dataset.require_column(&self.name)? {
            counter.update(self.preprocess(seq)?);
        }
        self.build_from_counter(&counter, min_freq);

        if let Some(embed) = embed {
            self.attach_embedding(embed, true)?;
        }
        Ok(())
    }

    /// Construct and attach the vocab from gathered frequencies.
    pub(crate) fn build_from_counter(
        &mut self,
        counter: &TokenCounter,
        min_freq: usize,
    ) {
        let unk_index = usize::try_from(self.indices.unk).unwrap_or(0);
        let vocab = Vocab::new(counter, min_freq, &self.specials, unk_index);
        log::info!(
            "{}: built vocab of {} tokens ({} distinct, min_freq={min_freq})",
            self.name,
            vocab.len(),
            counter.len(),
        );
        self.set_vocab(vocab);
    }

    /// Extend the vocab with `embed`'s tokens and build the aligned matrix.
    pub(crate) fn attach_embedding(
        &mut self,
        embed: &Embedding,
        normalize: bool,
    ) -> FieldResult<()> {
        let mut tokens = self.preprocess(embed.tokens())?;
        if tokens.len() != embed.len() {
            return Err(FieldError::EmbeddingMisaligned {
                expected: embed.len(),
                actual: tokens.len(),
            });
        }
        if let (Some(i), Some(unk)) = (embed.unk_index(), &self.tokens.unk) {
            tokens[i] = unk.clone();
        }

        let vocab = self.vocab.as_mut().ok_or_else(|| FieldError::VocabNotBuilt {
            name: self.name.clone(),
        })?;
        let before = vocab.len();
        vocab.extend(&tokens);
        log::debug!(
            "{}: embedding added {} tokens to the vocab",
            self.name,
            vocab.len() - before
        );

        let mut matrix = Array2::<f32>::zeros((vocab.len(), embed.dim()));
        for (token, vector) in tokens.iter().zip(embed.vectors().rows()) {
            matrix.row_mut(vocab.get(token)).assign(&vector);
        }
        if normalize {
            normalize_by_std(&mut matrix, &self.name);
        }
        self.embed = Some(matrix);
        Ok(())
    }

    /// Numericalize one preprocessed token.
    pub(crate) fn numericalize_token(
        &self,
        token: &str,
    ) -> FieldResult<IndexType> {
        if self.use_vocab {
            Ok(self.require_vocab()?.index(token))
        } else {
            token.trim().parse().map_err(|_| FieldError::NotNumeric {
                token: token.to_string(),
            })
        }
    }

    /// Numericalize a preprocessed sequence.
    pub(crate) fn numericalize<S: AsRef<str>>(
        &self,
        tokens: &[S],
    ) -> FieldResult<Vec<IndexType>> {
        tokens
            .iter()
            .map(|t| self.numericalize_token(t.as_ref()))
            .collect()
    }

    /// Turn examples into index vectors.
    ///
    /// Each example is preprocessed, numericalized, and wrapped in the
    /// bos/eos indices when those tokens are configured. Lengths may differ.
    pub fn transform<T, S>(
        &self,
        sequences: &[T],
    ) -> FieldResult<Vec<Vec<IndexType>>>
    where
        T: AsRef<[S]>,
        S: AsRef<str>,
    {
        sequences
            .iter()
            .map(|seq| {
                let tokens = self.preprocess(seq.as_ref())?;
                let mut ids = Vec::with_capacity(tokens.len() + 2);
                if self.tokens.bos.is_some() {
                    ids.push(self.indices.bos);
                }
                ids.extend(self.numericalize(&tokens)?);
                if self.tokens.eos.is_some() {
                    ids.push(self.indices.eos);
                }
                Ok(ids)
            })
            .collect()
    }

    /// Pad a batch of index vectors into a `(batch, max_len)` tensor on `device`.
    pub fn compose<S: AsRef<[IndexType]>>(
        &self,
        sequences: &[S],
        device: &Device,
    ) -> FieldResult<Tensor> {
        let batch = pad_sequences(sequences, self.indices.pad, None)?;
        to_device(&batch, device)
    }
}

/// Divide `matrix` by the sample standard deviation of all its entries.
fn normalize_by_std(
    matrix: &mut Array2<f32>,
    name: &str,
) {
    if matrix.len() < 2 {
        return;
    }
    let std = matrix.std(1.0);
    if std.is_finite() && std > 0.0 {
        *matrix /= std;
    } else {
        log::warn!("{name}: embedding matrix has zero variance; not normalized");
    }
}
