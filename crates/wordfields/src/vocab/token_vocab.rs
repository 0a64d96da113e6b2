//! # Token Vocabulary

use serde::{Deserialize, Serialize};

use crate::{
    errors::{FieldError, FieldResult},
    types::{IndexType, WFHashMap, hash_map_with_capacity, to_index},
    vocab::TokenCounter,
};

/// Bijective ``token <-> index`` table with reserved specials and an UNK fallback.
///
/// Specials occupy the lowest indices, in the order given at construction.
/// Lookups never fail: unknown tokens resolve to [`Vocab::unk_index`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VocabRecord", into = "VocabRecord")]
pub struct Vocab {
    itos: Vec<String>,
    stoi: WFHashMap<String, usize>,
    unk_index: usize,
    n_init: usize,
}

/// Serialized form of a [`Vocab`]; `stoi` is rebuilt and validated on load.
#[derive(Serialize, Deserialize)]
struct VocabRecord {
    itos: Vec<String>,
    unk_index: usize,
    n_init: usize,
}

impl TryFrom<VocabRecord> for Vocab {
    type Error = FieldError;

    fn try_from(record: VocabRecord) -> FieldResult<Self> {
        if !record.itos.is_empty() && record.unk_index >= record.itos.len() {
            return Err(FieldError::VocabConflict(format!(
                "unk_index {} is out of range for a vocab of {} tokens",
                record.unk_index,
                record.itos.len()
            )));
        }
        let mut vocab = Self::with_unk_index(record.unk_index);
        for token in record.itos {
            if vocab.stoi.contains_key(&token) {
                return Err(FieldError::VocabConflict(format!(
                    "serialized vocab lists {token:?} more than once"
                )));
            }
            vocab.stoi.insert(token.clone(), vocab.itos.len());
            vocab.itos.push(token);
        }
        vocab.n_init = record.n_init.min(vocab.len());
        Ok(vocab)
    }
}

impl From<Vocab> for VocabRecord {
    fn from(vocab: Vocab) -> Self {
        Self {
            itos: vocab.itos,
            unk_index: vocab.unk_index,
            n_init: vocab.n_init,
        }
    }
}

impl Vocab {
    fn with_unk_index(unk_index: usize) -> Self {
        Self {
            itos: Vec::new(),
            stoi: hash_map_with_capacity(1024),
            unk_index,
            n_init: 0,
        }
    }

    /// Build a vocab from token frequencies.
    ///
    /// ## Arguments
    /// * `counter` - token frequencies.
    /// * `min_freq` - tokens seen fewer times are dropped.
    /// * `specials` - reserved tokens; kept regardless of frequency.
    /// * `unk_index` - the index returned for unknown tokens.
    ///
    /// ## Returns
    /// A vocab with `specials` at ``0..specials.len()``, followed by the
    /// remaining tokens in descending frequency order.
    pub fn new<S: AsRef<str>>(
        counter: &TokenCounter,
        min_freq: usize,
        specials: &[S],
        unk_index: usize,
    ) -> Self {
        let mut vocab = Self::with_unk_index(unk_index);
        vocab.extend(specials.iter().map(|s| s.as_ref()));
        vocab.extend(
            counter
                .most_common()
                .into_iter()
                .filter(|&(_, freq)| freq >= min_freq)
                .map(|(token, _)| token),
        );
        vocab.n_init = vocab.len();
        vocab
    }

    /// Build a vocab from an external ``token -> id`` table.
    ///
    /// The ids must be exactly ``0..n``; every token must have a unique id.
    pub fn from_pretrained<I, S>(
        pairs: I,
        unk_index: usize,
    ) -> FieldResult<Self>
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let mut pairs: Vec<(String, usize)> =
            pairs.into_iter().map(|(s, id)| (s.into(), id)).collect();
        pairs.sort_by_key(|&(_, id)| id);

        let mut vocab = Self::with_unk_index(unk_index);
        for (expected, (token, id)) in pairs.into_iter().enumerate() {
            if id != expected {
                return Err(FieldError::VocabConflict(format!(
                    "pretrained vocab ids are not contiguous: expected {expected}, found {id} ({token:?})"
                )));
            }
            if vocab.stoi.contains_key(&token) {
                return Err(FieldError::VocabConflict(format!(
                    "pretrained vocab maps {token:?} to more than one id"
                )));
            }
            vocab.stoi.insert(token.clone(), id);
            vocab.itos.push(token);
        }
        vocab.n_init = vocab.len();
        Ok(vocab)
    }

    /// Append tokens not already present.
    ///
    /// Existing indices are never changed; new tokens are numbered in the
    /// order they first appear in `tokens`.
    pub fn extend<I>(
        &mut self,
        tokens: I,
    ) where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for token in tokens {
            let token = token.as_ref();
            if !self.stoi.contains_key(token) {
                self.stoi.insert(token.to_string(), self.itos.len());
                self.itos.push(token.to_string());
            }
        }
    }

    /// Look up the index of `token`, falling back to [`Vocab::unk_index`].
    pub fn get(
        &self,
        token: &str,
    ) -> usize {
        self.stoi.get(token).copied().unwrap_or(self.unk_index)
    }

    /// Look up `token` as an [`IndexType`].
    pub fn index(
        &self,
        token: &str,
    ) -> IndexType {
        to_index(self.get(token))
    }

    /// Look up every token of a sequence.
    pub fn lookup_all<S: AsRef<str>>(
        &self,
        tokens: &[S],
    ) -> Vec<IndexType> {
        tokens.iter().map(|t| self.index(t.as_ref())).collect()
    }

    /// Reverse lookup.
    pub fn token(
        &self,
        index: usize,
    ) -> Option<&str> {
        self.itos.get(index).map(String::as_str)
    }

    /// Check if `token` has its own entry.
    pub fn contains(
        &self,
        token: &str,
    ) -> bool {
        self.stoi.contains_key(token)
    }

    /// The ``index -> token`` list.
    pub fn tokens(&self) -> &[String] {
        &self.itos
    }

    /// The index returned for unknown tokens.
    pub fn unk_index(&self) -> usize {
        self.unk_index
    }

    /// The size of the vocab before any [`Vocab::extend`] calls.
    pub fn n_init(&self) -> usize {
        self.n_init
    }

    /// Get the number of tokens in the vocab.
    pub fn len(&self) -> usize {
        self.itos.len()
    }

    /// Check if the vocab is empty.
    pub fn is_empty(&self) -> bool {
        self.itos.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const SPECIALS: &[&str] = &["<pad>", "<unk>"];

    #[test]
    fn test_min_freq_example() {
        let counter: TokenCounter = ["a", "a", "a", "b"].into_iter().collect();
        let vocab = Vocab::new(&counter, 2, SPECIALS, 1);

        assert_eq!(vocab.tokens(), &["<pad>", "<unk>", "a"]);
        assert_eq!(vocab.get("<pad>"), 0);
        assert_eq!(vocab.get("<unk>"), 1);
        assert_eq!(vocab.get("a"), 2);
        assert_eq!(vocab.get("b"), 1);
        assert_eq!(vocab.n_init(), 3);
    }

    #[test]
    fn test_frequency_order() {
        let counter: TokenCounter = ["c", "b", "a", "a", "b", "a"].into_iter().collect();
        let vocab = Vocab::new(&counter, 1, SPECIALS, 1);

        assert_eq!(vocab.tokens(), &["<pad>", "<unk>", "a", "b", "c"]);
    }

    #[test]
    fn test_specials_not_duplicated() {
        let counter: TokenCounter = ["<unk>", "<unk>", "x"].into_iter().collect();
        let vocab = Vocab::new(&counter, 1, SPECIALS, 1);

        assert_eq!(vocab.tokens(), &["<pad>", "<unk>", "x"]);
        assert_eq!(vocab.get("<unk>"), 1);
    }

    #[test]
    fn test_extend_preserves_indices() {
        let counter: TokenCounter = ["a", "b"].into_iter().collect();
        let mut vocab = Vocab::new(&counter, 1, SPECIALS, 1);
        let before = vocab.clone();

        vocab.extend(["b", "z", "y", "z"]);

        assert_eq!(vocab.len(), 6);
        for (i, token) in before.tokens().iter().enumerate() {
            assert_eq!(vocab.get(token), i);
        }
        assert_eq!(vocab.get("z"), 4);
        assert_eq!(vocab.get("y"), 5);
        assert_eq!(vocab.n_init(), 4);
    }

    #[test]
    fn test_reverse_lookup() {
        let counter: TokenCounter = ["a"].into_iter().collect();
        let vocab = Vocab::new(&counter, 1, SPECIALS, 1);

        assert_eq!(vocab.token(2), Some("a"));
        assert_eq!(vocab.token(3), None);
        assert!(vocab.contains("a"));
        assert!(!vocab.contains("b"));
    }

    #[test]
    fn test_from_pretrained() {
        let vocab = Vocab::from_pretrained([("[UNK]", 1), ("[PAD]", 0), ("hello", 2)], 1).unwrap();
        assert_eq!(vocab.tokens(), &["[PAD]", "[UNK]", "hello"]);
        assert_eq!(vocab.get("nope"), 1);

        let gap = Vocab::from_pretrained([("a", 0), ("b", 2)], 0);
        assert!(matches!(gap, Err(FieldError::VocabConflict(_))));
    }

    #[test]
    fn test_serde_restores_lookup() {
        let counter: TokenCounter = ["a", "b", "b"].into_iter().collect();
        let mut vocab = Vocab::new(&counter, 1, SPECIALS, 1);
        vocab.extend(["pretrained"]);

        let json = serde_json::to_string(&vocab).unwrap();
        let restored: Vocab = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, vocab);
        assert_eq!(restored.get("b"), 2);
        assert_eq!(restored.n_init(), 4);
    }

    #[test]
    fn test_serde_rejects_duplicate_tokens() {
        let json = r#"{"itos":["<pad>","<unk>","a","<unk>","b"],"unk_index":1,"n_init":5}"#;
        let err = serde_json::from_str::<Vocab>(json).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_serde_rejects_unk_out_of_range() {
        let json = r#"{"itos":["<pad>","a"],"unk_index":2,"n_init":2}"#;
        let err = serde_json::from_str::<Vocab>(json).unwrap_err();
        assert!(err.to_string().contains("out of range"));

        let empty: Vocab = serde_json::from_str(r#"{"itos":[],"unk_index":0,"n_init":0}"#).unwrap();
        assert!(empty.is_empty());
    }

    fn token_lists() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-e]{1,2}", 0..40)
    }

    proptest! {
        #[test]
        fn min_freq_and_specials(tokens in token_lists(), min_freq in 1usize..4) {
            let counter: TokenCounter = tokens.iter().collect();
            let vocab = Vocab::new(&counter, min_freq, SPECIALS, 1);

            for (i, special) in SPECIALS.iter().enumerate() {
                prop_assert_eq!(vocab.get(special), i);
            }
            for token in &vocab.tokens()[SPECIALS.len()..] {
                prop_assert!(counter.get(token) >= min_freq);
            }
        }

        #[test]
        fn lookup_is_total(tokens in token_lists(), probe in "\\PC{0,6}") {
            let counter: TokenCounter = tokens.iter().collect();
            let vocab = Vocab::new(&counter, 1, SPECIALS, 1);

            prop_assert!(vocab.get(&probe) < vocab.len());
            prop_assert!(vocab.get("") < vocab.len());
        }

        #[test]
        fn extend_is_idempotent(tokens in token_lists(), extra in token_lists()) {
            let counter: TokenCounter = tokens.iter().collect();
            let mut vocab = Vocab::new(&counter, 1, SPECIALS, 1);

            vocab.extend(&extra);
            let once = vocab.clone();
            vocab.extend(&extra);

            prop_assert_eq!(vocab, once);
        }
    }
}
