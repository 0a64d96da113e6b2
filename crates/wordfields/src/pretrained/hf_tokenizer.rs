//! # Hugging Face Tokenizer Adapter

use std::path::Path;

use tokenizers::Tokenizer;

use crate::{
    errors::{FieldError, FieldResult},
    pretrained::{PretrainedSpecials, PretrainedTokenizer},
};

/// Conventional spellings probed for each special token role.
const PAD_CANDIDATES: &[&str] = &["[PAD]", "<pad>"];
const UNK_CANDIDATES: &[&str] = &["[UNK]", "<unk>"];
const BOS_CANDIDATES: &[&str] = &["<s>", "[BOS]"];
const EOS_CANDIDATES: &[&str] = &["</s>", "[EOS]"];
const CLS_CANDIDATES: &[&str] = &["[CLS]", "<s>"];
const SEP_CANDIDATES: &[&str] = &["[SEP]", "</s>"];
const MASK_CANDIDATES: &[&str] = &["[MASK]", "<mask>"];

/// The file name of a serialized tokenizer inside a model directory.
pub const TOKENIZER_FILE: &str = "tokenizer.json";

fn tokenizer_error<E: ToString>(err: E) -> FieldError {
    FieldError::Tokenizer(err.to_string())
}

/// A [`PretrainedTokenizer`] backed by [`tokenizers::Tokenizer`].
///
/// `tokenizer.json` does not record which tokens play the special roles, so
/// they are detected by probing the vocab for conventional spellings; use
/// [`HfTokenizer::with_specials`] to override.
#[derive(Clone)]
pub struct HfTokenizer {
    inner: Tokenizer,
    specials: PretrainedSpecials,
}

impl std::fmt::Debug for HfTokenizer {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("HfTokenizer")
            .field("vocab_size", &self.vocab_size())
            .field("specials", &self.specials)
            .finish()
    }
}

impl From<Tokenizer> for HfTokenizer {
    fn from(inner: Tokenizer) -> Self {
        Self::new(inner)
    }
}

impl HfTokenizer {
    /// Wrap a tokenizer, detecting its special tokens.
    pub fn new(inner: Tokenizer) -> Self {
        let probe = |candidates: &[&str]| -> Option<String> {
            candidates
                .iter()
                .find(|c| inner.token_to_id(c).is_some())
                .map(|c| c.to_string())
        };
        let specials = PretrainedSpecials {
            pad: probe(PAD_CANDIDATES),
            unk: probe(UNK_CANDIDATES),
            bos: probe(BOS_CANDIDATES),
            eos: probe(EOS_CANDIDATES),
            cls: probe(CLS_CANDIDATES),
            sep: probe(SEP_CANDIDATES),
            mask: probe(MASK_CANDIDATES),
        }
        .normalized();
        Self { inner, specials }
    }

    /// Replace the detected special tokens.
    pub fn with_specials(
        self,
        specials: PretrainedSpecials,
    ) -> Self {
        Self {
            specials: specials.normalized(),
            ..self
        }
    }

    /// Load a `tokenizer.json` file, or the one inside a model directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> FieldResult<Self> {
        let path = path.as_ref();
        let file = if path.is_dir() {
            path.join(TOKENIZER_FILE)
        } else {
            path.to_path_buf()
        };
        log::debug!("loading tokenizer from {}", file.display());
        Tokenizer::from_file(&file)
            .map(Self::new)
            .map_err(tokenizer_error)
    }

    /// Download a tokenizer from the Hugging Face hub.
    ///
    /// ## Arguments
    /// * `name` - the model name, e.g. ``bert-base-cased``.
    /// * `auth_token` - an access token for private models.
    #[cfg(feature = "download")]
    pub fn from_pretrained(
        name: &str,
        auth_token: Option<&str>,
    ) -> FieldResult<Self> {
        let params = tokenizers::FromPretrainedParameters {
            token: auth_token.map(String::from),
            ..Default::default()
        };
        log::info!("fetching tokenizer {name:?} from the hub");
        Tokenizer::from_pretrained(name, Some(params))
            .map(Self::new)
            .map_err(tokenizer_error)
    }

    /// Load from a local path if one exists, else by hub model name.
    pub fn load(
        name_or_path: &str,
        auth_token: Option<&str>,
    ) -> FieldResult<Self> {
        if Path::new(name_or_path).exists() {
            return Self::from_file(name_or_path);
        }
        Self::load_remote(name_or_path, auth_token)
    }

    #[cfg(feature = "download")]
    fn load_remote(
        name: &str,
        auth_token: Option<&str>,
    ) -> FieldResult<Self> {
        Self::from_pretrained(name, auth_token)
    }

    #[cfg(not(feature = "download"))]
    fn load_remote(
        name: &str,
        _auth_token: Option<&str>,
    ) -> FieldResult<Self> {
        Err(FieldError::Tokenizer(format!(
            "{name:?} is not a local path, and hub loading requires the \"download\" feature"
        )))
    }

    /// The wrapped tokenizer.
    pub fn inner(&self) -> &Tokenizer {
        &self.inner
    }
}

impl PretrainedTokenizer for HfTokenizer {
    fn tokenize(
        &self,
        text: &str,
    ) -> FieldResult<Vec<String>> {
        let encoding = self.inner.encode(text, false).map_err(tokenizer_error)?;
        Ok(encoding.get_tokens().to_vec())
    }

    fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }

    fn id_to_token(
        &self,
        id: usize,
    ) -> Option<String> {
        self.inner.id_to_token(u32::try_from(id).ok()?)
    }

    fn token_to_id(
        &self,
        token: &str,
    ) -> Option<usize> {
        self.inner.token_to_id(token).map(|id| id as usize)
    }

    fn specials(&self) -> &PretrainedSpecials {
        &self.specials
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{fs, str::FromStr};

    use tempdir::TempDir;

    use super::*;

    /// A small BERT-style `WordPiece` tokenizer.
    pub(crate) const WORDPIECE_JSON: &str = r###"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "BertPreTokenizer" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordPiece",
            "unk_token": "[UNK]",
            "continuing_subword_prefix": "##",
            "max_input_chars_per_word": 100,
            "vocab": {
                "[PAD]": 0,
                "[UNK]": 1,
                "[CLS]": 2,
                "[SEP]": 3,
                "[MASK]": 4,
                "token": 5,
                "-": 6,
                "level": 7,
                "##ization": 8,
                "field": 9
            }
        }
    }"###;

    pub(crate) fn wordpiece() -> HfTokenizer {
        Tokenizer::from_str(WORDPIECE_JSON).unwrap().into()
    }

    #[test]
    fn test_detected_specials() {
        let tokenizer = wordpiece();
        let specials = tokenizer.specials();

        assert_eq!(specials.pad.as_deref(), Some("[PAD]"));
        assert_eq!(specials.unk.as_deref(), Some("[UNK]"));
        assert_eq!(specials.cls.as_deref(), Some("[CLS]"));
        assert_eq!(specials.bos.as_deref(), Some("[CLS]"));
        assert_eq!(specials.eos.as_deref(), Some("[SEP]"));
        assert_eq!(tokenizer.mask_token_id(), Some(4));
        assert_eq!(tokenizer.unk_token_id(), Some(1));
    }

    #[test]
    fn test_tokenize() {
        let tokenizer = wordpiece();
        assert_eq!(
            tokenizer.tokenize("token-level").unwrap(),
            vec!["token", "-", "level"]
        );
        assert_eq!(
            tokenizer.tokenize("tokenization").unwrap(),
            vec!["token", "##ization"]
        );
        assert_eq!(tokenizer.tokenize("zzz").unwrap(), vec!["[UNK]"]);
    }

    #[test]
    fn test_vocab_pairs() {
        let tokenizer = wordpiece();
        let pairs = tokenizer.vocab_pairs();
        assert_eq!(tokenizer.vocab_size(), 10);
        assert_eq!(pairs.len(), 10);
        assert_eq!(pairs[8], ("##ization".to_string(), 8));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = TempDir::new("wordfields").unwrap();
        fs::write(dir.path().join(TOKENIZER_FILE), WORDPIECE_JSON).unwrap();

        let from_dir = HfTokenizer::load(dir.path().to_str().unwrap(), None).unwrap();
        assert_eq!(from_dir.vocab_size(), 10);

        let from_file = HfTokenizer::from_file(dir.path().join(TOKENIZER_FILE)).unwrap();
        assert_eq!(from_file.specials(), from_dir.specials());
    }

    #[cfg(not(feature = "download"))]
    #[test]
    fn test_load_missing_path() {
        let err = HfTokenizer::load("no/such/model", None).unwrap_err();
        assert!(matches!(err, FieldError::Tokenizer(_)));
    }

    #[test]
    fn test_with_specials() {
        let tokenizer = wordpiece().with_specials(PretrainedSpecials {
            unk: Some("[UNK]".to_string()),
            sep: Some("[SEP]".to_string()),
            ..Default::default()
        });
        assert_eq!(tokenizer.specials().pad, None);
        assert_eq!(tokenizer.specials().eos.as_deref(), Some("[SEP]"));
    }
}
