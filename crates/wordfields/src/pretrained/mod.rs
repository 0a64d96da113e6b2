//! # Pretrained Tokenizers
//!
//! [`crate::fields::BertField`] takes its vocab and tokenization from a
//! [`PretrainedTokenizer`].
//!
//! With the `pretrained` feature, [`HfTokenizer`] adapts a Hugging Face
//! `tokenizer.json`; the `download` feature adds hub model-name loading.
#[cfg(feature = "pretrained")]
pub mod hf_tokenizer;
pub mod tokenizer;

#[cfg(feature = "pretrained")]
#[doc(inline)]
pub use hf_tokenizer::HfTokenizer;
#[doc(inline)]
pub use tokenizer::{PretrainedSpecials, PretrainedTokenizer};
