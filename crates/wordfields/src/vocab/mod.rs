//! # Vocabulary
//!
//! This module provides the token/index tables used by the fields.
//!
//! ## Counting
//!
//! Frequencies are gathered by a [`TokenCounter`], which remembers the order
//! in which tokens were first seen so that equal counts sort stably.
//!
//! ## Vocab
//!
//! The primary user-oriented table is [`Vocab`], which contains:
//! * `itos` - the ``index -> token`` list; specials first,
//! * `stoi` - the ``token -> index`` map,
//! * `unk_index` - the fallback for unknown tokens.
pub mod token_counter;
pub mod token_vocab;

#[doc(inline)]
pub use token_counter::TokenCounter;
#[doc(inline)]
pub use token_vocab::Vocab;
