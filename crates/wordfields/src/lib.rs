//! # `wordfields` Parser Input Fields
//!
//! This crate turns raw text examples into padded index tensors for neural
//! dependency and constituency parsers.
//!
//! See:
//! * [`vocab`] to count tokens and build a [`vocab::Vocab`].
//! * [`fields`] to preprocess, numericalize, and pad examples.
//! * [`pretrained`] to drive a [`fields::BertField`] from a pretrained tokenizer.
//! * [`batching`] for the padding and device helpers the fields share.
//!
//! ## Crate Features
//!
//! #### feature: ``default``
//!
//! * ``ahash``
//! * ``pretrained``
//!
//! #### feature: ``ahash``
//!
//! This swaps all HashMap/HashSet implementations for ``ahash``.
//!
//! This is done by the ``types::WFHash{*}`` type alias machinery.
//!
//! #### feature: ``pretrained``
//!
//! This enables [`pretrained::HfTokenizer`], which wraps a ``tokenizers``
//! ``tokenizer.json`` from a local file or model directory.
//!
//! #### feature: ``download``
//!
//! * ``pretrained``
//!
//! This enables loading tokenizers by model name from the Hugging Face hub.
//!
//! ## Building Fields
//!
//! ```rust,ignore
//! use candle_core::Device;
//! use wordfields::{ColumnDataset, FieldOptions};
//!
//! let dataset = ColumnDataset::new()
//!     .with_column("words", vec![vec!["The".to_string(), "cat".to_string()]]);
//!
//! let mut field = FieldOptions::default()
//!     .with_pad("<pad>")
//!     .with_unk("<unk>")
//!     .with_bos("<bos>")
//!     .with_lower(true)
//!     .init("words");
//! field.build(&dataset, 1, None)?;
//!
//! let ids = field.transform(&[vec!["the", "dog"]])?;
//! let batch = field.compose(&ids, &Device::Cpu)?;
//! ```
#![warn(missing_docs, unused)]

pub mod batching;
pub mod dataset;
pub mod embedding;
pub mod errors;
pub mod fields;
pub mod pretrained;
pub mod types;
pub mod vocab;

#[doc(inline)]
pub use dataset::{ColumnDataset, Dataset};
#[doc(inline)]
pub use embedding::Embedding;
#[doc(inline)]
pub use errors::{FieldError, FieldResult};
#[doc(inline)]
pub use fields::{
    BertField,
    BertFieldOptions,
    ChartField,
    Field,
    FieldOptions,
    RawField,
    SpanLabel,
    SubwordField,
    SubwordFieldOptions,
};
#[doc(inline)]
pub use vocab::{TokenCounter, Vocab};
