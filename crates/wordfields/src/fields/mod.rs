//! # Fields
//!
//! A field turns raw per-example values into numeric tensors:
//!
//! ```text
//!   raw example
//!       │  preprocess   (custom fn → tokenize → lowercase)
//!       ▼
//!   tokens / pieces / spans
//!       │  transform    (vocab lookup, bos/eos, charts)
//!       ▼
//!   Vec<i64> / Array2<i64> per example
//!       │  compose      (right-pad, move to device)
//!       ▼
//!   Tensor
//! ```
//!
//! * [`RawField`] only preprocesses.
//! * [`Field`] numericalizes token sequences.
//! * [`SubwordField`] numericalizes each token into fixed-width pieces.
//! * [`BertField`] is a [`SubwordField`] over a pretrained tokenizer vocab.
//! * [`ChartField`] turns span-labeled trees into label charts.
pub mod bert_field;
pub mod chart_field;
pub mod field;
pub mod preprocess;
pub mod raw_field;
pub mod specials;
pub mod subword_field;

#[doc(inline)]
pub use bert_field::{BertField, BertFieldOptions};
#[doc(inline)]
pub use chart_field::{ChartField, SpanFn, SpanLabel};
#[doc(inline)]
pub use field::{Field, FieldOptions};
#[doc(inline)]
pub use preprocess::{Preprocessor, SequenceFn, TokenizeFn};
#[doc(inline)]
pub use raw_field::RawField;
#[doc(inline)]
pub use specials::{SpecialIndices, SpecialTokens};
#[doc(inline)]
pub use subword_field::{SubwordField, SubwordFieldOptions};
