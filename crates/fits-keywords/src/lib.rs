#![cfg_attr(not(feature = "std"), no_std)]
//! Convert between a typed attribute [`Record`] and FITS header keyword cards.
//!
//! [`add_keywords`] writes every field of a record as one or more 80-column
//! cards, inventing `NAME1..NAMEn` and `NAr_c` names for vectors and matrices
//! under the 8-character keyword limit. [`get_keywords`] reads cards back,
//! regrouping element cards into arrays. Per-field problems never abort a
//! conversion; they are logged and folded into the returned `bool`.

extern crate alloc;

pub mod block;
pub mod card;
pub mod decode;
pub mod edit;
pub mod encode;
pub mod error;
pub mod keywords;
pub mod mangle;
pub mod record;
pub mod shape;
pub mod typemap;
pub mod value;

#[cfg(feature = "array")]
pub mod array;

pub use card::Card;
pub use decode::get_keywords;
pub use edit::{add_comment, add_history, remove_keywords};
pub use encode::{add_keywords, make_keyword_list, FieldIssue};
pub use error::{Error, Result};
pub use keywords::KeywordList;
pub use record::{ArrayData, ArrayValue, DataType, ElementKind, Field, FieldValue, Record, Scalar};
pub use shape::{format_shape, parse_shape};
pub use value::Value;

#[cfg(feature = "array")]
pub use array::ArrayElement;
