//! GNT record decoding.
//!
//! A GNT member is a back-to-back run of records with no framing between
//! them: a documentary `u32` length, a GB2312 label pair, `u16` width and
//! height, then `width * height` grayscale bytes. The record boundary is
//! derived from the header; the declared length is only cross-checked on
//! request (`LengthCheck::Warn`).
//!
//! Field offsets live in `layout`, byte access and short-read handling in
//! `reader`, label conversion in `label`, and the record logic in `parser`.
//! `encode` writes samples back in the same layout.

pub mod encode;
pub mod error;
pub mod label;
pub mod layout;
pub mod parser;
pub mod reader;

pub use encode::{encode_record, record_bytes};
pub use error::{DecodeError, EncodeError};
pub use parser::{DecoderOptions, LengthCheck, RecordDecoder, Sample, decode_next};
