//! # qris-tlv
//!
//! QRIS (Indonesian EMVCo merchant-presented QR) payload toolkit.
//!
//! A QRIS payload is a flat string of tag-length-value fields:
//!
//! ```text
//! 00 02 01        payload format indicator
//! 01 02 11        point of initiation (11 static, 12 dynamic)
//! 54 04 2000      transaction amount
//! 63 04 7B91      CRC-16 of everything before the 4 checksum digits
//! ```
//!
//! Tags and lengths are 2 characters each; the length is the character count
//! of the value, so values are limited to 99 characters. Nested templates
//! (e.g. merchant account information) are kept as opaque values.
//!
//! ## Modes
//!
//! Payloads can be modified two ways, chosen per run with [`Mode`]:
//!
//! - **TLV**: parse into a [`FieldSet`], apply [`Directive`]s (insert a
//!   literal, insert a value from a per-payload [`Record`], delete), then
//!   serialize in ascending tag order and refresh the checksum.
//! - **Legacy**: splice `5404` + tariff at character 148 without parsing, as
//!   needed by the older payload revision. See [`legacy`].
//!
//! ## Directive Files
//!
//! ```text
//! # action|tag|length|value
//! +|01|02|12
//! +|54||$tarif
//! -|61||
//! ```
//!
//! Every operation here is a pure function over in-memory strings, so
//! payloads can be processed in parallel without coordination.

pub mod crc;
pub mod payload;
pub mod decoder;
pub mod encoder;
pub mod directive;
pub mod engine;
pub mod legacy;
pub mod tariff;
pub mod table;

pub use crc::{crc16, refresh_crc, verify_crc, split_trailer};
pub use payload::{
    Field, FieldSet, Record,
    PayloadError, MalformedReason, Diagnostic,
};
pub use decoder::{Decoder, parse};
pub use encoder::{Encoder, serialize};
pub use directive::{Directive, ValueSource, DirectiveParseError};
pub use engine::{
    apply, Mode, Processor, ProcessConfig,
    Outcome, RowReport, RowStatus,
};
pub use legacy::legacy_patch;
pub use tariff::TariffTable;
pub use table::Table;
