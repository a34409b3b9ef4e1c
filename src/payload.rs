//! Payload data structures

use std::collections::BTreeMap;

// TLV layout constants
pub const TAG_LEN: usize = 2;
pub const LENGTH_LEN: usize = 2;
pub const HEADER_LEN: usize = TAG_LEN + LENGTH_LEN;
/// Largest value length the 2-digit length field can express
pub const MAX_VALUE_LEN: usize = 99;

/// A single tag-length-value entry of a payload
///
/// The length is never stored: it is always the character count of `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Two-character tag, e.g. `"54"` for the transaction amount
    pub tag: String,
    /// Opaque value; nested templates are not interpreted
    pub value: String,
}

impl Field {
    /// Create a new field
    pub fn new(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
        }
    }

    /// Character length of the value, as written in the length field
    pub fn length(&self) -> usize {
        self.value.chars().count()
    }
}

/// The fields of one payload, keyed by tag
///
/// Iteration is always in ascending tag order, which is also the order the
/// encoder writes them in. Inserting an existing tag overwrites it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    fields: BTreeMap<String, Field>,
}

impl FieldSet {
    /// Create an empty field set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a field set from fields in wire order; later duplicates win
    pub fn from_fields(fields: impl IntoIterator<Item = Field>) -> Self {
        let mut set = Self::new();
        for field in fields {
            set.insert(field);
        }
        set
    }

    /// Insert or overwrite a field, returning the previous one for that tag
    pub fn insert(&mut self, field: Field) -> Option<Field> {
        self.fields.insert(field.tag.clone(), field)
    }

    /// Remove a field by tag
    pub fn remove(&mut self, tag: &str) -> Option<Field> {
        self.fields.remove(tag)
    }

    pub fn get(&self, tag: &str) -> Option<&Field> {
        self.fields.get(tag)
    }

    /// Value of a field by tag
    pub fn value(&self, tag: &str) -> Option<&str> {
        self.fields.get(tag).map(|f| f.value.as_str())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.fields.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in ascending tag order
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }
}

impl FromIterator<Field> for FieldSet {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self::from_fields(iter)
    }
}

/// External per-payload data (e.g. one table row) used to resolve `$name`
/// directive values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    values: BTreeMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, returning the builder for chaining
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

/// Structural problem with a payload
///
/// These abort processing of the payload they occur in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// Truncated tag/length header, non-numeric length, or value overrun
    MalformedPayload { offset: usize, reason: MalformedReason },

    /// Value too long for the 2-digit length field
    OversizedValue { tag: String, length: usize },

    /// Payload too short to carry a checksum trailer
    TruncatedPayload { length: usize },

    /// A field would be serialized after the checksum field `63`
    FieldAfterChecksum { tag: String },
}

/// Why a payload failed to parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// Fewer than 4 characters left for tag and length
    TruncatedHeader { remaining: usize },
    /// Length field is not two ASCII digits
    InvalidLength { field: String },
    /// Declared length runs past the end of the payload
    ValueOverrun { declared: usize, remaining: usize },
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedReason::TruncatedHeader { remaining } => {
                write!(f, "only {} characters left for tag and length", remaining)
            }
            MalformedReason::InvalidLength { field } => {
                write!(f, "length field '{}' is not two digits", field)
            }
            MalformedReason::ValueOverrun { declared, remaining } => {
                write!(f, "declared length {} exceeds the {} characters left", declared, remaining)
            }
        }
    }
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadError::MalformedPayload { offset, reason } => {
                write!(f, "Malformed payload at character {}: {}", offset, reason)
            }
            PayloadError::OversizedValue { tag, length } => {
                write!(f, "Value of tag {} is {} characters long (max {})", tag, length, MAX_VALUE_LEN)
            }
            PayloadError::TruncatedPayload { length } => {
                write!(f, "Payload is {} characters long, too short for a checksum trailer", length)
            }
            PayloadError::FieldAfterChecksum { tag } => {
                write!(f, "Tag {} would follow the checksum field 63", tag)
            }
        }
    }
}

impl std::error::Error for PayloadError {}

/// Recoverable issue reported while modifying a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A `$name` value had no matching record field; the directive was skipped
    MissingRecordField {
        /// Index of the directive in the list that was applied, if any
        directive: Option<usize>,
        tag: String,
        name: String,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MissingRecordField { directive: Some(index), tag, name } => {
                write!(f, "Directive {} (tag {}): record has no field '{}'", index + 1, tag, name)
            }
            Diagnostic::MissingRecordField { directive: None, tag, name } => {
                write!(f, "Tag {}: record has no field '{}'", tag, name)
            }
        }
    }
}
