//! Payload decoder

use crate::crc::char_offset;
use crate::payload::{Field, FieldSet, MalformedReason, PayloadError, HEADER_LEN, LENGTH_LEN, TAG_LEN};

/// Decodes a flat TLV payload string into fields
pub struct Decoder {
    /// Verbosity level for duplicate-tag warnings
    verbose: u8,
}

impl Decoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self { verbose: 0 }
    }

    /// Set verbosity level (0-3)
    pub fn with_verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Decode a payload into a field set.
    ///
    /// Duplicate tags collapse to the last occurrence.
    pub fn decode(&self, input: &str) -> Result<FieldSet, PayloadError> {
        let fields = self.decode_fields(input)?;

        if self.verbose > 0 {
            let mut seen = std::collections::HashSet::new();
            for field in &fields {
                if !seen.insert(field.tag.as_str()) {
                    eprintln!("Warning: tag {} appears more than once, keeping the last value", field.tag);
                }
            }
        }

        Ok(FieldSet::from_fields(fields))
    }

    /// Decode a payload into fields in wire order, keeping duplicates.
    ///
    /// # Errors
    /// - `PayloadError::MalformedPayload` - truncated header, non-digit
    ///   length, or a value running past the end of the input
    pub fn decode_fields(&self, input: &str) -> Result<Vec<Field>, PayloadError> {
        let mut fields = Vec::new();
        let mut rest = input;
        let mut offset = 0;

        while !rest.is_empty() {
            let remaining = rest.chars().count();
            if remaining < HEADER_LEN {
                return Err(PayloadError::MalformedPayload {
                    offset,
                    reason: MalformedReason::TruncatedHeader { remaining },
                });
            }

            let (tag, after_tag) = rest.split_at(char_offset(rest, TAG_LEN));
            let (length_field, after_header) = after_tag.split_at(char_offset(after_tag, LENGTH_LEN));
            let length = Self::parse_length(length_field).ok_or_else(|| PayloadError::MalformedPayload {
                offset: offset + TAG_LEN,
                reason: MalformedReason::InvalidLength {
                    field: length_field.to_string(),
                },
            })?;

            let available = remaining - HEADER_LEN;
            if length > available {
                return Err(PayloadError::MalformedPayload {
                    offset: offset + HEADER_LEN,
                    reason: MalformedReason::ValueOverrun {
                        declared: length,
                        remaining: available,
                    },
                });
            }

            let (value, next) = after_header.split_at(char_offset(after_header, length));
            fields.push(Field::new(tag, value));

            offset += HEADER_LEN + length;
            rest = next;
        }

        Ok(fields)
    }

    /// Parse a 2-digit decimal length field
    fn parse_length(field: &str) -> Option<usize> {
        if field.len() != 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        field.parse().ok()
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a payload with a default decoder
pub fn parse(payload: &str) -> Result<FieldSet, PayloadError> {
    Decoder::new().decode(payload)
}
