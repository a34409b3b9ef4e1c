//! Payload encoder

use crate::crc::{refresh_crc, CRC_PLACEHOLDER, CRC_TAG};
use crate::payload::{Field, FieldSet, PayloadError, MAX_VALUE_LEN};

/// Encodes a field set into a flat TLV payload string
pub struct Encoder {
    // Currently stateless, but reserved for future options
}

impl Encoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self {}
    }

    /// Encode fields in ascending tag order.
    ///
    /// Lengths are recomputed from each value.
    ///
    /// # Errors
    /// - `PayloadError::OversizedValue` - a value is 100 characters or longer
    pub fn encode(&self, fields: &FieldSet) -> Result<String, PayloadError> {
        let mut output = String::new();

        for field in fields.iter() {
            self.encode_field(&mut output, field)?;
        }

        Ok(output)
    }

    /// Encode fields with a fresh checksum as the final field `63`.
    ///
    /// Any existing tag `63` is replaced, and added when missing.
    ///
    /// # Errors
    /// - `PayloadError::FieldAfterChecksum` - a tag sorts after `63`
    /// - `PayloadError::OversizedValue` - a value is 100 characters or longer
    pub fn encode_with_crc(&self, fields: &FieldSet) -> Result<String, PayloadError> {
        if let Some(field) = fields.iter().find(|f| f.tag.as_str() > CRC_TAG) {
            return Err(PayloadError::FieldAfterChecksum { tag: field.tag.clone() });
        }

        let mut fields = fields.clone();
        fields.insert(Field::new(CRC_TAG, CRC_PLACEHOLDER));

        let encoded = self.encode(&fields)?;
        Ok(refresh_crc(&encoded))
    }

    /// Encode a single field
    fn encode_field(&self, output: &mut String, field: &Field) -> Result<(), PayloadError> {
        let length = field.length();
        if length > MAX_VALUE_LEN {
            return Err(PayloadError::OversizedValue {
                tag: field.tag.clone(),
                length,
            });
        }

        output.push_str(&field.tag);
        output.push_str(&format!("{:02}", length));
        output.push_str(&field.value);

        Ok(())
    }

    /// Encode fields directly to a writer
    pub fn encode_to_writer<W: std::io::Write>(&self, fields: &FieldSet, mut writer: W) -> anyhow::Result<()> {
        let encoded = self.encode(fields)?;
        writer.write_all(encoded.as_bytes())?;
        Ok(())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize a field set with a default encoder
pub fn serialize(fields: &FieldSet) -> Result<String, PayloadError> {
    Encoder::new().encode(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::verify_crc;
    use crate::decoder::parse;

    #[test]
    fn test_encode_minimal() {
        let set = FieldSet::from_fields(vec![Field::new("00", "01"), Field::new("01", "11")]);
        assert_eq!(Encoder::new().encode(&set).unwrap(), "000201010211");
    }

    #[test]
    fn test_encode_sorts_tags() {
        let set = FieldSet::from_fields(vec![
            Field::new("58", "ID"),
            Field::new("54", "2000"),
            Field::new("00", "01"),
        ]);
        assert_eq!(serialize(&set).unwrap(), "000201540420005802ID");
    }

    #[test]
    fn test_encode_recomputes_length() {
        let mut set = parse("59041234").unwrap();
        set.insert(Field::new("59", "KEMENHUB SBY KHUSUS"));
        assert_eq!(serialize(&set).unwrap(), "5919KEMENHUB SBY KHUSUS");
    }

    #[test]
    fn test_encode_empty_value() {
        let set = FieldSet::from_fields(vec![Field::new("62", "")]);
        assert_eq!(serialize(&set).unwrap(), "6200");
    }

    #[test]
    fn test_encode_max_length() {
        let value = "x".repeat(99);
        let set = FieldSet::from_fields(vec![Field::new("62", value.clone())]);
        assert_eq!(serialize(&set).unwrap(), format!("6299{}", value));
    }

    #[test]
    fn test_encode_oversized_value() {
        let set = FieldSet::from_fields(vec![Field::new("62", "x".repeat(100))]);
        let err = serialize(&set).unwrap_err();
        assert_eq!(err, PayloadError::OversizedValue { tag: "62".to_string(), length: 100 });
    }

    #[test]
    fn test_encode_parse_consistency() {
        let set = FieldSet::from_fields(vec![
            Field::new("59", "KEMENHUB SBY REGULER"),
            Field::new("00", "01"),
            Field::new("26", "0014ID.CO.QRIS.WWW"),
            Field::new("62", ""),
        ]);
        let encoded = serialize(&set).unwrap();
        assert_eq!(parse(&encoded).unwrap(), set);
    }

    #[test]
    fn test_encode_with_crc() {
        let set = parse("0002010102116304FFFF").unwrap();
        let encoded = Encoder::new().encode_with_crc(&set).unwrap();
        assert!(encoded.starts_with("0002010102116304"));
        assert_eq!(verify_crc(&encoded), Ok(true));
    }

    #[test]
    fn test_encode_with_crc_adds_checksum_field() {
        let set = parse("000201").unwrap();
        let encoded = Encoder::new().encode_with_crc(&set).unwrap();
        assert!(encoded.starts_with("0002016304"));
        assert_eq!(parse(&encoded).unwrap().value("00"), Some("01"));
        assert_eq!(verify_crc(&encoded), Ok(true));
    }

    #[test]
    fn test_encode_with_crc_rejects_later_tag() {
        let set = parse("00020163040000640500ABC").unwrap();
        let err = Encoder::new().encode_with_crc(&set).unwrap_err();
        assert_eq!(err, PayloadError::FieldAfterChecksum { tag: "64".to_string() });
    }

    #[test]
    fn test_encode_to_writer() {
        let set = parse("000201").unwrap();
        let mut buffer = Vec::new();
        Encoder::new().encode_to_writer(&set, &mut buffer).unwrap();
        assert_eq!(buffer, b"000201");
    }
}
