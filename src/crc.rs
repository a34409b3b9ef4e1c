//! CRC-16 trailer support
//!
//! QRIS payloads end with tag `63`, length `04` and a 4-digit uppercase hex
//! CRC-16/IBM-3740 (a.k.a. CCITT-FALSE) over every character before the
//! checksum itself, including the `6304` header.

use crate::payload::PayloadError;

/// Generator polynomial (x^16 + x^12 + x^5 + 1)
pub const CRC_POLYNOMIAL: u16 = 0x1021;
/// Register value before the first byte
pub const CRC_INITIAL: u16 = 0xFFFF;
/// Number of characters in the checksum trailer
pub const CRC_TRAILER_LEN: usize = 4;
/// Tag of the checksum field; it must be the last field of a payload
pub const CRC_TAG: &str = "63";
/// Value written in place of the checksum before it is computed
pub const CRC_PLACEHOLDER: &str = "0000";

/// Compute the raw CRC-16 register over `data`.
pub fn checksum(data: &[u8]) -> u16 {
    let mut crc = CRC_INITIAL;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ CRC_POLYNOMIAL;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Compute the CRC-16 of `data` formatted as 4 uppercase hex digits.
///
/// ```rust
/// assert_eq!(qris_tlv::crc16(b"123456789"), "29B1");
/// assert_eq!(qris_tlv::crc16(b""), "FFFF");
/// ```
pub fn crc16(data: &[u8]) -> String {
    format!("{:04X}", checksum(data))
}

/// Split a payload into its body and the trailing 4-character checksum.
///
/// # Errors
/// - `PayloadError::TruncatedPayload` - fewer than 4 characters
pub fn split_trailer(payload: &str) -> Result<(&str, &str), PayloadError> {
    let length = payload.chars().count();
    if length < CRC_TRAILER_LEN {
        return Err(PayloadError::TruncatedPayload { length });
    }
    let split = char_offset(payload, length - CRC_TRAILER_LEN);
    Ok(payload.split_at(split))
}

/// Replace the last 4 characters of `payload` with a fresh checksum computed
/// over everything before them.
///
/// Payloads shorter than 4 characters have nothing to replace, so the
/// checksum of the whole string is appended instead.
pub fn refresh_crc(payload: &str) -> String {
    let body = match split_trailer(payload) {
        Ok((body, _)) => body,
        Err(_) => payload,
    };
    append_crc(body)
}

/// Append the checksum of `body` to it.
pub fn append_crc(body: &str) -> String {
    let mut output = String::with_capacity(body.len() + CRC_TRAILER_LEN);
    output.push_str(body);
    output.push_str(&crc16(body.as_bytes()));
    output
}

/// Check whether the trailer of `payload` matches its body.
///
/// The comparison is case-insensitive so that lowercase trailers produced by
/// other tools are still accepted.
pub fn verify_crc(payload: &str) -> Result<bool, PayloadError> {
    let (body, trailer) = split_trailer(payload)?;
    Ok(trailer.eq_ignore_ascii_case(&crc16(body.as_bytes())))
}

/// Byte offset of the `n`th character, clamped to the end of the string
pub(crate) fn char_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}
