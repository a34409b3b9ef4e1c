//! Fixed-offset tariff patcher for the older payload revision
//!
//! This path does not parse the payload. It splices a tag 54 (transaction
//! amount) header and the tariff at character 148, where that revision's
//! layout always had the gap between tags 53 and 58, then re-checksums the
//! result. It does not look for an existing tag 54 and always writes the
//! length as `04`, whatever the tariff's width.
//!
//! Use [`crate::engine`] for anything that is not that exact layout.

use crate::crc::{append_crc, char_offset, CRC_TRAILER_LEN};

/// Character offset the tariff is spliced at
pub const TARIFF_OFFSET: usize = 148;
/// Transaction amount tag
pub const TARIFF_TAG: &str = "54";
/// Header written in front of the tariff
pub const TARIFF_HEADER: &str = "5404";
/// Character range holding the point-of-initiation value of tag 01
pub const PREFIX_RANGE: std::ops::Range<usize> = 10..12;
/// Point-of-initiation value for a dynamic (single use, amount set) QR
pub const DYNAMIC_PREFIX: &str = "12";

/// Splice `5404` + `tariff` into `payload` and refresh the checksum.
///
/// With `rewrite_prefix`, characters 10..12 are first replaced by `12`,
/// turning the static `010211` point-of-initiation into `010212`.
///
/// Offsets past the end of the payload clamp to its end. The last 4
/// characters are dropped as the stale checksum only when the input payload
/// is longer than 4 characters.
pub fn legacy_patch(payload: &str, tariff: &str, rewrite_prefix: bool) -> String {
    // Measured before the prefix rewrite can grow a short input
    let length = payload.chars().count();

    let rewritten;
    let payload = if rewrite_prefix {
        rewritten = splice(payload, PREFIX_RANGE, DYNAMIC_PREFIX);
        rewritten.as_str()
    } else {
        payload
    };

    let mut inserted = String::with_capacity(TARIFF_HEADER.len() + tariff.len());
    inserted.push_str(TARIFF_HEADER);
    inserted.push_str(tariff);
    let patched = splice(payload, TARIFF_OFFSET..TARIFF_OFFSET, &inserted);

    let body = if length > CRC_TRAILER_LEN {
        let total = patched.chars().count();
        &patched[..char_offset(&patched, total - CRC_TRAILER_LEN)]
    } else {
        patched.as_str()
    };

    append_crc(body)
}

/// Replace the character range `range` of `s` with `replacement`, clamping
/// both ends to the length of `s`
fn splice(s: &str, range: std::ops::Range<usize>, replacement: &str) -> String {
    let start = char_offset(s, range.start);
    let end = char_offset(s, range.end).max(start);

    let mut output = String::with_capacity(s.len() + replacement.len());
    output.push_str(&s[..start]);
    output.push_str(replacement);
    output.push_str(&s[end..]);
    output
}
