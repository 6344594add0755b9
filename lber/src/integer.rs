//! Minimal two's-complement integer encoding shared by INTEGER and
//! ENUMERATED, and by any implicitly-tagged field that reuses their
//! content layout (spec.md §4.2 "Integer/Enumerated").

use byteorder::{BigEndian, WriteBytesExt};

use crate::error::{Error, Result};

/// Encode `value` into the minimum number of big-endian two's-complement
/// octets such that the sign bit of the leading octet matches the sign
/// of `value`.
pub fn encode(value: i64) -> Vec<u8> {
    let mut count = 1usize;
    // Keep adding octets while the remaining high bits aren't all sign bits.
    while count < 8 {
        let shift = 8 * count as u32 - 1;
        let top_bits = value >> shift;
        if top_bits == 0 || top_bits == -1 {
            break;
        }
        count += 1;
    }
    let mut out = Vec::with_capacity(count);
    out.write_int::<BigEndian>(value, count)
        .expect("count is always 1..=8");
    out
}

/// Decode a minimal-form two's-complement integer. Accepts any non-empty
/// byte slice; does not itself enforce canonicality (that's an encoder
/// invariant, not a decoder one — a permissive decoder accepts whatever
/// a peer sent).
pub fn decode(bytes: &[u8]) -> Result<i64> {
    if bytes.is_empty() {
        return Err(Error::InvalidEncoding("empty INTEGER content"));
    }
    if bytes.len() > 8 {
        return Err(Error::InvalidEncoding("INTEGER too wide for i64"));
    }
    let mut acc: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
    for &b in bytes {
        acc = (acc << 8) | b as i64;
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_forms() {
        assert_eq!(encode(127), vec![0x7F]);
        assert_eq!(encode(128), vec![0x00, 0x80]);
        assert_eq!(encode(-1), vec![0xFF]);
        assert_eq!(encode(-128), vec![0x80]);
        assert_eq!(encode(-129), vec![0xFF, 0x7F]);
        assert_eq!(encode(0), vec![0x00]);
    }

    #[test]
    fn round_trips_full_range_samples() {
        for v in [
            i64::MIN,
            i64::MIN + 1,
            -70000,
            -256,
            -255,
            -1,
            0,
            1,
            255,
            256,
            70000,
            i64::MAX - 1,
            i64::MAX,
        ] {
            let enc = encode(v);
            assert_eq!(decode(&enc).unwrap(), v);
        }
    }
}
