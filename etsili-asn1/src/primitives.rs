//! BER primitive encode/decode
//!
//! One tag-length-value triple at a time: identifier octets (short and
//! base-128 high-tag form), length octets (short, long, indefinite), signed
//! integers, OID content with the fused first octet, and generalized/UTC
//! time strings.
//!
//! Two behaviours here are deliberately non-canonical because the peer
//! implementations of this record format expect them bit-for-bit:
//!
//! * a long-form length gains an extra leading zero octet whenever the
//!   minimal encoding would have the top bit of its first octet set;
//! * header integer slots can be emitted in a fixed maximum-width form
//!   (see [`encode_integer_fixed`]) so they can be overwritten in place
//!   without shifting the surrounding bytes.

use etsili_core::error::{EtsiliError, EtsiliResult};
use etsili_core::time::{format_generalized, Timeval};
use etsili_core::{tag, IdentClass};

/// Widest integer content the codec will emit or accept.
pub const MAX_LENGTH_OCTETS: usize = 8;

/// Longest identifier continuation we will decode.
pub const MAX_IDENT_OCTETS: usize = 4;

/// A value staged for encoding, interpreted according to the encode-as tag.
#[derive(Debug, Clone, Copy)]
pub enum EncodeValue<'a> {
    None,
    Bytes(&'a [u8]),
    /// Signed integer plus the declared byte width used verbatim for
    /// negative values.
    Integer {
        value: i64,
        width: u8,
    },
    Time(Timeval),
}

impl<'a> EncodeValue<'a> {
    pub fn int(value: i64) -> Self {
        EncodeValue::Integer { value, width: 8 }
    }

    /// Content length as seen by the preamble-size calculation.
    pub fn raw_len(&self) -> usize {
        match self {
            EncodeValue::None => 0,
            EncodeValue::Bytes(b) => b.len(),
            EncodeValue::Integer { width, .. } => *width as usize,
            EncodeValue::Time(_) => 0,
        }
    }
}

pub(crate) fn log256_size(x: u64) -> u32 {
    let mut n = 1;
    let mut v = x;
    while v >= 256 {
        v >>= 8;
        n += 1;
    }
    n
}

fn log128_size(x: u64) -> u32 {
    let mut n = 1;
    let mut v = x;
    while v >= 128 {
        v >>= 7;
        n += 1;
    }
    n
}

/// Smallest value that forces one more content octet than `lenocts` would
/// minimally hold, because the top bit of the leading octet must stay clear.
fn extra_octet_thresh(lenocts: u32) -> u64 {
    1u64 << (lenocts * 8 - 1)
}

/// Number of octets a long-form length field spends on the value itself,
/// including the extra leading zero the format requires when the top bit of
/// the minimal encoding would be set.
pub fn encoded_length_octets(len: u64) -> u32 {
    let mut lenocts = log256_size(len);
    if len > extra_octet_thresh(lenocts) {
        lenocts += 1;
    }
    lenocts
}

/// Bytes consumed by the identifier octets for `ident`.
pub fn identifier_octets(ident: u32) -> usize {
    if ident <= 30 {
        1
    } else {
        1 + log128_size(ident as u64) as usize
    }
}

/// Bytes consumed by the length field announcing `len` content octets.
pub fn length_field_octets(len: usize) -> usize {
    if len < 128 {
        1
    } else {
        1 + encoded_length_octets(len as u64) as usize
    }
}

/// Preamble (identifier + length field) size for a definite item.
pub fn preamble_octets(ident: u32, len: usize) -> usize {
    identifier_octets(ident) + length_field_octets(len)
}

/// Append the identifier octets for (class, ident).
pub fn push_identifier(class: IdentClass, ident: u32, out: &mut Vec<u8>) -> EtsiliResult<usize> {
    let Some(bits) = class.to_bits() else {
        return Err(EtsiliError::InvalidData(
            "cannot encode an item with unknown class".to_string(),
        ));
    };

    if ident <= 30 {
        out.push((bits << 5) | ident as u8);
        return Ok(1);
    }

    out.push((bits << 5) | 0x1f);
    // Base-128 digits, most significant first, continuation bit on all but
    // the last.
    let mut digits = [0u8; 5];
    let mut n = 0;
    let mut rem = ident;
    while rem > 0 {
        digits[n] = (rem & 0x7f) as u8;
        rem >>= 7;
        n += 1;
    }
    for i in (0..n).rev() {
        if i > 0 {
            out.push(0x80 | digits[i]);
        } else {
            out.push(digits[i]);
        }
    }
    Ok(n + 1)
}

/// Append a definite length field.
pub fn push_length(len: usize, out: &mut Vec<u8>) -> usize {
    if len < 128 {
        out.push(len as u8);
        return 1;
    }

    let lenocts = encoded_length_octets(len as u64);
    out.push(0x80 | lenocts as u8);
    for i in (0..lenocts).rev() {
        out.push(((len >> (8 * i)) & 0xff) as u8);
    }
    lenocts as usize + 1
}

/// Append the indefinite-form length octet.
pub fn push_length_indefinite(out: &mut Vec<u8>) -> usize {
    out.push(0x80);
    1
}

/// Number of content octets a signed integer occupies: minimal for
/// non-negative values (plus a zero pad when the top bit would otherwise be
/// set), the declared width for negative ones.
pub fn integer_content_octets(value: i64, declared: usize) -> usize {
    if value < 0 {
        return declared;
    }
    let mut lenocts = log256_size(value as u64);
    if lenocts > 7 {
        return declared;
    }
    if (lenocts as usize) < declared && value as u64 >= extra_octet_thresh(lenocts) {
        lenocts += 1;
    }
    lenocts as usize
}

/// Append `lenocts` big-endian two's-complement octets of `value`.
pub fn push_integer_content(value: i64, lenocts: usize, out: &mut Vec<u8>) {
    for i in (0..lenocts).rev() {
        out.push(((value >> (8 * i)) & 0xff) as u8);
    }
}

/// Append OID content: the first two sub-identifier bytes fuse into
/// `40 * A + B`, the remaining bytes pass through untouched.
pub fn push_oid_content(bytes: &[u8], out: &mut Vec<u8>) -> EtsiliResult<usize> {
    if bytes.len() < 2 {
        return Err(EtsiliError::InvalidData("OID is too short".to_string()));
    }
    out.push(40 * bytes[0] + bytes[1]);
    out.extend_from_slice(&bytes[2..]);
    Ok(bytes.len() - 1)
}

/// Decode a signed integer from up to eight big-endian content octets,
/// sign-extending when the most significant bit of the first octet is set.
pub fn decode_integer_value(bytes: &[u8]) -> EtsiliResult<i64> {
    if bytes.is_empty() {
        return Err(EtsiliError::InvalidData("empty integer content".to_string()));
    }
    if bytes.len() > MAX_LENGTH_OCTETS {
        return Err(EtsiliError::IntegerTooLong(bytes.len()));
    }

    let mut val: u64 = 0;
    for &b in bytes {
        val = (val << 8) | b as u64;
    }
    if bytes[0] & 0x80 != 0 && bytes.len() < 8 {
        val |= !0u64 << (bytes.len() * 8);
    }
    Ok(val as i64)
}

/// Write one integer item into `out` in the fixed maximum-width form used
/// for overwritable header slots: single identifier octet, a long-form
/// length field padded out to its widest shape, then the content octets.
/// The total is always `MAX_LENGTH_OCTETS + 3` bytes regardless of value,
/// so a later rewrite never shifts the surrounding layout.
pub fn encode_integer_fixed(
    class: IdentClass,
    ident: u32,
    value: i64,
    width: usize,
    out: &mut [u8],
) -> EtsiliResult<usize> {
    let total = MAX_LENGTH_OCTETS + 3;
    if out.len() < total {
        return Err(EtsiliError::Capacity(format!(
            "fixed integer slot needs {} bytes, {} available",
            total,
            out.len()
        )));
    }
    let Some(bits) = class.to_bits() else {
        return Err(EtsiliError::InvalidData(
            "cannot encode an item with unknown class".to_string(),
        ));
    };
    if ident > 30 {
        return Err(EtsiliError::InvalidData(
            "fixed-width slots use single-octet identifiers".to_string(),
        ));
    }

    let lenocts = integer_content_octets(value, width);
    let lenlen = MAX_LENGTH_OCTETS - lenocts + 1;

    out[0] = (bits << 5) | ident as u8;
    out[1] = 0x80 | lenlen as u8;
    for b in out[2..1 + lenlen].iter_mut() {
        *b = 0;
    }
    out[1 + lenlen] = lenocts as u8;
    for i in 0..lenocts {
        out[2 + lenlen + i] = ((value >> (8 * (lenocts - 1 - i))) & 0xff) as u8;
    }

    Ok(total)
}

/// Exact encoded size of one streaming item, mirroring what
/// [`encode_item`] will emit.
pub fn calculate_length(ident: u32, encode_as: u8, vallen: usize) -> usize {
    let idlen = identifier_octets(ident);
    match encode_as {
        tag::INTEGER | tag::ENUM => idlen + MAX_LENGTH_OCTETS + 2,
        tag::OID => idlen + vallen,
        _ => idlen + length_field_octets(vallen) + vallen,
    }
}

/// Append one complete item (identifier, length, value) translated
/// according to `encode_as`. A constructed class opens an indefinite-form
/// region instead of a definite length. Returns the number of bytes
/// appended.
pub fn encode_item(
    out: &mut Vec<u8>,
    encode_as: u8,
    class: IdentClass,
    ident: u32,
    value: &EncodeValue,
) -> EtsiliResult<usize> {
    let start = out.len();

    match encode_as {
        tag::OCTETSTRING
        | tag::UTF8STR
        | tag::NUMERIC
        | tag::PRINTABLE
        | tag::IA5
        | tag::RELATIVEOID
        | tag::IPPACKET => {
            let bytes = match value {
                EncodeValue::Bytes(b) => *b,
                EncodeValue::None => &[],
                _ => {
                    return Err(EtsiliError::InvalidData(
                        "string-like item needs a byte value".to_string(),
                    ))
                }
            };
            push_identifier(class, ident, out)?;
            if class.is_constructed() && encode_as != tag::IPPACKET {
                push_length_indefinite(out);
            } else {
                push_length(bytes.len(), out);
            }
            out.extend_from_slice(bytes);
        }

        tag::INTEGER | tag::ENUM => {
            let EncodeValue::Integer { value: v, width } = value else {
                return Err(EtsiliError::InvalidData(
                    "integer item needs an integer value".to_string(),
                ));
            };
            let mut slot = [0u8; MAX_LENGTH_OCTETS + 3];
            let n = encode_integer_fixed(class, ident, *v, *width as usize, &mut slot)?;
            out.extend_from_slice(&slot[..n]);
        }

        tag::OID => {
            let EncodeValue::Bytes(bytes) = value else {
                return Err(EtsiliError::InvalidData(
                    "OID item needs a byte value".to_string(),
                ));
            };
            if bytes.len() < 2 {
                return Err(EtsiliError::InvalidData("OID is too short".to_string()));
            }
            push_identifier(class, ident, out)?;
            if class.is_constructed() {
                push_length_indefinite(out);
            } else {
                push_length(bytes.len() - 1, out);
            }
            push_oid_content(bytes, out)?;
        }

        tag::NULL | tag::SEQUENCE | tag::SET => {
            push_identifier(class, ident, out)?;
            if class.is_constructed() {
                push_length_indefinite(out);
            } else {
                push_length(value.raw_len(), out);
            }
        }

        tag::GENERALTIME | tag::UTCTIME => {
            let EncodeValue::Time(tv) = value else {
                return Err(EtsiliError::InvalidData(
                    "time item needs a timeval value".to_string(),
                ));
            };
            push_identifier(class, ident, out)?;
            let ts = format_generalized(*tv)?;
            push_length(ts.len(), out);
            out.extend_from_slice(ts.as_bytes());
        }

        other => return Err(EtsiliError::UnsupportedEncodeType(other)),
    }

    Ok(out.len() - start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_identifier() {
        let mut out = Vec::new();
        push_identifier(IdentClass::UniversalPrimitive, 2, &mut out).unwrap();
        assert_eq!(out, [0x02]);
    }

    #[test]
    fn test_high_tag_identifier() {
        let mut out = Vec::new();
        push_identifier(IdentClass::ContextPrimitive, 201, &mut out).unwrap();
        // 201 = 0b1_1001001 -> 0x81 0x49 continuation
        assert_eq!(out, [0x9f, 0x81, 0x49]);
    }

    #[test]
    fn test_length_short_form() {
        let mut out = Vec::new();
        assert_eq!(push_length(5, &mut out), 1);
        assert_eq!(out, [0x05]);
    }

    #[test]
    fn test_length_long_form_extra_octet() {
        // 200 has the top bit set in its single-octet form, so the encoder
        // prefers the unambiguously-positive two-octet rendering.
        let mut out = Vec::new();
        assert_eq!(push_length(200, &mut out), 3);
        assert_eq!(out, [0x82, 0x00, 0xc8]);

        // 128 sits exactly on the threshold and stays single-octet.
        out.clear();
        assert_eq!(push_length(128, &mut out), 2);
        assert_eq!(out, [0x81, 0x80]);
    }

    #[test]
    fn test_integer_minimality() {
        assert_eq!(integer_content_octets(0, 8), 1);
        assert_eq!(integer_content_octets(127, 8), 1);
        assert_eq!(integer_content_octets(128, 8), 2); // top bit pad
        assert_eq!(integer_content_octets(65535, 8), 3);
        assert_eq!(integer_content_octets(-44, 1), 1);
        assert_eq!(integer_content_octets(-44, 8), 8);
    }

    #[test]
    fn test_decode_integer_sign_extension() {
        assert_eq!(decode_integer_value(&[0xd4]).unwrap(), -44);
        assert_eq!(decode_integer_value(&[0x00, 0xd4]).unwrap(), 212);
        assert_eq!(decode_integer_value(&[0x05]).unwrap(), 5);
        assert!(decode_integer_value(&[0; 9]).is_err());
    }

    #[test]
    fn test_fixed_integer_layout() {
        let mut slot = [0u8; 11];
        let n =
            encode_integer_fixed(IdentClass::ContextPrimitive, 4, 42, 8, &mut slot).unwrap();
        assert_eq!(n, 11);
        // [84][88][00 x7][01][2a]: identifier, long-form header, zero pad,
        // final length octet, one content octet.
        assert_eq!(slot[0], 0x84);
        assert_eq!(slot[1], 0x88);
        assert_eq!(&slot[2..9], &[0; 7]);
        assert_eq!(slot[9], 0x01);
        assert_eq!(slot[10], 0x2a);

        // A wider value reshapes the pad but never the total.
        let n = encode_integer_fixed(IdentClass::ContextPrimitive, 4, 0x11223344, 8, &mut slot)
            .unwrap();
        assert_eq!(n, 11);
        assert_eq!(slot[1], 0x85);
        assert_eq!(slot[6], 0x04);
        assert_eq!(&slot[7..11], &[0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn test_oid_fusion() {
        let mut out = Vec::new();
        push_oid_content(&[1, 3, 6, 1, 4, 1, 14], &mut out).unwrap();
        assert_eq!(out, [0x2b, 0x06, 0x01, 0x04, 0x01, 0x0e]);
    }

    #[test]
    fn test_encode_item_short_integer() {
        let mut out = Vec::new();
        // The fixed-width form pads the length field out to its maximum.
        encode_item(
            &mut out,
            tag::INTEGER,
            IdentClass::UniversalPrimitive,
            2,
            &EncodeValue::int(0),
        )
        .unwrap();
        assert_eq!(out.len(), 11);
        assert_eq!(out[0], 0x02);
        assert_eq!(out[10], 0x00);
    }

    #[test]
    fn test_encode_item_octetstring() {
        let mut out = Vec::new();
        let n = encode_item(
            &mut out,
            tag::OCTETSTRING,
            IdentClass::UniversalPrimitive,
            4,
            &EncodeValue::Bytes(b"hi"),
        )
        .unwrap();
        assert_eq!(n, 4);
        assert_eq!(out, [0x04, 0x02, b'h', b'i']);
    }

    #[test]
    fn test_encode_item_constructed_opens_indefinite() {
        let mut out = Vec::new();
        encode_item(
            &mut out,
            tag::SEQUENCE,
            IdentClass::UniversalConstruct,
            tag::SEQUENCE as u32,
            &EncodeValue::None,
        )
        .unwrap();
        assert_eq!(out, [0x30, 0x80]);
    }

    #[test]
    fn test_calculate_length_matches_encode() {
        let mut out = Vec::new();
        let n = encode_item(
            &mut out,
            tag::OCTETSTRING,
            IdentClass::ContextPrimitive,
            1,
            &EncodeValue::Bytes(&[0xab; 300]),
        )
        .unwrap();
        assert_eq!(n, calculate_length(1, tag::OCTETSTRING, 300));
    }
}
