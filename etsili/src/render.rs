//! Base value rendering
//!
//! Turns a decoded item's content octets into text for the universal types
//! and the simple synthetic interpretations. The 3GPP-specific renderers
//! live in `location` and `identity`; the schema walk in `session` decides
//! which renderer a field gets.

use std::fmt::Write;
use std::net::{Ipv4Addr, Ipv6Addr};

use etsili_asn1::primitives::decode_integer_value;
use etsili_asn1::Item;
use etsili_core::error::{EtsiliError, EtsiliResult};
use etsili_core::{tag, IdentClass};

fn oid_tail(bytes: &[u8], out: &mut String) -> EtsiliResult<()> {
    let mut group_len = 0usize;
    let mut value: u32 = 0;
    for &b in bytes {
        value = (value << 7) | (b & 0x7f) as u32;
        group_len += 1;
        if b & 0x80 != 0 {
            continue;
        }
        if group_len > 4 {
            return Err(EtsiliError::InvalidData(
                "OID sub-identifier is longer than 4 octets".to_string(),
            ));
        }
        write!(out, ".{}", value).expect("writing to a String cannot fail");
        group_len = 0;
        value = 0;
    }
    Ok(())
}

/// Absolute OID text: the fused first octet splits into the first two
/// components, the rest are base-128 groups.
pub fn render_oid(bytes: &[u8]) -> EtsiliResult<String> {
    let Some(&first) = bytes.first() else {
        return Err(EtsiliError::InvalidData("empty OID content".to_string()));
    };
    let mut out = format!("{}.{}", first / 40, first % 40);
    oid_tail(&bytes[1..], &mut out)?;
    Ok(out)
}

/// Relative OID text: base-128 groups only, each emitted as `.N`.
pub fn render_relative_oid(bytes: &[u8]) -> EtsiliResult<String> {
    let mut out = String::new();
    oid_tail(bytes, &mut out)?;
    Ok(out)
}

/// A 4- or 16-octet address rendered the way the platform renders IP text.
pub fn render_binary_ip(bytes: &[u8]) -> EtsiliResult<String> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().expect("length checked");
            Ok(Ipv4Addr::from(octets).to_string())
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().expect("length checked");
            Ok(Ipv6Addr::from(octets).to_string())
        }
        other => Err(EtsiliError::InvalidData(format!(
            "unexpected IP address length: {}",
            other
        ))),
    }
}

fn capped_string(bytes: &[u8], cap: usize) -> String {
    let take = bytes.len().min(cap.saturating_sub(1));
    String::from_utf8_lossy(&bytes[..take]).into_owned()
}

/// Render an item the way its wire type (or the schema's interpret-as
/// instruction, for context-tagged items) dictates.
pub fn render_base(item: &Item, source: &[u8], interpret: u8, cap: usize) -> EtsiliResult<String> {
    let datatype = match item.class {
        IdentClass::UniversalPrimitive | IdentClass::UniversalConstruct => {
            if item.identifier > 31 {
                return Err(EtsiliError::Schema(format!(
                    "unexpected identifier for a universal tag: {}",
                    item.identifier
                )));
            }
            item.identifier as u8
        }
        _ => {
            if interpret > 31 {
                return Err(EtsiliError::Schema(format!(
                    "interpret-as tags must be between 0 and 31 (not {})",
                    interpret
                )));
            }
            interpret
        }
    };

    let content = item.content(source);

    match datatype {
        tag::SEQUENCE | tag::SET | tag::NULL => Ok(String::new()),

        tag::OCTETSTRING | tag::PRINTABLE | tag::UTF8STR | tag::IA5 | tag::NUMERIC => {
            Ok(capped_string(content, cap))
        }

        tag::INTEGER | tag::ENUM => {
            let val = decode_integer_value(content)?;
            Ok(val.to_string())
        }

        tag::OID => render_oid(content),

        // Preserved in their source text form.
        tag::GENERALTIME | tag::UTCTIME => Ok(capped_string(content, cap)),

        tag::RELATIVEOID => render_relative_oid(content),

        other => Err(EtsiliError::Schema(format!(
            "no text rendering for type {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etsili_asn1::Decoder;

    #[test]
    fn test_oid_rendering() {
        // 06 06 2B 06 01 04 01 0E -> 1.3.6.1.4.1.14
        let buf = [0x06, 0x06, 0x2b, 0x06, 0x01, 0x04, 0x01, 0x0e];
        let mut dec = Decoder::new(&buf);
        dec.decode_next().unwrap();
        let item = dec.current_item().unwrap();
        let s = render_base(&item, dec.source(), tag::NULL, 64).unwrap();
        assert_eq!(s, "1.3.6.1.4.1.14");
    }

    #[test]
    fn test_multibyte_oid_component() {
        // 1.2.840: 840 = 0x86 0x48 in base-128
        assert_eq!(render_oid(&[0x2a, 0x86, 0x48]).unwrap(), "1.2.840");
    }

    #[test]
    fn test_relative_oid() {
        assert_eq!(
            render_relative_oid(&[0x05, 0x03, 0x0a, 0x02]).unwrap(),
            ".5.3.10.2"
        );
    }

    #[test]
    fn test_binary_ip() {
        assert_eq!(render_binary_ip(&[192, 0, 2, 1]).unwrap(), "192.0.2.1");
        let v6 = [0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];
        assert_eq!(render_binary_ip(&v6).unwrap(), "2001:db8::1");
        assert!(render_binary_ip(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_integer_rendering() {
        let buf = [0x02, 0x01, 0xd4];
        let mut dec = Decoder::new(&buf);
        dec.decode_next().unwrap();
        let item = dec.current_item().unwrap();
        assert_eq!(render_base(&item, dec.source(), tag::NULL, 64).unwrap(), "-44");
    }

    #[test]
    fn test_interpret_out_of_range() {
        let buf = [0x80, 0x01, 0x00];
        let mut dec = Decoder::new(&buf);
        dec.decode_next().unwrap();
        let item = dec.current_item().unwrap();
        assert!(render_base(&item, dec.source(), 0x38, 64).is_err());
    }
}
