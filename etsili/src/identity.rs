//! 3GPP identity and EPS field renderers
//!
//! Packed-BCD subscriber identifiers, session-management causes, EPS
//! attach/RAT/cause/PDN-type fields, APN domain names, AMBR pairs, hex
//! fallback, and the summaries for sequences of primitives.

use std::fmt::Write;

use etsili_core::error::{EtsiliError, EtsiliResult};
use etsili_core::tag;
use etsili_asn1::primitives::decode_integer_value;

/// Packed-BCD digits, two per octet, low nibble first. Nibbles of value 10
/// and above are padding and do not render. Used for IMEI, IMSI and MSISDN
/// fields.
pub fn render_bcd_digits(bytes: &[u8], cap: usize) -> EtsiliResult<String> {
    let mut out = String::new();
    for &b in bytes {
        for nibble in [b & 0x0f, (b & 0xf0) >> 4] {
            if nibble < 10 {
                out.push((b'0' + nibble) as char);
            }
            if out.len() >= cap {
                return Ok(out);
            }
        }
    }
    if out.is_empty() {
        return Err(EtsiliError::InvalidData(
            "BCD field contains no digits".to_string(),
        ));
    }
    Ok(out)
}

/// 3G session-management cause codes.
pub fn render_sm_cause(bytes: &[u8]) -> EtsiliResult<String> {
    let Some(&code) = bytes.first() else {
        return Err(EtsiliError::InvalidData("empty SM cause field".to_string()));
    };
    Ok(match code {
        36 => "Regular Deactivation".to_string(),
        _ => "Unknown".to_string(),
    })
}

pub fn render_eps_pdn_type(bytes: &[u8]) -> EtsiliResult<String> {
    let Some(&v) = bytes.first() else {
        return Err(EtsiliError::InvalidData("empty PDN type field".to_string()));
    };
    Ok(match v {
        1 => "IPv4".to_string(),
        2 => "IPv6".to_string(),
        3 => "IPv4v6".to_string(),
        4 => "Non-IP".to_string(),
        5 => "Ethernet".to_string(),
        other => other.to_string(),
    })
}

pub fn render_eps_cause(bytes: &[u8]) -> EtsiliResult<String> {
    let Some(&v) = bytes.first() else {
        return Err(EtsiliError::InvalidData("empty EPS cause field".to_string()));
    };
    Ok(match v {
        13 => "Network Failure".to_string(),
        16 => "Request Accepted".to_string(),
        64 => "Context Not Found".to_string(),
        65 => "Invalid Message Format".to_string(),
        66 => "Version not supported by next peer".to_string(),
        67 => "Invalid Length".to_string(),
        68 => "Service not supported".to_string(),
        69 => "Mandatory IE incorrect".to_string(),
        70 => "Mandatory IE missing".to_string(),
        72 => "System Failure".to_string(),
        94 => "Request rejected (reason not specified)".to_string(),
        110 => "Temporarily rejected due to handover procedure in progress".to_string(),
        other => other.to_string(),
    })
}

pub fn render_eps_rat_type(bytes: &[u8]) -> EtsiliResult<String> {
    let Some(&v) = bytes.first() else {
        return Err(EtsiliError::InvalidData("empty RAT type field".to_string()));
    };
    Ok(match v {
        1 => "UTRAN".to_string(),
        2 => "GERAN".to_string(),
        3 => "WLAN".to_string(),
        4 => "GAN".to_string(),
        5 => "HSPA Evolution".to_string(),
        6 => "EUTRAN".to_string(),
        7 => "Virtual".to_string(),
        8 => "EUTRAN-NB-IoT".to_string(),
        9 => "LTE-M".to_string(),
        10 => "NR".to_string(),
        other => format!("Unknown RAT Type: {}", other),
    })
}

pub fn render_eps_attach_type(bytes: &[u8]) -> EtsiliResult<String> {
    if bytes.len() != 1 {
        return Err(EtsiliError::InvalidData(
            "EPS attach type must be one octet".to_string(),
        ));
    }
    Ok(match bytes[0] & 0x07 {
        1 => "EPS Attach",
        2 => "Combined EPS/IMSI Attach",
        3 => "EPS RLOS Attach",
        6 => "EPS Emergency Attach",
        7 => "(reserved)",
        _ => "EPS Attach (defaulted)",
    }
    .to_string())
}

/// APN-AMBR: two big-endian 32-bit rates, uplink then downlink.
pub fn render_eps_ambr(bytes: &[u8]) -> EtsiliResult<String> {
    if bytes.len() < 8 {
        return Ok("INVALID".to_string());
    }
    let uplink = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let downlink = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    Ok(format!("Uplink={}  Downlink={}", uplink, downlink))
}

/// DNS label form: each label is prefixed with its length; the prefixes
/// become dots in place. A leading zero-length label yields an initial dot.
pub fn render_domain_name(bytes: &[u8], cap: usize) -> EtsiliResult<String> {
    if bytes.is_empty() {
        return Err(EtsiliError::InvalidData("empty domain name".to_string()));
    }

    let avail = (bytes.len() - 1).min(cap.saturating_sub(1));
    let mut buf: Vec<u8> = bytes[1..1 + avail].to_vec();

    let mut idx = bytes[0] as usize;
    while idx < buf.len() {
        let next = buf[idx];
        buf[idx] = b'.';
        idx += 1 + next as usize;
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// `0x` followed by two hex digits per input octet, truncated at the cap.
pub fn render_hex_bytes(bytes: &[u8], cap: usize) -> EtsiliResult<String> {
    if cap <= 4 {
        return Err(EtsiliError::Capacity(
            "hex rendering needs at least five bytes of output".to_string(),
        ));
    }
    let mut out = String::with_capacity((bytes.len() * 2 + 2).min(cap));
    out.push_str("0x");
    for b in bytes {
        write!(out, "{:02x}", b).expect("writing to a String cannot fail");
        if out.len() >= cap - 2 {
            break;
        }
    }
    Ok(out)
}

fn decode_length_field(bytes: &[u8]) -> Option<(usize, usize)> {
    let first = *bytes.first()?;
    if first & 0x80 == 0 {
        return Some(((first & 0x7f) as usize, 1));
    }
    let lenocts = (first & 0x7f) as usize;
    if lenocts == 0 || lenocts > 8 || bytes.len() < 1 + lenocts {
        return None;
    }
    let mut len = 0usize;
    for i in 0..lenocts {
        len = (len << 8) | bytes[1 + i] as usize;
    }
    Some((len, 1 + lenocts))
}

/// Summarise a sequence of primitives as `name: v1, v2, ...` without
/// descending the walk into it. Supports integer and UTF-8 string element
/// types; anything else renders as just the name.
pub fn render_sequenced_primitives(
    name: &str,
    content: &[u8],
    interpret: u8,
    cap: usize,
) -> EtsiliResult<String> {
    let mut out = String::new();
    out.push_str(name);
    out.push_str(": ");

    if content.first() != Some(&0x30) {
        return Ok(out);
    }
    let Some((_, lenlen)) = decode_length_field(&content[1..]) else {
        return Ok(out);
    };
    let mut pos = 1 + lenlen;

    let mut first = true;
    let mut elided = false;

    while pos < content.len() {
        let elem_tag = content[pos];
        pos += 1;
        let Some((elen, lenlen)) = decode_length_field(&content[pos..]) else {
            break;
        };
        pos += lenlen;
        if pos + elen > content.len() {
            break;
        }
        let elem = &content[pos..pos + elen];
        pos += elen;

        let rendered = match interpret {
            tag::INTEGER_SEQUENCE if elem_tag == tag::INTEGER => {
                decode_integer_value(elem).map(|v| v.to_string()).ok()
            }
            tag::UTF8STR if elem_tag == tag::UTF8STR => {
                Some(String::from_utf8_lossy(elem).into_owned())
            }
            _ => None,
        };
        let Some(text) = rendered else {
            break;
        };

        // Leave room for a separator now and an ellipsis later.
        let room = cap.saturating_sub(out.len());
        if room > text.len() + 2 + 5 {
            if !first {
                out.push_str(", ");
            }
            first = false;
            out.push_str(&text);
        } else if !elided && !first && room > 5 {
            out.push_str(", ...");
            elided = true;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bcd_digits() {
        // 0x21 0x43 0x65 -> 123456
        let s = render_bcd_digits(&[0x21, 0x43, 0x65], 64).unwrap();
        assert_eq!(s, "123456");
    }

    #[test]
    fn test_bcd_padding_skipped() {
        // Trailing 0xf filler nibble vanishes.
        let s = render_bcd_digits(&[0x21, 0xf3], 64).unwrap();
        assert_eq!(s, "123");
    }

    #[test]
    fn test_domain_name() {
        let s = render_domain_name(b"\x03www\x07example\x03com", 64).unwrap();
        assert_eq!(s, "www.example.com");
    }

    #[test]
    fn test_domain_name_leading_empty_label() {
        let s = render_domain_name(b"\x00\x03com", 64).unwrap();
        assert_eq!(s, ".com");
    }

    #[test]
    fn test_hex_bytes() {
        let s = render_hex_bytes(&[0xde, 0xad, 0xbe, 0xef], 64).unwrap();
        assert_eq!(s, "0xdeadbeef");
    }

    #[test]
    fn test_eps_ambr() {
        let s = render_eps_ambr(&[0, 0, 0, 100, 0, 0, 1, 0]).unwrap();
        assert_eq!(s, "Uplink=100  Downlink=256");
    }

    #[test]
    fn test_integer_sequence_summary() {
        // SEQUENCE { 1, 2, 300 }
        let content = [
            0x30, 0x0a, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02, 0x02, 0x02, 0x01, 0x2c,
        ];
        let s =
            render_sequenced_primitives("includedSequenceNumbers", &content, tag::INTEGER_SEQUENCE, 256)
                .unwrap();
        assert_eq!(s, "includedSequenceNumbers: 1, 2, 300");
    }

    #[test]
    fn test_utf8_sequence_summary() {
        let content = [0x30, 0x08, 0x0c, 0x02, b'a', b'b', 0x0c, 0x02, b'c', b'd'];
        let s = render_sequenced_primitives("recipients", &content, tag::UTF8STR, 256).unwrap();
        assert_eq!(s, "recipients: ab, cd");
    }

    #[test]
    fn test_sm_cause() {
        assert_eq!(render_sm_cause(&[36]).unwrap(), "Regular Deactivation");
        assert_eq!(render_sm_cause(&[1]).unwrap(), "Unknown");
    }
}
