//! 3GPP location renderers
//!
//! PLMN (MCC-MNC) and the location record variants built on top of it:
//! CGI/SAI/RAI, TAI, ECGI, LAI, macro-eNodeB identifiers, and the ULI
//! flags bitmap that strings several of them together.

use std::fmt::Write;

use etsili_core::error::{EtsiliError, EtsiliResult};

/// Append the PLMN digits as `MCC-MNC-`. The three octets are nibble
/// swapped per 3GPP TS 24.008; any nibble of value 10 or above is a filler
/// and is dropped.
pub(crate) fn append_mcc_mnc(bytes: &[u8], out: &mut String) -> bool {
    if bytes.len() < 3 {
        return false;
    }

    fn digit(nibble: u8, out: &mut String) {
        if nibble < 10 {
            out.push((b'0' + nibble) as char);
        }
    }

    digit(bytes[0] & 0x0f, out);
    digit((bytes[0] & 0xf0) >> 4, out);
    digit(bytes[1] & 0x0f, out);
    out.push('-');
    digit((bytes[1] & 0xf0) >> 4, out);
    digit(bytes[2] & 0x0f, out);
    digit((bytes[2] & 0xf0) >> 4, out);
    out.push('-');
    true
}

fn be16_at(bytes: &[u8], off: usize) -> Option<u16> {
    Some(u16::from_be_bytes([*bytes.get(off)?, *bytes.get(off + 1)?]))
}

/// TAI: PLMN followed by the tracking area code in hex.
pub(crate) fn append_tai(bytes: &[u8], out: &mut String) -> bool {
    if !append_mcc_mnc(bytes, out) {
        return false;
    }
    let Some(tac) = be16_at(bytes, 3) else {
        return false;
    };
    write!(out, "{:04x}", tac).is_ok()
}

/// ECGI: PLMN followed by the 28-bit E-UTRAN cell identifier in hex.
pub(crate) fn append_ecgi(bytes: &[u8], out: &mut String) -> bool {
    if !append_mcc_mnc(bytes, out) {
        return false;
    }
    if bytes.len() < 7 {
        return false;
    }
    let eci = u32::from_be_bytes([bytes[3], bytes[4], bytes[5], bytes[6]]) & 0x0fff_ffff;
    write!(out, "{:07x}", eci).is_ok()
}

/// CGI (and SAI/RAI, which share the layout): PLMN, LAC, then the cell or
/// service/routing area code.
pub(crate) fn append_cgi(bytes: &[u8], out: &mut String) -> bool {
    if !append_mcc_mnc(bytes, out) {
        return false;
    }
    let (Some(lac), Some(ci)) = (be16_at(bytes, 3), be16_at(bytes, 5)) else {
        return false;
    };
    write!(out, "{:04x}-{:04x}", lac, ci).is_ok()
}

/// LAI: PLMN plus the location area code.
pub(crate) fn append_lai(bytes: &[u8], out: &mut String) -> bool {
    if !append_mcc_mnc(bytes, out) {
        return false;
    }
    let Some(lac) = be16_at(bytes, 3) else {
        return false;
    };
    write!(out, "{:04x}", lac).is_ok()
}

/// Macro (and extended macro) eNodeB identifier: PLMN plus a 20-bit id,
/// with the SMeNB bit of the extended form masked off.
pub(crate) fn append_macro_enodeb(bytes: &[u8], out: &mut String) -> bool {
    if !append_mcc_mnc(bytes, out) {
        return false;
    }
    if bytes.len() < 6 {
        return false;
    }
    let id = u32::from_be_bytes([0, bytes[3] & 0x1f, bytes[4], bytes[5]]);
    write!(out, "{:07x}", id).is_ok()
}

fn located(render: impl FnOnce(&[u8], &mut String) -> bool, bytes: &[u8], cap: usize) -> EtsiliResult<String> {
    let mut out = String::new();
    if !render(bytes, &mut out) {
        return Err(EtsiliError::InvalidData(
            "location record is too short".to_string(),
        ));
    }
    if out.len() > cap {
        return Err(EtsiliError::Capacity(
            "location string exceeds the output buffer".to_string(),
        ));
    }
    Ok(out)
}

pub fn render_tai(bytes: &[u8], cap: usize) -> EtsiliResult<String> {
    located(append_tai, bytes, cap)
}

pub fn render_ecgi(bytes: &[u8], cap: usize) -> EtsiliResult<String> {
    located(append_ecgi, bytes, cap)
}

pub fn render_cgi(bytes: &[u8], cap: usize) -> EtsiliResult<String> {
    located(append_cgi, bytes, cap)
}

/// SAI shares the CGI layout, with a service area code in the cell slot.
pub fn render_sai(bytes: &[u8], cap: usize) -> EtsiliResult<String> {
    located(append_cgi, bytes, cap)
}

pub fn render_lai(bytes: &[u8], cap: usize) -> EtsiliResult<String> {
    located(append_lai, bytes, cap)
}

pub fn render_macro_enodeb(bytes: &[u8], cap: usize) -> EtsiliResult<String> {
    located(append_macro_enodeb, bytes, cap)
}

/// ULI: a flags octet followed by the sub-locations it announces, in flag
/// order. Each sub-location consumes its fixed number of octets whether or
/// not it rendered anything useful.
pub fn render_uli(bytes: &[u8], cap: usize) -> EtsiliResult<String> {
    if bytes.is_empty() {
        return Err(EtsiliError::InvalidData("empty ULI record".to_string()));
    }

    let flags = bytes[0];
    let mut used = 1usize;
    let mut out = String::new();

    // (flag bit, label, renderer, octets consumed)
    type Sub = (
        u8,
        &'static str,
        fn(&[u8], &mut String) -> bool,
        usize,
    );
    const SUBS: [Sub; 8] = [
        (0x01, " CGI: ", append_cgi, 7),
        (0x02, " SAI: ", append_cgi, 7),
        (0x04, " RAI: ", append_cgi, 7),
        (0x08, " TAI: ", append_tai, 5),
        (0x10, " ECGI: ", append_ecgi, 7),
        (0x20, " LAI: ", append_lai, 5),
        (0x40, " Macro eNodeB ID: ", append_macro_enodeb, 6),
        (0x80, " Ext Macro eNodeB ID: ", append_macro_enodeb, 6),
    ];

    for (bit, label, render, consumed) in SUBS {
        if flags & bit == 0 {
            continue;
        }
        let rest = bytes.get(used..).unwrap_or(&[]);
        out.push_str(label);
        if !render(rest, &mut out) {
            return Err(EtsiliError::InvalidData(
                "truncated ULI sub-location".to_string(),
            ));
        }
        used += consumed;
    }

    if out.len() > cap {
        return Err(EtsiliError::Capacity(
            "ULI string exceeds the output buffer".to_string(),
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plmn_filler_nibble_dropped() {
        let mut out = String::new();
        assert!(append_mcc_mnc(&[0x21, 0xf3, 0x54], &mut out));
        assert_eq!(out, "123-45-");
    }

    #[test]
    fn test_plmn_three_digit_mnc() {
        let mut out = String::new();
        assert!(append_mcc_mnc(&[0x21, 0x63, 0x54], &mut out));
        assert_eq!(out, "123-645-");
    }

    #[test]
    fn test_tai() {
        let s = render_tai(&[0x21, 0xf3, 0x54, 0x12, 0x34], 64).unwrap();
        assert_eq!(s, "123-45-1234");
    }

    #[test]
    fn test_cgi() {
        let s = render_cgi(&[0x21, 0xf3, 0x54, 0x00, 0x10, 0xab, 0xcd], 64).unwrap();
        assert_eq!(s, "123-45-0010-abcd");
    }

    #[test]
    fn test_ecgi_masks_high_nibble() {
        let s = render_ecgi(&[0x21, 0xf3, 0x54, 0xf1, 0x22, 0x33, 0x44], 64).unwrap();
        assert_eq!(s, "123-45-1223344");
    }

    #[test]
    fn test_macro_enodeb_masks_smenb_bit() {
        let s = render_macro_enodeb(&[0x21, 0xf3, 0x54, 0xff, 0x00, 0x01], 64).unwrap();
        assert_eq!(s, "123-45-01f0001");
    }

    #[test]
    fn test_uli_walks_flag_order() {
        // TAI (0x08) + ECGI (0x10) flags set.
        let mut uli = vec![0x18];
        uli.extend_from_slice(&[0x21, 0xf3, 0x54, 0x12, 0x34]); // TAI
        uli.extend_from_slice(&[0x21, 0xf3, 0x54, 0x01, 0x22, 0x33, 0x44]); // ECGI
        let s = render_uli(&uli, 256).unwrap();
        assert_eq!(s, " TAI: 123-45-1234 ECGI: 123-45-1223344");
    }

    #[test]
    fn test_uli_truncated_sub_location() {
        assert!(render_uli(&[0x01, 0x21, 0xf3], 64).is_err());
    }
}
