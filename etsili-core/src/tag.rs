//! Known tag types and the synthetic "interpret as" values used by the
//! schema layer.
//!
//! Values at and below 0x1f are the ASN.1 universal tag numbers; everything
//! from 0x30 up only ever appears as an interpretation instruction attached
//! to a schema member, never on the wire.

pub const BOOLEAN: u8 = 0x01;
pub const INTEGER: u8 = 0x02;
pub const BITSTRING: u8 = 0x03;
pub const OCTETSTRING: u8 = 0x04;
pub const NULL: u8 = 0x05;
pub const OID: u8 = 0x06;
pub const OBJDESC: u8 = 0x07;
pub const REAL: u8 = 0x09;
pub const ENUM: u8 = 0x0a;
pub const UTF8STR: u8 = 0x0c;
pub const RELATIVEOID: u8 = 0x0d;
pub const SEQUENCE: u8 = 0x10;
pub const SET: u8 = 0x11;
pub const NUMERIC: u8 = 0x12;
pub const PRINTABLE: u8 = 0x13;
pub const IA5: u8 = 0x16;
pub const UTCTIME: u8 = 0x17;
pub const GENERALTIME: u8 = 0x18;

/* Synthetic interpretations. */
pub const IPPACKET: u8 = 0x30;
pub const BINARY_IP: u8 = 0x31;
pub const ULI: u8 = 0x32;
pub const TAI: u8 = 0x33;
pub const ECGI: u8 = 0x34;
pub const THREEG_IMEI: u8 = 0x35;
pub const THREEG_SM_CAUSE: u8 = 0x36;
pub const DOMAIN_NAME: u8 = 0x37;
pub const HEX_BYTES: u8 = 0x38;
pub const CGI: u8 = 0x39;
pub const SAI: u8 = 0x3a;
pub const LAI: u8 = 0x3b;
pub const MACRO_ENODEB_ID: u8 = 0x3c;
pub const EPS_ATTACH_TYPE: u8 = 0x3d;
pub const EPS_RAT_TYPE: u8 = 0x3e;
pub const EPS_CAUSE: u8 = 0x3f;
pub const EPS_PDN_TYPE: u8 = 0x40;
pub const EPS_APN_AMBR: u8 = 0x41;
pub const INTEGER_SEQUENCE: u8 = 0x42;
pub const ENCRYPTED: u8 = 0x43;

/// Human-readable name for a universal tag, used when dumping items that
/// carry no schema.
pub fn universal_name(class_constructed: bool, ident: u32) -> Option<&'static str> {
    if class_constructed {
        return match ident as u8 {
            SEQUENCE => Some("Sequence"),
            SET => Some("Set"),
            _ => None,
        };
    }
    match ident as u8 {
        BOOLEAN => Some("Boolean"),
        INTEGER => Some("Integer"),
        BITSTRING => Some("Bit String"),
        OCTETSTRING => Some("Octet String"),
        NULL => Some("NULL"),
        OID => Some("OID"),
        OBJDESC => Some("Object Description"),
        REAL => Some("Real"),
        ENUM => Some("Enumerated Type"),
        UTF8STR => Some("UTF8 String"),
        RELATIVEOID => Some("Relative OID"),
        NUMERIC => Some("Numeric String"),
        PRINTABLE => Some("Printable String"),
        IA5 => Some("IA5 String"),
        UTCTIME => Some("UTC Time"),
        GENERALTIME => Some("Generalized Time"),
        _ => None,
    }
}
