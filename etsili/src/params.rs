//! IRI parameter maps and their field identifiers
//!
//! IRI records carry a variable set of optional fields. Callers hand the
//! builder a map keyed by field identifier; the map walks in identifier
//! order, which is also the order the fields must appear on the wire.

use std::collections::BTreeMap;

use etsili_core::Timeval;

/// Field identifiers for IP-IRI contents.
pub mod ipiri_field {
    pub const ACCESS_EVENT_TYPE: u8 = 0;
    pub const TARGET_USERNAME: u8 = 1;
    pub const INTERNET_ACCESS_TYPE: u8 = 2;
    pub const IPVERSION: u8 = 3;
    pub const TARGET_IPADDRESS: u8 = 4;
    pub const TARGET_NETWORKID: u8 = 5;
    pub const TARGET_CPEID: u8 = 6;
    pub const TARGET_LOCATION: u8 = 7;
    pub const POP_PORTNUMBER: u8 = 8;
    pub const CALLBACK_NUMBER: u8 = 9;
    pub const STARTTIME: u8 = 10;
    pub const ENDTIME: u8 = 11;
    pub const ENDREASON: u8 = 12;
    pub const OCTETS_RECEIVED: u8 = 13;
    pub const OCTETS_TRANSMITTED: u8 = 14;
    pub const RAW_AAA_DATA: u8 = 15;
    pub const EXPECTED_ENDTIME: u8 = 16;
    pub const POP_PHONENUMBER: u8 = 17;
    pub const POP_IDENTIFIER: u8 = 18;
    pub const POP_IPADDRESS: u8 = 19;
    pub const NATIONAL_IPIRI_PARAMETERS: u8 = 20;
    pub const ADDITIONAL_IPADDRESS: u8 = 21;
    pub const AUTHENTICATION_TYPE: u8 = 22;
    pub const OTHER_TARGET_IDENTIFIERS: u8 = 23;
}

/// Field identifiers for UMTS-IRI parameters.
pub mod umtsiri_field {
    pub const IMSI: u8 = 1;
    pub const MSISDN: u8 = 2;
    pub const IMEI: u8 = 3;
    pub const APNAME: u8 = 4;
    pub const TAI: u8 = 5;
    pub const ECGI: u8 = 6;
    pub const PDP_ADDRESS: u8 = 7;
    pub const EVENT_TYPE: u8 = 8;
    pub const EVENT_TIME: u8 = 9;
    pub const LOCATION_TIME: u8 = 10;
    pub const GPRS_CORRELATION: u8 = 11;
    pub const IRI_TYPE: u8 = 12;
    pub const GPRS_ERROR_CODE: u8 = 13;
    pub const GGSN_IPADDRESS: u8 = 14;
    pub const INITIATOR: u8 = 15;
    pub const OPERATOR_IDENTIFIER: u8 = 16;
    pub const PDPTYPE: u8 = 17;
    pub const CGI: u8 = 18;
    pub const SAI: u8 = 19;
}

/// UMTS GPRS event values carried by `umtsiri_field::EVENT_TYPE`.
pub mod umts_event {
    pub const PDPCONTEXT_ACTIVATION: u32 = 1;
    pub const START_WITH_PDPCONTEXT_ACTIVE: u32 = 2;
    pub const PDPCONTEXT_DEACTIVATION: u32 = 4;
    pub const PDPCONTEXT_MODIFICATION: u32 = 13;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpRep {
    Binary,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum IpAssignment {
    Static = 1,
    Dynamic = 2,
    Unknown = 3,
}

/// An IP address the way the record format describes one: version,
/// assignment method, optional prefix/mask, and either binary or text
/// representation of the address itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtsiliIpAddress {
    pub is_v6: bool,
    pub assignment: IpAssignment,
    pub v6_prefix_len: u8,
    pub v4_subnet_mask: u32,
    pub rep: IpRep,
    pub value: Vec<u8>,
}

impl EtsiliIpAddress {
    pub fn binary_v4(addr: [u8; 4], assignment: IpAssignment) -> Self {
        EtsiliIpAddress {
            is_v6: false,
            assignment,
            v6_prefix_len: 0,
            v4_subnet_mask: 0,
            rep: IpRep::Binary,
            value: addr.to_vec(),
        }
    }

    pub fn binary_v6(addr: [u8; 16], assignment: IpAssignment) -> Self {
        EtsiliIpAddress {
            is_v6: true,
            assignment,
            v6_prefix_len: 0,
            v4_subnet_mask: 0,
            rep: IpRep::Binary,
            value: addr.to_vec(),
        }
    }
}

/// A POP identifier, one of three representations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpIriId {
    Printable(String),
    Mac([u8; 6]),
    Ip(EtsiliIpAddress),
}

/// One staged IRI field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IriParamValue {
    Int(i64),
    Enum(u32),
    Bytes(Vec<u8>),
    Str(String),
    Time(Timeval),
    IpAddress(EtsiliIpAddress),
    IriId(IpIriId),
}

/// Field map for one IRI emission, walked in field-identifier order.
pub type IriParams = BTreeMap<u8, IriParamValue>;
