//! Payload object identifiers
//!
//! Raw sub-identifier bytes as they are fed to the OID encoder; the first
//! two entries fuse into one octet on the wire.

/// li-psDomainId: 0.4.0.2.2.5.1.17
pub const LI_PS_DOMAIN_ID: [u8; 8] = [0x00, 0x04, 0x00, 0x02, 0x02, 0x05, 0x01, 0x11];

/// Relative OIDs for the IP payload variants (rooted at li-psDomainId).
pub const IPCC_OID: [u8; 4] = [0x05, 0x03, 0x0a, 0x02];
pub const IPIRI_OID: [u8; 4] = [0x05, 0x03, 0x0a, 0x01];
pub const IPMMCC_OID: [u8; 4] = [0x05, 0x05, 0x06, 0x02];
pub const IPMMIRI_OID: [u8; 4] = [0x05, 0x05, 0x06, 0x01];

/// Absolute OIDs for the mobile-network payloads.
pub const UMTSIRI_OID: [u8; 9] = [0x00, 0x04, 0x00, 0x02, 0x02, 0x04, 0x01, 0x0f, 0x05];
pub const EPSIRI_OID: [u8; 9] = [0x00, 0x04, 0x00, 0x02, 0x02, 0x04, 0x08, 0x11, 0x00];
pub const EPSCC_OID: [u8; 9] = [0x00, 0x04, 0x00, 0x02, 0x02, 0x04, 0x09, 0x11, 0x00];
