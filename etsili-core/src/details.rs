//! Caller-facing record description types

use serde::{Deserialize, Serialize};

/// Static intercept parameters shared by every record emitted for one
/// warrant. These are baked into the preencoded header when a builder is
/// initialised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptDetails {
    pub liid: String,
    pub authcc: String,
    pub delivcc: String,
    pub operatorid: String,
    pub networkelemid: String,
    /// Optional interception point identifier; omitted from the header
    /// when not set.
    pub intpointid: Option<String>,
}

/// Direction of an intercepted packet relative to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    FromTarget = 0,
    ToTarget = 1,
    Unknown = 2,
}

/// IRI record type, as carried in the iRIType enum field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum IriType {
    Begin = 1,
    End = 2,
    Continue = 3,
    Report = 4,
}
