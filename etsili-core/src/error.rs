use thiserror::Error;

/// Main error type for etsili_rs operations
#[derive(Error, Debug)]
pub enum EtsiliError {
    #[error("Malformed tag: identifier field longer than {0} bytes")]
    TagTooLong(usize),

    #[error("Malformed length: {0} length octets exceeds the content-length width")]
    LengthTooLong(usize),

    #[error("Truncated buffer: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("Integer value is too long: {0} bytes (max 8)")]
    IntegerTooLong(usize),

    #[error("Invalid time value: {0}")]
    InvalidTime(String),

    #[error("Output capacity exhausted: {0}")]
    Capacity(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Unsupported encode type: {0}")]
    UnsupportedEncodeType(u8),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Decoder misuse: {0}")]
    Misuse(String),
}

/// Result type alias for etsili_rs operations
pub type EtsiliResult<T> = Result<T, EtsiliError>;
