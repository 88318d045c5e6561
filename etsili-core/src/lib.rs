//! Core types and utilities for the ETSI LI BER codec
//!
//! This crate provides the fundamental types, error handling, and time
//! conversions used throughout the etsili_rs implementation.

pub mod class;
pub mod details;
pub mod error;
pub mod tag;
pub mod time;

pub use class::IdentClass;
pub use details::{Direction, InterceptDetails, IriType};
pub use error::{EtsiliError, EtsiliResult};
pub use time::Timeval;
