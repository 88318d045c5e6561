//! ETSI TS 102 232 lawful-intercept record codec
//!
//! The main entry point of the workspace. Decoding goes through
//! [`EtsiliSession`]: attach a PDU buffer, then either iterate rendered
//! fields or pull specific values (LIID, CIN, sequence number, timestamps,
//! CC/IRI content). Encoding goes through [`EtsiliTop`]: initialise it once
//! per intercept with the static details, initialise the record kinds you
//! intend to emit, then create children and emit records at line rate.
//!
//! ```rust,no_run
//! use etsili::{EtsiliResult, EtsiliSession};
//!
//! fn dump(pdu: &[u8]) -> EtsiliResult<()> {
//!     let mut session = EtsiliSession::new();
//!     session.attach(pdu, false);
//!     let mut field = String::new();
//!     while session.next_field_str(&mut field, 2048)?.is_some() {
//!         println!("{}", field);
//!     }
//!     Ok(())
//! }
//! ```

pub mod encode;
pub mod identity;
pub mod location;
pub mod params;
pub mod render;
pub mod session;

pub use encode::{init_top, EtsiliTop, RecordChild, RecordKind};
pub use etsili_core::{Direction, EtsiliError, EtsiliResult, InterceptDetails, IriType, Timeval};
pub use params::{EtsiliIpAddress, IpAssignment, IpIriId, IpRep, IriParamValue, IriParams};
pub use session::{CcContent, CcFormat, EtsiliSession, IriContent, IriContentKind};
