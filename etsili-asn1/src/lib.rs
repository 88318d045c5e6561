//! BER engine for the ETSI LI record format
//!
//! This crate provides the generic halves of the codec: a field-by-field
//! BER decoder with decode-result caching, a schema-driven search over
//! decoded buffers, a deferred (tree-building) encoder, a streaming
//! (append-in-place) encoder, and the fixed-block arena the decoder uses to
//! recycle its per-item descriptors.
//!
//! Nothing in here knows about lawful-intercept records; the schema trees
//! consumed by the search and dump walks are supplied by `etsili-schema`.

pub mod arena;
pub mod decoder;
pub mod encoder;
pub mod primitives;
pub mod schema;
pub mod search;
pub mod stream;

pub use arena::{ItemPool, SlotRef};
pub use decoder::{Decoder, Item};
pub use encoder::{EncodedResult, Encoder};
pub use primitives::EncodeValue;
pub use schema::{ElementNode, ElementTree, MemberAction, NodeId, NOACTION};
pub use search::{FoundItem, FoundSet, SearchTarget};
pub use stream::{encode_chunk, BerStream};
