//! Streaming BER encoder
//!
//! Appends items straight into a growable byte buffer: no staging tree, no
//! second pass. Constructed fields open indefinite-form regions and are
//! closed later with [`BerStream::endseq`], which writes the two-zero-octet
//! end-of-contents markers.
//!
//! The buffer may move when it grows; callers coordinate through byte
//! offsets, never addresses.

use bytes::Bytes;
use etsili_core::error::EtsiliResult;
use etsili_core::IdentClass;

use crate::primitives::{calculate_length, encode_item, EncodeValue};

/// Append-only BER output buffer.
pub struct BerStream {
    buf: Vec<u8>,
    increment: usize,
}

impl BerStream {
    pub fn new(init_alloc: usize, increment: usize) -> Self {
        BerStream {
            buf: Vec::with_capacity(init_alloc),
            increment,
        }
    }

    fn ensure(&mut self, needed: usize) {
        if self.buf.capacity() - self.buf.len() < needed {
            self.buf.reserve(needed + self.increment);
        }
    }

    /// Append one item. Returns the offset the item starts at.
    pub fn encode_next(
        &mut self,
        encode_as: u8,
        class: IdentClass,
        identifier: u32,
        value: &EncodeValue,
    ) -> EtsiliResult<usize> {
        self.ensure(calculate_length(identifier, encode_as, value.raw_len()));
        let at = self.buf.len();
        encode_item(&mut self.buf, encode_as, class, identifier, value)?;
        Ok(at)
    }

    /// Close `depth` open indefinite-form regions: two zero octets each.
    pub fn endseq(&mut self, depth: usize) {
        self.ensure(depth * 2);
        self.buf.resize(self.buf.len() + depth * 2, 0);
    }

    /// Append an already-encoded run of bytes verbatim.
    pub fn append_preencoded(&mut self, chunk: &[u8]) {
        self.ensure(chunk.len());
        self.buf.extend_from_slice(chunk);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn increment(&self) -> usize {
        self.increment
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Take the encoded bytes, leaving the stream empty and ready for the
    /// next record.
    pub fn finish(&mut self) -> Bytes {
        let out = std::mem::take(&mut self.buf);
        Bytes::from(out)
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }
}

/// Render one standalone item into an immutable chunk, for the preencoded
/// tables the record builder replays into every emission.
pub fn encode_chunk(
    encode_as: u8,
    class: IdentClass,
    identifier: u32,
    value: &EncodeValue,
) -> EtsiliResult<Bytes> {
    let mut buf = Vec::with_capacity(calculate_length(identifier, encode_as, value.raw_len()));
    encode_item(&mut buf, encode_as, class, identifier, value)?;
    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Decoder;
    use etsili_core::tag;

    #[test]
    fn test_stream_roundtrip() {
        let mut stream = BerStream::new(64, 64);
        stream
            .encode_next(
                tag::SEQUENCE,
                IdentClass::UniversalConstruct,
                tag::SEQUENCE as u32,
                &EncodeValue::None,
            )
            .unwrap();
        stream
            .encode_next(
                tag::OCTETSTRING,
                IdentClass::ContextPrimitive,
                1,
                &EncodeValue::Bytes(b"xy"),
            )
            .unwrap();
        stream.endseq(1);

        let bytes = stream.finish();
        let mut dec = Decoder::new(&bytes);
        dec.decode_next().unwrap();
        assert!(dec.current_item().unwrap().indefinite);
        dec.decode_next().unwrap();
        assert_eq!(dec.identifier(), Some(1));
        assert_eq!(dec.item_bytes(), Some(&b"xy"[..]));
    }

    #[test]
    fn test_endseq_writes_zero_pairs() {
        let mut stream = BerStream::new(8, 8);
        stream.endseq(3);
        assert_eq!(stream.as_bytes(), &[0u8; 6]);
    }

    #[test]
    fn test_growth_preserves_content() {
        let mut stream = BerStream::new(4, 4);
        let payload = vec![0xaa; 300];
        stream
            .encode_next(
                tag::OCTETSTRING,
                IdentClass::ContextPrimitive,
                0,
                &EncodeValue::Bytes(&payload),
            )
            .unwrap();
        let bytes = stream.finish();
        assert_eq!(&bytes[bytes.len() - 300..], payload.as_slice());
    }

    #[test]
    fn test_encode_chunk_matches_stream() {
        let chunk = encode_chunk(
            tag::ENUM,
            IdentClass::ContextPrimitive,
            0,
            &EncodeValue::Integer { value: 1, width: 4 },
        )
        .unwrap();

        let mut stream = BerStream::new(16, 16);
        stream
            .encode_next(
                tag::ENUM,
                IdentClass::ContextPrimitive,
                0,
                &EncodeValue::Integer { value: 1, width: 4 },
            )
            .unwrap();
        assert_eq!(stream.as_bytes(), chunk.as_ref());
    }
}
