//! Deferred (tree-building) encoder
//!
//! BER is emitted left to right but the length of every constructed field
//! depends on everything inside it, so fields are staged as pending jobs in
//! a tree. `endseq` closes one level and finalises its size; `finish` then
//! emits the whole tree in a single forward walk.
//!
//! Released result buffers are parked on a free-list behind a mutex so a
//! producing thread and a consuming/releasing thread can share one encoder
//! for result-pool access.

use std::sync::Mutex;

use log::warn;

use etsili_core::error::{EtsiliError, EtsiliResult};
use etsili_core::time::format_generalized;
use etsili_core::{tag, IdentClass};

use crate::primitives::{
    integer_content_octets, preamble_octets, push_identifier, push_integer_content, push_length,
    push_oid_content, EncodeValue,
};

/// A staged field: identifier, translated value octets, and the preamble
/// size it will occupy once emitted.
#[derive(Debug, Clone, Default)]
pub struct EncodeJob {
    pub class: IdentClass,
    pub identifier: u32,
    pub encode_as: u8,
    value: Vec<u8>,
    preamble_len: u32,
    /// Fully pre-rendered bytes; set only for preencoded jobs.
    encoded: Option<Vec<u8>>,
}

impl EncodeJob {
    /// Build a job and render it to its final bytes immediately, so it can
    /// be replayed into many encodes without re-translation.
    pub fn preencode(
        encode_as: u8,
        class: IdentClass,
        identifier: u32,
        value: &EncodeValue,
    ) -> EtsiliResult<Self> {
        let mut job = EncodeJob {
            class,
            identifier,
            encode_as,
            ..Default::default()
        };
        job.stage(value)?;

        let mut bytes = Vec::with_capacity(job.preamble_len as usize + job.value.len());
        push_identifier(class, identifier, &mut bytes)?;
        push_length(job.value.len(), &mut bytes);
        bytes.extend_from_slice(&job.value);
        job.encoded = Some(bytes);
        Ok(job)
    }

    /// Translate the caller's value into staged content octets.
    fn stage(&mut self, value: &EncodeValue) -> EtsiliResult<()> {
        self.value.clear();
        match self.encode_as {
            tag::OCTETSTRING
            | tag::UTF8STR
            | tag::NUMERIC
            | tag::PRINTABLE
            | tag::IA5
            | tag::RELATIVEOID
            | tag::IPPACKET => {
                if let EncodeValue::Bytes(b) = value {
                    self.value.extend_from_slice(b);
                }
                self.preamble_len = preamble_octets(self.identifier, self.value.len()) as u32;
            }

            tag::UTCTIME | tag::GENERALTIME => {
                let EncodeValue::Time(tv) = value else {
                    return Err(EtsiliError::InvalidData(
                        "time field needs a timeval value".to_string(),
                    ));
                };
                let ts = format_generalized(*tv)?;
                self.value.extend_from_slice(ts.as_bytes());
                self.preamble_len = preamble_octets(self.identifier, self.value.len()) as u32;
            }

            tag::INTEGER | tag::ENUM => {
                let EncodeValue::Integer { value: v, width } = value else {
                    return Err(EtsiliError::InvalidData(
                        "integer field needs an integer value".to_string(),
                    ));
                };
                let lenocts = integer_content_octets(*v, *width as usize);
                push_integer_content(*v, lenocts, &mut self.value);
                self.preamble_len = preamble_octets(self.identifier, self.value.len()) as u32;
            }

            tag::OID => {
                let EncodeValue::Bytes(b) = value else {
                    return Err(EtsiliError::InvalidData(
                        "OID field needs a byte value".to_string(),
                    ));
                };
                push_oid_content(b, &mut self.value)?;
                self.preamble_len = preamble_octets(self.identifier, self.value.len()) as u32;
            }

            tag::NULL => {
                self.preamble_len = preamble_octets(self.identifier, 0) as u32;
            }

            tag::SEQUENCE | tag::SET => {
                // Preamble is unknowable until endseq fixes the size.
                self.preamble_len = 0;
            }

            other => {
                warn!("unable to encode tag type {}", other);
                return Err(EtsiliError::UnsupportedEncodeType(other));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PendNode {
    job: EncodeJob,
    children_size: u32,
    children: Option<usize>,
    last_child: Option<usize>,
    sibling: Option<usize>,
    parent: Option<usize>,
}

/// A finished encode. Hand it back with [`Encoder::release_result`] so the
/// buffer can be recycled.
#[derive(Debug)]
pub struct EncodedResult {
    pub bytes: Vec<u8>,
}

/// The deferred encoder.
pub struct Encoder {
    nodes: Vec<PendNode>,
    free: Vec<usize>,
    root: Option<usize>,
    current: Option<usize>,
    free_results: Mutex<Vec<Vec<u8>>>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Encoder {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            current: None,
            free_results: Mutex::new(Vec::new()),
        }
    }

    /// Drop all pending state; staged node storage is kept for reuse.
    pub fn reset(&mut self) {
        self.free.clear();
        self.free.extend(0..self.nodes.len());
        self.root = None;
        self.current = None;
    }

    fn alloc_node(&mut self) -> usize {
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = PendNode::default();
            idx
        } else {
            self.nodes.push(PendNode::default());
            self.nodes.len() - 1
        }
    }

    /// Attach a fresh node at the insertion point: first child of a
    /// childless constructed current, otherwise next sibling.
    fn attach(&mut self, idx: usize) {
        match self.current {
            None => {
                self.root = Some(idx);
            }
            Some(cur) => {
                if self.nodes[cur].job.class.is_constructed() && self.nodes[cur].children.is_none()
                {
                    self.nodes[cur].children = Some(idx);
                    self.nodes[cur].last_child = Some(idx);
                    self.nodes[idx].parent = Some(cur);
                } else {
                    let parent = self.nodes[cur].parent;
                    self.nodes[cur].sibling = Some(idx);
                    self.nodes[idx].parent = parent;
                    if let Some(p) = parent {
                        self.nodes[p].last_child = Some(idx);
                    }
                }
            }
        }
        self.current = Some(idx);
    }

    /// Stage the next field.
    pub fn encode_next(
        &mut self,
        encode_as: u8,
        class: IdentClass,
        identifier: u32,
        value: &EncodeValue,
    ) -> EtsiliResult<()> {
        let idx = self.alloc_node();
        self.attach(idx);

        let node = &mut self.nodes[idx];
        node.job.class = class;
        node.job.identifier = identifier;
        node.job.encode_as = encode_as;
        node.job.stage(value)?;

        let add = node.job.value.len() as u32 + node.job.preamble_len;
        if let Some(p) = self.nodes[idx].parent {
            self.nodes[p].children_size += add;
        }
        Ok(())
    }

    /// Stage already-rendered jobs, cheapest path for constant fields.
    pub fn encode_next_preencoded(&mut self, jobs: &[&EncodeJob]) {
        for job in jobs {
            let idx = self.alloc_node();
            self.attach(idx);
            self.nodes[idx].job = (*job).clone();

            let add = self.nodes[idx]
                .job
                .encoded
                .as_ref()
                .map(|e| e.len() as u32)
                .unwrap_or(0);
            if let Some(p) = self.nodes[idx].parent {
                self.nodes[p].children_size += add;
            }
        }
    }

    /// Close the innermost open constructed field, fixing its preamble from
    /// the accumulated size of its children.
    pub fn endseq(&mut self) -> EtsiliResult<()> {
        let cur = self
            .current
            .ok_or_else(|| EtsiliError::Misuse("endseq with no pending fields".to_string()))?;
        let parent = self.nodes[cur]
            .parent
            .ok_or_else(|| EtsiliError::Misuse("endseq past the outermost field".to_string()))?;

        self.current = Some(parent);
        let node = &mut self.nodes[parent];
        node.job.preamble_len =
            preamble_octets(node.job.identifier, node.children_size as usize) as u32;

        let carry = node.children_size + node.job.preamble_len;
        if let Some(gp) = self.nodes[parent].parent {
            self.nodes[gp].children_size += carry;
        }
        Ok(())
    }

    pub fn endseq_repeat(&mut self, repeats: usize) {
        for _ in 0..repeats {
            if self.endseq().is_err() {
                break;
            }
        }
    }

    /// Emit the staged tree. The encoder stays populated; call
    /// [`Self::reset`] before staging the next record.
    pub fn finish(&mut self) -> EtsiliResult<EncodedResult> {
        let root = self
            .root
            .ok_or_else(|| EtsiliError::Misuse("nothing staged to encode".to_string()))?;

        let total = (self.nodes[root].children_size + self.nodes[root].job.preamble_len)
            as usize
            + self.nodes[root].job.value.len();

        let mut bytes = self
            .free_results
            .try_lock()
            .ok()
            .and_then(|mut pool| pool.pop())
            .unwrap_or_default();
        bytes.clear();
        bytes.reserve(total.max(512));

        let mut walk = Some(root);
        while let Some(idx) = walk {
            let node = &self.nodes[idx];

            if let Some(enc) = &node.job.encoded {
                debug_assert!(node.children.is_none());
                bytes.extend_from_slice(enc);
            } else {
                push_identifier(node.job.class, node.job.identifier, &mut bytes)?;
                if node.children_size != 0 {
                    push_length(node.children_size as usize, &mut bytes);
                } else {
                    push_length(node.job.value.len(), &mut bytes);
                }
                bytes.extend_from_slice(&node.job.value);
            }

            if let Some(child) = node.children {
                walk = Some(child);
                continue;
            }
            if let Some(sib) = self.nodes[idx].sibling {
                walk = Some(sib);
                continue;
            }
            // Climb until an ancestor has an unvisited sibling.
            let mut up = self.nodes[idx].parent;
            walk = loop {
                match up {
                    None => break None,
                    Some(p) => match self.nodes[p].sibling {
                        Some(sib) => break Some(sib),
                        None => up = self.nodes[p].parent,
                    },
                }
            };
        }

        debug_assert!(self.nodes[root].job.encoded.is_some() || bytes.len() == total);
        Ok(EncodedResult { bytes })
    }

    /// Return a result buffer to the recycle pool.
    pub fn release_result(&self, res: EncodedResult) {
        if let Ok(mut pool) = self.free_results.try_lock() {
            pool.push(res.bytes);
        }
    }

    /// Return a batch of result buffers in one pool operation.
    pub fn release_results(&self, results: impl IntoIterator<Item = EncodedResult>) {
        if let Ok(mut pool) = self.free_results.lock() {
            pool.extend(results.into_iter().map(|r| r.bytes));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_integer_emission() {
        let mut enc = Encoder::new();
        enc.encode_next(
            tag::INTEGER,
            IdentClass::UniversalPrimitive,
            2,
            &EncodeValue::int(0),
        )
        .unwrap();
        let res = enc.finish().unwrap();
        assert_eq!(res.bytes, [0x02, 0x01, 0x00]);
    }

    #[test]
    fn test_negative_integer_roundtrip() {
        let mut enc = Encoder::new();
        enc.encode_next(
            tag::INTEGER,
            IdentClass::UniversalPrimitive,
            2,
            &EncodeValue::Integer {
                value: -44,
                width: 1,
            },
        )
        .unwrap();
        let res = enc.finish().unwrap();
        assert_eq!(res.bytes, [0x02, 0x01, 0xd4]);

        let mut dec = crate::decoder::Decoder::new(&res.bytes);
        dec.decode_next().unwrap();
        assert_eq!(dec.integer_value().unwrap(), -44);
    }

    #[test]
    fn test_nested_sequence_lengths() {
        let mut enc = Encoder::new();
        enc.encode_next(
            tag::SEQUENCE,
            IdentClass::UniversalConstruct,
            tag::SEQUENCE as u32,
            &EncodeValue::None,
        )
        .unwrap();
        enc.encode_next(
            tag::INTEGER,
            IdentClass::UniversalPrimitive,
            2,
            &EncodeValue::int(5),
        )
        .unwrap();
        enc.encode_next(
            tag::OCTETSTRING,
            IdentClass::UniversalPrimitive,
            4,
            &EncodeValue::Bytes(b"ab"),
        )
        .unwrap();
        enc.endseq().unwrap();

        let res = enc.finish().unwrap();
        assert_eq!(res.bytes, [0x30, 0x07, 0x02, 0x01, 0x05, 0x04, 0x02, b'a', b'b']);
    }

    #[test]
    fn test_deep_nesting_size_propagation() {
        let mut enc = Encoder::new();
        for _ in 0..3 {
            enc.encode_next(
                tag::SEQUENCE,
                IdentClass::UniversalConstruct,
                tag::SEQUENCE as u32,
                &EncodeValue::None,
            )
            .unwrap();
        }
        enc.encode_next(
            tag::INTEGER,
            IdentClass::UniversalPrimitive,
            2,
            &EncodeValue::int(1),
        )
        .unwrap();
        enc.endseq_repeat(3);

        let res = enc.finish().unwrap();
        assert_eq!(
            res.bytes,
            [0x30, 0x07, 0x30, 0x05, 0x30, 0x03, 0x02, 0x01, 0x01]
        );
    }

    #[test]
    fn test_preencoded_jobs() {
        let liid = EncodeJob::preencode(
            tag::OCTETSTRING,
            IdentClass::ContextPrimitive,
            1,
            &EncodeValue::Bytes(b"AB"),
        )
        .unwrap();

        let mut enc = Encoder::new();
        enc.encode_next(
            tag::SEQUENCE,
            IdentClass::UniversalConstruct,
            tag::SEQUENCE as u32,
            &EncodeValue::None,
        )
        .unwrap();
        enc.encode_next_preencoded(&[&liid]);
        enc.endseq().unwrap();

        let res = enc.finish().unwrap();
        assert_eq!(res.bytes, [0x30, 0x04, 0x81, 0x02, b'A', b'B']);
    }

    #[test]
    fn test_result_recycling() {
        let mut enc = Encoder::new();
        enc.encode_next(
            tag::INTEGER,
            IdentClass::UniversalPrimitive,
            2,
            &EncodeValue::int(9),
        )
        .unwrap();
        let res = enc.finish().unwrap();
        let first = res.bytes.clone();
        enc.release_result(res);

        enc.reset();
        enc.encode_next(
            tag::INTEGER,
            IdentClass::UniversalPrimitive,
            2,
            &EncodeValue::int(9),
        )
        .unwrap();
        let res2 = enc.finish().unwrap();
        assert_eq!(res2.bytes, first);
    }
}
