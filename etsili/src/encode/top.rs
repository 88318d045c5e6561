//! Header and body templates
//!
//! The header is materialised once as a byte run whose five mutable
//! integer slots are emitted in their maximum-width long form, so emission
//! overwrites them in place without ever shifting the layout. Each record
//! kind gets a body skeleton with two remembered offsets: the
//! direction/IRI-type slot and the payload insertion point.

use std::sync::Arc;

use bytes::Bytes;
use etsili_asn1::{BerStream, EncodeValue};
use etsili_core::error::{EtsiliError, EtsiliResult};
use etsili_core::{tag, IdentClass, InterceptDetails};

use super::child::{ChildFreelist, RecordChild};
use super::preencode::{PreencodedId, PreencodedTable};
use crate::params::{EtsiliIpAddress, IpAssignment, IpRep};

/// The record kinds the builder can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    IpCc,
    IpMmCc,
    IpMmIri,
    IpIri,
    UmtsCc,
    UmtsIri,
}

pub(crate) const RECORD_KINDS: usize = 6;

impl RecordKind {
    pub(crate) fn index(self) -> usize {
        match self {
            RecordKind::IpCc => 0,
            RecordKind::IpMmCc => 1,
            RecordKind::IpMmIri => 2,
            RecordKind::IpIri => 3,
            RecordKind::UmtsCc => 4,
            RecordKind::UmtsIri => 5,
        }
    }
}

/// PSHeader byte run plus the offsets of its rewritable slots.
pub(crate) struct HeaderTemplate {
    pub buf: Bytes,
    pub cin: usize,
    pub seqno: usize,
    pub sec: usize,
    pub usec: usize,
    pub end: usize,
}

/// Everything children share: the preencoded table, the header template,
/// and the buffer growth increment.
pub(crate) struct TopCore {
    pub preencoded: PreencodedTable,
    pub header: HeaderTemplate,
    pub increment: usize,
}

/// One record kind's constant body prefix.
pub(crate) struct BodyTemplate {
    pub buf: Bytes,
    pub meta: usize,
    pub data: usize,
    pub flist: Arc<ChildFreelist>,
}

impl Drop for BodyTemplate {
    fn drop(&mut self) {
        // Mark and drain: children still in flight will free themselves on
        // release instead of queueing behind a dead owner.
        self.flist.mark_for_delete();
    }
}

/// Per-intercept encoder state: preencoded statics plus the per-kind body
/// skeletons.
pub struct EtsiliTop {
    pub(crate) core: Arc<TopCore>,
    bodies: [Option<BodyTemplate>; RECORD_KINDS],
}

/// Stream an IP address structure, used both while building skeletons and
/// while emitting IRI parameters.
pub(crate) fn stream_ipaddress(enc: &mut BerStream, addr: &EtsiliIpAddress) -> EtsiliResult<()> {
    let iptype: u32 = if addr.is_v6 { 1 } else { 0 };

    enc.encode_next(
        tag::ENUM,
        IdentClass::ContextPrimitive,
        1,
        &EncodeValue::Integer {
            value: iptype as i64,
            width: 4,
        },
    )?;

    enc.encode_next(
        tag::SEQUENCE,
        IdentClass::ContextConstruct,
        2,
        &EncodeValue::None,
    )?;
    match addr.rep {
        IpRep::Binary => {
            enc.encode_next(
                tag::OCTETSTRING,
                IdentClass::ContextPrimitive,
                1,
                &EncodeValue::Bytes(&addr.value),
            )?;
        }
        IpRep::Text => {
            enc.encode_next(
                tag::IA5,
                IdentClass::ContextPrimitive,
                2,
                &EncodeValue::Bytes(&addr.value),
            )?;
        }
    }
    enc.endseq(1);

    enc.encode_next(
        tag::ENUM,
        IdentClass::ContextPrimitive,
        3,
        &EncodeValue::Integer {
            value: addr.assignment as i64,
            width: 4,
        },
    )?;

    if addr.v6_prefix_len > 0 {
        enc.encode_next(
            tag::INTEGER,
            IdentClass::ContextPrimitive,
            4,
            &EncodeValue::Integer {
                value: addr.v6_prefix_len as i64,
                width: 4,
            },
        )?;
    }
    if addr.v4_subnet_mask > 0 {
        enc.encode_next(
            tag::OCTETSTRING,
            IdentClass::ContextPrimitive,
            5,
            &EncodeValue::Bytes(&addr.v4_subnet_mask.to_be_bytes()),
        )?;
    }
    Ok(())
}

fn build_header(
    enc: &mut BerStream,
    table: &PreencodedTable,
) -> EtsiliResult<HeaderTemplate> {
    let put = |enc: &mut BerStream, id: PreencodedId, table: &PreencodedTable| -> EtsiliResult<()> {
        enc.append_preencoded(table.chunk(id)?);
        Ok(())
    };

    enc.reset();
    put(enc, PreencodedId::USequence, table)?;
    put(enc, PreencodedId::CSequence1, table)?;
    put(enc, PreencodedId::PsDomainId, table)?;
    put(enc, PreencodedId::Liid, table)?;
    put(enc, PreencodedId::AuthCc, table)?;
    put(enc, PreencodedId::CSequence3, table)?;
    put(enc, PreencodedId::CSequence0, table)?;
    put(enc, PreencodedId::OperatorId, table)?;
    put(enc, PreencodedId::NetworkElemId, table)?;
    enc.endseq(1);

    let cin = enc.encode_next(
        tag::INTEGER,
        IdentClass::ContextPrimitive,
        1,
        &EncodeValue::int(0),
    )?;
    put(enc, PreencodedId::DelivCc, table)?;
    enc.endseq(1);

    let seqno = enc.encode_next(
        tag::INTEGER,
        IdentClass::ContextPrimitive,
        4,
        &EncodeValue::int(0),
    )?;

    if let Some(chunk) = table.get(PreencodedId::IntPointId) {
        enc.append_preencoded(chunk);
    }
    put(enc, PreencodedId::CSequence7, table)?;

    let sec = enc.encode_next(
        tag::INTEGER,
        IdentClass::ContextPrimitive,
        0,
        &EncodeValue::int(0),
    )?;
    let usec = enc.encode_next(
        tag::INTEGER,
        IdentClass::ContextPrimitive,
        1,
        &EncodeValue::int(0),
    )?;
    enc.endseq(1);

    put(enc, PreencodedId::TvClass, table)?;
    enc.endseq(1);
    let end = enc.len();

    Ok(HeaderTemplate {
        buf: enc.finish(),
        cin,
        seqno,
        sec,
        usec,
        end,
    })
}

/// Precompute the preencoded table and the header template for one
/// intercept.
pub fn init_top(enc: &mut BerStream, details: &InterceptDetails) -> EtsiliResult<EtsiliTop> {
    let preencoded = PreencodedTable::build(details)?;
    let header = build_header(enc, &preencoded)?;

    Ok(EtsiliTop {
        core: Arc::new(TopCore {
            preencoded,
            header,
            increment: enc.increment(),
        }),
        bodies: Default::default(),
    })
}

impl EtsiliTop {
    fn put(&self, enc: &mut BerStream, id: PreencodedId) -> EtsiliResult<()> {
        enc.append_preencoded(self.core.preencoded.chunk(id)?);
        Ok(())
    }

    /// Render the constant body skeleton for one record kind. Must be
    /// called before children of that kind are created.
    pub fn init_record(&mut self, enc: &mut BerStream, kind: RecordKind) -> EtsiliResult<()> {
        enc.reset();

        let (meta, data) = match kind {
            RecordKind::IpCc => {
                self.put(enc, PreencodedId::CSequence2)?;
                self.put(enc, PreencodedId::CSequence1)?;
                self.put(enc, PreencodedId::USequence)?;
                let meta = enc.len();
                self.put(enc, PreencodedId::DirFrom)?;
                self.put(enc, PreencodedId::CSequence2)?;
                self.put(enc, PreencodedId::CSequence2)?;
                self.put(enc, PreencodedId::IpCcOid)?;
                self.put(enc, PreencodedId::CSequence1)?;
                let data = enc.encode_next(
                    tag::IPPACKET,
                    IdentClass::ContextPrimitive,
                    0,
                    &EncodeValue::None,
                )?;
                enc.endseq(7);
                (meta, data)
            }

            RecordKind::IpMmCc => {
                self.put(enc, PreencodedId::CSequence2)?;
                self.put(enc, PreencodedId::CSequence1)?;
                self.put(enc, PreencodedId::USequence)?;
                let meta = enc.len();
                self.put(enc, PreencodedId::DirFrom)?;
                self.put(enc, PreencodedId::CSequence2)?;
                self.put(enc, PreencodedId::CSequence12)?;
                self.put(enc, PreencodedId::IpMmCcOid)?;
                let data = enc.encode_next(
                    tag::IPPACKET,
                    IdentClass::ContextPrimitive,
                    1,
                    &EncodeValue::None,
                )?;
                enc.encode_next(
                    tag::ENUM,
                    IdentClass::ContextPrimitive,
                    2,
                    &EncodeValue::Integer { value: 0, width: 4 },
                )?;
                enc.encode_next(
                    tag::ENUM,
                    IdentClass::ContextPrimitive,
                    4,
                    &EncodeValue::Integer { value: 0, width: 4 },
                )?;
                enc.endseq(6);
                (meta, data)
            }

            RecordKind::IpMmIri => {
                // Placeholder addresses; each emission may rewrite them.
                let placeholder = EtsiliIpAddress {
                    is_v6: false,
                    assignment: IpAssignment::Unknown,
                    v6_prefix_len: 0,
                    v4_subnet_mask: 0xffffffff,
                    rep: IpRep::Binary,
                    value: vec![0; 4],
                };

                self.put(enc, PreencodedId::CSequence2)?;
                self.put(enc, PreencodedId::CSequence0)?;
                self.put(enc, PreencodedId::USequence)?;
                let meta = enc.encode_next(
                    tag::ENUM,
                    IdentClass::ContextPrimitive,
                    0,
                    &EncodeValue::Integer { value: 0, width: 4 },
                )?;
                self.put(enc, PreencodedId::CSequence2)?;
                self.put(enc, PreencodedId::CSequence11)?;
                self.put(enc, PreencodedId::IpMmIriOid)?;
                self.put(enc, PreencodedId::CSequence1)?;
                self.put(enc, PreencodedId::CSequence1)?;
                self.put(enc, PreencodedId::CSequence0)?;
                stream_ipaddress(enc, &placeholder)?;
                enc.endseq(1);
                self.put(enc, PreencodedId::CSequence1)?;
                stream_ipaddress(enc, &placeholder)?;
                enc.endseq(1);
                let data = enc.encode_next(
                    tag::IPPACKET,
                    IdentClass::ContextPrimitive,
                    2,
                    &EncodeValue::None,
                )?;
                enc.endseq(8);
                (meta, data)
            }

            RecordKind::IpIri => {
                self.put(enc, PreencodedId::CSequence2)?;
                self.put(enc, PreencodedId::CSequence0)?;
                self.put(enc, PreencodedId::USequence)?;
                let meta = enc.encode_next(
                    tag::ENUM,
                    IdentClass::ContextPrimitive,
                    0,
                    &EncodeValue::Integer { value: 0, width: 4 },
                )?;
                self.put(enc, PreencodedId::CSequence2)?;
                self.put(enc, PreencodedId::CSequence2)?;
                self.put(enc, PreencodedId::IpIriOid)?;
                self.put(enc, PreencodedId::CSequence1)?;
                let data = enc.len();
                enc.endseq(7);
                (meta, data)
            }

            RecordKind::UmtsCc => {
                self.put(enc, PreencodedId::CSequence2)?;
                self.put(enc, PreencodedId::CSequence1)?;
                self.put(enc, PreencodedId::USequence)?;
                let meta = enc.len();
                self.put(enc, PreencodedId::DirFrom)?;
                self.put(enc, PreencodedId::CSequence2)?;
                let data = enc.encode_next(
                    tag::IPPACKET,
                    IdentClass::ContextPrimitive,
                    4,
                    &EncodeValue::None,
                )?;
                enc.endseq(5);
                (meta, data)
            }

            RecordKind::UmtsIri => {
                // The rest of a UMTS IRI body is rebuilt on every emission,
                // so the skeleton stops at the openers.
                self.put(enc, PreencodedId::CSequence2)?;
                self.put(enc, PreencodedId::CSequence0)?;
                self.put(enc, PreencodedId::USequence)?;
                let meta = enc.len();
                (meta, meta)
            }
        };

        self.bodies[kind.index()] = Some(BodyTemplate {
            buf: enc.finish(),
            meta,
            data,
            flist: Arc::new(ChildFreelist::new()),
        });
        Ok(())
    }

    /// Clone the header plus the requested body skeleton into a child,
    /// reusing one from the kind's free list when available.
    pub fn create_child(&self, kind: RecordKind) -> EtsiliResult<RecordChild> {
        let body = self.bodies[kind.index()].as_ref().ok_or_else(|| {
            EtsiliError::Misuse(format!(
                "record kind {:?} has not been initialised; call init_record first",
                kind
            ))
        })?;

        if let Some(child) = body.flist.take() {
            return Ok(child);
        }

        Ok(RecordChild::fresh(kind, &self.core, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etsili_asn1::primitives::MAX_LENGTH_OCTETS;

    fn details() -> InterceptDetails {
        InterceptDetails {
            liid: "AB".to_string(),
            authcc: "NZ".to_string(),
            delivcc: "NZ".to_string(),
            operatorid: "op".to_string(),
            networkelemid: "ne".to_string(),
            intpointid: None,
        }
    }

    #[test]
    fn test_header_slot_offsets() {
        let mut enc = BerStream::new(2048, 512);
        let top = init_top(&mut enc, &details()).unwrap();
        let h = &top.core.header;

        // Each mutable slot holds a maximum-width integer.
        let slot = MAX_LENGTH_OCTETS + 3;
        assert!(h.cin + slot <= h.seqno);
        assert!(h.seqno + slot <= h.sec);
        assert!(h.sec + slot == h.usec);
        assert!(h.usec + slot < h.end);
        assert_eq!(h.end, h.buf.len());

        // The slots carry the context identifiers 1, 4, 0, 1.
        assert_eq!(h.buf[h.cin], 0x81);
        assert_eq!(h.buf[h.seqno], 0x84);
        assert_eq!(h.buf[h.sec], 0x80);
        assert_eq!(h.buf[h.usec], 0x81);
    }

    #[test]
    fn test_create_child_requires_init() {
        let mut enc = BerStream::new(2048, 512);
        let top = init_top(&mut enc, &details()).unwrap();
        assert!(top.create_child(RecordKind::IpCc).is_err());
    }
}
