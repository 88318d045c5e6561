//! Preencoded static field table
//!
//! Every chunk here is constant for the lifetime of one intercept: the
//! constructed-group openers, the payload OIDs, the three direction enums,
//! and the caller's identifiers from [`InterceptDetails`]. Emission replays
//! these byte runs instead of re-encoding them per record.

use bytes::Bytes;
use etsili_asn1::{encode_chunk, EncodeValue};
use etsili_core::error::{EtsiliError, EtsiliResult};
use etsili_core::{tag, IdentClass, InterceptDetails};
use etsili_schema::oids;

/// Index into the preencoded table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum PreencodedId {
    USequence = 0,
    CSequence0,
    CSequence1,
    CSequence2,
    CSequence3,
    CSequence4,
    CSequence5,
    /// Microsecond timestamp group.
    CSequence7,
    CSequence8,
    CSequence9,
    /// IPMMIRI group.
    CSequence11,
    /// IPMMCC group.
    CSequence12,
    CSequence13,
    CSequence26,
    PsDomainId,
    Liid,
    AuthCc,
    OperatorId,
    NetworkElemId,
    DelivCc,
    IntPointId,
    TvClass,
    IpMmIriOid,
    IpCcOid,
    IpIriOid,
    UmtsIriOid,
    IpMmCcOid,
    DirFrom,
    DirTo,
    DirUnknown,
}

const PREENCODE_COUNT: usize = PreencodedId::DirUnknown as usize + 1;

/// The per-intercept table of constant BER chunks.
pub struct PreencodedTable {
    chunks: Vec<Option<Bytes>>,
    liid_len: usize,
}

fn cseq(ident: u32) -> EtsiliResult<Bytes> {
    encode_chunk(
        tag::SEQUENCE,
        IdentClass::ContextConstruct,
        ident,
        &EncodeValue::None,
    )
}

fn cprim(encode_as: u8, ident: u32, bytes: &[u8]) -> EtsiliResult<Bytes> {
    encode_chunk(
        encode_as,
        IdentClass::ContextPrimitive,
        ident,
        &EncodeValue::Bytes(bytes),
    )
}

fn cenum(ident: u32, value: u32) -> EtsiliResult<Bytes> {
    encode_chunk(
        tag::ENUM,
        IdentClass::ContextPrimitive,
        ident,
        &EncodeValue::Integer {
            value: value as i64,
            width: 4,
        },
    )
}

impl PreencodedTable {
    /// Render every static chunk for one intercept.
    pub fn build(details: &InterceptDetails) -> EtsiliResult<Self> {
        let mut chunks: Vec<Option<Bytes>> = vec![None; PREENCODE_COUNT];
        let mut put = |id: PreencodedId, chunk: Bytes| {
            chunks[id as usize] = Some(chunk);
        };

        put(
            PreencodedId::USequence,
            encode_chunk(
                tag::SEQUENCE,
                IdentClass::UniversalConstruct,
                tag::SEQUENCE as u32,
                &EncodeValue::None,
            )?,
        );
        for (id, ident) in [
            (PreencodedId::CSequence0, 0u32),
            (PreencodedId::CSequence1, 1),
            (PreencodedId::CSequence2, 2),
            (PreencodedId::CSequence3, 3),
            (PreencodedId::CSequence4, 4),
            (PreencodedId::CSequence5, 5),
            (PreencodedId::CSequence7, 7),
            (PreencodedId::CSequence8, 8),
            (PreencodedId::CSequence9, 9),
            (PreencodedId::CSequence11, 11),
            (PreencodedId::CSequence12, 12),
            (PreencodedId::CSequence13, 13),
            (PreencodedId::CSequence26, 26),
        ] {
            put(id, cseq(ident)?);
        }

        put(
            PreencodedId::PsDomainId,
            cprim(tag::OID, 0, &oids::LI_PS_DOMAIN_ID)?,
        );
        put(
            PreencodedId::Liid,
            cprim(tag::OCTETSTRING, 1, details.liid.as_bytes())?,
        );
        put(
            PreencodedId::AuthCc,
            cprim(tag::OCTETSTRING, 2, details.authcc.as_bytes())?,
        );
        put(
            PreencodedId::OperatorId,
            cprim(tag::OCTETSTRING, 0, details.operatorid.as_bytes())?,
        );
        put(
            PreencodedId::NetworkElemId,
            cprim(tag::OCTETSTRING, 1, details.networkelemid.as_bytes())?,
        );
        put(
            PreencodedId::DelivCc,
            cprim(tag::OCTETSTRING, 2, details.delivcc.as_bytes())?,
        );
        if let Some(intpointid) = &details.intpointid {
            put(
                PreencodedId::IntPointId,
                cprim(tag::OCTETSTRING, 6, intpointid.as_bytes())?,
            );
        }
        put(PreencodedId::TvClass, cenum(8, 1)?);

        put(
            PreencodedId::IpMmIriOid,
            cprim(tag::RELATIVEOID, 0, &oids::IPMMIRI_OID)?,
        );
        put(
            PreencodedId::IpCcOid,
            cprim(tag::RELATIVEOID, 0, &oids::IPCC_OID)?,
        );
        put(
            PreencodedId::IpIriOid,
            cprim(tag::RELATIVEOID, 0, &oids::IPIRI_OID)?,
        );
        put(
            PreencodedId::UmtsIriOid,
            cprim(tag::OID, 0, &oids::UMTSIRI_OID)?,
        );
        put(
            PreencodedId::IpMmCcOid,
            cprim(tag::RELATIVEOID, 0, &oids::IPMMCC_OID)?,
        );

        put(PreencodedId::DirFrom, cenum(0, 0)?);
        put(PreencodedId::DirTo, cenum(0, 1)?);
        put(PreencodedId::DirUnknown, cenum(0, 2)?);

        Ok(PreencodedTable {
            chunks,
            liid_len: details.liid.len(),
        })
    }

    /// The chunk for `id`; errors only for the optional interception-point
    /// identifier when the intercept has none.
    pub fn chunk(&self, id: PreencodedId) -> EtsiliResult<&Bytes> {
        self.chunks[id as usize]
            .as_ref()
            .ok_or_else(|| EtsiliError::Misuse(format!("preencoded chunk {:?} was not built", id)))
    }

    pub fn get(&self, id: PreencodedId) -> Option<&Bytes> {
        self.chunks[id as usize].as_ref()
    }

    pub fn liid_len(&self) -> usize {
        self.liid_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_sequence_openers() {
        let table = PreencodedTable::build(&details()).unwrap();
        assert_eq!(
            table.chunk(PreencodedId::USequence).unwrap().as_ref(),
            &[0x30, 0x80]
        );
        assert_eq!(
            table.chunk(PreencodedId::CSequence7).unwrap().as_ref(),
            &[0xa7, 0x80]
        );
    }

    #[test]
    fn test_liid_chunk() {
        let table = PreencodedTable::build(&details()).unwrap();
        assert_eq!(
            table.chunk(PreencodedId::Liid).unwrap().as_ref(),
            &[0x81, 0x02, b'A', b'B']
        );
        assert_eq!(table.liid_len(), 2);
    }

    #[test]
    fn test_psdomainid_fuses_first_octet() {
        let table = PreencodedTable::build(&details()).unwrap();
        assert_eq!(
            table.chunk(PreencodedId::PsDomainId).unwrap().as_ref(),
            &[0x80, 0x07, 0x04, 0x00, 0x02, 0x02, 0x05, 0x01, 0x11]
        );
    }

    #[test]
    fn test_optional_intpointid() {
        let table = PreencodedTable::build(&details()).unwrap();
        assert!(table.get(PreencodedId::IntPointId).is_none());

        let mut d = details();
        d.intpointid = Some("ip1".to_string());
        let table = PreencodedTable::build(&d).unwrap();
        assert!(table.get(PreencodedId::IntPointId).is_some());
    }

    #[test]
    fn test_direction_chunks_differ_only_in_value() {
        let table = PreencodedTable::build(&details()).unwrap();
        let from = table.chunk(PreencodedId::DirFrom).unwrap();
        let to = table.chunk(PreencodedId::DirTo).unwrap();
        assert_eq!(from.len(), to.len());
        assert_eq!(from[..from.len() - 1], to[..to.len() - 1]);
        assert_eq!(from[from.len() - 1], 0);
        assert_eq!(to[to.len() - 1], 1);
    }
}
