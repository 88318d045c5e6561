//! ETSI LI record builder
//!
//! Records share a large constant prefix (authorisation codes, operator
//! identifiers, OIDs, the constructed-group openers), so the builder
//! precomputes everything once per intercept and patches only the mutable
//! slots per record:
//!
//! * [`init_top`] renders the preencoded chunk table and the PSHeader
//!   template, remembering the offsets of the five rewritable integer
//!   slots (CIN, sequence number, seconds, microseconds, end of header);
//! * [`EtsiliTop::init_record`] renders the constant part of one record
//!   kind's body, remembering its direction/IRI-type slot and payload
//!   insertion point;
//! * [`EtsiliTop::create_child`] clones header + skeleton into a reusable
//!   child buffer (children recycle through a per-kind free list);
//! * the per-kind `emit_*` methods on [`RecordChild`] overwrite the mutable
//!   slots, append the variable payload, and close the open constructed
//!   groups.

mod child;
mod preencode;
mod top;

pub use child::RecordChild;
pub use preencode::{PreencodedId, PreencodedTable};
pub use top::{init_top, EtsiliTop, RecordKind};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ipiri_field, umtsiri_field, EtsiliIpAddress, IpAssignment, IriParamValue, IriParams};
    use crate::session::EtsiliSession;
    use etsili_asn1::BerStream;
    use etsili_core::{Direction, InterceptDetails, IriType, Timeval};

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

    fn top_with(kinds: &[RecordKind]) -> EtsiliTop {
        let mut enc = BerStream::new(2048, 512);
        let mut top = init_top(&mut enc, &details()).unwrap();
        for &kind in kinds {
            top.init_record(&mut enc, kind).unwrap();
        }
        top
    }

    #[test]
    fn test_ipcc_emit_parses_back() {
        let top = top_with(&[RecordKind::IpCc]);
        let mut child = top.create_child(RecordKind::IpCc).unwrap();
        child
            .emit_ipcc(
                7,
                42,
                Timeval::new(1234567890, 500000),
                &[0xde, 0xad, 0xbe, 0xef],
                Direction::ToTarget,
            )
            .unwrap();

        let mut session = EtsiliSession::new();
        session.attach_owned(child.bytes().to_vec());

        assert_eq!(session.liid().unwrap(), "AB");
        assert_eq!(session.cin().unwrap(), 7);
        assert_eq!(session.sequence_number().unwrap(), 42);
        assert_eq!(
            session.header_timestamp().unwrap(),
            Timeval::new(1234567890, 500000)
        );
        assert!(!session.is_keepalive().unwrap());

        let cc = session.cc_contents().unwrap().expect("CC present");
        assert_eq!(cc.name, "iPPackets");
        assert_eq!(cc.bytes, [0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_consecutive_emits_differ_only_in_mutable_slots() {
        let top = top_with(&[RecordKind::IpCc]);
        let mut child = top.create_child(RecordKind::IpCc).unwrap();

        child
            .emit_ipcc(7, 42, Timeval::new(100, 1), &[0x01; 4], Direction::ToTarget)
            .unwrap();
        let first = child.bytes().to_vec();
        child
            .emit_ipcc(8, 43, Timeval::new(200, 2), &[0x02; 4], Direction::ToTarget)
            .unwrap();
        let second = child.bytes().to_vec();

        assert_eq!(first.len(), second.len());

        let h = &top.core.header;
        let slot = 11;
        let mutable = [
            (h.cin, h.cin + slot),
            (h.seqno, h.seqno + slot),
            (h.sec, h.sec + slot),
            (h.usec, h.usec + slot),
        ];
        for (i, (a, b)) in first.iter().zip(second.iter()).enumerate() {
            let in_mutable = mutable.iter().any(|&(s, e)| i >= s && i < e);
            let in_payload = i >= first.len() - (4 + 14 + 2);
            if !in_mutable && !in_payload {
                assert_eq!(a, b, "unexpected difference at offset {}", i);
            }
        }
    }

    #[test]
    fn test_child_recycles_through_freelist() {
        let top = top_with(&[RecordKind::IpCc]);
        let child = top.create_child(RecordKind::IpCc).unwrap();
        let len = child.bytes().len();
        child.release();

        // Reused, not rebuilt: same skeleton bytes come back.
        let again = top.create_child(RecordKind::IpCc).unwrap();
        assert_eq!(again.bytes().len(), len);
    }

    #[test]
    fn test_release_after_top_drop_frees_child() {
        let top = top_with(&[RecordKind::IpCc]);
        let child = top.create_child(RecordKind::IpCc).unwrap();
        drop(top);
        // The freelist is marked; release simply frees the buffer.
        child.release();
    }

    #[test]
    fn test_ipiri_emit_fields_render() {
        let top = top_with(&[RecordKind::IpIri]);
        let mut child = top.create_child(RecordKind::IpIri).unwrap();

        let mut params = IriParams::new();
        params.insert(
            ipiri_field::ACCESS_EVENT_TYPE,
            IriParamValue::Enum(4), // sessionStart
        );
        params.insert(
            ipiri_field::TARGET_USERNAME,
            IriParamValue::Bytes(b"alice".to_vec()),
        );
        params.insert(
            ipiri_field::TARGET_IPADDRESS,
            IriParamValue::IpAddress(EtsiliIpAddress::binary_v4(
                [192, 0, 2, 1],
                IpAssignment::Dynamic,
            )),
        );
        params.insert(ipiri_field::POP_PORTNUMBER, IriParamValue::Int(1812));

        child
            .emit_ipiri(1, 2, Timeval::new(1234567890, 0), &params, IriType::Begin)
            .unwrap();

        let mut session = EtsiliSession::new();
        session.attach_owned(child.bytes().to_vec());

        let mut fields = Vec::new();
        let mut space = String::new();
        while session.next_field_str(&mut space, 2048).unwrap().is_some() {
            fields.push(space.clone());
        }

        assert!(fields.iter().any(|f| f == "iRIType: IRI-Begin"));
        assert!(fields.iter().any(|f| f == "accessEventType: sessionStart"));
        assert!(fields.iter().any(|f| f == "targetUsername: alice"));
        assert!(fields.iter().any(|f| f == "iPBinaryAddress: 192.0.2.1"));
        assert!(fields.iter().any(|f| f == "pOPPortNumber: 1812"));
    }

    #[test]
    fn test_umtsiri_emit_parses_back() {
        let top = top_with(&[RecordKind::UmtsIri]);
        let mut child = top.create_child(RecordKind::UmtsIri).unwrap();

        let mut params = IriParams::new();
        params.insert(
            umtsiri_field::EVENT_TIME,
            IriParamValue::Time(Timeval::new(1234567890, 0)),
        );
        params.insert(umtsiri_field::INITIATOR, IriParamValue::Enum(1));
        params.insert(
            umtsiri_field::IMEI,
            IriParamValue::Bytes(vec![0x21, 0x43, 0x65, 0x87]),
        );
        params.insert(
            umtsiri_field::IMSI,
            IriParamValue::Bytes(vec![0x21, 0x43, 0xf5]),
        );
        params.insert(
            umtsiri_field::MSISDN,
            IriParamValue::Bytes(vec![0x46, 0x02]),
        );
        params.insert(
            umtsiri_field::PDP_ADDRESS,
            IriParamValue::IpAddress(EtsiliIpAddress::binary_v4(
                [10, 0, 0, 1],
                IpAssignment::Static,
            )),
        );
        params.insert(umtsiri_field::GPRS_CORRELATION, IriParamValue::Int(9001));
        params.insert(
            umtsiri_field::EVENT_TYPE,
            IriParamValue::Enum(crate::params::umts_event::PDPCONTEXT_ACTIVATION),
        );
        params.insert(
            umtsiri_field::OPERATOR_IDENTIFIER,
            IriParamValue::Bytes(b"op".to_vec()),
        );
        params.insert(
            umtsiri_field::GGSN_IPADDRESS,
            IriParamValue::IpAddress(EtsiliIpAddress::binary_v4(
                [10, 0, 0, 2],
                IpAssignment::Static,
            )),
        );

        child
            .emit_umtsiri(5, 6, Timeval::new(1234567890, 0), &params, IriType::Report)
            .unwrap();

        let mut session = EtsiliSession::new();
        session.attach_owned(child.bytes().to_vec());

        assert_eq!(session.cin().unwrap(), 5);
        assert_eq!(session.sequence_number().unwrap(), 6);

        let mut fields = Vec::new();
        let mut space = String::new();
        while session.next_field_str(&mut space, 4096).unwrap().is_some() {
            fields.push(space.clone());
        }

        assert!(fields.iter().any(|f| f == "iRIType: IRI-Report"));
        assert!(fields.iter().any(|f| f == "initiator: originating-Target"));
        assert!(fields.iter().any(|f| f == "imei: 12345678"));
        assert!(fields.iter().any(|f| f == "gPRSevent: pDPContextActivation"));
        assert!(fields.iter().any(|f| f == "gPRSCorrelationNumber: 9001"));
        assert!(fields.iter().any(|f| f == "iRIversion: lastVersion"));
    }

    #[test]
    fn test_umtscc_and_ipmmcc_emit() {
        let top = top_with(&[RecordKind::UmtsCc, RecordKind::IpMmCc, RecordKind::IpMmIri]);

        let mut child = top.create_child(RecordKind::UmtsCc).unwrap();
        child
            .emit_umtscc(1, 2, Timeval::new(10, 0), &[0xaa, 0xbb], Direction::FromTarget)
            .unwrap();
        let mut session = EtsiliSession::new();
        session.attach_owned(child.bytes().to_vec());
        let cc = session.cc_contents().unwrap().expect("CC present");
        assert_eq!(cc.name, "uMTSCC");
        assert_eq!(cc.bytes, [0xaa, 0xbb]);

        let mut child = top.create_child(RecordKind::IpMmCc).unwrap();
        child
            .emit_ipmmcc(1, 2, Timeval::new(10, 0), &[0xcc], Direction::Unknown)
            .unwrap();
        session.attach_owned(child.bytes().to_vec());
        let cc = session.cc_contents().unwrap().expect("CC present");
        assert_eq!(cc.name, "mMCCContents");
        assert_eq!(cc.bytes, [0xcc]);

        let mut child = top.create_child(RecordKind::IpMmIri).unwrap();
        child
            .emit_ipmmiri(1, 2, Timeval::new(10, 0), &[0x45, 0x00], IriType::Continue)
            .unwrap();
        session.attach_owned(child.bytes().to_vec());
        let iri = session.iri_contents().unwrap().expect("IRI present");
        assert_eq!(iri.name, "originalIPMMMessage");
        assert_eq!(iri.bytes, [0x45, 0x00]);
    }

    #[test]
    fn test_emit_on_wrong_kind_is_misuse() {
        let top = top_with(&[RecordKind::IpCc]);
        let mut child = top.create_child(RecordKind::IpCc).unwrap();
        assert!(child
            .emit_umtscc(1, 2, Timeval::new(0, 0), &[], Direction::Unknown)
            .is_err());
    }
}
