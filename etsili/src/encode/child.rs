//! Child records and their emission paths
//!
//! A child is one reusable record buffer: the cloned header template plus
//! one body skeleton. Emitting overwrites the header's mutable slots,
//! writes the direction or IRI type into the body's meta slot, appends the
//! variable payload at the data offset, and closes the open constructed
//! groups. Children recycle through a per-kind free list that may be
//! drained from another thread than the one emitting.

use std::sync::{Arc, Mutex};

use log::warn;

use etsili_asn1::primitives::{encode_integer_fixed, encode_item, EncodeValue, MAX_LENGTH_OCTETS};
use etsili_core::error::{EtsiliError, EtsiliResult};
use etsili_core::{tag, Direction, IdentClass, IriType, Timeval};

use super::preencode::PreencodedId;
use super::top::{BodyTemplate, RecordKind, TopCore};
use crate::params::{
    ipiri_field, umtsiri_field, EtsiliIpAddress, IpIriId, IpRep, IriParamValue, IriParams,
};

struct FreelistState {
    free: Vec<RecordChild>,
    marked: bool,
}

/// Free list of reusable child buffers for one record kind. One thread may
/// emit children while another releases them; the deletion mark lets the
/// owning body drain the list while children are still in flight.
pub(crate) struct ChildFreelist {
    inner: Mutex<FreelistState>,
}

impl ChildFreelist {
    pub(crate) fn new() -> Self {
        ChildFreelist {
            inner: Mutex::new(FreelistState {
                free: Vec::new(),
                marked: false,
            }),
        }
    }

    /// Pop a reusable child. Contention just means the caller builds a
    /// fresh one instead of waiting.
    pub(crate) fn take(&self) -> Option<RecordChild> {
        self.inner.try_lock().ok().and_then(|mut st| st.free.pop())
    }

    /// Queue a child for reuse; hands it back when the list has been
    /// marked for deletion so the caller drops it instead.
    pub(crate) fn put(&self, child: RecordChild) -> Option<RecordChild> {
        match self.inner.lock() {
            Ok(mut st) => {
                if st.marked {
                    Some(child)
                } else {
                    st.free.push(child);
                    None
                }
            }
            Err(_) => Some(child),
        }
    }

    pub(crate) fn mark_for_delete(&self) {
        if let Ok(mut st) = self.inner.lock() {
            st.marked = true;
            st.free.clear();
        }
    }
}

/// One reusable record buffer.
pub struct RecordChild {
    kind: RecordKind,
    buf: Vec<u8>,
    hdr_cin: usize,
    hdr_seqno: usize,
    hdr_sec: usize,
    hdr_usec: usize,
    meta: usize,
    data: usize,
    core: Arc<TopCore>,
    flist: Arc<ChildFreelist>,
}

const SLOT: usize = MAX_LENGTH_OCTETS + 3;

impl RecordChild {
    pub(crate) fn fresh(kind: RecordKind, core: &Arc<TopCore>, body: &BodyTemplate) -> Self {
        let header = &core.header;
        let mut buf = Vec::with_capacity(header.buf.len() + body.buf.len() + core.increment);
        buf.extend_from_slice(&header.buf);
        buf.extend_from_slice(&body.buf);

        RecordChild {
            kind,
            buf,
            hdr_cin: header.cin,
            hdr_seqno: header.seqno,
            hdr_sec: header.sec,
            hdr_usec: header.usec,
            meta: header.buf.len() + body.meta,
            data: header.buf.len() + body.data,
            core: Arc::clone(core),
            flist: Arc::clone(&body.flist),
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// The encoded record after an emit.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Return this child to its kind's free list for reuse. Dropping a
    /// child instead simply releases its buffer.
    pub fn release(self) {
        let flist = Arc::clone(&self.flist);
        // A returned Some means the owner is gone; let the child drop.
        drop(flist.put(self));
    }

    fn require_kind(&self, kind: RecordKind) -> EtsiliResult<()> {
        if self.kind != kind {
            return Err(EtsiliError::Misuse(format!(
                "child was created for {:?}, not {:?}",
                self.kind, kind
            )));
        }
        Ok(())
    }

    fn rewrite_slot(&mut self, off: usize, ident: u32, value: i64, width: usize) -> EtsiliResult<()> {
        encode_integer_fixed(
            IdentClass::ContextPrimitive,
            ident,
            value,
            width,
            &mut self.buf[off..off + SLOT],
        )?;
        Ok(())
    }

    fn update_header(&mut self, cin: i64, seqno: i64, tv: Timeval) -> EtsiliResult<()> {
        self.rewrite_slot(self.hdr_cin, 1, cin, 8)?;
        self.rewrite_slot(self.hdr_seqno, 4, seqno, 8)?;
        self.rewrite_slot(self.hdr_sec, 0, tv.sec, 8)?;
        self.rewrite_slot(self.hdr_usec, 1, tv.usec, 8)?;
        Ok(())
    }

    fn write_direction(&mut self, dir: Direction) -> EtsiliResult<()> {
        let chunk = self
            .core
            .preencoded
            .chunk(match dir {
                Direction::FromTarget => PreencodedId::DirFrom,
                Direction::ToTarget => PreencodedId::DirTo,
                Direction::Unknown => PreencodedId::DirUnknown,
            })?
            .clone();
        self.buf[self.meta..self.meta + chunk.len()].copy_from_slice(&chunk);
        Ok(())
    }

    fn write_iri_type(&mut self, iritype: IriType) -> EtsiliResult<()> {
        self.rewrite_slot(self.meta, 0, iritype as i64, 4)
    }

    /* ---- append helpers for the variable body section ---- */

    fn put_item(&mut self, encode_as: u8, ident: u32, value: &EncodeValue) -> EtsiliResult<()> {
        encode_item(
            &mut self.buf,
            encode_as,
            IdentClass::ContextPrimitive,
            ident,
            value,
        )?;
        Ok(())
    }

    fn put_seq(&mut self, ident: u32) -> EtsiliResult<()> {
        encode_item(
            &mut self.buf,
            tag::SEQUENCE,
            IdentClass::ContextConstruct,
            ident,
            &EncodeValue::None,
        )?;
        Ok(())
    }

    fn put_enum(&mut self, ident: u32, value: u32) -> EtsiliResult<()> {
        self.put_item(
            tag::ENUM,
            ident,
            &EncodeValue::Integer {
                value: value as i64,
                width: 4,
            },
        )
    }

    fn put_chunk(&mut self, id: PreencodedId) -> EtsiliResult<()> {
        let chunk = self.core.preencoded.chunk(id)?.clone();
        self.buf.extend_from_slice(&chunk);
        Ok(())
    }

    fn put_endseq(&mut self, depth: usize) {
        self.buf.resize(self.buf.len() + depth * 2, 0);
    }

    fn put_ipaddress(&mut self, addr: &EtsiliIpAddress) -> EtsiliResult<()> {
        self.put_enum(1, if addr.is_v6 { 1 } else { 0 })?;

        self.put_seq(2)?;
        match addr.rep {
            IpRep::Binary => self.put_item(tag::OCTETSTRING, 1, &EncodeValue::Bytes(&addr.value))?,
            IpRep::Text => self.put_item(tag::IA5, 2, &EncodeValue::Bytes(&addr.value))?,
        }
        self.put_endseq(1);

        self.put_enum(3, addr.assignment as u32)?;
        if addr.v6_prefix_len > 0 {
            self.put_item(
                tag::INTEGER,
                4,
                &EncodeValue::Integer {
                    value: addr.v6_prefix_len as i64,
                    width: 4,
                },
            )?;
        }
        if addr.v4_subnet_mask > 0 {
            let mask = addr.v4_subnet_mask.to_be_bytes();
            self.put_item(tag::OCTETSTRING, 5, &EncodeValue::Bytes(&mask))?;
        }
        Ok(())
    }

    /* ---- per-kind emission ---- */

    /// Emit an IP communication-content record.
    pub fn emit_ipcc(
        &mut self,
        cin: i64,
        seqno: i64,
        tv: Timeval,
        payload: &[u8],
        dir: Direction,
    ) -> EtsiliResult<()> {
        self.require_kind(RecordKind::IpCc)?;
        self.update_header(cin, seqno, tv)?;
        self.write_direction(dir)?;

        self.buf.truncate(self.data);
        self.put_item(tag::IPPACKET, 0, &EncodeValue::Bytes(payload))?;
        self.put_endseq(7);
        Ok(())
    }

    /// Emit an IP multimedia communication-content record.
    pub fn emit_ipmmcc(
        &mut self,
        cin: i64,
        seqno: i64,
        tv: Timeval,
        payload: &[u8],
        dir: Direction,
    ) -> EtsiliResult<()> {
        self.require_kind(RecordKind::IpMmCc)?;
        self.update_header(cin, seqno, tv)?;
        self.write_direction(dir)?;

        self.buf.truncate(self.data);
        self.put_item(tag::IPPACKET, 1, &EncodeValue::Bytes(payload))?;
        // frameType and mMCCprotocol ride along with fixed values.
        self.put_enum(2, 0)?;
        self.put_enum(4, 0)?;
        self.put_endseq(6);
        Ok(())
    }

    /// Emit an IP multimedia IRI record carrying a signalling packet.
    pub fn emit_ipmmiri(
        &mut self,
        cin: i64,
        seqno: i64,
        tv: Timeval,
        payload: &[u8],
        iritype: IriType,
    ) -> EtsiliResult<()> {
        self.require_kind(RecordKind::IpMmIri)?;
        self.update_header(cin, seqno, tv)?;
        self.write_iri_type(iritype)?;

        self.buf.truncate(self.data);
        self.put_item(tag::IPPACKET, 2, &EncodeValue::Bytes(payload))?;
        self.put_endseq(8);
        Ok(())
    }

    /// Emit a UMTS communication-content record.
    pub fn emit_umtscc(
        &mut self,
        cin: i64,
        seqno: i64,
        tv: Timeval,
        payload: &[u8],
        dir: Direction,
    ) -> EtsiliResult<()> {
        self.require_kind(RecordKind::UmtsCc)?;
        self.update_header(cin, seqno, tv)?;
        self.write_direction(dir)?;

        self.buf.truncate(self.data);
        self.put_item(tag::IPPACKET, 4, &EncodeValue::Bytes(payload))?;
        self.put_endseq(5);
        Ok(())
    }

    /// Emit an IP IRI record from a parameter map, fields in identifier
    /// order.
    pub fn emit_ipiri(
        &mut self,
        cin: i64,
        seqno: i64,
        tv: Timeval,
        params: &IriParams,
        iritype: IriType,
    ) -> EtsiliResult<()> {
        self.require_kind(RecordKind::IpIri)?;
        self.update_header(cin, seqno, tv)?;
        self.write_iri_type(iritype)?;

        self.buf.truncate(self.data);
        for (&field, value) in params {
            self.put_ipiri_field(field, value)?;
        }
        self.put_endseq(7);
        Ok(())
    }

    fn put_ipiri_field(&mut self, field: u8, value: &IriParamValue) -> EtsiliResult<()> {
        let ident = field as u32;
        match (field, value) {
            (
                ipiri_field::ACCESS_EVENT_TYPE
                | ipiri_field::INTERNET_ACCESS_TYPE
                | ipiri_field::IPVERSION
                | ipiri_field::ENDREASON
                | ipiri_field::AUTHENTICATION_TYPE,
                IriParamValue::Enum(v),
            ) => self.put_enum(ident, *v),

            (
                ipiri_field::TARGET_USERNAME | ipiri_field::RAW_AAA_DATA,
                IriParamValue::Bytes(b),
            ) => self.put_item(tag::OCTETSTRING, ident, &EncodeValue::Bytes(b)),

            (
                ipiri_field::TARGET_IPADDRESS
                | ipiri_field::POP_IPADDRESS
                | ipiri_field::ADDITIONAL_IPADDRESS,
                IriParamValue::IpAddress(addr),
            ) => {
                self.put_seq(ident)?;
                self.put_ipaddress(addr)?;
                self.put_endseq(1);
                Ok(())
            }

            (ipiri_field::POP_IDENTIFIER, IriParamValue::IriId(id)) => {
                self.put_seq(ident)?;
                match id {
                    IpIriId::Printable(s) => {
                        self.put_item(tag::UTF8STR, 0, &EncodeValue::Bytes(s.as_bytes()))?;
                    }
                    IpIriId::Mac(mac) => {
                        self.put_item(tag::OCTETSTRING, 1, &EncodeValue::Bytes(mac))?;
                    }
                    IpIriId::Ip(addr) => {
                        self.put_seq(2)?;
                        self.put_ipaddress(addr)?;
                        self.put_endseq(1);
                    }
                }
                self.put_endseq(1);
                Ok(())
            }

            (
                ipiri_field::POP_PORTNUMBER
                | ipiri_field::OCTETS_RECEIVED
                | ipiri_field::OCTETS_TRANSMITTED,
                IriParamValue::Int(v),
            ) => self.put_item(
                tag::INTEGER,
                ident,
                &EncodeValue::Integer {
                    value: *v,
                    width: 8,
                },
            ),

            (
                ipiri_field::STARTTIME | ipiri_field::ENDTIME | ipiri_field::EXPECTED_ENDTIME,
                IriParamValue::Time(tv),
            ) => self.put_item(tag::GENERALTIME, ident, &EncodeValue::Time(*tv)),

            (
                ipiri_field::TARGET_NETWORKID
                | ipiri_field::TARGET_CPEID
                | ipiri_field::TARGET_LOCATION
                | ipiri_field::CALLBACK_NUMBER
                | ipiri_field::POP_PHONENUMBER,
                IriParamValue::Str(s),
            ) => self.put_item(tag::UTF8STR, ident, &EncodeValue::Bytes(s.as_bytes())),

            (
                ipiri_field::NATIONAL_IPIRI_PARAMETERS | ipiri_field::OTHER_TARGET_IDENTIFIERS,
                _,
            ) => Ok(()),

            (field, _) => {
                warn!("skipping IP IRI field {} with mismatched value type", field);
                Ok(())
            }
        }
    }

    /// Emit a UMTS IRI record. Unlike the other kinds, the body is rebuilt
    /// from the parameter map on every emission; missing required fields
    /// are logged but do not abort the record.
    pub fn emit_umtsiri(
        &mut self,
        cin: i64,
        seqno: i64,
        tv: Timeval,
        params: &IriParams,
        iritype: IriType,
    ) -> EtsiliResult<()> {
        self.require_kind(RecordKind::UmtsIri)?;
        self.update_header(cin, seqno, tv)?;

        self.buf.truncate(self.meta);
        self.put_item(
            tag::ENUM,
            0,
            &EncodeValue::Integer {
                value: iritype as i64,
                width: 4,
            },
        )?;

        // timeStamp -- as generalized time
        let event_time = match params.get(&umtsiri_field::EVENT_TIME) {
            Some(IriParamValue::Time(t)) => Some(*t),
            _ => {
                warn!("no timestamp available for constructing a UMTS IRI; record may be invalid");
                None
            }
        };
        if let Some(t) = event_time {
            self.put_item(tag::GENERALTIME, 1, &EncodeValue::Time(t))?;
        }

        self.put_chunk(PreencodedId::CSequence2)?;
        self.put_chunk(PreencodedId::CSequence4)?;
        self.put_chunk(PreencodedId::CSequence0)?;

        /* IRI-Parameters start here */

        self.put_chunk(PreencodedId::UmtsIriOid)?;

        // LIID (1) -- the identifier matches the PSHeader one, so the
        // preencoded version serves here too.
        self.put_chunk(PreencodedId::Liid)?;

        // timeStamp again (3) -- different format, use UTCTime.
        self.put_chunk(PreencodedId::CSequence3)?;
        if let Some(t) = event_time {
            self.put_item(tag::UTCTIME, 1, &EncodeValue::Time(t))?;
        }
        self.put_endseq(1);

        // initiator (4)
        match params.get(&umtsiri_field::INITIATOR) {
            Some(IriParamValue::Enum(v)) => self.put_enum(4, *v)?,
            _ => warn!("no initiator available for constructing a UMTS IRI; record may be invalid"),
        }

        // location (8) -- nested
        self.put_chunk(PreencodedId::CSequence8)?;
        for (field, ident) in [
            (umtsiri_field::CGI, 2u32),
            (umtsiri_field::SAI, 7),
            (umtsiri_field::TAI, 9),
            (umtsiri_field::ECGI, 10),
        ] {
            if let Some(IriParamValue::Bytes(b)) = params.get(&field) {
                self.put_item(tag::OCTETSTRING, ident, &EncodeValue::Bytes(b))?;
            }
        }
        self.put_chunk(PreencodedId::CSequence13)?;
        self.put_chunk(PreencodedId::CSequence0)?;
        if let Some(IriParamValue::Time(t)) = params.get(&umtsiri_field::LOCATION_TIME) {
            self.put_item(tag::UTCTIME, 0, &EncodeValue::Time(*t))?;
        }
        self.put_endseq(3);

        // party information (9) -- nested
        self.put_chunk(PreencodedId::CSequence9)?;
        self.put_enum(0, 3)?; // gPRS-Target
        self.put_chunk(PreencodedId::CSequence1)?;
        for (field, ident, label) in [
            (umtsiri_field::IMEI, 1u32, "IMEI"),
            (umtsiri_field::IMSI, 3, "IMSI"),
            (umtsiri_field::MSISDN, 6, "MSISDN"),
        ] {
            match params.get(&field) {
                Some(IriParamValue::Bytes(b)) => {
                    self.put_item(tag::OCTETSTRING, ident, &EncodeValue::Bytes(b))?;
                }
                _ => warn!(
                    "no {} available for constructing a UMTS IRI; record may be invalid",
                    label
                ),
            }
        }
        self.put_endseq(1);

        // servicesDataInformation (pdpAddress, APN etc)
        self.put_chunk(PreencodedId::CSequence4)?;
        self.put_chunk(PreencodedId::CSequence1)?;
        match params.get(&umtsiri_field::PDP_ADDRESS) {
            Some(IriParamValue::IpAddress(addr)) => {
                self.put_chunk(PreencodedId::CSequence1)?; // pdp-address
                self.put_chunk(PreencodedId::CSequence1)?; // datanodeaddress
                self.put_ipaddress(addr)?;
                self.put_endseq(2);
            }
            _ => warn!("no PDP address available for constructing a UMTS IRI; record may be invalid"),
        }
        if let Some(IriParamValue::Bytes(b)) = params.get(&umtsiri_field::APNAME) {
            self.put_item(tag::OCTETSTRING, 2, &EncodeValue::Bytes(b))?;
        }
        if let Some(IriParamValue::Bytes(b)) = params.get(&umtsiri_field::PDPTYPE) {
            self.put_item(tag::OCTETSTRING, 3, &EncodeValue::Bytes(b))?;
        }
        self.put_endseq(3);

        // gprs correlation number (18)
        match params.get(&umtsiri_field::GPRS_CORRELATION) {
            Some(IriParamValue::Int(v)) => {
                let text = v.to_string();
                self.put_item(tag::OCTETSTRING, 18, &EncodeValue::Bytes(text.as_bytes()))?;
            }
            _ => warn!(
                "no GPRS correlation number available for constructing a UMTS IRI; record may be invalid"
            ),
        }

        // gprs event (20)
        match params.get(&umtsiri_field::EVENT_TYPE) {
            Some(IriParamValue::Enum(v)) => self.put_enum(20, *v)?,
            _ => warn!(
                "no GPRS event type available for constructing a UMTS IRI; record may be invalid"
            ),
        }

        // gprs operation error code (22) -- optional
        if let Some(IriParamValue::Bytes(b)) = params.get(&umtsiri_field::GPRS_ERROR_CODE) {
            self.put_item(tag::OCTETSTRING, 22, &EncodeValue::Bytes(b))?;
        }

        // IRI version (23)
        self.put_enum(23, 8)?;

        // networkIdentifier (26) -- nested
        self.put_chunk(PreencodedId::CSequence26)?;
        match params.get(&umtsiri_field::OPERATOR_IDENTIFIER) {
            Some(IriParamValue::Bytes(b)) => {
                self.put_item(tag::OCTETSTRING, 0, &EncodeValue::Bytes(b))?;
            }
            _ => warn!(
                "no operator identifier available for constructing a UMTS IRI; record may be invalid"
            ),
        }
        match params.get(&umtsiri_field::GGSN_IPADDRESS) {
            Some(IriParamValue::IpAddress(addr)) => {
                self.put_chunk(PreencodedId::CSequence1)?;
                self.put_chunk(PreencodedId::CSequence5)?;
                self.put_ipaddress(addr)?;
                self.put_endseq(2);
            }
            _ => warn!(
                "no network element identifier available for constructing a UMTS IRI; record may be invalid"
            ),
        }

        self.put_endseq(8);
        Ok(())
    }
}
