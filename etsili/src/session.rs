//! Session decoder for ETSI LI PDUs
//!
//! An [`EtsiliSession`] owns the schema tree, the decoder over the
//! attached PDU buffer, the schema-context stack for the dump walk, and
//! the decryption state for encryption containers. Attach a buffer, then
//! either iterate rendered fields with [`EtsiliSession::next_field_str`]
//! or pull individual values with the accessor methods.

use log::warn;

use etsili_asn1::schema::{ElementTree, NodeId, NOACTION};
use etsili_asn1::{Decoder, FoundSet, SearchTarget};
use etsili_core::error::{EtsiliError, EtsiliResult};
use etsili_core::{tag, IdentClass, Timeval};
use etsili_schema::{enum_label, etsi_schema, EtsiNode};
use etsili_security as security;

use crate::{identity, location, render};

/// Key source of last resort when no key has been set programmatically.
const DECRYPTION_KEY_ENV: &str = "LIBWANDDER_ETSILI_DECRYPTION_KEY";

/// How many schema-context frames are added to the walk stack at a time.
const STACK_GROW: usize = 10;

/// Classification of a CC payload's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CcFormat {
    #[default]
    Unknown,
    Ip,
    Application,
    Udp,
    Rtp,
    Tcp,
}

/// What kind of content an IRI record carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IriContentKind {
    Ip,
    Sip,
}

/// Extracted CC payload content.
#[derive(Debug, Clone)]
pub struct CcContent {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Extracted IRI payload content.
#[derive(Debug, Clone)]
pub struct IriContent {
    pub name: String,
    pub kind: IriContentKind,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: Option<NodeId>,
    at_level: u32,
}

/// Explicit stack of schema contexts for the dump walk. Frame index equals
/// nesting level; popping just moves the cursor so the frames above stay
/// allocated.
#[derive(Debug)]
struct WalkStack {
    frames: Vec<Frame>,
    current: usize,
}

impl WalkStack {
    fn new(root: NodeId) -> Self {
        let mut frames = Vec::with_capacity(STACK_GROW);
        frames.push(Frame {
            node: Some(root),
            at_level: 0,
        });
        WalkStack { frames, current: 0 }
    }

    fn push(&mut self, node: Option<NodeId>) {
        self.current += 1;
        if self.current == self.frames.len() {
            if self.frames.len() == self.frames.capacity() {
                self.frames.reserve(STACK_GROW);
            }
            self.frames.push(Frame { node, at_level: 0 });
        } else {
            self.frames[self.current] = Frame { node, at_level: 0 };
        }
    }

    fn pop_to(&mut self, level: usize) {
        while self.current > level {
            self.current -= 1;
        }
    }

    fn node(&self) -> Option<NodeId> {
        self.frames[self.current].node
    }

    fn at_level(&self) -> u32 {
        self.frames[self.current].at_level
    }

    fn bump(&mut self) {
        self.frames[self.current].at_level += 1;
    }
}

struct DecryptWalk<'a> {
    // Always backed by an owned plaintext buffer; typed with the session
    // lifetime so it can share the main decoder's code paths.
    dec: Decoder<'a>,
    stack: WalkStack,
}

struct SavedPayload {
    name: &'static str,
    bytes: Vec<u8>,
}

enum Step {
    Emitted,
    Finished,
    Again,
}

/// Decoder session for one stream of ETSI LI PDUs.
pub struct EtsiliSession<'a> {
    schema: ElementTree,
    dec: Option<Decoder<'a>>,
    stack: Option<WalkStack>,
    ccformat: CcFormat,
    decryption_key: Option<String>,
    encrypt_method: i64,
    decrypt: Option<Box<DecryptWalk<'a>>>,
    saved_payload: Option<SavedPayload>,
}

impl<'a> Default for EtsiliSession<'a> {
    fn default() -> Self {
        Self::new()
    }
}

fn quick(dec: &mut Decoder) -> EtsiliResult<u32> {
    if dec.decode_next()?.is_none() {
        return Err(EtsiliError::InvalidData(
            "unexpected end of PDU".to_string(),
        ));
    }
    Ok(dec.identifier().unwrap_or(0))
}

/// Walk to the sequence number at the PSHeader level, skipping constructed
/// siblings whole. Returns -1 when the buffer has no sequence number where
/// one is expected.
fn decode_sequence_number(dec: &mut Decoder) -> i64 {
    dec.reset();
    let run = |dec: &mut Decoder| -> EtsiliResult<i64> {
        quick(dec)?;
        if quick(dec)? != 1 {
            return Ok(-1);
        }
        loop {
            let ident = quick(dec)?;
            if dec.class().is_constructed() {
                dec.decode_skip()?;
            }
            if ident >= 4 {
                if ident != 4 {
                    return Ok(-1);
                }
                return dec.integer_value();
            }
        }
    };
    run(dec).unwrap_or(-1)
}

fn write_capped(out: &mut String, cap: usize, s: &str) {
    out.clear();
    if s.len() <= cap {
        out.push_str(s);
        return;
    }
    let mut end = cap;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    out.push_str(&s[..end]);
}

impl<'a> EtsiliSession<'a> {
    pub fn new() -> Self {
        EtsiliSession {
            schema: etsi_schema(),
            dec: None,
            stack: None,
            ccformat: CcFormat::Unknown,
            decryption_key: None,
            encrypt_method: security::ENCRYPTION_NOT_STATED,
            decrypt: None,
            saved_payload: None,
        }
    }

    /// Bind a PDU buffer, borrowed in place or copied.
    pub fn attach(&mut self, source: &'a [u8], copy: bool) {
        if copy {
            self.attach_owned(source.to_vec());
            return;
        }
        match self.dec.as_mut() {
            Some(dec) => dec.reattach(std::borrow::Cow::Borrowed(source)),
            None => self.dec = Some(Decoder::new(source)),
        }
        self.clear_pdu_state();
    }

    /// Bind a PDU buffer the session owns outright.
    pub fn attach_owned(&mut self, source: Vec<u8>) {
        match self.dec.as_mut() {
            Some(dec) => dec.reattach(std::borrow::Cow::Owned(source)),
            None => self.dec = Some(Decoder::new_owned(source)),
        }
        self.clear_pdu_state();
    }

    fn clear_pdu_state(&mut self) {
        self.stack = None;
        self.ccformat = CcFormat::Unknown;
        self.encrypt_method = security::ENCRYPTION_NOT_STATED;
        self.decrypt = None;
        self.saved_payload = None;
    }

    /// Provide the decryption key for encrypted containers, as hex text.
    pub fn set_decryption_key(&mut self, key: &str) {
        self.decryption_key = Some(key.to_string());
    }

    pub fn cc_format(&self) -> CcFormat {
        self.ccformat
    }

    /// The decoder over the attached buffer.
    pub fn base_decoder(&mut self) -> EtsiliResult<&mut Decoder<'a>> {
        self.dec.as_mut().ok_or_else(|| {
            EtsiliError::Misuse("no buffer attached to this decoder; call attach() first".to_string())
        })
    }

    /* ---------------- field-by-field dump walk ---------------- */

    /// Render the next field of the PDU into `out` (at most `cap` bytes) as
    /// `name: value`. Returns `Ok(None)` once the PDU is exhausted.
    /// Encrypted containers are decrypted transparently when a key is
    /// available; their fields follow in stream order.
    pub fn next_field_str(
        &mut self,
        out: &mut String,
        cap: usize,
    ) -> EtsiliResult<Option<()>> {
        loop {
            if self.dec.is_none() {
                return Err(EtsiliError::Misuse(
                    "no buffer attached to this decoder; call attach() first".to_string(),
                ));
            }

            if let Some(mut dw) = self.decrypt.take() {
                let step = self.decode_field(&mut dw.dec, &mut dw.stack, true, out, cap)?;
                match step {
                    Step::Emitted => {
                        self.decrypt = Some(dw);
                        return Ok(Some(()));
                    }
                    // Ran out of decrypted content; resume the outer walk.
                    Step::Finished => continue,
                    Step::Again => {
                        self.decrypt = Some(dw);
                        continue;
                    }
                }
            }

            if self.stack.is_none() {
                self.stack = Some(WalkStack::new(EtsiNode::Root.into()));
            }
            let mut dec = self.dec.take().expect("checked above");
            let mut stack = self.stack.take().expect("just ensured");
            let step = self.decode_field(&mut dec, &mut stack, false, out, cap);
            self.dec = Some(dec);
            self.stack = Some(stack);

            match step? {
                Step::Emitted => return Ok(Some(())),
                Step::Finished => return Ok(None),
                Step::Again => continue,
            }
        }
    }

    fn decode_field(
        &mut self,
        dec: &mut Decoder,
        stack: &mut WalkStack,
        is_decrypt: bool,
        out: &mut String,
        cap: usize,
    ) -> EtsiliResult<Step> {
        if dec.decode_next()?.is_none() {
            return Ok(Step::Finished);
        }

        // End-of-contents markers close indefinite regions; they are not
        // fields.
        if let Some(item) = dec.current_item() {
            if item.length == 0
                && item.identifier == 0
                && item.class == IdentClass::UniversalPrimitive
            {
                return Ok(Step::Again);
            }
        }

        if let Some(level) = dec.level() {
            stack.pop_to(level as usize);
        }
        let Some(node) = stack.node() else {
            return Ok(Step::Finished);
        };
        let etsi_node = EtsiNode::from_id(node);

        match dec.class() {
            IdentClass::ContextPrimitive => {
                let ident = dec.identifier().unwrap_or(0);
                stack.bump();
                let member = self
                    .schema
                    .member(node, ident)
                    .copied()
                    .unwrap_or(NOACTION);

                if etsi_node == Some(EtsiNode::EmailCc) && ident == 1 {
                    if let Ok(v) = dec.integer_value() {
                        if (0..=255).contains(&v) {
                            self.ccformat = email_format_of(v);
                        }
                    }
                }

                let item = dec.current_item().expect("decode_next advanced");
                let content = item.content(dec.source());

                let valstr = match member.interpret {
                    tag::IPPACKET => {
                        if is_decrypt {
                            // Cache the decrypted packet content for the
                            // contents accessors.
                            if self.ccformat == CcFormat::Unknown {
                                self.ccformat = CcFormat::Ip;
                            }
                            self.saved_payload = Some(SavedPayload {
                                name: member.name,
                                bytes: content.to_vec(),
                            });
                        }
                        // Plain IP CCs end the walk here; everything else
                        // keeps going for trailing optional fields.
                        return match member.name {
                            "iPPackets" | "uMTSCC" | "content" => Ok(Step::Finished),
                            _ => Ok(Step::Again),
                        };
                    }
                    tag::BINARY_IP => render::render_binary_ip(content)?,
                    tag::ENUM => {
                        let v = dec.integer_value()?;
                        if etsi_node == Some(EtsiNode::EncryptionContainer) && ident == 0 {
                            // Remembered so the upcoming payload can be
                            // decrypted.
                            self.encrypt_method = v;
                        }
                        match etsi_node.and_then(|n| enum_label(n, ident, v)) {
                            Some(name) => name.to_string(),
                            None => {
                                return Err(EtsiliError::Schema(format!(
                                    "no label for enum field [{}] value {}",
                                    ident, v
                                )))
                            }
                        }
                    }
                    tag::THREEG_IMEI => identity::render_bcd_digits(content, cap)?,
                    tag::THREEG_SM_CAUSE => identity::render_sm_cause(content)?,
                    tag::DOMAIN_NAME => identity::render_domain_name(content, cap)?,
                    tag::HEX_BYTES => identity::render_hex_bytes(content, cap)?,
                    tag::TAI => location::render_tai(content, cap)?,
                    tag::ECGI => location::render_ecgi(content, cap)?,
                    tag::CGI => location::render_cgi(content, cap)?,
                    tag::SAI => location::render_sai(content, cap)?,
                    tag::LAI => location::render_lai(content, cap)?,
                    tag::MACRO_ENODEB_ID => location::render_macro_enodeb(content, cap)?,
                    tag::ULI => location::render_uli(content, cap)?,
                    tag::EPS_APN_AMBR => identity::render_eps_ambr(content)?,
                    tag::EPS_CAUSE => identity::render_eps_cause(content)?,
                    tag::EPS_PDN_TYPE => identity::render_eps_pdn_type(content)?,
                    tag::EPS_ATTACH_TYPE => identity::render_eps_attach_type(content)?,
                    tag::EPS_RAT_TYPE => identity::render_eps_rat_type(content)?,
                    tag::ENCRYPTED => {
                        if is_decrypt {
                            return Err(EtsiliError::Decryption(
                                "nested encryption containers are not supported".to_string(),
                            ));
                        }
                        let seqno = sequence_number_of(dec.source());
                        let cipher = content.to_vec();
                        match self.decrypt_payload_item(&cipher, seqno)? {
                            // Decryption succeeded; carry on inside it.
                            None => return Ok(Step::Again),
                            // Fell back to a hex dump of the ciphertext.
                            Some(hex) => hex,
                        }
                    }
                    _ => render::render_base(&item, dec.source(), member.interpret, cap)?,
                };

                write_capped(out, cap, &format!("{}: {}", member.name, valstr));
                Ok(Step::Emitted)
            }

            IdentClass::UniversalPrimitive => {
                let pos = stack.at_level();
                stack.bump();
                let member = self.schema.member(node, pos).copied().unwrap_or(NOACTION);
                let item = dec.current_item().expect("decode_next advanced");
                let valstr = render::render_base(&item, dec.source(), tag::NULL, cap)?;
                write_capped(out, cap, &format!("{}: {}", member.name, valstr));
                Ok(Step::Emitted)
            }

            IdentClass::UniversalConstruct => {
                let seq = self.schema.node(node).sequence;
                stack.bump();
                write_capped(out, cap, &format!("{}:", seq.name));
                stack.push(seq.descend);
                Ok(Step::Emitted)
            }

            IdentClass::ContextConstruct => {
                let ident = dec.identifier().unwrap_or(0);
                let member = self
                    .schema
                    .member(node, ident)
                    .copied()
                    .unwrap_or(NOACTION);
                if let Some(child) = member.descend {
                    stack.bump();
                    write_capped(out, cap, &format!("{}:", member.name));
                    stack.push(Some(child));
                    Ok(Step::Emitted)
                } else {
                    let item = dec.current_item().expect("decode_next advanced");
                    let summary = identity::render_sequenced_primitives(
                        member.name,
                        item.content(dec.source()),
                        member.interpret,
                        cap,
                    )?;
                    write_capped(out, cap, &summary);
                    dec.decode_skip()?;
                    Ok(Step::Emitted)
                }
            }

            _ => Ok(Step::Finished),
        }
    }

    /* ---------------- decryption ---------------- */

    /// Decrypt an encrypted-payload item. `Ok(None)` means the plaintext
    /// was attached as a secondary decoder; `Ok(Some(hex))` is the
    /// fallback rendering when decryption is not possible.
    fn decrypt_payload_item(
        &mut self,
        ciphertext: &[u8],
        seqno: u32,
    ) -> EtsiliResult<Option<String>> {
        match self.encrypt_method {
            security::ENCRYPTION_NONE => {
                self.install_decrypt(ciphertext.to_vec());
                Ok(None)
            }
            security::ENCRYPTION_AES_192_CBC => {
                let key = self
                    .decryption_key
                    .clone()
                    .or_else(|| std::env::var(DECRYPTION_KEY_ENV).ok());
                let Some(key) = key else {
                    warn!(
                        "no decryption key available; set one programmatically or via {}",
                        DECRYPTION_KEY_ENV
                    );
                    return Ok(Some(identity::render_hex_bytes(ciphertext, 16384)?));
                };

                let plain = match security::decrypt_aes_192_cbc(&key, seqno, ciphertext) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!("payload decryption failed: {}", e);
                        return Ok(Some(identity::render_hex_bytes(ciphertext, 16384)?));
                    }
                };

                if plain.first() != Some(&0x30) {
                    warn!("decrypted payload does not begin with 0x30; wrong key?");
                    return Ok(Some(identity::render_hex_bytes(ciphertext, 16384)?));
                }
                if !security::plaintext_shape_ok(&plain) {
                    warn!("decrypted payload has an implausible length field; wrong key?");
                    return Ok(Some(identity::render_hex_bytes(ciphertext, 16384)?));
                }

                self.install_decrypt(plain);
                Ok(None)
            }
            security::ENCRYPTION_NOT_STATED => {
                Ok(Some(identity::render_hex_bytes(ciphertext, 16384)?))
            }
            other => {
                warn!("unsupported encryption method: {}", other);
                Ok(Some(identity::render_hex_bytes(ciphertext, 16384)?))
            }
        }
    }

    fn install_decrypt(&mut self, plaintext: Vec<u8>) {
        self.decrypt = Some(Box::new(DecryptWalk {
            dec: Decoder::new_owned(plaintext),
            stack: WalkStack::new(EtsiNode::EncryptedPayloadRoot.into()),
        }));
    }

    /// Read an encryption container's fields and decrypt its payload,
    /// attaching a secondary decoder on success.
    fn decrypt_container(&mut self, container: &[u8], seqno: u32) -> EtsiliResult<bool> {
        let mut tmp = Decoder::new(container);
        if quick(&mut tmp)? != 0 {
            return Ok(false);
        }
        self.encrypt_method = tmp.integer_value()?;

        if quick(&mut tmp)? != 1 {
            return Ok(false);
        }
        let cipher = tmp
            .current_item()
            .expect("quick advanced")
            .content(container)
            .to_vec();

        Ok(self.decrypt_payload_item(&cipher, seqno)?.is_none())
    }

    /* ---------------- value accessors ---------------- */

    /// The PSHeader timestamp: the generalized-time field if present,
    /// otherwise the seconds/microseconds pair.
    pub fn header_timestamp(&mut self) -> EtsiliResult<Timeval> {
        let dec = self.base_decoder()?;
        dec.reset();
        quick(dec)?;
        if quick(dec)? != 1 {
            return Err(EtsiliError::InvalidData(
                "PDU does not start with a PSHeader".to_string(),
            ));
        }

        if dec.decode_sequence_until(5)? {
            let gts = String::from_utf8_lossy(dec.item_bytes().unwrap_or(&[])).into_owned();
            return dec.generalized_to_timeval(&gts);
        }

        if dec.decode_sequence_until(7)? {
            quick(dec)?;
            let sec = dec.integer_value()?;
            quick(dec)?;
            let usec = dec.integer_value()?;
            return Ok(Timeval::new(sec, usec));
        }

        Err(EtsiliError::InvalidData(
            "PSHeader carries no timestamp".to_string(),
        ))
    }

    /// Total encoded length of the PDU at the start of the buffer,
    /// preamble included.
    pub fn pdu_length(&mut self) -> EtsiliResult<usize> {
        let dec = self.base_decoder()?;
        dec.reset();
        if dec.decode_next()?.is_none() {
            return Ok(0);
        }
        let item = dec.current_item().expect("decode_next advanced");
        if item.indefinite {
            return dec.decode_skip();
        }
        Ok(item.length as usize + item.preamble_len as usize)
    }

    /// The lawful-interception identifier from the PSHeader.
    pub fn liid(&mut self) -> EtsiliResult<String> {
        let dec = self.base_decoder()?;
        dec.reset();
        quick(dec)?;
        if quick(dec)? != 1 {
            return Err(EtsiliError::InvalidData(
                "PDU does not start with a PSHeader".to_string(),
            ));
        }
        loop {
            let ident = quick(dec)?;
            if ident >= 1 {
                if ident != 1 {
                    return Err(EtsiliError::InvalidData(
                        "PSHeader carries no LIID".to_string(),
                    ));
                }
                break;
            }
        }
        Ok(String::from_utf8_lossy(dec.item_bytes().unwrap_or(&[])).into_owned())
    }

    /// The communication identity number, 0 when absent.
    pub fn cin(&mut self) -> EtsiliResult<u32> {
        let dec = self.base_decoder()?;
        dec.reset();
        quick(dec)?;
        if quick(dec)? != 1 {
            return Ok(0);
        }

        // Work our way to the communicationIdentifier sequence.
        let mut ident;
        loop {
            ident = quick(dec)?;
            if ident >= 3 {
                break;
            }
        }
        if ident != 3 {
            return Ok(0);
        }

        // Skip past the contents of the networkIdentifier field.
        ident = quick(dec)?;
        if ident == 0 {
            dec.decode_skip()?;
        }

        loop {
            ident = quick(dec)?;
            if ident >= 1 {
                break;
            }
        }
        if ident != 1 {
            return Ok(0);
        }

        Ok(dec.integer_value()? as u32)
    }

    /// The PSHeader sequence number, or -1 when the buffer lacks one at
    /// the expected position.
    pub fn sequence_number(&mut self) -> EtsiliResult<i64> {
        let dec = self.base_decoder()?;
        Ok(decode_sequence_number(dec))
    }

    fn is_ka(&mut self, response: bool) -> EtsiliResult<bool> {
        let dec = self.base_decoder()?;
        dec.reset();
        quick(dec)?;
        let mut ident = quick(dec)?;
        if ident == 1 {
            // Skip the PSHeader.
            dec.decode_skip()?;
            ident = quick(dec)?;
        }
        if ident != 2 {
            return Ok(false);
        }
        if quick(dec)? != 2 {
            return Ok(false);
        }
        let ident = quick(dec)?;
        Ok(if response { ident == 4 } else { ident == 3 })
    }

    /// Whether the attached PDU is a keepalive (TRI payload, keep-alive).
    pub fn is_keepalive(&mut self) -> EtsiliResult<bool> {
        self.is_ka(false)
    }

    /// Whether the attached PDU is a keepalive response.
    pub fn is_keepalive_response(&mut self) -> EtsiliResult<bool> {
        self.is_ka(true)
    }

    /* ---------------- content extraction ---------------- */

    fn search_one(
        &mut self,
        decrypted: bool,
        start: EtsiNode,
        targets: &mut [SearchTarget],
    ) -> EtsiliResult<Option<(usize, Vec<u8>)>> {
        let dec = if decrypted {
            &mut self
                .decrypt
                .as_mut()
                .ok_or_else(|| EtsiliError::Misuse("no decrypted payload attached".to_string()))?
                .dec
        } else {
            self.dec.as_mut().ok_or_else(|| {
                EtsiliError::Misuse(
                    "no buffer attached to this decoder; call attach() first".to_string(),
                )
            })?
        };

        dec.reset();
        let mut found = FoundSet::new();
        let n = etsili_asn1::search::search_items(
            dec,
            &self.schema,
            start.into(),
            targets,
            1,
            &mut found,
        )?;
        if n == 0 {
            return Ok(None);
        }
        let hit = found.get(0).expect("count checked");
        Ok(Some((hit.target_idx, hit.item.content(dec.source()).to_vec())))
    }

    fn ipmmcc_format(&mut self, decrypted: bool, start: EtsiNode) -> EtsiliResult<()> {
        if self.ccformat != CcFormat::Unknown {
            return Ok(());
        }
        let mut targets = [SearchTarget::new(EtsiNode::IpMmCc.into(), 2)];
        if let Some((_, bytes)) = self.search_one(decrypted, start, &mut targets)? {
            let val = etsili_asn1::primitives::decode_integer_value(&bytes)?;
            self.ccformat = match val {
                0 => CcFormat::Ip,
                1 => CcFormat::Udp,
                2 | 5 => CcFormat::Rtp,
                4 => CcFormat::Tcp,
                _ => CcFormat::Unknown,
            };
        }
        Ok(())
    }

    fn email_format(&mut self, decrypted: bool, start: EtsiNode) -> EtsiliResult<()> {
        if self.ccformat != CcFormat::Unknown {
            return Ok(());
        }
        let mut targets = [SearchTarget::new(EtsiNode::EmailCc.into(), 1)];
        if let Some((_, bytes)) = self.search_one(decrypted, start, &mut targets)? {
            let val = etsili_asn1::primitives::decode_integer_value(&bytes)?;
            if (0..=255).contains(&val) {
                self.ccformat = email_format_of(val);
            }
        }
        Ok(())
    }

    fn cc_search(&mut self, decrypted: bool) -> EtsiliResult<Option<CcContent>> {
        let start = if decrypted {
            EtsiNode::EncryptedPayloadRoot
        } else {
            EtsiNode::Root
        };

        let mut targets = vec![
            SearchTarget::new(EtsiNode::IpCcContents.into(), 0),
            SearchTarget::new(EtsiNode::IpMmCc.into(), 1),
            SearchTarget::new(EtsiNode::CcContents.into(), 4),
            SearchTarget::new(EtsiNode::EmailCc.into(), 2),
            SearchTarget::new(EtsiNode::EpsCc.into(), 2),
        ];
        if !decrypted {
            // The payload may be wrapped in an encryption container.
            targets.push(SearchTarget::new(EtsiNode::Payload.into(), 4));
        }

        let Some((target_idx, bytes)) = self.search_one(decrypted, start, &mut targets)? else {
            return Ok(None);
        };

        let name = match target_idx {
            0 => {
                self.ccformat = CcFormat::Ip;
                "iPPackets"
            }
            1 => {
                self.ipmmcc_format(decrypted, start)?;
                "mMCCContents"
            }
            2 => {
                self.ccformat = CcFormat::Ip;
                "uMTSCC"
            }
            3 => {
                self.email_format(decrypted, start)?;
                "email-Content"
            }
            4 => {
                self.ccformat = CcFormat::Ip;
                "payload"
            }
            _ => {
                let seqno = {
                    let dec = self.base_decoder()?;
                    sequence_number_of(dec.source())
                };
                if self.decrypt_container(&bytes, seqno)? {
                    return self.cc_search(true);
                }
                return Ok(None);
            }
        };

        Ok(Some(CcContent {
            name: name.to_string(),
            bytes,
        }))
    }

    /// Locate the communication content carried by this PDU, decrypting an
    /// encryption container when needed.
    pub fn cc_contents(&mut self) -> EtsiliResult<Option<CcContent>> {
        if let Some(saved) = &self.saved_payload {
            return Ok(match saved.name {
                // IRI contents, not CC.
                "sIPContent" | "originalIPMMMessage" | "h323Message" => None,
                name => Some(CcContent {
                    name: name.to_string(),
                    bytes: saved.bytes.clone(),
                }),
            });
        }

        self.ccformat = CcFormat::Unknown;
        self.cc_search(false)
    }

    fn iri_search(&mut self, decrypted: bool) -> EtsiliResult<Option<IriContent>> {
        let start = if decrypted {
            EtsiNode::EncryptedPayloadRoot
        } else {
            EtsiNode::Root
        };

        let mut targets = vec![
            SearchTarget::new(EtsiNode::IpMmIriContents.into(), 0),
            SearchTarget::new(EtsiNode::SipMessage.into(), 2),
            SearchTarget::new(EtsiNode::IpIriContents.into(), 15),
        ];
        if !decrypted {
            targets.push(SearchTarget::new(EtsiNode::Payload.into(), 4));
        }

        let Some((target_idx, bytes)) = self.search_one(decrypted, start, &mut targets)? else {
            return Ok(None);
        };

        let (name, kind) = match target_idx {
            0 => ("originalIPMMMessage", IriContentKind::Ip),
            1 => ("sIPContent", IriContentKind::Sip),
            2 => ("rawAAAData", IriContentKind::Ip),
            _ => {
                let seqno = {
                    let dec = self.base_decoder()?;
                    sequence_number_of(dec.source())
                };
                if self.decrypt_container(&bytes, seqno)? {
                    return self.iri_search(true);
                }
                return Ok(None);
            }
        };

        Ok(Some(IriContent {
            name: name.to_string(),
            kind,
            bytes,
        }))
    }

    /// Locate the intercept-related information content of this PDU.
    pub fn iri_contents(&mut self) -> EtsiliResult<Option<IriContent>> {
        if let Some(saved) = &self.saved_payload {
            let kind = match saved.name {
                "sIPContent" => IriContentKind::Sip,
                "originalIPMMMessage" | "h323Message" => IriContentKind::Ip,
                _ => return Ok(None),
            };
            return Ok(Some(IriContent {
                name: saved.name.to_string(),
                kind,
                bytes: saved.bytes.clone(),
            }));
        }

        self.iri_search(false)
    }

    /// Raw bytes of the encryption container, if this PDU carries one.
    pub fn encryption_container(&mut self) -> EtsiliResult<Option<Vec<u8>>> {
        let mut targets = [SearchTarget::new(EtsiNode::Payload.into(), 4)];
        Ok(self
            .search_one(false, EtsiNode::Root, &mut targets)?
            .map(|(_, bytes)| bytes))
    }

    /// Raw bytes of the integrity check TRI payload, if present. The check
    /// value is not validated here.
    pub fn integrity_check_contents(&mut self) -> EtsiliResult<Option<Vec<u8>>> {
        let mut targets = [SearchTarget::new(EtsiNode::TriPayload.into(), 0)];
        Ok(self
            .search_one(false, EtsiNode::Root, &mut targets)?
            .map(|(_, bytes)| bytes))
    }
}

fn email_format_of(value: i64) -> CcFormat {
    match value {
        1 => CcFormat::Ip,
        2 => CcFormat::Application,
        _ => CcFormat::Unknown,
    }
}

/// Sequence number of the PDU in `source`, as the 32-bit value the IV
/// derivation needs.
fn sequence_number_of(source: &[u8]) -> u32 {
    let mut tmp = Decoder::new(source);
    (decode_sequence_number(&mut tmp) & 0xffff_ffff) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal keepalive PDU: pS-PDU { PSHeader {...}, Payload { TRIPayload
    // { keep-alive } } }, indefinite outer forms.
    fn keepalive_pdu(response: bool) -> Vec<u8> {
        let ka_tag = if response { 0x84 } else { 0x83 };
        vec![
            0x30, 0x80, // pS-PDU
            0xa1, 0x03, 0x80, 0x01, 0x00, // PSHeader (definite, one member)
            0xa2, 0x80, // Payload
            0xa2, 0x80, // TRIPayload
            ka_tag, 0x00, // keep-alive / keep-aliveResponse
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ]
    }

    #[test]
    fn test_keepalive_detection() {
        let pdu = keepalive_pdu(false);
        let mut session = EtsiliSession::new();
        session.attach(&pdu, false);
        assert!(session.is_keepalive().unwrap());
        assert!(!session.is_keepalive_response().unwrap());
    }

    #[test]
    fn test_keepalive_response_detection() {
        let pdu = keepalive_pdu(true);
        let mut session = EtsiliSession::new();
        session.attach(&pdu, false);
        assert!(!session.is_keepalive().unwrap());
        assert!(session.is_keepalive_response().unwrap());
    }

    #[test]
    fn test_no_buffer_is_misuse() {
        let mut session = EtsiliSession::new();
        assert!(session.liid().is_err());
        let mut out = String::new();
        assert!(session.next_field_str(&mut out, 128).is_err());
    }

    #[test]
    fn test_write_capped_truncates() {
        let mut out = String::new();
        write_capped(&mut out, 5, "abcdefgh");
        assert_eq!(out, "abcde");
    }

    fn seq(enc: &mut etsili_asn1::Encoder, class: IdentClass, ident: u32) {
        enc.encode_next(tag::SEQUENCE, class, ident, &etsili_asn1::EncodeValue::None)
            .unwrap();
    }

    /// An encryptedPayload body holding one IP CC record.
    fn inner_payload(packet: &[u8]) -> Vec<u8> {
        use etsili_asn1::EncodeValue;
        let mut enc = etsili_asn1::Encoder::new();
        seq(&mut enc, IdentClass::UniversalConstruct, 16);
        enc.encode_next(
            tag::INTEGER,
            IdentClass::ContextPrimitive,
            0,
            &EncodeValue::int(1),
        )
        .unwrap();
        seq(&mut enc, IdentClass::ContextConstruct, 1); // payload
        seq(&mut enc, IdentClass::ContextConstruct, 1); // cCPayloadSequence
        seq(&mut enc, IdentClass::UniversalConstruct, 16); // CCPayload
        seq(&mut enc, IdentClass::ContextConstruct, 2); // cCContents
        seq(&mut enc, IdentClass::ContextConstruct, 2); // iPCC
        seq(&mut enc, IdentClass::ContextConstruct, 1); // iPCCContents
        enc.encode_next(
            tag::OCTETSTRING,
            IdentClass::ContextPrimitive,
            0,
            &EncodeValue::Bytes(packet),
        )
        .unwrap();
        enc.endseq_repeat(7);
        enc.finish().unwrap().bytes
    }

    /// pS-PDU wrapping an encryption container around `inner`.
    fn encrypted_pdu(method: i64, inner: &[u8]) -> Vec<u8> {
        use etsili_asn1::EncodeValue;
        let mut enc = etsili_asn1::Encoder::new();
        seq(&mut enc, IdentClass::UniversalConstruct, 16); // pS-PDU
        seq(&mut enc, IdentClass::ContextConstruct, 1); // PSHeader
        enc.encode_next(
            tag::OCTETSTRING,
            IdentClass::ContextPrimitive,
            1,
            &EncodeValue::Bytes(b"AB"),
        )
        .unwrap();
        enc.encode_next(
            tag::INTEGER,
            IdentClass::ContextPrimitive,
            4,
            &EncodeValue::int(42),
        )
        .unwrap();
        enc.endseq().unwrap();
        seq(&mut enc, IdentClass::ContextConstruct, 2); // Payload
        seq(&mut enc, IdentClass::ContextConstruct, 4); // encryptionContainer
        enc.encode_next(
            tag::ENUM,
            IdentClass::ContextPrimitive,
            0,
            &EncodeValue::Integer {
                value: method,
                width: 1,
            },
        )
        .unwrap();
        enc.encode_next(
            tag::OCTETSTRING,
            IdentClass::ContextPrimitive,
            1,
            &EncodeValue::Bytes(inner),
        )
        .unwrap();
        enc.encode_next(
            tag::ENUM,
            IdentClass::ContextPrimitive,
            2,
            &EncodeValue::Integer { value: 8, width: 1 },
        )
        .unwrap();
        enc.endseq_repeat(3);
        enc.finish().unwrap().bytes
    }

    #[test]
    fn test_cc_contents_through_plaintext_container() {
        let pdu = encrypted_pdu(1, &inner_payload(&[0x45, 0x00, 0x00, 0x14]));
        let mut session = EtsiliSession::new();
        session.attach_owned(pdu);

        let cc = session.cc_contents().unwrap().expect("CC present");
        assert_eq!(cc.name, "iPPackets");
        assert_eq!(cc.bytes, [0x45, 0x00, 0x00, 0x14]);
    }

    #[test]
    fn test_field_walk_through_plaintext_container() {
        let pdu = encrypted_pdu(1, &inner_payload(&[0x45, 0x00]));
        let mut session = EtsiliSession::new();
        session.attach_owned(pdu);

        let mut fields = Vec::new();
        let mut space = String::new();
        while session.next_field_str(&mut space, 2048).unwrap().is_some() {
            fields.push(space.clone());
        }

        assert!(fields.iter().any(|f| f == "encryptionType: None"));
        // The walk switched into the decrypted payload...
        assert!(fields.iter().any(|f| f == "byteCounter: 1"));
        assert!(fields.iter().any(|f| f == "iPCCContents:"));
        // ... and resumed the outer record afterwards.
        assert!(fields.iter().any(|f| f == "encryptedPayloadType: part1"));
    }

    #[test]
    fn test_sequence_number_and_pdu_length() {
        let pdu = encrypted_pdu(1, &inner_payload(&[0x45]));
        let mut session = EtsiliSession::new();
        let total = pdu.len();
        session.attach_owned(pdu);

        assert_eq!(session.sequence_number().unwrap(), 42);
        assert_eq!(session.pdu_length().unwrap(), total);
    }

    #[test]
    fn test_unknown_method_falls_back_to_hex() {
        let pdu = encrypted_pdu(5, &inner_payload(&[0x45]));
        let mut session = EtsiliSession::new();
        session.attach_owned(pdu);

        let mut fields = Vec::new();
        let mut space = String::new();
        while session.next_field_str(&mut space, 8192).unwrap().is_some() {
            fields.push(space.clone());
        }
        assert!(fields
            .iter()
            .any(|f| f.starts_with("encryptedPayload: 0x30")));
    }
}
