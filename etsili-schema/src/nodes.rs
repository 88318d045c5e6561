//! The ETSI LI element tree
//!
//! One node per container type in the ETSI TS 102 232 record hierarchy.
//! This is a direct rendering of the ASN.1 specification into the generic
//! schema machinery; try not to look too closely unless you really need
//! to. The tree is cyclic (an encrypted payload carries a complete
//! Payload), which is why nodes refer to each other through [`EtsiNode`]
//! indices.

use etsili_asn1::schema::{ElementNode, ElementTree, MemberAction, NodeId, NOACTION};
use etsili_core::tag;

/// Identifies one schema node in the tree built by [`etsi_schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum EtsiNode {
    Root = 0,
    PsPdu,
    PsHeader,
    Payload,
    Cid,
    LiNetId,
    NetElId,
    NetworkIdentifier,
    Msts,
    Timestamp,
    LocalTimestamp,
    IpAddress,
    IpValue,
    DataNodeAddress,
    CcPayloadSeq,
    CcPayload,
    CcContents,
    IpCc,
    IpCcContents,
    IpMmCc,
    EpsCc,
    UlicHeader,
    EmailCc,
    IriPayloadSeq,
    IriPayload,
    IriContents,
    IpIri,
    IpIriContents,
    IpIriId,
    IpMmIri,
    IpMmIriContents,
    SipMessage,
    H323Message,
    H323Content,
    NationalIpMmIri,
    LipsPduLocation,
    EpsLocation,
    AdditionalSignallingSeq,
    AdditionalSignalling,
    UmtsIri,
    UmtsIriParams,
    EpsIri,
    EpsIriParams,
    EpsGtpv2Params,
    EpsProtConfigOptions,
    UmtsQos,
    GprsParams,
    ServicesDataInfo,
    PartyInfo,
    PartyIdentity,
    Location,
    EmailIri,
    EmailRecipients,
    AaaInformation,
    Pop3AaaInformation,
    AsmtpAaaInformation,
    TriPayload,
    IntegrityCheck,
    OperatorLeaMessage,
    OptionField,
    OptionSeq,
    OptionReq,
    OptionResp,
    Hi1Operation,
    Hi1Notification,
    Hi2OpCid,
    Hi2OpNetId,
    EncryptionContainer,
    EncryptedPayload,
    EncryptedPayloadRoot,
}

const NODE_COUNT: usize = EtsiNode::EncryptedPayloadRoot as usize + 1;

impl From<EtsiNode> for NodeId {
    fn from(n: EtsiNode) -> NodeId {
        n as NodeId
    }
}

impl EtsiNode {
    const ALL: [EtsiNode; NODE_COUNT] = [
        EtsiNode::Root,
        EtsiNode::PsPdu,
        EtsiNode::PsHeader,
        EtsiNode::Payload,
        EtsiNode::Cid,
        EtsiNode::LiNetId,
        EtsiNode::NetElId,
        EtsiNode::NetworkIdentifier,
        EtsiNode::Msts,
        EtsiNode::Timestamp,
        EtsiNode::LocalTimestamp,
        EtsiNode::IpAddress,
        EtsiNode::IpValue,
        EtsiNode::DataNodeAddress,
        EtsiNode::CcPayloadSeq,
        EtsiNode::CcPayload,
        EtsiNode::CcContents,
        EtsiNode::IpCc,
        EtsiNode::IpCcContents,
        EtsiNode::IpMmCc,
        EtsiNode::EpsCc,
        EtsiNode::UlicHeader,
        EtsiNode::EmailCc,
        EtsiNode::IriPayloadSeq,
        EtsiNode::IriPayload,
        EtsiNode::IriContents,
        EtsiNode::IpIri,
        EtsiNode::IpIriContents,
        EtsiNode::IpIriId,
        EtsiNode::IpMmIri,
        EtsiNode::IpMmIriContents,
        EtsiNode::SipMessage,
        EtsiNode::H323Message,
        EtsiNode::H323Content,
        EtsiNode::NationalIpMmIri,
        EtsiNode::LipsPduLocation,
        EtsiNode::EpsLocation,
        EtsiNode::AdditionalSignallingSeq,
        EtsiNode::AdditionalSignalling,
        EtsiNode::UmtsIri,
        EtsiNode::UmtsIriParams,
        EtsiNode::EpsIri,
        EtsiNode::EpsIriParams,
        EtsiNode::EpsGtpv2Params,
        EtsiNode::EpsProtConfigOptions,
        EtsiNode::UmtsQos,
        EtsiNode::GprsParams,
        EtsiNode::ServicesDataInfo,
        EtsiNode::PartyInfo,
        EtsiNode::PartyIdentity,
        EtsiNode::Location,
        EtsiNode::EmailIri,
        EtsiNode::EmailRecipients,
        EtsiNode::AaaInformation,
        EtsiNode::Pop3AaaInformation,
        EtsiNode::AsmtpAaaInformation,
        EtsiNode::TriPayload,
        EtsiNode::IntegrityCheck,
        EtsiNode::OperatorLeaMessage,
        EtsiNode::OptionField,
        EtsiNode::OptionSeq,
        EtsiNode::OptionReq,
        EtsiNode::OptionResp,
        EtsiNode::Hi1Operation,
        EtsiNode::Hi1Notification,
        EtsiNode::Hi2OpCid,
        EtsiNode::Hi2OpNetId,
        EtsiNode::EncryptionContainer,
        EtsiNode::EncryptedPayload,
        EtsiNode::EncryptedPayloadRoot,
    ];

    /// Reverse lookup from a tree index.
    pub fn from_id(id: NodeId) -> Option<EtsiNode> {
        Self::ALL.get(id as usize).copied()
    }
}

/// Primitive member: name + interpret-as.
const fn m(name: &'static str, interpret: u8) -> MemberAction {
    MemberAction {
        name,
        descend: None,
        interpret,
    }
}

/// Container member: name + child schema.
const fn d(name: &'static str, node: EtsiNode) -> MemberAction {
    MemberAction {
        name,
        descend: Some(node as NodeId),
        interpret: tag::NULL,
    }
}

fn members(count: usize, entries: &[(usize, MemberAction)]) -> Vec<MemberAction> {
    let mut v = vec![NOACTION; count];
    for (idx, action) in entries {
        v[*idx] = *action;
    }
    v
}

fn set(tree: &mut ElementTree, node: EtsiNode, members: Vec<MemberAction>, sequence: MemberAction) {
    tree.set(
        node.into(),
        ElementNode { members, sequence },
    );
}

/// Build the full ETSI LI schema tree.
pub fn etsi_schema() -> ElementTree {
    use EtsiNode::*;

    let mut t = ElementTree::with_nodes(NODE_COUNT);

    set(&mut t, Root, Vec::new(), d("pS-PDU", PsPdu));

    set(
        &mut t,
        PsPdu,
        members(
            3,
            &[(1, d("PSHeader", PsHeader)), (2, d("Payload", Payload))],
        ),
        NOACTION,
    );

    set(
        &mut t,
        PsHeader,
        members(
            9,
            &[
                (0, m("li-psDomainId", tag::OID)),
                (1, m("lawfulInterceptionIdentifier", tag::OCTETSTRING)),
                (2, m("authorizationCountryCode", tag::PRINTABLE)),
                (3, d("communicationIdentifier", Cid)),
                (4, m("sequenceNumber", tag::INTEGER)),
                (5, m("timeStamp", tag::GENERALTIME)),
                (6, m("interceptionPointID", tag::PRINTABLE)),
                (7, d("microSecondTimeStamp", Msts)),
                (8, m("timeStampQualifier", tag::ENUM)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        Payload,
        members(
            5,
            &[
                (0, d("iRIPayloadSequence", IriPayloadSeq)),
                (1, d("cCPayloadSequence", CcPayloadSeq)),
                (2, d("tRIPayload", TriPayload)),
                (3, d("hI1-Operation", Hi1Operation)),
                (4, d("encryptionContainer", EncryptionContainer)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        Cid,
        members(
            3,
            &[
                (0, d("networkIdentifier", LiNetId)),
                (1, m("communicationIdentityNumber", tag::INTEGER)),
                (2, m("deliveryCountryCode", tag::PRINTABLE)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        LiNetId,
        members(
            3,
            &[
                (0, m("operatorIdentifier", tag::OCTETSTRING)),
                (1, m("networkElementIdentifier", tag::OCTETSTRING)),
                (2, d("eTSI671NEID", NetElId)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        NetElId,
        members(
            6,
            &[
                (1, m("e164-Format", tag::OCTETSTRING)),
                (2, m("x25-Format", tag::OCTETSTRING)),
                (3, m("iP-Format", tag::OCTETSTRING)),
                (4, m("dNS-Format", tag::OCTETSTRING)),
                (5, d("iP-Address", IpAddress)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        NetworkIdentifier,
        members(
            2,
            &[
                (0, m("operator-Identifier", tag::OCTETSTRING)),
                (1, d("network-Element-Identifier", NetElId)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        Msts,
        members(
            2,
            &[
                (0, m("seconds", tag::INTEGER)),
                (1, m("microSeconds", tag::INTEGER)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        Timestamp,
        members(
            2,
            &[
                (0, d("localTime", LocalTimestamp)),
                (1, m("utcTime", tag::UTCTIME)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        LocalTimestamp,
        members(
            2,
            &[
                (0, m("generalizedTime", tag::GENERALTIME)),
                (1, m("winterSummerIndication", tag::ENUM)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        IpAddress,
        members(
            6,
            &[
                (1, m("iP-type", tag::ENUM)),
                (2, d("iP-value", IpValue)),
                (3, m("iP-assignment", tag::ENUM)),
                (4, m("iPv6PrefixLength", tag::INTEGER)),
                (5, m("iPv4SubnetMask", tag::BINARY_IP)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        IpValue,
        members(
            3,
            &[
                (1, m("iPBinaryAddress", tag::BINARY_IP)),
                (2, m("iPTextAddress", tag::IA5)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        DataNodeAddress,
        members(3, &[(1, d("ipAddress", IpAddress))]),
        NOACTION,
    );

    /* CC payload chain */

    set(
        &mut t,
        CcPayloadSeq,
        Vec::new(),
        d("CCPayload", CcPayload),
    );

    set(
        &mut t,
        CcPayload,
        members(
            5,
            &[
                (0, m("payloadDirection", tag::ENUM)),
                (1, m("timeStamp", tag::GENERALTIME)),
                (2, d("cCContents", CcContents)),
                (3, d("microSecondTimestamp", Msts)),
                (4, m("timeStampQualifier", tag::ENUM)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        CcContents,
        members(
            19,
            &[
                (1, d("emailCC", EmailCc)),
                (2, d("iPCC", IpCc)),
                (4, m("uMTSCC", tag::IPPACKET)),
                (12, d("iPMMCC", IpMmCc)),
                (17, d("ePSCC", EpsCc)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        IpCc,
        members(
            2,
            &[
                (0, m("iPCCObjId", tag::RELATIVEOID)),
                (1, d("iPCCContents", IpCcContents)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        IpCcContents,
        members(1, &[(0, m("iPPackets", tag::IPPACKET))]),
        NOACTION,
    );

    set(
        &mut t,
        IpMmCc,
        members(
            5,
            &[
                (0, m("iPMMCCObjId", tag::RELATIVEOID)),
                (1, m("mMCCContents", tag::IPPACKET)),
                (2, m("frameType", tag::ENUM)),
                (3, m("streamIdentifier", tag::OCTETSTRING)),
                (4, m("mMCCprotocol", tag::ENUM)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        EpsCc,
        members(
            3,
            &[
                (1, d("uLIC-header", UlicHeader)),
                (2, m("payload", tag::IPPACKET)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        UlicHeader,
        members(
            9,
            &[
                (0, m("hi3DomainId", tag::OID)),
                (2, m("lIID", tag::OCTETSTRING)),
                (3, m("correlation-Number", tag::OCTETSTRING)),
                (4, d("timeStamp", Timestamp)),
                (5, m("sequence-number", tag::INTEGER)),
                (6, m("t-PDU-direction", tag::ENUM)),
                (8, m("ice-type", tag::ENUM)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        EmailCc,
        members(
            3,
            &[
                (0, m("emailCCObjId", tag::RELATIVEOID)),
                (1, m("email-Format", tag::ENUM)),
                (2, m("email-Content", tag::IPPACKET)),
            ],
        ),
        NOACTION,
    );

    /* IRI payload chain */

    set(
        &mut t,
        IriPayloadSeq,
        Vec::new(),
        d("IRIPayload", IriPayload),
    );

    set(
        &mut t,
        IriPayload,
        members(
            5,
            &[
                (0, m("iRIType", tag::ENUM)),
                (1, m("timeStamp", tag::GENERALTIME)),
                (2, d("iRIContents", IriContents)),
                (3, d("microSecondTimestamp", Msts)),
                (4, m("timeStampQualifier", tag::ENUM)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        IriContents,
        members(
            20,
            &[
                (1, d("emailIRI", EmailIri)),
                (2, d("iPIRI", IpIri)),
                (4, d("uMTSIRI", UmtsIri)),
                (11, d("iPMMIRI", IpMmIri)),
                (15, d("ePSIRI", EpsIri)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        IpIri,
        members(
            2,
            &[
                (0, m("iPIRIObjId", tag::RELATIVEOID)),
                (1, d("iPIRIContents", IpIriContents)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        IpIriContents,
        members(
            24,
            &[
                (0, m("accessEventType", tag::ENUM)),
                (1, m("targetUsername", tag::OCTETSTRING)),
                (2, m("internetAccessType", tag::ENUM)),
                (3, m("iPVersion", tag::ENUM)),
                (4, d("targetIPAddress", IpAddress)),
                (5, m("targetNetworkID", tag::UTF8STR)),
                (6, m("targetCPEID", tag::UTF8STR)),
                (7, m("targetLocation", tag::UTF8STR)),
                (8, m("pOPPortNumber", tag::INTEGER)),
                (9, m("callBackNumber", tag::UTF8STR)),
                (10, m("startTime", tag::GENERALTIME)),
                (11, m("endTime", tag::GENERALTIME)),
                (12, m("endReason", tag::ENUM)),
                (13, m("octetsReceived", tag::INTEGER)),
                (14, m("octetsTransmitted", tag::INTEGER)),
                (15, m("rawAAAData", tag::OCTETSTRING)),
                (16, m("expectedEndTime", tag::GENERALTIME)),
                (17, m("pOPPhoneNumber", tag::UTF8STR)),
                (18, d("pOPIdentifier", IpIriId)),
                (19, d("pOPIPAddress", IpAddress)),
                (21, d("additionalIPAddress", IpAddress)),
                (22, m("authenticationType", tag::ENUM)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        IpIriId,
        members(
            3,
            &[
                (0, m("printableIDType", tag::UTF8STR)),
                (1, m("macAddressType", tag::OCTETSTRING)),
                (2, d("ipAddressType", IpAddress)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        IpMmIri,
        members(
            4,
            &[
                (0, m("iPMMIRIObjId", tag::RELATIVEOID)),
                (1, d("iPMMIRIContents", IpMmIriContents)),
                (2, d("targetLocation", LipsPduLocation)),
                (3, d("additionalSignalingSeq", AdditionalSignallingSeq)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        IpMmIriContents,
        members(
            4,
            &[
                (0, m("originalIPMMMessage", tag::IPPACKET)),
                (1, d("sIPMessage", SipMessage)),
                (2, d("h323Message", H323Message)),
                (3, d("nationalIPMMIRIParameters", NationalIpMmIri)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        SipMessage,
        members(
            3,
            &[
                (0, d("ipSourceAddress", IpAddress)),
                (1, d("ipDestinationAddress", IpAddress)),
                (2, m("sIPContent", tag::IPPACKET)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        H323Message,
        members(
            3,
            &[
                (0, d("ipSourceAddress", IpAddress)),
                (1, d("ipDestinationAddress", IpAddress)),
                (2, d("h323Content", H323Content)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        H323Content,
        members(
            4,
            &[
                (0, m("h225CSMessageContent", tag::OCTETSTRING)),
                (1, m("h225RASMessageContent", tag::OCTETSTRING)),
                (2, m("h245MessageContent", tag::OCTETSTRING)),
                (3, m("genericMessageContent", tag::OCTETSTRING)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        NationalIpMmIri,
        members(1, &[(0, m("countryCode", tag::PRINTABLE))]),
        NOACTION,
    );

    set(
        &mut t,
        LipsPduLocation,
        members(
            5,
            &[
                (0, m("umtsHI2Location", tag::NULL)),
                (1, d("epsLocation", EpsLocation)),
                (2, m("wlanLocationAttributes", tag::NULL)),
                (3, m("eTSI671HI2Location", tag::NULL)),
                (4, m("threeGPP33128UserLocation", tag::NULL)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        EpsLocation,
        members(
            11,
            &[
                (1, m("userLocationInfo", tag::ULI)),
                (2, m("gsmLocation", tag::NULL)),
                (3, m("umtsLocation", tag::NULL)),
                (4, m("olduserLocationInfo", tag::ULI)),
                (5, m("lastVisitedTAI", tag::TAI)),
                (6, m("tAIlist", tag::NULL)),
                (7, m("threeGPP2Bsid", tag::OCTETSTRING)),
                (8, m("civicAddress", tag::NULL)),
                (9, m("operatorSpecificInfo", tag::OCTETSTRING)),
                (10, m("uELocationTimestamp", tag::NULL)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        AdditionalSignallingSeq,
        Vec::new(),
        d("additionalSignalling", AdditionalSignalling),
    );

    set(
        &mut t,
        AdditionalSignalling,
        members(1, &[(0, m("sipHeaderLine", tag::OCTETSTRING))]),
        NOACTION,
    );

    /* UMTS / EPS IRI */

    set(
        &mut t,
        UmtsIri,
        members(4, &[(0, d("iRI-Parameters", UmtsIriParams))]),
        NOACTION,
    );

    set(
        &mut t,
        UmtsIriParams,
        members(
            60,
            &[
                (0, m("hi2DomainId", tag::OID)),
                (1, m("lawfulInterceptionIdentifier", tag::OCTETSTRING)),
                (3, d("timeStamp", Timestamp)),
                (4, m("initiator", tag::ENUM)),
                (8, d("locationOfTheTarget", Location)),
                (9, d("partyInformation", PartyInfo)),
                (18, m("gPRSCorrelationNumber", tag::OCTETSTRING)),
                (20, m("gPRSevent", tag::ENUM)),
                (21, d("sgsnAddress", DataNodeAddress)),
                (22, m("gPRSOperationErrorCode", tag::THREEG_SM_CAUSE)),
                (23, m("iRIversion", tag::ENUM)),
                (24, d("ggsnAddress", DataNodeAddress)),
                (26, d("networkIdentifier", NetworkIdentifier)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        EpsIri,
        members(2, &[(0, d("iRI-EPS-Parameters", EpsIriParams))]),
        NOACTION,
    );

    set(
        &mut t,
        EpsIriParams,
        members(
            256,
            &[
                (0, m("hi2epsDomainId", tag::OID)),
                (1, m("lawfulInterceptionIdentifier", tag::OCTETSTRING)),
                (3, d("timeStamp", Timestamp)),
                (4, m("initiator", tag::ENUM)),
                (8, d("locationOfTheTarget", Location)),
                (9, d("partyInformation", PartyInfo)),
                (13, d("serviceCenterAddress", PartyInfo)),
                (18, m("ePSCorrelationNumber", tag::OCTETSTRING)),
                (20, m("ePSevent", tag::ENUM)),
                (21, d("sgsnAddress", DataNodeAddress)),
                (22, m("gPRSOperationErrorCode", tag::THREEG_SM_CAUSE)),
                (24, d("ggsnAddress", DataNodeAddress)),
                (25, d("qOS", UmtsQos)),
                (26, d("networkIdentifier", NetworkIdentifier)),
                (27, d("sMSOriginatingAddress", DataNodeAddress)),
                (28, d("sMSTerminatingAddress", DataNodeAddress)),
                (29, m("iMSevent", tag::ENUM)),
                (30, m("sIPMessage", tag::OCTETSTRING)),
                (31, m("servingSGSN-number", tag::OCTETSTRING)),
                (32, m("servingSGSN-address", tag::OCTETSTRING)),
                (34, m("ldiEvent", tag::ENUM)),
                (36, d("ePS-GTPV2-specificParameters", EpsGtpv2Params)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        EpsGtpv2Params,
        members(
            36,
            &[
                (1, m("pDNAddressAllocation", tag::HEX_BYTES)),
                (2, m("aPN", tag::DOMAIN_NAME)),
                (3, d("protConfigOptions", EpsProtConfigOptions)),
                (4, m("attachType", tag::EPS_ATTACH_TYPE)),
                (5, m("ePSBearerIdentity", tag::HEX_BYTES)),
                (6, m("detachType", tag::HEX_BYTES)),
                (7, m("rATType", tag::EPS_RAT_TYPE)),
                (8, m("failedBearerActivationReason", tag::EPS_CAUSE)),
                (9, m("ePSBearerQoS", tag::HEX_BYTES)),
                (10, m("bearerActivationType", tag::ENUM)),
                (11, m("aPN-AMBR", tag::EPS_APN_AMBR)),
                (13, m("linkedEPSBearerId", tag::HEX_BYTES)),
                (16, m("failedBearerModificationReason", tag::EPS_CAUSE)),
                (21, m("bearerDeactivationType", tag::ENUM)),
                (22, m("bearerDeactivationCause", tag::EPS_CAUSE)),
                (23, d("ePSlocationOfTheTarget", EpsLocation)),
                (24, m("pDNType", tag::EPS_PDN_TYPE)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        EpsProtConfigOptions,
        members(
            3,
            &[
                (1, m("ueToNetwork", tag::HEX_BYTES)),
                (2, m("networkToUe", tag::HEX_BYTES)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        UmtsQos,
        members(
            3,
            &[
                (1, m("qosMobileRadio", tag::OCTETSTRING)),
                (2, m("qosGn", tag::OCTETSTRING)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        GprsParams,
        members(
            6,
            &[
                (1, d("pDP-address-allocated-to-the-target", DataNodeAddress)),
                (2, m("aPN", tag::DOMAIN_NAME)),
                (3, m("pDP-type", tag::HEX_BYTES)),
                (4, m("nSAPI", tag::OCTETSTRING)),
                (5, d("additionalIPaddress", DataNodeAddress)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        ServicesDataInfo,
        members(2, &[(1, d("gPRS-parameters", GprsParams))]),
        NOACTION,
    );

    set(
        &mut t,
        PartyInfo,
        members(
            5,
            &[
                (0, m("party-Qualifier", tag::ENUM)),
                (1, d("partyIdentity", PartyIdentity)),
                (4, d("services-Data-Information", ServicesDataInfo)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        PartyIdentity,
        members(
            12,
            &[
                (1, m("imei", tag::THREEG_IMEI)),
                (3, m("imsi", tag::THREEG_IMEI)),
                (6, m("msISDN", tag::THREEG_IMEI)),
                (7, m("e164-Format", tag::OCTETSTRING)),
                (8, m("sip-uri", tag::OCTETSTRING)),
                (9, m("tel-uri", tag::OCTETSTRING)),
                (10, m("x-3GPP-Asserted-Identity", tag::OCTETSTRING)),
                (11, m("xUI", tag::OCTETSTRING)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        Location,
        members(
            14,
            &[
                (1, m("e164-Number", tag::OCTETSTRING)),
                (2, m("globalCellID", tag::CGI)),
                (4, m("rAI", tag::OCTETSTRING)),
                (7, m("sAI", tag::SAI)),
                (8, m("oldRAI", tag::OCTETSTRING)),
                (9, m("tAI", tag::TAI)),
                (10, m("eCGI", tag::ECGI)),
                (12, m("operatorSpecificInfo", tag::OCTETSTRING)),
                (13, d("uELocationTimestamp", Timestamp)),
            ],
        ),
        NOACTION,
    );

    /* Email */

    set(
        &mut t,
        EmailIri,
        members(
            18,
            &[
                (0, m("emailIRIObjId", tag::RELATIVEOID)),
                (1, m("eventType", tag::ENUM)),
                (2, d("client-Address", IpAddress)),
                (3, d("server-Address", IpAddress)),
                (4, m("client-Port", tag::INTEGER)),
                (5, m("server-Port", tag::INTEGER)),
                (6, m("server-Octets-Sent", tag::INTEGER)),
                (7, m("client-Octets-Sent", tag::INTEGER)),
                (8, m("protocol-ID", tag::ENUM)),
                (9, m("e-mail-Sender", tag::UTF8STR)),
                (10, m("e-mail-Recipients", tag::UTF8STR)),
                (11, m("status", tag::ENUM)),
                (12, m("total-Recipient-Count", tag::INTEGER)),
                (13, m("message-ID", tag::OCTETSTRING)),
                (14, m("nationalParameter", tag::OCTETSTRING)),
                (15, m("national-EM-ASN1parameters", tag::NULL)),
                (16, d("aAAInformation", AaaInformation)),
                (17, m("e-mail-Sender-Validity", tag::ENUM)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        EmailRecipients,
        Vec::new(),
        m("recipient", tag::UTF8STR),
    );

    set(
        &mut t,
        AaaInformation,
        members(
            3,
            &[
                (0, d("pOP3AAAInformation", Pop3AaaInformation)),
                (1, d("aSMTPAAAInformation", AsmtpAaaInformation)),
                // Not an error: IMAP reuses the POP3 sequence structure.
                (2, d("iMAPAAAInformation", Pop3AaaInformation)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        Pop3AaaInformation,
        members(
            3,
            &[
                (0, m("username", tag::UTF8STR)),
                (1, m("password", tag::UTF8STR)),
                (2, m("aAAResult", tag::ENUM)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        AsmtpAaaInformation,
        members(
            5,
            &[
                (0, m("username", tag::UTF8STR)),
                (1, m("authMethod", tag::ENUM)),
                (2, m("challenge", tag::OCTETSTRING)),
                (3, m("response", tag::OCTETSTRING)),
                (4, m("aAAResult", tag::ENUM)),
            ],
        ),
        NOACTION,
    );

    /* TRI / HI1 */

    set(
        &mut t,
        TriPayload,
        members(
            14,
            &[
                (0, d("integrityCheck", IntegrityCheck)),
                (1, m("testPDU", tag::NULL)),
                (2, m("paddingPDU", tag::OCTETSTRING)),
                (3, m("keep-alive", tag::NULL)),
                (4, m("keep-aliveResponse", tag::NULL)),
                (5, m("firstSegmentFlag", tag::NULL)),
                (6, m("lastSegmentFlag", tag::NULL)),
                (7, m("cINReset", tag::NULL)),
                (8, d("operatorLeaMessage", OperatorLeaMessage)),
                (9, d("optionRequest", OptionReq)),
                (10, d("optionResponse", OptionResp)),
                (11, m("optionComplete", tag::NULL)),
                (12, m("pDUAcknowledgementRequest", tag::NULL)),
                (13, m("pDUAcknowledgementResponse", tag::NULL)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        IntegrityCheck,
        members(
            5,
            &[
                (0, m("includedSequenceNumbers", tag::INTEGER_SEQUENCE)),
                (1, m("checkType", tag::ENUM)),
                (2, m("dataType", tag::ENUM)),
                (3, m("checkValue", tag::HEX_BYTES)),
                (4, m("hashAlgorithm", tag::ENUM)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        OperatorLeaMessage,
        members(
            2,
            &[
                (0, m("messagePriority", tag::ENUM)),
                (1, m("message", tag::OCTETSTRING)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        OptionField,
        members(1, &[(0, m("pDUAcknowledgement", tag::NULL))]),
        NOACTION,
    );

    set(&mut t, OptionSeq, Vec::new(), d("Option", OptionField));

    set(
        &mut t,
        OptionReq,
        members(1, &[(0, d("requestedOptions", OptionSeq))]),
        NOACTION,
    );

    set(
        &mut t,
        OptionResp,
        members(
            2,
            &[
                (0, d("acceptedOptions", OptionSeq)),
                (1, d("declinedOptions", OptionSeq)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        Hi1Operation,
        members(
            6,
            &[
                (1, d("liActivated", Hi1Notification)),
                (2, d("liDeactivated", Hi1Notification)),
                (3, d("liModified", Hi1Notification)),
                (4, m("alarams-indicator", tag::NULL)),
                (5, m("national-HI1-ASN1parameters", tag::NULL)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        Hi1Notification,
        members(
            7,
            &[
                (0, m("domainID", tag::OID)),
                (1, m("lawfulInterceptionIdentifier", tag::OCTETSTRING)),
                (2, d("communicationIdentifier", Hi2OpCid)),
                (3, d("timeStamp", Timestamp)),
                (5, m("national-HI1-ASN1parameters", tag::NULL)),
                (6, m("target-Information", tag::OCTETSTRING)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        Hi2OpCid,
        members(
            2,
            &[
                (0, m("communication-Identity-Number", tag::OCTETSTRING)),
                (1, d("network-Identifier", Hi2OpNetId)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        Hi2OpNetId,
        members(
            2,
            &[
                (0, m("operator-Identifier", tag::OCTETSTRING)),
                (1, d("network-Element-Identifier", NetElId)),
            ],
        ),
        NOACTION,
    );

    /* Encryption */

    set(
        &mut t,
        EncryptionContainer,
        members(
            3,
            &[
                (0, m("encryptionType", tag::ENUM)),
                // Decrypted first, then descended into.
                (
                    1,
                    MemberAction {
                        name: "encryptedPayload",
                        descend: Some(EncryptedPayload as NodeId),
                        interpret: tag::ENCRYPTED,
                    },
                ),
                (2, m("encryptedPayloadType", tag::ENUM)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        EncryptedPayload,
        members(
            2,
            &[
                (0, m("byteCounter", tag::INTEGER)),
                (1, d("payload", Payload)),
            ],
        ),
        NOACTION,
    );

    set(
        &mut t,
        EncryptedPayloadRoot,
        Vec::new(),
        d("encryptedPayload", EncryptedPayload),
    );

    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_builds() {
        let tree = etsi_schema();
        let root = tree.node(EtsiNode::Root.into());
        assert_eq!(root.sequence.name, "pS-PDU");
        assert_eq!(root.sequence.descend, Some(EtsiNode::PsPdu as NodeId));
    }

    #[test]
    fn test_psheader_members() {
        let tree = etsi_schema();
        let seqno = tree.member(EtsiNode::PsHeader.into(), 4).unwrap();
        assert_eq!(seqno.name, "sequenceNumber");
        assert_eq!(seqno.interpret, tag::INTEGER);

        let cid = tree.member(EtsiNode::PsHeader.into(), 3).unwrap();
        assert_eq!(cid.descend, Some(EtsiNode::Cid as NodeId));
    }

    #[test]
    fn test_cyclic_payload_reference() {
        let tree = etsi_schema();
        let enc = tree.member(EtsiNode::EncryptionContainer.into(), 1).unwrap();
        assert_eq!(enc.interpret, tag::ENCRYPTED);
        let inner = tree
            .member(EtsiNode::EncryptedPayload.into(), 1)
            .unwrap();
        assert_eq!(inner.descend, Some(EtsiNode::Payload as NodeId));
    }

    #[test]
    fn test_keepalive_members() {
        let tree = etsi_schema();
        assert_eq!(
            tree.member(EtsiNode::TriPayload.into(), 3).unwrap().name,
            "keep-alive"
        );
        assert_eq!(
            tree.member(EtsiNode::TriPayload.into(), 4).unwrap().name,
            "keep-aliveResponse"
        );
    }
}
