//! Enumeration label tables
//!
//! Maps an enumerated field's integer value to its name from the ETSI LI
//! ASN.1 modules. Fields are identified by (schema node, context
//! identifier); an unknown pair or value yields `None` and the caller
//! falls back to decimal rendering.

use crate::nodes::EtsiNode;

/// Look up the human-readable name of an enumerated value.
pub fn enum_label(node: EtsiNode, ident: u32, value: i64) -> Option<&'static str> {
    use EtsiNode::*;

    match (node, ident) {
        // iP-type
        (IpAddress, 1) => match value {
            0 => Some("IPv4"),
            1 => Some("IPv6"),
            _ => None,
        },

        // iP-assignment
        (IpAddress, 3) => match value {
            1 => Some("Static"),
            2 => Some("Dynamic"),
            3 => Some("Not Known"),
            _ => None,
        },

        // payloadDirection
        (CcPayload, 0) => match value {
            0 => Some("fromTarget"),
            1 => Some("toTarget"),
            2 => Some("indeterminate"),
            3 => Some("combined"),
            4 => Some("notApplicable"),
            _ => None,
        },

        // checkType
        (IntegrityCheck, 1) => match value {
            1 => Some("Hash"),
            2 => Some("DSS/DSA signature"),
            _ => None,
        },

        // dataType
        (IntegrityCheck, 2) => match value {
            1 => Some("IRI"),
            2 => Some("CC"),
            3 => Some("ILHI"),
            _ => None,
        },

        // hashAlgorithm
        (IntegrityCheck, 4) => match value {
            1 => Some("SHA-1"),
            2 => Some("SHA-256"),
            3 => Some("SHA-384"),
            4 => Some("SHA-512"),
            _ => None,
        },

        // timeStampQualifier
        (CcPayload, 4) | (IriPayload, 4) | (PsHeader, 8) => match value {
            0 => Some("unknown"),
            1 => Some("timeOfInterception"),
            2 => Some("timeOfMediation"),
            3 => Some("timeOfAggregation"),
            _ => None,
        },

        // accessEventType
        (IpIriContents, 0) => match value {
            0 => Some("accessAttempt"),
            1 => Some("accessAccept"),
            2 => Some("accessReject"),
            3 => Some("accessFailed"),
            4 => Some("sessionStart"),
            5 => Some("sessionEnd"),
            6 => Some("interimUpdate"),
            7 => Some("startOfInterceptionWithSessionActive"),
            8 => Some("accessEnd"),
            9 => Some("endOfInterceptionWithSessionActive"),
            10 => Some("unknown"),
            _ => None,
        },

        // internetAccessType
        (IpIriContents, 2) => match value {
            0 => Some("undefined"),
            1 => Some("dialUp"),
            2 => Some("xDSL"),
            3 => Some("cableModem"),
            4 => Some("LAN"),
            5 => Some("wirelessLAN"),
            6 => Some("Fiber"),
            7 => Some("WIMAX/HIPERMAN"),
            8 => Some("Satellite"),
            9 => Some("Wireless-Other"),
            _ => None,
        },

        // iPVersion
        (IpIriContents, 3) => match value {
            1 => Some("IPv4"),
            2 => Some("IPv6"),
            3 => Some("IPv4-IPv6"),
            _ => None,
        },

        // endReason
        (IpIriContents, 12) => match value {
            0 => Some("undefined"),
            1 => Some("regularLogOff"),
            2 => Some("connectionLoss"),
            3 => Some("connectionTimeout"),
            4 => Some("leaseExpired"),
            _ => None,
        },

        // authenticationType
        (IpIriContents, 22) => match value {
            0 => Some("unknown"),
            1 => Some("static"),
            2 => Some("Radius-AAA"),
            3 => Some("DHCP-AAA"),
            4 => Some("Diameter-AAA"),
            _ => None,
        },

        // iRIType
        (IriPayload, 0) => match value {
            1 => Some("IRI-Begin"),
            2 => Some("IRI-End"),
            3 => Some("IRI-Continue"),
            4 => Some("IRI-Report"),
            _ => None,
        },

        // messagePriority
        (OperatorLeaMessage, 0) => match value {
            1 => Some("Error"),
            2 => Some("Informational"),
            _ => None,
        },

        // frameType
        (IpMmCc, 2) => match value {
            0 => Some("ipFrame"),
            1 => Some("udpFrame"),
            2 => Some("rtpFrame"),
            3 => Some("audioFrame"),
            4 => Some("tcpFrame"),
            5 => Some("artificialRtpFrame"),
            6 => Some("udptlFrame"),
            _ => None,
        },

        // mMCCprotocol
        (IpMmCc, 4) => match value {
            0 => Some("rTP"),
            1 => Some("mSRP"),
            2 => Some("uDPTL"),
            _ => None,
        },

        // initiator
        (UmtsIriParams, 4) | (EpsIriParams, 4) => match value {
            0 => Some("not-Available"),
            1 => Some("originating-Target"),
            2 => Some("terminating-Target"),
            _ => None,
        },

        // iRIversion
        (UmtsIriParams, 23) => match value {
            2 => Some("version2"),
            3 => Some("version3"),
            4 => Some("version4"),
            6 => Some("version6"),
            8 => Some("lastVersion"),
            _ => None,
        },

        // gPRSevent
        (UmtsIriParams, 20) => match value {
            1 => Some("pDPContextActivation"),
            2 => Some("startOfInterceptionWithPDPContextActive"),
            4 => Some("pDPContextDeactivation"),
            5 => Some("gPRSAttach"),
            6 => Some("gPRSDetach"),
            10 => Some("locationInfoUpdate"),
            11 => Some("sMS"),
            13 => Some("pDPContextModification"),
            14 => Some("servingSystem"),
            15 => Some("startOfInterceptionWithMSAttached"),
            16 => Some("packetDataHeaderInformation"),
            17 => Some("hSS-Subscriber-Record-Change"),
            18 => Some("registration-Termination"),
            19 => Some("location-Up-Date"),
            20 => Some("cancel-Location"),
            21 => Some("register-Location"),
            22 => Some("location-Information-Request"),
            _ => None,
        },

        // winterSummerIndication
        (LocalTimestamp, 1) => match value {
            0 => Some("notProvided"),
            1 => Some("winterTime"),
            2 => Some("summerTime"),
            _ => None,
        },

        // party-Qualifier; strangely, only one valid value exists
        (PartyInfo, 0) => match value {
            3 => Some("gPRS-Target"),
            _ => None,
        },

        // email eventType
        (EmailIri, 1) => match value {
            1 => Some("e-mail-send"),
            2 => Some("e-mail-receive"),
            3 => Some("e-mail-download"),
            4 => Some("e-mail-logon-attempt"),
            5 => Some("e-mail-logon"),
            6 => Some("e-mail-logon-failure"),
            7 => Some("e-mail-logoff"),
            8 => Some("e-mail-partial-download"),
            9 => Some("e-mail-upload"),
            _ => None,
        },

        // E-mail-Protocol
        (EmailIri, 8) => match value {
            1 => Some("smtp"),
            2 => Some("pop3"),
            3 => Some("imap4"),
            4 => Some("webmail"),
            255 => Some("undefined"),
            _ => None,
        },

        // E-mail-Status
        (EmailIri, 11) => match value {
            1 => Some("status-unknown"),
            2 => Some("operation-failed"),
            3 => Some("operation-succeeded"),
            _ => None,
        },

        // e-mail-Sender-Validity
        (EmailIri, 17) => match value {
            0 => Some("validated"),
            1 => Some("nonvalidated"),
            _ => None,
        },

        // email-Format
        (EmailCc, 1) => match value {
            1 => Some("ip-packet"),
            2 => Some("application"),
            _ => None,
        },

        // aAAResult
        (Pop3AaaInformation, 2) | (AsmtpAaaInformation, 4) => match value {
            1 => Some("resultUnknown"),
            2 => Some("aAAFailed"),
            3 => Some("aAASucceeded"),
            _ => None,
        },

        // AAAauthMethod
        (AsmtpAaaInformation, 1) => match value {
            1 => Some("undefinedAuthMethod"),
            2 => Some("cramMD5"),
            3 => Some("digestMD5"),
            _ => None,
        },

        // encryptionType
        (EncryptionContainer, 0) => match value {
            1 => Some("None"),
            2 => Some("national-option"),
            3 => Some("AES-192-CBC"),
            4 => Some("AES-256-CBC"),
            5 => Some("blowfish-192-CBC"),
            6 => Some("blowfish-256-CBC"),
            7 => Some("threedes-cbc"),
            _ => None,
        },

        // encryptedPayloadType
        (EncryptionContainer, 2) => match value {
            1 => Some("Unknown"),
            2 => Some("part2"),
            3 => Some("part3"),
            4 => Some("part4"),
            5 => Some("part5"),
            6 => Some("part6"),
            7 => Some("part7"),
            8 => Some("part1"),
            _ => None,
        },

        // ePSEvent
        (EpsIriParams, 20) => match value {
            1 => Some("pDPContextActivation"),
            2 => Some("startOfInterceptionWithPDPContextActive"),
            4 => Some("pDPContextDeactivation"),
            5 => Some("gPRSAttach"),
            6 => Some("gPRSDetach"),
            10 => Some("locationInfoUpdate"),
            11 => Some("sMS"),
            13 => Some("pDPContextModification"),
            14 => Some("servingSystem"),
            15 => Some("startofInterceptionWithMSAttached"),
            16 => Some("e-UTRANAttach"),
            17 => Some("e-UTRANDetach"),
            18 => Some("bearerActivation"),
            19 => Some("startOfInterceptionWithActiveBearer"),
            20 => Some("bearerModification"),
            21 => Some("bearerDeactivation"),
            22 => Some("uERequestedBearerResourceModification"),
            23 => Some("uERequestedPDNConnectivity"),
            24 => Some("uERequestedPDNDisconnection"),
            25 => Some("trackingAreaEpsLocationUpdate"),
            26 => Some("servingEvolvedPacketSystem"),
            27 => Some("pMIPAttachTunnelActivation"),
            28 => Some("pMIPDetachTunnelDeactivation"),
            29 => Some("startOfInterceptionWithActivePMIPTunnel"),
            30 => Some("pMIPPdnGwInitiatedPdnDisconnection"),
            31 => Some("mIPRegistrationTunnelActivation"),
            32 => Some("mIPDeregistrationTunnelDeactivation"),
            33 => Some("startOfInterceptionWithActiveMIPTunnel"),
            34 => Some("dSMIPRegistrationTunnelActivation"),
            35 => Some("dSMIPDeregistrationTunnelDeactivation"),
            36 => Some("startOfInterceptionWithActiveDsmipTunnel"),
            37 => Some("dSMipHaSwitch"),
            38 => Some("pMIPResourceAllocationDeactivation"),
            39 => Some("mIPResourceAllocationDeactivation"),
            40 => Some("pMIPsessionModification"),
            41 => Some("startOfInterceptionWithEUTRANAttachedUE"),
            42 => Some("dSMIPSessionModification"),
            43 => Some("packetDataHeaderInformation"),
            44 => Some("hSS-Subscriber-Record-Change"),
            45 => Some("registration-Termination"),
            46 => Some("location-Up-Date"),
            47 => Some("cancel-Location"),
            48 => Some("register-Location"),
            49 => Some("location-Information-Request"),
            50 => Some("proSeRemoteUEReport"),
            51 => Some("proSeRemoteUEStartOfCommunication"),
            52 => Some("proSeRemoteUEEndOfCommunication"),
            53 => Some("startOfLIwithProSeRemoteUEOngoingComm"),
            54 => Some("startOfLIforProSeUEtoNWRelay"),
            55 => Some("scefRequestednonIPPDNDisconnection"),
            _ => None,
        },

        // iMSEvent
        (EpsIriParams, 29) => match value {
            1 => Some("unfilteredSIPmessage"),
            2 => Some("sIPheaderOnly"),
            3 => Some("decryptionKeysAvailable"),
            4 => Some("startOfInterceptionForIMSEstablishedSession"),
            5 => Some("xCAPRequest"),
            6 => Some("xCAPResponse"),
            7 => Some("ccUnavailable"),
            8 => Some("sMSOverIMS"),
            9 => Some("servingSystem"),
            10 => Some("subscriberRecordChange"),
            11 => Some("registrationTermination"),
            12 => Some("locationInformationRequest"),
            _ => None,
        },

        // ldiEvent
        (EpsIriParams, 34) => match value {
            1 => Some("targetEntersIA"),
            2 => Some("targetLeavesIA"),
            _ => None,
        },

        // typeOfBearer
        (EpsGtpv2Params, 10) | (EpsGtpv2Params, 21) => match value {
            1 => Some("defaultBearer"),
            2 => Some("dedicatedBearer"),
            _ => None,
        },

        // TPDU-direction
        (UlicHeader, 6) => match value {
            1 => Some("from-target"),
            2 => Some("to-target"),
            3 => Some("unknown"),
            _ => None,
        },

        // ICE-type
        (UlicHeader, 8) => match value {
            1 => Some("sgsn"),
            2 => Some("ggsn"),
            3 => Some("s-GW"),
            4 => Some("pDN-GW"),
            5 => Some("colocated-SAE-GWs"),
            6 => Some("ePDG"),
            _ => None,
        },

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_labels() {
        assert_eq!(enum_label(EtsiNode::CcPayload, 0, 0), Some("fromTarget"));
        assert_eq!(enum_label(EtsiNode::CcPayload, 0, 1), Some("toTarget"));
        assert_eq!(enum_label(EtsiNode::CcPayload, 0, 9), None);
    }

    #[test]
    fn test_qualifier_shared_across_nodes() {
        for node in [EtsiNode::CcPayload, EtsiNode::IriPayload] {
            assert_eq!(enum_label(node, 4, 1), Some("timeOfInterception"));
        }
        assert_eq!(enum_label(EtsiNode::PsHeader, 8, 2), Some("timeOfMediation"));
    }

    #[test]
    fn test_unknown_field_is_none() {
        assert_eq!(enum_label(EtsiNode::PsHeader, 1, 1), None);
    }

    #[test]
    fn test_encryption_types() {
        assert_eq!(
            enum_label(EtsiNode::EncryptionContainer, 0, 3),
            Some("AES-192-CBC")
        );
    }
}
