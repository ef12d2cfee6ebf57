//! CONNACK packet (MQTT 5.0 §3.2). v3/v3.1.1 carry a one-byte return code
//! with a fixed meaning table; v5 carries a full [`ReasonCode`] plus
//! properties describing the server's negotiated limits.

use crate::error::DecodeError;
use crate::properties::ServerProperties;
use crate::types::{ProtocolVersion, ReasonCode};

#[derive(Debug, Clone, PartialEq)]
pub struct ConnAckPacket {
    pub session_present: bool,
    pub reason_code: ReasonCode,
    pub properties: ServerProperties,
}

impl ConnAckPacket {
    /// A client never sends CONNACK; this type is decode-only.
    pub fn decode(bytes: &[u8], version: ProtocolVersion) -> Result<Self, DecodeError> {
        if bytes.len() < 2 {
            return Err(DecodeError::UnexpectedEof);
        }
        let ack_flags = bytes[0];
        if ack_flags & !0x01 != 0 {
            return Err(DecodeError::MalformedPacket);
        }
        let session_present = ack_flags & 0x01 != 0;
        let reason_code = ReasonCode::from_u8(bytes[1])?;

        let properties = if version.is_v5() {
            ServerProperties::decode(&bytes[2..])?.0
        } else {
            ServerProperties::default()
        };

        Ok(Self { session_present, reason_code, properties })
    }
}
