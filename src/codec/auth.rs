//! AUTH (MQTT 5.0 §3.15), introduced in v5 for re-authentication and
//! challenge/response (SCRAM and similar) flows. Not present in v3.

use crate::error::{DecodeError, EncodeError};
use crate::properties::AuthenticationProperties;
use crate::types::ReasonCode;

#[derive(Debug, Clone, PartialEq)]
pub struct AuthPacket {
    pub reason_code: ReasonCode,
    pub properties: AuthenticationProperties,
}

impl AuthPacket {
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
        buf.push(self.reason_code.value());
        self.properties.encode(buf)
    }

    pub fn encoded_len(&self) -> usize {
        1 + self.properties.encoded_len()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            // AUTH's reason code may be omitted only when it is Success
            // and there are no properties (MQTT-3.15.2-1 shares the same
            // omission rule as the ack family).
            return Ok(Self { reason_code: ReasonCode::Success, properties: AuthenticationProperties::default() });
        }
        let reason_code = ReasonCode::from_u8(bytes[0])?;
        let properties = if bytes.len() > 1 {
            AuthenticationProperties::decode(&bytes[1..])?.0
        } else {
            AuthenticationProperties::default()
        };
        Ok(Self { reason_code, properties })
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn round_trips_continue_authentication() {
        let packet = AuthPacket {
            reason_code: ReasonCode::ContinueAuthentication,
            properties: AuthenticationProperties {
                authentication_method: Some("SCRAM-SHA-1".into()),
                authentication_data: Some(bytes::Bytes::from_static(b"challenge")),
                ..Default::default()
            },
        };
        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), packet.encoded_len());
        let decoded = AuthPacket::decode(&buf).unwrap();
        assert_eq!(decoded, packet);
    }
}
