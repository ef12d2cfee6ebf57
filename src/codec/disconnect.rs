//! DISCONNECT (MQTT 5.0 §3.14). v3.1.1's DISCONNECT has no variable header
//! at all; v5 adds a reason code and properties, both optional when the
//! reason is `NormalDisconnection` and there is nothing else to report.

use crate::error::{DecodeError, EncodeError};
use crate::properties::{decode_properties, encode_properties, encoded_properties_len, Property};
use crate::types::{ProtocolVersion, ReasonCode};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisconnectProperties {
    pub session_expiry_interval: Option<u32>,
    pub reason_string: Option<String>,
    pub user_properties: Vec<(String, String)>,
    pub server_reference: Option<String>,
}

impl DisconnectProperties {
    fn decode(bytes: &[u8]) -> Result<(Self, usize), DecodeError> {
        let (list, consumed) = decode_properties(bytes)?;
        let mut out = Self::default();
        for prop in list {
            match prop {
                Property::SessionExpiryInterval(v) => out.session_expiry_interval = Some(v),
                Property::ReasonString(v) => out.reason_string = Some(v),
                Property::UserProperty(k, v) => out.user_properties.push((k, v)),
                Property::ServerReference(v) => out.server_reference = Some(v),
                _ => return Err(DecodeError::ProtocolViolation),
            }
        }
        Ok((out, consumed))
    }

    fn as_list(&self) -> Vec<Property> {
        let mut list = Vec::new();
        if let Some(v) = self.session_expiry_interval {
            list.push(Property::SessionExpiryInterval(v));
        }
        if let Some(v) = &self.reason_string {
            list.push(Property::ReasonString(v.clone()));
        }
        if let Some(v) = &self.server_reference {
            list.push(Property::ServerReference(v.clone()));
        }
        for (k, v) in &self.user_properties {
            list.push(Property::UserProperty(k.clone(), v.clone()));
        }
        list
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisconnectPacket {
    pub reason_code: ReasonCode,
    pub properties: DisconnectProperties,
}

impl DisconnectPacket {
    pub fn normal() -> Self {
        Self { reason_code: ReasonCode::Success, properties: DisconnectProperties::default() }
    }

    fn has_tail(&self) -> bool {
        self.reason_code != ReasonCode::Success || !self.properties.as_list().is_empty()
    }

    pub fn encode(&self, buf: &mut Vec<u8>, version: ProtocolVersion) -> Result<(), EncodeError> {
        if version.is_v5() && self.has_tail() {
            buf.push(self.reason_code.value());
            encode_properties(buf, &self.properties.as_list())?;
        }
        Ok(())
    }

    pub fn encoded_len(&self, version: ProtocolVersion) -> usize {
        if version.is_v5() && self.has_tail() {
            1 + encoded_properties_len(&self.properties.as_list())
        } else {
            0
        }
    }

    pub fn decode(bytes: &[u8], version: ProtocolVersion) -> Result<Self, DecodeError> {
        if !version.is_v5() || bytes.is_empty() {
            return Ok(Self::normal());
        }
        let reason_code = ReasonCode::from_u8(bytes[0])?;
        let properties = if bytes.len() > 1 {
            DisconnectProperties::decode(&bytes[1..])?.0
        } else {
            DisconnectProperties::default()
        };
        Ok(Self { reason_code, properties })
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn normal_disconnect_encodes_to_nothing_on_v5() {
        let packet = DisconnectPacket::normal();
        let mut buf = Vec::new();
        packet.encode(&mut buf, ProtocolVersion::V5).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn v311_never_has_a_body() {
        let packet = DisconnectPacket { reason_code: ReasonCode::UnspecifiedError, properties: Default::default() };
        let mut buf = Vec::new();
        packet.encode(&mut buf, ProtocolVersion::V311).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn round_trips_with_reason_and_server_reference() {
        let packet = DisconnectPacket {
            reason_code: ReasonCode::ServerShuttingDown,
            properties: DisconnectProperties { server_reference: Some("broker2.example".into()), ..Default::default() },
        };
        let mut buf = Vec::new();
        packet.encode(&mut buf, ProtocolVersion::V5).unwrap();
        let decoded = DisconnectPacket::decode(&buf, ProtocolVersion::V5).unwrap();
        assert_eq!(decoded, packet);
    }
}
