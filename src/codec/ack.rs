//! The four single-packet-identifier acknowledgments: PUBACK, PUBREC,
//! PUBREL, PUBCOMP (MQTT 5.0 §3.4, §3.5, §3.6, §3.7). Identical shape in
//! both protocol versions except for the v5 reason code / properties tail,
//! so one codec serves all four.

use crate::error::{DecodeError, EncodeError};
use crate::properties::{decode_properties, encode_properties, encoded_properties_len, Property};
use crate::types::{PacketId, ProtocolVersion, ReasonCode};

/// `Reason String` / `User Property` only — the property set shared by
/// PUBACK/PUBREC/PUBREL/PUBCOMP (MQTT 5.0 §3.4.2.2.2).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AckProperties {
    pub reason_string: Option<String>,
    pub user_properties: Vec<(String, String)>,
}

impl AckProperties {
    fn decode(bytes: &[u8]) -> Result<(Self, usize), DecodeError> {
        let (list, consumed) = decode_properties(bytes)?;
        let mut out = Self::default();
        for prop in list {
            match prop {
                Property::ReasonString(v) => out.reason_string = Some(v),
                Property::UserProperty(k, v) => out.user_properties.push((k, v)),
                _ => return Err(DecodeError::ProtocolViolation),
            }
        }
        Ok((out, consumed))
    }

    fn as_list(&self) -> Vec<Property> {
        let mut list = Vec::new();
        if let Some(v) = &self.reason_string {
            list.push(Property::ReasonString(v.clone()));
        }
        for (k, v) in &self.user_properties {
            list.push(Property::UserProperty(k.clone(), v.clone()));
        }
        list
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AckPacket {
    pub id: PacketId,
    pub reason_code: ReasonCode,
    pub properties: AckProperties,
}

impl AckPacket {
    pub fn simple(id: PacketId) -> Self {
        Self { id, reason_code: ReasonCode::Success, properties: AckProperties::default() }
    }

    pub fn encode(&self, buf: &mut Vec<u8>, version: ProtocolVersion) -> Result<(), EncodeError> {
        buf.extend_from_slice(&self.id.get().to_be_bytes());
        // MQTT-3.4.2.2.1: reason code and properties may be omitted entirely
        // when the reason is Success and there are no properties.
        if version.is_v5() && (self.reason_code != ReasonCode::Success || !self.properties.as_list().is_empty()) {
            buf.push(self.reason_code.value());
            encode_properties(buf, &self.properties.as_list())?;
        }
        Ok(())
    }

    pub fn encoded_len(&self, version: ProtocolVersion) -> usize {
        let mut len = 2;
        if version.is_v5() && (self.reason_code != ReasonCode::Success || !self.properties.as_list().is_empty()) {
            len += 1 + encoded_properties_len(&self.properties.as_list());
        }
        len
    }

    pub fn decode(bytes: &[u8], remaining_length: u32, version: ProtocolVersion) -> Result<Self, DecodeError> {
        if bytes.len() < 2 {
            return Err(DecodeError::UnexpectedEof);
        }
        let raw_id = u16::from_be_bytes([bytes[0], bytes[1]]);
        let id = PacketId::new(raw_id).ok_or(DecodeError::ProtocolViolation)?;

        if !version.is_v5() || remaining_length == 2 {
            return Ok(Self::simple(id));
        }

        let reason_code = ReasonCode::from_u8(*bytes.get(2).ok_or(DecodeError::UnexpectedEof)?)?;
        let properties = if bytes.len() > 3 {
            AckProperties::decode(&bytes[3..])?.0
        } else {
            AckProperties::default()
        };

        Ok(Self { id, reason_code, properties })
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn success_with_no_properties_omits_tail_on_v5() {
        let packet = AckPacket::simple(PacketId::new(7).unwrap());
        let mut buf = Vec::new();
        packet.encode(&mut buf, ProtocolVersion::V5).unwrap();
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn round_trips_failure_reason_with_reason_string() {
        let packet = AckPacket {
            id: PacketId::new(7).unwrap(),
            reason_code: ReasonCode::PacketIdentifierInUse,
            properties: AckProperties { reason_string: Some("dup".into()), user_properties: vec![] },
        };
        let mut buf = Vec::new();
        packet.encode(&mut buf, ProtocolVersion::V5).unwrap();
        let decoded = AckPacket::decode(&buf, buf.len() as u32, ProtocolVersion::V5).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn v311_never_encodes_a_tail() {
        let packet = AckPacket::simple(PacketId::new(1).unwrap());
        let mut buf = Vec::new();
        packet.encode(&mut buf, ProtocolVersion::V311).unwrap();
        assert_eq!(buf, vec![0x00, 0x01]);
    }
}
