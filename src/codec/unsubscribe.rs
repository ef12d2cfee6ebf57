//! UNSUBSCRIBE / UNSUBACK (MQTT 5.0 §3.10, §3.11).

use crate::error::{DecodeError, EncodeError};
use crate::properties::UnsubscriptionProperties;
use crate::types::{decode_str, encode_str, encoded_str_len, PacketId, ProtocolVersion, ReasonCode, TopicFilter};

#[derive(Debug, Clone, PartialEq)]
pub struct UnsubscribePacket {
    pub id: PacketId,
    pub filters: Vec<TopicFilter>,
    pub properties: UnsubscriptionProperties,
}

impl UnsubscribePacket {
    pub fn encode(&self, buf: &mut Vec<u8>, version: ProtocolVersion) -> Result<(), EncodeError> {
        buf.extend_from_slice(&self.id.get().to_be_bytes());
        if version.is_v5() {
            self.properties.encode(buf)?;
        }
        for filter in &self.filters {
            encode_str(buf, filter.as_str());
        }
        Ok(())
    }

    pub fn encoded_len(&self, version: ProtocolVersion) -> usize {
        let mut len = 2;
        if version.is_v5() {
            len += self.properties.encoded_len();
        }
        for filter in &self.filters {
            len += encoded_str_len(filter.as_str());
        }
        len
    }

    pub fn decode(bytes: &[u8], version: ProtocolVersion) -> Result<Self, DecodeError> {
        if bytes.len() < 2 {
            return Err(DecodeError::UnexpectedEof);
        }
        let id = PacketId::new(u16::from_be_bytes([bytes[0], bytes[1]])).ok_or(DecodeError::ProtocolViolation)?;
        let mut offset = 2;

        let properties = if version.is_v5() {
            let (props, n) = UnsubscriptionProperties::decode(&bytes[offset..])?;
            offset += n;
            props
        } else {
            UnsubscriptionProperties::default()
        };

        let mut filters = Vec::new();
        while offset < bytes.len() {
            let (raw, n) = decode_str(&bytes[offset..])?;
            offset += n;
            filters.push(TopicFilter::new(raw).ok_or(DecodeError::ProtocolViolation)?);
        }
        if filters.is_empty() {
            return Err(DecodeError::ProtocolViolation); // MQTT-3.10.3-2
        }

        Ok(Self { id, filters, properties })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnsubAckPacket {
    pub id: PacketId,
    /// v3.1.1 has no reason codes at all; this is empty in that case and
    /// the unsubscribe is always treated as succeeding.
    pub reason_codes: Vec<ReasonCode>,
}

impl UnsubAckPacket {
    pub fn decode(bytes: &[u8], version: ProtocolVersion) -> Result<Self, DecodeError> {
        if bytes.len() < 2 {
            return Err(DecodeError::UnexpectedEof);
        }
        let id = PacketId::new(u16::from_be_bytes([bytes[0], bytes[1]])).ok_or(DecodeError::ProtocolViolation)?;
        if !version.is_v5() {
            return Ok(Self { id, reason_codes: Vec::new() });
        }

        let mut offset = 2;
        let (_, n) = UnsubscriptionProperties::decode(&bytes[offset..])?;
        offset += n;

        let reason_codes = bytes[offset..]
            .iter()
            .map(|&b| ReasonCode::from_u8(b))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { id, reason_codes })
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn round_trips_v5() {
        let packet = UnsubscribePacket {
            id: PacketId::new(5).unwrap(),
            filters: vec![TopicFilter::new("a/b").unwrap(), TopicFilter::new("c/#").unwrap()],
            properties: UnsubscriptionProperties { user_properties: vec![("k".into(), "v".into())] },
        };
        let mut buf = Vec::new();
        packet.encode(&mut buf, ProtocolVersion::V5).unwrap();
        assert_eq!(buf.len(), packet.encoded_len(ProtocolVersion::V5));
        let decoded = UnsubscribePacket::decode(&buf, ProtocolVersion::V5).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn v311_unsuback_has_no_reason_codes() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&5u16.to_be_bytes());
        let decoded = UnsubAckPacket::decode(&buf, ProtocolVersion::V311).unwrap();
        assert!(decoded.reason_codes.is_empty());
    }
}
