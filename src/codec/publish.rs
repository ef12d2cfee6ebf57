//! PUBLISH packet (MQTT 5.0 §3.3). Carries the only payload bytes that
//! aren't interpreted by the protocol itself.

use bytes::Bytes;

use crate::error::{DecodeError, EncodeError};
use crate::properties::PublishProperties;
use crate::types::{decode_str, encode_str, encoded_str_len, PacketId, ProtocolVersion, QoS, TopicName};

#[derive(Debug, Clone, PartialEq)]
pub struct PublishPacket {
    /// `None` only occurs on the wire as an empty string, legal in MQTT 5.0
    /// when a topic alias carries the real topic instead (§4.13).
    pub topic: Option<TopicName>,
    pub id: Option<PacketId>,
    pub payload: Bytes,
    pub qos: QoS,
    pub retain: bool,
    pub duplicate: bool,
    pub properties: PublishProperties,
}

impl PublishPacket {
    pub fn flags(&self) -> u8 {
        let mut flags = self.qos.as_u8() << 1;
        if self.retain {
            flags |= 0x01;
        }
        if self.duplicate {
            flags |= 0x08;
        }
        flags
    }

    pub fn encode(&self, buf: &mut Vec<u8>, version: ProtocolVersion) -> Result<(), EncodeError> {
        encode_str(buf, self.topic.as_ref().map(TopicName::as_str).unwrap_or(""));
        if self.qos != QoS::AtMostOnce {
            let id = self.id.ok_or(EncodeError::TooLarge)?;
            buf.extend_from_slice(&id.get().to_be_bytes());
        }
        if version.is_v5() {
            self.properties.encode(buf)?;
        }
        buf.extend_from_slice(&self.payload);
        Ok(())
    }

    pub fn encoded_len(&self, version: ProtocolVersion) -> Result<usize, EncodeError> {
        let mut len = encoded_str_len(self.topic.as_ref().map(TopicName::as_str).unwrap_or(""));
        if self.qos != QoS::AtMostOnce {
            len += 2;
        }
        if version.is_v5() {
            len += self.properties.encoded_len()?;
        }
        len += self.payload.len();
        Ok(len)
    }

    pub fn decode(bytes: &[u8], flags: u8, version: ProtocolVersion) -> Result<Self, DecodeError> {
        let qos = QoS::from_u8((flags >> 1) & 0x03).map_err(|_| DecodeError::MalformedPacket)?;
        let retain = flags & 0x01 != 0;
        let duplicate = flags & 0x08 != 0;
        if duplicate && qos == QoS::AtMostOnce {
            return Err(DecodeError::ProtocolViolation); // MQTT-3.3.1-2
        }

        let (topic, mut offset) = decode_str(bytes)?;
        let topic = if topic.is_empty() { None } else { Some(TopicName::new(topic).ok_or(DecodeError::ProtocolViolation)?) };

        let id = if qos != QoS::AtMostOnce {
            if bytes.len() < offset + 2 {
                return Err(DecodeError::UnexpectedEof);
            }
            let raw = u16::from_be_bytes([bytes[offset], bytes[offset + 1]]);
            offset += 2;
            Some(PacketId::new(raw).ok_or(DecodeError::ProtocolViolation)?)
        } else {
            None
        };

        let properties = if version.is_v5() {
            let (props, n) = PublishProperties::decode(&bytes[offset..])?;
            offset += n;
            props
        } else {
            PublishProperties::default()
        };

        let payload = Bytes::copy_from_slice(&bytes[offset..]);

        Ok(Self { topic, id, payload, qos, retain, duplicate, properties })
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    fn sample(qos: QoS, id: Option<PacketId>) -> PublishPacket {
        PublishPacket {
            topic: Some(TopicName::new("a/b").unwrap()),
            id,
            payload: Bytes::from_static(b"hello"),
            qos,
            retain: false,
            duplicate: false,
            properties: Default::default(),
        }
    }

    #[test]
    fn round_trips_qos0_v311() {
        let packet = sample(QoS::AtMostOnce, None);
        let mut buf = Vec::new();
        packet.encode(&mut buf, ProtocolVersion::V311).unwrap();
        let decoded = PublishPacket::decode(&buf, packet.flags(), ProtocolVersion::V311).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn round_trips_qos2_v5_with_properties() {
        let mut packet = sample(QoS::ExactlyOnce, PacketId::new(42));
        packet.properties.topic_alias = Some(1);
        let mut buf = Vec::new();
        packet.encode(&mut buf, ProtocolVersion::V5).unwrap();
        let decoded = PublishPacket::decode(&buf, packet.flags(), ProtocolVersion::V5).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn empty_topic_decodes_as_none_for_alias_only_publish() {
        let mut packet = sample(QoS::AtMostOnce, None);
        packet.topic = None;
        packet.properties.topic_alias = Some(7);
        let mut buf = Vec::new();
        packet.encode(&mut buf, ProtocolVersion::V5).unwrap();
        let decoded = PublishPacket::decode(&buf, packet.flags(), ProtocolVersion::V5).unwrap();
        assert_eq!(decoded.topic, None);
        assert_eq!(decoded.properties.topic_alias, Some(7));
    }

    #[test]
    fn rejects_duplicate_flag_on_qos0() {
        let bytes = {
            let mut b = Vec::new();
            encode_str(&mut b, "a");
            b
        };
        assert_eq!(
            PublishPacket::decode(&bytes, 0x08, ProtocolVersion::V311),
            Err(DecodeError::ProtocolViolation)
        );
    }
}
