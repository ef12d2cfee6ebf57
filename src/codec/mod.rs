//! The wire codec (component C2): fixed header plus, per packet type, a
//! variable header and payload. [`ControlPacket`] is the tagged union
//! everything above this module operates on; nothing outside `codec`
//! matches on a raw packet-type byte.

mod ack;
mod auth;
mod connack;
mod connect;
mod disconnect;
mod fixed_header;
mod publish;
mod subscribe;
mod unsubscribe;

pub use ack::{AckPacket, AckProperties};
pub use auth::AuthPacket;
pub use connack::ConnAckPacket;
pub use connect::{ConnectPacket, Will};
pub use disconnect::{DisconnectPacket, DisconnectProperties};
pub use fixed_header::{FixedHeader, PacketType};
pub use publish::PublishPacket;
pub use subscribe::{RetainHandling, SubAckPacket, SubscribeOptions, SubscribePacket};
pub use unsubscribe::{UnsubAckPacket, UnsubscribePacket};

use crate::error::{DecodeError, EncodeError};
use crate::types::ProtocolVersion;

/// Every packet a client sends or receives, tagged by the decoded fixed
/// header's packet type.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPacket {
    Connect(ConnectPacket),
    ConnAck(ConnAckPacket),
    Publish(PublishPacket),
    PubAck(AckPacket),
    PubRec(AckPacket),
    PubRel(AckPacket),
    PubComp(AckPacket),
    Subscribe(SubscribePacket),
    SubAck(SubAckPacket),
    Unsubscribe(UnsubscribePacket),
    UnsubAck(UnsubAckPacket),
    PingReq,
    PingResp,
    Disconnect(DisconnectPacket),
    Auth(AuthPacket),
}

impl ControlPacket {
    fn flags(&self) -> u8 {
        match self {
            Self::Publish(p) => p.flags(),
            Self::PubRel(_) | Self::Subscribe(_) | Self::Unsubscribe(_) => 0b0010,
            _ => 0,
        }
    }

    fn packet_type(&self) -> PacketType {
        match self {
            Self::Connect(_) => PacketType::Connect,
            Self::ConnAck(_) => PacketType::ConnAck,
            Self::Publish(_) => PacketType::Publish,
            Self::PubAck(_) => PacketType::PubAck,
            Self::PubRec(_) => PacketType::PubRec,
            Self::PubRel(_) => PacketType::PubRel,
            Self::PubComp(_) => PacketType::PubComp,
            Self::Subscribe(_) => PacketType::Subscribe,
            Self::SubAck(_) => PacketType::SubAck,
            Self::Unsubscribe(_) => PacketType::Unsubscribe,
            Self::UnsubAck(_) => PacketType::UnsubAck,
            Self::PingReq => PacketType::PingReq,
            Self::PingResp => PacketType::PingResp,
            Self::Disconnect(_) => PacketType::Disconnect,
            Self::Auth(_) => PacketType::Auth,
        }
    }

    /// Encodes a full packet: fixed header followed by variable header and
    /// payload, sized for `version`.
    pub fn encode(&self, version: ProtocolVersion) -> Result<Vec<u8>, EncodeError> {
        let mut body = Vec::new();
        match self {
            Self::Connect(p) => p.encode(&mut body)?,
            Self::ConnAck(_) => unreachable!("a client never sends CONNACK"),
            Self::Publish(p) => p.encode(&mut body, version)?,
            Self::PubAck(p) | Self::PubRec(p) | Self::PubRel(p) | Self::PubComp(p) => p.encode(&mut body, version)?,
            Self::Subscribe(p) => p.encode(&mut body, version)?,
            Self::SubAck(_) => unreachable!("a client never sends SUBACK"),
            Self::Unsubscribe(p) => p.encode(&mut body, version)?,
            Self::UnsubAck(_) => unreachable!("a client never sends UNSUBACK"),
            Self::PingReq | Self::PingResp => {}
            Self::Disconnect(p) => p.encode(&mut body, version)?,
            Self::Auth(p) => p.encode(&mut body)?,
        }

        let header = FixedHeader::new(self.packet_type(), self.flags(), body.len() as u32);
        let mut out = Vec::with_capacity(5 + body.len());
        header.encode(&mut out)?;
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Streaming decode from the front of `bytes`. Returns `Ok(None)` if
    /// `bytes` doesn't yet contain a complete packet.
    pub fn decode(bytes: &[u8], version: ProtocolVersion) -> Result<Option<(Self, usize)>, DecodeError> {
        let Some((header, header_len)) = FixedHeader::decode(bytes)? else {
            return Ok(None);
        };
        let body_len = header.remaining_length as usize;
        if bytes.len() < header_len + body_len {
            return Ok(None);
        }
        let body = &bytes[header_len..header_len + body_len];

        let packet = match header.packet_type {
            PacketType::Connect => Self::Connect(ConnectPacket::decode(body)?),
            PacketType::ConnAck => Self::ConnAck(ConnAckPacket::decode(body, version)?),
            PacketType::Publish => Self::Publish(PublishPacket::decode(body, header.flags, version)?),
            PacketType::PubAck => Self::PubAck(AckPacket::decode(body, header.remaining_length, version)?),
            PacketType::PubRec => Self::PubRec(AckPacket::decode(body, header.remaining_length, version)?),
            PacketType::PubRel => Self::PubRel(AckPacket::decode(body, header.remaining_length, version)?),
            PacketType::PubComp => Self::PubComp(AckPacket::decode(body, header.remaining_length, version)?),
            PacketType::Subscribe => Self::Subscribe(SubscribePacket::decode(body, version)?),
            PacketType::SubAck => Self::SubAck(SubAckPacket::decode(body, version)?),
            PacketType::Unsubscribe => Self::Unsubscribe(UnsubscribePacket::decode(body, version)?),
            PacketType::UnsubAck => Self::UnsubAck(UnsubAckPacket::decode(body, version)?),
            PacketType::PingReq => {
                if body_len != 0 {
                    return Err(DecodeError::MalformedPacket);
                }
                Self::PingReq
            }
            PacketType::PingResp => {
                if body_len != 0 {
                    return Err(DecodeError::MalformedPacket);
                }
                Self::PingResp
            }
            PacketType::Disconnect => Self::Disconnect(DisconnectPacket::decode(body, version)?),
            PacketType::Auth => Self::Auth(AuthPacket::decode(body)?),
        };

        Ok(Some((packet, header_len + body_len)))
    }
}

#[cfg(test)]
mod unit {
    use super::*;
    use crate::types::{PacketId, QoS, TopicName};

    #[test]
    fn round_trips_pingreq_pingresp() {
        for packet in [ControlPacket::PingReq, ControlPacket::PingResp] {
            let bytes = packet.encode(ProtocolVersion::V311).unwrap();
            let (decoded, consumed) = ControlPacket::decode(&bytes, ProtocolVersion::V311).unwrap().unwrap();
            assert_eq!(consumed, bytes.len());
            assert_eq!(decoded, packet);
        }
    }

    #[test]
    fn decode_returns_none_on_partial_packet() {
        let packet = ControlPacket::Publish(PublishPacket {
            topic: Some(TopicName::new("a").unwrap()),
            id: None,
            payload: bytes::Bytes::from_static(b"0123456789"),
            qos: QoS::AtMostOnce,
            retain: false,
            duplicate: false,
            properties: Default::default(),
        });
        let bytes = packet.encode(ProtocolVersion::V311).unwrap();
        assert_eq!(ControlPacket::decode(&bytes[..bytes.len() - 1], ProtocolVersion::V311), Ok(None));
    }

    #[test]
    fn round_trips_pubrel_through_the_tagged_union() {
        let packet = ControlPacket::PubRel(AckPacket::simple(PacketId::new(99).unwrap()));
        let bytes = packet.encode(ProtocolVersion::V5).unwrap();
        let (decoded, consumed) = ControlPacket::decode(&bytes, ProtocolVersion::V5).unwrap().unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, packet);
    }
}
