//! The first byte (packet type + flags) and the Remaining Length that
//! follows it (MQTT 5.0 §2.1).

use crate::error::{DecodeError, EncodeError};
use crate::types::varint::VarByteInt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    Connect = 1,
    ConnAck = 2,
    Publish = 3,
    PubAck = 4,
    PubRec = 5,
    PubRel = 6,
    PubComp = 7,
    Subscribe = 8,
    SubAck = 9,
    Unsubscribe = 10,
    UnsubAck = 11,
    PingReq = 12,
    PingResp = 13,
    Disconnect = 14,
    Auth = 15,
}

impl PacketType {
    pub fn from_u8(value: u8) -> Result<Self, DecodeError> {
        Ok(match value {
            1 => Self::Connect,
            2 => Self::ConnAck,
            3 => Self::Publish,
            4 => Self::PubAck,
            5 => Self::PubRec,
            6 => Self::PubRel,
            7 => Self::PubComp,
            8 => Self::Subscribe,
            9 => Self::SubAck,
            10 => Self::Unsubscribe,
            11 => Self::UnsubAck,
            12 => Self::PingReq,
            13 => Self::PingResp,
            14 => Self::Disconnect,
            15 => Self::Auth,
            _ => return Err(DecodeError::MalformedPacket),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedHeader {
    pub packet_type: PacketType,
    pub flags: u8,
    pub remaining_length: u32,
}

impl FixedHeader {
    /// `PUBLISH` is the only packet type whose flags carry information
    /// (DUP/QoS/RETAIN); every other type has a fixed flag nibble that
    /// MUST match exactly (MQTT-2.1.3-1), with SUBSCRIBE/UNSUBSCRIBE/
    /// PUBREL requiring `0b0010`.
    fn expected_flags(packet_type: PacketType) -> Option<u8> {
        match packet_type {
            PacketType::Publish => None,
            PacketType::PubRel | PacketType::Subscribe | PacketType::Unsubscribe => Some(0b0010),
            _ => Some(0b0000),
        }
    }

    pub fn new(packet_type: PacketType, flags: u8, remaining_length: u32) -> Self {
        Self { packet_type, flags, remaining_length }
    }

    /// Streaming decode: returns `Ok(None)` if `bytes` doesn't yet contain
    /// a full fixed header (the remaining-length varint is incomplete).
    pub fn decode(bytes: &[u8]) -> Result<Option<(Self, usize)>, DecodeError> {
        if bytes.is_empty() {
            return Ok(None);
        }
        let first = bytes[0];
        let packet_type = PacketType::from_u8(first >> 4)?;
        let flags = first & 0x0F;
        if let Some(expected) = Self::expected_flags(packet_type) {
            if flags != expected {
                return Err(DecodeError::MalformedPacket);
            }
        }

        match VarByteInt::decode(&bytes[1..])? {
            None => Ok(None),
            Some((len, len_bytes)) => Ok(Some((
                Self { packet_type, flags, remaining_length: len.get() },
                1 + len_bytes,
            ))),
        }
    }

    pub fn encode(self, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
        buf.push(((self.packet_type as u8) << 4) | self.flags);
        VarByteInt::new(self.remaining_length)?.encode(buf);
        Ok(())
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn round_trips_a_publish_header_with_flags() {
        let header = FixedHeader::new(PacketType::Publish, 0b1011, 321);
        let mut buf = Vec::new();
        header.encode(&mut buf).unwrap();
        let (decoded, consumed) = FixedHeader::decode(&buf).unwrap().unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded, header);
    }

    #[test]
    fn rejects_wrong_reserved_flags_on_connect() {
        let bytes = [0b0001_0001, 0x00];
        assert_eq!(FixedHeader::decode(&bytes), Err(DecodeError::MalformedPacket));
    }

    #[test]
    fn incomplete_remaining_length_yields_none() {
        let bytes = [0b0011_0000, 0xFF];
        assert_eq!(FixedHeader::decode(&bytes), Ok(None));
    }
}
