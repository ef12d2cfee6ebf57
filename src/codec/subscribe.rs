//! SUBSCRIBE / SUBACK (MQTT 5.0 §3.8, §3.9).

use crate::error::{DecodeError, EncodeError};
use crate::properties::SubscriptionProperties;
use crate::types::{decode_str, encode_str, encoded_str_len, PacketId, ProtocolVersion, QoS, ReasonCode, TopicFilter};

/// Per-filter options carried on a SUBSCRIBE request. v3.1.1 only ever sets
/// `qos`; the rest are MQTT 5.0 subscription options (§3.8.3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeOptions {
    pub qos: QoS,
    pub no_local: bool,
    pub retain_as_published: bool,
    pub retain_handling: RetainHandling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetainHandling {
    SendAtSubscribeTime,
    SendOnlyIfNewSubscription,
    DoNotSend,
}

impl RetainHandling {
    fn from_bits(bits: u8) -> Result<Self, DecodeError> {
        match bits {
            0 => Ok(Self::SendAtSubscribeTime),
            1 => Ok(Self::SendOnlyIfNewSubscription),
            2 => Ok(Self::DoNotSend),
            _ => Err(DecodeError::MalformedPacket),
        }
    }

    fn bits(self) -> u8 {
        match self {
            Self::SendAtSubscribeTime => 0,
            Self::SendOnlyIfNewSubscription => 1,
            Self::DoNotSend => 2,
        }
    }
}

impl SubscribeOptions {
    pub fn new(qos: QoS) -> Self {
        Self {
            qos,
            no_local: false,
            retain_as_published: false,
            retain_handling: RetainHandling::SendAtSubscribeTime,
        }
    }

    fn encode(self, buf: &mut Vec<u8>) {
        let mut byte = self.qos.as_u8();
        if self.no_local {
            byte |= 0x04;
        }
        if self.retain_as_published {
            byte |= 0x08;
        }
        byte |= self.retain_handling.bits() << 4;
        buf.push(byte);
    }

    fn decode(byte: u8) -> Result<Self, DecodeError> {
        if byte & 0xC0 != 0 {
            return Err(DecodeError::MalformedPacket);
        }
        Ok(Self {
            qos: QoS::from_u8(byte & 0x03).map_err(|_| DecodeError::MalformedPacket)?,
            no_local: byte & 0x04 != 0,
            retain_as_published: byte & 0x08 != 0,
            retain_handling: RetainHandling::from_bits((byte >> 4) & 0x03)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscribePacket {
    pub id: PacketId,
    pub filters: Vec<(TopicFilter, SubscribeOptions)>,
    pub properties: SubscriptionProperties,
}

impl SubscribePacket {
    pub fn encode(&self, buf: &mut Vec<u8>, version: ProtocolVersion) -> Result<(), EncodeError> {
        buf.extend_from_slice(&self.id.get().to_be_bytes());
        if version.is_v5() {
            self.properties.encode(buf)?;
        }
        for (filter, options) in &self.filters {
            encode_str(buf, filter.as_str());
            options.encode(buf);
        }
        Ok(())
    }

    pub fn encoded_len(&self, version: ProtocolVersion) -> Result<usize, EncodeError> {
        let mut len = 2;
        if version.is_v5() {
            len += self.properties.encoded_len()?;
        }
        for (filter, _) in &self.filters {
            len += encoded_str_len(filter.as_str()) + 1;
        }
        Ok(len)
    }

    pub fn decode(bytes: &[u8], version: ProtocolVersion) -> Result<Self, DecodeError> {
        if bytes.len() < 2 {
            return Err(DecodeError::UnexpectedEof);
        }
        let id = PacketId::new(u16::from_be_bytes([bytes[0], bytes[1]])).ok_or(DecodeError::ProtocolViolation)?;
        let mut offset = 2;

        let properties = if version.is_v5() {
            let (props, n) = SubscriptionProperties::decode(&bytes[offset..])?;
            offset += n;
            props
        } else {
            SubscriptionProperties::default()
        };

        let mut filters = Vec::new();
        while offset < bytes.len() {
            let (raw, n) = decode_str(&bytes[offset..])?;
            offset += n;
            let filter = TopicFilter::new(raw).ok_or(DecodeError::ProtocolViolation)?;
            let options = SubscribeOptions::decode(*bytes.get(offset).ok_or(DecodeError::UnexpectedEof)?)?;
            offset += 1;
            filters.push((filter, options));
        }
        if filters.is_empty() {
            return Err(DecodeError::ProtocolViolation); // MQTT-3.8.3-3
        }

        Ok(Self { id, filters, properties })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubAckPacket {
    pub id: PacketId,
    pub reason_codes: Vec<ReasonCode>,
}

impl SubAckPacket {
    pub fn decode(bytes: &[u8], version: ProtocolVersion) -> Result<Self, DecodeError> {
        if bytes.len() < 2 {
            return Err(DecodeError::UnexpectedEof);
        }
        let id = PacketId::new(u16::from_be_bytes([bytes[0], bytes[1]])).ok_or(DecodeError::ProtocolViolation)?;
        let mut offset = 2;

        if version.is_v5() {
            let (_, n) = SubscriptionProperties::decode(&bytes[offset..])?;
            offset += n;
        }

        let reason_codes = bytes[offset..]
            .iter()
            .map(|&b| ReasonCode::from_u8(b))
            .collect::<Result<Vec<_>, _>>()?;
        if reason_codes.is_empty() {
            return Err(DecodeError::ProtocolViolation);
        }

        Ok(Self { id, reason_codes })
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn round_trips_subscribe_v5_with_options() {
        let packet = SubscribePacket {
            id: PacketId::new(10).unwrap(),
            filters: vec![
                (TopicFilter::new("a/+").unwrap(), SubscribeOptions::new(QoS::AtLeastOnce)),
                (
                    TopicFilter::new("$share/g/a/#").unwrap(),
                    SubscribeOptions { no_local: true, retain_handling: RetainHandling::DoNotSend, ..SubscribeOptions::new(QoS::ExactlyOnce) },
                ),
            ],
            properties: SubscriptionProperties { subscription_identifier: Some(9), ..Default::default() },
        };
        let mut buf = Vec::new();
        packet.encode(&mut buf, ProtocolVersion::V5).unwrap();
        assert_eq!(buf.len(), packet.encoded_len(ProtocolVersion::V5).unwrap());
        let decoded = SubscribePacket::decode(&buf, ProtocolVersion::V5).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn rejects_empty_filter_list() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1u16.to_be_bytes());
        assert_eq!(
            SubscribePacket::decode(&buf, ProtocolVersion::V311),
            Err(DecodeError::ProtocolViolation)
        );
    }

    #[test]
    fn decodes_suback_reason_codes() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.push(ReasonCode::GrantedQoS2.value());
        buf.push(ReasonCode::NotAuthorized.value());
        let decoded = SubAckPacket::decode(&buf, ProtocolVersion::V311).unwrap();
        assert_eq!(decoded.reason_codes, vec![ReasonCode::GrantedQoS2, ReasonCode::NotAuthorized]);
    }
}
