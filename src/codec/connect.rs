//! CONNECT packet (MQTT 5.0 §3.1).

use bytes::Bytes;

use crate::error::{DecodeError, EncodeError};
use crate::properties::{ConnectProperties, WillProperties};
use crate::types::{decode_binary, decode_str, encode_binary, encode_str, encoded_binary_len, encoded_str_len};
use crate::types::{ProtocolVersion, QoS, TopicName};

#[derive(Debug, Clone, PartialEq)]
pub struct Will {
    pub topic: TopicName,
    pub payload: Bytes,
    pub qos: QoS,
    pub retain: bool,
    pub properties: WillProperties,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectPacket {
    pub protocol_version: ProtocolVersion,
    pub clean_start: bool,
    pub keep_alive: u16,
    pub client_id: String,
    pub will: Option<Will>,
    pub username: Option<String>,
    pub password: Option<Bytes>,
    pub properties: ConnectProperties,
}

impl ConnectPacket {
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
        encode_str(buf, self.protocol_version.protocol_name());
        buf.push(self.protocol_version.protocol_level());

        let mut connect_flags = 0u8;
        if self.username.is_some() {
            connect_flags |= 0x80;
        }
        if self.password.is_some() {
            connect_flags |= 0x40;
        }
        if let Some(will) = &self.will {
            connect_flags |= 0x04;
            connect_flags |= will.qos.as_u8() << 3;
            if will.retain {
                connect_flags |= 0x20;
            }
        }
        if self.clean_start {
            connect_flags |= 0x02;
        }
        buf.push(connect_flags);
        buf.extend_from_slice(&self.keep_alive.to_be_bytes());

        if self.protocol_version.is_v5() {
            self.properties.encode(buf)?;
        }

        encode_str(buf, &self.client_id);

        if let Some(will) = &self.will {
            if self.protocol_version.is_v5() {
                will.properties.encode(buf)?;
            }
            encode_str(buf, will.topic.as_str());
            encode_binary(buf, &will.payload);
        }
        if let Some(username) = &self.username {
            encode_str(buf, username);
        }
        if let Some(password) = &self.password {
            encode_binary(buf, password);
        }

        Ok(())
    }

    pub fn encoded_len(&self) -> Result<usize, EncodeError> {
        let mut len = encoded_str_len(self.protocol_version.protocol_name())
            + 1 // protocol level
            + 1 // connect flags
            + 2; // keep alive

        if self.protocol_version.is_v5() {
            len += self.properties.encoded_len();
        }
        len += encoded_str_len(&self.client_id);

        if let Some(will) = &self.will {
            if self.protocol_version.is_v5() {
                len += will.properties.encoded_len();
            }
            len += encoded_str_len(will.topic.as_str());
            len += encoded_binary_len(&will.payload);
        }
        if let Some(username) = &self.username {
            len += encoded_str_len(username);
        }
        if let Some(password) = &self.password {
            len += encoded_binary_len(password);
        }
        Ok(len)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (protocol_name, mut offset) = decode_str(bytes)?;
        let level = *bytes.get(offset).ok_or(DecodeError::UnexpectedEof)?;
        offset += 1;
        let protocol_version = ProtocolVersion::from_level(level).ok_or(DecodeError::MalformedPacket)?;
        if protocol_version.protocol_name() != protocol_name {
            return Err(DecodeError::MalformedPacket);
        }

        let connect_flags = *bytes.get(offset).ok_or(DecodeError::UnexpectedEof)?;
        offset += 1;
        if connect_flags & 0x01 != 0 {
            return Err(DecodeError::MalformedPacket); // reserved bit
        }

        if bytes.len() < offset + 2 {
            return Err(DecodeError::UnexpectedEof);
        }
        let keep_alive = u16::from_be_bytes([bytes[offset], bytes[offset + 1]]);
        offset += 2;

        let properties = if protocol_version.is_v5() {
            let (props, n) = ConnectProperties::decode(&bytes[offset..])?;
            offset += n;
            props
        } else {
            ConnectProperties::default()
        };

        let (client_id, n) = decode_str(&bytes[offset..])?;
        offset += n;

        let has_will = connect_flags & 0x04 != 0;
        let will = if has_will {
            let will_properties = if protocol_version.is_v5() {
                let (props, n) = WillProperties::decode(&bytes[offset..])?;
                offset += n;
                props
            } else {
                WillProperties::default()
            };
            let (topic, n) = decode_str(&bytes[offset..])?;
            offset += n;
            let topic = TopicName::new(topic).ok_or(DecodeError::ProtocolViolation)?;
            let (payload, n) = decode_binary(&bytes[offset..])?;
            offset += n;
            let qos = QoS::from_u8((connect_flags >> 3) & 0x03).map_err(|_| DecodeError::MalformedPacket)?;
            let retain = connect_flags & 0x20 != 0;
            Some(Will { topic, payload, qos, retain, properties: will_properties })
        } else {
            None
        };

        let username = if connect_flags & 0x80 != 0 {
            let (s, n) = decode_str(&bytes[offset..])?;
            offset += n;
            Some(s)
        } else {
            None
        };
        let password = if connect_flags & 0x40 != 0 {
            let (p, n) = decode_binary(&bytes[offset..])?;
            offset += n;
            Some(p)
        } else {
            None
        };
        let _ = offset;

        Ok(Self {
            protocol_version,
            clean_start: connect_flags & 0x02 != 0,
            keep_alive,
            client_id,
            will,
            username,
            password,
            properties,
        })
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn round_trips_v311_with_will_and_credentials() {
        let packet = ConnectPacket {
            protocol_version: ProtocolVersion::V311,
            clean_start: true,
            keep_alive: 60,
            client_id: "client-1".into(),
            will: Some(Will {
                topic: TopicName::new("a/b").unwrap(),
                payload: Bytes::from_static(b"bye"),
                qos: QoS::AtLeastOnce,
                retain: true,
                properties: Default::default(),
            }),
            username: Some("user".into()),
            password: Some(Bytes::from_static(b"pass")),
            properties: Default::default(),
        };
        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), packet.encoded_len().unwrap());
        let decoded = ConnectPacket::decode(&buf).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn round_trips_v5_with_properties_and_no_will() {
        let packet = ConnectPacket {
            protocol_version: ProtocolVersion::V5,
            clean_start: false,
            keep_alive: 30,
            client_id: "".into(),
            will: None,
            username: None,
            password: None,
            properties: ConnectProperties {
                session_expiry_interval: Some(120),
                ..Default::default()
            },
        };
        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        let decoded = ConnectPacket::decode(&buf).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn rejects_mismatched_protocol_name_and_level() {
        let mut buf = Vec::new();
        encode_str(&mut buf, "MQTT");
        buf.push(3); // level 3 expects "MQIsdp"
        buf.push(0x02);
        buf.extend_from_slice(&60u16.to_be_bytes());
        encode_str(&mut buf, "c");
        assert_eq!(ConnectPacket::decode(&buf), Err(DecodeError::MalformedPacket));
    }
}
