//! Types used throughout the MQTT wire format and client surface (component C1
//! plus the shared primitive encodings C2 builds on).

mod mqtt_binary;
mod mqtt_string;
mod pid;
mod qos;
mod reason_code;
mod topic;
pub(crate) mod varint;

pub(crate) use mqtt_binary::{decode_binary, encode_binary, encoded_binary_len};
pub(crate) use mqtt_string::{decode_str, encode_str, encoded_str_len};

pub use pid::PacketId;
pub use qos::QoS;
pub use reason_code::ReasonCode;
pub use topic::{MatchOptions, TopicFilter, TopicName};
pub use varint::VarByteInt;

/// The MQTT protocol version negotiated for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    V31,
    V311,
    V5,
}

impl ProtocolVersion {
    pub fn protocol_name(self) -> &'static str {
        match self {
            Self::V31 => "MQIsdp",
            Self::V311 | Self::V5 => "MQTT",
        }
    }

    pub fn protocol_level(self) -> u8 {
        match self {
            Self::V31 => 3,
            Self::V311 => 4,
            Self::V5 => 5,
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            3 => Some(Self::V31),
            4 => Some(Self::V311),
            5 => Some(Self::V5),
            _ => None,
        }
    }

    pub fn is_v5(self) -> bool {
        matches!(self, Self::V5)
    }
}
