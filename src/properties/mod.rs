//! MQTT 5.0 property tables (component C3).
//!
//! A property list on the wire is a variable-byte-integer length followed
//! by a sequence of `<identifier><value>` pairs, where the identifier is
//! itself a variable byte integer and the value's shape is fixed by the
//! identifier (MQTT 5.0 §2.2.2). This module decodes that sequence into
//! [`Property`] values and re-encodes it; the per-packet-type typed
//! containers (`ConnectProperties`, `PublishProperties`, ...) build on top
//! of it so call sites never match on raw identifiers.

mod auth;
mod connect;
mod publish;
mod server;
mod subscribe;
mod will;

pub use auth::AuthenticationProperties;
pub use connect::ConnectProperties;
pub use publish::PublishProperties;
pub use server::ServerProperties;
pub use subscribe::{SubscriptionProperties, UnsubscriptionProperties};
pub use will::WillProperties;

use bytes::Bytes;

use crate::error::DecodeError;
use crate::types::varint::VarByteInt;
use crate::types::{decode_binary, decode_str, encode_binary, encode_str, encoded_binary_len, encoded_str_len};

/// A single decoded property. Variant names follow the MQTT 5.0 property
/// table; identifiers are documented on [`PropertyId`].
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    PayloadFormatIndicator(bool),
    MessageExpiryInterval(u32),
    ContentType(String),
    ResponseTopic(String),
    CorrelationData(Bytes),
    SubscriptionIdentifier(VarByteInt),
    SessionExpiryInterval(u32),
    AssignedClientIdentifier(String),
    ServerKeepAlive(u16),
    AuthenticationMethod(String),
    AuthenticationData(Bytes),
    RequestProblemInformation(bool),
    WillDelayInterval(u32),
    RequestResponseInformation(bool),
    ResponseInformation(String),
    ServerReference(String),
    ReasonString(String),
    ReceiveMaximum(u16),
    TopicAliasMaximum(u16),
    TopicAlias(u16),
    MaximumQoS(u8),
    RetainAvailable(bool),
    /// Repeatable; order must be preserved (it is semantically a list, not a map).
    UserProperty(String, String),
    MaximumPacketSize(u32),
    WildcardSubscriptionAvailable(bool),
    SubscriptionIdentifierAvailable(bool),
    SharedSubscriptionAvailable(bool),
}

/// Whether a property identifier may legally repeat in one property list.
/// Only `UserProperty` and `SubscriptionIdentifier` may.
fn allows_duplicates(id: u32) -> bool {
    matches!(id, 0x26 | 0x0B)
}

impl Property {
    fn id(&self) -> u32 {
        match self {
            Self::PayloadFormatIndicator(_) => 0x01,
            Self::MessageExpiryInterval(_) => 0x02,
            Self::ContentType(_) => 0x03,
            Self::ResponseTopic(_) => 0x08,
            Self::CorrelationData(_) => 0x09,
            Self::SubscriptionIdentifier(_) => 0x0B,
            Self::SessionExpiryInterval(_) => 0x11,
            Self::AssignedClientIdentifier(_) => 0x12,
            Self::ServerKeepAlive(_) => 0x13,
            Self::AuthenticationMethod(_) => 0x15,
            Self::AuthenticationData(_) => 0x16,
            Self::RequestProblemInformation(_) => 0x17,
            Self::WillDelayInterval(_) => 0x18,
            Self::RequestResponseInformation(_) => 0x19,
            Self::ResponseInformation(_) => 0x1A,
            Self::ServerReference(_) => 0x1C,
            Self::ReasonString(_) => 0x1F,
            Self::ReceiveMaximum(_) => 0x21,
            Self::TopicAliasMaximum(_) => 0x22,
            Self::TopicAlias(_) => 0x23,
            Self::MaximumQoS(_) => 0x24,
            Self::RetainAvailable(_) => 0x25,
            Self::UserProperty(..) => 0x26,
            Self::MaximumPacketSize(_) => 0x27,
            Self::WildcardSubscriptionAvailable(_) => 0x28,
            Self::SubscriptionIdentifierAvailable(_) => 0x29,
            Self::SharedSubscriptionAvailable(_) => 0x2A,
        }
    }

    fn encode_value(&self, buf: &mut Vec<u8>) {
        match self {
            Self::PayloadFormatIndicator(v)
            | Self::RequestProblemInformation(v)
            | Self::RequestResponseInformation(v)
            | Self::RetainAvailable(v)
            | Self::WildcardSubscriptionAvailable(v)
            | Self::SubscriptionIdentifierAvailable(v)
            | Self::SharedSubscriptionAvailable(v) => buf.push(if *v { 1 } else { 0 }),
            Self::MaximumQoS(v) => buf.push(*v),
            Self::MessageExpiryInterval(v)
            | Self::WillDelayInterval(v)
            | Self::SessionExpiryInterval(v)
            | Self::MaximumPacketSize(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Self::ServerKeepAlive(v) | Self::ReceiveMaximum(v) | Self::TopicAliasMaximum(v)
            | Self::TopicAlias(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Self::ContentType(s)
            | Self::ResponseTopic(s)
            | Self::AssignedClientIdentifier(s)
            | Self::AuthenticationMethod(s)
            | Self::ResponseInformation(s)
            | Self::ServerReference(s)
            | Self::ReasonString(s) => encode_str(buf, s),
            Self::CorrelationData(b) | Self::AuthenticationData(b) => encode_binary(buf, b),
            Self::SubscriptionIdentifier(v) => v.encode(buf),
            Self::UserProperty(k, v) => {
                encode_str(buf, k);
                encode_str(buf, v);
            }
        }
    }

    fn encoded_value_len(&self) -> usize {
        match self {
            Self::PayloadFormatIndicator(_)
            | Self::RequestProblemInformation(_)
            | Self::RequestResponseInformation(_)
            | Self::RetainAvailable(_)
            | Self::WildcardSubscriptionAvailable(_)
            | Self::SubscriptionIdentifierAvailable(_)
            | Self::SharedSubscriptionAvailable(_)
            | Self::MaximumQoS(_) => 1,
            Self::MessageExpiryInterval(_)
            | Self::WillDelayInterval(_)
            | Self::SessionExpiryInterval(_)
            | Self::MaximumPacketSize(_) => 4,
            Self::ServerKeepAlive(_)
            | Self::ReceiveMaximum(_)
            | Self::TopicAliasMaximum(_)
            | Self::TopicAlias(_) => 2,
            Self::ContentType(s)
            | Self::ResponseTopic(s)
            | Self::AssignedClientIdentifier(s)
            | Self::AuthenticationMethod(s)
            | Self::ResponseInformation(s)
            | Self::ServerReference(s)
            | Self::ReasonString(s) => encoded_str_len(s),
            Self::CorrelationData(b) | Self::AuthenticationData(b) => encoded_binary_len(b),
            Self::SubscriptionIdentifier(v) => v.encoded_len(),
            Self::UserProperty(k, v) => encoded_str_len(k) + encoded_str_len(v),
        }
    }

    /// Total encoded size including the leading identifier byte.
    fn encoded_len(&self) -> usize {
        1 + self.encoded_value_len()
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(self.id() as u8);
        self.encode_value(buf);
    }

    fn decode_one(bytes: &[u8]) -> Result<(Self, usize), DecodeError> {
        let (id, id_len) = VarByteInt::decode(bytes)?.ok_or(DecodeError::UnexpectedEof)?;
        let rest = &bytes[id_len..];

        macro_rules! bool_prop {
            ($variant:ident) => {{
                let v = *rest.first().ok_or(DecodeError::UnexpectedEof)? != 0;
                (Self::$variant(v), id_len + 1)
            }};
        }
        macro_rules! u32_prop {
            ($variant:ident) => {{
                if rest.len() < 4 {
                    return Err(DecodeError::UnexpectedEof);
                }
                let v = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]);
                (Self::$variant(v), id_len + 4)
            }};
        }
        macro_rules! u16_prop {
            ($variant:ident) => {{
                if rest.len() < 2 {
                    return Err(DecodeError::UnexpectedEof);
                }
                let v = u16::from_be_bytes([rest[0], rest[1]]);
                (Self::$variant(v), id_len + 2)
            }};
        }
        macro_rules! str_prop {
            ($variant:ident) => {{
                let (s, n) = decode_str(rest)?;
                (Self::$variant(s), id_len + n)
            }};
        }
        macro_rules! bin_prop {
            ($variant:ident) => {{
                let (b, n) = decode_binary(rest)?;
                (Self::$variant(b), id_len + n)
            }};
        }

        let (prop, total) = match id.get() {
            0x01 => bool_prop!(PayloadFormatIndicator),
            0x02 => u32_prop!(MessageExpiryInterval),
            0x03 => str_prop!(ContentType),
            0x08 => str_prop!(ResponseTopic),
            0x09 => bin_prop!(CorrelationData),
            0x0B => {
                let (v, n) = VarByteInt::decode(rest)?.ok_or(DecodeError::UnexpectedEof)?;
                (Self::SubscriptionIdentifier(v), id_len + n)
            }
            0x11 => u32_prop!(SessionExpiryInterval),
            0x12 => str_prop!(AssignedClientIdentifier),
            0x13 => u16_prop!(ServerKeepAlive),
            0x15 => str_prop!(AuthenticationMethod),
            0x16 => bin_prop!(AuthenticationData),
            0x17 => bool_prop!(RequestProblemInformation),
            0x18 => u32_prop!(WillDelayInterval),
            0x19 => bool_prop!(RequestResponseInformation),
            0x1A => str_prop!(ResponseInformation),
            0x1C => str_prop!(ServerReference),
            0x1F => str_prop!(ReasonString),
            0x21 => u16_prop!(ReceiveMaximum),
            0x22 => u16_prop!(TopicAliasMaximum),
            0x23 => u16_prop!(TopicAlias),
            0x24 => {
                let v = *rest.first().ok_or(DecodeError::UnexpectedEof)?;
                (Self::MaximumQoS(v), id_len + 1)
            }
            0x25 => bool_prop!(RetainAvailable),
            0x26 => {
                let (k, kn) = decode_str(rest)?;
                let (v, vn) = decode_str(&rest[kn..])?;
                (Self::UserProperty(k, v), id_len + kn + vn)
            }
            0x27 => u32_prop!(MaximumPacketSize),
            0x28 => bool_prop!(WildcardSubscriptionAvailable),
            0x29 => bool_prop!(SubscriptionIdentifierAvailable),
            0x2A => bool_prop!(SharedSubscriptionAvailable),
            _ => return Err(DecodeError::MalformedPacket),
        };

        Ok((prop, total))
    }
}

/// Encodes a whole property list: variable-byte-integer length, then each
/// property's `<identifier><value>`.
pub(crate) fn encode_properties(buf: &mut Vec<u8>, properties: &[Property]) -> Result<(), crate::error::EncodeError> {
    let body_len: usize = properties.iter().map(Property::encoded_len).sum();
    let len = VarByteInt::new(body_len as u32)?;
    len.encode(buf);
    for p in properties {
        p.encode(buf);
    }
    Ok(())
}

pub(crate) fn encoded_properties_len(properties: &[Property]) -> usize {
    let body_len: usize = properties.iter().map(Property::encoded_len).sum();
    VarByteInt::new(body_len as u32)
        .map(|v| v.encoded_len())
        .unwrap_or(4)
        + body_len
}

/// Decodes a whole property list from the front of `bytes`. Rejects
/// duplicate single-valued identifiers, preserves `UserProperty` order.
pub(crate) fn decode_properties(bytes: &[u8]) -> Result<(Vec<Property>, usize), DecodeError> {
    let (len, len_bytes) = VarByteInt::decode(bytes)?.ok_or(DecodeError::UnexpectedEof)?;
    let len = len.get() as usize;
    if bytes.len() < len_bytes + len {
        return Err(DecodeError::UnexpectedEof);
    }

    let mut body = &bytes[len_bytes..len_bytes + len];
    let mut properties = Vec::new();
    let mut seen_ids: Vec<u32> = Vec::new();

    while !body.is_empty() {
        let (prop, consumed) = Property::decode_one(body)?;
        let id = prop.id();
        if seen_ids.contains(&id) && !allows_duplicates(id) {
            return Err(DecodeError::ProtocolViolation);
        }
        seen_ids.push(id);
        properties.push(prop);
        body = &body[consumed..];
    }

    Ok((properties, len_bytes + len))
}
