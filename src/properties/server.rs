use crate::error::DecodeError;

use super::{decode_properties, Property};

/// CONNACK properties (MQTT 5.0 §3.2.2.3): the server's advertised limits
/// and capabilities for this connection. Read-only from the client's
/// perspective; there is no corresponding `encode`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerProperties {
    pub session_expiry_interval: Option<u32>,
    pub receive_maximum: Option<u16>,
    pub maximum_qos: Option<u8>,
    pub retain_available: Option<bool>,
    pub maximum_packet_size: Option<u32>,
    pub assigned_client_identifier: Option<String>,
    pub topic_alias_maximum: Option<u16>,
    pub reason_string: Option<String>,
    pub user_properties: Vec<(String, String)>,
    pub wildcard_subscription_available: Option<bool>,
    pub subscription_identifiers_available: Option<bool>,
    pub shared_subscription_available: Option<bool>,
    pub server_keep_alive: Option<u16>,
    pub response_information: Option<String>,
    pub server_reference: Option<String>,
    pub authentication_method: Option<String>,
    pub authentication_data: Option<bytes::Bytes>,
}

impl ServerProperties {
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), DecodeError> {
        let (list, consumed) = decode_properties(bytes)?;
        let mut out = Self::default();
        for prop in list {
            match prop {
                Property::SessionExpiryInterval(v) => out.session_expiry_interval = Some(v),
                Property::ReceiveMaximum(v) => out.receive_maximum = Some(v),
                Property::MaximumQoS(v) => out.maximum_qos = Some(v),
                Property::RetainAvailable(v) => out.retain_available = Some(v),
                Property::MaximumPacketSize(v) => out.maximum_packet_size = Some(v),
                Property::AssignedClientIdentifier(v) => out.assigned_client_identifier = Some(v),
                Property::TopicAliasMaximum(v) => out.topic_alias_maximum = Some(v),
                Property::ReasonString(v) => out.reason_string = Some(v),
                Property::UserProperty(k, v) => out.user_properties.push((k, v)),
                Property::WildcardSubscriptionAvailable(v) => out.wildcard_subscription_available = Some(v),
                Property::SubscriptionIdentifierAvailable(v) => out.subscription_identifiers_available = Some(v),
                Property::SharedSubscriptionAvailable(v) => out.shared_subscription_available = Some(v),
                Property::ServerKeepAlive(v) => out.server_keep_alive = Some(v),
                Property::ResponseInformation(v) => out.response_information = Some(v),
                Property::ServerReference(v) => out.server_reference = Some(v),
                Property::AuthenticationMethod(v) => out.authentication_method = Some(v),
                Property::AuthenticationData(v) => out.authentication_data = Some(v),
                _ => return Err(DecodeError::ProtocolViolation),
            }
        }
        Ok((out, consumed))
    }
}
