use crate::error::{DecodeError, EncodeError};
use crate::types::varint::VarByteInt;

use super::{decode_properties, encode_properties, encoded_properties_len, Property};

/// PUBLISH packet properties (MQTT 5.0 §3.3.2.3). This is the field set
/// SPEC_FULL.md's v5 supplement calls for in full: payload format, message
/// expiry, topic alias, response topic / correlation data for request-response,
/// and one or more subscription identifiers on delivery.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishProperties {
    pub payload_format_indicator: Option<bool>,
    pub message_expiry_interval: Option<u32>,
    pub topic_alias: Option<u16>,
    pub response_topic: Option<String>,
    pub correlation_data: Option<bytes::Bytes>,
    pub user_properties: Vec<(String, String)>,
    /// Populated by the broker on delivery; never sent by a client.
    pub subscription_identifiers: Vec<u32>,
    pub content_type: Option<String>,
}

impl PublishProperties {
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), DecodeError> {
        let (list, consumed) = decode_properties(bytes)?;
        let mut out = Self::default();
        for prop in list {
            match prop {
                Property::PayloadFormatIndicator(v) => out.payload_format_indicator = Some(v),
                Property::MessageExpiryInterval(v) => out.message_expiry_interval = Some(v),
                Property::TopicAlias(v) => out.topic_alias = Some(v),
                Property::ResponseTopic(v) => out.response_topic = Some(v),
                Property::CorrelationData(v) => out.correlation_data = Some(v),
                Property::UserProperty(k, v) => out.user_properties.push((k, v)),
                Property::SubscriptionIdentifier(v) => out.subscription_identifiers.push(v.get()),
                Property::ContentType(v) => out.content_type = Some(v),
                _ => return Err(DecodeError::ProtocolViolation),
            }
        }
        Ok((out, consumed))
    }

    fn as_list(&self) -> Result<Vec<Property>, EncodeError> {
        let mut list = Vec::new();
        if let Some(v) = self.payload_format_indicator {
            list.push(Property::PayloadFormatIndicator(v));
        }
        if let Some(v) = self.message_expiry_interval {
            list.push(Property::MessageExpiryInterval(v));
        }
        if let Some(v) = self.topic_alias {
            list.push(Property::TopicAlias(v));
        }
        if let Some(v) = &self.response_topic {
            list.push(Property::ResponseTopic(v.clone()));
        }
        if let Some(v) = &self.correlation_data {
            list.push(Property::CorrelationData(v.clone()));
        }
        if let Some(v) = &self.content_type {
            list.push(Property::ContentType(v.clone()));
        }
        for id in &self.subscription_identifiers {
            list.push(Property::SubscriptionIdentifier(VarByteInt::new(*id)?));
        }
        for (k, v) in &self.user_properties {
            list.push(Property::UserProperty(k.clone(), v.clone()));
        }
        Ok(list)
    }

    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
        encode_properties(buf, &self.as_list()?)
    }

    pub fn encoded_len(&self) -> Result<usize, EncodeError> {
        Ok(encoded_properties_len(&self.as_list()?))
    }
}
