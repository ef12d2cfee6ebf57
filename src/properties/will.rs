use crate::error::{DecodeError, EncodeError};

use super::{decode_properties, encode_properties, encoded_properties_len, Property};

/// Properties attached to a CONNECT packet's Will payload (MQTT 5.0 §3.1.3.2).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WillProperties {
    pub will_delay_interval: Option<u32>,
    pub payload_format_indicator: Option<bool>,
    pub message_expiry_interval: Option<u32>,
    pub content_type: Option<String>,
    pub response_topic: Option<String>,
    pub correlation_data: Option<bytes::Bytes>,
    pub user_properties: Vec<(String, String)>,
}

impl WillProperties {
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), DecodeError> {
        let (list, consumed) = decode_properties(bytes)?;
        let mut out = Self::default();
        for prop in list {
            match prop {
                Property::WillDelayInterval(v) => out.will_delay_interval = Some(v),
                Property::PayloadFormatIndicator(v) => out.payload_format_indicator = Some(v),
                Property::MessageExpiryInterval(v) => out.message_expiry_interval = Some(v),
                Property::ContentType(v) => out.content_type = Some(v),
                Property::ResponseTopic(v) => out.response_topic = Some(v),
                Property::CorrelationData(v) => out.correlation_data = Some(v),
                Property::UserProperty(k, v) => out.user_properties.push((k, v)),
                _ => return Err(DecodeError::ProtocolViolation),
            }
        }
        Ok((out, consumed))
    }

    fn as_list(&self) -> Vec<Property> {
        let mut list = Vec::new();
        if let Some(v) = self.will_delay_interval {
            list.push(Property::WillDelayInterval(v));
        }
        if let Some(v) = self.payload_format_indicator {
            list.push(Property::PayloadFormatIndicator(v));
        }
        if let Some(v) = self.message_expiry_interval {
            list.push(Property::MessageExpiryInterval(v));
        }
        if let Some(v) = &self.content_type {
            list.push(Property::ContentType(v.clone()));
        }
        if let Some(v) = &self.response_topic {
            list.push(Property::ResponseTopic(v.clone()));
        }
        if let Some(v) = &self.correlation_data {
            list.push(Property::CorrelationData(v.clone()));
        }
        for (k, v) in &self.user_properties {
            list.push(Property::UserProperty(k.clone(), v.clone()));
        }
        list
    }

    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
        encode_properties(buf, &self.as_list())
    }

    pub fn encoded_len(&self) -> usize {
        encoded_properties_len(&self.as_list())
    }
}
