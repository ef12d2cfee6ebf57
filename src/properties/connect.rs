use crate::error::{DecodeError, EncodeError};

use super::{decode_properties, encode_properties, encoded_properties_len, Property};

/// CONNECT packet properties (MQTT 5.0 §3.1.2.11).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectProperties {
    pub session_expiry_interval: Option<u32>,
    pub receive_maximum: Option<u16>,
    pub maximum_packet_size: Option<u32>,
    pub topic_alias_maximum: Option<u16>,
    pub request_response_information: Option<bool>,
    pub request_problem_information: Option<bool>,
    pub user_properties: Vec<(String, String)>,
    pub authentication_method: Option<String>,
    pub authentication_data: Option<bytes::Bytes>,
}

impl ConnectProperties {
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), DecodeError> {
        let (list, consumed) = decode_properties(bytes)?;
        let mut out = Self::default();
        for prop in list {
            match prop {
                Property::SessionExpiryInterval(v) => out.session_expiry_interval = Some(v),
                Property::ReceiveMaximum(v) => out.receive_maximum = Some(v),
                Property::MaximumPacketSize(v) => out.maximum_packet_size = Some(v),
                Property::TopicAliasMaximum(v) => out.topic_alias_maximum = Some(v),
                Property::RequestResponseInformation(v) => out.request_response_information = Some(v),
                Property::RequestProblemInformation(v) => out.request_problem_information = Some(v),
                Property::UserProperty(k, v) => out.user_properties.push((k, v)),
                Property::AuthenticationMethod(v) => out.authentication_method = Some(v),
                Property::AuthenticationData(v) => out.authentication_data = Some(v),
                _ => return Err(DecodeError::ProtocolViolation),
            }
        }
        Ok((out, consumed))
    }

    fn as_list(&self) -> Vec<Property> {
        let mut list = Vec::new();
        if let Some(v) = self.session_expiry_interval {
            list.push(Property::SessionExpiryInterval(v));
        }
        if let Some(v) = self.receive_maximum {
            list.push(Property::ReceiveMaximum(v));
        }
        if let Some(v) = self.maximum_packet_size {
            list.push(Property::MaximumPacketSize(v));
        }
        if let Some(v) = self.topic_alias_maximum {
            list.push(Property::TopicAliasMaximum(v));
        }
        if let Some(v) = self.request_response_information {
            list.push(Property::RequestResponseInformation(v));
        }
        if let Some(v) = self.request_problem_information {
            list.push(Property::RequestProblemInformation(v));
        }
        if let Some(v) = &self.authentication_method {
            list.push(Property::AuthenticationMethod(v.clone()));
        }
        if let Some(v) = &self.authentication_data {
            list.push(Property::AuthenticationData(v.clone()));
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

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn round_trips_auth_and_session_expiry() {
        let props = ConnectProperties {
            session_expiry_interval: Some(60),
            authentication_method: Some("SCRAM-SHA-1".into()),
            authentication_data: Some(bytes::Bytes::from_static(b"abc")),
            user_properties: vec![("x".into(), "y".into())],
            ..Default::default()
        };
        let mut buf = Vec::new();
        props.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), props.encoded_len());
        let (decoded, consumed) = ConnectProperties::decode(&buf).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded, props);
    }
}
