use crate::error::{DecodeError, EncodeError};

use super::{decode_properties, encode_properties, encoded_properties_len, Property};

/// AUTH packet properties (MQTT 5.0 §3.15.2.2), also reused for the
/// enhanced-authentication fields carried in CONNECT/CONNACK exchanges
/// driving [`crate::client::handle::Client::reauthenticate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthenticationProperties {
    pub authentication_method: Option<String>,
    pub authentication_data: Option<bytes::Bytes>,
    pub reason_string: Option<String>,
    pub user_properties: Vec<(String, String)>,
}

impl AuthenticationProperties {
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), DecodeError> {
        let (list, consumed) = decode_properties(bytes)?;
        let mut out = Self::default();
        for prop in list {
            match prop {
                Property::AuthenticationMethod(v) => out.authentication_method = Some(v),
                Property::AuthenticationData(v) => out.authentication_data = Some(v),
                Property::ReasonString(v) => out.reason_string = Some(v),
                Property::UserProperty(k, v) => out.user_properties.push((k, v)),
                _ => return Err(DecodeError::ProtocolViolation),
            }
        }
        Ok((out, consumed))
    }

    fn as_list(&self) -> Vec<Property> {
        let mut list = Vec::new();
        if let Some(v) = &self.authentication_method {
            list.push(Property::AuthenticationMethod(v.clone()));
        }
        if let Some(v) = &self.authentication_data {
            list.push(Property::AuthenticationData(v.clone()));
        }
        if let Some(v) = &self.reason_string {
            list.push(Property::ReasonString(v.clone()));
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
