use crate::error::{DecodeError, EncodeError};
use crate::types::varint::VarByteInt;

use super::{decode_properties, encode_properties, encoded_properties_len, Property};

/// SUBSCRIBE packet properties (MQTT 5.0 §3.8.2.1).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionProperties {
    pub subscription_identifier: Option<u32>,
    pub user_properties: Vec<(String, String)>,
}

impl SubscriptionProperties {
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), DecodeError> {
        let (list, consumed) = decode_properties(bytes)?;
        let mut out = Self::default();
        for prop in list {
            match prop {
                Property::SubscriptionIdentifier(v) => out.subscription_identifier = Some(v.get()),
                Property::UserProperty(k, v) => out.user_properties.push((k, v)),
                _ => return Err(DecodeError::ProtocolViolation),
            }
        }
        Ok((out, consumed))
    }

    fn as_list(&self) -> Result<Vec<Property>, EncodeError> {
        let mut list = Vec::new();
        if let Some(id) = self.subscription_identifier {
            list.push(Property::SubscriptionIdentifier(VarByteInt::new(id)?));
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

/// UNSUBSCRIBE packet properties (MQTT 5.0 §3.10.2.1). Carries only
/// User Property; kept as a distinct type so call sites don't confuse it
/// with [`SubscriptionProperties`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnsubscriptionProperties {
    pub user_properties: Vec<(String, String)>,
}

impl UnsubscriptionProperties {
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), DecodeError> {
        let (list, consumed) = decode_properties(bytes)?;
        let mut out = Self::default();
        for prop in list {
            match prop {
                Property::UserProperty(k, v) => out.user_properties.push((k, v)),
                _ => return Err(DecodeError::ProtocolViolation),
            }
        }
        Ok((out, consumed))
    }

    fn as_list(&self) -> Vec<Property> {
        self.user_properties
            .iter()
            .map(|(k, v)| Property::UserProperty(k.clone(), v.clone()))
            .collect()
    }

    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
        encode_properties(buf, &self.as_list())
    }

    pub fn encoded_len(&self) -> usize {
        encoded_properties_len(&self.as_list())
    }
}
