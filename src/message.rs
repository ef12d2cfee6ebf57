//! The payload-bearing unit exchanged with [`crate::client`] callers,
//! independent of whatever v3/v5 packet carried it on the wire.

use bytes::Bytes;

use crate::properties::PublishProperties;
use crate::types::{PacketId, QoS, TopicName};

/// An application message, either outbound (given to `Client::publish`) or
/// inbound (delivered through a `Subscription`).
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub topic: TopicName,
    pub payload: Bytes,
    pub qos: QoS,
    pub retain: bool,
    /// Set on redelivery (DUP flag); never set by the caller on a fresh publish.
    pub duplicate: bool,
    /// `None` for QoS 0. Assigned by the engine for QoS 1/2 outbound publishes.
    pub id: Option<PacketId>,
    /// Empty unless the connection negotiated MQTT 5.0.
    pub properties: PublishProperties,
}

impl Message {
    /// Builds a QoS-0, non-retained message with no v5 properties — the
    /// common case for `Client::publish`.
    pub fn new(topic: TopicName, payload: impl Into<Bytes>) -> Self {
        Self {
            topic,
            payload: payload.into(),
            qos: QoS::AtMostOnce,
            retain: false,
            duplicate: false,
            id: None,
            properties: PublishProperties::default(),
        }
    }

    pub fn with_qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    pub fn with_retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    pub fn with_properties(mut self, properties: PublishProperties) -> Self {
        self.properties = properties;
        self
    }
}
