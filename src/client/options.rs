//! Per-call options builders (component C9), mirroring the teacher's
//! `client::options::{connect,publish,subscribe,disconnect,will}` split.

use bytes::Bytes;

use crate::codec::{DisconnectProperties, RetainHandling, SubscribeOptions};
use crate::properties::{ConnectProperties, PublishProperties, WillProperties};
use crate::types::{QoS, ReasonCode, TopicName};

/// A last-will message registered at CONNECT time and published by the
/// server if this client disconnects ungracefully.
#[derive(Debug, Clone)]
pub struct WillOptions {
    pub topic: TopicName,
    pub payload: Bytes,
    pub qos: QoS,
    pub retain: bool,
    pub properties: WillProperties,
}

impl WillOptions {
    pub fn new(topic: TopicName, payload: impl Into<Bytes>) -> Self {
        Self { topic, payload: payload.into(), qos: QoS::AtMostOnce, retain: false, properties: Default::default() }
    }

    pub fn with_qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    pub fn with_retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    pub fn with_delay(mut self, seconds: u32) -> Self {
        self.properties.will_delay_interval = Some(seconds);
        self
    }
}

/// Options for `Client::connect`.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// `None` requests an auto-generated id (§ client identifier).
    pub client_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<Bytes>,
    pub will: Option<WillOptions>,
    pub properties: ConnectProperties,
}

/// Options for `Client::publish`, layered on top of the plain
/// [`crate::message::Message`] the caller provides the topic/payload for.
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    pub qos: QoS,
    pub retain: bool,
    pub properties: PublishProperties,
}

impl PublishOptions {
    pub fn with_qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    pub fn with_retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }
}

/// Options for `Client::subscribe`.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionOptions {
    pub inner: SubscribeOptions,
}

impl SubscriptionOptions {
    pub fn new(qos: QoS) -> Self {
        Self { inner: SubscribeOptions::new(qos) }
    }

    pub fn with_no_local(mut self, no_local: bool) -> Self {
        self.inner.no_local = no_local;
        self
    }

    pub fn with_retain_as_published(mut self, retain_as_published: bool) -> Self {
        self.inner.retain_as_published = retain_as_published;
        self
    }

    pub fn with_retain_handling(mut self, retain_handling: RetainHandling) -> Self {
        self.inner.retain_handling = retain_handling;
        self
    }
}

/// Options for `Client::disconnect`.
#[derive(Debug, Clone, Default)]
pub struct DisconnectOptions {
    pub reason_code: ReasonCode,
    pub properties: DisconnectProperties,
}
