//! Client configuration, grounded in the teacher's `config::{client,shared}`
//! split: fields the client demands of the server, versus fields only
//! meaningful while a connection is active.

use crate::types::{MatchOptions, ProtocolVersion};

/// Keep-alive mechanism within a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAlive {
    /// No keep-alive: any amount of time may pass between packets.
    Disabled,
    /// Maximum interval in seconds allowed between two packets. Must be
    /// greater than 0; use [`KeepAlive::Disabled`] instead of `Seconds(0)`.
    Seconds(u16),
}

impl Default for KeepAlive {
    fn default() -> Self {
        Self::Seconds(60)
    }
}

impl KeepAlive {
    pub(crate) fn as_u16(self) -> u16 {
        match self {
            Self::Disabled => 0,
            Self::Seconds(s) => s,
        }
    }
}

/// The handling of a session after a disconnection (MQTT 5.0 only; v3/3.1.1
/// always behave as `EndOnDisconnect`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionExpiryInterval {
    /// The session ends the moment DISCONNECT is sent or the network
    /// connection closes.
    #[default]
    EndOnDisconnect,
    /// The session is not ended under any circumstances.
    NeverEnd,
    /// The session ends this many seconds after disconnection.
    Seconds(u32),
}

impl SessionExpiryInterval {
    pub(crate) fn as_u32(self) -> u32 {
        match self {
            Self::EndOnDisconnect => 0,
            Self::NeverEnd => u32::MAX,
            Self::Seconds(s) => s,
        }
    }
}

/// Maximum packet size this client will accept. Exceeding it is a protocol
/// error the peer must honor (MQTT-3.1.2-24 companion, §3.1.2.11.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaximumPacketSize {
    #[default]
    Unlimited,
    Limit(u32),
}

/// Configuration for a [`crate::client::Client`]. Fields that only make
/// sense before a CONNECT is sent are rejected with
/// [`crate::error::Error::ConfigurationLocked`] if set while the client is
/// `Connecting`, `WaitConnAck`, or `Connected`; see
/// [`ClientConfig::is_connect_time_only`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub protocol_version: ProtocolVersion,
    pub keep_alive: KeepAlive,
    pub clean_start: bool,
    pub session_expiry_interval: SessionExpiryInterval,
    pub receive_maximum: u16,
    pub maximum_packet_size: MaximumPacketSize,
    pub topic_alias_maximum: u16,
    pub request_response_information: bool,
    pub request_problem_information: bool,
    pub user_properties: Vec<(String, String)>,
    /// Whether `+`/`#` in a subscription match a `$`-prefixed topic level.
    pub match_options: MatchOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol_version: ProtocolVersion::V5,
            keep_alive: KeepAlive::default(),
            clean_start: true,
            session_expiry_interval: SessionExpiryInterval::default(),
            receive_maximum: u16::MAX,
            maximum_packet_size: MaximumPacketSize::default(),
            topic_alias_maximum: 0,
            request_response_information: false,
            request_problem_information: true,
            user_properties: Vec::new(),
            match_options: MatchOptions::default(),
        }
    }
}

/// Names a single [`ClientConfig`] field for `Client::set_config`, so the
/// engine can apply the update and, for connect-time-only fields, reject it
/// outright if the client isn't `Disconnected`.
#[derive(Debug, Clone)]
pub enum ConfigUpdate {
    ProtocolVersion(ProtocolVersion),
    KeepAlive(KeepAlive),
    CleanStart(bool),
    SessionExpiryInterval(SessionExpiryInterval),
    ReceiveMaximum(u16),
    MaximumPacketSize(MaximumPacketSize),
    TopicAliasMaximum(u16),
    RequestResponseInformation(bool),
    RequestProblemInformation(bool),
    UserProperties(Vec<(String, String)>),
    MatchOptions(MatchOptions),
}

impl ConfigUpdate {
    /// Only `MatchOptions` (which affects dispatch of already-inbound
    /// messages, not anything negotiated with the server) may be changed
    /// while connected.
    pub fn is_connect_time_only(&self) -> bool {
        !matches!(self, Self::MatchOptions(_))
    }

    pub fn apply(self, config: &mut ClientConfig) {
        match self {
            Self::ProtocolVersion(v) => config.protocol_version = v,
            Self::KeepAlive(v) => config.keep_alive = v,
            Self::CleanStart(v) => config.clean_start = v,
            Self::SessionExpiryInterval(v) => config.session_expiry_interval = v,
            Self::ReceiveMaximum(v) => config.receive_maximum = v,
            Self::MaximumPacketSize(v) => config.maximum_packet_size = v,
            Self::TopicAliasMaximum(v) => config.topic_alias_maximum = v,
            Self::RequestResponseInformation(v) => config.request_response_information = v,
            Self::RequestProblemInformation(v) => config.request_problem_information = v,
            Self::UserProperties(v) => config.user_properties = v,
            Self::MatchOptions(v) => config.match_options = v,
        }
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn only_match_options_is_mutable_while_connected() {
        assert!(!ConfigUpdate::MatchOptions(MatchOptions::default()).is_connect_time_only());
        assert!(ConfigUpdate::KeepAlive(KeepAlive::Seconds(30)).is_connect_time_only());
    }
}
