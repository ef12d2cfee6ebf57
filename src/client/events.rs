//! Client-wide lifecycle events, observed through `Client::next_event`.
//! Per-subscription state lives on [`crate::subscription::Subscription`]
//! instead, since it is naturally scoped to one filter.

use crate::connection::ConnectionPhase;
use crate::error::ErrorKind;
use crate::message::Message;
use crate::types::PacketId;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ConnectionPhaseChanged(ConnectionPhase),
    /// The server sent AUTH with `ContinueAuthentication`: the caller must
    /// respond via `Client::reauthenticate` with the next step.
    AuthenticationContinue,
    /// CONNACK reported `session_present`: the broker resumed a prior
    /// session instead of starting a clean one. Any in-flight QoS 1/2
    /// publishes from before the reconnect have already been resent with
    /// DUP set by the time this fires.
    BrokerSessionRestored,
    /// A QoS 1/2 outbound publish completed its acknowledgment handshake
    /// (PUBACK or PUBCOMP received) and has been removed from the
    /// outbound in-flight table.
    MessageSent(PacketId),
    /// Any inbound PUBLISH accepted for delivery, independent of which
    /// (if any) `Subscription` handles also received it.
    MessageReceived(Message),
    /// PINGRESP was received for an outstanding PINGREQ, whether sent by
    /// the keep-alive timer or by `Client::request_ping`.
    PingResponseReceived,
    Error(ErrorKind),
}
