//! An MQTT 3.1 / 3.1.1 / 5.0 client protocol engine over a generic
//! byte-stream transport.
//!
//! This crate implements the wire codec and connection/session state
//! machinery; it does not open sockets itself. Bring your own
//! [`transport::Transport`] (TCP, TLS, WebSocket, ...) and drive a
//! [`client::Client`] over it.
//!
//! ```ignore
//! let client = Client::new(my_transport, ClientConfig::default());
//! client.connect(ConnectOptions::default()).await?;
//! let mut sub = client.subscribe(TopicFilter::new("a/b").unwrap(), SubscriptionOptions::new(QoS::AtLeastOnce)).await?;
//! client.publish(Message::new(TopicName::new("a/b").unwrap(), "hello"), PublishOptions::default()).await?;
//! let msg = sub.recv().await;
//! ```

mod client;
mod codec;
mod connection;
mod error;
mod inflight;
mod keepalive;
mod message;
mod pid_allocator;
mod properties;
mod subscription;
mod topic_alias;
mod transport;
mod types;
mod util;

pub use client::config::{ClientConfig, ConfigUpdate, KeepAlive, MaximumPacketSize, SessionExpiryInterval};
pub use client::options::{ConnectOptions, DisconnectOptions, PublishOptions, SubscriptionOptions, WillOptions};
pub use client::{Client, Event};
pub use codec::{DisconnectProperties, RetainHandling, SubscribeOptions};
pub use connection::ConnectionPhase;
pub use error::{DecodeError, EncodeError, Error, ErrorKind};
pub use message::Message;
pub use properties::{
    AuthenticationProperties, ConnectProperties, PublishProperties, ServerProperties, WillProperties,
};
pub use subscription::{Subscription, SubscriptionState};
pub use transport::{Transport, TransportEvent};
pub use types::{MatchOptions, PacketId, ProtocolVersion, QoS, ReasonCode, TopicFilter, TopicName};
