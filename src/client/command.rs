//! The command queue external callers use to drive the engine task
//! (§5): every `Client` method other than a handful of synchronous
//! getters sends one of these and awaits the paired `oneshot` reply.

use tokio::sync::oneshot;

use crate::client::config::ConfigUpdate;
use crate::client::options::{ConnectOptions, DisconnectOptions, PublishOptions, SubscriptionOptions};
use crate::error::Error;
use crate::message::Message;
use crate::properties::AuthenticationProperties;
use crate::subscription::Subscription;
use crate::types::TopicFilter;

pub enum Command {
    Connect(ConnectOptions, oneshot::Sender<Result<(), Error>>),
    Publish(Message, PublishOptions, oneshot::Sender<Result<(), Error>>),
    Subscribe(TopicFilter, SubscriptionOptions, oneshot::Sender<Result<Subscription, Error>>),
    Unsubscribe(TopicFilter, oneshot::Sender<Result<(), Error>>),
    Disconnect(DisconnectOptions, oneshot::Sender<Result<(), Error>>),
    Reauthenticate(AuthenticationProperties, oneshot::Sender<Result<(), Error>>),
    SetConfig(ConfigUpdate, oneshot::Sender<Result<(), Error>>),
    /// Sends PINGREQ on demand, independent of the keep-alive timer.
    Ping(oneshot::Sender<Result<(), Error>>),
}
