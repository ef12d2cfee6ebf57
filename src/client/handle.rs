//! The public facade (component C10): a cheap-to-clone handle around the
//! command channel that drives one [`Engine`] task.

use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::client::command::Command;
use crate::client::config::{ClientConfig, ConfigUpdate};
use crate::client::engine::Engine;
use crate::client::events::Event;
use crate::client::options::{ConnectOptions, DisconnectOptions, PublishOptions, SubscriptionOptions};
use crate::connection::ConnectionPhase;
use crate::error::Error;
use crate::message::Message;
use crate::properties::AuthenticationProperties;
use crate::subscription::Subscription;
use crate::transport::Transport;
use crate::types::TopicFilter;

/// Commands queue up here until the engine task picks them off; a small
/// bound is enough since every call blocks on its own reply anyway.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Events a caller hasn't drained yet before this many more arrive are
/// dropped for that caller (reported as a lagged `next_event`, not a panic).
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// A handle to one MQTT connection. Cloning a `Client` shares the same
/// underlying engine task; dropping every clone stops it. Unlike `commands`
/// and `phase`, the event stream is a broadcast rather than a watch: two
/// events fired back to back (e.g. `BrokerSessionRestored` immediately
/// followed by a phase change) must both be observable, not just the latest.
pub struct Client {
    commands: mpsc::Sender<Command>,
    phase: watch::Receiver<ConnectionPhase>,
    events_tx: broadcast::Sender<Event>,
    events_rx: broadcast::Receiver<Event>,
}

impl Clone for Client {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            phase: self.phase.clone(),
            events_tx: self.events_tx.clone(),
            events_rx: self.events_tx.subscribe(),
        }
    }
}

impl Client {
    /// Spawns the engine task driving `transport` and returns a handle to
    /// it. The connection isn't opened until [`Client::connect`] is called.
    pub fn new<T>(transport: T, config: ClientConfig) -> Self
    where
        T: Transport + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (phase_tx, phase_rx) = watch::channel(ConnectionPhase::Disconnected);
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let engine = Engine::new(transport, config, event_tx.clone(), phase_tx, command_rx);
        tokio::spawn(engine.run());

        Self { commands: command_tx, phase: phase_rx, events_tx: event_tx, events_rx: event_rx }
    }

    /// The connection phase as of the last observed change. Does not block.
    pub fn phase(&self) -> ConnectionPhase {
        *self.phase.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.phase() == ConnectionPhase::Connected
    }

    /// Waits for the next lifecycle event (phase change, AUTH continuation,
    /// session restoration, or an error). Returns `None` once the engine
    /// task has stopped. A caller that falls behind skips the events it
    /// missed rather than being told about the gap.
    pub async fn next_event(&mut self) -> Option<Event> {
        loop {
            match self.events_rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub async fn connect(&self, options: ConnectOptions) -> Result<(), Error> {
        self.call(|reply| Command::Connect(options, reply)).await
    }

    pub async fn publish(&self, message: Message, options: PublishOptions) -> Result<(), Error> {
        self.call(|reply| Command::Publish(message, options, reply)).await
    }

    pub async fn subscribe(&self, filter: TopicFilter, options: SubscriptionOptions) -> Result<Subscription, Error> {
        self.call(|reply| Command::Subscribe(filter, options, reply)).await
    }

    pub async fn unsubscribe(&self, filter: TopicFilter) -> Result<(), Error> {
        self.call(|reply| Command::Unsubscribe(filter, reply)).await
    }

    pub async fn disconnect(&self, options: DisconnectOptions) -> Result<(), Error> {
        self.call(|reply| Command::Disconnect(options, reply)).await
    }

    pub async fn reauthenticate(&self, properties: AuthenticationProperties) -> Result<(), Error> {
        self.call(|reply| Command::Reauthenticate(properties, reply)).await
    }

    pub async fn set_config(&self, update: ConfigUpdate) -> Result<(), Error> {
        self.call(|reply| Command::SetConfig(update, reply)).await
    }

    /// Sends PINGREQ immediately, independent of the keep-alive timer.
    pub async fn request_ping(&self) -> Result<(), Error> {
        self.call(Command::Ping).await
    }

    /// Sends a command built from `build` and awaits its reply. Fails with
    /// [`Error::NotConnected`] if the engine task has already stopped.
    async fn call<R>(&self, build: impl FnOnce(oneshot::Sender<Result<R, Error>>) -> Command) -> Result<R, Error> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands.send(build(reply_tx)).await.map_err(|_| Error::NotConnected)?;
        reply_rx.await.map_err(|_| Error::NotConnected)?
    }
}
