//! The single-threaded cooperative engine task (§5): owns the connection
//! state, the in-flight tables, the subscription registry, and the
//! transport. External callers never touch any of it directly; they send
//! [`Command`]s and, for inbound data, observe [`crate::subscription::Subscription`]s
//! and [`crate::client::events::Event`].

use std::collections::HashMap;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{sleep, Instant};

use crate::client::command::Command;
use crate::client::config::{ClientConfig, ConfigUpdate};
use crate::client::events::Event;
use crate::client::options::{ConnectOptions, DisconnectOptions, PublishOptions, SubscriptionOptions};
use crate::codec::{
    AckPacket, AuthPacket, ConnectPacket, ControlPacket, DisconnectPacket, PublishPacket, SubAckPacket,
    SubscribePacket, UnsubAckPacket, UnsubscribePacket, Will,
};
use crate::connection::{ConnectionPhase, ConnectionState};
use crate::error::{Error, ErrorKind};
use crate::inflight::{InboundTable, OutboundPhase, OutboundTable};
use crate::keepalive::KeepAlive;
use crate::message::Message;
use crate::pid_allocator::PacketIdAllocator;
use crate::subscription::{Subscription, SubscriptionRegistry, SubscriptionState};
use crate::topic_alias::{InboundAliasTable, OutboundAliasTable, OutboundAliasUse};
use crate::transport::{map_transport_error, Transport};
use crate::types::{PacketId, QoS, ReasonCode, TopicFilter};
use crate::util::client_id::generate_client_id;

/// Bytes read from the transport per `read()` call. Streamed packets that
/// span multiple reads accumulate in `read_buf` until a full frame decodes.
const READ_CHUNK: usize = 4096;

/// Whether `id` is presently live in any of the four tables §4.3 requires
/// allocation to check. Taking the tables by reference (rather than as a
/// method on `Engine`) keeps this usable from inside a closure passed to
/// `self.allocator.allocate(...)` without borrowing all of `self`.
fn id_in_use(
    outbound: &OutboundTable,
    inbound: &InboundTable,
    pending_subscribes: &HashMap<PacketId, Vec<TopicFilter>>,
    pending_unsubscribes: &HashMap<PacketId, Vec<TopicFilter>>,
    id: PacketId,
) -> bool {
    outbound.is_in_use(id)
        || inbound.is_in_use(id)
        || pending_subscribes.contains_key(&id)
        || pending_unsubscribes.contains_key(&id)
}

pub struct Engine<T: Transport> {
    transport: T,
    config: ClientConfig,
    connection: ConnectionState,
    outbound: OutboundTable,
    inbound: InboundTable,
    allocator: PacketIdAllocator,
    subscriptions: SubscriptionRegistry,
    outbound_aliases: OutboundAliasTable,
    inbound_aliases: InboundAliasTable,
    keepalive: KeepAlive,
    pending_subscribes: HashMap<PacketId, Vec<TopicFilter>>,
    pending_unsubscribes: HashMap<PacketId, Vec<TopicFilter>>,
    read_buf: Vec<u8>,
    events: broadcast::Sender<Event>,
    phase: watch::Sender<ConnectionPhase>,
    commands: mpsc::Receiver<Command>,
}

impl<T: Transport> Engine<T> {
    pub fn new(
        transport: T,
        config: ClientConfig,
        events: broadcast::Sender<Event>,
        phase: watch::Sender<ConnectionPhase>,
        commands: mpsc::Receiver<Command>,
    ) -> Self {
        let now = Instant::now();
        Self {
            transport,
            outbound_aliases: OutboundAliasTable::new(config.topic_alias_maximum),
            config,
            connection: ConnectionState::default(),
            outbound: OutboundTable::default(),
            inbound: InboundTable::default(),
            allocator: PacketIdAllocator::default(),
            subscriptions: SubscriptionRegistry::default(),
            inbound_aliases: InboundAliasTable::default(),
            keepalive: KeepAlive::new(Duration::ZERO, now),
            pending_subscribes: HashMap::new(),
            pending_unsubscribes: HashMap::new(),
            read_buf: Vec::new(),
            events,
            phase,
            commands,
        }
    }

    /// Drives the engine until the command channel closes (every `Client`
    /// handle, including the original one, has been dropped).
    pub async fn run(mut self) {
        loop {
            let deadline = self
                .keepalive
                .next_deadline(Instant::now())
                .map(|d| Instant::now() + d)
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            let mut chunk = [0u8; READ_CHUNK];
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(command).await,
                        None => break,
                    }
                }
                result = self.transport.read(&mut chunk), if self.connection.is_connected() => {
                    match result {
                        Ok(0) => self.on_connection_lost(ErrorKind::TransportInvalid).await,
                        Ok(n) => {
                            self.read_buf.extend_from_slice(&chunk[..n]);
                            self.drain_read_buffer().await;
                        }
                        Err(e) => self.on_connection_lost_from(e).await,
                    }
                }
                _ = sleep(deadline.saturating_duration_since(Instant::now())), if self.connection.is_connected() => {
                    self.on_keepalive_tick().await;
                }
            }
        }
    }

    async fn on_keepalive_tick(&mut self) {
        let now = Instant::now();
        if self.keepalive.is_dead(now) {
            self.on_connection_lost(ErrorKind::TransportInvalid).await;
            return;
        }
        if self.keepalive.should_send_pingreq(now) {
            if self.write_packet(ControlPacket::PingReq).await.is_ok() {
                self.keepalive.on_pingreq_sent(now);
            }
        }
    }

    async fn drain_read_buffer(&mut self) {
        loop {
            let version = self.config.protocol_version;
            match ControlPacket::decode(&self.read_buf, version) {
                Ok(Some((packet, consumed))) => {
                    self.read_buf.drain(..consumed);
                    self.handle_inbound(packet).await;
                }
                Ok(None) => break,
                Err(_) => {
                    self.on_connection_lost(ErrorKind::ProtocolViolation).await;
                    break;
                }
            }
        }
    }

    async fn write_packet(&mut self, packet: ControlPacket) -> Result<(), Error> {
        let bytes = packet.encode(self.config.protocol_version).map_err(Error::from)?;
        self.transport.write(&bytes).await.map_err(map_transport_error)?;
        self.keepalive.on_packet_sent(Instant::now());
        Ok(())
    }

    fn publish_event(&self, phase: ConnectionPhase) {
        let _ = self.phase.send(phase);
        let _ = self.events.send(Event::ConnectionPhaseChanged(phase));
    }

    async fn on_connection_lost(&mut self, kind: ErrorKind) {
        warn!("connection lost: {kind}");
        self.connection.connection_lost(kind);
        self.keepalive = KeepAlive::new(Duration::ZERO, Instant::now());
        let _ = self.transport.close().await;
        self.invalidate_pending_subscriptions();
        self.outbound_aliases.clear();
        self.inbound_aliases.clear();
        let _ = self.events.send(Event::Error(kind));
        self.publish_event(self.connection.phase());
    }

    /// Subscriptions still awaiting SUBACK/UNSUBACK can never complete once
    /// the connection drops; their handles move to `Unsubscribed` rather
    /// than being left in limbo. Already-granted subscriptions are left
    /// alone: whether they survive depends on the next CONNACK's
    /// `session_present`, decided in `do_connect`.
    fn invalidate_pending_subscriptions(&mut self) {
        for (_, filters) in self.pending_subscribes.drain() {
            for filter in &filters {
                self.subscriptions.remove(filter);
            }
        }
        for (_, filters) in self.pending_unsubscribes.drain() {
            for filter in &filters {
                self.subscriptions.remove(filter);
            }
        }
    }

    async fn on_connection_lost_from<E: std::fmt::Display>(&mut self, e: E) {
        warn!("transport read failed: {e}");
        self.on_connection_lost(ErrorKind::TransportInvalid).await;
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect(options, reply) => {
                let result = self.do_connect(options).await;
                let _ = reply.send(result);
            }
            Command::Publish(message, options, reply) => {
                let result = self.do_publish(message, options).await;
                let _ = reply.send(result);
            }
            Command::Subscribe(filter, options, reply) => {
                let result = self.do_subscribe(filter, options).await;
                let _ = reply.send(result);
            }
            Command::Unsubscribe(filter, reply) => {
                let result = self.do_unsubscribe(filter).await;
                let _ = reply.send(result);
            }
            Command::Disconnect(options, reply) => {
                let result = self.do_disconnect(options).await;
                let _ = reply.send(result);
            }
            Command::Reauthenticate(properties, reply) => {
                let result = self.do_reauthenticate(properties).await;
                let _ = reply.send(result);
            }
            Command::SetConfig(update, reply) => {
                let result = self.do_set_config(update);
                let _ = reply.send(result);
            }
            Command::Ping(reply) => {
                let result = self.do_ping().await;
                let _ = reply.send(result);
            }
        }
    }

    async fn do_ping(&mut self) -> Result<(), Error> {
        self.ensure_connected()?;
        self.write_packet(ControlPacket::PingReq).await?;
        self.keepalive.on_pingreq_sent(Instant::now());
        Ok(())
    }

    fn do_set_config(&mut self, update: ConfigUpdate) -> Result<(), Error> {
        if update.is_connect_time_only() && self.connection.phase() != ConnectionPhase::Disconnected {
            return Err(Error::ConfigurationLocked);
        }
        update.apply(&mut self.config);
        Ok(())
    }

    async fn do_connect(&mut self, options: ConnectOptions) -> Result<(), Error> {
        debug!("connecting with protocol version {:?}", self.config.protocol_version);
        self.connection.begin_connecting()?;

        self.transport.open().await.map_err(map_transport_error).inspect_err(|e| {
            self.connection.connect_failed(e.kind());
        })?;
        self.connection.transport_opened();

        let client_id = options.client_id.unwrap_or_else(generate_client_id);
        let will = options.will.map(|w| Will {
            topic: w.topic,
            payload: w.payload,
            qos: w.qos,
            retain: w.retain,
            properties: w.properties,
        });

        let connect = ControlPacket::Connect(ConnectPacket {
            protocol_version: self.config.protocol_version,
            clean_start: self.config.clean_start,
            keep_alive: self.config.keep_alive.as_u16(),
            client_id,
            will,
            username: options.username,
            password: options.password,
            properties: options.properties,
        });

        self.keepalive = KeepAlive::new(Duration::from_secs(self.config.keep_alive.as_u16() as u64), Instant::now());
        if let Err(e) = self.write_packet(connect).await {
            self.connection.connect_failed(e.kind());
            return Err(e);
        }

        let connack = match self.await_connack().await {
            Ok(connack) => connack,
            Err(e) => {
                self.connection.connect_failed(e.kind());
                return Err(e);
            }
        };
        if !connack.reason_code.is_success() {
            let kind = ErrorKind::from_connack_return_code(connack_legacy_code(&connack));
            self.connection.connect_failed(kind);
            return Err(Error::ConnectRejected(kind));
        }

        if let Some(max) = connack.properties.topic_alias_maximum {
            self.outbound_aliases = OutboundAliasTable::new(max);
        }
        self.connection.connack_accepted();
        debug!("connected, session_present={}", connack.session_present);

        if connack.session_present {
            if self.config.clean_start {
                warn!("broker reports session_present=true despite clean_start; accepting the resumed session");
            }
            self.resend_in_flight().await;
            let _ = self.events.send(Event::BrokerSessionRestored);
        } else {
            self.subscriptions.clear();
            self.outbound.clear();
            self.inbound.clear();
            self.pending_subscribes.clear();
            self.pending_unsubscribes.clear();
        }

        self.publish_event(self.connection.phase());
        Ok(())
    }

    /// MQTT-4.4.0-1: once a resumed session is confirmed, every outbound
    /// QoS 1/2 publish still awaiting acknowledgment from before the
    /// reconnect is resent with DUP set. An entry already in
    /// `AwaitingPubcomp` had its PUBLISH acknowledged via PUBREC before the
    /// disconnect, so only the PUBREL needs resending.
    async fn resend_in_flight(&mut self) {
        let ids: Vec<_> = self.outbound.ids().collect();
        for id in ids {
            let Some(phase) = self.outbound.phase(id) else { continue };
            match phase {
                OutboundPhase::AwaitingPubcomp => {
                    let pubrel = ControlPacket::PubRel(AckPacket::simple(id));
                    let _ = self.write_packet(pubrel).await;
                }
                OutboundPhase::AwaitingPuback | OutboundPhase::AwaitingPubrec => {
                    let Some(message) = self.outbound.message(id).cloned() else { continue };
                    let packet = ControlPacket::Publish(PublishPacket {
                        topic: Some(message.topic.clone()),
                        id: Some(id),
                        payload: message.payload.clone(),
                        qos: message.qos,
                        retain: message.retain,
                        duplicate: true,
                        properties: message.properties.clone(),
                    });
                    let _ = self.write_packet(packet).await;
                }
            }
        }
    }

    /// Blocks on the transport until CONNACK arrives or the transport
    /// fails; no other packet type is legal before CONNACK (MQTT-3.1.0-1).
    async fn await_connack(&mut self) -> Result<crate::codec::ConnAckPacket, Error> {
        loop {
            match ControlPacket::decode(&self.read_buf, self.config.protocol_version) {
                Ok(Some((packet, consumed))) => {
                    self.read_buf.drain(..consumed);
                    let ControlPacket::ConnAck(connack) = packet else {
                        return Err(Error::Protocol("expected CONNACK as the first packet"));
                    };
                    return Ok(connack);
                }
                Ok(None) => {}
                Err(e) => return Err(Error::from(e)),
            }

            let mut chunk = [0u8; READ_CHUNK];
            let n = self.transport.read(&mut chunk).await.map_err(map_transport_error)?;
            if n == 0 {
                return Err(Error::Transport("connection closed before CONNACK".into()));
            }
            self.read_buf.extend_from_slice(&chunk[..n]);
        }
    }

    fn ensure_connected(&self) -> Result<(), Error> {
        if self.connection.is_connected() {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    async fn do_publish(&mut self, mut message: Message, options: PublishOptions) -> Result<(), Error> {
        self.ensure_connected()?;
        message.qos = options.qos;
        message.retain = options.retain;
        message.properties = options.properties;

        if self.config.protocol_version.is_v5() {
            if let Some(alias) = message.properties.topic_alias {
                // The caller picked a specific alias; bind it atomically
                // rather than letting the auto-allocator override it.
                self.outbound_aliases.bind(message.topic.clone(), alias);
            } else {
                match self.outbound_aliases.resolve(&message.topic) {
                    OutboundAliasUse::Establish(alias) => message.properties.topic_alias = Some(alias),
                    OutboundAliasUse::Reuse(_alias) => {
                        // Keeping the topic name on every publish is simpler and
                        // still correct; omitting it is a pure wire-size
                        // optimization this engine doesn't chase.
                    }
                    OutboundAliasUse::None => {}
                }
            }
        }

        let id = if message.qos == QoS::AtMostOnce {
            None
        } else {
            Some(self.allocator.allocate(|id| {
                id_in_use(&self.outbound, &self.inbound, &self.pending_subscribes, &self.pending_unsubscribes, id)
            })?)
        };
        message.id = id;

        let packet = ControlPacket::Publish(PublishPacket {
            topic: Some(message.topic.clone()),
            id,
            payload: message.payload.clone(),
            qos: message.qos,
            retain: message.retain,
            duplicate: false,
            properties: message.properties.clone(),
        });

        if let Some(id) = id {
            let phase = if message.qos == QoS::AtLeastOnce {
                OutboundPhase::AwaitingPuback
            } else {
                OutboundPhase::AwaitingPubrec
            };
            self.outbound.insert(id, message, phase);
        }

        self.write_packet(packet).await
    }

    async fn do_subscribe(
        &mut self,
        filter: TopicFilter,
        options: SubscriptionOptions,
    ) -> Result<Subscription, Error> {
        self.ensure_connected()?;

        if let Some(existing) = self.subscriptions.handle_for(&filter) {
            if matches!(existing.state(), SubscriptionState::Pending | SubscriptionState::Active(_)) {
                return Ok(existing);
            }
        }

        let id = self.allocator.allocate(|id| {
            id_in_use(&self.outbound, &self.inbound, &self.pending_subscribes, &self.pending_unsubscribes, id)
        })?;
        let handle = self.subscriptions.register(filter.clone());

        let packet = ControlPacket::Subscribe(SubscribePacket {
            id,
            filters: vec![(filter.clone(), options.inner)],
            properties: Default::default(),
        });
        self.pending_subscribes.insert(id, vec![filter]);
        self.write_packet(packet).await?;
        Ok(handle)
    }

    async fn do_unsubscribe(&mut self, filter: TopicFilter) -> Result<(), Error> {
        if !self.subscriptions.contains(&filter) {
            return Ok(());
        }
        if !self.connection.is_connected() {
            self.subscriptions.remove(&filter);
            return Ok(());
        }

        let id = self.allocator.allocate(|id| {
            id_in_use(&self.outbound, &self.inbound, &self.pending_subscribes, &self.pending_unsubscribes, id)
        })?;
        let packet = ControlPacket::Unsubscribe(UnsubscribePacket {
            id,
            filters: vec![filter.clone()],
            properties: Default::default(),
        });
        self.pending_unsubscribes.insert(id, vec![filter]);
        self.write_packet(packet).await
    }

    async fn do_disconnect(&mut self, options: DisconnectOptions) -> Result<(), Error> {
        let should_send = self.connection.begin_disconnect();
        if should_send {
            let packet = ControlPacket::Disconnect(DisconnectPacket {
                reason_code: options.reason_code,
                properties: options.properties,
            });
            let _ = self.write_packet(packet).await;
        }
        let _ = self.transport.close().await;
        self.invalidate_pending_subscriptions();
        self.outbound_aliases.clear();
        self.inbound_aliases.clear();
        self.publish_event(self.connection.phase());
        Ok(())
    }

    async fn do_reauthenticate(&mut self, properties: crate::properties::AuthenticationProperties) -> Result<(), Error> {
        self.ensure_connected()?;
        if !self.config.protocol_version.is_v5() {
            return Err(Error::Protocol("AUTH is only available on MQTT 5.0"));
        }
        let packet = ControlPacket::Auth(AuthPacket { reason_code: ReasonCode::ReAuthenticate, properties });
        self.write_packet(packet).await
    }

    async fn handle_inbound(&mut self, packet: ControlPacket) {
        self.keepalive.on_pingresp_received();
        match packet {
            ControlPacket::Publish(publish) => self.handle_publish(publish).await,
            ControlPacket::PubAck(ack) => {
                if self.outbound.complete_with_puback(ack.id).is_some() {
                    let _ = self.events.send(Event::MessageSent(ack.id));
                }
            }
            ControlPacket::PubRec(ack) => {
                if self.outbound.advance_on_pubrec(ack.id) {
                    let pubrel = ControlPacket::PubRel(AckPacket::simple(ack.id));
                    let _ = self.write_packet(pubrel).await;
                }
            }
            ControlPacket::PubRel(ack) => {
                self.inbound.complete(ack.id);
                let pubcomp = ControlPacket::PubComp(AckPacket::simple(ack.id));
                let _ = self.write_packet(pubcomp).await;
            }
            ControlPacket::PubComp(ack) => {
                if self.outbound.complete_with_pubcomp(ack.id).is_some() {
                    let _ = self.events.send(Event::MessageSent(ack.id));
                }
            }
            ControlPacket::SubAck(suback) => self.handle_suback(suback),
            ControlPacket::UnsubAck(unsuback) => self.handle_unsuback(unsuback),
            ControlPacket::PingResp => {
                let _ = self.events.send(Event::PingResponseReceived);
            }
            ControlPacket::Disconnect(_) => {
                self.on_connection_lost(ErrorKind::NoError).await;
            }
            ControlPacket::Auth(auth) => {
                if auth.reason_code == ReasonCode::ContinueAuthentication {
                    let _ = self.events.send(Event::AuthenticationContinue);
                }
            }
            ControlPacket::Connect(_) | ControlPacket::ConnAck(_) | ControlPacket::Subscribe(_) | ControlPacket::Unsubscribe(_) => {
                // A client never receives these; a compliant server won't
                // send them after CONNACK. Treat as a protocol violation.
                self.on_connection_lost(ErrorKind::ProtocolViolation).await;
            }
        }
    }

    async fn handle_publish(&mut self, publish: PublishPacket) {
        let topic = match self.inbound_aliases.resolve(publish.topic.clone(), publish.properties.topic_alias) {
            Ok(topic) => topic,
            Err(_) => {
                self.on_connection_lost(ErrorKind::ProtocolViolation).await;
                return;
            }
        };

        let message = Message {
            topic: topic.clone(),
            payload: publish.payload,
            qos: publish.qos,
            retain: publish.retain,
            duplicate: publish.duplicate,
            id: publish.id,
            properties: publish.properties,
        };

        let deliver = match (publish.qos, publish.id) {
            (QoS::AtMostOnce, _) => true,
            (QoS::AtLeastOnce, Some(id)) => {
                let puback = ControlPacket::PubAck(AckPacket::simple(id));
                let _ = self.write_packet(puback).await;
                true
            }
            (QoS::ExactlyOnce, Some(id)) => {
                let first_delivery = self.inbound.begin(id);
                let pubrec = ControlPacket::PubRec(AckPacket::simple(id));
                let _ = self.write_packet(pubrec).await;
                first_delivery
            }
            _ => false,
        };

        if deliver {
            let _ = self.events.send(Event::MessageReceived(message.clone()));
            self.subscriptions.dispatch(&topic, message, self.config.match_options).await;
        }
    }

    fn handle_suback(&mut self, suback: SubAckPacket) {
        let Some(filters) = self.pending_subscribes.remove(&suback.id) else {
            return;
        };
        for (filter, reason) in filters.iter().zip(suback.reason_codes.iter()) {
            self.subscriptions.set_granted(filter, *reason);
        }
    }

    fn handle_unsuback(&mut self, unsuback: UnsubAckPacket) {
        let Some(filters) = self.pending_unsubscribes.remove(&unsuback.id) else {
            return;
        };
        for filter in &filters {
            self.subscriptions.remove(filter);
        }
    }
}

/// v3/v3.1.1 CONNACK return codes and v5 CONNACK reason codes share no
/// single numeric space; `ErrorKind::from_connack_return_code` expects the
/// legacy 0-5 values, so v5 failures are mapped onto the closest legacy
/// meaning for the purpose of `Client::last_error`.
fn connack_legacy_code(connack: &crate::codec::ConnAckPacket) -> u8 {
    match connack.reason_code {
        ReasonCode::UnsupportedProtocolVersion => 1,
        ReasonCode::ClientIdentifierNotValid => 2,
        ReasonCode::ServerUnavailable => 3,
        ReasonCode::BadUserNameOrPassword => 4,
        ReasonCode::NotAuthorized | ReasonCode::Banned => 5,
        _ => 0x80,
    }
}
