//! In-flight acknowledgment tables (component C5): one entry per
//! outstanding QoS 1/2 publish, in either direction, tracked until the
//! handshake completes.

use std::collections::HashMap;

use crate::message::Message;
use crate::types::PacketId;

/// Where an outbound QoS 1/2 publish sits in its acknowledgment handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundPhase {
    /// QoS 1, waiting for PUBACK.
    AwaitingPuback,
    /// QoS 2, waiting for PUBREC.
    AwaitingPubrec,
    /// QoS 2, PUBREL sent, waiting for PUBCOMP.
    AwaitingPubcomp,
}

#[derive(Debug, Clone)]
struct OutboundEntry {
    message: Message,
    phase: OutboundPhase,
}

/// Tracks publishes this client sent that have not yet been fully
/// acknowledged.
#[derive(Debug, Clone, Default)]
pub struct OutboundTable {
    entries: HashMap<PacketId, OutboundEntry>,
}

impl OutboundTable {
    pub fn is_in_use(&self, id: PacketId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers a freshly sent QoS 1/2 publish. `id` must not already be
    /// tracked; the caller is responsible for allocating a free one.
    pub fn insert(&mut self, id: PacketId, message: Message, phase: OutboundPhase) {
        self.entries.insert(id, OutboundEntry { message, phase });
    }

    pub fn phase(&self, id: PacketId) -> Option<OutboundPhase> {
        self.entries.get(&id).map(|e| e.phase)
    }

    pub fn message(&self, id: PacketId) -> Option<&Message> {
        self.entries.get(&id).map(|e| &e.message)
    }

    /// A PUBACK completes a QoS 1 publish; returns the finished message.
    pub fn complete_with_puback(&mut self, id: PacketId) -> Option<Message> {
        match self.entries.get(&id).map(|e| e.phase) {
            Some(OutboundPhase::AwaitingPuback) => self.entries.remove(&id).map(|e| e.message),
            _ => None,
        }
    }

    /// A PUBREC moves a QoS 2 publish into `AwaitingPubcomp`; the caller
    /// must then send PUBREL. Returns `false` if `id` wasn't awaiting PUBREC.
    pub fn advance_on_pubrec(&mut self, id: PacketId) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) if entry.phase == OutboundPhase::AwaitingPubrec => {
                entry.phase = OutboundPhase::AwaitingPubcomp;
                true
            }
            _ => false,
        }
    }

    /// A PUBCOMP completes a QoS 2 publish; returns the finished message.
    pub fn complete_with_pubcomp(&mut self, id: PacketId) -> Option<Message> {
        match self.entries.get(&id).map(|e| e.phase) {
            Some(OutboundPhase::AwaitingPubcomp) => self.entries.remove(&id).map(|e| e.message),
            _ => None,
        }
    }

    /// All identifiers currently tracked, for resend-on-reconnect.
    pub fn ids(&self) -> impl Iterator<Item = PacketId> + '_ {
        self.entries.keys().copied()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Tracks inbound QoS 2 publishes between PUBREC (sent by us) and PUBREL
/// (received from the peer), so a redelivered PUBLISH with the same id
/// isn't handed to the application twice.
#[derive(Debug, Clone, Default)]
pub struct InboundTable {
    awaiting_pubrel: HashMap<PacketId, ()>,
}

impl InboundTable {
    pub fn is_in_use(&self, id: PacketId) -> bool {
        self.awaiting_pubrel.contains_key(&id)
    }

    /// Records that `id` is now awaiting PUBREL. Returns `true` if this is
    /// the first time (the application should be notified), `false` if
    /// `id` was already tracked (this is a redelivery; do not notify again).
    pub fn begin(&mut self, id: PacketId) -> bool {
        self.awaiting_pubrel.insert(id, ()).is_none()
    }

    /// A PUBREL was received; the handshake is done and PUBCOMP should be
    /// sent. Returns `false` if `id` wasn't tracked (protocol violation by
    /// the peer, but recoverable: PUBCOMP is sent regardless per spec).
    pub fn complete(&mut self, id: PacketId) -> bool {
        self.awaiting_pubrel.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.awaiting_pubrel.clear();
    }
}

#[cfg(test)]
mod unit {
    use super::*;
    use crate::types::{QoS, TopicName};

    fn msg() -> Message {
        Message::new(TopicName::new("a").unwrap(), &b"x"[..]).with_qos(QoS::ExactlyOnce)
    }

    #[test]
    fn qos1_completes_on_puback() {
        let mut table = OutboundTable::default();
        let id = PacketId::new(1).unwrap();
        table.insert(id, msg(), OutboundPhase::AwaitingPuback);
        assert!(table.complete_with_puback(id).is_some());
        assert!(table.is_empty());
    }

    #[test]
    fn qos2_requires_pubrec_then_pubcomp() {
        let mut table = OutboundTable::default();
        let id = PacketId::new(1).unwrap();
        table.insert(id, msg(), OutboundPhase::AwaitingPubrec);
        assert!(table.complete_with_pubcomp(id).is_none(), "not yet advanced");
        assert!(table.advance_on_pubrec(id));
        assert!(table.complete_with_puback(id).is_none(), "wrong ack for this phase");
        assert!(table.complete_with_pubcomp(id).is_some());
    }

    #[test]
    fn inbound_table_suppresses_duplicate_delivery() {
        let mut table = InboundTable::default();
        let id = PacketId::new(1).unwrap();
        assert!(table.begin(id));
        assert!(!table.begin(id), "redelivered PUBLISH must not renotify");
        assert!(table.complete(id));
        assert!(!table.is_in_use(id));
    }
}
