//! Topic aliasing (MQTT 5.0 §4.8, §4.13 / SPEC_FULL.md §4.8). An alias
//! replaces a topic name on the wire with a small integer once the mapping
//! has been established in one direction; there is no relation between
//! the client's outbound aliases and the server's inbound ones.

use std::collections::HashMap;

use crate::error::Error;
use crate::types::TopicName;

/// What an outbound publish should do about aliasing, from
/// [`OutboundAliasTable::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundAliasUse {
    /// No alias: send the full topic name, as normal.
    None,
    /// First use of this alias: send both the topic name and the alias.
    Establish(u16),
    /// The mapping already exists on the server: the topic name may be
    /// omitted from the PUBLISH and only the alias sent.
    Reuse(u16),
}

/// Tracks aliases this client has assigned for outbound publishes, bounded
/// by the server's advertised `Topic Alias Maximum`.
#[derive(Debug, Clone)]
pub struct OutboundAliasTable {
    max: u16,
    next: u16,
    assigned: HashMap<TopicName, u16>,
}

impl OutboundAliasTable {
    pub fn new(max: u16) -> Self {
        Self { max, next: 1, assigned: HashMap::new() }
    }

    pub fn max(&self) -> u16 {
        self.max
    }

    /// Decides whether `topic` should be aliased on its next publish.
    /// Returns `None` once an alias has already been assigned to every
    /// value up to `max` and `topic` isn't one of them.
    pub fn resolve(&mut self, topic: &TopicName) -> OutboundAliasUse {
        if self.max == 0 {
            return OutboundAliasUse::None;
        }
        if let Some(&alias) = self.assigned.get(topic) {
            return OutboundAliasUse::Reuse(alias);
        }
        if self.next > self.max {
            return OutboundAliasUse::None;
        }
        let alias = self.next;
        self.next += 1;
        self.assigned.insert(topic.clone(), alias);
        OutboundAliasUse::Establish(alias)
    }

    /// Atomically replaces whatever alias `topic` held (if any) with
    /// `alias`, as chosen explicitly by the caller rather than by
    /// `resolve()`. Any other topic previously bound to `alias` keeps its
    /// old entry; the server resolves whichever binding arrived last.
    pub fn bind(&mut self, topic: TopicName, alias: u16) {
        self.assigned.insert(topic, alias);
    }

    /// Clears all mappings; the server does not remember them across a new
    /// network connection (MQTT-3.3.2-7).
    pub fn clear(&mut self) {
        self.next = 1;
        self.assigned.clear();
    }
}

/// Tracks aliases the server has established on inbound publishes, bounded
/// by this client's own advertised `Topic Alias Maximum`.
#[derive(Debug, Clone, Default)]
pub struct InboundAliasTable {
    mapping: HashMap<u16, TopicName>,
}

impl InboundAliasTable {
    /// Resolves the effective topic of an inbound PUBLISH. `topic` is the
    /// (possibly empty) topic name field; MQTT 5.0 allows it to be empty
    /// only when `alias` is present and already mapped.
    pub fn resolve(&mut self, topic: Option<TopicName>, alias: Option<u16>) -> Result<TopicName, Error> {
        match (topic, alias) {
            (Some(topic), Some(alias)) => {
                self.mapping.insert(alias, topic.clone());
                Ok(topic)
            }
            (Some(topic), None) => Ok(topic),
            (None, Some(alias)) => self
                .mapping
                .get(&alias)
                .cloned()
                .ok_or(Error::Protocol("topic alias used before being established")),
            (None, None) => Err(Error::Protocol("publish carries neither a topic name nor an alias")),
        }
    }

    pub fn clear(&mut self) {
        self.mapping.clear();
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn outbound_establishes_once_then_reuses() {
        let mut table = OutboundAliasTable::new(2);
        let topic = TopicName::new("a/b").unwrap();
        assert_eq!(table.resolve(&topic), OutboundAliasUse::Establish(1));
        assert_eq!(table.resolve(&topic), OutboundAliasUse::Reuse(1));
    }

    #[test]
    fn outbound_falls_back_to_none_once_exhausted() {
        let mut table = OutboundAliasTable::new(1);
        let a = TopicName::new("a").unwrap();
        let b = TopicName::new("b").unwrap();
        assert_eq!(table.resolve(&a), OutboundAliasUse::Establish(1));
        assert_eq!(table.resolve(&b), OutboundAliasUse::None);
    }

    #[test]
    fn bind_replaces_the_existing_alias_for_a_topic() {
        let mut table = OutboundAliasTable::new(4);
        let topic = TopicName::new("a/b").unwrap();
        assert_eq!(table.resolve(&topic), OutboundAliasUse::Establish(1));
        table.bind(topic.clone(), 3);
        assert_eq!(table.resolve(&topic), OutboundAliasUse::Reuse(3));
    }

    #[test]
    fn inbound_requires_established_mapping_before_alias_only_use() {
        let mut table = InboundAliasTable::default();
        assert!(table.resolve(None, Some(1)).is_err());
        let topic = TopicName::new("a/b").unwrap();
        assert_eq!(table.resolve(Some(topic.clone()), Some(1)).unwrap(), topic);
        assert_eq!(table.resolve(None, Some(1)).unwrap(), topic);
    }
}
