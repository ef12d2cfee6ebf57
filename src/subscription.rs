//! Subscriptions (component C6): a registry of active topic filters and the
//! per-filter handle a caller holds to receive matched messages and observe
//! state changes.

use std::collections::HashMap;

use tokio::sync::{broadcast, watch};

use crate::message::Message;
use crate::types::{MatchOptions, QoS, ReasonCode, TopicFilter, TopicName};

/// The lifecycle of one subscription, as observed through
/// [`Subscription::state`]. `qos` changing on an `Active` subscription
/// (a re-SUBSCRIBE granting a different level) fires a state-changed
/// notification distinct from a `Pending` -> `Active` transition, per
/// SPEC_FULL.md's note on `qosChanged` vs plain `state_changed` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Pending,
    Active(QoS),
    Failed(ReasonCode),
    Unsubscribed,
}

/// Capacity of the per-subscription message channel, per handle. Repeated
/// `subscribe()` calls on the same filter each get their own receiver over
/// the same broadcast, so one slow handle falling behind only costs that
/// handle skipped messages, not the others.
const MESSAGE_CHANNEL_CAPACITY: usize = 64;

/// A caller's handle to one active subscription. Subscribing twice to the
/// same filter hands back a second `Subscription` sharing the same
/// underlying state, rather than a second independent registration.
pub struct Subscription {
    filter: TopicFilter,
    messages: broadcast::Receiver<Message>,
    state: watch::Receiver<SubscriptionState>,
    qos_changed: watch::Receiver<QoS>,
}

impl Subscription {
    pub fn filter(&self) -> &TopicFilter {
        &self.filter
    }

    pub fn state(&self) -> SubscriptionState {
        *self.state.borrow()
    }

    /// Waits for the state to change and returns the new value.
    pub async fn state_changed(&mut self) -> SubscriptionState {
        let _ = self.state.changed().await;
        self.state()
    }

    /// Waits for a re-SUBSCRIBE to grant a different QoS than this filter
    /// already held, distinct from the initial `Pending` -> `Active` grant.
    pub async fn qos_changed(&mut self) -> QoS {
        let _ = self.qos_changed.changed().await;
        *self.qos_changed.borrow()
    }

    /// Receives the next matched message, or `None` once the subscription
    /// is torn down (unsubscribed or the client disconnected for good). A
    /// handle that falls too far behind the broadcast skips the messages it
    /// missed rather than being told about the gap.
    pub async fn recv(&mut self) -> Option<Message> {
        loop {
            match self.messages.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

struct RegistryEntry {
    sender: broadcast::Sender<Message>,
    state: watch::Sender<SubscriptionState>,
    qos_changed: watch::Sender<QoS>,
}

/// Engine-side registry of all subscriptions for one connection, keyed by
/// the filter string so re-subscribing to the same filter updates the
/// existing entry instead of creating a second one.
#[derive(Default)]
pub struct SubscriptionRegistry {
    entries: HashMap<TopicFilter, RegistryEntry>,
}

impl SubscriptionRegistry {
    /// Creates a brand-new entry for `filter` and returns the caller-facing
    /// handle. Any previous handle for the same filter observes
    /// `Unsubscribed` and its message channel closes. Callers should check
    /// [`SubscriptionRegistry::handle_for`] first; this always starts a
    /// fresh registration.
    pub fn register(&mut self, filter: TopicFilter) -> Subscription {
        let (tx, rx) = broadcast::channel(MESSAGE_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(SubscriptionState::Pending);
        let (qos_tx, qos_rx) = watch::channel(QoS::AtMostOnce);
        self.entries.insert(filter.clone(), RegistryEntry { sender: tx, state: state_tx, qos_changed: qos_tx });
        Subscription { filter, messages: rx, state: state_rx, qos_changed: qos_rx }
    }

    pub fn contains(&self, filter: &TopicFilter) -> bool {
        self.entries.contains_key(filter)
    }

    /// Returns a fresh handle onto the existing entry for `filter`, sharing
    /// its state and message stream, or `None` if there is none. Used by
    /// `subscribe()` to satisfy "subscribing the same filter twice returns
    /// the existing handle" without re-sending SUBSCRIBE.
    pub fn handle_for(&self, filter: &TopicFilter) -> Option<Subscription> {
        let entry = self.entries.get(filter)?;
        Some(Subscription {
            filter: filter.clone(),
            messages: entry.sender.subscribe(),
            state: entry.state.subscribe(),
            qos_changed: entry.qos_changed.subscribe(),
        })
    }

    /// Marks `filter` granted at `qos` (SUBACK success) or failed
    /// (SUBACK reason code >= 0x80). A re-SUBSCRIBE that grants a QoS
    /// different from the one already active fires `qos_changed` in
    /// addition to the ordinary state transition.
    pub fn set_granted(&mut self, filter: &TopicFilter, reason: ReasonCode) {
        if let Some(entry) = self.entries.get(filter) {
            let new_state = match QoS::from_suback_code(reason.value()) {
                Some(qos) => SubscriptionState::Active(qos),
                None => SubscriptionState::Failed(reason),
            };
            if let (SubscriptionState::Active(old), SubscriptionState::Active(new)) = (*entry.state.borrow(), new_state) {
                if old != new {
                    let _ = entry.qos_changed.send(new);
                }
            }
            let _ = entry.state.send(new_state);
        }
    }

    /// Removes `filter` entirely, notifying the handle it is unsubscribed.
    pub fn remove(&mut self, filter: &TopicFilter) {
        if let Some(entry) = self.entries.remove(filter) {
            let _ = entry.state.send(SubscriptionState::Unsubscribed);
        }
    }

    pub fn clear(&mut self) {
        for (_, entry) in self.entries.drain() {
            let _ = entry.state.send(SubscriptionState::Unsubscribed);
        }
    }

    /// Forwards `message` to every registered filter that matches its
    /// topic. A closed receiver is left in place; it is only ever removed
    /// by an explicit unsubscribe.
    pub async fn dispatch(&self, topic: &TopicName, message: Message, options: MatchOptions) {
        for entry in self
            .entries
            .iter()
            .filter(|(filter, _)| filter.matches(topic, options))
            .map(|(_, entry)| entry)
        {
            let _ = entry.sender.send(message.clone());
        }
    }
}

#[cfg(test)]
mod unit {
    use super::*;
    use crate::types::QoS;

    #[tokio::test]
    async fn dispatch_delivers_to_matching_filter_only() {
        let mut registry = SubscriptionRegistry::default();
        let mut a = registry.register(TopicFilter::new("sport/+").unwrap());
        let mut b = registry.register(TopicFilter::new("weather/#").unwrap());

        let topic = TopicName::new("sport/tennis").unwrap();
        let message = Message::new(topic.clone(), &b"score"[..]);
        registry.dispatch(&topic, message.clone(), MatchOptions::default()).await;

        assert_eq!(a.recv().await, Some(message));
        assert!(b.messages.try_recv().is_err());
    }

    #[tokio::test]
    async fn granted_suback_moves_state_to_active() {
        let mut registry = SubscriptionRegistry::default();
        let filter = TopicFilter::new("a/b").unwrap();
        let mut sub = registry.register(filter.clone());
        assert_eq!(sub.state(), SubscriptionState::Pending);

        registry.set_granted(&filter, ReasonCode::GrantedQoS1);
        assert_eq!(sub.state_changed().await, SubscriptionState::Active(QoS::AtLeastOnce));
    }

    #[tokio::test]
    async fn resubscribe_with_different_qos_fires_qos_changed() {
        let mut registry = SubscriptionRegistry::default();
        let filter = TopicFilter::new("a/b").unwrap();
        let mut sub = registry.register(filter.clone());

        registry.set_granted(&filter, ReasonCode::GrantedQoS1);
        assert_eq!(sub.state_changed().await, SubscriptionState::Active(QoS::AtLeastOnce));

        registry.set_granted(&filter, ReasonCode::GrantedQoS2);
        assert_eq!(sub.qos_changed().await, QoS::ExactlyOnce);
        assert_eq!(sub.state_changed().await, SubscriptionState::Active(QoS::ExactlyOnce));
    }

    #[tokio::test]
    async fn handle_for_shares_state_with_the_original_registration() {
        let mut registry = SubscriptionRegistry::default();
        let filter = TopicFilter::new("a/b").unwrap();
        let mut first = registry.register(filter.clone());
        registry.set_granted(&filter, ReasonCode::GrantedQoS1);
        assert_eq!(first.state_changed().await, SubscriptionState::Active(QoS::AtLeastOnce));

        let mut second = registry.handle_for(&filter).expect("entry exists");
        assert_eq!(second.state(), SubscriptionState::Active(QoS::AtLeastOnce));

        let topic = TopicName::new("a/b").unwrap();
        let message = Message::new(topic.clone(), &b"x"[..]);
        registry.dispatch(&topic, message.clone(), MatchOptions::default()).await;
        assert_eq!(first.recv().await, Some(message.clone()));
        assert_eq!(second.recv().await, Some(message));
    }

    #[tokio::test]
    async fn unsubscribe_notifies_and_closes_channel() {
        let mut registry = SubscriptionRegistry::default();
        let filter = TopicFilter::new("a/b").unwrap();
        let mut sub = registry.register(filter.clone());
        registry.remove(&filter);
        assert_eq!(sub.state_changed().await, SubscriptionState::Unsubscribed);
        assert_eq!(sub.recv().await, None);
    }
}
