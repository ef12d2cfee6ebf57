//! Keep-alive engine (component C8): issues PINGREQ when nothing else has
//! been sent for a while, and declares the connection dead if the server
//! stops responding entirely.

use std::time::Duration;

use tokio::time::Instant;

/// MQTT-3.1.2-24: if no PINGRESP is seen within one and a half keep-alive
/// intervals of sending PINGREQ, the server must be treated as unreachable.
const DEAD_CONNECTION_MULTIPLIER: f64 = 1.5;

#[derive(Debug, Clone)]
pub struct KeepAlive {
    interval: Option<Duration>,
    last_sent: Instant,
    ping_sent_at: Option<Instant>,
}

impl KeepAlive {
    /// `interval` of `Duration::ZERO` (keep-alive value 0) disables the
    /// engine entirely, per MQTT-3.1.2-22.
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval: if interval.is_zero() { None } else { Some(interval) },
            last_sent: now,
            ping_sent_at: None,
        }
    }

    /// Call whenever any packet is sent to the server; resets the idle clock.
    pub fn on_packet_sent(&mut self, now: Instant) {
        self.last_sent = now;
    }

    /// Call when a PINGREQ is actually sent, distinct from `on_packet_sent`
    /// so `is_dead` can measure from the ping itself.
    pub fn on_pingreq_sent(&mut self, now: Instant) {
        self.last_sent = now;
        self.ping_sent_at = Some(now);
    }

    /// Call on receipt of PINGRESP (or, in practice, any inbound packet;
    /// callers should also call this on other inbound traffic that
    /// indicates the server is alive).
    pub fn on_pingresp_received(&mut self) {
        self.ping_sent_at = None;
    }

    /// Whether a PINGREQ should be sent now: keep-alive is enabled, no
    /// ping is currently outstanding, and the idle interval has elapsed.
    pub fn should_send_pingreq(&self, now: Instant) -> bool {
        match self.interval {
            Some(interval) if self.ping_sent_at.is_none() => now.duration_since(self.last_sent) >= interval,
            _ => false,
        }
    }

    /// Whether the server must be presumed unreachable: a PINGREQ was sent
    /// and 1.5x the keep-alive interval has elapsed with no response.
    pub fn is_dead(&self, now: Instant) -> bool {
        match (self.interval, self.ping_sent_at) {
            (Some(interval), Some(sent_at)) => {
                now.duration_since(sent_at).as_secs_f64() >= interval.as_secs_f64() * DEAD_CONNECTION_MULTIPLIER
            }
            _ => false,
        }
    }

    /// The duration until the next action (PINGREQ, or the dead-connection
    /// deadline) is due, for sizing a `tokio::time::sleep`.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        let interval = self.interval?;
        let deadline = match self.ping_sent_at {
            Some(sent_at) => sent_at + interval.mul_f64(DEAD_CONNECTION_MULTIPLIER),
            None => self.last_sent + interval,
        };
        Some(deadline.saturating_duration_since(now))
    }
}
