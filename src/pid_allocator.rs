//! Packet identifier allocation (component C4): a monotonic counter that
//! wraps `65535 -> 1`, skipping any value currently in use in one of the
//! four in-flight tables.

use crate::error::Error;
use crate::types::PacketId;

#[derive(Debug, Clone)]
pub struct PacketIdAllocator {
    next: PacketId,
}

impl Default for PacketIdAllocator {
    fn default() -> Self {
        Self { next: PacketId::MIN }
    }
}

impl PacketIdAllocator {
    /// Finds the next identifier not reported in-use by `in_use`, advancing
    /// the counter past it. Fails only if every one of the 65535 legal
    /// values is currently occupied.
    pub fn allocate(&mut self, in_use: impl Fn(PacketId) -> bool) -> Result<PacketId, Error> {
        let start = self.next;
        loop {
            let candidate = self.next;
            self.next = self.next.next();
            if !in_use(candidate) {
                return Ok(candidate);
            }
            if self.next == start {
                return Err(Error::IdentifiersExhausted);
            }
        }
    }
}
