//! Identifier and address generators owned by one in-memory backend.

use std::net::Ipv4Addr;

use crate::backend::InstanceId;

/// First address handed out by [`IpAllocator::default`].
pub const FIRST_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 2, 5);

/// Hands out increasing numeric instance identifiers starting at 1.
#[derive(Clone, Debug)]
pub struct SequentialIds {
    next: u64,
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl SequentialIds {
    /// Returns the next identifier.
    pub fn next_id(&mut self) -> InstanceId {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        InstanceId::new(id.to_string())
    }
}

/// Hands out consecutive IPv4 addresses, carrying into higher octets and
/// wrapping to `1.0.0.0` after `255.255.255.255`.
#[derive(Clone, Debug)]
pub struct IpAllocator {
    next: u32,
}

impl Default for IpAllocator {
    fn default() -> Self {
        Self::starting_at(FIRST_ADDRESS)
    }
}

impl IpAllocator {
    /// Creates an allocator whose first address is `first`.
    #[must_use]
    pub fn starting_at(first: Ipv4Addr) -> Self {
        Self {
            next: u32::from(first),
        }
    }

    /// Returns the next address.
    pub fn allocate(&mut self) -> Ipv4Addr {
        let address = Ipv4Addr::from(self.next);
        self.next = self
            .next
            .checked_add(1)
            .unwrap_or_else(|| u32::from(Ipv4Addr::new(1, 0, 0, 0)));
        address
    }
}
