//! Identity slot allocation.

use umbra_protocol::SlotId;
use umbra_transport::ConnectionId;

/// Fixed number of identity slots in a room.
pub const ROOM_CAPACITY: usize = 4;

/// Hands out the four identity slots, lowest free index first.
///
/// A slot freed by a departure is immediately reusable, so the next
/// joiner after a mid-lobby leave gets the departed player's slot.
#[derive(Debug, Default)]
pub struct SlotAllocator {
    slots: [Option<ConnectionId>; ROOM_CAPACITY],
}

impl SlotAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the lowest free slot for `conn`, or `None` if all four
    /// are held.
    pub fn acquire(&mut self, conn: ConnectionId) -> Option<SlotId> {
        let free = self.slots.iter().position(|slot| slot.is_none())?;
        self.slots[free] = Some(conn);
        Some(SlotId(free as u8))
    }

    /// Releases the slot held by `conn`, returning it.
    pub fn release(&mut self, conn: ConnectionId) -> Option<SlotId> {
        let held =
            self.slots.iter().position(|slot| *slot == Some(conn))?;
        self.slots[held] = None;
        Some(SlotId(held as u8))
    }

    pub fn slot_of(&self, conn: ConnectionId) -> Option<SlotId> {
        self.slots
            .iter()
            .position(|slot| *slot == Some(conn))
            .map(|i| SlotId(i as u8))
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.occupied() == ROOM_CAPACITY
    }
}
