//! Room lifecycle and match coordination.
//!
//! A room is one exclusive-access domain: a single actor task owns the
//! lobby roster, the slot allocator, and the match coordinator, and
//! processes commands from all connections sequentially. Connection
//! handlers talk to it through a cloneable [`RoomHandle`].
//!
//! The state itself is split into two pure machines that return effect
//! lists instead of doing I/O:
//!
//! - [`RoomLobby`] — admission, roster, readiness quorum, settlement.
//! - [`MatchCoordinator`] — round target, in-round relays, the
//!   end-of-round barrier.
//!
//! The actor resolves those effects through per-endpoint
//! [`BroadcastDispatcher`](umbra_registry::BroadcastDispatcher)s.

mod coordinator;
mod error;
mod lobby;
mod room;
mod slots;

pub use coordinator::{
    MatchCoordinator, MATTER_TARGETS, ROUND_TIME_SECS,
};
pub use error::RoomError;
pub use lobby::{LeaveOutcome, LobbyPhase, Participant, RoomLobby};
pub use room::{spawn_room, RoomCommand, RoomHandle, RoomInfo};
pub use slots::{SlotAllocator, ROOM_CAPACITY};
