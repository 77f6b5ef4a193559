//! Room error types.

use thiserror::Error;

use umbra_transport::ConnectionId;

/// Errors from room admission and command handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomError {
    /// All four slots are held. Maps to `Error_MAXUSERS` on the wire.
    #[error("room is full")]
    RoomFull,

    /// A match is running. Maps to `Error_MATCHSTARTED` on the wire.
    #[error("match already started")]
    MatchAlreadyStarted,

    #[error("connection {0} is not a room participant")]
    NotInRoom(ConnectionId),

    /// The room actor is gone; its command channel is closed.
    #[error("room is unavailable")]
    Unavailable,
}
