//! Wire event types.
//!
//! Every frame is one JSON object with a `code` discriminator. The codes
//! and field names below are pinned by the deployed game client — they
//! are part of the protocol and must not be renamed. The JSON-shape
//! tests at the bottom exist to catch exactly that kind of drift.

use serde::{Deserialize, Serialize};
use std::fmt;

use umbra_transport::ConnectionId;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// One of the four fixed identity slots a room hands out to participants.
///
/// Serializes as a plain number (`0..=3`), which is what travels in the
/// `userID` / `playerId` wire fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub u8);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies who should receive an outbound event.
///
/// Lobby and match logic return lists of `(Recipient, Event)` pairs; the
/// broadcast dispatcher resolves each recipient against the live session
/// set. This never goes on the wire, so no serde here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Send to every registered participant.
    All,

    /// Send to one specific participant.
    One(ConnectionId),

    /// Send to everyone except the specified participant.
    /// Used for relays, where the originator already knows the content.
    AllExcept(ConnectionId),
}

// ---------------------------------------------------------------------------
// Lobby traffic
// ---------------------------------------------------------------------------

/// A participant's self-reported profile, carried verbatim on several
/// lobby codes (`OK_PLAYERJOIN`, `OK_PLAYERREADY`, `OK_GETPLAYERS`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    /// The slot the client believes it holds (assigned via `OK_ROOMCONN`).
    #[serde(rename = "playerId")]
    pub player_id: SlotId,

    /// The element/character the player picked.
    #[serde(rename = "playerType")]
    pub player_type: u8,

    /// Display name.
    #[serde(rename = "playerName")]
    pub player_name: String,

    /// Whether the player has toggled ready in the lobby.
    #[serde(rename = "playerReady")]
    pub ready: bool,
}

/// Client → server frames on the `/room` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum LobbyRequest {
    /// "I made it into the room" — announces the profile so the server
    /// can send back the roster and relay the newcomer to everyone else.
    #[serde(rename = "OK_PLAYERJOIN")]
    PlayerJoin(PlayerProfile),

    /// Ready toggle, carrying a fresh profile snapshot.
    #[serde(rename = "OK_PLAYERREADY")]
    PlayerReady(PlayerProfile),

    /// This participant has finished the match (results screen reached).
    #[serde(rename = "OK_MATCHENDED")]
    MatchEnded,
}

/// Server → client frames on the `/room` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum LobbyEvent {
    /// Admission accepted; tells the joiner which slot it was assigned.
    #[serde(rename = "OK_ROOMCONN")]
    RoomConn {
        #[serde(rename = "userID")]
        user_id: SlotId,
    },

    /// One existing participant's profile, sent to a joiner once per
    /// participant already in the room (join order).
    #[serde(rename = "OK_GETPLAYERS")]
    Roster(PlayerProfile),

    /// Relay of a newcomer's profile to the other participants.
    #[serde(rename = "OK_PLAYERJOIN")]
    PlayerJoin(PlayerProfile),

    /// Relay of a ready toggle to the other participants.
    #[serde(rename = "OK_PLAYERREADY")]
    PlayerReady(PlayerProfile),

    /// A participant left; carries the slot it held.
    #[serde(rename = "OK_PLAYERDISC")]
    PlayerDisc {
        #[serde(rename = "playerId")]
        player_id: SlotId,
    },

    /// The readiness quorum was reached — the match starts now.
    #[serde(rename = "OK_STARTMATCH")]
    StartMatch { players: u8 },

    /// Admission rejected: the room already holds 4 participants.
    /// The connection is closed right after this frame.
    #[serde(rename = "Error_MAXUSERS")]
    RoomFull,

    /// Admission rejected: a match is already running.
    /// The connection is closed right after this frame.
    #[serde(rename = "Error_MATCHSTARTED")]
    MatchStarted,
}

// ---------------------------------------------------------------------------
// Match traffic
// ---------------------------------------------------------------------------

/// Client → server frames on the `/match` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum MatchRequest {
    /// In-round player state change, relayed verbatim to the others.
    #[serde(rename = "OK_PLAYERINFO")]
    PlayerInfo {
        #[serde(rename = "userID")]
        user_id: SlotId,
        #[serde(rename = "userVictim")]
        victim: SlotId,
        #[serde(rename = "updateKey")]
        update_key: String,
    },

    /// Score change, relayed verbatim to the others.
    #[serde(rename = "OK_POINTSINFO")]
    PointsInfo {
        #[serde(rename = "userID")]
        user_id: SlotId,
        #[serde(rename = "updatedPoints")]
        points: i32,
    },

    /// The round's dark matter was picked up, relayed to the others.
    #[serde(rename = "OK_TAKEDM")]
    MatterTaken {
        #[serde(rename = "userTaken")]
        taken_by: SlotId,
    },

    /// Bare code: this participant finished the current round.
    /// Feeds the end-of-round barrier.
    #[serde(rename = "OK_ROUNDSTATE")]
    RoundFinished,
}

/// Server → client frames on the `/match` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum MatchEvent {
    /// First round state, unicast to a participant when it attaches.
    #[serde(rename = "OK_INITIALSTATE")]
    InitialState {
        #[serde(rename = "matterX")]
        matter_x: i32,
        #[serde(rename = "matterY")]
        matter_y: i32,
        #[serde(rename = "roundTime")]
        round_time: u32,
    },

    /// Fresh round state, broadcast when the barrier releases.
    #[serde(rename = "OK_ROUNDSTATE")]
    RoundState {
        #[serde(rename = "matterX")]
        matter_x: i32,
        #[serde(rename = "matterY")]
        matter_y: i32,
        #[serde(rename = "roundTime")]
        round_time: u32,
    },

    /// Relay of [`MatchRequest::PlayerInfo`].
    #[serde(rename = "OK_PLAYERINFO")]
    PlayerInfo {
        #[serde(rename = "userID")]
        user_id: SlotId,
        #[serde(rename = "userVictim")]
        victim: SlotId,
        #[serde(rename = "updateKey")]
        update_key: String,
    },

    /// Relay of [`MatchRequest::PointsInfo`].
    #[serde(rename = "OK_POINTSINFO")]
    PointsInfo {
        #[serde(rename = "userID")]
        user_id: SlotId,
        #[serde(rename = "updatedPoints")]
        points: i32,
    },

    /// Relay of [`MatchRequest::MatterTaken`].
    #[serde(rename = "OK_TAKEDM")]
    MatterTaken {
        #[serde(rename = "userTaken")]
        taken_by: SlotId,
    },

    /// Round result, unicast to a single participant for its results
    /// screen.
    #[serde(rename = "OK_ENDROUNDINFO")]
    EndRound {
        #[serde(rename = "winnerUser")]
        winner: SlotId,
    },

    /// Countdown value. The client simulates the countdown from
    /// `roundTime`; this event exists for interface completeness and has
    /// no server-side driver.
    #[serde(rename = "OK_TIMER")]
    Timer { timer: u32 },
}

// ---------------------------------------------------------------------------
// Chat traffic
// ---------------------------------------------------------------------------

/// Client → server frames on the `/chat` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ChatRequest {
    /// Replay the stored message history to this participant.
    #[serde(rename = "OK_GETMESSAGES")]
    GetMessages,

    /// Persist a message and relay it to everyone else.
    #[serde(rename = "OK_SENDMESSAGE")]
    SendMessage { name: String, message: String },
}

/// Server → client frames on the `/chat` endpoint.
///
/// Both variants reuse their triggering request's code, matching what
/// the client expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ChatEvent {
    /// One stored message, sent during a history replay.
    #[serde(rename = "OK_GETMESSAGES")]
    History { name: String, message: String },

    /// A live message relayed from another participant.
    #[serde(rename = "OK_SENDMESSAGE")]
    Message { name: String, message: String },
}

// =========================================================================
// Tests
// =========================================================================
