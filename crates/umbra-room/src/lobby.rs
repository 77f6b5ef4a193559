//! Lobby state machine.
//!
//! Pure state: every operation returns the `(Recipient, LobbyEvent)`
//! effects it produced, and the caller (the room actor) puts them on
//! the wire. That keeps admission, roster, quorum, and settlement rules
//! testable without any sockets.

use std::collections::HashSet;

use umbra_protocol::{LobbyEvent, PlayerProfile, Recipient, SlotId};
use umbra_transport::ConnectionId;

use crate::slots::SlotAllocator;
use crate::RoomError;

/// Minimum announced-and-ready participants before a match can start.
const QUORUM: usize = 2;

type Effects = Vec<(Recipient, LobbyEvent)>;

/// One admitted connection, in join order.
#[derive(Debug, Clone)]
pub struct Participant {
    pub conn_id: ConnectionId,
    pub slot: SlotId,
    /// Set by the participant's `OK_PLAYERJOIN` announcement. Until
    /// then the participant is invisible to roster replays and quorum.
    pub profile: Option<PlayerProfile>,
}

/// Where the room is in its lifecycle, derived from lobby state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyPhase {
    /// Accepting joins.
    Open,
    /// All four slots held, no match running yet.
    Full,
    /// A match is running; all joins are rejected.
    InMatch,
}

/// What a departure did to the room.
#[derive(Debug)]
pub struct LeaveOutcome {
    pub slot: SlotId,
    /// True when the departure aborted a running match. The actor uses
    /// this to tear down the match coordinator.
    pub match_aborted: bool,
    pub effects: Effects,
}

/// The lobby of one room: admission, roster, readiness, settlement.
#[derive(Default)]
pub struct RoomLobby {
    slots: SlotAllocator,
    participants: Vec<Participant>,
    match_started: bool,
    settled: HashSet<ConnectionId>,
}

impl RoomLobby {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> LobbyPhase {
        if self.match_started {
            LobbyPhase::InMatch
        } else if self.slots.is_full() {
            LobbyPhase::Full
        } else {
            LobbyPhase::Open
        }
    }

    pub fn match_started(&self) -> bool {
        self.match_started
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Announced participants currently flagged ready. Derived from the
    /// stored profiles so it can never drift from them.
    pub fn ready_count(&self) -> usize {
        self.participants
            .iter()
            .filter(|p| p.profile.as_ref().is_some_and(|pr| pr.ready))
            .count()
    }

    pub fn contains(&self, conn: ConnectionId) -> bool {
        self.participants.iter().any(|p| p.conn_id == conn)
    }

    pub fn slot_of(&self, conn: ConnectionId) -> Option<SlotId> {
        self.slots.slot_of(conn)
    }

    /// Admits a connection, assigning it the lowest free slot.
    ///
    /// Rejection order matches the wire contract: a full room reports
    /// `Error_MAXUSERS` even if a match is also running.
    pub fn join(
        &mut self,
        conn: ConnectionId,
    ) -> Result<(SlotId, Effects), RoomError> {
        if self.slots.is_full() {
            return Err(RoomError::RoomFull);
        }
        if self.match_started {
            return Err(RoomError::MatchAlreadyStarted);
        }

        let slot = self.slots.acquire(conn).ok_or(RoomError::RoomFull)?;
        self.participants.push(Participant {
            conn_id: conn,
            slot,
            profile: None,
        });
        tracing::info!(%conn, %slot, participants = self.participants.len(), "participant joined");

        Ok((slot, vec![(
            Recipient::One(conn),
            LobbyEvent::RoomConn { user_id: slot },
        )]))
    }

    /// Handles a participant's `OK_PLAYERJOIN` announcement: replays
    /// the roster to the announcer (join order, one frame per already
    /// announced participant), then relays the new profile to everyone
    /// else.
    ///
    /// The profile is stored verbatim, including the client-reported
    /// `playerId`.
    pub fn announce(
        &mut self,
        conn: ConnectionId,
        profile: PlayerProfile,
    ) -> Result<Effects, RoomError> {
        if !self.contains(conn) {
            return Err(RoomError::NotInRoom(conn));
        }

        let mut effects: Effects = self
            .participants
            .iter()
            .filter(|p| p.conn_id != conn)
            .filter_map(|p| p.profile.clone())
            .map(|pr| (Recipient::One(conn), LobbyEvent::Roster(pr)))
            .collect();

        effects.push((
            Recipient::AllExcept(conn),
            LobbyEvent::PlayerJoin(profile.clone()),
        ));

        self.store_profile(conn, profile);
        Ok(effects)
    }

    /// Handles `OK_PLAYERREADY`: stores the fresh profile snapshot,
    /// relays it, then checks the start condition. The match starts
    /// when at least [`QUORUM`] participants are announced and every
    /// announced participant is ready.
    pub fn set_ready(
        &mut self,
        conn: ConnectionId,
        profile: PlayerProfile,
    ) -> Result<Effects, RoomError> {
        if !self.contains(conn) {
            return Err(RoomError::NotInRoom(conn));
        }

        self.store_profile(conn, profile.clone());

        let mut effects: Effects = vec![(
            Recipient::AllExcept(conn),
            LobbyEvent::PlayerReady(profile),
        )];

        let ready = self.ready_count();
        if !self.match_started
            && ready >= QUORUM
            && ready == self.participants.len()
        {
            self.match_started = true;
            self.settled.clear();
            tracing::info!(players = ready, "readiness quorum reached, starting match");
            effects.push((
                Recipient::All,
                LobbyEvent::StartMatch { players: ready as u8 },
            ));
        }

        Ok(effects)
    }

    /// Handles `OK_MATCHENDED`. Returns `true` once every current
    /// participant has settled, at which point the room reopens.
    pub fn match_end_report(
        &mut self,
        conn: ConnectionId,
    ) -> Result<bool, RoomError> {
        if !self.contains(conn) {
            return Err(RoomError::NotInRoom(conn));
        }

        self.settled.insert(conn);
        let all_settled = self
            .participants
            .iter()
            .all(|p| self.settled.contains(&p.conn_id));

        if all_settled {
            self.match_started = false;
            self.settled.clear();
            tracing::info!("match settled, room reopened");
        }
        Ok(all_settled)
    }

    /// Removes a participant. The slot is always released, even for a
    /// connection that never announced; `OK_PLAYERDISC` goes out only
    /// if the others ever saw this player. A departure during a running
    /// match aborts the match.
    pub fn leave(&mut self, conn: ConnectionId) -> Option<LeaveOutcome> {
        let position =
            self.participants.iter().position(|p| p.conn_id == conn)?;
        let participant = self.participants.remove(position);
        let slot = self.slots.release(conn).unwrap_or(participant.slot);
        self.settled.remove(&conn);

        let mut effects: Effects = Vec::new();
        if participant.profile.is_some() {
            effects.push((
                Recipient::All,
                LobbyEvent::PlayerDisc { player_id: slot },
            ));
        }

        let match_aborted = self.match_started;
        if match_aborted {
            self.match_started = false;
            self.settled.clear();
            tracing::warn!(%conn, %slot, "participant left mid-match, aborting match");
        } else {
            tracing::info!(%conn, %slot, participants = self.participants.len(), "participant left");
        }

        Some(LeaveOutcome { slot, match_aborted, effects })
    }

    /// Force-ends a running match, reopening the room. Used when a
    /// match connection drops without a corresponding lobby departure.
    pub fn abort_match(&mut self) {
        if self.match_started {
            self.match_started = false;
            self.settled.clear();
            tracing::warn!("match aborted");
        }
    }

    fn store_profile(&mut self, conn: ConnectionId, profile: PlayerProfile) {
        if let Some(p) =
            self.participants.iter_mut().find(|p| p.conn_id == conn)
        {
            p.profile = Some(profile);
        }
    }
}
