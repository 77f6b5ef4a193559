//! Match coordination.
//!
//! Holds the per-round shared state (the dark matter target and the
//! round length) and the end-of-round barrier. Like the lobby, it is a
//! pure machine returning `(Recipient, MatchEvent)` effects.

use std::collections::HashSet;

use rand::Rng;

use umbra_protocol::{MatchEvent, MatchRequest, Recipient, SlotId};
use umbra_transport::ConnectionId;

/// The four positions the dark matter can spawn at, as `(x, y)`.
pub const MATTER_TARGETS: [(i32, i32); 4] =
    [(200, 500), (400, 120), (530, 460), (400, 530)];

/// Length of one round in seconds. Clients run the countdown locally
/// from this value.
pub const ROUND_TIME_SECS: u32 = 30;

type Effects = Vec<(Recipient, MatchEvent)>;

/// Shared match state for one room.
pub struct MatchCoordinator {
    matter: (i32, i32),
    round_time: u32,
    attached: Vec<ConnectionId>,
    /// Participants that reported the current round finished. A set,
    /// so a duplicate report from one participant cannot release the
    /// barrier early.
    finished: HashSet<ConnectionId>,
}

impl Default for MatchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchCoordinator {
    /// Creates a coordinator with a random first-round target.
    pub fn new() -> Self {
        Self {
            matter: random_target(),
            round_time: ROUND_TIME_SECS,
            attached: Vec::new(),
            finished: HashSet::new(),
        }
    }

    pub fn matter(&self) -> (i32, i32) {
        self.matter
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    pub fn is_attached(&self, conn: ConnectionId) -> bool {
        self.attached.contains(&conn)
    }

    /// Attaches a participant and hands it the current round state.
    pub fn attach(&mut self, conn: ConnectionId) -> Effects {
        if !self.attached.contains(&conn) {
            self.attached.push(conn);
        }
        tracing::debug!(%conn, attached = self.attached.len(), "participant attached to match");
        vec![(
            Recipient::One(conn),
            MatchEvent::InitialState {
                matter_x: self.matter.0,
                matter_y: self.matter.1,
                round_time: self.round_time,
            },
        )]
    }

    /// Detaches a participant. Its pending round report, if any, is
    /// discarded; the barrier then waits on the remaining participants
    /// only.
    pub fn detach(&mut self, conn: ConnectionId) {
        self.attached.retain(|c| *c != conn);
        self.finished.remove(&conn);
    }

    /// Processes one inbound match frame from `sender`.
    pub fn handle(
        &mut self,
        sender: ConnectionId,
        request: MatchRequest,
    ) -> Effects {
        if !self.is_attached(sender) {
            tracing::debug!(%sender, "match frame from unattached connection dropped");
            return Vec::new();
        }

        match request {
            MatchRequest::PlayerInfo { user_id, victim, update_key } => {
                vec![(
                    Recipient::AllExcept(sender),
                    MatchEvent::PlayerInfo { user_id, victim, update_key },
                )]
            }
            MatchRequest::PointsInfo { user_id, points } => vec![(
                Recipient::AllExcept(sender),
                MatchEvent::PointsInfo { user_id, points },
            )],
            MatchRequest::MatterTaken { taken_by } => vec![(
                Recipient::AllExcept(sender),
                MatchEvent::MatterTaken { taken_by },
            )],
            MatchRequest::RoundFinished => self.round_finished(sender),
        }
    }

    /// Hands a participant its round result.
    pub fn end_round(
        &self,
        conn: ConnectionId,
        winner: SlotId,
    ) -> Effects {
        vec![(Recipient::One(conn), MatchEvent::EndRound { winner })]
    }

    /// Broadcasts the remaining round time. There is no server-side
    /// countdown task driving this; clients simulate the timer from
    /// `roundTime` themselves.
    pub fn notify_timer(&self) -> Effects {
        vec![(
            Recipient::All,
            MatchEvent::Timer { timer: self.round_time },
        )]
    }

    /// Barrier arm: once every attached participant has reported, roll
    /// a fresh target, reset the clock, and broadcast the new round.
    fn round_finished(&mut self, sender: ConnectionId) -> Effects {
        self.finished.insert(sender);
        if self.finished.len() < self.attached.len() {
            return Vec::new();
        }

        self.matter = random_target();
        self.round_time = ROUND_TIME_SECS;
        self.finished.clear();
        tracing::info!(
            matter_x = self.matter.0,
            matter_y = self.matter.1,
            "round barrier released, new round"
        );

        vec![(
            Recipient::All,
            MatchEvent::RoundState {
                matter_x: self.matter.0,
                matter_y: self.matter.1,
                round_time: self.round_time,
            },
        )]
    }
}

fn random_target() -> (i32, i32) {
    MATTER_TARGETS[rand::rng().random_range(0..MATTER_TARGETS.len())]
}
