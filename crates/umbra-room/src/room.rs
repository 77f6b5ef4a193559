//! The room actor.
//!
//! All room state is owned by one task; connection handlers interact
//! with it through a [`RoomHandle`] backed by an mpsc command channel.
//! Commands are processed strictly in arrival order, which is what
//! makes admission checks, the readiness quorum, and the round barrier
//! race-free without any locking.

use tokio::sync::{mpsc, oneshot};

use umbra_protocol::{
    Codec, LobbyEvent, LobbyRequest, MatchEvent, MatchRequest, Recipient,
    SlotId,
};
use umbra_registry::{BroadcastDispatcher, FrameSender};
use umbra_transport::ConnectionId;

use crate::{MatchCoordinator, RoomError, RoomLobby};

const COMMAND_QUEUE_DEPTH: usize = 64;

/// Commands accepted by the room actor.
pub enum RoomCommand {
    /// Admit a lobby connection. `sender` is the connection's outbound
    /// frame queue; the reply carries the assigned slot or the
    /// rejection to put on the wire before closing.
    Join {
        conn: ConnectionId,
        sender: FrameSender,
        reply: oneshot::Sender<Result<SlotId, RoomError>>,
    },
    /// An inbound frame on the lobby endpoint.
    Lobby { conn: ConnectionId, request: LobbyRequest },
    /// The lobby connection is gone.
    Leave { conn: ConnectionId },
    /// Attach a connection to the match endpoint.
    Attach { conn: ConnectionId, sender: FrameSender },
    /// An inbound frame on the match endpoint.
    Match { conn: ConnectionId, request: MatchRequest },
    /// The match connection is gone.
    Detach { conn: ConnectionId },
    /// Snapshot of room state, for logging and health output.
    Info { reply: oneshot::Sender<RoomInfo> },
}

#[derive(Debug, Clone, Copy)]
pub struct RoomInfo {
    pub participants: usize,
    pub ready: usize,
    pub match_started: bool,
}

/// Cloneable client side of the room actor.
#[derive(Clone)]
pub struct RoomHandle {
    commands: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub async fn join(
        &self,
        conn: ConnectionId,
        sender: FrameSender,
    ) -> Result<SlotId, RoomError> {
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::Join { conn, sender, reply }).await?;
        response.await.map_err(|_| RoomError::Unavailable)?
    }

    pub async fn lobby_request(
        &self,
        conn: ConnectionId,
        request: LobbyRequest,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Lobby { conn, request }).await
    }

    pub async fn leave(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.send(RoomCommand::Leave { conn }).await
    }

    pub async fn attach(
        &self,
        conn: ConnectionId,
        sender: FrameSender,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Attach { conn, sender }).await
    }

    pub async fn match_request(
        &self,
        conn: ConnectionId,
        request: MatchRequest,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Match { conn, request }).await
    }

    pub async fn detach(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.send(RoomCommand::Detach { conn }).await
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::Info { reply }).await?;
        response.await.map_err(|_| RoomError::Unavailable)
    }

    async fn send(&self, command: RoomCommand) -> Result<(), RoomError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RoomError::Unavailable)
    }
}

/// Spawns the actor task for one room and returns its handle.
pub fn spawn_room<C>(codec: C) -> RoomHandle
where
    C: Codec + Clone,
{
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let actor = RoomActor {
        lobby: RoomLobby::new(),
        coordinator: None,
        lobby_net: BroadcastDispatcher::new(codec.clone()),
        match_net: BroadcastDispatcher::new(codec),
        commands: rx,
    };
    tokio::spawn(actor.run());
    RoomHandle { commands: tx }
}

struct RoomActor<C> {
    lobby: RoomLobby,
    /// Present from quorum until the match settles or aborts.
    coordinator: Option<MatchCoordinator>,
    lobby_net: BroadcastDispatcher<C>,
    match_net: BroadcastDispatcher<C>,
    commands: mpsc::Receiver<RoomCommand>,
}

impl<C: Codec> RoomActor<C> {
    async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            self.handle_command(command);
        }
        tracing::info!("room actor stopped");
    }

    fn handle_command(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join { conn, sender, reply } => {
                let result = self.lobby.join(conn);
                let response = match result {
                    Ok((slot, effects)) => {
                        self.lobby_net.registry_mut().register(conn, sender);
                        self.dispatch_lobby(effects);
                        Ok(slot)
                    }
                    Err(error) => Err(error),
                };
                // The handler may already be gone; nothing to do then.
                let _ = reply.send(response);
            }
            RoomCommand::Lobby { conn, request } => {
                self.handle_lobby_request(conn, request);
            }
            RoomCommand::Leave { conn } => {
                self.process_leave(conn);
            }
            RoomCommand::Attach { conn, sender } => {
                self.match_net.registry_mut().register(conn, sender);
                let effects = self
                    .coordinator
                    .get_or_insert_with(MatchCoordinator::new)
                    .attach(conn);
                self.dispatch_match(effects);
            }
            RoomCommand::Match { conn, request } => {
                if let Some(coordinator) = self.coordinator.as_mut() {
                    let effects = coordinator.handle(conn, request);
                    self.dispatch_match(effects);
                } else {
                    tracing::debug!(%conn, "match frame with no active match dropped");
                }
            }
            RoomCommand::Detach { conn } => {
                self.process_detach(conn);
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(RoomInfo {
                    participants: self.lobby.participant_count(),
                    ready: self.lobby.ready_count(),
                    match_started: self.lobby.match_started(),
                });
            }
        }
    }

    fn handle_lobby_request(
        &mut self,
        conn: ConnectionId,
        request: LobbyRequest,
    ) {
        match request {
            LobbyRequest::PlayerJoin(profile) => {
                match self.lobby.announce(conn, profile) {
                    Ok(effects) => self.dispatch_lobby(effects),
                    Err(error) => {
                        tracing::debug!(%conn, %error, "lobby announce dropped");
                    }
                }
            }
            LobbyRequest::PlayerReady(profile) => {
                let was_started = self.lobby.match_started();
                match self.lobby.set_ready(conn, profile) {
                    Ok(effects) => {
                        self.dispatch_lobby(effects);
                        if !was_started && self.lobby.match_started() {
                            // Fresh coordinator per match, so state from
                            // an earlier match can never leak in.
                            self.coordinator =
                                Some(MatchCoordinator::new());
                        }
                    }
                    Err(error) => {
                        tracing::debug!(%conn, %error, "ready toggle dropped");
                    }
                }
            }
            LobbyRequest::MatchEnded => {
                match self.lobby.match_end_report(conn) {
                    Ok(all_settled) => {
                        if all_settled {
                            self.coordinator = None;
                        }
                    }
                    Err(error) => {
                        tracing::debug!(%conn, %error, "settle report dropped");
                    }
                }
            }
        }
    }

    fn process_leave(&mut self, conn: ConnectionId) {
        self.lobby_net.registry_mut().unregister(conn);
        if let Some(outcome) = self.lobby.leave(conn) {
            if outcome.match_aborted {
                self.coordinator = None;
            }
            self.dispatch_lobby(outcome.effects);
        }
    }

    fn process_detach(&mut self, conn: ConnectionId) {
        self.match_net.registry_mut().unregister(conn);
        let Some(coordinator) = self.coordinator.as_mut() else {
            return;
        };
        coordinator.detach(conn);

        // Mirrors the lobby rule: losing a match connection while the
        // match runs aborts it.
        if self.lobby.match_started() {
            self.lobby.abort_match();
            self.coordinator = None;
        } else if coordinator.attached_count() == 0 {
            self.coordinator = None;
        }
    }

    fn dispatch_lobby(&mut self, effects: Vec<(Recipient, LobbyEvent)>) {
        match self.lobby_net.dispatch(&effects) {
            Ok(failed) => {
                // A dead lobby connection is treated as a departure.
                for conn in failed {
                    self.process_leave(conn);
                }
            }
            Err(error) => {
                tracing::error!(%error, "failed to dispatch lobby events");
            }
        }
    }

    fn dispatch_match(&mut self, effects: Vec<(Recipient, MatchEvent)>) {
        match self.match_net.dispatch(&effects) {
            Ok(failed) => {
                for conn in failed {
                    self.process_detach(conn);
                }
            }
            Err(error) => {
                tracing::error!(%error, "failed to dispatch match events");
            }
        }
    }
}
