//! Per-connection handlers: one per endpoint.
//!
//! Every connection follows the same shape: register an outbound frame
//! queue with the owning service, spawn a writer task that pumps the
//! queue onto the socket, then read frames until the peer goes away.
//! Cleanup runs through a drop guard, so it fires even if the handler
//! errors out or panics.

use std::sync::Arc;

use tokio::sync::mpsc;

use umbra_protocol::{ChatRequest, Codec, LobbyEvent, LobbyRequest, MatchRequest};
use umbra_registry::Frame;
use umbra_room::{RoomError, RoomHandle};
use umbra_transport::{Connection, ConnectionId, WebSocketConnection};

use crate::server::ServerState;
use crate::store::Store;
use crate::UmbraError;

/// Routes a freshly accepted connection by its upgrade request path.
pub(crate) async fn handle_connection<S, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S, C>>,
) -> Result<(), UmbraError>
where
    S: Store,
    C: Codec + Clone,
{
    let conn = Arc::new(conn);
    tracing::debug!(id = %conn.id(), endpoint = conn.endpoint(), "handling new connection");

    match conn.endpoint() {
        "/room" => handle_room(conn, state).await,
        "/match" => handle_match(conn, state).await,
        "/chat" => handle_chat(conn, state).await,
        other => {
            tracing::warn!(endpoint = other, "unknown endpoint, closing");
            conn.close().await?;
            Ok(())
        }
    }
}

/// Drop guard that detaches a connection from the room's lobby.
struct LeaveGuard {
    conn: ConnectionId,
    room: RoomHandle,
}

impl Drop for LeaveGuard {
    fn drop(&mut self) {
        let conn = self.conn;
        let room = self.room.clone();
        tokio::spawn(async move {
            let _ = room.leave(conn).await;
        });
    }
}

/// Drop guard for the match endpoint.
struct DetachGuard {
    conn: ConnectionId,
    room: RoomHandle,
}

impl Drop for DetachGuard {
    fn drop(&mut self) {
        let conn = self.conn;
        let room = self.room.clone();
        tokio::spawn(async move {
            let _ = room.detach(conn).await;
        });
    }
}

async fn handle_room<S, C>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<S, C>>,
) -> Result<(), UmbraError>
where
    S: Store,
    C: Codec + Clone,
{
    let conn_id = conn.id();
    let (tx, rx) = mpsc::unbounded_channel();

    match state.room.join(conn_id, tx).await {
        Ok(slot) => {
            tracing::info!(%conn_id, %slot, "lobby connection admitted");
        }
        Err(error @ (RoomError::RoomFull | RoomError::MatchAlreadyStarted)) => {
            // The rejection frame goes straight onto the socket; the
            // connection was never registered with the room.
            let event = match error {
                RoomError::RoomFull => LobbyEvent::RoomFull,
                _ => LobbyEvent::MatchStarted,
            };
            tracing::info!(%conn_id, %error, "lobby connection rejected");
            let frame = state.codec.encode(&event)?;
            let _ = conn.send(&frame).await;
            let _ = conn.close().await;
            return Ok(());
        }
        Err(error) => return Err(error.into()),
    }

    spawn_writer(Arc::clone(&conn), rx);
    let _guard = LeaveGuard { conn: conn_id, room: state.room.clone() };

    loop {
        match conn.recv().await {
            Ok(Some(text)) => {
                match state.codec.decode::<LobbyRequest>(&text) {
                    Ok(request) => {
                        state.room.lobby_request(conn_id, request).await?;
                    }
                    Err(error) => {
                        tracing::debug!(%conn_id, %error, "undecodable lobby frame dropped");
                    }
                }
            }
            Ok(None) => break,
            Err(error) => {
                tracing::debug!(%conn_id, %error, "lobby recv error");
                break;
            }
        }
    }

    // _guard drops here → the room processes the departure.
    Ok(())
}

async fn handle_match<S, C>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<S, C>>,
) -> Result<(), UmbraError>
where
    S: Store,
    C: Codec + Clone,
{
    let conn_id = conn.id();
    let (tx, rx) = mpsc::unbounded_channel();

    state.room.attach(conn_id, tx).await?;
    spawn_writer(Arc::clone(&conn), rx);
    let _guard = DetachGuard { conn: conn_id, room: state.room.clone() };

    loop {
        match conn.recv().await {
            Ok(Some(text)) => {
                match state.codec.decode::<MatchRequest>(&text) {
                    Ok(request) => {
                        state.room.match_request(conn_id, request).await?;
                    }
                    Err(error) => {
                        tracing::debug!(%conn_id, %error, "undecodable match frame dropped");
                    }
                }
            }
            Ok(None) => break,
            Err(error) => {
                tracing::debug!(%conn_id, %error, "match recv error");
                break;
            }
        }
    }

    Ok(())
}

async fn handle_chat<S, C>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<S, C>>,
) -> Result<(), UmbraError>
where
    S: Store,
    C: Codec + Clone,
{
    let conn_id = conn.id();
    let (tx, rx) = mpsc::unbounded_channel();

    state.chat.connect(conn_id, tx).await;
    spawn_writer(Arc::clone(&conn), rx);

    let result = chat_read_loop(&conn, &state).await;
    state.chat.disconnect(conn_id).await;
    result
}

async fn chat_read_loop<S, C>(
    conn: &Arc<WebSocketConnection>,
    state: &Arc<ServerState<S, C>>,
) -> Result<(), UmbraError>
where
    S: Store,
    C: Codec + Clone,
{
    let conn_id = conn.id();
    loop {
        match conn.recv().await {
            Ok(Some(text)) => {
                match state.codec.decode::<ChatRequest>(&text) {
                    Ok(request) => {
                        state.chat.handle(conn_id, request).await?;
                    }
                    Err(error) => {
                        tracing::debug!(%conn_id, %error, "undecodable chat frame dropped");
                    }
                }
            }
            Ok(None) => return Ok(()),
            Err(error) => {
                tracing::debug!(%conn_id, %error, "chat recv error");
                return Ok(());
            }
        }
    }
}

/// Pumps encoded frames from a connection's outbound queue onto the
/// socket. Exits when the queue closes or the peer stops accepting.
fn spawn_writer(
    conn: Arc<WebSocketConnection>,
    mut frames: mpsc::UnboundedReceiver<Frame>,
) {
    tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if conn.send(&frame).await.is_err() {
                break;
            }
        }
    });
}
