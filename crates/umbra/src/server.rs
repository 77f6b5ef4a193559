//! `UmbraServer` builder and accept loop.
//!
//! One listener serves three WebSocket endpoints, told apart by the
//! upgrade request path: `/room` (lobby), `/match` (in-match sync),
//! and `/chat`. Each accepted connection gets its own handler task;
//! all room state lives in the room actor spawned at build time.

use std::sync::Arc;

use umbra_protocol::{Codec, JsonCodec};
use umbra_room::{spawn_room, RoomHandle};
use umbra_transport::{Transport, WebSocketTransport};

use crate::chat::ChatService;
use crate::handler::handle_connection;
use crate::store::Store;
use crate::UmbraError;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<S, C> {
    pub(crate) room: RoomHandle,
    pub(crate) chat: ChatService<S, C>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting an Umbra server.
pub struct UmbraServerBuilder {
    bind_addr: String,
}

impl UmbraServerBuilder {
    pub fn new() -> Self {
        Self { bind_addr: "127.0.0.1:8080".to_string() }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener and spawns the room actor, using `JsonCodec`
    /// and the WebSocket transport.
    pub async fn build<S: Store>(
        self,
        store: S,
    ) -> Result<UmbraServer<S, JsonCodec>, UmbraError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            room: spawn_room(JsonCodec),
            chat: ChatService::new(store, JsonCodec),
            codec: JsonCodec,
        });

        Ok(UmbraServer { transport, state })
    }
}

impl Default for UmbraServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Umbra server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct UmbraServer<S, C> {
    transport: WebSocketTransport,
    state: Arc<ServerState<S, C>>,
}

impl<S, C> UmbraServer<S, C>
where
    S: Store,
    C: Codec + Clone,
{
    pub fn builder() -> UmbraServerBuilder {
        UmbraServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(mut self) -> Result<(), UmbraError> {
        tracing::info!("Umbra server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
