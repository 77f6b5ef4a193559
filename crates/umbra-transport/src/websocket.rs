//! WebSocket transport implementation using `tokio-tungstenite`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
///
/// The HTTP request path is captured during the upgrade handshake and
/// exposed via [`Connection::endpoint`], so one listener can serve the
/// room, match, and chat services on distinct paths.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let mut endpoint = String::from("/");
        let ws = tokio_tungstenite::accept_hdr_async(
            stream,
            |req: &Request, resp: Response| {
                endpoint = req.uri().path().to_string();
                Ok(resp)
            },
        )
        .await
        .map_err(|e| {
            TransportError::AcceptFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %addr, endpoint, "accepted WebSocket connection");

        // Split so a blocked read never starves a concurrent write.
        let (writer, reader) = ws.split();
        Ok(WebSocketConnection {
            id,
            endpoint,
            open: AtomicBool::new(true),
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        })
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// A single WebSocket connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    endpoint: String,
    open: AtomicBool,
    writer: Mutex<SplitSink<WsStream, Message>>,
    reader: Mutex<SplitStream<WsStream>>,
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, frame: &str) -> Result<(), Self::Error> {
        let msg = Message::Text(frame.to_owned().into());
        let result = self.writer.lock().await.send(msg).await;
        result.map_err(|e| {
            self.open.store(false, Ordering::Relaxed);
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<String>, Self::Error> {
        loop {
            let msg = self.reader.lock().await.next().await;
            match msg {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(data))) => {
                    // Peers are expected to send text, but a UTF-8 binary
                    // frame is accepted as the same thing.
                    let text = String::from_utf8(data.to_vec())
                        .map_err(|e| {
                            TransportError::ReceiveFailed(
                                std::io::Error::new(
                                    std::io::ErrorKind::InvalidData,
                                    e,
                                ),
                            )
                        })?;
                    return Ok(Some(text));
                }
                Some(Ok(Message::Close(_))) | None => {
                    self.open.store(false, Ordering::Relaxed);
                    return Ok(None);
                }
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    self.open.store(false, Ordering::Relaxed);
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.open.store(false, Ordering::Relaxed);
        self.writer.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
