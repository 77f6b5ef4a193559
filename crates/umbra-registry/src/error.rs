//! Registry error types.

use thiserror::Error;

use umbra_protocol::ProtocolError;
use umbra_transport::ConnectionId;

/// Errors from registering sessions or dispatching frames.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),

    #[error("connection {0} has closed its outbound queue")]
    ConnectionClosed(ConnectionId),
}
