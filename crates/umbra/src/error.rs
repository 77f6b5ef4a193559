//! Top-level error type.

use thiserror::Error;

use crate::store::StoreError;
use umbra_protocol::ProtocolError;
use umbra_registry::RegistryError;
use umbra_room::RoomError;
use umbra_transport::TransportError;

/// Any error the server can produce, one variant per layer.
#[derive(Debug, Error)]
pub enum UmbraError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_error_converts_and_keeps_message() {
        let error: UmbraError = RoomError::RoomFull.into();
        assert_eq!(error.to_string(), "room is full");
    }

    #[test]
    fn test_store_error_converts() {
        let error: UmbraError =
            StoreError::Unavailable("backend down".into()).into();
        assert!(matches!(error, UmbraError::Store(_)));
    }
}
