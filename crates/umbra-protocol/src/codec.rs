//! Frame codecs.
//!
//! A [`Codec`] turns protocol events into frame text and back. The
//! server encodes each broadcast once and fans the resulting string out
//! to every recipient, so `encode` returns an owned `String` the caller
//! can share.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::ProtocolError;

/// Converts protocol events to and from frame text.
pub trait Codec: Send + Sync + 'static {
    /// Encodes an event into a single frame.
    fn encode<T: Serialize>(&self, event: &T) -> Result<String, ProtocolError>;

    /// Decodes a frame into an event.
    fn decode<T: DeserializeOwned>(
        &self,
        frame: &str,
    ) -> Result<T, ProtocolError>;
}

/// The production codec: one JSON object per frame.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, event: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(event).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        frame: &str,
    ) -> Result<T, ProtocolError> {
        serde_json::from_str(frame).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{LobbyEvent, MatchRequest, SlotId};

    #[test]
    fn test_json_codec_encodes_event_with_code_field() {
        let codec = JsonCodec;
        let frame = codec
            .encode(&LobbyEvent::RoomConn { user_id: SlotId(1) })
            .unwrap();
        assert_eq!(frame, r#"{"code":"OK_ROOMCONN","userID":1}"#);
    }

    #[test]
    fn test_json_codec_decodes_request() {
        let codec = JsonCodec;
        let req: MatchRequest =
            codec.decode(r#"{"code":"OK_TAKEDM","userTaken":2}"#).unwrap();
        assert_eq!(req, MatchRequest::MatterTaken { taken_by: SlotId(2) });
    }

    #[test]
    fn test_json_codec_decode_failure_is_decode_error() {
        let codec = JsonCodec;
        let result: Result<MatchRequest, _> = codec.decode("{broken");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
