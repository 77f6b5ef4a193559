//! Wire protocol for Umbra.
//!
//! This crate defines the language the game client and server speak:
//!
//! - **Types** ([`LobbyRequest`], [`LobbyEvent`], [`MatchRequest`],
//!   [`MatchEvent`], [`ChatRequest`], [`ChatEvent`]) — one JSON object
//!   per frame, discriminated by a `code` field whose values are fixed
//!   and case-sensitive (`OK_PLAYERJOIN`, `Error_MAXUSERS`, ...).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those events are
//!   converted to/from frame text.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding
//!   or decoding.
//!
//! Inbound and outbound traffic use separate enums because several codes
//! appear on both sides with different payloads: `OK_ROUNDSTATE` is a
//! bare completion signal from a client but a full round snapshot from
//! the server.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ChatEvent, ChatRequest, LobbyEvent, LobbyRequest, MatchEvent,
    MatchRequest, PlayerProfile, Recipient, SlotId,
};
