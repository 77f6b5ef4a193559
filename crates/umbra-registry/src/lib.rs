//! Session registry and broadcast fan-out.
//!
//! A [`SessionRegistry`] tracks the live connections attached to one
//! service endpoint, in registration order. A [`BroadcastDispatcher`]
//! pairs a registry with a codec and resolves `(Recipient, Event)`
//! effect pairs into encoded frames pushed onto per-connection outbound
//! queues.
//!
//! Delivery failures are collected rather than propagated: a dead peer
//! must never abort a broadcast to the healthy ones. The caller gets
//! the failed connection IDs back and decides what to do with them
//! (typically a deferred leave).

mod dispatch;
mod error;
mod registry;

pub use dispatch::BroadcastDispatcher;
pub use error::RegistryError;
pub use registry::{Frame, FrameSender, SessionRegistry};
