//! Umbra: a room-based match coordination server.
//!
//! Ties the layers together: transport → protocol → registry → room,
//! plus the chat relay and its storage seam. Most deployments only
//! need [`UmbraServer`] and a [`Store`] implementation:
//!
//! ```rust,ignore
//! let server = UmbraServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(MemoryStore::new())
//!     .await?;
//! server.run().await
//! ```

mod chat;
mod error;
mod handler;
mod server;
mod store;

pub use chat::ChatService;
pub use error::UmbraError;
pub use server::{UmbraServer, UmbraServerBuilder};
pub use store::{ChatRecord, MemoryStore, Store, StoreError};
