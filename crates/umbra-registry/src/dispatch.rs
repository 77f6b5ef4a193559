//! Effect fan-out.

use serde::Serialize;

use umbra_protocol::{Codec, Recipient};
use umbra_transport::ConnectionId;

use crate::{Frame, FrameSender, RegistryError, SessionRegistry};

/// Resolves `(Recipient, Event)` effects against a [`SessionRegistry`].
///
/// Each event is encoded once; the resulting [`Frame`] is cloned (an
/// `Arc` bump) per recipient. Connections whose outbound queue is gone
/// are reported back instead of failing the whole dispatch.
pub struct BroadcastDispatcher<C> {
    registry: SessionRegistry,
    codec: C,
}

impl<C: Codec> BroadcastDispatcher<C> {
    pub fn new(codec: C) -> Self {
        Self { registry: SessionRegistry::new(), codec }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SessionRegistry {
        &mut self.registry
    }

    /// Sends one event to one connection.
    pub fn send_to<T: Serialize>(
        &self,
        id: ConnectionId,
        event: &T,
    ) -> Result<(), RegistryError> {
        let frame = Frame::from(self.codec.encode(event)?);
        let sender = self
            .registry
            .sender(id)
            .ok_or(RegistryError::UnknownConnection(id))?;
        deliver(sender, frame)
            .map_err(|_| RegistryError::ConnectionClosed(id))
    }

    /// Resolves a batch of effects. Returns the connections that could
    /// not be reached, deduplicated, for the caller to evict.
    pub fn dispatch<T: Serialize>(
        &self,
        effects: &[(Recipient, T)],
    ) -> Result<Vec<ConnectionId>, RegistryError> {
        let mut failed: Vec<ConnectionId> = Vec::new();

        for (recipient, event) in effects {
            let frame = Frame::from(self.codec.encode(event)?);
            for (id, sender) in self.registry.iter() {
                let wanted = match recipient {
                    Recipient::All => true,
                    Recipient::One(target) => id == *target,
                    Recipient::AllExcept(skip) => id != *skip,
                };
                if wanted
                    && deliver(sender, frame.clone()).is_err()
                    && !failed.contains(&id)
                {
                    tracing::warn!(%id, "dropping frame for closed connection");
                    failed.push(id);
                }
            }
        }

        Ok(failed)
    }
}

fn deliver(sender: &FrameSender, frame: Frame) -> Result<(), ()> {
    sender.send(frame).map_err(|_| ())
}
