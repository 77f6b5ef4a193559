//! Connection bookkeeping for one service endpoint.

use tokio::sync::mpsc;

use umbra_transport::ConnectionId;

/// An encoded outbound frame, shared between all its recipients.
pub type Frame = std::sync::Arc<str>;

/// The sending half of a connection's outbound queue. The receiving
/// half is drained by that connection's writer task.
pub type FrameSender = mpsc::UnboundedSender<Frame>;

/// The set of live connections on one endpoint, in registration order.
///
/// Order matters: roster replays walk the registry front to back so a
/// joiner sees existing participants in the order they arrived.
#[derive(Default)]
pub struct SessionRegistry {
    entries: Vec<(ConnectionId, FrameSender)>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection. Re-registering an ID replaces its sender.
    pub fn register(&mut self, id: ConnectionId, sender: FrameSender) {
        if let Some(entry) =
            self.entries.iter_mut().find(|(eid, _)| *eid == id)
        {
            entry.1 = sender;
            return;
        }
        self.entries.push((id, sender));
        tracing::trace!(%id, sessions = self.entries.len(), "session registered");
    }

    /// Removes a connection. Returns `false` if it was not registered.
    pub fn unregister(&mut self, id: ConnectionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(eid, _)| *eid != id);
        self.entries.len() != before
    }

    pub fn sender(&self, id: ConnectionId) -> Option<&FrameSender> {
        self.entries
            .iter()
            .find(|(eid, _)| *eid == id)
            .map(|(_, sender)| sender)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.entries.iter().any(|(eid, _)| *eid == id)
    }

    /// Connection IDs in registration order.
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    /// Iterates `(id, sender)` pairs in registration order.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (ConnectionId, &FrameSender)> {
        self.entries.iter().map(|(id, sender)| (*id, sender))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn channel() -> (FrameSender, mpsc::UnboundedReceiver<Frame>) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn test_register_and_contains() {
        let mut registry = SessionRegistry::new();
        let (tx, _rx) = channel();
        registry.register(ConnectionId::new(1), tx);

        assert!(registry.contains(ConnectionId::new(1)));
        assert!(!registry.contains(ConnectionId::new(2)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_removes_entry() {
        let mut registry = SessionRegistry::new();
        let (tx, _rx) = channel();
        registry.register(ConnectionId::new(7), tx);

        assert!(registry.unregister(ConnectionId::new(7)));
        assert!(!registry.unregister(ConnectionId::new(7)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_preserve_registration_order() {
        let mut registry = SessionRegistry::new();
        for n in [3u64, 1, 2] {
            let (tx, _rx) = channel();
            registry.register(ConnectionId::new(n), tx);
        }

        let ids: Vec<u64> =
            registry.ids().into_iter().map(|id| id.into_inner()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_reregister_replaces_sender_without_duplicating() {
        let mut registry = SessionRegistry::new();
        let (tx1, mut rx1) = channel();
        let (tx2, mut rx2) = channel();
        let id = ConnectionId::new(5);

        registry.register(id, tx1);
        registry.register(id, tx2);
        assert_eq!(registry.len(), 1);

        let sender = registry.sender(id).unwrap();
        sender.send(Frame::from("ping")).unwrap();
        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.try_recv().unwrap().as_ref(), "ping");
    }
}
