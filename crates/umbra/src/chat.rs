//! Chat relay with persistent history.
//!
//! Unlike the room, chat has no membership rules: every connection on
//! the `/chat` endpoint participates. Messages are appended to the
//! [`Store`] before they are relayed, so a crash between the two steps
//! loses the relay but never the record.

use tokio::sync::Mutex;

use umbra_protocol::{ChatEvent, ChatRequest, Codec, Recipient};
use umbra_registry::{BroadcastDispatcher, FrameSender};
use umbra_transport::ConnectionId;

use crate::store::{ChatRecord, Store};
use crate::UmbraError;

pub struct ChatService<S, C> {
    store: S,
    net: Mutex<BroadcastDispatcher<C>>,
}

impl<S: Store, C: Codec> ChatService<S, C> {
    pub fn new(store: S, codec: C) -> Self {
        Self { store, net: Mutex::new(BroadcastDispatcher::new(codec)) }
    }

    pub async fn connect(&self, conn: ConnectionId, sender: FrameSender) {
        self.net.lock().await.registry_mut().register(conn, sender);
        tracing::debug!(%conn, "chat participant connected");
    }

    pub async fn disconnect(&self, conn: ConnectionId) {
        self.net.lock().await.registry_mut().unregister(conn);
        tracing::debug!(%conn, "chat participant disconnected");
    }

    pub async fn handle(
        &self,
        conn: ConnectionId,
        request: ChatRequest,
    ) -> Result<(), UmbraError> {
        match request {
            ChatRequest::GetMessages => self.replay_history(conn).await,
            ChatRequest::SendMessage { name, message } => {
                self.relay_message(conn, name, message).await
            }
        }
    }

    /// Unicasts the full history to `conn`, one frame per message,
    /// oldest first.
    async fn replay_history(
        &self,
        conn: ConnectionId,
    ) -> Result<(), UmbraError> {
        let history = self.store.history().await?;
        let net = self.net.lock().await;
        for record in history {
            let event = ChatEvent::History {
                name: record.name,
                message: record.message,
            };
            if net.send_to(conn, &event).is_err() {
                // Requester vanished mid-replay; stop wasting frames.
                break;
            }
        }
        Ok(())
    }

    async fn relay_message(
        &self,
        conn: ConnectionId,
        name: String,
        message: String,
    ) -> Result<(), UmbraError> {
        self.store
            .append(ChatRecord {
                name: name.clone(),
                message: message.clone(),
            })
            .await?;

        let mut net = self.net.lock().await;
        let failed = net.dispatch(&[(
            Recipient::AllExcept(conn),
            ChatEvent::Message { name, message },
        )])?;
        for dead in failed {
            net.registry_mut().unregister(dead);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tokio::sync::mpsc;
    use umbra_protocol::JsonCodec;
    use umbra_registry::Frame;

    fn conn(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    fn service() -> ChatService<MemoryStore, JsonCodec> {
        ChatService::new(MemoryStore::new(), JsonCodec)
    }

    async fn connect(
        chat: &ChatService<MemoryStore, JsonCodec>,
        n: u64,
    ) -> mpsc::UnboundedReceiver<Frame> {
        let (tx, rx) = mpsc::unbounded_channel();
        chat.connect(conn(n), tx).await;
        rx
    }

    fn decode(frame: Frame) -> ChatEvent {
        serde_json::from_str(&frame).expect("chat frame should decode")
    }

    #[tokio::test]
    async fn test_message_is_relayed_to_everyone_else() {
        let chat = service();
        let mut rx1 = connect(&chat, 1).await;
        let mut rx2 = connect(&chat, 2).await;

        chat.handle(
            conn(1),
            ChatRequest::SendMessage {
                name: "ada".into(),
                message: "hello".into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            decode(rx2.try_recv().unwrap()),
            ChatEvent::Message { name: "ada".into(), message: "hello".into() },
        );
        assert!(rx1.try_recv().is_err(), "sender must not hear its own message");
    }

    #[tokio::test]
    async fn test_history_replays_one_frame_per_message_in_order() {
        let chat = service();
        let mut rx1 = connect(&chat, 1).await;
        let _rx2 = connect(&chat, 2).await;

        for text in ["one", "two"] {
            chat.handle(
                conn(2),
                ChatRequest::SendMessage {
                    name: "bob".into(),
                    message: text.into(),
                },
            )
            .await
            .unwrap();
        }
        // Drain the live relays before asking for the replay.
        rx1.try_recv().unwrap();
        rx1.try_recv().unwrap();

        chat.handle(conn(1), ChatRequest::GetMessages).await.unwrap();
        assert_eq!(
            decode(rx1.try_recv().unwrap()),
            ChatEvent::History { name: "bob".into(), message: "one".into() },
        );
        assert_eq!(
            decode(rx1.try_recv().unwrap()),
            ChatEvent::History { name: "bob".into(), message: "two".into() },
        );
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dead_connections_are_evicted_on_relay() {
        let chat = service();
        let rx1 = connect(&chat, 1).await;
        let _rx2 = connect(&chat, 2).await;
        drop(rx1);

        chat.handle(
            conn(2),
            ChatRequest::SendMessage {
                name: "bob".into(),
                message: "anyone there".into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(chat.net.lock().await.registry().len(), 1);
    }
}
