//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener and a `tokio-tungstenite` client to
//! verify that frames flow both ways and that the endpoint path from
//! the upgrade request is captured.

#[cfg(feature = "websocket")]
mod websocket {
    use umbra_transport::{Connection, Transport, WebSocketTransport};

    /// Connects a tokio-tungstenite client to `ws://{addr}{path}`.
    async fn connect_client(
        addr: &str,
        path: &str,
    ) -> tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    > {
        let url = format!("ws://{addr}{path}");
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("client should connect");
        ws
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport
            .local_addr()
            .expect("should have local addr")
            .to_string();

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client_ws = connect_client(&addr, "/room").await;
        let server_conn = server_handle.await.expect("task should complete");

        assert!(server_conn.id().into_inner() > 0);
        assert_eq!(server_conn.endpoint(), "/room");
        assert!(server_conn.is_open());

        // --- Server sends, client receives ---
        server_conn
            .send(r#"{"code":"OK_ROOMCONN","userID":0}"#)
            .await
            .expect("send should succeed");

        use futures_util::StreamExt;
        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(
            msg.into_text().unwrap().as_str(),
            r#"{"code":"OK_ROOMCONN","userID":0}"#,
        );

        // --- Client sends, server receives ---
        use futures_util::SinkExt;
        use tokio_tungstenite::tungstenite::Message;
        client_ws
            .send(Message::Text("hello from client".into()))
            .await
            .unwrap();

        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, "hello from client");

        // --- Clean close ---
        server_conn.close().await.expect("close should succeed");
        assert!(!server_conn.is_open());
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().unwrap().to_string();

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client_ws = connect_client(&addr, "/room").await;
        let server_conn = server_handle.await.unwrap();

        use futures_util::SinkExt;
        use tokio_tungstenite::tungstenite::Message;
        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
        assert!(!server_conn.is_open());
    }

    #[tokio::test]
    async fn test_websocket_captures_distinct_endpoints() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().unwrap().to_string();

        let server_handle = tokio::spawn(async move {
            let first = transport.accept().await.expect("should accept");
            let second = transport.accept().await.expect("should accept");
            (first, second)
        });

        let _room = connect_client(&addr, "/room").await;
        let _chat = connect_client(&addr, "/chat").await;

        let (first, second) = server_handle.await.unwrap();
        assert_eq!(first.endpoint(), "/room");
        assert_eq!(second.endpoint(), "/chat");
        assert_ne!(first.id(), second.id());
    }
}
