//! Loopback tests: a real server, real WebSocket clients, JSON frames
//! exactly as the game client produces them.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

use umbra::{MemoryStore, UmbraServerBuilder};

type WsClient = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn start_server() -> String {
    let server = UmbraServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(MemoryStore::new())
        .await
        .expect("server should bind");
    let addr = server.local_addr().expect("should have local addr");
    tokio::spawn(server.run());
    addr.to_string()
}

async fn connect(addr: &str, path: &str) -> WsClient {
    let (ws, _) =
        tokio_tungstenite::connect_async(&format!("ws://{addr}{path}"))
            .await
            .expect("client should connect");
    ws
}

async fn send_json(ws: &mut WsClient, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("send should succeed");
}

/// Receives the next text frame as JSON, skipping control frames.
async fn recv_json(ws: &mut WsClient) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text)
                .expect("frame should be JSON");
        }
    }
}

/// Asserts no text frame arrives within the window.
async fn assert_silent(ws: &mut WsClient) {
    let result =
        tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(result.is_err(), "expected no frame, got {result:?}");
}

fn profile_json(code: &str, id: u8, ready: bool) -> Value {
    json!({
        "code": code,
        "playerId": id,
        "playerType": id,
        "playerName": format!("p{id}"),
        "playerReady": ready,
    })
}

/// Connects `/room` and asserts the `OK_ROOMCONN` slot assignment.
async fn join_room(addr: &str, slot: u8) -> WsClient {
    let mut ws = connect(addr, "/room").await;
    let frame = recv_json(&mut ws).await;
    assert_eq!(frame["code"], "OK_ROOMCONN");
    assert_eq!(frame["userID"], slot);
    ws
}

/// Drives two players through join, announce, and ready, draining both
/// sockets past the `OK_STARTMATCH` broadcast.
async fn start_two_player_match(addr: &str) -> (WsClient, WsClient) {
    let mut c1 = join_room(addr, 0).await;
    let mut c2 = join_room(addr, 1).await;

    send_json(&mut c1, profile_json("OK_PLAYERJOIN", 0, false)).await;
    assert_eq!(recv_json(&mut c2).await["code"], "OK_PLAYERJOIN");

    send_json(&mut c2, profile_json("OK_PLAYERJOIN", 1, false)).await;
    assert_eq!(recv_json(&mut c2).await["code"], "OK_GETPLAYERS");
    assert_eq!(recv_json(&mut c1).await["code"], "OK_PLAYERJOIN");

    send_json(&mut c1, profile_json("OK_PLAYERREADY", 0, true)).await;
    assert_eq!(recv_json(&mut c2).await["code"], "OK_PLAYERREADY");

    send_json(&mut c2, profile_json("OK_PLAYERREADY", 1, true)).await;
    assert_eq!(recv_json(&mut c1).await["code"], "OK_PLAYERREADY");

    let start = recv_json(&mut c1).await;
    assert_eq!(start["code"], "OK_STARTMATCH");
    assert_eq!(start["players"], 2);
    assert_eq!(recv_json(&mut c2).await["code"], "OK_STARTMATCH");

    (c1, c2)
}

const TARGETS: [(i64, i64); 4] =
    [(200, 500), (400, 120), (530, 460), (400, 530)];

fn assert_round_frame(frame: &Value, code: &str) -> (i64, i64) {
    assert_eq!(frame["code"], code);
    let target = (
        frame["matterX"].as_i64().expect("matterX"),
        frame["matterY"].as_i64().expect("matterY"),
    );
    assert!(TARGETS.contains(&target), "unknown target {target:?}");
    assert_eq!(frame["roundTime"], 30);
    target
}

#[tokio::test]
async fn test_lobby_flow_and_match_attach() {
    let addr = start_server().await;
    let (_c1, _c2) = start_two_player_match(&addr).await;

    let mut m1 = connect(&addr, "/match").await;
    let first = recv_json(&mut m1).await;
    let target = assert_round_frame(&first, "OK_INITIALSTATE");

    let mut m2 = connect(&addr, "/match").await;
    let second = recv_json(&mut m2).await;
    assert_eq!(
        assert_round_frame(&second, "OK_INITIALSTATE"),
        target,
        "both participants must see the same round target",
    );
}

#[tokio::test]
async fn test_fifth_room_connection_is_turned_away() {
    let addr = start_server().await;
    let mut admitted = Vec::new();
    for slot in 0..4 {
        admitted.push(join_room(&addr, slot).await);
    }

    let mut fifth = connect(&addr, "/room").await;
    let frame = recv_json(&mut fifth).await;
    assert_eq!(frame["code"], "Error_MAXUSERS");
}

#[tokio::test]
async fn test_join_during_match_is_turned_away() {
    let addr = start_server().await;
    let (_c1, _c2) = start_two_player_match(&addr).await;

    let mut late = connect(&addr, "/room").await;
    let frame = recv_json(&mut late).await;
    assert_eq!(frame["code"], "Error_MATCHSTARTED");
}

#[tokio::test]
async fn test_round_barrier_over_the_wire() {
    let addr = start_server().await;
    let (_c1, _c2) = start_two_player_match(&addr).await;

    let mut m1 = connect(&addr, "/match").await;
    recv_json(&mut m1).await;
    let mut m2 = connect(&addr, "/match").await;
    recv_json(&mut m2).await;

    // One report does not release the barrier.
    send_json(&mut m1, json!({"code": "OK_ROUNDSTATE"})).await;
    assert_silent(&mut m2).await;

    send_json(&mut m2, json!({"code": "OK_ROUNDSTATE"})).await;
    assert_round_frame(&recv_json(&mut m1).await, "OK_ROUNDSTATE");
    assert_round_frame(&recv_json(&mut m2).await, "OK_ROUNDSTATE");
}

#[tokio::test]
async fn test_in_round_relays_skip_the_originator() {
    let addr = start_server().await;
    let (_c1, _c2) = start_two_player_match(&addr).await;

    let mut m1 = connect(&addr, "/match").await;
    recv_json(&mut m1).await;
    let mut m2 = connect(&addr, "/match").await;
    recv_json(&mut m2).await;

    send_json(
        &mut m1,
        json!({"code": "OK_TAKEDM", "userTaken": 0}),
    )
    .await;
    let relayed = recv_json(&mut m2).await;
    assert_eq!(relayed["code"], "OK_TAKEDM");
    assert_eq!(relayed["userTaken"], 0);
    assert_silent(&mut m1).await;
}

#[tokio::test]
async fn test_lobby_departure_is_announced() {
    let addr = start_server().await;
    let mut c1 = join_room(&addr, 0).await;
    let mut c2 = join_room(&addr, 1).await;

    send_json(&mut c1, profile_json("OK_PLAYERJOIN", 0, false)).await;
    assert_eq!(recv_json(&mut c2).await["code"], "OK_PLAYERJOIN");

    c1.close(None).await.expect("close should succeed");

    let frame = recv_json(&mut c2).await;
    assert_eq!(frame["code"], "OK_PLAYERDISC");
    assert_eq!(frame["playerId"], 0);

    // The freed slot goes to the next joiner.
    let _c3 = join_room(&addr, 0).await;
}

#[tokio::test]
async fn test_chat_history_replay_and_live_relay() {
    let addr = start_server().await;
    let mut c1 = connect(&addr, "/chat").await;

    send_json(
        &mut c1,
        json!({"code": "OK_SENDMESSAGE", "name": "ada", "message": "hello"}),
    )
    .await;
    // Replaying our own history confirms the append landed.
    send_json(&mut c1, json!({"code": "OK_GETMESSAGES"})).await;
    let stored = recv_json(&mut c1).await;
    assert_eq!(stored["code"], "OK_GETMESSAGES");
    assert_eq!(stored["name"], "ada");
    assert_eq!(stored["message"], "hello");

    let mut c2 = connect(&addr, "/chat").await;
    send_json(&mut c2, json!({"code": "OK_GETMESSAGES"})).await;
    let replayed = recv_json(&mut c2).await;
    assert_eq!(replayed["code"], "OK_GETMESSAGES");
    assert_eq!(replayed["message"], "hello");

    // c2's replay above proves it is registered, so the live relay
    // cannot race the connect.
    send_json(
        &mut c1,
        json!({"code": "OK_SENDMESSAGE", "name": "ada", "message": "round two"}),
    )
    .await;
    let live = recv_json(&mut c2).await;
    assert_eq!(live["code"], "OK_SENDMESSAGE");
    assert_eq!(live["message"], "round two");
}
