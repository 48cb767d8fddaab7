//! Live room sync over `/api/ws`.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use common::{in_one_hour, mint_token, TestHarness, TEST_SECRET};

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

async fn join(addr: SocketAddr, room: &str, username: &str) -> Socket {
    let url = format!("ws://{addr}/api/ws?room={room}&username={username}");
    let (ws, _) = connect_async(url).await.unwrap();
    ws
}

/// Next text frame as JSON; fails the test after two quiet seconds.
async fn next_json(ws: &mut Socket) -> Value {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(text.as_str()).unwrap(),
                Some(Ok(_)) => {}
                other => panic!("socket ended: {other:?}"),
            }
        }
    })
    .await
    .expect("no message within two seconds")
}

/// Read until a message of `kind` arrives, returning everything skipped too.
async fn until(ws: &mut Socket, kind: &str) -> (Value, Vec<Value>) {
    let mut skipped = Vec::new();
    loop {
        let msg = next_json(ws).await;
        if msg["type"] == kind {
            return (msg, skipped);
        }
        skipped.push(msg);
    }
}

async fn send(ws: &mut Socket, msg: Value) {
    ws.send(Message::text(msg.to_string())).await.unwrap();
}

async fn live_rooms(addr: SocketAddr) -> Value {
    reqwest::get(format!("http://{addr}/api/rooms"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn joining_reports_identity_and_state() {
    let (_h, addr) = TestHarness::with_server().await;
    let mut alice = join(addr, "movie", "alice").await;

    let identity = next_json(&mut alice).await;
    assert_eq!(identity["type"], "identity");
    assert_eq!(identity["is_host"], true);
    assert!(identity["user_id"].is_string());

    let sync = next_json(&mut alice).await;
    assert_eq!(sync["type"], "sync_state");
    assert_eq!(sync["content"], "paused");
    assert_eq!(sync["timestamp"], 0.0);

    let users = next_json(&mut alice).await;
    assert_eq!(users["type"], "user_list");
    assert_eq!(users["user_list"][0]["username"], "alice");
    assert_eq!(users["user_list"][0]["id"], identity["user_id"]);

    assert_eq!(live_rooms(addr).await, json!([{"name": "movie", "count": 1}]));
}

#[tokio::test]
async fn host_commands_reach_the_room() {
    let (_h, addr) = TestHarness::with_server().await;
    let mut alice = join(addr, "movie", "alice").await;
    until(&mut alice, "user_list").await;
    let mut bob = join(addr, "movie", "bob").await;
    until(&mut bob, "user_list").await;

    send(&mut alice, json!({"type": "play", "username": "alice", "timestamp": 12.5})).await;
    let (play, _) = until(&mut bob, "play").await;
    assert_eq!(play["timestamp"], 12.5);
    assert_eq!(play["username"], "alice");
    assert_eq!(play["room"], "movie");

    // Bob is not a host: the pause goes nowhere, the chat goes everywhere.
    send(&mut bob, json!({"type": "pause", "timestamp": 99.0})).await;
    send(&mut bob, json!({"type": "chat", "username": "alice", "content": "popcorn?"})).await;

    let (chat, skipped) = until(&mut alice, "chat").await;
    assert_eq!(chat["content"], "popcorn?");
    assert_eq!(chat["username"], "bob");
    assert!(skipped.iter().all(|m| m["type"] != "pause"), "{skipped:?}");
}

#[tokio::test]
async fn late_joiner_resumes_playing_video() {
    let (_h, addr) = TestHarness::with_server().await;
    let mut alice = join(addr, "movie", "alice").await;
    until(&mut alice, "user_list").await;

    send(&mut alice, json!({"type": "play", "timestamp": 30.0})).await;
    until(&mut alice, "play").await;

    let mut bob = join(addr, "movie", "bob").await;
    let (sync, _) = until(&mut bob, "sync_state").await;
    assert_eq!(sync["content"], "playing");
    assert!(sync["timestamp"].as_f64().unwrap() >= 30.0, "{sync}");
}

#[tokio::test]
async fn host_leaving_hands_over_control() {
    let (_h, addr) = TestHarness::with_server().await;
    let mut alice = join(addr, "movie", "alice").await;
    until(&mut alice, "user_list").await;
    let mut bob = join(addr, "movie", "bob").await;
    let (identity, _) = until(&mut bob, "identity").await;
    assert_eq!(identity["is_host"], false);
    until(&mut bob, "user_list").await;

    alice.close(None).await.unwrap();

    let (promoted, _) = until(&mut bob, "identity").await;
    assert_eq!(promoted["is_host"], true);
    let (notice, _) = until(&mut bob, "system").await;
    assert_eq!(notice["content"], "bob is now the Host.");

    assert_eq!(live_rooms(addr).await, json!([{"name": "movie", "count": 1}]));
}

#[tokio::test]
async fn malformed_frames_get_an_error_reply() {
    let (_h, addr) = TestHarness::with_server().await;
    let mut alice = join(addr, "movie", "alice").await;
    until(&mut alice, "user_list").await;

    alice.send(Message::text("not json".to_string())).await.unwrap();
    let (err, _) = until(&mut alice, "error").await;
    assert!(err["content"].as_str().unwrap().starts_with("Malformed message"));
}

#[tokio::test]
async fn overlong_room_is_refused() {
    let (_h, addr) = TestHarness::with_server().await;
    let room = "r".repeat(51);
    let url = format!("ws://{addr}/api/ws?room={room}&username=alice");
    assert!(connect_async(url).await.is_err());
    assert_eq!(live_rooms(addr).await, json!([]));
}

#[tokio::test]
async fn sockets_need_a_token_when_auth_is_enabled() {
    let (_h, addr) = TestHarness::with_auth().serve().await;
    let url = format!("ws://{addr}/api/ws?room=movie&username=alice");
    assert!(connect_async(url.clone()).await.is_err());

    let token = mint_token(
        TEST_SECRET,
        json!({"user_id": "42", "username": "alice", "exp": in_one_hour()}),
    );
    let mut request = url.into_client_request().unwrap();
    request
        .headers_mut()
        .insert("authorization", format!("Bearer {token}").parse().unwrap());
    let (mut ws, _) = connect_async(request).await.unwrap();
    assert_eq!(next_json(&mut ws).await["type"], "identity");
}
