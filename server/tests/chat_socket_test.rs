//! End-to-end chat relay over a real socket.
//!
//! Serves the full router on an ephemeral port and talks to it with
//! `tokio-tungstenite`, the way a browser client would.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

mod common;

use common::TestApp;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use uuid::Uuid;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(app: &TestApp) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    addr
}

async fn connect(addr: SocketAddr, token: &str) -> Socket {
    let (socket, _) = connect_async(format!("ws://{addr}/ws/chat?token={token}"))
        .await
        .expect("handshake");
    socket
}

async fn send(socket: &mut Socket, frame: Value) {
    socket
        .send(Message::Text(frame.to_string()))
        .await
        .expect("send frame");
}

async fn next_frame(socket: &mut Socket) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("frame within 5s")
            .expect("socket open")
            .expect("valid message");
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).expect("json frame");
        }
    }
}

async fn create_chat(app: &TestApp, token: &str, participants: &[Uuid]) -> Uuid {
    let chat = app
        .post(
            "/api/chats",
            Some(token),
            json!({"name": "Afterparty", "participant_ids": participants}),
        )
        .await;
    chat.body["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_messages_relay_between_participants() {
    let app = TestApp::new();
    let (mia_user, mia_token) = app.member("Mia", "mia@example.com").await;
    let (leo_user, leo_token) = app.member("Leo", "leo@example.com").await;
    let room = create_chat(&app, &mia_token, &[mia_user.id, leo_user.id]).await;
    let addr = serve(&app).await;

    let mut mia = connect(addr, &mia_token).await;
    let mut leo = connect(addr, &leo_token).await;

    for socket in [&mut mia, &mut leo] {
        send(socket, json!({"type": "join", "room": room})).await;
        let joined = next_frame(socket).await;
        assert_eq!(joined["type"], "joined");
        assert_eq!(joined["room"], room.to_string());
    }

    send(&mut leo, json!({"type": "message", "room": room, "content": "Who's driving?"})).await;

    let ack = next_frame(&mut leo).await;
    assert_eq!(ack["type"], "sent");
    assert_eq!(ack["message"]["content"], "Who's driving?");

    let relayed = next_frame(&mut mia).await;
    assert_eq!(relayed["type"], "message");
    assert_eq!(relayed["room"], room.to_string());
    assert_eq!(relayed["message"]["sender_id"], leo_user.id.to_string());
    assert_eq!(relayed["message"]["id"], ack["message"]["id"]);

    // The sender never sees its own message echoed back.
    send(&mut leo, json!({"type": "ping"})).await;
    assert_eq!(next_frame(&mut leo).await["type"], "pong");

    let history = app
        .get(&format!("/api/chats/{room}/messages"), Some(&mia_token))
        .await;
    assert_eq!(history.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_socket_errors_keep_connection_open() {
    let app = TestApp::new();
    let (mia_user, mia_token) = app.member("Mia", "mia@example.com").await;
    let (_, eve_token) = app.member("Eve", "eve@example.com").await;
    let room = create_chat(&app, &mia_token, &[mia_user.id]).await;
    let addr = serve(&app).await;

    let mut eve = connect(addr, &eve_token).await;

    send(&mut eve, json!({"type": "join", "room": room})).await;
    let denied = next_frame(&mut eve).await;
    assert_eq!(denied["type"], "error");
    assert_eq!(denied["message"], "Not a participant of this chat");

    send(&mut eve, json!({"type": "message", "room": room, "content": "let me in"})).await;
    assert_eq!(next_frame(&mut eve).await["type"], "error");

    eve.send(Message::Text("{not json".to_string())).await.expect("send");
    let invalid = next_frame(&mut eve).await;
    assert_eq!(invalid["type"], "error");
    assert!(invalid["message"].as_str().unwrap().starts_with("Invalid frame"));

    send(&mut eve, json!({"type": "join", "room": Uuid::new_v4()})).await;
    assert_eq!(next_frame(&mut eve).await["type"], "error");

    send(&mut eve, json!({"type": "ping"})).await;
    assert_eq!(next_frame(&mut eve).await["type"], "pong");
}

#[tokio::test]
async fn test_leave_stops_delivery() {
    let app = TestApp::new();
    let (mia_user, mia_token) = app.member("Mia", "mia@example.com").await;
    let room = create_chat(&app, &mia_token, &[mia_user.id]).await;
    let addr = serve(&app).await;

    let mut mia = connect(addr, &mia_token).await;
    send(&mut mia, json!({"type": "join", "room": room})).await;
    assert_eq!(next_frame(&mut mia).await["type"], "joined");
    send(&mut mia, json!({"type": "leave", "room": room})).await;
    assert_eq!(next_frame(&mut mia).await["type"], "left");

    app.post(
        &format!("/api/chats/{room}/messages"),
        Some(&mia_token),
        json!({"content": "nobody hears this"}),
    )
    .await;

    send(&mut mia, json!({"type": "ping"})).await;
    assert_eq!(next_frame(&mut mia).await["type"], "pong");
}

#[tokio::test]
async fn test_closed_socket_releases_its_rooms() {
    let app = TestApp::new();
    let (mia_user, mia_token) = app.member("Mia", "mia@example.com").await;
    let room = create_chat(&app, &mia_token, &[mia_user.id]).await;
    let addr = serve(&app).await;

    let mut mia = connect(addr, &mia_token).await;
    send(&mut mia, json!({"type": "join", "room": room})).await;
    assert_eq!(next_frame(&mut mia).await["type"], "joined");
    assert_eq!(app.state.chat.listeners(room).await, 1);
    assert_eq!(app.state.chat.rooms().await, 1);

    mia.close(None).await.expect("close");
    drop(mia);

    // The server notices the close asynchronously; nothing else prunes.
    tokio::time::timeout(Duration::from_secs(5), async {
        while app.state.chat.rooms().await > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("room pruned after close");
    assert_eq!(app.state.chat.listeners(room).await, 0);
}

#[tokio::test]
async fn test_handshake_requires_valid_token() {
    let app = TestApp::new();
    let addr = serve(&app).await;

    for url in [
        format!("ws://{addr}/ws/chat"),
        format!("ws://{addr}/ws/chat?token=garbage"),
    ] {
        match connect_async(url).await {
            Err(tungstenite::Error::Http(response)) => {
                assert_eq!(response.status().as_u16(), 401);
            }
            Err(other) => panic!("expected 401 handshake failure, got {other:?}"),
            Ok(_) => panic!("handshake without a valid token succeeded"),
        }
    }
}

#[tokio::test]
async fn test_plain_get_is_bad_request() {
    let app = TestApp::new();
    let (_, token) = app.member("Mia", "mia@example.com").await;

    let response = app.get("/ws/chat", Some(&token)).await;
    assert_eq!(response.status, axum::http::StatusCode::BAD_REQUEST);
}
