//! WebSocket protocol tests against a live server.

use duel_core::Coordinator;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Starts the server on a random port.
async fn start_test_server(coordinator: Coordinator) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        duel_server::run(listener, coordinator, std::future::pending())
            .await
            .unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("Failed to connect");
    client
}

async fn send(client: &mut Client, value: Value) {
    client.send(Message::text(value.to_string())).await.unwrap();
}

/// Next JSON event, skipping control frames.
async fn next_event(client: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timed out waiting for event")
            .expect("Stream ended")
            .expect("Receive error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn join(client: &mut Client, game: &str, name: &str) {
    send(
        client,
        json!({"event": "joinGame", "data": {"gameId": game, "playerName": name}}),
    )
    .await;
}

async fn make_move(client: &mut Client, game: &str, row: i64, col: i64) {
    send(
        client,
        json!({"event": "makeMove", "data": {"gameId": game, "row": row, "col": col}}),
    )
    .await;
}

#[tokio::test]
async fn test_full_game_over_websocket() {
    let coordinator = Coordinator::default();
    let game = coordinator.create_session();
    let addr = start_test_server(coordinator.clone()).await;

    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    join(&mut alice, &game, "Alice").await;
    assert_eq!(
        next_event(&mut alice).await,
        json!({"event": "assigned", "data": {"symbol": "X"}})
    );

    join(&mut bob, &game, "Bob").await;
    assert_eq!(
        next_event(&mut bob).await,
        json!({"event": "assigned", "data": {"symbol": "O"}})
    );

    let start = next_event(&mut bob).await;
    assert_eq!(start, next_event(&mut alice).await);
    assert_eq!(start["event"], "gameStart");
    assert_eq!(start["data"]["players"][0]["name"], "Alice");
    assert_eq!(start["data"]["players"][1]["symbol"], "O");
    assert_eq!(start["data"]["currentPlayer"], start["data"]["players"][0]["id"]);
    assert_eq!(start["data"]["board"], json!([["", "", ""], ["", "", ""], ["", "", ""]]));

    let moves = [(0, 0), (1, 0), (0, 1), (1, 1)];
    for (i, (row, col)) in moves.into_iter().enumerate() {
        let mover = if i % 2 == 0 { &mut alice } else { &mut bob };
        make_move(mover, &game, row, col).await;

        let update = next_event(&mut alice).await;
        assert_eq!(update, next_event(&mut bob).await);
        assert_eq!(update["event"], "gameUpdate");
        assert_eq!(update["data"]["isOver"], false);
        assert!(update["data"]["winner"].is_null());
    }

    make_move(&mut alice, &game, 0, 2).await;
    let last = next_event(&mut bob).await;
    assert_eq!(last, next_event(&mut alice).await);
    assert_eq!(last["data"]["isOver"], true);
    assert_eq!(last["data"]["winner"], "Alice");
    assert_eq!(last["data"]["board"][0], json!(["X", "X", "X"]));
    assert_eq!(last["data"]["board"][1], json!(["O", "O", ""]));
}

#[tokio::test]
async fn test_disconnect_notifies_opponent() {
    let coordinator = Coordinator::default();
    let game = coordinator.create_session();
    let addr = start_test_server(coordinator.clone()).await;

    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    join(&mut alice, &game, "Alice").await;
    next_event(&mut alice).await;
    join(&mut bob, &game, "Bob").await;
    next_event(&mut bob).await;
    next_event(&mut bob).await;
    next_event(&mut alice).await;

    bob.close(None).await.unwrap();

    assert_eq!(
        next_event(&mut alice).await,
        json!({
            "event": "playerDisconnected",
            "data": {"message": "Opponent disconnected", "winner": "Alice"}
        })
    );
    assert!(!coordinator.registry().contains(&game));
}

#[tokio::test]
async fn test_errors_keep_connection_open() {
    let coordinator = Coordinator::default();
    let game = coordinator.create_session();
    let addr = start_test_server(coordinator).await;

    let mut carol = connect(addr).await;

    client_send_raw(&mut carol, "{not json").await;
    let error = next_event(&mut carol).await;
    assert_eq!(error["event"], "error");
    assert_eq!(error["data"]["code"], "MALFORMED");

    join(&mut carol, "NOPE00", "Carol").await;
    assert_eq!(
        next_event(&mut carol).await,
        json!({"event": "error", "data": {"code": "NOT_FOUND", "message": "Game not found"}})
    );

    join(&mut carol, &game, "Carol").await;
    assert_eq!(
        next_event(&mut carol).await,
        json!({"event": "assigned", "data": {"symbol": "X"}})
    );

    join(&mut carol, &game, "Carol").await;
    let error = next_event(&mut carol).await;
    assert_eq!(error["data"]["code"], "ALREADY_JOINED");
}

async fn client_send_raw(client: &mut Client, text: &str) {
    client.send(Message::text(text.to_string())).await.unwrap();
}
