/// Full transport round-trip: a real WebSocket client against the server
/// stack (ws server + output router + engine with mock collaborators).
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use drift::occupant::{NpcProfile, NpcProfileGenerator, ProfileError};
use drift::{seed, Engine, EngineConfig};
use futures_util::{SinkExt, StreamExt};
use net::rate_limiter::{ConnectionLimiter, LimitConfig};
use net::ws_server::SessionHandler;
use serde_json::Value;
use space::{ContentGenerator, ExitSeed, ExpandError, Room, RoomSeed};
use tokio_tungstenite::tungstenite::Message;

struct StaticContent;

#[async_trait]
impl ContentGenerator for StaticContent {
    async fn expand(&self, origin: &Room, _direction: &str) -> Result<Vec<RoomSeed>, ExpandError> {
        Ok(vec![RoomSeed {
            name: "Echo Hall".into(),
            description: "Everything said here comes back slightly wrong.".into(),
            region: None,
            hub: false,
            exits: vec![ExitSeed {
                direction: "north".into(),
                target: Some(origin.id.to_string()),
            }],
        }])
    }
}

struct StaticProfiles;

#[async_trait]
impl NpcProfileGenerator for StaticProfiles {
    async fn profile(&self, _health: i32) -> Result<NpcProfile, ProfileError> {
        Ok(NpcProfile {
            name: "Gruk".into(),
            description: "Test-issue normie.".into(),
        })
    }
}

fn spawn_server(addr: &str) {
    let (output_tx, output_rx) = tokio::sync::mpsc::unbounded_channel();
    let (register_tx, register_rx) = tokio::sync::mpsc::unbounded_channel();
    let (unregister_tx, unregister_rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(net::output_router::run_output_router(
        output_rx,
        register_rx,
        unregister_rx,
    ));

    let (state, spawn_room) = seed::seed_world();
    let engine = Engine::new(
        state,
        output_tx,
        Arc::new(StaticContent),
        Arc::new(StaticProfiles),
        EngineConfig {
            spawn_room,
            topup_base_url: "http://localhost:4610".into(),
        },
    );

    let handler: Arc<dyn SessionHandler> = engine;
    let limiter = ConnectionLimiter::new(LimitConfig::default());
    let addr = addr.to_string();
    tokio::spawn(async move {
        let _ = net::ws_server::run_ws_server(addr, handler, register_tx, unregister_tx, limiter)
            .await;
    });
}

async fn connect(
    addr: &str,
) -> tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>> {
    let url = format!("ws://{addr}");
    for _ in 0..20 {
        if let Ok((stream, _)) = tokio_tungstenite::connect_async(url.as_str()).await {
            return stream;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("could not connect to {url}");
}

async fn next_json<S>(reader: &mut S) -> Value
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), reader.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("read error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("server frame is JSON");
        }
    }
}

#[tokio::test]
async fn connect_look_move_and_reject_garbage() {
    let addr = "127.0.0.1:47631";
    spawn_server(addr);

    let mut ws = connect(addr).await;

    let welcome = next_json(&mut ws).await;
    assert_eq!(welcome["type"], "welcome");
    assert_eq!(welcome["room"]["id"], "hub");
    assert_eq!(welcome["player"]["weapon"], "fist");
    assert!(welcome["timestamp"].is_string());

    ws.send(Message::Text(r#"{"type":"look"}"#.into()))
        .await
        .unwrap();
    let desc = next_json(&mut ws).await;
    assert_eq!(desc["type"], "roomDescription");
    assert_eq!(desc["room"]["id"], "hub");

    ws.send(Message::Text(r#"{"type":"move","direction":"south"}"#.into()))
        .await
        .unwrap();
    // skip any system narration until the room description arrives
    let desc = loop {
        let v = next_json(&mut ws).await;
        if v["type"] == "roomDescription" {
            break v;
        }
    };
    assert_eq!(desc["room"]["name"], "Echo Hall");

    ws.send(Message::Text("this is not json".into()))
        .await
        .unwrap();
    let err = next_json(&mut ws).await;
    assert_eq!(err["type"], "error");

    ws.send(Message::Text(r#"{"type":"dance"}"#.into()))
        .await
        .unwrap();
    let err = next_json(&mut ws).await;
    assert_eq!(err["type"], "error");

    ws.close(None).await.unwrap();
}

#[tokio::test]
async fn two_clients_share_a_room() {
    let _ = tracing_subscriber::fmt::try_init();
    let addr = "127.0.0.1:47632";
    spawn_server(addr);

    let mut alice = connect(addr).await;
    let _ = next_json(&mut alice).await; // welcome

    let mut bob = connect(addr).await;
    let _ = next_json(&mut bob).await; // welcome

    // alice sees bob condense into the hub
    let arrival = next_json(&mut alice).await;
    assert_eq!(arrival["type"], "system");
    assert!(arrival["message"]
        .as_str()
        .unwrap()
        .contains("condenses out of the drift"));

    alice
        .send(Message::Text(
            r#"{"type":"say","message":"hello bob"}"#.into(),
        ))
        .await
        .unwrap();

    let chat = next_json(&mut bob).await;
    assert_eq!(chat["type"], "chat");
    assert_eq!(chat["message"], "hello bob");

    // the speaker hears their own words too
    let echo = next_json(&mut alice).await;
    assert_eq!(echo["type"], "chat");

    alice.close(None).await.unwrap();
    let gone = next_json(&mut bob).await;
    assert_eq!(gone["type"], "system");
    assert!(gone["message"].as_str().unwrap().contains("thins out"));

    bob.close(None).await.unwrap();
}
