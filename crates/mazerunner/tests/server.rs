//! Integration tests for the maze server: full request/reply flow over
//! real sockets, session disposal and the connection limit.

use std::path::PathBuf;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use mazerunner::prelude::*;
use mazerunner_transport::MAX_LINE_LEN;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Templates
// =========================================================================

/// Open 7x7 room. The only cell three steps from the border is the centre,
/// so the player always starts at (3, 3) and three `UP`s reach the exit.
fn open_catalog() -> TemplateCatalog {
    TemplateCatalog::from_templates(vec![
        Template::parse("open", &".......\n".repeat(7)).expect("valid template"),
    ])
}

/// Same room with a wall directly above the centre.
fn walled_catalog() -> TemplateCatalog {
    let text = "\
.......
.......
...#...
.......
.......
.......
.......";
    TemplateCatalog::from_templates(vec![
        Template::parse("walled", text).expect("valid template"),
    ])
}

fn shipped_maps_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/maps")
}

// =========================================================================
// Helpers
// =========================================================================

const WAIT: Duration = Duration::from_secs(2);

/// Starts a TCP text server on a random port.
async fn start_tcp(catalog: TemplateCatalog, max_sessions: usize) -> (String, RegistryHandle) {
    let server = MazeServerBuilder::new()
        .bind("127.0.0.1:0")
        .max_sessions(max_sessions)
        .catalog(catalog)
        .build_tcp(TextCodec)
        .await
        .expect("server should build");

    let addr = server.local_addr().expect("should have local addr").to_string();
    let registry = server.registry();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    (addr, registry)
}

/// Starts a WebSocket server on a random port.
async fn start_websocket<C: Codec>(codec: C) -> (String, RegistryHandle) {
    let server = MazeServerBuilder::new()
        .bind("127.0.0.1:0")
        .catalog(open_catalog())
        .build_websocket(codec)
        .await
        .expect("server should build");

    let addr = server.local_addr().expect("should have local addr").to_string();
    let registry = server.registry();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    (addr, registry)
}

/// A line-oriented TCP client, as `nc` would be.
struct LineClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl LineClient {
    async fn connect(addr: &str) -> Self {
        let stream = TcpStream::connect(addr).await.expect("should connect");
        let (read_half, writer) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("send");
    }

    /// Next reply line, or `None` on end-of-stream.
    async fn recv(&mut self) -> Option<String> {
        let mut line = String::new();
        let read = tokio::time::timeout(WAIT, self.reader.read_line(&mut line))
            .await
            .expect("reply should arrive in time")
            .unwrap_or(0);
        if read == 0 {
            None
        } else {
            Some(line.trim_end().to_string())
        }
    }

    async fn request(&mut self, line: &str) -> String {
        self.send(line).await;
        self.recv().await.expect("server should reply")
    }
}

/// Polls until exactly `n` sessions are live.
async fn wait_for_sessions(registry: &RegistryHandle, n: usize) {
    tokio::time::timeout(WAIT, async {
        while registry.len().await != n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("expected {n} live sessions"));
}

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn connect_ws(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn ws_request(ws: &mut ClientWs, text: &str) -> String {
    ws.send(Message::Text(text.into())).await.expect("send");
    let msg = tokio::time::timeout(WAIT, ws.next())
        .await
        .expect("reply should arrive in time")
        .expect("stream should be open")
        .expect("recv");
    assert!(msg.is_text(), "replies are text frames, got {msg:?}");
    msg.into_text().expect("utf-8").as_str().to_owned()
}

// =========================================================================
// Game flow over TCP
// =========================================================================

#[tokio::test]
async fn test_start_query_and_win() {
    let (addr, _registry) = start_tcp(open_catalog(), 8).await;
    let mut client = LineClient::connect(&addr).await;

    assert_eq!(client.request("START").await, "GAME_STARTED");
    assert_eq!(client.request("SEND_PLAYER_DETAILS").await, "3 3 7 7");
    assert_eq!(client.request("UP").await, "OK");
    assert_eq!(client.request("UP").await, "OK");
    assert_eq!(client.request("SEND_PLAYER_DETAILS").await, "1 3 7 7");
    assert_eq!(client.request("UP").await, "GAME_WON");
}

#[tokio::test]
async fn test_move_into_wall_reports_collision() {
    let (addr, _registry) = start_tcp(walled_catalog(), 8).await;
    let mut client = LineClient::connect(&addr).await;

    assert_eq!(client.request("START").await, "GAME_STARTED");
    assert_eq!(client.request("UP").await, "WALL_COLLISION");
    assert_eq!(client.request("SEND_PLAYER_DETAILS").await, "3 3 7 7");
}

#[tokio::test]
async fn test_requests_before_start_are_errors() {
    let (addr, _registry) = start_tcp(open_catalog(), 8).await;
    let mut client = LineClient::connect(&addr).await;

    assert_eq!(client.request("SEND_PLAYER_DETAILS").await, "ERROR");
    assert_eq!(client.request("LEFT").await, "ERROR");
    // The session is still usable afterwards.
    assert_eq!(client.request("START").await, "GAME_STARTED");
}

#[tokio::test]
async fn test_unknown_request_is_error() {
    let (addr, _registry) = start_tcp(open_catalog(), 8).await;
    let mut client = LineClient::connect(&addr).await;

    assert_eq!(client.request("START").await, "GAME_STARTED");
    assert_eq!(client.request("JUMP").await, "ERROR");
    assert_eq!(client.request("").await, "ERROR");
    assert_eq!(client.request("SEND_PLAYER_DETAILS").await, "3 3 7 7");
}

#[tokio::test]
async fn test_restart_generates_fresh_maze() {
    let (addr, _registry) = start_tcp(open_catalog(), 8).await;
    let mut client = LineClient::connect(&addr).await;

    assert_eq!(client.request("START").await, "GAME_STARTED");
    assert_eq!(client.request("LEFT").await, "OK");
    assert_eq!(client.request("START").await, "GAME_STARTED");
    assert_eq!(client.request("SEND_PLAYER_DETAILS").await, "3 3 7 7");
}

#[tokio::test]
async fn test_shipped_maps_serve_a_game() {
    let catalog = TemplateCatalog::load_dir(shipped_maps_dir()).expect("maps should load");
    let sizes: Vec<(usize, usize)> = catalog
        .templates()
        .iter()
        .map(|t| (t.height(), t.width()))
        .collect();
    let (addr, _registry) = start_tcp(catalog, 8).await;
    let mut client = LineClient::connect(&addr).await;

    assert_eq!(client.request("START").await, "GAME_STARTED");
    let details = client.request("SEND_PLAYER_DETAILS").await;
    let fields: Vec<usize> = details
        .split(' ')
        .map(|f| f.parse().expect("numeric field"))
        .collect();
    assert_eq!(fields.len(), 4, "got {details:?}");
    assert!(sizes.contains(&(fields[2], fields[3])));
    assert!(fields[0] < fields[2] && fields[1] < fields[3]);
}

// =========================================================================
// Session disposal
// =========================================================================

#[tokio::test]
async fn test_stop_closes_connection_and_unregisters() {
    let (addr, registry) = start_tcp(open_catalog(), 8).await;
    let mut client = LineClient::connect(&addr).await;

    assert_eq!(client.request("START").await, "GAME_STARTED");
    wait_for_sessions(&registry, 1).await;

    client.send("STOP").await;
    assert_eq!(client.recv().await, None, "STOP gets no reply, only EOF");
    // The entry is removed before the socket is closed.
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_stop_before_start_closes_connection() {
    let (addr, registry) = start_tcp(open_catalog(), 8).await;
    let mut client = LineClient::connect(&addr).await;

    client.send("STOP").await;
    assert_eq!(client.recv().await, None);
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_client_disconnect_unregisters_session() {
    let (addr, registry) = start_tcp(open_catalog(), 8).await;
    let mut client = LineClient::connect(&addr).await;
    assert_eq!(client.request("START").await, "GAME_STARTED");
    wait_for_sessions(&registry, 1).await;

    drop(client);

    wait_for_sessions(&registry, 0).await;
}

#[tokio::test]
async fn test_concurrent_sessions_are_independent() {
    let (addr, registry) = start_tcp(open_catalog(), 8).await;
    let mut a = LineClient::connect(&addr).await;
    let mut b = LineClient::connect(&addr).await;

    assert_eq!(a.request("START").await, "GAME_STARTED");
    assert_eq!(b.request("START").await, "GAME_STARTED");
    wait_for_sessions(&registry, 2).await;

    assert_eq!(a.request("UP").await, "OK");
    assert_eq!(b.request("SEND_PLAYER_DETAILS").await, "3 3 7 7");
    assert_eq!(a.request("SEND_PLAYER_DETAILS").await, "2 3 7 7");

    a.send("STOP").await;
    assert_eq!(a.recv().await, None);
    wait_for_sessions(&registry, 1).await;

    // b is unaffected by a leaving.
    assert_eq!(b.request("DOWN").await, "OK");
    assert_eq!(b.request("SEND_PLAYER_DETAILS").await, "4 3 7 7");
}

#[tokio::test]
async fn test_oversized_line_ends_only_that_session() {
    let (addr, registry) = start_tcp(open_catalog(), 8).await;
    let mut player = LineClient::connect(&addr).await;
    assert_eq!(player.request("START").await, "GAME_STARTED");

    let mut flooder = LineClient::connect(&addr).await;
    wait_for_sessions(&registry, 2).await;
    flooder.send(&"A".repeat(MAX_LINE_LEN * 4)).await;
    assert_eq!(flooder.recv().await, None, "oversized line closes the session");
    wait_for_sessions(&registry, 1).await;

    assert_eq!(player.request("UP").await, "OK");
    assert_eq!(player.request("SEND_PLAYER_DETAILS").await, "2 3 7 7");
}

// =========================================================================
// Connection limit
// =========================================================================

#[tokio::test]
async fn test_connection_over_limit_is_closed() {
    let (addr, registry) = start_tcp(open_catalog(), 1).await;
    let mut first = LineClient::connect(&addr).await;
    assert_eq!(first.request("START").await, "GAME_STARTED");
    wait_for_sessions(&registry, 1).await;

    let mut rejected = LineClient::connect(&addr).await;
    assert_eq!(rejected.recv().await, None, "over-limit client gets EOF");
    assert_eq!(registry.len().await, 1);

    // The first session keeps working.
    assert_eq!(first.request("SEND_PLAYER_DETAILS").await, "3 3 7 7");
}

#[tokio::test]
async fn test_stopped_session_frees_a_slot() {
    let (addr, registry) = start_tcp(open_catalog(), 1).await;
    let mut first = LineClient::connect(&addr).await;
    assert_eq!(first.request("START").await, "GAME_STARTED");

    first.send("STOP").await;
    assert_eq!(first.recv().await, None);
    assert!(registry.is_empty().await);

    let mut second = LineClient::connect(&addr).await;
    assert_eq!(second.request("START").await, "GAME_STARTED");
}

// =========================================================================
// WebSocket
// =========================================================================

#[tokio::test]
async fn test_websocket_text_game() {
    let (addr, registry) = start_websocket(TextCodec).await;
    let mut ws = connect_ws(&addr).await;

    assert_eq!(ws_request(&mut ws, "START").await, "GAME_STARTED");
    assert_eq!(ws_request(&mut ws, "SEND_PLAYER_DETAILS").await, "3 3 7 7");
    assert_eq!(ws_request(&mut ws, "RIGHT").await, "OK");
    assert_eq!(ws_request(&mut ws, "RIGHT").await, "OK");
    assert_eq!(ws_request(&mut ws, "RIGHT").await, "GAME_WON");

    ws.send(Message::Text("STOP".into())).await.expect("send");
    wait_for_sessions(&registry, 0).await;
}

#[tokio::test]
async fn test_websocket_idle_peer_does_not_stall_other_clients() {
    let (addr, _registry) = start_websocket(TextCodec).await;

    // A raw TCP peer that never sends the upgrade request.
    let _idle = TcpStream::connect(&addr).await.expect("should connect");

    let started = tokio::time::timeout(Duration::from_secs(1), async {
        let mut ws = connect_ws(&addr).await;
        ws_request(&mut ws, "START").await
    })
    .await
    .expect("second client should not wait on the idle peer");
    assert_eq!(started, "GAME_STARTED");
}

#[tokio::test]
async fn test_websocket_json_game() {
    let (addr, registry) = start_websocket(JsonCodec).await;
    let mut ws = connect_ws(&addr).await;

    assert_eq!(ws_request(&mut ws, r#""START""#).await, r#""GAME_STARTED""#);

    let details: serde_json::Value =
        serde_json::from_str(&ws_request(&mut ws, r#""SEND_PLAYER_DETAILS""#).await)
            .expect("details should be JSON");
    assert_eq!(
        details,
        serde_json::json!({ "row": 3, "col": 3, "height": 7, "width": 7 })
    );

    assert_eq!(ws_request(&mut ws, "not json").await, r#""ERROR""#);

    drop(ws);
    wait_for_sessions(&registry, 0).await;
}

// =========================================================================
// Builder
// =========================================================================

#[tokio::test]
async fn test_build_with_missing_maps_dir_fails() {
    let result = MazeServerBuilder::new()
        .bind("127.0.0.1:0")
        .maps_dir(shipped_maps_dir().join("does-not-exist"))
        .build_tcp(TextCodec)
        .await;

    assert!(matches!(result, Err(MazeServerError::Maze(_))));
}

#[tokio::test]
async fn test_build_from_config_uses_maps_dir() {
    let config = ServerConfig {
        port: 0,
        maps_dir: shipped_maps_dir(),
        ..ServerConfig::default()
    };
    let server = MazeServerBuilder::from_config(&config)
        .build_tcp(TextCodec)
        .await
        .expect("server should build");

    assert!(server.local_addr().expect("local addr").port() != 0);
    assert!(server.registry().is_empty().await);
}
