//! Push channel and HTTP API over a real socket, backed by the mock driver.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use simdeck_core::Platform;
use simdeck_server::application::{CommandDispatcher, DeviceSession};
use simdeck_server::domain::ServerConfig;
use simdeck_server::infrastructure::driver::mock::{DriverCall, MockDriver, MOCK_PNG};
use simdeck_server::infrastructure::http_api::{serve, AppState};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server(platform: Platform) -> (SocketAddr, Arc<MockDriver>, watch::Sender<bool>) {
    let driver = Arc::new(MockDriver::new(platform));
    let config = Arc::new(ServerConfig::default());
    let session = Arc::new(DeviceSession::new(driver.clone(), config));
    let dispatcher = Arc::new(CommandDispatcher::new(session));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = watch::channel(false);
    tokio::spawn(serve(listener, AppState::new(dispatcher, rx.clone()), rx));
    (addr, driver, tx)
}

/// Sends one HTTP/1.1 request and returns the status line and JSON body.
async fn http(addr: SocketAddr, method: &str, path: &str, body: Option<&str>) -> (String, Value) {
    let mut request = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
    if let Some(body) = body {
        request.push_str(&format!(
            "Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        ));
    } else {
        request.push_str("\r\n");
    }

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    timeout(Duration::from_secs(3), stream.read_to_string(&mut response))
        .await
        .unwrap()
        .unwrap();

    let (head, body) = response.split_once("\r\n\r\n").unwrap();
    let status = head.lines().next().unwrap().to_string();
    (status, serde_json::from_str(body).unwrap())
}

fn screenshots(driver: &MockDriver) -> usize {
    driver
        .calls()
        .into_iter()
        .filter(|c| *c == DriverCall::Screenshot)
        .count()
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    client
}

async fn send_json(client: &mut Client, json: &str) {
    client.send(Message::Text(json.to_string())).await.unwrap();
}

async fn next_frame(client: &mut Client) -> Value {
    let msg = timeout(Duration::from_secs(3), client.next())
        .await
        .expect("no frame within 3s")
        .expect("socket closed")
        .unwrap();
    match msg {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn test_start_stream_pushes_png_frames() {
    // Arrange
    let (addr, _driver, _shutdown) = start_server(Platform::Ios).await;
    let mut client = connect(addr).await;

    // Act
    send_json(&mut client, r#"{"action":"startStream","fps":20}"#).await;
    let frame = next_frame(&mut client).await;

    // Assert
    assert_eq!(frame["type"], "frame");
    assert!(frame["timestamp"].as_u64().unwrap() > 0);
    let png = STANDARD.decode(frame["data"].as_str().unwrap()).unwrap();
    assert_eq!(png, MOCK_PNG);
}

#[tokio::test]
async fn test_stop_stream_halts_frames() {
    let (addr, _driver, _shutdown) = start_server(Platform::Android).await;
    let mut client = connect(addr).await;
    send_json(&mut client, r#"{"action":"startStream","fps":20}"#).await;
    next_frame(&mut client).await;

    send_json(&mut client, r#"{"action":"stopStream"}"#).await;

    // Frames already queued may still arrive; after that the channel is quiet.
    let mut trailing = 0;
    while let Ok(Some(Ok(_))) = timeout(Duration::from_millis(400), client.next()).await {
        trailing += 1;
        assert!(trailing <= 4, "frames kept arriving after stopStream");
    }
}

#[tokio::test]
async fn test_malformed_messages_do_not_close_the_channel() {
    let (addr, _driver, _shutdown) = start_server(Platform::Ios).await;
    let mut client = connect(addr).await;

    send_json(&mut client, "not json").await;
    send_json(&mut client, r#"{"action":"reboot"}"#).await;
    send_json(&mut client, r#"{"action":"startStream"}"#).await;

    assert_eq!(next_frame(&mut client).await["type"], "frame");
}

#[tokio::test]
async fn test_shutdown_closes_push_channel() {
    let (addr, _driver, shutdown) = start_server(Platform::Ios).await;
    let mut client = connect(addr).await;

    shutdown.send(true).unwrap();

    let msg = timeout(Duration::from_secs(3), client.next()).await.unwrap();
    assert!(matches!(msg, None | Some(Ok(Message::Close(_))) | Some(Err(_))));
}

#[tokio::test]
async fn test_disconnect_stops_screenshots() {
    // Arrange: 20 fps is one screenshot every 50ms
    let (addr, driver, _shutdown) = start_server(Platform::Ios).await;
    let mut client = connect(addr).await;
    send_json(&mut client, r#"{"action":"startStream","fps":20}"#).await;
    next_frame(&mut client).await;

    // Act
    client.close(None).await.unwrap();
    drop(client);
    tokio::time::sleep(Duration::from_millis(200)).await;
    let after_close = screenshots(&driver);
    tokio::time::sleep(Duration::from_millis(250)).await;

    // Assert
    assert!(after_close > 0);
    assert_eq!(screenshots(&driver), after_close, "capture continued after disconnect");
}

#[tokio::test]
async fn test_http_platform_route_reports_bound_device() {
    let (addr, _driver, _shutdown) = start_server(Platform::Android).await;

    let (status, json) = http(addr, "GET", "/api/platform", None).await;

    assert!(status.starts_with("HTTP/1.1 200"));
    assert_eq!(json["success"], true);
    assert_eq!(json["platform"], "android");
    assert_eq!(json["deviceId"], "mock-android");
}

#[tokio::test]
async fn test_android_only_routes_refuse_on_ios_before_body_checks() {
    // Arrange
    let (addr, driver, _shutdown) = start_server(Platform::Ios).await;

    for path in ["/api/install", "/api/uninstall"] {
        // Act: `{}` lacks the required field
        let (status, json) = http(addr, "POST", path, Some("{}")).await;

        // Assert
        assert!(status.starts_with("HTTP/1.1 200"), "{path}: {status}");
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("not available on iOS"), "{path}");
    }
    assert!(driver.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_install_on_android_is_400() {
    let (addr, _driver, _shutdown) = start_server(Platform::Android).await;

    let (status, json) = http(addr, "POST", "/api/install", Some("{}")).await;

    assert!(status.starts_with("HTTP/1.1 400"), "{status}");
    assert_eq!(json["success"], false);
}
