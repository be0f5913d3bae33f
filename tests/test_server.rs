//! End-to-end tests over real TCP connections.

use std::io::Read;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use beacon::config::Config;
use beacon::server::Server;
use flate2::read::GzDecoder;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

struct RawResponse {
    status_line: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

async fn start_server(directory: Option<&Path>) -> SocketAddr {
    let mut cfg = Config::default();
    cfg.server.host = "127.0.0.1".to_string();
    cfg.server.port = 0;
    cfg.server.max_request_bytes = 64 * 1024;
    cfg.files.directory = directory.map(Path::to_path_buf);

    let server = Server::bind(&cfg).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.serve());
    addr
}

async fn send_parts(addr: SocketAddr, parts: &[&[u8]]) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.unwrap();

    for part in parts {
        stream.write_all(part).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let mut raw = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut raw))
        .await
        .expect("server did not close the connection")
        .unwrap();

    parse_response(&raw)
}

async fn send(addr: SocketAddr, request: &[u8]) -> RawResponse {
    send_parts(addr, &[request]).await
}

fn parse_response(raw: &[u8]) -> RawResponse {
    let end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no blank line");
    let head = std::str::from_utf8(&raw[..end]).unwrap();
    let mut lines = head.split("\r\n");

    let status_line = lines.next().unwrap().to_string();
    let headers = lines
        .map(|line| {
            let (k, v) = line.split_once(": ").unwrap();
            (k.to_string(), v.to_string())
        })
        .collect();

    RawResponse {
        status_line,
        headers,
        body: raw[end + 4..].to_vec(),
    }
}

#[tokio::test]
async fn test_root() {
    let addr = start_server(None).await;
    let resp = send(addr, b"GET / HTTP/1.1\r\nHost: localhost:4221\r\n\r\n").await;

    assert_eq!(resp.status_line, "HTTP/1.1 200 OK");
    assert_eq!(resp.header("Content-Type"), Some("text/plain"));
    assert!(resp.body.is_empty());
}

#[tokio::test]
async fn test_unknown_route() {
    let addr = start_server(None).await;
    let resp = send(addr, b"GET /bogus HTTP/1.1\r\n\r\n").await;

    assert_eq!(resp.status_line, "HTTP/1.1 404 Not Found");
    assert!(resp.body.is_empty());
}

#[tokio::test]
async fn test_echo() {
    let addr = start_server(None).await;
    let resp = send(addr, b"GET /echo/pineapple HTTP/1.1\r\n\r\n").await;

    assert_eq!(resp.status_line, "HTTP/1.1 200 OK");
    assert_eq!(resp.header("Content-Length"), Some("9"));
    assert_eq!(resp.body, b"pineapple");
}

#[tokio::test]
async fn test_echo_multibyte_length() {
    let addr = start_server(None).await;
    let resp = send(addr, "GET /echo/日本 HTTP/1.1\r\n\r\n".as_bytes()).await;

    assert_eq!(resp.header("Content-Length"), Some("6"));
    assert_eq!(resp.body, "日本".as_bytes());
}

#[tokio::test]
async fn test_echo_gzip() {
    let addr = start_server(None).await;
    let resp = send(
        addr,
        b"GET /echo/banana HTTP/1.1\r\nAccept-Encoding: deflate, gzip\r\n\r\n",
    )
    .await;

    assert_eq!(resp.header("Content-Encoding"), Some("gzip"));
    assert_eq!(
        resp.header("Content-Length"),
        Some(resp.body.len().to_string().as_str())
    );

    let mut decoded = String::new();
    GzDecoder::new(&resp.body[..]).read_to_string(&mut decoded).unwrap();
    assert_eq!(decoded, "banana");
}

#[tokio::test]
async fn test_user_agent() {
    let addr = start_server(None).await;
    let resp = send(
        addr,
        b"GET /user-agent HTTP/1.1\r\nHost: localhost\r\nUser-Agent: test-client/1.0\r\n\r\n",
    )
    .await;

    assert_eq!(resp.header("Content-Length"), Some("15"));
    assert_eq!(resp.body, b"test-client/1.0");
}

#[tokio::test]
async fn test_files_round_trip() {
    let dir = TempDir::new().unwrap();
    let addr = start_server(Some(dir.path())).await;

    let created = send(
        addr,
        b"POST /files/round HTTP/1.1\r\nContent-Type: application/octet-stream\r\nContent-Length: 12\r\n\r\nab\r\n\r\ncd\x00\xfe\r\n",
    )
    .await;
    assert_eq!(created.status_line, "HTTP/1.1 201 Created");

    let fetched = send(addr, b"GET /files/round HTTP/1.1\r\n\r\n").await;
    assert_eq!(fetched.status_line, "HTTP/1.1 200 OK");
    assert_eq!(fetched.header("Content-Type"), Some("application/octet-stream"));
    assert_eq!(fetched.header("Content-Length"), Some("12"));
    assert_eq!(fetched.body, b"ab\r\n\r\ncd\x00\xfe\r\n");
}

#[tokio::test]
async fn test_files_missing() {
    let dir = TempDir::new().unwrap();
    let addr = start_server(Some(dir.path())).await;

    let resp = send(addr, b"GET /files/non_existent HTTP/1.1\r\n\r\n").await;
    assert_eq!(resp.status_line, "HTTP/1.1 404 Not Found");
    assert!(resp.body.is_empty());
}

#[tokio::test]
async fn test_files_without_name() {
    let dir = TempDir::new().unwrap();
    let addr = start_server(Some(dir.path())).await;

    let resp = send(addr, b"GET /files HTTP/1.1\r\n\r\n").await;
    assert_eq!(resp.status_line, "HTTP/1.1 400 Bad Request");
}

#[tokio::test]
async fn test_files_traversal() {
    let dir = TempDir::new().unwrap();
    let addr = start_server(Some(dir.path())).await;

    let resp = send(addr, b"GET /files/../etc/passwd HTTP/1.1\r\n\r\n").await;
    assert_eq!(resp.status_line, "HTTP/1.1 400 Bad Request");
}

#[tokio::test]
async fn test_files_method_not_allowed() {
    let dir = TempDir::new().unwrap();
    let addr = start_server(Some(dir.path())).await;

    let resp = send(addr, b"DELETE /files/a HTTP/1.1\r\n\r\n").await;
    assert_eq!(resp.status_line, "HTTP/1.1 405 Method Not Allowed");
}

#[tokio::test]
async fn test_malformed_request_line() {
    let addr = start_server(None).await;
    let resp = send(addr, b"NONSENSE\r\n\r\n").await;

    assert_eq!(resp.status_line, "HTTP/1.1 500 Internal Server Error");
    assert!(resp.body.is_empty());
}

#[tokio::test]
async fn test_request_split_across_writes() {
    let dir = TempDir::new().unwrap();
    let addr = start_server(Some(dir.path())).await;

    let resp = send_parts(
        addr,
        &[
            b"POST /files/split HTTP/1.1\r\nContent-Le",
            b"ngth: 11\r\n\r\nhello ",
            b"world",
        ],
    )
    .await;
    assert_eq!(resp.status_line, "HTTP/1.1 201 Created");
    assert_eq!(std::fs::read(dir.path().join("split")).unwrap(), b"hello world");
}

#[tokio::test]
async fn test_oversized_request() {
    let addr = start_server(None).await;

    // A head that never ends, exactly the limit long, so the server has
    // consumed everything it was sent when it answers.
    let mut request = b"GET /echo/x HTTP/1.1\r\nX-Padding: ".to_vec();
    request.resize(64 * 1024, b'a');

    let resp = send(addr, &request).await;
    assert_eq!(resp.status_line, "HTTP/1.1 413 Payload Too Large");
}

#[tokio::test]
async fn test_overflowing_content_length() {
    let addr = start_server(None).await;

    let resp = send(
        addr,
        b"POST /files/a HTTP/1.1\r\nContent-Length: 18446744073709551615\r\n\r\nabc",
    )
    .await;
    assert_eq!(resp.status_line, "HTTP/1.1 413 Payload Too Large");
    assert!(resp.body.is_empty());
}

#[tokio::test]
async fn test_declared_length_over_limit_answers_immediately() {
    let addr = start_server(None).await;

    // Only the head is sent; the server must not wait for the body.
    let resp = send(
        addr,
        b"POST /echo/x HTTP/1.1\r\nContent-Length: 1000000\r\n\r\n",
    )
    .await;
    assert_eq!(resp.status_line, "HTTP/1.1 413 Payload Too Large");
}

#[tokio::test]
async fn test_server_survives_bad_connections() {
    let addr = start_server(None).await;

    // A client that connects and leaves without sending anything.
    drop(TcpStream::connect(addr).await.unwrap());
    let _ = send(addr, b"\xff\xfe\r\n\r\n").await;

    let resp = send(addr, b"GET / HTTP/1.1\r\n\r\n").await;
    assert_eq!(resp.status_line, "HTTP/1.1 200 OK");
}

#[tokio::test]
async fn test_concurrent_connections() {
    let addr = start_server(None).await;

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            tokio::spawn(async move {
                let request = format!("GET /echo/msg{i} HTTP/1.1\r\n\r\n");
                let resp = send(addr, request.as_bytes()).await;
                assert_eq!(resp.body, format!("msg{i}").into_bytes());
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }
}
