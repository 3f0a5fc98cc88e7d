//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use loggate::config::schema::AnalyzerConfig;
use loggate::config::GatewayConfig;
use loggate::http::HttpServer;
use loggate::lifecycle::Shutdown;

/// A gateway running on an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Gateway configuration tuned for fast tests: short ticks, short grace,
/// and a probe interval long enough that only manual triggers fire.
pub fn test_config(analyzers: Vec<(&str, SocketAddr, f64)>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.queue.processing_interval_ms = 5;
    config.dispatch.send_timeout_ms = 3_000;
    config.dispatch.shutdown_grace_ms = 500;
    config.health_check.interval_ms = 3_600_000;
    config.health_check.timeout_ms = 500;
    config.analyzers = analyzers
        .into_iter()
        .map(|(id, addr, weight)| AnalyzerConfig {
            id: id.to_string(),
            endpoint: format!("http://{addr}"),
            weight,
        })
        .collect();
    config
}

/// Start a gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(config).expect("gateway construction failed");
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    // Give the server a beat to start accepting.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    TestGateway { addr, shutdown }
}

/// Start a programmable mock analyzer on an ephemeral port.
///
/// The handler receives the request method and path and returns a status
/// code and body. Request bodies are drained before responding.
pub async fn start_mock_analyzer<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let Some((method, path)) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = handler(method, path).await;
                        let status_text = match status {
                            200 => "200 OK",
                            204 => "204 No Content",
                            400 => "400 Bad Request",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Read one HTTP request, returning its method and path.
async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<(String, String)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        if buf.len() > 64 * 1024 {
            return None;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut parts = head.lines().next()?.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);

    // Drain the body so the client finishes writing before we respond.
    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some((method, path))
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Poll the stats endpoint until the predicate holds or five seconds pass.
#[allow(dead_code)]
pub async fn wait_for_stats<F>(
    client: &reqwest::Client,
    gateway: &TestGateway,
    predicate: F,
) -> serde_json::Value
where
    F: Fn(&serde_json::Value) -> bool,
{
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    let mut last = serde_json::Value::Null;
    loop {
        if let Ok(resp) = client.get(gateway.url("/stats")).send().await {
            if let Ok(stats) = resp.json::<serde_json::Value>().await {
                if predicate(&stats) {
                    return stats;
                }
                last = stats;
            }
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("stats predicate not satisfied in time: {last:#}");
        }
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }
}

/// Test HTTP client that bypasses any local proxy configuration.
#[allow(dead_code)]
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
