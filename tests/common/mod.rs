//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use flag_toggle_service::config::ServiceConfig;
use flag_toggle_service::flags::{FlagClient, FlagEvaluator, FlagSnapshot, TracingLogSink};
use flag_toggle_service::http::HttpServer;
use flag_toggle_service::lifecycle::Shutdown;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// The parts of an incoming request the mock backend cares about.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub path: String,
    pub headers: HashMap<String, String>,
}

#[allow(dead_code)]
impl MockRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Response from a programmable backend: status, extra headers, body.
pub type MockResponse = (u16, Vec<(String, String)>, String);

/// Start a programmable mock flag backend on an ephemeral port.
#[allow(dead_code)]
pub async fn start_programmable_backend<F>(f: F) -> SocketAddr
where
    F: Fn(MockRequest) -> MockResponse + Send + Sync + 'static,
{
    start_slow_backend(Duration::ZERO, f).await
}

/// Like `start_programmable_backend`, but every response is held back by `delay`.
#[allow(dead_code)]
pub async fn start_slow_backend<F>(delay: Duration, f: F) -> SocketAddr
where
    F: Fn(MockRequest) -> MockResponse + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let request = match read_request(&mut socket).await {
                            Some(r) => r,
                            None => return,
                        };
                        let (status, headers, body) = f(request);
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        let status_text = match status {
                            200 => "200 OK",
                            304 => "304 Not Modified",
                            401 => "401 Unauthorized",
                            403 => "403 Forbidden",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let mut response_str = format!("HTTP/1.1 {}\r\n", status_text);
                        for (name, value) in headers {
                            response_str.push_str(&format!("{}: {}\r\n", name, value));
                        }
                        response_str.push_str(&format!(
                            "Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        ));
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let text = String::from_utf8_lossy(&buf);
    let mut lines = text.split("\r\n");
    let path = lines.next()?.split_whitespace().nth(1)?.to_string();
    let headers = lines
        .take_while(|l| !l.is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    Some(MockRequest { path, headers })
}

/// Build an offline flag client serving fixed values.
#[allow(dead_code)]
pub fn offline_flags(values: &[(&str, bool)]) -> Arc<dyn FlagEvaluator> {
    let snapshot = FlagSnapshot::from_values(values.iter().map(|(k, v)| (*k, *v)));
    Arc::new(FlagClient::from_snapshot(snapshot, Arc::new(TracingLogSink)))
}

/// Start the toggle service on an ephemeral port.
///
/// Returns the base URL and the shutdown handle stopping it.
#[allow(dead_code)]
pub async fn start_service(
    config: ServiceConfig,
    flags: Arc<dyn FlagEvaluator>,
) -> (String, Shutdown) {
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, flags);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (format!("http://{}", addr), shutdown)
}

/// Poll `check` until it holds or `timeout` elapses.
#[allow(dead_code)]
pub async fn eventually<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    check()
}
