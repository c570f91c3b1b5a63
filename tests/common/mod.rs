//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use cryoner::config::PricingConfig;

/// Request lines seen by a mock ticker, in arrival order.
pub type Seen = Arc<Mutex<Vec<String>>>;

/// Start a mock ticker on an ephemeral port.
///
/// `f` receives the request line (`GET /path?query HTTP/1.1`) and returns
/// the status code and body to answer with.
pub async fn start_mock_ticker<F, Fut>(f: F) -> (SocketAddr, Seen)
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Seen = Arc::default();
    let f = Arc::new(f);

    let log = seen.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let log = log.clone();
                    tokio::spawn(async move {
                        let Some(request_line) = read_request_line(&mut socket).await else {
                            return;
                        };
                        log.lock().unwrap().push(request_line.clone());

                        let (status, body) = f(request_line).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, seen)
}

/// A ticker that always answers `price` for whatever symbol is asked.
pub async fn start_fixed_ticker(price: &'static str) -> (SocketAddr, Seen) {
    start_mock_ticker(move |line| async move {
        let symbol = symbol_of(&line).unwrap_or_default();
        (200, format!(r#"{{"symbol":"{}","price":"{}"}}"#, symbol, price))
    })
    .await
}

/// Extract the `symbol` query parameter from a request line.
pub fn symbol_of(request_line: &str) -> Option<String> {
    let target = request_line.split_whitespace().nth(1)?;
    let (_, query) = target.split_once('?')?;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("symbol="))
        .map(str::to_string)
}

/// Pricing config pointing at a mock ticker.
pub fn pricing_config(addr: SocketAddr) -> PricingConfig {
    PricingConfig {
        ticker_url: format!("http://{}/api/v3/ticker/price", addr),
        timeout_secs: 2,
        ..PricingConfig::default()
    }
}

async fn read_request_line(socket: &mut tokio::net::TcpStream) -> Option<String> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 512];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let text = String::from_utf8_lossy(&buf);
    text.lines().next().map(str::to_string)
}
