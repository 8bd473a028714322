//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, Request, Uri},
    Router,
};
use futures_util::stream;
use http_body_util::BodyExt;
use layered_proxy::{ProxyConfig, ProxyServer, Shutdown};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// What a mock upstream saw for one request.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Requests observed by a recording upstream.
#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Captured>>>);

impl Recorder {
    pub fn all(&self) -> Vec<Captured> {
        self.0.lock().unwrap().clone()
    }

    pub fn last(&self) -> Captured {
        self.0.lock().unwrap().last().cloned().expect("upstream saw no request")
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

async fn record(State(recorder): State<Recorder>, request: Request<Body>) -> String {
    let (parts, body) = request.into_parts();
    let body = body.collect().await.unwrap().to_bytes();
    let reply = format!("upstream {} {}", parts.method, parts.uri);
    recorder.0.lock().unwrap().push(Captured {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
    });
    reply
}

/// Start an upstream on an ephemeral port that records every request and
/// answers `upstream <METHOD> <URI>`.
pub async fn start_recording_upstream() -> (SocketAddr, Recorder) {
    let recorder = Recorder::default();
    let app = Router::new().fallback(record).with_state(recorder.clone());
    (serve(app).await, recorder)
}

/// Start an upstream whose response body is fed chunk by chunk from the
/// returned sender. Dropping the sender ends the body.
pub async fn start_streaming_upstream() -> (SocketAddr, mpsc::UnboundedSender<&'static str>) {
    let (tx, rx) = mpsc::unbounded_channel::<&'static str>();
    let rx = Arc::new(tokio::sync::Mutex::new(Some(rx)));

    let app = Router::new().fallback(move || {
        let rx = rx.clone();
        async move {
            let Some(rx) = rx.lock().await.take() else {
                return Body::from("stream already consumed");
            };
            let chunks = stream::unfold(rx, |mut rx| async move {
                rx.recv()
                    .await
                    .map(|chunk| (Ok::<_, Infallible>(Bytes::from_static(chunk.as_bytes())), rx))
            });
            Body::from_stream(chunks)
        }
    });

    (serve(app).await, tx)
}

/// Start an upstream that waits `delay` before answering.
pub async fn start_slow_upstream(delay: Duration) -> SocketAddr {
    let app = Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        "finally"
    });
    serve(app).await
}

/// Start an upstream that promises `declared` body bytes, sends `body`,
/// then drops the connection.
pub async fn start_truncating_upstream(declared: usize, body: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut request = [0u8; 4096];
                        let _ = socket.read(&mut request).await;
                        let head = format!("HTTP/1.1 200 OK\r\nContent-Length: {declared}\r\n\r\n");
                        let _ = socket.write_all(head.as_bytes()).await;
                        let _ = socket.write_all(body).await;
                        let _ = socket.flush().await;
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Configuration pointing at `upstream` with request logging off.
pub fn config_for(upstream: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::for_upstream(&upstream.to_string()).unwrap();
    config.upstream.log_requests = false;
    config
}

/// A running proxy and the handle that stops it.
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub server: ProxyServer,
    shutdown: Shutdown,
}

impl RunningProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `server` on an ephemeral port.
pub async fn start_proxy(server: ProxyServer) -> RunningProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();

    let running = server.clone();
    tokio::spawn(async move {
        let _ = running.run(listener, receiver).await;
    });

    RunningProxy {
        addr,
        server,
        shutdown,
    }
}

/// Client without connection reuse or system proxy settings.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
