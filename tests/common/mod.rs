//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Router;
use jobportal_client::auth::{MemorySessionStore, Session};
use jobportal_client::{ApiClient, ClientConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Counts requests a mock handler has seen.
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hit, returning how many came before it.
    pub fn hit(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst)
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Serve `router` under `/api` on an ephemeral port.
pub async fn start_mock_backend(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().nest("/api", router);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Raw TCP backend that drops the first `failures` connections without
/// answering, then replies 200 with `body`.
pub async fn start_flaky_backend(failures: usize, body: &'static str) -> (SocketAddr, Hits) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Hits::new();
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let counter = counter.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                if socket.read(&mut buf).await.unwrap_or(0) == 0 {
                    return;
                }
                if counter.hit() < failures {
                    drop(socket);
                    return;
                }
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, hits)
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Defaults with short delays, pointed at `addr`.
pub fn test_config(addr: SocketAddr) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.api.base_url = format!("http://{addr}/api");
    config.api.timeout_ms = 2_000;
    config.retries.base_delay_ms = 10;
    config
}

/// Client with an in-memory session the test can inspect.
pub fn client_with_session(
    config: ClientConfig,
    session: Session,
) -> (ApiClient, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::with_session(session));
    let client = ApiClient::builder(config)
        .session_store(store.clone())
        .build()
        .unwrap();
    (client, store)
}

pub fn client(config: ClientConfig) -> ApiClient {
    client_with_session(config, Session::default()).0
}

pub fn epoch_secs_from_now(offset: i64) -> u64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
    (now + offset) as u64
}
