//! Shared test fixtures: mock executors and a minimal HTTP responder

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::job::WorkItem;
use crate::response::Outcome;
use crate::traits::{RequestError, RequestExecutor};

// ============================================================================
// Mock RequestExecutor
// ============================================================================

pub(crate) struct MockExecutor {
    delay: Option<Duration>,
    fail_every: Option<usize>,
    fail_all: bool,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    seen: Mutex<Vec<usize>>,
}

impl MockExecutor {
    pub(crate) fn new() -> Self {
        Self {
            delay: None,
            fail_every: None,
            fail_all: false,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn with_fail_every(mut self, n: usize) -> Self {
        self.fail_every = Some(n);
        self
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Ids of every item executed, sorted
    pub(crate) fn seen_ids(&self) -> Vec<usize> {
        let mut ids = self.seen.lock().unwrap().clone();
        ids.sort_unstable();
        ids
    }
}

#[async_trait]
impl RequestExecutor for MockExecutor {
    async fn execute(&self, item: &WorkItem) -> Result<Outcome, RequestError> {
        let count = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        self.seen.lock().unwrap().push(item.id());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_all {
            return Err(RequestError::Status(500));
        }
        if let Some(fail_every) = self.fail_every {
            if count % fail_every == 0 {
                return Err(RequestError::Status(500));
            }
        }

        Ok(Outcome::new(item.id(), self.delay.unwrap_or_default()))
    }
}

pub(crate) fn test_target() -> Arc<Url> {
    Arc::new(Url::parse("http://localhost:8080/").unwrap())
}

// ============================================================================
// Test HTTP server
// ============================================================================

/// Keep-alive HTTP/1.1 responder answering every request with a fixed status
pub(crate) struct TestServer {
    port: u16,
    hits: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub(crate) async fn start() -> Self {
        Self::spawn(200, Duration::ZERO).await
    }

    pub(crate) async fn with_status(status: u16) -> Self {
        Self::spawn(status, Duration::ZERO).await
    }

    pub(crate) async fn with_delay(delay: Duration) -> Self {
        Self::spawn(200, delay).await
    }

    async fn spawn(status: u16, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let port = listener.local_addr().expect("No local address").port();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let counter = Arc::clone(&counter);
                tokio::spawn(async move {
                    let _ = serve_connection(stream, status, delay, counter).await;
                });
            }
        });

        Self { port, hits, handle }
    }

    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    pub(crate) fn url(&self) -> String {
        format!("http://127.0.0.1:{}/", self.port)
    }

    pub(crate) fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    status: u16,
    delay: Duration,
    hits: Arc<AtomicUsize>,
) -> std::io::Result<()> {
    let mut pending = Vec::with_capacity(1024);
    let mut buf = [0u8; 1024];

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        pending.extend_from_slice(&buf[..n]);

        // GET requests carry no body, so a request ends at the blank line
        while let Some(end) = header_end(&pending) {
            pending.drain(..end);
            hits.fetch_add(1, Ordering::SeqCst);

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let body = "from test\n";
            let response = format!(
                "HTTP/1.1 {status} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{body}",
                if status < 400 { "OK" } else { "Error" },
                body.len()
            );
            stream.write_all(response.as_bytes()).await?;
        }
    }
}

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

/// URL of a local port with nothing listening on it
pub(crate) async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    let port = listener.local_addr().expect("No local address").port();
    drop(listener);
    format!("http://127.0.0.1:{port}/")
}
