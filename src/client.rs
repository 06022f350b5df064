//! Relay client: one connection per call, bounded timeouts, fixed retries.
//!
//! Every public call opens a fresh connection, writes one request frame,
//! reads one response and closes. Connectivity failures are retried up to
//! [`RetryPolicy::max_attempts`] with a fixed delay between attempts; a
//! server-side `ERROR|...` response is never retried.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

use crate::error::ClientError;
use crate::protocol::{Request, Response, MAX_FRAME_BYTES};

/// Bounded-retry policy for one public client call.
///
/// The delay is fixed, not exponential: with only two attempts allowed the
/// single pause between them just keeps the client from hammering a server
/// that was slow to accept.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            retry_delay: Duration::from_secs(8),
            connect_timeout: Duration::from_secs(5),
            io_timeout: Duration::from_secs(5),
        }
    }
}

pub struct RelayClient {
    host: String,
    port: u16,
    app_id: Uuid,
    policy: RetryPolicy,
}

impl RelayClient {
    /// Create a client with the default policy. The identity token is
    /// generated once here and reused for every request.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_policy(host, port, RetryPolicy::default())
    }

    pub fn with_policy(host: impl Into<String>, port: u16, policy: RetryPolicy) -> Self {
        Self {
            host: host.into(),
            port,
            app_id: Uuid::new_v4(),
            policy,
        }
    }

    pub fn app_id(&self) -> Uuid {
        self.app_id
    }

    /// Publish one message. Returns whether any attempt got a response back;
    /// the response body itself is not inspected.
    pub async fn publish(&self, content: &str) -> bool {
        let frame = Request::Publish {
            client_id: self.app_id.to_string(),
            content: content.to_string(),
        }
        .encode();

        self.send_with_retry(&frame).await.is_ok()
    }

    /// Pull the oldest available message from the server.
    ///
    /// An `ERROR|...` response (empty queue included) surfaces as
    /// [`ClientError::Server`] carrying the raw response line; exhausting
    /// every attempt without a response surfaces as
    /// [`ClientError::Exhausted`].
    pub async fn receive(&self) -> Result<String, ClientError> {
        let frame = Request::Receive {
            client_id: self.app_id.to_string(),
        }
        .encode();

        let raw = self.send_with_retry(&frame).await?;

        match Response::parse(&raw) {
            Some(Response::Ok(content)) => Ok(content),
            Some(Response::Error(_)) => Err(ClientError::Server(raw)),
            None => Err(ClientError::MalformedResponse(raw)),
        }
    }

    async fn send_with_retry(&self, frame: &str) -> Result<String, ClientError> {
        retry(&self.policy, || self.attempt(frame)).await
    }

    /// One attempt: bounded connect, bounded write of the full frame, one
    /// bounded read of the response. The connection is dropped at the end of
    /// the attempt regardless of outcome.
    async fn attempt(&self, frame: &str) -> io::Result<String> {
        let mut socket = timeout(
            self.policy.connect_timeout,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))??;

        timeout(self.policy.io_timeout, async {
            socket.write_all(frame.as_bytes()).await?;
            socket.flush().await
        })
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "request write timed out"))??;

        let mut buffer = vec![0u8; MAX_FRAME_BYTES];
        let n = timeout(self.policy.io_timeout, socket.read(&mut buffer))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "response read timed out"))??;

        Ok(String::from_utf8_lossy(&buffer[..n]).into_owned())
    }
}

/// Drive an operation through the bounded-retry policy.
///
/// Generic over the operation so tests can inject a failing transport
/// instead of a real connection.
async fn retry<F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<String, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<String>>,
{
    for attempt in 1..=policy.max_attempts {
        match op().await {
            Ok(response) => {
                tracing::debug!("response received: {:?}", response);
                return Ok(response);
            }
            Err(e) => {
                tracing::warn!("attempt {} failed: {}", attempt, e);
                if attempt < policy.max_attempts {
                    tracing::info!("retrying in {:?}", policy.retry_delay);
                    sleep(policy.retry_delay).await;
                }
            }
        }
    }

    Err(ClientError::Exhausted {
        attempts: policy.max_attempts,
    })
}
