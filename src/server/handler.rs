use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::protocol::{
    Request, Response, EMPTY_QUEUE, INVALID_COMMAND, MAX_FRAME_BYTES, PUBLISH_ACK,
};
use crate::queue::QueueStore;

pub const READ_TIMEOUT: Duration = Duration::from_secs(5);
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Serve exactly one request on an accepted connection.
///
/// Single bounded read, dispatch against the shared store, single bounded
/// write. The socket is dropped on every exit path, so the connection closes
/// whether or not a response was sent. A read timeout or I/O error closes
/// without a response.
pub async fn handle_connection(
    mut socket: TcpStream,
    store: Arc<QueueStore>,
) -> io::Result<()> {
    let mut buffer = vec![0u8; MAX_FRAME_BYTES];
    let n = timeout(READ_TIMEOUT, socket.read(&mut buffer))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "request read timed out"))??;

    let raw = String::from_utf8_lossy(&buffer[..n]);
    let response = dispatch(&raw, &store);

    timeout(WRITE_TIMEOUT, socket.write_all(response.encode().as_bytes()))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "response write timed out"))??;

    Ok(())
}

/// Execute one request against the store and produce the response frame.
pub fn dispatch(raw: &str, store: &QueueStore) -> Response {
    match Request::parse(raw) {
        Some(Request::Publish { content, .. }) => {
            tracing::info!("published: {}", content);
            store.enqueue(content);
            Response::Ok(PUBLISH_ACK.to_string())
        }
        Some(Request::Receive { .. }) => match store.try_dequeue() {
            Some(message) => {
                tracing::info!("delivered: {}", message);
                Response::Ok(message)
            }
            None => {
                tracing::debug!("receive on empty queue");
                Response::Error(EMPTY_QUEUE.to_string())
            }
        },
        None => {
            tracing::warn!("invalid request: {:?}", raw);
            Response::Error(INVALID_COMMAND.to_string())
        }
    }
}
