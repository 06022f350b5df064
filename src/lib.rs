// relayq - minimal point-to-point TCP message relay
//
// Producers deposit text messages into a server-held FIFO queue and
// consumers pull the oldest available message, one request per connection.
// Binary entry point is in src/main.rs

pub mod client;
pub mod error;
pub mod protocol;
pub mod queue;
pub mod server;

pub use client::{RelayClient, RetryPolicy};
pub use error::ClientError;
pub use protocol::{Request, Response, MAX_FRAME_BYTES};
pub use queue::{QueueStats, QueueStore};
pub use server::{RelayConfig, RelayServer};
