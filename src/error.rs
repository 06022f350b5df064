//! Client-side error types.
//!
//! The server itself never surfaces errors across connections; its handlers
//! log failures and keep `std::io::Result` internally. The client exposes
//! two distinct failure conditions to callers: a protocol error the server
//! answered with, and connectivity exhaustion after the retry loop gave up.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an `ERROR|...` frame (empty queue, invalid
    /// command). Carries the raw response line; never retried.
    #[error("server returned an error response: {0}")]
    Server(String),

    /// The response fit neither the `OK` nor the `ERROR` grammar.
    #[error("malformed response from server: {0:?}")]
    MalformedResponse(String),

    /// No attempt produced a response; surfaced only after the retry limit.
    #[error("no response from server after {attempts} attempt(s)")]
    Exhausted { attempts: u32 },
}
