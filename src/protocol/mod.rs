//! Wire protocol shared by client and server.
//!
//! A request or response is a single UTF-8 text line with `|`-separated
//! fields and no terminator. Both sides perform exactly one read of at most
//! [`MAX_FRAME_BYTES`]; a frame larger than that is truncated, not rejected.
//! Adding length-prefixed framing would fix this but would break every
//! existing peer, so the one-shot read stays.

/// Fixed receive buffer size on both ends of a connection.
pub const MAX_FRAME_BYTES: usize = 1024;

/// Field separator. Everything after the second separator of a PUBLISH is
/// opaque content and may itself contain the separator.
pub const DELIMITER: char = '|';

pub(crate) const PUBLISH_ACK: &str = "Mensaje recibido";
pub(crate) const EMPTY_QUEUE: &str = "No hay mensajes disponibles";
pub(crate) const INVALID_COMMAND: &str = "Comando no válido";

/// A parsed client request.
///
/// `client_id` is carried on the wire in every request but the server does
/// not interpret it; all clients share the one global queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Publish { client_id: String, content: String },
    Receive { client_id: String },
}

impl Request {
    /// Parse a raw request line. Returns `None` for an unknown command or a
    /// PUBLISH missing its content field; the server answers those with an
    /// invalid-command error rather than closing silently.
    pub fn parse(line: &str) -> Option<Request> {
        let (command, rest) = match line.split_once(DELIMITER) {
            Some((command, rest)) => (command, Some(rest)),
            None => (line, None),
        };

        match command {
            "PUBLISH" => {
                // Split once more for the client id; the remainder is opaque
                // content and is never re-split.
                let (client_id, content) = rest?.split_once(DELIMITER)?;
                Some(Request::Publish {
                    client_id: client_id.to_string(),
                    content: content.to_string(),
                })
            }
            "RECEIVE" => Some(Request::Receive {
                client_id: rest.unwrap_or("").to_string(),
            }),
            _ => None,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Request::Publish { client_id, content } => {
                format!("PUBLISH|{client_id}|{content}")
            }
            Request::Receive { client_id } => format!("RECEIVE|{client_id}"),
        }
    }
}

/// A server response: `OK|<content>` or `ERROR|<reason>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ok(String),
    Error(String),
}

impl Response {
    /// Parse a raw response line. Returns `None` when the first field is
    /// neither `OK` nor `ERROR`.
    pub fn parse(line: &str) -> Option<Response> {
        let (status, body) = line.split_once(DELIMITER)?;
        match status {
            "OK" => Some(Response::Ok(body.to_string())),
            "ERROR" => Some(Response::Error(body.to_string())),
            _ => None,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Response::Ok(content) => format!("OK|{content}"),
            Response::Error(reason) => format!("ERROR|{reason}"),
        }
    }
}
