//! Transport error types.
//!
//! [`TransportError`] covers faults on the server's inbound path that are
//! reported as plain HTTP statuses, before any JSON-RPC frame exists.
//! [`ClientError`] covers channel-level faults seen by
//! [`McpClient`](crate::McpClient): connection, stream, and correlation
//! failures. Tool failures never appear here; they ride inside `tools/call`
//! results.

use thiserror::Error;

use crate::message::JsonRpcError;

/// Faults on the server's inbound HTTP path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The POST body was not a parseable JSON-RPC frame.
    #[error("Could not parse message")]
    Malformed,

    /// The `session_id` query parameter was missing.
    #[error("missing session_id query parameter")]
    MissingSessionId,

    /// No live session matches the supplied id.
    #[error("unknown session: {0}")]
    UnknownSession(String),
}

impl TransportError {
    /// HTTP status this fault is reported with.
    #[must_use]
    pub fn status(&self) -> http::StatusCode {
        match self {
            Self::Malformed | Self::MissingSessionId => http::StatusCode::BAD_REQUEST,
            Self::UnknownSession(_) => http::StatusCode::NOT_FOUND,
        }
    }
}

/// Channel-level faults seen by the client.
#[derive(Debug, Error)]
pub enum ClientError {
    // -----------------------------------------------------------------------
    // Connection errors
    // -----------------------------------------------------------------------
    /// The HTTP request could not be sent or returned a bad status.
    #[error("failed to reach server: {0}")]
    Http(#[from] reqwest::Error),

    /// The server URL (or the announced endpoint) did not parse.
    #[error("invalid server URL: {0}")]
    Url(String),

    /// The stream ended before the server announced its message endpoint.
    #[error("server stream ended before announcing the message endpoint")]
    NoEndpoint,

    // -----------------------------------------------------------------------
    // Correlation errors
    // -----------------------------------------------------------------------
    /// No response arrived within the response timeout.
    #[error("timed out waiting for a response to {method}")]
    ResponseTimeout {
        /// The method that was awaiting a response.
        method: String,
    },

    /// The stream closed while a response was outstanding.
    #[error("server closed the stream before responding to {method}")]
    StreamClosed {
        /// The method that was awaiting a response.
        method: String,
    },

    /// The response result did not decode into the expected shape.
    #[error("unexpected response payload for {method}: {detail}")]
    UnexpectedPayload {
        /// The method whose response failed to decode.
        method: String,
        /// Decoder diagnostics.
        detail: String,
    },

    /// The server answered with a JSON-RPC error.
    #[error(transparent)]
    Rpc(#[from] JsonRpcError),
}

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;
