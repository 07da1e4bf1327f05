//! Response body type supporting streaming, buffered, and empty modes.
//!
//! This module provides [`SseBody`], the HTTP response body used by the
//! transport service. It supports three modes:
//!
//! - **Stream**: The live event stream of a `GET /sse` session, fed by a
//!   channel. The session's guard rides inside the body so the session is
//!   torn down the moment the connection goes away.
//! - **Buffered**: For small responses such as health payloads and the
//!   `202 Accepted` acknowledgment.
//! - **Empty**: For responses with no body content.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::Full;
use tokio::sync::mpsc;

use crate::session::SessionGuard;

/// Transport response body supporting streaming, buffered, and empty modes.
///
/// Implements [`http_body::Body`] so it can be used directly with hyper
/// responses.
#[derive(Debug, Default)]
pub enum SseBody {
    /// Live event stream backed by a session channel.
    Stream {
        /// Receiving half of the session channel; each item is one
        /// already-encoded SSE frame.
        rx: mpsc::Receiver<Bytes>,
        /// Closes the session when the body is dropped.
        guard: SessionGuard,
    },
    /// Buffered body for small responses.
    Buffered(Full<Bytes>),
    /// Empty body.
    #[default]
    Empty,
}

impl SseBody {
    /// Create a streaming body from a session's receiver and guard.
    #[must_use]
    pub fn stream(rx: mpsc::Receiver<Bytes>, guard: SessionGuard) -> Self {
        Self::Stream { rx, guard }
    }

    /// Create a buffered body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// Create a buffered body from a UTF-8 string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::Buffered(Full::new(Bytes::from(s.into())))
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }
}

impl http_body::Body for SseBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Stream { rx, guard: _ } => match rx.poll_recv(cx) {
                Poll::Ready(Some(frame)) => Poll::Ready(Some(Ok(http_body::Frame::data(frame)))),
                Poll::Ready(None) => Poll::Ready(None),
                Poll::Pending => Poll::Pending,
            },
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            // A live stream's end is only known when the channel closes.
            Self::Stream { .. } => false,
            Self::Buffered(full) => full.is_end_stream(),
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Stream { .. } => http_body::SizeHint::default(),
            Self::Buffered(full) => full.size_hint(),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}
