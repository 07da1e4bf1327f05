//! Server-sent event framing: encoder and incremental decoder.
//!
//! The server writes [`SseEvent`] frames onto the session stream and
//! comment frames as keepalives. The client feeds raw stream chunks into
//! [`SseDecoder`], which buffers until a blank-line delimiter and yields
//! complete events. Both `\n` and `\r\n` delimited frames are accepted;
//! this end always emits `\n`.

use bytes::Bytes;

/// A single named server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type; the stream defaults to `message` when absent.
    pub event: String,
    /// Event payload. Multi-line payloads are joined with `\n`.
    pub data: String,
}

impl SseEvent {
    /// Build an event with the given type and payload.
    #[must_use]
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    /// Encode into wire bytes, one `data:` line per payload line.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut out = String::with_capacity(self.event.len() + self.data.len() + 16);
        out.push_str("event: ");
        out.push_str(&self.event);
        out.push('\n');
        for line in self.data.split('\n') {
            out.push_str("data: ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        Bytes::from(out)
    }
}

/// Comment frame sent periodically to keep idle connections open.
#[must_use]
pub fn keepalive_frame() -> Bytes {
    Bytes::from_static(b": keepalive\n\n")
}

/// Incremental decoder for an SSE byte stream.
///
/// Chunks arrive with arbitrary boundaries; the decoder buffers input and
/// emits an event for every complete data-bearing frame. Comment frames
/// and fields other than `event:` and `data:` are dropped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Create an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, returning every event completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some((end, delimiter_len)) = find_frame_end(&self.buffer) {
            if let Some(event) = parse_frame(&self.buffer[..end]) {
                events.push(event);
            }
            self.buffer.drain(..end + delimiter_len);
        }
        events
    }
}

/// Locate the earliest blank-line delimiter, returning (frame end, delimiter length).
fn find_frame_end(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n");
    let crlf = buffer.windows(4).position(|w| w == b"\r\n\r\n");
    match (lf, crlf) {
        (Some(l), Some(c)) if c < l => Some((c, 4)),
        (Some(l), _) => Some((l, 2)),
        (None, Some(c)) => Some((c, 4)),
        (None, None) => None,
    }
}

/// Parse one frame's lines; `None` for comment-only or data-less frames.
fn parse_frame(frame: &[u8]) -> Option<SseEvent> {
    let text = String::from_utf8_lossy(frame);
    let mut event: Option<String> = None;
    let mut data: Vec<&str> = Vec::new();

    for line in text.lines() {
        if let Some(value) = line.strip_prefix("event:") {
            event = Some(strip_field_space(value).to_owned());
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push(strip_field_space(value));
        }
        // Comments and other fields (id:, retry:) are ignored.
    }

    if data.is_empty() {
        return None;
    }
    Some(SseEvent {
        event: event.unwrap_or_else(|| "message".to_owned()),
        data: data.join("\n"),
    })
}

/// Drop the single optional space after a field's colon.
fn strip_field_space(value: &str) -> &str {
    value.strip_prefix(' ').unwrap_or(value)
}
