//! Session registry for live SSE streams.
//!
//! Each `GET /sse` connection owns one session: a bounded channel whose
//! receiving half feeds the response body and whose sending half is held
//! in the registry for `POST /messages` deliveries. A [`SessionGuard`]
//! travels inside the response body and removes the session when the
//! connection goes away. Per-session call handling is serialized through
//! the handle's dispatch gate.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

/// Frames buffered per session before senders are backpressured.
const SESSION_BUFFER: usize = 32;

/// Sending half of one live session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Bytes>,
    gate: Arc<Mutex<()>>,
}

impl SessionHandle {
    /// Deliver one encoded frame to the stream.
    ///
    /// Returns false when the stream side is gone.
    pub async fn send(&self, frame: Bytes) -> bool {
        self.tx.send(frame).await.is_ok()
    }

    /// Acquire the session's dispatch gate.
    ///
    /// Holding the guard serializes call handling within the session,
    /// so responses leave in arrival order.
    pub async fn acquire_gate(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.gate).lock_owned().await
    }

    /// A weak sender that does not keep the session's channel alive.
    ///
    /// Long-lived tasks (keepalives) hold this instead of the handle so
    /// that closing the registry actually ends the stream.
    #[must_use]
    pub fn weak_sender(&self) -> mpsc::WeakSender<Bytes> {
        self.tx.downgrade()
    }
}

/// Registry of live sessions keyed by session id.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session with a fresh id.
    ///
    /// Returns the stream's receiving half and the guard that closes the
    /// session when dropped. The sending half is reachable through
    /// [`SessionRegistry::get`] under the guard's id.
    #[must_use]
    pub fn open(&self) -> (mpsc::Receiver<Bytes>, SessionGuard) {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);

        self.sessions.insert(
            id.clone(),
            SessionHandle {
                tx,
                gate: Arc::new(Mutex::new(())),
            },
        );
        debug!(session_id = %id, "session opened");

        (
            rx,
            SessionGuard {
                registry: self.clone(),
                id,
            },
        )
    }

    /// Look up a live session by id.
    #[must_use]
    pub fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions
            .get(session_id)
            .map(|handle| handle.value().clone())
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop every session's sender, ending all streams.
    pub fn close_all(&self) {
        self.sessions.clear();
    }
}

/// Removes its session from the registry on drop.
#[derive(Debug)]
pub struct SessionGuard {
    registry: SessionRegistry,
    id: String,
}

impl SessionGuard {
    /// The id of the session this guard owns.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.sessions.remove(&self.id);
        debug!(session_id = %self.id, "session closed");
    }
}
