//! Individual relay connection
//!
//! A handle onto one live WebSocket: its lifecycle state and the outbound buffer
//! drained by the socket's writer task.

use parking_lot::RwLock;
use relay_core::Envelope;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Notify};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handle created, not yet registered with the hub
    Connecting,
    /// Registered; receives broadcasts and submits inbound envelopes
    Active,
    /// Terminal
    Closed,
}

/// Per-connection send failures
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Connection is closed")]
    Closed,

    #[error("Outbound buffer stayed full for {0:?}")]
    Timeout(Duration),
}

/// A single relay connection
pub struct Connection {
    /// Unique connection ID
    id: String,

    /// Current lifecycle state
    state: RwLock<ConnectionState>,

    /// Outbound buffer drained by the writer task
    sender: mpsc::Sender<Arc<Envelope>>,

    /// Bound on a send into a full buffer
    send_timeout: Option<Duration>,

    /// Woken when the connection enters `Closed`
    close_notify: Notify,

    /// Connection creation time
    created_at: Instant,
}

impl Connection {
    /// Create a new connection in the `Connecting` state
    pub fn new(
        id: String,
        sender: mpsc::Sender<Arc<Envelope>>,
        send_timeout: Option<Duration>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            state: RwLock::new(ConnectionState::Connecting),
            sender,
            send_timeout,
            close_notify: Notify::new(),
            created_at: Instant::now(),
        })
    }

    /// Generate a new connection ID
    #[must_use]
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Get the connection ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the current state
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn is_closed(&self) -> bool {
        self.state() == ConnectionState::Closed
    }

    /// Move `Connecting` to `Active`
    ///
    /// Returns false if the connection was not in `Connecting`.
    pub fn activate(&self) -> bool {
        let mut state = self.state.write();
        if *state == ConnectionState::Connecting {
            *state = ConnectionState::Active;
            true
        } else {
            false
        }
    }

    /// Move to `Closed` and wake everything waiting in [`Connection::closed`]
    ///
    /// Returns true only for the call that performed the transition.
    pub fn close(&self) -> bool {
        {
            let mut state = self.state.write();
            if *state == ConnectionState::Closed {
                return false;
            }
            *state = ConnectionState::Closed;
        }
        self.close_notify.notify_waiters();
        true
    }

    /// Wait until the connection is closed
    pub async fn closed(&self) {
        let notified = self.close_notify.notified();
        if self.is_closed() {
            return;
        }
        notified.await;
    }

    /// Get connection age
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Queue an envelope for the writer task
    ///
    /// Suspends while the outbound buffer is full, bounded by the send timeout if one is set.
    /// A close while suspended abandons the send with [`SendError::Closed`].
    pub async fn send(&self, envelope: Arc<Envelope>) -> Result<(), SendError> {
        if self.is_closed() {
            return Err(SendError::Closed);
        }

        let queued = async {
            match self.send_timeout {
                Some(limit) => match tokio::time::timeout(limit, self.sender.send(envelope)).await {
                    Ok(result) => result.map_err(|_| SendError::Closed),
                    Err(_) => Err(SendError::Timeout(limit)),
                },
                None => self.sender.send(envelope).await.map_err(|_| SendError::Closed),
            }
        };

        tokio::select! {
            result = queued => result,
            () = self.closed() => Err(SendError::Closed),
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("created_at", &self.created_at)
            .finish()
    }
}
