//! Broadcast hub
//!
//! Single sink for every inbound envelope and single source of delivery. Producers
//! push into one bounded queue; one delivery loop drains it in FIFO order and hands
//! each envelope to every registered connection.

use crate::connection::{Connection, ConnectionRegistry};
use parking_lot::Mutex;
use relay_core::Envelope;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;

/// Configuration for the broadcast hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Inbound queue capacity; producers wait once it is full
    pub queue_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
        }
    }
}

impl From<&relay_common::HubSettings> for HubConfig {
    fn from(settings: &relay_common::HubSettings) -> Self {
        Self {
            queue_capacity: settings.queue_capacity,
        }
    }
}

/// Hub errors surfaced to producers
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The delivery loop is gone, e.g. its runtime shut down
    #[error("Broadcast hub is not running")]
    Closed,
}

impl From<HubError> for relay_common::AppError {
    fn from(err: HubError) -> Self {
        match err {
            HubError::Closed => Self::HubUnavailable,
        }
    }
}

/// Outcome of one delivery pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Connections the envelope was queued to
    pub delivered: usize,
    /// Connections whose send failed
    pub dropped: usize,
}

/// Fans inbound envelopes out to every registered connection
pub struct BroadcastHub {
    /// Live connections; only the hub mutates this
    registry: ConnectionRegistry,
    /// Producer side of the inbound queue
    inbound: mpsc::Sender<Envelope>,
    /// Consumer side, taken by the delivery loop on start
    queue: Mutex<Option<mpsc::Receiver<Envelope>>>,
}

impl BroadcastHub {
    /// Create a new hub; nothing is delivered until [`BroadcastHub::start`]
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        let (inbound, queue) = mpsc::channel(config.queue_capacity.max(1));

        Self {
            registry: ConnectionRegistry::new(),
            inbound,
            queue: Mutex::new(Some(queue)),
        }
    }

    /// Create a new hub wrapped in Arc
    #[must_use]
    pub fn new_shared(config: HubConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    /// Start the delivery loop
    ///
    /// Spawns a background task that runs until the last handle to the hub is dropped.
    pub fn start(self: Arc<Self>) {
        let Some(queue) = self.queue.lock().take() else {
            tracing::warn!("Broadcast hub is already running");
            return;
        };

        tokio::spawn(Self::run(Arc::downgrade(&self), queue));

        tracing::info!("Broadcast hub started");
    }

    /// Enqueue an envelope for delivery
    ///
    /// Waits while the queue is full. Before [`BroadcastHub::start`] nothing drains the
    /// queue, so once it fills this waits until the hub is started. Success means the
    /// envelope was accepted, not that anyone received it.
    pub async fn submit(&self, envelope: Envelope) -> Result<(), HubError> {
        self.inbound.send(envelope).await.map_err(|_| HubError::Closed)
    }

    /// Register a connection and mark it active
    pub fn register(&self, connection: Arc<Connection>) -> bool {
        let id = connection.id().to_string();

        if !self.registry.register(connection.clone()) {
            tracing::warn!(connection_id = %id, "Connection already registered");
            return false;
        }
        connection.activate();

        tracing::debug!(
            connection_id = %id,
            connections = self.registry.len(),
            "Connection registered"
        );

        true
    }

    /// Remove a connection and close it
    ///
    /// Returns true only for the call that actually removed it; later calls are no-ops.
    pub fn unregister(&self, id: &str) -> bool {
        match self.registry.unregister(id) {
            Some(connection) => {
                connection.close();
                tracing::debug!(
                    connection_id = %id,
                    connections = self.registry.len(),
                    "Connection unregistered"
                );
                true
            }
            None => false,
        }
    }

    /// Check if a connection is registered
    pub fn is_registered(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    /// Get the number of registered connections
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Run one delivery pass for an envelope
    ///
    /// Connections registered after the snapshot is taken do not receive it. A failed
    /// send drops that connection and the pass moves on.
    pub async fn deliver(&self, envelope: Envelope) -> DeliveryReport {
        let envelope = Arc::new(envelope);
        let recipients = self.registry.snapshot();
        let mut report = DeliveryReport::default();

        for connection in recipients {
            match connection.send(envelope.clone()).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.dropped += 1;
                    if self.unregister(connection.id()) {
                        tracing::warn!(
                            connection_id = %connection.id(),
                            error = %e,
                            "Failed to deliver envelope, dropping connection"
                        );
                    }
                }
            }
        }

        report
    }

    /// Drain the inbound queue
    ///
    /// Holds the hub weakly so dropping every other handle ends the loop.
    async fn run(hub: Weak<Self>, mut queue: mpsc::Receiver<Envelope>) {
        while let Some(envelope) = queue.recv().await {
            let Some(hub) = hub.upgrade() else {
                break;
            };
            let kind = envelope.kind().to_string();
            let report = hub.deliver(envelope).await;

            tracing::trace!(
                kind = %kind,
                delivered = report.delivered,
                dropped = report.dropped,
                "Envelope broadcast"
            );
        }

        tracing::debug!("Broadcast hub loop ended");
    }
}

impl std::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("registry", &self.registry)
            .field("running", &self.queue.lock().is_none())
            .finish()
    }
}
