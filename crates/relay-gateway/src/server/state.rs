//! Gateway state
//!
//! Application state shared by every route.

use crate::broadcast::BroadcastHub;
use relay_common::AppConfig;
use std::sync::Arc;

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    /// Broadcast hub; owns the connection registry
    hub: Arc<BroadcastHub>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(hub: Arc<BroadcastHub>, config: AppConfig) -> Self {
        Self {
            hub,
            config: Arc::new(config),
        }
    }

    /// Get the broadcast hub
    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("hub", &self.hub)
            .field("config", &"AppConfig")
            .finish()
    }
}
