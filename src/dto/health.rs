//! Health report payload.

use serde::Serialize;
use utoipa::ToSchema;

/// Liveness report for the service and its storage backend.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall service status, `ok` or `degraded`.
    pub status: &'static str,
    /// Whether the durable store is currently reachable.
    pub storage_connected: bool,
}

impl HealthResponse {
    /// Healthy response.
    pub fn ok() -> Self {
        Self {
            status: "ok",
            storage_connected: true,
        }
    }

    /// Degraded-mode response.
    pub fn degraded() -> Self {
        Self {
            status: "degraded",
            storage_connected: false,
        }
    }
}
