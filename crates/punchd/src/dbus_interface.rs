use crate::coordinator::Coordinator;
use punch_core::ClockAction;
use std::sync::Arc;
use zbus::interface;

/// D-Bus interface for the attendance terminal daemon.
///
/// Bus name: dev.punch.Clock1
/// Object path: /dev/punch/Clock1
///
/// Clock results and failures are both returned as JSON payloads so the CLI
/// can render them; fdo errors are reserved for transport-level problems.
pub struct ClockService {
    coordinator: Arc<Coordinator>,
    camera_device: String,
}

impl ClockService {
    pub fn new(coordinator: Arc<Coordinator>, camera_device: String) -> Self {
        Self { coordinator, camera_device }
    }

    async fn clock(&self, action: ClockAction, notes: &str) -> String {
        let notes = (!notes.is_empty()).then(|| notes.to_string());

        match self.coordinator.submit(action, notes).await {
            Ok(response) => serde_json::json!({
                "success": response.success,
                "message": response.message,
                "data": response.data,
            })
            .to_string(),
            Err(e) => {
                tracing::error!(action = %action, error = %e, "clock attempt failed");
                serde_json::json!({
                    "success": false,
                    "message": e.user_message(),
                    "detail": e.to_string(),
                })
                .to_string()
            }
        }
    }
}

#[interface(name = "dev.punch.Clock1")]
impl ClockService {
    /// Record the start of a shift. Returns a JSON result payload.
    async fn clock_in(&self, notes: &str) -> String {
        tracing::info!("clock-in requested");
        self.clock(ClockAction::ClockIn, notes).await
    }

    /// Record the end of a shift. Returns a JSON result payload.
    async fn clock_out(&self, notes: &str) -> String {
        tracing::info!("clock-out requested");
        self.clock(ClockAction::ClockOut, notes).await
    }

    /// Return daemon status information.
    async fn status(&self) -> String {
        let session = self.coordinator.session();
        serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "camera": self.camera_device,
            "employee": session.display_name,
            "role": session.role,
            "faceGating": self.coordinator.require_face(),
        })
        .to_string()
    }
}
