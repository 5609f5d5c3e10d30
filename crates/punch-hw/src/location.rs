//! Location providers — one-shot position acquisition.
//!
//! The coordinator asks for the device position exactly once per clock
//! attempt; there is no continuous tracking. A kiosk mounted at a fixed site
//! uses [`StaticLocation`]; portable terminals use [`GeoclueLocation`] over
//! the system bus.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use zbus::zvariant::{ObjectPath, OwnedObjectPath};

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("location permission denied: {0}")]
    PermissionDenied(String),
    #[error("position unavailable: {0}")]
    Unavailable(String),
    #[error("location request timed out after {0}s")]
    Timeout(u64),
}

/// A resolved device position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in meters, when the provider reports one.
    pub accuracy_m: Option<f64>,
}

/// One-shot position read. Failure is terminal for the current clock
/// attempt; callers must not retry automatically.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn acquire(&self) -> Result<Position, LocationError>;
}

/// Fixed site coordinates from configuration.
#[derive(Debug, Clone, Copy)]
pub struct StaticLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[async_trait]
impl LocationProvider for StaticLocation {
    async fn acquire(&self) -> Result<Position, LocationError> {
        Ok(Position {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy_m: None,
        })
    }
}

#[zbus::proxy(
    interface = "org.freedesktop.GeoClue2.Manager",
    default_service = "org.freedesktop.GeoClue2",
    default_path = "/org/freedesktop/GeoClue2/Manager"
)]
trait GeoclueManager {
    fn get_client(&self) -> zbus::Result<OwnedObjectPath>;
}

#[zbus::proxy(
    interface = "org.freedesktop.GeoClue2.Client",
    default_service = "org.freedesktop.GeoClue2"
)]
trait GeoclueClient {
    fn start(&self) -> zbus::Result<()>;
    fn stop(&self) -> zbus::Result<()>;

    #[zbus(property)]
    fn desktop_id(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn set_desktop_id(&self, value: &str) -> zbus::Result<()>;

    #[zbus(signal)]
    fn location_updated(
        &self,
        old_location: ObjectPath<'_>,
        new_location: ObjectPath<'_>,
    ) -> zbus::Result<()>;
}

#[zbus::proxy(
    interface = "org.freedesktop.GeoClue2.Location",
    default_service = "org.freedesktop.GeoClue2"
)]
trait GeoclueLocationData {
    #[zbus(property)]
    fn latitude(&self) -> zbus::Result<f64>;

    #[zbus(property)]
    fn longitude(&self) -> zbus::Result<f64>;

    #[zbus(property)]
    fn accuracy(&self) -> zbus::Result<f64>;
}

/// GeoClue2-backed provider with a client-enforced timeout.
///
/// GeoClue has no timeout of its own for the first fix; without the wrapper
/// a terminal with no position source would hang a clock attempt forever.
pub struct GeoclueLocation {
    pub desktop_id: String,
    pub timeout: Duration,
}

impl GeoclueLocation {
    pub fn new(desktop_id: impl Into<String>, timeout: Duration) -> Self {
        Self { desktop_id: desktop_id.into(), timeout }
    }

    async fn acquire_inner(&self) -> Result<Position, LocationError> {
        let conn = zbus::Connection::system().await.map_err(map_zbus_err)?;

        let manager = GeoclueManagerProxy::new(&conn).await.map_err(map_zbus_err)?;
        let client_path = manager.get_client().await.map_err(map_zbus_err)?;

        let client = GeoclueClientProxy::builder(&conn)
            .path(client_path)
            .map_err(map_zbus_err)?
            .build()
            .await
            .map_err(map_zbus_err)?;

        client
            .set_desktop_id(self.desktop_id.as_str())
            .await
            .map_err(map_zbus_err)?;

        // Subscribe before Start() so the first fix cannot be missed.
        let mut updates = client
            .receive_location_updated()
            .await
            .map_err(map_zbus_err)?;
        client.start().await.map_err(map_zbus_err)?;

        let signal = updates
            .next()
            .await
            .ok_or_else(|| LocationError::Unavailable("geoclue signal stream ended".into()))?;
        let args = signal
            .args()
            .map_err(|e| LocationError::Unavailable(format!("bad LocationUpdated args: {e}")))?;

        let location = GeoclueLocationDataProxy::builder(&conn)
            .path(args.new_location.into_owned())
            .map_err(map_zbus_err)?
            .build()
            .await
            .map_err(map_zbus_err)?;

        let latitude = location.latitude().await.map_err(map_zbus_err)?;
        let longitude = location.longitude().await.map_err(map_zbus_err)?;
        let accuracy = location.accuracy().await.ok();

        // Best-effort: the fix is already in hand.
        if let Err(e) = client.stop().await {
            tracing::warn!(error = %e, "geoclue client stop failed");
        }

        tracing::debug!(latitude, longitude, ?accuracy, "geoclue position resolved");

        Ok(Position {
            latitude,
            longitude,
            accuracy_m: accuracy,
        })
    }
}

#[async_trait]
impl LocationProvider for GeoclueLocation {
    async fn acquire(&self) -> Result<Position, LocationError> {
        match tokio::time::timeout(self.timeout, self.acquire_inner()).await {
            Ok(result) => result,
            Err(_) => Err(LocationError::Timeout(self.timeout.as_secs())),
        }
    }
}

fn map_zbus_err(e: zbus::Error) -> LocationError {
    let msg = e.to_string();
    if msg.contains("AccessDenied") || msg.contains("NotAuthorized") {
        LocationError::PermissionDenied(msg)
    } else {
        LocationError::Unavailable(msg)
    }
}
