use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod config;
mod coordinator;
mod dbus_interface;
mod engine;

use config::{Config, LocationProviderKind};
use coordinator::{Coordinator, Session};
use punch_api::{AttendanceClient, ReverseGeocoder};
use punch_core::{watermark, Compositor};
use punch_hw::location::{GeoclueLocation, LocationProvider, StaticLocation};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("punchd starting");

    let config = Config::from_env();

    let engine = engine::spawn_engine(
        &config.camera_device,
        &config.detector_model_path(),
        config.warmup_frames,
        config.frames_per_capture,
    )
    .context("failed to start capture engine")?;

    let font_path = config
        .font_path
        .clone()
        .or_else(watermark::find_system_font)
        .context("no watermark font found; set PUNCH_FONT_PATH")?;
    let compositor = Compositor::from_font_file(&font_path)
        .with_context(|| format!("failed to load watermark font {}", font_path.display()))?;
    tracing::info!(font = %font_path.display(), "watermark font loaded");

    let location: Box<dyn LocationProvider> = match config.location_provider {
        LocationProviderKind::Static => {
            tracing::info!(
                latitude = config.site_latitude,
                longitude = config.site_longitude,
                "using static site location"
            );
            Box::new(StaticLocation {
                latitude: config.site_latitude,
                longitude: config.site_longitude,
            })
        }
        LocationProviderKind::Geoclue => {
            tracing::info!("using GeoClue2 location provider");
            Box::new(GeoclueLocation::new(
                "dev.punch.Clock1",
                Duration::from_secs(config.location_timeout_secs),
            ))
        }
    };

    let api = AttendanceClient::new(
        config.api_base_url.clone(),
        config.api_token.clone(),
        Duration::from_secs(config.http_timeout_secs),
    )
    .context("failed to build attendance API client")?;

    let geocoder = ReverseGeocoder::new(
        config.geocode_base_url.clone(),
        Duration::from_secs(config.http_timeout_secs),
    )
    .context("failed to build reverse geocoder")?;

    let session = Session {
        display_name: config.employee_name.clone(),
        role: config.employee_role.clone(),
    };

    let coordinator = Arc::new(Coordinator::new(
        location,
        Box::new(engine),
        Box::new(geocoder),
        Box::new(api),
        Box::new(compositor),
        session,
        config.require_face,
    ));

    let service = dbus_interface::ClockService::new(coordinator, config.camera_device.clone());

    let _conn = zbus::connection::Builder::session()?
        .name("dev.punch.Clock1")?
        .serve_at("/dev/punch/Clock1", service)?
        .build()
        .await
        .context("failed to register D-Bus service")?;

    tracing::info!("punchd ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("punchd shutting down");

    Ok(())
}
