//! Clock submission coordinator.
//!
//! Orchestrates one clock-in/out attempt: location and capture run
//! concurrently, preconditions are checked in a fixed order, the watermark
//! is composed, and the result is uploaded. All collaborators are injected
//! traits so the workflow is testable without hardware or network.

use crate::engine::{CaptureOutcome, EngineError, EngineHandle};
use async_trait::async_trait;
use chrono::Local;
use image::{DynamicImage, RgbImage};
use punch_api::client::ApiError;
use punch_api::types::{ClockRequest, ClockResponse};
use punch_api::{AttendanceClient, ReverseGeocoder};
use punch_core::types::{format_coordinates, WatermarkInput};
use punch_core::watermark::WatermarkError;
use punch_core::{ClockAction, Compositor};
use punch_hw::location::{LocationError, LocationProvider};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClockError {
    #[error("location error: {0}")]
    Location(#[from] LocationError),
    #[error("no face detected")]
    NoFaceDetected,
    #[error("capture failed: {0}")]
    Capture(#[from] EngineError),
    #[error("photo composition failed: {0}")]
    Compose(#[from] WatermarkError),
    #[error("captured photo data is invalid")]
    InvalidPhoto,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ClockError {
    /// Reduce the failure to a single user-facing sentence. `Display` keeps
    /// the internal detail for diagnostics.
    pub fn user_message(&self) -> String {
        match self {
            ClockError::Location(_) => {
                "Could not determine your location. Check location access and try again.".into()
            }
            ClockError::NoFaceDetected => {
                "No face detected. Position your face in the frame and try again.".into()
            }
            ClockError::Capture(_) => "Camera capture failed. Try again.".into(),
            ClockError::Compose(_) | ClockError::InvalidPhoto => {
                "Could not process the photo. Try again.".into()
            }
            ClockError::Api(ApiError::Api { message, .. }) => message.clone(),
            ClockError::Api(_) => {
                "Could not reach the attendance server. Check your connection.".into()
            }
        }
    }
}

/// Produces one still photo per clock attempt.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    async fn capture(&self) -> Result<CaptureOutcome, EngineError>;
}

#[async_trait]
impl PhotoSource for EngineHandle {
    async fn capture(&self) -> Result<CaptureOutcome, EngineError> {
        EngineHandle::capture(self).await
    }
}

/// Resolves a display address, never failing (fixed fallback string).
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, latitude: f64, longitude: f64) -> String;
}

#[async_trait]
impl Geocoder for ReverseGeocoder {
    async fn resolve(&self, latitude: f64, longitude: f64) -> String {
        self.lookup(latitude, longitude).await
    }
}

/// Uploads the clock record to the attendance service.
#[async_trait]
pub trait AttendanceApi: Send + Sync {
    async fn submit_clock(
        &self,
        request: &ClockRequest,
        photo_jpeg: Vec<u8>,
    ) -> Result<ClockResponse, ApiError>;
}

#[async_trait]
impl AttendanceApi for AttendanceClient {
    async fn submit_clock(
        &self,
        request: &ClockRequest,
        photo_jpeg: Vec<u8>,
    ) -> Result<ClockResponse, ApiError> {
        AttendanceClient::submit_clock(self, request, photo_jpeg).await
    }
}

/// Burns the watermark into the photo.
pub trait Composer: Send + Sync {
    fn compose(
        &self,
        photo: &DynamicImage,
        input: &WatermarkInput,
    ) -> Result<Vec<u8>, WatermarkError>;
}

impl Composer for Compositor {
    fn compose(
        &self,
        photo: &DynamicImage,
        input: &WatermarkInput,
    ) -> Result<Vec<u8>, WatermarkError> {
        Compositor::compose(self, photo, input)
    }
}

/// The authenticated employee; read-only for the workflow.
#[derive(Debug, Clone)]
pub struct Session {
    pub display_name: String,
    pub role: String,
}

pub struct Coordinator {
    location: Box<dyn LocationProvider>,
    photos: Box<dyn PhotoSource>,
    geocoder: Box<dyn Geocoder>,
    api: Box<dyn AttendanceApi>,
    composer: Box<dyn Composer>,
    session: Session,
    require_face: bool,
}

impl Coordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        location: Box<dyn LocationProvider>,
        photos: Box<dyn PhotoSource>,
        geocoder: Box<dyn Geocoder>,
        api: Box<dyn AttendanceApi>,
        composer: Box<dyn Composer>,
        session: Session,
        require_face: bool,
    ) -> Self {
        Self { location, photos, geocoder, api, composer, session, require_face }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn require_face(&self) -> bool {
        self.require_face
    }

    /// Run one clock attempt end to end.
    ///
    /// Preconditions are checked in order, short-circuiting on the first
    /// failure: location resolved, then face detected (when gating is on),
    /// then a valid composed photo. Only when all hold is the remote API
    /// called; the server alone judges geofence distance and lateness.
    pub async fn submit(
        &self,
        action: ClockAction,
        notes: Option<String>,
    ) -> Result<ClockResponse, ClockError> {
        let (location, capture) =
            tokio::join!(self.location.acquire(), self.photos.capture());

        let position = location?;
        let outcome = capture?;

        if self.require_face && !outcome.face_detected {
            return Err(ClockError::NoFaceDetected);
        }

        let frame = outcome.photo;
        let photo = RgbImage::from_raw(frame.width, frame.height, frame.rgb)
            .ok_or(ClockError::InvalidPhoto)?;

        let now = Local::now();
        let address = self
            .geocoder
            .resolve(position.latitude, position.longitude)
            .await;

        let input = WatermarkInput {
            name: self.session.display_name.clone(),
            date: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            location: address,
            coordinates: format_coordinates(position.latitude, position.longitude),
            notes,
        };

        let jpeg = self
            .composer
            .compose(&DynamicImage::ImageRgb8(photo), &input)
            .map_err(|e| {
                tracing::error!(error = %e, "watermark composition failed");
                e
            })?;

        let request = ClockRequest {
            action,
            latitude: position.latitude,
            longitude: position.longitude,
            timestamp: now.to_rfc3339(),
        };

        let response = self.api.submit_clock(&request, jpeg).await?;
        tracing::info!(
            action = %action,
            success = response.success,
            confidence = outcome.confidence,
            "clock attempt finished"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use punch_api::types::{ClockData, LocationCheck};
    use punch_hw::location::Position;
    use punch_hw::Frame;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedLocation(f64, f64);

    #[async_trait]
    impl LocationProvider for FixedLocation {
        async fn acquire(&self) -> Result<Position, LocationError> {
            Ok(Position { latitude: self.0, longitude: self.1, accuracy_m: None })
        }
    }

    struct DeniedLocation;

    #[async_trait]
    impl LocationProvider for DeniedLocation {
        async fn acquire(&self) -> Result<Position, LocationError> {
            Err(LocationError::PermissionDenied("user denied prompt".into()))
        }
    }

    struct FakePhotos {
        face_detected: bool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PhotoSource for FakePhotos {
        async fn capture(&self) -> Result<CaptureOutcome, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CaptureOutcome {
                photo: Frame {
                    rgb: vec![128u8; 4 * 4 * 3],
                    width: 4,
                    height: 4,
                    timestamp: std::time::Instant::now(),
                    sequence: 1,
                    is_dark: false,
                },
                face_detected: self.face_detected,
                confidence: if self.face_detected { 0.92 } else { 0.0 },
            })
        }
    }

    struct FakeGeocoder;

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn resolve(&self, _latitude: f64, _longitude: f64) -> String {
            "Jl. Test 1, Jakarta".into()
        }
    }

    struct FakeApi {
        calls: Arc<AtomicUsize>,
        reject: Option<(u16, String)>,
    }

    #[async_trait]
    impl AttendanceApi for FakeApi {
        async fn submit_clock(
            &self,
            request: &ClockRequest,
            photo_jpeg: Vec<u8>,
        ) -> Result<ClockResponse, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(!photo_jpeg.is_empty());
            if let Some((status, message)) = &self.reject {
                return Err(ApiError::Api { status: *status, message: message.clone() });
            }
            Ok(ClockResponse {
                success: true,
                message: "ok".into(),
                data: Some(ClockData {
                    clock_in_status: matches!(request.action, ClockAction::ClockIn)
                        .then(|| "on-time".to_string()),
                    clock_out_status: matches!(request.action, ClockAction::ClockOut)
                        .then(|| "completed".to_string()),
                    late_minutes: Some(0),
                    work_minutes: None,
                    location: Some(LocationCheck { distance: 8.0, is_valid: true }),
                }),
            })
        }
    }

    struct FakeComposer;

    impl Composer for FakeComposer {
        fn compose(
            &self,
            photo: &DynamicImage,
            _input: &WatermarkInput,
        ) -> Result<Vec<u8>, WatermarkError> {
            assert!(photo.width() > 0);
            Ok(vec![0xFF, 0xD8, 0xFF, 0xD9])
        }
    }

    struct Handles {
        photo_calls: Arc<AtomicUsize>,
        api_calls: Arc<AtomicUsize>,
    }

    fn coordinator(
        location: Box<dyn LocationProvider>,
        face_detected: bool,
        require_face: bool,
        reject: Option<(u16, String)>,
    ) -> (Coordinator, Handles) {
        let photo_calls = Arc::new(AtomicUsize::new(0));
        let api_calls = Arc::new(AtomicUsize::new(0));
        let coordinator = Coordinator::new(
            location,
            Box::new(FakePhotos { face_detected, calls: photo_calls.clone() }),
            Box::new(FakeGeocoder),
            Box::new(FakeApi { calls: api_calls.clone(), reject }),
            Box::new(FakeComposer),
            Session { display_name: "Jane Doe".into(), role: "staff".into() },
            require_face,
        );
        (coordinator, Handles { photo_calls, api_calls })
    }

    #[tokio::test]
    async fn test_clock_in_success() {
        let (coordinator, handles) =
            coordinator(Box::new(FixedLocation(-6.2, 106.8)), true, true, None);

        let response = coordinator.submit(ClockAction::ClockIn, None).await.unwrap();
        assert!(response.success);
        let data = response.data.unwrap();
        assert_eq!(data.clock_in_status.as_deref(), Some("on-time"));
        assert!(data.late_minutes.unwrap() >= 0);
        assert_eq!(handles.photo_calls.load(Ordering::SeqCst), 1);
        assert_eq!(handles.api_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_location_failure_skips_network() {
        let (coordinator, handles) = coordinator(Box::new(DeniedLocation), true, true, None);

        let err = coordinator.submit(ClockAction::ClockIn, None).await.unwrap_err();
        assert!(matches!(err, ClockError::Location(_)));
        assert_eq!(handles.api_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_location_checked_before_face() {
        // Both preconditions fail; the location error wins per ordering.
        let (coordinator, handles) = coordinator(Box::new(DeniedLocation), false, true, None);

        let err = coordinator.submit(ClockAction::ClockIn, None).await.unwrap_err();
        assert!(matches!(err, ClockError::Location(_)));
        assert_eq!(handles.api_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_face_rejected_when_gating_enabled() {
        let (coordinator, handles) =
            coordinator(Box::new(FixedLocation(-6.2, 106.8)), false, true, None);

        let err = coordinator.submit(ClockAction::ClockIn, None).await.unwrap_err();
        assert!(matches!(err, ClockError::NoFaceDetected));
        assert_eq!(handles.api_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_face_allowed_when_gating_disabled() {
        let (coordinator, _handles) =
            coordinator(Box::new(FixedLocation(-6.2, 106.8)), false, false, None);

        let response = coordinator.submit(ClockAction::ClockOut, None).await.unwrap();
        assert!(response.success);
        assert_eq!(response.data.unwrap().clock_out_status.as_deref(), Some("completed"));
    }

    #[tokio::test]
    async fn test_api_rejection_surfaced_verbatim() {
        let (coordinator, handles) = coordinator(
            Box::new(FixedLocation(-6.2, 106.8)),
            true,
            true,
            Some((422, "Outside allowed radius".into())),
        );

        let err = coordinator.submit(ClockAction::ClockIn, None).await.unwrap_err();
        match &err {
            ClockError::Api(ApiError::Api { status, message }) => {
                assert_eq!(*status, 422);
                assert_eq!(message, "Outside allowed radius");
            }
            other => panic!("expected api error, got {other:?}"),
        }
        // The server's own message is what the user sees.
        assert_eq!(err.user_message(), "Outside allowed radius");
        assert_eq!(handles.api_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_user_messages() {
        let (coordinator, _) = coordinator(Box::new(DeniedLocation), true, true, None);
        let err = coordinator.submit(ClockAction::ClockIn, None).await.unwrap_err();
        assert!(err.user_message().contains("location"));
        assert_eq!(
            ClockError::NoFaceDetected.user_message(),
            "No face detected. Position your face in the frame and try again."
        );
    }
}
