use std::path::PathBuf;

/// Which location provider the daemon uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationProviderKind {
    /// Fixed site coordinates (wall-mounted kiosk).
    Static,
    /// GeoClue2 over the system bus (portable terminal).
    Geoclue,
}

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Directory containing the SCRFD ONNX model.
    pub model_dir: PathBuf,
    /// Attendance API base URL.
    pub api_base_url: String,
    /// Bearer token for the attendance API.
    pub api_token: Option<String>,
    /// Hard timeout for attendance API requests, in seconds.
    pub http_timeout_secs: u64,
    /// Reverse geocoder base URL (Nominatim-compatible).
    pub geocode_base_url: String,
    /// Location provider selection.
    pub location_provider: LocationProviderKind,
    /// Site coordinates for the static provider.
    pub site_latitude: f64,
    pub site_longitude: f64,
    /// Timeout for a GeoClue position fix, in seconds.
    pub location_timeout_secs: u64,
    /// Whether a detected face is required to clock in/out.
    pub require_face: bool,
    /// Number of frames to capture per clock attempt.
    pub frames_per_capture: usize,
    /// Number of warmup frames to discard at startup (camera AGC/AE stabilization).
    pub warmup_frames: usize,
    /// Watermark font path; falls back to system font discovery.
    pub font_path: Option<PathBuf>,
    /// Employee identity shown in the watermark.
    pub employee_name: String,
    pub employee_role: String,
}

impl Config {
    /// Load configuration from `PUNCH_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let model_dir = std::env::var("PUNCH_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| punch_core::default_model_dir());

        let location_provider = match std::env::var("PUNCH_LOCATION_PROVIDER").as_deref() {
            Ok("geoclue") => LocationProviderKind::Geoclue,
            _ => LocationProviderKind::Static,
        };

        Self {
            camera_device: std::env::var("PUNCH_CAMERA_DEVICE")
                .unwrap_or_else(|_| "/dev/video0".to_string()),
            model_dir,
            api_base_url: std::env::var("PUNCH_API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000/api".to_string()),
            api_token: std::env::var("PUNCH_API_TOKEN").ok(),
            http_timeout_secs: env_u64("PUNCH_HTTP_TIMEOUT_SECS", 30),
            geocode_base_url: std::env::var("PUNCH_GEOCODE_BASE_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            location_provider,
            site_latitude: env_f64("PUNCH_SITE_LAT", 0.0),
            site_longitude: env_f64("PUNCH_SITE_LON", 0.0),
            location_timeout_secs: env_u64("PUNCH_LOCATION_TIMEOUT_SECS", 10),
            require_face: std::env::var("PUNCH_REQUIRE_FACE")
                .map(|v| v != "0")
                .unwrap_or(true),
            frames_per_capture: env_usize("PUNCH_FRAMES_PER_CAPTURE", 3),
            warmup_frames: env_usize("PUNCH_WARMUP_FRAMES", 4),
            font_path: std::env::var("PUNCH_FONT_PATH").map(PathBuf::from).ok(),
            employee_name: std::env::var("PUNCH_EMPLOYEE_NAME")
                .unwrap_or_else(|_| "Unknown Employee".to_string()),
            employee_role: std::env::var("PUNCH_EMPLOYEE_ROLE")
                .unwrap_or_else(|_| "employee".to_string()),
        }
    }

    /// Path to the SCRFD detection model.
    pub fn detector_model_path(&self) -> String {
        self.model_dir
            .join("det_10g.onnx")
            .to_string_lossy()
            .into_owned()
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
