//! punch-core — Face-presence gating and photo watermarking.
//!
//! Uses SCRFD via ONNX Runtime to decide whether a face is present in a
//! captured frame, and composes the attendance watermark (identity, time,
//! location) into the photo before upload.

pub mod presence;
pub mod types;
pub mod watermark;

pub use presence::FaceDetector;
pub use types::{ClockAction, WatermarkInput};
pub use watermark::Compositor;

use std::path::PathBuf;

/// Default directory for ONNX model files (`$XDG_DATA_HOME/punch/models`).
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("punch/models")
}
