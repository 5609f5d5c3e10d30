use punch_core::presence::PresenceError;
use punch_core::FaceDetector;
use punch_hw::{Camera, CameraError, Frame};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("detector error: {0}")]
    Presence(#[from] PresenceError),
    #[error("no usable frames captured")]
    NoFrames,
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Result of one capture attempt.
///
/// Produced only after every captured frame has been through a detection
/// pass, so `face_detected` is never stale: capture is blocked until the
/// detector is ready.
pub struct CaptureOutcome {
    /// The chosen still photo (best face confidence, or the first frame when
    /// no face was found). A retry replaces the photo, never appends.
    pub photo: Frame,
    pub face_detected: bool,
    /// Confidence of the best detection (0.0 when no face).
    pub confidence: f32,
}

/// Messages sent from D-Bus handlers to the engine thread.
enum EngineRequest {
    Capture {
        reply: oneshot::Sender<Result<CaptureOutcome, EngineError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Request a capture: stream frames, gate on detection, pick the best.
    pub async fn capture(&self) -> Result<CaptureOutcome, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Capture { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// Opens the camera and loads the SCRFD model synchronously, discards warmup
/// frames, then enters a request loop. Fails fast at startup if either
/// resource is unavailable. ONNX inference is blocking, which is why the
/// camera and detector live off the async runtime.
pub fn spawn_engine(
    camera_device: &str,
    model_path: &str,
    warmup_frames: usize,
    frames_per_capture: usize,
) -> Result<EngineHandle, EngineError> {
    let camera = Camera::open(camera_device)?;
    tracing::info!(
        device = camera_device,
        width = camera.width,
        height = camera.height,
        fourcc = ?camera.fourcc,
        "camera opened"
    );

    let mut detector = FaceDetector::load(model_path)?;
    tracing::info!(path = model_path, "SCRFD detector loaded");

    // Discard warmup frames for camera AGC/AE stabilization
    if warmup_frames > 0 {
        tracing::info!(count = warmup_frames, "discarding warmup frames");
        for _ in 0..warmup_frames {
            let _ = camera.capture_frame();
        }
    }

    let (tx, mut rx) = mpsc::channel::<EngineRequest>(4);

    std::thread::Builder::new()
        .name("punch-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Capture { reply } => {
                        let result = run_capture(&camera, &mut detector, frames_per_capture);
                        let _ = reply.send(result);
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })
        .expect("failed to spawn engine thread");

    Ok(EngineHandle { tx })
}

/// Capture frames, run a detection pass on each, keep the best-face frame.
///
/// The buffer stream lives inside `capture_frames` and is released on every
/// exit path before detection even starts.
fn run_capture(
    camera: &Camera,
    detector: &mut FaceDetector,
    frames_count: usize,
) -> Result<CaptureOutcome, EngineError> {
    let (frames, dark_skipped) = camera.capture_frames(frames_count)?;
    tracing::debug!(captured = frames.len(), dark_skipped, "capture: frames acquired");

    if frames.is_empty() {
        return Err(EngineError::NoFrames);
    }

    let mut best: Option<(usize, f32)> = None;
    for (i, frame) in frames.iter().enumerate() {
        let faces = detector.detect(&frame.luma(), frame.width, frame.height)?;
        if let Some(face) = faces.first() {
            let better = best.map(|(_, c)| face.confidence > c).unwrap_or(true);
            if better {
                best = Some((i, face.confidence));
            }
        }
    }

    let outcome = match best {
        Some((idx, confidence)) => {
            tracing::info!(confidence, frame = idx, "capture: face selected");
            CaptureOutcome {
                photo: frames[idx].clone(),
                face_detected: true,
                confidence,
            }
        }
        None => {
            tracing::info!("capture: no face detected in any frame");
            CaptureOutcome {
                photo: frames[0].clone(),
                face_detected: false,
                confidence: 0.0,
            }
        }
    };

    Ok(outcome)
}
