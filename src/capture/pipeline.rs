//! Capture Pipeline
//!
//! Drives one `CaptureSession` against the camera and recognizer. The
//! pipeline knows nothing about the match: it returns a move or a failure
//! and reports every status change through a callback.

use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Deserialize};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::capture::camera::{Camera, CameraAccess};
use crate::capture::recognizer::{RecognitionRequest, Recognizer};
use crate::capture::session::{
    CaptureFailure, CaptureSession, CaptureStatus, InvalidTransition, GENERIC_RECOGNITION_FAILURE,
};
use crate::game::rules::{Move, Ruleset};
use crate::CAPTURE_COUNTDOWN_START;

/// Capture timing configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Countdown start value
    pub countdown_start: u8,
    /// Milliseconds per countdown step
    pub tick_interval_ms: u64,
    /// Upper bound on one recognizer call
    pub recognition_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            countdown_start: CAPTURE_COUNTDOWN_START,
            tick_interval_ms: 1000,
            recognition_timeout_ms: 15_000,
        }
    }
}

/// Camera plus recognizer, run as one capture attempt.
#[derive(Clone)]
pub struct CapturePipeline {
    camera: Arc<dyn Camera>,
    recognizer: Arc<dyn Recognizer>,
    config: CaptureConfig,
}

impl CapturePipeline {
    /// Create a pipeline.
    pub fn new(camera: Arc<dyn Camera>, recognizer: Arc<dyn Recognizer>, config: CaptureConfig) -> Self {
        Self {
            camera,
            recognizer,
            config,
        }
    }

    /// Timing configuration.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Run one capture session to completion.
    ///
    /// `on_status` sees every status the session passes through, the
    /// terminal one included.
    pub async fn run<F>(&self, ruleset: Ruleset, mut on_status: F) -> Result<Move, CaptureFailure>
    where
        F: FnMut(&CaptureStatus) + Send,
    {
        let mut session = CaptureSession::new(self.config.countdown_start);

        session.arm().map_err(internal)?;
        on_status(session.status());

        if self.camera.request_access().await == CameraAccess::Denied {
            session.access_denied().map_err(internal)?;
            on_status(session.status());
            info!("Camera access denied");
            return Err(CaptureFailure::NoCameraAccess);
        }

        session.access_granted().map_err(internal)?;
        on_status(session.status());

        let step = Duration::from_millis(self.config.tick_interval_ms);
        while session.status() != &CaptureStatus::Countdown(0) {
            sleep(step).await;
            session.tick().map_err(internal)?;
            on_status(session.status());
        }

        let frame = self.camera.current_frame().await;
        session.capture_frame(frame).map_err(internal)?;
        on_status(session.status());
        if let CaptureStatus::Failed(failure) = session.status() {
            warn!("Frame capture failed: {}", failure);
            return Err(failure.clone());
        }

        let photo = session.begin_recognition().map_err(internal)?;
        on_status(session.status());
        debug!("Recognizing frame {}", photo.fingerprint());

        let request = RecognitionRequest { photo, ruleset };
        let limit = Duration::from_millis(self.config.recognition_timeout_ms);
        let result = match timeout(limit, self.recognizer.recognize(request)).await {
            Ok(Ok(response)) => response.into_move(ruleset),
            Ok(Err(e)) => {
                warn!("Recognizer error: {}", e);
                Err(generic_failure())
            }
            Err(_) => {
                warn!("Recognizer timed out after {:?}", limit);
                Err(generic_failure())
            }
        };

        session.finish_recognition(result.clone()).map_err(internal)?;
        on_status(session.status());

        match &result {
            Ok(mv) => info!("Gesture recognized as {}", mv),
            Err(failure) => info!("Gesture recognition failed: {}", failure),
        }
        result
    }
}

fn generic_failure() -> CaptureFailure {
    CaptureFailure::RecognitionError {
        message: GENERIC_RECOGNITION_FAILURE.to_string(),
    }
}

fn internal(e: InvalidTransition) -> CaptureFailure {
    CaptureFailure::CaptureError {
        reason: e.to_string(),
    }
}
