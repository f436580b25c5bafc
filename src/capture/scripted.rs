//! Scripted collaborators.
//!
//! A camera and a recognizer that answer from a fixed script. Used by the
//! demo binary and by tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::capture::camera::{Camera, CameraAccess, ImagePayload};
use crate::capture::recognizer::{RecognitionRequest, RecognitionResponse, Recognizer, RecognizerError};

/// Smallest JPEG-looking frame: SOI and EOI markers.
const PLACEHOLDER_JPEG: [u8; 4] = [0xff, 0xd8, 0xff, 0xd9];

/// Camera with a fixed access answer and a fixed frame.
#[derive(Debug, Clone)]
pub struct ScriptedCamera {
    access: CameraAccess,
    frame: Option<ImagePayload>,
}

impl ScriptedCamera {
    /// Access granted, placeholder JPEG frame.
    pub fn granted() -> Self {
        Self {
            access: CameraAccess::Granted,
            frame: Some(ImagePayload::new("image/jpeg", PLACEHOLDER_JPEG.to_vec())),
        }
    }

    /// Access denied.
    pub fn denied() -> Self {
        Self {
            access: CameraAccess::Denied,
            frame: None,
        }
    }

    /// Access granted but the device never produces a frame.
    pub fn without_frame() -> Self {
        Self {
            access: CameraAccess::Granted,
            frame: None,
        }
    }

    /// Access granted with a specific frame.
    pub fn with_frame(frame: ImagePayload) -> Self {
        Self {
            access: CameraAccess::Granted,
            frame: Some(frame),
        }
    }
}

#[async_trait]
impl Camera for ScriptedCamera {
    async fn request_access(&self) -> CameraAccess {
        self.access
    }

    async fn current_frame(&self) -> Option<ImagePayload> {
        self.frame.clone()
    }
}

/// Recognizer that replays queued answers in order.
///
/// Once the script runs out every call fails with a transport error.
pub struct ScriptedRecognizer {
    responses: Mutex<VecDeque<Result<RecognitionResponse, RecognizerError>>>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl ScriptedRecognizer {
    /// Create from a script of answers.
    pub fn new(responses: Vec<Result<RecognitionResponse, RecognizerError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer each call only after `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shared call counter.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Queue another answer.
    pub async fn push(&self, response: Result<RecognitionResponse, RecognizerError>) {
        self.responses.lock().await.push_back(response);
    }
}

#[async_trait]
impl Recognizer for ScriptedRecognizer {
    async fn recognize(&self, request: RecognitionRequest) -> Result<RecognitionResponse, RecognizerError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "Scripted recognizer call {} ({}, frame {})",
            call,
            request.ruleset,
            request.photo.fingerprint()
        );

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(RecognizerError::Transport("script exhausted".to_string())))
    }
}
