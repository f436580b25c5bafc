//! Capture Session State Machine
//!
//! ```text
//! Idle -> Arming -> Countdown(n) -> Captured -> Recognizing -> Resolved(move)
//!            \                          \              \
//!             +-> Failed(NoCameraAccess) +-> Failed      +-> Failed(RecognitionError)
//! ```
//!
//! Resolved and Failed are terminal. A retry is a fresh session.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::capture::camera::ImagePayload;
use crate::game::rules::Move;

/// Shown when recognition fails without a message from the service.
pub const GENERIC_RECOGNITION_FAILURE: &str = "Failed to recognize gesture. Please try again.";

/// Why a capture session failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum CaptureFailure {
    /// Camera permission was refused.
    #[error("camera access denied")]
    NoCameraAccess,

    /// No usable frame was captured.
    #[error("capture failed: {reason}")]
    CaptureError { reason: String },

    /// The recognizer could not produce a move.
    #[error("{message}")]
    RecognitionError { message: String },

    /// The session was cancelled by a match reset.
    #[error("capture cancelled")]
    Cancelled,
}

/// Capture session status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    /// Not started
    Idle,
    /// Waiting for camera permission
    Arming,
    /// Seconds until the frame is taken
    Countdown(u8),
    /// Frame taken, recognition not yet started
    Captured,
    /// Recognizer call in flight
    Recognizing,
    /// Gesture recognized
    Resolved(Move),
    /// Session aborted
    Failed(CaptureFailure),
}

impl CaptureStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaptureStatus::Resolved(_) | CaptureStatus::Failed(_))
    }
}

impl fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureStatus::Idle => f.write_str("idle"),
            CaptureStatus::Arming => f.write_str("arming"),
            CaptureStatus::Countdown(n) => write!(f, "countdown {}", n),
            CaptureStatus::Captured => f.write_str("captured"),
            CaptureStatus::Recognizing => f.write_str("recognizing"),
            CaptureStatus::Resolved(mv) => write!(f, "resolved {}", mv),
            CaptureStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// A transition was attempted from a status that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} while {from}")]
pub struct InvalidTransition {
    /// Status the session was in
    pub from: CaptureStatus,
    /// What was attempted
    pub action: &'static str,
}

/// One gesture capture attempt.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    status: CaptureStatus,
    countdown_start: u8,
    frame: Option<ImagePayload>,
}

impl CaptureSession {
    /// Create an idle session that counts down from `countdown_start`.
    pub fn new(countdown_start: u8) -> Self {
        Self {
            status: CaptureStatus::Idle,
            countdown_start,
            frame: None,
        }
    }

    /// Current status.
    pub fn status(&self) -> &CaptureStatus {
        &self.status
    }

    /// Whether the session has finished.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn invalid(&self, action: &'static str) -> InvalidTransition {
        InvalidTransition {
            from: self.status.clone(),
            action,
        }
    }

    /// `Idle -> Arming`: camera access is being requested.
    pub fn arm(&mut self) -> Result<(), InvalidTransition> {
        match self.status {
            CaptureStatus::Idle => {
                self.status = CaptureStatus::Arming;
                Ok(())
            }
            _ => Err(self.invalid("arm")),
        }
    }

    /// `Arming -> Countdown(start)`.
    pub fn access_granted(&mut self) -> Result<(), InvalidTransition> {
        match self.status {
            CaptureStatus::Arming => {
                self.status = CaptureStatus::Countdown(self.countdown_start);
                Ok(())
            }
            _ => Err(self.invalid("start countdown")),
        }
    }

    /// `Arming -> Failed(NoCameraAccess)`.
    pub fn access_denied(&mut self) -> Result<(), InvalidTransition> {
        match self.status {
            CaptureStatus::Arming => {
                self.status = CaptureStatus::Failed(CaptureFailure::NoCameraAccess);
                Ok(())
            }
            _ => Err(self.invalid("deny access")),
        }
    }

    /// `Countdown(n) -> Countdown(n - 1)`. Returns the new count.
    pub fn tick(&mut self) -> Result<u8, InvalidTransition> {
        match self.status {
            CaptureStatus::Countdown(n) if n > 0 => {
                self.status = CaptureStatus::Countdown(n - 1);
                Ok(n - 1)
            }
            _ => Err(self.invalid("tick")),
        }
    }

    /// `Countdown(0) -> Captured`, or `Failed(CaptureError)` when the frame
    /// is missing or not a self-contained image.
    pub fn capture_frame(&mut self, frame: Option<ImagePayload>) -> Result<(), InvalidTransition> {
        if self.status != CaptureStatus::Countdown(0) {
            return Err(self.invalid("capture a frame"));
        }

        self.status = match frame {
            Some(frame) if frame.is_self_contained() => {
                self.frame = Some(frame);
                CaptureStatus::Captured
            }
            Some(frame) => CaptureStatus::Failed(CaptureFailure::CaptureError {
                reason: format!("unusable frame ({}, {} bytes)", frame.mime_type, frame.bytes.len()),
            }),
            None => CaptureStatus::Failed(CaptureFailure::CaptureError {
                reason: "no frame available".to_string(),
            }),
        };
        Ok(())
    }

    /// `Captured -> Recognizing`. Hands out the frame for the single
    /// recognizer call this session is allowed.
    pub fn begin_recognition(&mut self) -> Result<ImagePayload, InvalidTransition> {
        if self.status != CaptureStatus::Captured {
            return Err(self.invalid("start recognition"));
        }
        let frame = self.frame.take().ok_or_else(|| self.invalid("start recognition"))?;
        self.status = CaptureStatus::Recognizing;
        Ok(frame)
    }

    /// `Recognizing -> Resolved(move) | Failed(reason)`.
    pub fn finish_recognition(
        &mut self,
        result: Result<Move, CaptureFailure>,
    ) -> Result<(), InvalidTransition> {
        if self.status != CaptureStatus::Recognizing {
            return Err(self.invalid("finish recognition"));
        }
        self.status = match result {
            Ok(mv) => CaptureStatus::Resolved(mv),
            Err(failure) => CaptureStatus::Failed(failure),
        };
        Ok(())
    }

    /// Abort a running session. Returns `false` if already terminal.
    pub fn cancel(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.frame = None;
        self.status = CaptureStatus::Failed(CaptureFailure::Cancelled);
        true
    }
}
