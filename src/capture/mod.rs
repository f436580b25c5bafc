//! Gesture Capture
//!
//! Camera countdown, frame capture and recognition, producing a move for
//! the round controller.
//!
//! - `session`: Capture state machine
//! - `pipeline`: Async driver over the camera and recognizer
//! - `camera`, `recognizer`: Collaborator traits
//! - `scripted`: Fixed-answer collaborators for demos and tests

pub mod camera;
pub mod recognizer;
pub mod session;
pub mod pipeline;
pub mod scripted;

pub use camera::{Camera, CameraAccess, ImagePayload};
pub use recognizer::{RecognitionRequest, RecognitionResponse, Recognizer, RecognizerError};
pub use session::{CaptureFailure, CaptureSession, CaptureStatus, InvalidTransition};
pub use pipeline::{CaptureConfig, CapturePipeline};
pub use scripted::{ScriptedCamera, ScriptedRecognizer};
