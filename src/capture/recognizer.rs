//! Gesture Recognizer Collaborator
//!
//! Turns a still frame into a move name. The wire shape follows the
//! recognition service: `{ "move": "Rock", "success": true, "errorMessage": null }`.

use async_trait::async_trait;
use serde::{Serialize, Deserialize};

use crate::capture::camera::ImagePayload;
use crate::capture::session::{CaptureFailure, GENERIC_RECOGNITION_FAILURE};
use crate::game::rules::{Move, Ruleset};

/// Request sent to the recognizer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionRequest {
    /// The captured frame
    pub photo: ImagePayload,
    /// Vocabulary the answer must come from
    pub ruleset: Ruleset,
}

/// Recognizer answer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResponse {
    /// Recognized move name, if any
    #[serde(rename = "move", default)]
    pub recognized: Option<String>,
    /// Whether recognition succeeded
    pub success: bool,
    /// Service-provided failure text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RecognitionResponse {
    /// Successful answer.
    pub fn recognized(mv: Move) -> Self {
        Self {
            recognized: Some(mv.name().to_string()),
            success: true,
            error_message: None,
        }
    }

    /// Failed answer with an optional service message.
    pub fn failed(message: Option<&str>) -> Self {
        Self {
            recognized: None,
            success: false,
            error_message: message.map(str::to_string),
        }
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self, RecognizerError> {
        serde_json::from_str(json).map_err(|e| RecognizerError::Malformed(e.to_string()))
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Interpret the answer against the active ruleset.
    ///
    /// Anything but a successful answer naming a move of `ruleset` is a
    /// recognition error.
    pub fn into_move(self, ruleset: Ruleset) -> Result<Move, CaptureFailure> {
        if !self.success {
            return Err(recognition_error(self.error_message));
        }

        match self.recognized.as_deref().and_then(Move::from_name) {
            Some(mv) if ruleset.contains(mv) => Ok(mv),
            _ => Err(recognition_error(self.error_message)),
        }
    }
}

fn recognition_error(message: Option<String>) -> CaptureFailure {
    let message = message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_RECOGNITION_FAILURE.to_string());
    CaptureFailure::RecognitionError { message }
}

/// Recognizer collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognizerError {
    /// The service could not be reached or failed mid-call.
    #[error("recognizer transport failed: {0}")]
    Transport(String),

    /// The service answered with something unreadable.
    #[error("malformed recognizer response: {0}")]
    Malformed(String),
}

/// Gesture recognition service.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Recognize the gesture in a frame.
    async fn recognize(&self, request: RecognitionRequest) -> Result<RecognitionResponse, RecognizerError>;
}
