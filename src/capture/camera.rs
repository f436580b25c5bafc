//! Camera Collaborator
//!
//! Access request and still-frame capture. Implementations live outside
//! the engine; `capture::scripted` has one for demos and tests.

use async_trait::async_trait;
use serde::{Serialize, Deserialize};

use crate::core::hash::hash_bytes;

/// A still frame as an encoded image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// MIME type, e.g. `image/jpeg`
    pub mime_type: String,
    /// Encoded image bytes
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    /// Create a payload.
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Whether the payload carries a self-contained encoded image.
    ///
    /// Remote references (URLs) and empty frames are not accepted.
    pub fn is_self_contained(&self) -> bool {
        !self.bytes.is_empty() && self.mime_type.starts_with("image/")
    }

    /// Short hex fingerprint for logs.
    pub fn fingerprint(&self) -> String {
        let digest = hash_bytes(&self.bytes);
        hex::encode(&digest[..8])
    }
}

/// Result of a camera access request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraAccess {
    /// Frames may be taken
    Granted,
    /// User or platform refused
    Denied,
}

/// Camera device.
#[async_trait]
pub trait Camera: Send + Sync {
    /// Ask for permission to use the camera.
    async fn request_access(&self) -> CameraAccess;

    /// Take one still frame. `None` if the device produced nothing.
    async fn current_frame(&self) -> Option<ImagePayload>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_contained_payload() {
        assert!(ImagePayload::new("image/png", vec![0x89, 0x50]).is_self_contained());
        assert!(!ImagePayload::new("image/png", Vec::new()).is_self_contained());
        assert!(!ImagePayload::new("text/uri-list", b"https://example.org/a.jpg".to_vec())
            .is_self_contained());
    }

    #[test]
    fn test_fingerprint() {
        let a = ImagePayload::new("image/jpeg", vec![1, 2, 3]);
        let b = ImagePayload::new("image/jpeg", vec![1, 2, 4]);

        assert_eq!(a.fingerprint().len(), 16);
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
