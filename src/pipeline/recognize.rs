//! Text recognition capability.
//!
//! The pipeline only depends on [`TextRecognizer`]; the Google Cloud Vision
//! client in [`crate::pipeline::vision`] is one implementation, and tests
//! substitute their own that return fixed text without touching the network.

use crate::error::Notes2PdfError;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Returned in place of text when the service finds nothing to read.
pub const NO_TEXT_DETECTED: &str = "No text detected.";

/// Something that turns encoded image bytes into text.
///
/// Implementations make exactly one recognition attempt per call: no retry,
/// no timeout override.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Recognize the text in `image` (PNG/JPEG bytes).
    ///
    /// Returns the full detected text with its line breaks, or
    /// [`NO_TEXT_DETECTED`] when there is none.
    async fn recognize(&self, image: &[u8]) -> Result<String, Notes2PdfError>;
}

/// Read the image at `path` and run it through `recognizer`.
pub async fn recognize_file(
    recognizer: &Arc<dyn TextRecognizer>,
    path: &Path,
) -> Result<String, Notes2PdfError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Notes2PdfError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Notes2PdfError::Internal(format!("Failed to read {}: {}", path.display(), e))
        }
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());

    info!("Recognizing text with {}", recognizer.name());
    let text = recognizer.recognize(&bytes).await?;
    debug!("Recognized {} chars", text.chars().count());
    Ok(text)
}

/// Apply the no-text rule to an optional service result.
pub fn text_or_sentinel(text: Option<String>) -> String {
    match text {
        Some(t) if !t.is_empty() => t,
        _ => NO_TEXT_DETECTED.to_string(),
    }
}
