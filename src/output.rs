//! Result types returned by the conversion entry points.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a caller learns from one successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Recognized text, verbatim from the service (or the no-text sentinel).
    pub text: String,
    /// Where the PDF was written.
    pub output_path: PathBuf,
    /// Where the conditioned image was written. `None` once a temporary
    /// intermediate has been cleaned up.
    pub conditioned_path: Option<PathBuf>,
    /// Body paragraphs in the document (title and date line excluded).
    pub body_paragraphs: usize,
    /// Pages in the rendered PDF.
    pub page_count: usize,
    /// Timing breakdown.
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Delete the conditioned image if it still exists.
    ///
    /// Returns `Ok(true)` when a file was removed.
    pub fn remove_conditioned(&self) -> std::io::Result<bool> {
        match self.conditioned_path {
            Some(ref path) if path.exists() => {
                std::fs::remove_file(path)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Per-stage wall-clock timings in milliseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub condition_duration_ms: u64,
    pub recognize_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}
