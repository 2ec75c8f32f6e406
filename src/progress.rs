//! Progress-callback trait for per-stage conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its three stages.
//!
//! # Example
//!
//! ```rust
//! use notes2pdf::{ConversionConfig, ConversionProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct StageLogger;
//!
//! impl ConversionProgressCallback for StageLogger {
//!     fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
//!         eprintln!("{stage} done in {elapsed_ms}ms");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(StageLogger) as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// The three pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Grayscale, blur and adaptive threshold.
    Condition,
    /// Document-text detection on the conditioned image.
    Recognize,
    /// PDF layout and write.
    Render,
}

impl Stage {
    /// Human-readable label used by progress UIs.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Condition => "Conditioning image",
            Stage::Recognize => "Recognizing text",
            Stage::Render => "Rendering PDF",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Called by the conversion pipeline as it runs.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because the
/// config that carries them is shared across blocking tasks.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once the input has been resolved, before any stage runs.
    fn on_conversion_start(&self, input: &str) {
        let _ = input;
    }

    /// Called just before a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when a stage fails. The error is still returned to the caller.
    fn on_conversion_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once after the PDF has been written.
    fn on_conversion_complete(&self, output_path: &Path) {
        let _ = output_path;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ConversionProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start {stage:?}"));
        }

        fn on_stage_complete(&self, stage: Stage, _elapsed_ms: u64) {
            self.events.lock().unwrap().push(format!("done {stage:?}"));
        }

        fn on_conversion_error(&self, stage: Stage, error: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("error {stage:?}: {error}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start("note.png");
        cb.on_stage_start(Stage::Condition);
        cb.on_stage_complete(Stage::Condition, 12);
        cb.on_conversion_error(Stage::Recognize, "boom");
        cb.on_conversion_complete(Path::new("out.pdf"));
    }

    #[test]
    fn recorder_sees_events_in_order() {
        let rec = Recorder::default();
        rec.on_stage_start(Stage::Condition);
        rec.on_stage_complete(Stage::Condition, 5);
        rec.on_stage_start(Stage::Recognize);
        rec.on_conversion_error(Stage::Recognize, "quota exceeded");

        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "start Condition",
                "done Condition",
                "start Recognize",
                "error Recognize: quota exceeded",
            ]
        );
    }

    #[test]
    fn stage_labels() {
        assert_eq!(Stage::Render.to_string(), "Rendering PDF");
        assert_eq!(Stage::Condition.label(), "Conditioning image");
    }
}
