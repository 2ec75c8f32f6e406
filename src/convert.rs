//! Conversion entry points.
//!
//! [`convert`] runs the whole pipeline for one note: resolve input, condition,
//! recognize, render. [`extract_text`] stops after recognition for callers
//! that only want the text. Stages run strictly one after another; the
//! CPU-bound ones (conditioning, PDF layout) run on the blocking pool so an
//! embedding async application keeps its worker threads free.

use crate::config::{ConversionConfig, IntermediatePath};
use crate::error::Notes2PdfError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::{condition, input, recognize, render, vision};
use crate::pipeline::recognize::TextRecognizer;
use crate::progress::Stage;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, info};

/// File name used inside the temporary intermediate directory.
const TEMP_INTERMEDIATE_NAME: &str = "conditioned.png";

/// Where the conditioned image for this run lives.
///
/// For [`IntermediatePath::Temporary`] the owning `TempDir` travels with the
/// value, so the file disappears as soon as it is dropped.
#[derive(Debug)]
pub struct ConditionedImage {
    path: PathBuf,
    temp_dir: Option<TempDir>,
}

impl ConditionedImage {
    /// Pick the target path for this run.
    pub fn prepare(intermediate: &IntermediatePath) -> Result<Self, Notes2PdfError> {
        match intermediate {
            IntermediatePath::Fixed(path) => Ok(Self {
                path: path.clone(),
                temp_dir: None,
            }),
            IntermediatePath::Temporary => {
                let dir = tempfile::Builder::new()
                    .prefix("notes2pdf-")
                    .tempdir()
                    .map_err(|e| Notes2PdfError::Internal(format!("tempdir: {e}")))?;
                Ok(Self {
                    path: dir.path().join(TEMP_INTERMEDIATE_NAME),
                    temp_dir: Some(dir),
                })
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temp_dir.is_some()
    }
}

/// Convert a handwritten-note image (path or URL) into a PDF.
///
/// The PDF is written to `config.output_path`, overwriting any existing file.
/// With a fixed intermediate path the conditioned image is left in place and
/// reported in [`ConversionOutput::conditioned_path`]; removing it is up to
/// the caller (see [`ConversionOutput::remove_conditioned`]). A temporary
/// intermediate is always removed before this function returns.
///
/// # Example
/// ```rust,no_run
/// use notes2pdf::{convert, ConversionConfig, VisionCredentials};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConversionConfig::builder()
///     .credentials(VisionCredentials::ServiceAccountFile("key.json".into()))
///     .build()?;
/// let output = convert("note.jpg", &config).await?;
/// println!("{}", output.text);
/// # Ok(())
/// # }
/// ```
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Notes2PdfError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    // ── Steps 1-3: resolve, condition, recognize ─────────────────────────
    let front = recognize_input(input_str, config).await?;

    // ── Step 4: Render PDF ───────────────────────────────────────────────
    let text = front.text.clone();
    let output_path = config.output_path.clone();
    let (summary, render_duration_ms) = run_stage(config, Stage::Render, async move {
        tokio::task::spawn_blocking(move || render::render(&text, &output_path))
            .await
            .map_err(|e| Notes2PdfError::Internal(format!("Render task panicked: {}", e)))?
    })
    .await?;

    let conditioned_path = if front.conditioned.is_temporary() {
        None
    } else {
        Some(front.conditioned.path().to_path_buf())
    };
    drop(front.conditioned);

    let stats = ConversionStats {
        condition_duration_ms: front.condition_duration_ms,
        recognize_duration_ms: front.recognize_duration_ms,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} paragraphs on {} pages, {}ms total",
        summary.body_paragraphs, summary.page_count, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(&config.output_path);
    }

    Ok(ConversionOutput {
        text: front.text,
        output_path: config.output_path.clone(),
        conditioned_path,
        body_paragraphs: summary.body_paragraphs,
        page_count: summary.page_count,
        stats,
    })
}

/// Condition and recognize, without rendering a PDF.
///
/// The conditioned image follows the same placement rules as in [`convert`].
pub async fn extract_text(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<String, Notes2PdfError> {
    let front = recognize_input(input_str.as_ref(), config).await?;
    Ok(front.text)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Notes2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Notes2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// What the first half of the pipeline hands to the renderer.
struct Recognized {
    text: String,
    conditioned: ConditionedImage,
    condition_duration_ms: u64,
    recognize_duration_ms: u64,
}

async fn recognize_input(
    input_str: &str,
    config: &ConversionConfig,
) -> Result<Recognized, Notes2PdfError> {
    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str).await?;
    let source = resolved.path().to_path_buf();

    // ── Step 2: Get/create recognizer ────────────────────────────────────
    let recognizer = resolve_recognizer(config)?;
    debug!("Using recognizer '{}'", recognizer.name());

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(input_str);
    }

    // ── Step 3: Condition image ──────────────────────────────────────────
    let conditioned = ConditionedImage::prepare(&config.intermediate)?;
    let target = conditioned.path().to_path_buf();
    let (_, condition_duration_ms) = run_stage(config, Stage::Condition, async move {
        tokio::task::spawn_blocking(move || condition::condition(&source, &target))
            .await
            .map_err(|e| Notes2PdfError::Internal(format!("Condition task panicked: {}", e)))?
    })
    .await?;
    drop(resolved);

    // ── Step 4: Recognize text ───────────────────────────────────────────
    let (text, recognize_duration_ms) = run_stage(
        config,
        Stage::Recognize,
        recognize::recognize_file(&recognizer, conditioned.path()),
    )
    .await?;

    Ok(Recognized {
        text,
        conditioned,
        condition_duration_ms,
        recognize_duration_ms,
    })
}

/// Resolve the recognizer: a pre-built one wins, otherwise build the Google
/// Vision client from the configured credentials.
fn resolve_recognizer(config: &ConversionConfig) -> Result<Arc<dyn TextRecognizer>, Notes2PdfError> {
    if let Some(ref recognizer) = config.recognizer {
        return Ok(Arc::clone(recognizer));
    }
    let client = vision::GoogleVisionRecognizer::from_config(config)?;
    Ok(Arc::new(client))
}

/// Run one stage, reporting start/finish/failure and timing it.
async fn run_stage<T, F>(
    config: &ConversionConfig,
    stage: Stage,
    fut: F,
) -> Result<(T, u64), Notes2PdfError>
where
    F: Future<Output = Result<T, Notes2PdfError>>,
{
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
    let start = Instant::now();

    match fut.await {
        Ok(value) => {
            let elapsed_ms = start.elapsed().as_millis() as u64;
            debug!("{} finished in {}ms", stage, elapsed_ms);
            if let Some(ref cb) = config.progress_callback {
                cb.on_stage_complete(stage, elapsed_ms);
            }
            Ok((value, elapsed_ms))
        }
        Err(e) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_conversion_error(stage, &e.to_string());
            }
            Err(e)
        }
    }
}
