//! # notes2pdf
//!
//! Turn a photographed or scanned handwritten note into a formatted PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! photo
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Condition  grayscale → 5×5 Gaussian blur → adaptive threshold (PNG)
//!  ├─ 3. Recognize  Google Cloud Vision DOCUMENT_TEXT_DETECTION
//!  └─ 4. Render     title + date + one justified paragraph per line (Letter PDF)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use notes2pdf::{convert, ConversionConfig, VisionCredentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = VisionCredentials::from_env().ok_or("no credentials")?;
//!     let config = ConversionConfig::builder().credentials(credentials).build()?;
//!     let output = convert("note.jpg", &config).await?;
//!     println!("{}", output.text);
//!     output.remove_conditioned()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Testing without the network
//!
//! Implement [`TextRecognizer`] and pass it through
//! [`ConversionConfigBuilder::recognizer`]; the rest of the pipeline runs
//! unchanged.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `notes2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

#[cfg(test)]
mod test_support;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, IntermediatePath, VisionCredentials,
    DEFAULT_INTERMEDIATE_PATH, DEFAULT_OUTPUT_PATH,
};
pub use convert::{convert, convert_sync, extract_text};
pub use error::Notes2PdfError;
pub use output::{ConversionOutput, ConversionStats};
pub use pipeline::condition::{condition, condition_image};
pub use pipeline::recognize::{recognize_file, TextRecognizer, NO_TEXT_DETECTED};
pub use pipeline::render::{build_content, render, DocumentContent, DOCUMENT_TITLE};
pub use pipeline::vision::GoogleVisionRecognizer;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
