//! Error types for the notes2pdf library.
//!
//! Every failure in the pipeline is fatal: a note is a single image, so there
//! is no partial result worth keeping when one stage breaks. All of them are
//! reported through [`Notes2PdfError`] and returned as `Err` from the
//! top-level `convert*` functions.
//!
//! Three variants ([`Notes2PdfError::FileNotFound`],
//! [`Notes2PdfError::PermissionDenied`], [`Notes2PdfError::UnreadableImage`])
//! together form the "not found" kind: the input does not resolve to a
//! readable image. Use [`Notes2PdfError::is_not_found`] to test for it.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the notes2pdf library.
#[derive(Debug, Error)]
pub enum Notes2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but could not be decoded as an image.
    #[error("'{path}' is not a readable image: {detail}")]
    UnreadableImage { path: PathBuf, detail: String },

    /// The input string is empty or otherwise unusable.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    // ── Conditioning errors ───────────────────────────────────────────────
    /// The conditioned image could not be written to disk.
    #[error("Failed to write conditioned image '{path}': {detail}")]
    ImageWriteFailed { path: PathBuf, detail: String },

    // ── Recognition errors ────────────────────────────────────────────────
    /// Service-account key file is missing or malformed.
    #[error("Invalid credentials file '{path}': {detail}")]
    InvalidCredentials { path: PathBuf, detail: String },

    /// Neither credentials nor a pre-built recognizer were configured.
    #[error(
        "No Google Cloud Vision credentials configured.\n\
Set GOOGLE_APPLICATION_CREDENTIALS to a service-account key file,\n\
or GOOGLE_VISION_API_KEY to an API key."
    )]
    MissingCredentials,

    /// OAuth2 token exchange for the service account failed.
    #[error("Authentication with Google failed: {detail}")]
    Authentication { detail: String },

    /// The recognition service answered, but reported an error.
    #[error("Vision API error: {message}")]
    RecognitionService { message: String },

    /// The request never produced a usable response (network, TLS, bad JSON).
    #[error("Vision API request failed: {detail}")]
    RecognitionTransport { detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Notes2PdfError {
    /// `true` when the input path does not resolve to a readable image.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Notes2PdfError::FileNotFound { .. }
                | Notes2PdfError::PermissionDenied { .. }
                | Notes2PdfError::UnreadableImage { .. }
        )
    }
}
