//! Configuration types for note-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The image-filter parameters and the
//! document styling are fixed; what remains configurable is *where* things
//! are written and *how* the recognition service is reached.
//!
//! Credentials are an explicit value on the config. The library never reads
//! or mutates process environment variables on its own; the CLI resolves
//! them with [`VisionCredentials::from_env`] and hands them over.

use crate::error::Notes2PdfError;
use crate::pipeline::recognize::TextRecognizer;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default location of the rendered PDF.
pub const DEFAULT_OUTPUT_PATH: &str = "handwritten_output.pdf";

/// Default location of the conditioned (binarized) image.
pub const DEFAULT_INTERMEDIATE_PATH: &str = "processed_note.png";

/// Default Google Cloud Vision REST endpoint.
pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com";

/// Env var pointing at a service-account key file.
pub const ENV_CREDENTIALS_FILE: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Env var holding a Vision API key.
pub const ENV_API_KEY: &str = "GOOGLE_VISION_API_KEY";

/// Configuration for a single note conversion.
///
/// # Example
/// ```rust
/// use notes2pdf::{ConversionConfig, IntermediatePath, VisionCredentials};
///
/// let config = ConversionConfig::builder()
///     .output_path("notes/monday.pdf")
///     .intermediate(IntermediatePath::Temporary)
///     .credentials(VisionCredentials::ServiceAccountFile("key.json".into()))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Where the PDF is written. Overwritten on every run.
    /// Default: `handwritten_output.pdf`.
    pub output_path: PathBuf,

    /// Where the conditioned image lives between conditioning and recognition.
    /// Default: `IntermediatePath::Fixed("processed_note.png")`.
    pub intermediate: IntermediatePath,

    /// Credentials for the Google Cloud Vision client.
    pub credentials: Option<VisionCredentials>,

    /// Pre-constructed recognizer. Takes precedence over `credentials`.
    pub recognizer: Option<Arc<dyn TextRecognizer>>,

    /// Vision REST endpoint (scheme + host). Default: `https://vision.googleapis.com`.
    pub endpoint: String,

    /// BCP-47 language hints forwarded in `imageContext.languageHints`.
    /// Empty lets the service auto-detect.
    pub language_hints: Vec<String>,

    /// Optional progress callback for per-stage events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            intermediate: IntermediatePath::default(),
            credentials: None,
            recognizer: None,
            endpoint: DEFAULT_VISION_ENDPOINT.to_string(),
            language_hints: Vec::new(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("output_path", &self.output_path)
            .field("intermediate", &self.intermediate)
            .field("credentials", &self.credentials)
            .field("recognizer", &self.recognizer.as_ref().map(|r| r.name().to_string()))
            .field("endpoint", &self.endpoint)
            .field("language_hints", &self.language_hints)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    pub fn intermediate(mut self, intermediate: IntermediatePath) -> Self {
        self.config.intermediate = intermediate;
        self
    }

    pub fn credentials(mut self, credentials: VisionCredentials) -> Self {
        self.config.credentials = Some(credentials);
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.config.recognizer = Some(recognizer);
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn language_hint(mut self, hint: impl Into<String>) -> Self {
        self.config.language_hints.push(hint.into());
        self
    }

    pub fn language_hints(mut self, hints: Vec<String>) -> Self {
        self.config.language_hints = hints;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Notes2PdfError> {
        let c = &self.config;
        if c.output_path.as_os_str().is_empty() {
            return Err(Notes2PdfError::InvalidConfig(
                "Output path must not be empty".into(),
            ));
        }
        if let IntermediatePath::Fixed(ref p) = c.intermediate {
            if p.as_os_str().is_empty() {
                return Err(Notes2PdfError::InvalidConfig(
                    "Intermediate image path must not be empty".into(),
                ));
            }
        }
        if !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://")) {
            return Err(Notes2PdfError::InvalidConfig(format!(
                "Endpoint must be an http(s) URL, got '{}'",
                c.endpoint
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Placement of the conditioned image handed from the conditioner to the
/// recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntermediatePath {
    /// A well-known path, overwritten by every run. Concurrent runs sharing
    /// the same path race on it.
    Fixed(PathBuf),
    /// A unique file inside a private temporary directory, removed when the
    /// conversion finishes whether it succeeded or not.
    Temporary,
}

impl Default for IntermediatePath {
    fn default() -> Self {
        IntermediatePath::Fixed(PathBuf::from(DEFAULT_INTERMEDIATE_PATH))
    }
}

/// How the Vision client authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum VisionCredentials {
    /// Path to a Google service-account key file (JSON).
    ServiceAccountFile(PathBuf),
    /// A Vision API key sent as the `key` query parameter.
    ApiKey(String),
}

impl fmt::Debug for VisionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisionCredentials::ServiceAccountFile(p) => {
                f.debug_tuple("ServiceAccountFile").field(p).finish()
            }
            VisionCredentials::ApiKey(_) => f.debug_tuple("ApiKey").field(&"<redacted>").finish(),
        }
    }
}

impl VisionCredentials {
    /// Resolve credentials from the environment.
    ///
    /// `GOOGLE_APPLICATION_CREDENTIALS` wins over `GOOGLE_VISION_API_KEY`;
    /// empty values are ignored.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        if let Some(path) = lookup(ENV_CREDENTIALS_FILE).filter(|v| !v.trim().is_empty()) {
            return Some(VisionCredentials::ServiceAccountFile(PathBuf::from(path)));
        }
        lookup(ENV_API_KEY)
            .filter(|v| !v.trim().is_empty())
            .map(VisionCredentials::ApiKey)
    }

    /// The key file path, when authenticating with a service account.
    pub fn key_file(&self) -> Option<&Path> {
        match self {
            VisionCredentials::ServiceAccountFile(p) => Some(p),
            VisionCredentials::ApiKey(_) => None,
        }
    }
}
