//! Input resolution: normalise a user-supplied path or URL to a local image.
//!
//! A URL is downloaded into a `TempDir` so the rest of the pipeline only ever
//! deals with file-system paths; the directory is removed when
//! `ResolvedInput` is dropped. Local paths are checked for existence and read
//! permission, and both kinds are sniffed for a known image signature before
//! returning so callers get a "not found" error instead of a decoder failure
//! deep inside conditioning.

use crate::error::Notes2PdfError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Bytes read from the head of a file for format sniffing.
const SNIFF_LEN: usize = 32;

/// The resolved input — either a local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; image downloaded to a temporary directory.
    /// The `TempDir` is kept alive to prevent cleanup until processing completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Get the path to the image file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local image path.
pub async fn resolve_input(input: &str) -> Result<ResolvedInput, Notes2PdfError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Notes2PdfError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input).await
    } else {
        resolve_local(Path::new(input))
    }
}

/// Resolve a local file path, validating existence and image signature.
pub fn resolve_local(path: &Path) -> Result<ResolvedInput, Notes2PdfError> {
    let path = path.to_path_buf();

    if !path.is_file() {
        return Err(Notes2PdfError::FileNotFound { path });
    }

    let mut head = Vec::with_capacity(SNIFF_LEN);
    match std::fs::File::open(&path) {
        Ok(f) => {
            f.take(SNIFF_LEN as u64)
                .read_to_end(&mut head)
                .map_err(|e| Notes2PdfError::UnreadableImage {
                    path: path.clone(),
                    detail: e.to_string(),
                })?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Notes2PdfError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Notes2PdfError::FileNotFound { path });
        }
    }

    let format = sniff_format(&path, &head)?;
    debug!("Resolved local image: {} ({:?})", path.display(), format);
    Ok(ResolvedInput::Local(path))
}

/// Guess the image format from the leading bytes.
fn sniff_format(path: &Path, head: &[u8]) -> Result<image::ImageFormat, Notes2PdfError> {
    image::guess_format(head).map_err(|e| Notes2PdfError::UnreadableImage {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Largest image accepted from a URL (50 MiB).
pub const MAX_DOWNLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str) -> Result<ResolvedInput, Notes2PdfError> {
    download_with(&reqwest::Client::new(), url, MAX_DOWNLOAD_BYTES).await
}

/// Download `url` with `client`, refusing bodies larger than `max_bytes`.
async fn download_with(
    client: &reqwest::Client,
    url: &str,
    max_bytes: u64,
) -> Result<ResolvedInput, Notes2PdfError> {
    info!("Downloading image from: {}", url);

    let download_failed = |reason: String| Notes2PdfError::DownloadFailed {
        url: url.to_string(),
        reason,
    };
    let too_large = || download_failed(format!("image is larger than {max_bytes} bytes"));

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| download_failed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(download_failed(format!("HTTP {}", response.status())));
    }
    if response.content_length().is_some_and(|len| len > max_bytes) {
        return Err(too_large());
    }

    let mut bytes: Vec<u8> = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| download_failed(e.to_string()))?
    {
        if (bytes.len() + chunk.len()) as u64 > max_bytes {
            return Err(too_large());
        }
        bytes.extend_from_slice(&chunk);
    }

    let temp_dir = TempDir::new().map_err(|e| Notes2PdfError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(extract_filename(url));

    let head = &bytes[..bytes.len().min(SNIFF_LEN)];
    sniff_format(&file_path, head)?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| Notes2PdfError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded_note".to_string()
}
