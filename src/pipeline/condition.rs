//! Image conditioning: photo → binarized image tuned for text recognition.
//!
//! Three fixed steps, always in this order:
//!
//! 1. **Grayscale** — collapse colour to a single 8-bit luma channel.
//! 2. **5×5 Gaussian blur** — suppress sensor noise and paper grain while
//!    keeping pen strokes intact. With the kernel size fixed and sigma left
//!    at zero the taps are the binomial row `[1, 4, 6, 4, 1] / 16`, applied
//!    once horizontally and once vertically.
//! 3. **Adaptive Gaussian threshold** — each pixel is compared against the
//!    Gaussian-weighted mean of its 11×11 neighbourhood minus a constant of 2.
//!    Brighter than that local threshold becomes white (255), everything else
//!    black (0). A local threshold copes with uneven lighting across a photo
//!    where a single global cutoff would wash out one side of the page.
//!
//! None of these parameters are configurable.

use crate::error::Notes2PdfError;
use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, ImageReader, Luma};
use imageproc::filter::separable_filter_equal;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Blur kernel: 5 taps, sigma derived from the size.
const BLUR_KERNEL: [f32; 5] = [0.0625, 0.25, 0.375, 0.25, 0.0625];

/// Neighbourhood edge length for the adaptive threshold.
pub const THRESHOLD_BLOCK_SIZE: usize = 11;

/// Constant subtracted from the local mean.
pub const THRESHOLD_OFFSET: i32 = 2;

/// Value written for pixels above the local threshold.
const WHITE: u8 = 255;
const BLACK: u8 = 0;

/// Condition the image at `path` and write the result as PNG to `out`.
///
/// Any file already at `out` is overwritten. Returns `out` on success.
pub fn condition(path: &Path, out: &Path) -> Result<PathBuf, Notes2PdfError> {
    let source = load_image(path)?;
    info!(
        "Conditioning {} ({}x{})",
        path.display(),
        source.width(),
        source.height()
    );

    let binary = condition_image(&source);
    drop(source);

    write_png(&binary, out)?;
    debug!("Conditioned image written to {}", out.display());
    Ok(out.to_path_buf())
}

/// Run the fixed grayscale → blur → adaptive-threshold chain in memory.
///
/// The output has the same dimensions as the input and contains only the
/// values 0 and 255.
pub fn condition_image(image: &DynamicImage) -> GrayImage {
    let gray = image.to_luma8();
    let blurred = gaussian_blur_5x5(&gray);
    adaptive_threshold_gaussian(&blurred, THRESHOLD_BLOCK_SIZE, THRESHOLD_OFFSET)
}

/// Open an image, mapping every failure onto the "not found" error kind.
fn load_image(path: &Path) -> Result<DynamicImage, Notes2PdfError> {
    if !path.is_file() {
        return Err(Notes2PdfError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let io_error = |e: std::io::Error| match e.kind() {
        std::io::ErrorKind::NotFound => Notes2PdfError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => Notes2PdfError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Notes2PdfError::UnreadableImage {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
    };

    // Sniff the content: downloaded files may carry no usable extension.
    ImageReader::open(path)
        .map_err(io_error)?
        .with_guessed_format()
        .map_err(io_error)?
        .decode()
        .map_err(|e| match e {
            image::ImageError::IoError(io) => io_error(io),
            other => Notes2PdfError::UnreadableImage {
                path: path.to_path_buf(),
                detail: other.to_string(),
            },
        })
}

fn write_png(image: &GrayImage, out: &Path) -> Result<(), Notes2PdfError> {
    let write_failed = |detail: String| Notes2PdfError::ImageWriteFailed {
        path: out.to_path_buf(),
        detail,
    };

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;
    }
    image
        .save_with_format(out, ImageFormat::Png)
        .map_err(|e| write_failed(e.to_string()))
}

/// Single-channel image with f32 samples, so filter passes do not truncate.
type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

fn to_float(gray: &GrayImage) -> FloatImage {
    FloatImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([gray.get_pixel(x, y).0[0] as f32])
    })
}

/// Round half away from zero and saturate into the 8-bit range.
fn round_to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn gaussian_blur_5x5(gray: &GrayImage) -> GrayImage {
    let blurred = separable_filter_equal(&to_float(gray), &BLUR_KERNEL);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([round_to_u8(blurred.get_pixel(x, y).0[0])])
    })
}

/// Normalised 1-D Gaussian kernel for an odd `size`, with sigma derived from
/// the size as `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size / 2) as f32;
    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let x = i as f32 - center;
            (-(x * x) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

/// Binarize against a Gaussian-weighted local mean.
///
/// A pixel is white when `pixel > mean - offset`, black otherwise. The mean
/// is accumulated in f32 and rounded once.
fn adaptive_threshold_gaussian(gray: &GrayImage, block_size: usize, offset: i32) -> GrayImage {
    let kernel = gaussian_kernel(block_size);
    let local_mean = separable_filter_equal(&to_float(gray), &kernel);

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y).0[0] as i32;
        let threshold = round_to_u8(local_mean.get_pixel(x, y).0[0]) as i32 - offset;
        Luma([if value > threshold { WHITE } else { BLACK }])
    })
}
