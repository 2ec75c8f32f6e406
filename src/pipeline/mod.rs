//! Pipeline stages for note-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step so each can be
//! tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ condition ──▶ recognize ──▶ postprocess ──▶ layout ──▶ render
//! (path/URL) (binarize)    (Vision API)  (lines)         (pages)    (PDF)
//! ```
//!
//! 1. [`input`]       — canonicalise the user-supplied path or URL to a local image
//! 2. [`condition`]   — grayscale, 5×5 blur, adaptive Gaussian threshold → PNG
//! 3. [`recognize`]   — the [`recognize::TextRecognizer`] capability;
//!    [`vision`] implements it against Google Cloud Vision, with
//!    [`auth`] handling service-account tokens
//! 4. [`postprocess`] — split recognized text into clean paragraph lines
//! 5. [`layout`]      — word wrap, justification and pagination on Letter pages
//! 6. [`render`]      — assemble title/date/body and write the PDF

pub mod auth;
pub mod condition;
pub mod input;
pub mod layout;
pub mod postprocess;
pub mod recognize;
pub mod render;
pub mod vision;
