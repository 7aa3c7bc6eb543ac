//! # widecrop
//!
//! Batch center-cropper. Every input image is cut to the largest centered
//! 16:9 region (no scaling), re-encoded as JPEG, and the results are bundled
//! into a single ZIP archive.
//!
//! # Architecture: Session, Run, Package
//!
//! ```text
//! 1. Ingest   files     →  BatchSession   (pending items, source handles)
//! 2. Run      session   →  artifacts      (one item at a time, events out)
//! 3. Package  done items →  archive.zip   (original names under one folder)
//! ```
//!
//! The session is the single owner of item state and binary payloads. Front
//! ends never touch bytes directly; they hold opaque [`resources::Handle`]s and
//! watch [`batch::BatchEvent`]s.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`batch`] | Work items, status machine, sequential run loop, progress events |
//! | [`imaging`] | Crop geometry and the pure-Rust decode/crop/JPEG backend |
//! | [`archive`] | Packages done artifacts into a ZIP under a fixed folder |
//! | [`resources`] | Handle registry for source and artifact bytes |
//! | [`config`] | `widecrop.toml` loading, validation, and merging |
//! | [`scan`] | Turns command-line paths into source files |
//! | [`output`] | CLI output formatting for run events and crop plans |
//!
//! # Design Decisions
//!
//! ## Crop, Never Scale
//!
//! Output pixels are a subset of input pixels. The crop keeps the full extent
//! of the axis that is already "short" for the target ratio and trims the
//! other axis equally from both sides. Images already at the ratio pass
//! through unchanged apart from JPEG re-encoding.
//!
//! ## One Item At A Time
//!
//! Items run strictly in order with one decode buffer alive at a time, which
//! keeps memory flat for large photos and makes progress reporting exact.
//!
//! ## Failures Stay Local
//!
//! A corrupt or unsupported image marks only its own item as `error`. The run
//! continues and every other image is still packaged.

pub mod archive;
pub mod batch;
pub mod config;
pub mod imaging;
pub mod output;
pub mod resources;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
