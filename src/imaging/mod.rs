//! Image processing, pure Rust and statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Crop geometry** | [`compute_crop`] (pure) |
//! | **Crop → JPEG** | `crop_imm` + `JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop geometry (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{CropError, Dimensions, ImageBackend};
pub use calculations::{CropRect, ExactCrop, compute_crop, compute_crop_with_aspect, exact_crop};
pub use operations::{CropSettings, crop_to_target, plan_crop};
pub use params::{AspectRatio, CropParams, Quality};
pub use rust_backend::{RustBackend, supported_input_extensions};
