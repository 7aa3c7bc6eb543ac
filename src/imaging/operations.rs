//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take settings, compute parameters, and call the backend.

use super::backend::{CropError, Dimensions, ImageBackend};
use super::calculations::{CropRect, compute_crop_with_aspect};
use super::params::{AspectRatio, CropParams, Quality};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, CropError>;

/// Settings for cropping one image.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CropSettings {
    pub aspect: AspectRatio,
    pub quality: Quality,
}

/// Probe `source` and compute its crop without touching pixel data.
pub fn plan_crop(
    backend: &impl ImageBackend,
    source: &[u8],
    aspect: AspectRatio,
) -> Result<(Dimensions, CropRect)> {
    let dims = backend.identify(source)?;
    if dims.width == 0 || dims.height == 0 {
        return Err(CropError::Decode("image has no pixels".to_string()));
    }
    let rect = compute_crop_with_aspect((dims.width, dims.height), aspect);
    Ok((dims, rect))
}

/// Center-crop `source` to the target aspect and return the encoded artifact.
///
/// The source is identified first so the geometry is fixed before the
/// backend decodes anything.
pub fn crop_to_target(
    backend: &impl ImageBackend,
    source: &[u8],
    settings: &CropSettings,
) -> Result<Vec<u8>> {
    let (_, rect) = plan_crop(backend, source, settings.aspect)?;
    backend.crop(
        source,
        &CropParams {
            rect,
            quality: settings.quality,
        },
    )
}
