//! Pure calculation functions for crop geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! ## Rounding
//!
//! The extent on the cropped axis is rounded to the nearest pixel (halves away
//! from zero) and clamped to `1..=source`. The offset on that axis is
//! `(source - crop) / 2` with integer division, so any odd leftover pixel
//! goes to the bottom/right edge. [`exact_crop`] keeps the unrounded values
//! for reporting.

use super::params::AspectRatio;

/// Region of the source image to keep, in source pixel space.
///
/// `dest_width`/`dest_height` are the output canvas size. No scaling is
/// performed, so they always equal `width`/`height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub dest_width: u32,
    pub dest_height: u32,
}

impl CropRect {
    fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            dest_width: width,
            dest_height: height,
        }
    }

    /// True when the rectangle covers the whole source.
    pub fn is_full(&self, source: (u32, u32)) -> bool {
        self.x == 0 && self.y == 0 && (self.width, self.height) == source
    }
}

/// Unrounded crop geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExactCrop {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Whether the source is strictly wider than the target ratio.
///
/// Compared by cross-multiplication so an exact match is never misread as
/// wider because of floating point error.
fn is_wider(source: (u32, u32), aspect: AspectRatio) -> bool {
    let (w, h) = source;
    w as u64 * aspect.height() as u64 > h as u64 * aspect.width() as u64
}

/// Crop geometry before any rounding.
///
/// # Examples
/// ```
/// # use widecrop::imaging::{AspectRatio, exact_crop};
/// let crop = exact_crop((4000, 2000), AspectRatio::SIXTEEN_NINE);
/// assert!((crop.width - 3555.56).abs() < 0.01);
/// assert!((crop.x - 222.22).abs() < 0.01);
/// assert_eq!(crop.y, 0.0);
/// ```
pub fn exact_crop(source: (u32, u32), aspect: AspectRatio) -> ExactCrop {
    let (w, h) = (source.0 as f64, source.1 as f64);
    let (aw, ah) = (aspect.width() as f64, aspect.height() as f64);

    if is_wider(source, aspect) {
        // Too wide: trim left and right
        let width = h * aw / ah;
        ExactCrop {
            x: (w - width) / 2.0,
            y: 0.0,
            width,
            height: h,
        }
    } else {
        // Too tall (or exact): trim top and bottom
        let height = w * ah / aw;
        ExactCrop {
            x: 0.0,
            y: (h - height) / 2.0,
            width: w,
            height,
        }
    }
}

fn fit_extent(value: f64, extent: u32) -> u32 {
    (value.round() as u32).min(extent).max(1.min(extent))
}

/// Center-crop rectangle for `source` at the given aspect ratio.
///
/// # Examples
/// ```
/// # use widecrop::imaging::{AspectRatio, compute_crop_with_aspect};
/// // 4:3 portrait-ish source → trim top and bottom
/// let rect = compute_crop_with_aspect((1280, 1024), AspectRatio::SIXTEEN_NINE);
/// assert_eq!((rect.x, rect.y, rect.width, rect.height), (0, 152, 1280, 720));
/// ```
pub fn compute_crop_with_aspect(source: (u32, u32), aspect: AspectRatio) -> CropRect {
    let (w, h) = source;
    let exact = exact_crop(source, aspect);

    if is_wider(source, aspect) {
        let width = fit_extent(exact.width, w);
        CropRect::new((w - width) / 2, 0, width, h)
    } else {
        let height = fit_extent(exact.height, h);
        CropRect::new(0, (h - height) / 2, w, height)
    }
}

/// Center-crop rectangle for `width`×`height` at 16:9.
pub fn compute_crop(width: u32, height: u32) -> CropRect {
    compute_crop_with_aspect((width, height), AspectRatio::SIXTEEN_NINE)
}
