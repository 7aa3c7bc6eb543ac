//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `ImageDecoder::dimensions` + `orientation` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image` crate (pure Rust decoders) |
//! | Orientation | `DynamicImage::apply_orientation` from the EXIF tag |
//! | Crop | `image::DynamicImage::crop_imm` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! ## Orientation
//!
//! Cameras often store portrait photos as landscape pixels plus an EXIF
//! orientation tag. Both `identify` and `crop` work in display orientation:
//! the tag is applied right after decoding and `identify` reports the
//! rotated dimensions, so the planned rectangle matches the pixels that are
//! cropped. The written JPEG carries no EXIF, so its pixels are upright.

use super::backend::{CropError, Dimensions, ImageBackend};
use super::params::CropParams;
use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_err(e: image::ImageError) -> CropError {
    CropError::Decode(e.to_string())
}

fn open_decoder(source: &[u8]) -> Result<impl ImageDecoder + '_, CropError> {
    ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| CropError::Decode(e.to_string()))?
        .into_decoder()
        .map_err(decode_err)
}

/// Orientations that turn the stored raster by a quarter turn.
fn swaps_axes(orientation: Orientation) -> bool {
    matches!(
        orientation,
        Orientation::Rotate90
            | Orientation::Rotate270
            | Orientation::Rotate90FlipH
            | Orientation::Rotate270FlipH
    )
}

/// Decode an in-memory image, sniffing the format from its magic bytes, and
/// turn it upright.
fn load_image(source: &[u8]) -> Result<DynamicImage, CropError> {
    let mut decoder = open_decoder(source)?;
    // A malformed EXIF block is not worth failing the image over.
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
    img.apply_orientation(orientation);
    if img.width() == 0 || img.height() == 0 {
        return Err(CropError::Decode("image has no pixels".to_string()));
    }
    Ok(img)
}

/// Encode as baseline JPEG. Alpha is dropped since JPEG cannot carry it.
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CropError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| CropError::Encode(e.to_string()))?;
    if buf.is_empty() {
        return Err(CropError::Encode("encoder produced no data".to_string()));
    }
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<Dimensions, CropError> {
        let mut decoder = open_decoder(source)?;
        let (width, height) = decoder.dimensions();
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        if swaps_axes(orientation) {
            Ok(Dimensions {
                width: height,
                height: width,
            })
        } else {
            Ok(Dimensions { width, height })
        }
    }

    fn crop(&self, source: &[u8], params: &CropParams) -> Result<Vec<u8>, CropError> {
        let img = load_image(source)?;
        let rect = params.rect;

        if rect.x + rect.width > img.width() || rect.y + rect.height > img.height() {
            return Err(CropError::Decode(format!(
                "crop {}x{}+{}+{} exceeds decoded image {}x{}",
                rect.width,
                rect.height,
                rect.x,
                rect.y,
                img.width(),
                img.height()
            )));
        }

        let cropped = img.crop_imm(rect.x, rect.y, rect.width, rect.height);
        encode_jpeg(&cropped, params.quality.value())
    }
}
