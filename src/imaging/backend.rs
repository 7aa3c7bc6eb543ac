//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: identify (header probe) and crop (decode, extract, encode).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Backends work on in-memory bytes: the batch pipeline hands them a
//! read-only view of the registered source and receives a new artifact.

use super::params::CropParams;
use thiserror::Error;

/// Per-image failure. Never fatal to a batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CropError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Read the image dimensions without decoding pixel data.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, CropError>;

    /// Decode `source`, keep `params.rect`, and encode the result as JPEG.
    fn crop(&self, source: &[u8], params: &CropParams) -> Result<Vec<u8>, CropError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::calculations::compute_crop;
    use crate::imaging::params::Quality;
    use std::sync::Mutex;

    /// Sources starting with this marker fail to identify, like a corrupt file.
    pub const MALFORMED: &[u8] = b"MALFORMED";

    /// Mock backend that records operations without touching pixels.
    ///
    /// Dimensions come from `identify_results` (popped from the back) and fall
    /// back to 1600x1200. The produced artifact is `jpeg:<source>`.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Dimensions>>,
        pub fail_encode: bool,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Crop {
            source: String,
            x: u32,
            y: u32,
            width: u32,
            height: u32,
            quality: u8,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                ..Self::default()
            }
        }

        pub fn failing_encode() -> Self {
            Self {
                fail_encode: true,
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        /// Sources passed to `crop`, in call order.
        pub fn cropped_sources(&self) -> Vec<String> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Crop { source, .. } => Some(source),
                    RecordedOp::Identify(_) => None,
                })
                .collect()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, source: &[u8]) -> Result<Dimensions, CropError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(String::from_utf8_lossy(source).into_owned()));

            if source.starts_with(MALFORMED) {
                return Err(CropError::Decode("unrecognized image format".to_string()));
            }

            Ok(self
                .identify_results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Dimensions {
                    width: 1600,
                    height: 1200,
                }))
        }

        fn crop(&self, source: &[u8], params: &CropParams) -> Result<Vec<u8>, CropError> {
            self.operations.lock().unwrap().push(RecordedOp::Crop {
                source: String::from_utf8_lossy(source).into_owned(),
                x: params.rect.x,
                y: params.rect.y,
                width: params.rect.width,
                height: params.rect.height,
                quality: params.quality.value(),
            });

            if self.fail_encode {
                return Err(CropError::Encode("encoder produced no data".to_string()));
            }

            let mut artifact = b"jpeg:".to_vec();
            artifact.extend_from_slice(source);
            Ok(artifact)
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 800,
            height: 600,
        }]);

        let result = backend.identify(b"photo").unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(s) if s == "photo"));
    }

    #[test]
    fn mock_rejects_malformed_source() {
        let backend = MockBackend::new();
        let result = backend.identify(b"MALFORMED bytes");
        assert!(matches!(result, Err(CropError::Decode(_))));
    }

    #[test]
    fn mock_records_crop() {
        let backend = MockBackend::new();

        let artifact = backend
            .crop(
                b"photo",
                &CropParams {
                    rect: compute_crop(4000, 2000),
                    quality: Quality::new(90),
                },
            )
            .unwrap();

        assert_eq!(artifact, b"jpeg:photo");
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Crop {
                x: 222,
                y: 0,
                width: 3556,
                height: 2000,
                quality: 90,
                ..
            }
        ));
    }

    #[test]
    fn crop_error_messages() {
        assert_eq!(
            CropError::Decode("bad header".into()).to_string(),
            "decode failed: bad header"
        );
        assert_eq!(
            CropError::Encode("no data".into()).to_string(),
            "encode failed: no data"
        );
    }
}
