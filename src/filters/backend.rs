//! Filter backend trait and shared types.
//!
//! The [`FilterBackend`] trait defines the three steps every render goes
//! through: decode, apply and rasterize. The pipeline never touches pixels
//! itself; it only decides *which* filter runs with *which* native inputs.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` below.

use super::params::NativeInputs;
use image::{Rgba32FImage, RgbaImage};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Filter evaluation failed: {0}")]
    Evaluation(String),
    #[error("Rasterization failed: {0}")]
    Rasterization(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// A decoded photo in linear-range RGBA floats (`0.0..=1.0`).
///
/// Cheap to clone: the pixels sit behind an `Arc` and are never mutated.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: Arc<Rgba32FImage>,
}

impl SourceImage {
    pub fn new(pixels: Rgba32FImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    pub fn pixels(&self) -> &Rgba32FImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Output of a filter before rasterization.
///
/// Samples may fall outside `0.0..=1.0` (unsharp mask overshoots at
/// edges); rasterization clamps them.
pub type FilteredImage = Rgba32FImage;

/// Trait for image-processing backends.
///
/// `Send + Sync` because decoding runs on a worker thread holding an
/// `Arc` of the backend.
pub trait FilterBackend: Send + Sync {
    /// Decode encoded bytes (JPEG, PNG, ...) into a source image.
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError>;

    /// Run the filter described by `inputs` over `source`.
    fn apply(
        &self,
        source: &SourceImage,
        inputs: &NativeInputs,
    ) -> Result<FilteredImage, BackendError>;

    /// Turn filter output into an 8-bit bitmap.
    fn rasterize(&self, filtered: &FilteredImage) -> Result<RgbaImage, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::filters::kind::FilterKind;
    use std::sync::Mutex;

    /// Mock backend that records operations instead of filtering.
    ///
    /// `decode` succeeds for any input starting with `b"IMG"` and yields a
    /// 2×1 image whose red channel is the byte after the prefix (/255).
    /// `apply` writes the native inputs into the first pixel so the
    /// rasterized output differs whenever the inputs do.
    #[derive(Default)]
    pub struct MockBackend {
        pub operations: Mutex<Vec<RecordedOp>>,
        pub fail_apply: Mutex<bool>,
        pub fail_rasterize: Mutex<bool>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(usize),
        Apply {
            kind: FilterKind,
            intensity: Option<f32>,
            radius: Option<f32>,
            scale: Option<f32>,
        },
        Rasterize {
            width: u32,
            height: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn applied(&self) -> Vec<RecordedOp> {
            self.get_operations()
                .into_iter()
                .filter(|op| matches!(op, RecordedOp::Apply { .. }))
                .collect()
        }

        pub fn set_fail_apply(&self, fail: bool) {
            *self.fail_apply.lock().unwrap() = fail;
        }

        pub fn set_fail_rasterize(&self, fail: bool) {
            *self.fail_rasterize.lock().unwrap() = fail;
        }
    }

    /// Bytes the mock decodes successfully; `tag` ends up in the red channel.
    pub fn mock_image_bytes(tag: u8) -> Vec<u8> {
        vec![b'I', b'M', b'G', tag]
    }

    impl FilterBackend for MockBackend {
        fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(bytes.len()));
            match bytes {
                [b'I', b'M', b'G', tag, ..] => {
                    let red = *tag as f32 / 255.0;
                    Ok(SourceImage::new(Rgba32FImage::from_pixel(
                        2,
                        1,
                        image::Rgba([red, 0.0, 0.0, 1.0]),
                    )))
                }
                _ => Err(BackendError::Decode("not a mock image".into())),
            }
        }

        fn apply(
            &self,
            source: &SourceImage,
            inputs: &NativeInputs,
        ) -> Result<FilteredImage, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Apply {
                kind: inputs.kind,
                intensity: inputs.intensity,
                radius: inputs.radius,
                scale: inputs.scale,
            });
            if *self.fail_apply.lock().unwrap() {
                return Err(BackendError::Evaluation("mock apply failure".into()));
            }
            let mut out = source.pixels().clone();
            let marker = image::Rgba([
                inputs.intensity.unwrap_or(0.0),
                inputs.radius.unwrap_or(0.0) / 255.0,
                inputs.scale.unwrap_or(0.0) / 255.0,
                1.0,
            ]);
            out.put_pixel(1, 0, marker);
            Ok(out)
        }

        fn rasterize(&self, filtered: &FilteredImage) -> Result<RgbaImage, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Rasterize {
                width: filtered.width(),
                height: filtered.height(),
            });
            if *self.fail_rasterize.lock().unwrap() {
                return Err(BackendError::Rasterization("mock rasterize failure".into()));
            }
            Ok(RgbaImage::from_fn(filtered.width(), filtered.height(), |x, y| {
                let p = filtered.get_pixel(x, y);
                image::Rgba(p.0.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8))
            }))
        }
    }

    #[test]
    fn mock_decodes_tagged_bytes() {
        let backend = MockBackend::new();
        let img = backend.decode(&mock_image_bytes(51)).unwrap();
        assert_eq!((img.width(), img.height()), (2, 1));
        assert!((img.pixels().get_pixel(0, 0)[0] - 0.2).abs() < 1e-6);
        assert_eq!(backend.get_operations(), vec![RecordedOp::Decode(4)]);
    }

    #[test]
    fn mock_rejects_garbage() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.decode(b"garbage"),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn mock_records_apply_inputs() {
        let backend = MockBackend::new();
        let src = backend.decode(&mock_image_bytes(0)).unwrap();
        let inputs = NativeInputs {
            kind: FilterKind::GaussianBlur,
            intensity: None,
            radius: Some(100.0),
            scale: None,
        };
        backend.apply(&src, &inputs).unwrap();
        assert_eq!(
            backend.applied(),
            vec![RecordedOp::Apply {
                kind: FilterKind::GaussianBlur,
                intensity: None,
                radius: Some(100.0),
                scale: None,
            }]
        );
    }

    #[test]
    fn source_image_clones_share_pixels() {
        let a = SourceImage::new(Rgba32FImage::new(1, 1));
        let b = a.clone();
        let c = SourceImage::new(Rgba32FImage::new(1, 1));
        assert!(Arc::ptr_eq(&a.pixels, &b.pixels));
        assert!(!Arc::ptr_eq(&a.pixels, &c.pixels));
    }
}
