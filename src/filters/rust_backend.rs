//! Pure Rust filter backend built on the `image` and `photon-rs` crates.
//!
//! ## Crate mapping
//!
//! | Step | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` |
//! | Gaussian Blur | `image::imageops::blur` |
//! | Unsharp Mask | `image::imageops::blur`, then `src + k(src − blurred)` |
//! | Sepia | `photon_rs::monochrome::sepia`, blended by intensity |
//! | Edges | `photon_rs::conv::edge_detection`, scaled by intensity |
//! | Pixellate | `photon_rs::effects::pixelize` |
//! | Vignette, Crystallize | per-pixel and Voronoi cell code in [`effects`](super::effects) |
//! | Rasterize | clamp + round to 8-bit RGBA |
//! | Encode (share) | `image::RgbaImage::save_with_format`, format from extension |
//!
//! Native inputs a filter needs but did not receive fall back to the
//! defaults the filters ship with (intensity 1, radius 10, scale 8).

use super::backend::{BackendError, FilterBackend, FilteredImage, SourceImage};
use super::effects;
use super::kind::{FilterKind, ParamName};
use super::params::NativeInputs;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::path::Path;

const DEFAULT_INTENSITY: f32 = 1.0;
const DEFAULT_RADIUS: f32 = 10.0;
const DEFAULT_SCALE: f32 = 8.0;

/// Output extensions [`save_image`] can encode.
const OUTPUT_FORMATS: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

/// Returns the file extensions a rendered image can be saved as.
fn supported_output_extensions() -> Vec<&'static str> {
    OUTPUT_FORMATS.iter().map(|(ext, _)| *ext).collect()
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-step mapping.
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

impl FilterBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| BackendError::Decode(format!("Failed to decode image: {e}")))?;
        Ok(SourceImage::new(img.into_rgba32f()))
    }

    fn apply(
        &self,
        source: &SourceImage,
        inputs: &NativeInputs,
    ) -> Result<FilteredImage, BackendError> {
        let intensity = inputs.get_or(ParamName::Intensity, DEFAULT_INTENSITY);
        let radius = inputs.get_or(ParamName::Radius, DEFAULT_RADIUS);
        let scale = inputs.get_or(ParamName::Scale, DEFAULT_SCALE);
        for (name, value) in [("intensity", intensity), ("radius", radius), ("scale", scale)] {
            if !value.is_finite() {
                return Err(BackendError::Evaluation(format!(
                    "{} received non-finite {name}",
                    inputs.kind
                )));
            }
        }

        let src = source.pixels();
        let out = match inputs.kind {
            FilterKind::Sepia => effects::sepia(src, intensity),
            FilterKind::Crystallize => effects::crystallize(src, radius),
            FilterKind::Edges => effects::edges(src, intensity),
            FilterKind::GaussianBlur => effects::gaussian_blur(src, radius),
            FilterKind::Pixellate => effects::pixellate(src, scale),
            FilterKind::UnsharpMask => effects::unsharp_mask(src, intensity, radius),
            FilterKind::Vignette => effects::vignette(src, intensity, radius),
        };
        Ok(out)
    }

    fn rasterize(&self, filtered: &FilteredImage) -> Result<RgbaImage, BackendError> {
        let (w, h) = filtered.dimensions();
        if w == 0 || h == 0 {
            return Err(BackendError::Rasterization(format!(
                "empty extent ({w}x{h})"
            )));
        }
        if filtered.as_raw().iter().any(|v| !v.is_finite()) {
            return Err(BackendError::Rasterization(
                "filter produced non-finite samples".into(),
            ));
        }
        let bytes: Vec<u8> = filtered
            .as_raw()
            .iter()
            .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect();
        RgbaImage::from_raw(w, h, bytes).ok_or_else(|| {
            BackendError::Rasterization("pixel buffer does not match extent".into())
        })
    }
}

/// Save a rendered bitmap, inferring the format from the extension.
///
/// JPEG has no alpha channel, so it is dropped before encoding.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<(), BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let format = OUTPUT_FORMATS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, f)| *f)
        .ok_or_else(|| {
            BackendError::Encode(format!(
                "Unsupported output format: {ext} (expected one of {})",
                supported_output_extensions().join(", ")
            ))
        })?;

    let result = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgba8(img.clone())
            .to_rgb8()
            .save_with_format(path, format),
        _ => img.save_with_format(path, format),
    };
    result.map_err(|e| BackendError::Encode(format!("Failed to write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{encode_png, gradient_png};
    use image::{Rgba, Rgba32FImage};

    fn inputs(kind: FilterKind, intensity: f32) -> NativeInputs {
        crate::filters::FilterParameters {
            intensity,
            ..Default::default()
        }
        .native_inputs(kind, &crate::filters::Scaling::default())
    }

    #[test]
    fn output_extensions_cover_common_formats() {
        let exts = supported_output_extensions();
        for expected in ["png", "jpg", "jpeg", "tif", "tiff", "webp"] {
            assert!(exts.contains(&expected), "expected {expected}");
        }
    }

    #[test]
    fn decode_png() {
        let backend = RustBackend::new();
        let img = backend.decode(&gradient_png(24, 16)).unwrap();
        assert_eq!((img.width(), img.height()), (24, 16));
    }

    #[test]
    fn decode_garbage_errors() {
        let backend = RustBackend::new();
        assert!(matches!(
            backend.decode(b"definitely not an image"),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn decode_empty_errors() {
        assert!(RustBackend::new().decode(&[]).is_err());
    }

    #[test]
    fn every_filter_renders_at_source_size() {
        let backend = RustBackend::new();
        let src = backend.decode(&gradient_png(20, 12)).unwrap();
        for kind in FilterKind::ALL {
            let out = backend.apply(&src, &inputs(kind, 0.5)).unwrap();
            let raster = backend.rasterize(&out).unwrap();
            assert_eq!(raster.dimensions(), (20, 12), "{kind:?}");
        }
    }

    #[test]
    fn rasterize_round_trips_8bit_input() {
        let backend = RustBackend::new();
        let original = RgbaImage::from_fn(5, 3, |x, y| Rgba([x as u8 * 40, y as u8 * 90, 7, 255]));
        let src = backend.decode(&encode_png(&original)).unwrap();
        let raster = backend.rasterize(src.pixels()).unwrap();
        assert_eq!(raster, original);
    }

    #[test]
    fn rasterize_clamps_overshoot() {
        let backend = RustBackend::new();
        let img = Rgba32FImage::from_pixel(1, 1, Rgba([1.7, -0.3, 0.5, 1.0]));
        let raster = backend.rasterize(&img).unwrap();
        assert_eq!(raster.get_pixel(0, 0).0, [255, 0, 128, 255]);
    }

    #[test]
    fn rasterize_rejects_empty_extent() {
        let backend = RustBackend::new();
        assert!(matches!(
            backend.rasterize(&Rgba32FImage::new(0, 0)),
            Err(BackendError::Rasterization(_))
        ));
    }

    #[test]
    fn rasterize_rejects_nan() {
        let backend = RustBackend::new();
        let img = Rgba32FImage::from_pixel(2, 2, Rgba([f32::NAN, 0.0, 0.0, 1.0]));
        assert!(backend.rasterize(&img).is_err());
    }

    #[test]
    fn apply_rejects_non_finite_inputs() {
        let backend = RustBackend::new();
        let src = backend.decode(&gradient_png(4, 4)).unwrap();
        let bad = NativeInputs {
            kind: FilterKind::GaussianBlur,
            intensity: None,
            radius: Some(f32::INFINITY),
            scale: None,
        };
        assert!(matches!(
            backend.apply(&src, &bad),
            Err(BackendError::Evaluation(_))
        ));
    }

    #[test]
    fn save_png_and_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let img = RgbaImage::from_pixel(8, 8, Rgba([200, 100, 50, 255]));
        for name in ["out.png", "out.jpg", "out.webp"] {
            let path = tmp.path().join(name);
            save_image(&img, &path).unwrap();
            assert!(std::fs::metadata(&path).unwrap().len() > 0, "{name}");
        }
    }

    #[test]
    fn save_unknown_extension_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let img = RgbaImage::new(2, 2);
        let msg = match save_image(&img, &tmp.path().join("out.bmp")) {
            Err(BackendError::Encode(msg)) => msg,
            other => panic!("expected an encode error, got {other:?}"),
        };
        assert!(msg.contains("bmp"), "{msg}");
        assert!(msg.contains("png, jpg, jpeg, tif, tiff, webp"), "{msg}");
    }
}
