//! Shared test utilities for the photofilter test suite.
//!
//! Synthetic images so tests never depend on fixture files:
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let bytes = gradient_png(32, 24);
//! let src = RustBackend::new().decode(&bytes).unwrap();
//! ```

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Encode an RGBA bitmap as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// A `width`×`height` PNG with a red/green gradient and a fixed blue channel.
///
/// Every pixel differs from its neighbours, so blurs and edge filters have
/// something to act on.
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    encode_png(&gradient(width, height))
}

fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(2).saturating_sub(1)).min(255) as u8;
        let g = (y * 255 / height.max(2).saturating_sub(1)).min(255) as u8;
        Rgba([r, g, 96, 255])
    })
}
