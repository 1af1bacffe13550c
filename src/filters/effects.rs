//! Pixel math for the built-in filters.
//!
//! Every function takes a float RGBA image (`0.0..=1.0` per channel) and
//! returns a new one; nothing is modified in place. All of them are
//! deterministic: the same input and parameters give bit-identical output.
//!
//! Gaussian blur (and the blur inside unsharp mask) is `image::imageops::blur`.
//! Sepia, edges and pixellate run through `photon_rs` on an 8-bit copy and
//! come back as floats; sepia and edges are then scaled by intensity.
//! Vignette and crystallize are computed here, row-parallel with rayon.
//!
//! Alpha passes through unchanged, except in blur, pixellate and
//! crystallize, which carry it along with the colour.

use image::Rgba32FImage;
use photon_rs::{PhotonImage, conv, effects, monochrome};
use rayon::prelude::*;

const CHANNELS: usize = 4;

/// Fixed seed for the crystallize cell jitter.
const CRYSTALLIZE_SEED: u32 = 0x5EED_C0DE;

// ============================================================================
// Shared helpers
// ============================================================================

/// Per-pixel transform, parallel by row. `f` gets (x, y, rgba) and returns
/// the new rgba.
fn map_pixels<F>(src: &Rgba32FImage, f: F) -> Rgba32FImage
where
    F: Fn(u32, u32, [f32; 4]) -> [f32; 4] + Sync,
{
    let (w, h) = src.dimensions();
    let mut out = Rgba32FImage::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }
    let stride = w as usize * CHANNELS;
    let src_raw: &[f32] = src.as_raw();

    out.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let row_in = &src_raw[y * stride..(y + 1) * stride];
            for x in 0..w as usize {
                let i = x * CHANNELS;
                let px = [row_in[i], row_in[i + 1], row_in[i + 2], row_in[i + 3]];
                row_out[i..i + CHANNELS].copy_from_slice(&f(x as u32, y as u32, px));
            }
        });
    out
}

/// 8-bit copy of `src` for photon.
fn to_photon(src: &Rgba32FImage) -> PhotonImage {
    let raw = src
        .as_raw()
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();
    PhotonImage::new(raw, src.width(), src.height())
}

/// Photon's pixels back in float range, row-major.
fn photon_pixels(img: &PhotonImage) -> Vec<[f32; 4]> {
    img.get_raw_pixels()
        .chunks_exact(CHANNELS)
        .map(|p| [p[0], p[1], p[2], p[3]].map(|v| v as f32 / 255.0))
        .collect()
}

/// Run a photon effect over an 8-bit copy of `src` and return its pixels.
fn with_photon(src: &Rgba32FImage, effect: impl FnOnce(&mut PhotonImage)) -> Vec<[f32; 4]> {
    let mut img = to_photon(src);
    effect(&mut img);
    photon_pixels(&img)
}

fn is_empty(src: &Rgba32FImage) -> bool {
    src.width() == 0 || src.height() == 0
}

#[inline]
fn hash_u32(mut x: u32) -> u32 {
    x = x.wrapping_mul(0x9E37_79B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EB_CA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2_AE35);
    x ^= x >> 16;
    x
}

/// Hash a grid coordinate to `[0, 1)`.
#[inline]
fn hash_unit(x: u32, y: u32, seed: u32) -> f32 {
    let h = hash_u32(
        x.wrapping_mul(374_761_393)
            .wrapping_add(y.wrapping_mul(668_265_263))
            .wrapping_add(seed),
    );
    (h & 0x00FF_FFFF) as f32 / 16_777_216.0
}

// ============================================================================
// Colour
// ============================================================================

/// Blend each pixel toward photon's sepia tone by `intensity`.
pub fn sepia(src: &Rgba32FImage, intensity: f32) -> Rgba32FImage {
    let t = intensity.clamp(0.0, 1.0);
    if t == 0.0 || is_empty(src) {
        return src.clone();
    }
    let toned = with_photon(src, monochrome::sepia);
    let w = src.width();
    map_pixels(src, |x, y, [r, g, b, a]| {
        let [tr, tg, tb, _] = toned[(y * w + x) as usize];
        [
            r + (tr - r) * t,
            g + (tg - g) * t,
            b + (tb - b) * t,
            a,
        ]
    })
}

/// Darken toward the corners.
///
/// `radius` is the reach of the falloff as a percentage of the
/// centre-to-corner distance: at 100 the corners reach full strength, at 50
/// full strength is reached halfway out.
pub fn vignette(src: &Rgba32FImage, intensity: f32, radius: f32) -> Rgba32FImage {
    let (w, h) = src.dimensions();
    let cx = w as f32 / 2.0;
    let cy = h as f32 / 2.0;
    let max_dist = (cx * cx + cy * cy).sqrt().max(f32::EPSILON);
    let reach = (radius / 100.0).max(0.01);

    map_pixels(src, |x, y, [r, g, b, a]| {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        let d = (dx * dx + dy * dy).sqrt() / max_dist;
        let falloff = (d / reach).min(1.0);
        let factor = (1.0 - intensity * falloff * falloff).clamp(0.0, 1.0);
        [r * factor, g * factor, b * factor, a]
    })
}

// ============================================================================
// Convolution
// ============================================================================

/// Photon's 3×3 edge-detection kernel per colour channel, scaled by
/// `intensity`. The outermost ring of pixels comes back black.
pub fn edges(src: &Rgba32FImage, intensity: f32) -> Rgba32FImage {
    if is_empty(src) {
        return src.clone();
    }
    let edge = with_photon(src, conv::edge_detection);
    let w = src.width();
    map_pixels(src, |x, y, [_, _, _, a]| {
        let [r, g, b, _] = edge[(y * w + x) as usize];
        [r * intensity, g * intensity, b * intensity, a]
    })
}

/// Gaussian blur with standard deviation `sigma`, clamp-to-edge.
///
/// `sigma <= 0` returns the image unchanged.
pub fn gaussian_blur(src: &Rgba32FImage, sigma: f32) -> Rgba32FImage {
    if sigma.is_nan() || sigma <= 0.0 || is_empty(src) {
        return src.clone();
    }
    image::imageops::blur(src, sigma)
}

/// `src + intensity × (src − blur(src, radius))`, colour channels only.
pub fn unsharp_mask(src: &Rgba32FImage, intensity: f32, radius: f32) -> Rgba32FImage {
    let blurred = gaussian_blur(src, radius);
    map_pixels(src, |x, y, [r, g, b, a]| {
        let bl = blurred.get_pixel(x, y).0;
        [
            r + intensity * (r - bl[0]),
            g + intensity * (g - bl[1]),
            b + intensity * (b - bl[2]),
            a,
        ]
    })
}

// ============================================================================
// Distortion
// ============================================================================

/// Square blocks of side `round(scale)`, anchored at the top-left corner,
/// each filled with one colour by `photon_rs::effects::pixelize`.
pub fn pixellate(src: &Rgba32FImage, scale: f32) -> Rgba32FImage {
    let block = scale.round().max(1.0) as i32;
    if block == 1 || is_empty(src) {
        return src.clone();
    }
    let blocks = with_photon(src, |img| effects::pixelize(img, block));
    let w = src.width();
    map_pixels(src, |x, y, _| blocks[(y * w + x) as usize])
}

/// Voronoi cells on a jittered grid of pitch `radius`, each filled with the
/// mean colour of the pixels nearest its seed point.
pub fn crystallize(src: &Rgba32FImage, radius: f32) -> Rgba32FImage {
    let (w, h) = src.dimensions();
    if w == 0 || h == 0 {
        return src.clone();
    }
    let cell = radius.max(1.0);
    let cells_x = ((w as f32 / cell).ceil() as i64).max(1);
    let cells_y = ((h as f32 / cell).ceil() as i64).max(1);

    let seeds: Vec<(f32, f32)> = (0..cells_y)
        .flat_map(|cy| (0..cells_x).map(move |cx| (cx, cy)))
        .map(|(cx, cy)| {
            let jx = hash_unit(cx as u32, cy as u32, CRYSTALLIZE_SEED);
            let jy = hash_unit(cx as u32, cy as u32, CRYSTALLIZE_SEED.wrapping_add(77));
            ((cx as f32 + jx) * cell, (cy as f32 + jy) * cell)
        })
        .collect();

    let nearest = |x: u32, y: u32| -> usize {
        let gx = (x as f32 / cell) as i64;
        let gy = (y as f32 / cell) as i64;
        let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
        let mut best = (f32::MAX, 0usize);
        for ny in (gy - 1).max(0)..=(gy + 1).min(cells_y - 1) {
            for nx in (gx - 1).max(0)..=(gx + 1).min(cells_x - 1) {
                let idx = (ny * cells_x + nx) as usize;
                let (sx, sy) = seeds[idx];
                let d = (px - sx) * (px - sx) + (py - sy) * (py - sy);
                if d < best.0 {
                    best = (d, idx);
                }
            }
        }
        best.1
    };

    // Row-parallel nearest-seed lookup, then a sequential reduction so the
    // summation order never depends on scheduling.
    let owners: Vec<usize> = (0..h)
        .into_par_iter()
        .flat_map_iter(|y| (0..w).map(move |x| (x, y)))
        .map(|(x, y)| nearest(x, y))
        .collect();

    let mut sums = vec![[0.0f64; 4]; seeds.len()];
    let mut counts = vec![0u32; seeds.len()];
    for (i, &owner) in owners.iter().enumerate() {
        let p = src.get_pixel(i as u32 % w, i as u32 / w).0;
        for c in 0..4 {
            sums[owner][c] += p[c] as f64;
        }
        counts[owner] += 1;
    }
    let means: Vec<[f32; 4]> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &n)| {
            if n == 0 {
                [0.0; 4]
            } else {
                s.map(|v| (v / n as f64) as f32)
            }
        })
        .collect();

    map_pixels(src, |x, y, _| means[owners[(y * w + x) as usize]])
}
