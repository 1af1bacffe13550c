//! Image filtering in pure Rust, with no system libraries.
//!
//! | Filter | Native inputs | Implementation |
//! |---|---|---|
//! | **Sepia Tone** | intensity | `photon_rs` sepia, blended by intensity |
//! | **Crystallize** | radius | jittered-grid Voronoi cell averaging |
//! | **Edges** | intensity | `photon_rs` edge detection |
//! | **Gaussian Blur** | radius | `image::imageops::blur` |
//! | **Pixellate** | scale | `photon_rs` pixelize |
//! | **Unsharp Mask** | intensity, radius | `src + k·(src − blur)` |
//! | **Vignette** | intensity, radius | radial darkening |
//!
//! The module is split into:
//! - **Kinds**: the closed [`FilterKind`] set and its capability table
//! - **Parameters**: slider state and its mapping to [`NativeInputs`]
//! - **Backend**: [`FilterBackend`] trait + [`RustBackend`]
//! - **Effects**: the Rust backend's per-filter pixel code, on top of `image` and `photon-rs`

pub mod backend;
mod effects;
pub mod kind;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, FilterBackend, FilteredImage, SourceImage};
pub use kind::{FilterKind, ParamName, ParseError};
pub use params::{FilterParameters, NativeInputs, Scaling};
pub use rust_backend::{RustBackend, save_image};
