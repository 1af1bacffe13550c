//! # photofilter
//!
//! A photo filter pipeline: pick a photo, pick one of seven filters, move a
//! slider, and get a freshly rendered image back every time something
//! changes.
//!
//! # Architecture
//!
//! ```text
//! user action ──▶ FilterPipeline ──▶ FilterBackend (decode → apply → rasterize)
//!                      │
//!                      ├──▶ PipelineEvent::Rendered(RenderedOutput)
//!                      └──▶ UsageTracker ──▶ PipelineEvent::FeedbackRequested
//! ```
//!
//! The controller never caches intermediate images. The rendered output is
//! a pure function of three inputs (source image, filter kind, slider
//! values) and is recomputed from scratch whenever any of them changes.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`filters`] | Filter kinds, slider parameters, the backend trait and the pure-Rust backend |
//! | [`pipeline`] | The controller: event handlers, rendering, superseding async loads |
//! | [`feedback`] | Usage counter and the review-request policy |
//! | [`store`] | JSON preference file holding the usage counter |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`script`] | TOML event scripts replayed through the controller |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Closed Filter Set
//!
//! Filters are a closed enum with a static table of the sliders each one
//! reads. Which sliders to show is known without asking the backend, and an
//! unsupported slider is rejected before any pixels move.
//!
//! ## One Slider Drives Three Inputs
//!
//! Radius and scale are derived from the intensity slider (×200 and ×10).
//! Their own stored values survive filter changes but never reach the
//! backend. See [`filters::FilterParameters::native_inputs`].
//!
//! The reverse holds for slider moves: whichever slider a filter shows
//! writes intensity, so a Gaussian Blur radius slider and the intensity
//! slider are one control. See [`filters::FilterParameters::set_slider`].
//!
//! ## Injected Backend
//!
//! Pixel work sits behind [`filters::FilterBackend`]. The pipeline only
//! decides which filter runs with which inputs, so its logic is tested
//! against a recording mock without decoding a single image.

pub mod config;
pub mod feedback;
pub mod filters;
pub mod output;
pub mod pipeline;
pub mod script;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
