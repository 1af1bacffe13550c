//! The filter pipeline controller.
//!
//! [`FilterPipeline`] owns the three inputs that determine what is on
//! screen and recomputes the rendered output whenever one of them changes:
//!
//! ```text
//! source image ──┐
//! filter kind ───┼──▶ native inputs ──▶ backend.apply ──▶ backend.rasterize ──▶ RenderedOutput
//! parameters ────┘
//! ```
//!
//! Nothing else is cached. Every render starts again from the decoded
//! source, so the output is a pure function of (source, kind, parameters).
//!
//! ## Events
//!
//! User actions map onto methods: [`select_image`](FilterPipeline::select_image),
//! [`select_filter`](FilterPipeline::select_filter) and
//! [`set_parameter`](FilterPipeline::set_parameter). These handlers absorb
//! failures: the previous output stays visible and the error is logged at
//! `debug` level. Only [`render`](FilterPipeline::render) (and
//! [`try_select_image`](FilterPipeline::try_select_image)) hand errors back.
//!
//! Results leave the controller as [`PipelineEvent`]s on an optional
//! channel. A dropped receiver is not an error.
//!
//! ## Asynchronous loads
//!
//! [`begin_image_load`](FilterPipeline::begin_image_load) decodes on a worker
//! thread and returns a [`PendingLoad`]. Each new selection that decodes
//! bumps a load generation; [`complete_image_load`](FilterPipeline::complete_image_load)
//! only applies a result whose generation is still the latest, so a slow
//! decode can never overwrite a newer choice.

use crate::feedback::UsageTracker;
use crate::filters::{
    BackendError, FilterBackend, FilterKind, FilterParameters, NativeInputs, ParamName,
    Scaling, SourceImage, save_image,
};
use image::RgbaImage;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Decode failure: {0}")]
    DecodeFailure(#[source] BackendError),
    #[error("No source image selected")]
    NoSourceImage,
    #[error("Filter evaluation failure: {0}")]
    FilterEvaluationFailure(#[source] BackendError),
    #[error("Rasterization failure: {0}")]
    RasterizationFailure(#[source] BackendError),
}

/// A finished render: the bitmap plus the inputs that produced it.
///
/// Cheap to clone; the pixels are shared.
#[derive(Debug, Clone)]
pub struct RenderedOutput {
    image: Arc<RgbaImage>,
    inputs: NativeInputs,
}

impl RenderedOutput {
    pub fn new(image: RgbaImage, inputs: NativeInputs) -> Self {
        Self {
            image: Arc::new(image),
            inputs,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn kind(&self) -> FilterKind {
        self.inputs.kind
    }

    pub fn inputs(&self) -> &NativeInputs {
        &self.inputs
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// SHA-256 of the extent and raw RGBA bytes, as hex.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.image.width().to_le_bytes());
        hasher.update(self.image.height().to_le_bytes());
        hasher.update(self.image.as_raw());
        format!("{:x}", hasher.finalize())
    }

    /// Encode to `path`; the format follows the extension.
    pub fn save(&self, path: &Path) -> Result<(), BackendError> {
        save_image(&self.image, path)
    }
}

#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A new output replaced the previous one.
    Rendered(RenderedOutput),
    /// The usage counter says it is time to ask for a review.
    FeedbackRequested { filter_count: u32 },
}

/// A decode running on a worker thread.
///
/// Hand it back to [`FilterPipeline::complete_image_load`].
pub struct PendingLoad {
    generation: u64,
    bytes: Arc<[u8]>,
    handle: JoinHandle<Result<SourceImage, BackendError>>,
}

impl PendingLoad {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True once the worker has finished decoding.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// What happened to a [`PendingLoad`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The image became the new source.
    Applied,
    /// A newer selection was made in the meantime; the result was dropped.
    Superseded,
    /// The bytes could not be decoded; state is unchanged.
    Failed,
}

/// Holds the current filter, its parameters and the source image, and
/// re-renders on every change.
pub struct FilterPipeline<B: FilterBackend> {
    backend: Arc<B>,
    filter: FilterKind,
    params: FilterParameters,
    scaling: Scaling,
    image_bytes: Option<Arc<[u8]>>,
    source: Option<SourceImage>,
    output: Option<RenderedOutput>,
    usage: UsageTracker,
    events: Option<Sender<PipelineEvent>>,
    load_generation: u64,
}

impl<B: FilterBackend + 'static> FilterPipeline<B> {
    /// A controller with Sepia selected, default parameters and an
    /// in-memory usage counter.
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            filter: FilterKind::default(),
            params: FilterParameters::default(),
            scaling: Scaling::default(),
            image_bytes: None,
            source: None,
            output: None,
            usage: UsageTracker::default(),
            events: None,
            load_generation: 0,
        }
    }

    pub fn with_parameters(mut self, params: FilterParameters) -> Self {
        self.params = params;
        self
    }

    pub fn with_scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn with_usage_tracker(mut self, usage: UsageTracker) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_events(mut self, events: Sender<PipelineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    // =========================================================================
    // Event handlers
    // =========================================================================

    /// The user picked a photo. Undecodable bytes leave everything as it was.
    pub fn select_image(&mut self, bytes: impl Into<Arc<[u8]>>) {
        if let Err(e) = self.try_select_image(bytes) {
            log::debug!("image selection ignored: {e}");
        }
    }

    /// Like [`select_image`](Self::select_image) but reports why the image
    /// was rejected. A render failure after a successful decode is still
    /// absorbed: the image is selected either way.
    pub fn try_select_image(&mut self, bytes: impl Into<Arc<[u8]>>) -> Result<(), PipelineError> {
        let bytes = bytes.into();
        let source = self
            .backend
            .decode(&bytes)
            .map_err(PipelineError::DecodeFailure)?;
        self.load_generation += 1;
        self.install_source(bytes, source);
        Ok(())
    }

    /// The user picked a filter.
    ///
    /// Stored slider values survive the switch. The usage counter advances
    /// (possibly requesting feedback), then the retained image is decoded
    /// again and rendered with the new filter.
    pub fn select_filter(&mut self, kind: FilterKind) {
        self.filter = kind;
        if self.usage.record_filter_change() {
            self.emit(PipelineEvent::FeedbackRequested {
                filter_count: self.usage.filter_count(),
            });
        }

        let Some(bytes) = self.image_bytes.clone() else {
            log::debug!("{kind} selected with no image; nothing to render");
            return;
        };
        match self.backend.decode(&bytes) {
            Ok(source) => self.install_source(bytes, source),
            Err(e) => log::debug!("reload for {kind} failed: {e}"),
        }
    }

    /// The user moved a slider.
    ///
    /// The slider a filter shows drives it: for Gaussian Blur, Crystallize
    /// and Pixellate the intensity and radius/scale sliders are one control
    /// (see [`FilterParameters::set_slider`]).
    ///
    /// Returns `true` when the value was stored and a render attempted;
    /// `false` when `name` has no effect on the current filter or the value
    /// is not finite.
    pub fn set_parameter(&mut self, name: ParamName, value: f32) -> bool {
        if !self.filter.adjustable(name) {
            log::debug!("{} does not expose {name}; ignoring", self.filter);
            return false;
        }
        if !self.params.set_slider(self.filter, name, value) {
            log::debug!("ignoring non-finite {name} value {value}");
            return false;
        }
        self.render_absorbing();
        true
    }

    /// Start decoding `bytes` on a worker thread.
    ///
    /// Supersedes every earlier pending load and any image selected before
    /// this call completes.
    pub fn begin_image_load(&mut self, bytes: impl Into<Arc<[u8]>>) -> PendingLoad {
        let bytes = bytes.into();
        self.load_generation += 1;
        let generation = self.load_generation;
        let backend = Arc::clone(&self.backend);
        let worker_bytes = Arc::clone(&bytes);
        let handle = thread::spawn(move || backend.decode(&worker_bytes));
        PendingLoad {
            generation,
            bytes,
            handle,
        }
    }

    /// Wait for `pending` and, if it is still the latest load, make it the
    /// source image and render.
    pub fn complete_image_load(&mut self, pending: PendingLoad) -> LoadOutcome {
        if pending.generation != self.load_generation {
            log::debug!(
                "dropping superseded load {} (latest is {})",
                pending.generation,
                self.load_generation
            );
            return LoadOutcome::Superseded;
        }
        let result = match pending.handle.join() {
            Ok(result) => result,
            Err(_) => {
                log::debug!("decode worker for load {} panicked", pending.generation);
                return LoadOutcome::Failed;
            }
        };
        match result {
            Ok(source) => {
                self.install_source(pending.bytes, source);
                LoadOutcome::Applied
            }
            Err(e) => {
                log::debug!("async image load failed: {e}");
                LoadOutcome::Failed
            }
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Recompute the output from the source, filter and parameters.
    ///
    /// On success the new output replaces the old one and a
    /// [`PipelineEvent::Rendered`] is sent. On failure the previous output
    /// is kept.
    pub fn render(&mut self) -> Result<RenderedOutput, PipelineError> {
        let source = self.source.as_ref().ok_or(PipelineError::NoSourceImage)?;
        let inputs = self.native_inputs();
        let filtered = self
            .backend
            .apply(source, &inputs)
            .map_err(PipelineError::FilterEvaluationFailure)?;
        let raster = self
            .backend
            .rasterize(&filtered)
            .map_err(PipelineError::RasterizationFailure)?;

        let output = RenderedOutput::new(raster, inputs);
        self.output = Some(output.clone());
        self.emit(PipelineEvent::Rendered(output.clone()));
        Ok(output)
    }

    fn render_absorbing(&mut self) {
        if let Err(e) = self.render() {
            log::debug!("render skipped: {e}");
        }
    }

    fn install_source(&mut self, bytes: Arc<[u8]>, source: SourceImage) {
        log::debug!(
            "source image {}x{} ({} bytes)",
            source.width(),
            source.height(),
            bytes.len()
        );
        self.image_bytes = Some(bytes);
        self.source = Some(source);
        self.render_absorbing();
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events
            && tx.send(event).is_err()
        {
            log::debug!("event receiver dropped");
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn filter(&self) -> FilterKind {
        self.filter
    }

    pub fn parameters(&self) -> &FilterParameters {
        &self.params
    }

    /// Parameters the current filter shows sliders for.
    pub fn exposed_parameters(&self) -> &'static [ParamName] {
        self.filter.accepted()
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn output(&self) -> Option<&RenderedOutput> {
        self.output.as_ref()
    }

    /// What the backend would receive if a render ran now.
    pub fn native_inputs(&self) -> NativeInputs {
        self.params.native_inputs(self.filter, &self.scaling)
    }

    pub fn filter_count(&self) -> u32 {
        self.usage.filter_count()
    }
}
