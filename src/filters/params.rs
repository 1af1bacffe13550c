//! Parameter types for filter operations.
//!
//! These structs describe *what* to render, not *how*. They sit between the
//! [`pipeline`](crate::pipeline) controller (which owns slider state) and the
//! [`backend`](super::backend) (which does the pixel work).
//!
//! ## Types
//!
//! - [`FilterParameters`]: the three stored slider values, each in `[0, 1]`.
//! - [`Scaling`]: multipliers turning the intensity slider into native
//!   radius and scale values.
//! - [`NativeInputs`]: exactly what the backend receives for one render.
//!
//! ## Slaved sliders
//!
//! Radius and scale are *not* independent controls. Whenever a filter
//! accepts them, their native values are derived from the **intensity**
//! slider (`radius = intensity × 200`, `scale = intensity × 10` by default).
//! The stored `radius` and `scale` slider values are kept so the UI can
//! show them, but they never reach the backend.
//!
//! Moving a slider goes through [`FilterParameters::set_slider`]: whichever
//! slider the filter shows (intensity, radius or scale) writes the shared
//! intensity value, and the shown radius/scale slider is kept level with it.

use super::kind::{FilterKind, ParamName};
use serde::{Deserialize, Serialize};

/// Stored slider values. Every value lies in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterParameters {
    pub intensity: f32,
    pub radius: f32,
    pub scale: f32,
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            intensity: 0.5,
            radius: 0.5,
            scale: 0.5,
        }
    }
}

impl FilterParameters {
    pub fn get(&self, name: ParamName) -> f32 {
        match name {
            ParamName::Intensity => self.intensity,
            ParamName::Radius => self.radius,
            ParamName::Scale => self.scale,
        }
    }

    /// Store a slider value, clamped to `[0, 1]`.
    ///
    /// Returns `false` (and stores nothing) for NaN or infinite values.
    pub fn set(&mut self, name: ParamName, value: f32) -> bool {
        if !value.is_finite() {
            return false;
        }
        let value = value.clamp(0.0, 1.0);
        match name {
            ParamName::Intensity => self.intensity = value,
            ParamName::Radius => self.radius = value,
            ParamName::Scale => self.scale = value,
        }
        true
    }

    /// Apply a slider move made while `kind` is selected.
    ///
    /// The value lands in `intensity`, which drives every native input, and
    /// in each radius/scale slider `kind` shows. Returns `false` (and stores
    /// nothing) when the slider does not affect `kind` or the value is not
    /// finite.
    pub fn set_slider(&mut self, kind: FilterKind, name: ParamName, value: f32) -> bool {
        if !kind.adjustable(name) || !self.set(ParamName::Intensity, value) {
            return false;
        }
        let value = self.intensity;
        for &shown in kind.accepted() {
            self.set(shown, value);
        }
        true
    }

    /// Map the stored sliders onto the inputs `kind` actually reads.
    pub fn native_inputs(&self, kind: FilterKind, scaling: &Scaling) -> NativeInputs {
        let intensity = self.intensity;
        NativeInputs {
            kind,
            intensity: kind.accepts(ParamName::Intensity).then_some(intensity),
            radius: kind
                .accepts(ParamName::Radius)
                .then_some(intensity * scaling.radius_factor),
            scale: kind
                .accepts(ParamName::Scale)
                .then_some(intensity * scaling.scale_factor),
        }
    }
}

/// Multipliers from the intensity slider to native radius / scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scaling {
    pub radius_factor: f32,
    pub scale_factor: f32,
}

impl Default for Scaling {
    fn default() -> Self {
        Self {
            radius_factor: 200.0,
            scale_factor: 10.0,
        }
    }
}

/// The values handed to the backend for a single render.
///
/// A field is `Some` exactly when `kind` accepts that parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeInputs {
    pub kind: FilterKind,
    pub intensity: Option<f32>,
    pub radius: Option<f32>,
    pub scale: Option<f32>,
}

impl NativeInputs {
    /// Native value for `name`, falling back to `default` when the kind
    /// does not read it.
    pub fn get_or(&self, name: ParamName, default: f32) -> f32 {
        match name {
            ParamName::Intensity => self.intensity,
            ParamName::Radius => self.radius,
            ParamName::Scale => self.scale,
        }
        .unwrap_or(default)
    }
}
