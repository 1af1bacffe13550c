//! The closed set of filters and the parameters each one exposes.
//!
//! Which sliders a filter shows is a static property of the filter, not of
//! any filter instance, so it lives in a table here rather than being asked
//! of the backend at runtime:
//!
//! | Kind | Display name | Accepted parameters |
//! |---|---|---|
//! | `Sepia` | Sepia Tone | intensity |
//! | `Crystallize` | Crystallize | radius |
//! | `Edges` | Edges | intensity |
//! | `GaussianBlur` | Gaussian Blur | radius |
//! | `Pixellate` | Pixellate | scale |
//! | `UnsharpMask` | Unsharp Mask | intensity, radius |
//! | `Vignette` | Vignette | intensity, radius |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the built-in filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    #[default]
    Sepia,
    Crystallize,
    Edges,
    GaussianBlur,
    Pixellate,
    UnsharpMask,
    Vignette,
}

/// A named slider value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamName {
    Intensity,
    Radius,
    Scale,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown filter '{0}' (try `photofilter filters`)")]
    UnknownFilter(String),
    #[error("unknown parameter '{0}' (expected intensity, radius or scale)")]
    UnknownParam(String),
}

impl FilterKind {
    /// Every kind, in the order the filter menu lists them.
    pub const ALL: [FilterKind; 7] = [
        FilterKind::Crystallize,
        FilterKind::Edges,
        FilterKind::GaussianBlur,
        FilterKind::Pixellate,
        FilterKind::Sepia,
        FilterKind::UnsharpMask,
        FilterKind::Vignette,
    ];

    /// Human-facing name, as shown in the filter menu.
    pub fn display_name(self) -> &'static str {
        match self {
            FilterKind::Sepia => "Sepia Tone",
            FilterKind::Crystallize => "Crystallize",
            FilterKind::Edges => "Edges",
            FilterKind::GaussianBlur => "Gaussian Blur",
            FilterKind::Pixellate => "Pixellate",
            FilterKind::UnsharpMask => "Unsharp Mask",
            FilterKind::Vignette => "Vignette",
        }
    }

    /// Stable machine name (`gaussian-blur`), matching the serde form.
    pub fn slug(self) -> &'static str {
        match self {
            FilterKind::Sepia => "sepia",
            FilterKind::Crystallize => "crystallize",
            FilterKind::Edges => "edges",
            FilterKind::GaussianBlur => "gaussian-blur",
            FilterKind::Pixellate => "pixellate",
            FilterKind::UnsharpMask => "unsharp-mask",
            FilterKind::Vignette => "vignette",
        }
    }

    /// The parameters this filter reads, in slider order.
    pub fn accepted(self) -> &'static [ParamName] {
        use ParamName::*;
        match self {
            FilterKind::Sepia | FilterKind::Edges => &[Intensity],
            FilterKind::Crystallize | FilterKind::GaussianBlur => &[Radius],
            FilterKind::Pixellate => &[Scale],
            FilterKind::UnsharpMask | FilterKind::Vignette => &[Intensity, Radius],
        }
    }

    pub fn accepts(self, name: ParamName) -> bool {
        self.accepted().contains(&name)
    }

    /// Whether moving the `name` slider changes this filter's output.
    ///
    /// Every exposed slider does. Intensity always does too: filters that
    /// only show radius or scale derive that value from it.
    pub fn adjustable(self, name: ParamName) -> bool {
        name == ParamName::Intensity || self.accepts(name)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Lowercase and drop separators so `Gaussian Blur`, `gaussian-blur` and
/// `gaussian_blur` compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for FilterKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        FilterKind::ALL
            .into_iter()
            .find(|k| normalize(k.slug()) == wanted || normalize(k.display_name()) == wanted)
            .ok_or_else(|| ParseError::UnknownFilter(s.to_string()))
    }
}

impl ParamName {
    pub const ALL: [ParamName; 3] = [ParamName::Intensity, ParamName::Radius, ParamName::Scale];

    pub fn as_str(self) -> &'static str {
        match self {
            ParamName::Intensity => "intensity",
            ParamName::Radius => "radius",
            ParamName::Scale => "scale",
        }
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "intensity" => Ok(ParamName::Intensity),
            "radius" => Ok(ParamName::Radius),
            "scale" => Ok(ParamName::Scale),
            _ => Err(ParseError::UnknownParam(s.to_string())),
        }
    }
}
