//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Filters
//!
//! ```text
//! 001 Crystallize (crystallize)
//!     Sliders: radius
//! 002 Edges (edges)
//!     Sliders: intensity
//! ...
//! ```
//!
//! ## Pipeline events
//!
//! ```text
//! Rendered Gaussian Blur 640x480
//!     radius: 100.0
//!     Digest: 9c1e5f0a7d32
//! Feedback requested after 3 filter changes
//! ```
//!
//! ## Saved files
//!
//! ```text
//! Saved → out/dawn-blur.png
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.

use crate::filters::{FilterKind, NativeInputs, ParamName};
use crate::pipeline::PipelineEvent;
use std::path::PathBuf;

/// Length of the digest prefix shown in event output.
const DIGEST_PREFIX: usize = 12;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// One line per native input the filter reads.
///
/// Intensity is a slider fraction; radius and scale are pixel sizes.
fn input_lines(inputs: &NativeInputs) -> Vec<String> {
    ParamName::ALL
        .into_iter()
        .filter_map(|name| {
            let value = match name {
                ParamName::Intensity => inputs.intensity,
                ParamName::Radius => inputs.radius,
                ParamName::Scale => inputs.scale,
            }?;
            Some(match name {
                ParamName::Intensity => format!("{}{}: {:.2}", indent(1), name, value),
                _ => format!("{}{}: {:.1}", indent(1), name, value),
            })
        })
        .collect()
}

// ============================================================================
// Filters
// ============================================================================

/// Format the filter menu with each filter's slug and sliders.
pub fn format_filters() -> Vec<String> {
    let mut lines = Vec::new();
    for (i, kind) in FilterKind::ALL.into_iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            kind.display_name(),
            kind.slug()
        ));
        let sliders: Vec<&str> = kind.accepted().iter().map(|p| p.as_str()).collect();
        lines.push(format!("{}Sliders: {}", indent(1), sliders.join(", ")));
    }
    lines
}

/// Print the filter menu to stdout.
pub fn print_filters() {
    for line in format_filters() {
        println!("{}", line);
    }
}

// ============================================================================
// Pipeline events
// ============================================================================

/// Format a single pipeline event as display lines.
pub fn format_event(event: &PipelineEvent) -> Vec<String> {
    match event {
        PipelineEvent::Rendered(output) => {
            let mut lines = vec![format!(
                "Rendered {} {}x{}",
                output.kind(),
                output.width(),
                output.height()
            )];
            lines.extend(input_lines(output.inputs()));
            let digest = output.digest();
            lines.push(format!(
                "{}Digest: {}",
                indent(1),
                &digest[..DIGEST_PREFIX.min(digest.len())]
            ));
            lines
        }
        PipelineEvent::FeedbackRequested { filter_count } => {
            vec![format!(
                "Feedback requested after {} filter changes",
                filter_count
            )]
        }
    }
}

/// Print a pipeline event to stdout.
pub fn print_event(event: &PipelineEvent) {
    for line in format_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Saved files
// ============================================================================

pub fn format_saved(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| format!("Saved → {}", p.display()))
        .collect()
}

pub fn print_saved(paths: &[PathBuf]) {
    for line in format_saved(paths) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
