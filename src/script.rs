//! Event scripts: a recorded editing session replayed through the pipeline.
//!
//! A script is a TOML file with one `[[event]]` table per user action:
//!
//! ```toml
//! [[event]]
//! action = "select-image"
//! path = "photos/dawn.jpg"
//!
//! [[event]]
//! action = "select-filter"
//! filter = "gaussian-blur"
//!
//! [[event]]
//! action = "set"
//! param = "intensity"
//! value = 0.8
//!
//! [[event]]
//! action = "save"
//! path = "out/dawn-blur.png"
//! ```
//!
//! Relative paths resolve against the script's directory. Events go through
//! the same handlers as interactive use, so an undecodable image or an
//! unexposed parameter is absorbed exactly as it would be in the app. Only
//! script-level problems (unreadable files, unknown names, saving before
//! anything rendered) are errors.

use crate::filters::{BackendError, FilterBackend, FilterKind, ParamName, ParseError};
use crate::pipeline::FilterPipeline;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("event {step}: {source}")]
    Name { step: usize, source: ParseError },
    #[error("event {step}: cannot read {}: {source}", .path.display())]
    ReadImage {
        step: usize,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("event {step}: nothing has been rendered yet")]
    NothingToSave { step: usize },
    #[error("event {step}: {source}")]
    Save { step: usize, source: BackendError },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ScriptEvent {
    SelectImage { path: PathBuf },
    SelectFilter { filter: String },
    Set { param: String, value: f32 },
    Save { path: PathBuf },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default, rename = "event")]
    pub events: Vec<ScriptEvent>,
}

impl Script {
    pub fn parse(content: &str) -> Result<Self, ScriptError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        Self::parse(&fs::read_to_string(path)?)
    }
}

/// Run every event in order. Returns the paths written by `save` events.
///
/// Steps are numbered from 1 in error messages.
pub fn replay<B: FilterBackend + 'static>(
    script: &Script,
    base_dir: &Path,
    pipeline: &mut FilterPipeline<B>,
) -> Result<Vec<PathBuf>, ScriptError> {
    let mut saved = Vec::new();
    for (i, event) in script.events.iter().enumerate() {
        let step = i + 1;
        log::debug!("event {step}: {event:?}");
        match event {
            ScriptEvent::SelectImage { path } => {
                let path = base_dir.join(path);
                let bytes = fs::read(&path).map_err(|source| ScriptError::ReadImage {
                    step,
                    path: path.clone(),
                    source,
                })?;
                pipeline.select_image(bytes);
            }
            ScriptEvent::SelectFilter { filter } => {
                let kind: FilterKind = filter
                    .parse()
                    .map_err(|source| ScriptError::Name { step, source })?;
                pipeline.select_filter(kind);
            }
            ScriptEvent::Set { param, value } => {
                let name: ParamName = param
                    .parse()
                    .map_err(|source| ScriptError::Name { step, source })?;
                pipeline.set_parameter(name, *value);
            }
            ScriptEvent::Save { path } => {
                let path = base_dir.join(path);
                let output = pipeline
                    .output()
                    .ok_or(ScriptError::NothingToSave { step })?;
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    fs::create_dir_all(parent)?;
                }
                output
                    .save(&path)
                    .map_err(|source| ScriptError::Save { step, source })?;
                saved.push(path);
            }
        }
    }
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::RustBackend;
    use crate::filters::backend::tests::{MockBackend, RecordedOp, mock_image_bytes};
    use crate::test_helpers::gradient_png;
    use std::sync::Arc;
    use tempfile::TempDir;

    const BLUR_THEN_SEPIA: &str = r#"
[[event]]
action = "select-image"
path = "a.img"

[[event]]
action = "select-filter"
filter = "Gaussian Blur"

[[event]]
action = "set"
param = "intensity"
value = 0.25

[[event]]
action = "select-filter"
filter = "sepia-tone"
"#;

    #[test]
    fn parse_all_actions() {
        let script = Script::parse(
            r#"
[[event]]
action = "select-image"
path = "in.png"

[[event]]
action = "select-filter"
filter = "pixellate"

[[event]]
action = "set"
param = "scale"
value = 0.25

[[event]]
action = "save"
path = "out.png"
"#,
        )
        .unwrap();
        assert_eq!(
            script.events,
            vec![
                ScriptEvent::SelectImage {
                    path: "in.png".into()
                },
                ScriptEvent::SelectFilter {
                    filter: "pixellate".into()
                },
                ScriptEvent::Set {
                    param: "scale".into(),
                    value: 0.25
                },
                ScriptEvent::Save {
                    path: "out.png".into()
                },
            ]
        );
    }

    #[test]
    fn empty_script_is_valid() {
        assert!(Script::parse("").unwrap().events.is_empty());
    }

    #[test]
    fn unknown_action_rejected() {
        let result = Script::parse("[[event]]\naction = \"rotate\"\n");
        assert!(matches!(result, Err(ScriptError::Toml(_))));
    }

    #[test]
    fn replay_drives_the_pipeline() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.img"), mock_image_bytes(8)).unwrap();
        let backend = Arc::new(MockBackend::new());
        let mut pipeline = FilterPipeline::new(Arc::clone(&backend));

        let script = Script::parse(BLUR_THEN_SEPIA).unwrap();
        replay(&script, tmp.path(), &mut pipeline).unwrap();

        let applied = backend.applied();
        assert_eq!(
            applied[1],
            RecordedOp::Apply {
                kind: FilterKind::GaussianBlur,
                intensity: None,
                radius: Some(100.0),
                scale: None,
            }
        );
        assert_eq!(
            applied[2],
            RecordedOp::Apply {
                kind: FilterKind::GaussianBlur,
                intensity: None,
                radius: Some(50.0),
                scale: None,
            }
        );
        assert_eq!(
            applied.last(),
            Some(&RecordedOp::Apply {
                kind: FilterKind::Sepia,
                intensity: Some(0.25),
                radius: None,
                scale: None,
            })
        );
        assert_eq!(pipeline.filter(), FilterKind::Sepia);
    }

    #[test]
    fn unknown_filter_reports_step() {
        let tmp = TempDir::new().unwrap();
        let mut pipeline = FilterPipeline::new(Arc::new(MockBackend::new()));
        let script =
            Script::parse("[[event]]\naction = \"select-filter\"\nfilter = \"sparkle\"\n").unwrap();
        let err = replay(&script, tmp.path(), &mut pipeline).unwrap_err();
        assert!(matches!(err, ScriptError::Name { step: 1, .. }));
        assert!(err.to_string().contains("sparkle"));
    }

    #[test]
    fn missing_image_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let mut pipeline = FilterPipeline::new(Arc::new(MockBackend::new()));
        let script =
            Script::parse("[[event]]\naction = \"select-image\"\npath = \"gone.jpg\"\n").unwrap();
        assert!(matches!(
            replay(&script, tmp.path(), &mut pipeline),
            Err(ScriptError::ReadImage { step: 1, .. })
        ));
    }

    #[test]
    fn save_before_render_is_error() {
        let tmp = TempDir::new().unwrap();
        let mut pipeline = FilterPipeline::new(Arc::new(MockBackend::new()));
        let script = Script::parse("[[event]]\naction = \"save\"\npath = \"x.png\"\n").unwrap();
        assert!(matches!(
            replay(&script, tmp.path(), &mut pipeline),
            Err(ScriptError::NothingToSave { step: 1 })
        ));
    }

    #[test]
    fn replay_saves_real_images() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("in.png"), gradient_png(16, 12)).unwrap();
        let mut pipeline = FilterPipeline::new(Arc::new(RustBackend::new()));
        let script = Script::parse(
            r#"
[[event]]
action = "select-image"
path = "in.png"

[[event]]
action = "select-filter"
filter = "vignette"

[[event]]
action = "save"
path = "out/vignette.png"
"#,
        )
        .unwrap();

        let saved = replay(&script, tmp.path(), &mut pipeline).unwrap();
        assert_eq!(saved, vec![tmp.path().join("out/vignette.png")]);
        let written = image::open(&saved[0]).unwrap();
        assert_eq!((written.width(), written.height()), (16, 12));
    }

    #[test]
    fn undecodable_image_is_absorbed() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.img"), b"not an image").unwrap();
        let mut pipeline = FilterPipeline::new(Arc::new(MockBackend::new()));
        let script =
            Script::parse("[[event]]\naction = \"select-image\"\npath = \"a.img\"\n").unwrap();
        replay(&script, tmp.path(), &mut pipeline).unwrap();
        assert!(pipeline.source().is_none());
    }
}
