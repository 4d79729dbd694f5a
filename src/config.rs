use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::{
    core::FrameSize,
    error::{ShotreelError, ShotreelResult},
};

/// Settings shared by every clip, slate and edit built from it.
///
/// A `Config` is never mutated once an edit holds it. Customising a run means building a new
/// value from a base with the `with_*` methods, then handing the result to the edit.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// Edit title, also used for the auto-slate.
    pub name: String,
    pub ffmpeg_bin: PathBuf,
    pub ffprobe_bin: PathBuf,
    pub frame_size: FrameSize,
    /// Default edit frame rate; also the fallback when a clip's rate cannot be probed.
    pub fps: f64,
    pub default_pass_name: String,
    /// Restrict location lookups to the sub-location named `default_pass_name`.
    pub force_pass: bool,
    pub enable_shotmask: bool,
    pub logo_path: Option<PathBuf>,
    pub font_file: Option<PathBuf>,
    /// Frames trimmed from the head of the source (and mirrored at the tail).
    pub clip_frame_handles: u32,
    /// Shown wherever the source runs out before the requested duration.
    pub missing_frame_color: String,
    pub letterbox_color: String,
    pub mask_opacity: f64,
    /// Render each clip at its own frame rate instead of `fps`.
    pub keep_source_rate: bool,
    /// Number of clips converted concurrently; 1 keeps conversion sequential.
    pub parallel_jobs: usize,
    /// Placeholder length for a shot that has neither footage nor a duration of its own.
    pub missing_shot_seconds: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "Edit".to_string(),
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            ffprobe_bin: PathBuf::from("ffprobe"),
            frame_size: FrameSize::default(),
            fps: 24.0,
            default_pass_name: "latest pass".to_string(),
            force_pass: false,
            enable_shotmask: true,
            logo_path: None,
            font_file: None,
            clip_frame_handles: 0,
            missing_frame_color: "orange".to_string(),
            letterbox_color: "black".to_string(),
            mask_opacity: 0.2,
            keep_source_rate: false,
            parallel_jobs: 1,
            missing_shot_seconds: 1.0,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> ShotreelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text).map_err(|e| {
            ShotreelError::serde(format!("parse config '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ShotreelResult<()> {
        self.frame_size.validate()?;
        if !(self.fps > 0.0) {
            return Err(ShotreelError::validation("config fps must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.mask_opacity) {
            return Err(ShotreelError::validation(
                "config mask_opacity must be within 0..=1",
            ));
        }
        if !(self.missing_shot_seconds > 0.0) {
            return Err(ShotreelError::validation(
                "config missing_shot_seconds must be > 0",
            ));
        }
        if self.parallel_jobs == 0 {
            return Err(ShotreelError::validation(
                "config parallel_jobs must be >= 1",
            ));
        }
        Ok(())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_pass(mut self, pass_name: impl Into<String>) -> Self {
        self.default_pass_name = pass_name.into();
        self
    }

    pub fn with_force_pass(mut self, force: bool) -> Self {
        self.force_pass = force;
        self
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_handles(mut self, frames: u32) -> Self {
        self.clip_frame_handles = frames;
        self
    }

    pub fn with_logo(mut self, logo: Option<PathBuf>) -> Self {
        self.logo_path = logo;
        self
    }

    /// Pass filter forced on every location lookup, if any.
    pub fn forced_pass(&self) -> Option<&str> {
        self.force_pass.then_some(self.default_pass_name.as_str())
    }
}
