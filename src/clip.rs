use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, info, warn};

use crate::{
    config::Config,
    filtergraph::{MaskMode, MissingMediaCard, ShotMask, SlateCard},
    footage::{FootageSource, modified_time},
    foundation::error::{ShotreelError, ShotreelResult},
    probe::{PROBE_FAILED, probe_duration, probe_frame_rate},
    tool::{MediaTool, RenderInput, RenderRequest},
};

/// What a timeline entry shows.
#[derive(Clone, Debug, PartialEq)]
pub enum ClipKind {
    /// Footage resolved from disk by shot name.
    Shot,
    /// A generated title card; never has footage.
    Slate { title: String, notes: Vec<String> },
}

/// Lifecycle of a clip, derived from its current fields and the filesystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipState {
    /// No footage bound (shots only).
    Unbound,
    /// Bound, or a slate, but frame rate, duration or the file itself is unusable.
    NotReady,
    Ready,
    /// A rendered output exists on disk.
    Converted,
}

/// Options for [`Clip::find_footage`].
#[derive(Clone, Debug, Default)]
pub struct FindOptions {
    /// Restrict location-tree lookups to the sub-location with this name.
    pub location_filter: Option<String>,
    /// Replace the clip's duration with the footage length (minus handles).
    pub duration_from_footage: bool,
}

/// A single timeline entry.
#[derive(Clone, Debug)]
pub struct Clip {
    config: Arc<Config>,
    kind: ClipKind,
    name: String,
    in_frame: i64,
    duration: f64,
    handles_in: u32,
    fps: f64,
    pass_name: String,
    footage: Option<PathBuf>,
    footage_date: Option<String>,
    converted_path: Option<PathBuf>,
    missing_media: bool,
}

pub(crate) fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

fn file_date(path: &Path) -> String {
    chrono::DateTime::<chrono::Local>::from(modified_time(path))
        .format("%Y-%m-%d")
        .to_string()
}

fn slate_name(title: &str) -> String {
    let clean: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    format!("slate_{clean}")
}

impl Clip {
    /// A shot entry. `name` doubles as the pattern used to find its footage.
    pub fn new(config: Arc<Config>, name: impl Into<String>, in_frame: i64, duration: f64) -> Self {
        Self {
            kind: ClipKind::Shot,
            name: name.into(),
            in_frame,
            duration,
            handles_in: config.clip_frame_handles,
            fps: config.fps,
            pass_name: config.default_pass_name.clone(),
            footage: None,
            footage_date: None,
            converted_path: None,
            missing_media: false,
            config,
        }
    }

    pub fn slate(
        config: Arc<Config>,
        title: impl Into<String>,
        notes: Vec<String>,
        duration: f64,
    ) -> Self {
        let title = title.into();
        Self {
            name: slate_name(&title),
            kind: ClipKind::Slate { title, notes },
            in_frame: 0,
            duration,
            handles_in: 0,
            fps: config.fps,
            pass_name: config.default_pass_name.clone(),
            footage: None,
            footage_date: None,
            converted_path: None,
            missing_media: false,
            config,
        }
    }

    pub fn with_pass_name(mut self, pass_name: impl Into<String>) -> Self {
        self.pass_name = pass_name.into();
        self
    }

    pub fn with_handles(mut self, frames: u32) -> Self {
        if !self.is_slate() {
            self.handles_in = frames;
        }
        self
    }

    pub fn with_in_frame(mut self, in_frame: i64) -> Self {
        self.in_frame = in_frame;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ClipKind {
        &self.kind
    }

    pub fn is_slate(&self) -> bool {
        matches!(self.kind, ClipKind::Slate { .. })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn in_frame(&self) -> i64 {
        self.in_frame
    }

    pub fn set_in_frame(&mut self, in_frame: i64) {
        self.in_frame = in_frame;
    }

    /// Logical duration in seconds, handles excluded.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn set_duration(&mut self, seconds: f64) {
        self.duration = seconds;
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn handles_in(&self) -> u32 {
        self.handles_in
    }

    pub fn pass_name(&self) -> &str {
        &self.pass_name
    }

    pub fn set_pass_name(&mut self, pass_name: impl Into<String>) {
        self.pass_name = pass_name.into();
    }

    pub fn footage(&self) -> Option<&Path> {
        self.footage.as_deref()
    }

    pub fn converted_path(&self) -> Option<&Path> {
        self.converted_path.as_deref()
    }

    /// True when the bound footage is a synthesized missing-media placeholder.
    pub fn is_missing_media(&self) -> bool {
        self.missing_media
    }

    pub fn is_ready(&self) -> bool {
        let timing_ok = self.fps > 0.0 && self.duration > 0.0;
        match &self.kind {
            ClipKind::Shot => timing_ok && self.footage.as_deref().is_some_and(Path::is_file),
            ClipKind::Slate { title, .. } => timing_ok && !title.is_empty(),
        }
    }

    pub fn is_converted(&self) -> bool {
        self.converted_path.as_deref().is_some_and(Path::is_file)
    }

    pub fn state(&self) -> ClipState {
        if self.is_converted() {
            ClipState::Converted
        } else if self.is_ready() {
            ClipState::Ready
        } else if self.footage.is_none() && !self.is_slate() {
            ClipState::Unbound
        } else {
            ClipState::NotReady
        }
    }

    /// Length of the source span actually read: duration plus head handles.
    fn handle_seconds(&self) -> f64 {
        if self.fps > 0.0 {
            f64::from(self.handles_in) / self.fps
        } else {
            0.0
        }
    }

    /// Frame rate of the bound footage, or [`PROBE_FAILED`].
    pub fn frame_rate(&self, tool: &dyn MediaTool) -> f64 {
        let Some(path) = self.footage.as_deref() else {
            return PROBE_FAILED;
        };
        probe_frame_rate(tool, path).unwrap_or_else(|err| {
            warn!(clip = %self.name, error = %err, "frame rate probe failed");
            PROBE_FAILED
        })
    }

    /// Footage duration minus head and tail handles, or [`PROBE_FAILED`].
    pub fn duration_from_footage(&self, tool: &dyn MediaTool) -> f64 {
        let Some(path) = self.footage.as_deref() else {
            return PROBE_FAILED;
        };
        if self.fps <= 0.0 {
            return PROBE_FAILED;
        }
        match probe_duration(tool, path) {
            Ok(raw) => raw - 2.0 * f64::from(self.handles_in) / self.fps,
            Err(err) => {
                warn!(clip = %self.name, error = %err, "duration probe failed");
                PROBE_FAILED
            }
        }
    }

    /// Binds `path` as this clip's footage and re-derives frame rate, date and (when unset)
    /// duration from it. Returns false, leaving the clip untouched, if `path` is not a file.
    pub fn bind_footage(&mut self, path: &Path, tool: &dyn MediaTool) -> bool {
        if self.is_slate() {
            debug!(clip = %self.name, "slates do not take footage");
            return false;
        }
        if !path.is_file() {
            warn!(clip = %self.name, path = %path.display(), "cannot bind footage, file does not exist");
            return false;
        }

        self.footage = Some(path.to_path_buf());
        self.missing_media = false;
        self.footage_date = Some(file_date(path));

        let rate = self.frame_rate(tool);
        self.fps = if rate > 0.0 {
            rate
        } else {
            warn!(clip = %self.name, fallback = self.config.fps, "using configured frame rate");
            self.config.fps
        };

        if self.duration <= 0.0 {
            let d = self.duration_from_footage(tool);
            if d > 0.0 {
                self.duration = d;
            }
        }
        true
    }

    /// Resolves and binds the latest footage for this clip.
    ///
    /// A location lookup is restricted to the configured pass when the config forces one,
    /// otherwise to `opts.location_filter` if given. On a location hit the clip takes the
    /// pass name of the location it came from. Nothing matching is not an error: the clip
    /// stays unbound and renders as missing media.
    pub fn find_footage(
        &mut self,
        source: FootageSource<'_>,
        opts: &FindOptions,
        tool: &dyn MediaTool,
    ) -> Option<PathBuf> {
        if self.is_slate() {
            debug!(clip = %self.name, "slates do not take footage");
            return None;
        }

        let filter = self
            .config
            .forced_pass()
            .map(str::to_string)
            .or_else(|| opts.location_filter.clone());

        let resolved = match source.resolve(&self.name, filter.as_deref()) {
            Ok(Some(r)) => r,
            Ok(None) => {
                warn!(clip = %self.name, "cannot find footage");
                return None;
            }
            Err(err) => {
                warn!(clip = %self.name, error = %err, "footage lookup failed");
                return None;
            }
        };

        if !self.bind_footage(&resolved.path, tool) {
            return None;
        }
        if let Some(pass) = resolved.pass_name {
            self.pass_name = pass;
        }
        if opts.duration_from_footage {
            let d = self.duration_from_footage(tool);
            if d > 0.0 {
                self.duration = d;
            }
        }
        debug!(clip = %self.name, path = %resolved.path.display(), pass = %self.pass_name, "found footage");
        Some(resolved.path)
    }

    fn output_fps(&self) -> f64 {
        if self.config.keep_source_rate && self.fps > 0.0 {
            self.fps
        } else {
            self.config.fps
        }
    }

    fn logo(&self) -> Option<&Path> {
        self.config.logo_path.as_deref().filter(|p| p.is_file())
    }

    pub fn shot_mask(&self) -> ShotMask {
        let mode = if self.config.enable_shotmask {
            MaskMode::Clip
        } else {
            MaskMode::ResizeOnly
        };
        ShotMask {
            mode,
            frame_size: self.config.frame_size,
            fps: self.output_fps(),
            opacity: self.config.mask_opacity,
            has_logo: mode == MaskMode::Clip && self.logo().is_some(),
            pass_name: self.pass_name.clone(),
            shot_name: self.name.clone(),
            file_name: self
                .footage
                .as_deref()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            date: self.footage_date.clone().unwrap_or_else(today),
            start_frame: self.handles_in,
            missing_frame_color: self.config.missing_frame_color.clone(),
            letterbox_color: self.config.letterbox_color.clone(),
            font_file: self.config.font_file.clone(),
        }
    }

    pub fn slate_card(&self) -> Option<SlateCard> {
        let ClipKind::Slate { title, notes } = &self.kind else {
            return None;
        };
        Some(SlateCard {
            frame_size: self.config.frame_size,
            fps: self.fps,
            title: title.clone(),
            pass_name: self.pass_name.clone(),
            date: chrono::Local::now().format("%y-%m-%d").to_string(),
            notes: notes.clone(),
            duration: self.duration,
            has_logo: self.logo().is_some(),
            font_file: self.config.font_file.clone(),
        })
    }

    /// Render request for the missing-media placeholder written to `output`.
    pub fn missing_media_request(&self, output: &Path) -> RenderRequest {
        let card = MissingMediaCard {
            frame_size: self.config.frame_size,
            fps: self.output_fps(),
            name: self.name.clone(),
            font_file: self.config.font_file.clone(),
        };
        RenderRequest {
            filter_graph: Some(card.filter_graph()),
            duration: Some(self.duration + self.handle_seconds()),
            fps: Some(self.output_fps()),
            ..RenderRequest::new(output)
        }
    }

    /// Render request stamping the currently bound footage into `output`.
    pub fn mask_request(&self, output: &Path) -> ShotreelResult<RenderRequest> {
        let Some(footage) = self.footage.as_deref() else {
            return Err(ShotreelError::validation(format!(
                "clip '{}' has no footage to render",
                self.name
            )));
        };
        let mask = self.shot_mask();

        let mut source = RenderInput::file(footage);
        let head = self.handle_seconds();
        if head > 0.0 {
            source = source.with_seek(head);
        }
        let mut inputs = vec![source];
        if mask.has_logo
            && let Some(logo) = self.logo()
        {
            inputs.push(RenderInput::file(logo));
        }

        Ok(RenderRequest {
            inputs,
            filter_graph: Some(mask.filter_graph()),
            duration: Some(self.duration),
            fps: Some(self.output_fps()),
            ..RenderRequest::new(output)
        })
    }

    fn slate_request(&self, output: &Path) -> ShotreelResult<RenderRequest> {
        let card = self.slate_card().ok_or_else(|| {
            ShotreelError::validation(format!("clip '{}' is not a slate", self.name))
        })?;
        let inputs = match self.logo() {
            Some(logo) if card.has_logo => vec![RenderInput::file(logo)],
            _ => Vec::new(),
        };
        Ok(RenderRequest {
            inputs,
            filter_graph: Some(card.filter_graph()),
            duration: Some(self.duration),
            fps: Some(self.output_fps()),
            ..RenderRequest::new(output)
        })
    }

    /// Renders this entry to `output`.
    ///
    /// A shot that is not ready first gets a missing-media placeholder rendered next to
    /// `output` and bound as its footage; the mask is then applied to whatever is bound.
    /// A slate that is not ready is skipped with a validation error. Whatever the outcome,
    /// [`Clip::is_converted`] afterwards reflects whether `output` exists.
    pub fn convert(&mut self, output: &Path, tool: &dyn MediaTool) -> ShotreelResult<()> {
        self.converted_path = Some(output.to_path_buf());

        if self.is_slate() {
            if !self.is_ready() {
                return Err(ShotreelError::validation(format!(
                    "slate '{}' not ready, skipping conversion",
                    self.name
                )));
            }
            return tool.render(&self.slate_request(output)?);
        }

        if !self.is_ready() {
            info!(clip = %self.name, "clip not ready, creating missing media clip");
            if !(self.duration > 0.0) {
                self.duration = self.config.missing_shot_seconds;
                debug!(clip = %self.name, seconds = self.duration, "no duration, using placeholder length");
            }
            let dir = output.parent().unwrap_or_else(|| Path::new("."));
            let stem = output
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.name.clone());
            let placeholder = dir.join(format!("missingMedia_{stem}.mp4"));
            tool.render(&self.missing_media_request(&placeholder))?;
            self.footage = Some(placeholder);
            self.footage_date = None;
            self.missing_media = true;
        }

        tool.render(&self.mask_request(output)?)
    }
}
