use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use tracing::debug;

use crate::{
    config::Config,
    foundation::error::{ShotreelError, ShotreelResult},
};

/// Stream entry a probe asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeEntry {
    FrameRate,
    Duration,
}

impl ProbeEntry {
    pub fn stream_entry(self) -> &'static str {
        match self {
            ProbeEntry::FrameRate => "r_frame_rate",
            ProbeEntry::Duration => "duration",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderInput {
    pub path: PathBuf,
    /// Seconds skipped from the head of this input.
    pub seek: Option<f64>,
    /// Forced demuxer, e.g. `concat` for a manifest file.
    pub format: Option<String>,
}

impl RenderInput {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seek: None,
            format: None,
        }
    }

    pub fn with_seek(mut self, seconds: f64) -> Self {
        self.seek = Some(seconds);
        self
    }

    pub fn concat_manifest(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seek: None,
            format: Some("concat".to_string()),
        }
    }
}

/// One invocation of the external renderer.
///
/// Inputs are numbered in order (`[0:v]`, `[1:v]`, ...) inside `filter_graph`.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderRequest {
    pub inputs: Vec<RenderInput>,
    pub filter_graph: Option<String>,
    /// Output duration in seconds.
    pub duration: Option<f64>,
    pub fps: Option<f64>,
    /// Copy streams instead of re-encoding. Incompatible with a filter graph.
    pub stream_copy: bool,
    pub output: PathBuf,
}

impl RenderRequest {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            inputs: Vec::new(),
            filter_graph: None,
            duration: None,
            fps: None,
            stream_copy: false,
            output: output.into(),
        }
    }

    pub fn validate(&self) -> ShotreelResult<()> {
        if self.stream_copy && self.filter_graph.is_some() {
            return Err(ShotreelError::validation(
                "stream copy cannot be combined with a filter graph",
            ));
        }
        if self.inputs.is_empty() && self.filter_graph.is_none() {
            return Err(ShotreelError::validation(
                "render request needs at least one input or a source filter graph",
            ));
        }
        if self.duration.is_some_and(|d| !(d > 0.0)) {
            return Err(ShotreelError::validation("render duration must be > 0"));
        }
        if self.fps.is_some_and(|r| !(r > 0.0)) {
            return Err(ShotreelError::validation("render fps must be > 0"));
        }
        Ok(())
    }

    /// Argument list for the ffmpeg command line, without the program name.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-hide_banner", "-nostdin", "-loglevel", "error"]
            .into_iter()
            .map(OsString::from)
            .collect();

        for input in &self.inputs {
            if let Some(format) = &input.format {
                args.push("-f".into());
                args.push(format.into());
                if format == "concat" {
                    args.push("-safe".into());
                    args.push("0".into());
                }
            }
            if let Some(seek) = input.seek {
                args.push("-ss".into());
                args.push(seconds_arg(seek).into());
            }
            args.push("-i".into());
            args.push(input.path.clone().into());
        }

        if let Some(graph) = &self.filter_graph {
            args.push("-filter_complex".into());
            args.push(graph.into());
        }

        if self.stream_copy {
            args.push("-c".into());
            args.push("copy".into());
        } else {
            args.extend(
                ["-an", "-c:v", "libx264", "-pix_fmt", "yuv420p"]
                    .into_iter()
                    .map(OsString::from),
            );
        }

        if let Some(duration) = self.duration {
            args.push("-t".into());
            args.push(seconds_arg(duration).into());
        }
        if let Some(fps) = self.fps {
            args.push("-r".into());
            args.push(rate_arg(fps).into());
        }

        args.push(self.output.clone().into());
        args
    }
}

fn seconds_arg(seconds: f64) -> String {
    format!("{seconds:.6}")
}

fn rate_arg(fps: f64) -> String {
    if fps.fract() == 0.0 {
        format!("{}", fps as i64)
    } else {
        format!("{fps:.6}")
    }
}

/// The external media tool, treated as a black box.
///
/// Implementations must be usable from several conversion workers at once.
pub trait MediaTool: Send + Sync {
    /// Runs a single-entry stream probe and returns the tool's raw `key=value` output.
    fn probe(&self, path: &Path, entry: ProbeEntry) -> ShotreelResult<String>;

    /// Runs a render to completion. Succeeds only if the tool exited cleanly and the
    /// output file exists.
    fn render(&self, request: &RenderRequest) -> ShotreelResult<()>;
}

/// [`MediaTool`] backed by the `ffmpeg` and `ffprobe` executables.
#[derive(Clone, Debug)]
pub struct FfmpegTool {
    pub ffmpeg_bin: PathBuf,
    pub ffprobe_bin: PathBuf,
}

impl FfmpegTool {
    pub fn new(ffmpeg_bin: impl Into<PathBuf>, ffprobe_bin: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.ffmpeg_bin.clone(), cfg.ffprobe_bin.clone())
    }

    pub fn is_available(&self) -> bool {
        [&self.ffmpeg_bin, &self.ffprobe_bin].into_iter().all(|bin| {
            Command::new(bin)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|s| s.success())
                .unwrap_or(false)
        })
    }
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl MediaTool for FfmpegTool {
    fn probe(&self, path: &Path, entry: ProbeEntry) -> ShotreelResult<String> {
        if !path.is_file() {
            return Err(ShotreelError::probe(format!(
                "file '{}' was not found",
                path.display()
            )));
        }

        let out = Command::new(&self.ffprobe_bin)
            .arg(path)
            .args(["-v", "error", "-select_streams", "v:0", "-print_format", "flat"])
            .arg("-show_entries")
            .arg(format!("stream={}", entry.stream_entry()))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                ShotreelError::probe(format!(
                    "failed to spawn '{}' (is it installed?): {e}",
                    self.ffprobe_bin.display()
                ))
            })?;

        if !out.status.success() {
            return Err(ShotreelError::probe(format!(
                "ffprobe failed for '{}': {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    fn render(&self, request: &RenderRequest) -> ShotreelResult<()> {
        request.validate()?;
        if let Some(parent) = request.output.parent()
            && !parent.as_os_str().is_empty()
        {
            use anyhow::Context as _;
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create output directory '{}'", parent.display())
            })?;
        }

        let args = request.to_args();
        debug!(bin = %self.ffmpeg_bin.display(), ?args, "running ffmpeg");

        let out = Command::new(&self.ffmpeg_bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                ShotreelError::render(format!(
                    "failed to spawn '{}' (is it installed?): {e}",
                    self.ffmpeg_bin.display()
                ))
            })?;

        if !out.status.success() {
            return Err(ShotreelError::render(format!(
                "ffmpeg exited with status {} for '{}': {}",
                out.status,
                request.output.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        if !request.output.is_file() {
            return Err(ShotreelError::render(format!(
                "ffmpeg produced no output at '{}'",
                request.output.display()
            )));
        }
        Ok(())
    }
}
