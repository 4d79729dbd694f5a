use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use anyhow::Context as _;
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::{
    clip::{Clip, FindOptions},
    config::Config,
    filtergraph::{MaskMode, ShotMask},
    footage::FootageSource,
    foundation::{
        core::seconds_to_frames,
        error::{ShotreelError, ShotreelResult},
    },
    shotlist::load_shot_list,
    tool::{MediaTool, RenderInput, RenderRequest},
};

/// Temp directories created by an [`Edit`] carry this prefix; cleanup refuses anything else.
pub const TEMP_DIR_PREFIX: &str = "shotreel_";

/// Name of the concat manifest written by [`Edit::fastbuild`].
pub const MANIFEST_NAME: &str = "edit.txt";

const PATH_NOTE_LIMIT: usize = 35;

/// How [`Edit::conform`] reconciles durations with cut points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConformMode {
    /// Durations follow the gaps between in-frames, at the edit's frame rate.
    InFrame,
    /// Like `InFrame`, but each gap is divided by the clip's own frame rate.
    InFrameClip,
    /// Durations are kept; in-frames are rebuilt back to back from them.
    Duration,
}

impl FromStr for ConformMode {
    type Err = ShotreelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_frame" => Ok(Self::InFrame),
            "in_frame_clip" => Ok(Self::InFrameClip),
            "duration" => Ok(Self::Duration),
            other => Err(ShotreelError::validation(format!(
                "unknown conform mode '{other}', expected 'in_frame', 'in_frame_clip' or 'duration'"
            ))),
        }
    }
}

#[derive(Debug)]
pub struct ClipFailure {
    pub name: String,
    pub error: ShotreelError,
}

/// Outcome of [`Edit::preconvert_clips`].
#[derive(Debug)]
pub struct PreconvertReport {
    pub temp_dir: PathBuf,
    /// Entries with a rendered output on disk afterwards.
    pub converted: usize,
    pub failures: Vec<ClipFailure>,
}

impl PreconvertReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// An ordered timeline of clips and slates.
///
/// Entries are always sorted by ascending in-frame.
#[derive(Debug)]
pub struct Edit {
    name: String,
    config: Arc<Config>,
    fps: f64,
    entries: Vec<Clip>,
    temp_dir: Option<PathBuf>,
    shot_list_path: Option<PathBuf>,
    footage_label: Option<String>,
}

impl Edit {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            name: config.name.clone(),
            fps: config.fps,
            config,
            entries: Vec::new(),
            temp_dir: None,
            shot_list_path: None,
            footage_label: None,
        }
    }

    /// Builds an edit from a shot-list file. Entries are placed at their own start frames.
    pub fn from_shot_list(config: Arc<Config>, path: &Path) -> ShotreelResult<Self> {
        let shots = load_shot_list(path)?;
        let mut edit = Self::new(config);
        for shot in shots {
            let clip = Clip::new(
                Arc::clone(&edit.config),
                shot.name,
                shot.start_frame,
                shot.duration_seconds,
            );
            edit.add_clip(clip, false);
        }
        edit.shot_list_path = Some(path.to_path_buf());
        info!(edit = %edit.name, entries = edit.entries.len(), "loaded shot list");
        Ok(edit)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn entries(&self) -> &[Clip] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn temp_dir(&self) -> Option<&Path> {
        self.temp_dir.as_deref()
    }

    /// Free-form description of where footage came from, shown on the auto slate.
    pub fn set_footage_label(&mut self, label: impl Into<String>) {
        self.footage_label = Some(label.into());
    }

    /// Minimum in-frame over all entries, 0 for an empty edit.
    pub fn frame_offset(&self) -> i64 {
        self.entries.iter().map(Clip::in_frame).min().unwrap_or(0)
    }

    pub fn is_ready(&self) -> bool {
        !self.entries.is_empty()
            && self
                .entries
                .iter()
                .all(|c| c.is_ready() && c.is_converted())
    }

    fn sort_entries(&mut self) {
        self.entries.sort_by_key(Clip::in_frame);
    }

    /// Inserts `clip`. A sequential add places it after everything already in the edit,
    /// at the sum of each entry's `duration * fps`; otherwise its own in-frame is kept.
    pub fn add_clip(&mut self, clip: Clip, sequential: bool) {
        let clip = if sequential {
            let end: f64 = self.entries.iter().map(|c| c.duration() * c.fps()).sum();
            clip.with_in_frame(end.round() as i64)
        } else {
            clip
        };
        debug!(edit = %self.name, clip = %clip.name(), in_frame = clip.in_frame(), "adding clip");
        self.entries.push(clip);
        self.sort_entries();
    }

    pub fn conform(&mut self, mode: ConformMode) {
        self.sort_entries();
        let fps = self.fps;
        match mode {
            ConformMode::InFrame | ConformMode::InFrameClip => {
                for i in 1..self.entries.len() {
                    let next_in = self.entries[i].in_frame();
                    let clip = &mut self.entries[i - 1];
                    let rate = if mode == ConformMode::InFrame {
                        fps
                    } else {
                        clip.fps()
                    };
                    let frames = (next_in - clip.in_frame()) as f64;
                    clip.set_duration(frames / rate);
                }
            }
            ConformMode::Duration => {
                for i in 1..self.entries.len() {
                    let prev = &self.entries[i - 1];
                    let in_frame = prev.in_frame() + seconds_to_frames(prev.duration(), fps);
                    self.entries[i].set_in_frame(in_frame);
                }
            }
        }
        self.sort_entries();
        debug!(edit = %self.name, ?mode, "conformed edit");
    }

    /// Conforms by mode name. An unknown name leaves the edit untouched and returns false.
    pub fn conform_named(&mut self, mode: &str) -> bool {
        match mode.parse::<ConformMode>() {
            Ok(mode) => {
                self.conform(mode);
                true
            }
            Err(err) => {
                warn!(edit = %self.name, error = %err, "conform skipped");
                false
            }
        }
    }

    fn slate_notes(&self) -> Vec<String> {
        let size = self.config.frame_size;
        let mut notes = vec![
            format!("size: {} x {}", size.width, size.height),
            format!("fps: {}", self.fps),
            format!("pass: {}", self.config.default_pass_name),
        ];
        if let Some(path) = &self.shot_list_path {
            notes.push(format!(
                "Source: {}",
                abbreviate_path(&path.to_string_lossy(), 2)
            ));
        }
        if let Some(label) = &self.footage_label {
            notes.push(format!("Footage Source: {}", abbreviate_path(label, 5)));
        }
        notes
    }

    /// Inserts a slate summarizing the edit's settings and sources.
    ///
    /// Without an explicit duration the slate sits at frame 0 and fills the lead-in up to the
    /// frame offset. With one, it is placed so it ends at the current first cut.
    pub fn add_auto_slate(&mut self, duration: Option<f64>) {
        let offset = self.frame_offset();
        let (in_frame, duration) = match duration {
            Some(d) => (offset - seconds_to_frames(d, self.fps), d),
            None => (0, offset as f64 / self.fps),
        };
        let slate = Clip::slate(
            Arc::clone(&self.config),
            self.name.clone(),
            self.slate_notes(),
            duration,
        )
        .with_in_frame(in_frame);
        if !slate.is_ready() {
            warn!(edit = %self.name, duration, "auto slate has no usable duration");
        }
        self.add_clip(slate, false);
    }

    /// Resolves footage for every entry. Returns how many entries found footage.
    pub fn find_footage(
        &mut self,
        source: FootageSource<'_>,
        opts: &FindOptions,
        tool: &dyn MediaTool,
    ) -> usize {
        if self.footage_label.is_none() {
            self.footage_label = Some(match source {
                FootageSource::Folder(path) => path.display().to_string(),
                FootageSource::Locations(root) => root.to_string(),
            });
        }
        let found = self
            .entries
            .iter_mut()
            .filter(|c| !c.is_slate())
            .filter_map(|c| c.find_footage(source, opts, tool))
            .count();
        info!(edit = %self.name, found, total = self.entries.len(), "resolved footage");
        found
    }

    fn ensure_temp_dir(&mut self, requested: Option<&Path>) -> ShotreelResult<PathBuf> {
        if let Some(dir) = requested {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create temp directory '{}'", dir.display()))?;
            self.temp_dir = Some(dir.to_path_buf());
            return Ok(dir.to_path_buf());
        }
        if let Some(dir) = &self.temp_dir
            && dir.is_dir()
        {
            return Ok(dir.clone());
        }
        let dir = tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .tempdir()
            .context("create temp directory")?
            .keep();
        debug!(edit = %self.name, dir = %dir.display(), "created temp directory");
        self.temp_dir = Some(dir.clone());
        Ok(dir)
    }

    /// Converts every entry into `{temp_dir}/{name}.mp4`, ready or not. Names used by more
    /// than one entry get their position appended so no two entries share an output.
    ///
    /// Entries without footage come out as missing-media placeholders. A failed conversion
    /// is recorded in the report and the remaining entries still run. With
    /// `parallel_jobs > 1` entries are converted on a bounded worker pool.
    #[instrument(skip_all, fields(edit = %self.name))]
    pub fn preconvert_clips(
        &mut self,
        tool: &dyn MediaTool,
        temp_dir: Option<&Path>,
    ) -> ShotreelResult<PreconvertReport> {
        if self.entries.iter().any(|c| !c.is_ready()) {
            info!(edit = %self.name, "not all clips are ready, output will have missing media clips");
        }
        let dir = self.ensure_temp_dir(temp_dir)?;
        let jobs = self.config.parallel_jobs.max(1);

        let outputs = self.output_paths(&dir);

        let convert_one = |(clip, output): (&mut Clip, &PathBuf)| -> Option<ClipFailure> {
            match clip.convert(output, tool) {
                Ok(()) => None,
                Err(error) => {
                    warn!(clip = %clip.name(), error = %error, "conversion failed");
                    Some(ClipFailure {
                        name: clip.name().to_string(),
                        error,
                    })
                }
            }
        };

        let failures: Vec<ClipFailure> = if jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .map_err(|e| anyhow::anyhow!("failed to build conversion thread pool: {e}"))?;
            pool.install(|| {
                self.entries
                    .par_iter_mut()
                    .zip(outputs.par_iter())
                    .filter_map(convert_one)
                    .collect()
            })
        } else {
            self.entries
                .iter_mut()
                .zip(outputs.iter())
                .filter_map(convert_one)
                .collect()
        };

        let converted = self.entries.iter().filter(|c| c.is_converted()).count();
        info!(edit = %self.name, converted, failed = failures.len(), "preconverted clips");
        Ok(PreconvertReport {
            temp_dir: dir,
            converted,
            failures,
        })
    }

    fn output_paths(&self, dir: &Path) -> Vec<PathBuf> {
        let mut uses: HashMap<&str, usize> = HashMap::new();
        for clip in &self.entries {
            *uses.entry(clip.name()).or_default() += 1;
        }
        self.entries
            .iter()
            .enumerate()
            .map(|(i, clip)| {
                if uses[clip.name()] > 1 {
                    dir.join(format!("{}_{i}.mp4", clip.name()))
                } else {
                    dir.join(format!("{}.mp4", clip.name()))
                }
            })
            .collect()
    }

    fn converted_paths(&self) -> Vec<PathBuf> {
        self.entries
            .iter()
            .filter_map(|clip| match clip.converted_path() {
                Some(path) if clip.is_converted() => Some(path.to_path_buf()),
                _ => {
                    warn!(
                        clip = %clip.name(),
                        "skipping unconverted clip, preconvert all clips before building"
                    );
                    None
                }
            })
            .collect()
    }

    /// Writes the concat manifest for all converted entries and returns its path.
    pub fn write_manifest(&mut self) -> ShotreelResult<PathBuf> {
        let paths = self.converted_paths();
        let dir = self.ensure_temp_dir(None)?;
        let manifest = dir.join(MANIFEST_NAME);
        let text = manifest_text(&paths);
        std::fs::write(&manifest, text)
            .with_context(|| format!("write concat manifest '{}'", manifest.display()))?;
        Ok(manifest)
    }

    /// Concatenates converted entries without re-encoding. No sequence timecode is drawn.
    pub fn fastbuild(&mut self, output: &Path, tool: &dyn MediaTool) -> ShotreelResult<PathBuf> {
        if !self.entries.iter().any(Clip::is_converted) {
            return Err(ShotreelError::validation(format!(
                "edit '{}' has no converted clips to build",
                self.name
            )));
        }
        let manifest = self.write_manifest()?;
        let request = RenderRequest {
            inputs: vec![RenderInput::concat_manifest(manifest)],
            stream_copy: true,
            ..RenderRequest::new(output)
        };
        tool.render(&request)?;
        info!(edit = %self.name, output = %output.display(), "fast build finished");
        Ok(output.to_path_buf())
    }

    /// Render request for the full build: converted entries concatenated and stamped with
    /// the sequence timecode.
    pub fn build_request(&self, output: &Path) -> ShotreelResult<RenderRequest> {
        let paths = self.converted_paths();
        if paths.is_empty() {
            return Err(ShotreelError::validation(format!(
                "edit '{}' has no converted clips to build",
                self.name
            )));
        }

        let mut graph: String = (0..paths.len()).map(|i| format!("[{i}:v]")).collect();
        graph.push_str(&format!("concat=n={}:v=1:a=0,", paths.len()));
        let mut mask = ShotMask::new(MaskMode::Sequence, self.config.frame_size, self.fps);
        mask.font_file = self.config.font_file.clone();
        graph.push_str(&mask.filter_graph());

        Ok(RenderRequest {
            inputs: paths.into_iter().map(RenderInput::file).collect(),
            filter_graph: Some(graph),
            fps: Some(self.fps),
            ..RenderRequest::new(output)
        })
    }

    /// Re-encodes all converted entries into one stamped sequence.
    #[instrument(skip_all, fields(edit = %self.name, output = %output.display()))]
    pub fn build(&self, output: &Path, tool: &dyn MediaTool) -> ShotreelResult<PathBuf> {
        tool.render(&self.build_request(output)?)?;
        info!(edit = %self.name, output = %output.display(), "build finished");
        Ok(output.to_path_buf())
    }

    /// Removes the temp directory if it carries [`TEMP_DIR_PREFIX`]. Returns whether
    /// anything was removed.
    pub fn cleanup(&mut self) -> ShotreelResult<bool> {
        let Some(dir) = self.temp_dir.clone() else {
            return Ok(false);
        };
        if !dir.exists() {
            self.temp_dir = None;
            return Ok(false);
        }
        let owned = dir
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with(TEMP_DIR_PREFIX));
        if !owned {
            warn!(dir = %dir.display(), "not removing temp directory without the '{TEMP_DIR_PREFIX}' prefix");
            return Ok(false);
        }
        info!(dir = %dir.display(), "removing temp directory");
        std::fs::remove_dir_all(&dir)
            .with_context(|| format!("remove temp directory '{}'", dir.display()))?;
        self.temp_dir = None;
        Ok(true)
    }
}

fn manifest_text(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| {
            let abs = std::path::absolute(p).unwrap_or_else(|_| p.clone());
            format!("file '{}'\n", abs.to_string_lossy().replace('\'', r"'\''"))
        })
        .collect()
}

/// Shortens long paths to their last `keep` components.
fn abbreviate_path(path: &str, keep: usize) -> String {
    if path.chars().count() < PATH_NOTE_LIMIT {
        return path.to_string();
    }
    let parts: Vec<Component<'_>> = Path::new(path).components().collect();
    let tail: PathBuf = parts[parts.len().saturating_sub(keep)..].iter().collect();
    tail.display().to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::tool::ProbeEntry;

    /// Writes an empty output for every render and remembers the request.
    #[derive(Default)]
    struct TouchTool {
        renders: Mutex<Vec<RenderRequest>>,
    }

    impl MediaTool for TouchTool {
        fn probe(&self, _path: &Path, entry: ProbeEntry) -> ShotreelResult<String> {
            Ok(match entry {
                ProbeEntry::FrameRate => "streams.stream.0.r_frame_rate=\"30/1\"\n".to_string(),
                ProbeEntry::Duration => "streams.stream.0.duration=\"3.0\"\n".to_string(),
            })
        }

        fn render(&self, request: &RenderRequest) -> ShotreelResult<()> {
            request.validate()?;
            if let Some(parent) = request.output.parent() {
                std::fs::create_dir_all(parent).map_err(anyhow::Error::from)?;
            }
            std::fs::write(&request.output, b"").map_err(anyhow::Error::from)?;
            self.renders.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    fn cfg() -> Arc<Config> {
        Arc::new(Config::default().with_fps(30.0))
    }

    fn edit_with(in_frames: &[(i64, f64)]) -> Edit {
        let config = cfg();
        let mut edit = Edit::new(Arc::clone(&config));
        for (i, (in_frame, duration)) in in_frames.iter().enumerate() {
            let clip = Clip::new(Arc::clone(&config), format!("S{i:03}"), *in_frame, *duration);
            edit.add_clip(clip, false);
        }
        edit
    }

    fn in_frames(edit: &Edit) -> Vec<i64> {
        edit.entries().iter().map(Clip::in_frame).collect()
    }

    #[test]
    fn explicit_adds_sort_by_in_frame() {
        let edit = edit_with(&[(80, 1.0), (60, 1.0), (20, 1.0)]);
        assert_eq!(in_frames(&edit), vec![20, 60, 80]);
        assert_eq!(edit.frame_offset(), 20);
    }

    #[test]
    fn sequential_add_appends_after_existing_entries() {
        let config = cfg();
        let mut edit = Edit::new(Arc::clone(&config));
        edit.add_clip(Clip::new(Arc::clone(&config), "a", 500, 2.0), true);
        edit.add_clip(Clip::new(Arc::clone(&config), "b", 500, 1.5), true);
        edit.add_clip(Clip::new(Arc::clone(&config), "c", 7, 1.0), true);
        assert_eq!(in_frames(&edit), vec![0, 60, 105]);
    }

    #[test]
    fn conform_in_frame_leaves_last_duration() {
        let mut edit = edit_with(&[(0, 9.0), (30, 9.0), (90, 9.0)]);
        edit.conform(ConformMode::InFrame);
        let durations: Vec<f64> = edit.entries().iter().map(Clip::duration).collect();
        assert_eq!(durations, vec![1.0, 2.0, 9.0]);
    }

    #[test]
    fn conform_in_frame_clip_uses_clip_rate() {
        let config = cfg();
        let mut edit = Edit::new(Arc::clone(&config));
        let mut slow = Clip::slate(Arc::clone(&config), "t", vec![], 1.0);
        slow.set_in_frame(0);
        edit.add_clip(slow, false);
        edit.add_clip(Clip::new(Arc::clone(&config), "b", 60, 1.0), false);
        edit.fps = 24.0;
        edit.conform(ConformMode::InFrameClip);
        assert_eq!(edit.entries()[0].duration(), 2.0);
        edit.conform(ConformMode::InFrame);
        assert_eq!(edit.entries()[0].duration(), 2.5);
    }

    #[test]
    fn conform_duration_rebuilds_in_frames() {
        let mut edit = edit_with(&[(0, 2.0), (500, 3.0)]);
        edit.conform(ConformMode::Duration);
        assert_eq!(in_frames(&edit), vec![0, 60]);
    }

    #[test]
    fn unknown_conform_mode_is_a_no_op() {
        let mut edit = edit_with(&[(0, 2.0), (500, 3.0)]);
        assert!(!edit.conform_named("by_vibes"));
        assert_eq!(in_frames(&edit), vec![0, 500]);
        assert!(edit.conform_named("duration"));
        assert_eq!(in_frames(&edit), vec![0, 60]);
    }

    #[test]
    fn auto_slate_fills_lead_in() {
        let mut edit = edit_with(&[(120, 2.0), (180, 2.0)]);
        edit.add_auto_slate(None);
        let slate = &edit.entries()[0];
        assert!(slate.is_slate());
        assert_eq!(slate.in_frame(), 0);
        assert_eq!(slate.duration(), 4.0);
        assert_eq!(edit.frame_offset(), 0);
    }

    #[test]
    fn auto_slate_with_duration_ends_at_first_cut() {
        let mut edit = edit_with(&[(0, 2.0)]);
        edit.add_auto_slate(Some(5.0));
        assert_eq!(in_frames(&edit), vec![-150, 0]);
        assert!(edit.entries()[0].is_ready());
    }

    #[test]
    fn abbreviates_long_paths() {
        assert_eq!(abbreviate_path("/short/shots.json", 2), "/short/shots.json");
        assert_eq!(
            abbreviate_path("/mnt/projects/show/episode_01/edit/shots.json", 2),
            "edit/shots.json"
        );
    }

    #[test]
    fn preconvert_then_ready() {
        let dir = tempfile::tempdir().unwrap();
        let tool = TouchTool::default();
        let mut edit = edit_with(&[(0, 2.0), (60, 1.0)]);
        assert!(!edit.is_ready());

        let report = edit.preconvert_clips(&tool, Some(dir.path())).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.converted, 2);
        assert!(edit.entries().iter().all(Clip::is_missing_media));
        assert!(edit.is_ready());
        assert!(dir.path().join("S000.mp4").is_file());
        assert!(dir.path().join("missingMedia_S000.mp4").is_file());

        // A temp dir the edit did not name itself is left alone.
        assert!(!edit.cleanup().unwrap());
        assert!(dir.path().is_dir());
    }

    #[test]
    fn repeated_names_get_separate_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let tool = TouchTool::default();
        let config = Arc::new(Config {
            parallel_jobs: 2,
            ..Config::default().with_fps(30.0)
        });
        let mut edit = Edit::new(Arc::clone(&config));
        edit.add_clip(Clip::new(Arc::clone(&config), "S010", 0, 1.0), true);
        edit.add_clip(Clip::new(Arc::clone(&config), "S010", 0, 1.0), true);
        edit.add_clip(Clip::new(Arc::clone(&config), "S020", 0, 1.0), true);

        let report = edit.preconvert_clips(&tool, Some(dir.path())).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.converted, 3);
        let outputs: Vec<PathBuf> = edit
            .entries()
            .iter()
            .map(|c| c.converted_path().unwrap().to_path_buf())
            .collect();
        assert_eq!(
            outputs,
            [
                dir.path().join("S010_0.mp4"),
                dir.path().join("S010_1.mp4"),
                dir.path().join("S020.mp4"),
            ]
        );
        assert!(dir.path().join("missingMedia_S010_0.mp4").is_file());
        assert!(dir.path().join("missingMedia_S010_1.mp4").is_file());
    }

    #[test]
    fn placeholder_declares_handle_padded_duration() {
        let dir = tempfile::tempdir().unwrap();
        let tool = TouchTool::default();
        let config = Arc::new(Config::default().with_fps(30.0).with_handles(6));
        let mut edit = Edit::new(Arc::clone(&config));
        edit.add_clip(Clip::new(config, "S050", 0, 2.0), false);
        edit.preconvert_clips(&tool, Some(dir.path())).unwrap();

        let renders = tool.renders.lock().unwrap();
        assert_eq!(renders.len(), 2);
        let placeholder = &renders[0];
        assert!(placeholder.output.ends_with("missingMedia_S050.mp4"));
        assert!((placeholder.duration.unwrap() - 2.2).abs() < 1e-9);
        assert_eq!(renders[1].inputs[0].seek, Some(0.2));
        assert_eq!(renders[1].duration, Some(2.0));
    }

    #[test]
    fn fastbuild_skips_unconverted_clips() {
        let dir = tempfile::tempdir().unwrap();
        let tool = TouchTool::default();
        let mut edit = edit_with(&[(0, 2.0), (60, 1.0), (90, 1.0)]);
        edit.preconvert_clips(&tool, Some(dir.path())).unwrap();
        std::fs::remove_file(dir.path().join("S001.mp4")).unwrap();
        assert!(!edit.is_ready());

        let out = dir.path().join("edit.mp4");
        edit.fastbuild(&out, &tool).unwrap();
        let manifest = std::fs::read_to_string(dir.path().join(MANIFEST_NAME)).unwrap();
        assert!(manifest.contains("S000.mp4"));
        assert!(manifest.contains("S002.mp4"));
        assert!(!manifest.contains("S001.mp4"));
        assert_eq!(manifest.lines().count(), 2);
    }

    #[test]
    fn build_numbers_inputs_contiguously() {
        let dir = tempfile::tempdir().unwrap();
        let tool = TouchTool::default();
        let mut edit = edit_with(&[(0, 1.0), (30, 1.0), (60, 1.0)]);
        edit.preconvert_clips(&tool, Some(dir.path())).unwrap();
        std::fs::remove_file(dir.path().join("S000.mp4")).unwrap();

        let req = edit.build_request(&dir.path().join("out.mp4")).unwrap();
        assert_eq!(req.inputs.len(), 2);
        let graph = req.filter_graph.unwrap();
        assert!(graph.starts_with("[0:v][1:v]concat=n=2:v=1:a=0,drawtext="));
        assert!(graph.contains("timecode="));
    }

    #[test]
    fn build_without_converted_clips_fails() {
        let edit = edit_with(&[(0, 1.0)]);
        let err = edit.build_request(Path::new("out.mp4")).unwrap_err();
        assert!(matches!(err, ShotreelError::Validation(_)));
    }

    #[test]
    fn cleanup_removes_owned_temp_dir() {
        let tool = TouchTool::default();
        let mut edit = edit_with(&[(0, 1.0)]);
        let report = edit.preconvert_clips(&tool, None).unwrap();
        let name = report.temp_dir.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(TEMP_DIR_PREFIX));
        assert!(edit.is_ready());

        assert!(edit.cleanup().unwrap());
        assert!(!report.temp_dir.exists());
        assert!(!edit.is_ready());
        assert!(!edit.entries()[0].is_converted());
    }

    #[test]
    fn parallel_preconvert_converts_everything() {
        let dir = tempfile::tempdir().unwrap();
        let tool = TouchTool::default();
        let config = Arc::new(Config {
            parallel_jobs: 3,
            ..Config::default()
        });
        let mut edit = Edit::new(Arc::clone(&config));
        for i in 0..5 {
            edit.add_clip(Clip::new(Arc::clone(&config), format!("P{i}"), 0, 1.0), true);
        }
        let report = edit.preconvert_clips(&tool, Some(dir.path())).unwrap();
        assert_eq!(report.converted, 5);
        assert!(edit.is_ready());
    }
}
