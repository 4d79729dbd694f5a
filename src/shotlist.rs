//! Shot-list files: a JSON array of `{name, startFrame, durationSeconds, fps?}` records.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    clip::Clip,
    config::Config,
    foundation::error::{ShotreelError, ShotreelResult},
    media,
    probe::{probe_duration, probe_frame_rate},
    tool::MediaTool,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotEntry {
    pub name: String,
    pub start_frame: i64,
    pub duration_seconds: f64,
    /// Informational; loading an edit ignores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
}

/// Reads a shot list, sorted by start frame.
pub fn load_shot_list(path: &Path) -> ShotreelResult<Vec<ShotEntry>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read shot list '{}'", path.display()))?;
    let mut shots: Vec<ShotEntry> = serde_json::from_str(&text)
        .map_err(|e| ShotreelError::serde(format!("parse shot list '{}': {e}", path.display())))?;
    shots.sort_by_key(|s| s.start_frame);
    Ok(shots)
}

pub fn save_shot_list(path: &Path, shots: &[ShotEntry]) -> ShotreelResult<()> {
    let text = serde_json::to_string_pretty(shots)
        .map_err(|e| ShotreelError::serde(format!("serialize shot list: {e}")))?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory '{}'", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("write shot list '{}'", path.display()))?;
    Ok(())
}

/// Video files directly inside `folder`, sorted by file name.
pub fn video_files(folder: &Path) -> ShotreelResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder)
        .with_context(|| format!("read folder '{}'", folder.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && media::is_video(p))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Builds a shot list from the video files in `folder`, each starting at frame 0 with its
/// probed duration and frame rate. Files that cannot be probed are skipped.
pub fn scan_folder(folder: &Path, tool: &dyn MediaTool) -> ShotreelResult<Vec<ShotEntry>> {
    let mut shots = Vec::new();
    for path in video_files(folder)? {
        let name = file_stem(&path);
        let probed = probe_duration(tool, &path)
            .and_then(|d| Ok((d, probe_frame_rate(tool, &path)?)));
        match probed {
            Ok((duration_seconds, fps)) => {
                debug!(shot = %name, duration_seconds, fps, "scanned");
                shots.push(ShotEntry {
                    name,
                    start_frame: 0,
                    duration_seconds,
                    fps: Some(fps),
                });
            }
            Err(err) => warn!(path = %path.display(), error = %err, "skipping unprobeable file"),
        }
    }
    Ok(shots)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Stamps the shot mask onto a single video, writing `{stem}_shotmask.mp4` into `out_dir`.
pub fn mask_file(
    config: Arc<Config>,
    path: &Path,
    out_dir: &Path,
    tool: &dyn MediaTool,
) -> ShotreelResult<PathBuf> {
    let stem = file_stem(path);
    let out = out_dir.join(format!("{stem}_shotmask.mp4"));
    let mut clip = Clip::new(config, stem, 0, 0.0);
    if !clip.bind_footage(path, tool) {
        return Err(ShotreelError::probe(format!(
            "cannot read '{}'",
            path.display()
        )));
    }
    clip.convert(&out, tool)?;
    Ok(out)
}
