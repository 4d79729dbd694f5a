#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, SystemTime},
};

use shotreel::{MediaTool, ProbeEntry, RenderRequest, ShotreelError, ShotreelResult};

/// Stand-in for ffmpeg: answers probes from a table and "renders" by writing an empty
/// output file.
#[derive(Default)]
pub struct FakeTool {
    pub rates: HashMap<PathBuf, String>,
    pub durations: HashMap<PathBuf, f64>,
    pub default_rate: Option<String>,
    pub default_duration: Option<f64>,
    /// Renders whose output file name contains this fail like a crashed ffmpeg.
    pub fail_on: Option<String>,
    pub renders: Mutex<Vec<RenderRequest>>,
}

impl FakeTool {
    pub fn new() -> Self {
        Self {
            default_rate: Some("24/1".to_string()),
            default_duration: Some(2.0),
            ..Self::default()
        }
    }

    pub fn renders(&self) -> Vec<RenderRequest> {
        self.renders.lock().unwrap().clone()
    }
}

impl MediaTool for FakeTool {
    fn probe(&self, path: &Path, entry: ProbeEntry) -> ShotreelResult<String> {
        if !path.is_file() {
            return Err(ShotreelError::probe(format!("'{}' not found", path.display())));
        }
        let value = match entry {
            ProbeEntry::FrameRate => self
                .rates
                .get(path)
                .cloned()
                .or_else(|| self.default_rate.clone()),
            ProbeEntry::Duration => self
                .durations
                .get(path)
                .copied()
                .or(self.default_duration)
                .map(|d| d.to_string()),
        };
        let value = value.ok_or_else(|| ShotreelError::probe("no stream"))?;
        Ok(format!(
            "streams.stream.0.{}=\"{value}\"\n",
            entry.stream_entry()
        ))
    }

    fn render(&self, request: &RenderRequest) -> ShotreelResult<()> {
        request.validate()?;
        self.renders.lock().unwrap().push(request.clone());
        let name = request.output.to_string_lossy();
        if let Some(needle) = &self.fail_on
            && name.contains(needle.as_str())
        {
            return Err(ShotreelError::render("ffmpeg exited with status 1"));
        }
        if let Some(parent) = request.output.parent() {
            std::fs::create_dir_all(parent).map_err(anyhow::Error::from)?;
        }
        std::fs::write(&request.output, b"").map_err(anyhow::Error::from)?;
        Ok(())
    }
}

/// Creates `root/rel` with a fixed modification time, `secs` after a base instant.
pub fn touch(root: &Path, rel: &str, secs: u64) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = std::fs::File::create(&path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs))
        .unwrap();
    path
}
