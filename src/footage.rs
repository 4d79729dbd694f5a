//! Footage sources and shot-name matching.

use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::{
    foundation::error::{ShotreelError, ShotreelResult},
    location::{FootageMatch, Location},
    media,
};

/// Case-insensitive matcher for a shot identifier inside a file name.
///
/// The identifier is used as a regular expression when it parses as one, otherwise as a
/// literal substring.
#[derive(Clone, Debug)]
pub enum ShotPattern {
    Regex(Regex),
    Literal(String),
}

impl ShotPattern {
    pub fn new(name: &str) -> Self {
        match RegexBuilder::new(name).case_insensitive(true).build() {
            Ok(re) => Self::Regex(re),
            Err(_) => Self::Literal(name.to_lowercase()),
        }
    }

    /// Matches against the file name only, never the directory part.
    pub fn matches_file(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name() else {
            return false;
        };
        let file_name = file_name.to_string_lossy();
        match self {
            Self::Regex(re) => re.is_match(&file_name),
            Self::Literal(needle) => file_name.to_lowercase().contains(needle.as_str()),
        }
    }
}

/// Last-modified time, or the epoch when the filesystem cannot report one.
pub(crate) fn modified_time(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Picks the most recently modified path; the later entry wins a tie.
pub(crate) fn latest_of(paths: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    paths
        .into_iter()
        .map(|p| (modified_time(&p), p))
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, p)| p)
}

/// Where a clip looks for its footage.
#[derive(Clone, Copy, Debug)]
pub enum FootageSource<'a> {
    /// A plain search root, scanned recursively for video files.
    Folder(&'a Path),
    /// A prioritized location tree.
    Locations(&'a Location),
}

/// What a successful lookup resolved to.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedFootage {
    pub path: PathBuf,
    /// Pass (location) name when the footage came from a location tree.
    pub pass_name: Option<String>,
}

impl From<FootageMatch> for ResolvedFootage {
    fn from(m: FootageMatch) -> Self {
        Self {
            path: m.path,
            pass_name: Some(m.location_name),
        }
    }
}

impl FootageSource<'_> {
    /// Resolves the latest footage for shot `name`.
    ///
    /// `location_filter` only applies to location trees and restricts the lookup to the
    /// sub-location of that name. `Ok(None)` means nothing matched.
    pub fn resolve(
        &self,
        name: &str,
        location_filter: Option<&str>,
    ) -> ShotreelResult<Option<ResolvedFootage>> {
        match self {
            FootageSource::Folder(root) => Ok(latest_in_folder(root, name)?.map(|path| {
                ResolvedFootage {
                    path,
                    pass_name: None,
                }
            })),
            FootageSource::Locations(root) => {
                let found = match location_filter {
                    Some(loc) => root.find_latest_in_named(name, "video/", "*", loc)?,
                    None => root.find_latest_across_all_locations(name, "video/")?,
                };
                Ok(found.map(ResolvedFootage::from))
            }
        }
    }
}

/// Recursively scans `root` for video files whose name matches `name`, returning the most
/// recently modified one.
pub fn latest_in_folder(root: &Path, name: &str) -> ShotreelResult<Option<PathBuf>> {
    if !root.is_dir() {
        return Err(ShotreelError::resolution(format!(
            "footage folder '{}' does not exist",
            root.display()
        )));
    }
    let pattern = ShotPattern::new(name);
    let candidates = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| media::is_video(p) && pattern.matches_file(p));
    Ok(latest_of(candidates))
}
