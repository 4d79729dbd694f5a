use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    footage::{ShotPattern, latest_of, modified_time},
    foundation::error::{ShotreelError, ShotreelResult},
    media,
};

/// One footage repository in a prioritized search tree.
///
/// A location's search path is its parent's path joined with its own folder. Children are
/// kept sorted by descending priority; children with equal priority keep insertion order.
#[derive(Clone, Debug)]
pub struct Location {
    name: String,
    folder: PathBuf,
    priority: i32,
    parent_path: PathBuf,
    subfolders_only: bool,
    children: Vec<Location>,
}

/// The most recent match for a shot inside one location.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FootageMatch {
    /// The shot name that was searched for.
    pub name: String,
    pub path: PathBuf,
    pub location_name: String,
    pub priority: i32,
}

/// Per-location file listing, nested the same way as the location tree.
#[derive(Clone, Debug, serde::Serialize)]
pub struct LocationListing {
    pub name: String,
    pub path: PathBuf,
    pub files: Vec<PathBuf>,
    pub children: Vec<LocationListing>,
}

/// Serialized form of a location tree, as written in a locations file.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LocationSpec {
    pub name: String,
    pub folder: PathBuf,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub subfolders_only: bool,
    #[serde(default)]
    pub children: Vec<LocationSpec>,
}

impl Location {
    pub fn new(name: impl Into<String>, folder: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            folder: folder.into(),
            priority: 0,
            parent_path: PathBuf::new(),
            subfolders_only: false,
            children: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Search the immediate child directories of the folder instead of the folder itself.
    pub fn with_subfolders_only(mut self, subfolders_only: bool) -> Self {
        self.subfolders_only = subfolders_only;
        self
    }

    pub fn from_spec(spec: &LocationSpec) -> Self {
        let mut loc = Location::new(spec.name.clone(), spec.folder.clone())
            .with_priority(spec.priority)
            .with_subfolders_only(spec.subfolders_only);
        for child in &spec.children {
            loc.add_child(Location::from_spec(child));
        }
        loc
    }

    pub fn load(path: &Path) -> ShotreelResult<Self> {
        use anyhow::Context as _;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read locations '{}'", path.display()))?;
        let spec: LocationSpec = serde_json::from_str(&text).map_err(|e| {
            ShotreelError::serde(format!("parse locations '{}': {e}", path.display()))
        })?;
        Ok(Location::from_spec(&spec))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn children(&self) -> &[Location] {
        &self.children
    }

    /// Effective search path: parent path joined with this location's folder.
    pub fn path(&self) -> PathBuf {
        if self.parent_path.as_os_str().is_empty() {
            self.folder.clone()
        } else {
            self.parent_path.join(&self.folder)
        }
    }

    /// Adds `child` below this location. The child's subtree is re-rooted under this path.
    /// No de-duplication happens; a repeated name becomes a second entry.
    pub fn add_child(&mut self, mut child: Location) {
        child.reroot(self.path());
        self.children.push(child);
        // `sort_by` is stable, equal priorities keep insertion order.
        self.children.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    fn reroot(&mut self, parent_path: PathBuf) {
        self.parent_path = parent_path;
        let path = self.path();
        for child in &mut self.children {
            child.reroot(path.clone());
        }
    }

    /// Files directly in this location, oldest first.
    fn own_files(&self, glob_pattern: &str, mime_prefix: &str) -> ShotreelResult<Vec<PathBuf>> {
        let mut pattern = glob::Pattern::escape(&self.path().to_string_lossy());
        pattern.push('/');
        if self.subfolders_only {
            pattern.push_str("*/");
        }
        pattern.push_str(if glob_pattern.is_empty() {
            "*"
        } else {
            glob_pattern
        });

        let entries = glob::glob(&pattern).map_err(|e| {
            ShotreelError::validation(format!("invalid glob pattern '{pattern}': {e}"))
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(p) => Some(p),
                Err(err) => {
                    debug!(location = %self.name, error = %err, "skipping unreadable entry");
                    None
                }
            })
            .filter(|p| p.is_file() && media::matches_media_prefix(p, mime_prefix))
            .collect();
        files.sort_by_key(|p| modified_time(p));
        Ok(files)
    }

    /// Lists files in this location, oldest first, optionally followed by each descendant's
    /// own listing in priority order. Listings are concatenated, never merged.
    pub fn list_files(
        &self,
        glob_pattern: &str,
        mime_prefix: &str,
        include_descendants: bool,
    ) -> ShotreelResult<Vec<PathBuf>> {
        let mut files = self.own_files(glob_pattern, mime_prefix)?;
        if include_descendants {
            for child in &self.children {
                files.extend(child.list_files(glob_pattern, mime_prefix, true)?);
            }
        }
        Ok(files)
    }

    pub fn files_by_location(
        &self,
        glob_pattern: &str,
        mime_prefix: &str,
    ) -> ShotreelResult<LocationListing> {
        Ok(LocationListing {
            name: self.name.clone(),
            path: self.path(),
            files: self.own_files(glob_pattern, mime_prefix)?,
            children: self
                .children
                .iter()
                .map(|c| c.files_by_location(glob_pattern, mime_prefix))
                .collect::<ShotreelResult<_>>()?,
        })
    }

    fn collect_latest(
        &self,
        pattern: &ShotPattern,
        name: &str,
        mime_prefix: &str,
        glob_pattern: &str,
        out: &mut Vec<FootageMatch>,
    ) -> ShotreelResult<()> {
        for child in &self.children {
            child.collect_latest(pattern, name, mime_prefix, glob_pattern, out)?;
        }
        let found = self
            .own_files(glob_pattern, mime_prefix)?
            .into_iter()
            .filter(|p| pattern.matches_file(p));
        if let Some(path) = latest_of(found) {
            out.push(FootageMatch {
                name: name.to_string(),
                path,
                location_name: self.name.clone(),
                priority: self.priority,
            });
        }
        Ok(())
    }

    /// The newest matching file per location, across this location and all descendants,
    /// sorted by descending priority.
    pub fn find_latest_in_location(
        &self,
        name: &str,
        mime_prefix: &str,
        glob_pattern: &str,
    ) -> ShotreelResult<Vec<FootageMatch>> {
        let pattern = ShotPattern::new(name);
        let mut found = Vec::new();
        self.collect_latest(&pattern, name, mime_prefix, glob_pattern, &mut found)?;
        found.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(found)
    }

    /// Like [`Location::find_latest_in_location`], restricted to the location named
    /// `location_name`. Never returns more than one match.
    pub fn find_latest_in_named(
        &self,
        name: &str,
        mime_prefix: &str,
        glob_pattern: &str,
        location_name: &str,
    ) -> ShotreelResult<Option<FootageMatch>> {
        Ok(self
            .find_latest_in_location(name, mime_prefix, glob_pattern)?
            .into_iter()
            .find(|m| m.location_name == location_name))
    }

    /// The single highest-priority match in the whole tree.
    pub fn find_latest_across_all_locations(
        &self,
        name: &str,
        mime_prefix: &str,
    ) -> ShotreelResult<Option<FootageMatch>> {
        Ok(self
            .find_latest_in_location(name, mime_prefix, "*")?
            .into_iter()
            .next())
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path().display())
    }
}
