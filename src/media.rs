//! Media type guessing from file extensions.

use std::path::Path;

const VIDEO_EXTS: &[&str] = &[
    "mp4", "mov", "avi", "mkv", "m4v", "webm", "mxf", "mpg", "mpeg", "wmv", "flv", "ts",
];
const IMAGE_EXTS: &[&str] = &[
    "exr", "png", "jpg", "jpeg", "tif", "tiff", "tga", "hdr", "bmp", "gif", "webp",
];
const AUDIO_EXTS: &[&str] = &["wav", "mp3", "aac", "flac", "ogg", "m4a", "aiff"];

/// Top-level media type (`video/`, `image/`, `audio/`) for `path`, if recognised.
pub fn media_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let ext = ext.as_str();
    if VIDEO_EXTS.contains(&ext) {
        Some("video/")
    } else if IMAGE_EXTS.contains(&ext) {
        Some("image/")
    } else if AUDIO_EXTS.contains(&ext) {
        Some("audio/")
    } else {
        None
    }
}

/// True when `path` is of the media type named by `prefix`.
///
/// `prefix` may be given with or without the trailing slash ("video" or "video/"). An empty
/// prefix matches everything.
pub fn matches_media_prefix(path: &Path, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    let prefix = prefix.trim_end_matches('/');
    media_type(path).is_some_and(|t| t.trim_end_matches('/') == prefix)
}

pub fn is_video(path: &Path) -> bool {
    matches_media_prefix(path, "video/")
}
