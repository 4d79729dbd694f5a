//! Parsing of single-entry probe output.
//!
//! The probing tool answers with a flat `key=value` block such as
//! `streams.stream.0.r_frame_rate="30000/1001"`.

use std::path::Path;

use crate::{
    foundation::error::{ShotreelError, ShotreelResult},
    tool::{MediaTool, ProbeEntry},
};

/// Reported in place of a frame rate or duration that could not be probed.
pub const PROBE_FAILED: f64 = -1.0;

/// Value of the first `key=value` line, with wrapping quotes removed.
pub fn flat_value(output: &str) -> Option<&str> {
    output
        .lines()
        .find_map(|line| line.split_once('='))
        .map(|(_, v)| v.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|v| !v.is_empty())
}

/// Parses a rate written as a rational (`"N/D"`) or a plain float.
pub fn parse_rate(s: &str) -> Option<f64> {
    let rate = match s.split_once('/') {
        Some((n, d)) => {
            let n: f64 = n.trim().parse().ok()?;
            let d: f64 = d.trim().parse().ok()?;
            if d == 0.0 {
                return None;
            }
            n / d
        }
        None => s.trim().parse().ok()?,
    };
    rate.is_finite().then_some(rate)
}

pub fn probe_frame_rate(tool: &dyn MediaTool, path: &Path) -> ShotreelResult<f64> {
    let out = tool.probe(path, ProbeEntry::FrameRate)?;
    flat_value(&out)
        .and_then(parse_rate)
        .filter(|r| *r > 0.0)
        .ok_or_else(|| {
            ShotreelError::probe(format!(
                "no usable frame rate for '{}' in probe output {:?}",
                path.display(),
                out.trim()
            ))
        })
}

/// Raw stream duration in seconds, handles included.
pub fn probe_duration(tool: &dyn MediaTool, path: &Path) -> ShotreelResult<f64> {
    let out = tool.probe(path, ProbeEntry::Duration)?;
    flat_value(&out)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| {
            ShotreelError::probe(format!(
                "no usable duration for '{}' in probe output {:?}",
                path.display(),
                out.trim()
            ))
        })
}
