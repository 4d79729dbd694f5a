use crate::foundation::error::{ShotreelError, ShotreelResult};

/// Output frame dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> ShotreelResult<Self> {
        let size = Self { width, height };
        size.validate()?;
        Ok(size)
    }

    pub fn validate(&self) -> ShotreelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ShotreelError::validation(
                "frame width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            // Per-clip renders target yuv420p mp4.
            return Err(ShotreelError::validation(
                "frame width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }

    /// `WxH`, the form ffmpeg's lavfi sources expect.
    pub fn lavfi(self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl Default for FrameSize {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Converts a duration in seconds to a whole number of frames at `fps`.
pub fn seconds_to_frames(seconds: f64, fps: f64) -> i64 {
    (seconds * fps).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_size_rejects_zero_and_odd() {
        assert!(FrameSize::new(0, 1080).is_err());
        assert!(FrameSize::new(1921, 1080).is_err());
        assert!(FrameSize::new(1920, 1080).is_ok());
    }

    #[test]
    fn lavfi_formats_dimensions() {
        assert_eq!(FrameSize::default().lavfi(), "1920x1080");
    }

    #[test]
    fn seconds_to_frames_rounds() {
        assert_eq!(seconds_to_frames(2.0, 30.0), 60);
        assert_eq!(seconds_to_frames(1.0 / 3.0, 24.0), 8);
    }
}
