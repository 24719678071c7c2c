//! Common data types used across the image_capture subsystem.

use std::path::PathBuf;

use crate::configuration::Config;

/// One RGB8 bitmap read from the camera.
pub type Frame = image::RgbImage;

/// Key code that selects the current frame (space).
pub const TRIGGER_KEY: i32 = 32;
/// Key code that abandons the session without writing anything (escape).
pub const CANCEL_KEY: i32 = 27;

/// Progress of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No device acquired yet.
    Idle,
    /// Frames are read and shown until a key decides.
    Previewing,
    /// The trigger key was seen; the current frame is being written.
    Triggered,
    /// The image file was written and read back.
    Done,
    /// The loop ended without a trigger.
    Cancelled,
}

/// What a polled key code means for the preview loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Trigger,
    Cancel,
    Ignore,
}

impl KeyAction {
    /// Key codes are compared modulo 256 since some windowing backends set
    /// modifier bits above the low byte.
    pub fn from_key_code(code: Option<i32>) -> Self {
        match code.map(|c| c.rem_euclid(256)) {
            Some(TRIGGER_KEY) => KeyAction::Trigger,
            Some(CANCEL_KEY) => KeyAction::Cancel,
            _ => KeyAction::Ignore,
        }
    }
}

/// The subset of [`Config`] a capture session needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    pub camera_index: i32,
    pub output_dir: PathBuf,
    pub window_title: String,
    pub poll_delay_ms: i32,
    pub max_frames: Option<u64>,
    pub jpeg_quality: u8,
}

impl CaptureSettings {
    /// `<output_dir>/<user_id>.jpg`
    pub fn image_path(&self, user_id: &str) -> PathBuf {
        self.output_dir.join(format!("{}.jpg", user_id))
    }
}

impl From<&Config> for CaptureSettings {
    fn from(config: &Config) -> Self {
        Self {
            camera_index: config.camera_index,
            output_dir: config.output_dir.clone(),
            window_title: config.window_title.clone(),
            poll_delay_ms: config.poll_delay_ms,
            max_frames: config.max_frames,
            jpeg_quality: config.jpeg_quality,
        }
    }
}

/// Result of a completed capture session.
///
/// The image file is intentionally left on disk; `path` names it so callers
/// can clean it up or reuse it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub user_id: String,
    pub path: PathBuf,
    /// Exact content of `path` at read-back time.
    pub bytes: Vec<u8>,
}
