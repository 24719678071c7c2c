//! One capture session: acquire the camera, preview until the trigger key,
//! write the selected frame as `<user_id>.jpg` and read the file back.
//!
//! The preview loop is a small state machine
//! (`Previewing → Triggered → Done`, or `Previewing → Cancelled`). The device
//! and the preview surface are held by guards, so they are released on every
//! exit path including errors and cancellation.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use log::{debug, info, trace};

use crate::error_handling::types::CaptureError;

use super::device::{CameraBackend, DeviceGuard, PreviewGuard};
use super::types::{CaptureSettings, CaptureState, CapturedImage, Frame, KeyAction};

pub struct CaptureSession {
    backend: Box<dyn CameraBackend>,
    settings: CaptureSettings,
    state: CaptureState,
}

impl CaptureSession {
    pub fn new(backend: Box<dyn CameraBackend>, settings: CaptureSettings) -> Self {
        Self {
            backend,
            settings,
            state: CaptureState::Idle,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Runs a full session for `user_id` and returns the bytes of the
    /// written image file.
    ///
    /// Errors
    /// - [`CaptureError::InvalidUserId`] for an empty id or one containing a path separator.
    /// - [`CaptureError::DeviceUnavailable`] when the camera cannot be opened; nothing is written.
    /// - [`CaptureError::CaptureIncomplete`] when escape is pressed or `max_frames` is reached.
    /// - [`CaptureError::ImageWrite`] / [`CaptureError::ReadBack`] for file failures.
    pub fn capture_image(&mut self, user_id: &str) -> Result<CapturedImage, CaptureError> {
        validate_user_id(user_id)?;
        self.state = CaptureState::Idle;
        let path = self.settings.image_path(user_id);

        self.preview_and_write(&path)?;

        let bytes = fs::read(&path).map_err(|e| CaptureError::ReadBack(path.clone(), e))?;
        self.state = CaptureState::Done;
        info!(
            "Captured {} byte(s) for user '{}' into {}",
            bytes.len(),
            user_id,
            path.display()
        );

        Ok(CapturedImage {
            user_id: user_id.to_string(),
            path,
            bytes,
        })
    }

    // Device and preview are released when the guards go out of scope here,
    // before the file is read back.
    fn preview_and_write(&mut self, path: &Path) -> Result<(), CaptureError> {
        let mut device =
            DeviceGuard::new(self.backend.open_device(self.settings.camera_index)?);
        let mut preview =
            PreviewGuard::new(self.backend.open_preview(&self.settings.window_title)?);
        self.state = CaptureState::Previewing;
        info!("Camera {} acquired, previewing", self.settings.camera_index);
        println!("Press SPACE to capture image...");

        let frame = self.preview_until_trigger(&mut device, &mut preview)?;
        write_jpeg(&frame, path, self.settings.jpeg_quality)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    fn preview_until_trigger(
        &mut self,
        device: &mut DeviceGuard,
        preview: &mut PreviewGuard,
    ) -> Result<Frame, CaptureError> {
        let mut frames: u64 = 0;
        loop {
            let frame = device.read_frame()?;
            preview.show(&frame)?;
            frames += 1;

            let key = preview.poll_key(self.settings.poll_delay_ms)?;
            match KeyAction::from_key_code(key) {
                KeyAction::Trigger => {
                    debug!("Trigger received after {} frame(s)", frames);
                    self.state = CaptureState::Triggered;
                    return Ok(frame);
                }
                KeyAction::Cancel => {
                    info!("Capture cancelled after {} frame(s)", frames);
                    self.state = CaptureState::Cancelled;
                    return Err(CaptureError::CaptureIncomplete);
                }
                KeyAction::Ignore => trace!("Frame {} shown, no trigger", frames),
            }

            if self.settings.max_frames.is_some_and(|max| frames >= max) {
                info!("Frame limit of {} reached without a trigger", frames);
                self.state = CaptureState::Cancelled;
                return Err(CaptureError::CaptureIncomplete);
            }
        }
    }
}

fn validate_user_id(user_id: &str) -> Result<(), CaptureError> {
    if user_id.is_empty() {
        return Err(CaptureError::InvalidUserId("user id is empty".into()));
    }
    if user_id.contains(['/', '\\']) {
        return Err(CaptureError::InvalidUserId(format!(
            "'{}' contains a path separator",
            user_id
        )));
    }
    Ok(())
}

/// Encodes `frame` as JPEG into `path`, creating the parent directory and
/// truncating any existing file.
fn write_jpeg(frame: &Frame, path: &Path, quality: u8) -> Result<(), CaptureError> {
    let write_err =
        |e: &dyn std::fmt::Display| CaptureError::ImageWrite(path.to_path_buf(), e.to_string());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| write_err(&e))?;
    }
    let file = File::create(path).map_err(|e| write_err(&e))?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, quality)
        .encode_image(frame)
        .map_err(|e| write_err(&e))?;
    writer.flush().map_err(|e| write_err(&e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_capture::device::{CameraDevice, PreviewSurface};
    use crate::image_capture::simulated::SimulatedBackend;
    use crate::image_capture::types::{CANCEL_KEY, TRIGGER_KEY};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn settings(dir: &Path) -> CaptureSettings {
        CaptureSettings {
            camera_index: 0,
            output_dir: dir.to_path_buf(),
            window_title: "test".into(),
            poll_delay_ms: 1,
            max_frames: Some(50),
            jpeg_quality: 90,
        }
    }

    #[test]
    fn test_trigger_on_first_frame_writes_jpeg() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = TempDir::new().unwrap();
        let backend = SimulatedBackend::triggered_immediately(100, 100);
        let probe = backend.probe();
        let mut session = CaptureSession::new(Box::new(backend), settings(dir.path()));

        let captured = session.capture_image("alice").unwrap();

        assert_eq!(session.state(), CaptureState::Done);
        assert_eq!(captured.path, dir.path().join("alice.jpg"));
        assert_eq!(captured.bytes, fs::read(&captured.path).unwrap());
        assert_eq!(image::image_dimensions(&captured.path).unwrap(), (100, 100));
        assert_eq!(probe.frames_read(), 1);
        assert_eq!(probe.devices_released(), 1);
        assert_eq!(probe.previews_destroyed(), 1);
    }

    #[test]
    fn test_trigger_after_several_frames() {
        let dir = TempDir::new().unwrap();
        let backend = SimulatedBackend::new(8, 8).with_key_script([
            None,
            Some(b'a' as i32),
            None,
            Some(TRIGGER_KEY + 256),
        ]);
        let probe = backend.probe();
        let mut session = CaptureSession::new(Box::new(backend), settings(dir.path()));

        session.capture_image("bob").unwrap();
        assert_eq!(probe.frames_shown(), 4);
    }

    #[test]
    fn test_existing_file_is_overwritten() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("carol.jpg");
        fs::write(&stale, b"stale bytes").unwrap();

        let mut session = CaptureSession::new(
            Box::new(SimulatedBackend::triggered_immediately(16, 16)),
            settings(dir.path()),
        );
        let captured = session.capture_image("carol").unwrap();

        assert_ne!(captured.bytes, b"stale bytes");
        assert_eq!(&captured.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_unavailable_device_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut session = CaptureSession::new(
            Box::new(SimulatedBackend::new(8, 8).unavailable()),
            settings(dir.path()),
        );

        let err = session.capture_image("dave").unwrap_err();
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
        assert_eq!(session.state(), CaptureState::Idle);
        assert!(!dir.path().join("dave.jpg").exists());
    }

    #[test]
    fn test_escape_cancels_and_releases() {
        let dir = TempDir::new().unwrap();
        let backend = SimulatedBackend::new(8, 8).with_key_script([None, Some(CANCEL_KEY)]);
        let probe = backend.probe();
        let mut session = CaptureSession::new(Box::new(backend), settings(dir.path()));

        let err = session.capture_image("erin").unwrap_err();
        assert!(matches!(err, CaptureError::CaptureIncomplete));
        assert_eq!(session.state(), CaptureState::Cancelled);
        assert_eq!(probe.devices_released(), 1);
        assert_eq!(probe.previews_destroyed(), 1);
        assert!(!dir.path().join("erin.jpg").exists());
    }

    #[test]
    fn test_frame_limit_cancels() {
        let dir = TempDir::new().unwrap();
        let backend = SimulatedBackend::new(8, 8);
        let probe = backend.probe();
        let mut cfg = settings(dir.path());
        cfg.max_frames = Some(3);
        let mut session = CaptureSession::new(Box::new(backend), cfg);

        let err = session.capture_image("frank").unwrap_err();
        assert!(matches!(err, CaptureError::CaptureIncomplete));
        assert_eq!(probe.frames_read(), 3);
        assert_eq!(probe.devices_released(), 1);
    }

    #[test]
    fn test_invalid_user_ids_are_rejected_before_opening() {
        let dir = TempDir::new().unwrap();
        let backend = SimulatedBackend::triggered_immediately(8, 8);
        let probe = backend.probe();
        let mut session = CaptureSession::new(Box::new(backend), settings(dir.path()));

        for bad in ["", "../escape", "a\\b"] {
            let err = session.capture_image(bad).unwrap_err();
            assert!(matches!(err, CaptureError::InvalidUserId(_)), "{:?}", bad);
        }
        assert_eq!(probe.devices_opened(), 0);
    }

    // Removes the freshly written image when the window closes, which happens
    // between the write and the read-back.
    struct VanishingBackend {
        inner: SimulatedBackend,
        victim: PathBuf,
    }

    struct VanishingPreview {
        inner: Box<dyn PreviewSurface>,
        victim: PathBuf,
    }

    impl PreviewSurface for VanishingPreview {
        fn show(&mut self, frame: &Frame) -> Result<(), CaptureError> {
            self.inner.show(frame)
        }

        fn poll_key(&mut self, delay_ms: i32) -> Result<Option<i32>, CaptureError> {
            self.inner.poll_key(delay_ms)
        }

        fn destroy(&mut self) {
            self.inner.destroy();
            let _ = fs::remove_file(&self.victim);
        }
    }

    impl CameraBackend for VanishingBackend {
        fn open_device(&self, index: i32) -> Result<Box<dyn CameraDevice>, CaptureError> {
            self.inner.open_device(index)
        }

        fn open_preview(&self, title: &str) -> Result<Box<dyn PreviewSurface>, CaptureError> {
            Ok(Box::new(VanishingPreview {
                inner: self.inner.open_preview(title)?,
                victim: self.victim.clone(),
            }))
        }
    }

    #[test]
    fn test_read_back_failure_is_typed() {
        let dir = TempDir::new().unwrap();
        let backend = VanishingBackend {
            inner: SimulatedBackend::triggered_immediately(8, 8),
            victim: dir.path().join("gina.jpg"),
        };
        let mut session = CaptureSession::new(Box::new(backend), settings(dir.path()));

        let err = session.capture_image("gina").unwrap_err();
        assert!(matches!(err, CaptureError::ReadBack(_, _)));
        assert_eq!(session.state(), CaptureState::Triggered);
    }

    #[test]
    fn test_missing_output_dir_is_created() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("faces").join("2026");
        let mut session = CaptureSession::new(
            Box::new(SimulatedBackend::triggered_immediately(8, 8)),
            settings(&nested),
        );

        let captured = session.capture_image("hana").unwrap();
        assert!(captured.path.starts_with(&nested));
        assert!(captured.path.exists());
    }
}
