use std::fs;
use std::path::Path;

use log::{error, info, warn};

use crate::configuration::Config;
use crate::error_handling::types::*;
use crate::image_capture::{
    CameraBackend, CaptureSession, CaptureSettings, CapturedImage, SimulatedBackend,
};
use crate::storage::{DatabaseStorage, ImageRecord, ImageStore};

/// Frame size produced by the simulated camera used with `--simulate`.
const SIMULATED_FRAME_SIZE: (u32, u32) = (640, 480);

/// Drives the capture → persist handoff.
///
/// The controller never prompts; the user identifier is always passed in, so
/// the whole flow can run non-interactively.
pub struct Controller {
    capture: CaptureSession,
    store: Box<dyn ImageStore>,
}

impl Controller {
    pub fn new(
        config: &Config,
        backend: Box<dyn CameraBackend>,
        store: Box<dyn ImageStore>,
    ) -> Self {
        Self {
            capture: CaptureSession::new(backend, CaptureSettings::from(config)),
            store,
        }
    }

    /// Builds a controller backed by the configured database and either the
    /// real camera or the simulated one.
    pub fn from_config(config: &Config, simulate: bool) -> Result<Self, ControllerError> {
        let backend = select_backend(simulate)?;
        let store = DatabaseStorage::new(config)?;
        Ok(Self::new(config, backend, Box::new(store)))
    }

    /// Captures one image for `user_id` and stores its bytes.
    ///
    /// When storing fails the image file stays on disk; its path is logged.
    pub fn run_capture(&mut self, user_id: &str) -> Result<CapturedImage, ControllerError> {
        info!("Starting capture for user '{}'", user_id);
        let captured = self.capture.capture_image(user_id)?;

        if let Err(e) = self.store.save_image(user_id, &captured.bytes) {
            error!(
                "Image captured but not stored, file kept at {}: {}",
                captured.path.display(),
                e
            );
            return Err(e.into());
        }
        Ok(captured)
    }

    /// Stores the bytes of an existing image file for `user_id`, skipping the
    /// camera entirely.
    pub fn import_image(&self, user_id: &str, path: &Path) -> Result<usize, ControllerError> {
        let bytes = fs::read(path).map_err(|e| CaptureError::ReadBack(path.to_path_buf(), e))?;
        self.store.save_image(user_id, &bytes)?;
        info!("Imported {} for user '{}'", path.display(), user_id);
        Ok(bytes.len())
    }

    pub fn list_images(&self, user_id: &str) -> Result<Vec<ImageRecord>, ControllerError> {
        Ok(self.store.get_images(user_id)?)
    }
}

fn select_backend(simulate: bool) -> Result<Box<dyn CameraBackend>, ControllerError> {
    if simulate {
        warn!("Using the simulated camera; the trigger fires on the first frame");
        let (width, height) = SIMULATED_FRAME_SIZE;
        return Ok(Box::new(SimulatedBackend::triggered_immediately(width, height)));
    }
    camera_backend()
}

#[cfg(feature = "opencv")]
fn camera_backend() -> Result<Box<dyn CameraBackend>, ControllerError> {
    Ok(Box::new(crate::image_capture::OpenCvBackend))
}

#[cfg(not(feature = "opencv"))]
fn camera_backend() -> Result<Box<dyn CameraBackend>, ControllerError> {
    Err(ControllerError::Capture(CaptureError::DeviceUnavailable(
        "built without camera support (enable the `opencv` feature or pass --simulate)".into(),
    )))
}
