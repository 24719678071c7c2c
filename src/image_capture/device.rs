use crate::error_handling::types::CaptureError;

use super::types::Frame;

/// An opened video capture device.
pub trait CameraDevice {
    /// Reads the next frame, blocking until the device delivers one.
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Gives the device back to the system. Called exactly once per opened
    /// device, on every exit path of a session.
    fn release(&mut self);
}

/// The window (or headless stand-in) showing the live preview and
/// delivering key presses.
pub trait PreviewSurface {
    fn show(&mut self, frame: &Frame) -> Result<(), CaptureError>;

    /// Waits up to `delay_ms` for a key press. `None` when no key was pressed.
    fn poll_key(&mut self, delay_ms: i32) -> Result<Option<i32>, CaptureError>;

    fn destroy(&mut self);
}

/// Factory for devices and preview surfaces, injected into
/// [`CaptureSession`](super::session::CaptureSession).
pub trait CameraBackend {
    fn open_device(&self, index: i32) -> Result<Box<dyn CameraDevice>, CaptureError>;

    fn open_preview(&self, title: &str) -> Result<Box<dyn PreviewSurface>, CaptureError>;
}

/// Releases the wrapped device when dropped.
pub(crate) struct DeviceGuard(Box<dyn CameraDevice>);

impl DeviceGuard {
    pub(crate) fn new(device: Box<dyn CameraDevice>) -> Self {
        Self(device)
    }

    pub(crate) fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        self.0.read_frame()
    }
}

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// Destroys the wrapped preview surface when dropped.
pub(crate) struct PreviewGuard(Box<dyn PreviewSurface>);

impl PreviewGuard {
    pub(crate) fn new(preview: Box<dyn PreviewSurface>) -> Self {
        Self(preview)
    }

    pub(crate) fn show(&mut self, frame: &Frame) -> Result<(), CaptureError> {
        self.0.show(frame)
    }

    pub(crate) fn poll_key(&mut self, delay_ms: i32) -> Result<Option<i32>, CaptureError> {
        self.0.poll_key(delay_ms)
    }
}

impl Drop for PreviewGuard {
    fn drop(&mut self) {
        self.0.destroy();
    }
}
