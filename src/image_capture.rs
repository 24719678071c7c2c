//! Capture subsystem
//!
//! Owns the camera for the duration of one session, shows a live preview and
//! turns the frame selected by the trigger key into `<user_id>.jpg`.
//!
//! Components:
//! - `types`: frames, settings, session states and key handling.
//! - `device`: the `CameraBackend`, `CameraDevice` and `PreviewSurface` traits.
//! - `session`: `CaptureSession`, the preview loop and file handling.
//! - `simulated`: hardware-free backend used by tests and `--simulate`.
//! - `opencv_backend`: real camera and window through OpenCV (`opencv` feature).

pub mod device;
#[cfg(feature = "opencv")]
pub mod opencv_backend;
pub mod session;
pub mod simulated;
pub mod types;

pub use device::{CameraBackend, CameraDevice, PreviewSurface};
#[cfg(feature = "opencv")]
pub use opencv_backend::OpenCvBackend;
pub use session::CaptureSession;
pub use simulated::{SimulatedBackend, SimulatorProbe};
pub use types::{CaptureSettings, CaptureState, CapturedImage, Frame};
