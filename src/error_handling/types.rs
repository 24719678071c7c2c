use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::InvalidValue(e) => write!(f, "Invalid configuration value: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

/// Failures of one capture session, from device acquisition to read-back.
#[derive(Debug)]
pub enum CaptureError {
    InvalidUserId(String),
    DeviceUnavailable(String),
    FrameRead(String),
    Preview(String),
    /// The preview loop ended without a trigger (escape key or frame limit).
    CaptureIncomplete,
    ImageWrite(PathBuf, String),
    ReadBack(PathBuf, std::io::Error),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::InvalidUserId(e) => write!(f, "Invalid user id: {}", e),
            CaptureError::DeviceUnavailable(e) => write!(f, "Cannot access camera: {}", e),
            CaptureError::FrameRead(e) => write!(f, "Frame read failed: {}", e),
            CaptureError::Preview(e) => write!(f, "Preview window error: {}", e),
            CaptureError::CaptureIncomplete => {
                write!(f, "Capture ended before an image was taken")
            }
            CaptureError::ImageWrite(p, e) => {
                write!(f, "Failed to write image {}: {}", p.display(), e)
            }
            CaptureError::ReadBack(p, e) => {
                write!(f, "Failed to read back image {}: {}", p.display(), e)
            }
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::ReadBack(_, e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum StorageError {
    InvalidInput(String),
    ConnectionFailed(String),
    WriteFailed(String),
    ReadFailed(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidInput(e) => write!(f, "Storage input rejected: {}", e),
            StorageError::ConnectionFailed(e) => write!(f, "Storage connection failed: {}", e),
            StorageError::WriteFailed(e) => write!(f, "Storage write failed: {}", e),
            StorageError::ReadFailed(e) => write!(f, "Storage read failed: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

#[derive(Debug)]
pub enum ControllerError {
    Config(ConfigError),
    Capture(CaptureError),
    Storage(StorageError),
    Input(std::io::Error),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::Config(e) => write!(f, "Configuration error: {}", e),
            ControllerError::Capture(e) => write!(f, "Capture error: {}", e),
            ControllerError::Storage(e) => write!(f, "Storage error: {}", e),
            ControllerError::Input(e) => write!(f, "Input error: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::Config(err)
    }
}

impl From<CaptureError> for ControllerError {
    fn from(err: CaptureError) -> Self {
        ControllerError::Capture(err)
    }
}

impl From<StorageError> for ControllerError {
    fn from(err: StorageError) -> Self {
        ControllerError::Storage(err)
    }
}
