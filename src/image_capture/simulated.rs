//! Camera and preview stand-ins that need neither hardware nor a display.
//!
//! `SimulatedBackend` produces solid-colour frames of a fixed size and a
//! headless preview that replays a scripted sequence of key codes, one per
//! poll. Once the script is exhausted every poll reports "no key".
//!
//! A shared [`SimulatorProbe`] records how the session used the backend so
//! callers can check that devices and windows were released.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::Rgb;
use log::{debug, trace};

use crate::error_handling::types::CaptureError;

use super::device::{CameraBackend, CameraDevice, PreviewSurface};
use super::types::{Frame, TRIGGER_KEY};

/// Counters updated by simulated devices and previews.
#[derive(Debug, Default)]
pub struct SimulatorProbe {
    pub devices_opened: AtomicUsize,
    pub devices_released: AtomicUsize,
    pub frames_read: AtomicU64,
    pub frames_shown: AtomicU64,
    pub previews_destroyed: AtomicUsize,
}

impl SimulatorProbe {
    pub fn devices_opened(&self) -> usize {
        self.devices_opened.load(Ordering::SeqCst)
    }

    pub fn devices_released(&self) -> usize {
        self.devices_released.load(Ordering::SeqCst)
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read.load(Ordering::SeqCst)
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown.load(Ordering::SeqCst)
    }

    pub fn previews_destroyed(&self) -> usize {
        self.previews_destroyed.load(Ordering::SeqCst)
    }
}

pub struct SimulatedBackend {
    width: u32,
    height: u32,
    color: Rgb<u8>,
    available: bool,
    keys: Arc<Mutex<VecDeque<Option<i32>>>>,
    probe: Arc<SimulatorProbe>,
}

impl SimulatedBackend {
    /// A black `width`×`height` camera with an empty key script.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            color: Rgb([0, 0, 0]),
            available: true,
            keys: Arc::new(Mutex::new(VecDeque::new())),
            probe: Arc::new(SimulatorProbe::default()),
        }
    }

    /// A camera whose trigger fires on the first poll.
    pub fn triggered_immediately(width: u32, height: u32) -> Self {
        Self::new(width, height).with_key_script([Some(TRIGGER_KEY)])
    }

    pub fn with_color(mut self, rgb: [u8; 3]) -> Self {
        self.color = Rgb(rgb);
        self
    }

    /// Key codes returned by successive polls; `None` means no key that poll.
    pub fn with_key_script<I>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = Option<i32>>,
    {
        if let Ok(mut script) = self.keys.lock() {
            script.clear();
            script.extend(keys);
        }
        self
    }

    /// Every `open_device` call fails as if no camera were attached.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn probe(&self) -> Arc<SimulatorProbe> {
        Arc::clone(&self.probe)
    }
}

impl CameraBackend for SimulatedBackend {
    fn open_device(&self, index: i32) -> Result<Box<dyn CameraDevice>, CaptureError> {
        if !self.available {
            return Err(CaptureError::DeviceUnavailable(format!(
                "simulated camera {} is not attached",
                index
            )));
        }
        self.probe.devices_opened.fetch_add(1, Ordering::SeqCst);
        debug!(
            "Opened simulated camera {} ({}x{})",
            index, self.width, self.height
        );
        Ok(Box::new(SimulatedCamera {
            frame: Frame::from_pixel(self.width, self.height, self.color),
            probe: Arc::clone(&self.probe),
        }))
    }

    fn open_preview(&self, title: &str) -> Result<Box<dyn PreviewSurface>, CaptureError> {
        debug!("Opened headless preview '{}'", title);
        Ok(Box::new(ScriptedPreview {
            keys: Arc::clone(&self.keys),
            probe: Arc::clone(&self.probe),
        }))
    }
}

struct SimulatedCamera {
    frame: Frame,
    probe: Arc<SimulatorProbe>,
}

impl CameraDevice for SimulatedCamera {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        self.probe.frames_read.fetch_add(1, Ordering::SeqCst);
        Ok(self.frame.clone())
    }

    fn release(&mut self) {
        self.probe.devices_released.fetch_add(1, Ordering::SeqCst);
        debug!("Released simulated camera");
    }
}

/// Headless preview replaying a key script.
pub struct ScriptedPreview {
    keys: Arc<Mutex<VecDeque<Option<i32>>>>,
    probe: Arc<SimulatorProbe>,
}

impl PreviewSurface for ScriptedPreview {
    fn show(&mut self, frame: &Frame) -> Result<(), CaptureError> {
        trace!("Showing {}x{} frame", frame.width(), frame.height());
        self.probe.frames_shown.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn poll_key(&mut self, _delay_ms: i32) -> Result<Option<i32>, CaptureError> {
        let mut keys = self
            .keys
            .lock()
            .map_err(|_| CaptureError::Preview("key script lock poisoned".into()))?;
        Ok(keys.pop_front().flatten())
    }

    fn destroy(&mut self) {
        self.probe.previews_destroyed.fetch_add(1, Ordering::SeqCst);
    }
}
