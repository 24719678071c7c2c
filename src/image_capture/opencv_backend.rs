//! Camera access and preview window through OpenCV's `videoio` and `highgui`.

use log::{debug, warn};
use opencv::{core::Mat, highgui, imgproc, prelude::*, videoio};

use crate::error_handling::types::CaptureError;

use super::device::{CameraBackend, CameraDevice, PreviewSurface};
use super::types::Frame;

#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCvBackend;

impl CameraBackend for OpenCvBackend {
    fn open_device(&self, index: i32) -> Result<Box<dyn CameraDevice>, CaptureError> {
        let capture = videoio::VideoCapture::new(index, videoio::CAP_ANY)
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        let opened = capture
            .is_opened()
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;
        if !opened {
            return Err(CaptureError::DeviceUnavailable(format!(
                "camera {} could not be opened",
                index
            )));
        }

        debug!("Opened camera {}", index);
        Ok(Box::new(OpenCvCamera { capture, index }))
    }

    fn open_preview(&self, title: &str) -> Result<Box<dyn PreviewSurface>, CaptureError> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE)
            .map_err(|e| CaptureError::Preview(e.to_string()))?;
        Ok(Box::new(HighGuiPreview {
            title: title.to_string(),
        }))
    }
}

struct OpenCvCamera {
    capture: videoio::VideoCapture,
    index: i32,
}

impl CameraDevice for OpenCvCamera {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let mut bgr = Mat::default();
        let grabbed = self
            .capture
            .read(&mut bgr)
            .map_err(|e| CaptureError::FrameRead(e.to_string()))?;
        if !grabbed || bgr.empty() {
            return Err(CaptureError::FrameRead(format!(
                "camera {} returned an empty frame",
                self.index
            )));
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color_def(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB)
            .map_err(|e| CaptureError::FrameRead(e.to_string()))?;

        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let data = rgb
            .data_bytes()
            .map_err(|e| CaptureError::FrameRead(e.to_string()))?
            .to_vec();

        Frame::from_raw(width, height, data).ok_or_else(|| {
            CaptureError::FrameRead(format!(
                "frame buffer does not match {}x{} RGB8",
                width, height
            ))
        })
    }

    fn release(&mut self) {
        match self.capture.release() {
            Ok(()) => debug!("Released camera {}", self.index),
            Err(e) => warn!("Failed to release camera {}: {}", self.index, e),
        }
    }
}

struct HighGuiPreview {
    title: String,
}

impl PreviewSurface for HighGuiPreview {
    fn show(&mut self, frame: &Frame) -> Result<(), CaptureError> {
        let flat =
            Mat::from_slice(frame.as_raw()).map_err(|e| CaptureError::Preview(e.to_string()))?;
        let rgb = flat
            .reshape(3, frame.height() as i32)
            .map_err(|e| CaptureError::Preview(e.to_string()))?;
        let mut bgr = Mat::default();
        imgproc::cvt_color_def(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR)
            .map_err(|e| CaptureError::Preview(e.to_string()))?;
        highgui::imshow(&self.title, &bgr).map_err(|e| CaptureError::Preview(e.to_string()))
    }

    fn poll_key(&mut self, delay_ms: i32) -> Result<Option<i32>, CaptureError> {
        let key =
            highgui::wait_key(delay_ms).map_err(|e| CaptureError::Preview(e.to_string()))?;
        Ok(if key < 0 { None } else { Some(key) })
    }

    fn destroy(&mut self) {
        if let Err(e) = highgui::destroy_window(&self.title) {
            warn!("Failed to close preview window '{}': {}", self.title, e);
        }
    }
}
