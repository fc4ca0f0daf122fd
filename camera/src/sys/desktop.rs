//! Desktop camera backend using nokhwa.
//!
//! Desktop windows have no native preview sink, so the bound target only records
//! where frames should go; the UI pulls decoded frames with
//! [`NativeCamera::next_frame`] and blits them itself.

use std::fmt;

use log::{debug, warn};
use nokhwa::Camera as NokhwaCamera;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};

use crate::{CameraBackend, CameraError, CameraHandle, DisplayTarget, Resolution};

/// Opens webcams through nokhwa.
#[derive(Debug, Clone, Copy)]
pub struct NativeBackend {
    resolution: Resolution,
}

impl NativeBackend {
    /// Create a backend that asks for `resolution` when opening a camera.
    #[must_use]
    pub const fn new(resolution: Resolution) -> Self {
        Self { resolution }
    }
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new(Resolution::HD)
    }
}

impl CameraBackend for NativeBackend {
    type Handle = NativeCamera;

    fn open(&mut self, index: u32) -> Result<Self::Handle, CameraError> {
        let requested = RequestedFormat::<RgbFormat>::new(RequestedFormatType::HighestResolution(
            nokhwa::utils::Resolution::new(self.resolution.width, self.resolution.height),
        ));

        let camera = NokhwaCamera::new(CameraIndex::Index(index), requested)
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;

        debug!("opened camera {index} at {}", camera.resolution());

        Ok(NativeCamera {
            camera,
            index,
            target: None,
            previewing: false,
        })
    }
}

/// An open webcam.
pub struct NativeCamera {
    camera: NokhwaCamera,
    index: u32,
    target: Option<DisplayTarget>,
    previewing: bool,
}

impl fmt::Debug for NativeCamera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeCamera")
            .field("index", &self.index)
            .field("target", &self.target)
            .field("previewing", &self.previewing)
            .finish_non_exhaustive()
    }
}

impl NativeCamera {
    /// Decode the next RGB frame for the bound target.
    ///
    /// Returns the raw pixels with their width and height.
    ///
    /// # Errors
    /// Returns [`CameraError::CaptureFailed`] if the preview is not running or the
    /// frame cannot be decoded.
    pub fn next_frame(&mut self) -> Result<(Vec<u8>, Resolution), CameraError> {
        if !self.previewing {
            return Err(CameraError::CaptureFailed("preview not started".into()));
        }

        let frame = self
            .camera
            .frame()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        let resolution = Resolution {
            width: decoded.width(),
            height: decoded.height(),
        };
        Ok((decoded.into_raw(), resolution))
    }

    /// The target frames are meant for.
    #[must_use]
    pub const fn target(&self) -> Option<&DisplayTarget> {
        self.target.as_ref()
    }
}

impl CameraHandle for NativeCamera {
    fn index(&self) -> u32 {
        self.index
    }

    fn bind_display(&mut self, target: &DisplayTarget) -> Result<(), CameraError> {
        self.target = Some(target.clone());
        Ok(())
    }

    fn start_preview(&mut self) -> Result<(), CameraError> {
        if self.target.is_none() {
            return Err(CameraError::StartFailed("no display bound".into()));
        }
        self.camera
            .open_stream()
            .map_err(|e| CameraError::StartFailed(e.to_string()))?;
        self.previewing = true;
        Ok(())
    }

    fn is_previewing(&self) -> bool {
        self.previewing
    }

    fn release(mut self) {
        if self.previewing {
            if let Err(err) = self.camera.stop_stream() {
                warn!("failed to stop camera {} stream: {err}", self.index);
            }
        }
        debug!("released camera {}", self.index);
    }
}
