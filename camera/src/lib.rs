//! Camera handles with display-surface preview.
//!
//! This crate opens a device camera by index, binds it to a drawing target owned by
//! the UI layer and starts a live preview. Platform backends implement
//! [`CameraBackend`]; the handle they return is released exactly once because
//! [`CameraHandle::release`] consumes it.

#![warn(missing_docs)]

mod surface;
mod sys;

use std::fmt;

pub use surface::{DisplaySurface, DisplayTarget};
pub use sys::NativeBackend;

/// Errors that can occur with camera operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    /// Camera is not supported on this platform.
    #[error("camera not supported on this platform")]
    NotSupported,
    /// Failed to open camera.
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    /// Failed to bind the camera to a display target.
    #[error("failed to bind camera to display: {0}")]
    BindFailed(String),
    /// Failed to start the preview.
    #[error("failed to start camera preview: {0}")]
    StartFailed(String),
    /// The display surface has no drawing target.
    #[error("display surface is not available")]
    SurfaceUnavailable,
    /// Failed to capture frame.
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    /// Camera is already in use.
    #[error("camera is already in use")]
    AlreadyInUse,
}

/// Camera resolution configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Standard 720p resolution.
    pub const HD: Self = Self {
        width: 1280,
        height: 720,
    };

    /// Standard 1080p resolution.
    pub const FULL_HD: Self = Self {
        width: 1920,
        height: 1080,
    };
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Opens camera hardware.
pub trait CameraBackend {
    /// The handle type returned by [`open`](Self::open).
    type Handle: CameraHandle;

    /// Open the camera at `index`.
    ///
    /// # Errors
    /// Returns [`CameraError::OpenFailed`] if the camera is busy or missing.
    fn open(&mut self, index: u32) -> Result<Self::Handle, CameraError>;
}

/// An open camera.
pub trait CameraHandle: fmt::Debug {
    /// The index this handle was opened with.
    fn index(&self) -> u32;

    /// Route the preview to `target`.
    ///
    /// # Errors
    /// Returns [`CameraError::BindFailed`] if the target cannot be used.
    fn bind_display(&mut self, target: &DisplayTarget) -> Result<(), CameraError>;

    /// Start streaming the preview into the bound target.
    ///
    /// # Errors
    /// Returns [`CameraError::StartFailed`] if the stream cannot be started.
    fn start_preview(&mut self) -> Result<(), CameraError>;

    /// Whether the preview stream is running.
    fn is_previewing(&self) -> bool;

    /// Release the hardware.
    fn release(self);
}
