//! Platform-specific camera backends.

#[cfg(target_os = "android")]
mod android;

#[cfg(any(target_os = "windows", target_os = "linux"))]
mod desktop;

// Android
#[cfg(target_os = "android")]
pub use android::NativeBackend;

// Desktop (Windows, Linux) - use nokhwa
#[cfg(any(target_os = "windows", target_os = "linux"))]
pub use desktop::NativeBackend;

// Fallback for unsupported platforms
#[cfg(not(any(target_os = "android", target_os = "windows", target_os = "linux")))]
mod fallback {
    use crate::{CameraBackend, CameraError, CameraHandle, DisplayTarget};

    /// Backend for platforms without camera support.
    #[derive(Debug, Default)]
    pub struct NativeBackend;

    /// A handle that can never be opened.
    #[derive(Debug)]
    pub enum UnsupportedCamera {}

    impl CameraBackend for NativeBackend {
        type Handle = UnsupportedCamera;

        fn open(&mut self, _index: u32) -> Result<Self::Handle, CameraError> {
            Err(CameraError::NotSupported)
        }
    }

    impl CameraHandle for UnsupportedCamera {
        fn index(&self) -> u32 {
            match *self {}
        }

        fn bind_display(&mut self, _target: &DisplayTarget) -> Result<(), CameraError> {
            match *self {}
        }

        fn start_preview(&mut self) -> Result<(), CameraError> {
            match *self {}
        }

        fn is_previewing(&self) -> bool {
            match *self {}
        }

        fn release(self) {
            match self {}
        }
    }
}

#[cfg(not(any(target_os = "android", target_os = "windows", target_os = "linux")))]
pub use fallback::NativeBackend;
