use grantkit_camera::CameraError;
use thiserror::Error;

/// Failures a camera session reports to the user.
///
/// None of these are fatal. By the time the controller returns one, it has already
/// been logged and surfaced as a transient message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The permission was denied but the user may be asked again.
    #[error("{permission} denied, the user may be asked again")]
    PermissionDeniedSoft {
        /// The denied permission.
        permission: String,
    },

    /// The permission was denied permanently and must be enabled from settings.
    #[error("{permission} denied permanently, it can only be enabled from settings")]
    PermissionDeniedHard {
        /// The denied permission.
        permission: String,
    },

    /// The camera could not be opened. No handle is held.
    #[error("camera open failed: {0}")]
    CameraOpen(#[source] CameraError),

    /// The camera opened but the preview could not be shown. The handle stays open.
    #[error("camera preview failed: {0}")]
    CameraPreview(#[source] CameraError),
}
