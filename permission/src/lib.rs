//! Reactive runtime permission requests.
//!
//! This crate asks the platform for runtime permissions and hands every answer back
//! as a [`PermissionOutcome`] through a cancellable [`Subscription`]. The platform side
//! (the OS dialog, the activity) lives behind the [`PermissionHost`] trait.

#![warn(missing_docs)]

pub mod bridge;
mod broker;
mod outcome;
mod subscription;

/// Platform-specific implementations.
pub mod sys;

pub use broker::{PermissionBroker, PermissionHost};
pub use outcome::PermissionOutcome;
pub use subscription::Subscription;

/// Types of permissions that can be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Permission {
    /// Access to device location.
    Location,
    /// Access to device camera.
    Camera,
    /// Access to device microphone.
    Microphone,
    /// Access to photo library.
    Photos,
    /// Access to contacts.
    Contacts,
    /// Access to calendar.
    Calendar,
}

impl Permission {
    /// The platform identifier used when asking the OS for this permission.
    #[must_use]
    pub const fn manifest_name(self) -> &'static str {
        match self {
            Self::Location => "android.permission.ACCESS_FINE_LOCATION",
            Self::Camera => "android.permission.CAMERA",
            Self::Microphone => "android.permission.RECORD_AUDIO",
            Self::Photos => "android.permission.READ_MEDIA_IMAGES",
            Self::Contacts => "android.permission.READ_CONTACTS",
            Self::Calendar => "android.permission.READ_CALENDAR",
        }
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        self.manifest_name()
    }
}

/// Errors that can occur when requesting permissions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    /// A request was made without any permission identifier.
    #[error("a permission request requires at least one permission")]
    EmptyRequest,
    /// The subscription was cancelled before every outcome arrived.
    #[error("permission request cancelled")]
    Cancelled,
    /// The platform does not ask for permissions at runtime.
    #[error("runtime permissions are not supported on this platform")]
    NotSupported,
    /// The platform reported an error.
    #[error("platform error: {0}")]
    Platform(String),
}
