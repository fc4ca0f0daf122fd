//! Camera session driven by runtime permission outcomes.
//!
//! [`CameraSessionController`] sits between a user action ("enable camera"), an
//! asynchronous permission request and the camera hardware. It makes sure a camera
//! handle is never opened twice or leaked, and that permission outcomes arriving after
//! the owning UI context was destroyed are never applied.
//!
//! All controller methods are meant to run on the UI thread. The permission broker may
//! deliver outcomes from any thread; they are only applied when the UI thread drains
//! them with [`CameraSessionController::pump`] or
//! [`CameraSessionController::dispatch_next`].

#![warn(missing_docs)]

mod config;
mod controller;
mod error;
mod notifier;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{ConfigError, Messages, ReplacePolicy, SessionConfig};
pub use controller::CameraSessionController;
pub use error::SessionError;
pub use notifier::{LogNotifier, Notifier};

pub use grantkit_camera::{CameraBackend, CameraError, CameraHandle, DisplaySurface, DisplayTarget};
pub use grantkit_permission::{
    PermissionBroker, PermissionError, PermissionHost, PermissionOutcome, Subscription,
};
