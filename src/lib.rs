//! # Grantkit
//!
//! Reactive runtime permissions and camera session helpers for mobile and desktop apps.
//!
//! Grantkit asks the platform for a runtime permission, hands the answer back as a
//! cancellable [`Subscription`](grantkit_permission::Subscription), and ties the result to
//! the lifecycle of a camera preview.
//!
//! ## Features
//!
//! - `permission`: Permission broker, outcomes and platform hosts.
//! - `camera`: Camera backends, handles and display surfaces.
//! - `session`: The camera session controller that glues both together.
//!
//! Use the `full` feature to enable everything.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! grantkit = { version = "0.1", features = ["session"] }
//! ```
//!
//! ```rust,ignore
//! use grantkit::session::{CameraSessionController, SessionConfig};
//!
//! let mut controller = CameraSessionController::new(broker, backend, surface, notifier, SessionConfig::default());
//! controller.on_enable_requested();
//! // ...later, on the UI thread
//! controller.pump();
//! ```

#[cfg(feature = "camera")]
pub use grantkit_camera as camera;

#[cfg(feature = "permission")]
pub use grantkit_permission as permission;

#[cfg(feature = "session")]
pub use grantkit_session as session;
