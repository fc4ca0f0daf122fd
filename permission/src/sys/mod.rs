//! Platform-specific permission hosts.

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(target_os = "android"))]
mod desktop;

#[cfg(target_os = "android")]
pub use android::ActivityHost;

#[cfg(not(target_os = "android"))]
pub use desktop::DesktopHost;
