//! Permission host for platforms without runtime permission prompts.
//!
//! On desktop systems access is decided by the OS before the app runs:
//! - File permissions (camera devices in /dev)
//! - Sandbox portals (Flatpak/Snap) that prompt on first use
//! - User groups (e.g., 'video' group for camera access)
//!
//! The app therefore sees every permission as granted and never prompts.

use crate::{PermissionError, PermissionHost};

/// A host that reports every permission as granted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopHost;

impl PermissionHost for DesktopHost {
    fn is_granted(&self, _permission: &str) -> bool {
        true
    }

    fn is_revoked(&self, _permission: &str) -> bool {
        false
    }

    fn should_show_rationale(&self, _permission: &str) -> bool {
        false
    }

    fn request_permissions(&self, _permissions: &[String]) -> Result<(), PermissionError> {
        // The broker never gets here since every permission is already granted.
        Err(PermissionError::NotSupported)
    }

    fn supports_runtime_permissions(&self) -> bool {
        false
    }
}
