use std::path::Path;

use grantkit_permission::Permission;
use serde::{Deserialize, Serialize};

/// What happens to a pending request when the user asks to enable the camera again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacePolicy {
    /// Keep listening to the previous request. Its outcome is still applied.
    #[default]
    Abandon,
    /// Cancel the previous request before starting the new one.
    CancelPrevious,
}

/// Texts shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    /// Shown when the permission was denied but may be asked again.
    pub soft_denial: String,
    /// Shown when the permission was denied permanently.
    pub hard_denial: String,
    /// Shown when the camera cannot be opened. `None` only logs.
    pub camera_unavailable: Option<String>,
    /// Shown when the preview cannot be started. `None` only logs.
    pub preview_failed: Option<String>,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            soft_denial: "Denied permission without ask never again".into(),
            hard_denial: "Permission denied, can't enable the camera".into(),
            camera_unavailable: Some("Camera is not available".into()),
            preview_failed: Some("Error while trying to display the camera preview".into()),
        }
    }
}

/// Configuration of a [`CameraSessionController`](crate::CameraSessionController).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// The permission to request before opening the camera.
    pub permission: String,
    /// The camera to open.
    pub camera_index: u32,
    /// How a repeated enable request treats a pending one.
    pub replace_policy: ReplacePolicy,
    /// Enable debug tracing in the permission broker.
    pub trace_requests: bool,
    /// Texts shown to the user.
    pub messages: Messages,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            permission: Permission::Camera.manifest_name().into(),
            camera_index: 0,
            replace_policy: ReplacePolicy::default(),
            trace_requests: true,
            messages: Messages::default(),
        }
    }
}

/// Errors that can occur when loading a [`SessionConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// The contents are not a valid config.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SessionConfig {
    /// Parse a config from JSON. Missing fields take their default.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Set the replace policy.
    #[must_use]
    pub fn with_replace_policy(mut self, policy: ReplacePolicy) -> Self {
        self.replace_policy = policy;
        self
    }
}
