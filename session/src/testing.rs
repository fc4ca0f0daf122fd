//! In-memory collaborators for driving a [`CameraSessionController`](crate::CameraSessionController)
//! without hardware or a system dialog.
//!
//! Every double records what happened to it so tests can assert on it afterwards.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use grantkit_camera::{
    CameraBackend, CameraError, CameraHandle, DisplaySurface, DisplayTarget, Resolution,
};
use grantkit_permission::{PermissionError, PermissionHost};

use crate::Notifier;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Counters shared by a [`FakeCameraBackend`] and its handles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraStats {
    /// Successful opens.
    pub opened: usize,
    /// Handles released through [`CameraHandle::release`].
    pub released: usize,
    /// Handles dropped without being released.
    pub leaked: usize,
    /// Handles open right now.
    pub open_now: usize,
    /// Highest number of handles open at the same time.
    pub max_open: usize,
    /// Successful preview starts.
    pub previews_started: usize,
    /// The target of the last successful bind.
    pub last_target: Option<u64>,
}

#[derive(Debug, Default)]
struct FakeCameraState {
    stats: CameraStats,
    open_failures: VecDeque<CameraError>,
    bind_failure: Option<CameraError>,
    start_failure: Option<CameraError>,
}

/// A camera backend that never touches hardware.
#[derive(Debug, Clone, Default)]
pub struct FakeCameraBackend {
    state: Arc<Mutex<FakeCameraState>>,
}

impl FakeCameraBackend {
    /// Create a backend whose cameras always open and preview.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next open fail with `error`.
    pub fn fail_next_open(&self, error: CameraError) {
        lock(&self.state).open_failures.push_back(error);
    }

    /// Make every bind fail with `error`, or succeed again with `None`.
    pub fn fail_bind(&self, error: Option<CameraError>) {
        lock(&self.state).bind_failure = error;
    }

    /// Make every preview start fail with `error`, or succeed again with `None`.
    pub fn fail_start(&self, error: Option<CameraError>) {
        lock(&self.state).start_failure = error;
    }

    /// A snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> CameraStats {
        lock(&self.state).stats.clone()
    }
}

impl CameraBackend for FakeCameraBackend {
    type Handle = FakeCamera;

    fn open(&mut self, index: u32) -> Result<Self::Handle, CameraError> {
        let mut state = lock(&self.state);
        if let Some(error) = state.open_failures.pop_front() {
            return Err(error);
        }
        if state.stats.open_now > 0 {
            return Err(CameraError::AlreadyInUse);
        }

        state.stats.opened += 1;
        state.stats.open_now += 1;
        state.stats.max_open = state.stats.max_open.max(state.stats.open_now);

        Ok(FakeCamera {
            index,
            state: self.state.clone(),
            target: None,
            previewing: false,
            released: false,
        })
    }
}

/// A handle opened by [`FakeCameraBackend`].
#[derive(Debug)]
pub struct FakeCamera {
    index: u32,
    state: Arc<Mutex<FakeCameraState>>,
    target: Option<u64>,
    previewing: bool,
    released: bool,
}

impl FakeCamera {
    /// The id of the bound target.
    #[must_use]
    pub const fn target(&self) -> Option<u64> {
        self.target
    }
}

impl CameraHandle for FakeCamera {
    fn index(&self) -> u32 {
        self.index
    }

    fn bind_display(&mut self, target: &DisplayTarget) -> Result<(), CameraError> {
        let mut state = lock(&self.state);
        if let Some(error) = state.bind_failure.clone() {
            return Err(error);
        }
        state.stats.last_target = Some(target.id());
        self.target = Some(target.id());
        Ok(())
    }

    fn start_preview(&mut self) -> Result<(), CameraError> {
        let mut state = lock(&self.state);
        if let Some(error) = state.start_failure.clone() {
            return Err(error);
        }
        if self.target.is_none() {
            return Err(CameraError::StartFailed("no display bound".into()));
        }
        state.stats.previews_started += 1;
        self.previewing = true;
        Ok(())
    }

    fn is_previewing(&self) -> bool {
        self.previewing
    }

    fn release(mut self) {
        self.released = true;
        let mut state = lock(&self.state);
        state.stats.released += 1;
        state.stats.open_now -= 1;
    }
}

impl Drop for FakeCamera {
    fn drop(&mut self) {
        if !self.released {
            let mut state = lock(&self.state);
            state.stats.leaked += 1;
            state.stats.open_now -= 1;
        }
    }
}

/// A notifier that keeps every message.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// Create an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message shown so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show_transient(&self, message: &str) {
        lock(&self.messages).push(message.to_owned());
    }
}

/// A surface with a fixed drawing target.
#[derive(Debug)]
pub struct StaticSurface {
    target: Mutex<Option<DisplayTarget>>,
}

impl StaticSurface {
    /// A ready surface with target `id`.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            target: Mutex::new(Some(DisplayTarget::new(id, Resolution::HD))),
        }
    }

    /// A surface that has no drawing target yet.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            target: Mutex::new(None),
        }
    }

    /// Replace the drawing target.
    pub fn set_target(&self, target: Option<DisplayTarget>) {
        *lock(&self.target) = target;
    }
}

impl DisplaySurface for StaticSurface {
    fn drawing_target(&self) -> Option<DisplayTarget> {
        lock(&self.target).clone()
    }
}

/// A permission host whose answers are set by the test.
///
/// Nothing is granted by default. Launching the dialog only records the request;
/// answer it through the broker.
#[derive(Debug, Default)]
pub struct ScriptedHost {
    granted: Mutex<HashSet<String>>,
    revoked: Mutex<HashSet<String>>,
    rationale: Mutex<HashSet<String>>,
    prompts: Mutex<Vec<Vec<String>>>,
    prompt_failure: Mutex<Option<PermissionError>>,
}

impl ScriptedHost {
    /// Create a host with nothing granted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `permission` as granted or not.
    pub fn set_granted(&self, permission: &str, granted: bool) {
        toggle(&self.granted, permission, granted);
    }

    /// Mark `permission` as revoked by policy or not.
    pub fn set_revoked(&self, permission: &str, revoked: bool) {
        toggle(&self.revoked, permission, revoked);
    }

    /// Set the rationale flag of `permission`.
    pub fn set_rationale(&self, permission: &str, rationale: bool) {
        toggle(&self.rationale, permission, rationale);
    }

    /// Make launching the dialog fail with `error`, or succeed again with `None`.
    pub fn fail_prompts(&self, error: Option<PermissionError>) {
        *lock(&self.prompt_failure) = error;
    }

    /// Every dialog launched so far.
    #[must_use]
    pub fn prompts(&self) -> Vec<Vec<String>> {
        lock(&self.prompts).clone()
    }
}

fn toggle(set: &Mutex<HashSet<String>>, permission: &str, on: bool) {
    let mut set = lock(set);
    if on {
        set.insert(permission.to_owned());
    } else {
        set.remove(permission);
    }
}

impl PermissionHost for ScriptedHost {
    fn is_granted(&self, permission: &str) -> bool {
        lock(&self.granted).contains(permission)
    }

    fn is_revoked(&self, permission: &str) -> bool {
        lock(&self.revoked).contains(permission)
    }

    fn should_show_rationale(&self, permission: &str) -> bool {
        lock(&self.rationale).contains(permission)
    }

    fn request_permissions(&self, permissions: &[String]) -> Result<(), PermissionError> {
        if let Some(error) = lock(&self.prompt_failure).clone() {
            return Err(error);
        }
        lock(&self.prompts).push(permissions.to_vec());
        Ok(())
    }
}
