use std::fmt;
use std::sync::{Arc, Weak};

use futures::future::select_all;
use grantkit_camera::{CameraBackend, CameraError, CameraHandle, DisplaySurface};
use grantkit_permission::{PermissionBroker, PermissionOutcome, Subscription};
use log::{debug, error, info, warn};

use crate::{Notifier, ReplacePolicy, SessionConfig, SessionError};

/// Owns a camera handle and opens it once the camera permission is granted.
///
/// The controller reacts to three kinds of events:
/// - the user asking to enable the camera ([`on_enable_requested`](Self::on_enable_requested)),
/// - the permission outcome ([`on_permission_outcome`](Self::on_permission_outcome)),
/// - host lifecycle teardown ([`on_stop`](Self::on_stop) and [`on_destroy`](Self::on_destroy)).
///
/// At most one camera handle is open at a time. Once destroyed, the controller never
/// touches the camera or the surface again.
pub struct CameraSessionController<B: CameraBackend> {
    broker: Arc<PermissionBroker>,
    backend: B,
    camera: Option<B::Handle>,
    surface: Weak<dyn DisplaySurface>,
    notifier: Arc<dyn Notifier>,
    config: SessionConfig,
    subscription: Option<Subscription>,
    abandoned: Vec<Subscription>,
    destroyed: bool,
}

impl<B: CameraBackend + fmt::Debug> fmt::Debug for CameraSessionController<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraSessionController")
            .field("backend", &self.backend)
            .field("camera", &self.camera)
            .field("config", &self.config)
            .field("subscription", &self.subscription)
            .field("abandoned", &self.abandoned.len())
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl<B: CameraBackend> CameraSessionController<B> {
    /// Create a controller.
    ///
    /// The surface is borrowed weakly; it belongs to the UI layer.
    pub fn new(
        broker: Arc<PermissionBroker>,
        backend: B,
        surface: Weak<dyn DisplaySurface>,
        notifier: Arc<dyn Notifier>,
        config: SessionConfig,
    ) -> Self {
        broker.set_logging(config.trace_requests);
        Self {
            broker,
            backend,
            camera: None,
            surface,
            notifier,
            config,
            subscription: None,
            abandoned: Vec::new(),
            destroyed: false,
        }
    }

    /// Ask for the camera permission.
    ///
    /// The outcome arrives later and is applied by [`pump`](Self::pump) or
    /// [`dispatch_next`](Self::dispatch_next). A request that is still pending is
    /// handled according to [`SessionConfig::replace_policy`].
    pub fn on_enable_requested(&mut self) {
        if self.destroyed {
            warn!("enable requested after destroy, ignoring");
            return;
        }

        let subscription = match self.broker.request_each(&[self.config.permission.as_str()]) {
            Ok(subscription) => subscription,
            Err(err) => {
                error!("permission request for {} failed: {err}", self.config.permission);
                return;
            }
        };

        let Some(mut previous) = self.subscription.replace(subscription) else {
            return;
        };
        if previous.is_disposed() {
            return;
        }

        match self.config.replace_policy {
            ReplacePolicy::Abandon => {
                debug!("abandoning pending permission request");
                self.abandoned.push(previous);
            }
            ReplacePolicy::CancelPrevious => {
                debug!("cancelling pending permission request");
                previous.cancel();
            }
        }
    }

    /// Apply a permission outcome.
    ///
    /// A granted outcome releases any open camera, opens a new one and starts the
    /// preview. A denied outcome shows a message and leaves the camera alone.
    /// Outcomes applied after [`on_destroy`](Self::on_destroy) are ignored.
    ///
    /// # Errors
    /// Returns the [`SessionError`] that was already logged and shown to the user.
    pub fn on_permission_outcome(&mut self, outcome: PermissionOutcome) -> Result<(), SessionError> {
        if self.destroyed {
            debug!("dropping {outcome} delivered after destroy");
            return Ok(());
        }

        info!("Permission result {outcome}");

        if outcome.is_granted() {
            return self.open_camera();
        }

        let permission = outcome.name().to_owned();
        if outcome.should_show_rationale() {
            self.notifier.show_transient(&self.config.messages.soft_denial);
            Err(SessionError::PermissionDeniedSoft { permission })
        } else {
            // Denied with "don't ask again"; only the settings screen can change it.
            self.notifier.show_transient(&self.config.messages.hard_denial);
            Err(SessionError::PermissionDeniedHard { permission })
        }
    }

    /// Apply every outcome that has already arrived.
    ///
    /// Returns the number of outcomes applied.
    pub fn pump(&mut self) -> usize {
        let mut ready = Vec::new();
        for subscription in self.abandoned.iter_mut().chain(self.subscription.iter_mut()) {
            while let Some(outcome) = subscription.try_next() {
                ready.push(outcome);
            }
        }
        self.abandoned.retain(|subscription| !subscription.is_disposed());

        let applied = ready.len();
        for outcome in ready {
            // Failures are already logged and surfaced.
            let _ = self.on_permission_outcome(outcome);
        }
        applied
    }

    /// Wait for the next outcome on any live request and apply it.
    ///
    /// Returns `false` without waiting if no request is live.
    pub async fn dispatch_next(&mut self) -> bool {
        loop {
            let waiting: Vec<_> = self
                .abandoned
                .iter_mut()
                .chain(self.subscription.iter_mut())
                .filter(|subscription| !subscription.is_disposed())
                .map(|subscription| Box::pin(subscription.next()))
                .collect();
            if waiting.is_empty() {
                return false;
            }

            let (outcome, _, rest) = select_all(waiting).await;
            drop(rest);
            self.abandoned.retain(|subscription| !subscription.is_disposed());

            if let Some(outcome) = outcome {
                // Failures are already logged and surfaced.
                let _ = self.on_permission_outcome(outcome);
                return true;
            }
        }
    }

    /// The host is no longer visible. Releases the camera.
    pub fn on_stop(&mut self) {
        if self.release_camera() {
            debug!("camera released on stop");
        }
    }

    /// The host is being torn down.
    ///
    /// Cancels pending permission requests so their outcomes are never applied. The
    /// camera is expected to be released by the preceding [`on_stop`](Self::on_stop).
    pub fn on_destroy(&mut self) {
        let pending = self
            .subscription
            .as_mut()
            .filter(|subscription| !subscription.is_disposed());
        if let Some(subscription) = pending {
            debug!("cancelling pending permission request on destroy");
            subscription.cancel();
        }
        for subscription in &mut self.abandoned {
            subscription.cancel();
        }
        self.abandoned.clear();

        if self.camera.is_some() {
            warn!("destroyed with the camera still open; on_stop was not called");
        }
        self.destroyed = true;
    }

    /// Release the camera if one is open. Returns whether a handle was released.
    pub fn release_camera(&mut self) -> bool {
        match self.camera.take() {
            Some(camera) => {
                camera.release();
                true
            }
            None => false,
        }
    }

    /// Whether a camera handle is held.
    #[must_use]
    pub const fn is_camera_open(&self) -> bool {
        self.camera.is_some()
    }

    /// The open camera, if any.
    #[must_use]
    pub const fn camera(&self) -> Option<&B::Handle> {
        self.camera.as_ref()
    }

    /// The current permission request, if one was made.
    #[must_use]
    pub const fn subscription(&self) -> Option<&Subscription> {
        self.subscription.as_ref()
    }

    /// Whether the current permission request still waits for an outcome.
    #[must_use]
    pub fn has_pending_request(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|subscription| !subscription.is_disposed())
    }

    /// Whether [`on_destroy`](Self::on_destroy) ran.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The controller configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The camera backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    fn open_camera(&mut self) -> Result<(), SessionError> {
        self.release_camera();

        let mut camera = match self.backend.open(self.config.camera_index) {
            Ok(camera) => camera,
            Err(err) => {
                error!("failed to open camera {}: {err}", self.config.camera_index);
                self.notify(self.config.messages.camera_unavailable.as_deref());
                return Err(SessionError::CameraOpen(err));
            }
        };

        let started = self.start_preview(&mut camera);
        // The handle is kept even if the preview failed, so a later attempt can reuse it.
        self.camera = Some(camera);

        started.map_err(|err| {
            error!("Error while trying to display the camera preview: {err}");
            self.notify(self.config.messages.preview_failed.as_deref());
            SessionError::CameraPreview(err)
        })
    }

    fn start_preview(&self, camera: &mut B::Handle) -> Result<(), CameraError> {
        let surface = self
            .surface
            .upgrade()
            .ok_or(CameraError::SurfaceUnavailable)?;
        let target = surface
            .drawing_target()
            .ok_or(CameraError::SurfaceUnavailable)?;

        camera.bind_display(&target)?;
        camera.start_preview()
    }

    fn notify(&self, message: Option<&str>) {
        if let Some(message) = message {
            self.notifier.show_transient(message);
        }
    }
}
