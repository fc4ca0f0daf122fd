//! End-to-end camera session scenarios against in-memory collaborators.

use std::sync::Arc;

use grantkit_session::testing::{
    CameraStats, FakeCameraBackend, RecordingNotifier, ScriptedHost, StaticSurface,
};
use grantkit_session::{
    CameraError, CameraHandle, CameraSessionController, DisplaySurface, Messages, PermissionBroker,
    PermissionError, PermissionOutcome, ReplacePolicy, SessionConfig, SessionError,
};

const CAMERA: &str = "android.permission.CAMERA";
const SURFACE_ID: u64 = 7;

struct Harness {
    host: Arc<ScriptedHost>,
    broker: Arc<PermissionBroker>,
    camera: FakeCameraBackend,
    surface: Arc<StaticSurface>,
    notifier: Arc<RecordingNotifier>,
    controller: CameraSessionController<FakeCameraBackend>,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    fn with_config(config: SessionConfig) -> Self {
        Self::build(config, StaticSurface::new(SURFACE_ID))
    }

    fn with_surface(surface: StaticSurface) -> Self {
        Self::build(SessionConfig::default(), surface)
    }

    fn build(config: SessionConfig, surface: StaticSurface) -> Self {
        let host = Arc::new(ScriptedHost::new());
        let broker = Arc::new(PermissionBroker::new(host.clone()));
        let camera = FakeCameraBackend::new();
        let surface = Arc::new(surface);
        let notifier = Arc::new(RecordingNotifier::new());

        let shared_surface: Arc<dyn DisplaySurface> = surface.clone();
        let controller = CameraSessionController::new(
            broker.clone(),
            camera.clone(),
            Arc::downgrade(&shared_surface),
            notifier.clone(),
            config,
        );

        Self {
            host,
            broker,
            camera,
            surface,
            notifier,
            controller,
        }
    }

    fn answer(&self, granted: bool) -> usize {
        self.broker.on_request_permissions_result(&[CAMERA], &[granted])
    }
}

#[test]
fn granted_outcome_opens_camera_and_starts_preview() {
    let mut h = Harness::new();

    h.controller.on_enable_requested();
    assert_eq!(h.host.prompts(), vec![vec![CAMERA.to_owned()]]);
    assert!(h.controller.has_pending_request());

    assert_eq!(h.answer(true), 1);
    assert_eq!(h.controller.pump(), 1);

    let camera = h.controller.camera().expect("camera should be open");
    assert_eq!(camera.index(), 0);
    assert!(camera.is_previewing());
    assert_eq!(camera.target(), Some(SURFACE_ID));
    assert_eq!(h.camera.stats().previews_started, 1);
    assert!(h.notifier.messages().is_empty());
    assert!(!h.controller.has_pending_request());
}

#[test]
fn soft_denial_shows_rationale_message() {
    let mut h = Harness::new();
    h.host.set_rationale(CAMERA, true);

    h.controller.on_enable_requested();
    h.answer(false);
    h.controller.pump();

    assert_eq!(
        h.notifier.messages(),
        ["Denied permission without ask never again"]
    );
    assert!(!h.controller.is_camera_open());
    assert_eq!(h.camera.stats().opened, 0);
}

#[test]
fn hard_denial_shows_settings_message() {
    let mut h = Harness::new();

    h.controller.on_enable_requested();
    h.answer(false);
    h.controller.pump();

    assert_eq!(
        h.notifier.messages(),
        ["Permission denied, can't enable the camera"]
    );
    assert!(!h.controller.is_camera_open());
}

#[test]
fn denial_outcomes_report_their_kind() {
    let mut h = Harness::new();

    let soft = h
        .controller
        .on_permission_outcome(PermissionOutcome::denied(CAMERA, true));
    let hard = h
        .controller
        .on_permission_outcome(PermissionOutcome::denied(CAMERA, false));

    assert_eq!(
        soft,
        Err(SessionError::PermissionDeniedSoft {
            permission: CAMERA.into()
        })
    );
    assert_eq!(
        hard,
        Err(SessionError::PermissionDeniedHard {
            permission: CAMERA.into()
        })
    );
}

#[test]
fn destroy_before_outcome_cancels_request() {
    let mut h = Harness::new();

    h.controller.on_enable_requested();
    h.controller.on_stop();
    h.controller.on_destroy();

    let subscription = h.controller.subscription().unwrap();
    assert!(subscription.is_cancelled());
    assert!(h.controller.is_destroyed());

    // The dialog answers after the host is gone.
    assert_eq!(h.answer(true), 0);
    assert_eq!(h.controller.pump(), 0);

    // Even a forced delivery is ignored.
    assert_eq!(
        h.controller
            .on_permission_outcome(PermissionOutcome::granted(CAMERA)),
        Ok(())
    );
    assert!(!h.controller.is_camera_open());
    assert_eq!(h.camera.stats().opened, 0);
    assert!(h.notifier.messages().is_empty());
}

#[test]
fn preview_failure_keeps_handle_open() {
    let mut h = Harness::new();
    h.camera
        .fail_start(Some(CameraError::StartFailed("surface lost".into())));

    let result = h
        .controller
        .on_permission_outcome(PermissionOutcome::granted(CAMERA));

    assert_eq!(
        result,
        Err(SessionError::CameraPreview(CameraError::StartFailed(
            "surface lost".into()
        )))
    );
    assert!(h.controller.is_camera_open());
    assert!(!h.controller.camera().unwrap().is_previewing());
    assert_eq!(h.camera.stats().released, 0);
    assert_eq!(h.notifier.messages(), [Messages::default().preview_failed.unwrap()]);
}

#[test]
fn bind_failure_keeps_handle_open_until_next_grant() {
    let mut h = Harness::new();
    h.camera
        .fail_bind(Some(CameraError::BindFailed("holder not ready".into())));

    let result = h
        .controller
        .on_permission_outcome(PermissionOutcome::granted(CAMERA));

    assert_eq!(
        result,
        Err(SessionError::CameraPreview(CameraError::BindFailed(
            "holder not ready".into()
        )))
    );
    assert!(h.controller.is_camera_open());
    let stats = h.camera.stats();
    assert_eq!(stats.released, 0);
    assert_eq!(stats.previews_started, 0);
    assert_eq!(h.notifier.messages(), [Messages::default().preview_failed.unwrap()]);

    // The next grant swaps the stale handle for a working one.
    h.camera.fail_bind(None);
    h.controller
        .on_permission_outcome(PermissionOutcome::granted(CAMERA))
        .unwrap();

    let stats = h.camera.stats();
    assert_eq!(stats.opened, 2);
    assert_eq!(stats.released, 1);
    assert_eq!(stats.max_open, 1);
    assert_eq!(stats.previews_started, 1);
    assert!(h.controller.camera().unwrap().is_previewing());
}

#[test]
fn revoked_permission_is_a_hard_denial_without_prompt() {
    let mut h = Harness::new();
    h.host.set_revoked(CAMERA, true);
    h.host.set_rationale(CAMERA, true);

    h.controller.on_enable_requested();
    assert_eq!(h.controller.pump(), 1);

    assert!(h.host.prompts().is_empty());
    assert_eq!(
        h.notifier.messages(),
        ["Permission denied, can't enable the camera"]
    );
    assert!(!h.controller.is_camera_open());
}

#[test]
fn surface_without_target_fails_the_preview() {
    let mut h = Harness::with_surface(StaticSurface::unavailable());

    let result = h
        .controller
        .on_permission_outcome(PermissionOutcome::granted(CAMERA));

    assert_eq!(
        result,
        Err(SessionError::CameraPreview(CameraError::SurfaceUnavailable))
    );
    assert!(h.controller.is_camera_open());
    assert_eq!(h.camera.stats().last_target, None);
}

#[test]
fn missing_drawing_target_is_a_preview_failure() {
    let mut h = Harness::new();
    h.surface.set_target(None);

    let result = h
        .controller
        .on_permission_outcome(PermissionOutcome::granted(CAMERA));

    assert_eq!(
        result,
        Err(SessionError::CameraPreview(CameraError::SurfaceUnavailable))
    );
    assert!(h.controller.is_camera_open());
}

#[test]
fn open_failure_leaves_no_handle() {
    let mut h = Harness::new();
    h.controller
        .on_permission_outcome(PermissionOutcome::granted(CAMERA))
        .unwrap();

    h.camera
        .fail_next_open(CameraError::OpenFailed("busy".into()));
    let result = h
        .controller
        .on_permission_outcome(PermissionOutcome::granted(CAMERA));

    assert_eq!(
        result,
        Err(SessionError::CameraOpen(CameraError::OpenFailed(
            "busy".into()
        )))
    );
    assert!(!h.controller.is_camera_open());

    let stats = h.camera.stats();
    assert_eq!(stats.released, 1);
    assert_eq!(stats.open_now, 0);
    assert_eq!(h.notifier.messages(), ["Camera is not available"]);
}

#[test]
fn repeated_grants_never_hold_two_handles() {
    let mut h = Harness::new();
    h.host.set_granted(CAMERA, true);

    for _ in 0..5 {
        h.controller.on_enable_requested();
        assert_eq!(h.controller.pump(), 1);
    }

    let stats = h.camera.stats();
    assert_eq!(stats.opened, 5);
    assert_eq!(stats.released, 4);
    assert_eq!(stats.max_open, 1);
    assert_eq!(stats.leaked, 0);
    assert!(h.host.prompts().is_empty());
}

#[test]
fn stop_without_camera_is_a_no_op() {
    let mut h = Harness::new();

    h.controller.on_stop();
    h.controller.on_stop();

    assert!(!h.controller.is_camera_open());
    assert_eq!(h.camera.stats(), CameraStats::default());
}

#[test]
fn release_is_idempotent() {
    let mut h = Harness::new();
    h.controller
        .on_permission_outcome(PermissionOutcome::granted(CAMERA))
        .unwrap();

    assert!(h.controller.release_camera());
    let after_first = h.camera.stats();
    assert!(!h.controller.release_camera());

    assert_eq!(h.camera.stats(), after_first);
    assert_eq!(after_first.released, 1);
    assert_eq!(after_first.open_now, 0);
}

#[test]
fn stop_releases_and_enable_reopens() {
    let mut h = Harness::new();
    h.host.set_granted(CAMERA, true);

    h.controller.on_enable_requested();
    h.controller.pump();
    h.controller.on_stop();
    assert!(!h.controller.is_camera_open());

    h.controller.on_enable_requested();
    h.controller.pump();
    assert!(h.controller.is_camera_open());
    assert_eq!(h.camera.stats().opened, 2);
}

#[test]
fn lifecycle_teardown_leaks_nothing() {
    let mut h = Harness::new();

    h.controller.on_enable_requested();
    h.answer(true);
    h.controller.pump();
    h.controller.on_stop();
    h.controller.on_destroy();
    h.controller.on_destroy();

    let stats = h.camera.stats();
    assert_eq!(stats.released, 1);
    assert_eq!(stats.leaked, 0);
    assert_eq!(stats.open_now, 0);
}

#[test]
fn enable_after_destroy_is_ignored() {
    let mut h = Harness::new();
    h.controller.on_destroy();

    h.controller.on_enable_requested();

    assert!(h.host.prompts().is_empty());
    assert!(h.controller.subscription().is_none());
}

#[test]
fn failed_dialog_launch_leaves_nothing_pending() {
    let mut h = Harness::new();
    h.host
        .fail_prompts(Some(PermissionError::Platform("no activity".into())));

    h.controller.on_enable_requested();

    assert!(!h.controller.has_pending_request());
    assert!(!h.broker.is_pending(CAMERA));
}

#[tokio::test]
async fn outcome_from_another_thread_is_applied_on_dispatch() {
    let mut h = Harness::new();
    h.controller.on_enable_requested();

    let broker = h.broker.clone();
    let dialog = std::thread::spawn(move || broker.on_request_permissions_result(&[CAMERA], &[true]));

    assert!(h.controller.dispatch_next().await);
    assert_eq!(dialog.join().unwrap(), 1);
    assert!(h.controller.is_camera_open());

    // Nothing left to wait for.
    assert!(!h.controller.dispatch_next().await);
}

#[test]
fn abandoned_request_still_delivers() {
    let mut h = Harness::new();

    h.controller.on_enable_requested();
    h.controller.on_enable_requested();

    // The second request joins the pending dialog instead of prompting again.
    assert_eq!(h.host.prompts().len(), 1);
    assert_eq!(h.answer(true), 2);
    assert_eq!(h.controller.pump(), 2);

    let stats = h.camera.stats();
    assert_eq!(stats.opened, 2);
    assert_eq!(stats.released, 1);
    assert_eq!(stats.max_open, 1);
    assert!(h.controller.is_camera_open());
}

#[test]
fn cancel_previous_policy_applies_only_the_latest_request() {
    let config = SessionConfig::default().with_replace_policy(ReplacePolicy::CancelPrevious);
    let mut h = Harness::with_config(config);

    h.controller.on_enable_requested();
    h.controller.on_enable_requested();

    assert_eq!(h.answer(true), 1);
    assert_eq!(h.controller.pump(), 1);
    assert_eq!(h.camera.stats().opened, 1);
}

#[test]
fn destroy_cancels_abandoned_requests_too() {
    let mut h = Harness::new();

    h.controller.on_enable_requested();
    h.controller.on_enable_requested();
    h.controller.on_destroy();

    assert_eq!(h.answer(true), 0);
    assert_eq!(h.controller.pump(), 0);
    assert_eq!(h.camera.stats().opened, 0);
}
