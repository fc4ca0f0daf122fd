//! Routes system dialog results from the platform callback to a broker.
//!
//! The platform reports results through a static callback with no way to reach the
//! broker that launched the dialog, so the broker is registered here once. Only a weak
//! reference is kept: dropping the broker unregisters it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use log::{debug, warn};

use crate::PermissionBroker;

/// Request code passed along with every permission dialog.
pub const PERMISSIONS_REQUEST_CODE: i32 = 42;

/// `PackageManager.PERMISSION_GRANTED`.
pub const PERMISSION_GRANTED: i32 = 0;

static BROKER: Mutex<Option<Weak<PermissionBroker>>> = Mutex::new(None);

fn registered() -> MutexGuard<'static, Option<Weak<PermissionBroker>>> {
    BROKER.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Make `broker` the receiver of dialog results, replacing any previous one.
pub fn register(broker: &Arc<PermissionBroker>) {
    *registered() = Some(Arc::downgrade(broker));
}

/// Forward the results of a permission dialog to the registered broker.
///
/// `grant_results` holds the raw platform codes. Results carrying another request
/// code belong to someone else and are ignored. Returns the number of subscribers
/// that received an outcome.
pub fn dispatch_result(request_code: i32, permissions: &[String], grant_results: &[i32]) -> usize {
    if request_code != PERMISSIONS_REQUEST_CODE {
        debug!("ignoring permission result for request code {request_code}");
        return 0;
    }

    let Some(broker) = registered().as_ref().and_then(Weak::upgrade) else {
        warn!("permission result arrived with no broker registered");
        return 0;
    };

    let granted: Vec<bool> = grant_results
        .iter()
        .map(|&result| result == PERMISSION_GRANTED)
        .collect();
    broker.on_request_permissions_result(permissions, &granted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PermissionError, PermissionHost, PermissionOutcome};

    const CAMERA: &str = "android.permission.CAMERA";
    const PERMISSION_DENIED: i32 = -1;

    struct PromptingHost;

    impl PermissionHost for PromptingHost {
        fn is_granted(&self, _permission: &str) -> bool {
            false
        }

        fn is_revoked(&self, _permission: &str) -> bool {
            false
        }

        fn should_show_rationale(&self, _permission: &str) -> bool {
            true
        }

        fn request_permissions(&self, _permissions: &[String]) -> Result<(), PermissionError> {
            Ok(())
        }
    }

    // One test owns the process-wide registration.
    #[test]
    fn results_reach_the_registered_broker() {
        let names = [CAMERA.to_owned()];
        let broker = Arc::new(PermissionBroker::new(Arc::new(PromptingHost)));

        let mut subscription = broker.request_each(&[CAMERA]).unwrap();
        assert_eq!(dispatch_result(PERMISSIONS_REQUEST_CODE, &names, &[PERMISSION_GRANTED]), 0);

        register(&broker);
        assert_eq!(dispatch_result(7, &names, &[PERMISSION_GRANTED]), 0);
        assert!(broker.is_pending(CAMERA));

        assert_eq!(dispatch_result(PERMISSIONS_REQUEST_CODE, &names, &[PERMISSION_DENIED]), 1);
        assert_eq!(
            subscription.try_next(),
            Some(PermissionOutcome::denied(CAMERA, true))
        );

        let _again = broker.request_each(&[CAMERA]).unwrap();
        drop(broker);
        assert_eq!(dispatch_result(PERMISSIONS_REQUEST_CODE, &names, &[PERMISSION_GRANTED]), 0);
    }
}
