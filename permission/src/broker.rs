use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_channel::{Receiver, Sender, bounded};
use log::{debug, error, warn};

use crate::{PermissionError, PermissionOutcome, Subscription};

/// The platform side of a permission request.
///
/// A host answers synchronous questions about the current state of a permission and
/// launches the system dialog. Answers from the dialog are fed back later through
/// [`PermissionBroker::on_request_permissions_result`] or [`PermissionBroker::deliver`].
pub trait PermissionHost: Send + Sync {
    /// Whether the permission is currently granted.
    fn is_granted(&self, permission: &str) -> bool;

    /// Whether the permission has been revoked by a device policy.
    fn is_revoked(&self, permission: &str) -> bool;

    /// Whether the platform would show a rationale before asking again.
    fn should_show_rationale(&self, permission: &str) -> bool;

    /// Launch the system dialog for `permissions`.
    ///
    /// # Errors
    /// Returns a [`PermissionError`] if the dialog could not be launched.
    fn request_permissions(&self, permissions: &[String]) -> Result<(), PermissionError>;

    /// Whether the platform asks for permissions at runtime at all.
    ///
    /// When this returns `false` every permission is treated as granted.
    fn supports_runtime_permissions(&self) -> bool {
        true
    }
}

/// Turns permission requests into [`Subscription`]s.
///
/// Requests for a permission that is already waiting on the system dialog join the
/// pending request instead of prompting twice, and every subscriber receives the same
/// outcome. Outcomes may be delivered from any thread.
pub struct PermissionBroker {
    host: Arc<dyn PermissionHost>,
    pending: Mutex<HashMap<String, Vec<Sender<PermissionOutcome>>>>,
    logging: AtomicBool,
}

impl fmt::Debug for PermissionBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionBroker")
            .field("pending", &self.pending().len())
            .field("logging", &self.logging.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl PermissionBroker {
    /// Create a broker backed by `host`.
    pub fn new(host: Arc<dyn PermissionHost>) -> Self {
        Self {
            host,
            pending: Mutex::new(HashMap::new()),
            logging: AtomicBool::new(false),
        }
    }

    /// Enable or disable debug tracing of requests and results.
    pub fn set_logging(&self, logging: bool) {
        self.logging.store(logging, Ordering::Relaxed);
    }

    /// Request `permissions` and receive one outcome per permission, in order.
    ///
    /// Permissions that are already granted, or revoked by policy, are answered
    /// immediately. The rest are asked for in a single system dialog, except those
    /// already waiting on one, which join the pending request.
    ///
    /// # Errors
    /// Returns [`PermissionError::EmptyRequest`] if `permissions` is empty, or the
    /// host's error if the system dialog could not be launched.
    pub fn request_each<S: AsRef<str>>(
        &self,
        permissions: &[S],
    ) -> Result<Subscription, PermissionError> {
        if permissions.is_empty() {
            return Err(PermissionError::EmptyRequest);
        }

        let mut slots = Vec::with_capacity(permissions.len());
        let mut unrequested = Vec::new();

        for permission in permissions {
            let permission = permission.as_ref();
            self.trace(format_args!("Requesting permission {permission}"));

            if self.is_granted(permission) {
                slots.push(answered(PermissionOutcome::granted(permission)));
                continue;
            }

            if self.is_revoked(permission) {
                slots.push(answered(PermissionOutcome::denied(permission, false)));
                continue;
            }

            let (sender, receiver) = bounded(1);
            match self.pending().entry(permission.to_owned()) {
                Entry::Occupied(mut entry) => entry.get_mut().push(sender),
                Entry::Vacant(entry) => {
                    unrequested.push(permission.to_owned());
                    entry.insert(vec![sender]);
                }
            }
            slots.push(receiver);
        }

        if !unrequested.is_empty() {
            self.trace(format_args!(
                "Launching permission dialog for {}",
                unrequested.join(", ")
            ));
            if let Err(err) = self.host.request_permissions(&unrequested) {
                warn!("failed to launch permission dialog: {err}");
                let mut pending = self.pending();
                for permission in &unrequested {
                    pending.remove(permission);
                }
                return Err(err);
            }
        }

        Ok(Subscription::new(slots))
    }

    /// Request `permissions` and resolve to `true` only if all of them are granted.
    ///
    /// # Errors
    /// See [`request_each`](Self::request_each). Also returns
    /// [`PermissionError::Cancelled`] if any permission was left unanswered.
    pub async fn request<S: AsRef<str>>(&self, permissions: &[S]) -> Result<bool, PermissionError> {
        let outcomes = self.answers(permissions).await?;
        Ok(outcomes.iter().all(PermissionOutcome::is_granted))
    }

    /// Request `permissions` and merge every outcome with [`PermissionOutcome::combine`].
    ///
    /// # Errors
    /// See [`request`](Self::request).
    pub async fn request_each_combined<S: AsRef<str>>(
        &self,
        permissions: &[S],
    ) -> Result<PermissionOutcome, PermissionError> {
        let outcomes = self.answers(permissions).await?;
        Ok(PermissionOutcome::combine(&outcomes))
    }

    async fn answers<S: AsRef<str>>(
        &self,
        permissions: &[S],
    ) -> Result<Vec<PermissionOutcome>, PermissionError> {
        let outcomes = self.request_each(permissions)?.collect().await?;
        // A slot closes without an answer when the dialog it joined failed to launch.
        if outcomes.len() != permissions.len() {
            return Err(PermissionError::Cancelled);
        }
        Ok(outcomes)
    }

    /// Feed back the answer of the system dialog.
    ///
    /// The rationale flag of each permission is read from the host at this point.
    /// Returns the number of subscribers that received an outcome.
    pub fn on_request_permissions_result<S: AsRef<str>>(
        &self,
        permissions: &[S],
        grant_results: &[bool],
    ) -> usize {
        if permissions.len() != grant_results.len() {
            warn!(
                "permission result mismatch: {} permissions, {} grant results",
                permissions.len(),
                grant_results.len()
            );
        }

        let outcomes: Vec<_> = permissions
            .iter()
            .zip(grant_results)
            .map(|(permission, &granted)| {
                let permission = permission.as_ref();
                PermissionOutcome::new(
                    permission,
                    granted,
                    self.host.should_show_rationale(permission),
                )
            })
            .collect();

        self.deliver(outcomes)
    }

    /// Complete pending requests with explicit outcomes.
    ///
    /// Returns the number of subscribers that received an outcome.
    pub fn deliver(&self, outcomes: impl IntoIterator<Item = PermissionOutcome>) -> usize {
        let mut delivered = 0;

        for outcome in outcomes {
            self.trace(format_args!("onRequestPermissionsResult {}", outcome.name()));

            let Some(senders) = self.pending().remove(outcome.name()) else {
                error!(
                    "permission result for {} does not match any pending request",
                    outcome.name()
                );
                continue;
            };

            for sender in senders {
                if sender.try_send(outcome.clone()).is_ok() {
                    delivered += 1;
                } else {
                    debug!(
                        "subscriber for {} went away before the outcome arrived",
                        outcome.name()
                    );
                }
            }
        }

        delivered
    }

    /// Whether `permission` is granted. Always `true` without runtime permissions.
    #[must_use]
    pub fn is_granted(&self, permission: &str) -> bool {
        !self.host.supports_runtime_permissions() || self.host.is_granted(permission)
    }

    /// Whether `permission` was revoked by a policy. Always `false` without runtime permissions.
    #[must_use]
    pub fn is_revoked(&self, permission: &str) -> bool {
        self.host.supports_runtime_permissions() && self.host.is_revoked(permission)
    }

    /// Whether a rationale should be shown for `permissions`.
    ///
    /// Only `true` if every permission that is not granted carries the rationale flag.
    /// Always `false` without runtime permissions.
    #[must_use]
    pub fn should_show_rationale<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        if !self.host.supports_runtime_permissions() {
            return false;
        }
        permissions.iter().all(|permission| {
            let permission = permission.as_ref();
            self.is_granted(permission) || self.host.should_show_rationale(permission)
        })
    }

    /// Whether `permission` is waiting on the system dialog.
    #[must_use]
    pub fn is_pending(&self, permission: &str) -> bool {
        self.pending().contains_key(permission)
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<String, Vec<Sender<PermissionOutcome>>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn trace(&self, message: fmt::Arguments<'_>) {
        if self.logging.load(Ordering::Relaxed) {
            debug!("{message}");
        }
    }
}

fn answered(outcome: PermissionOutcome) -> Receiver<PermissionOutcome> {
    let (sender, receiver) = bounded(1);
    // A fresh channel with capacity one cannot be full or closed.
    let _ = sender.try_send(outcome);
    receiver
}
