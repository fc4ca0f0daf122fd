//! Android permission host using JNI against the hosting Activity.
//!
//! Register the broker with [`bridge::register`](crate::bridge::register) and forward the
//! Activity callback to the exported native method:
//!
//! ```java
//! @Override
//! public void onRequestPermissionsResult(int code, String[] permissions, int[] results) {
//!     super.onRequestPermissionsResult(code, permissions, results);
//!     PermissionBridge.onRequestPermissionsResult(code, permissions, results);
//! }
//! ```
//!
//! where `com.grantkit.permission.PermissionBridge` declares
//! `static native void onRequestPermissionsResult(int, String[], int[])`.

use std::fmt;

use jni::objects::{GlobalRef, JClass, JIntArray, JObject, JObjectArray, JString, JValue};
use jni::sys::jint;
use jni::{JNIEnv, JavaVM};
use log::{error, warn};

use crate::bridge::{self, PERMISSION_GRANTED};
use crate::{PermissionError, PermissionHost};

pub use crate::bridge::PERMISSIONS_REQUEST_CODE;

/// `Build.VERSION_CODES.M`, the first release with runtime permissions.
const RUNTIME_PERMISSIONS_SDK: jint = 23;

/// A [`PermissionHost`] backed by an Android Activity.
pub struct ActivityHost {
    vm: JavaVM,
    activity: GlobalRef,
    sdk_int: jint,
}

impl fmt::Debug for ActivityHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityHost")
            .field("sdk_int", &self.sdk_int)
            .finish_non_exhaustive()
    }
}

impl ActivityHost {
    /// Create a host for `activity`.
    ///
    /// # Errors
    /// Returns [`PermissionError::Platform`] if the VM or a global reference cannot be obtained.
    pub fn new(env: &mut JNIEnv, activity: &JObject) -> Result<Self, PermissionError> {
        let vm = env
            .get_java_vm()
            .map_err(|e| PermissionError::Platform(format!("get_java_vm: {e}")))?;
        let activity = env
            .new_global_ref(activity)
            .map_err(|e| PermissionError::Platform(format!("new_global_ref: {e}")))?;
        let sdk_int = env
            .get_static_field("android/os/Build$VERSION", "SDK_INT", "I")
            .and_then(|value| value.i())
            .map_err(|e| PermissionError::Platform(format!("Build.VERSION.SDK_INT: {e}")))?;

        Ok(Self {
            vm,
            activity,
            sdk_int,
        })
    }

    fn with_env<T>(
        &self,
        call: impl FnOnce(&mut JNIEnv, &JObject) -> jni::errors::Result<T>,
    ) -> Result<T, PermissionError> {
        let mut guard = self
            .vm
            .attach_current_thread()
            .map_err(|e| PermissionError::Platform(format!("attach_current_thread: {e}")))?;
        let env: &mut JNIEnv = &mut guard;

        call(env, self.activity.as_obj()).map_err(|e| PermissionError::Platform(e.to_string()))
    }

    fn query(
        &self,
        what: &str,
        call: impl FnOnce(&mut JNIEnv, &JObject) -> jni::errors::Result<bool>,
    ) -> bool {
        self.with_env(call).unwrap_or_else(|err| {
            warn!("{what} failed: {err}");
            false
        })
    }
}

impl PermissionHost for ActivityHost {
    fn is_granted(&self, permission: &str) -> bool {
        self.query("checkSelfPermission", |env, activity| {
            let name = env.new_string(permission)?;
            let status = env
                .call_method(
                    activity,
                    "checkSelfPermission",
                    "(Ljava/lang/String;)I",
                    &[JValue::Object(&name)],
                )?
                .i()?;
            Ok(status == PERMISSION_GRANTED)
        })
    }

    fn is_revoked(&self, permission: &str) -> bool {
        self.query("isPermissionRevokedByPolicy", |env, activity| {
            let name = env.new_string(permission)?;
            let package_manager = env
                .call_method(
                    activity,
                    "getPackageManager",
                    "()Landroid/content/pm/PackageManager;",
                    &[],
                )?
                .l()?;
            let package_name = env
                .call_method(activity, "getPackageName", "()Ljava/lang/String;", &[])?
                .l()?;
            env.call_method(
                &package_manager,
                "isPermissionRevokedByPolicy",
                "(Ljava/lang/String;Ljava/lang/String;)Z",
                &[JValue::Object(&name), JValue::Object(&package_name)],
            )?
            .z()
        })
    }

    fn should_show_rationale(&self, permission: &str) -> bool {
        self.query("shouldShowRequestPermissionRationale", |env, activity| {
            let name = env.new_string(permission)?;
            env.call_method(
                activity,
                "shouldShowRequestPermissionRationale",
                "(Ljava/lang/String;)Z",
                &[JValue::Object(&name)],
            )?
            .z()
        })
    }

    fn request_permissions(&self, permissions: &[String]) -> Result<(), PermissionError> {
        if !self.supports_runtime_permissions() {
            return Err(PermissionError::NotSupported);
        }
        let length = jint::try_from(permissions.len())
            .map_err(|_| PermissionError::Platform("too many permissions".into()))?;

        self.with_env(|env, activity| {
            let array = env.new_object_array(length, "java/lang/String", JObject::null())?;
            for (index, permission) in (0..length).zip(permissions) {
                let name = env.new_string(permission)?;
                env.set_object_array_element(&array, index, name)?;
            }

            env.call_method(
                activity,
                "requestPermissions",
                "([Ljava/lang/String;I)V",
                &[JValue::Object(&array), JValue::Int(PERMISSIONS_REQUEST_CODE)],
            )?;
            Ok(())
        })
    }

    fn supports_runtime_permissions(&self) -> bool {
        self.sdk_int >= RUNTIME_PERMISSIONS_SDK
    }
}

#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_grantkit_permission_PermissionBridge_onRequestPermissionsResult(
    mut env: JNIEnv<'_>,
    _class: JClass<'_>,
    request_code: jint,
    permissions: JObjectArray<'_>,
    grant_results: JIntArray<'_>,
) {
    match read_results(&mut env, &permissions, &grant_results) {
        Ok((names, results)) => {
            bridge::dispatch_result(request_code, &names, &results);
        }
        Err(err) => error!("failed to read permission results: {err}"),
    }
}

fn read_results(
    env: &mut JNIEnv,
    permissions: &JObjectArray,
    grant_results: &JIntArray,
) -> jni::errors::Result<(Vec<String>, Vec<jint>)> {
    let count = env.get_array_length(permissions)?;
    let mut names = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
    for index in 0..count {
        let name = JString::from(env.get_object_array_element(permissions, index)?);
        names.push(env.get_string(&name)?.into());
    }

    let count = env.get_array_length(grant_results)?;
    let mut results = vec![0; usize::try_from(count).unwrap_or_default()];
    env.get_int_array_region(grant_results, 0, &mut results)?;
    Ok((names, results))
}
