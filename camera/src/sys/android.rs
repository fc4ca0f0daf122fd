//! Android camera backend using the `android.hardware.Camera` API via JNI.
//!
//! The preview is drawn by the platform straight into the `SurfaceHolder` attached
//! to the [`DisplayTarget`].

use std::fmt;

use jni::objects::{GlobalRef, JValue};
use jni::sys::jint;
use jni::{JNIEnv, JavaVM};
use log::{debug, warn};

use crate::{CameraBackend, CameraError, CameraHandle, DisplayTarget};

const CAMERA_CLASS: &str = "android/hardware/Camera";

fn java_vm() -> Result<JavaVM, CameraError> {
    let context = ndk_context::android_context();
    // SAFETY: ndk-context hands out the VM pointer of the running process.
    unsafe { JavaVM::from_raw(context.vm().cast()) }
        .map_err(|e| CameraError::OpenFailed(format!("JavaVM::from_raw: {e}")))
}

/// Clear a pending Java exception so later JNI calls stay valid. Returns the message of `err`.
fn clear_exception(env: &mut JNIEnv, err: &jni::errors::Error) -> String {
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_clear();
    }
    err.to_string()
}

/// Opens cameras through `Camera.open(int)`.
#[derive(Debug, Default)]
pub struct NativeBackend;

impl CameraBackend for NativeBackend {
    type Handle = NativeCamera;

    fn open(&mut self, index: u32) -> Result<Self::Handle, CameraError> {
        let id = jint::try_from(index)
            .map_err(|_| CameraError::OpenFailed(format!("invalid camera index {index}")))?;

        let vm = java_vm()?;
        let camera = {
            let mut guard = vm
                .attach_current_thread()
                .map_err(|e| CameraError::OpenFailed(format!("attach_current_thread: {e}")))?;
            let env: &mut JNIEnv = &mut guard;

            let camera = env
                .call_static_method(
                    CAMERA_CLASS,
                    "open",
                    "(I)Landroid/hardware/Camera;",
                    &[JValue::Int(id)],
                )
                .and_then(|value| value.l())
                .map_err(|e| CameraError::OpenFailed(clear_exception(env, &e)))?;

            if camera.is_null() {
                return Err(CameraError::OpenFailed(format!("no camera at index {index}")));
            }

            env.new_global_ref(camera)
                .map_err(|e| CameraError::OpenFailed(format!("new_global_ref: {e}")))?
        };

        debug!("opened camera {index}");
        Ok(NativeCamera {
            vm,
            camera,
            index,
            previewing: false,
            released: false,
        })
    }
}

/// An open `android.hardware.Camera`.
pub struct NativeCamera {
    vm: JavaVM,
    camera: GlobalRef,
    index: u32,
    previewing: bool,
    released: bool,
}

impl fmt::Debug for NativeCamera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeCamera")
            .field("index", &self.index)
            .field("previewing", &self.previewing)
            .finish_non_exhaustive()
    }
}

impl NativeCamera {
    fn release_now(&mut self) {
        self.released = true;
        self.previewing = false;
        if let Err(err) = self.call_void("release", "()V", &[]) {
            warn!("failed to release camera {}: {err}", self.index);
        }
        debug!("released camera {}", self.index);
    }

    fn call_void(&self, method: &str, sig: &str, args: &[JValue]) -> Result<(), String> {
        let mut guard = self
            .vm
            .attach_current_thread()
            .map_err(|e| format!("attach_current_thread: {e}"))?;
        let env: &mut JNIEnv = &mut guard;

        env.call_method(self.camera.as_obj(), method, sig, args)
            .map(|_| ())
            .map_err(|e| clear_exception(env, &e))
    }
}

impl CameraHandle for NativeCamera {
    fn index(&self) -> u32 {
        self.index
    }

    fn bind_display(&mut self, target: &DisplayTarget) -> Result<(), CameraError> {
        let holder = target
            .holder()
            .ok_or_else(|| CameraError::BindFailed("display target has no surface holder".into()))?;

        self.call_void(
            "setPreviewDisplay",
            "(Landroid/view/SurfaceHolder;)V",
            &[JValue::Object(holder.as_obj())],
        )
        .map_err(CameraError::BindFailed)
    }

    fn start_preview(&mut self) -> Result<(), CameraError> {
        self.call_void("startPreview", "()V", &[])
            .map_err(CameraError::StartFailed)?;
        self.previewing = true;
        Ok(())
    }

    fn is_previewing(&self) -> bool {
        self.previewing
    }

    fn release(mut self) {
        self.release_now();
    }
}

impl Drop for NativeCamera {
    fn drop(&mut self) {
        if !self.released {
            warn!("camera {} dropped without release", self.index);
            self.release_now();
        }
    }
}
