use crate::Resolution;

/// The drawing target a preview is rendered into.
///
/// Targets are cheap to clone; they refer to a surface owned by the UI layer.
#[derive(Debug, Clone)]
pub struct DisplayTarget {
    id: u64,
    resolution: Resolution,
    #[cfg(target_os = "android")]
    holder: Option<jni::objects::GlobalRef>,
}

impl DisplayTarget {
    /// Create a target identified by `id`.
    #[must_use]
    pub const fn new(id: u64, resolution: Resolution) -> Self {
        Self {
            id,
            resolution,
            #[cfg(target_os = "android")]
            holder: None,
        }
    }

    /// Attach the `SurfaceHolder` the preview is drawn into.
    #[cfg(target_os = "android")]
    #[must_use]
    pub fn with_holder(mut self, holder: jni::objects::GlobalRef) -> Self {
        self.holder = Some(holder);
        self
    }

    /// The attached `SurfaceHolder`, if any.
    #[cfg(target_os = "android")]
    #[must_use]
    pub const fn holder(&self) -> Option<&jni::objects::GlobalRef> {
        self.holder.as_ref()
    }

    /// The target identifier.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The size of the target.
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }
}

/// A UI-owned surface that exposes its current drawing target.
pub trait DisplaySurface {
    /// The current drawing target, or `None` while the surface is not ready.
    fn drawing_target(&self) -> Option<DisplayTarget>;
}
