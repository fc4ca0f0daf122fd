use std::fmt;

/// The answer for a single requested permission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PermissionOutcome {
    name: String,
    granted: bool,
    should_show_rationale: bool,
}

impl PermissionOutcome {
    /// Create an outcome for the permission `name`.
    pub fn new(name: impl Into<String>, granted: bool, should_show_rationale: bool) -> Self {
        Self {
            name: name.into(),
            granted,
            should_show_rationale,
        }
    }

    /// A granted outcome. The rationale flag is always `false`.
    pub fn granted(name: impl Into<String>) -> Self {
        Self::new(name, true, false)
    }

    /// A denied outcome.
    pub fn denied(name: impl Into<String>, should_show_rationale: bool) -> Self {
        Self::new(name, false, should_show_rationale)
    }

    /// Merge several outcomes into one.
    ///
    /// The result is granted only if every outcome is granted, and carries the
    /// rationale flag only if every outcome carries it. Names are joined with `", "`.
    #[must_use]
    pub fn combine(outcomes: &[Self]) -> Self {
        let name = outcomes
            .iter()
            .map(|outcome| outcome.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            name,
            granted: outcomes.iter().all(|outcome| outcome.granted),
            should_show_rationale: outcomes.iter().all(|outcome| outcome.should_show_rationale),
        }
    }

    /// The permission identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the user granted the permission.
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        self.granted
    }

    /// Whether the platform would show a rationale for this permission.
    ///
    /// Only meaningful when the permission was denied: `true` means the user may be
    /// asked again, `false` means the denial is permanent and only the settings
    /// screen can change it.
    #[must_use]
    pub const fn should_show_rationale(&self) -> bool {
        self.should_show_rationale
    }
}

impl fmt::Display for PermissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Permission{{name='{}', granted={}, shouldShowRequestPermissionRationale={}}}",
            self.name, self.granted, self.should_show_rationale
        )
    }
}
