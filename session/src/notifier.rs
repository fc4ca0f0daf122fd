use log::info;

/// Shows short-lived messages to the user, such as an Android toast.
pub trait Notifier {
    /// Show `message` briefly. Fire-and-forget.
    fn show_transient(&self, message: &str);
}

/// A notifier that writes messages to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_transient(&self, message: &str) {
        info!(target: "grantkit::toast", "{message}");
    }
}

impl<F: Fn(&str)> Notifier for F {
    fn show_transient(&self, message: &str) {
        self(message);
    }
}
