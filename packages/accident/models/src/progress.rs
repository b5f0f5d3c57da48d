//! Progress hooks for forest training.
//!
//! Fitting a forest reports one unit per tree. The binary renders these
//! updates as a terminal bar; tests and library callers pass
//! [`NullProgress`].

/// Receives progress updates from a long-running fit.
pub trait ProgressCallback: Send + Sync {
    /// Number of units (trees) the operation will complete.
    fn set_total(&self, total: u64);

    /// Marks `delta` more units as done.
    fn inc(&self, delta: u64);

    /// Replaces the text shown next to the progress indicator.
    fn set_message(&self, msg: String);

    /// Called once with a summary when the operation completes.
    fn finish(&self, msg: String);
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
