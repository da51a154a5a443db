use crate::collector::AppFailure;

/// Observer for a collection run. Front-ends implement this to surface status;
/// every method defaults to a no-op.
pub trait CollectProgress {
    /// Called once with the number of apps in the run
    fn begin(&mut self, _total: usize) {}

    /// Called before an app is resolved
    fn app_started(&mut self, _label: &str) {}

    /// Called after each app, successful or not
    fn app_done(&mut self, _completed: usize, _total: usize) {}

    /// Called when an app is skipped because it failed
    fn warning(&mut self, _failure: &AppFailure) {}

    fn finish(&mut self) {}
}

/// A no-op progress sink
pub struct NullProgress;

impl CollectProgress for NullProgress {}

/// Fraction of apps completed, in `0.0..=1.0`
pub fn progress_fraction(completed: usize, total: usize) -> f32 {
    if total == 0 {
        return 1.0;
    }
    (completed.min(total) as f32) / (total as f32)
}
