//! Progress reporting contract.

/// Receives strictly nested progress notifications.
///
/// A caller pushes a level of `steps` units before iterating a group,
/// calls [`step`](ProgressSink::step) after each unit and pops the level
/// once the group is finished, on success and failure alike.
pub trait ProgressSink: Send + Sync {
    fn push_level(&self, steps: usize);

    fn step(&self);

    fn pop_level(&self);
}

/// A sink that discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn push_level(&self, _steps: usize) {}

    fn step(&self) {}

    fn pop_level(&self) {}
}
