//! Progress levels and a tracker computing completion offsets.

use std::sync::{Mutex, MutexGuard};

use extplan_model::ProgressSink;

/// A pushed progress level, popped again when dropped.
///
/// Holding the level in a guard keeps push and pop balanced when planning
/// bails out early with `?`.
pub struct ProgressLevel<'a> {
    sink: &'a dyn ProgressSink,
}

impl<'a> ProgressLevel<'a> {
    pub fn push(sink: &'a dyn ProgressSink, steps: usize) -> Self {
        sink.push_level(steps);
        Self { sink }
    }

    pub fn step(&self) {
        self.sink.step();
    }
}

impl Drop for ProgressLevel<'_> {
    fn drop(&mut self) {
        self.sink.pop_level();
    }
}

#[derive(Debug, Clone)]
struct Level {
    steps: usize,
    /// Completion of this level in `[0, 1]`.
    offset: f64,
    /// Overall offset where this level starts.
    start: f64,
    /// Share of the overall progress this level covers.
    span: f64,
    /// The previous step was accounted for by a popped sub-level.
    skip_next_step: bool,
}

impl Level {
    fn root() -> Self {
        Self {
            steps: 1,
            offset: 0.0,
            start: 0.0,
            span: 1.0,
            skip_next_step: false,
        }
    }

    fn step_size(&self) -> f64 {
        1.0 / self.steps.max(1) as f64
    }

    fn advance(&mut self) {
        self.offset = (self.offset + self.step_size()).min(1.0);
    }
}

/// Tracks nested progress levels and reports overall completion.
///
/// Each pushed level splits the current step of its parent into `steps`
/// equal parts. Popping a level completes the parent step it was opened
/// under, and the parent's next `step()` is ignored since it was already
/// counted.
#[derive(Debug)]
pub struct ProgressTracker {
    levels: Mutex<Vec<Level>>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            levels: Mutex::new(vec![Level::root()]),
        }
    }

    /// Overall completion in `[0, 1]`.
    pub fn offset(&self) -> f64 {
        let levels = self.lock();
        levels
            .last()
            .map_or(0.0, |level| level.start + level.offset * level.span)
    }

    /// Completion of the innermost level in `[0, 1]`.
    pub fn current_level_offset(&self) -> f64 {
        self.lock().last().map_or(0.0, |level| level.offset)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Level>> {
        self.levels.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ProgressSink for ProgressTracker {
    fn push_level(&self, steps: usize) {
        let mut levels = self.lock();
        let Some(parent) = levels.last_mut() else {
            return;
        };
        parent.skip_next_step = false;
        let level = Level {
            steps,
            offset: 0.0,
            start: parent.start + parent.offset * parent.span,
            span: parent.span * parent.step_size(),
            skip_next_step: false,
        };
        levels.push(level);
    }

    fn step(&self) {
        let mut levels = self.lock();
        if let Some(level) = levels.last_mut() {
            if level.skip_next_step {
                level.skip_next_step = false;
            } else {
                level.advance();
            }
        }
    }

    fn pop_level(&self) {
        let mut levels = self.lock();
        // The root level is never popped.
        if levels.len() < 2 {
            return;
        }
        let Some(child) = levels.pop() else {
            return;
        };
        if let Some(parent) = levels.last_mut() {
            let opened_at = (child.start - parent.start) / parent.span;
            parent.offset = (opened_at + parent.step_size()).min(1.0);
            parent.skip_next_step = true;
        }
    }
}
