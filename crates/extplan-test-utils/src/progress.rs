//! [`RecordingProgress`] sink for asserting notification order.

use std::sync::Mutex;

use extplan_model::ProgressSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Push(usize),
    Step,
    Pop,
}

/// Records every progress notification in order.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.lock().clone()
    }

    /// Whether every push has a matching pop and no pop comes first.
    pub fn is_balanced(&self) -> bool {
        let mut depth: usize = 0;
        for event in self.lock().iter() {
            match event {
                ProgressEvent::Push(_) => depth += 1,
                ProgressEvent::Pop => match depth.checked_sub(1) {
                    Some(d) => depth = d,
                    None => return false,
                },
                ProgressEvent::Step => {}
            }
        }
        depth == 0
    }

    /// Deepest nesting reached.
    pub fn max_depth(&self) -> usize {
        let mut depth: usize = 0;
        let mut max = 0;
        for event in self.lock().iter() {
            match event {
                ProgressEvent::Push(_) => {
                    depth += 1;
                    max = max.max(depth);
                }
                ProgressEvent::Pop => depth = depth.saturating_sub(1),
                ProgressEvent::Step => {}
            }
        }
        max
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ProgressEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ProgressSink for RecordingProgress {
    fn push_level(&self, steps: usize) {
        self.lock().push(ProgressEvent::Push(steps));
    }

    fn step(&self) {
        self.lock().push(ProgressEvent::Step);
    }

    fn pop_level(&self) {
        self.lock().push(ProgressEvent::Pop);
    }
}
