//! Bookkeeping for work the registry schedules on later ticks.

use super::record::WindowId;
use std::collections::HashMap;
use tokio::task::AbortHandle;

struct PendingReport {
    minimized: bool,
    task: AbortHandle,
}

/// Pending minimize/restore reports and post-registration activations,
/// at most one of each per window.
#[derive(Default)]
pub(crate) struct Deferred {
    reports: HashMap<WindowId, PendingReport>,
    activations: HashMap<WindowId, AbortHandle>,
}

impl Deferred {
    /// Overwrite the value of an already pending report. Returns false when
    /// nothing is pending for `id` and a new task has to be scheduled.
    pub fn coalesce(&mut self, id: WindowId, minimized: bool) -> bool {
        match self.reports.get_mut(&id) {
            Some(pending) => {
                pending.minimized = minimized;
                true
            }
            None => false,
        }
    }

    pub fn track_report(&mut self, id: WindowId, minimized: bool, task: AbortHandle) {
        if let Some(previous) = self.reports.insert(id, PendingReport { minimized, task }) {
            previous.task.abort();
        }
    }

    /// Claim the latest reported value for `id`.
    pub fn take_report(&mut self, id: WindowId) -> Option<bool> {
        self.reports.remove(&id).map(|pending| pending.minimized)
    }

    pub fn track_activation(&mut self, id: WindowId, task: AbortHandle) {
        if let Some(previous) = self.activations.insert(id, task) {
            previous.abort();
        }
    }

    pub fn finish_activation(&mut self, id: WindowId) {
        self.activations.remove(&id);
    }

    /// A newer registration supersedes every activation still waiting.
    pub fn cancel_activations(&mut self) {
        for (_, task) in self.activations.drain() {
            task.abort();
        }
    }

    pub fn cancel(&mut self, id: WindowId) {
        if let Some(pending) = self.reports.remove(&id) {
            pending.task.abort();
        }
        if let Some(task) = self.activations.remove(&id) {
            task.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, pending) in self.reports.drain() {
            pending.task.abort();
        }
        self.cancel_activations();
    }

    #[cfg(test)]
    pub fn is_idle(&self) -> bool {
        self.reports.is_empty() && self.activations.is_empty()
    }
}
