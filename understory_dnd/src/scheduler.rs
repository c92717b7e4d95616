// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred work: animation frames, timers, and cancellation.
//!
//! The session never waits. Whenever it needs something to happen later (a
//! trailing evaluation on the next frame, an autoscroll tick, the end of the
//! drop animation) it asks the host's [`Scheduler`] for a [`TaskId`] and
//! expects the host to call
//! [`SessionManager::run_task`](crate::session::SessionManager::run_task)
//! with that id once it is due. Cancelled ids are never run.
//!
//! [`ManualScheduler`] keeps a virtual clock for tests and headless hosts:
//!
//! ```
//! use core::time::Duration;
//! use understory_dnd::scheduler::{ManualScheduler, Scheduler};
//!
//! let mut s = ManualScheduler::new();
//! let frame = s.request_frame();
//! let timer = s.schedule_after(Duration::from_millis(50));
//! s.cancel(timer);
//! assert_eq!(s.pop_due(Duration::from_millis(100)), Some(frame));
//! assert_eq!(s.pop_due(Duration::from_millis(100)), None);
//! ```

use alloc::vec::Vec;
use core::time::Duration;

use crate::types::TaskId;

/// Source of deferred callbacks.
pub trait Scheduler {
    /// Run a task on the next animation frame.
    fn request_frame(&mut self) -> TaskId;

    /// Run a task once `delay` has elapsed.
    fn schedule_after(&mut self, delay: Duration) -> TaskId;

    /// Forget a task. Unknown or already-run ids are ignored.
    fn cancel(&mut self, task: TaskId);
}

/// Default frame interval of [`ManualScheduler`], roughly 60 Hz.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// A scheduler driven by an explicit virtual clock.
///
/// Tasks become due at `now + delay`; frames are due one frame interval after
/// they were requested. Tasks due at the same instant run in request order.
#[derive(Clone, Debug)]
pub struct ManualScheduler {
    now: Duration,
    frame_interval: Duration,
    next_id: u64,
    pending: Vec<(Duration, TaskId)>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    /// Create a scheduler at time zero with the default frame interval.
    pub fn new() -> Self {
        Self::with_frame_interval(DEFAULT_FRAME_INTERVAL)
    }

    /// Create a scheduler with a custom frame interval.
    pub fn with_frame_interval(frame_interval: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            frame_interval,
            next_id: 1,
            pending: Vec::new(),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of tasks waiting to run.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether `task` is still waiting to run.
    pub fn is_pending(&self, task: TaskId) -> bool {
        self.pending.iter().any(|&(_, id)| id == task)
    }

    /// The earliest waiting task and its due time.
    pub fn next_due(&self) -> Option<(Duration, TaskId)> {
        self.pending.iter().copied().min()
    }

    /// Remove the earliest task due at or before `until`, advancing the clock to its due time.
    pub fn pop_due(&mut self, until: Duration) -> Option<TaskId> {
        let (due, id) = self.next_due()?;
        if due > until {
            return None;
        }
        self.pending.retain(|&(_, t)| t != id);
        self.now = self.now.max(due);
        Some(id)
    }

    /// Move the clock forward without running anything.
    pub fn advance_to(&mut self, time: Duration) {
        self.now = self.now.max(time);
    }

    fn push(&mut self, delay: Duration) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.push((self.now + delay, id));
        id
    }
}

impl Scheduler for ManualScheduler {
    fn request_frame(&mut self) -> TaskId {
        self.push(self.frame_interval)
    }

    fn schedule_after(&mut self, delay: Duration) -> TaskId {
        self.push(delay)
    }

    fn cancel(&mut self, task: TaskId) {
        self.pending.retain(|&(_, id)| id != task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_run_in_due_order() {
        let mut s = ManualScheduler::new();
        let late = s.schedule_after(Duration::from_millis(50));
        let frame = s.request_frame();
        let also_late = s.schedule_after(Duration::from_millis(50));
        let until = Duration::from_millis(60);
        assert_eq!(s.pop_due(until), Some(frame));
        assert_eq!(s.now(), Duration::from_millis(16));
        assert_eq!(s.pop_due(until), Some(late));
        assert_eq!(s.pop_due(until), Some(also_late));
        assert_eq!(s.pop_due(until), None);
    }

    #[test]
    fn delays_are_relative_to_now() {
        let mut s = ManualScheduler::new();
        s.advance_to(Duration::from_millis(100));
        let t = s.schedule_after(Duration::from_millis(10));
        assert_eq!(s.next_due(), Some((Duration::from_millis(110), t)));
        assert_eq!(s.pop_due(Duration::from_millis(105)), None);
        assert!(s.is_pending(t));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut s = ManualScheduler::new();
        let t = s.request_frame();
        s.cancel(t);
        s.cancel(t);
        s.cancel(TaskId(999));
        assert_eq!(s.pending_len(), 0);
    }

    #[test]
    fn clock_never_goes_back() {
        let mut s = ManualScheduler::new();
        s.advance_to(Duration::from_millis(40));
        s.advance_to(Duration::from_millis(10));
        assert_eq!(s.now(), Duration::from_millis(40));
    }
}
