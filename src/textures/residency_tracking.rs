// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Residency tracking for worker/main thread synchronization
//!
//! This module holds the part of a texture's state that crosses threads: the
//! current residency, the residency the texture was last scheduled for, and the
//! number of data preparations still in flight. Every field is atomic, so
//! queries never block on the worker.
//!
//! # Overview
//!
//! - `residency` is written only by the thread executing a transition
//! - `next_residency` is written when a transition is scheduled and when an
//!   unscheduled transition completes
//! - `pending` counts scheduled transitions that have not completed; it is
//!   decremented exactly once per completion
//! - `load_failed` is set when a scheduled load fails and cleared on retry
//!
//! Waiters register a continuation under the wake-list lock and re-check their
//! predicate there. Completion paths change the atomics first and then drain the
//! wake list under the same lock, so a wakeup can't be lost between the check
//! and the registration.

use std::fmt::{Debug, Formatter};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use super::GpuResidency;

/// Returned when a completion arrives with nothing pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NothingPending;

pub(crate) struct ResidencyTracker {
    residency: AtomicU8,
    next_residency: AtomicU8,
    pending: AtomicU32,
    load_failed: AtomicBool,
    wake_list: Mutex<Vec<r#continue::Sender<()>>>,
}

impl Debug for ResidencyTracker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResidencyTracker")
            .field("residency", &self.residency())
            .field("next_residency", &self.next_residency())
            .field("pending", &self.pending())
            .field("load_failed", &self.load_failed())
            .finish()
    }
}

impl ResidencyTracker {
    pub fn new(initial: GpuResidency) -> Self {
        ResidencyTracker {
            residency: AtomicU8::new(initial as u8),
            next_residency: AtomicU8::new(initial as u8),
            pending: AtomicU32::new(0),
            load_failed: AtomicBool::new(false),
            wake_list: Mutex::new(Vec::new()),
        }
    }

    pub fn residency(&self) -> GpuResidency {
        GpuResidency::from_u8(self.residency.load(Ordering::Acquire))
    }

    pub fn next_residency(&self) -> GpuResidency {
        GpuResidency::from_u8(self.next_residency.load(Ordering::Acquire))
    }

    pub fn pending(&self) -> u32 {
        self.pending.load(Ordering::Acquire)
    }

    pub fn load_failed(&self) -> bool {
        self.load_failed.load(Ordering::Acquire)
    }

    pub fn set_residency(&self, residency: GpuResidency) {
        self.residency.store(residency as u8, Ordering::Release);
    }

    pub fn set_next_residency(&self, residency: GpuResidency) {
        self.next_residency.store(residency as u8, Ordering::Release);
    }

    pub fn set_load_failed(&self, failed: bool) {
        self.load_failed.store(failed, Ordering::Release);
    }

    /// Records a newly scheduled transition to `next`.
    pub fn begin_preparation(&self, next: GpuResidency) -> u32 {
        self.set_next_residency(next);
        self.pending.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Records the completion of one scheduled transition. Returns the remaining count.
    pub fn complete_preparation(&self) -> Result<u32, NothingPending> {
        self.pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |p| p.checked_sub(1))
            .map(|previous| previous - 1)
            .map_err(|_| NothingPending)
    }

    /// Wakes every waiter so it re-checks its predicate.
    pub fn wake_all(&self) {
        let take = self
            .wake_list
            .lock()
            .expect("Failed to lock wake_list")
            .drain(..)
            .collect::<Vec<_>>();
        for sender in take {
            sender.send(());
        }
    }

    #[cfg(test)]
    pub fn waiters(&self) -> usize {
        self.wake_list.lock().expect("Failed to lock wake_list").len()
    }

    /// Completes once `ready` returns true.
    pub async fn wait_until(&self, ready: impl Fn() -> bool) {
        loop {
            //isolate lock to a scope
            let r = {
                let mut wake_list = self.wake_list.lock().expect("Failed to lock wake_list");
                if ready() {
                    return;
                }
                let (s, r) = r#continue::continuation();
                wake_list.push(s);
                r
            };
            r.await; //next loop
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    #[test]
    fn preparations_count_down_once() {
        let tracker = ResidencyTracker::new(GpuResidency::OnStorage);
        assert_eq!(tracker.begin_preparation(GpuResidency::Resident), 1);
        assert_eq!(tracker.next_residency(), GpuResidency::Resident);
        assert_eq!(tracker.residency(), GpuResidency::OnStorage);
        assert_eq!(tracker.complete_preparation(), Ok(0));
        assert_eq!(tracker.complete_preparation(), Err(NothingPending));
        assert_eq!(tracker.pending(), 0);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn waiter_wakes_after_completion() {
        use std::sync::Arc;
        let tracker = Arc::new(ResidencyTracker::new(GpuResidency::OnStorage));
        tracker.begin_preparation(GpuResidency::Resident);
        let move_tracker = tracker.clone();
        let handle = std::thread::spawn(move || {
            test_executors::spin_on(move_tracker.wait_until(|| move_tracker.pending() == 0));
        });
        std::thread::sleep(std::time::Duration::from_millis(10));
        tracker.set_residency(GpuResidency::Resident);
        tracker.complete_preparation().unwrap();
        tracker.wake_all();
        handle.join().unwrap();
    }
}
