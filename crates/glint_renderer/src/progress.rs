//! Render progress tracking.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::renderer::RenderStats;

/// Notification sent from a running render to its [`crate::RenderHandle`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    /// Every bucket of phase `phase` has been written to the buffer.
    PhaseComplete {
        phase: usize,
        /// Cumulative samples per pixel after this phase
        samples_per_pixel: u32,
        elapsed: Duration,
    },
    /// The last phase finished.
    Finished(RenderStats),
}

/// Lock-free progress counters shared between workers and observers.
#[derive(Debug)]
pub struct Progress {
    bucket_count: usize,
    phase_count: usize,
    buckets_done: AtomicUsize,
    phases_done: AtomicUsize,
    complete: AtomicBool,
}

impl Progress {
    pub fn new(bucket_count: usize, phase_count: usize) -> Self {
        Self {
            bucket_count,
            phase_count,
            buckets_done: AtomicUsize::new(0),
            phases_done: AtomicUsize::new(0),
            complete: AtomicBool::new(false),
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    pub fn phase_count(&self) -> usize {
        self.phase_count
    }

    /// Buckets finished in the phase currently running.
    pub fn buckets_done(&self) -> usize {
        self.buckets_done.load(Ordering::Acquire)
    }

    pub fn phases_done(&self) -> usize {
        self.phases_done.load(Ordering::Acquire)
    }

    /// Overall completion in [0, 1].
    pub fn fraction(&self) -> f32 {
        let total = self.bucket_count * self.phase_count;
        if total == 0 {
            return 1.0;
        }
        let phases = self.phases_done().min(self.phase_count);
        let done = if phases == self.phase_count {
            total
        } else {
            phases * self.bucket_count + self.buckets_done().min(self.bucket_count)
        };
        done as f32 / total as f32
    }

    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    pub(crate) fn bucket_finished(&self) {
        self.buckets_done.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn phase_finished(&self) {
        self.phases_done.fetch_add(1, Ordering::AcqRel);
        self.buckets_done.store(0, Ordering::Release);
    }

    pub(crate) fn mark_complete(&self) {
        self.complete.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_tracks_buckets_and_phases() {
        let progress = Progress::new(4, 2);
        assert_eq!(progress.fraction(), 0.0);

        progress.bucket_finished();
        progress.bucket_finished();
        assert_eq!(progress.buckets_done(), 2);
        assert!((progress.fraction() - 0.25).abs() < 1e-6);

        progress.bucket_finished();
        progress.bucket_finished();
        progress.phase_finished();
        assert_eq!(progress.buckets_done(), 0);
        assert!((progress.fraction() - 0.5).abs() < 1e-6);

        for _ in 0..4 {
            progress.bucket_finished();
        }
        progress.phase_finished();
        progress.mark_complete();
        assert_eq!(progress.fraction(), 1.0);
        assert!(progress.is_complete());
    }
}
