use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::foundation::error::{BoardgifError, BoardgifResult};

/// Counters describing what an executor has run so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Jobs accepted by `submit`.
    pub submitted: u64,
    /// Jobs that returned or unwound. Always `<= submitted`.
    pub finished: u64,
    /// Jobs that unwound with a panic.
    pub panicked: u64,
}

#[derive(Debug, Default)]
struct GateState {
    in_flight: usize,
    stats: ExecutorStats,
}

#[derive(Debug, Default)]
struct Gate {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl Gate {
    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self, max: usize) {
        let mut st = self.lock();
        while st.in_flight >= max {
            st = self
                .changed
                .wait(st)
                .unwrap_or_else(PoisonError::into_inner);
        }
        st.in_flight += 1;
        st.stats.submitted += 1;
    }

    fn note_panic(&self) {
        self.lock().stats.panicked += 1;
    }

    fn release(&self) {
        let mut st = self.lock();
        st.in_flight = st.in_flight.saturating_sub(1);
        st.stats.finished += 1;
        drop(st);
        self.changed.notify_all();
    }

    fn wait_idle(&self) -> ExecutorStats {
        let mut st = self.lock();
        while st.in_flight > 0 {
            st = self
                .changed
                .wait(st)
                .unwrap_or_else(PoisonError::into_inner);
        }
        st.stats
    }
}

/// Concurrency slot held by one running job. Released on drop, so a panicking job still frees it.
struct Permit(Arc<Gate>);

impl Drop for Permit {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// Worker pool that runs at most `max_concurrency` jobs at once.
///
/// `submit` blocks the caller while every slot is taken. `drain_all` blocks until every job
/// submitted so far has finished. Dropping the executor drains it first, so no job outlives it.
pub struct BoundedExecutor {
    pool: rayon::ThreadPool,
    gate: Arc<Gate>,
    max_concurrency: usize,
}

impl BoundedExecutor {
    pub fn new(max_concurrency: usize) -> BoardgifResult<Self> {
        if max_concurrency == 0 {
            return Err(BoardgifError::validation("max_concurrency must be >= 1"));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_concurrency)
            .thread_name(|i| format!("boardgif-worker-{i}"))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build worker pool: {e}"))?;

        Ok(Self {
            pool,
            gate: Arc::new(Gate::default()),
            max_concurrency,
        })
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Queue `job`, blocking until a concurrency slot is free.
    ///
    /// The slot is released only after `job` has returned (or unwound), so anything the job
    /// publishes before returning is visible once `drain_all` returns. A panic is caught, logged
    /// and counted in [`ExecutorStats::panicked`] before the slot is released.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.gate.acquire(self.max_concurrency);
        let permit = Permit(Arc::clone(&self.gate));
        self.pool.spawn(move || {
            if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(job)) {
                tracing::error!(panic = %panic_message(payload.as_ref()), "pipeline job panicked");
                permit.0.note_panic();
            }
        });
    }

    /// Block until every job submitted so far has finished.
    pub fn drain_all(&self) -> ExecutorStats {
        self.gate.wait_idle()
    }

    pub fn in_flight(&self) -> usize {
        self.gate.lock().in_flight
    }

    pub fn stats(&self) -> ExecutorStats {
        self.gate.lock().stats
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}

impl Drop for BoundedExecutor {
    fn drop(&mut self) {
        self.drain_all();
    }
}

impl std::fmt::Debug for BoundedExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedExecutor")
            .field("max_concurrency", &self.max_concurrency)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn rejects_zero_concurrency() {
        assert!(BoundedExecutor::new(0).is_err());
    }

    #[test]
    fn never_exceeds_limit_and_drains_everything() {
        let exec = BoundedExecutor::new(3).unwrap();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let done = Arc::new(AtomicUsize::new(0));

        for i in 0..24 {
            let (active, peak, done) = (active.clone(), peak.clone(), done.clone());
            exec.submit(move || {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(2 + (i % 4)));
                active.fetch_sub(1, Ordering::SeqCst);
                done.fetch_add(1, Ordering::SeqCst);
            });
            assert!(exec.in_flight() <= 3);
        }

        let stats = exec.drain_all();
        assert_eq!(done.load(Ordering::SeqCst), 24);
        assert_eq!(stats.submitted, 24);
        assert_eq!(stats.finished, 24);
        assert_eq!(exec.in_flight(), 0);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn panicking_job_releases_its_slot() {
        let exec = BoundedExecutor::new(1).unwrap();
        exec.submit(|| panic!("boom"));
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = ran.clone();
        // Only one slot exists, so this submit would block forever if the panic leaked it.
        exec.submit(move || {
            ran2.fetch_add(1, Ordering::SeqCst);
        });
        let stats = exec.drain_all();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(stats.finished, 2);
        assert_eq!(stats.panicked, 1);
    }

    #[test]
    fn executor_is_reusable_across_phases() {
        let exec = BoundedExecutor::new(2).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        for _phase in 0..2 {
            for _ in 0..5 {
                let c = counter.clone();
                exec.submit(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                });
            }
            exec.drain_all();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert_eq!(exec.stats().finished, 10);
    }

    #[test]
    fn drop_waits_for_running_jobs() {
        let done = Arc::new(AtomicUsize::new(0));
        {
            let exec = BoundedExecutor::new(2).unwrap();
            for _ in 0..4 {
                let d = done.clone();
                exec.submit(move || {
                    std::thread::sleep(Duration::from_millis(5));
                    d.fetch_add(1, Ordering::SeqCst);
                });
            }
        }
        assert_eq!(done.load(Ordering::SeqCst), 4);
    }
}
