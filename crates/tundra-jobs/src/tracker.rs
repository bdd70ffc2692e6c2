use crate::ui::UiLane;
use futures_util::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::debug;

/// Runs named units of asynchronous work with at most one live job per name.
///
/// Starting a job under a name that is already tracked cancels the old job
/// before the new one starts (replace, never accumulate). Background jobs
/// run as tokio tasks and stop at their next suspension point when
/// cancelled. UI jobs are posted to the UI lane and re-check their
/// cancellation flag at execution time, so a job cancelled between
/// scheduling and execution is a silent no-op. A job that panics terminates
/// alone; siblings and the tracker itself are unaffected.
#[derive(Clone)]
pub struct JobTracker {
    ui: UiLane,
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    next_job_id: AtomicU64,
    jobs: Mutex<HashMap<String, JobEntry>>,
}

struct JobEntry {
    job_id: u64,
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl JobEntry {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

impl JobTracker {
    pub fn new(ui: UiLane) -> Self {
        Self {
            ui,
            inner: Arc::new(TrackerInner {
                next_job_id: AtomicU64::new(0),
                jobs: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Start `work` as a cancellable background task tagged `name`. Returns
    /// immediately; a prior job under the same name is cancelled first.
    pub fn spawn_background_job<F>(&self, name: &str, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let job_id = self.inner.next_id();
        let cancelled = Arc::new(AtomicBool::new(false));
        let inner = self.inner.clone();
        let job_name = name.to_string();

        let mut jobs = self.inner.lock();
        if let Some(old) = jobs.remove(name) {
            old.cancel();
        }
        let handle = tokio::spawn(async move {
            if AssertUnwindSafe(work).catch_unwind().await.is_err() {
                debug!(event = "background_job_panicked", name = %job_name);
            }
            inner.release(&job_name, job_id);
        });
        jobs.insert(
            name.to_string(),
            JobEntry {
                job_id,
                cancelled,
                handle: Some(handle),
            },
        );
    }

    /// Schedule `work` onto the UI-affinity lane tagged `name`, same replace
    /// policy as background jobs. The queued closure checks its cancellation
    /// flag when the UI context drains it, never before.
    pub fn spawn_ui_job<F>(&self, name: &str, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let job_id = self.inner.next_id();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let inner = self.inner.clone();
        let job_name = name.to_string();

        {
            let mut jobs = self.inner.lock();
            if let Some(old) = jobs.remove(name) {
                old.cancel();
            }
            jobs.insert(
                name.to_string(),
                JobEntry {
                    job_id,
                    cancelled,
                    handle: None,
                },
            );
        }

        self.ui.post(move || {
            if !flag.load(Ordering::SeqCst) {
                work();
            }
            inner.release(&job_name, job_id);
        });
    }

    /// Cancel and forget the named job if present. Idempotent; cancelling an
    /// absent or already-completed name is a no-op.
    pub fn cancel_job(&self, name: &str) {
        if let Some(entry) = self.inner.lock().remove(name) {
            entry.cancel();
        }
    }

    /// Cancel every tracked job. Host shells call this on teardown.
    pub fn cancel_all_jobs(&self) {
        for (_, entry) in self.inner.lock().drain() {
            entry.cancel();
        }
    }

    pub fn has_job(&self, name: &str) -> bool {
        self.inner.lock().contains_key(name)
    }

    pub fn active_job_count(&self) -> usize {
        self.inner.lock().len()
    }
}

impl TrackerInner {
    fn next_id(&self) -> u64 {
        self.next_job_id.fetch_add(1, Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, JobEntry>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Completed jobs drop their own entry; the id guard keeps a finished job
    // from evicting its replacement.
    fn release(&self, name: &str, job_id: u64) {
        let mut jobs = self.lock();
        if jobs.get(name).map(|entry| entry.job_id) == Some(job_id) {
            jobs.remove(name);
        }
    }
}
