use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::sync::mpsc;
use tracing::warn;

pub(crate) type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// Create the UI-affinity lane: a `UiLane` handle for producers and the
/// `UiLaneRunner` the host's UI loop must own. Everything that touches view
/// state goes through this queue; callbacks arriving on other contexts
/// enqueue instead of mutating directly.
pub fn ui_lane() -> (UiLane, UiLaneRunner) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UiLane { tx }, UiLaneRunner { rx })
}

/// Cheap-to-clone producer handle. Posts from one handle execute in enqueue
/// order.
#[derive(Clone)]
pub struct UiLane {
    tx: mpsc::UnboundedSender<UiJob>,
}

impl UiLane {
    pub fn post(&self, job: impl FnOnce() + Send + 'static) {
        if self.tx.send(Box::new(job)).is_err() {
            warn!(event = "ui_lane_closed");
        }
    }
}

/// Consumer side, owned by the single UI-affinity execution context.
pub struct UiLaneRunner {
    rx: mpsc::UnboundedReceiver<UiJob>,
}

impl UiLaneRunner {
    /// Drain jobs until every `UiLane` handle has been dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.rx.recv().await {
            execute(job);
        }
    }

    /// Wait for the next job and run it. Hosts embedding the lane in a
    /// `select!` loop call this; returns false once all handles are gone.
    pub async fn run_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                execute(job);
                true
            }
            None => false,
        }
    }

    /// Run everything queued right now. Returns the number of jobs executed.
    pub fn run_pending(&mut self) -> usize {
        let mut executed = 0;
        while let Ok(job) = self.rx.try_recv() {
            execute(job);
            executed += 1;
        }
        executed
    }
}

fn execute(job: UiJob) {
    if catch_unwind(AssertUnwindSafe(job)).is_err() {
        warn!(event = "ui_job_panicked");
    }
}
