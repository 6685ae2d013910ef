//! A single process-wide background task runner, independent of any one
//! worker, modeled on MaxScale's housekeeper: named tasks with a fixed
//! frequency are polled on a fixed tick and run when their turn comes.

use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, Instant};
use tracing::{debug, info};

pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

pub type TaskFn = Box<dyn FnMut() + Send>;

struct Task {
    name: String,
    frequency: Duration,
    next_due: Instant,
    repeating: bool,
    func: TaskFn,
}

/// Holds the registered tasks. Access is behind a `Mutex` because
/// registration can happen from any worker while the single tick loop
/// drains due tasks; the lock is held only for the brief scan-and-run pass.
pub struct Housekeeper {
    tasks: Mutex<Vec<Task>>,
}

impl Default for Housekeeper {
    fn default() -> Self {
        Self::new()
    }
}

impl Housekeeper {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Register a task that repeats every `frequency` until the process
    /// shuts down.
    pub fn add_recurring(&self, name: impl Into<String>, frequency: Duration, func: TaskFn) {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.push(Task {
            name: name.into(),
            frequency,
            next_due: Instant::now() + frequency,
            repeating: true,
            func,
        });
    }

    /// Register a task that runs exactly once, after `delay`.
    pub fn add_oneshot(&self, name: impl Into<String>, delay: Duration, func: TaskFn) {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.push(Task {
            name: name.into(),
            frequency: delay,
            next_due: Instant::now() + delay,
            repeating: false,
            func,
        });
    }

    pub fn remove(&self, name: &str) {
        self.tasks.lock().unwrap().retain(|t| t.name != name);
    }

    fn run_due(&self) {
        let now = Instant::now();
        let mut tasks = self.tasks.lock().unwrap();
        let mut finished = Vec::new();
        for (idx, task) in tasks.iter_mut().enumerate() {
            if task.next_due <= now {
                debug!(task = %task.name, "housekeeper running task");
                (task.func)();
                if task.repeating {
                    task.next_due = now + task.frequency;
                } else {
                    finished.push(idx);
                }
            }
        }
        for idx in finished.into_iter().rev() {
            tasks.remove(idx);
        }
    }

    /// Drive the tick loop until `shutdown` fires.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(TICK_INTERVAL);
        info!("housekeeper started, tick={:?}", TICK_INTERVAL);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.run_due(),
                _ = shutdown.changed() => {
                    info!("housekeeper shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn recurring_task_runs_on_every_tick_it_is_due() {
        let hk = Housekeeper::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        hk.add_recurring(
            "counter",
            Duration::from_millis(50),
            Box::new(move || {
                count_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );
        for _ in 0..10 {
            tokio::time::advance(TICK_INTERVAL).await;
            hk.run_due();
        }
        assert!(count.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn removing_a_task_stops_it_running() {
        let hk = Housekeeper::new();
        hk.add_recurring("once", Duration::from_secs(0), Box::new(|| {}));
        hk.remove("once");
        assert!(hk.tasks.lock().unwrap().is_empty());
    }
}
