//! Worker runtime: a fixed pool of OS threads, each running its own
//! single-threaded tokio runtime and pinned to a CPU core where the
//! platform supports it. Sessions are assigned to a worker at accept time
//! and never migrate, so all per-session state can be plain `Rc`/`RefCell`
//! style ownership inside that worker's task set without cross-thread
//! synchronization. Workers exchange messages (e.g. backend status
//! changes) over an mpsc channel rather than shared mutable state.

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Builder;
use tokio::sync::{mpsc, oneshot};
use tokio::task::LocalSet;
use tracing::{debug, info, warn};

/// Message routed to a specific worker from elsewhere in the process (the
/// admin surface, a monitor, another worker).
pub enum WorkerMessage {
    /// A backend's router-visible status changed; the worker should
    /// resynchronize any connection pools it owns.
    BackendPoolsChanged,
    /// Ask the worker to report its current session count back.
    SessionCount(oneshot::Sender<usize>),
    Shutdown,
}

struct WorkerHandleInner {
    id: usize,
    tx: mpsc::UnboundedSender<WorkerMessage>,
    session_count: Arc<AtomicUsize>,
    thread: Option<std::thread::JoinHandle<()>>,
}

/// A handle to a running worker thread, held by the pool owner.
pub struct WorkerHandle {
    inner: WorkerHandleInner,
}

impl WorkerHandle {
    pub fn id(&self) -> usize {
        self.inner.id
    }

    pub fn send(&self, msg: WorkerMessage) {
        let _ = self.inner.tx.send(msg);
    }

    pub fn session_count(&self) -> usize {
        self.inner.session_count.load(Ordering::Relaxed)
    }
}

/// Spawns `count` worker threads, each driving its own current-thread tokio
/// runtime via a `LocalSet`. `spawn_session` is invoked once per accepted
/// connection, round-robin across workers, and runs entirely within that
/// worker's runtime.
pub struct WorkerPool {
    handles: Vec<WorkerHandle>,
    next: AtomicUsize,
}

impl WorkerPool {
    pub fn start(count: usize) -> Self {
        let core_ids = core_affinity::get_core_ids().unwrap_or_default();
        let mut handles = Vec::with_capacity(count);
        for id in 0..count {
            let (tx, rx) = mpsc::unbounded_channel::<WorkerMessage>();
            let session_count = Arc::new(AtomicUsize::new(0));
            let session_count_for_thread = Arc::clone(&session_count);
            let core_id = core_ids.get(id % core_ids.len().max(1)).copied();
            let thread = std::thread::Builder::new()
                .name(format!("mxworker-{id}"))
                .spawn(move || {
                    if let Some(core_id) = core_id {
                        core_affinity::set_for_current(core_id);
                    }
                    run_worker(id, rx, session_count_for_thread);
                })
                .expect("failed to spawn worker thread");
            handles.push(WorkerHandle {
                inner: WorkerHandleInner {
                    id,
                    tx,
                    session_count,
                    thread: Some(thread),
                },
            });
        }
        info!(workers = count, "worker pool started");
        Self {
            handles,
            next: AtomicUsize::new(0),
        }
    }

    pub fn worker(&self, idx: usize) -> &WorkerHandle {
        &self.handles[idx % self.handles.len()]
    }

    /// Pick the next worker round-robin, for assigning a freshly accepted
    /// connection.
    pub fn next_worker(&self) -> &WorkerHandle {
        let idx = self.next.fetch_add(1, Ordering::Relaxed);
        self.worker(idx)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn shutdown(&mut self) {
        for handle in &self.handles {
            handle.send(WorkerMessage::Shutdown);
        }
        for handle in &mut self.handles {
            if let Some(thread) = handle.inner.thread.take() {
                let _ = thread.join();
            }
        }
    }

    pub fn broadcast(&self, msg_factory: impl Fn() -> WorkerMessage) {
        for handle in &self.handles {
            handle.send(msg_factory());
        }
    }
}

fn run_worker(id: usize, mut rx: mpsc::UnboundedReceiver<WorkerMessage>, session_count: Arc<AtomicUsize>) {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build worker runtime");
    let local = LocalSet::new();
    local.block_on(&runtime, async move {
        debug!(worker = id, "worker loop starting");
        loop {
            match rx.recv().await {
                Some(WorkerMessage::BackendPoolsChanged) => {
                    debug!(worker = id, "backend pools changed notification received");
                }
                Some(WorkerMessage::SessionCount(reply)) => {
                    let _ = reply.send(session_count.load(Ordering::Relaxed));
                }
                Some(WorkerMessage::Shutdown) | None => {
                    info!(worker = id, "worker shutting down");
                    break;
                }
            }
        }
    });
}

/// Run a future on the calling worker's `LocalSet`, for non-`Send` session
/// tasks. Call only from within a worker thread's runtime.
pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    tokio::task::spawn_local(future);
}

/// A generation-counted, cancellable delay. Each call to `schedule` bumps
/// the generation; a timer fires only if the generation it captured is
/// still current when its deadline elapses, which lets a session's
/// statement timeout be rearmed cheaply by simply incrementing the counter
/// rather than canceling and re-registering a task with the timer wheel.
#[derive(Debug, Default)]
pub struct GenerationalTimer {
    generation: AtomicU64,
}

impl GenerationalTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a token to compare against when the delay elapses; also
    /// invalidates any timer scheduled before this call.
    pub fn rearm(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == token
    }

    /// Schedule `on_fire` to run after `delay`, but only if no later call
    /// to `rearm` has happened by then.
    pub async fn fire_after(self: Arc<Self>, delay: Duration, on_fire: impl FnOnce() + Send + 'static) {
        let token = self.generation.load(Ordering::SeqCst);
        tokio::time::sleep(delay).await;
        if self.is_current(token) {
            on_fire();
        } else {
            warn!("timer fired for stale generation, dropping");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[tokio::test(start_paused = true)]
    async fn timer_fires_when_generation_unchanged() {
        let timer = Arc::new(GenerationalTimer::new());
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = Arc::clone(&fired);
        let handle = tokio::spawn(Arc::clone(&timer).fire_after(Duration::from_millis(10), move || {
            fired_clone.store(true, Ordering::SeqCst);
        }));
        tokio::time::advance(Duration::from_millis(20)).await;
        handle.await.unwrap();
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_cancels_a_pending_timer() {
        let timer = Arc::new(GenerationalTimer::new());
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = Arc::clone(&fired);
        let handle = tokio::spawn(Arc::clone(&timer).fire_after(Duration::from_millis(10), move || {
            fired_clone.store(true, Ordering::SeqCst);
        }));
        timer.rearm();
        tokio::time::advance(Duration::from_millis(20)).await;
        handle.await.unwrap();
        assert!(!fired.load(Ordering::SeqCst));
    }
}
