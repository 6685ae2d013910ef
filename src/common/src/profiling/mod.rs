pub mod head_profiler;
pub mod prof;

use prof::Prof;
use std::sync::OnceLock;

/// Process-wide CPU profiler, toggled by `SIGRTMIN+1` so it can be started
/// and stopped on a running process without a restart.
pub fn cpu_profiler() -> &'static Prof {
    static PROF: OnceLock<Prof> = OnceLock::new();
    PROF.get_or_init(Prof::default)
}

/// Listens for `SIGRTMIN+1` and flips the process-wide profiler on or off
/// on each delivery, dumping a flamegraph to `profile_dir` on stop. Must be
/// spawned onto a running tokio runtime.
#[cfg(unix)]
pub async fn profiler_signal_loop(profile_dir: String, sample_secs: u64) {
    use tokio::signal::unix::{signal, SignalKind};
    use tracing::{info, warn};

    let rtmin_plus_one = unsafe { libc::SIGRTMIN() + 1 };
    let mut sig = match signal(SignalKind::from_raw(rtmin_plus_one)) {
        Ok(sig) => sig,
        Err(e) => {
            warn!(error = %e, "failed to install profiler toggle signal handler");
            return;
        }
    };
    loop {
        sig.recv().await;
        let prof = cpu_profiler();
        match prof.start(sample_secs, profile_dir.clone()) {
            Ok(true) => info!("cpu profiler started"),
            Ok(false) => match prof.stop() {
                Ok(true) => info!("cpu profiler stopped"),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "failed to stop cpu profiler"),
            },
            Err(e) => warn!(error = %e, "failed to start cpu profiler"),
        }
    }
}
