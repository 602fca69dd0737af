//! Input Sampling Loop
//!
//! Samples the inputs on a fixed period and publishes each snapshot.
//!
//! # Behavior
//! - **Off-thread reads**: Channel reads run via `spawn_blocking`
//! - **Shutdown window**: Tri-state ground readings are downgraded after ignition drops
//! - **Error counting**: Consecutive empty samples are logged at the first and every Nth
//! - **Atomic publish**: The state file is replaced via temp file + rename

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use telio_core::constants::timing::FAILED_SAMPLE_LOG_EVERY;
use telio_core::{
    mark_untrustworthy, sample, snapshot_to_json_compact, write_atomic, BootMask, InputReport,
    InputSnapshot, RawChannelSource, Scheme, ShutdownWindow, TelioSettings, Thresholds,
};
use telio_error::Result;

/// Shared state between the sampling loop and the signal handler
pub struct SamplerState {
    /// Cleared to stop the loop
    pub running: AtomicBool,
    /// Poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Wakes the loop immediately on stop
    pub stop_notify: Notify,
    /// Samples attempted since start
    pub cycles: AtomicU64,
    /// Consecutive cycles that produced no sample
    pub failed_samples: AtomicU32,
}

impl SamplerState {
    pub fn new(poll_interval_ms: u32) -> Self {
        Self {
            running: AtomicBool::new(true),
            poll_interval_ms: poll_interval_ms as u64,
            stop_notify: Notify::new(),
            cycles: AtomicU64::new(0),
            failed_samples: AtomicU32::new(0),
        }
    }

    /// Ask the loop to exit after its current cycle
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.stop_notify.notify_one();
    }
}

/// Per-board sampling context
pub struct Sampler<S> {
    source: Arc<S>,
    scheme: Scheme,
    thresholds: Thresholds,
    window: Option<ShutdownWindow>,
    state_path: Option<PathBuf>,
    boot_mask: Option<BootMask>,
}

impl<S> Sampler<S>
where
    S: RawChannelSource + Send + Sync + 'static,
{
    pub fn new(source: Arc<S>, scheme: Scheme, settings: &TelioSettings) -> Self {
        let window = settings
            .shutdown
            .enabled
            .then(|| ShutdownWindow::new(Duration::from_millis(settings.shutdown.window_ms)));

        Self {
            source,
            scheme,
            thresholds: settings.sampling.thresholds(),
            window,
            state_path: settings.output.state_path.clone(),
            boot_mask: None,
        }
    }

    /// Attach the decoded boot mask so it is published with every snapshot
    pub fn with_boot_mask(mut self, boot_mask: Option<BootMask>) -> Self {
        self.boot_mask = boot_mask;
        self
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Take one sample on the blocking pool
    pub async fn sample_once(&self) -> Option<InputSnapshot> {
        let source = Arc::clone(&self.source);
        let scheme = self.scheme;
        let thresholds = self.thresholds;

        match tokio::task::spawn_blocking(move || sample(source.as_ref(), scheme, &thresholds)).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "Sampling task failed");
                None
            }
        }
    }

    /// Post-process one cycle's result
    ///
    /// Returns the snapshot to publish and whether it fell inside the
    /// shutdown window, or `None` when there was nothing to sample.
    pub fn process(
        &mut self,
        snapshot: Option<InputSnapshot>,
        state: &SamplerState,
    ) -> Option<(InputSnapshot, bool)> {
        let Some(mut snapshot) = snapshot else {
            let failures = state.failed_samples.fetch_add(1, Ordering::SeqCst) + 1;
            if failures == 1 || failures % FAILED_SAMPLE_LOG_EVERY == 0 {
                warn!(scheme = %self.scheme, count = failures, "No input sample this cycle");
            }
            return None;
        };

        let failures = state.failed_samples.swap(0, Ordering::SeqCst);
        if failures > 0 {
            info!(count = failures, "Sampling recovered");
        }

        let in_window = self
            .window
            .as_mut()
            .map(|window| window.observe(&snapshot))
            .unwrap_or(false);
        if in_window {
            mark_untrustworthy(&mut snapshot, self.scheme);
        }

        Some((snapshot, in_window))
    }

    /// Build the published view of a snapshot
    pub fn report<'a>(&self, snapshot: &'a InputSnapshot, in_window: bool) -> InputReport<'a> {
        let mut report = InputReport::new(self.scheme, snapshot);
        report.shutdown_window = in_window;
        report.boot_mask = self.boot_mask;
        report
    }

    /// Write the snapshot to the state file, if one is configured
    pub fn publish(&self, snapshot: &InputSnapshot, in_window: bool) -> Result<()> {
        let Some(path) = &self.state_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = snapshot_to_json_compact(&self.report(snapshot, in_window))?;
        write_atomic(path, json.as_bytes())
    }
}

/// Run the sampling loop until [`SamplerState::stop`] is called
pub async fn run_sampling_loop<S>(mut sampler: Sampler<S>, state: Arc<SamplerState>)
where
    S: RawChannelSource + Send + Sync + 'static,
{
    info!(
        scheme = %sampler.scheme(),
        poll_ms = state.poll_interval_ms,
        "Sampling loop starting"
    );

    let mut publish_errors: u32 = 0;

    loop {
        if !state.running.load(Ordering::SeqCst) {
            info!("Sampling loop shutting down");
            break;
        }

        state.cycles.fetch_add(1, Ordering::SeqCst);
        let snapshot = sampler.sample_once().await;

        if let Some((snapshot, in_window)) = sampler.process(snapshot, &state) {
            match sampler.publish(&snapshot, in_window) {
                Ok(()) => publish_errors = 0,
                Err(e) => {
                    publish_errors += 1;
                    if publish_errors == 1 || publish_errors % FAILED_SAMPLE_LOG_EVERY == 0 {
                        error!(count = publish_errors, "Failed to publish snapshot: {}", e);
                    }
                }
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(state.poll_interval_ms)) => {}
            _ = state.stop_notify.notified() => {
                debug!("Sampling loop woken up by stop signal");
            }
        }
    }

    info!(cycles = state.cycles.load(Ordering::SeqCst), "Sampling loop stopped");
}
