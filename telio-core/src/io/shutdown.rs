//! Shutdown-window handling
//!
//! While the board powers down, tri-state analog lines drift toward ground and
//! cannot be told apart from a genuinely grounded input. Snapshots taken in
//! that window get their tri-state ground readings downgraded to `Unknown`.

use std::time::{Duration, Instant};
use tracing::debug;

use crate::data::{InputLevel, InputSnapshot, Scheme};
use crate::io::channel_map::channel_map;

/// Downgrade tri-state `Ground` readings to `Unknown`
///
/// Only call this for snapshots taken inside the shutdown window; outside it
/// this would discard legitimate ground readings.
pub fn mark_untrustworthy(snapshot: &mut InputSnapshot, scheme: Scheme) {
    let map = channel_map(scheme);

    for &input in map.tri_state {
        let slot = &mut snapshot.inputs[input.slot()];
        if *slot == Some(InputLevel::Ground) {
            *slot = Some(InputLevel::Unknown);
            debug!(scheme = %scheme, input = %input, "Ground reading untrustworthy during shutdown");
        }
    }
}

/// Tracks the shutdown window from successive ignition readings
///
/// The window opens when ignition goes from asserted to not asserted and
/// stays open for a fixed duration. Invalid ignition readings neither open
/// nor close it.
#[derive(Debug)]
pub struct ShutdownWindow {
    length: Duration,
    last_ignition_on: Option<bool>,
    opened_at: Option<Instant>,
}

impl ShutdownWindow {
    pub fn new(length: Duration) -> Self {
        Self {
            length,
            last_ignition_on: None,
            opened_at: None,
        }
    }

    /// Feed one snapshot; returns whether it was taken inside the window
    pub fn observe(&mut self, snapshot: &InputSnapshot) -> bool {
        let now = snapshot.captured_at;

        if snapshot.ignition.valid {
            let on = snapshot.ignition.asserted;
            match (self.last_ignition_on, on) {
                (Some(true), false) => {
                    debug!(window_ms = self.length.as_millis() as u64, "Ignition dropped, shutdown window open");
                    self.opened_at = Some(now);
                }
                (_, true) => self.opened_at = None,
                _ => {}
            }
            self.last_ignition_on = Some(on);
        }

        self.is_open_at(now)
    }

    pub fn is_open_at(&self, now: Instant) -> bool {
        self.opened_at
            .map(|opened| now.saturating_duration_since(opened) < self.length)
            .unwrap_or(false)
    }
}
