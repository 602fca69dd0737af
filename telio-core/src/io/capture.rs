//! Snapshot export
//!
//! Serializes what the sampler produced for consumers outside the process.

use serde::Serialize;

use crate::data::{InputSnapshot, Scheme};
use crate::error::Result;
use crate::io::boot_mask::BootMask;

/// Published view of the latest sample
#[derive(Debug, Clone, Serialize)]
pub struct InputReport<'a> {
    pub scheme: Scheme,
    /// Tri-state ground readings have been downgraded in this sample
    pub shutdown_window: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_mask: Option<BootMask>,
    #[serde(flatten)]
    pub snapshot: &'a InputSnapshot,
}

impl<'a> InputReport<'a> {
    pub fn new(scheme: Scheme, snapshot: &'a InputSnapshot) -> Self {
        Self {
            scheme,
            shutdown_window: false,
            boot_mask: None,
            snapshot,
        }
    }
}

/// Export report as pretty-printed JSON string
pub fn snapshot_to_json(report: &InputReport<'_>) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Export report as compact JSON string
pub fn snapshot_to_json_compact(report: &InputReport<'_>) -> Result<String> {
    Ok(serde_json::to_string(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Input, InputLevel};
    use std::time::Instant;

    #[test]
    fn test_report_json_shape() {
        let mut snapshot = InputSnapshot::new(Instant::now());
        snapshot.voltage = Some(12.0);
        snapshot.set_input(Input::Input1, InputLevel::Ground);
        snapshot.set_input(Input::Input4, InputLevel::Unknown);
        snapshot.ignition.valid = true;

        let mut report = InputReport::new(Scheme::Mixed6, &snapshot);
        report.shutdown_window = true;

        let value: serde_json::Value =
            serde_json::from_str(&snapshot_to_json_compact(&report).unwrap()).unwrap();
        assert_eq!(value["scheme"], "mixed6");
        assert_eq!(value["shutdown_window"], true);
        assert_eq!(value["voltage"], 12.0);
        assert_eq!(value["inputs"][0], "ground");
        assert_eq!(value["inputs"][1], serde_json::Value::Null);
        assert_eq!(value["inputs"][3], "unknown");
        assert_eq!(value["ignition"]["valid"], true);
        assert!(value.get("boot_mask").is_none());
        assert!(value.get("captured_at").is_none());
    }

    #[test]
    fn test_report_includes_boot_mask() {
        let snapshot = InputSnapshot::new(Instant::now());
        let mut report = InputReport::new(Scheme::Digital9x7, &snapshot);
        report.boot_mask = Some(BootMask::from_raw(0x09, Scheme::Digital9x7));

        let json = snapshot_to_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["boot_mask"]["ignition"], true);
        assert_eq!(value["boot_mask"]["watchdog"], true);
        assert!(json.contains('\n'));
    }
}
