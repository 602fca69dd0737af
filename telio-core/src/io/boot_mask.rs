//! Boot mask remapping
//!
//! The driver captures a bitmask once at boot describing ignition, the first
//! three inputs and why the board reset. Its layout depends on the scheme;
//! [`remap_boot_mask`] translates it into the canonical layout:
//!
//! | Bit | Meaning    |
//! |-----|------------|
//! | 0   | ignition   |
//! | 1-3 | input 1-3  |
//! | 4   | wiggle     |
//! | 5   | arm lockup |
//! | 6   | watchdog   |

use serde::Serialize;

use crate::constants::boot_mask::{
    ARM_LOCKUP, CANONICAL_MASK, IGNITION, INPUT1, INPUT2, INPUT3, LEGACY_RESET_CAUSES,
    LEGACY_RESET_SHIFT, WATCHDOG, WIGGLE,
};
use crate::data::Scheme;

/// Translate a raw boot mask into the canonical layout. Pure function.
pub fn remap_boot_mask(raw: u8, scheme: Scheme) -> u8 {
    match scheme {
        // bit 0 ignition, bits 1-3 wiggle/lockup/watchdog, inputs not captured
        Scheme::Digital9x7 | Scheme::DigitalA => {
            (raw & IGNITION) | ((raw & LEGACY_RESET_CAUSES) << LEGACY_RESET_SHIFT)
        }
        Scheme::Mixed6 | Scheme::Unified | Scheme::None => raw & CANONICAL_MASK,
    }
}

/// Decoded canonical boot mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BootMask {
    pub ignition: bool,
    pub inputs: [bool; 3],
    pub wiggle: bool,
    pub arm_lockup: bool,
    pub watchdog: bool,
}

impl BootMask {
    /// Remap and decode in one step
    pub fn from_raw(raw: u8, scheme: Scheme) -> Self {
        Self::from_canonical(remap_boot_mask(raw, scheme))
    }

    pub fn from_canonical(mask: u8) -> Self {
        Self {
            ignition: mask & IGNITION != 0,
            inputs: [mask & INPUT1 != 0, mask & INPUT2 != 0, mask & INPUT3 != 0],
            wiggle: mask & WIGGLE != 0,
            arm_lockup: mask & ARM_LOCKUP != 0,
            watchdog: mask & WATCHDOG != 0,
        }
    }

    /// True if the board came up because of a fault rather than a normal wake
    pub fn abnormal_reset(&self) -> bool {
        self.arm_lockup || self.watchdog
    }
}
