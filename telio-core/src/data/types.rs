//! Core data types for Telio
//!
//! Defines the scheme tag, logical signals and the input snapshot handed to callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::constants::{channel, thresholds};

/// Board I/O scheme
///
/// Each scheme wires the same logical signals to different physical channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    /// Oldest board, all-digital, ignition on D0
    Digital9x7,
    /// All-digital, ignition on a dedicated pin, no input 6
    DigitalA,
    /// Three digital and three analog-capable inputs
    Mixed6,
    /// Newer board family with analog-capable inputs and a fixed ignition pin
    Unified,
    /// No recognized scheme
    #[default]
    None,
}

impl Scheme {
    /// All schemes, in detection-table order
    pub const ALL: [Scheme; 5] = [
        Scheme::Digital9x7,
        Scheme::DigitalA,
        Scheme::Mixed6,
        Scheme::Unified,
        Scheme::None,
    ];

    /// Stable name used in logs and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Digital9x7 => "digital9x7",
            Scheme::DigitalA => "digital_a",
            Scheme::Mixed6 => "mixed6",
            Scheme::Unified => "unified",
            Scheme::None => "none",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// General-purpose logical input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Input {
    Input1,
    Input2,
    Input3,
    Input4,
    Input5,
    Input6,
    Input7,
}

impl Input {
    pub const ALL: [Input; channel::INPUT_COUNT] = [
        Input::Input1,
        Input::Input2,
        Input::Input3,
        Input::Input4,
        Input::Input5,
        Input::Input6,
        Input::Input7,
    ];

    /// Zero-based slot in `InputSnapshot::inputs`
    pub fn slot(self) -> usize {
        self as usize
    }

    /// One-based input number as printed on the harness
    pub fn number(self) -> u8 {
        self as u8 + 1
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "input{}", self.number())
    }
}

/// Classified level of a logical input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputLevel {
    Ground,
    Powered,
    Floating,
    /// Read during the shutdown window where ground cannot be trusted
    Unknown,
}

/// How a physical channel is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Digital,
    Analog,
}

/// A physical channel: its kind and its index in the bulk-read sequence.
///
/// The index doubles as the single-channel identifier for retry reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub kind: ChannelKind,
    pub index: u8,
}

impl Channel {
    pub const fn digital(index: u8) -> Self {
        Self {
            kind: ChannelKind::Digital,
            index,
        }
    }

    pub const fn analog(index: u8) -> Self {
        Self {
            kind: ChannelKind::Analog,
            index,
        }
    }
}

/// Analog classification thresholds in millivolts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub low_mv: i32,
    pub high_mv: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low_mv: thresholds::DEFAULT_LOW_MV,
            high_mv: thresholds::DEFAULT_HIGH_MV,
        }
    }
}

/// Ignition state as seen by the sampler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnitionReading {
    /// False when the ignition channel could not be read this cycle
    pub valid: bool,
    pub asserted: bool,
}

impl IgnitionReading {
    /// Ignition known to be on
    pub fn is_on(&self) -> bool {
        self.valid && self.asserted
    }

    /// Ignition known to be off
    pub fn is_off(&self) -> bool {
        self.valid && !self.asserted
    }
}

/// One sampling cycle's worth of scheme-independent inputs
///
/// Fields left at `None` were not read this cycle and must be treated as
/// unknown, never as ground.
#[derive(Debug, Clone, Serialize)]
pub struct InputSnapshot {
    #[serde(skip)]
    pub captured_at: Instant,
    /// Supply voltage in volts
    pub voltage: Option<f32>,
    pub inputs: [Option<InputLevel>; channel::INPUT_COUNT],
    pub ignition: IgnitionReading,
}

impl InputSnapshot {
    /// Empty snapshot stamped with the given capture time
    pub fn new(captured_at: Instant) -> Self {
        Self {
            captured_at,
            voltage: None,
            inputs: [None; channel::INPUT_COUNT],
            ignition: IgnitionReading::default(),
        }
    }

    pub fn input(&self, input: Input) -> Option<InputLevel> {
        self.inputs[input.slot()]
    }

    pub fn set_input(&mut self, input: Input, level: InputLevel) {
        self.inputs[input.slot()] = Some(level);
    }

    /// Number of inputs that received a level this cycle
    pub fn populated_inputs(&self) -> usize {
        self.inputs.iter().filter(|level| level.is_some()).count()
    }
}
