//! Per-scheme channel tables
//!
//! Every scheme difference is declared here as data. The sampler, the
//! shutdown filter and the daemon only ever look signals up through
//! [`channel_map`]; nothing falls back across schemes.
//!
//! | Scheme     | Ignition | Voltage | Inputs                          | Tri-state |
//! |------------|----------|---------|---------------------------------|-----------|
//! | Digital9x7 | D0       | A0      | 1-7 on D1-D7                    | -         |
//! | DigitalA   | D8       | A0      | 1-5 on D1-D5, 7 on D7, no 6     | -         |
//! | Mixed6     | D7       | A0      | 1-3 on D1-D3, 4-6 on A4-A6      | 4, 5, 6   |
//! | Unified    | D0       | A0      | 1-5 on A1-A5, 6-7 on D6-D7      | 1-5       |
//! | None       | D0       | -       | -                               | -         |

use crate::constants::channel;
use crate::data::{Channel, ChannelKind, Input, Scheme};

/// Static channel assignment for one scheme
#[derive(Debug)]
pub struct ChannelMap {
    pub scheme: Scheme,
    /// Always a digital channel
    pub ignition: Channel,
    /// Always an analog channel when present
    pub voltage: Option<Channel>,
    /// Indexed by `Input::slot()`
    pub inputs: [Option<Channel>; channel::INPUT_COUNT],
    /// Minimum length of a usable bulk digital read
    pub required_digital: usize,
    /// Minimum length of a usable bulk analog read
    pub required_analog: usize,
    /// Inputs whose ground reading is ambiguous during power-down
    pub tri_state: &'static [Input],
    /// Analog channels wired to inputs whose analog classification is
    /// currently disabled. Recorded for reference; never sampled.
    pub inactive_analog: &'static [(Input, u8)],
}

impl ChannelMap {
    pub fn input(&self, input: Input) -> Option<Channel> {
        self.inputs[input.slot()]
    }

    /// Inputs read through the given channel kind, with their channels
    pub fn inputs_of_kind(&self, kind: ChannelKind) -> impl Iterator<Item = (Input, Channel)> + '_ {
        Input::ALL.into_iter().filter_map(move |input| {
            self.input(input)
                .filter(|channel| channel.kind == kind)
                .map(|channel| (input, channel))
        })
    }

    pub fn is_tri_state(&self, input: Input) -> bool {
        self.tri_state.contains(&input)
    }

    /// Number of inputs this scheme can populate
    pub fn input_count(&self) -> usize {
        self.inputs.iter().filter(|channel| channel.is_some()).count()
    }
}

static DIGITAL_9X7: ChannelMap = ChannelMap {
    scheme: Scheme::Digital9x7,
    ignition: Channel::digital(0),
    voltage: Some(Channel::analog(0)),
    inputs: [
        Some(Channel::digital(1)),
        Some(Channel::digital(2)),
        Some(Channel::digital(3)),
        Some(Channel::digital(4)),
        Some(Channel::digital(5)),
        Some(Channel::digital(6)),
        Some(Channel::digital(7)),
    ],
    required_digital: 9,
    required_analog: 1,
    tri_state: &[],
    inactive_analog: &[],
};

static DIGITAL_A: ChannelMap = ChannelMap {
    scheme: Scheme::DigitalA,
    ignition: Channel::digital(8),
    voltage: Some(Channel::analog(0)),
    inputs: [
        Some(Channel::digital(1)),
        Some(Channel::digital(2)),
        Some(Channel::digital(3)),
        Some(Channel::digital(4)),
        Some(Channel::digital(5)),
        None,
        Some(Channel::digital(7)),
    ],
    required_digital: 9,
    required_analog: 1,
    tri_state: &[],
    inactive_analog: &[],
};

static MIXED_6: ChannelMap = ChannelMap {
    scheme: Scheme::Mixed6,
    ignition: Channel::digital(7),
    voltage: Some(Channel::analog(0)),
    inputs: [
        Some(Channel::digital(1)),
        Some(Channel::digital(2)),
        Some(Channel::digital(3)),
        Some(Channel::analog(4)),
        Some(Channel::analog(5)),
        Some(Channel::analog(6)),
        None,
    ],
    required_digital: 11,
    required_analog: 7,
    tri_state: &[Input::Input4, Input::Input5, Input::Input6],
    inactive_analog: &[],
};

// Inputs 6 and 7 have analog taps (A6, A7) but their divider is unreliable on
// current boards, so they are classified digitally.
static UNIFIED: ChannelMap = ChannelMap {
    scheme: Scheme::Unified,
    ignition: Channel::digital(0),
    voltage: Some(Channel::analog(0)),
    inputs: [
        Some(Channel::analog(1)),
        Some(Channel::analog(2)),
        Some(Channel::analog(3)),
        Some(Channel::analog(4)),
        Some(Channel::analog(5)),
        Some(Channel::digital(6)),
        Some(Channel::digital(7)),
    ],
    required_digital: 8,
    required_analog: 8,
    tri_state: &[
        Input::Input1,
        Input::Input2,
        Input::Input3,
        Input::Input4,
        Input::Input5,
    ],
    inactive_analog: &[(Input::Input6, 6), (Input::Input7, 7)],
};

static NONE: ChannelMap = ChannelMap {
    scheme: Scheme::None,
    ignition: Channel::digital(0),
    voltage: None,
    inputs: [None; channel::INPUT_COUNT],
    required_digital: 1,
    required_analog: 0,
    tri_state: &[],
    inactive_analog: &[],
};

/// Channel table for a scheme
pub fn channel_map(scheme: Scheme) -> &'static ChannelMap {
    match scheme {
        Scheme::Digital9x7 => &DIGITAL_9X7,
        Scheme::DigitalA => &DIGITAL_A,
        Scheme::Mixed6 => &MIXED_6,
        Scheme::Unified => &UNIFIED,
        Scheme::None => &NONE,
    }
}
