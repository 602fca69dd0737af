//! Input sampling engine
//!
//! One call to [`sample`] performs a single bulk analog read and a single bulk
//! digital read, retries individual failed channels once through a
//! single-channel read, and classifies what it got into an [`InputSnapshot`].
//!
//! # Failure handling
//!
//! - A channel still reading the sentinel after its retry is left unset.
//! - A bulk read that is missing or too short skips that whole category.
//! - An unavailable driver, or a panic anywhere in the read sequence, yields
//!   `None` ("no sample this cycle").

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error, trace, warn};

use crate::constants::channel;
use crate::data::{Channel, ChannelKind, InputLevel, InputSnapshot, Scheme, Thresholds};
use crate::io::channel_map::{channel_map, ChannelMap};
use crate::io::source::RawChannelSource;

/// Classify an analog reading in millivolts
///
/// `low_mv` itself reads as ground and `high_mv` itself reads as powered.
#[inline]
pub fn classify_analog(millivolts: i32, thresholds: &Thresholds) -> InputLevel {
    if millivolts <= thresholds.low_mv {
        InputLevel::Ground
    } else if millivolts >= thresholds.high_mv {
        InputLevel::Powered
    } else {
        InputLevel::Floating
    }
}

/// Classify a digital pin state: any nonzero value is powered
#[inline]
pub fn classify_digital(value: i32) -> InputLevel {
    if value != 0 {
        InputLevel::Powered
    } else {
        InputLevel::Ground
    }
}

/// Convert the voltage channel reading to volts
#[inline]
pub fn millivolts_to_volts(millivolts: i32) -> f32 {
    millivolts as f32 / channel::MILLIVOLTS_PER_VOLT
}

/// Take one value from a bulk read, retrying that channel once on the sentinel
///
/// Returns `None` when the retry also fails.
fn read_with_retry<S>(source: &S, bulk: &[i32], ch: Channel) -> Option<i32>
where
    S: RawChannelSource + ?Sized,
{
    let first = bulk
        .get(ch.index as usize)
        .copied()
        .unwrap_or(channel::ERROR_SENTINEL);
    if first != channel::ERROR_SENTINEL {
        return Some(first);
    }

    let retry = match ch.kind {
        ChannelKind::Digital => source.read_digital(ch.index),
        ChannelKind::Analog => source.read_analog(ch.index),
    };

    if retry == channel::ERROR_SENTINEL {
        debug!(kind = ?ch.kind, index = ch.index, "Channel read failed after retry");
        None
    } else {
        debug!(kind = ?ch.kind, index = ch.index, value = retry, "Channel recovered on retry");
        Some(retry)
    }
}

/// Bulk read that is usable only if it covers every channel the scheme needs
fn usable_bulk(values: Option<Vec<i32>>, required: usize, kind: ChannelKind) -> Option<Vec<i32>> {
    match values {
        Some(values) if values.len() >= required => Some(values),
        Some(values) => {
            warn!(
                kind = ?kind,
                len = values.len(),
                required,
                "Bulk read too short, skipping channels this cycle"
            );
            None
        }
        None => {
            warn!(kind = ?kind, "Bulk read failed, skipping channels this cycle");
            None
        }
    }
}

fn sample_analog<S>(source: &S, map: &ChannelMap, thresholds: &Thresholds, snapshot: &mut InputSnapshot)
where
    S: RawChannelSource + ?Sized,
{
    let Some(voltage_channel) = map.voltage else {
        return;
    };

    let Some(bulk) = usable_bulk(source.read_all_analog(), map.required_analog, ChannelKind::Analog)
    else {
        return;
    };

    if let Some(mv) = read_with_retry(source, &bulk, voltage_channel) {
        snapshot.voltage = Some(millivolts_to_volts(mv));
    }

    for (input, ch) in map.inputs_of_kind(ChannelKind::Analog) {
        if let Some(mv) = read_with_retry(source, &bulk, ch) {
            snapshot.set_input(input, classify_analog(mv, thresholds));
        }
    }
}

fn sample_digital<S>(source: &S, map: &ChannelMap, snapshot: &mut InputSnapshot)
where
    S: RawChannelSource + ?Sized,
{
    let Some(bulk) = usable_bulk(
        source.read_all_digital(),
        map.required_digital,
        ChannelKind::Digital,
    ) else {
        return;
    };

    for (input, ch) in map.inputs_of_kind(ChannelKind::Digital) {
        if let Some(value) = read_with_retry(source, &bulk, ch) {
            snapshot.set_input(input, classify_digital(value));
        }
    }

    if let Some(value) = read_with_retry(source, &bulk, map.ignition) {
        snapshot.ignition.valid = true;
        snapshot.ignition.asserted = value != 0;
    }
}

/// Take one snapshot of all inputs for a scheme
///
/// Returns `None` when the driver is unavailable or the read sequence panics;
/// callers should simply try again next cycle.
pub fn sample<S>(source: &S, scheme: Scheme, thresholds: &Thresholds) -> Option<InputSnapshot>
where
    S: RawChannelSource + ?Sized,
{
    if !source.is_available() {
        debug!(scheme = %scheme, "Channel source unavailable, no sample this cycle");
        return None;
    }

    let map = channel_map(scheme);
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut snapshot = InputSnapshot::new(Instant::now());
        sample_analog(source, map, thresholds, &mut snapshot);
        sample_digital(source, map, &mut snapshot);
        snapshot
    }));

    match result {
        Ok(snapshot) => {
            trace!(
                scheme = %scheme,
                voltage = ?snapshot.voltage,
                inputs = ?snapshot.inputs,
                ignition = ?snapshot.ignition,
                "Sampled inputs"
            );
            Some(snapshot)
        }
        Err(_) => {
            error!(scheme = %scheme, "Panic during channel read, dropping sample");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Input;
    use crate::io::source::MockRawChannelSource;
    use mockall::predicate::eq;

    const T: Thresholds = Thresholds {
        low_mv: 2500,
        high_mv: 10000,
    };

    fn available() -> MockRawChannelSource {
        let mut source = MockRawChannelSource::new();
        source.expect_is_available().return_const(true);
        source
    }

    #[test]
    fn test_analog_classification_ranges() {
        assert_eq!(classify_analog(0, &T), InputLevel::Ground);
        assert_eq!(classify_analog(400, &T), InputLevel::Ground);
        assert_eq!(classify_analog(2501, &T), InputLevel::Floating);
        assert_eq!(classify_analog(8000, &T), InputLevel::Floating);
        assert_eq!(classify_analog(9999, &T), InputLevel::Floating);
        assert_eq!(classify_analog(13500, &T), InputLevel::Powered);
    }

    #[test]
    fn test_analog_classification_boundaries() {
        assert_eq!(classify_analog(T.low_mv, &T), InputLevel::Ground);
        assert_eq!(classify_analog(T.high_mv, &T), InputLevel::Powered);
    }

    #[test]
    fn test_digital_classification() {
        assert_eq!(classify_digital(0), InputLevel::Ground);
        assert_eq!(classify_digital(1), InputLevel::Powered);
        assert_eq!(classify_digital(5), InputLevel::Powered);
        assert_eq!(classify_digital(-7), InputLevel::Powered);
    }

    #[test]
    fn test_unavailable_source_gives_none() {
        let mut source = MockRawChannelSource::new();
        source.expect_is_available().return_const(false);
        source.expect_read_all_analog().never();
        source.expect_read_all_digital().never();
        assert!(sample(&source, Scheme::Mixed6, &T).is_none());
    }

    struct PanickingSource;

    impl RawChannelSource for PanickingSource {
        fn is_available(&self) -> bool {
            true
        }
        fn read_all_digital(&self) -> Option<Vec<i32>> {
            Some(vec![0; 11])
        }
        fn read_all_analog(&self) -> Option<Vec<i32>> {
            panic!("driver binding died")
        }
        fn read_digital(&self, _index: u8) -> i32 {
            0
        }
        fn read_analog(&self, _index: u8) -> i32 {
            0
        }
    }

    #[test]
    fn test_panicking_source_gives_none() {
        assert!(sample(&PanickingSource, Scheme::Mixed6, &T).is_none());
    }

    #[test]
    fn test_retry_succeeds_exactly_once() {
        let mut source = available();
        source
            .expect_read_all_analog()
            .times(1)
            .returning(|| Some(vec![12000, 0, 0, 0, -1, 13500, 8000]));
        source
            .expect_read_analog()
            .with(eq(4))
            .times(1)
            .return_const(500);
        source.expect_read_all_digital().times(1).returning(|| None);

        let snapshot = sample(&source, Scheme::Mixed6, &T).unwrap();
        assert_eq!(snapshot.input(Input::Input4), Some(InputLevel::Ground));
        assert_eq!(snapshot.input(Input::Input5), Some(InputLevel::Powered));
    }

    #[test]
    fn test_digital_and_ignition_retry_succeed_exactly_once() {
        let mut source = available();
        source.expect_read_all_analog().returning(|| None);
        source
            .expect_read_all_digital()
            .times(1)
            .returning(|| Some(vec![-1, -1, 1, 1, 1, 1, 1, -1, 0, 0, 0]));
        source
            .expect_read_digital()
            .with(eq(1))
            .times(1)
            .return_const(0);
        source
            .expect_read_digital()
            .with(eq(7))
            .times(1)
            .return_const(1);
        source.expect_read_analog().never();

        let snapshot = sample(&source, Scheme::Mixed6, &T).unwrap();
        assert_eq!(snapshot.input(Input::Input1), Some(InputLevel::Ground));
        assert_eq!(snapshot.input(Input::Input2), Some(InputLevel::Powered));
        assert!(snapshot.ignition.valid);
        assert!(snapshot.ignition.asserted);
        assert!(snapshot.voltage.is_none());
    }

    #[test]
    fn test_retry_failure_leaves_field_unset() {
        let mut source = available();
        source
            .expect_read_all_analog()
            .returning(|| Some(vec![12000, 0, 0, 0, 400, -1, 8000]));
        source
            .expect_read_analog()
            .with(eq(5))
            .times(1)
            .return_const(-1);
        source
            .expect_read_all_digital()
            .returning(|| Some(vec![1, -1, 1, 1, 1, 1, 1, 1, 0, 0, 0]));
        source
            .expect_read_digital()
            .with(eq(1))
            .times(1)
            .return_const(-1);

        let snapshot = sample(&source, Scheme::Mixed6, &T).unwrap();
        assert_eq!(snapshot.input(Input::Input5), None);
        assert_eq!(snapshot.input(Input::Input1), None);
        assert_eq!(snapshot.input(Input::Input4), Some(InputLevel::Ground));
        assert_eq!(snapshot.input(Input::Input2), Some(InputLevel::Powered));
    }

    #[test]
    fn test_ignition_retry_failure_is_invalid() {
        let mut source = available();
        source
            .expect_read_all_analog()
            .returning(|| Some(vec![12000]));
        source
            .expect_read_all_digital()
            .returning(|| Some(vec![-1, 1, 0, 1, 0, 1, 0, 1, 0]));
        source
            .expect_read_digital()
            .with(eq(0))
            .times(1)
            .return_const(-1);

        let snapshot = sample(&source, Scheme::Digital9x7, &T).unwrap();
        assert!(!snapshot.ignition.valid);
        assert!(!snapshot.ignition.asserted);
        assert_eq!(snapshot.input(Input::Input1), Some(InputLevel::Powered));
        assert_eq!(snapshot.input(Input::Input7), Some(InputLevel::Powered));
    }

    #[test]
    fn test_short_analog_skips_analog_only() {
        let mut source = available();
        source
            .expect_read_all_analog()
            .returning(|| Some(vec![12000, 0, 0]));
        source.expect_read_analog().never();
        source
            .expect_read_all_digital()
            .returning(|| Some(vec![1, 0, 1, 1, 1, 1, 1, 1, 0, 0, 0]));

        let snapshot = sample(&source, Scheme::Mixed6, &T).unwrap();
        assert!(snapshot.voltage.is_none());
        assert_eq!(snapshot.input(Input::Input4), None);
        assert_eq!(snapshot.input(Input::Input1), Some(InputLevel::Ground));
        assert!(snapshot.ignition.is_on());
    }

    #[test]
    fn test_scheme_without_voltage_skips_analog_read() {
        let mut source = available();
        source.expect_read_all_analog().never();
        source.expect_read_all_digital().returning(|| Some(vec![1]));

        let snapshot = sample(&source, Scheme::None, &T).unwrap();
        assert!(snapshot.voltage.is_none());
        assert_eq!(snapshot.populated_inputs(), 0);
        assert!(snapshot.ignition.is_on());
    }

    #[test]
    fn test_digital_a_never_populates_input6() {
        let mut source = available();
        source.expect_read_all_analog().returning(|| Some(vec![13800]));
        source
            .expect_read_all_digital()
            .returning(|| Some(vec![0, 1, 1, 1, 1, 1, 1, 1, 0]));

        let snapshot = sample(&source, Scheme::DigitalA, &T).unwrap();
        assert_eq!(snapshot.input(Input::Input6), None);
        assert_eq!(snapshot.input(Input::Input7), Some(InputLevel::Powered));
        assert!(snapshot.ignition.is_off());
        assert_eq!(snapshot.voltage, Some(13.8));
    }

    #[test]
    fn test_unified_ignores_inactive_analog_taps() {
        let mut source = available();
        // A6 and A7 would read as powered if they were consulted
        source
            .expect_read_all_analog()
            .returning(|| Some(vec![12500, 300, 12000, 6000, 300, 300, 14000, 14000]));
        source
            .expect_read_all_digital()
            .returning(|| Some(vec![1, 0, 0, 0, 0, 0, 0, 0]));

        let snapshot = sample(&source, Scheme::Unified, &T).unwrap();
        assert_eq!(snapshot.input(Input::Input1), Some(InputLevel::Ground));
        assert_eq!(snapshot.input(Input::Input2), Some(InputLevel::Powered));
        assert_eq!(snapshot.input(Input::Input3), Some(InputLevel::Floating));
        assert_eq!(snapshot.input(Input::Input6), Some(InputLevel::Ground));
        assert_eq!(snapshot.input(Input::Input7), Some(InputLevel::Ground));
        assert_eq!(snapshot.voltage, Some(12.5));
    }
}
