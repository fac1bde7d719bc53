//! Decoding of the 12 bit telemetry value send back by a bidirectional ESC.
//!
//! A plain eRPM frame is `eeem_mmmm_mmmm`: the electrical period is the mantissa m shifted left by
//! the exponent e. `0x0FFF` is send while the motor is stopped.
//!
//! With extended DSHOT telemetry (EDT) enabled the ESC interleaves other values. These frames have
//! bit 8 cleared and a non-zero type in bits 11..=9. eRPM frames keep bit 8 set as long as the
//! period needs more than 8 bits, so the two can be told apart.

use defmt::Format;
use fixed::{types::extra::U2, FixedU8};

use crate::Error;

/// Raw value send by the ESC while the motor does not spin.
pub const STOPPED: u16 = 0x0FFF;
/// eRPM per LSB of [`Erpm::Value`].
pub const ERPM_PER_LSB: f32 = 100.0;
/// Numerator turning a period into eRPM / 100.
const ERPM_PERIOD_NUMERATOR: u64 = 6_000_000;
const MANTISSA_MASK: u16 = 0x01FF;
const EXPONENT_MASK: u16 = 0xFE00;
const EXPONENT_SHIFT: u16 = 9;

/// Result of decoding an eRPM frame.
#[derive(Debug, Format, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Erpm {
    /// The motor is not spinning.
    Stopped,
    /// eRPM in units of [`ERPM_PER_LSB`].
    Value(u32),
    /// The frame decoded to a period of 0.
    Invalid,
}

impl Erpm {
    /// eRPM / 100 with [`Erpm::Stopped`] as 0 or `None` if invalid.
    pub const fn erpm_x100(self) -> Option<u32> {
        match self {
            Self::Stopped => Some(0),
            Self::Value(v) => Some(v),
            Self::Invalid => None,
        }
    }
}

/// Decodes an eRPM telemetry frame.
pub fn decode_erpm(raw: u16) -> Erpm {
    if raw == STOPPED {
        return Erpm::Stopped;
    }
    let mantissa = u64::from(raw & MANTISSA_MASK);
    let exponent = (raw & EXPONENT_MASK) >> EXPONENT_SHIFT;
    if mantissa == 0 {
        return Erpm::Invalid;
    }
    // a period of 2^32 is way past the point where the result rounds to 0
    if exponent >= 32 {
        return Erpm::Stopped;
    }
    let period = mantissa << exponent;
    match (ERPM_PERIOD_NUMERATOR + period / 2) / period {
        0 => Erpm::Stopped,
        // at most ERPM_PERIOD_NUMERATOR
        erpm => Erpm::Value(erpm as u32),
    }
}

/// Turns eRPM into mechanical RPM for a fixed number of motor poles.
#[derive(Debug, Format, PartialEq, Clone, Copy)]
pub struct RpmConverter {
    pole_count: u8,
    factor: f32,
}

impl RpmConverter {
    /// Motor pole count used if nothing else is configured.
    pub const DEFAULT_POLE_COUNT: u8 = 14;

    /// Creates a converter for a motor with `pole_count` poles.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPoleCount`] if `pole_count` is zero or odd.
    pub fn new(pole_count: u8) -> Result<Self, Error> {
        if pole_count == 0 || pole_count % 2 != 0 {
            return Err(Error::InvalidPoleCount(pole_count));
        }
        Ok(Self {
            pole_count,
            factor: ERPM_PER_LSB / (f32::from(pole_count) / 2.0),
        })
    }

    pub const fn pole_count(&self) -> u8 {
        self.pole_count
    }

    /// RPM for a value in units of [`ERPM_PER_LSB`].
    #[allow(clippy::cast_precision_loss)]
    pub fn rpm(&self, erpm_x100: u32) -> f32 {
        erpm_x100 as f32 * self.factor
    }

    /// RPM of a decoded frame. A stopped motor has 0 RPM.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTelemetry`] for [`Erpm::Invalid`].
    pub fn convert(&self, erpm: Erpm) -> Result<f32, Error> {
        erpm.erpm_x100()
            .map(|v| self.rpm(v))
            .ok_or(Error::InvalidTelemetry)
    }
}

impl Default for RpmConverter {
    fn default() -> Self {
        Self {
            pole_count: Self::DEFAULT_POLE_COUNT,
            factor: ERPM_PER_LSB / (f32::from(Self::DEFAULT_POLE_COUNT) / 2.0),
        }
    }
}

/// A decoded telemetry frame.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Telemetry {
    Erpm(Erpm),
    /// °C
    Temperature(u8),
    /// Volt in 0.25V steps
    Voltage(FixedU8<U2>),
    /// Ampere
    Current(u8),
    Debug1(u8),
    Debug2(u8),
    Debug3(u8),
    StateEvent(u8),
}

/// Decodes a telemetry frame. Only with `extended` set frames are checked for EDT values,
/// otherwise every frame is eRPM. EDT values have no bits above bit 11, wider words are eRPM.
pub fn decode_telemetry(raw: u16, extended: bool) -> Telemetry {
    if !extended || raw > STOPPED {
        return Telemetry::Erpm(decode_erpm(raw));
    }
    let [_, data] = raw.to_be_bytes();
    match raw & 0x0F00 {
        0x0200 => Telemetry::Temperature(data),
        0x0400 => Telemetry::Voltage(FixedU8::from_bits(data)),
        0x0600 => Telemetry::Current(data),
        0x0800 => Telemetry::Debug1(data),
        0x0A00 => Telemetry::Debug2(data),
        0x0C00 => Telemetry::Debug3(data),
        0x0E00 => Telemetry::StateEvent(data),
        _ => Telemetry::Erpm(decode_erpm(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_sentinel() {
        assert_eq!(decode_erpm(0x0FFF), Erpm::Stopped);
        assert_eq!(decode_erpm(0x0FFF).erpm_x100(), Some(0));
    }

    #[test]
    fn zero_period_is_invalid() {
        assert_eq!(decode_erpm(0x0000), Erpm::Invalid);
        // exponent without mantissa
        assert_eq!(decode_erpm(0x0E00), Erpm::Invalid);
        assert_eq!(decode_erpm(0xFE00), Erpm::Invalid);
        assert_eq!(Erpm::Invalid.erpm_x100(), None);
    }

    #[test]
    fn period_to_erpm() {
        // period 100
        assert_eq!(decode_erpm(100), Erpm::Value(60_000));
        // period 100 << 2
        assert_eq!(decode_erpm((2 << 9) | 100), Erpm::Value(15_000));
        // period 1
        assert_eq!(decode_erpm(1), Erpm::Value(6_000_000));
        // period 7, 857142.86 rounds up
        assert_eq!(decode_erpm(7), Erpm::Value(857_143));
        // period 510 << 7 = 65280
        assert_eq!(decode_erpm(0x0FFE), Erpm::Value(92));
    }

    #[test]
    fn huge_periods_saturate_to_stopped() {
        // 256 << 127
        assert_eq!(decode_erpm(0xFF00), Erpm::Stopped);
        // 511 << 32
        assert_eq!(decode_erpm((32 << 9) | 0x1FF), Erpm::Stopped);
        // 1 << 24 is above 12_000_000
        assert_eq!(decode_erpm((24 << 9) | 1), Erpm::Stopped);
        // 1 << 23 is below it
        assert_eq!(decode_erpm((23 << 9) | 1), Erpm::Value(1));
    }

    #[test]
    fn never_decodes_to_zero_value() {
        for raw in 0..=u16::MAX {
            assert_ne!(decode_erpm(raw), Erpm::Value(0));
        }
    }

    #[test]
    fn rpm_for_14_poles() {
        let converter = RpmConverter::new(14).unwrap();
        assert_eq!(converter, RpmConverter::default());
        assert!((converter.rpm(7) - 100.0).abs() < 1e-3);
        assert!((converter.rpm(60_000) - 857_142.86).abs() < 0.5);
        assert_eq!(converter.convert(Erpm::Stopped), Ok(0.0));
        assert_eq!(
            converter.convert(Erpm::Invalid),
            Err(Error::InvalidTelemetry)
        );
    }

    #[test]
    fn rpm_depends_on_pole_pairs() {
        let two = RpmConverter::new(2).unwrap();
        let twelve = RpmConverter::new(12).unwrap();
        assert!((two.rpm(60) - 6000.0).abs() < 1e-3);
        assert!((twelve.rpm(60) - 1000.0).abs() < 1e-3);
        assert_eq!(twelve.pole_count(), 12);
    }

    #[test]
    fn rejects_odd_and_zero_pole_counts() {
        assert_eq!(RpmConverter::new(0), Err(Error::InvalidPoleCount(0)));
        assert_eq!(RpmConverter::new(7), Err(Error::InvalidPoleCount(7)));
        assert_eq!(RpmConverter::new(255), Err(Error::InvalidPoleCount(255)));
    }

    #[test]
    fn rpm_is_strictly_increasing() {
        for poles in [2, 12, 14, 28, 254] {
            let converter = RpmConverter::new(poles).unwrap();
            let mut last = converter.rpm(0);
            for erpm in (1..=6_000_000).step_by(997).chain(5_999_951..=6_000_000) {
                let rpm = converter.rpm(erpm);
                assert!(rpm > last, "{poles} poles, {erpm} erpm");
                last = rpm;
            }
        }
    }

    #[test]
    fn extended_telemetry() {
        assert_eq!(decode_telemetry(0x0219, true), Telemetry::Temperature(25));
        assert_eq!(
            decode_telemetry(0x0433, true),
            Telemetry::Voltage(FixedU8::from_num(12.75))
        );
        assert_eq!(decode_telemetry(0x0605, true), Telemetry::Current(5));
        assert_eq!(decode_telemetry(0x0801, true), Telemetry::Debug1(1));
        assert_eq!(decode_telemetry(0x0A02, true), Telemetry::Debug2(2));
        assert_eq!(decode_telemetry(0x0C03, true), Telemetry::Debug3(3));
        assert_eq!(decode_telemetry(0x0E04, true), Telemetry::StateEvent(4));
        assert_eq!(
            decode_telemetry(0x0FFF, true),
            Telemetry::Erpm(Erpm::Stopped)
        );
        // bit 8 set is always eRPM
        assert_eq!(
            decode_telemetry(0x0364, true),
            Telemetry::Erpm(decode_erpm(0x0364))
        );
    }

    #[test]
    fn wide_words_are_never_extended_telemetry() {
        assert_eq!(
            decode_telemetry(0x1219, true),
            Telemetry::Erpm(Erpm::Value(469))
        );
        assert_eq!(
            decode_telemetry(0xF433, true),
            Telemetry::Erpm(decode_erpm(0xF433))
        );
    }

    #[test]
    fn without_extended_telemetry_everything_is_erpm() {
        assert_eq!(
            decode_telemetry(0x0219, false),
            Telemetry::Erpm(decode_erpm(0x0219))
        );
    }
}
