use defmt::Format;

use crate::Error;

/// First value that encodes throttle instead of a command.
pub const THROTTLE_OFFSET: u16 = 48;
/// Number of throttle steps.
pub const THROTTLE_STEPS: u16 = 2000;

/// Special command values below [`THROTTLE_OFFSET`]. Values not listed are unused.
#[repr(u16)]
#[derive(Debug, Format, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub enum Command {
    /// Stop the motor. Also used to arm the ESC.
    MotorStop = 0,
    /// Beep using the motor. Can only be send when stopped. Wait at least 260ms before next
    /// command.
    Beep1 = 1,
    /// Beep using the motor. Can only be send when stopped. Wait at least 260ms before next
    /// command.
    Beep2 = 2,
    /// Beep using the motor. Can only be send when stopped. Wait at least 260ms before next
    /// command.
    Beep3 = 3,
    /// Beep using the motor. Can only be send when stopped. Wait at least 260ms before next
    /// command.
    Beep4 = 4,
    /// Beep using the motor. Can only be send when stopped. Wait at least 260ms before next
    /// command.
    Beep5 = 5,
    /// Request ESC info. Wait at least 12ms before next command.
    EscInfo = 6,
    SpinDirection1 = 7,
    SpinDirection2 = 8,
    Disable3DMode = 9,
    Enable3DMode = 10,
    SettingsRequest = 11,
    /// Wait at least 35ms before next command.
    SaveSettings = 12,
    EnableExtendedTelemetry = 13,
    DisableExtendedTelemetry = 14,
    SpinDirectionNormal = 20,
    SpinDirectionReversed = 21,
    Led0On = 22,
    Led1On = 23,
    Led2On = 24,
    Led3On = 25,
    Led0Off = 26,
    Led1Off = 27,
    Led2Off = 28,
    Led3Off = 29,
    AudioStreamModeToggle = 30,
    SilentModeToggle = 31,
    DisableSignalLineTelemetry = 32,
    EnableSignalLineTelemetry = 33,
    SignalLineContinuousErpmTelemetry = 34,
    SignalLineContinuousErpmPeriodTelemetry = 35,
    /// 1°C per LSB.
    SignalLineTemperatureTelemetry = 42,
    /// 10mV per LSB.
    SignalLineVoltageTelemetry = 43,
    /// 100mA per LSB.
    SignalLineCurrentTelemetry = 44,
    /// 10mAh per LSB.
    SignalLineConsumptionTelemetry = 45,
    /// 100erpm per LSB.
    SignalLineErpmTelemetry = 46,
    /// 16us per LSB.
    SignalLineErpmPeriodTelemetry = 47,
}

impl Command {
    /// How often the command has to be send in a row before the ESC acts on it.
    pub const fn repetitions(self) -> usize {
        match self {
            Self::SpinDirection1
            | Self::SpinDirection2
            | Self::Disable3DMode
            | Self::Enable3DMode
            | Self::SaveSettings
            | Self::EnableExtendedTelemetry
            | Self::DisableExtendedTelemetry
            | Self::SpinDirectionNormal
            | Self::SpinDirectionReversed => 10,
            _ => 1,
        }
    }
}

impl From<Command> for u16 {
    fn from(value: Command) -> Self {
        value as Self
    }
}

/// Maps a throttle in `0..2000` to its command value in `48..=2047`.
///
/// # Errors
///
/// Returns [`Error::OutOfRange`] if `throttle` is 2000 or more.
pub const fn throttle_value(throttle: u16) -> Result<u16, Error> {
    if throttle >= THROTTLE_STEPS {
        return Err(Error::OutOfRange(throttle));
    }
    Ok(throttle + THROTTLE_OFFSET)
}
