use defmt::Format;

use crate::{frame::DutyTable, speed::Speed, telemetry::RpmConverter, Error};

/// Per motor configuration.
#[derive(Debug, Format, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// DSHOT bit rate. Only needed to set up the timer.
    pub speed: Speed,
    /// Number of magnet poles of the motor. Has to be even.
    pub pole_count: u8,
    /// Decode extended DSHOT telemetry values next to eRPM.
    pub extended_telemetry: bool,
    /// Compare values for the timer.
    pub duty: DutyTable,
}

impl Config {
    /// Creates a new config for a DSHOT600 ESC driving a 14 pole motor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            speed: Speed::Dshot600,
            pole_count: RpmConverter::DEFAULT_POLE_COUNT,
            extended_telemetry: false,
            duty: DutyTable::DEFAULT,
        }
    }

    #[must_use]
    pub const fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub const fn with_pole_count(mut self, pole_count: u8) -> Self {
        self.pole_count = pole_count;
        self
    }

    #[must_use]
    pub const fn with_extended_telemetry(mut self, extended_telemetry: bool) -> Self {
        self.extended_telemetry = extended_telemetry;
        self
    }

    /// Use compare values for a timer counting `period` ticks per bit.
    #[must_use]
    pub const fn with_timer_period(mut self, period: u16) -> Self {
        self.duty = DutyTable::for_period(period);
        self
    }

    /// Checks that the config describes a real motor and a usable timer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPoleCount`] if the pole count is zero or odd and
    /// [`Error::InvalidDutyTable`] if the compare values can not tell a 0 from a 1.
    pub fn validate(&self) -> Result<(), Error> {
        self.duty.validate()?;
        self.rpm_converter().map(|_| ())
    }

    /// Checks the config and builds the eRPM to RPM converter for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPoleCount`] if the pole count is zero or odd.
    pub fn rpm_converter(&self) -> Result<RpmConverter, Error> {
        RpmConverter::new(self.pole_count)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
