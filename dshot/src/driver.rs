//! Driver for one ESC on top of the codec.
//!
//! The hardware is hidden behind [`PulseSink`] and [`ResponseSource`]. The driver starts out in
//! [`Unidirectional`] mode. [`Dshot::enable_telemetry`] hands it a response source and switches to
//! [`Bidirectional`] mode, where every frame is sent with an inverted checksum and the ESC answers
//! with telemetry.

use core::convert::Infallible;

#[cfg(not(test))]
use defmt::{debug, trace, warn};
use defmt::Format;
#[cfg(test)]
use log::{debug, trace, warn};

use crate::{
    command::{throttle_value, Command},
    config::Config,
    frame::{encode, serialize_with, DutySequence},
    gcr,
    telemetry::{decode_telemetry, Erpm, RpmConverter, Telemetry},
};

/// Plays out the duty cycles of one frame, e.g. using a timer and DMA.
pub trait PulseSink {
    type Error;

    /// Emits `duty` in order, one entry per timer period.
    ///
    /// # Errors
    ///
    /// Hardware specific.
    fn emit(&mut self, duty: &DutySequence) -> Result<(), Self::Error>;
}

/// Delivers the telemetry word the ESC answered with.
pub trait ResponseSource {
    type Error;

    /// Returns the telemetry word with GCR and checksum already removed.
    /// [`nb::Error::WouldBlock`] means no answer was received yet.
    ///
    /// # Errors
    ///
    /// Hardware specific.
    fn capture(&mut self) -> nb::Result<u16, Self::Error>;
}

/// Samples the raw line levels of an answer.
pub trait LineSampler {
    type Error;

    /// Returns the [`gcr::RESPONSE_BITS`] sampled line bits, MSB first.
    ///
    /// # Errors
    ///
    /// Hardware specific.
    fn sample(&mut self) -> nb::Result<u32, Self::Error>;
}

/// Error of a [`GcrResponse`].
#[derive(Debug, Format, PartialEq, Eq, Clone, Copy)]
pub enum ResponseError<E> {
    Line(E),
    Decode(crate::Error),
}

/// Turns a [`LineSampler`] into a [`ResponseSource`] by decoding the GCR answer in software.
#[derive(Debug)]
pub struct GcrResponse<L> {
    sampler: L,
}

impl<L: LineSampler> GcrResponse<L> {
    pub const fn new(sampler: L) -> Self {
        Self { sampler }
    }

    pub fn free(self) -> L {
        self.sampler
    }
}

impl<L: LineSampler> ResponseSource for GcrResponse<L> {
    type Error = ResponseError<L::Error>;

    fn capture(&mut self) -> nb::Result<u16, Self::Error> {
        let bits = self
            .sampler
            .sample()
            .map_err(|e| e.map(ResponseError::Line))?;
        gcr::decode(bits).map_err(|e| nb::Error::Other(ResponseError::Decode(e)))
    }
}

/// Errors of the driver.
#[derive(Debug, Format, PartialEq, Eq, Clone, Copy)]
pub enum Error<S, C> {
    /// The pulse sink failed.
    Sink(S),
    /// The response source failed.
    Source(C),
    Codec(crate::Error),
}

impl<S, C> From<crate::Error> for Error<S, C> {
    fn from(value: crate::Error) -> Self {
        Self::Codec(value)
    }
}

/// Marker trait for valid DSHOT modes
pub trait ValidMode {
    /// Frames are send with an inverted checksum.
    const TELEMETRY_MODE: bool;
    type SourceError;
}

/// Marker for Unidirectional DSHOT
#[derive(Debug, Clone, Copy)]
pub struct Unidirectional;

/// Marker for Bidirectional DSHOT. Owns the source of the answers.
#[derive(Debug)]
pub struct Bidirectional<C> {
    source: C,
}

impl ValidMode for Unidirectional {
    const TELEMETRY_MODE: bool = false;
    type SourceError = Infallible;
}

impl<C: ResponseSource> ValidMode for Bidirectional<C> {
    const TELEMETRY_MODE: bool = true;
    type SourceError = C::Error;
}

/// A single ESC.
pub struct Dshot<S, M> {
    sink: S,
    config: Config,
    rpm: RpmConverter,
    last_erpm: Erpm,
    mode: M,
}

impl<S: PulseSink> Dshot<S, Unidirectional> {
    /// Creates a new driver in unidirectional mode.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidPoleCount`] if the config has an invalid pole count and
    /// [`crate::Error::InvalidDutyTable`] if its compare values are unusable.
    pub fn new(sink: S, config: Config) -> Result<Self, crate::Error> {
        config.validate()?;
        let rpm = config.rpm_converter()?;
        debug!(
            "new dshot driver at {:?} with {} poles",
            config.speed, config.pole_count
        );
        Ok(Self {
            sink,
            config,
            rpm,
            last_erpm: Erpm::Stopped,
            mode: Unidirectional,
        })
    }

    /// Enables bidirectional DSHOT. The driver is dropped if this fails.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedSpeed`] for DSHOT150.
    pub fn enable_telemetry<C: ResponseSource>(
        self,
        source: C,
    ) -> Result<Dshot<S, Bidirectional<C>>, crate::Error> {
        if !self.config.speed.supports_bidirectional() {
            warn!("{:?} has no bidirectional mode", self.config.speed);
            return Err(crate::Error::UnsupportedSpeed);
        }
        debug!("enabling bidirectional dshot");
        Ok(Dshot {
            sink: self.sink,
            config: self.config,
            rpm: self.rpm,
            last_erpm: Erpm::Stopped,
            mode: Bidirectional { source },
        })
    }

    /// Releases the pulse sink.
    pub fn free(self) -> S {
        self.sink
    }
}

impl<S: PulseSink, C: ResponseSource> Dshot<S, Bidirectional<C>> {
    /// Disables bidirectional DSHOT and gives back the response source.
    pub fn disable_telemetry(self) -> (Dshot<S, Unidirectional>, C) {
        debug!("disabling bidirectional dshot");
        (
            Dshot {
                sink: self.sink,
                config: self.config,
                rpm: self.rpm,
                last_erpm: Erpm::Stopped,
                mode: Unidirectional,
            },
            self.mode.source,
        )
    }

    /// Reads the answer to the last frame. eRPM frames update [`Self::erpm`].
    ///
    /// # Errors
    ///
    /// [`nb::Error::WouldBlock`] if the ESC did not answer yet, [`Error::Source`] if the source
    /// failed and [`crate::Error::InvalidTelemetry`] for an eRPM frame with a period of 0.
    pub fn read_telemetry(&mut self) -> nb::Result<Telemetry, Error<S::Error, C::Error>> {
        let raw = self
            .mode
            .source
            .capture()
            .map_err(|e| e.map(Error::Source))?;
        let telemetry = decode_telemetry(raw, self.config.extended_telemetry);
        match telemetry {
            Telemetry::Erpm(Erpm::Invalid) => {
                warn!("dropping invalid erpm frame {}", raw);
                return Err(nb::Error::Other(crate::Error::InvalidTelemetry.into()));
            }
            Telemetry::Erpm(erpm) => self.last_erpm = erpm,
            _ => trace!("extended telemetry {}", raw),
        }
        Ok(telemetry)
    }

    /// Last valid eRPM reading.
    pub const fn erpm(&self) -> Erpm {
        self.last_erpm
    }

    /// Mechanical RPM of the last valid eRPM reading.
    pub fn rpm(&self) -> f32 {
        self.last_erpm
            .erpm_x100()
            .map_or(0.0, |erpm| self.rpm.rpm(erpm))
    }
}

impl<S: PulseSink, M: ValidMode> Dshot<S, M> {
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Sends a raw command value.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfRange`] if value does not fit into 11 bits and
    /// [`Error::Sink`] if the sink failed.
    pub fn send(
        &mut self,
        value: u16,
        request_telemetry: bool,
    ) -> Result<(), Error<S::Error, M::SourceError>> {
        let frame = encode(value, request_telemetry, M::TELEMETRY_MODE)?;
        trace!("sending dshot frame {:#x}", frame.raw());
        self.sink
            .emit(&serialize_with(frame, &self.config.duty))
            .map_err(Error::Sink)
    }

    /// Sets the throttle in `0..2000`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfRange`] for a throttle of 2000 or more.
    pub fn throttle(&mut self, throttle: u16) -> Result<(), Error<S::Error, M::SourceError>> {
        self.send(throttle_value(throttle)?, false)
    }

    /// Sends a command as often as the ESC needs it. Commands other than
    /// [`Command::MotorStop`] have the telemetry bit set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sink`] if the sink failed.
    pub fn send_command(&mut self, command: Command) -> Result<(), Error<S::Error, M::SourceError>> {
        debug!("sending dshot command {:?}", command);
        for _ in 0..command.repetitions() {
            self.send(command.into(), command != Command::MotorStop)?;
        }
        Ok(())
    }

    /// Disarm the motor
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sink`] if the sink failed.
    pub fn disarm(&mut self) -> Result<(), Error<S::Error, M::SourceError>> {
        self.send_command(Command::MotorStop)
    }
}
