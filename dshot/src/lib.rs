//! # DSHOT
//!
//! Bits are encoded using pulse length inside a fixed bit period:
//! ```text
//!  _______               ______________
//! |       |_____________|              |_____|
//! |        bit 0        |        bit 1       |
//! ```
//! A timer running at 20 ticks per bit plays out a compare value of 7 ticks for a 0 and 14 ticks
//! for a 1. The compare values for one frame are handed to the timer as a burst, followed by two
//! slots with a compare value of 0 that keep the line idle after the frame.
//!
//! A DSHOT frame consists of 3 parts:
//! `vvvv_vvvv_vvvt_cccc`
//! v is the command value send to the ESC.
//! t asks the ESC to send telemetry.
//! c is the xor of the nibbles `vvvv_vvvv_vvvt`.
//!
//! Values 1..=47 of v are special commands, 0 stops the motor and 48..=2047 are throttle.
//!
//! # Bidirectional DSHOT
//!
//! The checksum is inverted. This tells the ESC to answer every frame with an eRPM telemetry frame
//! on the same wire:
//! `eeem_mmmm_mmmm_cccc`
//! e is the exponent, m the mantissa of the electrical period. The answer is GCR encoded, see
//! [`gcr`]. [`telemetry`] turns the period into eRPM and RPM.

#![cfg_attr(any(not(test), target_arch = "arm"), no_std)]

pub mod command;
pub mod config;
pub mod driver;
pub mod frame;
pub mod gcr;
pub mod speed;
pub mod telemetry;

use defmt::Format;

pub use command::Command;
pub use config::Config;
pub use driver::{
    Bidirectional, Dshot, GcrResponse, LineSampler, PulseSink, ResponseSource, Unidirectional,
};
pub use frame::{encode, serialize, DutySequence, DutyTable, Frame};
pub use speed::Speed;
pub use telemetry::{decode_erpm, decode_telemetry, Erpm, RpmConverter, Telemetry};

/// Errors of the DSHOT codec.
#[derive(Debug, Format, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The command value does not fit into 11 bits or the throttle is not in `0..2000`.
    OutOfRange(u16),
    /// The telemetry frame decoded to a period of zero.
    InvalidTelemetry,
    /// Motors have an even, non-zero number of poles.
    InvalidPoleCount(u8),
    /// DSHOT150 has no bidirectional variant.
    UnsupportedSpeed,
    /// A 5 bit group of the response is not a GCR code.
    InvalidGcr,
    /// The telemetry checksum did not fold to `0xF`. Contains the folded value.
    TelemetryChecksum(u8),
    /// The compare value of a 0 is zero or not shorter than the one of a 1.
    InvalidDutyTable,
}
