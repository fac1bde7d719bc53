//! Building DSHOT frames and turning them into timer compare values.

use defmt::Format;

use crate::Error;

/// Largest value that fits into the 11 bit command field.
pub const MAX_VALUE: u16 = 0x07FF;
/// Number of bits in a DSHOT frame.
pub const FRAME_BITS: usize = 16;
/// Slots with a compare value of 0 after the frame. Burst DMA needs these to leave the line idle.
pub const RESET_SLOTS: usize = 2;
/// Length of the compare value buffer handed to the timer.
pub const DMA_BUFFER_LEN: usize = FRAME_BITS + RESET_SLOTS;

/// Timer ticks per bit.
pub const BIT_LENGTH: u16 = 20;
/// Compare value for a 1.
pub const BIT_1: u16 = 14;
/// Compare value for a 0.
pub const BIT_0: u16 = 7;

const TELEMETRY_BIT: u16 = 1 << 4;
const CHECKSUM_MASK: u16 = 0x000F;

/// Compare values for one frame, MSB first, followed by the reset slots.
pub type DutySequence = [u16; DMA_BUFFER_LEN];

/// xor of the three nibbles of a 12 bit payload
const fn checksum(payload: u16) -> u16 {
    (payload ^ (payload >> 4) ^ (payload >> 8)) & CHECKSUM_MASK
}

/// A frame of two bytes that gets send over the wire.
#[derive(Debug, Format, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Frame {
    inner: u16,
}

impl Frame {
    /// Creates a frame for `value` (`0..=2047`).
    ///
    /// `inverted` selects the inverted checksum used by bidirectional DSHOT.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `value` does not fit into 11 bits. Values are not
    /// truncated, a truncated value could be a different special command.
    pub const fn new(value: u16, request_telemetry: bool, inverted: bool) -> Result<Self, Error> {
        if value > MAX_VALUE {
            return Err(Error::OutOfRange(value));
        }
        let payload = (value << 1) | request_telemetry as u16;
        let csum = if inverted {
            !checksum(payload) & CHECKSUM_MASK
        } else {
            checksum(payload)
        };
        Ok(Self {
            inner: (payload << 4) | csum,
        })
    }

    /// Returns the 11 bit command value.
    pub const fn value(self) -> u16 {
        self.inner >> 5
    }

    /// Returns whether the frame asks the ESC for telemetry.
    pub const fn telemetry_request(self) -> bool {
        self.inner & TELEMETRY_BIT != 0
    }

    /// Returns the 4 bit checksum.
    pub const fn checksum(self) -> u8 {
        (self.inner & CHECKSUM_MASK) as u8
    }

    /// Returns whether the frame carries the inverted (bidirectional) checksum.
    pub const fn is_inverted(self) -> bool {
        self.inner & CHECKSUM_MASK != checksum(self.inner >> 4)
    }

    /// Returns the raw [`u16`].
    pub const fn raw(self) -> u16 {
        self.inner
    }

    /// Returns the compare values for this frame using the default [`DutyTable`].
    pub fn duty_cycles(self) -> DutySequence {
        serialize(self)
    }
}

impl From<Frame> for u16 {
    fn from(value: Frame) -> Self {
        value.inner
    }
}

/// Encodes `value` into a frame.
///
/// The checksum is inverted when `telemetry_mode_active` is set, which is what bidirectional
/// DSHOT expects. `request_telemetry` only sets the telemetry bit.
///
/// # Errors
///
/// Returns [`Error::OutOfRange`] for values above 2047.
pub const fn encode(
    value: u16,
    request_telemetry: bool,
    telemetry_mode_active: bool,
) -> Result<Frame, Error> {
    Frame::new(value, request_telemetry, telemetry_mode_active)
}

/// Compare values for the two bit symbols.
#[derive(Debug, Format, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DutyTable {
    pub bit_0: u16,
    pub bit_1: u16,
}

impl DutyTable {
    /// Compare values for a timer counting [`BIT_LENGTH`] ticks per bit.
    pub const DEFAULT: Self = Self {
        bit_0: BIT_0,
        bit_1: BIT_1,
    };

    /// Scales the default compare values to a timer with `period` ticks per bit.
    pub const fn for_period(period: u16) -> Self {
        const fn scale(bit: u16, period: u16) -> u16 {
            (bit as u32 * period as u32 / BIT_LENGTH as u32) as u16
        }
        Self {
            bit_0: scale(BIT_0, period),
            bit_1: scale(BIT_1, period),
        }
    }
}

impl DutyTable {
    /// Checks that both symbols produce a pulse and a 0 is shorter than a 1.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDutyTable`] otherwise.
    pub const fn validate(&self) -> Result<(), Error> {
        if self.bit_0 == 0 || self.bit_0 >= self.bit_1 {
            return Err(Error::InvalidDutyTable);
        }
        Ok(())
    }
}

impl Default for DutyTable {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Turns a frame into compare values with the default [`DutyTable`].
pub fn serialize(frame: Frame) -> DutySequence {
    serialize_with(frame, &DutyTable::DEFAULT)
}

/// Turns a frame into compare values, MSB first. The last [`RESET_SLOTS`] entries are always 0.
pub fn serialize_with(frame: Frame, table: &DutyTable) -> DutySequence {
    let mut buffer = [0; DMA_BUFFER_LEN];
    let mut bits = frame.raw();
    for slot in buffer.iter_mut().take(FRAME_BITS) {
        *slot = if bits & 0x8000 == 0 {
            table.bit_0
        } else {
            table.bit_1
        };
        bits <<= 1;
    }
    buffer
}
