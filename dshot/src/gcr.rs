//! GCR decoding of the answer of a bidirectional ESC.
//!
//! The ESC sends the 16 bit word `eeem_mmmm_mmmm_cccc` where c is the inverted xor of the other
//! three nibbles. Each nibble is encoded using [GCR encoding][1]:
//!
//! | 0x0  | 0x1  | 0x2  | 0x3  | 0x4  | 0x5  | 0x6  | 0x7  | 0x8  | 0x9  | 0xA  | 0xB  | 0xC  | 0xD  | 0xE  | 0xF  |
//! |------|------|------|------|------|------|------|------|------|------|------|------|------|------|------|------|
//! | 0x19 | 0x1B | 0x12 | 0x13 | 0x1D | 0x15 | 0x16 | 0x17 | 0x1A | 0x09 | 0x0A | 0x0B | 0x1E | 0x0D | 0x0E | 0x0F |
//!
//! after the transformation there are 20 bits. A leading 0 is added and the bits are encoded by
//! the change from one bit to the next: a 1 flips the line, a 0 keeps it. The receiver samples 21
//! line bits, MSB first.
//!
//! [1]: https://en.wikipedia.org/wiki/Run-length_limited#GCR:_(0,2)_RLL

#[cfg(not(test))]
use defmt::warn;
#[cfg(test)]
use log::warn;

use crate::Error;

/// Number of line bits in one answer.
pub const RESPONSE_BITS: u32 = 21;

const ENCODE: [u8; 16] = [
    0x19, 0x1B, 0x12, 0x13, 0x1D, 0x15, 0x16, 0x17, 0x1A, 0x09, 0x0A, 0x0B, 0x1E, 0x0D, 0x0E, 0x0F,
];

/// Decodes the 5 LSBs of value
const fn decode_symbol(value: u32) -> Option<u16> {
    match value & 0x1F {
        0x19 => Some(0x0),
        0x1B => Some(0x1),
        0x12 => Some(0x2),
        0x13 => Some(0x3),
        0x1D => Some(0x4),
        0x15 => Some(0x5),
        0x16 => Some(0x6),
        0x17 => Some(0x7),
        0x1A => Some(0x8),
        0x09 => Some(0x9),
        0x0A => Some(0xA),
        0x0B => Some(0xB),
        0x1E => Some(0xC),
        0x0D => Some(0xD),
        0x0E => Some(0xE),
        0x0F => Some(0xF),
        _ => None,
    }
}

const fn fold_nibbles(value: u16) -> u16 {
    let csum = (value >> 8) ^ value;
    ((csum >> 4) ^ csum) & 0xF
}

/// Decodes the 21 received line bits into the 12 bit telemetry value.
///
/// # Errors
///
/// Returns [`Error::InvalidGcr`] if a 5 bit group is not a GCR code and
/// [`Error::TelemetryChecksum`] if the checksum does not match.
pub fn decode(bits: u32) -> Result<u16, Error> {
    let gcr = bits ^ (bits >> 1);
    let mut value = 0;
    for shift in [15, 10, 5, 0] {
        let nibble = decode_symbol(gcr >> shift).ok_or(Error::InvalidGcr)?;
        value = (value << 4) | nibble;
    }
    let csum = fold_nibbles(value);
    if csum != 0xF {
        warn!("telemetry checksum failed. got {}", csum);
        return Err(Error::TelemetryChecksum(csum as u8));
    }
    Ok(value >> 4)
}

/// Encodes a 12 bit telemetry value into the 21 line bits an ESC sends for it.
pub fn encode(value: u16) -> u32 {
    let value = value & 0x0FFF;
    let csum = !fold_nibbles(value) & 0xF;
    let word = (value << 4) | csum;
    let gcr = [12u16, 8, 4, 0].iter().fold(0u32, |gcr, shift| {
        (gcr << 5) | u32::from(ENCODE[usize::from((word >> shift) & 0xF)])
    });
    to_line(gcr)
}

/// Turns 20 gcr bits into line levels. Bit 20 starts at 0, every 1 flips the line.
fn to_line(gcr: u32) -> u32 {
    let mut line = 0;
    let mut level = 0;
    for i in (0..RESPONSE_BITS - 1).rev() {
        level ^= (gcr >> i) & 1;
        line |= level << i;
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_match_table() {
        for (nibble, symbol) in ENCODE.iter().enumerate() {
            assert_eq!(decode_symbol(u32::from(*symbol)), Some(nibble as u16));
        }
        let valid = (0..32).filter(|s| decode_symbol(*s).is_some()).count();
        assert_eq!(valid, 16);
    }

    #[test]
    fn stopped_frame() {
        let bits = encode(0x0FFF);
        assert!(bits < 1 << RESPONSE_BITS);
        assert_eq!(decode(bits), Ok(0x0FFF));
    }

    #[test]
    fn decodes_what_the_esc_sends() {
        for value in [0x0000, 0x0001, 0x0064, 0x0364, 0x0219, 0x0433, 0x0E04, 0x0FFE] {
            assert_eq!(decode(encode(value)), Ok(value), "value {value:#x}");
        }
    }

    #[test]
    fn checksum_is_inverted_xor() {
        // 0x0FFF: 0xF ^ 0xF ^ 0xF = 0xF, inverted 0x0
        let bits = encode(0x0FFF);
        let gcr = bits ^ (bits >> 1);
        assert_eq!(gcr & 0x1F, 0x19);
        assert_eq!((gcr >> 5) & 0x1F, 0x0F);
    }

    #[test]
    fn rejects_invalid_symbols() {
        // all zero line bits give an all zero gcr stream
        assert_eq!(decode(0), Err(Error::InvalidGcr));
    }

    #[test]
    fn rejects_wrong_checksum() {
        let bits = encode(0x0364);
        // swap the checksum symbol for another valid one
        let gcr = bits ^ (bits >> 1);
        let csum_symbol = gcr & 0x1F;
        let other = if csum_symbol == 0x0E { 0x0D } else { 0x0E };
        let line = to_line((gcr & !0x1F) | other);
        assert!(matches!(decode(line), Err(Error::TelemetryChecksum(_))));
    }
}
