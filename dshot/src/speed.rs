use defmt::Format;
use fugit::HertzU32;

use crate::frame::BIT_LENGTH;

/// DSHOT bit rates. The number is the bit rate in kbit/s.
#[derive(Debug, Format, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Speed {
    Dshot150,
    Dshot300,
    #[default]
    Dshot600,
    Dshot1200,
}

impl Speed {
    /// Bits per second on the wire.
    pub const fn bit_rate(self) -> HertzU32 {
        match self {
            Self::Dshot150 => HertzU32::kHz(150),
            Self::Dshot300 => HertzU32::kHz(300),
            Self::Dshot600 => HertzU32::kHz(600),
            Self::Dshot1200 => HertzU32::kHz(1200),
        }
    }

    /// Timer frequency needed to play out [`BIT_LENGTH`] ticks per bit.
    pub fn timer_frequency(self) -> HertzU32 {
        self.bit_rate() * u32::from(BIT_LENGTH)
    }

    /// Bit rate of the GCR answer of a bidirectional ESC. It is 5/4 of the command bit rate so the
    /// 21 answer bits take about as long as the 16 command bits.
    pub fn response_bit_rate(self) -> HertzU32 {
        self.bit_rate() * 5 / 4
    }

    pub const fn supports_bidirectional(self) -> bool {
        !matches!(self, Self::Dshot150)
    }
}

impl From<Speed> for HertzU32 {
    fn from(value: Speed) -> Self {
        value.bit_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_frequencies() {
        assert_eq!(Speed::Dshot150.timer_frequency().to_Hz(), 3_000_000);
        assert_eq!(Speed::Dshot300.timer_frequency().to_Hz(), 6_000_000);
        assert_eq!(Speed::Dshot600.timer_frequency().to_Hz(), 12_000_000);
        assert_eq!(Speed::Dshot1200.timer_frequency().to_Hz(), 24_000_000);
    }

    #[test]
    fn response_rate() {
        assert_eq!(Speed::Dshot300.response_bit_rate().to_Hz(), 375_000);
        assert_eq!(Speed::Dshot600.response_bit_rate().to_Hz(), 750_000);
    }

    #[test]
    fn bidirectional_support() {
        assert!(!Speed::Dshot150.supports_bidirectional());
        assert!(Speed::Dshot300.supports_bidirectional());
        assert!(Speed::Dshot600.supports_bidirectional());
        assert!(Speed::Dshot1200.supports_bidirectional());
        assert_eq!(HertzU32::from(Speed::default()).to_kHz(), 600);
    }
}
