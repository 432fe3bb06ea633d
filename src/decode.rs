//! Bit-sequence reassembly into IEEE-754 floats.
//!
//! The server encodes each value as one coil per bit. These functions fold an
//! ordered bit sequence back into an unsigned integer and reinterpret its bit
//! pattern as a float of the same width (`from_bits`, never a numeric cast),
//! so every pattern round-trips exactly, including NaN and infinity encodings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of coils in the timestamp channel (one per float64 bit).
pub const TIME_CHANNEL_BITS: u16 = 64;

/// Number of coils in the sine channel (one per float32 bit).
pub const SINE_CHANNEL_BITS: u16 = 32;

/// Error type for bit reassembly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed bit sequence: expected {expected} bits, got {actual}")]
    MalformedBitSequence { expected: usize, actual: usize },
}

/// Bit order of a coil channel as returned by the server.
///
/// The reference server presents each channel most-significant-bit first, but
/// devices differ, so the order is explicit rather than assumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitOrder {
    /// First coil is the most significant bit (default).
    #[default]
    Msb,
    /// First coil is the least significant bit.
    Lsb,
}

/// One decoded poll cycle: server timestamp and sine sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedSample {
    /// Server time as seconds since the Unix epoch.
    pub epoch_time: f64,
    /// sin(t) as sampled by the server.
    pub sine_value: f32,
}

/// Fold exactly 64 bits into an unsigned integer.
pub fn assemble_u64(bits: &[bool], order: BitOrder) -> Result<u64, DecodeError> {
    check_len(bits, 64)?;
    let acc = match order {
        BitOrder::Msb => bits.iter().fold(0u64, |acc, &b| (acc << 1) | b as u64),
        BitOrder::Lsb => bits.iter().rev().fold(0u64, |acc, &b| (acc << 1) | b as u64),
    };
    Ok(acc)
}

/// Fold exactly 32 bits into an unsigned integer.
pub fn assemble_u32(bits: &[bool], order: BitOrder) -> Result<u32, DecodeError> {
    check_len(bits, 32)?;
    let acc = match order {
        BitOrder::Msb => bits.iter().fold(0u32, |acc, &b| (acc << 1) | b as u32),
        BitOrder::Lsb => bits.iter().rev().fold(0u32, |acc, &b| (acc << 1) | b as u32),
    };
    Ok(acc)
}

/// Reassemble 64 bits into the float64 with that exact bit pattern.
pub fn assemble_f64(bits: &[bool], order: BitOrder) -> Result<f64, DecodeError> {
    Ok(f64::from_bits(assemble_u64(bits, order)?))
}

/// Reassemble 32 bits into the float32 with that exact bit pattern.
pub fn assemble_f32(bits: &[bool], order: BitOrder) -> Result<f32, DecodeError> {
    Ok(f32::from_bits(assemble_u32(bits, order)?))
}

fn check_len(bits: &[bool], expected: usize) -> Result<(), DecodeError> {
    if bits.len() != expected {
        return Err(DecodeError::MalformedBitSequence {
            expected,
            actual: bits.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_u64(value: u64) -> Vec<bool> {
        (0..64).map(|i| (value >> (63 - i)) & 1 == 1).collect()
    }

    fn expand_u32(value: u32) -> Vec<bool> {
        (0..32).map(|i| (value >> (31 - i)) & 1 == 1).collect()
    }

    #[test]
    fn test_round_trip_f64_patterns() {
        let patterns = [
            0u64,
            1,
            u64::MAX,
            1700000000.5f64.to_bits(),
            f64::INFINITY.to_bits(),
            f64::NEG_INFINITY.to_bits(),
            f64::NAN.to_bits(),
            0x7ff0000000000001, // signalling NaN
            (-0.0f64).to_bits(),
        ];

        for pattern in patterns {
            let bits = expand_u64(pattern);
            let value = assemble_f64(&bits, BitOrder::Msb).unwrap();
            assert_eq!(value.to_bits(), pattern);
        }
    }

    #[test]
    fn test_round_trip_f32_patterns() {
        let patterns = [
            0u32,
            1,
            u32::MAX,
            0.0f32.to_bits(),
            1.5f32.to_bits(),
            f32::INFINITY.to_bits(),
            f32::NAN.to_bits(),
            (-0.0f32).to_bits(),
        ];

        for pattern in patterns {
            let bits = expand_u32(pattern);
            let value = assemble_f32(&bits, BitOrder::Msb).unwrap();
            assert_eq!(value.to_bits(), pattern);
        }
    }

    #[test]
    fn test_concrete_scenario() {
        let time_bits = expand_u64(1700000000.5f64.to_bits());
        let sine_bits = expand_u32(0.0f32.to_bits());

        assert_eq!(assemble_f64(&time_bits, BitOrder::Msb).unwrap(), 1700000000.5);
        assert_eq!(assemble_f32(&sine_bits, BitOrder::Msb).unwrap(), 0.0);
    }

    #[test]
    fn test_lsb_order_is_reversed_msb() {
        let pattern = 0xDEADBEEFCAFEF00Du64;
        let mut bits = expand_u64(pattern);
        bits.reverse();

        assert_eq!(assemble_u64(&bits, BitOrder::Lsb).unwrap(), pattern);
    }

    #[test]
    fn test_length_guard_u64() {
        for len in [0usize, 32, 63, 65, 128] {
            let bits = vec![true; len];
            assert_eq!(
                assemble_u64(&bits, BitOrder::Msb),
                Err(DecodeError::MalformedBitSequence {
                    expected: 64,
                    actual: len
                })
            );
        }
    }

    #[test]
    fn test_length_guard_u32() {
        let bits = vec![false; 31];
        assert!(assemble_u32(&bits, BitOrder::Msb).is_err());
        let bits = vec![false; 33];
        assert!(assemble_u32(&bits, BitOrder::Msb).is_err());
    }

    #[test]
    fn test_msb_first_fold() {
        // 0b1010 in the low nibble, all higher bits clear
        let mut bits = vec![false; 60];
        bits.extend([true, false, true, false]);
        assert_eq!(assemble_u64(&bits, BitOrder::Msb).unwrap(), 0b1010);
    }
}
