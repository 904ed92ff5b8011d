//! Low-level word and bit-slot manipulation for byte slices.
//!
//! Bits are addressed in MSB-first order: bit 0 is the high bit of the first
//! byte. Multi-byte words are big-endian.

use crate::errors::{Error, Result};

/// Location of a sub-byte field inside an 8- or 16-bit word.
///
/// A field of `width` bits starting at `bit_offset` that fits inside one byte
/// is read through the 8-bit word at `bit_offset >> 3`; a field straddling a
/// byte boundary goes through the big-endian 16-bit word at the same byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSlot {
    pub byte_offset: usize,
    pub word_bytes: usize,
    pub right_bits: u32,
    pub mask: u16,
    pub width: u32,
}

impl BitSlot {
    /// Computes the slot for a field of `width` (0..=7) bits at `bit_offset`.
    pub fn new(bit_offset: usize, width: u32) -> Self {
        let n0 = (bit_offset % 8) as u32;
        let n1 = n0 + width;
        let word_bits = if n1 <= 8 { 8 } else { 16 };
        let right_bits = word_bits - n1;

        BitSlot {
            byte_offset: bit_offset >> 3,
            word_bytes: (word_bits / 8) as usize,
            right_bits,
            mask: (((1u32 << width) - 1) << right_bits) as u16,
            width,
        }
    }

    /// Largest value the slot can hold.
    pub fn max(&self) -> u64 {
        max_for_bits(self.width)
    }

    pub fn read(&self, data: &[u8]) -> Result<u64> {
        if self.width == 0 {
            return Ok(0);
        }
        let word = read_uint_be(data, self.byte_offset, self.word_bytes)? as u16;
        Ok(((word & self.mask) >> self.right_bits) as u64)
    }

    /// Writes `value` into the slot, preserving every bit outside the mask.
    pub fn write(&self, data: &mut [u8], value: u64) -> Result<()> {
        if self.width == 0 {
            return Ok(());
        }
        let word = read_uint_be(data, self.byte_offset, self.word_bytes)? as u16;
        let shifted = ((value as u32) << self.right_bits) as u16;
        let word = (shifted & self.mask) | (word & !self.mask);
        write_uint_be(data, self.byte_offset, self.word_bytes, word as u64)
    }
}

/// Largest unsigned value representable in `bits` bits (max 64).
pub fn max_for_bits(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Inclusive value range of an integer of `bits` width.
pub fn int_range(bits: u32, signed: bool) -> (i64, i64) {
    if signed {
        let half = 1i64 << (bits - 1);
        (-half, half - 1)
    } else {
        (0, max_for_bits(bits) as i64)
    }
}

/// Reads a big-endian unsigned word of `n` bytes (max 8) at `byte_offset`.
pub fn read_uint_be(data: &[u8], byte_offset: usize, n: usize) -> Result<u64> {
    let bytes = slice(data, byte_offset, n)?;
    Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64))
}

/// Writes the low `n` bytes of `value` big-endian at `byte_offset`.
pub fn write_uint_be(data: &mut [u8], byte_offset: usize, n: usize, value: u64) -> Result<()> {
    let available = data.len();
    let bytes = data
        .get_mut(byte_offset..byte_offset + n)
        .ok_or(Error::Bounds {
            byte_offset,
            byte_length: n,
            available,
        })?;

    for (i, b) in bytes.iter_mut().enumerate() {
        *b = (value >> (8 * (n - 1 - i))) as u8;
    }

    Ok(())
}

/// Sign-extends the low `bits` of `value` to a full `i64`.
pub fn sign_extend(value: u64, bits: usize) -> i64 {
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

fn slice(data: &[u8], byte_offset: usize, n: usize) -> Result<&[u8]> {
    data.get(byte_offset..byte_offset + n).ok_or(Error::Bounds {
        byte_offset,
        byte_length: n,
        available: data.len(),
    })
}
