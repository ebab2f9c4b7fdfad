//! Constant time bit position lookup using the count-leading-zeros
//! instruction, so a word of changed bits can be drained without testing
//! every position.

use crate::fault::Fault;

/// Returns the position of the most significant set bit of `word`.
///
/// Zero has no set bit and is rejected with [Fault::ZeroMask].
#[inline]
pub fn highest_bit(word: u32) -> Result<u8, Fault> {
    if word == 0 {
        return Err(Fault::ZeroMask);
    }

    Ok((31 - word.leading_zeros()) as u8)
}

/// Returns the position of the least significant set bit of `word`.
///
/// Zero has no set bit and is rejected with [Fault::ZeroMask].
#[inline]
pub fn lowest_bit(word: u32) -> Result<u8, Fault> {
    // isolate the lowest set bit, then it is also the highest
    highest_bit(word & word.wrapping_neg())
}

/// Converts a single bit mask into its bit position
pub fn mask_position(mask: u32) -> Result<u8, Fault> {
    let position = highest_bit(mask)?;
    if mask != 1 << position {
        return Err(Fault::MultipleBits);
    }

    Ok(position)
}

/// Iterates over the set bits of a word from the most significant down
pub struct SetBits(u32);

impl SetBits {
    /// Creates an iterator over the set bits of `word`
    pub const fn new(word: u32) -> Self {
        Self(word)
    }

    /// The bits not yet visited
    pub const fn remaining(&self) -> u32 {
        self.0
    }

    /// Drops the bits of `mask` from the ones still to visit
    pub fn clear(&mut self, mask: u32) {
        self.0 &= !mask;
    }
}

impl Iterator for SetBits {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        let position = highest_bit(self.0).ok()?;
        self.0 &= !(1 << position);
        Some(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert_eq!(highest_bit(0), Err(Fault::ZeroMask));
        assert_eq!(lowest_bit(0), Err(Fault::ZeroMask));
        assert_eq!(mask_position(0), Err(Fault::ZeroMask));
    }

    #[test]
    fn finds_highest_and_lowest() {
        assert_eq!(highest_bit(0x0001), Ok(0));
        assert_eq!(highest_bit(0x8000), Ok(15));
        assert_eq!(highest_bit(0x8000_0001), Ok(31));
        assert_eq!(lowest_bit(0x8000_0001), Ok(0));
        assert_eq!(lowest_bit(0x0050), Ok(4));
        assert_eq!(highest_bit(0x0050), Ok(6));
    }

    #[test]
    fn mask_must_be_single_bit() {
        assert_eq!(mask_position(1 << 3), Ok(3));
        assert_eq!(mask_position(1 << 31), Ok(31));
        assert_eq!(mask_position(0x0018), Err(Fault::MultipleBits));
    }

    #[test]
    fn visits_every_bit_once() {
        let mut bits = SetBits::new(0b1000_0100_0010_0001);
        assert_eq!(bits.next(), Some(15));
        assert_eq!(bits.next(), Some(10));
        assert_eq!(bits.next(), Some(5));
        assert_eq!(bits.next(), Some(0));
        assert_eq!(bits.next(), None);
        assert_eq!(bits.remaining(), 0);
    }

    #[test]
    fn cleared_bits_are_skipped() {
        let mut bits = SetBits::new(0b1011_0000);
        assert_eq!(bits.next(), Some(7));
        bits.clear(0b0011_0000);
        assert_eq!(bits.next(), None);
        assert_eq!(bits.remaining(), 0);
    }

    #[test]
    fn every_bit_of_a_full_word() {
        let mut seen = 0u32;
        for position in SetBits::new(u32::MAX) {
            assert_eq!(seen & (1 << position), 0);
            seen |= 1 << position;
        }
        assert_eq!(seen, u32::MAX);
    }
}
