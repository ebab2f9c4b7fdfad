//! Faults raised by the switch scanner.
//!
//! None of these are recoverable. The scanner hands them back to the caller,
//! which is expected to stop the system and show [Fault::code] somewhere a
//! human can read it without a debugger.

/// A configuration or wiring error detected by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub enum Fault {
    /// A bit mask of zero was given where a switch bit was expected
    ZeroMask,

    /// A bit mask with more than one bit set was given for a single contact
    MultipleBits,

    /// A bit position beyond the configured scan width
    BitOutOfRange,

    /// Two contacts registered on the same bit position
    DuplicateBit,

    /// No room left in the switch table
    RegistryFull,

    /// A changed bit was read that the registry cannot address. The link is
    /// wider than the registry.
    UnknownBit,

    /// The serial link reported an error during a transfer
    Link,
}

impl Fault {
    /// The halt code shown for this fault
    pub const fn code(self) -> u16 {
        match self {
            Fault::ZeroMask => 526,
            Fault::BitOutOfRange => 527,
            Fault::MultipleBits => 530,
            Fault::DuplicateBit => 531,
            Fault::RegistryFull => 532,
            Fault::UnknownBit => 529,
            Fault::Link => 540,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Fault;

    #[test]
    fn codes_are_distinct() {
        let all = [
            Fault::ZeroMask,
            Fault::MultipleBits,
            Fault::BitOutOfRange,
            Fault::DuplicateBit,
            Fault::RegistryFull,
            Fault::UnknownBit,
            Fault::Link,
        ];

        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.code(), b.code(), "{:?} and {:?} share a code", a, b);
            }
        }
    }
}
