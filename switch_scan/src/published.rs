//! Debounced values as seen by the consuming tasks.
//!
//! The scanner writes each switch's committed value here from the interrupt,
//! and tasks read it through a [SwitchHandle]. Each value is a single byte so
//! a read is always a consistent snapshot.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::switch::{Contact, PairPosition};

/// Index of a switch in the scanner's switch table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub struct SwitchId(pub(crate) u8);

impl SwitchId {
    /// The table index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Storage for the published value of up to `BITS` switches
pub struct Published<const BITS: usize> {
    values: [AtomicU8; BITS],
}

impl<const BITS: usize> Published<BITS> {
    /// Creates the table with every value zeroed
    #[allow(clippy::declare_interior_mutable_const)]
    pub const fn new() -> Self {
        const ZERO: AtomicU8 = AtomicU8::new(0);
        Self {
            values: [ZERO; BITS],
        }
    }

    pub(crate) fn store(&self, id: SwitchId, value: u8) {
        self.values[id.index()].store(value, Ordering::Release);
    }

    pub(crate) fn handle(&self, id: SwitchId) -> SwitchHandle<'_> {
        SwitchHandle {
            id,
            values: &self.values,
        }
    }
}

impl<const BITS: usize> Default for Published<BITS> {
    fn default() -> Self {
        Self::new()
    }
}

/// A consumer's reference to one registered switch
#[derive(Clone, Copy)]
pub struct SwitchHandle<'a> {
    id: SwitchId,
    values: &'a [AtomicU8],
}

impl<'a> SwitchHandle<'a> {
    /// The switch this handle refers to
    pub fn id(&self) -> SwitchId {
        self.id
    }

    /// The committed value. For a pushbutton this is 0 (closed) or
    /// 1 (open), for a pair the two bit code 1 or 2, or 0 until the pair
    /// first showed a definite position.
    pub fn debounced(&self) -> u8 {
        self.values[self.id.index()].load(Ordering::Acquire)
    }

    /// The committed contact. Only meaningful for a pushbutton, a pair
    /// reports through [SwitchHandle::position].
    pub fn contact(&self) -> Contact {
        Contact::from_bit(self.debounced())
    }

    /// The committed position of a switch pair, `None` until known. Only
    /// meaningful for a pair.
    pub fn position(&self) -> Option<PairPosition> {
        PairPosition::from_code(self.debounced())
    }
}
