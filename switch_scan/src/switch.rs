//! Per switch state and the debounce logic that runs on it.
//!
//! Switches have pull-ups, so a `0` bit is a closed contact and a `1` bit an
//! open one.

use crate::published::SwitchId;
use crate::signal::Notify;

/// The state of one contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
#[repr(u8)]
pub enum Contact {
    /// Contact made, the input is pulled to ground
    Closed = 0,
    /// Contact open, the input reads high through its pull-up
    Open = 1,
}

impl Contact {
    /// Reads a contact from a masked sample or a published value
    #[inline]
    pub const fn from_bit(bit: u8) -> Self {
        if bit == 0 {
            Contact::Closed
        } else {
            Contact::Open
        }
    }

    #[inline]
    fn sampled(sample: u32, mask: u32) -> Self {
        if sample & mask == 0 {
            Contact::Closed
        } else {
            Contact::Open
        }
    }
}

/// When a pushbutton's debounced value follows a contact change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub enum Mode {
    /// Publish the new contact as soon as it changes, and publish a
    /// correction if it bounced back by the end of the debounce time
    Immediate,
    /// Publish only once the contact held for the whole debounce time
    Settled,
}

/// Debounce state of a pushbutton
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub enum PushState {
    /// Settled open
    Open,
    /// Settled closed
    Closed,
    /// Was closed, debouncing an opening contact
    Opening,
    /// Was open, debouncing a closing contact
    Closing,
}

/// The two definite positions of a switch pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
#[repr(u8)]
pub enum PairPosition {
    /// Primary contact open, secondary closed (code `01`)
    SecondaryClosed = 1,
    /// Primary contact closed, secondary open (code `10`)
    PrimaryClosed = 2,
}

impl PairPosition {
    /// Converts a published pair code, `None` if it is not a definite position
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(PairPosition::SecondaryClosed),
            2 => Some(PairPosition::PrimaryClosed),
            _ => None,
        }
    }
}

/// What the scanner has to do after a pushbutton reacted to a change
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Step {
    /// The debounced value was committed: publish and notify
    pub commit: bool,
    /// A debounce countdown started: link into the active set
    pub arm: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Pushbutton {
    pub mask: u32,
    pub raw: Contact,
    pub debounced: Contact,
    pub state: PushState,
    pub mode: Mode,
    pub closing: u8,
    pub opening: u8,
    pub countdown: u8,
}

impl Pushbutton {
    pub fn new(mask: u32, mode: Mode, closing: u8, opening: u8) -> Self {
        Self {
            mask,
            raw: Contact::Open,
            debounced: Contact::Open,
            state: PushState::Open,
            mode,
            closing,
            opening,
            countdown: 0,
        }
    }

    /// Takes the settled state straight from a sample, without debouncing
    pub fn seed(&mut self, sample: u32) {
        let contact = Contact::sampled(sample, self.mask);
        self.raw = contact;
        self.debounced = contact;
        self.state = match contact {
            Contact::Open => PushState::Open,
            Contact::Closed => PushState::Closed,
        };
    }

    /// Handles a sample in which this button's bit changed
    pub fn on_change(&mut self, sample: u32) -> Step {
        self.raw = Contact::sampled(sample, self.mask);

        match (self.state, self.raw) {
            (PushState::Open, Contact::Closed) => self.begin(Contact::Closed),
            (PushState::Closed, Contact::Open) => self.begin(Contact::Open),
            // still bouncing, start the time over
            (PushState::Opening, _) => {
                self.countdown = self.opening;
                Step::default()
            }
            (PushState::Closing, _) => {
                self.countdown = self.closing;
                Step::default()
            }
            // the contact is back where it settled
            (PushState::Open, Contact::Open) | (PushState::Closed, Contact::Closed) => {
                Step::default()
            }
        }
    }

    fn begin(&mut self, target: Contact) -> Step {
        let (duration, settled, moving) = match target {
            Contact::Closed => (self.closing, PushState::Closed, PushState::Closing),
            Contact::Open => (self.opening, PushState::Open, PushState::Opening),
        };

        if duration == 0 {
            self.debounced = target;
            self.state = settled;
            return Step {
                commit: true,
                arm: false,
            };
        }

        let commit = self.mode == Mode::Immediate;
        if commit {
            self.debounced = target;
        }
        self.state = moving;
        self.countdown = duration;

        Step { commit, arm: true }
    }

    /// Counts one debounce tick, true once the countdown ran out
    pub fn count_down(&mut self) -> bool {
        self.countdown = self.countdown.saturating_sub(1);
        self.countdown == 0
    }

    /// Decides the settled state at the end of a debounce countdown.
    /// Returns true if the debounced value was committed.
    pub fn settle(&mut self) -> bool {
        let target = match self.state {
            PushState::Opening => Contact::Open,
            PushState::Closing => Contact::Closed,
            PushState::Open | PushState::Closed => return false,
        };

        self.state = match self.raw {
            Contact::Open => PushState::Open,
            Contact::Closed => PushState::Closed,
        };

        let commit = if self.raw == target {
            // held for the whole time: only Settled mode still has to publish
            self.mode == Mode::Settled
        } else {
            // bounced back: only Immediate mode published the wrong value
            self.mode == Mode::Immediate
        };

        if commit {
            self.debounced = self.raw;
        }

        commit
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Pair {
    pub primary: u32,
    pub secondary: u32,
    pub raw: u8,
    pub debounced: u8,
}

impl Pair {
    pub fn new(primary: u32, secondary: u32) -> Self {
        Self {
            primary,
            secondary,
            raw: 0,
            debounced: 0,
        }
    }

    /// Handles a sample in which either contact changed. Returns true if a
    /// new position was committed.
    pub fn on_change(&mut self, sample: u32) -> bool {
        let mut code = 0;
        if sample & self.primary != 0 {
            code |= 0b01;
        }
        if sample & self.secondary != 0 {
            code |= 0b10;
        }
        self.raw = code;

        // 00 and 11 are between positions or a wiring fault
        match PairPosition::from_code(code) {
            Some(_) if code != self.debounced => {
                self.debounced = code;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Kind {
    Pushbutton(Pushbutton),
    Pair(Pair),
}

/// A registered switch as the scanner keeps it
pub(crate) struct Switch<'a> {
    pub kind: Kind,
    pub notify: Option<Notify<'a>>,
    /// Next switch in the active debounce list
    pub next_active: Option<SwitchId>,
}

impl<'a> Switch<'a> {
    /// All the bits this switch occupies
    pub fn mask(&self) -> u32 {
        match &self.kind {
            Kind::Pushbutton(button) => button.mask,
            Kind::Pair(pair) => pair.primary | pair.secondary,
        }
    }

    /// The value to publish
    pub fn debounced(&self) -> u8 {
        match &self.kind {
            Kind::Pushbutton(button) => button.debounced as u8,
            Kind::Pair(pair) => pair.debounced,
        }
    }
}
