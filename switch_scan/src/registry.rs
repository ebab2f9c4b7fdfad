//! The switch table: registration, bit position lookup, change dispatch and
//! the list of switches that are currently debouncing.
//!
//! Switches are registered once during start up. After that the table is only
//! touched by the scan interrupt. Each bit position maps to at most one
//! switch, a switch pair takes two positions.

use heapless::Vec;

use crate::bitscan::{mask_position, SetBits};
use crate::fault::Fault;
use crate::published::{Published, SwitchHandle, SwitchId};
use crate::signal::{Notify, Signal};
use crate::switch::{Kind, Mode, Pair, PushState, Pushbutton, Switch};

/// The largest scan word the table can address
pub const MAX_BITS: usize = 32;

/// The two kinds of switch the scanner debounces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub enum SwitchKind {
    /// A single on/off contact, e.g. SPST-NO
    Pushbutton,
    /// Two mutually exclusive contacts, e.g. SPDT
    Pair,
}

/// Everything needed to register one switch
#[derive(Clone, Copy)]
pub struct SwitchConfig<'a> {
    primary: u32,
    secondary: u32,
    kind: SwitchKind,
    mode: Mode,
    closing: u8,
    opening: u8,
    notify: Option<Notify<'a>>,
}

impl<'a> SwitchConfig<'a> {
    /// A switch on `primary`, paired with `secondary` unless that is zero.
    /// Defaults to [Mode::Immediate] without debounce time or notification.
    pub const fn new(primary: u32, secondary: u32) -> Self {
        Self {
            primary,
            secondary,
            kind: if secondary == 0 {
                SwitchKind::Pushbutton
            } else {
                SwitchKind::Pair
            },
            mode: Mode::Immediate,
            closing: 0,
            opening: 0,
            notify: None,
        }
    }

    /// A pushbutton on the single bit `mask`
    pub const fn pushbutton(mask: u32) -> Self {
        Self::new(mask, 0)
    }

    /// A switch pair on the single bits `primary` and `secondary`
    pub const fn pair(primary: u32, secondary: u32) -> Self {
        let mut config = Self::new(primary, secondary);
        config.kind = SwitchKind::Pair;
        config
    }

    /// Sets the debounce mode
    pub const fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the debounce ticks for a closing and an opening contact
    pub const fn debounce(mut self, closing: u8, opening: u8) -> Self {
        self.closing = closing;
        self.opening = opening;
        self
    }

    /// Raise `bits` on `signal` whenever the debounced value is committed.
    /// Zero bits means no notification.
    pub fn notify(mut self, signal: &'a Signal, bits: u32) -> Self {
        self.notify = if bits == 0 {
            None
        } else {
            Some(Notify { signal, bits })
        };
        self
    }

    /// The kind of switch this registers
    pub const fn kind(&self) -> SwitchKind {
        self.kind
    }
}

/// The switch table for a scan word of `BITS` bits
pub struct Switches<'a, const BITS: usize> {
    switches: Vec<Switch<'a>, BITS>,

    /// Bit position to switch lookup
    slots: [Option<SwitchId>; BITS],

    /// Head of the list of switches counting down a debounce
    active: Option<SwitchId>,

    published: &'a Published<BITS>,
}

impl<'a, const BITS: usize> Switches<'a, BITS> {
    /// Creates an empty table that publishes into `published`, panicing if
    /// BITS is zero or above [MAX_BITS]
    pub const fn new(published: &'a Published<BITS>) -> Self {
        if BITS == 0 || BITS > MAX_BITS {
            panic!("Attempted to scan a word of zero or more than 32 bits");
        }

        Self {
            switches: Vec::new(),
            slots: [None; BITS],
            active: None,
            published,
        }
    }

    /// Adds a switch to the table and returns the handle its owner reads the
    /// debounced value through
    pub fn register(&mut self, config: SwitchConfig<'a>) -> Result<SwitchHandle<'a>, Fault> {
        let primary = self.free_slot(config.primary)?;

        let (kind, secondary) = match config.kind {
            SwitchKind::Pushbutton => {
                let button =
                    Pushbutton::new(config.primary, config.mode, config.closing, config.opening);
                (Kind::Pushbutton(button), None)
            }
            SwitchKind::Pair => {
                let secondary = self.free_slot(config.secondary)?;
                if secondary == primary {
                    return Err(Fault::DuplicateBit);
                }
                let pair = Pair::new(config.primary, config.secondary);
                (Kind::Pair(pair), Some(secondary))
            }
        };

        let id = SwitchId(self.switches.len() as u8);
        let switch = Switch {
            kind,
            notify: config.notify,
            next_active: None,
        };
        let value = switch.debounced();
        self.switches
            .push(switch)
            .map_err(|_| Fault::RegistryFull)?;

        self.slots[primary] = Some(id);
        if let Some(secondary) = secondary {
            self.slots[secondary] = Some(id);
        }
        self.published.store(id, value);

        #[cfg(feature = "logging")]
        defmt::debug!(
            "Registered {} {} on bits {:#x}",
            config.kind,
            id,
            config.primary | config.secondary
        );

        Ok(self.published.handle(id))
    }

    /// Adds a switch while scanning is running. Its contacts are taken from
    /// `sample`, the last word read, so a switch already held closed is not
    /// reported open until it next changes. Nothing is notified.
    pub fn register_sampled(
        &mut self,
        config: SwitchConfig<'a>,
        sample: u32,
    ) -> Result<SwitchHandle<'a>, Fault> {
        let handle = self.register(config)?;
        let id = handle.id();

        let switch = &mut self.switches[id.index()];
        match &mut switch.kind {
            Kind::Pushbutton(button) => button.seed(sample),
            Kind::Pair(pair) => {
                pair.on_change(sample);
            }
        }
        self.published.store(id, switch.debounced());

        Ok(handle)
    }

    fn free_slot(&self, mask: u32) -> Result<usize, Fault> {
        let position = mask_position(mask)? as usize;
        match self.slots.get(position) {
            None => Err(Fault::BitOutOfRange),
            Some(Some(_)) => Err(Fault::DuplicateBit),
            Some(None) => Ok(position),
        }
    }

    /// Runs every switch whose bits are set in `changed` against `sample`
    /// and returns how many switches ran.
    ///
    /// A pair is handled once even when both of its bits changed. Changed bits
    /// without a switch are skipped; unused inputs float open and show up as
    /// changes at power up.
    pub fn dispatch(&mut self, changed: u32, sample: u32) -> Result<usize, Fault> {
        let mut bits = SetBits::new(changed);
        let mut visited = 0;

        while let Some(position) = bits.next() {
            let slot = *self
                .slots
                .get(position as usize)
                .ok_or(Fault::UnknownBit)?;

            if let Some(id) = slot {
                bits.clear(self.on_change(id, sample));
                visited += 1;
            }
        }

        Ok(visited)
    }

    /// Applies a change to one switch, returning the bits it occupies
    fn on_change(&mut self, id: SwitchId, sample: u32) -> u32 {
        let switch = &mut self.switches[id.index()];
        let mask = switch.mask();

        let (commit, arm) = match &mut switch.kind {
            Kind::Pushbutton(button) => {
                let step = button.on_change(sample);
                (step.commit, step.arm)
            }
            Kind::Pair(pair) => (pair.on_change(sample), false),
        };

        if commit {
            self.publish(id);
        }
        if arm {
            self.activate(id);
        }

        mask
    }

    /// Links a switch at the head of the debouncing list. It must not be on
    /// the list already.
    fn activate(&mut self, id: SwitchId) {
        self.switches[id.index()].next_active = self.active;
        self.active = Some(id);
    }

    /// Advances every debounce countdown by one tick, settling and unlinking
    /// the switches that reach zero
    pub fn tick(&mut self) {
        let mut previous: Option<SwitchId> = None;
        let mut cursor = self.active;

        while let Some(id) = cursor {
            let switch = &mut self.switches[id.index()];
            let next = switch.next_active;

            let settled = match &mut switch.kind {
                Kind::Pushbutton(button) => {
                    if button.count_down() {
                        Some(button.settle())
                    } else {
                        None
                    }
                }
                // pairs are never armed
                Kind::Pair(_) => Some(false),
            };

            match settled {
                Some(commit) => {
                    switch.next_active = None;
                    match previous {
                        None => self.active = next,
                        Some(previous) => self.switches[previous.index()].next_active = next,
                    }

                    if commit {
                        self.publish(id);
                    }
                }
                None => previous = Some(id),
            }

            cursor = next;
        }
    }

    fn publish(&self, id: SwitchId) {
        let switch = &self.switches[id.index()];
        let value = switch.debounced();
        self.published.store(id, value);

        #[cfg(feature = "logging")]
        defmt::trace!("Switch {} debounced to {}", id, value);

        if let Some(notify) = &switch.notify {
            notify.send();
        }
    }

    /// The handle for a registered switch
    pub fn handle(&self, id: SwitchId) -> Option<SwitchHandle<'a>> {
        self.switches.get(id.index()).map(|_| self.published.handle(id))
    }

    /// The switch registered on a bit position
    pub fn lookup(&self, position: u8) -> Option<SwitchId> {
        self.slots.get(position as usize).copied().flatten()
    }

    /// Number of registered switches
    pub fn len(&self) -> usize {
        self.switches.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }

    /// The debounce state of a pushbutton
    pub fn state(&self, id: SwitchId) -> Option<PushState> {
        match &self.switches.get(id.index())?.kind {
            Kind::Pushbutton(button) => Some(button.state),
            Kind::Pair(_) => None,
        }
    }

    /// The remaining debounce ticks of a pushbutton that is debouncing
    pub fn countdown(&self, id: SwitchId) -> Option<u8> {
        match &self.switches.get(id.index())?.kind {
            Kind::Pushbutton(button) if self.is_debouncing(id) => Some(button.countdown),
            _ => None,
        }
    }

    /// The last sampled contacts of a switch, before debouncing
    pub fn raw(&self, id: SwitchId) -> Option<u8> {
        match &self.switches.get(id.index())?.kind {
            Kind::Pushbutton(button) => Some(button.raw as u8),
            Kind::Pair(pair) => Some(pair.raw),
        }
    }

    /// True if the switch is on the debouncing list
    pub fn is_debouncing(&self, id: SwitchId) -> bool {
        self.debouncing().any(|member| member == id)
    }

    /// Walks the debouncing list from its head
    pub fn debouncing(&self) -> impl Iterator<Item = SwitchId> + '_ {
        let mut cursor = self.active;
        core::iter::from_fn(move || {
            let id = cursor?;
            cursor = self.switches[id.index()].next_active;
            Some(id)
        })
    }
}
