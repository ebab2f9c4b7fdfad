//! The scan cycle: one full duplex transfer after another, each completed
//! sample compared with the one before it.
//!
//! [ScanDriver::service] runs from the transfer complete interrupt. It never
//! blocks; its work grows with the number of changed bits and the number of
//! switches debouncing. The next transfer is always started before it returns
//! so the sampling rate is whatever the link can sustain.

use crate::config::ScanConfig;
use crate::fault::Fault;
use crate::link::ShiftLink;
use crate::published::SwitchHandle;
use crate::registry::{SwitchConfig, Switches};

/// The bits that differ between two samples
#[inline]
pub const fn changed(previous: u32, current: u32) -> u32 {
    previous ^ current
}

/// A word with all `bits` low bits set, i.e. every input open
const fn idle_word(bits: usize) -> u32 {
    u32::MAX >> (32 - bits)
}

/// Runs the switch table off a shift register link
pub struct ScanDriver<'a, L, const BITS: usize> {
    link: L,
    switches: Switches<'a, BITS>,
    config: ScanConfig,

    /// The last sample compared against
    previous: u32,

    /// The word shifted out on every transfer
    output: u32,

    /// Transfers still to be thrown away after start up
    discard: u16,

    /// Transfers since the last debounce tick
    divider: u16,

    cycles: u32,
    ticks: u32,
}

impl<'a, L, const BITS: usize> ScanDriver<'a, L, BITS>
where
    L: ShiftLink,
{
    /// Takes over the link and starts the first transfer
    pub fn new(mut link: L, switches: Switches<'a, BITS>, config: ScanConfig) -> Result<Self, Fault> {
        link.start(0).map_err(|_| Fault::Link)?;

        #[cfg(feature = "logging")]
        defmt::info!(
            "Scanning {} switches, {} cycles per tick",
            switches.len(),
            config.cycles_per_tick
        );

        Ok(Self {
            link,
            switches,
            config,
            previous: idle_word(BITS),
            output: 0,
            discard: config.startup_discard,
            divider: 0,
            cycles: 0,
            ticks: 0,
        })
    }

    /// Handles a transfer interrupt. Returns a fault the system has to stop
    /// on; the next transfer has been started regardless.
    pub fn service(&mut self) -> Result<(), Fault> {
        match self.link.complete() {
            Ok(sample) => self.cycle(sample),
            // more of the transfer to come
            Err(nb::Error::WouldBlock) => Ok(()),
            Err(nb::Error::Other(_)) => {
                // start over from the first byte
                self.link.start(self.output).ok();
                Err(Fault::Link)
            }
        }
    }

    fn cycle(&mut self, sample: u32) -> Result<(), Fault> {
        let scanned = if self.discard > 0 {
            self.discard -= 1;

            #[cfg(feature = "logging")]
            {
                if self.discard == 0 {
                    defmt::info!("Shift registers settled");
                }
            }

            Ok(())
        } else {
            self.scan(sample)
        };

        self.link.start(self.output).map_err(|_| Fault::Link)?;
        scanned
    }

    fn scan(&mut self, sample: u32) -> Result<(), Fault> {
        let changed = changed(self.previous, sample);
        self.previous = sample;

        let dispatched = if changed != 0 {
            #[cfg(feature = "logging")]
            defmt::trace!("Scan {:#x} changed {:#x}", sample, changed);

            self.switches.dispatch(changed, sample).map(|_| ())
        } else {
            Ok(())
        };

        self.cycles = self.cycles.wrapping_add(1);
        self.divider += 1;
        if self.divider >= self.config.cycles_per_tick {
            self.divider = 0;
            self.ticks = self.ticks.wrapping_add(1);
            self.switches.tick();
        }

        dispatched
    }

    /// Sets or clears one bit of the output word, from the next transfer on
    pub fn set_output(&mut self, bit: u8, on: bool) -> Result<(), Fault> {
        if bit as usize >= BITS {
            return Err(Fault::BitOutOfRange);
        }

        if on {
            self.output |= 1 << bit;
        } else {
            self.output &= !(1 << bit);
        }

        Ok(())
    }

    /// The word shifted out on every transfer
    pub fn output(&self) -> u32 {
        self.output
    }

    /// The most recent sample compared against
    pub fn sample(&self) -> u32 {
        self.previous
    }

    /// Scanned transfers, not counting the ones thrown away at start up
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Debounce ticks so far
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// True while start up transfers are still being thrown away
    pub fn is_settling(&self) -> bool {
        self.discard > 0
    }

    /// The timing in use
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// The switch table
    pub fn switches(&self) -> &Switches<'a, BITS> {
        &self.switches
    }

    /// Adds a switch after scanning started, taking its contacts from the
    /// last sample. The caller must hold off the transfer interrupt meanwhile.
    pub fn register(&mut self, config: SwitchConfig<'a>) -> Result<SwitchHandle<'a>, Fault> {
        self.switches.register_sampled(config, self.previous)
    }

    /// Stops using the link and hands it back with the switch table
    pub fn free(self) -> (L, Switches<'a, BITS>) {
        (self.link, self.switches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLink;
    use crate::published::Published;
    use crate::signal::Signal;
    use crate::switch::PairPosition;
    use crate::switch::{Contact, PushState};

    const IDLE: u32 = 0xffff;

    fn config(cycles_per_tick: u16, startup_discard: u16) -> ScanConfig {
        ScanConfig {
            cycles_per_tick,
            cycles_per_ms: 10,
            startup_discard,
        }
    }

    fn run<L: ShiftLink, const BITS: usize>(driver: &mut ScanDriver<'_, L, BITS>, cycles: usize) {
        for _ in 0..cycles {
            driver.service().unwrap();
        }
    }

    #[test]
    fn changed_is_xor() {
        assert_eq!(changed(0xffff, 0xffff), 0);
        assert_eq!(changed(0xffff, 0xfff7), 0x0008);
        assert_eq!(changed(0x00ff, 0xff00), 0xffff);
    }

    #[test]
    fn starts_the_first_transfer() {
        let published = Published::<16>::new();
        let driver = ScanDriver::new(MockLink::new(), Switches::new(&published), config(1, 0))
            .unwrap();

        let (link, _) = driver.free();
        assert_eq!(link.starts, 1);
        assert_eq!(link.last_write, Some(0));
    }

    #[test]
    fn failing_link_at_start_is_a_fault() {
        let published = Published::<16>::new();
        let mut link = MockLink::new();
        link.broken = true;

        let driver = ScanDriver::new(link, Switches::new(&published), config(1, 0));
        assert!(matches!(driver, Err(Fault::Link)));
    }

    #[test]
    fn waits_for_the_transfer() {
        let published = Published::<16>::new();
        let mut driver =
            ScanDriver::new(MockLink::new(), Switches::new(&published), config(1, 0)).unwrap();

        assert_eq!(driver.service(), Ok(()));
        assert_eq!(driver.cycles(), 0);

        let (link, _) = driver.free();
        assert_eq!(link.starts, 1);
    }

    #[test]
    fn discards_start_up_transfers() {
        let signal = Signal::new();
        let published = Published::<16>::new();
        let mut switches = Switches::new(&published);
        let button = switches
            .register(SwitchConfig::pushbutton(1 << 3).notify(&signal, 1))
            .unwrap();

        let mut link = MockLink::new();
        for _ in 0..3 {
            link.queue(IDLE & !(1 << 3));
        }
        let mut driver = ScanDriver::new(link, switches, config(100, 2)).unwrap();
        assert!(driver.is_settling());

        run(&mut driver, 2);
        assert!(!driver.is_settling());
        assert_eq!(driver.cycles(), 0);
        assert_eq!(signal.take(), 0);
        assert_eq!(button.contact(), Contact::Open);

        run(&mut driver, 1);
        assert_eq!(driver.cycles(), 1);
        assert_eq!(signal.take(), 1);
        assert_eq!(button.contact(), Contact::Closed);

        let (link, _) = driver.free();
        assert_eq!(link.starts, 4);
    }

    #[test]
    fn ticks_every_configured_cycles() {
        let published = Published::<16>::new();
        let mut switches = Switches::new(&published);
        let button = switches
            .register(SwitchConfig::pushbutton(1 << 0).debounce(2, 2))
            .unwrap();

        let mut link = MockLink::new();
        link.queue(IDLE & !1);
        for _ in 0..11 {
            link.queue(IDLE & !1);
        }
        let mut driver = ScanDriver::new(link, switches, config(3, 0)).unwrap();

        run(&mut driver, 1);
        assert_eq!(driver.switches().state(button.id()), Some(PushState::Closing));

        // the change cycle counts toward the first tick
        run(&mut driver, 2);
        assert_eq!(driver.ticks(), 1);
        assert_eq!(driver.switches().countdown(button.id()), Some(1));

        run(&mut driver, 3);
        assert_eq!(driver.ticks(), 2);
        assert_eq!(driver.switches().state(button.id()), Some(PushState::Closed));
        assert!(!driver.switches().is_debouncing(button.id()));

        run(&mut driver, 6);
        assert_eq!(driver.ticks(), 4);
        assert_eq!(driver.cycles(), 12);
    }

    #[test]
    fn same_sample_twice_changes_nothing() {
        let signal = Signal::new();
        let published = Published::<16>::new();
        let mut switches = Switches::new(&published);
        let button = switches
            .register(SwitchConfig::pushbutton(1 << 5).debounce(4, 4).notify(&signal, 1))
            .unwrap();

        let mut link = MockLink::new();
        link.queue(IDLE & !(1 << 5));
        link.queue(IDLE & !(1 << 5));
        let mut driver = ScanDriver::new(link, switches, config(100, 0)).unwrap();

        run(&mut driver, 1);
        assert_eq!(signal.take(), 1);
        let countdown = driver.switches().countdown(button.id());

        run(&mut driver, 1);
        assert_eq!(signal.take(), 0);
        assert_eq!(driver.switches().countdown(button.id()), countdown);
        assert_eq!(driver.sample(), IDLE & !(1 << 5));
    }

    #[test]
    fn rearms_after_a_fault() {
        let published = Published::<8>::new();
        let mut link = MockLink::new();
        // wider than the registry
        link.queue(0x1ff);
        let mut driver = ScanDriver::new(link, Switches::new(&published), config(1, 0)).unwrap();

        assert_eq!(driver.service(), Err(Fault::UnknownBit));

        let (link, _) = driver.free();
        assert_eq!(link.starts, 2);
    }

    #[test]
    fn link_error_is_a_fault() {
        let published = Published::<16>::new();
        let mut driver =
            ScanDriver::new(MockLink::new(), Switches::new(&published), config(1, 0)).unwrap();

        driver.link.broken = true;

        assert_eq!(driver.service(), Err(Fault::Link));
    }

    #[test]
    fn output_word_goes_out_on_every_transfer() {
        let published = Published::<16>::new();
        let mut link = MockLink::new();
        link.queue(IDLE);
        link.queue(IDLE);
        let mut driver = ScanDriver::new(link, Switches::new(&published), config(1, 0)).unwrap();

        driver.set_output(3, true).unwrap();
        driver.set_output(15, true).unwrap();
        run(&mut driver, 1);
        driver.set_output(3, false).unwrap();
        assert_eq!(driver.set_output(16, true), Err(Fault::BitOutOfRange));
        run(&mut driver, 1);

        assert_eq!(driver.output(), 0x8000);
        let (link, _) = driver.free();
        assert_eq!(link.last_write, Some(0x8000));
        assert_eq!(link.starts, 3);
    }

    #[test]
    fn registers_after_scanning_started() {
        let signal = Signal::new();
        let published = Published::<16>::new();
        let mut link = MockLink::new();
        link.queue(IDLE & !(1 << 9));
        let mut driver = ScanDriver::new(link, Switches::new(&published), config(100, 0)).unwrap();

        let button = driver
            .register(SwitchConfig::pushbutton(1 << 9).notify(&signal, 2))
            .unwrap();
        run(&mut driver, 1);

        assert_eq!(signal.take(), 2);
        assert_eq!(button.contact(), Contact::Closed);
    }

    #[test]
    fn registers_a_switch_already_held_closed() {
        let signal = Signal::new();
        let published = Published::<16>::new();
        let mut link = MockLink::new();
        for _ in 0..4 {
            link.queue(IDLE & !(1 << 9) & !(1 << 6));
        }
        link.queue(IDLE & !(1 << 6));
        let mut driver = ScanDriver::new(link, Switches::new(&published), config(100, 0)).unwrap();

        run(&mut driver, 1);
        let button = driver
            .register(SwitchConfig::pushbutton(1 << 9).notify(&signal, 2))
            .unwrap();
        let pair = driver
            .register(SwitchConfig::pair(1 << 7, 1 << 6).notify(&signal, 4))
            .unwrap();
        assert_eq!(button.contact(), Contact::Closed);
        assert_eq!(pair.position(), Some(PairPosition::SecondaryClosed));

        // still held, nothing changes
        run(&mut driver, 3);
        assert_eq!(signal.take(), 0);
        assert_eq!(button.contact(), Contact::Closed);

        // released
        run(&mut driver, 1);
        assert_eq!(signal.take(), 2);
        assert_eq!(button.contact(), Contact::Open);
    }

    #[test]
    fn rearms_after_a_link_error() {
        let published = Published::<16>::new();
        let mut link = MockLink::new();
        link.queue(IDLE);
        let mut driver = ScanDriver::new(link, Switches::new(&published), config(1, 0)).unwrap();

        driver.link.glitch = true;
        assert_eq!(driver.service(), Err(Fault::Link));
        assert_eq!(driver.link.starts, 2);

        // the restarted transfer completes as usual
        assert_eq!(driver.service(), Ok(()));
        assert_eq!(driver.cycles(), 1);
        assert_eq!(driver.link.starts, 3);
    }
}
