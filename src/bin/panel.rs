//! The control panel firmware, based on cortex_m_rtic
//!
//! The SPI2 interrupt shifts the panel's registers and debounces the switches,
//! the vehicle task reacts to debounced changes and drives the panel LEDs.

#![deny(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]
#![no_main]
#![no_std]

use panel_rtic as _; // global logger + panicking-behavior + memory layout
use stm32f4xx_hal as hal;

use hal::{
    gpio::{ErasedPin, Output},
    timer::MonoTimerUs,
};
use switch_hal::{ActiveHigh, Switch};
use switch_scan::{Published, ScanConfig, ScanDriver, Signal, SpiLink, Switches};

use panel_rtic::{
    configure::{self, PanelSpi},
    panel::{PanelSwitches, PANEL_BITS, PANEL_BYTES, SWITCH_NOTIFY},
    trap,
};

#[cfg(feature = "blink")]
use {hal::timer::fugit, switch_hal::OutputSwitch};

/// Blink period of the heartbeat LED
#[cfg(feature = "blink")]
pub const BLINK_PERIOD_MS: u32 = 300;

/// The scanner driving the panel chain
pub type PanelScanner =
    ScanDriver<'static, SpiLink<PanelSpi, ErasedPin<Output>, PANEL_BYTES>, PANEL_BITS>;

/// Raised by the scanner when a panel switch changed
static VEHICLE_SIGNAL: Signal = Signal::with_waker(wake_vehicle);

fn wake_vehicle() {
    // already pending, the bits merge into one run
    app::vehicle::spawn().ok();
}

#[rtic::app(
    device = stm32f4xx_hal::pac,
    peripherals = true,
    dispatchers = [EXTI1]
)]
mod app {
    use super::*;

    #[monotonic(binds = TIM2, default = true)]
    type SysMono = MonoTimerUs<hal::pac::TIM2>;

    // Shared resources go here
    #[shared]
    struct Shared {
        /// Shifts the panel chain from the SPI interrupt
        scanner: PanelScanner,

        /// The status LED, blinks the heartbeat and fault codes
        led: Switch<ErasedPin<Output>, ActiveHigh>,
    }

    // Local resources go here
    #[local]
    struct Local {
        /// Handles to the panel switches
        panel: PanelSwitches<'static>,

        /// The current state of the blinky light
        #[cfg(feature = "blink")]
        led_state: bool,
    }

    #[init(local = [
        published: Published<PANEL_BITS> = Published::new(),
    ])]
    fn init(cx: init::Context) -> (Shared, Local, init::Monotonics) {
        defmt::println!("init");

        // configure all the clocks and peripherals
        let config = configure::configure(cx.core, cx.device);
        let mut led = config.led_pin;

        let published: &'static Published<PANEL_BITS> = cx.local.published;
        let timing = ScanConfig::new();
        let mut switches = Switches::new(published);

        let panel = match PanelSwitches::register(&mut switches, &VEHICLE_SIGNAL, &timing) {
            Ok(panel) => panel,
            Err(fault) => trap::halt(&mut led, fault),
        };

        // starts the first transfer, the rest follow from the interrupt
        let link = SpiLink::new(config.spi, config.latch);
        let scanner = match ScanDriver::new(link, switches, timing) {
            Ok(scanner) => scanner,
            Err(fault) => trap::halt(&mut led, fault),
        };

        let mut output_enable = config.output_enable;
        output_enable.set_low();

        // show a blinky light
        #[cfg(feature = "blink")]
        blink::spawn_after(fugit::ExtU32::secs(1u32)).unwrap();

        (
            Shared { scanner, led },
            Local {
                panel,
                #[cfg(feature = "blink")]
                led_state: false,
            },
            init::Monotonics(config.timer),
        )
    }

    /// One byte of the panel chain shifted
    #[task(binds = SPI2, shared = [scanner, led], priority = 2)]
    fn shift(mut cx: shift::Context) {
        if let Err(fault) = cx.shared.scanner.lock(|scanner| scanner.service()) {
            cx.shared.led.lock(|led| trap::halt(led, fault));
        }
    }

    /// Reacts to debounced panel changes
    #[task(local = [panel], shared = [scanner, led])]
    fn vehicle(mut cx: vehicle::Context) {
        let pending = VEHICLE_SIGNAL.take();
        if pending & SWITCH_NOTIFY == 0 {
            return;
        }

        let panel = cx.local.panel;

        defmt::info!(
            "Panel safe/active {}, arm {}, prep {}, zero odometer {}, brake {}",
            panel.safe_active.debounced(),
            panel.arm.debounced(),
            panel.prep.debounced(),
            panel.zero_odometer.debounced(),
            panel.brake.debounced(),
        );

        if panel.reverse_torque.debounced() == 0 {
            defmt::warn!("Torque reversal requested");
        }

        let indicators = panel.indicators();
        let lit = cx.shared.scanner.lock(|scanner| {
            indicators
                .iter()
                .try_for_each(|&(bit, on)| scanner.set_output(bit, on))
        });

        if let Err(fault) = lit {
            cx.shared.led.lock(|led| trap::halt(led, fault));
        }
    }

    #[cfg(feature = "blink")]
    #[task(local = [led_state], shared = [led])]
    fn blink(mut cx: blink::Context) {
        let on = !*cx.local.led_state;

        cx.shared.led.lock(|led| {
            if on {
                led.on().ok();
            } else {
                led.off().ok();
            }
        });

        *cx.local.led_state = on;
        blink::spawn_after(fugit::ExtU32::millis(BLINK_PERIOD_MS)).unwrap();
    }
}
