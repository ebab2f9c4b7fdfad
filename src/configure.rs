//! Configures the microcontroller for use and returns the required pins

use hal::{
    gpio::{Alternate, ErasedPin, Output, PinState, PB13, PB14, PB15},
    pac::{self, SPI2, TIM2},
    prelude::*,
    spi::{self, Spi},
    timer::MonoTimerUs,
};
use stm32f4xx_hal as hal;
use switch_hal::{ActiveHigh, IntoSwitch, Switch};

/// The SPI peripheral wired to the panel's shift register chain
pub type PanelSpi = Spi<SPI2, (PB13<Alternate<5>>, PB14<Alternate<5>>, PB15<Alternate<5>>)>;

/// Shift clock rate of the panel chain
pub const PANEL_SPI_KHZ: u32 = 1000;

/// Configures the micro for operation
pub fn configure(
    _core_peripherals: cortex_m::Peripherals,
    device_peripherals: pac::Peripherals,
) -> Configuration {
    // Take ownership over raw device and convert it into the corresponding HAL struct
    let rcc = device_peripherals.RCC.constrain();

    #[cfg(feature = "dev_board")]
    let hse_freq = 25.MHz();
    #[cfg(not(feature = "dev_board"))]
    let hse_freq = 16.MHz();

    // Freeze the configuration of all the clocks in the system and store the
    // frozen frequencies in `clocks`
    let clocks = rcc.cfgr.use_hse(hse_freq).sysclk(84.MHz()).freeze();

    let timer: MonoTimerUs<TIM2> = device_peripherals.TIM2.monotonic_us(&clocks);

    // Acquire GPIO
    let gpioa = device_peripherals.GPIOA.split();
    let gpiob = device_peripherals.GPIOB.split();
    let gpioc = device_peripherals.GPIOC.split();

    // set up the flashy LED
    #[cfg(feature = "board_rev_3")]
    let pin = gpioc.pc3;
    // NOTE: rev 1/2 has no LED, PC13 is the black pill dev board's
    #[cfg(not(feature = "board_rev_3"))]
    let pin = gpioc.pc13;

    let led_pin = pin
        .into_push_pull_output()
        .erase()
        .into_active_high_switch();

    // the output registers stay disabled until the first word is latched
    let output_enable = gpioa
        .pa8
        .into_push_pull_output_in_state(PinState::High)
        .erase();

    // the chain latches on the rising edge
    let latch = gpiob
        .pb12
        .into_push_pull_output_in_state(PinState::High)
        .erase();

    let mut spi = device_peripherals.SPI2.spi(
        (
            gpiob.pb13.into_alternate(),
            gpiob.pb14.into_alternate(),
            gpiob.pb15.into_alternate(),
        ),
        hal::hal::spi::MODE_0,
        PANEL_SPI_KHZ.kHz(),
        &clocks,
    );
    spi.listen(spi::Event::Rxne);

    Configuration {
        led_pin,
        timer,
        spi,
        latch,
        output_enable,
    }
}

/// Peripherals handed to the application
pub struct Configuration {
    /// Status LED, also used to blink out fault codes
    pub led_pin: Switch<ErasedPin<Output>, ActiveHigh>,
    /// Monotonic for the software tasks
    pub timer: MonoTimerUs<TIM2>,

    /// Panel shift register chain
    pub spi: PanelSpi,
    /// Panel chain latch
    pub latch: ErasedPin<Output>,
    /// Active low output enable of the LED registers
    pub output_enable: ErasedPin<Output>,
}
