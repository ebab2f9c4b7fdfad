//! Control panel firmware for the winch controller: the panel's switches and
//! LEDs sit on a chain of shift registers read and written over SPI2.

#![no_main]
#![no_std]

use defmt_rtt as _; // global logger
use panic_probe as _;
use stm32f4xx_hal as _; // memory layout

pub mod configure;
pub mod panel;
pub mod trap;

// same panicking *behavior* as `panic-probe` but doesn't print a panic message
// this prevents the panic message being printed *twice* when `defmt::panic` is invoked
#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}
