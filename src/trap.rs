//! Stops the firmware on a scan fault and blinks the fault code out on the
//! status LED, one decimal digit at a time, forever.

use switch_hal::OutputSwitch;
use switch_scan::Fault;

/// Core clock, used to time the blinks without a timer
const SYSCLK_HZ: u32 = 84_000_000;

const BLINK_ON_MS: u32 = 200;
const BLINK_OFF_MS: u32 = 300;
const DIGIT_GAP_MS: u32 = 1000;
const CODE_GAP_MS: u32 = 3000;

fn delay_ms(ms: u32) {
    cortex_m::asm::delay(SYSCLK_HZ / 1000 * ms);
}

/// The decimal digits of `code`, most significant first. A zero digit is
/// blinked as ten.
fn digits(code: u16) -> heapless::Vec<u8, 5> {
    let mut digits = heapless::Vec::new();
    let mut rest = code;

    loop {
        // at most five digits in a u16
        digits.push((rest % 10) as u8).ok();
        rest /= 10;
        if rest == 0 {
            break;
        }
    }

    digits.reverse();
    digits
}

/// Never returns
pub fn halt<LED: OutputSwitch>(led: &mut LED, fault: Fault) -> ! {
    defmt::error!("Halted with fault code {}", fault.code());

    let digits = digits(fault.code());

    loop {
        for digit in digits.iter() {
            let blinks = if *digit == 0 { 10 } else { *digit };

            for _ in 0..blinks {
                led.on().ok();
                delay_ms(BLINK_ON_MS);
                led.off().ok();
                delay_ms(BLINK_OFF_MS);
            }

            delay_ms(DIGIT_GAP_MS);
        }

        delay_ms(CODE_GAP_MS);
    }
}
