//! Scan timing.
//!
//! The scanner has no clock of its own. Time is counted in completed
//! transfers, and a debounce tick is a fixed number of them.

/// Completed transfers per debounce tick
pub const SCAN_CYCLES_PER_TICK: u16 = 100;

/// Approximate completed transfers per millisecond
pub const SCAN_CYCLES_PER_MS: u16 = 10;

/// Transfers thrown away after power up while the shift registers settle
pub const STARTUP_DISCARD_CYCLES: u16 = 3000;

/// Timing of a scan driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub struct ScanConfig {
    /// Completed transfers per debounce tick
    pub cycles_per_tick: u16,

    /// Approximate completed transfers per millisecond, only used to convert
    /// debounce times
    pub cycles_per_ms: u16,

    /// Transfers ignored after start up
    pub startup_discard: u16,
}

impl ScanConfig {
    /// The timing measured on the control panel hardware
    pub const fn new() -> Self {
        Self {
            cycles_per_tick: SCAN_CYCLES_PER_TICK,
            cycles_per_ms: SCAN_CYCLES_PER_MS,
            startup_discard: STARTUP_DISCARD_CYCLES,
        }
    }

    /// Converts a debounce time in milliseconds to ticks, rounding down and
    /// adding one so it never comes out zero
    pub const fn ms_to_ticks(&self, ms: u32) -> u8 {
        let per_tick = if self.cycles_per_tick == 0 {
            1
        } else {
            self.cycles_per_tick as u32
        };
        let ticks = ms.saturating_mul(self.cycles_per_ms as u32) / per_tick + 1;

        if ticks > u8::MAX as u32 {
            u8::MAX
        } else {
            ticks as u8
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts milliseconds to debounce ticks with the default timing
pub const fn ms_to_ticks(ms: u32) -> u8 {
    ScanConfig::new().ms_to_ticks(ms)
}
