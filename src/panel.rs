//! Bit assignments of the control panel and the switches the vehicle task
//! owns.
//!
//! NOTE: the shift register 'H' input is shifted out first. Inputs are
//! active low (pull-ups), so a closed switch reads `0`.

use switch_scan::{
    Contact, Fault, Mode, PairPosition, ScanConfig, Signal, SwitchConfig, SwitchHandle, Switches,
};

/// Width of the panel's shift register chain in bits
pub const PANEL_BITS: usize = 16;

/// Width of the panel's shift register chain in bytes
pub const PANEL_BYTES: usize = PANEL_BITS / 8;

/// Notification bit the vehicle task is woken with
pub const SWITCH_NOTIFY: u32 = 1 << 3;

/// Switch inputs
pub mod inputs {
    /// Safe / active selector, safe contact
    pub const SW_SAFE: u32 = 1 << 7;
    /// Safe / active selector, active contact
    pub const SW_ACTIVE: u32 = 1 << 6;
    /// Arm pushbutton
    pub const PB_ARM: u32 = 1 << 5;
    /// Prep pushbutton
    pub const PB_PREP: u32 = 1 << 4;
    /// Control lever rest position, normally open
    pub const CL_RST_N0: u32 = 1 << 3;
    /// Zero tension pushbutton, used to reverse torque
    pub const CP_REVERSETORQ: u32 = 1 << 2;
    /// Zero odometer pushbutton
    pub const CP_ZODOMTR: u32 = 1 << 1;
    /// Control lever full scale, normally open
    pub const CL_FS_NO: u32 = 1 << 0;

    /// Brake
    pub const CP_BRAKE: u32 = 1 << 8;
    /// Guillotine
    pub const CP_GUILLO: u32 = 1 << 9;
}

/// Output bits of the LED registers
pub mod leds {
    /// Retrieve state
    pub const LED_RETRIEVE: u8 = 0;
    /// Recovery state
    pub const LED_RECOVERY: u8 = 1;
    /// Climb state
    pub const LED_CLIMB: u8 = 2;
    /// Ramp state
    pub const LED_RAMP: u8 = 3;
    /// Ground roller return state
    pub const LED_GNDRLRTN: u8 = 4;
    /// Armed
    pub const LED_ARM: u8 = 5;
    /// Prepped
    pub const LED_PREP: u8 = 6;
    /// Safe
    pub const LED_SAFE: u8 = 7;
    /// Arm pushbutton lamp
    pub const LED_ARM_PB: u8 = 8;
    /// Prep pushbutton lamp
    pub const LED_PREP_PB: u8 = 9;
    /// Stop
    pub const LED_STOP: u8 = 14;
    /// Abort
    pub const LED_ABORT: u8 = 15;
}

/// Handles to every panel switch
pub struct PanelSwitches<'a> {
    /// Safe / active selector
    pub safe_active: SwitchHandle<'a>,
    /// Arm pushbutton
    pub arm: SwitchHandle<'a>,
    /// Prep pushbutton
    pub prep: SwitchHandle<'a>,
    /// Torque reversal pushbutton
    pub reverse_torque: SwitchHandle<'a>,
    /// Zero odometer pushbutton
    pub zero_odometer: SwitchHandle<'a>,
    /// Control lever full scale contact
    pub lever_full_scale: SwitchHandle<'a>,
    /// Control lever rest contact
    pub lever_rest: SwitchHandle<'a>,
    /// Brake
    pub brake: SwitchHandle<'a>,
}

impl<'a> PanelSwitches<'a> {
    /// Registers the panel switches. Changes of all but the control lever
    /// contacts wake whoever waits on `signal`; the lever contacts are only
    /// polled during calibration.
    pub fn register<const BITS: usize>(
        switches: &mut Switches<'a, BITS>,
        signal: &'a Signal,
        timing: &ScanConfig,
    ) -> Result<Self, Fault> {
        let ms = |time| timing.ms_to_ticks(time);

        let safe_active = switches.register(
            SwitchConfig::pair(inputs::SW_SAFE, inputs::SW_ACTIVE).notify(signal, SWITCH_NOTIFY),
        )?;

        let arm = switches.register(
            SwitchConfig::pushbutton(inputs::PB_ARM)
                .mode(Mode::Settled)
                .debounce(ms(20), ms(20))
                .notify(signal, SWITCH_NOTIFY),
        )?;

        let prep = switches.register(
            SwitchConfig::pushbutton(inputs::PB_PREP)
                .mode(Mode::Settled)
                .debounce(ms(20), ms(20))
                .notify(signal, SWITCH_NOTIFY),
        )?;

        let reverse_torque = switches.register(
            SwitchConfig::pushbutton(inputs::CP_REVERSETORQ)
                .mode(Mode::Immediate)
                .debounce(ms(20), ms(20))
                .notify(signal, SWITCH_NOTIFY),
        )?;

        let zero_odometer = switches.register(
            SwitchConfig::pushbutton(inputs::CP_ZODOMTR)
                .mode(Mode::Settled)
                .debounce(ms(20), ms(20))
                .notify(signal, SWITCH_NOTIFY),
        )?;

        let lever_full_scale = switches.register(
            SwitchConfig::pushbutton(inputs::CL_FS_NO)
                .mode(Mode::Immediate)
                .debounce(ms(250), ms(20)),
        )?;

        let lever_rest = switches.register(
            SwitchConfig::pushbutton(inputs::CL_RST_N0)
                .mode(Mode::Immediate)
                .debounce(ms(250), ms(20)),
        )?;

        // the brake must never report a bounce
        let brake = switches.register(
            SwitchConfig::pushbutton(inputs::CP_BRAKE)
                .mode(Mode::Settled)
                .debounce(0, ms(50))
                .notify(signal, SWITCH_NOTIFY),
        )?;

        Ok(Self {
            safe_active,
            arm,
            prep,
            reverse_torque,
            zero_odometer,
            lever_full_scale,
            lever_rest,
            brake,
        })
    }

    /// LED outputs that mirror the panel switches
    pub fn indicators(&self) -> [(u8, bool); 4] {
        let safe = self.safe_active.position() == Some(PairPosition::PrimaryClosed);

        [
            (leds::LED_ARM_PB, self.arm.contact() == Contact::Closed),
            (leds::LED_PREP_PB, self.prep.contact() == Contact::Closed),
            (leds::LED_SAFE, safe),
            (leds::LED_STOP, self.brake.contact() == Contact::Closed),
        ]
    }
}
