//! The programming-button workflow.
//!
//! A short press arms address programming: the LED blinks fast and the next
//! accessory command received (addressed to anyone) determines the new
//! decoder address, after which the decoder restarts. A second press leaves
//! programming mode without changes. Holding the button for five seconds
//! restores the factory defaults and restarts.
//!
//! The workflow runs as a state machine on the 20 ms slow path; it never
//! blocks the main loop while waiting for the programming command.

use crate::address;
use crate::button::PushButton;
use crate::cv::names::{CONFIG_ACCESSORY, CV_CONFIG};
use crate::cv::CvStore;
use crate::hal::{Clock, Restart};
use crate::led::DecoderLed;
use crate::types::AccessoryCommand;
use log::info;

/// Hold time that triggers a factory reset.
pub const LONG_PRESS_MS: u32 = 5000;

/// Settle time before the restart that follows a factory reset or an
/// abandoned programming session, so the operator sees the LED go dark.
pub const RESET_SETTLE_MS: u32 = 500;

/// Settle time between storing a new address and restarting, so the EEPROM
/// write completes under a stable supply.
pub const PROGRAM_SETTLE_MS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// Armed: the next accessory command programs the address.
    Programming,
}

pub struct ProgButtonWorkflow {
    state: State,
}

impl ProgButtonWorkflow {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    /// True while the decoder waits for the address-programming command.
    pub fn is_programming(&self) -> bool {
        self.state == State::Programming
    }

    /// Samples the button and advances the workflow. Runs every 20 ms.
    pub fn tick(
        &mut self,
        button: &mut PushButton,
        led: &mut DecoderLed,
        cv: &mut CvStore,
        clock: &dyn Clock,
        restart: &mut dyn Restart,
        now: u32,
    ) {
        button.read(now);
        match self.state {
            State::Idle => {
                if button.is_pressed() {
                    led.turn_on();
                }
                if button.pressed_for(LONG_PRESS_MS) {
                    info!("Button held, restoring factory defaults");
                    led.turn_off();
                    cv.restore_defaults();
                    clock.delay_ms(RESET_SETTLE_MS);
                    restart.restart();
                    return;
                }
                if button.was_released() {
                    info!("Entering address programming mode");
                    self.state = State::Programming;
                    led.flash_fast(now);
                }
            }
            State::Programming => {
                // A second press abandons the session. A continued hold
                // then runs into the long-press path above.
                if button.was_pressed() {
                    info!("Leaving address programming mode");
                    self.state = State::Idle;
                    led.turn_off();
                    clock.delay_ms(RESET_SETTLE_MS);
                }
            }
        }
    }

    /// Offers a received accessory command to the workflow.
    ///
    /// Consumed only while programming is armed and the decoder runs in
    /// accessory mode (CV29 bit 7); the addresses are then stored and the
    /// decoder restarts so they take effect. Returns `true` if consumed.
    pub fn handle_accessory_command(
        &mut self,
        command: &AccessoryCommand,
        cv: &mut CvStore,
        clock: &dyn Clock,
        restart: &mut dyn Restart,
    ) -> bool {
        if self.state != State::Programming {
            return false;
        }
        if cv.read(CV_CONFIG).unwrap_or(0) & CONFIG_ACCESSORY == 0 {
            return false;
        }
        address::program_address(cv, command);
        self.state = State::Idle;
        clock.delay_ms(PROGRAM_SETTLE_MS);
        restart.restart();
        true
    }
}

impl Default for ProgButtonWorkflow {
    fn default() -> Self {
        Self::new()
    }
}
