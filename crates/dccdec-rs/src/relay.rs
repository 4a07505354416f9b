//! Bi-stable relay driver.
//!
//! A bi-stable relay has two coils; a pulse on one of them latches the relay
//! in the matching position. The driver energises a coil on demand and
//! de-energises it again after the configured hold time, with the position
//! retained mechanically. At startup the position is unknown.

use crate::hal::DigitalOutput;
use log::debug;

/// Hold times are configured in CV-style 20 ms steps.
pub const HOLD_STEP_MS: u32 = 20;

/// The latched position of the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPosition {
    Pos1,
    Pos2,
    /// No pulse sent since startup; the mechanical position is not known.
    Unknown,
}

pub struct BistableRelay<'a> {
    coil_pos1: &'a mut dyn DigitalOutput,
    coil_pos2: &'a mut dyn DigitalOutput,
    hold_ms: u32,
    state: RelayPosition,
    pulse_started: Option<u32>,
}

impl<'a> BistableRelay<'a> {
    /// Creates the driver. `hold_time` is in 20 ms steps, matching the CV3..CV6
    /// activation-time convention.
    pub fn new(
        coil_pos1: &'a mut dyn DigitalOutput,
        coil_pos2: &'a mut dyn DigitalOutput,
        hold_time: u8,
    ) -> Self {
        Self {
            coil_pos1,
            coil_pos2,
            hold_ms: u32::from(hold_time) * HOLD_STEP_MS,
            state: RelayPosition::Unknown,
            pulse_started: None,
        }
    }

    pub fn position(&self) -> RelayPosition {
        self.state
    }

    /// Pulses the relay towards `position`.
    ///
    /// A no-op if the relay is already in that position, or while a previous
    /// pulse is still being held.
    pub fn activate(&mut self, position: RelayPosition, now: u32) {
        if position == RelayPosition::Unknown || position == self.state {
            return;
        }
        if self.pulse_started.is_some() {
            return;
        }
        debug!("Relay pulse towards {position:?}");
        self.pulse_started = Some(now);
        match position {
            RelayPosition::Pos1 => self.coil_pos1.write(true),
            RelayPosition::Pos2 => self.coil_pos2.write(true),
            RelayPosition::Unknown => {}
        }
        self.state = position;
    }

    /// Ends an expired pulse. Runs on the 20 ms slow path.
    pub fn update(&mut self, now: u32) {
        let Some(started) = self.pulse_started else {
            return;
        };
        if now.wrapping_sub(started) < self.hold_ms {
            return;
        }
        match self.state {
            RelayPosition::Pos1 => self.coil_pos1.write(false),
            RelayPosition::Pos2 => self.coil_pos2.write(false),
            RelayPosition::Unknown => {}
        }
        self.pulse_started = None;
    }
}
