//! The on-board status LED.
//!
//! The LED signals decoder state through flash patterns: series of flashes
//! separated by a longer pause. Patterns advance on a 100 ms grid inside
//! [`DecoderLed::update`]; between grid points the LED simply holds its
//! level, so the caller may invoke `update` as often (or as rarely, down to
//! the 20 ms scheduler slot) as it likes.

use crate::hal::DigitalOutput;

/// Pattern time base in milliseconds.
pub const TICK_MS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    AlwaysOn,
    AlwaysOff,
    /// Run the flash series once, then stay off.
    SingleSeries,
    /// Repeat the flash series, separated by the pause, until told otherwise.
    NeverStopFlashing,
}

/// The status LED and its flash pattern engine.
pub struct DecoderLed<'a> {
    pin: &'a mut dyn DigitalOutput,
    mode: Mode,
    /// Ticks the LED keeps its current level.
    ticks_remaining: u8,
    /// Which flash of the series is in progress.
    flash_number: u8,
    on_ticks: u8,
    off_ticks: u8,
    count: u8,
    pause_ticks: u8,
    last_tick: u32,
}

impl<'a> DecoderLed<'a> {
    pub fn new(pin: &'a mut dyn DigitalOutput) -> Self {
        Self {
            pin,
            mode: Mode::AlwaysOff,
            ticks_remaining: 0,
            flash_number: 0,
            on_ticks: 1,
            off_ticks: 1,
            count: 1,
            pause_ticks: 1,
            last_tick: 0,
        }
    }

    pub fn is_on(&self) -> bool {
        self.pin.read()
    }

    pub fn turn_on(&mut self) {
        self.mode = Mode::AlwaysOn;
        self.pin.write(true);
    }

    pub fn turn_off(&mut self) {
        self.mode = Mode::AlwaysOff;
        self.pin.write(false);
    }

    /// Two short flashes, to indicate decoder start.
    pub fn start_up(&mut self, now: u32) {
        self.on_ticks = 2;
        self.off_ticks = 2;
        self.count = 2;
        self.mode = Mode::SingleSeries;
        self.flash(now);
    }

    /// Single very short flash, to indicate an accessory command.
    pub fn activity(&mut self, now: u32) {
        self.on_ticks = 2;
        self.count = 1;
        self.mode = Mode::SingleSeries;
        self.flash(now);
    }

    /// Single longer flash, to indicate an RS-bus feedback transmission.
    pub fn feedback(&mut self, now: u32) {
        self.on_ticks = 5;
        self.count = 1;
        self.mode = Mode::SingleSeries;
        self.flash(now);
    }

    /// Slow continuous blinking: 0.5 s on, 0.5 s off. Signals that the
    /// decoder address has not been programmed yet.
    pub fn flash_slow(&mut self, now: u32) {
        self.on_ticks = 5;
        self.off_ticks = 5;
        self.count = 1;
        self.pause_ticks = 5;
        self.mode = Mode::NeverStopFlashing;
        self.flash(now);
    }

    /// Fast continuous blinking: 0.1 s on, 0.2 s off. Signals programming
    /// mode and the CV23 search function.
    pub fn flash_fast(&mut self, now: u32) {
        self.on_ticks = 1;
        self.off_ticks = 2;
        self.count = 1;
        self.pause_ticks = 2;
        self.mode = Mode::NeverStopFlashing;
        self.flash(now);
    }

    fn flash(&mut self, now: u32) {
        self.last_tick = now;
        self.ticks_remaining = self.on_ticks;
        self.flash_number = 1;
        self.pin.write(true);
    }

    /// Advances the pattern. Level changes happen on the 100 ms grid only.
    pub fn update(&mut self, now: u32) {
        if matches!(self.mode, Mode::AlwaysOn | Mode::AlwaysOff) {
            return;
        }
        if now.wrapping_sub(self.last_tick) < TICK_MS {
            return;
        }
        self.last_tick = now;
        self.ticks_remaining -= 1;
        if self.ticks_remaining > 0 {
            return;
        }
        if self.is_on() {
            if self.flash_number != self.count {
                self.ticks_remaining = self.off_ticks;
            } else if self.mode == Mode::NeverStopFlashing {
                self.ticks_remaining = self.pause_ticks;
                self.flash_number = 0;
            } else {
                self.mode = Mode::AlwaysOff;
            }
        } else {
            self.ticks_remaining = self.on_ticks;
            self.flash_number += 1;
        }
        let level = !self.is_on();
        self.pin.write(level);
    }
}
