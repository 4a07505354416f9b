//! Debounced push-button input.
//!
//! [`PushButton::read`] samples the pin and debounces it against a fixed
//! window; the query methods then report edges and press duration relative
//! to the last accepted change. The caller decides the sampling rate (the
//! decoder samples on the 20 ms slow path, wide enough to straddle contact
//! bounce on its own, but the debounce window also protects faster callers).

use crate::hal::DigitalInput;

/// Debounce window in milliseconds.
pub const DEBOUNCE_MS: u32 = 25;

/// A single debounced button. The input pin reports `true` while pressed;
/// electrical polarity is the pin implementation's concern.
pub struct PushButton<'a> {
    pin: &'a dyn DigitalInput,
    state: bool,
    last_state: bool,
    changed: bool,
    /// Timestamp of the most recent `read`.
    time: u32,
    /// Timestamp of the last accepted state change.
    last_change: u32,
}

impl<'a> PushButton<'a> {
    pub fn new(pin: &'a dyn DigitalInput, now: u32) -> Self {
        let state = pin.read();
        Self {
            pin,
            state,
            last_state: state,
            changed: false,
            time: now,
            last_change: now,
        }
    }

    /// Samples and debounces the pin. Returns the debounced state.
    pub fn read(&mut self, now: u32) -> bool {
        self.time = now;
        if now.wrapping_sub(self.last_change) < DEBOUNCE_MS {
            self.changed = false;
        } else {
            self.last_state = self.state;
            self.state = self.pin.read();
            self.changed = self.state != self.last_state;
            if self.changed {
                self.last_change = now;
            }
        }
        self.state
    }

    /// Debounced state at the last `read`.
    pub fn is_pressed(&self) -> bool {
        self.state
    }

    /// True if the last `read` saw a release-to-press edge.
    pub fn was_pressed(&self) -> bool {
        self.state && self.changed
    }

    /// True if the last `read` saw a press-to-release edge.
    pub fn was_released(&self) -> bool {
        !self.state && self.changed
    }

    /// True once the button has been held for at least `ms` milliseconds.
    pub fn pressed_for(&self, ms: u32) -> bool {
        self.state && self.time.wrapping_sub(self.last_change) >= ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct MockPin {
        level: Cell<bool>,
    }

    impl MockPin {
        fn new() -> Self {
            Self { level: Cell::new(false) }
        }

        fn set(&self, level: bool) {
            self.level.set(level);
        }
    }

    impl DigitalInput for MockPin {
        fn read(&self) -> bool {
            self.level.get()
        }
    }

    #[test]
    fn press_and_release_edges_are_reported_once() {
        let pin = MockPin::new();
        let mut button = PushButton::new(&pin, 0);

        pin.set(true);
        button.read(40);
        assert!(button.is_pressed());
        assert!(button.was_pressed());

        button.read(80);
        assert!(button.is_pressed());
        assert!(!button.was_pressed());

        pin.set(false);
        button.read(120);
        assert!(button.was_released());
        button.read(160);
        assert!(!button.was_released());
    }

    #[test]
    fn bounce_inside_the_window_is_ignored() {
        let pin = MockPin::new();
        let mut button = PushButton::new(&pin, 0);

        pin.set(true);
        button.read(40);
        assert!(button.was_pressed());

        // Contact bounce right after the edge.
        pin.set(false);
        button.read(50);
        assert!(button.is_pressed());
        assert!(!button.was_released());

        pin.set(true);
        button.read(80);
        assert!(button.is_pressed());
        assert!(!button.was_pressed());
    }

    #[test]
    fn pressed_for_measures_hold_time() {
        let pin = MockPin::new();
        let mut button = PushButton::new(&pin, 0);

        pin.set(true);
        button.read(40);
        assert!(!button.pressed_for(5000));

        button.read(5039);
        assert!(!button.pressed_for(5000));
        button.read(5040);
        assert!(button.pressed_for(5000));

        pin.set(false);
        button.read(5080);
        assert!(!button.pressed_for(5000));
    }
}
