//! Hardware Abstraction Layer (HAL) traits for the decoder core.
//!
//! These traits keep the core state machines platform-agnostic (`no_std`):
//! DCC bit decoding, RS-bus link handling, EEPROM access and GPIO all live
//! behind them, so the core can be driven by fake implementations in tests.

/// Abstraction over the persistent byte store holding the CV table.
///
/// The backing store is byte-addressable; address 0 holds the initialisation
/// marker and addresses 1..=64 hold CV1..CV64. Both operations are
/// infallible: EEPROM access on the target hardware cannot report errors,
/// and the CV protocol has no error channel to surface them on anyway.
pub trait CvStorage {
    /// Reads one byte from persistent storage.
    fn read(&self, address: u16) -> u8;

    /// Writes one byte, but only if it differs from the stored value.
    ///
    /// Implementations must perform the read-compare themselves; skipping
    /// identical writes limits EEPROM wear.
    fn update(&mut self, address: u16, value: u8);
}

/// A single digital output pin.
pub trait DigitalOutput {
    /// Drives the pin high (`true`) or low (`false`).
    fn write(&mut self, level: bool);

    /// Returns the currently commanded level.
    fn read(&self) -> bool;
}

/// A single digital input pin.
pub trait DigitalInput {
    /// Samples the pin. Takes `&self`; implementations needing mutation
    /// (simulated pins) can use interior mutability.
    fn read(&self) -> bool;
}

/// The decoded-DCC side of the (external) DCC interface.
///
/// Command events themselves are pushed into the core as
/// [`DccCommand`](crate::types::DccCommand) values by the driver loop; this
/// trait carries the outbound and configuration surface.
pub trait DccPort {
    /// Emits the Service-Mode acknowledgement pulse on the ACK pin.
    fn send_ack(&mut self);

    /// Number of DCC packets with checksum errors since the last restart.
    /// Exposed as the live value behind the CV26 diagnostic.
    fn checksum_errors(&self) -> u8;

    /// Configures the accessory address this decoder listens on.
    fn set_accessory_address(&mut self, address: u16);

    /// Configures the loco address used to receive PoM commands.
    fn set_pom_address(&mut self, address: u16);

    /// Configures the command-station dialect (CV19).
    fn set_command_station(&mut self, kind: u8);
}

/// The RS-bus feedback link.
///
/// `check_polling` maintains the polling cycle and is latency-sensitive: the
/// scheduler invokes it on every loop iteration, ungated. Everything else
/// runs on the 20 ms slow path.
pub trait RsBusPort {
    /// Maintains the RS-bus polling cycle. Must be called every iteration.
    fn check_polling(&mut self);

    /// Checks the transmit buffer of the PoM feedback connection
    /// (RS-bus address 128). Called every 20 ms.
    fn check_pom_buffer(&mut self);

    /// Queues one byte on the PoM feedback connection.
    fn send_pom_byte(&mut self, value: u8);

    /// Number of RS-bus parity errors since the last restart (CV31).
    fn parity_errors(&self) -> u8;

    /// Number of RS-bus pulse-count errors since the last restart (CV32).
    fn pulse_count_errors(&self) -> u8;
}

/// The restart capability.
///
/// A production implementation disables the DCC and RS-bus interrupt sources
/// and restarts program execution from its entry point; it does not return.
/// Test implementations record the invocation and return, so assertions can
/// run afterwards.
pub trait Restart {
    fn restart(&mut self);
}

/// A monotonic millisecond clock.
///
/// `now_ms` wraps around; all consumers compare timestamps with
/// `wrapping_sub`. `delay_ms` backs the two documented synchronous settle
/// delays (button attach, pre-restart settling) and is never called from
/// steady-state paths.
pub trait Clock {
    fn now_ms(&self) -> u32;

    fn delay_ms(&self, ms: u32);
}
