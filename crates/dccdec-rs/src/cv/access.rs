//! Handling of CV-access commands (Service Mode and PoM).
//!
//! Service Mode answers with the DCC acknowledgement pulse; PoM answers
//! verify-byte commands with an RS-bus reply instead, since RailCom is not
//! supported. A handful of CV numbers trigger actions rather than plain
//! storage; everything else passes straight through to the CV table.

use super::names::*;
use super::{CvStore, MAX_CV};
use crate::hal::{DccPort, Restart, RsBusPort};
use crate::led::DecoderLed;
use crate::types::{CvAccessCommand, CvAccessMode, CvOperation, RESET_MAGIC};
use log::{debug, info};

/// Processes CV-access commands and tracks the CV23 search state.
pub struct CvAccessHandler {
    search_active: bool,
}

impl CvAccessHandler {
    pub fn new() -> Self {
        Self { search_active: false }
    }

    /// True while the CV23 search function keeps the LED blinking.
    pub fn search_active(&self) -> bool {
        self.search_active
    }

    /// Handles one received CV-access command.
    ///
    /// CV numbers beyond the table are silently ignored; neither protocol
    /// has a negative-answer channel.
    pub fn process(
        &mut self,
        command: &CvAccessCommand,
        mode: CvAccessMode,
        cv: &mut CvStore,
        dcc: &mut dyn DccPort,
        rsbus: &mut dyn RsBusPort,
        led: &mut DecoderLed,
        restart: &mut dyn Restart,
        now: u32,
    ) {
        let sm = mode == CvAccessMode::ServiceMode;
        let Ok(current) = cv.read(command.number) else {
            debug!("Ignoring access to CV{}", command.number);
            return;
        };
        match command.operation {
            CvOperation::VerifyByte => {
                if sm {
                    if current == command.value {
                        dcc.send_ack();
                    }
                } else {
                    self.pom_feedback(command.number, current, dcc, rsbus);
                }
            }
            CvOperation::WriteByte => self.write_byte(command, sm, cv, dcc, led, restart, now),
            CvOperation::WriteBit { .. } => {
                let new = command.write_bit(current);
                let _ = cv.write(command.number, new);
                if sm {
                    dcc.send_ack();
                }
            }
            CvOperation::VerifyBit { .. } => {
                if command.verify_bit(current) && sm {
                    dcc.send_ack();
                }
            }
        }
    }

    /// PoM read-back on the RS-bus.
    ///
    /// The NMRA verify-byte command compares against the sent value, which
    /// is useful on the programming track but not on the main. Since the
    /// RS-bus provides a return channel, PoM verifies answer with the value
    /// held by the decoder instead. The diagnostic CVs answer with their
    /// live counters, not with the (stale) EEPROM slots.
    fn pom_feedback(&self, number: u16, current: u8, dcc: &dyn DccPort, rsbus: &mut dyn RsBusPort) {
        let value = match number {
            CV_SEARCH => self.search_active as u8,
            CV_DCC_QUALITY => dcc.checksum_errors(),
            CV_PARITY_ERRORS => rsbus.parity_errors(),
            CV_PULSE_ERRORS => rsbus.pulse_count_errors(),
            _ => current,
        };
        rsbus.send_pom_byte(value);
    }

    fn write_byte(
        &mut self,
        command: &CvAccessCommand,
        sm: bool,
        cv: &mut CvStore,
        dcc: &mut dyn DccPort,
        led: &mut DecoderLed,
        restart: &mut dyn Restart,
        now: u32,
    ) {
        match command.number {
            // CV7 (version) is read-only.
            CV_VERSION => {}
            CV_VID => {
                // Writing the magic byte to CV8 restores factory defaults.
                // Any other value is ignored; the vendor ID stays fixed.
                if command.value == RESET_MAGIC {
                    info!("CV8 factory reset requested");
                    cv.restore_defaults();
                    if sm {
                        dcc.send_ack();
                    }
                    restart.restart();
                }
            }
            CV_RESTART => {
                // Restart without touching the CV table, so freshly written
                // values take effect.
                if command.value != 0 {
                    restart.restart();
                }
            }
            CV_SEARCH => {
                // Blink the LED until CV23 is written back to 0, so a
                // decoder can be located on the layout.
                if command.value != 0 {
                    self.search_active = true;
                    led.flash_fast(now);
                } else {
                    self.search_active = false;
                    led.turn_off();
                }
            }
            _ => {
                // No sanity check on the value; CV semantics are the
                // consumer's concern.
                let _ = cv.write(command.number, command.value);
                if sm {
                    dcc.send_ack();
                }
            }
        }
    }
}

impl Default for CvAccessHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv::defaults::CvDefaults;
    use crate::cv::test_support::MockStorage;
    use crate::hal::DigitalOutput;
    use crate::types::DecoderType;
    use std::vec::Vec;

    struct MockDcc {
        acks: usize,
        checksum_errors: u8,
    }

    impl DccPort for MockDcc {
        fn send_ack(&mut self) {
            self.acks += 1;
        }

        fn checksum_errors(&self) -> u8 {
            self.checksum_errors
        }

        fn set_accessory_address(&mut self, _address: u16) {}
        fn set_pom_address(&mut self, _address: u16) {}
        fn set_command_station(&mut self, _kind: u8) {}
    }

    struct MockRsBus {
        sent: Vec<u8>,
        parity_errors: u8,
        pulse_count_errors: u8,
    }

    impl RsBusPort for MockRsBus {
        fn check_polling(&mut self) {}
        fn check_pom_buffer(&mut self) {}

        fn send_pom_byte(&mut self, value: u8) {
            self.sent.push(value);
        }

        fn parity_errors(&self) -> u8 {
            self.parity_errors
        }

        fn pulse_count_errors(&self) -> u8 {
            self.pulse_count_errors
        }
    }

    struct MockRestart {
        count: usize,
    }

    impl Restart for MockRestart {
        fn restart(&mut self) {
            self.count += 1;
        }
    }

    struct MockPin {
        level: bool,
    }

    impl DigitalOutput for MockPin {
        fn write(&mut self, level: bool) {
            self.level = level;
        }

        fn read(&self) -> bool {
            self.level
        }
    }

    struct Harness {
        storage: MockStorage,
        dcc: MockDcc,
        rsbus: MockRsBus,
        restart: MockRestart,
        pin: MockPin,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                storage: MockStorage::new(),
                dcc: MockDcc { acks: 0, checksum_errors: 0 },
                rsbus: MockRsBus { sent: Vec::new(), parity_errors: 0, pulse_count_errors: 0 },
                restart: MockRestart { count: 0 },
                pin: MockPin { level: false },
            }
        }
    }

    fn write(number: u16, value: u8) -> CvAccessCommand {
        CvAccessCommand { number, value, operation: CvOperation::WriteByte }
    }

    fn verify(number: u16, value: u8) -> CvAccessCommand {
        CvAccessCommand { number, value, operation: CvOperation::VerifyByte }
    }

    fn process(h: &mut Harness, handler: &mut CvAccessHandler, cmd: CvAccessCommand, mode: CvAccessMode) {
        let mut cv = CvStore::new(&mut h.storage, CvDefaults::new(DecoderType::Switch, 10));
        cv.init();
        let mut led = DecoderLed::new(&mut h.pin);
        handler.process(&cmd, mode, &mut cv, &mut h.dcc, &mut h.rsbus, &mut led, &mut h.restart, 0);
    }

    #[test]
    fn sm_verify_byte_acks_only_on_match() {
        let mut h = Harness::new();
        let mut handler = CvAccessHandler::new();
        process(&mut h, &mut handler, verify(CV_VID, 0x0D), CvAccessMode::ServiceMode);
        assert_eq!(h.dcc.acks, 1);
        process(&mut h, &mut handler, verify(CV_VID, 0x0C), CvAccessMode::ServiceMode);
        assert_eq!(h.dcc.acks, 1);
        assert!(h.rsbus.sent.is_empty());
    }

    #[test]
    fn pom_verify_reads_back_the_stored_value() {
        let mut h = Harness::new();
        let mut handler = CvAccessHandler::new();
        process(&mut h, &mut handler, write(CV_T_ON_F1, 42), CvAccessMode::ProgrammingOnMain);
        process(&mut h, &mut handler, verify(CV_T_ON_F1, 0), CvAccessMode::ProgrammingOnMain);
        assert_eq!(h.rsbus.sent, [42]);
        assert_eq!(h.dcc.acks, 0);
    }

    #[test]
    fn pom_verify_of_diagnostics_uses_live_counters() {
        let mut h = Harness::new();
        h.dcc.checksum_errors = 7;
        h.rsbus.parity_errors = 3;
        h.rsbus.pulse_count_errors = 9;
        let mut handler = CvAccessHandler::new();
        process(&mut h, &mut handler, verify(CV_DCC_QUALITY, 0), CvAccessMode::ProgrammingOnMain);
        process(&mut h, &mut handler, verify(CV_PARITY_ERRORS, 0), CvAccessMode::ProgrammingOnMain);
        process(&mut h, &mut handler, verify(CV_PULSE_ERRORS, 0), CvAccessMode::ProgrammingOnMain);
        process(&mut h, &mut handler, verify(CV_SEARCH, 0), CvAccessMode::ProgrammingOnMain);
        assert_eq!(h.rsbus.sent, [7, 3, 9, 0]);
    }

    #[test]
    fn plain_write_stores_and_acks_in_sm_only() {
        let mut h = Harness::new();
        let mut handler = CvAccessHandler::new();
        process(&mut h, &mut handler, write(CV_MY_ADDR_L, 12), CvAccessMode::ServiceMode);
        assert_eq!(h.storage.cells[CV_MY_ADDR_L as usize], 12);
        assert_eq!(h.dcc.acks, 1);

        process(&mut h, &mut handler, write(CV_MY_ADDR_L, 13), CvAccessMode::ProgrammingOnMain);
        assert_eq!(h.storage.cells[CV_MY_ADDR_L as usize], 13);
        assert_eq!(h.dcc.acks, 1);
    }

    #[test]
    fn version_cv_is_not_writable() {
        let mut h = Harness::new();
        let mut handler = CvAccessHandler::new();
        process(&mut h, &mut handler, write(CV_VERSION, 99), CvAccessMode::ServiceMode);
        assert_eq!(h.storage.cells[CV_VERSION as usize], 10);
        assert_eq!(h.dcc.acks, 0);
    }

    #[test]
    fn cv8_reset_magic_restores_defaults_and_restarts() {
        let mut h = Harness::new();
        let mut handler = CvAccessHandler::new();
        process(&mut h, &mut handler, write(CV_MY_ADDR_L, 12), CvAccessMode::ServiceMode);
        process(&mut h, &mut handler, write(CV_VID, RESET_MAGIC), CvAccessMode::ServiceMode);
        assert_eq!(h.storage.cells[CV_MY_ADDR_L as usize], 0x01);
        assert_eq!(h.restart.count, 1);
        assert_eq!(h.dcc.acks, 2);
    }

    #[test]
    fn cv8_with_other_value_is_ignored() {
        let mut h = Harness::new();
        let mut handler = CvAccessHandler::new();
        process(&mut h, &mut handler, write(CV_VID, 0x42), CvAccessMode::ServiceMode);
        assert_eq!(h.storage.cells[CV_VID as usize], 0x0D);
        assert_eq!(h.restart.count, 0);
        assert_eq!(h.dcc.acks, 0);
    }

    #[test]
    fn cv25_restarts_without_touching_storage() {
        let mut h = Harness::new();
        let mut handler = CvAccessHandler::new();
        process(&mut h, &mut handler, write(CV_MY_ADDR_L, 12), CvAccessMode::ProgrammingOnMain);
        process(&mut h, &mut handler, write(CV_RESTART, 1), CvAccessMode::ProgrammingOnMain);
        assert_eq!(h.restart.count, 1);
        assert_eq!(h.storage.cells[CV_MY_ADDR_L as usize], 12);

        process(&mut h, &mut handler, write(CV_RESTART, 0), CvAccessMode::ProgrammingOnMain);
        assert_eq!(h.restart.count, 1);
    }

    #[test]
    fn cv23_search_toggles_the_flag() {
        let mut h = Harness::new();
        let mut handler = CvAccessHandler::new();
        process(&mut h, &mut handler, write(CV_SEARCH, 1), CvAccessMode::ProgrammingOnMain);
        assert!(handler.search_active());
        assert_eq!(h.storage.cells[CV_SEARCH as usize], 0);

        process(&mut h, &mut handler, write(CV_SEARCH, 0), CvAccessMode::ProgrammingOnMain);
        assert!(!handler.search_active());
    }

    #[test]
    fn bit_write_stores_in_both_modes_but_acks_in_sm_only() {
        let mut h = Harness::new();
        let mut handler = CvAccessHandler::new();
        let set = CvAccessCommand {
            number: CV_T_ON_F1,
            value: 0,
            operation: CvOperation::WriteBit { bit: 6, value: true },
        };
        process(&mut h, &mut handler, set, CvAccessMode::ServiceMode);
        assert_eq!(h.storage.cells[CV_T_ON_F1 as usize], 15 | 0b0100_0000);
        assert_eq!(h.dcc.acks, 1);

        let clear = CvAccessCommand {
            number: CV_T_ON_F1,
            value: 0,
            operation: CvOperation::WriteBit { bit: 6, value: false },
        };
        process(&mut h, &mut handler, clear, CvAccessMode::ProgrammingOnMain);
        assert_eq!(h.storage.cells[CV_T_ON_F1 as usize], 15);
        assert_eq!(h.dcc.acks, 1);
    }

    #[test]
    fn bit_verify_acks_on_match() {
        let mut h = Harness::new();
        let mut handler = CvAccessHandler::new();
        let matching = CvAccessCommand {
            number: CV_T_ON_F1,
            value: 0,
            operation: CvOperation::VerifyBit { bit: 0, value: true },
        };
        process(&mut h, &mut handler, matching, CvAccessMode::ServiceMode);
        assert_eq!(h.dcc.acks, 1);

        let mismatch = CvAccessCommand {
            number: CV_T_ON_F1,
            value: 0,
            operation: CvOperation::VerifyBit { bit: 7, value: true },
        };
        process(&mut h, &mut handler, mismatch, CvAccessMode::ServiceMode);
        assert_eq!(h.dcc.acks, 1);
    }

    #[test]
    fn out_of_range_cv_is_silently_ignored() {
        let mut h = Harness::new();
        let mut handler = CvAccessHandler::new();
        process(&mut h, &mut handler, write(MAX_CV + 1, 1), CvAccessMode::ServiceMode);
        process(&mut h, &mut handler, verify(513, 1), CvAccessMode::ProgrammingOnMain);
        assert_eq!(h.dcc.acks, 0);
        assert!(h.rsbus.sent.is_empty());
    }
}
