//! The decoder-type-dependent CV default table.
//!
//! `restore_defaults` copies this table to persistent storage in one go. The
//! table lives in RAM so the embedding application can still tweak single
//! defaults (e.g. a different activation time) before the first persist.
//!
//! The generic block (CV1..CV32) is identical for all decoder types; the
//! slots from CV33 upward are filled by a per-type override record, selected
//! through [`TypeDefaults`]. Keeping the overrides as typed records (rather
//! than raw table pokes) documents which reused slot means what for which
//! type.

use super::names::*;
use super::{CV_COUNT, INITIALIZED_MARKER};
use crate::types::{DecoderType, VENDOR_ID_DIY};

/// Default values for a switch, servo or 4-relay decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchDefaults {
    /// Send switch/servo feedback messages via the RS-bus.
    pub send_feedback: bool,
    /// Activate the coil even if the switch should already be in position.
    /// Train controllers that expect a feedback message per command need this.
    pub always_activate: bool,
    /// Use even decoder addresses only, so every switch owns a feedback nibble.
    pub skip_uneven: bool,
}

impl SwitchDefaults {
    fn apply(&self, table: &mut [u8; CV_COUNT]) {
        table[CV_SEND_FB as usize] = self.send_feedback as u8;
        table[CV_ALWAYS_ACT as usize] = self.always_activate as u8;
        table[CV_SKIP_UNEVEN as usize] = self.skip_uneven as u8;
    }
}

/// Default values for the 16-relay decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relays16Defaults {
    pub active_high: bool,
    pub round_robin_1_8: u8,
    pub round_robin_9_16: u8,
    pub round_robin_interval_s: u8,
    pub mode: u8,
}

impl Relays16Defaults {
    fn apply(&self, table: &mut [u8; CV_COUNT]) {
        table[relays16::CV_RACT as usize] = self.active_high as u8;
        table[relays16::CV_RRR1 as usize] = self.round_robin_1_8;
        table[relays16::CV_RRR2 as usize] = self.round_robin_9_16;
        table[relays16::CV_RINTER as usize] = self.round_robin_interval_s;
        table[relays16::CV_MODE as usize] = self.mode;
    }
}

/// Default values for the track-occupancy (GBM) decoder family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupancyDefaults {
    /// Delay (100 ms steps) before a previous occupancy is released, used
    /// when the per-input delays CV11..CV18 are all zero.
    pub delay_off: u8,
    pub min_samples: u8,
    pub threshold_on: u8,
    pub threshold_off: u8,
    /// Feedback bits for the reverser tracks A..D.
    pub reverser_tracks: [u8; 4],
    /// Feedback bits for the reverser sensors 1..4.
    pub reverser_sensors: [u8; 4],
}

impl OccupancyDefaults {
    fn apply(&self, table: &mut [u8; CV_COUNT]) {
        // Per-input delays default to 0 (CV34 governs all inputs instead).
        for cv in CV_DELAY_IN1..=CV_DELAY_IN8 {
            table[cv as usize] = 0;
        }
        table[occupancy::CV_DELAY_OFF as usize] = self.delay_off;
        table[occupancy::CV_MIN_SAMPLES as usize] = self.min_samples;
        table[occupancy::CV_THRESHOLD_ON as usize] = self.threshold_on;
        table[occupancy::CV_THRESHOLD_OFF as usize] = self.threshold_off;
        // Speed measurement off by default.
        table[occupancy::CV_SPEED1_OUT as usize] = 0;
        table[occupancy::CV_SPEED1_LL as usize] = 0;
        table[occupancy::CV_SPEED1_LH as usize] = 0;
        table[occupancy::CV_SPEED2_OUT as usize] = 0;
        table[occupancy::CV_SPEED2_LL as usize] = 0;
        table[occupancy::CV_SPEED2_LH as usize] = 0;
        table[occupancy::CV_FB_A as usize] = self.reverser_tracks[0];
        table[occupancy::CV_FB_B as usize] = self.reverser_tracks[1];
        table[occupancy::CV_FB_C as usize] = self.reverser_tracks[2];
        table[occupancy::CV_FB_D as usize] = self.reverser_tracks[3];
        table[occupancy::CV_FB_S1 as usize] = self.reverser_sensors[0];
        table[occupancy::CV_FB_S2 as usize] = self.reverser_sensors[1];
        table[occupancy::CV_FB_S3 as usize] = self.reverser_sensors[2];
        table[occupancy::CV_FB_S4 as usize] = self.reverser_sensors[3];
        table[occupancy::CV_POLARIZATION as usize] = 0;
    }
}

/// Default values for the safety (watchdog) decoder.
///
/// Unlike the other types, the safety decoder does not start unconfigured:
/// its accessory address defaults to the 1005..1009 block and its RS-bus
/// address to 127.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyDefaults {
    pub addr_low: u8,
    pub addr_high: u8,
    pub rs_address: u8,
    pub send_feedback: bool,
    pub emergency_pin: u8,
    pub watchdog_s: u8,
    pub emergency_time: u8,
    pub check_move_interval: u8,
    pub rs_push_times: [u8; 4],
}

impl SafetyDefaults {
    fn apply(&self, table: &mut [u8; CV_COUNT]) {
        table[CV_MY_ADDR_L as usize] = self.addr_low;
        table[CV_MY_ADDR_H as usize] = self.addr_high;
        table[CV_MY_RS_ADDR as usize] = self.rs_address;
        table[safety::CV_SEND_BUTTON_FB as usize] = self.send_feedback as u8;
        table[safety::CV_P_EMERGENCY as usize] = self.emergency_pin;
        table[safety::CV_T_WATCHDOG as usize] = self.watchdog_s;
        table[safety::CV_T_EMERGENCY as usize] = self.emergency_time;
        table[safety::CV_T_CHECK_MOVE as usize] = self.check_move_interval;
        table[safety::CV_T_RS_PUSH1 as usize] = self.rs_push_times[0];
        table[safety::CV_T_RS_PUSH2 as usize] = self.rs_push_times[1];
        table[safety::CV_T_RS_PUSH3 as usize] = self.rs_push_times[2];
        table[safety::CV_T_RS_PUSH4 as usize] = self.rs_push_times[3];
    }
}

/// Default values for the lift decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiftDefaults {
    pub start_homing: bool,
    pub ir_detect: bool,
    pub lcd_display: bool,
    pub serial_line: u8,
}

impl LiftDefaults {
    fn apply(&self, table: &mut [u8; CV_COUNT]) {
        table[lift::CV_START_HOMING as usize] = self.start_homing as u8;
        table[lift::CV_IR_DETECT as usize] = self.ir_detect as u8;
        table[lift::CV_LCD_DISPLAY as usize] = self.lcd_display as u8;
        table[lift::CV_SERIAL_LINE as usize] = self.serial_line;
    }
}

/// Default values for the TMC 24-channel IO decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tmc24Defaults {
    pub sample_interval_ms: u8,
    pub min_samples: u8,
    pub delay_off_samples: u8,
    pub start_delay_samples: u8,
    pub pom_offset: u8,
}

impl Tmc24Defaults {
    fn apply(&self, table: &mut [u8; CV_COUNT]) {
        table[tmc24::CV_INT_SAMPLES as usize] = self.sample_interval_ms;
        table[tmc24::CV_MIN_SAMPLES as usize] = self.min_samples;
        table[tmc24::CV_DELAY_OFF as usize] = self.delay_off_samples;
        table[tmc24::CV_START_DELAY as usize] = self.start_delay_samples;
        table[tmc24::CV_OFFSET_POM as usize] = self.pom_offset;
    }
}

/// The type-specific override block for CV33 and up, keyed by decoder type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDefaults {
    Switch(SwitchDefaults),
    Relays16(Relays16Defaults),
    Occupancy(OccupancyDefaults),
    Safety(SafetyDefaults),
    Lift(LiftDefaults),
    Tmc24(Tmc24Defaults),
    /// Function decoders implement the generic CVs only.
    None,
}

impl TypeDefaults {
    /// Returns the factory override block for the given decoder type.
    pub fn for_type(decoder_type: DecoderType) -> Self {
        match decoder_type {
            DecoderType::Switch | DecoderType::SwitchWithEmergency | DecoderType::Servo => {
                TypeDefaults::Switch(SwitchDefaults {
                    send_feedback: true,
                    always_activate: true,
                    skip_uneven: true,
                })
            }
            DecoderType::Relays4 => TypeDefaults::Switch(SwitchDefaults {
                // Relays run the switch decoder software; no feedback needed.
                send_feedback: false,
                always_activate: false,
                skip_uneven: false,
            }),
            DecoderType::Relays16 => TypeDefaults::Relays16(Relays16Defaults {
                active_high: true,
                round_robin_1_8: 15,
                round_robin_9_16: 7,
                round_robin_interval_s: 6,
                mode: 0,
            }),
            DecoderType::TrackOccupancy
            | DecoderType::TrackOccupancyWithReverser
            | DecoderType::TrackOccupancyWithRelays
            | DecoderType::TrackOccupancyWithSpeed => TypeDefaults::Occupancy(OccupancyDefaults {
                delay_off: 15,
                min_samples: 3,
                threshold_on: 20,
                threshold_off: 15,
                reverser_tracks: [0, 1, 2, 3],
                reverser_sensors: [0, 1, 1, 2],
            }),
            DecoderType::Safety => TypeDefaults::Safety(SafetyDefaults {
                addr_low: 60,
                addr_high: 3, // 3 * 64 + 60 => the 1005..1009 block
                rs_address: 127,
                send_feedback: true,
                emergency_pin: 4,
                watchdog_s: 5,
                emergency_time: 25,
                check_move_interval: 50,
                rs_push_times: [0, 0, 150, 150],
            }),
            DecoderType::Lift => TypeDefaults::Lift(LiftDefaults {
                start_homing: true,
                ir_detect: true,
                lcd_display: false,
                serial_line: 0,
            }),
            DecoderType::Tmc24ChannelIo => TypeDefaults::Tmc24(Tmc24Defaults {
                sample_interval_ms: 10,
                min_samples: 3,
                delay_off_samples: 150,
                start_delay_samples: 20,
                pom_offset: 50,
            }),
            DecoderType::Function => TypeDefaults::None,
        }
    }

    fn apply(&self, table: &mut [u8; CV_COUNT]) {
        match self {
            TypeDefaults::Switch(d) => d.apply(table),
            TypeDefaults::Relays16(d) => d.apply(table),
            TypeDefaults::Occupancy(d) => d.apply(table),
            TypeDefaults::Safety(d) => d.apply(table),
            TypeDefaults::Lift(d) => d.apply(table),
            TypeDefaults::Tmc24(d) => d.apply(table),
            TypeDefaults::None => {}
        }
    }
}

/// The full 65-slot default table (slot 0 is the initialisation marker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvDefaults {
    table: [u8; CV_COUNT],
}

impl CvDefaults {
    /// Builds the default table for a decoder type and software version.
    pub fn new(decoder_type: DecoderType, software_version: u8) -> Self {
        let mut table = [0u8; CV_COUNT];
        table[0] = INITIALIZED_MARKER;

        // Generic block, identical for all decoder types.
        table[CV_DEC_TYPE as usize] = decoder_type.into();
        table[CV_VERSION as usize] = software_version;
        table[CV_VID as usize] = VENDOR_ID_DIY;
        table[CV_VID_2 as usize] = VENDOR_ID_DIY;

        // Addresses start out unconfigured: CV9 top bit set, RS-bus address 0.
        table[CV_MY_ADDR_L as usize] = 0x01;
        table[CV_MY_ADDR_H as usize] = 0x80;
        table[CV_MY_RS_ADDR as usize] = 0;

        // Basic accessory decoder with decoder addressing fits most boards.
        table[CV_CONFIG as usize] = CONFIG_ACCESSORY;

        table[CV_RAILCOM as usize] = 0;
        table[CV_CMD_STATION as usize] = 1; // Lenz LZV100, Xpressnet V3.6
        table[CV_SKIP_UNEVEN as usize] = 0;
        table[CV_RS_FEC as usize] = 0;
        table[CV_RS_PARITY as usize] = 1;
        table[CV_RS_PULS_COUNT as usize] = 2;
        table[CV_DCC_QUALITY as usize] = 0;
        table[CV_PARITY_ERRORS as usize] = 0;
        table[CV_PULSE_ERRORS as usize] = 0;

        // 300 ms activation works for common turnout coils and relays.
        table[CV_T_ON_F1 as usize] = 15;
        table[CV_T_ON_F2 as usize] = 15;
        table[CV_T_ON_F3 as usize] = 15;
        table[CV_T_ON_F4 as usize] = 15;

        TypeDefaults::for_type(decoder_type).apply(&mut table);
        Self { table }
    }

    /// Reads a single default value. Slots beyond the table read as 0.
    pub fn get(&self, cv: u16) -> u8 {
        self.table.get(cv as usize).copied().unwrap_or(0)
    }

    /// Overrides a single default value. Intended for the embedding
    /// application, before the table is first persisted. Slots beyond the
    /// table are ignored.
    pub fn set(&mut self, cv: u16, value: u8) {
        if let Some(slot) = self.table.get_mut(cv as usize) {
            *slot = value;
        }
    }

    /// The raw table, including the marker at slot 0.
    pub fn as_slice(&self) -> &[u8] {
        &self.table
    }
}
