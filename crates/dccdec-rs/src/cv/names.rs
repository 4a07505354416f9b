//! Central repository for the well-known CV numbers.
//!
//! This module provides `pub const` definitions for every CV slot, using a
//! consistent `CV_` naming convention. The layout follows RCN-225 for
//! CV1..CV30, with the documented deviations (CV10..CV18 follow the Lenz
//! LR101 feedback decoder, several NMRA-reserved slots are reused because
//! low CV numbers map to low EEPROM addresses).
//!
//! CVs 33 and up are decoder-type specific and deliberately reused across
//! types; the per-type constants live in the named sub-modules below.

// --- Generic CVs, implemented by multiple decoder types ---

/// 0..63 / 0..255 - Decoder address, low order bits. First address = 1.
pub const CV_MY_ADDR_L: u16 = 1;
/// 0..255 - Activation time output F1 (in 20 ms steps). 0 = continuous.
pub const CV_T_ON_F1: u16 = 3;
/// 0..255 - Activation time output F2 (in 20 ms steps). 0 = continuous.
pub const CV_T_ON_F2: u16 = 4;
/// 0..255 - Activation time output F3 (in 20 ms steps). 0 = continuous.
pub const CV_T_ON_F3: u16 = 5;
/// 0..255 - Activation time output F4 (in 20 ms steps). 0 = continuous.
pub const CV_T_ON_F4: u16 = 6;
/// 8..255 - Software version. Read-only.
pub const CV_VERSION: u16 = 7;
/// 0x0D - Vendor ID (DIY decoder). Writing 0x0D triggers a factory reset.
pub const CV_VID: u16 = 8;
/// 0..3 - Decoder address, high order bits. Top bit set = unconfigured.
pub const CV_MY_ADDR_H: u16 = 9;
/// 1..128 - RS-bus address. 0 = undefined, 128 reserved for PoM feedback.
pub const CV_MY_RS_ADDR: u16 = 10;
/// 0..255 - Delay (10 ms steps) before the OFF signal for input 1 (Lenz LR101).
pub const CV_DELAY_IN1: u16 = 11;
pub const CV_DELAY_IN2: u16 = 12;
pub const CV_DELAY_IN3: u16 = 13;
pub const CV_DELAY_IN4: u16 = 14;
pub const CV_DELAY_IN5: u16 = 15;
pub const CV_DELAY_IN6: u16 = 16;
pub const CV_DELAY_IN7: u16 = 17;
pub const CV_DELAY_IN8: u16 = 18;
/// 0..2 - Command station: 0 = Roco/Multimouse, 1 = Lenz, 2 = OpenDCC Z1.
pub const CV_CMD_STATION: u16 = 19;
/// 0..2 - Number of RS-bus extra transmissions (forward error correction).
pub const CV_RS_FEC: u16 = 20;
/// 0..1 - Use even decoder addresses only (2, 4, 6, ...).
pub const CV_SKIP_UNEVEN: u16 = 21;
/// 0..2 - RS-bus parity error policy: 0 = ignore, 1 = retransmit previous, 2 = always.
pub const CV_RS_PARITY: u16 = 22;
/// 0..1 - Search flag: while 1, the decoder LED blinks.
pub const CV_SEARCH: u16 = 23;
/// 0..2 - RS-bus pulse count error policy.
pub const CV_RS_PULS_COUNT: u16 = 24;
/// 0..1 - Write non-zero to restart (not reset) the decoder.
pub const CV_RESTART: u16 = 25;
/// 0..255 - DCC signal quality: checksum error count. Read-only diagnostic.
pub const CV_DCC_QUALITY: u16 = 26;
/// Decoder type, see [`DecoderType`](crate::types::DecoderType).
pub const CV_DEC_TYPE: u16 = 27;
/// 0 - RailCom configuration (not supported).
pub const CV_RAILCOM: u16 = 28;
/// Accessory decoder configuration bits, see the `CONFIG_*` masks below.
pub const CV_CONFIG: u16 = 29;
/// 0x0D - Second vendor ID, used by PoM tooling to recognise these decoders.
pub const CV_VID_2: u16 = 30;
/// 0..255 - RS-bus parity error count. Read-only diagnostic.
pub const CV_PARITY_ERRORS: u16 = 31;
/// 0..255 - RS-bus pulse count error count. Read-only diagnostic.
pub const CV_PULSE_ERRORS: u16 = 32;
/// 0..1 - Send switch/servo feedback via the RS-bus.
pub const CV_SEND_FB: u16 = 33;
/// 0..1 - Activate coil/relay/servo on every DCC command received.
pub const CV_ALWAYS_ACT: u16 = 34;

// CV29 configuration bits
/// CV29 bit 7: 0 = multi-function (loco) decoder, 1 = accessory decoder.
pub const CONFIG_ACCESSORY: u8 = 0b1000_0000;
/// CV29 bit 6: accessory addressing: 0 = decoder address, 1 = output address.
pub const CONFIG_OUTPUT_ADDRESSING: u8 = 0b0100_0000;
/// CV29 bit 5: loco addressing: 0 = short address (CV1), 1 = long (CV17/18).
pub const CONFIG_LONG_LOCO_ADDRESS: u8 = 0b0010_0000;

/// Long loco address, most significant 6 bits.
pub const CV_LONG_ADDR_H: u16 = 17;
/// Long loco address, least significant byte.
pub const CV_LONG_ADDR_L: u16 = 18;

/// CVs specific to the track-occupancy (GBM) decoder family.
pub mod occupancy {
    /// 0..8 - ON samples needed before the state counts as stable.
    pub const CV_MIN_SAMPLES: u16 = 33;
    /// 0..255 - Delay (100 ms steps) before an occupancy is released.
    pub const CV_DELAY_OFF: u16 = 34;
    /// 10..255 - Above this sample value a previous OFF becomes ON.
    pub const CV_THRESHOLD_ON: u16 = 35;
    /// 5..255 - Below this sample value a previous ON becomes OFF.
    pub const CV_THRESHOLD_OFF: u16 = 36;
    /// 0..8 - Track number of the first speed measurement track (0 = none).
    pub const CV_SPEED1_OUT: u16 = 37;
    /// 0..255 - Length in mm of the first speed track (LSB).
    pub const CV_SPEED1_LL: u16 = 38;
    /// 0..20 - Length in mm of the first speed track (MSB).
    pub const CV_SPEED1_LH: u16 = 39;
    pub const CV_SPEED2_OUT: u16 = 40;
    pub const CV_SPEED2_LL: u16 = 41;
    pub const CV_SPEED2_LH: u16 = 42;
    /// 0..8 - Feedback bit if track A is occupied (reverser).
    pub const CV_FB_A: u16 = 43;
    pub const CV_FB_B: u16 = 44;
    pub const CV_FB_C: u16 = 45;
    pub const CV_FB_D: u16 = 46;
    pub const CV_FB_S1: u16 = 47;
    pub const CV_FB_S2: u16 = 48;
    pub const CV_FB_S3: u16 = 49;
    pub const CV_FB_S4: u16 = 50;
    /// 0..1 - J&K polarisation: 0 = normal, 1 = swapped.
    pub const CV_POLARIZATION: u16 = 51;
}

/// CVs specific to the 16-relay decoder.
pub mod relays16 {
    /// 0..1 - Relay switches with minus (0) or plus (1).
    pub const CV_RACT: u16 = 33;
    /// Relays used for round-robin, relays 1-8.
    pub const CV_RRR1: u16 = 34;
    /// Relays used for round-robin, relays 9-16.
    pub const CV_RRR2: u16 = 35;
    /// Round-robin interval in seconds.
    pub const CV_RINTER: u16 = 36;
    /// 0..3 - Relay decoder mode.
    pub const CV_MODE: u16 = 37;
}

/// CVs specific to the safety (watchdog) decoder.
pub mod safety {
    /// 0..1 - Send feedback via the RS-bus when the emergency button is pushed.
    pub const CV_SEND_BUTTON_FB: u16 = 33;
    /// 1..4 - X8 connector pin used for the emergency stop button.
    pub const CV_P_EMERGENCY: u16 = 34;
    /// Seconds the watchdog relay remains active.
    pub const CV_T_WATCHDOG: u16 = 35;
    /// Time (100 ms steps) the PC gets to stop all trains after an emergency push.
    pub const CV_T_EMERGENCY: u16 = 36;
    /// Interval (100 ms steps) in which we check if the PC stopped all trains.
    pub const CV_T_CHECK_MOVE: u16 = 37;
    /// Time (20 ms steps) the RS-bus stays ON after push button 1. 0 = toggle.
    pub const CV_T_RS_PUSH1: u16 = 38;
    pub const CV_T_RS_PUSH2: u16 = 39;
    pub const CV_T_RS_PUSH3: u16 = 40;
    pub const CV_T_RS_PUSH4: u16 = 41;
}

/// CVs specific to the lift decoder.
pub mod lift {
    /// 0..1 - Perform a homing cycle at program start.
    pub const CV_START_HOMING: u16 = 33;
    /// 0..1 - Enable the IR detectors that block lift movement.
    pub const CV_IR_DETECT: u16 = 34;
    /// 0..1 - Enable the LCD display.
    pub const CV_LCD_DISPLAY: u16 = 35;
    /// 0..2 - Serial interface: 0 = off, 1 = on, 2 = details.
    pub const CV_SERIAL_LINE: u16 = 36;
}

/// CVs specific to the TMC 24-channel IO decoder.
pub mod tmc24 {
    /// 0..8 - ON samples needed before the state counts as stable.
    pub const CV_MIN_SAMPLES: u16 = 33;
    /// 0..255 - OFF samples needed before an occupancy is released.
    pub const CV_DELAY_OFF: u16 = 34;
    /// 1..255 - Interval between samples in ms.
    pub const CV_INT_SAMPLES: u16 = 35;
    /// 1..255 - Startup delay before the first RS-bus message, in samples.
    pub const CV_START_DELAY: u16 = 36;
    /// 1..99 - PoM address offset: address = offset * 100 + RS-bus address.
    pub const CV_OFFSET_POM: u16 = 37;
}
