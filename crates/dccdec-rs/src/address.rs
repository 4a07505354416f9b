//! Address resolution and address programming.
//!
//! The decoder listens on up to three addresses, all derived from the CV
//! table: the accessory address (decoder or output form, selected by CV29
//! bit 6), the RS-bus feedback address (CV10), and a loco address used to
//! receive PoM commands.

use crate::cv::names::*;
use crate::cv::CvStore;
use crate::types::{AccessoryCommand, DEFAULT_LOCO_ADDRESS, UNCONFIGURED_ADDRESS};
use log::info;

/// PoM listening addresses start at this offset for feedback-group decoders.
pub const POM_OFFSET_FEEDBACK_GROUP: u16 = 6000;

/// PoM listening addresses start at this offset for all other decoders.
pub const POM_OFFSET_OTHER: u16 = 7000;

/// Retrieves the decoder address stored in the CV table.
///
/// For accessory decoders (CV29 bit 7) this is either the decoder address or
/// the output address, selected by CV29 bit 6. For multi-function (loco)
/// decoders it is the short (CV1) or long (CV17/CV18) loco address, selected
/// by CV29 bit 5.
///
/// Returns [`UNCONFIGURED_ADDRESS`] while the accessory address has not been
/// programmed (CV9 top bit still set).
pub fn stored_address(cv: &CvStore) -> u16 {
    let cv29 = cv.read(CV_CONFIG).unwrap_or(0);
    if cv29 & CONFIG_ACCESSORY != 0 {
        let cv9_raw = cv.read(CV_MY_ADDR_H).unwrap_or(0x80);
        if cv9_raw >= 0x80 {
            return UNCONFIGURED_ADDRESS;
        }
        let cv9 = u16::from(cv9_raw & 0b0000_0111);
        if cv29 & CONFIG_OUTPUT_ADDRESSING != 0 {
            // Output addressing. CV1 starts from 1, as does the lowest
            // output address, so the bytes concatenate directly.
            let cv1 = u16::from(cv.read(CV_MY_ADDR_L).unwrap_or(1));
            (cv9 << 8) + cv1
        } else {
            // Decoder addressing, per RCN-213: CV1 starts from 1, but the
            // lowest decoder address is 0.
            let cv1 = u16::from(cv.read(CV_MY_ADDR_L).unwrap_or(1) & 0b0011_1111);
            // CV1 = 0 with CV9 = 0 is outside the valid range; the wrap
            // mirrors what a command station would read back.
            ((cv9 << 6) + cv1).wrapping_sub(1)
        }
    } else {
        let address = if cv29 & CONFIG_LONG_LOCO_ADDRESS != 0 {
            let cv17 = u16::from(cv.read(CV_LONG_ADDR_H).unwrap_or(0) & 0b0011_1111);
            let cv18 = u16::from(cv.read(CV_LONG_ADDR_L).unwrap_or(0));
            (cv17 << 8) + cv18
        } else {
            u16::from(cv.read(CV_MY_ADDR_L).unwrap_or(0) & 0b0111_1111)
        };
        // Loco address 0 is invalid.
        if address == 0 { DEFAULT_LOCO_ADDRESS } else { address }
    }
}

/// True while the decoder address has not been programmed yet.
///
/// Feedback-group decoders check CV10 (the RS-bus address); all others check
/// the top bit of CV9.
pub fn address_not_set(cv: &CvStore) -> bool {
    if cv.decoder_type().is_feedback_group() {
        cv.read(CV_MY_RS_ADDR).unwrap_or(0) == 0
    } else {
        cv.read(CV_MY_ADDR_H).unwrap_or(0x80) == 0x80
    }
}

/// The loco address on which this decoder accepts PoM commands.
///
/// The address equals a per-family offset plus the decoder's own address, so
/// PoM tooling can reach every decoder on the layout without clashing with
/// real locos. An unprogrammed decoder listens just below (or at) the
/// offset.
pub fn pom_address(cv: &CvStore) -> u16 {
    if cv.decoder_type().is_feedback_group() {
        if address_not_set(cv) {
            POM_OFFSET_FEEDBACK_GROUP
        } else {
            POM_OFFSET_FEEDBACK_GROUP + u16::from(cv.read(CV_MY_RS_ADDR).unwrap_or(0))
        }
    } else if address_not_set(cv) {
        POM_OFFSET_OTHER - 1
    } else {
        POM_OFFSET_OTHER + stored_address(cv)
    }
}

/// Stores the addresses carried by an accessory command received while the
/// decoder is in address-programming mode.
///
/// CV1/CV9 take the output or decoder address (not for feedback-group
/// decoders, whose accessory address is irrelevant); CV10 takes the decoder
/// address plus one, or the output address for feedback-group decoders.
/// RS-bus addresses above 127 cannot exist, so such addresses store 0.
pub fn program_address(cv: &mut CvStore, command: &AccessoryCommand) {
    let cv29 = cv.read(CV_CONFIG).unwrap_or(0);
    if cv29 & CONFIG_ACCESSORY == 0 {
        return;
    }
    info!(
        "Programming decoder address {} / output address {}",
        command.decoder_address, command.output_address
    );
    if !cv.decoder_type().is_feedback_group() {
        let (cv1, cv9) = if cv29 & CONFIG_OUTPUT_ADDRESSING != 0 {
            // Received output addresses range 1..1024 (LZV100) / 1..2048.
            (
                (command.output_address & 0xFF) as u8,
                ((command.output_address >> 8) & 0b0000_0111) as u8,
            )
        } else {
            // Received decoder addresses range 0..255 (LZV100) / 0..511,
            // while CV1 starts from 1.
            let stored = command.decoder_address + 1;
            (
                (stored & 0b0011_1111) as u8,
                ((stored >> 6) & 0b0000_0111) as u8,
            )
        };
        let _ = cv.write(CV_MY_ADDR_L, cv1);
        let _ = cv.write(CV_MY_ADDR_H, cv9);
    }
    let rs_address = if cv.decoder_type().is_feedback_group() {
        if command.output_address < 128 { command.output_address as u8 } else { 0 }
    } else {
        // The decoder address goes into CV10 even under output addressing.
        if command.decoder_address < 128 { (command.decoder_address + 1) as u8 } else { 0 }
    };
    let _ = cv.write(CV_MY_RS_ADDR, rs_address);
}
