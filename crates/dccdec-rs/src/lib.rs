#![cfg_attr(not(feature = "std"), no_std)]

//! Platform-agnostic core of a DCC accessory decoder.
//!
//! The crate covers the parts every decoder board shares: the persistent CV
//! table with its per-type defaults, address resolution, the CV-access
//! protocol (Service Mode and PoM), the status LED, the programming button
//! and the cooperative main-loop scheduler. Hardware access goes through the
//! traits in [`hal`]; the application supplies implementations for its
//! platform and feeds decoded DCC commands into [`DecoderHardware`].

#[cfg(test)]
extern crate std;

// --- Foundation Modules ---
pub mod hal;
pub mod types;

// --- Configuration ---
pub mod address;
pub mod cv;

// --- Peripherals ---
pub mod button;
pub mod led;
pub mod relay;

// --- Workflows and Scheduling ---
pub mod decoder;
pub mod prog;

// --- Top-level Exports ---
pub use cv::defaults::CvDefaults;
pub use cv::CvStore;
pub use decoder::DecoderHardware;
pub use hal::{Clock, CvStorage, DccPort, DigitalInput, DigitalOutput, Restart, RsBusPort};
pub use led::DecoderLed;
pub use relay::{BistableRelay, RelayPosition};
pub use types::{AccessoryCommand, CvAccessCommand, DccCommand, DecoderError, DecoderType};
