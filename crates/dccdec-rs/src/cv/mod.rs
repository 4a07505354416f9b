//! The Configuration Variable (CV) table.
//!
//! CVs are the decoder's persistent configuration, stored in a 65-slot byte
//! table in EEPROM. Slot 0 holds an initialisation marker; slots 1..=64 hold
//! CV1..CV64 directly, so CV numbers double as storage addresses.

pub mod access;
pub mod defaults;
pub mod names;

use crate::hal::CvStorage;
use crate::types::{DecoderError, DecoderType};
use defaults::CvDefaults;
use log::{info, warn};

/// Size of the CV table, including the marker at slot 0.
pub const CV_COUNT: usize = 65;

/// Highest valid CV number.
pub const MAX_CV: u16 = 64;

/// Value of slot 0 once the table has been initialised.
///
/// Erased EEPROM reads as 0xFF (or 0x00 after a bulk clear); the alternating
/// bit pattern matches neither, so a virgin chip is detected reliably.
pub const INITIALIZED_MARKER: u8 = 0b0101_0101;

/// The persistent CV table, bound to a storage backend.
///
/// Reads and writes pass straight through to storage. The decoder caches
/// nothing here: CV access is rare (startup plus the occasional programming
/// command), and reading through keeps PoM read-back honest.
pub struct CvStore<'a> {
    storage: &'a mut dyn CvStorage,
    defaults: CvDefaults,
}

impl<'a> CvStore<'a> {
    /// Binds the CV table to its storage backend.
    ///
    /// Call [`init`](Self::init) afterwards to populate a virgin EEPROM;
    /// `new` itself never writes, so the embedding application can still
    /// override single defaults in between.
    pub fn new(storage: &'a mut dyn CvStorage, defaults: CvDefaults) -> Self {
        Self { storage, defaults }
    }

    /// True once the default table has been written to storage.
    pub fn is_initialized(&self) -> bool {
        self.storage.read(0) == INITIALIZED_MARKER
    }

    /// Writes the default table to storage if slot 0 lacks the marker.
    ///
    /// Returns `true` if defaults were written (first boot).
    pub fn init(&mut self) -> bool {
        if self.is_initialized() {
            return false;
        }
        info!("Virgin EEPROM detected, writing CV defaults");
        self.restore_defaults();
        true
    }

    /// Unconditionally overwrites all 65 slots with the default table.
    pub fn restore_defaults(&mut self) {
        info!("Restoring CV factory defaults");
        for (slot, value) in self.defaults.as_slice().iter().enumerate() {
            self.storage.update(slot as u16, *value);
        }
    }

    /// Reads a CV from storage.
    pub fn read(&self, cv: u16) -> Result<u8, DecoderError> {
        if cv == 0 || cv > MAX_CV {
            return Err(DecoderError::CvOutOfRange(cv));
        }
        Ok(self.storage.read(cv))
    }

    /// Writes a CV to storage.
    ///
    /// Values are stored as-is; range checks beyond the table bound are the
    /// caller's concern. Read-only and action CVs are enforced by the
    /// protocol handler, not here, so the embedding application retains full
    /// access (e.g. to persist diagnostic counters).
    pub fn write(&mut self, cv: u16, value: u8) -> Result<(), DecoderError> {
        if cv == 0 || cv > MAX_CV {
            return Err(DecoderError::CvOutOfRange(cv));
        }
        self.storage.update(cv, value);
        Ok(())
    }

    /// The decoder type from CV27.
    ///
    /// Falls back to [`DecoderType::Switch`] when CV27 holds an unknown
    /// byte, so a corrupted table still yields a working (if plain) decoder.
    pub fn decoder_type(&self) -> DecoderType {
        let raw = self.storage.read(names::CV_DEC_TYPE);
        match DecoderType::try_from(raw) {
            Ok(t) => t,
            Err(_) => {
                warn!("CV27 holds unknown decoder type {raw:#04x}, assuming switch decoder");
                DecoderType::Switch
            }
        }
    }

    /// Access to the in-RAM default table, for application overrides before
    /// the first [`init`](Self::init).
    pub fn defaults_mut(&mut self) -> &mut CvDefaults {
        &mut self.defaults
    }

    /// The default value for a single CV.
    pub fn default_for(&self, cv: u16) -> Result<u8, DecoderError> {
        if cv == 0 || cv > MAX_CV {
            return Err(DecoderError::CvOutOfRange(cv));
        }
        Ok(self.defaults.get(cv))
    }
}
