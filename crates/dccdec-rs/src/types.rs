use core::convert::TryFrom;
use core::fmt;

// --- Protocol Constants ---

/// Address value reported when the decoder address has not been programmed yet.
pub const UNCONFIGURED_ADDRESS: u16 = 0xFFFF;

/// Multi-function (loco) decoders may not use address 0; it maps to this default.
pub const DEFAULT_LOCO_ADDRESS: u16 = 3;

/// RS-bus address reserved for feedback on PoM verify-byte commands.
pub const POM_FEEDBACK_RS_ADDRESS: u8 = 128;

/// Magic byte which, when written to CV8 (vendor ID), restores factory defaults.
pub const RESET_MAGIC: u8 = 0x0D;

/// Vendor ID of a DIY decoder (NMRA assignment 0x0D).
pub const VENDOR_ID_DIY: u8 = 0x0D;

/// Represents the decoder type stored in CV27, wrapping the raw byte in an enum.
///
/// The decoder type selects the CV default table and decides how the CV slots
/// from 33 upward are interpreted (they are deliberately reused across types
/// to save EEPROM space).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DecoderType {
    /// Switch (turnout) decoder.
    Switch = 0b0001_0000,
    /// Switch decoder with emergency-stop board.
    SwitchWithEmergency = 0b0001_0001,
    /// Decoder for servos.
    Servo = 0b0001_0100,
    /// Lift decoder.
    Lift = 0b0001_1000,
    /// Relays decoder for 4 relays.
    Relays4 = 0b0010_0000,
    /// Relays decoder for 16 relays.
    Relays16 = 0b0010_0001,
    /// Track occupancy (GBM) decoder.
    TrackOccupancy = 0b0011_0000,
    /// Track occupancy decoder with reverser.
    TrackOccupancyWithReverser = 0b0011_0001,
    /// Track occupancy decoder with relays.
    TrackOccupancyWithRelays = 0b0011_0010,
    /// Track occupancy decoder with speed measurement.
    TrackOccupancyWithSpeed = 0b0011_0100,
    /// Function decoder.
    Function = 0b0100_0000,
    /// Watchdog and safety decoder.
    Safety = 0b1000_0000,
    /// 24-channel IO decoder for the TMC.
    Tmc24ChannelIo = 0b1100_0001,
}

impl DecoderType {
    /// True for the track-occupancy (GBM) family of decoder types.
    ///
    /// Feedback-group decoders use the RS-bus address (CV10), not the
    /// accessory address, as their primary "configured" indicator.
    pub fn is_feedback_group(self) -> bool {
        matches!(
            self,
            DecoderType::TrackOccupancy
                | DecoderType::TrackOccupancyWithReverser
                | DecoderType::TrackOccupancyWithRelays
                | DecoderType::TrackOccupancyWithSpeed
        )
    }
}

impl TryFrom<u8> for DecoderType {
    type Error = DecoderError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b0001_0000 => Ok(DecoderType::Switch),
            0b0001_0001 => Ok(DecoderType::SwitchWithEmergency),
            0b0001_0100 => Ok(DecoderType::Servo),
            0b0001_1000 => Ok(DecoderType::Lift),
            0b0010_0000 => Ok(DecoderType::Relays4),
            0b0010_0001 => Ok(DecoderType::Relays16),
            0b0011_0000 => Ok(DecoderType::TrackOccupancy),
            0b0011_0001 => Ok(DecoderType::TrackOccupancyWithReverser),
            0b0011_0010 => Ok(DecoderType::TrackOccupancyWithRelays),
            0b0011_0100 => Ok(DecoderType::TrackOccupancyWithSpeed),
            0b0100_0000 => Ok(DecoderType::Function),
            0b1000_0000 => Ok(DecoderType::Safety),
            0b1100_0001 => Ok(DecoderType::Tmc24ChannelIo),
            _ => Err(DecoderError::InvalidDecoderType(value)),
        }
    }
}

impl From<DecoderType> for u8 {
    /// Converts a `DecoderType` back into its CV27 byte representation.
    fn from(decoder_type: DecoderType) -> Self {
        decoder_type as u8
    }
}

/// Defines a portable, descriptive error type for the decoder core.
///
/// Note that runtime CV-access handling never surfaces errors (out-of-range
/// requests are silently ignored, see the protocol handler); this type covers
/// construction and conversion failures only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderError {
    /// The CV27 byte is not a known decoder type.
    InvalidDecoderType(u8),
    /// A CV index lies outside the 65-slot table.
    CvOutOfRange(u16),
}

impl fmt::Display for DecoderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDecoderType(v) => write!(f, "Invalid decoder type value: {v:#04x}"),
            Self::CvOutOfRange(v) => write!(f, "CV number {v} exceeds the CV table"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecoderError {}

// --- Decoded DCC command events ---

/// An accessory command as decoded by the DCC front end.
///
/// Carries both addressing views of the same wire command: the decoder
/// address (RCN-213 "basic accessory", 0..511) and the output address
/// (1..2047). Which one applies is decided by CV29 bit 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessoryCommand {
    pub decoder_address: u16,
    pub output_address: u16,
}

/// The requested CV-access operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvOperation {
    /// Compare the stored byte against the payload (SM); read-back (PoM).
    VerifyByte,
    /// Store the payload byte, subject to the special-CV rules.
    WriteByte,
    /// Set or clear a single bit of the stored byte.
    WriteBit { bit: u8, value: bool },
    /// Check a single bit of the stored byte.
    VerifyBit { bit: u8, value: bool },
}

/// Whether a CV-access command arrived in Service Mode or via PoM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvAccessMode {
    /// Service Mode: CV access on the dedicated programming track.
    ServiceMode,
    /// Programming on Main: CV access during normal operation.
    ProgrammingOnMain,
}

/// A decoded CV-access command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CvAccessCommand {
    /// Target CV number (1-based).
    pub number: u16,
    /// Payload byte. Ignored for bit operations.
    pub value: u8,
    pub operation: CvOperation,
}

impl CvAccessCommand {
    /// Applies a write-bit operation to the current stored byte.
    ///
    /// The bit position on the wire is a 3-bit field; larger indices are
    /// masked down rather than overflowing the shift.
    pub fn write_bit(&self, current: u8) -> u8 {
        match self.operation {
            CvOperation::WriteBit { bit, value: true } => current | (1 << (bit & 0b111)),
            CvOperation::WriteBit { bit, value: false } => current & !(1 << (bit & 0b111)),
            _ => current,
        }
    }

    /// Checks a verify-bit operation against the current stored byte.
    pub fn verify_bit(&self, current: u8) -> bool {
        match self.operation {
            CvOperation::VerifyBit { bit, value } => {
                ((current >> (bit & 0b111)) & 1 != 0) == value
            }
            _ => false,
        }
    }
}

/// A decoded DCC command event, as delivered by the (external) DCC front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DccCommand {
    /// Accessory command addressed at this decoder.
    MyAccessory(AccessoryCommand),
    /// Accessory command addressed at any decoder (broadcast).
    AnyAccessory(AccessoryCommand),
    /// CV-access command received on the main track (PoM) for our address.
    MyPom(CvAccessCommand),
    /// CV-access command received on the programming track.
    ServiceMode(CvAccessCommand),
}
