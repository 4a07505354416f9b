//! Simulation backends for the decoder HAL.
//!
//! These types stand in for the board peripherals when the decoder core runs
//! on a desktop: an EEPROM that can persist to a file, observable pins, a
//! wall-clock [`Clock`] and recording DCC/RS-bus ports. They are meant for
//! interactive experiments and longer-running simulations; unit tests inside
//! the core crate carry their own, smaller fakes.

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use dccdec_rs::cv::CV_COUNT;
use dccdec_rs::{Clock, CvStorage, DccPort, DigitalInput, DigitalOutput, Restart, RsBusPort};
use log::{debug, info};

/// An EEPROM image, optionally backed by a file on disk.
///
/// Reads and writes operate on the in-memory image; [`save`](Self::save)
/// writes the image back to the backing file, so a simulated decoder can
/// keep its CV table across runs the way real hardware does.
pub struct SimEeprom {
    cells: [u8; CV_COUNT],
    path: Option<PathBuf>,
}

impl SimEeprom {
    /// A virgin EEPROM: all cells read as 0xFF.
    pub fn new() -> Self {
        Self { cells: [0xFF; CV_COUNT], path: None }
    }

    /// Loads the image from `path`, or starts virgin if the file is missing.
    pub fn with_file(path: &Path) -> io::Result<Self> {
        let mut eeprom = Self::new();
        eeprom.path = Some(path.to_path_buf());
        match fs::read(path) {
            Ok(bytes) => {
                for (cell, byte) in eeprom.cells.iter_mut().zip(bytes.iter()) {
                    *cell = *byte;
                }
                info!("Loaded EEPROM image from {}", path.display());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No EEPROM image at {}, starting virgin", path.display());
            }
            Err(e) => return Err(e),
        }
        Ok(eeprom)
    }

    /// Writes the image to the backing file, if one was configured.
    pub fn save(&self) -> io::Result<()> {
        if let Some(path) = &self.path {
            fs::write(path, self.cells)?;
        }
        Ok(())
    }
}

impl Default for SimEeprom {
    fn default() -> Self {
        Self::new()
    }
}

impl CvStorage for SimEeprom {
    fn read(&self, address: u16) -> u8 {
        self.cells[address as usize]
    }

    fn update(&mut self, address: u16, value: u8) {
        if self.cells[address as usize] != value {
            self.cells[address as usize] = value;
        }
    }
}

/// A shared pin level, observable from outside the decoder.
#[derive(Clone)]
pub struct PinHandle {
    level: Rc<Cell<bool>>,
}

impl PinHandle {
    pub fn new() -> Self {
        Self { level: Rc::new(Cell::new(false)) }
    }

    pub fn get(&self) -> bool {
        self.level.get()
    }

    pub fn set(&self, level: bool) {
        self.level.set(level);
    }
}

impl Default for PinHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// An output pin (LED, relay coil) whose level a test or UI can observe
/// through a cloned [`PinHandle`].
pub struct SimOutputPin {
    handle: PinHandle,
}

impl SimOutputPin {
    pub fn new(handle: PinHandle) -> Self {
        Self { handle }
    }
}

impl DigitalOutput for SimOutputPin {
    fn write(&mut self, level: bool) {
        self.handle.set(level);
    }

    fn read(&self) -> bool {
        self.handle.get()
    }
}

/// An input pin (button) driven from outside through a cloned [`PinHandle`].
pub struct SimInputPin {
    handle: PinHandle,
}

impl SimInputPin {
    pub fn new(handle: PinHandle) -> Self {
        Self { handle }
    }
}

impl DigitalInput for SimInputPin {
    fn read(&self) -> bool {
        self.handle.get()
    }
}

/// Wall-clock time source backed by [`Instant`].
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }

    fn delay_ms(&self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

/// DCC port that records its configuration and counts acknowledgements.
#[derive(Default)]
pub struct SimDccPort {
    pub acks: usize,
    pub accessory_address: Option<u16>,
    pub pom_address: Option<u16>,
    pub command_station: Option<u8>,
    pub checksum_errors: u8,
}

impl DccPort for SimDccPort {
    fn send_ack(&mut self) {
        debug!("DCC ACK pulse");
        self.acks += 1;
    }

    fn checksum_errors(&self) -> u8 {
        self.checksum_errors
    }

    fn set_accessory_address(&mut self, address: u16) {
        info!("DCC front end listening on accessory address {address}");
        self.accessory_address = Some(address);
    }

    fn set_pom_address(&mut self, address: u16) {
        info!("DCC front end listening on PoM address {address}");
        self.pom_address = Some(address);
    }

    fn set_command_station(&mut self, kind: u8) {
        self.command_station = Some(kind);
    }
}

/// RS-bus port that records the PoM feedback bytes.
#[derive(Default)]
pub struct SimRsBusPort {
    pub polls: usize,
    pub pom_buffer_checks: usize,
    pub sent: Vec<u8>,
    pub parity_errors: u8,
    pub pulse_count_errors: u8,
}

impl RsBusPort for SimRsBusPort {
    fn check_polling(&mut self) {
        self.polls += 1;
    }

    fn check_pom_buffer(&mut self) {
        self.pom_buffer_checks += 1;
    }

    fn send_pom_byte(&mut self, value: u8) {
        debug!("PoM feedback byte {value:#04x}");
        self.sent.push(value);
    }

    fn parity_errors(&self) -> u8 {
        self.parity_errors
    }

    fn pulse_count_errors(&self) -> u8 {
        self.pulse_count_errors
    }
}

/// Restart port that raises a flag; the simulation driver re-creates the
/// decoder when it sees the flag set.
#[derive(Clone, Default)]
pub struct SimRestart {
    requested: Rc<Cell<bool>>,
}

impl SimRestart {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a restart was requested; clears the flag.
    pub fn take_request(&self) -> bool {
        self.requested.replace(false)
    }
}

impl Restart for SimRestart {
    fn restart(&mut self) {
        info!("Decoder restart requested");
        self.requested.set(true);
    }
}
