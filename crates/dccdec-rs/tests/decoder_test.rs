//! End-to-end scenarios for the decoder core, driven through fake hardware.
//!
//! Each scenario wires a `DecoderHardware` to in-memory pins, storage and
//! ports, runs the main loop the way a board's firmware would, and checks
//! the externally visible behaviour across simulated restarts.

use std::cell::Cell;

use dccdec_rs::cv::names::{CV_MY_ADDR_H, CV_MY_ADDR_L, CV_MY_RS_ADDR, CV_SEARCH, CV_VID};
use dccdec_rs::types::{
    AccessoryCommand, CvAccessCommand, CvOperation, DccCommand, DecoderType, RESET_MAGIC,
    UNCONFIGURED_ADDRESS,
};
use dccdec_rs::{
    BistableRelay, Clock, CvDefaults, CvStorage, DccPort, DecoderHardware, DigitalInput,
    DigitalOutput, RelayPosition, Restart, RsBusPort,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// --- Fake hardware ---

struct FakeEeprom {
    cells: [u8; 65],
}

impl FakeEeprom {
    fn new() -> Self {
        Self { cells: [0xFF; 65] }
    }
}

impl CvStorage for FakeEeprom {
    fn read(&self, address: u16) -> u8 {
        self.cells[address as usize]
    }

    fn update(&mut self, address: u16, value: u8) {
        if self.cells[address as usize] != value {
            self.cells[address as usize] = value;
        }
    }
}

struct FakePin {
    level: bool,
}

impl DigitalOutput for FakePin {
    fn write(&mut self, level: bool) {
        self.level = level;
    }

    fn read(&self) -> bool {
        self.level
    }
}

struct FakeButton {
    pressed: Cell<bool>,
}

impl DigitalInput for FakeButton {
    fn read(&self) -> bool {
        self.pressed.get()
    }
}

#[derive(Default)]
struct FakeDcc {
    acks: usize,
    accessory_address: Option<u16>,
    pom_address: Option<u16>,
    command_station: Option<u8>,
}

impl DccPort for FakeDcc {
    fn send_ack(&mut self) {
        self.acks += 1;
    }

    fn checksum_errors(&self) -> u8 {
        0
    }

    fn set_accessory_address(&mut self, address: u16) {
        self.accessory_address = Some(address);
    }

    fn set_pom_address(&mut self, address: u16) {
        self.pom_address = Some(address);
    }

    fn set_command_station(&mut self, kind: u8) {
        self.command_station = Some(kind);
    }
}

#[derive(Default)]
struct FakeRsBus {
    polls: usize,
    pom_buffer_checks: usize,
    sent: Vec<u8>,
}

impl RsBusPort for FakeRsBus {
    fn check_polling(&mut self) {
        self.polls += 1;
    }

    fn check_pom_buffer(&mut self) {
        self.pom_buffer_checks += 1;
    }

    fn send_pom_byte(&mut self, value: u8) {
        self.sent.push(value);
    }

    fn parity_errors(&self) -> u8 {
        0
    }

    fn pulse_count_errors(&self) -> u8 {
        0
    }
}

#[derive(Default)]
struct FakeRestart {
    requests: usize,
}

impl Restart for FakeRestart {
    fn restart(&mut self) {
        self.requests += 1;
    }
}

struct FakeClock {
    now: Cell<u32>,
}

impl FakeClock {
    fn new() -> Self {
        Self { now: Cell::new(0) }
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }

    fn delay_ms(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

struct Board {
    eeprom: FakeEeprom,
    led: FakePin,
    button: FakeButton,
    dcc: FakeDcc,
    rsbus: FakeRsBus,
    restart: FakeRestart,
    clock: FakeClock,
}

impl Board {
    fn new() -> Self {
        Self {
            eeprom: FakeEeprom::new(),
            led: FakePin { level: false },
            button: FakeButton { pressed: Cell::new(false) },
            dcc: FakeDcc::default(),
            rsbus: FakeRsBus::default(),
            restart: FakeRestart::default(),
            clock: FakeClock::new(),
        }
    }
}

macro_rules! boot {
    ($board:ident) => {{
        let mut decoder = DecoderHardware::new(
            &mut $board.eeprom,
            CvDefaults::new(DecoderType::Switch, 10),
            &mut $board.led,
            &$board.button,
            &mut $board.dcc,
            &mut $board.rsbus,
            &mut $board.restart,
            &$board.clock,
        );
        decoder.init();
        decoder
    }};
}

/// Runs the main loop for `ms` simulated milliseconds.
fn run_for(decoder: &mut DecoderHardware<'_>, clock: &FakeClock, ms: u32) {
    for _ in 0..ms {
        clock.now.set(clock.now.get().wrapping_add(1));
        decoder.update();
    }
}

fn sm_write(number: u16, value: u8) -> DccCommand {
    DccCommand::ServiceMode(CvAccessCommand { number, value, operation: CvOperation::WriteByte })
}

fn pom_write(number: u16, value: u8) -> DccCommand {
    DccCommand::MyPom(CvAccessCommand { number, value, operation: CvOperation::WriteByte })
}

fn pom_verify(number: u16) -> DccCommand {
    DccCommand::MyPom(CvAccessCommand { number, value: 0, operation: CvOperation::VerifyByte })
}

// --- Scenarios ---

#[test]
fn first_boot_programs_address_and_survives_restart() {
    init_logger();
    let mut board = Board::new();

    {
        let mut decoder = boot!(board);
        // Fresh EEPROM: defaults written, decoder unconfigured, LED blinking.
        assert!(decoder.cv().is_initialized());
        run_for(&mut decoder, &board.clock, 50);
        assert!(decoder.led_mut().is_on());

        // Operator presses and releases the programming button.
        board.button.pressed.set(true);
        run_for(&mut decoder, &board.clock, 100);
        board.button.pressed.set(false);
        run_for(&mut decoder, &board.clock, 100);
        assert!(decoder.is_programming());

        // The handheld throws turnout 21, i.e. decoder address 5.
        let cmd = AccessoryCommand { decoder_address: 5, output_address: 21 };
        assert_eq!(decoder.process(&DccCommand::AnyAccessory(cmd)), None);
        assert_eq!(decoder.cv().read(CV_MY_ADDR_L).unwrap(), 6);
        assert_eq!(decoder.cv().read(CV_MY_ADDR_H).unwrap(), 0);
        assert_eq!(decoder.cv().read(CV_MY_RS_ADDR).unwrap(), 6);
    }
    assert_eq!(board.dcc.accessory_address, Some(UNCONFIGURED_ADDRESS));
    assert_eq!(board.dcc.pom_address, Some(6999));
    assert_eq!(board.restart.requests, 1);

    // After the restart the decoder listens on its new addresses.
    {
        let mut decoder = boot!(board);
        let cmd = AccessoryCommand { decoder_address: 5, output_address: 21 };
        assert_eq!(decoder.process(&DccCommand::MyAccessory(cmd)), Some(cmd));
    }
    assert_eq!(board.dcc.accessory_address, Some(5));
    assert_eq!(board.dcc.pom_address, Some(7005));
}

#[test]
fn cv8_magic_write_restores_factory_state() {
    init_logger();
    let mut board = Board::new();

    {
        let mut decoder = boot!(board);
        decoder.process(&sm_write(CV_MY_ADDR_L, 6));
        decoder.process(&sm_write(CV_MY_ADDR_H, 0));

        // A wrong value leaves everything alone.
        decoder.process(&sm_write(CV_VID, 0x42));
        assert_eq!(decoder.cv().read(CV_MY_ADDR_L).unwrap(), 6);

        decoder.process(&sm_write(CV_VID, RESET_MAGIC));
        assert_eq!(decoder.cv().read(CV_MY_ADDR_L).unwrap(), 0x01);
        assert_eq!(decoder.cv().read(CV_MY_ADDR_H).unwrap(), 0x80);
    }
    assert_eq!(board.restart.requests, 1);
    // Two plain writes acked, plus the ack of the reset itself.
    assert_eq!(board.dcc.acks, 3);

    // After the restart the decoder is unconfigured again.
    {
        let _decoder = boot!(board);
    }
    assert_eq!(board.dcc.accessory_address, Some(UNCONFIGURED_ADDRESS));
    assert_eq!(board.dcc.pom_address, Some(6999));
}

#[test]
fn long_press_resets_to_factory_defaults() {
    init_logger();
    let mut board = Board::new();

    {
        let mut decoder = boot!(board);
        decoder.process(&sm_write(CV_MY_ADDR_L, 6));
        decoder.process(&sm_write(CV_MY_ADDR_H, 0));

        // A real restart never returns, so the loop ends at the reset.
        board.button.pressed.set(true);
        run_for(&mut decoder, &board.clock, 5020);
    }
    assert_eq!(board.restart.requests, 1);
    assert_eq!(board.eeprom.cells[CV_MY_ADDR_L as usize], 0x01);
    assert_eq!(board.eeprom.cells[CV_MY_ADDR_H as usize], 0x80);
    assert!(!board.led.level);
}

#[test]
fn startup_waits_for_the_button_input_to_settle() {
    init_logger();
    let mut board = Board::new();
    {
        let _decoder = boot!(board);
    }
    // The only time spent in init() is the button settle delay.
    assert_eq!(board.clock.now.get(), dccdec_rs::decoder::BUTTON_SETTLE_MS);
}

#[test]
fn search_function_blinks_until_cleared() {
    init_logger();
    let mut board = Board::new();
    let mut decoder = boot!(board);

    decoder.process(&pom_write(CV_SEARCH, 1));
    assert!(decoder.led_mut().is_on());

    // The flag answers live, and is never persisted.
    decoder.process(&pom_verify(CV_SEARCH));
    decoder.process(&pom_write(CV_SEARCH, 0));
    decoder.process(&pom_verify(CV_SEARCH));
    assert!(!decoder.led_mut().is_on());
    drop(decoder);
    assert_eq!(board.rsbus.sent, [1, 0]);
    assert_eq!(board.eeprom.cells[CV_SEARCH as usize], 0);
}

#[test]
fn pom_verify_reads_back_stored_values() {
    init_logger();
    let mut board = Board::new();
    let mut decoder = boot!(board);

    decoder.process(&pom_write(CV_MY_ADDR_L, 6));
    decoder.process(&pom_verify(CV_MY_ADDR_L));
    decoder.process(&pom_verify(CV_VID));
    drop(decoder);
    assert_eq!(board.rsbus.sent, [6, 0x0D]);
    // PoM never acks on the track.
    assert_eq!(board.dcc.acks, 0);
}

#[test]
fn attached_relay_is_released_by_the_scheduler() {
    init_logger();
    let mut board = Board::new();
    let mut coil1 = FakePin { level: false };
    let mut coil2 = FakePin { level: false };

    {
        let mut decoder = boot!(board);
        decoder.attach_relay(BistableRelay::new(&mut coil1, &mut coil2, 2));

        let now = board.clock.now.get();
        let relay = decoder.relay_mut().unwrap();
        relay.activate(RelayPosition::Pos1, now);
        assert_eq!(relay.position(), RelayPosition::Pos1);

        // 2 steps of 20 ms hold time; well past it after 100 ms of loop.
        run_for(&mut decoder, &board.clock, 100);
        assert_eq!(decoder.relay_mut().unwrap().position(), RelayPosition::Pos1);
    }
    assert!(!coil1.level);
    assert!(!coil2.level);
}

#[test]
fn polling_runs_every_iteration_but_slow_path_every_20_ms() {
    init_logger();
    let mut board = Board::new();
    let mut decoder = boot!(board);
    run_for(&mut decoder, &board.clock, 200);
    drop(decoder);
    assert_eq!(board.rsbus.polls, 200);
    assert_eq!(board.rsbus.pom_buffer_checks, 10);
}
