//! Startup and the cooperative main-loop scheduler.
//!
//! [`DecoderHardware`] ties the CV table, the status LED, the programming
//! button and the CV-access handler to the platform ports. The application
//! calls [`update`](DecoderHardware::update) from its main loop as often as
//! possible and feeds every decoded DCC command into
//! [`process`](DecoderHardware::process); everything else happens in here.

use crate::address;
use crate::button::PushButton;
use crate::cv::access::CvAccessHandler;
use crate::cv::defaults::CvDefaults;
use crate::cv::names::CV_CMD_STATION;
use crate::cv::CvStore;
use crate::hal::{Clock, CvStorage, DccPort, DigitalInput, DigitalOutput, Restart, RsBusPort};
use crate::led::DecoderLed;
use crate::prog::ProgButtonWorkflow;
use crate::relay::BistableRelay;
use crate::types::{AccessoryCommand, CvAccessMode, DccCommand};
use log::info;

/// Period of the slow path. RS-bus polling runs on every loop iteration;
/// everything else (PoM buffer, button, LED) is gated to this period to keep
/// the loop cheap.
pub const SLOW_TICK_MS: u32 = 20;

/// Settle time after attaching the programming button, before its first
/// sample. Input circuits with large pull-up capacitors need this long to
/// reach a stable level after power-up.
pub const BUTTON_SETTLE_MS: u32 = 500;

pub struct DecoderHardware<'a> {
    cv: CvStore<'a>,
    led: DecoderLed<'a>,
    button: PushButton<'a>,
    workflow: ProgButtonWorkflow,
    cv_access: CvAccessHandler,
    relay: Option<BistableRelay<'a>>,
    dcc: &'a mut dyn DccPort,
    rsbus: &'a mut dyn RsBusPort,
    restart: &'a mut dyn Restart,
    clock: &'a dyn Clock,
    last_slow_tick: u32,
}

impl<'a> DecoderHardware<'a> {
    pub fn new(
        storage: &'a mut dyn CvStorage,
        defaults: CvDefaults,
        led_pin: &'a mut dyn DigitalOutput,
        button_pin: &'a dyn DigitalInput,
        dcc: &'a mut dyn DccPort,
        rsbus: &'a mut dyn RsBusPort,
        restart: &'a mut dyn Restart,
        clock: &'a dyn Clock,
    ) -> Self {
        let now = clock.now_ms();
        Self {
            cv: CvStore::new(storage, defaults),
            led: DecoderLed::new(led_pin),
            button: PushButton::new(button_pin, now),
            workflow: ProgButtonWorkflow::new(),
            cv_access: CvAccessHandler::new(),
            relay: None,
            dcc,
            rsbus,
            restart,
            clock,
            last_slow_tick: now,
        }
    }

    /// Brings the decoder up. Call once from the application's setup code.
    ///
    /// Populates a virgin EEPROM with the CV defaults, lets the programming
    /// button settle and takes its first sample, configures the DCC front
    /// end with the stored addresses and command-station dialect, and starts
    /// the LED: two flashes when configured, slow blinking while the address
    /// still has to be programmed.
    pub fn init(&mut self) {
        self.cv.init();

        self.clock.delay_ms(BUTTON_SETTLE_MS);
        let now = self.clock.now_ms();
        self.last_slow_tick = now;
        self.button.read(now);

        let accessory = address::stored_address(&self.cv);
        let pom = address::pom_address(&self.cv);
        info!("Decoder up, accessory address {accessory}, PoM address {pom}");
        self.dcc.set_accessory_address(accessory);
        self.dcc.set_pom_address(pom);
        self.dcc
            .set_command_station(self.cv.read(CV_CMD_STATION).unwrap_or(1));

        if address::address_not_set(&self.cv) {
            self.led.flash_slow(now);
        } else {
            self.led.start_up(now);
        }
    }

    /// One scheduler pass. Call from the main loop as often as possible.
    ///
    /// RS-bus polling runs unconditionally; the PoM feedback buffer, the
    /// programming button and the LED pattern advance once per 20 ms.
    pub fn update(&mut self) {
        self.rsbus.check_polling();
        let now = self.clock.now_ms();
        if now.wrapping_sub(self.last_slow_tick) < SLOW_TICK_MS {
            return;
        }
        self.last_slow_tick = now;
        self.rsbus.check_pom_buffer();
        self.workflow.tick(
            &mut self.button,
            &mut self.led,
            &mut self.cv,
            self.clock,
            &mut *self.restart,
            now,
        );
        self.led.update(now);
        if let Some(relay) = &mut self.relay {
            relay.update(now);
        }
    }

    /// Feeds one decoded DCC command into the core.
    ///
    /// Returns the accessory command when the application should act on it
    /// (drive its coils, relays or servos); `None` when the core consumed
    /// the command or it does not concern this decoder.
    pub fn process(&mut self, command: &DccCommand) -> Option<AccessoryCommand> {
        match command {
            DccCommand::MyAccessory(cmd) => {
                if self.consume_for_programming(cmd) {
                    return None;
                }
                Some(*cmd)
            }
            DccCommand::AnyAccessory(cmd) => {
                // Relevant only while address programming is armed.
                self.consume_for_programming(cmd);
                None
            }
            DccCommand::MyPom(cmd) => {
                self.cv_access.process(
                    cmd,
                    CvAccessMode::ProgrammingOnMain,
                    &mut self.cv,
                    &mut *self.dcc,
                    &mut *self.rsbus,
                    &mut self.led,
                    &mut *self.restart,
                    self.clock.now_ms(),
                );
                None
            }
            DccCommand::ServiceMode(cmd) => {
                self.cv_access.process(
                    cmd,
                    CvAccessMode::ServiceMode,
                    &mut self.cv,
                    &mut *self.dcc,
                    &mut *self.rsbus,
                    &mut self.led,
                    &mut *self.restart,
                    self.clock.now_ms(),
                );
                None
            }
        }
    }

    fn consume_for_programming(&mut self, cmd: &AccessoryCommand) -> bool {
        self.workflow
            .handle_accessory_command(cmd, &mut self.cv, self.clock, &mut *self.restart)
    }

    /// The CV table, for application reads.
    pub fn cv(&self) -> &CvStore<'a> {
        &self.cv
    }

    /// The CV table, for application writes (e.g. persisting diagnostics).
    pub fn cv_mut(&mut self) -> &mut CvStore<'a> {
        &mut self.cv
    }

    /// The status LED, so the application can signal activity and feedback.
    pub fn led_mut(&mut self) -> &mut DecoderLed<'a> {
        &mut self.led
    }

    /// Hands a relay to the scheduler; its hold timer then expires on the
    /// slow path without further application involvement.
    pub fn attach_relay(&mut self, relay: BistableRelay<'a>) {
        self.relay = Some(relay);
    }

    /// The attached relay, for activation on received accessory commands.
    pub fn relay_mut(&mut self) -> Option<&mut BistableRelay<'a>> {
        self.relay.as_mut()
    }

    /// True while the decoder waits for an address-programming command.
    pub fn is_programming(&self) -> bool {
        self.workflow.is_programming()
    }
}
