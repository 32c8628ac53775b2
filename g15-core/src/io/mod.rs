//! The I/O subsystem: device registration, initiation, cancellation, and
//! the cooperative scheduling that shares drum word-times between the
//! processor and whichever device is active.
//!
//! A device is anything that can supply incoming codes or accept outgoing
//! ones, looked up by its I/O code — the trait is deliberately narrow since
//! physical device emulation itself is out of scope here; `service` owns
//! the drum-side conversion (`format`/`input`) and only hands the device
//! the device-facing codes.

pub mod format;
pub mod input;

use std::collections::HashMap;

use log::{info, warn};

use crate::drum::Drum;
use crate::processor::Processor;

/// Result of one device decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    /// The device still has work; call it again at the next decision point.
    Continue,
    /// The operation is complete; `finish_io` should run.
    Finished,
    /// No tape/input available. Stays formally busy until `cancel_io`.
    Hung,
}

/// Which way data moves for a given [`IoCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoDirection {
    /// The device supplies codes that land on the drum.
    Input,
    /// The drum's data is formatted into codes the device consumes.
    Output,
    /// Backs the active device up one block; no code exchange.
    ReverseBlock,
}

/// The narrow interface every physical device (paper-tape reader/punch,
/// typewriter, card reader, magnetic tape) implements. Device emulation
/// itself is out of scope here — this crate only needs the contract.
pub trait Device {
    /// Supplies the next incoming code for a read-direction operation.
    /// `None` means nothing is ready yet (no tape loaded, no key typed);
    /// the operation stays `Hung` until the caller cancels it.
    fn next_input_code(&mut self) -> Option<input::InputCode>;
    /// Accepts one line's worth of already-formatted output codes.
    fn accept_output(&mut self, codes: &[format::OutputCode]) -> DeviceStatus;
    fn reverse_block(&mut self, drum: &mut Drum) -> DeviceStatus;
    fn cancel(&mut self);
}

/// OC (operation code): `0` is Ready; any other value names the in-progress
/// I/O code and also marks the processor busy.
pub const OC_READY: u32 = 0;

/// The line output staging passes through on its way to an output device,
/// and the line an input device's codes land on — the same convention
/// `io::input::reload` already uses for "a completed frame relays to 19".
const STAGING_LINE: u32 = 19;
/// The line an incoming device's raw codes precess onto before a completed
/// frame relays to [`STAGING_LINE`].
const INPUT_LINE: u32 = 23;

/// The sixteen `S∈0..15` device codes wired on the historical console.
/// Codes without a documented device are reserved; a caller using one is
/// logged and cancelled by [`initiate`], the same as an unregistered
/// device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum IoCommand {
    PhotoelectricRead = 0,
    PaperTapePunch = 1,
    TypewriterAr = 2,
    TypewriterLine19 = 3,
    TypewriterTypeIn = 4,
    CardReader = 5,
    CardPunch = 6,
    MagneticTapeForward = 7,
    MagneticTapeReverse = 8,
}

impl IoCommand {
    /// Which way data moves for this code.
    pub fn direction(self) -> IoDirection {
        match self {
            IoCommand::PhotoelectricRead
            | IoCommand::TypewriterTypeIn
            | IoCommand::CardReader
            | IoCommand::MagneticTapeForward => IoDirection::Input,
            IoCommand::PaperTapePunch
            | IoCommand::TypewriterAr
            | IoCommand::TypewriterLine19
            | IoCommand::CardPunch => IoDirection::Output,
            IoCommand::MagneticTapeReverse => IoDirection::ReverseBlock,
        }
    }
}

impl TryFrom<u32> for IoCommand {
    type Error = u32;

    fn try_from(code: u32) -> Result<Self, u32> {
        match code {
            0 => Ok(IoCommand::PhotoelectricRead),
            1 => Ok(IoCommand::PaperTapePunch),
            2 => Ok(IoCommand::TypewriterAr),
            3 => Ok(IoCommand::TypewriterLine19),
            4 => Ok(IoCommand::TypewriterTypeIn),
            5 => Ok(IoCommand::CardReader),
            6 => Ok(IoCommand::CardPunch),
            7 => Ok(IoCommand::MagneticTapeForward),
            8 => Ok(IoCommand::MagneticTapeReverse),
            other => Err(other),
        }
    }
}

pub struct IoState {
    pub devices: HashMap<u32, Box<dyn Device>>,
    pub oc: u32,
    pub canceled_io: bool,
    pub duplicate_io: bool,
    pub hung_io: bool,
    /// 0 off, 1 copy-to-punch, 2 rewind.
    pub punch_switch: u32,
    /// Typewriter commands accepted when true.
    pub enable_switch: bool,
}

impl IoState {
    pub fn new() -> Self {
        IoState {
            devices: HashMap::new(),
            oc: OC_READY,
            canceled_io: false,
            duplicate_io: false,
            hung_io: false,
            punch_switch: 0,
            enable_switch: false,
        }
    }

    pub fn busy(&self) -> bool {
        self.oc != OC_READY
    }
}

impl Default for IoState {
    fn default() -> Self {
        Self::new()
    }
}

/// D=31 S∈0..15: initiates the device operation named by `s_code`. A
/// re-initiation of the code already in progress is coalesced into
/// `duplicate_io` rather than starting a second operation.
pub fn initiate(p: &mut Processor, s_code: u32) {
    if p.io.busy() && p.io.oc == s_code {
        p.io.duplicate_io = true;
        info!("duplicate I/O initiation for code {s_code}, coalesced");
        return;
    }

    if !p.io.devices.contains_key(&s_code) {
        warn!("unimplemented I/O code {s_code}; cancelling as a no-op");
        p.io.canceled_io = true;
        return;
    }

    p.io.oc = s_code;
    p.drum.io_start();
}

/// Runs one decision point of the active device, if any. Call this from
/// wherever owns the event loop (the core doesn't run its own background
/// thread — the caller's loop drives it, not a thread this crate spawns).
pub fn service(p: &mut Processor) {
    if !p.io.devices.contains_key(&p.io.oc) {
        return;
    }

    if p.io.canceled_io {
        if let Some(device) = p.io.devices.get_mut(&p.io.oc) {
            device.cancel();
        }
        finish_io(p);
        return;
    }

    let Ok(cmd) = IoCommand::try_from(p.io.oc) else {
        warn!("servicing reserved I/O code {}; nothing to dispatch", p.io.oc);
        return;
    };

    let status = match cmd.direction() {
        IoDirection::Input => service_input(p),
        IoDirection::Output => service_output(p, cmd),
        IoDirection::ReverseBlock => {
            let device = p.io.devices.get_mut(&p.io.oc).expect("checked above");
            device.reverse_block(&mut p.drum)
        }
    };

    match status {
        DeviceStatus::Continue => {}
        DeviceStatus::Finished => finish_io(p),
        DeviceStatus::Hung => p.io.hung_io = true,
    }
}

/// Pulls one code from the device and precesses it onto the input line via
/// [`input::precess`]; a block-ending code finishes the operation.
fn service_input(p: &mut Processor) -> DeviceStatus {
    let device = p.io.devices.get_mut(&p.io.oc).expect("checked by caller");
    match device.next_input_code() {
        Some(code) => {
            let ended = input::precess(p, code, INPUT_LINE);
            if ended {
                DeviceStatus::Finished
            } else {
                DeviceStatus::Continue
            }
        }
        None => DeviceStatus::Hung,
    }
}

/// Runs [`format::run`] over the staging line and hands the resulting code
/// sequence to the device in one shot. TYPE AR stages AR onto the staging
/// line first, since AR isn't itself one of the drum's addressable lines
/// the format pipeline can precess directly.
fn service_output(p: &mut Processor, cmd: IoCommand) -> DeviceStatus {
    if cmd == IoCommand::TypewriterAr {
        let ar = p.drum.ar();
        p.drum.write(STAGING_LINE, ar);
    }

    let as_auto_stop = matches!(cmd, IoCommand::PaperTapePunch | IoCommand::TypewriterLine19);
    let codes = format::run(p, STAGING_LINE, as_auto_stop);

    let device = p.io.devices.get_mut(&p.io.oc).expect("checked by caller");
    device.accept_output(&codes)
}

/// Marks the active device as cancelled; the next `service` call observes
/// this and retires the operation.
pub fn cancel_io(p: &mut Processor) {
    p.io.canceled_io = true;
}

/// Retires the active I/O operation and returns OC to Ready.
pub fn finish_io(p: &mut Processor) {
    p.io.oc = OC_READY;
    p.io.canceled_io = false;
    p.io.duplicate_io = false;
    p.io.hung_io = false;
    p.drum.io_stop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::Word;

    #[test]
    fn io_command_round_trips_wired_codes() {
        assert_eq!(IoCommand::try_from(2), Ok(IoCommand::TypewriterAr));
        assert_eq!(IoCommand::try_from(15), Err(15));
    }

    #[test]
    fn io_command_direction_matches_wiring() {
        assert_eq!(IoCommand::PhotoelectricRead.direction(), IoDirection::Input);
        assert_eq!(IoCommand::TypewriterTypeIn.direction(), IoDirection::Input);
        assert_eq!(IoCommand::PaperTapePunch.direction(), IoDirection::Output);
        assert_eq!(IoCommand::TypewriterAr.direction(), IoDirection::Output);
        assert_eq!(IoCommand::MagneticTapeReverse.direction(), IoDirection::ReverseBlock);
    }

    struct StubInputDevice {
        codes: Vec<input::InputCode>,
        cancelled: bool,
    }

    impl Device for StubInputDevice {
        fn next_input_code(&mut self) -> Option<input::InputCode> {
            if self.codes.is_empty() {
                None
            } else {
                Some(self.codes.remove(0))
            }
        }
        fn accept_output(&mut self, _codes: &[format::OutputCode]) -> DeviceStatus {
            DeviceStatus::Finished
        }
        fn reverse_block(&mut self, _drum: &mut Drum) -> DeviceStatus {
            DeviceStatus::Finished
        }
        fn cancel(&mut self) {
            self.cancelled = true;
        }
    }

    struct StubOutputDevice {
        received: Vec<format::OutputCode>,
        cancelled: bool,
    }

    impl Device for StubOutputDevice {
        fn next_input_code(&mut self) -> Option<input::InputCode> {
            None
        }
        fn accept_output(&mut self, codes: &[format::OutputCode]) -> DeviceStatus {
            self.received = codes.to_vec();
            DeviceStatus::Finished
        }
        fn reverse_block(&mut self, _drum: &mut Drum) -> DeviceStatus {
            DeviceStatus::Finished
        }
        fn cancel(&mut self) {
            self.cancelled = true;
        }
    }

    #[test]
    fn initiate_then_service_drains_input_codes() {
        let mut p = Processor::new();
        p.set_device(
            IoCommand::PhotoelectricRead as u32,
            Box::new(StubInputDevice {
                codes: vec![input::InputCode::Data(0b0001), input::InputCode::Stop],
                cancelled: false,
            }),
        );
        initiate(&mut p, IoCommand::PhotoelectricRead as u32);
        assert!(p.io.busy());
        assert!(p.drum.io_active());
        service(&mut p);
        assert!(p.io.busy());
        service(&mut p);
        assert!(!p.io.busy());
        assert!(!p.drum.io_active());
        assert_eq!(p.drum.read(23).raw() & 0b1111, 0b0001);
    }

    #[test]
    fn service_output_runs_format_pipeline_and_hands_device_the_codes() {
        let mut p = Processor::new();
        p.as_.set(true, 0);
        p.drum.write(19, Word::ZERO);
        p.drum.set_mz(Word::ZERO);
        p.set_device(
            IoCommand::TypewriterLine19 as u32,
            Box::new(StubOutputDevice { received: Vec::new(), cancelled: false }),
        );
        initiate(&mut p, IoCommand::TypewriterLine19 as u32);
        service(&mut p);
        assert!(!p.io.busy(), "stub device finishes in one decision point");
    }

    #[test]
    fn hung_input_stays_busy_until_cancelled() {
        let mut p = Processor::new();
        p.set_device(
            IoCommand::CardReader as u32,
            Box::new(StubInputDevice { codes: Vec::new(), cancelled: false }),
        );
        initiate(&mut p, IoCommand::CardReader as u32);
        service(&mut p);
        assert!(p.io.hung_io);
        assert!(p.io.busy());
    }

    #[test]
    fn duplicate_initiation_sets_duplicate_flag() {
        let mut p = Processor::new();
        p.set_device(
            IoCommand::CardReader as u32,
            Box::new(StubInputDevice { codes: vec![input::InputCode::Stop], cancelled: false }),
        );
        initiate(&mut p, IoCommand::CardReader as u32);
        initiate(&mut p, IoCommand::CardReader as u32);
        assert!(p.io.duplicate_io);
    }

    #[test]
    fn cancel_retires_the_operation() {
        let mut p = Processor::new();
        p.set_device(
            IoCommand::CardReader as u32,
            Box::new(StubInputDevice { codes: vec![input::InputCode::Stop], cancelled: false }),
        );
        initiate(&mut p, IoCommand::CardReader as u32);
        cancel_io(&mut p);
        service(&mut p);
        assert!(!p.io.busy());
    }
}
