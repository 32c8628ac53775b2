//! The processor: drum + flip-flop micro-state + the fetch/transfer state
//! machine. One aggregate struct owning a `step`/`run` pair, with submodules
//! split by destination class (normal lines, MQ/PN, ID, AR, multiword,
//! special) rather than by a single monolithic dispatch function.

pub mod fetch;
pub mod id_reg;
pub mod keyboard;
pub mod mq_pn;
pub mod multiword;
pub mod normal;
pub mod source;
pub mod special;
pub mod transfer;

use std::rc::Weak;

use crate::command::Command;
use crate::drum::Drum;
use crate::flipflop::{FlipFlop, LampObserver};
use crate::io::{Device, IoState};
use log::warn;

/// What the front-panel compute switch is set to; out of scope to *render*
/// but the processor's halt/breakpoint logic reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComputeSwitch {
    #[default]
    Off,
    Go,
    Bp,
}

/// Per-command scratch the transfer engine clears at the start of every TR
/// state and accumulates into during a double-precision add.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferScratch {
    pub dp_carry: bool,
    pub dp_even_sign: u32,
    pub pn_add_carry: bool,
    pub pn_augend_sign: u32,
    pub pn_addend_sign: u32,
    pub pn_sign: u32,
}

/// The processor proper: drum, command/transfer micro-state, and the active
/// I/O operation if any. One long-lived aggregate per power-cycle.
pub struct Processor {
    pub drum: Drum,

    // Fetch/execute state machine flip-flops.
    pub rc: FlipFlop<bool>,
    pub tr: FlipFlop<bool>,
    pub cq: FlipFlop<bool>,
    pub cg: FlipFlop<bool>,
    pub ch: FlipFlop<bool>,
    pub cz: FlipFlop<bool>,
    pub cj: FlipFlop<bool>,

    // Arithmetic/IO micro-state flip-flops.
    pub fo: FlipFlop<bool>,
    pub ip: FlipFlop<bool>,
    pub as_: FlipFlop<bool>,
    /// OS: the pending sign latch the input precessor sets on MINUS and
    /// clears after CR/TAB.
    pub os: FlipFlop<bool>,

    /// Currently selected command line (0..19), set by the `C` keyboard
    /// command or at reset.
    pub command_line: u32,
    /// The in-flight decoded command, valid while `tr` is set.
    pub command: Option<Command>,
    pub scratch: TransferScratch,

    /// Word-time CM stores the marked return location at (S=21, mark exit).
    pub mark: u32,

    pub compute_switch: ComputeSwitch,
    /// Set by the front-panel single-step control (out of scope to render,
    /// but Return Exit's mark/N arbitration reads it — S=20, return exit).
    pub single_stepping: bool,
    pub io: IoState,
}

impl Processor {
    pub fn new() -> Self {
        Processor {
            drum: Drum::new(),
            rc: FlipFlop::new("RC"),
            tr: FlipFlop::new("TR"),
            cq: FlipFlop::new("CQ"),
            cg: FlipFlop::new("CG"),
            ch: FlipFlop::new("CH"),
            cz: FlipFlop::new("CZ"),
            cj: FlipFlop::new("CJ"),
            fo: FlipFlop::new("FO"),
            ip: FlipFlop::new("IP"),
            as_: FlipFlop::new("AS"),
            os: FlipFlop::new("OS"),
            command_line: 0,
            command: None,
            scratch: TransferScratch::default(),
            mark: 0,
            compute_switch: ComputeSwitch::default(),
            single_stepping: false,
            io: IoState::new(),
        }
    }

    /// Attaches a lamp observer to every flip-flop that carries one. Cheap
    /// to skip entirely — the front panel is out of scope here — but the
    /// hook costs nothing to wire up.
    pub fn attach_lamp_observer(&mut self, observer: Weak<dyn LampObserver>) {
        self.rc.set_observer(observer.clone());
        self.tr.set_observer(observer.clone());
        self.cq.set_observer(observer.clone());
        self.cg.set_observer(observer.clone());
        self.ch.set_observer(observer.clone());
        self.cz.set_observer(observer.clone());
        self.cj.set_observer(observer.clone());
        self.fo.set_observer(observer.clone());
        self.ip.set_observer(observer.clone());
        self.as_.set_observer(observer.clone());
        self.os.set_observer(observer);
    }

    /// Builds a processor with the front-panel switches set up front, rather
    /// than through setters.
    pub fn with_switches(compute_switch: ComputeSwitch, enable_switch: bool, punch_switch: u32) -> Self {
        let mut p = Self::new();
        p.compute_switch = compute_switch;
        p.io.enable_switch = enable_switch;
        p.io.punch_switch = punch_switch;
        p
    }

    /// Dispatches a front-panel keyboard command.
    pub fn handle_keyboard(&mut self, cmd: keyboard::KeyboardCommand) {
        keyboard::handle(self, cmd);
    }

    /// Registers the device that services `io_code`. Devices are looked up
    /// by the caller's convention (not specified by the core) — the core
    /// only needs the `Device` trait object once an operation initiates.
    pub fn set_device(&mut self, io_code: u32, device: Box<dyn Device>) {
        self.io.devices.insert(io_code, device);
    }

    /// Runs one fetch/execute cycle: RC then TR, unless halted.
    pub fn step(&mut self) {
        if self.ch.is_set() {
            warn!("step called while halted");
            return;
        }
        fetch::read_command(self);
        transfer::dispatch(self);
    }

    /// Runs until `ch` (halt) is set. The drum throttle that would
    /// rate-limit this against wall-clock time lives outside the core.
    pub fn run(&mut self) {
        while !self.ch.is_set() {
            self.step();
        }
    }

    /// Advances the active I/O operation by one decision point. A no-op if
    /// no operation is in progress. Call this from the same driving loop
    /// that calls `step`.
    pub fn service_io(&mut self) {
        crate::io::service(self);
    }
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}
