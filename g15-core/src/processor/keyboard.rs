//! Front-panel keyboard commands, accepted only while the enable switch is
//! on. The physical keys themselves are out of scope; this is the narrow
//! enum/handler seam a host UI calls through.

use log::warn;

use super::Processor;
use crate::word::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardCommand {
    /// A: type AR.
    TypeAr,
    /// B: back up one block on the active device.
    BackUpOneBlock,
    /// C: select command line 0.
    SelectCommandLineZero,
    /// F: stop and clear the mark.
    StopAndClearMark,
    /// I: execute a single command, then halt.
    Step,
    /// M: mark place.
    MarkPlace,
    /// P: paper-tape read.
    PaperTapeRead,
    /// Q: permit type-in.
    PermitTypeIn,
    /// R: return to mark.
    ReturnToMark,
    /// T: copy command location into AR.
    CopyCommandLocationIntoAr,
    /// 0..7: set command line.
    SetCommandLine(u32),
    /// S: cancel the active I/O operation.
    CancelIo,
}

/// Dispatches `cmd`, ignoring it (with a warning) unless the enable switch
/// is on.
pub fn handle(p: &mut Processor, cmd: KeyboardCommand) {
    if !p.io.enable_switch {
        warn!("keyboard command {cmd:?} ignored: enable switch is off");
        return;
    }

    match cmd {
        KeyboardCommand::TypeAr => {
            crate::io::initiate(p, crate::io::IoCommand::TypewriterAr as u32)
        }
        KeyboardCommand::BackUpOneBlock => {
            if let Some(device) = p.io.devices.get_mut(&p.io.oc) {
                device.reverse_block(&mut p.drum);
            }
        }
        KeyboardCommand::SelectCommandLineZero => p.command_line = 0,
        KeyboardCommand::StopAndClearMark => {
            p.ch.set(true, p.drum.word_time() as u32);
            p.mark = 0;
        }
        KeyboardCommand::Step => {
            p.single_stepping = true;
            p.step();
        }
        KeyboardCommand::MarkPlace => {
            p.mark = p.drum.location();
            p.drum.set_cm(Word::from_sign_magnitude(0, p.mark));
        }
        KeyboardCommand::PaperTapeRead => {
            crate::io::initiate(p, crate::io::IoCommand::PhotoelectricRead as u32)
        }
        KeyboardCommand::PermitTypeIn => {
            crate::io::initiate(p, crate::io::IoCommand::TypewriterTypeIn as u32)
        }
        KeyboardCommand::ReturnToMark => {
            let mark = p.mark;
            p.drum.wait_until(mark);
        }
        KeyboardCommand::CopyCommandLocationIntoAr => {
            p.drum.set_ar(Word::from_sign_magnitude(0, p.drum.location()));
        }
        KeyboardCommand::SetCommandLine(line) => p.command_line = line,
        KeyboardCommand::CancelIo => crate::io::cancel_io(p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_ignored_while_enable_switch_is_off() {
        let mut p = Processor::new();
        handle(&mut p, KeyboardCommand::SetCommandLine(3));
        assert_eq!(p.command_line, 0);
    }

    #[test]
    fn set_command_line_updates_the_selected_line() {
        let mut p = Processor::new();
        p.io.enable_switch = true;
        handle(&mut p, KeyboardCommand::SetCommandLine(5));
        assert_eq!(p.command_line, 5);
    }

    #[test]
    fn mark_place_then_return_to_mark_restores_location() {
        let mut p = Processor::new();
        p.io.enable_switch = true;
        p.drum.wait_for(30);
        handle(&mut p, KeyboardCommand::MarkPlace);
        p.drum.wait_for(20);
        handle(&mut p, KeyboardCommand::ReturnToMark);
        assert_eq!(p.drum.location(), 30);
    }
}
