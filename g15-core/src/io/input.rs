//! Input precession: the mirror of [`super::format`] for incoming device
//! codes, landing data on line 23 and relaying completed frames to line 19.

use crate::processor::Processor;
use crate::word::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCode {
    /// A data digit, 4 bits wide.
    Data(u32),
    Minus,
    Cr,
    Tab,
    Stop,
    Reload,
    Period,
    Wait,
}

/// The OC value an auto-reloading read (slow paper-tape input) runs under.
pub const OC_SLOW_IN: u32 = 1;

/// Applies one incoming `code` against `data_line` (23, ordinarily).
/// Returns `true` when the code ends the current input block — a STOP that
/// isn't covered by auto-reload.
pub fn precess(p: &mut Processor, code: InputCode, data_line: u32) -> bool {
    match code {
        InputCode::Data(digit) => {
            p.drum.precess_in(data_line, 4, digit);
            false
        }
        InputCode::Minus => {
            p.os.set(true, p.drum.word_time() as u32);
            false
        }
        InputCode::Cr | InputCode::Tab => {
            let bit = p.os.is_set() as u32;
            p.drum.precess_in(data_line, 1, bit);
            p.os.set(false, p.drum.word_time() as u32);
            false
        }
        InputCode::Period => false,
        InputCode::Wait => {
            p.drum.precess_in(data_line, 4, 0);
            false
        }
        InputCode::Reload => {
            reload(p, data_line);
            false
        }
        InputCode::Stop => {
            if !auto_reload_active(p) {
                reload(p, data_line);
            }
            true
        }
    }
}

/// True while AS is set and the device feeding `data_line` is the
/// auto-reloading slow reader — the one case where STOP doesn't itself copy
/// `data_line` onward, because each completed frame already did.
fn auto_reload_active(p: &Processor) -> bool {
    p.as_.is_set() && p.io.oc == OC_SLOW_IN
}

/// Copies `data_line` into MZ, then relays MZ onto line 19 — the path a
/// completed frame takes on its way to the typewriter.
fn reload(p: &mut Processor, data_line: u32) {
    let staged = p.drum.read(data_line);
    p.drum.set_mz(staged);
    p.drum.write(19, Word::new(p.drum.mz().raw()));
}

/// Feeds `codes` through [`precess`] in order, stopping (and returning what
/// was consumed) as soon as a block-ending STOP is seen.
pub fn run(p: &mut Processor, data_line: u32, codes: impl IntoIterator<Item = InputCode>) {
    for code in codes {
        if precess(p, code, data_line) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_digits_precess_into_line_23() {
        let mut p = Processor::new();
        run(
            &mut p,
            23,
            [InputCode::Data(0b0001), InputCode::Data(0b0010), InputCode::Stop],
        );
        assert_eq!(p.drum.read(23).raw(), 0b0001_0010);
        assert_eq!(p.drum.read(19).raw(), 0b0001_0010);
    }

    #[test]
    fn minus_sets_os_until_cr_consumes_it() {
        let mut p = Processor::new();
        run(&mut p, 23, [InputCode::Minus]);
        assert!(p.os.is_set());
        run(&mut p, 23, [InputCode::Cr]);
        assert!(!p.os.is_set());
        assert_eq!(p.drum.read(23).raw() & 1, 1);
    }

    #[test]
    fn stop_skips_reload_when_auto_reload_is_active() {
        let mut p = Processor::new();
        p.as_.set(true, 0);
        p.io.oc = OC_SLOW_IN;
        p.drum.write(23, Word::new(0x42));
        p.drum.write(19, Word::ZERO);
        run(&mut p, 23, [InputCode::Stop]);
        assert_eq!(p.drum.read(19), Word::ZERO);
    }

    #[test]
    fn period_and_wait_are_inert_on_block_ending() {
        let mut p = Processor::new();
        let mut ended = false;
        for code in [InputCode::Period, InputCode::Wait] {
            ended |= precess(&mut p, code, 23);
        }
        assert!(!ended);
    }
}
