//! Format-directed output: precesses 3-bit format codes from MZ and turns
//! each into an emitted code, per the format table wired into the console's
//! output logic.

use crate::processor::Processor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCode {
    /// A data digit, 4 bits wide.
    Digit(u32),
    Stop,
    Cr,
    Period,
    /// `true` for MINUS (negative), `false` for SPACE (positive).
    Sign(bool),
    Reload,
    Tab,
    Wait,
}

/// Runs the format pipeline against `data_line` until a STOP is emitted
/// (including a forced STOP from the AS auto-stop rule), returning every
/// code emitted along the way.
///
/// `as_auto_stop` is true for PUNCH 19 / TYPE 19, the two operations the AS
/// flip-flop's "line now all zero" override applies to.
pub fn run(p: &mut Processor, data_line: u32, as_auto_stop: bool) -> Vec<OutputCode> {
    let mut emitted = Vec::new();

    loop {
        let fmt = p.drum.precess_mz(3);
        let code = match fmt {
            0b000 => OutputCode::Digit(p.drum.precess(data_line, 4)),
            0b001 => OutputCode::Stop,
            0b010 => {
                p.drum.precess(data_line, 1);
                OutputCode::Cr
            }
            0b011 => OutputCode::Period,
            0b100 => OutputCode::Sign(p.drum.read(data_line).is_negative()),
            0b101 => {
                let reloaded = p.drum.read(data_line);
                p.drum.set_mz(reloaded);
                OutputCode::Reload
            }
            0b110 => {
                p.drum.precess(data_line, 1);
                OutputCode::Tab
            }
            0b111 => {
                p.drum.precess(data_line, 4);
                OutputCode::Wait
            }
            _ => unreachable!("fmt is a 3-bit field"),
        };

        let forced_stop =
            as_auto_stop && p.as_.is_set() && p.drum.read(data_line).is_zero();
        let emitted_code = if forced_stop { OutputCode::Stop } else { code };

        emitted.push(emitted_code);
        if emitted_code == OutputCode::Stop {
            break;
        }
    }

    emitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::Word;

    #[test]
    fn all_zero_line_19_emits_space_reload_stop() {
        let mut p = Processor::new();
        p.as_.set(true, 0);
        p.drum.write(19, Word::ZERO);
        p.drum.set_mz(Word::ZERO);

        let codes = run(&mut p, 19, true);
        assert_eq!(
            codes,
            vec![OutputCode::Sign(false), OutputCode::Reload, OutputCode::Stop]
        );
    }

    #[test]
    fn digit_code_precesses_four_bits_then_stops() {
        let mut p = Processor::new();
        p.drum.write(5, Word::new(0b1_0001));
        // Low 3 bits = 000 (digit), next 3 bits after the shift = 001 (stop).
        p.drum.set_mz(Word::new(0b001_000));
        let codes = run(&mut p, 5, false);
        assert_eq!(codes, vec![OutputCode::Digit(0b0001), OutputCode::Stop]);
    }
}
